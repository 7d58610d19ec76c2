use axum::http::{header, HeaderName, HeaderValue, Method};
use std::env;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::extract::USER_ID_HEADER;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

const PREFLIGHT_MAX_AGE_SECS: u64 = 3600;

pub fn create_cors_layer() -> CorsLayer {
    let raw = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());
    let origins = parse_origins(&raw);

    let allow_origin = if origins.is_empty() {
        tracing::warn!("CORS: no valid origins configured, mirroring request origins (development)");
        AllowOrigin::mirror_request()
    } else {
        tracing::info!("CORS: configured with {} allowed origin(s)", origins.len());
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static(USER_ID_HEADER),
        ])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS))
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::debug!("CORS: allowing origin {}", origin);
                Some(value)
            }
            Err(error) => {
                tracing::warn!("CORS: skipping invalid origin '{}': {}", origin, error);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_origins_parse() {
        let origins = parse_origins(DEFAULT_ALLOWED_ORIGINS);
        assert_eq!(origins.len(), 2);
    }

    #[test]
    fn invalid_and_blank_entries_are_skipped() {
        let origins = parse_origins("http://localhost:5173, , http://ok.example ,\u{7f}bad");
        assert_eq!(origins.len(), 2);
    }

    #[test]
    fn layer_builds_from_defaults() {
        std::env::remove_var("CORS_ALLOWED_ORIGINS");
        let _layer = create_cors_layer();
    }
}
