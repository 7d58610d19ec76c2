use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::utils::error::AppError;

/// Header carrying the authenticated user id, injected per request by the
/// upstream identity layer. The server treats the id as opaque and never
/// validates credentials itself.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated buyer or organizer making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Self { id: id.to_string() })
            .ok_or_else(|| AppError::Auth("Sign in to continue".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(builder: axum::http::request::Builder) -> Parts {
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn extracts_trimmed_user_id() {
        let mut parts = parts_with(Request::builder().header(USER_ID_HEADER, " u-42 "));
        let user = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(user.id, "u-42");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let mut parts = parts_with(Request::builder());
        let err = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn blank_header_is_unauthorized() {
        let mut parts = parts_with(Request::builder().header(USER_ID_HEADER, "  "));
        let err = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
