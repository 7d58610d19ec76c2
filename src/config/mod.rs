use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;

pub struct Config {
    pub bind_addr: SocketAddr,
    pub seed_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(error) => {
                    tracing::warn!(%raw, %error, "invalid BIND_ADDR, using the default");
                    None
                }
            })
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        let seed_path = env::var("STORE_SEED_PATH")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        Self {
            bind_addr,
            seed_path,
        }
    }
}
