use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use tessera_server::config::Config;
use tessera_server::routes::{create_routes, AppState};
use tessera_server::store::MemoryStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store = match &config.seed_path {
        Some(path) => {
            let store = MemoryStore::from_seed_file(path)
                .await
                .expect("Failed to load store seed");
            tracing::info!(seed = %path.display(), "Store seeded from file");
            store
        }
        None => MemoryStore::new(),
    };

    let app: Router = create_routes(AppState {
        store: Arc::new(store),
    });

    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
