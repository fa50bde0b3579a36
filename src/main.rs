use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use dotenv::dotenv;
use gigmarket::{
    config::Config,
    db::{DBClient, MarketStore, MemoryStore},
    routes::create_router,
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gigmarket=debug,tower_http=info")),
        )
        .init();

    dotenv().ok();

    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn MarketStore> = match &config.database_url {
        Some(database_url) => {
            let pool = match PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    tracing::info!("connection to the database is successful");
                    pool
                }
                Err(err) => {
                    tracing::error!("failed to connect to the database: {:?}", err);
                    std::process::exit(1);
                }
            };

            let db_client = DBClient::new(pool);
            if let Err(err) = db_client.migrate().await {
                tracing::error!("failed to run migrations: {}", err);
                std::process::exit(1);
            }
            Arc::new(db_client)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, keeping data in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let port = config.port;
    let app_state = AppState::new(config, store);
    let app = create_router(Arc::new(app_state)).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind port {}: {}", port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("server is running on http://localhost:{}", port);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", err);
    }
}
