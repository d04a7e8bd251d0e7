mod auth;
mod cache;
mod config;
mod crud;
mod db;
mod entities;
mod error;
mod filter;
mod models;
mod multipart;
mod pagination;
mod projection;
mod relations;
mod routes;
mod storage;
mod validation;

#[cfg(test)]
mod test_support;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, header::LOCATION},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    cache::OutputCache, config::Config, pagination::TOTAL_RECORDS_HEADER, storage::FileStorage,
};

pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub cache: OutputCache,
    pub storage: FileStorage,
}

/// The full HTTP surface: the JSON API, with uploaded images served from the
/// upload root for every other path.
pub fn app(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let origins = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config.allowed_origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(TOTAL_RECORDS_HEADER), LOCATION]);

    routes::api(&state)
        .fallback_service(ServeDir::new(state.storage.root()))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state.clone())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,cinedex=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::connect_and_migrate(&config.database_url).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        cache: OutputCache::new(Duration::from_secs(config.cache_ttl_secs)),
        storage: FileStorage::new(&config.upload_dir),
    });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, uploads = %config.upload_dir.display(), "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
