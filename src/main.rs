mod associations;
mod config;
mod db;
mod entities;
mod error;
mod feed;
mod films;
mod models;
mod ranking;
mod recommend;
mod references;
mod reviews;
mod routes;
mod search;
mod users;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmrank=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::connect_and_migrate(config.database_url.as_str()).await?;
    tracing::info!(database_url = %config.database_url, "database ready");

    let state = Arc::new(AppState { config: config.clone(), db });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
