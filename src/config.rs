use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub popular_default_count: i64,
    pub reviews_default_count: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://filmrank.db?mode=rwc".to_string());

        let popular_default_count: i64 = std::env::var("POPULAR_DEFAULT_COUNT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("POPULAR_DEFAULT_COUNT")?;

        let reviews_default_count: u64 = std::env::var("REVIEWS_DEFAULT_COUNT")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("REVIEWS_DEFAULT_COUNT")?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            popular_default_count,
            reviews_default_count,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_url: "sqlite::memory:".to_string(),
            popular_default_count: 10,
            reviews_default_count: 10,
        }
    }
}
