use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

const DEV_JWT_SECRET: &str = "cinedex-development-secret-change-me";

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub cache_ttl_secs: u64,
    pub upload_dir: PathBuf,
    pub public_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://cinedex.db?mode=rwc".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development signing key");
                DEV_JWT_SECRET.to_string()
            },
        };

        let token_ttl_hours: i64 =
            std::env::var("TOKEN_TTL_HOURS").ok().and_then(|s| s.parse().ok()).unwrap_or(24 * 365);

        let bcrypt_cost: u32 = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(bcrypt::DEFAULT_COST);

        let cache_ttl_secs: u64 =
            std::env::var("CACHE_TTL_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(15);

        let upload_dir =
            PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "wwwroot".to_string()));

        let public_url = std::env::var("PUBLIC_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            cache_ttl_secs,
            upload_dir,
            public_url,
            allowed_origins,
            max_upload_bytes,
        })
    }

    /// Any origin is allowed when the list is empty or contains `*`.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}
