use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use bedtime_api::auth::JwtConfig;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

pub struct Config {
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Read `BEDTIME_*` variables. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("BEDTIME_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!(
                "BEDTIME_JWT_SECRET is unset or still a placeholder; \
                 it must match the identity provider's signing secret"
            );
        }

        let jwt_issuer = std::env::var("BEDTIME_JWT_ISSUER")
            .ok()
            .filter(|v| !v.is_empty());
        let db_path = std::env::var("BEDTIME_DB_PATH")
            .unwrap_or_else(|_| "bedtime.db".into())
            .into();
        let host = std::env::var("BEDTIME_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("BEDTIME_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("BEDTIME_PORT must be a port number")?;

        Ok(Self {
            jwt_secret,
            jwt_issuer,
            db_path,
            host,
            port,
        })
    }

    pub fn jwt(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_secret.clone(), self.jwt_issuer.clone())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
