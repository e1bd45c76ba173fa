use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::error;

use bedtime_db::Database;
use bedtime_types::api::Claims;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt: JwtConfig,
}

/// Verification settings for identity-provider tokens (HS256, shared secret).
#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
    issuer: Option<String>,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, issuer: Option<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer,
        }
    }

    pub fn decode(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            validation.set_required_spec_claims(&["exp", "iss"]);
        }

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }

    /// Mint a token for `user_id`. Production tokens come from the identity
    /// provider; this serves the operator CLI and tests.
    pub fn issue(&self, user_id: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
        let exp = (chrono::Utc::now() + ttl).timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: usize::try_from(exp)
                .map_err(|_| anyhow::anyhow!("token expiry {} is before the epoch", exp))?,
            iss: self.issuer.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }
}

/// Run blocking DB work off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Store(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::Store)
}
