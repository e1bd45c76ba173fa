use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::warn;

use bedtime_types::api::Claims;

use crate::auth::{AppState, with_db};
use crate::error::ApiError;

/// Extract and validate the bearer JWT; the caller's `Claims` go into the
/// request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt.decode(bearer.token()).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Admin gate. Must run after `require_auth`. The flag is read from the
/// caller's settings row on every request, never from the payload.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = req
        .extensions()
        .get::<Claims>()
        .map(|claims| claims.sub.clone())
        .ok_or(ApiError::Unauthorized)?;

    let uid = caller.clone();
    if !with_db(&state, move |db| db.is_admin(&uid)).await? {
        warn!(user_id = %caller, "Non-admin caller on admin route");
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}
