use std::ops::RangeInclusive;

use axum::{Extension, Json, extract::State};
use tracing::{info, warn};

use bedtime_crypto::pin;
use bedtime_types::api::{Claims, SaveSettingsRequest, VerifyPinRequest, VerifyPinResponse};
use bedtime_types::models::ParentSettings;

use crate::auth::{AppState, with_db};
use crate::convert::settings_from_row;
use crate::error::ApiError;
use crate::extract::JsonBody;

/// Allowed child reading session length, in minutes.
pub const READING_TIME_LIMIT: RangeInclusive<u32> = 10..=60;

/// GET /api/parent-settings
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ParentSettings>, ApiError> {
    let row = with_db(&state, move |db| db.get_settings(&claims.sub))
        .await?
        .ok_or(ApiError::NotFound("Settings"))?;
    Ok(Json(settings_from_row(row)))
}

/// POST /api/parent-settings: create or replace the caller's settings.
///
/// `SaveSettingsRequest` is the allow-list of writable fields; the admin
/// flag is not one of them and the upsert never writes it.
pub async fn save_settings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<SaveSettingsRequest>,
) -> Result<Json<ParentSettings>, ApiError> {
    if !pin::is_valid_pin(&req.pin) {
        return Err(pin::PinError::InvalidFormat.into());
    }
    if !READING_TIME_LIMIT.contains(&req.reading_time_limit) {
        return Err(ApiError::Validation(format!(
            "readingTimeLimit must be between {} and {} minutes",
            READING_TIME_LIMIT.start(),
            READING_TIME_LIMIT.end()
        )));
    }

    let user_id = claims.sub.clone();
    let row = with_db(&state, move |db| {
        let pin_hash = pin::hash_pin(&req.pin)?;
        db.upsert_settings(
            &user_id,
            &pin_hash,
            req.reading_time_limit,
            req.fullscreen_lock_enabled,
            req.theme,
        )
    })
    .await?;

    info!(user_id = %claims.sub, "Parent settings saved");
    Ok(Json(settings_from_row(row)))
}

/// POST /api/verify-pin: unlocks the exit from child mode.
pub async fn verify_pin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<VerifyPinRequest>,
) -> Result<Json<VerifyPinResponse>, ApiError> {
    if !pin::is_valid_pin(&req.pin) {
        return Err(pin::PinError::InvalidFormat.into());
    }

    let user_id = claims.sub.clone();
    let valid = with_db(&state, move |db| {
        Ok(db
            .get_settings(&user_id)?
            .map(|row| pin::verify_pin(&req.pin, &row.pin_hash)))
    })
    .await?
    .ok_or(ApiError::NotFound("Settings"))?;

    if !valid {
        warn!(user_id = %claims.sub, "PIN verification failed");
    }
    Ok(Json(VerifyPinResponse { valid }))
}
