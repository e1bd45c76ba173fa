use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use uuid::Uuid;

use bedtime_types::api::{Claims, CreateBookmarkRequest, SuccessResponse};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::extract::JsonBody;

/// GET /api/bookmarks: ids of the caller's bookmarked stories, newest first.
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<String>>, ApiError> {
    let ids = with_db(&state, move |db| db.list_bookmarked_story_ids(&claims.sub)).await?;
    Ok(Json(ids))
}

pub async fn add_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateBookmarkRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let bookmark_id = Uuid::new_v4().to_string();
    let found = with_db(&state, move |db| {
        db.add_bookmark(&bookmark_id, &claims.sub, &req.story_id, Utc::now())
    })
    .await?;

    if !found {
        return Err(ApiError::NotFound("Story"));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/bookmarks/{story_id}: succeeds whether or not it was bookmarked.
pub async fn remove_bookmark(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SuccessResponse>, ApiError> {
    with_db(&state, move |db| db.remove_bookmark(&claims.sub, &story_id)).await?;
    Ok(Json(SuccessResponse::ok()))
}
