use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::{Duration, Utc};
use tracing::info;

use bedtime_types::api::{
    AdminCheckResponse, AdminStats, AdminUser, Claims, ReviewStoryRequest, SuccessResponse,
};
use bedtime_types::models::{Story, StoryStatus};
use bedtime_types::moderation::{ReviewDecision, StoryAction};

use crate::auth::{AppState, with_db};
use crate::convert::{parse_theme, story_from_row};
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::stories::settle;

/// Window for `recentStoriesCount`.
const RECENT_WINDOW_DAYS: i64 = 7;

/// GET /api/admin/check: any signed-in caller may ask whether they are admin.
pub async fn check_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AdminCheckResponse>, ApiError> {
    let is_admin = with_db(&state, move |db| db.is_admin(&claims.sub)).await?;
    Ok(Json(AdminCheckResponse { is_admin }))
}

/// GET /api/admin/pending-stories: the review queue, newest first.
pub async fn pending_stories(State(state): State<AppState>) -> Result<Json<Vec<Story>>, ApiError> {
    let rows = with_db(&state, |db| {
        db.list_stories_by_status(StoryStatus::PendingReview, None)
    })
    .await?;
    Ok(Json(rows.into_iter().map(story_from_row).collect()))
}

/// POST /api/admin/review-story/{id}: approve or reject a pending story.
pub async fn review_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<ReviewStoryRequest>,
) -> Result<Json<Story>, ApiError> {
    let decision = ReviewDecision::new(req.action, &claims.sub, req.rejection_reason, Utc::now())?;

    let transition = with_db(&state, move |db| db.review_story(&story_id, &decision)).await?;
    let story = settle(transition, StoryAction::Review)?;

    info!(
        story_id = %story.id,
        reviewer = %claims.sub,
        status = %story.status,
        "Story reviewed"
    );
    Ok(Json(story))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
    let row = with_db(&state, move |db| db.stats(since)).await?;

    let average = if row.total_users == 0 {
        0.0
    } else {
        row.total_stories as f64 / row.total_users as f64
    };

    Ok(Json(AdminStats {
        total_users: row.total_users,
        total_stories: row.total_stories,
        total_bookmarks: row.total_bookmarks,
        average_stories_per_user: format!("{average:.1}"),
        recent_stories_count: row.recent_stories,
        pending_stories: row.pending_stories,
        published_stories: row.published_stories,
    }))
}

/// GET /api/admin/stories: every story regardless of status.
pub async fn all_stories(State(state): State<AppState>) -> Result<Json<Vec<Story>>, ApiError> {
    let rows = with_db(&state, |db| db.list_all_stories()).await?;
    Ok(Json(rows.into_iter().map(story_from_row).collect()))
}

pub async fn users(State(state): State<AppState>) -> Result<Json<Vec<AdminUser>>, ApiError> {
    let rows = with_db(&state, |db| db.list_users()).await?;

    let users = rows
        .into_iter()
        .map(|row| AdminUser {
            theme: parse_theme(&row.theme, &row.user_id),
            user_id: row.user_id,
            reading_time_limit: row.reading_time_limit,
            fullscreen_lock_enabled: row.fullscreen_lock_enabled,
            is_admin: row.is_admin,
            story_count: row.story_count,
        })
        .collect();

    Ok(Json(users))
}

/// DELETE /api/admin/stories/{story_id}
pub async fn delete_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let sid = story_id.clone();
    if !with_db(&state, move |db| db.delete_story(&sid)).await? {
        return Err(ApiError::NotFound("Story"));
    }

    info!(story_id = %story_id, admin = %claims.sub, "Story deleted");
    Ok(Json(SuccessResponse::ok()))
}
