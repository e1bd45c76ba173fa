use anyhow::anyhow;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use bedtime_db::models::{NewStory, Transition};
use bedtime_types::api::{Claims, CreateStoryRequest, UpdateStoryRequest};
use bedtime_types::models::{Story, StoryStatus};
use bedtime_types::moderation::{ReviewDecision, StoryAction, StoryDraft, StoryPatch};

use crate::auth::{AppState, with_db};
use crate::convert::story_from_row;
use crate::error::ApiError;
use crate::extract::JsonBody;

/// Size of the public landing-page preview.
const PREVIEW_LIMIT: u32 = 3;

/// GET /api/stories: the public feed, published stories only.
pub async fn list_published(State(state): State<AppState>) -> Result<Json<Vec<Story>>, ApiError> {
    let rows = with_db(&state, |db| {
        db.list_stories_by_status(StoryStatus::Published, None)
    })
    .await?;
    Ok(Json(rows.into_iter().map(story_from_row).collect()))
}

/// GET /api/stories/preview
pub async fn preview(State(state): State<AppState>) -> Result<Json<Vec<Story>>, ApiError> {
    let rows = with_db(&state, |db| {
        db.list_stories_by_status(StoryStatus::Published, Some(PREVIEW_LIMIT))
    })
    .await?;
    Ok(Json(rows.into_iter().map(story_from_row).collect()))
}

/// GET /api/stories/my-submissions: every story the caller owns, any status.
pub async fn my_submissions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Story>>, ApiError> {
    let rows = with_db(&state, move |db| db.list_stories_by_owner(&claims.sub)).await?;
    Ok(Json(rows.into_iter().map(story_from_row).collect()))
}

/// POST /api/stories: drafts for parents, published immediately for admins.
pub async fn create_story(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = StoryDraft::from_request(req)?;
    let story_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let row = with_db(&state, move |db| {
        let review = db
            .is_admin(&claims.sub)?
            .then(|| ReviewDecision::admin_authored(&claims.sub, now));

        db.insert_story(&NewStory {
            id: &story_id,
            user_id: &claims.sub,
            draft: &draft,
            review: review.as_ref(),
            created_at: now,
        })
    })
    .await?;

    info!(story_id = %row.id, status = %row.status, "Story created");
    Ok((StatusCode::CREATED, Json(story_from_row(row))))
}

/// PATCH /api/stories/{id}: edit a draft the caller owns.
pub async fn edit_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdateStoryRequest>,
) -> Result<Json<Story>, ApiError> {
    let patch = StoryPatch::from_request(req)?;

    let transition =
        with_db(&state, move |db| db.edit_story(&story_id, &claims.sub, &patch)).await?;

    Ok(Json(settle(transition, StoryAction::Edit)?))
}

/// POST /api/stories/{id}/submit: draft -> pending_review.
pub async fn submit_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Story>, ApiError> {
    let transition = with_db(&state, move |db| db.submit_story(&story_id, &claims.sub)).await?;
    let story = settle(transition, StoryAction::Submit)?;

    info!(story_id = %story.id, "Story submitted for review");
    Ok(Json(story))
}

/// Map a store transition to the updated story or the matching error.
pub(crate) fn settle(transition: Transition, action: StoryAction) -> Result<Story, ApiError> {
    match transition {
        Transition::Applied(row) => Ok(story_from_row(row)),
        Transition::NotFound => Err(ApiError::NotFound("Story")),
        Transition::WrongStatus(status) => match action.check(status) {
            Err(e) => Err(e.into()),
            Ok(()) => Err(ApiError::Store(anyhow!(
                "{} did not apply to a story that is {}",
                action,
                status
            ))),
        },
    }
}
