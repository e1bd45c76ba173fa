use serde::{Deserialize, Serialize};

use crate::models::Theme;

// -- JWT Claims --

/// Claims carried by identity-provider tokens. `sub` is the caller id used as
/// the owner of stories, settings and bookmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

// -- Stories --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateStoryRequest {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub image_url: String,
    #[serde(default)]
    pub voiceover_url: Option<String>,
}

/// Partial edit of a draft. Absent fields are left unchanged;
/// `voiceoverUrl: ""` removes the voiceover.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub voiceover_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewStoryRequest {
    pub action: ReviewAction,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

// -- Parent settings --

/// The complete set of fields a parent may write. Anything else, `isAdmin`
/// included, fails deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveSettingsRequest {
    pub pin: String,
    pub reading_time_limit: u32,
    pub fullscreen_lock_enabled: bool,
    pub theme: Theme,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyPinRequest {
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyPinResponse {
    pub valid: bool,
}

// -- Bookmarks --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBookmarkRequest {
    pub story_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// -- Admin --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheckResponse {
    pub is_admin: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub total_stories: u64,
    pub total_bookmarks: u64,
    /// Formatted with one decimal place, e.g. `"2.5"`.
    pub average_stories_per_user: String,
    /// Stories created in the last seven days.
    pub recent_stories_count: u64,
    pub pending_stories: u64,
    pub published_stories: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub user_id: String,
    pub reading_time_limit: u32,
    pub fullscreen_lock_enabled: bool,
    pub theme: Theme,
    pub is_admin: bool,
    pub story_count: u64,
}
