//! Database row types. These map directly to SQLite rows.
//! Distinct from bedtime-types API models to keep the DB layer independent.

use bedtime_types::models::StoryStatus;
use bedtime_types::moderation::{ReviewDecision, StoryDraft};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct StoryRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub image_url: String,
    pub voiceover_url: Option<String>,
    pub status: StoryStatus,
    pub approved_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

/// Everything needed to insert a story. `review` is present only for
/// admin-authored stories, which skip the queue.
pub struct NewStory<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub draft: &'a StoryDraft,
    pub review: Option<&'a ReviewDecision>,
    pub created_at: DateTime<Utc>,
}

/// Result of a conditional status update.
#[derive(Debug)]
pub enum Transition {
    Applied(StoryRow),
    /// No such story, or it belongs to someone else.
    NotFound,
    /// The story exists but is not in the status the action requires.
    WrongStatus(StoryStatus),
}

#[derive(Debug, Clone)]
pub struct SettingsRow {
    pub user_id: String,
    pub pin_hash: String,
    pub reading_time_limit: u32,
    pub fullscreen_lock_enabled: bool,
    pub theme: String,
    pub is_admin: bool,
}

pub struct UserSummaryRow {
    pub user_id: String,
    pub reading_time_limit: u32,
    pub fullscreen_lock_enabled: bool,
    pub theme: String,
    pub is_admin: bool,
    pub story_count: u64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatsRow {
    pub total_users: u64,
    pub total_stories: u64,
    pub total_bookmarks: u64,
    pub recent_stories: u64,
    pub pending_stories: u64,
    pub published_stories: u64,
}
