use chrono::{DateTime, Utc};
use tracing::warn;

use bedtime_db::models::{SettingsRow, StoryRow};
use bedtime_types::models::{ParentSettings, Story, Theme};

pub fn story_from_row(row: StoryRow) -> Story {
    Story {
        created_at: parse_timestamp(&row.created_at, &row.id),
        reviewed_at: row
            .reviewed_at
            .as_deref()
            .map(|ts| parse_timestamp(ts, &row.id)),
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        content: row.content,
        summary: row.summary,
        image_url: row.image_url,
        voiceover_url: row.voiceover_url,
        status: row.status,
        approved_by: row.approved_by,
        rejection_reason: row.rejection_reason,
    }
}

pub fn settings_from_row(row: SettingsRow) -> ParentSettings {
    ParentSettings {
        theme: parse_theme(&row.theme, &row.user_id),
        user_id: row.user_id,
        reading_time_limit: row.reading_time_limit,
        fullscreen_lock_enabled: row.fullscreen_lock_enabled,
        is_admin: row.is_admin,
    }
}

pub fn parse_theme(raw: &str, owner: &str) -> Theme {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt theme on settings '{}': {}", owner, e);
        Theme::Day
    })
}

fn parse_timestamp(raw: &str, story_id: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on story '{}': {}", raw, story_id, e);
            DateTime::default()
        })
}
