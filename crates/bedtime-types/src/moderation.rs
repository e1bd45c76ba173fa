//! Story moderation workflow.
//!
//! ```text
//!   create ──> draft ──submit──> pending_review ──approve──> published
//!     │          ^  │                  │
//!     │          │  └─edit─┐           │
//!     │          │<────────┘           │
//!     │          └──────────reject─────┘
//!     └─(admin author)──────────────────────────────────────> published
//! ```
//!
//! Everything here is pure: the store applies the resulting fields with a
//! conditional update guarded by [`StoryAction::required_status`].

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::api::{CreateStoryRequest, ReviewAction, UpdateStoryRequest};
use crate::models::StoryStatus;

pub const DEFAULT_REJECTION_REASON: &str =
    "This story needs a few changes before it can be published.";

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_SUMMARY_LEN: usize = 1_000;
pub const MAX_CONTENT_LEN: usize = 50_000;
pub const MAX_URL_LEN: usize = 2_048;
pub const MAX_REASON_LEN: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("at least one field must be provided")]
    EmptyEdit,

    #[error("cannot {action} a story that is {status}")]
    WrongStatus {
        action: StoryAction,
        status: StoryStatus,
    },
}

/// Owner or reviewer actions on an existing story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryAction {
    Submit,
    Edit,
    Review,
}

impl StoryAction {
    /// The only status from which this action may be taken.
    pub fn required_status(self) -> StoryStatus {
        match self {
            Self::Submit | Self::Edit => StoryStatus::Draft,
            Self::Review => StoryStatus::PendingReview,
        }
    }

    pub fn check(self, current: StoryStatus) -> Result<(), ModerationError> {
        if current == self.required_status() {
            Ok(())
        } else {
            Err(ModerationError::WrongStatus {
                action: self,
                status: current,
            })
        }
    }
}

impl fmt::Display for StoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Submit => "submit",
            Self::Edit => "edit",
            Self::Review => "review",
        })
    }
}

/// Validated content of a new story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub image_url: String,
    pub voiceover_url: Option<String>,
}

impl StoryDraft {
    pub fn from_request(req: CreateStoryRequest) -> Result<Self, ModerationError> {
        Ok(Self {
            title: required("title", req.title, MAX_TITLE_LEN)?,
            content: required("content", req.content, MAX_CONTENT_LEN)?,
            summary: required("summary", req.summary, MAX_SUMMARY_LEN)?,
            image_url: required("imageUrl", req.image_url, MAX_URL_LEN)?,
            voiceover_url: optional("voiceoverUrl", req.voiceover_url, MAX_URL_LEN)?,
        })
    }
}

/// Validated partial edit. `voiceover_url: Some(None)` clears the voiceover.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub voiceover_url: Option<Option<String>>,
}

impl StoryPatch {
    pub fn from_request(req: UpdateStoryRequest) -> Result<Self, ModerationError> {
        let patch = Self {
            title: req
                .title
                .map(|v| required("title", v, MAX_TITLE_LEN))
                .transpose()?,
            content: req
                .content
                .map(|v| required("content", v, MAX_CONTENT_LEN))
                .transpose()?,
            summary: req
                .summary
                .map(|v| required("summary", v, MAX_SUMMARY_LEN))
                .transpose()?,
            image_url: req
                .image_url
                .map(|v| required("imageUrl", v, MAX_URL_LEN))
                .transpose()?,
            voiceover_url: match req.voiceover_url {
                Some(v) => Some(optional("voiceoverUrl", Some(v), MAX_URL_LEN)?),
                None => None,
            },
        };

        if patch == Self::default() {
            return Err(ModerationError::EmptyEdit);
        }
        Ok(patch)
    }
}

/// Review fields written together with a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDecision {
    pub status: StoryStatus,
    pub approved_by: String,
    pub reviewed_at: DateTime<Utc>,
    pub rejection_reason: Option<String>,
}

impl ReviewDecision {
    pub fn new(
        action: ReviewAction,
        reviewer: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ModerationError> {
        let (status, rejection_reason) = match action {
            ReviewAction::Approve => (StoryStatus::Published, None),
            ReviewAction::Reject => {
                let reason = optional("rejectionReason", reason, MAX_REASON_LEN)?
                    .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());
                (StoryStatus::Draft, Some(reason))
            }
        };

        Ok(Self {
            status,
            approved_by: reviewer.to_string(),
            reviewed_at: now,
            rejection_reason,
        })
    }

    /// Admin-authored stories are published on creation, reviewed by their author.
    pub fn admin_authored(author: &str, now: DateTime<Utc>) -> Self {
        Self {
            status: StoryStatus::Published,
            approved_by: author.to_string(),
            reviewed_at: now,
            rejection_reason: None,
        }
    }
}

fn required(field: &'static str, value: String, max: usize) -> Result<String, ModerationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ModerationError::Missing { field });
    }
    if trimmed.chars().count() > max {
        return Err(ModerationError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

fn optional(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, ModerationError> {
    match value {
        Some(v) if !v.trim().is_empty() => required(field, v, max).map(Some),
        _ => Ok(None),
    }
}
