use crate::Database;
use crate::models::{
    NewStory, SettingsRow, StatsRow, StoryRow, Transition, UserSummaryRow,
};
use anyhow::{Result, anyhow};
use bedtime_types::models::{StoryStatus, Theme};
use bedtime_types::moderation::{ReviewDecision, StoryAction, StoryPatch};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

const STORY_COLUMNS: &str = "id, user_id, title, content, summary, image_url, voiceover_url, \
     status, approved_by, rejection_reason, created_at, reviewed_at";

/// Stored timestamp format. Fixed precision keeps lexical order equal to time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Database {
    // -- Stories --

    pub fn insert_story(&self, story: &NewStory<'_>) -> Result<StoryRow> {
        let status = story
            .review
            .map(|r| r.status)
            .unwrap_or(StoryStatus::Draft);

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO stories (id, user_id, title, content, summary, image_url, voiceover_url,
                                      status, approved_by, rejection_reason, created_at, reviewed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    story.id,
                    story.user_id,
                    story.draft.title,
                    story.draft.content,
                    story.draft.summary,
                    story.draft.image_url,
                    story.draft.voiceover_url,
                    status.as_str(),
                    story.review.map(|r| r.approved_by.as_str()),
                    story.review.and_then(|r| r.rejection_reason.as_deref()),
                    format_timestamp(story.created_at),
                    story.review.map(|r| format_timestamp(r.reviewed_at)),
                ],
            )?;

            query_story(conn, story.id)?
                .ok_or_else(|| anyhow!("Story vanished after insert: {}", story.id))
        })
    }

    /// Stories in `status`, newest first. `limit: None` returns all of them.
    pub fn list_stories_by_status(
        &self,
        status: StoryStatus,
        limit: Option<u32>,
    ) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            query_stories(
                conn,
                &format!(
                    "SELECT {STORY_COLUMNS} FROM stories WHERE status = ?1
                     ORDER BY created_at DESC LIMIT ?2"
                ),
                rusqlite::params![status.as_str(), limit.map(i64::from).unwrap_or(-1)],
            )
        })
    }

    pub fn list_stories_by_owner(&self, user_id: &str) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            query_stories(
                conn,
                &format!(
                    "SELECT {STORY_COLUMNS} FROM stories WHERE user_id = ?1
                     ORDER BY created_at DESC"
                ),
                [user_id],
            )
        })
    }

    pub fn list_all_stories(&self) -> Result<Vec<StoryRow>> {
        self.with_conn(|conn| {
            query_stories(
                conn,
                &format!("SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC"),
                [],
            )
        })
    }

    /// Returns false if no story had this id. Its bookmarks go with it.
    pub fn delete_story(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM stories WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Workflow transitions --
    //
    // Each transition is one UPDATE guarded by the required status, so two
    // racing callers cannot both apply it. When nothing changed, the same
    // transaction reads the row back to report why.

    /// draft -> pending_review, owner only.
    pub fn submit_story(&self, id: &str, owner: &str) -> Result<Transition> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE stories SET status = ?1
                 WHERE id = ?2 AND user_id = ?3 AND status = ?4",
                rusqlite::params![
                    StoryStatus::PendingReview.as_str(),
                    id,
                    owner,
                    StoryAction::Submit.required_status().as_str(),
                ],
            )?;
            let outcome = settle(&tx, id, Some(owner), changed)?;
            tx.commit()?;
            Ok(outcome)
        })
    }

    /// Apply a content patch to a draft, owner only. Status and review fields
    /// are never touched.
    pub fn edit_story(&self, id: &str, owner: &str, patch: &StoryPatch) -> Result<Transition> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE stories SET
                    title = COALESCE(?1, title),
                    content = COALESCE(?2, content),
                    summary = COALESCE(?3, summary),
                    image_url = COALESCE(?4, image_url),
                    voiceover_url = CASE WHEN ?5 THEN ?6 ELSE voiceover_url END
                 WHERE id = ?7 AND user_id = ?8 AND status = ?9",
                rusqlite::params![
                    patch.title,
                    patch.content,
                    patch.summary,
                    patch.image_url,
                    patch.voiceover_url.is_some(),
                    patch.voiceover_url.clone().flatten(),
                    id,
                    owner,
                    StoryAction::Edit.required_status().as_str(),
                ],
            )?;
            let outcome = settle(&tx, id, Some(owner), changed)?;
            tx.commit()?;
            Ok(outcome)
        })
    }

    /// pending_review -> published or back to draft.
    pub fn review_story(&self, id: &str, decision: &ReviewDecision) -> Result<Transition> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE stories SET
                    status = ?1,
                    approved_by = ?2,
                    reviewed_at = ?3,
                    rejection_reason = ?4
                 WHERE id = ?5 AND status = ?6",
                rusqlite::params![
                    decision.status.as_str(),
                    decision.approved_by,
                    format_timestamp(decision.reviewed_at),
                    decision.rejection_reason,
                    id,
                    StoryAction::Review.required_status().as_str(),
                ],
            )?;
            let outcome = settle(&tx, id, None, changed)?;
            tx.commit()?;
            Ok(outcome)
        })
    }

    // -- Parent settings --

    /// Insert or update the parent-editable fields. `is_admin` is not among
    /// them: new rows take the column default and updates leave it alone.
    pub fn upsert_settings(
        &self,
        user_id: &str,
        pin_hash: &str,
        reading_time_limit: u32,
        fullscreen_lock_enabled: bool,
        theme: Theme,
    ) -> Result<SettingsRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO parent_settings
                    (user_id, pin_hash, reading_time_limit, fullscreen_lock_enabled, theme)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET
                    pin_hash = excluded.pin_hash,
                    reading_time_limit = excluded.reading_time_limit,
                    fullscreen_lock_enabled = excluded.fullscreen_lock_enabled,
                    theme = excluded.theme",
                rusqlite::params![
                    user_id,
                    pin_hash,
                    reading_time_limit,
                    fullscreen_lock_enabled,
                    theme.as_str(),
                ],
            )?;

            query_settings(conn, user_id)?
                .ok_or_else(|| anyhow!("Settings vanished after upsert: {}", user_id))
        })
    }

    pub fn get_settings(&self, user_id: &str) -> Result<Option<SettingsRow>> {
        self.with_conn(|conn| query_settings(conn, user_id))
    }

    /// False when the user has no settings row.
    pub fn is_admin(&self, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let flag: Option<bool> = conn
                .query_row(
                    "SELECT is_admin FROM parent_settings WHERE user_id = ?1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(flag.unwrap_or(false))
        })
    }

    /// Operator-only path for the admin flag. Not reachable from the HTTP API.
    /// Returns false if the user has no settings row yet.
    pub fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE parent_settings SET is_admin = ?1 WHERE user_id = ?2",
                rusqlite::params![is_admin, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.user_id, p.reading_time_limit, p.fullscreen_lock_enabled, p.theme,
                        p.is_admin, COUNT(s.id)
                 FROM parent_settings p
                 LEFT JOIN stories s ON s.user_id = p.user_id
                 GROUP BY p.user_id
                 ORDER BY p.user_id",
            )?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(UserSummaryRow {
                        user_id: row.get(0)?,
                        reading_time_limit: row.get(1)?,
                        fullscreen_lock_enabled: row.get(2)?,
                        theme: row.get(3)?,
                        is_admin: row.get(4)?,
                        story_count: row.get::<_, i64>(5)? as u64,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Bookmarks --

    /// Bookmark a story for a user. Repeating a bookmark is a no-op.
    /// Returns false unless the story is published or owned by the user.
    pub fn add_bookmark(
        &self,
        id: &str,
        user_id: &str,
        story_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let exists: Option<String> = tx
                .query_row(
                    "SELECT id FROM stories
                     WHERE id = ?1 AND (status = ?2 OR user_id = ?3)",
                    rusqlite::params![story_id, StoryStatus::Published.as_str(), user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(false);
            }

            tx.execute(
                "INSERT OR IGNORE INTO bookmarks (id, user_id, story_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, user_id, story_id, format_timestamp(created_at)],
            )?;
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn remove_bookmark(&self, user_id: &str, story_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM bookmarks WHERE user_id = ?1 AND story_id = ?2",
                [user_id, story_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn list_bookmarked_story_ids(&self, user_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT story_id FROM bookmarks WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;
            let ids = stmt
                .query_map([user_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(ids)
        })
    }

    // -- Admin reporting --

    /// Platform counters. `recent_since` bounds the "recent stories" count.
    pub fn stats(&self, recent_since: DateTime<Utc>) -> Result<StatsRow> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM parent_settings),
                    (SELECT COUNT(*) FROM stories),
                    (SELECT COUNT(*) FROM bookmarks),
                    (SELECT COUNT(*) FROM stories WHERE created_at >= ?1),
                    (SELECT COUNT(*) FROM stories WHERE status = ?2),
                    (SELECT COUNT(*) FROM stories WHERE status = ?3)",
                rusqlite::params![
                    format_timestamp(recent_since),
                    StoryStatus::PendingReview.as_str(),
                    StoryStatus::Published.as_str(),
                ],
                |row| {
                    Ok(StatsRow {
                        total_users: row.get::<_, i64>(0)? as u64,
                        total_stories: row.get::<_, i64>(1)? as u64,
                        total_bookmarks: row.get::<_, i64>(2)? as u64,
                        recent_stories: row.get::<_, i64>(3)? as u64,
                        pending_stories: row.get::<_, i64>(4)? as u64,
                        published_stories: row.get::<_, i64>(5)? as u64,
                    })
                },
            )?;
            Ok(row)
        })
    }
}

/// Turn the row count of a guarded UPDATE into a [`Transition`].
fn settle(conn: &Connection, id: &str, owner: Option<&str>, changed: usize) -> Result<Transition> {
    let current = query_story(conn, id)?;

    if changed > 0 {
        return current
            .map(Transition::Applied)
            .ok_or_else(|| anyhow!("Story vanished after update: {}", id));
    }

    Ok(match current {
        None => Transition::NotFound,
        Some(row) if owner.is_some_and(|o| o != row.user_id) => Transition::NotFound,
        Some(row) => Transition::WrongStatus(row.status),
    })
}

fn story_from_row(row: &Row<'_>) -> rusqlite::Result<StoryRow> {
    let status: String = row.get(7)?;
    let status = status
        .parse::<StoryStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(StoryRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        summary: row.get(4)?,
        image_url: row.get(5)?,
        voiceover_url: row.get(6)?,
        status,
        approved_by: row.get(8)?,
        rejection_reason: row.get(9)?,
        created_at: row.get(10)?,
        reviewed_at: row.get(11)?,
    })
}

fn query_story(conn: &Connection, id: &str) -> Result<Option<StoryRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = ?1"))?;
    let row = stmt.query_row([id], story_from_row).optional()?;
    Ok(row)
}

fn query_stories<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<StoryRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, story_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_settings(conn: &Connection, user_id: &str) -> Result<Option<SettingsRow>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, pin_hash, reading_time_limit, fullscreen_lock_enabled, theme, is_admin
         FROM parent_settings WHERE user_id = ?1",
    )?;

    let row = stmt
        .query_row([user_id], |row| {
            Ok(SettingsRow {
                user_id: row.get(0)?,
                pin_hash: row.get(1)?,
                reading_time_limit: row.get(2)?,
                fullscreen_lock_enabled: row.get(3)?,
                theme: row.get(4)?,
                is_admin: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedtime_types::api::ReviewAction;
    use bedtime_types::moderation::StoryDraft;
    use chrono::Duration;
    use std::sync::Barrier;
    use std::thread;

    fn draft(title: &str) -> StoryDraft {
        StoryDraft {
            title: title.into(),
            content: "Once upon a time".into(),
            summary: "A short tale".into(),
            image_url: "https://img.example/moon.png".into(),
            voiceover_url: None,
        }
    }

    fn insert(db: &Database, owner: &str, title: &str, created_at: DateTime<Utc>) -> StoryRow {
        let id = uuid::Uuid::new_v4().to_string();
        db.insert_story(&NewStory {
            id: &id,
            user_id: owner,
            draft: &draft(title),
            review: None,
            created_at,
        })
        .unwrap()
    }

    fn settings(db: &Database, user_id: &str) -> SettingsRow {
        db.upsert_settings(user_id, "$argon2id$stub", 20, true, Theme::Night)
            .unwrap()
    }

    fn applied(t: Transition) -> StoryRow {
        match t {
            Transition::Applied(row) => row,
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[test]
    fn new_story_starts_as_draft() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());
        assert_eq!(row.status, StoryStatus::Draft);
        assert_eq!(row.approved_by, None);
        assert_eq!(row.reviewed_at, None);
    }

    #[test]
    fn admin_story_is_inserted_published() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        let review = ReviewDecision::admin_authored("admin-1", now);
        let row = db
            .insert_story(&NewStory {
                id: "s-1",
                user_id: "admin-1",
                draft: &draft("Stars"),
                review: Some(&review),
                created_at: now,
            })
            .unwrap();
        assert_eq!(row.status, StoryStatus::Published);
        assert_eq!(row.approved_by.as_deref(), Some("admin-1"));
        assert_eq!(row.reviewed_at, Some(format_timestamp(now)));
    }

    #[test]
    fn submit_requires_owner_and_draft() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());

        assert!(matches!(
            db.submit_story(&row.id, "parent-2").unwrap(),
            Transition::NotFound
        ));
        assert!(matches!(
            db.submit_story("missing", "parent-1").unwrap(),
            Transition::NotFound
        ));

        let submitted = applied(db.submit_story(&row.id, "parent-1").unwrap());
        assert_eq!(submitted.status, StoryStatus::PendingReview);

        assert!(matches!(
            db.submit_story(&row.id, "parent-1").unwrap(),
            Transition::WrongStatus(StoryStatus::PendingReview)
        ));
    }

    #[test]
    fn edit_patches_only_given_fields_of_a_draft() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());
        db.edit_story(
            &row.id,
            "parent-1",
            &StoryPatch {
                voiceover_url: Some(Some("https://audio.example/moon.mp3".into())),
                ..Default::default()
            },
        )
        .unwrap();

        let edited = applied(
            db.edit_story(
                &row.id,
                "parent-1",
                &StoryPatch {
                    content: Some("A new ending".into()),
                    voiceover_url: Some(None),
                    ..Default::default()
                },
            )
            .unwrap(),
        );
        assert_eq!(edited.title, "Moon");
        assert_eq!(edited.content, "A new ending");
        assert_eq!(edited.voiceover_url, None);
        assert_eq!(edited.status, StoryStatus::Draft);

        db.submit_story(&row.id, "parent-1").unwrap();
        assert!(matches!(
            db.edit_story(
                &row.id,
                "parent-1",
                &StoryPatch {
                    title: Some("Sneaky".into()),
                    ..Default::default()
                },
            )
            .unwrap(),
            Transition::WrongStatus(StoryStatus::PendingReview)
        ));
    }

    #[test]
    fn review_only_applies_to_pending_stories() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());
        let approve =
            ReviewDecision::new(ReviewAction::Approve, "admin-1", None, Utc::now()).unwrap();

        assert!(matches!(
            db.review_story(&row.id, &approve).unwrap(),
            Transition::WrongStatus(StoryStatus::Draft)
        ));
        assert!(matches!(
            db.review_story("missing", &approve).unwrap(),
            Transition::NotFound
        ));
    }

    #[test]
    fn reject_then_approve_cycle() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());
        db.submit_story(&row.id, "parent-1").unwrap();

        let reject = ReviewDecision::new(
            ReviewAction::Reject,
            "admin-1",
            Some("needs work".into()),
            Utc::now(),
        )
        .unwrap();
        let rejected = applied(db.review_story(&row.id, &reject).unwrap());
        assert_eq!(rejected.status, StoryStatus::Draft);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("needs work"));
        assert_eq!(rejected.approved_by.as_deref(), Some("admin-1"));
        assert!(rejected.reviewed_at.is_some());

        let edited = applied(
            db.edit_story(
                &row.id,
                "parent-1",
                &StoryPatch {
                    content: Some("Better".into()),
                    ..Default::default()
                },
            )
            .unwrap(),
        );
        assert_eq!(edited.rejection_reason.as_deref(), Some("needs work"));

        let resubmitted = applied(db.submit_story(&row.id, "parent-1").unwrap());
        assert_eq!(resubmitted.status, StoryStatus::PendingReview);
        assert_eq!(resubmitted.rejection_reason.as_deref(), Some("needs work"));

        let approve =
            ReviewDecision::new(ReviewAction::Approve, "admin-2", None, Utc::now()).unwrap();
        let published = applied(db.review_story(&row.id, &approve).unwrap());
        assert_eq!(published.status, StoryStatus::Published);
        assert_eq!(published.rejection_reason, None);
        assert_eq!(published.approved_by.as_deref(), Some("admin-2"));
    }

    #[test]
    fn published_listing_is_newest_first_and_filtered() {
        let db = Database::open_in_memory().unwrap();
        let base = Utc::now();
        let approve = ReviewDecision::new(ReviewAction::Approve, "admin", None, base).unwrap();

        for (i, title) in ["old", "mid", "new"].iter().enumerate() {
            let row = insert(&db, "parent-1", title, base + Duration::seconds(i as i64));
            db.submit_story(&row.id, "parent-1").unwrap();
            db.review_story(&row.id, &approve).unwrap();
        }
        insert(&db, "parent-1", "hidden draft", base + Duration::seconds(10));

        let titles: Vec<String> = db
            .list_stories_by_status(StoryStatus::Published, None)
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["new", "mid", "old"]);

        let limited = db
            .list_stories_by_status(StoryStatus::Published, Some(2))
            .unwrap();
        assert_eq!(limited.len(), 2);

        assert_eq!(db.list_stories_by_owner("parent-1").unwrap()[0].title, "hidden draft");
        assert!(db.list_stories_by_owner("parent-2").unwrap().is_empty());
    }

    #[test]
    fn settings_upsert_never_touches_admin_flag() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.is_admin("parent-1").unwrap());
        assert!(!db.set_admin("parent-1", true).unwrap());

        let row = settings(&db, "parent-1");
        assert!(!row.is_admin);
        assert_eq!(row.theme, "night");

        assert!(db.set_admin("parent-1", true).unwrap());
        let row = db
            .upsert_settings("parent-1", "$argon2id$other", 45, false, Theme::Day)
            .unwrap();
        assert!(row.is_admin);
        assert_eq!(row.reading_time_limit, 45);
        assert_eq!(row.pin_hash, "$argon2id$other");

        assert!(db.set_admin("parent-1", false).unwrap());
        assert!(!db.is_admin("parent-1").unwrap());
    }

    #[test]
    fn out_of_range_reading_limit_is_refused_by_schema() {
        let db = Database::open_in_memory().unwrap();
        assert!(db
            .upsert_settings("parent-1", "$argon2id$stub", 5, false, Theme::Day)
            .is_err());
    }

    #[test]
    fn bookmarks_are_unique_and_follow_their_story() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());

        assert!(db.add_bookmark("b-1", "parent-1", &row.id, Utc::now()).unwrap());
        assert!(db.add_bookmark("b-2", "parent-1", &row.id, Utc::now()).unwrap());
        assert!(!db.add_bookmark("b-3", "parent-1", "missing", Utc::now()).unwrap());
        assert!(!db.add_bookmark("b-4", "parent-2", &row.id, Utc::now()).unwrap());
        assert!(db.list_bookmarked_story_ids("parent-2").unwrap().is_empty());
        assert_eq!(db.list_bookmarked_story_ids("parent-1").unwrap(), [row.id.clone()]);

        assert!(db.delete_story(&row.id).unwrap());
        assert!(db.list_bookmarked_story_ids("parent-1").unwrap().is_empty());
        assert!(!db.delete_story(&row.id).unwrap());
        assert!(!db.remove_bookmark("parent-1", &row.id).unwrap());
    }

    #[test]
    fn stats_and_user_summaries() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        settings(&db, "parent-1");
        settings(&db, "parent-2");
        let old = insert(&db, "parent-1", "Old", now - Duration::days(30));
        let fresh = insert(&db, "parent-1", "Fresh", now);
        db.submit_story(&fresh.id, "parent-1").unwrap();
        assert!(db.add_bookmark("b-1", "parent-1", &old.id, now).unwrap());

        let stats = db.stats(now - Duration::days(7)).unwrap();
        assert_eq!(
            stats,
            StatsRow {
                total_users: 2,
                total_stories: 2,
                total_bookmarks: 1,
                recent_stories: 1,
                pending_stories: 1,
                published_stories: 0,
            }
        );

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "parent-1");
        assert_eq!(users[0].story_count, 2);
        assert_eq!(users[1].story_count, 0);
    }

    #[test]
    fn racing_submits_apply_once() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());
        let barrier = Barrier::new(2);
        let (db, barrier, id) = (&db, &barrier, row.id.as_str());

        let outcomes: Vec<Transition> = thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(move || {
                        barrier.wait();
                        db.submit_story(id, "parent-1").unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let applied = outcomes
            .iter()
            .filter(|t| matches!(t, Transition::Applied(_)))
            .count();
        let lost = outcomes
            .iter()
            .filter(|t| matches!(t, Transition::WrongStatus(StoryStatus::PendingReview)))
            .count();
        assert_eq!((applied, lost), (1, 1));
    }

    #[test]
    fn racing_reviews_apply_once() {
        let db = Database::open_in_memory().unwrap();
        let row = insert(&db, "parent-1", "Moon", Utc::now());
        db.submit_story(&row.id, "parent-1").unwrap();
        let approve =
            ReviewDecision::new(ReviewAction::Approve, "admin-1", None, Utc::now()).unwrap();
        let reject = ReviewDecision::new(ReviewAction::Reject, "admin-2", None, Utc::now()).unwrap();
        let barrier = Barrier::new(2);
        let (db, barrier, id) = (&db, &barrier, row.id.as_str());

        let outcomes: Vec<Transition> = thread::scope(|s| {
            let handles: Vec<_> = [&approve, &reject]
                .into_iter()
                .map(|decision| {
                    s.spawn(move || {
                        barrier.wait();
                        db.review_story(id, decision).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&StoryRow> = outcomes
            .iter()
            .filter_map(|t| match t {
                Transition::Applied(row) => Some(row),
                _ => None,
            })
            .collect();
        assert_eq!(winners.len(), 1);

        let loser_saw = outcomes.iter().find_map(|t| match t {
            Transition::WrongStatus(status) => Some(*status),
            _ => None,
        });
        assert_eq!(loser_saw, Some(winners[0].status));
    }
}
