use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (stories, parent settings, bookmarks)");
        conn.execute_batch(
            "
            CREATE TABLE stories (
                id                TEXT PRIMARY KEY,
                user_id           TEXT NOT NULL,
                title             TEXT NOT NULL,
                content           TEXT NOT NULL,
                summary           TEXT NOT NULL,
                image_url         TEXT NOT NULL,
                voiceover_url     TEXT,
                status            TEXT NOT NULL DEFAULT 'draft'
                    CHECK (status IN ('draft', 'pending_review', 'published', 'rejected')),
                approved_by       TEXT,
                rejection_reason  TEXT,
                created_at        TEXT NOT NULL,
                reviewed_at       TEXT
            );

            CREATE INDEX idx_stories_status ON stories(status, created_at);
            CREATE INDEX idx_stories_owner ON stories(user_id, created_at);

            CREATE TABLE parent_settings (
                user_id                  TEXT PRIMARY KEY,
                pin_hash                 TEXT NOT NULL,
                reading_time_limit       INTEGER NOT NULL
                    CHECK (reading_time_limit BETWEEN 10 AND 60),
                fullscreen_lock_enabled  INTEGER NOT NULL,
                theme                    TEXT NOT NULL CHECK (theme IN ('day', 'night')),
                is_admin                 INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE bookmarks (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL,
                story_id    TEXT NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, story_id)
            );

            CREATE INDEX idx_bookmarks_user ON bookmarks(user_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
