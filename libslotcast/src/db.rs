//! Database operations for Slotcast
//!
//! Single SQLite store behind a `sqlx` pool. The pool is created once at
//! process start and handed to whoever needs it (the `Database` handle is a
//! cheap clone); nothing reaches for a global connection.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::error::{DbError, Result};
use crate::schedule::{Weekday, WeeklySlot};
use crate::types::{Platform, PlatformCredential, PostStatus, QueuedPost, UserQueue};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at the given path and run migrations.
    /// The special path ":memory:" opens an in-memory database.
    pub async fn new(db_path: &str) -> Result<Self> {
        let db_url = if db_path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            let expanded_path = shellexpand::tilde(db_path).to_string();
            let path = Path::new(&expanded_path);

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }

            // Forward slashes for the SQLite URL; mode=rwc creates the file
            // if it does not exist
            format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"))
        };

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    // ------------------------------------------------------------------
    // Queued posts
    // ------------------------------------------------------------------

    /// Insert a new queued post
    pub async fn enqueue(&self, post: &QueuedPost) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO queued_posts
                (id, user_id, platform, title, body, scheduled_at, status, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.user_id)
        .bind(post.platform.as_str())
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.scheduled_at)
        .bind(post.status.as_str())
        .bind(post.published_at)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    /// All queued posts whose scheduled time is at or before `now`, ordered
    /// by scheduled time ascending. Published posts never appear here.
    pub async fn find_due(&self, now: i64) -> Result<Vec<QueuedPost>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, platform, title, body, scheduled_at, status, published_at, created_at
            FROM queued_posts
            WHERE status = 'queued' AND scheduled_at <= ?
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(map_post_row).collect()
    }

    /// Transition a post to published. Guarded by the current status so the
    /// transition happens at most once; returns whether a row changed.
    pub async fn mark_published(&self, post_id: &str, published_at: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE queued_posts
            SET status = 'published', published_at = ?
            WHERE id = ? AND status = 'queued'
            "#,
        )
        .bind(published_at)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a post by ID
    pub async fn get_post(&self, post_id: &str) -> Result<Option<QueuedPost>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, platform, title, body, scheduled_at, status, published_at, created_at
            FROM queued_posts WHERE id = ?
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.as_ref().map(map_post_row).transpose()
    }

    /// A user's posts split into pending and published, newest scheduled
    /// first within each bucket
    pub async fn list_by_user(&self, user_id: &str) -> Result<UserQueue> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, platform, title, body, scheduled_at, status, published_at, created_at
            FROM queued_posts
            WHERE user_id = ?
            ORDER BY scheduled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let mut queue = UserQueue::default();
        for row in &rows {
            let post = map_post_row(row)?;
            match post.status {
                PostStatus::Queued => queue.pending.push(post),
                PostStatus::Published => queue.published.push(post),
            }
        }

        Ok(queue)
    }

    /// Delete a still-queued post. Published posts persist as history and
    /// cannot be deleted here; returns whether a row was removed.
    pub async fn delete_post(&self, post_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM queued_posts WHERE id = ? AND status = 'queued'
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Weekly slots
    // ------------------------------------------------------------------

    /// Add a weekly slot and return its assigned id
    pub async fn add_slot(&self, slot: &WeeklySlot) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO weekly_slots (user_id, day_of_week, time_of_day)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&slot.user_id)
        .bind(slot.day.as_str())
        .bind(slot.time.format("%H:%M").to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_slots(&self, user_id: &str) -> Result<Vec<WeeklySlot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, day_of_week, time_of_day
            FROM weekly_slots
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter().map(map_slot_row).collect()
    }

    pub async fn delete_slot(&self, slot_id: i64) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM weekly_slots WHERE id = ?"#)
            .bind(slot_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Platform credentials (read side; rows are written by the OAuth flow)
    // ------------------------------------------------------------------

    /// The current credential for (user, platform): the most recently issued
    /// row. `None` means the user never connected that platform.
    pub async fn get_credential(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<PlatformCredential>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, platform, access_token, author_urn, issued_at
            FROM platform_credentials
            WHERE user_id = ? AND platform = ?
            ORDER BY issued_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        row.as_ref().map(map_credential_row).transpose()
    }

    /// Replace the credential for (user, platform), keeping at most one
    /// current row per pair
    pub async fn set_credential(&self, credential: &PlatformCredential) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(DbError::SqlxError)?;

        sqlx::query(r#"DELETE FROM platform_credentials WHERE user_id = ? AND platform = ?"#)
            .bind(&credential.user_id)
            .bind(credential.platform.as_str())
            .execute(&mut *tx)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::query(
            r#"
            INSERT INTO platform_credentials (user_id, platform, access_token, author_urn, issued_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&credential.user_id)
        .bind(credential.platform.as_str())
        .bind(&credential.access_token)
        .bind(&credential.author_urn)
        .bind(credential.issued_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::SqlxError)?;

        tx.commit().await.map_err(DbError::SqlxError)?;
        Ok(())
    }
}

fn map_post_row(row: &sqlx::sqlite::SqliteRow) -> Result<QueuedPost> {
    let platform_tag: String = row.get("platform");
    let platform = Platform::from_str(&platform_tag)
        .map_err(|_| DbError::UnknownPlatform(platform_tag.clone()))?;

    Ok(QueuedPost {
        id: row.get("id"),
        user_id: row.get("user_id"),
        platform,
        title: row.get("title"),
        body: row.get("body"),
        scheduled_at: row.get("scheduled_at"),
        status: match row.get::<String, _>("status").as_str() {
            "published" => PostStatus::Published,
            _ => PostStatus::Queued,
        },
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    })
}

fn map_slot_row(row: &sqlx::sqlite::SqliteRow) -> Result<WeeklySlot> {
    let day_tag: String = row.get("day_of_week");
    let day = Weekday::from_str(&day_tag)
        .map_err(|_| DbError::CorruptValue(format!("weekday '{}'", day_tag)))?;

    let time_tag: String = row.get("time_of_day");
    let time = chrono::NaiveTime::parse_from_str(&time_tag, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(&time_tag, "%H:%M:%S"))
        .map_err(|_| DbError::CorruptValue(format!("time '{}'", time_tag)))?;

    Ok(WeeklySlot {
        id: Some(row.get("id")),
        user_id: row.get("user_id"),
        day,
        time,
    })
}

fn map_credential_row(row: &sqlx::sqlite::SqliteRow) -> Result<PlatformCredential> {
    let platform_tag: String = row.get("platform");
    let platform = Platform::from_str(&platform_tag)
        .map_err(|_| DbError::UnknownPlatform(platform_tag.clone()))?;

    Ok(PlatformCredential {
        id: Some(row.get("id")),
        user_id: row.get("user_id"),
        platform,
        access_token: row.get("access_token"),
        author_urn: row.get("author_urn"),
        issued_at: row.get("issued_at"),
    })
}
