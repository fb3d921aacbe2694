//! Queueing service
//!
//! Enqueueing is where scheduling happens: the post's publication time is
//! resolved from the user's weekly slots once, at creation, and never
//! recomputed afterwards. Later slot changes affect only posts enqueued
//! after the change.

use chrono::NaiveDateTime;
use tracing::info;

use crate::db::Database;
use crate::error::{Result, SlotcastError};
use crate::schedule::{next_slot, to_epoch};
use crate::types::{Platform, QueuedPost};

/// Create a queued post scheduled for the user's next available slot.
///
/// Fails with `InvalidInput` when title or body is blank and with
/// `NoScheduleAvailable` when the user has no weekly slots; a post is never
/// silently scheduled for "now".
pub async fn enqueue_scheduled(
    db: &Database,
    user_id: &str,
    platform: Platform,
    title: &str,
    body: &str,
    now: NaiveDateTime,
) -> Result<QueuedPost> {
    if title.trim().is_empty() {
        return Err(SlotcastError::InvalidInput(
            "post title cannot be empty".to_string(),
        ));
    }
    if body.trim().is_empty() {
        return Err(SlotcastError::InvalidInput(
            "post body cannot be empty".to_string(),
        ));
    }

    let slots = db.list_slots(user_id).await?;
    let scheduled_for = next_slot(now, &slots).ok_or(SlotcastError::NoScheduleAvailable)?;

    let post = QueuedPost::new(user_id, platform, title, body, to_epoch(scheduled_for));
    db.enqueue(&post).await?;

    info!(
        post_id = %post.id,
        user_id = %user_id,
        platform = platform.as_str(),
        scheduled_for = %scheduled_for,
        "post queued"
    );

    Ok(post)
}
