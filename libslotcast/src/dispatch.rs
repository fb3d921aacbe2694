//! Periodic dispatch of due posts
//!
//! The dispatcher is the only writer of the queued-to-published transition.
//! Each tick scans the store for due posts and walks them one at a time; a
//! failure on one post never blocks the rest of the batch, and a post that
//! cannot be delivered simply stays queued for the next tick.

use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{PublishError, Result};
use crate::publish::PublisherRegistry;
use crate::schedule::to_epoch;
use crate::types::QueuedPost;

/// What happened to one due post during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Published,
    /// The owner never connected the target platform; stays queued
    NotConnected,
    /// The remote API rejected the delivery; stays queued
    Rejected,
    /// No publisher is registered for the target platform; stays queued
    Unsupported,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Published => "published",
            DispatchOutcome::NotConnected => "not_connected",
            DispatchOutcome::Rejected => "rejected",
            DispatchOutcome::Unsupported => "unsupported",
        }
    }
}

/// Summary of one dispatch tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub published: usize,
    pub not_connected: usize,
    pub rejected: usize,
    pub unsupported: usize,
}

impl TickReport {
    fn record(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Published => self.published += 1,
            DispatchOutcome::NotConnected => self.not_connected += 1,
            DispatchOutcome::Rejected => self.rejected += 1,
            DispatchOutcome::Unsupported => self.unsupported += 1,
        }
    }
}

pub struct Dispatcher {
    db: Database,
    registry: PublisherRegistry,
}

impl Dispatcher {
    pub fn new(db: Database, registry: PublisherRegistry) -> Self {
        Self { db, registry }
    }

    /// Run one dispatch tick at the given "now".
    ///
    /// Every queued post with `scheduled_at <= now` is attempted once,
    /// independently of the others. Only a store failure aborts the tick;
    /// publish failures are logged, counted, and leave the post queued.
    pub async fn run_tick(&self, now: NaiveDateTime) -> Result<TickReport> {
        let now_epoch = to_epoch(now);
        let due = self.db.find_due(now_epoch).await?;

        let mut report = TickReport {
            due: due.len(),
            ..Default::default()
        };

        if due.is_empty() {
            debug!("no posts due");
            return Ok(report);
        }

        info!(due = due.len(), "dispatching due posts");

        for post in &due {
            let outcome = self.dispatch_one(post).await?;
            report.record(outcome);
        }

        info!(
            due = report.due,
            published = report.published,
            not_connected = report.not_connected,
            rejected = report.rejected,
            unsupported = report.unsupported,
            "tick complete"
        );

        Ok(report)
    }

    /// Attempt delivery of a single post.
    ///
    /// Returns `Err` only for store failures; every publish-side failure is
    /// folded into the outcome so the caller keeps going.
    async fn dispatch_one(&self, post: &QueuedPost) -> Result<DispatchOutcome> {
        let publisher = match self.registry.get(post.platform) {
            Some(publisher) => publisher,
            None => {
                warn!(
                    post_id = %post.id,
                    platform = post.platform.as_str(),
                    outcome = DispatchOutcome::Unsupported.as_str(),
                    "no publisher registered for platform"
                );
                return Ok(DispatchOutcome::Unsupported);
            }
        };

        let credential = match self.db.get_credential(&post.user_id, post.platform).await? {
            Some(credential) => credential,
            None => {
                warn!(
                    post_id = %post.id,
                    user_id = %post.user_id,
                    platform = post.platform.as_str(),
                    outcome = DispatchOutcome::NotConnected.as_str(),
                    "user has not connected this platform"
                );
                return Ok(DispatchOutcome::NotConnected);
            }
        };

        match publisher.publish(&credential, &post.title, &post.body).await {
            Ok(remote_id) => {
                // published_at is the moment this post's delivery finished,
                // not the tick start; posts in a slow batch get distinct times
                let completed_at = to_epoch(chrono::Utc::now().naive_utc());
                let transitioned = self.db.mark_published(&post.id, completed_at).await?;
                if !transitioned {
                    // Someone else already published it; nothing to undo
                    debug!(post_id = %post.id, "post was no longer queued");
                }
                info!(
                    post_id = %post.id,
                    platform = post.platform.as_str(),
                    remote_id = %remote_id,
                    outcome = DispatchOutcome::Published.as_str(),
                    "post published"
                );
                Ok(DispatchOutcome::Published)
            }
            Err(error) => {
                let outcome = match &error {
                    PublishError::NotConnected(_) => DispatchOutcome::NotConnected,
                    PublishError::UnsupportedPlatform(_) => DispatchOutcome::Unsupported,
                    PublishError::RemoteRejected(_) => DispatchOutcome::Rejected,
                };
                warn!(
                    post_id = %post.id,
                    platform = post.platform.as_str(),
                    outcome = outcome.as_str(),
                    detail = %error,
                    "publish failed; post stays queued"
                );
                Ok(outcome)
            }
        }
    }

    /// Run ticks forever, `poll_interval` seconds apart, until `shutdown` is
    /// set. Ticks never overlap; the next sleep starts after the previous
    /// tick finishes.
    pub async fn run_loop(&self, poll_interval: u64, shutdown: Arc<AtomicBool>) -> Result<()> {
        // A zero interval would spin against the store between ticks
        let poll_interval = poll_interval.max(1);
        info!(poll_interval, "dispatch loop started");

        while !shutdown.load(Ordering::Relaxed) {
            let now = chrono::Utc::now().naive_utc();
            if let Err(e) = self.run_tick(now).await {
                // Store errors end the tick, not the daemon
                warn!(error = %e, "tick aborted");
            }

            // Sleep in short slices so shutdown is honored promptly
            let mut remaining = poll_interval;
            while remaining > 0 && !shutdown.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_secs(1)).await;
                remaining -= 1;
            }
        }

        info!("dispatch loop stopped");
        Ok(())
    }
}
