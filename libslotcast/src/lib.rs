//! Slotcast - slot-based scheduling and dispatch for social media posts
//!
//! This library provides the core functionality for queueing posts against a
//! user's weekly schedule and delivering them to connected platforms when
//! their slot comes around.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod publish;
pub mod queue;
pub mod schedule;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use dispatch::{Dispatcher, TickReport};
pub use error::{PublishError, Result, SlotcastError};
pub use queue::enqueue_scheduled;
pub use schedule::{next_slot, Weekday, WeeklySlot};
pub use types::{Platform, PlatformCredential, PostStatus, QueuedPost, UserQueue};
