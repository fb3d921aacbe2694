//! Core types for Slotcast

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External platform a post is destined for.
///
/// Adding a platform means adding a variant here plus a publisher adapter in
/// `crate::publish`; the dispatch loop itself never branches on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mastodon,
    Linkedin,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Mastodon, Platform::Linkedin];

    /// Lowercase tag used in the database and in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Mastodon => "mastodon",
            Platform::Linkedin => "linkedin",
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mastodon" => Ok(Platform::Mastodon),
            "linkedin" => Ok(Platform::Linkedin),
            _ => Err(format!(
                "Unknown platform: '{}'. Valid options: mastodon, linkedin",
                s
            )),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a queued post.
///
/// The only transition is `Queued -> Published`, performed exactly once by the
/// dispatch loop. There is no in-band failed or cancelled state; deletion of a
/// still-queued post is a store operation, not a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Queued,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Queued => "queued",
            PostStatus::Published => "published",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of scheduled work: a post waiting in the queue or kept as history
/// after publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedPost {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    pub title: String,
    pub body: String,
    /// Unix timestamp computed once at enqueue time, never recomputed
    pub scheduled_at: i64,
    pub status: PostStatus,
    /// Set exactly once, on the transition to `Published`
    pub published_at: Option<i64>,
    pub created_at: i64,
}

impl QueuedPost {
    pub fn new(
        user_id: impl Into<String>,
        platform: Platform,
        title: impl Into<String>,
        body: impl Into<String>,
        scheduled_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            platform,
            title: title.into(),
            body: body.into(),
            scheduled_at,
            status: PostStatus::Queued,
            published_at: None,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Per-user, per-platform authorization token.
///
/// Owned and refreshed by the OAuth collaborator; the core only reads rows.
/// A missing credential is an expected outcome (the user never connected that
/// platform), not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCredential {
    pub id: Option<i64>,
    pub user_id: String,
    pub platform: Platform,
    pub access_token: String,
    /// Cached LinkedIn member URN; unused for platforms without one
    pub author_urn: Option<String>,
    pub issued_at: i64,
}

/// A user's queue split by status, the read surface the UI polls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQueue {
    pub pending: Vec<QueuedPost>,
    pub published: Vec<QueuedPost>,
}
