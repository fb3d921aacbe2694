//! Mock publisher for testing
//!
//! A configurable publisher that can simulate successes, failures, and
//! network latency. The call log and counters live behind `Arc` so a test
//! can keep handles to them after the publisher is boxed into a registry.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::PublishError;
use crate::publish::Publisher;
use crate::types::{Platform, PlatformCredential};

/// One recorded publish call
#[derive(Debug, Clone)]
pub struct PublishedRecord {
    pub user_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Clone)]
pub struct MockPublisher {
    platform: Platform,
    /// Error returned on every publish call; `None` means success
    failure: Option<PublishError>,
    delay: Duration,
    call_count: Arc<Mutex<usize>>,
    published: Arc<Mutex<Vec<PublishedRecord>>>,
}

impl MockPublisher {
    /// A publisher that accepts everything
    pub fn success(platform: Platform) -> Self {
        Self {
            platform,
            failure: None,
            delay: Duration::from_millis(0),
            call_count: Arc::new(Mutex::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A publisher that rejects everything with the given error
    pub fn failing(platform: Platform, error: PublishError) -> Self {
        Self {
            failure: Some(error),
            ..Self::success(platform)
        }
    }

    /// A publisher that sleeps before answering
    pub fn with_delay(platform: Platform, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::success(platform)
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn published(&self) -> Vec<PublishedRecord> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(
        &self,
        credential: &PlatformCredential,
        title: &str,
        body: &str,
    ) -> Result<String, PublishError> {
        *self.call_count.lock().unwrap() += 1;

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        self.published.lock().unwrap().push(PublishedRecord {
            user_id: credential.user_id.clone(),
            title: title.to_string(),
            body: body.to_string(),
        });

        Ok(format!(
            "{}:mock-{}",
            self.platform.as_str(),
            uuid::Uuid::new_v4()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> PlatformCredential {
        PlatformCredential {
            id: None,
            user_id: "alice".to_string(),
            platform: Platform::Mastodon,
            access_token: "token".to_string(),
            author_urn: None,
            issued_at: 1000,
        }
    }

    #[tokio::test]
    async fn test_mock_success() {
        let publisher = MockPublisher::success(Platform::Mastodon);

        let post_id = publisher
            .publish(&credential(), "Title", "Body")
            .await
            .unwrap();
        assert!(post_id.starts_with("mastodon:mock-"));
        assert_eq!(publisher.call_count(), 1);

        let published = publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].user_id, "alice");
        assert_eq!(published[0].title, "Title");
        assert_eq!(published[0].body, "Body");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let publisher = MockPublisher::failing(
            Platform::Mastodon,
            PublishError::RemoteRejected("instance unavailable".to_string()),
        );

        let result = publisher.publish(&credential(), "Title", "Body").await;
        assert!(result.is_err());
        assert_eq!(publisher.call_count(), 1);
        assert!(publisher.published().is_empty());

        let err = result.unwrap_err();
        assert!(err.to_string().contains("instance unavailable"));
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let publisher = MockPublisher::with_delay(Platform::Mastodon, Duration::from_millis(50));

        let start = std::time::Instant::now();
        publisher
            .publish(&credential(), "Title", "Body")
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_clone_shares_call_log() {
        let publisher = MockPublisher::success(Platform::Mastodon);
        let handle = publisher.clone();

        publisher
            .publish(&credential(), "Title", "Body")
            .await
            .unwrap();

        // The clone observes calls made through the original
        assert_eq!(handle.call_count(), 1);
        assert_eq!(handle.published().len(), 1);
    }
}
