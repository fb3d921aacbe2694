//! Publisher abstraction and implementations
//!
//! A `Publisher` knows how to deliver one composed post to one external
//! network. Implementations are stateless with respect to users; the caller
//! passes the per-user credential with every publish call, so a single
//! publisher instance serves every connected account on that network.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::PublishError;
use crate::types::{Platform, PlatformCredential};

pub mod linkedin;
pub mod mastodon;

// Mock publisher is available for all builds to support integration tests
pub mod mock;

/// Unified interface for delivering a post to an external network
#[async_trait]
pub trait Publisher: Send + Sync {
    /// The network this publisher delivers to
    fn platform(&self) -> Platform;

    /// Deliver one post on behalf of the credential's owner.
    ///
    /// Returns the network-assigned identifier of the created post. Errors
    /// are remote rejections; deciding whether a credential exists at all is
    /// the caller's job, so `NotConnected` is never produced here.
    async fn publish(
        &self,
        credential: &PlatformCredential,
        title: &str,
        body: &str,
    ) -> Result<String, PublishError>;
}

/// Compose the outgoing status text from a post's title and body.
///
/// Every network receives the same composition: title, blank line, body.
pub fn compose_status(title: &str, body: &str) -> String {
    format!("{}\n\n{}", title, body)
}

/// The set of publishers the dispatcher can route to, keyed by platform.
///
/// A platform absent from the registry (disabled in config, or simply not
/// built) surfaces as `PublishError::UnsupportedPlatform` at dispatch time.
#[derive(Default)]
pub struct PublisherRegistry {
    publishers: HashMap<Platform, Box<dyn Publisher>>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, publisher: Box<dyn Publisher>) {
        self.publishers.insert(publisher.platform(), publisher);
    }

    pub fn get(&self, platform: Platform) -> Option<&dyn Publisher> {
        self.publishers.get(&platform).map(|p| p.as_ref())
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.publishers.keys().copied().collect();
        platforms.sort_by_key(|p| p.as_str());
        platforms
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

/// Build the registry of enabled publishers from configuration.
///
/// A platform section that is missing or has `enabled = false` produces no
/// publisher; posts queued for it stay queued and are reported as
/// unsupported each tick.
pub fn create_publishers(config: &Config) -> PublisherRegistry {
    let mut registry = PublisherRegistry::new();

    if let Some(mastodon) = &config.mastodon {
        if mastodon.enabled {
            registry.insert(Box::new(mastodon::MastodonPublisher::new(
                &mastodon.instance,
            )));
        }
    }

    if let Some(linkedin) = &config.linkedin {
        if linkedin.enabled {
            registry.insert(Box::new(linkedin::LinkedInPublisher::new(
                &linkedin.api_base,
            )));
        }
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, LinkedInConfig, MastodonConfig};

    fn config_with(mastodon_enabled: bool, linkedin_enabled: bool) -> Config {
        Config {
            database: DatabaseConfig {
                path: ":memory:".to_string(),
            },
            dispatch: Default::default(),
            mastodon: Some(MastodonConfig {
                enabled: mastodon_enabled,
                instance: "mastodon.social".to_string(),
            }),
            linkedin: Some(LinkedInConfig {
                enabled: linkedin_enabled,
                api_base: "https://api.linkedin.com".to_string(),
            }),
        }
    }

    #[test]
    fn test_compose_status() {
        assert_eq!(compose_status("Title", "Body"), "Title\n\nBody");
    }

    #[test]
    fn test_create_publishers_all_enabled() {
        let registry = create_publishers(&config_with(true, true));
        assert!(registry.get(Platform::Mastodon).is_some());
        assert!(registry.get(Platform::Linkedin).is_some());
        assert_eq!(
            registry.platforms(),
            vec![Platform::Linkedin, Platform::Mastodon]
        );
    }

    #[test]
    fn test_create_publishers_respects_enabled_flag() {
        let registry = create_publishers(&config_with(true, false));
        assert!(registry.get(Platform::Mastodon).is_some());
        assert!(registry.get(Platform::Linkedin).is_none());
    }

    #[test]
    fn test_create_publishers_missing_sections() {
        let config = Config {
            database: DatabaseConfig {
                path: ":memory:".to_string(),
            },
            dispatch: Default::default(),
            mastodon: None,
            linkedin: None,
        };
        let registry = create_publishers(&config);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_routes_by_platform() {
        let mut registry = PublisherRegistry::new();
        registry.insert(Box::new(mock::MockPublisher::success(Platform::Mastodon)));

        let publisher = registry.get(Platform::Mastodon).unwrap();
        assert_eq!(publisher.platform(), Platform::Mastodon);
        assert!(registry.get(Platform::Linkedin).is_none());
    }
}
