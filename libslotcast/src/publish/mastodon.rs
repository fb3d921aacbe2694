//! Mastodon publisher
//!
//! Delivers posts to a Mastodon (or Mastodon-API-compatible) instance using
//! the megalodon library. Tokens are per-user, so a megalodon client is built
//! per publish call rather than held on the publisher.

use async_trait::async_trait;
use megalodon::SNS;

use crate::error::PublishError;
use crate::publish::{compose_status, Publisher};
use crate::types::{Platform, PlatformCredential};

pub struct MastodonPublisher {
    /// The instance URL, normalized to include the scheme
    instance_url: String,
}

impl MastodonPublisher {
    pub fn new(instance: &str) -> Self {
        let instance_url = if instance.starts_with("http://") || instance.starts_with("https://") {
            instance.to_string()
        } else {
            format!("https://{}", instance)
        };

        Self { instance_url }
    }
}

#[async_trait]
impl Publisher for MastodonPublisher {
    fn platform(&self) -> Platform {
        Platform::Mastodon
    }

    async fn publish(
        &self,
        credential: &PlatformCredential,
        title: &str,
        body: &str,
    ) -> Result<String, PublishError> {
        let client = megalodon::generator(
            SNS::Mastodon,
            self.instance_url.clone(),
            Some(credential.access_token.clone()),
            None,
        )
        .map_err(|e| {
            PublishError::RemoteRejected(format!("failed to create Mastodon client: {:?}", e))
        })?;

        let status = compose_status(title, body);

        let response = client
            .post_status(status, None)
            .await
            .map_err(map_megalodon_error)?;

        let post_id = match response.json {
            megalodon::megalodon::PostStatusOutput::Status(status) => status.id,
            megalodon::megalodon::PostStatusOutput::ScheduledStatus(scheduled) => scheduled.id,
        };

        Ok(post_id)
    }
}

/// Map megalodon errors to a remote rejection with the HTTP status, when one
/// can be recovered from the error text, leading the detail.
fn map_megalodon_error(error: megalodon::error::Error) -> PublishError {
    let error_str = error.to_string();

    match extract_http_status(&error_str) {
        Some(code) => {
            PublishError::RemoteRejected(format!("Mastodon returned {}: {}", code, error_str))
        }
        None => PublishError::RemoteRejected(format!("Mastodon request failed: {}", error_str)),
    }
}

/// Best-effort HTTP status extraction from an error message string.
/// Looks for patterns like "HTTP 401", "status 422", "429:".
fn extract_http_status(error_str: &str) -> Option<u16> {
    let prefixes = ["HTTP ", "status ", "code: ", "status_code: "];

    for prefix in &prefixes {
        if let Some(pos) = error_str.find(prefix) {
            let after_prefix = &error_str[pos + prefix.len()..];
            if let Some(code_str) = after_prefix.get(0..3) {
                if let Ok(code) = code_str.parse::<u16>() {
                    if (100..=599).contains(&code) {
                        return Some(code);
                    }
                }
            }
        }
    }

    for (i, window) in error_str.as_bytes().windows(4).enumerate() {
        if window[0].is_ascii_digit()
            && window[1].is_ascii_digit()
            && window[2].is_ascii_digit()
            && (window[3] == b':' || window[3] == b' ')
        {
            if let Ok(code_str) = std::str::from_utf8(&window[0..3]) {
                if let Ok(code) = code_str.parse::<u16>() {
                    if (100..=599).contains(&code) {
                        // Not part of a larger number
                        if i == 0 || !error_str.as_bytes()[i - 1].is_ascii_digit() {
                            return Some(code);
                        }
                    }
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_url_normalization() {
        let publisher = MastodonPublisher::new("mastodon.social");
        assert_eq!(publisher.instance_url, "https://mastodon.social");

        let publisher = MastodonPublisher::new("https://fosstodon.org");
        assert_eq!(publisher.instance_url, "https://fosstodon.org");

        // http:// is preserved for local development instances
        let publisher = MastodonPublisher::new("http://localhost:3000");
        assert_eq!(publisher.instance_url, "http://localhost:3000");
    }

    #[test]
    fn test_platform_identity() {
        let publisher = MastodonPublisher::new("mastodon.social");
        assert_eq!(publisher.platform(), Platform::Mastodon);
    }

    #[test]
    fn test_extract_http_status_with_prefixes() {
        assert_eq!(extract_http_status("HTTP 401 Unauthorized"), Some(401));
        assert_eq!(extract_http_status("status 422"), Some(422));
        assert_eq!(extract_http_status("code: 429"), Some(429));
        assert_eq!(extract_http_status("status_code: 500"), Some(500));
    }

    #[test]
    fn test_extract_http_status_embedded() {
        assert_eq!(extract_http_status("Error: 401: Unauthorized"), Some(401));
        assert_eq!(
            extract_http_status("The request failed with HTTP 429 from server"),
            Some(429)
        );
    }

    #[test]
    fn test_extract_http_status_no_code() {
        assert_eq!(extract_http_status("connection refused"), None);
        assert_eq!(extract_http_status("parse error"), None);
    }

    #[test]
    fn test_extract_http_status_invalid_code() {
        assert_eq!(extract_http_status("HTTP 999"), None);
        assert_eq!(extract_http_status("HTTP 99"), None);
        assert_eq!(extract_http_status("1234"), None);
    }
}
