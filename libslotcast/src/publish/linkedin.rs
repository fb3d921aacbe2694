//! LinkedIn publisher
//!
//! Delivers posts through the LinkedIn REST API as UGC shares. Publishing
//! needs the author's member URN, which LinkedIn does not hand out with the
//! token; it is resolved once per user from the `/v2/userinfo` endpoint and
//! cached in memory for the life of the process.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::PublishError;
use crate::publish::{compose_status, Publisher};
use crate::types::{Platform, PlatformCredential};

pub struct LinkedInPublisher {
    api_base: String,
    http: reqwest::Client,
    /// user_id to resolved author URN
    urn_cache: Mutex<HashMap<String, String>>,
}

impl LinkedInPublisher {
    pub fn new(api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            urn_cache: Mutex::new(HashMap::new()),
        }
    }

    /// The author URN for this credential's owner.
    ///
    /// Prefers the URN stored with the credential, then the in-process cache,
    /// and only then asks the API for the member id.
    async fn resolve_author_urn(
        &self,
        credential: &PlatformCredential,
    ) -> Result<String, PublishError> {
        if let Some(urn) = &credential.author_urn {
            return Ok(urn.clone());
        }

        if let Some(urn) = self.urn_cache.lock().unwrap().get(&credential.user_id) {
            return Ok(urn.clone());
        }

        let response = self
            .http
            .get(format!("{}/v2/userinfo", self.api_base))
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(|e| {
                PublishError::RemoteRejected(format!("LinkedIn userinfo request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PublishError::RemoteRejected(format!(
                "LinkedIn userinfo returned {}: {}",
                status, detail
            )));
        }

        let profile: serde_json::Value = response.json().await.map_err(|e| {
            PublishError::RemoteRejected(format!("LinkedIn userinfo parse error: {}", e))
        })?;

        let sub = profile
            .get("sub")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                PublishError::RemoteRejected(
                    "LinkedIn userinfo response missing 'sub' field".to_string(),
                )
            })?;

        let urn = format!("urn:li:person:{}", sub);
        self.urn_cache
            .lock()
            .unwrap()
            .insert(credential.user_id.clone(), urn.clone());

        Ok(urn)
    }
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    fn platform(&self) -> Platform {
        Platform::Linkedin
    }

    async fn publish(
        &self,
        credential: &PlatformCredential,
        title: &str,
        body: &str,
    ) -> Result<String, PublishError> {
        let author_urn = self.resolve_author_urn(credential).await?;
        let status = compose_status(title, body);

        let payload = json!({
            "author": author_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": status },
                    "shareMediaCategory": "NONE"
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
            }
        });

        let response = self
            .http
            .post(format!("{}/v2/ugcPosts", self.api_base))
            .bearer_auth(&credential.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                PublishError::RemoteRejected(format!("LinkedIn share request failed: {}", e))
            })?;

        let http_status = response.status();
        if !http_status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PublishError::RemoteRejected(format!(
                "LinkedIn share returned {}: {}",
                http_status, detail
            )));
        }

        let created: serde_json::Value = response.json().await.map_err(|e| {
            PublishError::RemoteRejected(format!("LinkedIn share response parse error: {}", e))
        })?;

        // The share URN comes back in the body; older API versions only set
        // the X-RestLi-Id header, so fall back to an empty id rather than
        // failing a post that was accepted
        let post_id = created
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(post_id)
    }
}
