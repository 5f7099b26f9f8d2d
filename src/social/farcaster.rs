//! Farcaster posting through the Neynar API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{ApiKeys, Config};
use crate::error::SocialError;

use super::{post_failed, SocialMediaHandler};

const PLATFORM: &str = "farcaster";

/// Posts casts with a Neynar managed signer.
#[derive(Debug, Clone)]
pub struct FarcasterHandler {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    signer_uuid: String,
}

#[derive(Debug, Serialize)]
struct CastRequest<'a> {
    signer_uuid: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CastResponse {
    cast: PublishedCast,
}

#[derive(Debug, Deserialize)]
struct PublishedCast {
    hash: String,
}

impl FarcasterHandler {
    /// Create a handler; fails when Neynar credentials are missing.
    pub fn new(config: &Config, keys: &ApiKeys, http: reqwest::Client) -> Result<Self, SocialError> {
        let api_key = keys
            .neynar_api_key
            .clone()
            .ok_or(SocialError::MissingCredentials(PLATFORM))?;
        let signer_uuid = keys
            .farcaster_signer_uuid
            .clone()
            .ok_or(SocialError::MissingCredentials(PLATFORM))?;

        Ok(Self {
            http,
            api_url: config.neynar_api_url.trim_end_matches('/').to_string(),
            api_key,
            signer_uuid,
        })
    }

    /// Publish a cast, optionally as a reply to `parent`, returning its hash.
    #[instrument(skip(self, text))]
    pub async fn cast(&self, text: &str, parent: Option<&str>) -> Result<String, SocialError> {
        let request = CastRequest {
            signer_uuid: &self.signer_uuid,
            text,
            parent,
        };

        let response = self
            .http
            .post(format!("{}/v2/farcaster/cast", self.api_url))
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(post_failed(PLATFORM, response).await);
        }

        let published: CastResponse = response.json().await.map_err(|e| SocialError::ParseError {
            platform: PLATFORM,
            reason: e.to_string(),
        })?;

        debug!(hash = %published.cast.hash, "Cast published");
        Ok(published.cast.hash)
    }
}

#[async_trait]
impl SocialMediaHandler for FarcasterHandler {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn post(&self, text: &str, reasoning_reply: &str) -> Result<(), SocialError> {
        let hash = self.cast(text, None).await?;
        let reply_hash = self.cast(reasoning_reply, Some(&hash)).await?;
        info!(cast = %hash, reply = %reply_hash, "Posted to Farcaster");
        Ok(())
    }
}
