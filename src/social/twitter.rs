//! Twitter/X posting through the v2 API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{ApiKeys, Config};
use crate::error::SocialError;

use super::{post_failed, SocialMediaHandler};

const PLATFORM: &str = "twitter";

/// Posts tweets with an OAuth 2.0 user-context token.
#[derive(Debug, Clone)]
pub struct TwitterHandler {
    http: reqwest::Client,
    api_url: String,
    access_token: String,
}

#[derive(Debug, Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplySettings<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: PublishedTweet,
}

#[derive(Debug, Deserialize)]
struct PublishedTweet {
    id: String,
}

impl TwitterHandler {
    /// Create a handler; fails when no access token is configured.
    pub fn new(config: &Config, keys: &ApiKeys, http: reqwest::Client) -> Result<Self, SocialError> {
        let access_token = keys
            .twitter_access_token
            .clone()
            .ok_or(SocialError::MissingCredentials(PLATFORM))?;

        Ok(Self {
            http,
            api_url: config.twitter_api_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Publish a tweet, optionally in reply to `in_reply_to`, returning its ID.
    #[instrument(skip(self, text))]
    pub async fn tweet(&self, text: &str, in_reply_to: Option<&str>) -> Result<String, SocialError> {
        let request = TweetRequest {
            text,
            reply: in_reply_to.map(|id| ReplySettings {
                in_reply_to_tweet_id: id,
            }),
        };

        let response = self
            .http
            .post(format!("{}/2/tweets", self.api_url))
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(post_failed(PLATFORM, response).await);
        }

        let published: TweetResponse = response.json().await.map_err(|e| SocialError::ParseError {
            platform: PLATFORM,
            reason: e.to_string(),
        })?;

        debug!(id = %published.data.id, "Tweet published");
        Ok(published.data.id)
    }
}

#[async_trait]
impl SocialMediaHandler for TwitterHandler {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn post(&self, text: &str, reasoning_reply: &str) -> Result<(), SocialError> {
        let id = self.tweet(text, None).await?;
        let reply_id = self.tweet(reasoning_reply, Some(&id)).await?;
        info!(tweet = %id, reply = %reply_id, "Posted to Twitter");
        Ok(())
    }
}
