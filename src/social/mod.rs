//! Social media posting handlers.
//!
//! Every handler publishes a post and then a reply to it carrying the
//! reasoning behind the bets.

pub mod farcaster;
pub mod mock;
pub mod twitter;

use async_trait::async_trait;

use crate::error::SocialError;

pub use farcaster::FarcasterHandler;
pub use mock::RecordingHandler;
pub use twitter::TwitterHandler;

/// Publishes content to one social platform.
#[async_trait]
pub trait SocialMediaHandler: Send + Sync {
    /// Platform name used in logs and metrics.
    fn platform(&self) -> &'static str;

    /// Publish `text` and reply to it with `reasoning_reply`.
    async fn post(&self, text: &str, reasoning_reply: &str) -> Result<(), SocialError>;
}

/// Read a non-2xx response into a `PostFailed` error.
pub(crate) async fn post_failed(platform: &'static str, response: reqwest::Response) -> SocialError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SocialError::PostFailed {
        platform,
        status,
        body,
    }
}
