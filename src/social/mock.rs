//! Recording handler for tests and dry runs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::error::SocialError;

use super::SocialMediaHandler;

/// Handler that records posts instead of publishing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    posts: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl RecordingHandler {
    /// Handler that accepts every post.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that rejects every post.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Posts received as `(text, reasoning_reply)`.
    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SocialMediaHandler for RecordingHandler {
    fn platform(&self) -> &'static str {
        "recording"
    }

    async fn post(&self, text: &str, reasoning_reply: &str) -> Result<(), SocialError> {
        if self.fail {
            return Err(SocialError::PostFailed {
                platform: "recording",
                status: 500,
                body: "Mock post failure".to_string(),
            });
        }

        info!(text = %text, reply = %reasoning_reply, "Recorded post");
        self.posts
            .lock()
            .unwrap()
            .push((text.to_string(), reasoning_reply.to_string()));
        Ok(())
    }
}
