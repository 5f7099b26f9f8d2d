//! Text generation for social posts.
//!
//! The prompts live here; the model behind them is an external
//! OpenAI-compatible chat-completions endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::{ApiKeys, Config};
use crate::error::LlmError;
use crate::market::Bet;
use crate::memory::MemoryEntry;

const SOCIAL_MEDIA_SYSTEM_PROMPT: &str = "You are a prediction market trader who shares \
their latest bets on social media. Write in a confident, concise tone. Do not use hashtags. \
Never exceed 280 characters.";

const REPLY_SYSTEM_PROMPT: &str = "You explain the reasoning behind prediction market bets. \
Ground the explanation in the agent's own notes when they are relevant. Be factual and brief. \
Never exceed 280 characters.";

/// Generates the text the deploy agent publishes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Primary post summarising the bets. `None` when nothing usable was produced.
    async fn build_social_media_text(&self, bets: &[Bet]) -> Result<Option<String>, LlmError>;

    /// Reply to `tweet` explaining the reasoning, drawing on `memories`.
    async fn build_reply_tweet(
        &self,
        tweet: &str,
        bets: &[Bet],
        memories: &[MemoryEntry],
    ) -> Result<Option<String>, LlmError>;
}

/// Chat-completions text generator.
#[derive(Debug, Clone)]
pub struct OpenAiTextGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiTextGenerator {
    /// Create a generator from config.
    pub fn new(config: &Config, keys: &ApiKeys, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: keys.openai_api_key.clone(),
            model: config.openai_model.clone(),
        }
    }

    /// Model used for completions.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<Option<String>, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed { status, body });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        debug!(produced = text.is_some(), "Completion received");

        Ok(text)
    }
}

/// One line per bet: question, outcome and stake.
pub fn format_bets(bets: &[Bet]) -> String {
    bets.iter()
        .map(|b| {
            format!(
                "- \"{}\": bet {} USD on {}",
                b.market_question,
                b.amount.round_dp(2),
                b.outcome
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Memory contents, oldest first, one per line.
pub fn format_memories(memories: &[MemoryEntry]) -> String {
    memories
        .iter()
        .map(|m| format!("- [{}] {}", m.datetime.format("%Y-%m-%d %H:%M"), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    #[instrument(skip(self, bets), fields(bets = bets.len()))]
    async fn build_social_media_text(&self, bets: &[Bet]) -> Result<Option<String>, LlmError> {
        let prompt = format!(
            "Write one post announcing the following bets placed in the last day.\n\n{}",
            format_bets(bets)
        );
        self.complete(SOCIAL_MEDIA_SYSTEM_PROMPT, &prompt).await
    }

    #[instrument(skip(self, tweet, bets, memories), fields(memories = memories.len()))]
    async fn build_reply_tweet(
        &self,
        tweet: &str,
        bets: &[Bet],
        memories: &[MemoryEntry],
    ) -> Result<Option<String>, LlmError> {
        let notes = if memories.is_empty() {
            "(no notes)".to_string()
        } else {
            format_memories(memories)
        };
        let prompt = format!(
            "Post:\n{}\n\nBets:\n{}\n\nAgent notes:\n{}\n\nWrite a reply to the post explaining the reasoning behind these bets.",
            tweet,
            format_bets(bets),
            notes
        );
        self.complete(REPLY_SYSTEM_PROMPT, &prompt).await
    }
}
