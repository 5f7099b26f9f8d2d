//! Scheduled social media agent.
//!
//! Each run looks at the bets placed in the last day, posts a summary with a
//! reasoning reply to every configured platform, and does nothing when there
//! is nothing new to say.

pub mod deploy;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use strum::Display;
use tracing::{info, instrument, warn};

use crate::config::{ApiKeys, Config};
use crate::error::{AgentError, MarketError, Result};
use crate::llm::{OpenAiTextGenerator, TextGenerator};
use crate::market::{Bet, MarketClient, MarketType, OmenClient};
use crate::memory::{LongTermMemoryHandler, MemoryBackend, THINK_THOROUGHLY};
use crate::social::{FarcasterHandler, SocialMediaHandler, TwitterHandler};
use crate::telemetry;

pub use deploy::{deploy_local, RunStats};

/// How far back each run looks for bets.
pub const LOOKBACK_HOURS: i64 = 24;

/// How a single run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunOutcome {
    /// Post and reply were published to every handler.
    Posted,
    /// No bets in the lookback window.
    NoBets,
    /// The post or the reply came back empty.
    EmptyText,
}

/// Agent that posts about its recent bets.
pub struct DeployableSocialMediaAgent {
    markets: HashMap<MarketType, Arc<dyn MarketClient>>,
    text_generator: Arc<dyn TextGenerator>,
    memory: MemoryBackend,
    social_media_handlers: Vec<Box<dyn SocialMediaHandler>>,
    bet_from_address: String,
}

impl DeployableSocialMediaAgent {
    /// Agent without markets or handlers.
    pub fn new(
        bet_from_address: impl Into<String>,
        text_generator: Arc<dyn TextGenerator>,
        memory: MemoryBackend,
    ) -> Self {
        Self {
            markets: HashMap::new(),
            text_generator,
            memory,
            social_media_handlers: Vec::new(),
            bet_from_address: bet_from_address.into(),
        }
    }

    /// Register the client used for `market_type`.
    pub fn with_market(mut self, market_type: MarketType, client: Arc<dyn MarketClient>) -> Self {
        self.markets.insert(market_type, client);
        self
    }

    /// Append a social media handler.
    pub fn with_handler(mut self, handler: Box<dyn SocialMediaHandler>) -> Self {
        self.social_media_handlers.push(handler);
        self
    }

    /// Build the production agent: Omen market, OpenAI text, Farcaster then
    /// Twitter. Platforms without credentials are skipped with a warning.
    pub async fn load(config: &Config, keys: &ApiKeys) -> Result<Self> {
        let http = config.http_client()?;

        let memory = match &config.database_url {
            Some(url) => MemoryBackend::connect(url).await?,
            None => {
                warn!("DATABASE_URL not set, long-term memory starts empty");
                MemoryBackend::in_memory()
            }
        };

        let omen = OmenClient::new(config, keys, http.clone())?;
        let text_generator = OpenAiTextGenerator::new(config, keys, http.clone());

        let mut agent = Self::new(keys.bet_from_address()?, Arc::new(text_generator), memory)
            .with_market(MarketType::Omen, Arc::new(omen));

        match FarcasterHandler::new(config, keys, http.clone()) {
            Ok(handler) => agent = agent.with_handler(Box::new(handler)),
            Err(e) => warn!("Farcaster disabled: {}", e),
        }
        match TwitterHandler::new(config, keys, http) {
            Ok(handler) => agent = agent.with_handler(Box::new(handler)),
            Err(e) => warn!("Twitter disabled: {}", e),
        }

        Ok(agent)
    }

    /// Platforms posts go to, in posting order.
    pub fn platforms(&self) -> Vec<&'static str> {
        self.social_media_handlers.iter().map(|h| h.platform()).collect()
    }

    /// Address whose bets are posted about.
    pub fn bet_from_address(&self) -> &str {
        &self.bet_from_address
    }

    /// One scheduled run.
    #[instrument(skip(self))]
    pub async fn run(&self, market_type: MarketType) -> Result<RunOutcome> {
        telemetry::inc_runs_started();

        let one_day_ago = Utc::now() - Duration::hours(LOOKBACK_HOURS);
        let bets = self
            .get_unique_bets_for_market(market_type, one_day_ago)
            .await?;

        if bets.is_empty() {
            info!("No bets available from last day. No post will be created.");
            telemetry::inc_runs_skipped("no_bets");
            return Ok(RunOutcome::NoBets);
        }

        let long_term_memory =
            LongTermMemoryHandler::from_agent_identifier(&self.memory, THINK_THOROUGHLY);
        let memories = long_term_memory.search(one_day_ago).await?;

        let tweet = self.text_generator.build_social_media_text(&bets).await?;
        let reasoning_reply_tweet = match tweet.as_deref() {
            Some(text) if !text.is_empty() => {
                self.text_generator
                    .build_reply_tweet(text, &bets, &memories)
                    .await?
            }
            _ => None,
        };

        self.post(tweet.as_deref(), reasoning_reply_tweet.as_deref())
            .await
    }

    /// Bets placed by the agent since `start_time`, one per market question.
    pub async fn get_unique_bets_for_market(
        &self,
        market_type: MarketType,
        start_time: DateTime<Utc>,
    ) -> Result<Vec<Bet>> {
        let client = self
            .markets
            .get(&market_type)
            .ok_or(AgentError::Market(MarketError::UnsupportedMarket(market_type)))?;

        let bets = client
            .get_bets_made_since(&self.bet_from_address, start_time)
            .await?;
        let fetched = bets.len();
        let unique = unique_bets_by_question(bets);

        info!(fetched, unique = unique.len(), "Loaded bets");
        Ok(unique)
    }

    /// Publish to every handler in order; skip entirely unless both texts are
    /// present and non-empty.
    pub async fn post(
        &self,
        tweet: Option<&str>,
        reasoning_reply_tweet: Option<&str>,
    ) -> Result<RunOutcome> {
        let (tweet, reply) = match (tweet, reasoning_reply_tweet) {
            (Some(t), Some(r)) if !t.is_empty() && !r.is_empty() => (t, r),
            _ => {
                info!("No tweet was produced. Exiting.");
                telemetry::inc_runs_skipped("empty_text");
                return Ok(RunOutcome::EmptyText);
            }
        };

        for handler in &self.social_media_handlers {
            handler.post(tweet, reply).await?;
            telemetry::inc_posts_published(handler.platform());
        }

        Ok(RunOutcome::Posted)
    }
}

/// Keep one bet per market question. A later bet replaces an earlier one
/// with the same question but keeps the question's first position.
pub fn unique_bets_by_question(bets: Vec<Bet>) -> Vec<Bet> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Bet> = Vec::new();

    for bet in bets {
        match positions.get(&bet.market_question) {
            Some(&index) => unique[index] = bet,
            None => {
                positions.insert(bet.market_question.clone(), unique.len());
                unique.push(bet);
            }
        }
    }

    unique
}
