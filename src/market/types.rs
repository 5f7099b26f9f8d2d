//! Market-related types shared by the agent functions and the deploy agent.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::MarketError;

/// Category assigned to markets created by the agent, keeping them off the
/// public front page.
pub const TEST_CATEGORY: &str = "test";

/// Outcome set of a binary Omen market.
pub const OMEN_BINARY_MARKET_OUTCOMES: [&str; 2] = ["Yes", "No"];

/// Base URL of the Omen market front end.
pub const PRESAGIO_BASE_URL: &str = "https://presagio.pages.dev";

/// Prediction market platforms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MarketType {
    /// Omen on Gnosis chain.
    #[default]
    Omen,
    /// Manifold.
    Manifold,
    /// Polymarket.
    Polymarket,
    /// Metaculus.
    Metaculus,
}

/// A bet placed on a market. Read-only input to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    /// Backend identifier of the bet.
    pub id: String,
    /// Question of the market the bet was placed on.
    pub market_question: String,
    /// Market identifier, when known.
    pub market_id: Option<String>,
    /// Amount staked in USD.
    pub amount: Decimal,
    /// Outcome label the bet was placed on.
    pub outcome: String,
    /// When the bet was placed.
    pub created_time: DateTime<Utc>,
}

/// Parameters of a market creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateMarketRequest {
    /// Binary Yes/No question.
    pub question: String,
    /// Initial liquidity in USD.
    pub initial_funds: Decimal,
    /// Closing time, UTC.
    pub closing_time: DateTime<Utc>,
    /// Market category.
    pub category: String,
    /// Outcome labels.
    pub outcomes: Vec<String>,
    /// Question language.
    pub language: String,
    /// Wrap native xDai into collateral automatically.
    pub auto_deposit: bool,
}

impl CreateMarketRequest {
    /// Binary test-category market as created by the agent functions.
    pub fn binary(question: impl Into<String>, initial_funds: Decimal, closing_time: DateTime<Utc>) -> Self {
        Self {
            question: question.into(),
            initial_funds,
            closing_time,
            category: TEST_CATEGORY.to_string(),
            outcomes: OMEN_BINARY_MARKET_OUTCOMES
                .iter()
                .map(|o| o.to_string())
                .collect(),
            language: "en".to_string(),
            auto_deposit: true,
        }
    }
}

/// A freshly created market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMarket {
    /// Checksummed address of the market maker contract.
    pub market_address: String,
    /// Front-end URL of the market.
    pub url: String,
}

/// Front-end URL of an Omen market.
pub fn omen_market_url(market_address: &str) -> String {
    format!(
        "{}/markets?id={}",
        PRESAGIO_BASE_URL,
        market_address.to_lowercase()
    )
}

/// Trade entity returned by the Omen subgraph.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphTrade {
    /// Trade ID.
    pub id: String,
    /// Market title.
    pub title: String,
    /// Stake in USD (decimal string).
    #[serde(rename = "collateralAmountUSD")]
    pub collateral_amount_usd: String,
    /// Outcome index (decimal string).
    pub outcome_index: String,
    /// Unix timestamp (decimal string).
    pub creation_timestamp: String,
    /// Market the trade belongs to.
    pub fpmm: SubgraphFpmm,
}

/// Market maker reference inside a subgraph trade.
#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphFpmm {
    /// Market maker address.
    pub id: String,
    /// Outcome labels.
    #[serde(default)]
    pub outcomes: Option<Vec<String>>,
}

impl TryFrom<SubgraphTrade> for Bet {
    type Error = MarketError;

    fn try_from(trade: SubgraphTrade) -> Result<Self, Self::Error> {
        let amount: Decimal = trade.collateral_amount_usd.parse().map_err(|e| {
            MarketError::ParseError(format!("collateralAmountUSD '{}': {}", trade.collateral_amount_usd, e))
        })?;
        let outcome_index: usize = trade.outcome_index.parse().map_err(|e| {
            MarketError::ParseError(format!("outcomeIndex '{}': {}", trade.outcome_index, e))
        })?;
        let seconds: i64 = trade.creation_timestamp.parse().map_err(|e| {
            MarketError::ParseError(format!("creationTimestamp '{}': {}", trade.creation_timestamp, e))
        })?;
        let created_time = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| MarketError::ParseError(format!("timestamp out of range: {}", seconds)))?;

        let outcome = trade
            .fpmm
            .outcomes
            .as_ref()
            .and_then(|outcomes| outcomes.get(outcome_index).cloned())
            .unwrap_or_else(|| outcome_index.to_string());

        Ok(Bet {
            id: trade.id,
            market_question: trade.title,
            market_id: Some(trade.fpmm.id),
            amount,
            outcome,
            created_time,
        })
    }
}
