//! Mock market client for unit testing.
//!
//! This module provides a mock client that can be used in tests
//! without making real network requests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::MarketError;

use super::client::MarketClient;
use super::types::{omen_market_url, Bet, CreateMarketRequest, CreatedMarket};

/// Configuration for mock client behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail balance requests.
    pub fail_balance: bool,
    /// Whether to fail redeem requests.
    pub fail_redeem: bool,
    /// Whether to fail market creation.
    pub fail_create: bool,
    /// Whether to fail bet queries.
    pub fail_bets: bool,
}

#[derive(Debug, Default)]
struct MockState {
    balances: VecDeque<Decimal>,
    bets: Vec<Bet>,
    redeem_calls: usize,
    created: Vec<CreateMarketRequest>,
    bet_queries: Vec<(String, DateTime<Utc>)>,
}

/// Mock market client for testing.
#[derive(Debug, Clone)]
pub struct MockMarketClient {
    /// Mock configuration.
    config: MockConfig,
    /// Scripted responses and recorded calls.
    state: Arc<Mutex<MockState>>,
    /// Address reported for created markets.
    market_address: String,
}

impl MockMarketClient {
    /// Create a new mock client with default configuration.
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// Create a mock client with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(MockState::default())),
            market_address: "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".to_string(),
        }
    }

    /// Script successive balance readings. The last one repeats.
    pub fn set_balances(&self, balances: impl IntoIterator<Item = Decimal>) {
        self.state.lock().unwrap().balances = balances.into_iter().collect();
    }

    /// Set the bets returned by every bet query.
    pub fn set_bets(&self, bets: Vec<Bet>) {
        self.state.lock().unwrap().bets = bets;
    }

    /// Number of redeem calls received.
    pub fn redeem_calls(&self) -> usize {
        self.state.lock().unwrap().redeem_calls
    }

    /// Market creation requests received.
    pub fn created_markets(&self) -> Vec<CreateMarketRequest> {
        self.state.lock().unwrap().created.clone()
    }

    /// Bet queries received as `(address, since)`.
    pub fn bet_queries(&self) -> Vec<(String, DateTime<Utc>)> {
        self.state.lock().unwrap().bet_queries.clone()
    }

    /// Address reported for created markets.
    pub fn market_address(&self) -> &str {
        &self.market_address
    }
}

impl Default for MockMarketClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketClient for MockMarketClient {
    async fn get_balance(&self) -> Result<Decimal, MarketError> {
        if self.config.fail_balance {
            return Err(MarketError::FetchFailed {
                what: "balance".to_string(),
                reason: "Mock balance failure".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        let balance = if state.balances.len() > 1 {
            state.balances.pop_front()
        } else {
            state.balances.front().copied()
        };
        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    async fn redeem_all_positions(&self) -> Result<(), MarketError> {
        if self.config.fail_redeem {
            return Err(MarketError::RelayFailed {
                operation: "redeem",
                status: 500,
                body: "Mock redeem failure".to_string(),
            });
        }

        self.state.lock().unwrap().redeem_calls += 1;
        Ok(())
    }

    async fn create_market(&self, request: &CreateMarketRequest) -> Result<CreatedMarket, MarketError> {
        if self.config.fail_create {
            return Err(MarketError::RelayFailed {
                operation: "create market",
                status: 500,
                body: "Mock create failure".to_string(),
            });
        }

        self.state.lock().unwrap().created.push(request.clone());
        Ok(CreatedMarket {
            market_address: self.market_address.clone(),
            url: omen_market_url(&self.market_address),
        })
    }

    async fn get_bets_made_since(
        &self,
        better_address: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Bet>, MarketError> {
        if self.config.fail_bets {
            return Err(MarketError::FetchFailed {
                what: "bets".to_string(),
                reason: "Mock bets failure".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        state.bet_queries.push((better_address.to_string(), since));
        Ok(state
            .bets
            .iter()
            .filter(|b| b.created_time >= since)
            .cloned()
            .collect())
    }
}

/// Builder for bets with sensible defaults.
pub struct BetBuilder {
    bet: Bet,
}

impl BetBuilder {
    /// Start a bet on the given market question, placed now.
    pub fn new(market_question: impl Into<String>) -> Self {
        Self {
            bet: Bet {
                id: "0xbet".to_string(),
                market_question: market_question.into(),
                market_id: None,
                amount: Decimal::ONE,
                outcome: "Yes".to_string(),
                created_time: Utc::now(),
            },
        }
    }

    /// Set the bet ID.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.bet.id = id.into();
        self
    }

    /// Set the stake.
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.bet.amount = amount;
        self
    }

    /// Set the outcome label.
    pub fn outcome(mut self, outcome: impl Into<String>) -> Self {
        self.bet.outcome = outcome.into();
        self
    }

    /// Set the placement time.
    pub fn created_time(mut self, created_time: DateTime<Utc>) -> Self {
        self.bet.created_time = created_time;
        self
    }

    /// Build the bet.
    pub fn build(self) -> Bet {
        self.bet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn mock_client_balance_sequence() {
        let client = MockMarketClient::new();
        client.set_balances([dec!(10), dec!(12.5)]);

        assert_eq!(client.get_balance().await.unwrap(), dec!(10));
        assert_eq!(client.get_balance().await.unwrap(), dec!(12.5));
        // Last reading repeats
        assert_eq!(client.get_balance().await.unwrap(), dec!(12.5));
    }

    #[tokio::test]
    async fn mock_client_filters_bets_by_time() {
        let client = MockMarketClient::new();
        let now = Utc::now();
        client.set_bets(vec![
            BetBuilder::new("old").created_time(now - Duration::days(2)).build(),
            BetBuilder::new("new").created_time(now).build(),
        ]);

        let bets = client
            .get_bets_made_since("0xabc", now - Duration::days(1))
            .await
            .unwrap();

        assert_eq!(bets.len(), 1);
        assert_eq!(bets[0].market_question, "new");
        assert_eq!(client.bet_queries().len(), 1);
    }

    #[tokio::test]
    async fn mock_client_failure_modes() {
        let client = MockMarketClient::with_config(MockConfig {
            fail_balance: true,
            fail_redeem: true,
            ..Default::default()
        });

        assert!(client.get_balance().await.is_err());
        assert!(client.redeem_all_positions().await.is_err());
        assert_eq!(client.redeem_calls(), 0);
    }

    #[test]
    fn bet_builder_defaults() {
        let bet = BetBuilder::new("Q").amount(dec!(2)).outcome("No").build();
        assert_eq!(bet.market_question, "Q");
        assert_eq!(bet.amount, dec!(2));
        assert_eq!(bet.outcome, "No");
    }
}
