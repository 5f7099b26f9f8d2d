//! Omen market functions: redeem winnings and create markets.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::Result;
use crate::market::{CreateMarketRequest, MarketClient};
use crate::telemetry;
use crate::utils::to_datetime_utc;

use super::{arg_decimal, arg_str, expect_arity, AgentFunction};

/// Redeem winnings from resolved positions.
pub struct RedeemWinningBets {
    client: Arc<dyn MarketClient>,
}

impl RedeemWinningBets {
    /// Create the function over a market client.
    pub fn new(client: Arc<dyn MarketClient>) -> Self {
        Self { client }
    }

    /// Redeem everything and report the balance change.
    #[instrument(skip(self))]
    pub async fn redeem(&self) -> Result<String> {
        let prev_balance = self.client.get_balance().await?;
        self.client.redeem_all_positions().await?;
        telemetry::inc_redeem_calls();
        let new_balance = self.client.get_balance().await?;

        let redeemed = new_balance - prev_balance;
        info!(prev = %prev_balance, new = %new_balance, redeemed = %redeemed, "Redeemed positions");

        if redeemed > Decimal::ZERO {
            Ok(format!(
                "Redeemed {} USD in winnings. New balance: {} USD.",
                redeemed, new_balance
            ))
        } else {
            Ok(format!(
                "No winnings to redeem. Balance remains: {} USD.",
                new_balance
            ))
        }
    }
}

#[async_trait]
impl AgentFunction for RedeemWinningBets {
    fn name(&self) -> &'static str {
        "RedeemWinningBets"
    }

    fn description(&self) -> String {
        "Use this function to redeem winnings from a position that you opened which has already \
been resolved. Use this to retrieve funds from a bet you placed in a market, after the market \
has been resolved. If you have outstanding winnings to be redeemed, your balance will be updated."
            .to_string()
    }

    fn example_args(&self) -> Vec<Value> {
        Vec::new()
    }

    async fn call(&self, args: &[Value]) -> Result<String> {
        expect_arity(self.name(), args, 0)?;
        self.redeem().await
    }
}

/// Create a new binary market on Omen.
pub struct CreatePredictionMarket {
    client: Arc<dyn MarketClient>,
}

impl CreatePredictionMarket {
    /// Create the function over a market client.
    pub fn new(client: Arc<dyn MarketClient>) -> Self {
        Self { client }
    }

    /// Create a test-category Yes/No market closing at `closing_time`.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        question: &str,
        liquidity_usd: Decimal,
        closing_time: &str,
    ) -> Result<String> {
        let closing_time = to_datetime_utc(closing_time)?;
        let request = CreateMarketRequest::binary(question, liquidity_usd, closing_time);

        let created = self.client.create_market(&request).await?;
        telemetry::inc_markets_created();
        info!(address = %created.market_address, url = %created.url, "Created market");

        Ok(format!(
            "Created prediction market with id {} at url {}.",
            created.market_address, created.url
        ))
    }
}

#[async_trait]
impl AgentFunction for CreatePredictionMarket {
    fn name(&self) -> &'static str {
        "CreatePredictionMarket"
    }

    fn description(&self) -> String {
        "Use this function to create a new prediction market on Omen.
Question of the prediction market can only be binary, in the Yes/No format.
Questions can not have violent nature.
Question must be explicit and as clear as possible.
You need to provide liquidity in USD to incentivize other users to participate in the market. \
The bigger the liquidity, the more likely the market will be successful.
"
        .to_string()
    }

    fn example_args(&self) -> Vec<Value> {
        vec![
            json!("Will GNO hit $1000 dollars by the end of 2024?"),
            json!(1.0),
            json!("2024-12-31T23:59:59Z"),
        ]
    }

    async fn call(&self, args: &[Value]) -> Result<String> {
        expect_arity(self.name(), args, 3)?;
        let question = arg_str(self.name(), args, 0)?;
        let liquidity = arg_decimal(self.name(), args, 1)?;
        let closing_time = arg_str(self.name(), args, 2)?;
        self.create(question, liquidity, closing_time).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::market::{MockConfig, MockMarketClient};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn redeem_reports_positive_delta() {
        let client = Arc::new(MockMarketClient::new());
        client.set_balances([dec!(10), dec!(12.5)]);

        let result = RedeemWinningBets::new(client.clone()).call(&[]).await.unwrap();

        assert_eq!(
            result,
            "Redeemed 2.5 USD in winnings. New balance: 12.5 USD."
        );
        assert_eq!(client.redeem_calls(), 1);
    }

    #[tokio::test]
    async fn redeem_reports_no_winnings_for_zero_delta() {
        let client = Arc::new(MockMarketClient::new());
        client.set_balances([dec!(10)]);

        let result = RedeemWinningBets::new(client).redeem().await.unwrap();
        assert_eq!(result, "No winnings to redeem. Balance remains: 10 USD.");
    }

    #[tokio::test]
    async fn redeem_reports_no_winnings_for_negative_delta() {
        let client = Arc::new(MockMarketClient::new());
        client.set_balances([dec!(10), dec!(9.99)]);

        let result = RedeemWinningBets::new(client).redeem().await.unwrap();
        assert_eq!(result, "No winnings to redeem. Balance remains: 9.99 USD.");
    }

    #[tokio::test]
    async fn redeem_propagates_backend_failure() {
        let client = Arc::new(MockMarketClient::with_config(MockConfig {
            fail_redeem: true,
            ..Default::default()
        }));

        let err = RedeemWinningBets::new(client).redeem().await.unwrap_err();
        assert!(matches!(err, AgentError::Market(_)));
    }

    #[tokio::test]
    async fn redeem_rejects_arguments() {
        let client = Arc::new(MockMarketClient::new());
        let err = RedeemWinningBets::new(client)
            .call(&[json!("x")])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn create_market_uses_fixed_category_and_outcomes() {
        let client = Arc::new(MockMarketClient::new());
        let function = CreatePredictionMarket::new(client.clone());

        let result = function.call(&function.example_args()).await.unwrap();

        assert_eq!(
            result,
            "Created prediction market with id 0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359 at url \
https://presagio.pages.dev/markets?id=0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359."
        );

        let created = client.created_markets();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].question, "Will GNO hit $1000 dollars by the end of 2024?");
        assert_eq!(created[0].initial_funds, dec!(1));
        assert_eq!(
            created[0].closing_time,
            Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()
        );
        assert_eq!(created[0].category, "test");
        assert_eq!(created[0].outcomes, vec!["Yes".to_string(), "No".to_string()]);
    }

    #[tokio::test]
    async fn create_market_rejects_malformed_closing_time() {
        let client = Arc::new(MockMarketClient::new());
        let err = CreatePredictionMarket::new(client.clone())
            .create("Will it rain?", dec!(1), "next tuesday")
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::InvalidTimestamp { .. }));
        assert!(client.created_markets().is_empty());
    }

    #[tokio::test]
    async fn create_market_propagates_backend_failure() {
        let client = Arc::new(MockMarketClient::with_config(MockConfig {
            fail_create: true,
            ..Default::default()
        }));
        let err = CreatePredictionMarket::new(client)
            .create("Will it rain?", dec!(1), "2030-01-01")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Market(_)));
    }

    #[tokio::test]
    async fn create_market_checks_argument_types() {
        let client = Arc::new(MockMarketClient::new());
        let err = CreatePredictionMarket::new(client)
            .call(&[json!(42), json!(1.0), json!("2030-01-01")])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidArguments { .. }));
    }
}
