//! Omen market backend client.
//!
//! Reads come from public infrastructure: bets from the Omen subgraph and
//! balances from the Gnosis JSON-RPC endpoint. Writes (redeeming positions,
//! creating markets) are signed and submitted by the transaction relay.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::{ApiKeys, Config};
use crate::error::{AgentError, MarketError};
use crate::signing;

use super::types::{omen_market_url, Bet, CreateMarketRequest, CreatedMarket, SubgraphTrade};

/// Wrapped xDai token on Gnosis chain.
pub const WXDAI_ADDRESS: &str = "0xe91D153E0b41518A2Ce8Dd3D7944Fa863463a97d";

/// ERC-20 `balanceOf(address)` selector.
const BALANCE_OF_SELECTOR: &str = "70a08231";

/// Page size for subgraph queries.
const SUBGRAPH_PAGE_SIZE: usize = 1000;

const BETS_QUERY: &str = r#"
query GetBets($creator: String!, $since: BigInt!, $first: Int!, $skip: Int!) {
  fpmmTrades(
    where: { type: Buy, creator: $creator, creationTimestamp_gte: $since }
    orderBy: creationTimestamp
    orderDirection: asc
    first: $first
    skip: $skip
  ) {
    id
    title
    collateralAmountUSD
    outcomeIndex
    creationTimestamp
    fpmm { id outcomes }
  }
}
"#;

/// Operations the agent needs from a prediction market backend.
#[async_trait]
pub trait MarketClient: Send + Sync {
    /// Total spendable balance of the betting account in USD.
    async fn get_balance(&self) -> Result<Decimal, MarketError>;

    /// Redeem every resolved position held by the betting account.
    async fn redeem_all_positions(&self) -> Result<(), MarketError>;

    /// Create a new market.
    async fn create_market(&self, request: &CreateMarketRequest) -> Result<CreatedMarket, MarketError>;

    /// Bets placed by `better_address` at or after `since`, oldest first.
    async fn get_bets_made_since(
        &self,
        better_address: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Bet>, MarketError>;
}

/// Omen client backed by the subgraph, Gnosis RPC and the transaction relay.
#[derive(Debug, Clone)]
pub struct OmenClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Omen subgraph endpoint.
    subgraph_url: String,
    /// Gnosis JSON-RPC endpoint.
    rpc_url: String,
    /// Transaction relay base URL.
    relay_url: String,
    /// Address whose balance and positions are used.
    address: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<TradesData>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradesData {
    fpmm_trades: Vec<SubgraphTrade>,
}

#[derive(Debug, Serialize)]
struct RelayCreateMarket<'a> {
    from_address: &'a str,
    #[serde(flatten)]
    request: &'a CreateMarketRequest,
}

#[derive(Debug, Deserialize)]
struct RelayCreatedMarket {
    market_address: String,
    #[serde(default)]
    url: Option<String>,
}

impl OmenClient {
    /// Create a client for the betting account described by `keys`.
    pub fn new(config: &Config, keys: &ApiKeys, http: reqwest::Client) -> Result<Self, AgentError> {
        Ok(Self {
            http,
            subgraph_url: keys.subgraph_url(&config.omen_subgraph_url)?,
            rpc_url: config.gnosis_rpc_url.clone(),
            relay_url: config.tx_relay_url.trim_end_matches('/').to_string(),
            address: keys.bet_from_address()?,
        })
    }

    /// Address whose balance and positions this client reads.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Issue a JSON-RPC call and return the hex result.
    async fn rpc_call(&self, method: &str, params: Value) -> Result<String, MarketError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.rpc_url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(MarketError::FetchFailed {
                what: method.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse {} response: {}", method, e)))?;

        if let Some(err) = rpc.error {
            return Err(MarketError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        rpc.result
            .ok_or_else(|| MarketError::ParseError(format!("{} returned no result", method)))
    }

    /// POST to the transaction relay, mapping non-2xx answers to errors.
    async fn relay_post<T: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, MarketError> {
        let url = format!("{}{}", self.relay_url, path);
        let response = self.http.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::RelayFailed {
                operation,
                status,
                body,
            });
        }

        Ok(response)
    }
}

/// Convert a hex wei quantity (18 decimals) to a decimal amount.
pub fn wei_hex_to_decimal(hex_value: &str) -> Result<Decimal, MarketError> {
    let digits = hex_value.trim_start_matches("0x").trim_start_matches('0');
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let wei = u128::from_str_radix(digits, 16)
        .map_err(|e| MarketError::ParseError(format!("Invalid hex quantity '{}': {}", hex_value, e)))?;
    let wei = i128::try_from(wei)
        .map_err(|_| MarketError::ParseError(format!("Quantity too large: {}", hex_value)))?;

    Decimal::try_from_i128_with_scale(wei, 18)
        .map(|d| d.normalize())
        .map_err(|e| MarketError::ParseError(format!("Quantity out of range '{}': {}", hex_value, e)))
}

/// ABI-encode a `balanceOf(address)` call.
fn balance_of_calldata(address: &str) -> String {
    let addr = address.trim_start_matches("0x").to_lowercase();
    format!("0x{}{:0>64}", BALANCE_OF_SELECTOR, addr)
}

#[async_trait]
impl MarketClient for OmenClient {
    #[instrument(skip(self), fields(address = %self.address))]
    async fn get_balance(&self) -> Result<Decimal, MarketError> {
        let native = self
            .rpc_call("eth_getBalance", json!([self.address, "latest"]))
            .await?;
        let wrapped = self
            .rpc_call(
                "eth_call",
                json!([
                    { "to": WXDAI_ADDRESS, "data": balance_of_calldata(&self.address) },
                    "latest"
                ]),
            )
            .await?;

        let xdai = wei_hex_to_decimal(&native)?;
        let wxdai = wei_hex_to_decimal(&wrapped)?;
        let balance = xdai + wxdai;

        debug!(xdai = %xdai, wxdai = %wxdai, balance = %balance, "Retrieved balance");

        Ok(balance)
    }

    #[instrument(skip(self), fields(address = %self.address))]
    async fn redeem_all_positions(&self) -> Result<(), MarketError> {
        self.relay_post(
            "redeem",
            "/omen/redeem-all-positions",
            &json!({ "from_address": self.address }),
        )
        .await?;

        debug!("Redeem request accepted by relay");
        Ok(())
    }

    #[instrument(skip(self, request), fields(question = %request.question))]
    async fn create_market(&self, request: &CreateMarketRequest) -> Result<CreatedMarket, MarketError> {
        let body = RelayCreateMarket {
            from_address: &self.address,
            request,
        };
        let response = self.relay_post("create market", "/omen/markets", &body).await?;

        let created: RelayCreatedMarket = response
            .json()
            .await
            .map_err(|e| MarketError::ParseError(format!("Failed to parse created market: {}", e)))?;

        let market_address = signing::checksum_address(&created.market_address)
            .map_err(|e| MarketError::ParseError(e.to_string()))?;
        let url = created
            .url
            .unwrap_or_else(|| omen_market_url(&market_address));

        debug!(market_address = %market_address, "Market created");

        Ok(CreatedMarket {
            market_address,
            url,
        })
    }

    #[instrument(skip(self))]
    async fn get_bets_made_since(
        &self,
        better_address: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Bet>, MarketError> {
        let creator = better_address.to_lowercase();
        let mut bets = Vec::new();
        let mut skip = 0usize;

        loop {
            let body = json!({
                "query": BETS_QUERY,
                "variables": {
                    "creator": creator,
                    "since": since.timestamp().to_string(),
                    "first": SUBGRAPH_PAGE_SIZE,
                    "skip": skip,
                }
            });

            let response = self.http.post(&self.subgraph_url).json(&body).send().await?;

            if !response.status().is_success() {
                return Err(MarketError::FetchFailed {
                    what: "bets".to_string(),
                    reason: format!("HTTP {}", response.status()),
                });
            }

            let page: GraphQlResponse = response
                .json()
                .await
                .map_err(|e| MarketError::ParseError(format!("Failed to parse bets: {}", e)))?;

            if let Some(errors) = page.errors.filter(|e| !e.is_empty()) {
                return Err(MarketError::FetchFailed {
                    what: "bets".to_string(),
                    reason: Value::Array(errors).to_string(),
                });
            }

            let trades = page
                .data
                .map(|d| d.fpmm_trades)
                .unwrap_or_default();
            let fetched = trades.len();

            for trade in trades {
                bets.push(Bet::try_from(trade)?);
            }

            if fetched < SUBGRAPH_PAGE_SIZE {
                break;
            }
            skip += fetched;
        }

        debug!(count = bets.len(), "Retrieved bets");

        Ok(bets)
    }
}
