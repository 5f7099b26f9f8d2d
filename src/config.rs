//! Application configuration loaded from environment variables.

use serde::Deserialize;

use crate::error::AgentError;
use crate::signing;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Wallet ===
    /// Private key of the betting wallet (hex, starts with 0x).
    pub bet_from_private_key: String,

    /// Safe address that places bets on behalf of the wallet, if any.
    #[serde(default)]
    pub safe_address: Option<String>,

    // === Omen Backend ===
    /// Omen subgraph GraphQL endpoint. `{api_key}` is replaced by
    /// `GRAPH_API_KEY`.
    #[serde(default = "default_subgraph_url")]
    pub omen_subgraph_url: String,

    /// The Graph gateway API key.
    #[serde(default)]
    pub graph_api_key: Option<String>,

    /// Gnosis chain JSON-RPC endpoint.
    #[serde(default = "default_rpc_url")]
    pub gnosis_rpc_url: String,

    /// Transaction relay that signs and submits redeem/create transactions.
    #[serde(default = "default_tx_relay_url")]
    pub tx_relay_url: String,

    // === LLM ===
    /// OpenAI API key.
    #[serde(default)]
    pub openai_api_key: String,

    /// Chat model used for posts and replies.
    #[serde(default = "default_model")]
    pub openai_model: String,

    /// OpenAI-compatible API base URL.
    #[serde(default = "default_openai_url")]
    pub openai_base_url: String,

    // === Social Platforms ===
    /// Neynar API key for Farcaster.
    #[serde(default)]
    pub neynar_api_key: Option<String>,

    /// Neynar managed signer UUID for the posting account.
    #[serde(default)]
    pub farcaster_signer_uuid: Option<String>,

    /// Neynar API base URL.
    #[serde(default = "default_neynar_url")]
    pub neynar_api_url: String,

    /// Twitter OAuth 2.0 user-context access token.
    #[serde(default)]
    pub twitter_access_token: Option<String>,

    /// Twitter API base URL.
    #[serde(default = "default_twitter_url")]
    pub twitter_api_url: String,

    // === Long-term Memory ===
    /// SQLite URL of the long-term memory store (in-memory store when unset).
    #[serde(default)]
    pub database_url: Option<String>,

    // === Deployment ===
    /// Market type the deploy loop runs against.
    #[serde(default = "default_market_type")]
    pub market_type: String,

    /// Seconds to sleep between runs.
    #[serde(default = "default_sleep_time")]
    pub sleep_time_secs: u64,

    /// Number of runs before the deploy loop exits.
    #[serde(default = "default_run_count")]
    pub run_count: u32,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port for health/metrics endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Record Prometheus metrics.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Placeholder for the gateway API key in subgraph URLs.
pub const SUBGRAPH_API_KEY_PLACEHOLDER: &str = "{api_key}";

fn default_subgraph_url() -> String {
    "https://gateway-arbitrum.network.thegraph.com/api/{api_key}/subgraphs/id/9fUVQpFwzpdWS9bq5WkAnmKbNNcoBwatMR4yZq81pbbz"
        .to_string()
}

fn default_rpc_url() -> String {
    "https://rpc.gnosischain.com".to_string()
}

fn default_tx_relay_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo-2024-04-09".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_neynar_url() -> String {
    "https://api.neynar.com".to_string()
}

fn default_twitter_url() -> String {
    "https://api.twitter.com".to_string()
}

fn default_market_type() -> String {
    "omen".to_string()
}

fn default_sleep_time() -> u64 {
    540
}

fn default_run_count() -> u32 {
    180
}

fn default_http_timeout() -> u64 {
    30_000
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.bet_from_private_key.is_empty() {
            return Err("BET_FROM_PRIVATE_KEY is required".to_string());
        }

        if !self.bet_from_private_key.starts_with("0x") {
            return Err("BET_FROM_PRIVATE_KEY must start with 0x".to_string());
        }

        if let Some(safe) = &self.safe_address {
            signing::checksum_address(safe).map_err(|e| format!("SAFE_ADDRESS: {}", e))?;
        }

        if self.sleep_time_secs == 0 {
            return Err("SLEEP_TIME_SECS must be greater than 0".to_string());
        }

        self.market_type
            .parse::<crate::market::MarketType>()
            .map_err(|_| format!("MARKET_TYPE '{}' is not a known market type", self.market_type))?;

        if self.omen_subgraph_url.contains(SUBGRAPH_API_KEY_PLACEHOLDER)
            && self.graph_api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err("GRAPH_API_KEY is required by OMEN_SUBGRAPH_URL".to_string());
        }

        for (name, value) in [
            ("OMEN_SUBGRAPH_URL", &self.omen_subgraph_url),
            ("GNOSIS_RPC_URL", &self.gnosis_rpc_url),
            ("TX_RELAY_URL", &self.tx_relay_url),
            ("OPENAI_BASE_URL", &self.openai_base_url),
            ("NEYNAR_API_URL", &self.neynar_api_url),
            ("TWITTER_API_URL", &self.twitter_api_url),
        ] {
            url::Url::parse(value).map_err(|e| format!("{} '{}' is invalid: {}", name, value, e))?;
        }

        Ok(())
    }

    /// Whether Farcaster credentials are present.
    pub fn has_farcaster(&self) -> bool {
        self.neynar_api_key.is_some() && self.farcaster_signer_uuid.is_some()
    }

    /// Whether Twitter credentials are present.
    pub fn has_twitter(&self) -> bool {
        self.twitter_access_token.is_some()
    }

    /// Build an HTTP client honouring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(self.http_timeout_ms))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()?;
        Ok(client)
    }
}

/// Credentials threaded explicitly into every collaborator.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    /// Private key of the betting wallet.
    pub bet_from_private_key: String,
    /// Safe address, if bets are placed through a Safe.
    pub safe_address: Option<String>,
    /// OpenAI API key.
    pub openai_api_key: String,
    /// Neynar API key.
    pub neynar_api_key: Option<String>,
    /// Neynar signer UUID.
    pub farcaster_signer_uuid: Option<String>,
    /// Twitter user-context access token.
    pub twitter_access_token: Option<String>,
    /// The Graph gateway API key.
    pub graph_api_key: Option<String>,
}

impl ApiKeys {
    /// Extract the credentials from a loaded config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            bet_from_private_key: config.bet_from_private_key.clone(),
            safe_address: config.safe_address.clone(),
            openai_api_key: config.openai_api_key.clone(),
            neynar_api_key: config.neynar_api_key.clone(),
            farcaster_signer_uuid: config.farcaster_signer_uuid.clone(),
            twitter_access_token: config.twitter_access_token.clone(),
            graph_api_key: config.graph_api_key.clone(),
        }
    }

    /// Fill the gateway API key into a subgraph URL template.
    pub fn subgraph_url(&self, template: &str) -> Result<String, AgentError> {
        if !template.contains(SUBGRAPH_API_KEY_PLACEHOLDER) {
            return Ok(template.to_string());
        }
        match self.graph_api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(template.replace(SUBGRAPH_API_KEY_PLACEHOLDER, key)),
            _ => Err(AgentError::InvalidConfig(
                "GRAPH_API_KEY is required by OMEN_SUBGRAPH_URL".to_string(),
            )),
        }
    }

    /// Address that places bets: the Safe when configured, otherwise the
    /// address of the private key.
    pub fn bet_from_address(&self) -> Result<String, AgentError> {
        match &self.safe_address {
            Some(safe) => signing::checksum_address(safe),
            None => signing::address_from_private_key(&self.bet_from_private_key),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const TEST_KEY: &str = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    pub(crate) fn test_config() -> Config {
        Config {
            bet_from_private_key: TEST_KEY.to_string(),
            safe_address: None,
            omen_subgraph_url: default_subgraph_url(),
            graph_api_key: Some("graph-key".to_string()),
            gnosis_rpc_url: default_rpc_url(),
            tx_relay_url: default_tx_relay_url(),
            openai_api_key: "sk-test".to_string(),
            openai_model: default_model(),
            openai_base_url: default_openai_url(),
            neynar_api_key: None,
            farcaster_signer_uuid: None,
            neynar_api_url: default_neynar_url(),
            twitter_access_token: None,
            twitter_api_url: default_twitter_url(),
            database_url: None,
            market_type: default_market_type(),
            sleep_time_secs: default_sleep_time(),
            run_count: default_run_count(),
            http_timeout_ms: default_http_timeout(),
            port: default_port(),
            metrics_enabled: true,
        }
    }

    #[test]
    fn default_values_are_sensible() {
        assert_eq!(default_sleep_time(), 540);
        assert_eq!(default_run_count(), 180);
        assert_eq!(default_model(), "gpt-4-turbo-2024-04-09");
        assert_eq!(default_market_type(), "omen");
    }

    #[test]
    fn validate_accepts_test_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_private_key() {
        let config = Config {
            bet_from_private_key: "".to_string(),
            ..test_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_invalid_private_key_prefix() {
        let config = Config {
            bet_from_private_key: "abc123".to_string(),
            ..test_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_market_type() {
        let config = Config {
            market_type: "kalshi".to_string(),
            ..test_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_endpoint() {
        let config = Config {
            tx_relay_url: "localhost without scheme".to_string(),
            ..test_config()
        };

        let err = config.validate().unwrap_err();
        assert!(err.contains("TX_RELAY_URL"));
    }

    #[test]
    fn default_gateway_requires_graph_api_key() {
        let config = Config {
            graph_api_key: None,
            ..test_config()
        };

        let err = config.validate().unwrap_err();
        assert!(err.contains("GRAPH_API_KEY"));
        assert!(ApiKeys::from_config(&config)
            .subgraph_url(&config.omen_subgraph_url)
            .is_err());
    }

    #[test]
    fn subgraph_url_fills_in_api_key() {
        let config = test_config();
        let url = ApiKeys::from_config(&config)
            .subgraph_url(&config.omen_subgraph_url)
            .unwrap();

        assert!(url.starts_with("https://gateway-arbitrum.network.thegraph.com/api/graph-key/subgraphs/id/"));
        assert!(!url.contains(SUBGRAPH_API_KEY_PLACEHOLDER));
    }

    #[test]
    fn custom_subgraph_url_needs_no_api_key() {
        let config = Config {
            omen_subgraph_url: "http://localhost:8000/subgraphs/name/omen".to_string(),
            graph_api_key: None,
            ..test_config()
        };

        assert!(config.validate().is_ok());
        assert_eq!(
            ApiKeys::from_config(&config)
                .subgraph_url(&config.omen_subgraph_url)
                .unwrap(),
            "http://localhost:8000/subgraphs/name/omen"
        );
    }

    #[test]
    fn loads_from_env_with_defaults() {
        let config: Config = envy::from_iter(vec![
            ("BET_FROM_PRIVATE_KEY".to_string(), TEST_KEY.to_string()),
            ("GRAPH_API_KEY".to_string(), "graph-key".to_string()),
            ("RUST_LOG".to_string(), "debug".to_string()),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.sleep_time_secs, 540);
        assert_eq!(config.graph_api_key.as_deref(), Some("graph-key"));
        assert!(config.metrics_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bet_from_address_prefers_safe() {
        let safe = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
        let config = Config {
            safe_address: Some(safe.to_string()),
            ..test_config()
        };
        let keys = ApiKeys::from_config(&config);

        assert_eq!(
            keys.bet_from_address().unwrap(),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn bet_from_address_derives_from_key() {
        let keys = ApiKeys::from_config(&test_config());
        let address = keys.bet_from_address().unwrap();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);
    }

    #[test]
    fn social_credentials_detection() {
        let mut config = test_config();
        assert!(!config.has_farcaster());
        assert!(!config.has_twitter());

        config.neynar_api_key = Some("key".to_string());
        assert!(!config.has_farcaster());
        config.farcaster_signer_uuid = Some("uuid".to_string());
        assert!(config.has_farcaster());

        config.twitter_access_token = Some("token".to_string());
        assert!(config.has_twitter());
    }
}
