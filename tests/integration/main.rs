//! Integration tests for the prediction market agent.
//!
//! The wiremock-backed tests run by default. Tests marked `#[ignore]` talk to
//! the real Omen subgraph and Gnosis RPC and need BET_FROM_PRIVATE_KEY.
//! Run them with: cargo test --test integration -- --ignored

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prediction_market_agent::agent::{DeployableSocialMediaAgent, RunOutcome};
use prediction_market_agent::config::{ApiKeys, Config};
use prediction_market_agent::functions::{find_function, omen_functions};
use prediction_market_agent::market::{BetBuilder, MarketClient, MarketType, MockMarketClient, OmenClient};
use prediction_market_agent::memory::{LongTermMemoryHandler, MemoryBackend, THINK_THOROUGHLY};
use prediction_market_agent::message::{compress_message, decompress_message};
use prediction_market_agent::utils::get_maximum_possible_bet_amount;

const TEST_KEY: &str = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// Config with every external service pointed at `server`.
fn mock_config(server: &MockServer) -> Config {
    Config {
        bet_from_private_key: TEST_KEY.to_string(),
        safe_address: None,
        omen_subgraph_url: format!("{}/subgraph", server.uri()),
        graph_api_key: None,
        gnosis_rpc_url: format!("{}/rpc", server.uri()),
        tx_relay_url: server.uri(),
        openai_api_key: "sk-test".to_string(),
        openai_model: "gpt-4-turbo-2024-04-09".to_string(),
        openai_base_url: server.uri(),
        neynar_api_key: Some("neynar-key".to_string()),
        farcaster_signer_uuid: Some("signer-1".to_string()),
        neynar_api_url: server.uri(),
        twitter_access_token: Some("tw-token".to_string()),
        twitter_api_url: server.uri(),
        database_url: Some("sqlite::memory:".to_string()),
        market_type: "omen".to_string(),
        sleep_time_secs: 540,
        run_count: 180,
        http_timeout_ms: 5_000,
        port: 8080,
        metrics_enabled: false,
    }
}

/// Get a live config from environment.
fn live_config() -> Option<Config> {
    dotenvy::dotenv().ok();

    let private_key = std::env::var("BET_FROM_PRIVATE_KEY").ok()?;

    // Skip if using placeholder key
    if private_key.starts_with("0x1234") || private_key.len() < 64 {
        return None;
    }

    Config::load().ok()
}

async fn mount_trades(server: &MockServer) {
    let recent = (Utc::now() - Duration::hours(1)).timestamp().to_string();
    let earlier = (Utc::now() - Duration::hours(2)).timestamp().to_string();

    Mock::given(method("POST"))
        .and(path("/subgraph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "fpmmTrades": [
                {
                    "id": "0x1",
                    "title": "Will GNO hit $1000?",
                    "collateralAmountUSD": "0.5",
                    "outcomeIndex": "0",
                    "creationTimestamp": earlier,
                    "fpmm": { "id": "0xm1", "outcomes": ["Yes", "No"] }
                },
                {
                    "id": "0x2",
                    "title": "Will GNO hit $1000?",
                    "collateralAmountUSD": "1.5",
                    "outcomeIndex": "1",
                    "creationTimestamp": recent,
                    "fpmm": { "id": "0xm1", "outcomes": ["Yes", "No"] }
                }
            ]}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn agent_run_posts_to_every_platform() {
    let server = MockServer::start().await;
    mount_trades(&server).await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "I bet No on GNO." } }]
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/farcaster/cast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true, "cast": { "hash": "0xcast" }
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "111", "text": "I bet No on GNO." }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let keys = ApiKeys::from_config(&config);
    let agent = DeployableSocialMediaAgent::load(&config, &keys).await.unwrap();

    assert_eq!(agent.platforms(), vec!["farcaster", "twitter"]);

    let outcome = agent.run(MarketType::Omen).await.unwrap();
    assert_eq!(outcome, RunOutcome::Posted);
}

#[tokio::test]
async fn agent_without_social_credentials_still_runs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/subgraph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "fpmmTrades": [] }
        })))
        .mount(&server)
        .await;

    let mut config = mock_config(&server);
    config.neynar_api_key = None;
    config.twitter_access_token = None;
    let keys = ApiKeys::from_config(&config);
    let agent = DeployableSocialMediaAgent::load(&config, &keys).await.unwrap();

    assert!(agent.platforms().is_empty());
    assert_eq!(agent.run(MarketType::Omen).await.unwrap(), RunOutcome::NoBets);
}

#[tokio::test]
async fn unsupported_market_type_fails_the_run() {
    let server = MockServer::start().await;
    let config = mock_config(&server);
    let keys = ApiKeys::from_config(&config);
    let agent = DeployableSocialMediaAgent::load(&config, &keys).await.unwrap();

    assert!(agent.run(MarketType::Manifold).await.is_err());
}

#[tokio::test]
async fn redeem_reports_balance_increase_through_relay() {
    let server = MockServer::start().await;

    // 1 xDai before redeeming, 3 xDai after; no wxDai.
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({ "method": "eth_getBalance" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1, "result": "0xde0b6b3a7640000"
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({ "method": "eth_getBalance" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x29a2241af62c0000"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({ "method": "eth_call" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0", "id": 1, "result": "0x0"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/omen/redeem-all-positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let keys = ApiKeys::from_config(&config);
    let client: Arc<dyn MarketClient> =
        Arc::new(OmenClient::new(&config, &keys, reqwest::Client::new()).unwrap());
    let functions = omen_functions(client);

    let redeem = find_function(&functions, "RedeemWinningBets").unwrap();
    let message = redeem.call(&[]).await.unwrap();

    assert!(message.starts_with("Redeemed 2"), "{}", message);
    assert!(message.contains("New balance: 3"), "{}", message);
}

#[tokio::test]
async fn create_market_function_goes_through_relay() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/omen/markets"))
        .and(body_partial_json(json!({
            "question": "Will GNO hit $1000 dollars by the end of 2024?",
            "category": "test"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "market_address": "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = mock_config(&server);
    let keys = ApiKeys::from_config(&config);
    let client: Arc<dyn MarketClient> =
        Arc::new(OmenClient::new(&config, &keys, reqwest::Client::new()).unwrap());
    let functions = omen_functions(client);

    let create = find_function(&functions, "CreatePredictionMarket").unwrap();
    let message = create.call(&create.example_args()).await.unwrap();

    assert_eq!(
        message,
        "Created prediction market with id 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed at url \
https://presagio.pages.dev/markets?id=0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed."
    );
}

#[tokio::test]
async fn memories_are_scoped_to_the_agent() {
    let backend = MemoryBackend::connect("sqlite::memory:").await.unwrap();
    let thinker = LongTermMemoryHandler::from_agent_identifier(&backend, THINK_THOROUGHLY);
    let other = LongTermMemoryHandler::from_agent_identifier(&backend, "other-agent");

    thinker.save("GNO looks strong").await.unwrap();
    other.save("unrelated").await.unwrap();

    let found = thinker.search(Utc::now() - Duration::hours(24)).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content, "GNO looks strong");
}

#[tokio::test]
async fn mock_client_agent_keeps_last_bet_per_question() {
    let client = Arc::new(MockMarketClient::new());
    let now = Utc::now();
    client.set_bets(vec![
        BetBuilder::new("Q1").id("a").created_time(now - Duration::hours(3)).build(),
        BetBuilder::new("Q2").id("b").created_time(now - Duration::hours(2)).build(),
        BetBuilder::new("Q1").id("c").created_time(now - Duration::hours(1)).build(),
    ]);

    let server = MockServer::start().await;
    let config = mock_config(&server);
    let keys = ApiKeys::from_config(&config);
    let agent = DeployableSocialMediaAgent::load(&config, &keys)
        .await
        .unwrap()
        .with_market(MarketType::Manifold, client);

    let bets = agent
        .get_unique_bets_for_market(MarketType::Manifold, now - Duration::hours(24))
        .await
        .unwrap();

    let ids: Vec<&str> = bets.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "b"]);
}

#[test]
fn bet_amount_clamp_and_message_round_trip() {
    assert_eq!(get_maximum_possible_bet_amount(dec!(1), dec!(5), dec!(3)), dec!(2.85));

    let message = "Bet 2.85 on Yes. 🚀";
    assert_eq!(decompress_message(&compress_message(message)).unwrap(), message);
}

/// Test reading the live Omen balance.
#[tokio::test]
#[ignore = "requires BET_FROM_PRIVATE_KEY"]
async fn test_live_balance() {
    let config = match live_config() {
        Some(c) => c,
        None => {
            println!("Skipping: BET_FROM_PRIVATE_KEY not set or invalid");
            return;
        }
    };

    let keys = ApiKeys::from_config(&config);
    let client = OmenClient::new(&config, &keys, config.http_client().unwrap()).unwrap();
    let balance = client.get_balance().await.unwrap();

    println!("Balance for {}: {} USD", client.address(), balance);
    assert!(balance >= rust_decimal::Decimal::ZERO);
}

/// Test fetching live bets from the Omen subgraph.
#[tokio::test]
#[ignore = "requires BET_FROM_PRIVATE_KEY"]
async fn test_live_bets() {
    let config = match live_config() {
        Some(c) => c,
        None => {
            println!("Skipping: BET_FROM_PRIVATE_KEY not set or invalid");
            return;
        }
    };

    let keys = ApiKeys::from_config(&config);
    let client = OmenClient::new(&config, &keys, config.http_client().unwrap()).unwrap();
    let since = Utc::now() - Duration::days(7);
    let bets = client.get_bets_made_since(client.address(), since).await.unwrap();

    println!("Found {} bets since {}", bets.len(), since);
    for bet in &bets {
        assert!(bet.created_time >= since);
    }
}
