//! Prediction market agent entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use prediction_market_agent::agent::{deploy_local, DeployableSocialMediaAgent};
use prediction_market_agent::api::{create_router, AppState};
use prediction_market_agent::config::{ApiKeys, Config};
use prediction_market_agent::functions::{omen_functions, CreatePredictionMarket, FunctionSpec, RedeemWinningBets};
use prediction_market_agent::market::{MarketClient, MarketType, OmenClient};
use prediction_market_agent::telemetry;
use prediction_market_agent::utils::{shutdown_channel, wait_for_shutdown};

/// Prediction market agent: Omen functions and the social media deploy bot.
#[derive(Parser, Debug)]
#[command(name = "prediction-market-agent")]
#[command(about = "Omen market functions and a social media agent that posts about recent bets")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the social media agent on a schedule (default).
    Run {
        /// Market to read bets from.
        #[arg(long)]
        market_type: Option<MarketType>,

        /// Seconds between runs.
        #[arg(long)]
        sleep_secs: Option<u64>,

        /// Number of runs before exiting.
        #[arg(long)]
        runs: Option<u32>,

        /// HTTP server port for health/metrics.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the social media agent once and exit.
    RunOnce {
        /// Market to read bets from.
        #[arg(long)]
        market_type: Option<MarketType>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Check the betting wallet balance on Omen.
    CheckBalance,

    /// Redeem winnings from resolved Omen positions.
    Redeem,

    /// Create a Yes/No market on Omen.
    CreateMarket {
        /// Binary question.
        #[arg(long)]
        question: String,

        /// Initial liquidity in USD.
        #[arg(long)]
        liquidity: Decimal,

        /// Closing time, e.g. 2024-12-31T23:59:59Z.
        #[arg(long)]
        closing_time: String,
    },

    /// Print the agent-callable functions as JSON.
    ListFunctions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // RUST_LOG may come from .env
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("prediction_market_agent=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let format = if args.log_json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(format)
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckBalance) => cmd_check_balance().await,
        Some(Command::Redeem) => cmd_redeem().await,
        Some(Command::CreateMarket {
            question,
            liquidity,
            closing_time,
        }) => cmd_create_market(&question, liquidity, &closing_time).await,
        Some(Command::ListFunctions) => cmd_list_functions().await,
        Some(Command::RunOnce { market_type }) => cmd_run_once(market_type).await,
        Some(Command::Run {
            market_type,
            sleep_secs,
            runs,
            port,
        }) => cmd_run(market_type, sleep_secs, runs, port).await,
        None => cmd_run(None, None, None, None).await,
    }
}

/// Load and validate configuration, logging failures.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Install the Prometheus recorder, or turn telemetry off.
fn init_telemetry(config: &Config) -> Option<metrics_exporter_prometheus::PrometheusHandle> {
    if !config.metrics_enabled {
        telemetry::disable_telemetry();
        return None;
    }

    match telemetry::install_prometheus_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install metrics recorder, telemetry disabled: {}", e);
            telemetry::disable_telemetry();
            None
        }
    }
}

fn omen_client(config: &Config) -> anyhow::Result<Arc<dyn MarketClient>> {
    let keys = ApiKeys::from_config(config);
    let client = OmenClient::new(config, &keys, config.http_client()?)?;
    Ok(Arc::new(client))
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PREDICTION MARKET AGENT - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Resolve the betting address
    print!("Resolving betting address... ");
    match ApiKeys::from_config(&config).bet_from_address() {
        Ok(addr) => {
            println!("OK");
            println!("  Bet from address: {}", addr);
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Private key invalid"));
        }
    }

    let enabled = |on: bool| if on { "Enabled" } else { "Disabled (credentials missing)" };

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Market Type: {}", config.market_type);
    println!("  Safe: {}", config.safe_address.as_deref().unwrap_or("none"));
    println!("  Subgraph: {}", config.omen_subgraph_url);
    println!(
        "  Graph API Key: {}",
        if config.graph_api_key.is_some() { "present" } else { "not set" }
    );
    println!("  Tx Relay: {}", config.tx_relay_url);
    println!("  LLM Model: {}", config.openai_model);
    if config.openai_api_key.is_empty() {
        println!("  WARNING: OPENAI_API_KEY is empty, post generation will fail!");
    }
    println!("  Farcaster: {}", enabled(config.has_farcaster()));
    println!("  Twitter: {}", enabled(config.has_twitter()));
    println!(
        "  Memory: {}",
        config.database_url.as_deref().unwrap_or("in-process (not persisted)")
    );
    println!("  Sleep: {}s x {} runs", config.sleep_time_secs, config.run_count);
    println!("  Metrics: {}", if config.metrics_enabled { "Enabled" } else { "Disabled" });
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Check the betting wallet balance.
async fn cmd_check_balance() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PREDICTION MARKET AGENT - BALANCE CHECK");
    println!("======================================================================");

    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    println!("Subgraph: {}", config.omen_subgraph_url);
    println!("RPC: {}", config.gnosis_rpc_url);
    println!("======================================================================");

    // Create client
    print!("\n1. Creating client... ");
    let keys = ApiKeys::from_config(&config);
    let client = OmenClient::new(&config, &keys, config.http_client()?)?;
    println!("OK");
    println!("   Address: {}", client.address());

    // Get balance
    print!("\n2. Getting xDai + wxDai balance... ");
    match client.get_balance().await {
        Ok(balance) => {
            println!("OK");
            println!("   Balance: {:.6} USD", balance);
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
        }
    }

    // Recent bets
    print!("\n3. Getting bets from the last 24h... ");
    let since = chrono::Utc::now() - chrono::Duration::hours(24);
    match client.get_bets_made_since(client.address(), since).await {
        Ok(bets) => {
            println!("OK");
            println!("   Total bets: {}", bets.len());
            for bet in bets.iter().take(5) {
                println!("   - {} {} on {}", bet.amount, bet.outcome, bet.market_question);
            }
            if bets.len() > 5 {
                println!("   ... and {} more", bets.len() - 5);
            }
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
        }
    }

    println!("\n======================================================================");
    println!("BALANCE CHECK COMPLETED");
    println!("======================================================================");

    Ok(())
}

/// Redeem winnings once.
async fn cmd_redeem() -> anyhow::Result<()> {
    let config = load_config()?;
    let _handle = init_telemetry(&config);

    let function = RedeemWinningBets::new(omen_client(&config)?);
    let message = function.redeem().await?;
    println!("{}", message);

    Ok(())
}

/// Create one market.
async fn cmd_create_market(question: &str, liquidity: Decimal, closing_time: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let _handle = init_telemetry(&config);

    let function = CreatePredictionMarket::new(omen_client(&config)?);
    let message = function.create(question, liquidity, closing_time).await?;
    println!("{}", message);

    Ok(())
}

/// Print the function registry.
async fn cmd_list_functions() -> anyhow::Result<()> {
    let config = load_config()?;
    let functions = omen_functions(omen_client(&config)?);

    let specs: Vec<FunctionSpec> = functions.iter().map(|f| FunctionSpec::of(f.as_ref())).collect();
    println!("{}", serde_json::to_string_pretty(&specs)?);

    Ok(())
}

/// Run the agent once.
async fn cmd_run_once(market_type: Option<MarketType>) -> anyhow::Result<()> {
    let config = load_config()?;
    let _handle = init_telemetry(&config);
    let market_type = match market_type {
        Some(m) => m,
        None => config.market_type.parse()?,
    };

    let keys = ApiKeys::from_config(&config);
    let agent = DeployableSocialMediaAgent::load(&config, &keys).await?;

    let outcome = agent.run(market_type).await?;
    info!(outcome = %outcome, "Run finished");

    Ok(())
}

/// Serve health/metrics and run the agent on a schedule.
async fn cmd_run(
    market_type: Option<MarketType>,
    sleep_secs: Option<u64>,
    runs: Option<u32>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config()?;

    let market_type = match market_type {
        Some(m) => m,
        None => config.market_type.parse()?,
    };
    let sleep = Duration::from_secs(sleep_secs.unwrap_or(config.sleep_time_secs));
    let runs = runs.unwrap_or(config.run_count);
    let port = port.unwrap_or(config.port);

    info!("Configuration loaded successfully");
    info!("Market type: {}", market_type);
    info!("Schedule: every {}s, {} runs", sleep.as_secs(), runs);

    // Create app state
    let mut app_state = AppState::new();
    if let Some(handle) = init_telemetry(&config) {
        app_state = app_state.with_metrics(handle);
    }

    // One signal listener shared by the server and the deploy loop
    let shutdown = shutdown_channel();

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());

    // Spawn HTTP server
    let server_shutdown = shutdown.clone();
    let _server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(wait_for_shutdown(server_shutdown))
            .await
    });

    let keys = ApiKeys::from_config(&config);
    let agent = DeployableSocialMediaAgent::load(&config, &keys).await?;
    if agent.platforms().is_empty() {
        warn!("No social media platform configured, runs will only log");
    }

    *app_state.market_type.write().await = Some(market_type);
    app_state.set_ready(true);

    deploy_local(
        &agent,
        market_type,
        sleep,
        runs,
        app_state.stats.clone(),
        wait_for_shutdown(shutdown),
    )
    .await;

    app_state.set_ready(false);
    info!("Agent stopped");

    Ok(())
}
