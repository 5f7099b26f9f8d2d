//! Local deployment loop: run the agent on a fixed schedule.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::market::MarketType;

use super::{DeployableSocialMediaAgent, RunOutcome};

/// Default pause between runs.
pub const DEFAULT_SLEEP: Duration = Duration::from_secs(540);

/// Default number of runs.
pub const DEFAULT_RUNS: u32 = 180;

/// Counters over the lifetime of the deploy loop.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    /// Runs that finished without error.
    pub runs_completed: u64,
    /// Runs that returned an error.
    pub runs_failed: u64,
    /// Runs that published posts.
    pub runs_posted: u64,
    /// Outcome of the most recent successful run.
    pub last_outcome: Option<RunOutcome>,
    /// Last error message.
    pub last_error: Option<String>,
    /// When the most recent run finished.
    pub last_run_at: Option<DateTime<Utc>>,
}

impl RunStats {
    /// Record a finished run.
    pub fn record(&mut self, outcome: RunOutcome) {
        self.runs_completed += 1;
        if outcome == RunOutcome::Posted {
            self.runs_posted += 1;
        }
        self.last_outcome = Some(outcome);
        self.last_run_at = Some(Utc::now());
    }

    /// Record a failed run.
    pub fn record_failure(&mut self, error: String) {
        self.runs_failed += 1;
        self.last_error = Some(error);
        self.last_run_at = Some(Utc::now());
    }
}

/// Run `agent` up to `runs` times, sleeping `sleep` in between, until
/// `shutdown` resolves. A failed run is logged and the loop continues.
///
/// `shutdown` is only polled between runs, so it must remember a signal that
/// arrived mid-run (see [`crate::utils::wait_for_shutdown`]).
pub async fn deploy_local<F>(
    agent: &DeployableSocialMediaAgent,
    market_type: MarketType,
    sleep: Duration,
    runs: u32,
    stats: Arc<RwLock<RunStats>>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    info!(
        market_type = %market_type,
        sleep_secs = sleep.as_secs(),
        runs,
        platforms = ?agent.platforms(),
        "Deploying social media agent"
    );

    for run in 1..=runs {
        info!(run, runs, "Starting run");

        match agent.run(market_type).await {
            Ok(outcome) => {
                info!(run, outcome = %outcome, "Run finished");
                stats.write().await.record(outcome);
            }
            Err(e) => {
                error!(run, "Run failed: {}", e);
                stats.write().await.record_failure(e.to_string());
            }
        }

        if run == runs {
            break;
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Stopping deploy loop");
                return;
            }
            _ = tokio::time::sleep(sleep) => {}
        }
    }

    info!("Deploy loop finished");
}
