//! Prometheus counters for agent activity and a process-wide telemetry toggle.
//!
//! Every recorder here is a no-op once [`disable_telemetry`] has been called.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Agent runs started counter metric name.
pub const METRIC_RUNS_STARTED: &str = "agent_runs_started_total";
/// Runs that ended without posting, labelled by reason.
pub const METRIC_RUNS_SKIPPED: &str = "agent_runs_skipped_total";
/// Posts published counter metric name, labelled by platform.
pub const METRIC_POSTS_PUBLISHED: &str = "social_posts_published_total";
/// Markets created counter metric name.
pub const METRIC_MARKETS_CREATED: &str = "markets_created_total";
/// Redeem calls counter metric name.
pub const METRIC_REDEEM_CALLS: &str = "redeem_calls_total";

static TELEMETRY_ENABLED: AtomicBool = AtomicBool::new(true);

/// Stop recording telemetry for the rest of the process.
pub fn disable_telemetry() {
    TELEMETRY_ENABLED.store(false, Ordering::SeqCst);
    debug!("Telemetry disabled");
}

/// Resume recording telemetry.
pub fn enable_telemetry() {
    TELEMETRY_ENABLED.store(true, Ordering::SeqCst);
}

/// Whether telemetry is currently recorded.
pub fn telemetry_enabled() -> bool {
    TELEMETRY_ENABLED.load(Ordering::SeqCst)
}

/// Install the Prometheus recorder and describe all metrics.
/// Call this once at startup.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Initialize all metric descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_RUNS_STARTED, "Total number of social agent runs started");
    describe_counter!(
        METRIC_RUNS_SKIPPED,
        "Total number of social agent runs that ended without posting"
    );
    describe_counter!(
        METRIC_POSTS_PUBLISHED,
        "Total number of posts published per social platform"
    );
    describe_counter!(METRIC_MARKETS_CREATED, "Total number of markets created");
    describe_counter!(METRIC_REDEEM_CALLS, "Total number of redeem calls");

    debug!("Metrics initialized");
}

/// Increment runs started counter.
pub fn inc_runs_started() {
    if telemetry_enabled() {
        counter!(METRIC_RUNS_STARTED).increment(1);
    }
}

/// Increment runs skipped counter.
pub fn inc_runs_skipped(reason: &'static str) {
    if telemetry_enabled() {
        counter!(METRIC_RUNS_SKIPPED, "reason" => reason).increment(1);
    }
}

/// Increment posts published counter.
pub fn inc_posts_published(platform: &'static str) {
    if telemetry_enabled() {
        counter!(METRIC_POSTS_PUBLISHED, "platform" => platform).increment(1);
    }
}

/// Increment markets created counter.
pub fn inc_markets_created() {
    if telemetry_enabled() {
        counter!(METRIC_MARKETS_CREATED).increment(1);
    }
}

/// Increment redeem calls counter.
pub fn inc_redeem_calls() {
    if telemetry_enabled() {
        counter!(METRIC_REDEEM_CALLS).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn toggle_disables_and_recording_stays_silent() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            disable_telemetry();
            assert!(!telemetry_enabled());
            inc_markets_created();

            enable_telemetry();
            assert!(telemetry_enabled());
            inc_redeem_calls();
        });

        let rendered = handle.render();
        assert!(!rendered.contains(METRIC_MARKETS_CREATED));
        assert!(rendered.contains(METRIC_REDEEM_CALLS));
    }
}
