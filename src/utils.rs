//! Utility functions.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::watch;
use tracing::info;

use crate::error::AgentError;

/// Share of the trading balance that may be staked on a single bet.
pub const BET_BALANCE_FRACTION: Decimal = dec!(0.95);

/// Largest bet the agent may place given its limits and balance.
///
/// Returns `min(max_, 0.95 * trading_balance)` when that exceeds `min_`,
/// otherwise `min_`, even when `min_` is above the balance.
pub fn get_maximum_possible_bet_amount(
    min_: Decimal,
    max_: Decimal,
    trading_balance: Decimal,
) -> Decimal {
    let affordable = trading_balance * BET_BALANCE_FRACTION;
    if affordable > min_ {
        max_.min(affordable)
    } else {
        min_
    }
}

/// Parse an ISO-8601-like timestamp into UTC.
///
/// Accepts RFC 3339 (`2024-12-31T23:59:59Z`, `...+02:00`), naive date-times
/// (`2024-12-31T23:59:59`, `2024-12-31 23:59:59`, optional fraction) read as
/// UTC, and bare dates read as UTC midnight.
pub fn to_datetime_utc(value: &str) -> Result<DateTime<Utc>, AgentError> {
    let trimmed = value.trim();

    let rfc3339_err = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(AgentError::InvalidTimestamp {
        input: value.to_string(),
        source: rfc3339_err,
    })
}

/// Resolve when the process receives Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Listen for Ctrl-C or SIGTERM in the background. The returned receiver
/// flips to `true` once and stays there, so waiters that subscribe after
/// the signal still see it.
pub fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });
    rx
}

/// Resolve once `rx` reports shutdown, or its sender is gone.
pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}
