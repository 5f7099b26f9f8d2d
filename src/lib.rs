//! Prediction market agent functions and social media deploy bot.
//!
//! This library is orchestration glue around external collaborators: an Omen
//! market backend, an LLM, a long-term memory store and two social platforms.
//!
//! # Flow
//!
//! ```text
//! bets since now-24h ──► dedup by question ──► post + reasoning reply ──► Farcaster
//!                                                                     └─► Twitter
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`market`]: Market types, the Omen client and a mock client
//! - [`functions`]: Agent-callable market functions (redeem, create market)
//! - [`agent`]: Scheduled social media agent
//! - [`social`]: Per-platform posting handlers
//! - [`llm`]: Text generation for posts and replies
//! - [`memory`]: Long-term memory store
//! - [`message`]: Message compression round-trip
//! - [`telemetry`]: Prometheus counters and the telemetry toggle
//! - [`signing`]: Address derivation and checksumming
//! - [`api`]: HTTP API for health/metrics
//! - [`utils`]: Utility functions

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod functions;
pub mod llm;
pub mod market;
pub mod memory;
pub mod message;
pub mod signing;
pub mod social;
pub mod telemetry;
pub mod utils;

pub use config::{ApiKeys, Config};
pub use error::{AgentError, Result};
