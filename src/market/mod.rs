//! Market module for Omen prediction markets.
//!
//! This module handles:
//! - Market types and data structures
//! - The `MarketClient` seam and its Omen implementation
//! - Mock client for testing

pub mod client;
pub mod mock;
pub mod types;

pub use client::{MarketClient, OmenClient};
pub use mock::{BetBuilder, MockConfig, MockMarketClient};
pub use types::{Bet, CreateMarketRequest, CreatedMarket, MarketType};
