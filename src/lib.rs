//! Polymarket Research Pipeline
//!
//! Downloads closed markets, large taker trades and price histories from the
//! public Polymarket APIs, then studies who trades against whom and what
//! moves prices.
//!
//! ## Architecture
//!
//! ```text
//! Gamma / Data API / CLOB ─► ingest ─► storage (events, trades, prices)
//!                                         │
//!                                   Dataset::load
//!            ┌──────────────┬─────────────┼──────────────┐
//!          graph         classify      features       classify::eda
//!            │              │             │
//!         network           └────► regression
//!            └──────────────┴─────────────┴─► report
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod features;
pub mod graph;
pub mod ingest;
pub mod network;
pub mod regression;
pub mod report;
pub mod storage;
pub mod types;

#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod config_tests;
