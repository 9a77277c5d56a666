//! Polymarket public API clients
//!
//! - Gamma: closed events with their markets
//! - Data API: taker trades per market
//! - CLOB: per-token price history

pub mod clob;
pub mod data;
pub mod gamma;

pub use clob::ClobClient;
pub use data::DataClient;
pub use gamma::GammaClient;

use crate::config::{ApiConfig, DownloadConfig};
use crate::error::{ResearchError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// The three read-only endpoints the ingestion stage depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// One page of closed events, raw JSON objects
    async fn fetch_events_page(&self, offset: usize, limit: usize) -> Result<Vec<Value>>;

    /// One page of taker trades for a market (condition id), raw JSON objects
    async fn fetch_trades_page(
        &self,
        condition_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>>;

    /// Full price history for a CLOB token starting at `start_ts`
    async fn fetch_price_history(&self, token_id: &str, start_ts: i64) -> Result<Value>;
}

/// Bundles the three clients behind [`MarketDataApi`]
#[derive(Clone)]
pub struct PolymarketClient {
    pub gamma: GammaClient,
    pub data: DataClient,
    pub clob: ClobClient,
}

impl PolymarketClient {
    pub fn new(api: &ApiConfig, download: &DownloadConfig) -> Result<Self> {
        let http = build_http(api.timeout_secs)?;
        Ok(Self {
            gamma: GammaClient::with_http(http.clone(), &api.gamma_url),
            data: DataClient::with_http(http.clone(), &api.data_url, download.trade_filter_amount),
            clob: ClobClient::with_http(http, &api.clob_url, download.price_fidelity),
        })
    }
}

#[async_trait]
impl MarketDataApi for PolymarketClient {
    async fn fetch_events_page(&self, offset: usize, limit: usize) -> Result<Vec<Value>> {
        self.gamma.get_closed_events(offset, limit).await
    }

    async fn fetch_trades_page(
        &self,
        condition_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>> {
        self.data.get_trades(condition_id, offset, limit).await
    }

    async fn fetch_price_history(&self, token_id: &str, start_ts: i64) -> Result<Value> {
        self.clob.get_price_history(token_id, start_ts).await
    }
}

pub(crate) fn build_http(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Map 429 to [`ResearchError::RateLimited`], other failures to HTTP errors
pub(crate) async fn read_json(resp: Response, what: &str) -> Result<Value> {
    if resp.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(ResearchError::RateLimited(what.to_string()));
    }
    let resp = resp.error_for_status()?;
    Ok(resp.json().await?)
}

/// Expect a JSON array; `null` counts as an empty page
pub(crate) fn into_array(value: Value, what: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(ResearchError::Api(format!(
            "{}: expected a JSON array, got {}",
            what,
            json_kind(&other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
