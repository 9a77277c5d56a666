//! CLOB (Central Limit Order Book) API client
//!
//! Only the public price-history endpoint is used.

use super::read_json;
use crate::error::Result;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// CLOB API client for price history
#[derive(Clone)]
pub struct ClobClient {
    http: Client,
    base_url: String,
    /// History resolution in minutes
    fidelity: u32,
}

impl ClobClient {
    pub fn with_http(http: Client, base_url: &str, fidelity: u32) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            fidelity,
        }
    }

    /// Raw `prices-history` response for a token from `start_ts` onwards
    pub async fn get_price_history(&self, token_id: &str, start_ts: i64) -> Result<Value> {
        let url = format!("{}/prices-history", self.base_url);
        debug!("GET {} market={} startTs={}", url, token_id, start_ts);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("market", token_id.to_string()),
                ("fidelity", self.fidelity.to_string()),
                ("startTs", start_ts.to_string()),
            ])
            .send()
            .await?;

        read_json(resp, "clob prices-history").await
    }
}
