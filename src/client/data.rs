//! Data API client for historical taker trades

use super::{into_array, read_json};
use crate::error::Result;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Data API client
#[derive(Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
    /// Minimum cash value of returned trades
    filter_amount: u64,
}

impl DataClient {
    pub fn with_http(http: Client, base_url: &str, filter_amount: u64) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            filter_amount,
        }
    }

    /// One page of taker trades at or above the cash filter for a market
    pub async fn get_trades(
        &self,
        condition_id: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/trades", self.base_url);
        debug!("GET {} market={} offset={}", url, condition_id, offset);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("takerOnly", "true".to_string()),
                ("market", condition_id.to_string()),
                ("filterType", "CASH".to_string()),
                ("filterAmount", self.filter_amount.to_string()),
            ])
            .send()
            .await?;

        into_array(read_json(resp, "data-api trades").await?, "data-api trades")
    }
}
