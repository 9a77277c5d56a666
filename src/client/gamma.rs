//! Gamma API client for event and market metadata

use super::{into_array, read_json};
use crate::error::Result;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Gamma API client
#[derive(Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
}

impl GammaClient {
    pub fn with_http(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// One page of closed events, untouched so it can be archived verbatim
    pub async fn get_closed_events(&self, offset: usize, limit: usize) -> Result<Vec<Value>> {
        let url = format!("{}/events", self.base_url);
        debug!("GET {} offset={} limit={}", url, offset, limit);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("closed", "true".to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;

        into_array(read_json(resp, "gamma events").await?, "gamma events")
    }
}
