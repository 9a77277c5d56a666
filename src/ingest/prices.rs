//! Per-token price-history download

use super::backoff::{retry_rate_limited, Backoff};
use super::catalog::MarketCatalog;
use crate::client::MarketDataApi;
use crate::config::DownloadConfig;
use crate::error::Result;
use crate::storage::{write_json_pretty, DataLayout, NoDataRegistry};
use crate::types::Market;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// History start: market end date minus the buffer, clamped at zero.
/// Without a usable end date, `now` minus the buffer.
pub fn compute_start_timestamp(market: &Market, buffer_minutes: i64, now: DateTime<Utc>) -> i64 {
    match market.end_time() {
        Some(end) => (end.timestamp() - buffer_minutes * 60).max(0),
        None => (now - ChronoDuration::minutes(buffer_minutes)).timestamp(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDownload {
    Saved(usize),
    NoData,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceDownloadSummary {
    pub tokens_found: usize,
    pub already_processed: usize,
    pub saved: usize,
    pub no_data: usize,
    pub failed: usize,
    pub points_saved: usize,
}

pub struct PriceDownloader {
    api: Arc<dyn MarketDataApi>,
    layout: DataLayout,
    buffer_minutes: i64,
    concurrency: usize,
    backoff: Backoff,
    max_retries: u32,
}

impl PriceDownloader {
    pub fn new(api: Arc<dyn MarketDataApi>, layout: DataLayout, config: &DownloadConfig) -> Self {
        Self {
            api,
            layout,
            buffer_minutes: config.price_buffer_minutes,
            concurrency: config.concurrency.max(1),
            backoff: Backoff::from_config(config),
            max_retries: config.max_retries,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Download history for every catalog token not yet processed
    pub async fn run(&self, catalog: &MarketCatalog) -> Result<PriceDownloadSummary> {
        let tokens = catalog.token_markets();
        info!("Found {} markets", tokens.len());

        let processed = self.layout.processed_price_tokens()?;
        info!("Already processed: {} markets", processed.len());

        let total = tokens.len();
        let mut summary = PriceDownloadSummary {
            tokens_found: total,
            ..Default::default()
        };

        let mut pending = Vec::new();
        for (i, (token, market)) in tokens.into_iter().enumerate() {
            if processed.contains(&token) {
                debug!("[{}/{}] Market: {} (SKIPPED - already processed)", i + 1, total, token);
                summary.already_processed += 1;
                continue;
            }
            pending.push((i + 1, token, market));
        }

        let registry = self.layout.prices_no_data();
        let now = Utc::now();
        let results: Vec<Result<PriceDownload>> = stream::iter(pending)
            .map(|(pos, token, market)| {
                let registry = &registry;
                async move {
                    info!("[{}/{}] Market: {}", pos, total, token);
                    self.download_token(&token, market, registry, now).await
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for result in results {
            match result? {
                PriceDownload::Saved(points) => {
                    summary.saved += 1;
                    summary.points_saved += points;
                }
                PriceDownload::NoData => summary.no_data += 1,
                PriceDownload::Failed => summary.failed += 1,
            }
        }

        Ok(summary)
    }

    /// Fetch one token's history; empty histories are recorded in `no_data.txt`
    pub async fn download_token(
        &self,
        token: &str,
        market: &Market,
        registry: &NoDataRegistry,
        now: DateTime<Utc>,
    ) -> Result<PriceDownload> {
        let start_ts = compute_start_timestamp(market, self.buffer_minutes, now);
        let mut backoff = self.backoff.clone();
        let api = self.api.clone();

        debug!("Downloading price history for {} from {}", token, start_ts);
        let response = retry_rate_limited(&mut backoff, self.max_retries, token, || {
            let api = api.clone();
            let token = token.to_string();
            async move { api.fetch_price_history(&token, start_ts).await }
        })
        .await;

        let data = match response {
            Ok(d) => d,
            Err(e) => {
                warn!("Error downloading price history for {}: {}", token, e);
                return Ok(PriceDownload::Failed);
            }
        };

        let points = data
            .get("history")
            .and_then(|h| h.as_array())
            .map(|h| h.len())
            .unwrap_or(0);

        if points == 0 {
            info!("No price history found for market {}", token);
            registry.append(token)?;
            return Ok(PriceDownload::NoData);
        }

        let path = self.layout.price_file(token);
        write_json_pretty(&path, &data)?;
        info!("Retrieved {} price points, saved to {}", points, path.display());
        Ok(PriceDownload::Saved(points))
    }
}
