//! Taker-trade download for the highest-volume markets

use super::backoff::{retry_rate_limited, Backoff};
use super::catalog::{MarketCatalog, MarketVolume};
use crate::client::MarketDataApi;
use crate::config::DownloadConfig;
use crate::error::Result;
use crate::storage::{DataLayout, GzJsonArrayWriter};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Keep the top `percentile` of markets by volume (at least one when any exist)
pub fn select_top_markets(markets: &[MarketVolume], percentile: f64) -> Vec<MarketVolume> {
    if markets.is_empty() {
        return Vec::new();
    }
    let mut sorted = markets.to_vec();
    sorted.sort_by(|a, b| {
        b.volume
            .partial_cmp(&a.volume)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let cutoff = ((sorted.len() as f64 * percentile).floor() as usize).max(1);
    sorted.truncate(cutoff);
    sorted
}

/// Result of downloading one market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketDownload {
    Saved(usize),
    NoTrades,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeDownloadSummary {
    pub markets_found: usize,
    pub markets_selected: usize,
    pub already_processed: usize,
    pub markets_saved: usize,
    pub markets_without_trades: usize,
    pub markets_failed: usize,
    pub trades_saved: usize,
}

pub struct TradeDownloader {
    api: Arc<dyn MarketDataApi>,
    layout: DataLayout,
    page_limit: usize,
    percentile: f64,
    request_delay: Duration,
    backoff: Backoff,
    max_retries: u32,
}

impl TradeDownloader {
    pub fn new(api: Arc<dyn MarketDataApi>, layout: DataLayout, config: &DownloadConfig) -> Self {
        Self {
            api,
            layout,
            page_limit: config.trades_page_limit,
            percentile: config.top_percentile,
            request_delay: Duration::from_millis(config.request_delay_ms),
            backoff: Backoff::from_config(config),
            max_retries: config.max_retries,
        }
    }

    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = percentile;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff, request_delay: Duration) -> Self {
        self.backoff = backoff;
        self.request_delay = request_delay;
        self
    }

    /// Select top markets from the catalog and download every unprocessed one
    pub async fn run(&mut self, catalog: &MarketCatalog) -> Result<TradeDownloadSummary> {
        let all = catalog.market_volumes();
        info!("Found {} markets.", all.len());

        let top = select_top_markets(&all, self.percentile);
        info!(
            "Filtered to top {} markets (top {:.0}% by volume).",
            top.len(),
            self.percentile * 100.0
        );

        let processed = self.layout.processed_trade_markets()?;
        info!("Found {} already processed markets.", processed.len());

        let mut seen = HashSet::new();
        let remaining: Vec<MarketVolume> = top
            .iter()
            .filter(|m| !processed.contains(&m.condition_id))
            .filter(|m| seen.insert(m.condition_id.clone()))
            .cloned()
            .collect();
        info!("Remaining markets to process: {}", remaining.len());

        let mut summary = TradeDownloadSummary {
            markets_found: all.len(),
            markets_selected: top.len(),
            already_processed: top.len() - remaining.len(),
            ..Default::default()
        };

        let no_data = self.layout.trades_no_data();
        for (i, market) in remaining.iter().enumerate() {
            info!(
                "[{}/{}] Downloading trades for {} (Volume: {})...",
                i + 1,
                remaining.len(),
                market.condition_id,
                market.volume
            );
            match self.download_market(&market.condition_id).await? {
                MarketDownload::Saved(count) => {
                    info!("Saved {} trades.", count);
                    summary.markets_saved += 1;
                    summary.trades_saved += count;
                }
                MarketDownload::NoTrades => {
                    info!("No trades for {}", market.condition_id);
                    no_data.append(&market.condition_id)?;
                    summary.markets_without_trades += 1;
                }
                MarketDownload::Failed => {
                    warn!("Failed to download trades. Skipping...");
                    summary.markets_failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Stream every trade page of a market into its gzip archive.
    /// Request failures remove the partial archive; IO failures propagate.
    pub async fn download_market(&mut self, condition_id: &str) -> Result<MarketDownload> {
        let path = self.layout.trade_file(condition_id);
        let mut writer = GzJsonArrayWriter::create(&path)?;
        let mut offset = 0usize;

        loop {
            let api = self.api.clone();
            let limit = self.page_limit;
            let page = retry_rate_limited(&mut self.backoff, self.max_retries, condition_id, || {
                let api = api.clone();
                let cid = condition_id.to_string();
                async move { api.fetch_trades_page(&cid, offset, limit).await }
            })
            .await;

            let page = match page {
                Ok(p) => p,
                Err(e) => {
                    warn!("Error downloading trades for {}: {}", condition_id, e);
                    writer.abandon()?;
                    return Ok(MarketDownload::Failed);
                }
            };

            if page.is_empty() {
                break;
            }

            for trade in &page {
                writer.write_item(trade)?;
                let total = writer.count();
                if total % 10_000 == 0 {
                    info!("Downloaded {} trades for {}...", total, condition_id);
                }
            }

            if page.len() < self.page_limit {
                break;
            }
            offset += self.page_limit;
            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        if writer.count() == 0 {
            writer.abandon()?;
            return Ok(MarketDownload::NoTrades);
        }
        Ok(MarketDownload::Saved(writer.finish()?))
    }
}
