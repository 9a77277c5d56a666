//! Closed-event download with file-based resume

use super::backoff::{retry_rate_limited, Backoff};
use crate::client::MarketDataApi;
use crate::config::DownloadConfig;
use crate::error::Result;
use crate::storage::{write_json_pretty, DataLayout};
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one event download run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDownloadSummary {
    pub start_offset: usize,
    pub pages_written: usize,
    pub events_written: usize,
    /// Set when a request failed; the next run resumes from here
    pub interrupted: Option<String>,
}

pub struct EventDownloader {
    api: Arc<dyn MarketDataApi>,
    layout: DataLayout,
    page_limit: usize,
    backoff: Backoff,
    max_retries: u32,
}

impl EventDownloader {
    pub fn new(api: Arc<dyn MarketDataApi>, layout: DataLayout, config: &DownloadConfig) -> Self {
        Self {
            api,
            layout,
            page_limit: config.events_page_limit,
            backoff: Backoff::from_config(config),
            max_retries: config.max_retries,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff, max_retries: u32) -> Self {
        self.backoff = backoff;
        self.max_retries = max_retries;
        self
    }

    /// Page through closed events until an empty or short page
    pub async fn run(&mut self) -> Result<EventDownloadSummary> {
        fs::create_dir_all(&self.layout.events_dir)?;
        let (mut offset, mut file_index) = self.layout.events_resume_state(self.page_limit)?;
        if file_index > 0 {
            info!(
                "Found existing event files. Resuming from offset {}, file index {}",
                offset, file_index
            );
        }

        let mut summary = EventDownloadSummary {
            start_offset: offset,
            ..Default::default()
        };

        loop {
            info!("Downloading offset {}...", offset);
            let api = self.api.clone();
            let limit = self.page_limit;
            let page = retry_rate_limited(&mut self.backoff, self.max_retries, "events", || {
                let api = api.clone();
                async move { api.fetch_events_page(offset, limit).await }
            })
            .await;

            let page = match page {
                Ok(p) => p,
                Err(e) => {
                    warn!("Error downloading events: {}. Will resume from this point on next run", e);
                    summary.interrupted = Some(e.to_string());
                    break;
                }
            };

            if page.is_empty() {
                info!("No more data to download.");
                break;
            }

            let count = page.len();
            let path = self.layout.event_file(file_index);
            write_json_pretty(&path, &Value::Array(page))?;
            info!("Saved {} events to {}", count, path.display());

            summary.pages_written += 1;
            summary.events_written += count;
            offset += self.page_limit;
            file_index += 1;

            if count < self.page_limit {
                info!("Reached end of data.");
                break;
            }
        }

        Ok(summary)
    }
}
