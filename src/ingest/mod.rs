//! Trade ingestion
//!
//! Downloads closed events, taker trades and price histories from the
//! public Polymarket APIs into the on-disk layout, then loads them back as
//! normalized types for the analysis stages.
//!
//! ```text
//! Gamma /events ──► events/ ──► MarketCatalog ─┬─► Data API /trades ──► trades/
//!                                              └─► CLOB /prices-history ──► prices/
//! ```

pub mod backoff;
pub mod catalog;
pub mod events;
pub mod loader;
pub mod prices;
pub mod trades;


pub use backoff::{retry_rate_limited, Backoff};
pub use catalog::{MarketCatalog, MarketEntry, MarketVolume};
pub use events::{EventDownloadSummary, EventDownloader};
pub use loader::{PriceStore, TradeStore};
pub use prices::{compute_start_timestamp, PriceDownload, PriceDownloadSummary, PriceDownloader};
pub use trades::{select_top_markets, MarketDownload, TradeDownloadSummary, TradeDownloader};

use crate::error::Result;
use crate::storage::DataLayout;
use crate::types::{PriceHistory, Trade};
use std::collections::HashMap;

/// Everything the analysis stages read from disk
pub struct Dataset {
    pub catalog: MarketCatalog,
    pub trades: Vec<Trade>,
    /// Price histories keyed by CLOB token id
    pub prices: HashMap<String, PriceHistory>,
}

impl Dataset {
    pub fn load(layout: &DataLayout) -> Result<Self> {
        let catalog = MarketCatalog::load(layout)?;
        let trades = TradeStore::new(layout).load_all()?;
        let prices = PriceStore::new(layout).load_all()?;
        tracing::info!(
            "Loaded {} events, {} markets, {} trades, {} price series",
            catalog.events().len(),
            catalog.market_count(),
            trades.len(),
            prices.len()
        );
        Ok(Self {
            catalog,
            trades,
            prices,
        })
    }
}
