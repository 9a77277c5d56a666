//! Load archived trades and price histories into normalized types

use crate::error::Result;
use crate::storage::{read_json_array, DataLayout};
use crate::types::{PriceHistory, Trade};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Read access to the trade archives
pub struct TradeStore<'a> {
    layout: &'a DataLayout,
}

impl<'a> TradeStore<'a> {
    pub fn new(layout: &'a DataLayout) -> Self {
        Self { layout }
    }

    /// Trades of one market; a missing archive yields no trades
    pub fn load_market(&self, condition_id: &str) -> Result<Vec<Trade>> {
        match self.layout.find_trade_file(condition_id) {
            Some(path) => load_trade_file(&path, condition_id),
            None => Ok(Vec::new()),
        }
    }

    /// Every archived trade, sorted by timestamp. Unreadable archives are skipped.
    pub fn load_all(&self) -> Result<Vec<Trade>> {
        let mut trades = Vec::new();
        for path in self.layout.trade_files()? {
            let cid = DataLayout::market_from_trade_file(&path).unwrap_or_default();
            match load_trade_file(&path, &cid) {
                Ok(mut t) => trades.append(&mut t),
                Err(e) => warn!("Skipping trade archive {}: {}", path.display(), e),
            }
        }
        trades.sort_by_key(|t| t.timestamp);
        Ok(trades)
    }
}

/// Parse a trade archive; records that do not parse are dropped and a blank
/// `conditionId` is filled from the file name
pub fn load_trade_file(path: &Path, condition_id: &str) -> Result<Vec<Trade>> {
    let raw = read_json_array(path)?;
    let total = raw.len();
    let trades: Vec<Trade> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Trade>(v).ok())
        .map(|mut t| {
            if t.condition_id.is_empty() {
                t.condition_id = condition_id.to_string();
            }
            t
        })
        .collect();
    if trades.len() < total {
        debug!(
            "Dropped {} malformed trades from {}",
            total - trades.len(),
            path.display()
        );
    }
    Ok(trades)
}

/// Read access to the price-history files
pub struct PriceStore<'a> {
    layout: &'a DataLayout,
}

impl<'a> PriceStore<'a> {
    pub fn new(layout: &'a DataLayout) -> Self {
        Self { layout }
    }

    pub fn load(&self, token_id: &str) -> Result<Option<PriceHistory>> {
        match self.layout.find_price_file(token_id) {
            Some(path) => load_price_file(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Every non-empty history keyed by token id
    pub fn load_all(&self) -> Result<HashMap<String, PriceHistory>> {
        let mut out = HashMap::new();
        for path in self.layout.price_files()? {
            let Some(token) = DataLayout::token_from_price_file(&path) else {
                continue;
            };
            match load_price_file(&path) {
                Ok(history) if !history.is_empty() => {
                    out.insert(token, history);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping price file {}: {}", path.display(), e),
            }
        }
        Ok(out)
    }
}

pub fn load_price_file(path: &Path) -> Result<PriceHistory> {
    let content = fs::read_to_string(path)?;
    let parsed: PriceHistory = serde_json::from_str(&content)?;
    Ok(PriceHistory::new(parsed.history))
}
