//! Market catalog built from archived event pages

use crate::error::Result;
use crate::storage::DataLayout;
use crate::types::{Event, Market};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// A market together with the event it belongs to
#[derive(Debug, Clone)]
pub struct MarketEntry {
    pub event_id: String,
    pub event_title: String,
    pub event_category: Option<String>,
    pub market: Market,
}

impl MarketEntry {
    /// Event category label, falling back to the market's own
    pub fn category_label(&self) -> Option<&str> {
        self.event_category
            .as_deref()
            .or(self.market.category.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// (condition id, volume) pair used to rank markets for trade download
#[derive(Debug, Clone, PartialEq)]
pub struct MarketVolume {
    pub condition_id: String,
    pub volume: f64,
}

/// Every event and market from the events directory, indexed by id
#[derive(Debug, Default)]
pub struct MarketCatalog {
    events: Vec<Event>,
    entries: Vec<MarketEntry>,
    by_condition: HashMap<String, usize>,
    by_token: HashMap<String, usize>,
}

impl MarketCatalog {
    pub fn load(layout: &DataLayout) -> Result<Self> {
        let mut events = Vec::new();
        for path in layout.event_files()? {
            events.extend(read_event_file(&path));
        }
        debug!("Loaded {} events from {}", events.len(), layout.events_dir.display());
        Ok(Self::from_events(events))
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        let mut entries = Vec::new();
        let mut by_condition = HashMap::new();
        let mut by_token = HashMap::new();

        for event in &events {
            for market in &event.markets {
                let idx = entries.len();
                if let Some(cid) = market.condition_id.as_deref().filter(|c| !c.is_empty()) {
                    by_condition.entry(cid.to_string()).or_insert(idx);
                }
                for token in &market.clob_token_ids {
                    by_token.insert(token.clone(), idx);
                }
                entries.push(MarketEntry {
                    event_id: event.id.clone(),
                    event_title: event.title.clone(),
                    event_category: event.category_label().map(str::to_string),
                    market: market.clone(),
                });
            }
        }

        Self {
            events,
            entries,
            by_condition,
            by_token,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn entries(&self) -> &[MarketEntry] {
        &self.entries
    }

    pub fn market_count(&self) -> usize {
        self.entries.len()
    }

    pub fn by_condition_id(&self, condition_id: &str) -> Option<&MarketEntry> {
        self.by_condition.get(condition_id).map(|&i| &self.entries[i])
    }

    /// Latest market listing the token wins
    pub fn by_token(&self, token_id: &str) -> Option<&MarketEntry> {
        self.by_token.get(token_id).map(|&i| &self.entries[i])
    }

    /// Every market with a condition id, in file order; missing volume counts as 0
    pub fn market_volumes(&self) -> Vec<MarketVolume> {
        self.entries
            .iter()
            .filter_map(|e| {
                let cid = e.market.condition_id.as_deref()?;
                (!cid.is_empty()).then(|| MarketVolume {
                    condition_id: cid.to_string(),
                    volume: e.market.volume_or_zero(),
                })
            })
            .collect()
    }

    /// Token ids in first-seen order, each paired with the last market that lists it
    pub fn token_markets(&self) -> Vec<(String, &Market)> {
        let mut order: Vec<String> = Vec::new();
        let mut latest: HashMap<String, usize> = HashMap::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            for token in &entry.market.clob_token_ids {
                if latest.insert(token.clone(), idx).is_none() {
                    order.push(token.clone());
                }
            }
        }
        order
            .into_iter()
            .map(|token| {
                let idx = latest[&token];
                (token, &self.entries[idx].market)
            })
            .collect()
    }
}

/// Parse one events file; unreadable files and non-object entries are skipped
pub fn read_event_file(path: &Path) -> Vec<Event> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    let value: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!("Error parsing {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| match serde_json::from_value::<Event>(item) {
                Ok(ev) => Some(ev),
                Err(e) => {
                    debug!("Skipping malformed event in {}: {}", path.display(), e);
                    None
                }
            })
            .collect(),
        _ => {
            warn!("{} does not contain an event list", path.display());
            Vec::new()
        }
    }
}
