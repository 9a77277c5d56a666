//! Feature extraction
//!
//! Per-trade rows for the price-movement regression and per-market summaries
//! for category and option-class comparisons.


use crate::classify::{MarketClassifier, MarketLabel};
use crate::ingest::MarketCatalog;
use crate::types::{Category, OptionClass, PriceHistory, Side, Trade};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use tracing::debug;

/// Column names of [`TradeFeatureRow::values`], in order
pub const TRADE_FEATURES: [&str; 16] = [
    "side_sign",
    "log_notional",
    "price",
    "price_extremity",
    "hour_sin",
    "hour_cos",
    "hours_to_end",
    "prior_move",
    "market_log_volume",
    "market_spread",
    "is_replicable",
    "cat_politics",
    "cat_sports",
    "cat_crypto",
    "cat_economics",
    "cat_entertainment",
];

const ONE_HOT: [Category; 5] = [
    Category::Politics,
    Category::Sports,
    Category::Crypto,
    Category::Economics,
    Category::Entertainment,
];

/// What the trade features need to know about a market
#[derive(Debug, Clone)]
pub struct MarketContext {
    pub volume: f64,
    pub spread: f64,
    pub end_time: Option<DateTime<Utc>>,
    pub label: MarketLabel,
}

/// Contexts keyed by condition id
pub fn market_contexts(
    catalog: &MarketCatalog,
    classifier: &MarketClassifier,
) -> HashMap<String, MarketContext> {
    let mut out = HashMap::new();
    for (entry, label) in classifier.classify_all(catalog) {
        let Some(cid) = entry.market.condition_id.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        out.entry(cid.to_string()).or_insert_with(|| MarketContext {
            volume: entry.market.reported_volume().unwrap_or(0.0),
            spread: entry.market.spread.unwrap_or(0.0),
            end_time: entry.market.end_time(),
            label,
        });
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeFeatureRow {
    pub timestamp: i64,
    pub wallet: String,
    pub condition_id: String,
    pub asset: String,
    pub category: Category,
    pub option_class: OptionClass,
    pub values: Vec<f64>,
    /// Price change over the horizon after the trade
    pub target: f64,
}

/// Rows in chronological order
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureSet {
    pub names: Vec<String>,
    pub rows: Vec<TradeFeatureRow>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn matrix(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x = self.rows.iter().map(|r| r.values.clone()).collect();
        let y = self.rows.iter().map(|r| r.target).collect();
        (x, y)
    }

    /// Rows of one option class, order kept
    pub fn filter_class(&self, class: OptionClass) -> FeatureSet {
        FeatureSet {
            names: self.names.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.option_class == class)
                .cloned()
                .collect(),
        }
    }
}

/// Fractional UTC hour of day
fn hour_of_day(ts: i64) -> f64 {
    ts.rem_euclid(86_400) as f64 / 3600.0
}

/// Features of one trade; `None` when the token history does not cover the
/// horizon after it
pub fn trade_features(
    trade: &Trade,
    history: &PriceHistory,
    context: Option<&MarketContext>,
    horizon_secs: i64,
) -> Option<TradeFeatureRow> {
    let target = history.covered_change(trade.timestamp, trade.timestamp + horizon_secs)?;
    let price = trade.price_f64();
    let hour = hour_of_day(trade.timestamp);
    let angle = 2.0 * PI * hour / 24.0;

    let hours_to_end = context
        .and_then(|c| c.end_time)
        .map(|end| ((end.timestamp() - trade.timestamp) as f64 / 3600.0).max(0.0))
        .map(|h| h.ln_1p())
        .unwrap_or(0.0);
    let prior_move = history
        .covered_change(trade.timestamp - horizon_secs, trade.timestamp)
        .unwrap_or(0.0);

    let category = context.map(|c| c.label.category).unwrap_or(Category::Other);
    let option_class = context
        .map(|c| c.label.option_class)
        .unwrap_or(OptionClass::Naked);

    let mut values = vec![
        trade.side.sign(),
        trade.notional_f64().max(0.0).ln_1p(),
        price,
        (price - 0.5).abs(),
        angle.sin(),
        angle.cos(),
        hours_to_end,
        prior_move,
        context.map(|c| c.volume.max(0.0).ln_1p()).unwrap_or(0.0),
        context.map(|c| c.spread).unwrap_or(0.0),
        if option_class == OptionClass::Replicable { 1.0 } else { 0.0 },
    ];
    values.extend(ONE_HOT.iter().map(|c| if *c == category { 1.0 } else { 0.0 }));

    Some(TradeFeatureRow {
        timestamp: trade.timestamp,
        wallet: trade.proxy_wallet.clone(),
        condition_id: trade.condition_id.clone(),
        asset: trade.asset.clone(),
        category,
        option_class,
        values,
        target,
    })
}

/// Feature rows for every trade with history coverage, sorted by time
pub fn extract_trade_features(
    trades: &[Trade],
    prices: &HashMap<String, PriceHistory>,
    contexts: &HashMap<String, MarketContext>,
    horizon_secs: i64,
) -> FeatureSet {
    let mut rows: Vec<TradeFeatureRow> = trades
        .iter()
        .filter_map(|t| {
            let history = prices.get(&t.asset)?;
            trade_features(t, history, contexts.get(&t.condition_id), horizon_secs)
        })
        .collect();
    rows.sort_by_key(|r| r.timestamp);
    debug!(
        "Extracted features for {} of {} trades",
        rows.len(),
        trades.len()
    );
    FeatureSet {
        names: TRADE_FEATURES.iter().map(|s| s.to_string()).collect(),
        rows,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketFeatures {
    pub condition_id: String,
    pub question: String,
    pub log_volume: f64,
    pub log_liquidity: f64,
    pub spread: f64,
    pub yes_price: Option<f64>,
    pub category: Category,
    pub option_class: OptionClass,
    pub trade_count: usize,
    /// Share of taker trades that were buys; `None` without trades
    pub taker_buy_share: Option<f64>,
}

/// One row per market with a condition id, in catalog order
pub fn extract_market_features(
    catalog: &MarketCatalog,
    classifier: &MarketClassifier,
    trades: &[Trade],
) -> Vec<MarketFeatures> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for t in trades {
        let c = counts.entry(t.condition_id.as_str()).or_default();
        c.0 += 1;
        if t.side == Side::Buy {
            c.1 += 1;
        }
    }

    let mut seen = HashSet::new();
    classifier
        .classify_all(catalog)
        .into_iter()
        .filter_map(|(entry, label)| {
            let cid = entry.market.condition_id.as_deref().filter(|c| !c.is_empty())?;
            if !seen.insert(cid.to_string()) {
                return None;
            }
            let (n, buys) = counts.get(cid).copied().unwrap_or((0, 0));
            Some(MarketFeatures {
                condition_id: cid.to_string(),
                question: entry.market.question.clone(),
                log_volume: entry.market.reported_volume().unwrap_or(0.0).max(0.0).ln_1p(),
                log_liquidity: entry.market.reported_liquidity().unwrap_or(0.0).max(0.0).ln_1p(),
                spread: entry.market.spread.unwrap_or(0.0),
                yes_price: entry.market.yes_price(),
                category: label.category,
                option_class: label.option_class,
                trade_count: n,
                taker_buy_share: (n > 0).then(|| buys as f64 / n as f64),
            })
        })
        .collect()
}
