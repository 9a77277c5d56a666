//! Counterparty profiling and categorization

use crate::types::{Category, PriceHistory, Side, Trade};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Average trade notional above which a wallet counts as a whale
pub const WHALE_AVG_NOTIONAL: f64 = 50_000.0;
pub const SCALPER_MIN_TRADES: usize = 20;
/// Trades with a measurable prior move needed before calling a direction style
pub const MIN_DIRECTIONAL_SAMPLES: usize = 5;
pub const DIRECTIONAL_SHARE: f64 = 0.6;

/// Counterparty trading style
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CounterpartyStyle {
    /// Large average tickets
    Whale,
    /// Many trades on both sides
    Scalper,
    /// Trades against the preceding price move
    Contrarian,
    /// Trades with the preceding price move
    Momentum,
    /// Nothing stands out
    Casual,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterpartyProfile {
    pub wallet: String,
    pub trade_count: usize,
    pub total_notional: f64,
    pub avg_trade_notional: f64,
    /// Share of trades that are buys
    pub buy_share: f64,
    /// Most active UTC hours, busiest first (at most three)
    pub active_hours: Vec<u8>,
    pub markets_traded: usize,
    /// Most traded categories, busiest first (at most three)
    pub dominant_categories: Vec<Category>,
    /// Share of directional trades that followed the prior move
    pub with_move_share: Option<f64>,
    pub style: CounterpartyStyle,
}

/// Profile every wallet from its trades. `categories` maps condition ids to
/// categories; `prices` supplies the move before each trade.
pub fn profile_counterparties(
    trades: &[Trade],
    categories: &HashMap<String, Category>,
    prices: &HashMap<String, PriceHistory>,
    horizon_secs: i64,
) -> HashMap<String, CounterpartyProfile> {
    let mut by_wallet: HashMap<&str, Vec<&Trade>> = HashMap::new();
    for trade in trades.iter().filter(|t| !t.proxy_wallet.is_empty()) {
        by_wallet.entry(trade.proxy_wallet.as_str()).or_default().push(trade);
    }
    by_wallet
        .into_iter()
        .map(|(wallet, trades)| {
            let profile = profile_wallet(wallet, &trades, categories, prices, horizon_secs);
            (wallet.to_string(), profile)
        })
        .collect()
}

pub fn profile_wallet(
    wallet: &str,
    trades: &[&Trade],
    categories: &HashMap<String, Category>,
    prices: &HashMap<String, PriceHistory>,
    horizon_secs: i64,
) -> CounterpartyProfile {
    let trade_count = trades.len();
    let total_notional: f64 = trades.iter().map(|t| t.notional_f64()).sum();
    let buys = trades.iter().filter(|t| t.side == Side::Buy).count();

    let mut hours: HashMap<u8, usize> = HashMap::new();
    let mut cats: HashMap<Category, usize> = HashMap::new();
    let mut markets: Vec<&str> = Vec::new();
    let (mut with_move, mut directional) = (0usize, 0usize);

    for trade in trades {
        if let Some(t) = trade.time() {
            *hours.entry(t.hour() as u8).or_default() += 1;
        }
        if let Some(c) = categories.get(&trade.condition_id) {
            *cats.entry(*c).or_default() += 1;
        }
        if !markets.contains(&trade.condition_id.as_str()) {
            markets.push(trade.condition_id.as_str());
        }
        let prior = prices
            .get(&trade.asset)
            .and_then(|h| h.covered_change(trade.timestamp - horizon_secs, trade.timestamp));
        if let Some(m) = prior.filter(|m| *m != 0.0) {
            directional += 1;
            if trade.side.sign() * m > 0.0 {
                with_move += 1;
            }
        }
    }

    let avg_trade_notional = if trade_count > 0 {
        total_notional / trade_count as f64
    } else {
        0.0
    };
    let buy_share = if trade_count > 0 {
        buys as f64 / trade_count as f64
    } else {
        0.0
    };
    let with_move_share = (directional > 0).then(|| with_move as f64 / directional as f64);

    let style = determine_style(trade_count, avg_trade_notional, buy_share, with_move_share, directional);

    CounterpartyProfile {
        wallet: wallet.to_string(),
        trade_count,
        total_notional,
        avg_trade_notional,
        buy_share,
        active_hours: top_keys(hours, 3),
        markets_traded: markets.len(),
        dominant_categories: top_keys(cats, 3),
        with_move_share,
        style,
    }
}

fn determine_style(
    trade_count: usize,
    avg_notional: f64,
    buy_share: f64,
    with_move_share: Option<f64>,
    directional: usize,
) -> CounterpartyStyle {
    let two_sided = (0.35..=0.65).contains(&buy_share);

    if avg_notional >= WHALE_AVG_NOTIONAL {
        CounterpartyStyle::Whale
    } else if trade_count >= SCALPER_MIN_TRADES && two_sided {
        CounterpartyStyle::Scalper
    } else if directional >= MIN_DIRECTIONAL_SAMPLES {
        match with_move_share {
            Some(s) if s <= 1.0 - DIRECTIONAL_SHARE => CounterpartyStyle::Contrarian,
            Some(s) if s >= DIRECTIONAL_SHARE => CounterpartyStyle::Momentum,
            _ => CounterpartyStyle::Casual,
        }
    } else {
        CounterpartyStyle::Casual
    }
}

/// Keys with the highest counts; ties broken by key order
fn top_keys<K: Ord + Copy>(counts: HashMap<K, usize>, n: usize) -> Vec<K> {
    let mut items: Vec<(K, usize)> = counts.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    items.into_iter().take(n).map(|(k, _)| k).collect()
}
