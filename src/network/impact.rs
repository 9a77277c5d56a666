//! Price impact per wallet

use crate::types::{PriceHistory, Trade};
use serde::Serialize;
use std::collections::HashMap;

/// Mean signed price change following a wallet's trades
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceImpact {
    pub mean_signed_move: f64,
    pub mean_abs_move: f64,
    /// Trades whose token history covers the horizon
    pub samples: usize,
}

#[derive(Default)]
struct Accumulator {
    signed: f64,
    abs: f64,
    n: usize,
}

/// Signed move after one trade: +move for buys, -move for sells
pub fn signed_move(trade: &Trade, history: &PriceHistory, horizon_secs: i64) -> Option<f64> {
    let change = history.covered_change(trade.timestamp, trade.timestamp + horizon_secs)?;
    Some(trade.side.sign() * change)
}

pub fn price_impacts(
    trades: &[Trade],
    prices: &HashMap<String, PriceHistory>,
    horizon_secs: i64,
) -> HashMap<String, PriceImpact> {
    let mut acc: HashMap<&str, Accumulator> = HashMap::new();
    for trade in trades.iter().filter(|t| !t.proxy_wallet.is_empty()) {
        let Some(history) = prices.get(&trade.asset) else {
            continue;
        };
        let Some(m) = signed_move(trade, history, horizon_secs) else {
            continue;
        };
        let a = acc.entry(trade.proxy_wallet.as_str()).or_default();
        a.signed += m;
        a.abs += m.abs();
        a.n += 1;
    }
    acc.into_iter()
        .map(|(wallet, a)| {
            (
                wallet.to_string(),
                PriceImpact {
                    mean_signed_move: a.signed / a.n as f64,
                    mean_abs_move: a.abs / a.n as f64,
                    samples: a.n,
                },
            )
        })
        .collect()
}
