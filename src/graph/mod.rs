//! Counterparty graph
//!
//! Taker trades do not name the maker, so counterparties are inferred: two
//! wallets are linked when one buys and the other sells the same outcome
//! token within a time window. The graph is undirected and weighted by the
//! matched notional.


use crate::config::GraphConfig;
use crate::types::Trade;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// A wallet and its trading totals
#[derive(Debug, Clone, Serialize)]
pub struct WalletNode {
    pub wallet: String,
    pub total_notional: f64,
    pub trade_count: usize,
    pub markets: BTreeSet<String>,
}

impl WalletNode {
    fn new(wallet: &str) -> Self {
        Self {
            wallet: wallet.to_string(),
            total_notional: 0.0,
            trade_count: 0,
            markets: BTreeSet::new(),
        }
    }

    pub fn markets_traded(&self) -> usize {
        self.markets.len()
    }
}

/// Undirected edge between two node indices, `a < b`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    /// Sum of matched notional
    pub weight: f64,
    pub interactions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CounterpartyGraph {
    nodes: Vec<WalletNode>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<(usize, usize), usize>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl CounterpartyGraph {
    pub fn from_config(trades: &[Trade], config: &GraphConfig) -> Self {
        Self::build(trades, config.window_secs, config.min_notional)
    }

    /// Link opposing trades on the same token at most `window_secs` apart.
    /// Trades below `min_notional`, or without an asset id, count toward node
    /// totals only.
    pub fn build(trades: &[Trade], window_secs: i64, min_notional: f64) -> Self {
        let mut graph = Self::default();

        let mut by_token: HashMap<&str, Vec<(usize, &Trade)>> = HashMap::new();
        for trade in trades.iter().filter(|t| !t.proxy_wallet.is_empty()) {
            let node = graph.node_id(&trade.proxy_wallet);
            let n = &mut graph.nodes[node];
            n.total_notional += trade.notional_f64();
            n.trade_count += 1;
            if !trade.condition_id.is_empty() {
                n.markets.insert(trade.condition_id.clone());
            }
            if !trade.asset.is_empty() && trade.notional_f64() >= min_notional {
                by_token.entry(trade.asset.as_str()).or_default().push((node, trade));
            }
        }

        for (_, mut token_trades) in by_token {
            token_trades.sort_by_key(|(_, t)| t.timestamp);
            for (i, (node_a, a)) in token_trades.iter().enumerate() {
                for (node_b, b) in &token_trades[i + 1..] {
                    if b.timestamp - a.timestamp > window_secs {
                        break;
                    }
                    if a.side == b.side || node_a == node_b {
                        continue;
                    }
                    let matched = a.notional_f64().min(b.notional_f64());
                    graph.add_interaction(*node_a, *node_b, matched);
                }
            }
        }

        graph.rebuild_adjacency();
        debug!(
            "Counterparty graph: {} wallets, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    fn node_id(&mut self, wallet: &str) -> usize {
        if let Some(&id) = self.index.get(wallet) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(WalletNode::new(wallet));
        self.index.insert(wallet.to_string(), id);
        id
    }

    fn add_interaction(&mut self, x: usize, y: usize, weight: f64) {
        let key = (x.min(y), x.max(y));
        match self.edge_index.get(&key) {
            Some(&i) => {
                self.edges[i].weight += weight;
                self.edges[i].interactions += 1;
            }
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(Edge {
                    a: key.0,
                    b: key.1,
                    weight,
                    interactions: 1,
                });
            }
        }
    }

    fn rebuild_adjacency(&mut self) {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for e in &self.edges {
            adjacency[e.a].push((e.b, e.weight));
            adjacency[e.b].push((e.a, e.weight));
        }
        self.adjacency = adjacency;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[WalletNode] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> Option<&WalletNode> {
        self.nodes.get(id)
    }

    pub fn node_index(&self, wallet: &str) -> Option<usize> {
        self.index.get(wallet).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_between(&self, x: &str, y: &str) -> Option<&Edge> {
        let (x, y) = (self.node_index(x)?, self.node_index(y)?);
        self.edge_index
            .get(&(x.min(y), x.max(y)))
            .map(|&i| &self.edges[i])
    }

    /// (neighbor, weight) pairs of a node
    pub fn neighbors(&self, id: usize) -> &[(usize, f64)] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }
}
