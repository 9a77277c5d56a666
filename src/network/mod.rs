//! Network analysis of the counterparty graph
//!
//! Centrality (strength, degree, weighted PageRank), clusters ranked by
//! volume, per-wallet price impact and counterparty profiles.

pub mod impact;
pub mod pagerank;
pub mod profile;

#[cfg(test)]
mod tests;

pub use impact::{price_impacts, PriceImpact};
pub use pagerank::{default_pagerank, pagerank};
pub use profile::{profile_counterparties, CounterpartyProfile, CounterpartyStyle};

use crate::graph::CounterpartyGraph;
use crate::types::{Category, PriceHistory, Trade};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::info;

/// Sum of a node's edge weights
pub fn strength(graph: &CounterpartyGraph, node: usize) -> f64 {
    graph.neighbors(node).iter().map(|(_, w)| w).sum()
}

pub fn degree(graph: &CounterpartyGraph, node: usize) -> usize {
    graph.neighbors(node).len()
}

/// A connected component of the graph
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    /// Position after ranking by volume, starting at 1
    pub rank: usize,
    pub members: Vec<String>,
    pub member_count: usize,
    /// Sum of edge weights inside the cluster
    pub internal_weight: f64,
    /// Sum of member trade notional
    pub total_notional: f64,
}

/// Connected components ranked by member notional, then internal weight
pub fn components(graph: &CounterpartyGraph) -> Vec<Cluster> {
    let n = graph.node_count();
    let mut component = vec![usize::MAX; n];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for start in 0..n {
        if component[start] != usize::MAX {
            continue;
        }
        let id = groups.len();
        let mut members = Vec::new();
        let mut queue = VecDeque::from([start]);
        component[start] = id;
        while let Some(v) = queue.pop_front() {
            members.push(v);
            for &(u, _) in graph.neighbors(v) {
                if component[u] == usize::MAX {
                    component[u] = id;
                    queue.push_back(u);
                }
            }
        }
        groups.push(members);
    }

    let mut internal = vec![0.0; groups.len()];
    for e in graph.edges() {
        internal[component[e.a]] += e.weight;
    }

    let mut clusters: Vec<Cluster> = groups
        .into_iter()
        .zip(internal)
        .map(|(members, internal_weight)| {
            let total_notional = members
                .iter()
                .filter_map(|&m| graph.node(m))
                .map(|node| node.total_notional)
                .sum();
            let mut names: Vec<String> = members
                .iter()
                .filter_map(|&m| graph.node(m))
                .map(|node| node.wallet.clone())
                .collect();
            names.sort();
            Cluster {
                rank: 0,
                member_count: names.len(),
                members: names,
                internal_weight,
                total_notional,
            }
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.total_notional
            .total_cmp(&a.total_notional)
            .then(b.internal_weight.total_cmp(&a.internal_weight))
            .then(a.members.cmp(&b.members))
    });
    for (i, c) in clusters.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    clusters
}

/// One row of the counterparty ranking
#[derive(Debug, Clone, Serialize)]
pub struct CounterpartyRank {
    pub wallet: String,
    pub pagerank: f64,
    pub strength: f64,
    pub degree: usize,
    pub total_notional: f64,
    pub trade_count: usize,
    pub markets_traded: usize,
    pub price_impact: Option<f64>,
    pub impact_samples: usize,
    pub style: Option<CounterpartyStyle>,
}

/// Network metrics for every wallet
#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub wallets: usize,
    pub edges: usize,
    pub total_edge_weight: f64,
    pub clusters: Vec<Cluster>,
    pub counterparties: Vec<CounterpartyRank>,
    pub profiles: HashMap<String, CounterpartyProfile>,
}

impl NetworkReport {
    /// Rows sorted by PageRank, then notional
    pub fn rank_counterparties(&self, top_n: usize) -> Vec<&CounterpartyRank> {
        self.counterparties.iter().take(top_n).collect()
    }

    pub fn profile(&self, wallet: &str) -> Option<&CounterpartyProfile> {
        self.profiles.get(wallet)
    }

    pub fn largest_clusters(&self, top_n: usize) -> &[Cluster] {
        &self.clusters[..top_n.min(self.clusters.len())]
    }
}

pub struct NetworkAnalyzer<'a> {
    graph: &'a CounterpartyGraph,
    horizon_secs: i64,
}

impl<'a> NetworkAnalyzer<'a> {
    pub fn new(graph: &'a CounterpartyGraph, horizon_secs: i64) -> Self {
        Self { graph, horizon_secs }
    }

    pub fn analyze(
        &self,
        trades: &[Trade],
        prices: &HashMap<String, PriceHistory>,
        categories: &HashMap<String, Category>,
    ) -> NetworkReport {
        let graph = self.graph;
        let ranks = default_pagerank(graph);
        let impacts = price_impacts(trades, prices, self.horizon_secs);
        let profiles = profile_counterparties(trades, categories, prices, self.horizon_secs);
        let clusters = components(graph);

        let mut counterparties: Vec<CounterpartyRank> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let impact = impacts.get(&node.wallet);
                CounterpartyRank {
                    wallet: node.wallet.clone(),
                    pagerank: ranks.get(i).copied().unwrap_or(0.0),
                    strength: strength(graph, i),
                    degree: degree(graph, i),
                    total_notional: node.total_notional,
                    trade_count: node.trade_count,
                    markets_traded: node.markets_traded(),
                    price_impact: impact.map(|p| p.mean_signed_move),
                    impact_samples: impact.map(|p| p.samples).unwrap_or(0),
                    style: profiles.get(&node.wallet).map(|p| p.style),
                }
            })
            .collect();
        counterparties.sort_by(|a, b| {
            b.pagerank
                .total_cmp(&a.pagerank)
                .then(b.total_notional.total_cmp(&a.total_notional))
                .then(a.wallet.cmp(&b.wallet))
        });

        info!(
            "Network: {} wallets, {} edges, {} clusters",
            graph.node_count(),
            graph.edge_count(),
            clusters.len()
        );

        NetworkReport {
            wallets: graph.node_count(),
            edges: graph.edge_count(),
            total_edge_weight: graph.total_weight(),
            clusters,
            counterparties,
            profiles,
        }
    }
}
