//! Weighted PageRank

use crate::graph::CounterpartyGraph;

pub const DEFAULT_DAMPING: f64 = 0.85;
pub const DEFAULT_TOLERANCE: f64 = 1e-9;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// PageRank over the undirected weighted graph. Each node spreads its score
/// to neighbors in proportion to edge weight; nodes without edges spread it
/// uniformly. Stops when the L1 change drops below `tolerance`.
pub fn pagerank(
    graph: &CounterpartyGraph,
    damping: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    let uniform = 1.0 / n as f64;
    let strength: Vec<f64> = (0..n)
        .map(|i| graph.neighbors(i).iter().map(|(_, w)| w).sum())
        .collect();

    let mut rank = vec![uniform; n];
    for _ in 0..max_iterations {
        let dangling: f64 = (0..n)
            .filter(|&i| strength[i] <= 0.0)
            .map(|i| rank[i])
            .sum();
        let base = (1.0 - damping) * uniform + damping * dangling * uniform;
        let mut next = vec![base; n];
        for (i, r) in rank.iter().enumerate() {
            if strength[i] <= 0.0 {
                continue;
            }
            for &(j, w) in graph.neighbors(i) {
                next[j] += damping * r * w / strength[i];
            }
        }
        let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < tolerance {
            break;
        }
    }
    rank
}

pub fn default_pagerank(graph: &CounterpartyGraph) -> Vec<f64> {
    pagerank(graph, DEFAULT_DAMPING, DEFAULT_TOLERANCE, DEFAULT_MAX_ITERATIONS)
}
