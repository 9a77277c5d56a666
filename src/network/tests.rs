//! Unit tests for network analysis

#[cfg(test)]
mod tests {
    use super::super::profile::*;
    use super::super::*;
    use crate::graph::CounterpartyGraph;
    use crate::types::{Category, PriceHistory, PricePoint, Side, Trade};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn trade(wallet: &str, side: Side, asset: &str, size: Decimal, ts: i64) -> Trade {
        Trade {
            proxy_wallet: wallet.to_string(),
            side,
            asset: asset.to_string(),
            condition_id: format!("cond-{}", asset),
            size,
            price: dec!(0.5),
            timestamp: ts,
            outcome: None,
            outcome_index: None,
            title: None,
            slug: None,
            transaction_hash: None,
        }
    }

    /// hub sells against three buyers on tok1; a separate pair trades tok2;
    /// loner never matches
    fn star_trades() -> Vec<Trade> {
        vec![
            trade("hub", Side::Sell, "tok1", dec!(1000), 0),
            trade("leaf1", Side::Buy, "tok1", dec!(100), 10),
            trade("leaf2", Side::Buy, "tok1", dec!(100), 20),
            trade("leaf3", Side::Buy, "tok1", dec!(100), 30),
            trade("pair1", Side::Buy, "tok2", dec!(10), 0),
            trade("pair2", Side::Sell, "tok2", dec!(10), 5),
            trade("loner", Side::Buy, "tok3", dec!(10), 0),
        ]
    }

    fn history(points: &[(i64, f64)]) -> PriceHistory {
        PriceHistory::new(points.iter().map(|&(t, p)| PricePoint { t, p }).collect())
    }

    #[test]
    fn test_strength_and_degree() {
        let graph = CounterpartyGraph::build(&star_trades(), 300, 0.0);
        let hub = graph.node_index("hub").unwrap();
        let loner = graph.node_index("loner").unwrap();

        assert_eq!(degree(&graph, hub), 3);
        assert_eq!(strength(&graph, hub), 150.0);
        assert_eq!(degree(&graph, loner), 0);
        assert_eq!(strength(&graph, loner), 0.0);
    }

    #[test]
    fn test_pagerank_sums_to_one_and_ranks_hub_first() {
        let graph = CounterpartyGraph::build(&star_trades(), 300, 0.0);
        let ranks = default_pagerank(&graph);

        assert_eq!(ranks.len(), graph.node_count());
        let total: f64 = ranks.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);

        let hub = graph.node_index("hub").unwrap();
        let leaf = graph.node_index("leaf1").unwrap();
        let loner = graph.node_index("loner").unwrap();
        assert!(ranks[hub] > ranks[leaf]);
        assert!(ranks[leaf] > ranks[loner]);
    }

    #[test]
    fn test_pagerank_edgeless_graph_is_uniform() {
        let trades = vec![
            trade("a", Side::Buy, "tok1", dec!(1), 0),
            trade("b", Side::Buy, "tok1", dec!(1), 1),
        ];
        let graph = CounterpartyGraph::build(&trades, 300, 0.0);
        let ranks = pagerank(&graph, 0.85, 1e-9, 100);
        assert!((ranks[0] - 0.5).abs() < 1e-12);
        assert!((ranks[1] - 0.5).abs() < 1e-12);
        assert!(pagerank(&CounterpartyGraph::default(), 0.85, 1e-9, 100).is_empty());
    }

    #[test]
    fn test_components_ranked_by_volume() {
        let graph = CounterpartyGraph::build(&star_trades(), 300, 0.0);
        let clusters = components(&graph);

        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].rank, 1);
        assert_eq!(clusters[0].member_count, 4);
        assert_eq!(clusters[0].members, vec!["hub", "leaf1", "leaf2", "leaf3"]);
        assert_eq!(clusters[0].internal_weight, 150.0);
        assert_eq!(clusters[0].total_notional, 650.0);

        assert_eq!(clusters[1].members, vec!["pair1", "pair2"]);
        assert_eq!(clusters[1].internal_weight, 5.0);
        assert_eq!(clusters[2].members, vec!["loner"]);
        assert_eq!(clusters[2].internal_weight, 0.0);
        assert_eq!(clusters[2].rank, 3);
    }

    #[test]
    fn test_price_impact_requires_coverage() {
        let trades = vec![
            trade("a", Side::Buy, "tok1", dec!(10), 100),
            trade("a", Side::Sell, "tok1", dec!(10), 200),
            // history ends before the horizon
            trade("a", Side::Buy, "tok1", dec!(10), 5000),
            // no history at all
            trade("b", Side::Buy, "tok9", dec!(10), 100),
        ];
        let mut prices = HashMap::new();
        prices.insert(
            "tok1".to_string(),
            history(&[(0, 0.40), (150, 0.50), (1100, 0.55), (1300, 0.45), (5500, 0.5)]),
        );

        let impacts = price_impacts(&trades, &prices, 1000);
        let a = impacts.get("a").unwrap();
        // buy at 100: 0.40 -> 0.55 = +0.15; sell at 200: 0.50 -> 0.55 = -0.05
        assert_eq!(a.samples, 2);
        assert!((a.mean_signed_move - 0.05).abs() < 1e-9);
        assert!((a.mean_abs_move - 0.10).abs() < 1e-9);
        assert!(impacts.get("b").is_none());
    }

    #[test]
    fn test_profile_styles() {
        let prices: HashMap<String, PriceHistory> = HashMap::new();
        let cats = HashMap::new();

        let whale = vec![trade("w", Side::Buy, "tok1", dec!(200000), 0)];
        let refs: Vec<&Trade> = whale.iter().collect();
        let p = profile_wallet("w", &refs, &cats, &prices, 3600);
        assert_eq!(p.style, CounterpartyStyle::Whale);
        assert_eq!(p.avg_trade_notional, 100000.0);

        let scalper: Vec<Trade> = (0..20)
            .map(|i| {
                let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                trade("s", side, "tok1", dec!(100), i * 60)
            })
            .collect();
        let refs: Vec<&Trade> = scalper.iter().collect();
        let p = profile_wallet("s", &refs, &cats, &prices, 3600);
        assert_eq!(p.style, CounterpartyStyle::Scalper);
        assert_eq!(p.buy_share, 0.5);
        assert_eq!(p.active_hours, vec![0]);

        let casual = vec![trade("c", Side::Buy, "tok1", dec!(10), 0)];
        let refs: Vec<&Trade> = casual.iter().collect();
        let p = profile_wallet("c", &refs, &cats, &prices, 3600);
        assert_eq!(p.style, CounterpartyStyle::Casual);
        assert!(p.with_move_share.is_none());
    }

    #[test]
    fn test_profile_momentum_and_contrarian() {
        let mut prices = HashMap::new();
        // price rises steadily
        let points: Vec<(i64, f64)> = (0..=20).map(|i| (i * 1000, 0.2 + i as f64 * 0.02)).collect();
        prices.insert("tok1".to_string(), history(&points));
        let mut cats = HashMap::new();
        cats.insert("cond-tok1".to_string(), Category::Crypto);

        let buys: Vec<Trade> = (5..10).map(|i| trade("m", Side::Buy, "tok1", dec!(10), i * 1000)).collect();
        let refs: Vec<&Trade> = buys.iter().collect();
        let p = profile_wallet("m", &refs, &cats, &prices, 2000);
        assert_eq!(p.with_move_share, Some(1.0));
        assert_eq!(p.style, CounterpartyStyle::Momentum);
        assert_eq!(p.dominant_categories, vec![Category::Crypto]);
        assert_eq!(p.markets_traded, 1);

        let sells: Vec<Trade> = (5..10).map(|i| trade("k", Side::Sell, "tok1", dec!(10), i * 1000)).collect();
        let refs: Vec<&Trade> = sells.iter().collect();
        let p = profile_wallet("k", &refs, &cats, &prices, 2000);
        assert_eq!(p.with_move_share, Some(0.0));
        assert_eq!(p.style, CounterpartyStyle::Contrarian);
    }

    #[test]
    fn test_analyzer_ranking() {
        let trades = star_trades();
        let graph = CounterpartyGraph::build(&trades, 300, 0.0);
        let report = NetworkAnalyzer::new(&graph, 3600).analyze(&trades, &HashMap::new(), &HashMap::new());

        assert_eq!(report.wallets, 7);
        assert_eq!(report.edges, 4);
        assert_eq!(report.total_edge_weight, 155.0);
        assert_eq!(report.profiles.len(), 7);

        let top = report.rank_counterparties(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].wallet, "hub");
        assert_eq!(top[0].degree, 3);
        assert!(top[0].pagerank >= top[1].pagerank);
        assert_eq!(report.rank_counterparties(100).len(), 7);
        assert_eq!(report.largest_clusters(1)[0].members[0], "hub");
        assert_eq!(report.profile("hub").map(|p| p.trade_count), Some(1));
    }
}
