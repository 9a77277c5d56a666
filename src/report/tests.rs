//! Unit tests for report aggregation and output

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::ingest::MarketCatalog;
    use crate::types::{Event, PriceHistory, PricePoint, Side, Trade};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    // 2024-01-01T00:00:00Z
    const T0: i64 = 1_704_067_200;

    fn event(id: &str, category: &str, question: &str, cid: &str, volume: f64) -> Event {
        serde_json::from_value(json!({
            "id": id,
            "category": category,
            "volume": volume,
            "markets": [{
                "question": question,
                "conditionId": cid,
                "clobTokenIds": format!("[\"{}-yes\", \"{}-no\"]", cid, cid),
                "volumeNum": volume,
                "endDate": "2024-01-03T00:00:00Z",
                "outcomes": "[\"Yes\", \"No\"]",
                "outcomePrices": "[\"0.6\", \"0.4\"]"
            }]
        }))
        .unwrap()
    }

    fn trade(wallet: &str, side: Side, size: Decimal, ts: i64) -> Trade {
        Trade {
            proxy_wallet: wallet.to_string(),
            side,
            asset: "0xabc-yes".to_string(),
            condition_id: "0xabc".to_string(),
            size,
            price: dec!(0.6),
            timestamp: ts,
            outcome: None,
            outcome_index: None,
            title: None,
            slug: None,
            transaction_hash: None,
        }
    }

    fn dataset() -> Dataset {
        let catalog = MarketCatalog::from_events(vec![
            event("1", "Crypto", "Will Bitcoin close above $50k?", "0xabc", 50_000.0),
            event("2", "US-current-affairs", "Will the Senate pass the bill?", "0xdef", 8_000.0),
            event("3", "Sports", "Will the Lakers win the NBA finals?", "0x123", 120_000.0),
        ]);
        let trades = vec![
            trade("alice", Side::Sell, dec!(20000), T0),
            trade("bob", Side::Buy, dec!(30000), T0 + 60),
            trade("alice", Side::Buy, dec!(25000), T0 + 120),
            trade("bob", Side::Sell, dec!(40000), T0 + 3600),
        ];
        let history = PriceHistory::new(
            (-2..=2)
                .map(|h| PricePoint {
                    t: T0 + h * 3600,
                    p: 0.6 + 0.02 * h as f64,
                })
                .collect(),
        );
        Dataset {
            catalog,
            trades,
            prices: HashMap::from([("0xabc-yes".to_string(), history)]),
        }
    }

    #[test]
    fn test_build_report_summary() {
        let artifacts = build_report(&dataset(), &Config::default());
        let report = &artifacts.report;

        assert_eq!(report.data.events, 3);
        assert_eq!(report.data.markets, 3);
        assert_eq!(report.data.trades, 4);
        assert_eq!(report.data.wallets, 2);
        assert_eq!(report.data.price_series, 1);
        assert_eq!(report.data.markets_with_trades, 1);
        assert_eq!(report.data.feature_rows, 4);
        assert_eq!(report.horizon_secs, 3600);

        assert_eq!(report.classifier.summary.markets, 3);
        assert_eq!(report.network.wallets, 2);
        assert!(report.network.edges >= 1);
        assert_eq!(artifacts.counterparties.len(), 2);
        assert_eq!(artifacts.category_volumes.len(), 3);
        assert_eq!(report.option_classes.len(), 2);
        // every stage either produced output or recorded why not
        assert!(report.regression.is_some() != report.regression_error.is_some());
    }

    #[test]
    fn test_option_class_comparison() {
        let artifacts = build_report(&dataset(), &Config::default());
        let replicable = artifacts
            .report
            .option_classes
            .iter()
            .find(|c| c.option_class == OptionClass::Replicable)
            .unwrap();
        assert_eq!(replicable.markets, 1);
        assert_eq!(replicable.feature_rows, 4);
        assert!(replicable.mean_abs_move.unwrap() > 0.0);

        let naked = artifacts
            .report
            .option_classes
            .iter()
            .find(|c| c.option_class == OptionClass::Naked)
            .unwrap();
        assert_eq!(naked.markets, 2);
        assert_eq!(naked.feature_rows, 0);
        assert!(naked.mean_abs_move.is_none());
        assert!(naked.regression_error.is_some());
    }

    #[test]
    fn test_replicable_regression_with_two_categories() {
        use crate::features::{FeatureSet, TradeFeatureRow, TRADE_FEATURES};
        use crate::regression::PriceMovementRegressor;
        use crate::types::Category;
        use std::f64::consts::PI;

        let rows: Vec<TradeFeatureRow> = (0..200)
            .map(|i| {
                let price = 0.55 + 0.002 * (i % 13) as f64;
                let crypto = (i % 2) as f64;
                let angle = 2.0 * PI * (i % 24) as f64 / 24.0;
                let values = vec![
                    if i % 5 < 2 { 1.0 } else { -1.0 },
                    8.0 + 0.1 * (i % 17) as f64,
                    price,
                    (price - 0.5).abs(),
                    angle.sin(),
                    angle.cos(),
                    ((i % 11) as f64).ln_1p(),
                    0.001 * (i % 9) as f64,
                    10.0 + 0.5 * (i % 19) as f64,
                    0.01 * (i % 4) as f64,
                    1.0,
                    0.0,
                    0.0,
                    crypto,
                    1.0 - crypto,
                    0.0,
                ];
                TradeFeatureRow {
                    timestamp: T0 + i as i64,
                    wallet: format!("w{}", i % 10),
                    condition_id: "0xabc".to_string(),
                    asset: "0xabc-yes".to_string(),
                    category: if crypto == 1.0 { Category::Crypto } else { Category::Economics },
                    option_class: OptionClass::Replicable,
                    values,
                    target: 0.001 * ((i * 37) % 11) as f64 - 0.005,
                }
            })
            .collect();
        let features = FeatureSet {
            names: TRADE_FEATURES.iter().map(|s| s.to_string()).collect(),
            rows,
        };

        let comparison =
            compare_option_classes(&[], &features, &PriceMovementRegressor::new(0.0, 0.2));
        let replicable = comparison
            .iter()
            .find(|c| c.option_class == OptionClass::Replicable)
            .unwrap();
        assert_eq!(replicable.feature_rows, 200);
        assert!(replicable.regression_error.is_none());
        let dropped = &replicable.regression.as_ref().unwrap().dropped_features;
        for name in ["price_extremity", "is_replicable", "cat_politics", "cat_economics"] {
            assert!(dropped.iter().any(|d| d == name), "{} kept", name);
        }
        assert!(!dropped.iter().any(|d| d == "cat_crypto"));
    }

    #[test]
    fn test_empty_dataset_reports_errors() {
        let empty = Dataset {
            catalog: MarketCatalog::from_events(Vec::new()),
            trades: Vec::new(),
            prices: HashMap::new(),
        };
        let artifacts = build_report(&empty, &Config::default());
        assert_eq!(artifacts.report.data.markets, 0);
        assert!(artifacts.report.regression.is_none());
        assert!(artifacts.report.regression_error.is_some());
        assert!(artifacts.report.classifier.evaluation.is_none());
        assert!(artifacts.features.is_empty());
    }

    #[test]
    fn test_writer_outputs() {
        let dir = TempDir::new().unwrap();
        let artifacts = build_report(&dataset(), &Config::default());
        let files = ReportWriter::new(dir.path().join("outputs"))
            .write(&artifacts)
            .unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files.report).unwrap()).unwrap();
        assert_eq!(report["data"]["trades"], 4);
        assert_eq!(report["horizon_secs"], 3600);

        let mut features = csv::Reader::from_path(&files.features).unwrap();
        let header = features.headers().unwrap().clone();
        assert_eq!(header.len(), 6 + crate::features::TRADE_FEATURES.len() + 1);
        assert_eq!(&header[0], "timestamp");
        assert_eq!(&header[6], "side_sign");
        assert_eq!(&header[header.len() - 1], "target");
        let rows: Vec<csv::StringRecord> = features.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][1], "alice");
        assert_eq!(&rows[0][5], "replicable");

        let mut counterparties = csv::Reader::from_path(&files.counterparties).unwrap();
        assert_eq!(&counterparties.headers().unwrap()[0], "wallet");
        assert_eq!(counterparties.records().count(), 2);

        let mut volumes = csv::Reader::from_path(&files.category_volumes).unwrap();
        assert_eq!(volumes.records().count(), 3);
        assert_eq!(csv::Reader::from_path(&files.markets).unwrap().records().count(), 3);
    }
}
