//! Report aggregation
//!
//! Runs every analysis stage over a loaded [`Dataset`] and collects the
//! results into one serializable [`ResearchReport`], plus the row-level
//! tables written next to it as CSV.

pub mod writer;

#[cfg(test)]
mod tests;

pub use writer::{ReportFiles, ReportWriter};

use crate::classify::{
    category_volume_table, CategoryVolumeRow, ClassificationSummary, ClassifierEvaluation,
    EdaOptions, EdaReport, MarketClassifier,
};
use crate::config::Config;
use crate::features::{
    extract_market_features, extract_trade_features, market_contexts, FeatureSet, MarketFeatures,
};
use crate::graph::CounterpartyGraph;
use crate::ingest::Dataset;
use crate::network::{Cluster, CounterpartyRank, NetworkAnalyzer, NetworkReport};
use crate::regression::{PriceMovementRegressor, RegressionReport};
use crate::types::{Category, OptionClass};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct DataSummary {
    pub events: usize,
    pub markets: usize,
    pub trades: usize,
    pub wallets: usize,
    pub price_series: usize,
    pub markets_with_trades: usize,
    pub feature_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkBlock {
    pub wallets: usize,
    pub edges: usize,
    pub total_edge_weight: f64,
    pub top_counterparties: Vec<CounterpartyRank>,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifierBlock {
    pub summary: ClassificationSummary,
    pub evaluation: Option<ClassifierEvaluation>,
    pub evaluation_error: Option<String>,
}

/// Naked versus replicable markets
#[derive(Debug, Clone, Serialize)]
pub struct ClassComparison {
    pub option_class: OptionClass,
    pub markets: usize,
    pub mean_log_volume: Option<f64>,
    pub feature_rows: usize,
    /// Mean |price change| over the horizon after a trade
    pub mean_abs_move: Option<f64>,
    pub regression: Option<RegressionReport>,
    pub regression_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub horizon_secs: i64,
    pub data: DataSummary,
    pub eda: EdaReport,
    pub network: NetworkBlock,
    pub classifier: ClassifierBlock,
    pub regression: Option<RegressionReport>,
    pub regression_error: Option<String>,
    pub option_classes: Vec<ClassComparison>,
}

/// The report together with the row-level tables behind it
pub struct ReportArtifacts {
    pub report: ResearchReport,
    pub features: FeatureSet,
    pub market_features: Vec<MarketFeatures>,
    pub counterparties: Vec<CounterpartyRank>,
    pub category_volumes: Vec<CategoryVolumeRow>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Category of every known market, keyed by condition id
pub fn market_categories(market_features: &[MarketFeatures]) -> HashMap<String, Category> {
    market_features
        .iter()
        .map(|m| (m.condition_id.clone(), m.category))
        .collect()
}

pub fn compare_option_classes(
    market_features: &[MarketFeatures],
    features: &FeatureSet,
    regressor: &PriceMovementRegressor,
) -> Vec<ClassComparison> {
    [OptionClass::Naked, OptionClass::Replicable]
        .into_iter()
        .map(|class| {
            let markets: Vec<&MarketFeatures> = market_features
                .iter()
                .filter(|m| m.option_class == class)
                .collect();
            let subset = features.filter_class(class);
            let (regression, regression_error) = match regressor.run(&subset) {
                Ok(r) => (Some(r), None),
                Err(e) => (None, Some(e.to_string())),
            };
            ClassComparison {
                option_class: class,
                markets: markets.len(),
                mean_log_volume: mean(markets.iter().map(|m| m.log_volume)),
                feature_rows: subset.len(),
                mean_abs_move: mean(subset.rows.iter().map(|r| r.target.abs())),
                regression,
                regression_error,
            }
        })
        .collect()
}

/// Run every stage over the dataset
pub fn build_report(dataset: &Dataset, config: &Config) -> ReportArtifacts {
    let analysis = &config.analysis;
    let catalog = &dataset.catalog;

    let (classifier, evaluation, evaluation_error) =
        match MarketClassifier::train_and_evaluate(catalog, analysis.test_fraction) {
            Ok((c, e)) => (c, Some(e), None),
            Err(e) => {
                warn!("Classifier evaluation skipped: {}", e);
                (MarketClassifier::train(catalog), None, Some(e.to_string()))
            }
        };
    let classification = classifier.summarize(catalog);

    let contexts = market_contexts(catalog, &classifier);
    let market_features = extract_market_features(catalog, &classifier, &dataset.trades);
    let features = extract_trade_features(
        &dataset.trades,
        &dataset.prices,
        &contexts,
        analysis.horizon_secs,
    );

    let graph = CounterpartyGraph::from_config(&dataset.trades, &config.graph);
    let network: NetworkReport = NetworkAnalyzer::new(&graph, analysis.horizon_secs).analyze(
        &dataset.trades,
        &dataset.prices,
        &market_categories(&market_features),
    );

    let regressor = PriceMovementRegressor::from_config(analysis);
    let (regression, regression_error) = match regressor.run(&features) {
        Ok(r) => (Some(r), None),
        Err(e) => {
            warn!("Regression skipped: {}", e);
            (None, Some(e.to_string()))
        }
    };
    let option_classes = compare_option_classes(&market_features, &features, &regressor);

    let wallets: HashSet<&str> = dataset
        .trades
        .iter()
        .map(|t| t.proxy_wallet.as_str())
        .filter(|w| !w.is_empty())
        .collect();
    let data = DataSummary {
        events: catalog.events().len(),
        markets: catalog.market_count(),
        trades: dataset.trades.len(),
        wallets: wallets.len(),
        price_series: dataset.prices.len(),
        markets_with_trades: market_features.iter().filter(|m| m.trade_count > 0).count(),
        feature_rows: features.len(),
    };

    let top = analysis.top_counterparties;
    let report = ResearchReport {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        horizon_secs: analysis.horizon_secs,
        data,
        eda: EdaReport::build(catalog.events(), EdaOptions::from_config(analysis)),
        network: NetworkBlock {
            wallets: network.wallets,
            edges: network.edges,
            total_edge_weight: network.total_edge_weight,
            top_counterparties: network.rank_counterparties(top).into_iter().cloned().collect(),
            clusters: network.largest_clusters(top).to_vec(),
        },
        classifier: ClassifierBlock {
            summary: classification,
            evaluation,
            evaluation_error,
        },
        regression,
        regression_error,
        option_classes,
    };
    info!(
        "Report {}: {} markets, {} trades, {} feature rows",
        report.run_id, report.data.markets, report.data.trades, report.data.feature_rows
    );

    ReportArtifacts {
        report,
        features,
        market_features,
        counterparties: network.counterparties,
        category_volumes: category_volume_table(catalog.events()),
    }
}
