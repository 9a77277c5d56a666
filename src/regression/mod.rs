//! Short-horizon price-movement regression
//!
//! Ordinary least squares with an optional ridge penalty, fitted on the
//! earlier part of the feature rows and scored on the later part.

pub mod linalg;

#[cfg(test)]
mod tests;

use crate::config::AnalysisConfig;
use crate::error::{ResearchError, Result};
use crate::features::FeatureSet;
use serde::Serialize;
use tracing::{debug, info};

/// Fitted linear model `y = intercept + Σ coefficient·x`
#[derive(Debug, Clone, Serialize)]
pub struct LinearModel {
    pub names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub lambda: f64,
}

impl LinearModel {
    /// Solve the (ridge-penalized) normal equations. The intercept is not
    /// penalized. Needs at least as many rows as parameters.
    pub fn fit(x: &[Vec<f64>], y: &[f64], names: &[String], lambda: f64) -> Result<Self> {
        let k = names.len();
        let p = k + 1;
        if x.len() != y.len() {
            return Err(ResearchError::Model(format!(
                "{} feature rows for {} targets",
                x.len(),
                y.len()
            )));
        }
        if x.len() < p {
            return Err(ResearchError::InsufficientData(format!(
                "{} rows for {} parameters",
                x.len(),
                p
            )));
        }
        if let Some(bad) = x.iter().find(|row| row.len() != k) {
            return Err(ResearchError::Model(format!(
                "row has {} features, expected {}",
                bad.len(),
                k
            )));
        }

        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        let mut design = vec![0.0; p];
        for (row, &target) in x.iter().zip(y) {
            design[0] = 1.0;
            design[1..].copy_from_slice(row);
            for i in 0..p {
                xty[i] += design[i] * target;
                for j in i..p {
                    xtx[i][j] += design[i] * design[j];
                }
            }
        }
        for i in 0..p {
            for j in 0..i {
                xtx[i][j] = xtx[j][i];
            }
        }
        for (i, row) in xtx.iter_mut().enumerate().skip(1) {
            row[i] += lambda;
        }

        let beta = linalg::solve(xtx, xty)?;
        Ok(Self {
            names: names.to_vec(),
            intercept: beta[0],
            coefficients: beta[1..].to_vec(),
            lambda,
        })
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.coefficients[i])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RegressionMetrics {
    pub n: usize,
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Share of non-zero targets whose sign the prediction matches
    pub hit_rate: Option<f64>,
}

impl RegressionMetrics {
    pub fn compute(predictions: &[f64], targets: &[f64]) -> Self {
        let n = targets.len().min(predictions.len());
        if n == 0 {
            return Self::default();
        }
        let mean = targets[..n].iter().sum::<f64>() / n as f64;
        let (mut ss_res, mut ss_tot, mut abs) = (0.0, 0.0, 0.0);
        let (mut hits, mut directional) = (0usize, 0usize);
        for (p, t) in predictions.iter().zip(targets) {
            let err = t - p;
            ss_res += err * err;
            ss_tot += (t - mean) * (t - mean);
            abs += err.abs();
            if *t != 0.0 {
                directional += 1;
                if p.signum() == t.signum() && *p != 0.0 {
                    hits += 1;
                }
            }
        }
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
        Self {
            n,
            r2,
            rmse: (ss_res / n as f64).sqrt(),
            mae: abs / n as f64,
            hit_rate: (directional > 0).then(|| hits as f64 / directional as f64),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub feature: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionReport {
    pub train: RegressionMetrics,
    pub test: RegressionMetrics,
    pub intercept: f64,
    /// Every feature; dropped columns report 0
    pub coefficients: Vec<Coefficient>,
    /// Features constant on the training rows, or a linear combination of
    /// earlier features there, left out of the fit
    pub dropped_features: Vec<String>,
    pub lambda: f64,
    /// Timestamp of the last training row
    pub split_timestamp: Option<i64>,
}

/// Index where the test rows start: the last `round(n * test_fraction)`
/// rows, at least one, leaving at least one for training
pub fn split_index(n: usize, test_fraction: f64) -> usize {
    if n < 2 {
        return n;
    }
    let test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
    n - test
}

pub struct PriceMovementRegressor {
    lambda: f64,
    test_fraction: f64,
}

impl PriceMovementRegressor {
    pub fn new(lambda: f64, test_fraction: f64) -> Self {
        Self {
            lambda,
            test_fraction,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.ridge_lambda, config.test_fraction)
    }

    /// Fit on the earlier rows, score on the later ones. Rows must be in
    /// chronological order, as [`crate::features::extract_trade_features`] returns them.
    pub fn run(&self, features: &FeatureSet) -> Result<RegressionReport> {
        if features.len() < 2 {
            return Err(ResearchError::InsufficientData(format!(
                "{} feature rows, need at least two to split",
                features.len()
            )));
        }
        let (x, y) = features.matrix();
        let split = split_index(x.len(), self.test_fraction);
        let (x_train, x_test) = x.split_at(split);
        let (y_train, y_test) = y.split_at(split);

        let k = features.names.len();
        let kept = linalg::independent_columns(x_train, k);
        let dropped: Vec<String> = (0..k)
            .filter(|j| !kept.contains(j))
            .map(|j| features.names[j].clone())
            .collect();
        if !dropped.is_empty() {
            debug!("Dropping constant or collinear features: {}", dropped.join(", "));
        }

        let project = |rows: &[Vec<f64>]| -> Vec<Vec<f64>> {
            rows.iter()
                .map(|r| kept.iter().map(|&j| r[j]).collect())
                .collect()
        };
        let names: Vec<String> = kept.iter().map(|&j| features.names[j].clone()).collect();
        let train_x = project(x_train);
        let test_x = project(x_test);

        let model = LinearModel::fit(&train_x, y_train, &names, self.lambda)?;
        let train_pred: Vec<f64> = train_x.iter().map(|r| model.predict(r)).collect();
        let test_pred: Vec<f64> = test_x.iter().map(|r| model.predict(r)).collect();
        let train = RegressionMetrics::compute(&train_pred, y_train);
        let test = RegressionMetrics::compute(&test_pred, y_test);

        info!(
            "Regression on {} rows: train R² {:.4}, test R² {:.4}, test hit rate {}",
            x.len(),
            train.r2,
            test.r2,
            test.hit_rate
                .map(|h| format!("{:.3}", h))
                .unwrap_or_else(|| "n/a".to_string())
        );

        let coefficients = features
            .names
            .iter()
            .map(|name| Coefficient {
                feature: name.clone(),
                value: model.coefficient(name).unwrap_or(0.0),
            })
            .collect();

        Ok(RegressionReport {
            train,
            test,
            intercept: model.intercept,
            coefficients,
            dropped_features: dropped,
            lambda: self.lambda,
            split_timestamp: split
                .checked_sub(1)
                .and_then(|i| features.rows.get(i))
                .map(|r| r.timestamp),
        })
    }
}
