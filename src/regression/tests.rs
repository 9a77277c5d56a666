//! Unit tests for the regression module

#[cfg(test)]
mod tests {
    use super::super::linalg::{independent_columns, solve};
    use super::super::*;
    use crate::error::ResearchError;
    use crate::features::{FeatureSet, TradeFeatureRow};
    use crate::types::{Category, OptionClass};

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_solve_with_pivoting() {
        // leading zero forces a row swap
        let a = vec![vec![0.0, 2.0], vec![3.0, 1.0]];
        let x = solve(a, vec![4.0, 5.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_singular() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(matches!(solve(a, vec![1.0, 2.0]), Err(ResearchError::Model(_))));
    }

    #[test]
    fn test_ols_recovers_exact_line() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, (i * i) as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| 1.5 + 2.0 * r[0] - 0.5 * r[1]).collect();
        let model = LinearModel::fit(&x, &y, &names(&["a", "b"]), 0.0).unwrap();

        assert!((model.intercept - 1.5).abs() < 1e-8);
        assert!((model.coefficient("a").unwrap() - 2.0).abs() < 1e-8);
        assert!((model.coefficient("b").unwrap() + 0.5).abs() < 1e-8);
        assert!(model.coefficient("c").is_none());
        assert!((model.predict(&[1.0, 1.0]) - 3.0).abs() < 1e-8);
    }

    #[test]
    fn test_ridge_shrinks_slope_not_intercept() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 * r[0]).collect();
        let ols = LinearModel::fit(&x, &y, &names(&["a"]), 0.0).unwrap();
        let ridge = LinearModel::fit(&x, &y, &names(&["a"]), 100.0).unwrap();

        assert!(ridge.coefficients[0] < ols.coefficients[0]);
        assert!(ridge.coefficients[0] > 0.0);
        // unpenalized intercept absorbs the shrinkage at the mean
        let mean_x = 9.5;
        assert!((ridge.predict(&[mean_x]) - ols.predict(&[mean_x])).abs() < 1e-8);
    }

    #[test]
    fn test_fit_needs_enough_rows() {
        let x = vec![vec![1.0, 2.0], vec![2.0, 1.0]];
        let y = vec![1.0, 2.0];
        let err = LinearModel::fit(&x, &y, &names(&["a", "b"]), 0.0).unwrap_err();
        assert!(matches!(err, ResearchError::InsufficientData(_)));
    }

    #[test]
    fn test_fit_collinear_columns() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, 2.0 * i as f64]).collect();
        let y: Vec<f64> = (0..6).map(|i| i as f64).collect();
        assert!(matches!(
            LinearModel::fit(&x, &y, &names(&["a", "b"]), 0.0),
            Err(ResearchError::Model(_))
        ));
        // a ridge penalty makes the system solvable
        assert!(LinearModel::fit(&x, &y, &names(&["a", "b"]), 1.0).is_ok());
    }

    #[test]
    fn test_metrics() {
        let m = RegressionMetrics::compute(&[1.0, -1.0, 0.5, 0.0], &[2.0, -1.0, -0.5, 0.0]);
        assert_eq!(m.n, 4);
        assert!((m.mae - 0.5).abs() < 1e-12);
        assert!((m.rmse - (2.0f64 / 4.0).sqrt()).abs() < 1e-12);
        // zero target ignored; 2 of 3 signs right
        assert!((m.hit_rate.unwrap() - 2.0 / 3.0).abs() < 1e-12);

        let perfect = RegressionMetrics::compute(&[1.0, 2.0], &[1.0, 2.0]);
        assert!((perfect.r2 - 1.0).abs() < 1e-12);
        assert_eq!(RegressionMetrics::compute(&[], &[]).n, 0);
        assert!(RegressionMetrics::compute(&[0.1], &[0.0]).hit_rate.is_none());
    }

    #[test]
    fn test_split_index() {
        assert_eq!(split_index(10, 0.2), 8);
        assert_eq!(split_index(10, 0.01), 9);
        assert_eq!(split_index(2, 0.9), 1);
        assert_eq!(split_index(1, 0.2), 1);
        assert_eq!(split_index(0, 0.2), 0);
    }

    fn row(ts: i64, values: Vec<f64>, target: f64) -> TradeFeatureRow {
        TradeFeatureRow {
            timestamp: ts,
            wallet: "w".to_string(),
            condition_id: "c".to_string(),
            asset: "t".to_string(),
            category: Category::Other,
            option_class: OptionClass::Naked,
            values,
            target,
        }
    }

    #[test]
    fn test_regressor_drops_constant_columns_and_splits_chronologically() {
        let rows: Vec<TradeFeatureRow> = (0..20)
            .map(|i| {
                let a = (i % 7) as f64;
                let b = (i % 3) as f64;
                row(i as i64 * 10, vec![a, b, 1.0], 0.1 * a - 0.2 * b + 0.05)
            })
            .collect();
        let set = FeatureSet {
            names: names(&["a", "b", "constant"]),
            rows,
        };

        let report = PriceMovementRegressor::new(0.0, 0.25).run(&set).unwrap();
        assert_eq!(report.train.n, 15);
        assert_eq!(report.test.n, 5);
        assert_eq!(report.split_timestamp, Some(140));
        assert_eq!(report.dropped_features, vec!["constant"]);
        assert_eq!(report.coefficients.len(), 3);
        assert!((report.coefficients[0].value - 0.1).abs() < 1e-8);
        assert!((report.coefficients[1].value + 0.2).abs() < 1e-8);
        assert_eq!(report.coefficients[2].value, 0.0);
        assert!((report.intercept - 0.05).abs() < 1e-8);
        assert!(report.test.r2 > 0.999);
    }

    #[test]
    fn test_independent_columns() {
        let rows: Vec<Vec<f64>> = (0..10)
            .map(|i| {
                let a = i as f64;
                let d = (i % 2) as f64;
                vec![a, 3.0, 2.0 * a + 1.0, d, 1.0 - d, (i * i) as f64]
            })
            .collect();
        assert_eq!(independent_columns(&rows, 6), vec![0, 3, 5]);
        assert!(independent_columns(&[], 3).is_empty());
    }

    #[test]
    fn test_regressor_drops_one_hot_and_one_sided_extremity() {
        // every price above 0.5 makes the extremity column price - 0.5
        let rows: Vec<TradeFeatureRow> = (0..200)
            .map(|i| {
                let a = (i % 7) as f64;
                let price = 0.55 + 0.002 * (i % 13) as f64;
                let crypto = (i % 2) as f64;
                let target = 0.01 * a + 0.3 * price - 0.02 * crypto;
                let mut r = row(
                    i as i64,
                    vec![a, price, price - 0.5, crypto, 1.0 - crypto],
                    target,
                );
                r.option_class = OptionClass::Replicable;
                r.category = if crypto == 1.0 { Category::Crypto } else { Category::Economics };
                r
            })
            .collect();
        let set = FeatureSet {
            names: names(&["a", "price", "price_extremity", "cat_crypto", "cat_economics"]),
            rows,
        };

        let report = PriceMovementRegressor::new(0.0, 0.2).run(&set).unwrap();
        assert_eq!(report.dropped_features, vec!["price_extremity", "cat_economics"]);
        assert_eq!(report.coefficients.len(), 5);
        assert!((report.coefficients[0].value - 0.01).abs() < 1e-6);
        assert!((report.coefficients[1].value - 0.3).abs() < 1e-6);
        assert_eq!(report.coefficients[2].value, 0.0);
        assert!((report.coefficients[3].value + 0.02).abs() < 1e-6);
        assert_eq!(report.coefficients[4].value, 0.0);
        assert!(report.test.r2 > 0.999);
    }

    #[test]
    fn test_regressor_too_few_rows() {
        let set = FeatureSet {
            names: names(&["a"]),
            rows: vec![row(0, vec![1.0], 0.1)],
        };
        assert!(PriceMovementRegressor::new(0.0, 0.2).run(&set).is_err());
    }
}
