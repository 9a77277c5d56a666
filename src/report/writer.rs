//! Report output files

use super::ReportArtifacts;
use crate::error::Result;
use crate::features::FeatureSet;
use crate::storage::write_json_pretty;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_FILE: &str = "report.json";
pub const FEATURES_FILE: &str = "features.csv";
pub const MARKETS_FILE: &str = "markets.csv";
pub const COUNTERPARTIES_FILE: &str = "counterparties.csv";
pub const CATEGORY_VOLUMES_FILE: &str = "category_volumes.csv";

/// Paths of everything one run wrote
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub report: PathBuf,
    pub features: PathBuf,
    pub markets: PathBuf,
    pub counterparties: PathBuf,
    pub category_volumes: PathBuf,
}

pub struct ReportWriter {
    outputs_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            outputs_dir: outputs_dir.into(),
        }
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs_dir
    }

    pub fn write(&self, artifacts: &ReportArtifacts) -> Result<ReportFiles> {
        fs::create_dir_all(&self.outputs_dir)?;
        let files = ReportFiles {
            report: self.outputs_dir.join(REPORT_FILE),
            features: self.outputs_dir.join(FEATURES_FILE),
            markets: self.outputs_dir.join(MARKETS_FILE),
            counterparties: self.outputs_dir.join(COUNTERPARTIES_FILE),
            category_volumes: self.outputs_dir.join(CATEGORY_VOLUMES_FILE),
        };

        write_json_pretty(&files.report, &serde_json::to_value(&artifacts.report)?)?;
        write_features_csv(&files.features, &artifacts.features)?;
        write_rows_csv(&files.markets, &artifacts.market_features)?;
        write_rows_csv(&files.counterparties, &artifacts.counterparties)?;
        write_rows_csv(&files.category_volumes, &artifacts.category_volumes)?;

        info!(
            "Wrote report {} to {}",
            artifacts.report.run_id,
            self.outputs_dir.display()
        );
        Ok(files)
    }
}

/// Identifying columns, one column per feature, then the target
pub fn write_features_csv(path: &Path, features: &FeatureSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec![
        "timestamp".to_string(),
        "wallet".to_string(),
        "condition_id".to_string(),
        "asset".to_string(),
        "category".to_string(),
        "option_class".to_string(),
    ];
    header.extend(features.names.iter().cloned());
    header.push("target".to_string());
    writer.write_record(&header)?;

    for row in &features.rows {
        let mut record = vec![
            row.timestamp.to_string(),
            row.wallet.clone(),
            row.condition_id.clone(),
            row.asset.clone(),
            row.category.to_string(),
            row.option_class.to_string(),
        ];
        record.extend(row.values.iter().map(|v| v.to_string()));
        record.push(row.target.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// One serialized record per row; header from the field names
pub fn write_rows_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
