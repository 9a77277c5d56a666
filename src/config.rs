//! Configuration management
//!
//! Settings come from an optional TOML file layered with `PM_RESEARCH_*`
//! environment variables (nested keys use `__`, e.g.
//! `PM_RESEARCH_DOWNLOAD__CONCURRENCY=4`).

use crate::error::{ResearchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    #[serde(default = "default_data_url")]
    pub data_url: String,
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}
fn default_data_url() -> String {
    "https://data-api.polymarket.com".to_string()
}
fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            data_url: default_data_url(),
            clob_url: default_clob_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// On-disk layout of downloaded data
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory; supports `~` and `$VAR` expansion
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_events_dir")]
    pub events_dir: String,
    #[serde(default = "default_trades_dir")]
    pub trades_dir: String,
    #[serde(default = "default_prices_dir")]
    pub prices_dir: String,
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: String,
    /// Files are bucketed into `prefix_NNN` directories by `id % bucket_modulus`
    #[serde(default = "default_bucket_modulus")]
    pub bucket_modulus: u32,
}

fn default_data_dir() -> String {
    ".".to_string()
}
fn default_events_dir() -> String {
    "events".to_string()
}
fn default_trades_dir() -> String {
    "trades".to_string()
}
fn default_prices_dir() -> String {
    "prices".to_string()
}
fn default_outputs_dir() -> String {
    "outputs".to_string()
}
fn default_bucket_modulus() -> u32 {
    1000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            events_dir: default_events_dir(),
            trades_dir: default_trades_dir(),
            prices_dir: default_prices_dir(),
            outputs_dir: default_outputs_dir(),
            bucket_modulus: default_bucket_modulus(),
        }
    }
}

impl StorageConfig {
    pub fn root(&self) -> PathBuf {
        let expanded = shellexpand::full(&self.data_dir)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| self.data_dir.clone());
        PathBuf::from(expanded)
    }

    fn resolve(&self, dir: &str) -> PathBuf {
        let path = Path::new(dir);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.resolve(&self.events_dir)
    }

    pub fn trades_path(&self) -> PathBuf {
        self.resolve(&self.trades_dir)
    }

    pub fn prices_path(&self) -> PathBuf {
        self.resolve(&self.prices_dir)
    }

    pub fn outputs_path(&self) -> PathBuf {
        self.resolve(&self.outputs_dir)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    #[serde(default = "default_events_page_limit")]
    pub events_page_limit: usize,
    #[serde(default = "default_trades_page_limit")]
    pub trades_page_limit: usize,
    /// Minimum cash value of a trade returned by the data API
    #[serde(default = "default_trade_filter_amount")]
    pub trade_filter_amount: u64,
    /// Fraction of markets (by volume) whose trades are downloaded
    #[serde(default = "default_top_percentile")]
    pub top_percentile: f64,
    /// Price history starts this many minutes before the market end date
    #[serde(default = "default_price_buffer_minutes")]
    pub price_buffer_minutes: i64,
    /// Price history resolution in minutes
    #[serde(default = "default_price_fidelity")]
    pub price_fidelity: u32,
    /// Pause between trade pages
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
    /// Rate-limit retries per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Concurrent price-history downloads
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_events_page_limit() -> usize {
    100
}
fn default_trades_page_limit() -> usize {
    500
}
fn default_trade_filter_amount() -> u64 {
    10_000
}
fn default_top_percentile() -> f64 {
    0.10
}
fn default_price_buffer_minutes() -> i64 {
    72 * 60
}
fn default_price_fidelity() -> u32 {
    1
}
fn default_request_delay_ms() -> u64 {
    133
}
fn default_initial_backoff_secs() -> u64 {
    1
}
fn default_max_backoff_secs() -> u64 {
    60
}
fn default_backoff_multiplier() -> u32 {
    2
}
fn default_max_retries() -> u32 {
    20
}
fn default_concurrency() -> usize {
    1
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            events_page_limit: default_events_page_limit(),
            trades_page_limit: default_trades_page_limit(),
            trade_filter_amount: default_trade_filter_amount(),
            top_percentile: default_top_percentile(),
            price_buffer_minutes: default_price_buffer_minutes(),
            price_fidelity: default_price_fidelity(),
            request_delay_ms: default_request_delay_ms(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            max_retries: default_max_retries(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Opposing trades on the same token within this window are linked
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
    /// Trades below this notional are ignored when building edges
    #[serde(default)]
    pub min_notional: f64,
}

fn default_window_secs() -> i64 {
    300
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            min_notional: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    /// Price-movement horizon after (and before) a trade
    #[serde(default = "default_horizon_secs")]
    pub horizon_secs: i64,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default)]
    pub ridge_lambda: f64,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default = "default_category_histogram_bins")]
    pub category_histogram_bins: usize,
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,
    #[serde(default = "default_max_price_categories")]
    pub max_price_categories: usize,
    #[serde(default = "default_top_counterparties")]
    pub top_counterparties: usize,
}

fn default_horizon_secs() -> i64 {
    3600
}
fn default_test_fraction() -> f64 {
    0.2
}
fn default_histogram_bins() -> usize {
    60
}
fn default_category_histogram_bins() -> usize {
    50
}
fn default_max_categories() -> usize {
    12
}
fn default_max_price_categories() -> usize {
    16
}
fn default_top_counterparties() -> usize {
    25
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            horizon_secs: default_horizon_secs(),
            test_fraction: default_test_fraction(),
            ridge_lambda: 0.0,
            histogram_bins: default_histogram_bins(),
            category_histogram_bins: default_category_histogram_bins(),
            max_categories: default_max_categories(),
            max_price_categories: default_max_price_categories(),
            top_counterparties: default_top_counterparties(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file (optional) and environment
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = ::config::Config::builder()
            .add_source(::config::File::from(Path::new(path)).required(false))
            .add_source(
                ::config::Environment::with_prefix("PM_RESEARCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let d = &self.download;
        if !(d.top_percentile > 0.0 && d.top_percentile <= 1.0) {
            return Err(ResearchError::Config(format!(
                "download.top_percentile must be in (0, 1], got {}",
                d.top_percentile
            )));
        }
        if d.events_page_limit == 0 || d.trades_page_limit == 0 {
            return Err(ResearchError::Config(
                "page limits must be greater than zero".into(),
            ));
        }
        if d.concurrency == 0 {
            return Err(ResearchError::Config(
                "download.concurrency must be greater than zero".into(),
            ));
        }
        if d.backoff_multiplier == 0 {
            return Err(ResearchError::Config(
                "download.backoff_multiplier must be greater than zero".into(),
            ));
        }
        if self.storage.bucket_modulus == 0 {
            return Err(ResearchError::Config(
                "storage.bucket_modulus must be greater than zero".into(),
            ));
        }
        let a = &self.analysis;
        if !(a.test_fraction > 0.0 && a.test_fraction < 1.0) {
            return Err(ResearchError::Config(format!(
                "analysis.test_fraction must be in (0, 1), got {}",
                a.test_fraction
            )));
        }
        if a.ridge_lambda < 0.0 {
            return Err(ResearchError::Config(
                "analysis.ridge_lambda must not be negative".into(),
            ));
        }
        if a.histogram_bins == 0 || a.category_histogram_bins == 0 {
            return Err(ResearchError::Config(
                "histogram bin counts must be greater than zero".into(),
            ));
        }
        if a.max_categories == 0 || a.max_price_categories == 0 {
            return Err(ResearchError::Config(
                "category limits must be greater than zero".into(),
            ));
        }
        if a.horizon_secs <= 0 || self.graph.window_secs < 0 {
            return Err(ResearchError::Config(
                "analysis.horizon_secs must be positive and graph.window_secs non-negative".into(),
            ));
        }
        Ok(())
    }
}
