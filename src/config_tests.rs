//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use super::super::error::ResearchError;

    #[test]
    fn test_download_config_defaults() {
        let config: DownloadConfig = toml::from_str("").unwrap();
        assert_eq!(config.events_page_limit, 100);
        assert_eq!(config.trades_page_limit, 500);
        assert_eq!(config.trade_filter_amount, 10_000);
        assert_eq!(config.top_percentile, 0.10);
        assert_eq!(config.price_buffer_minutes, 72 * 60);
        assert_eq!(config.price_fidelity, 1);
        assert_eq!(config.request_delay_ms, 133);
        assert_eq!(config.initial_backoff_secs, 1);
        assert_eq!(config.max_backoff_secs, 60);
        assert_eq!(config.max_retries, 20);
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_analysis_config_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.horizon_secs, 3600);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.ridge_lambda, 0.0);
        assert_eq!(config.histogram_bins, 60);
        assert_eq!(config.category_histogram_bins, 50);
        assert_eq!(config.max_categories, 12);
        assert_eq!(config.max_price_categories, 16);
    }

    #[test]
    fn test_graph_config_deserialize() {
        let config: GraphConfig = toml::from_str("window_secs = 60\nmin_notional = 25000.0").unwrap();
        assert_eq!(config.window_secs, 60);
        assert_eq!(config.min_notional, 25_000.0);

        let defaults: GraphConfig = toml::from_str("").unwrap();
        assert_eq!(defaults.window_secs, 300);
        assert_eq!(defaults.min_notional, 0.0);
    }

    #[test]
    fn test_full_config_sections() {
        let toml_str = r#"
[api]
gamma_url = "http://localhost:9000"
timeout_secs = 5

[storage]
data_dir = "/data/pm"
trades_dir = "/mnt/trades"

[download]
top_percentile = 0.25
concurrency = 8

[logging]
json = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.gamma_url, "http://localhost:9000");
        assert_eq!(config.api.data_url, "https://data-api.polymarket.com");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.download.top_percentile, 0.25);
        assert_eq!(config.download.concurrency, 8);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_paths_resolve_against_root() {
        let storage: StorageConfig = toml::from_str(
            r#"
data_dir = "/data/pm"
trades_dir = "/mnt/trades"
"#,
        )
        .unwrap();
        assert_eq!(storage.events_path(), std::path::PathBuf::from("/data/pm/events"));
        assert_eq!(storage.trades_path(), std::path::PathBuf::from("/mnt/trades"));
        assert_eq!(storage.outputs_path(), std::path::PathBuf::from("/data/pm/outputs"));
        assert_eq!(storage.bucket_modulus, 1000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.download.top_percentile = 0.0;
        assert!(matches!(config.validate(), Err(ResearchError::Config(_))));
        config.download.top_percentile = 1.0;
        assert!(config.validate().is_ok());

        config.analysis.test_fraction = 1.0;
        assert!(config.validate().is_err());
        config.analysis.test_fraction = 0.2;

        config.download.concurrency = 0;
        assert!(config.validate().is_err());
        config.download.concurrency = 2;

        config.storage.bucket_modulus = 0;
        assert!(config.validate().is_err());
        config.storage.bucket_modulus = 1000;

        config.analysis.ridge_lambda = -1.0;
        assert!(config.validate().is_err());
        config.analysis.ridge_lambda = 0.5;

        config.graph.window_secs = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/pm-research.toml").unwrap();
        assert_eq!(config.download.trades_page_limit, 500);
        assert_eq!(config.analysis.top_counterparties, 25);
    }
}
