//! Polymarket Research Pipeline
//!
//! Downloads market data and runs the counterparty, classification and
//! price-movement analyses over it.

use clap::{Parser, Subcommand};
use pm_research::{
    classify::{EdaOptions, EdaReport, MarketClassifier},
    client::{MarketDataApi, PolymarketClient},
    config::Config,
    features::{extract_market_features, extract_trade_features, market_contexts},
    graph::CounterpartyGraph,
    ingest::{Dataset, EventDownloader, MarketCatalog, PriceDownloader, TradeDownloader},
    network::NetworkAnalyzer,
    regression::PriceMovementRegressor,
    report::{build_report, market_categories, ReportWriter},
    storage::DataLayout,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pm-research")]
#[command(about = "Polymarket data ingestion and counterparty research")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download closed events page by page, resuming where the last run stopped
    DownloadEvents,
    /// Download taker trades for the top markets by volume
    DownloadTrades {
        /// Fraction of markets to keep, overrides download.top_percentile
        #[arg(long)]
        percentile: Option<f64>,
    },
    /// Download price histories for every market token
    DownloadPrices,
    /// Events, then trades, then prices
    DownloadAll,
    /// Volume and price distributions by category
    Eda,
    /// Counterparty network ranking
    Network {
        /// Number of counterparties to show
        #[arg(short, long, default_value = "25")]
        top: usize,
    },
    /// Category and option-class labels with hold-out accuracy
    Classify,
    /// Fit the price-movement regression
    Regress,
    /// Run every analysis and write the report files
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    init_logging(&config, cli.verbose);

    let layout = DataLayout::from_config(&config.storage);

    match cli.command {
        Commands::DownloadEvents => download_events(&config, &layout).await,
        Commands::DownloadTrades { percentile } => {
            download_trades(&config, &layout, percentile).await
        }
        Commands::DownloadPrices => download_prices(&config, &layout).await,
        Commands::DownloadAll => {
            download_events(&config, &layout).await?;
            download_trades(&config, &layout, None).await?;
            download_prices(&config, &layout).await
        }
        Commands::Eda => show_eda(&config, &layout),
        Commands::Network { top } => show_network(&config, &layout, top),
        Commands::Classify => show_classification(&config, &layout),
        Commands::Regress => show_regression(&config, &layout),
        Commands::Report => write_report(&config, &layout),
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let fallback = if verbose {
        "pm_research=debug".to_string()
    } else {
        format!("pm_research={}", config.logging.level)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn api(config: &Config) -> anyhow::Result<Arc<dyn MarketDataApi>> {
    Ok(Arc::new(PolymarketClient::new(&config.api, &config.download)?))
}

async fn download_events(config: &Config, layout: &DataLayout) -> anyhow::Result<()> {
    tracing::info!("Downloading closed events to {}", layout.events_dir.display());
    let summary = EventDownloader::new(api(config)?, layout.clone(), &config.download)
        .run()
        .await?;

    println!(
        "Events: {} written in {} pages (started at offset {})",
        summary.events_written, summary.pages_written, summary.start_offset
    );
    if let Some(reason) = summary.interrupted {
        tracing::warn!("Event download interrupted: {}", reason);
    }
    Ok(())
}

async fn download_trades(
    config: &Config,
    layout: &DataLayout,
    percentile: Option<f64>,
) -> anyhow::Result<()> {
    let catalog = MarketCatalog::load(layout)?;
    let mut downloader = TradeDownloader::new(api(config)?, layout.clone(), &config.download);
    if let Some(p) = percentile {
        if !(p > 0.0 && p <= 1.0) {
            anyhow::bail!("--percentile must be in (0, 1], got {}", p);
        }
        downloader = downloader.with_percentile(p);
    }
    let summary = downloader.run(&catalog).await?;

    println!(
        "Trades: {} markets selected, {} already processed, {} saved ({} trades), {} without trades, {} failed",
        summary.markets_selected,
        summary.already_processed,
        summary.markets_saved,
        summary.trades_saved,
        summary.markets_without_trades,
        summary.markets_failed
    );
    Ok(())
}

async fn download_prices(config: &Config, layout: &DataLayout) -> anyhow::Result<()> {
    let catalog = MarketCatalog::load(layout)?;
    let summary = PriceDownloader::new(api(config)?, layout.clone(), &config.download)
        .run(&catalog)
        .await?;

    println!(
        "Prices: {} tokens, {} already processed, {} saved ({} points), {} without data, {} failed",
        summary.tokens_found,
        summary.already_processed,
        summary.saved,
        summary.points_saved,
        summary.no_data,
        summary.failed
    );
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn show_eda(config: &Config, layout: &DataLayout) -> anyhow::Result<()> {
    let catalog = MarketCatalog::load(layout)?;
    let report = EdaReport::build(catalog.events(), EdaOptions::from_config(&config.analysis));
    print_json(&report)
}

fn show_network(config: &Config, layout: &DataLayout, top: usize) -> anyhow::Result<()> {
    let dataset = Dataset::load(layout)?;
    let classifier = MarketClassifier::train(&dataset.catalog);
    let market_features = extract_market_features(&dataset.catalog, &classifier, &dataset.trades);

    let graph = CounterpartyGraph::from_config(&dataset.trades, &config.graph);
    let report = NetworkAnalyzer::new(&graph, config.analysis.horizon_secs).analyze(
        &dataset.trades,
        &dataset.prices,
        &market_categories(&market_features),
    );

    println!(
        "\n🕸  Counterparty network: {} wallets, {} edges, {} clusters\n",
        report.wallets,
        report.edges,
        report.clusters.len()
    );
    println!(
        "{:<44} {:>10} {:>14} {:>7} {:>10} {:>10}",
        "Wallet", "PageRank", "Notional", "Degree", "Impact", "Style"
    );
    println!("{}", "-".repeat(100));
    for rank in report.rank_counterparties(top) {
        println!(
            "{:<44} {:>10.6} {:>14.0} {:>7} {:>10} {:>10}",
            rank.wallet,
            rank.pagerank,
            rank.total_notional,
            rank.degree,
            rank.price_impact
                .map(|v| format!("{:+.4}", v))
                .unwrap_or_else(|| "-".to_string()),
            rank.style
                .map(|s| format!("{:?}", s))
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}

fn show_classification(config: &Config, layout: &DataLayout) -> anyhow::Result<()> {
    let catalog = MarketCatalog::load(layout)?;
    let classifier =
        match MarketClassifier::train_and_evaluate(&catalog, config.analysis.test_fraction) {
            Ok((classifier, evaluation)) => {
                print_json(&evaluation)?;
                classifier
            }
            Err(e) => {
                tracing::warn!("Hold-out evaluation skipped: {}", e);
                MarketClassifier::train(&catalog)
            }
        };
    print_json(&classifier.summarize(&catalog))
}

fn show_regression(config: &Config, layout: &DataLayout) -> anyhow::Result<()> {
    let dataset = Dataset::load(layout)?;
    let classifier = MarketClassifier::train(&dataset.catalog);
    let contexts = market_contexts(&dataset.catalog, &classifier);
    let features = extract_trade_features(
        &dataset.trades,
        &dataset.prices,
        &contexts,
        config.analysis.horizon_secs,
    );
    let report = PriceMovementRegressor::from_config(&config.analysis).run(&features)?;
    print_json(&report)
}

fn write_report(config: &Config, layout: &DataLayout) -> anyhow::Result<()> {
    let dataset = Dataset::load(layout)?;
    let artifacts = build_report(&dataset, config);
    let files = ReportWriter::new(&layout.outputs_dir).write(&artifacts)?;
    println!("Report written to {}", files.report.display());
    Ok(())
}
