//! Medpulse: daily medical research digest.
//! Entry point for the `medpulse` binary.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use medpulse_common::MedpulseError;
use medpulse_ingestion::{Aggregator, PipelineDriver, TopicDriver};
use medpulse_llm::catalog::{HF_KEY_PREFIX, HOSTED_MODELS};
use medpulse_llm::BackendRegistry;
use medpulse_report::{CsvExporter, PdfReport};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for medpulse
#[derive(Parser, Debug)]
#[command(name = "medpulse")]
#[command(about = "Searches medical literature sources and summarizes recent papers")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "MEDPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the PDF report and CSV export
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Comma-separated pool keys, overriding llm.models
    #[arg(short, long, value_delimiter = ',')]
    models: Vec<String>,

    /// Search topic; repeat to search several, overriding search.topics
    #[arg(short, long = "topic")]
    topics: Vec<String>,

    /// Skip the PDF report
    #[arg(long)]
    no_pdf: bool,

    /// Skip the CSV export
    #[arg(long)]
    no_csv: bool,

    /// Print the model catalog and exit
    #[arg(long)]
    list_models: bool,
}

fn apply_overrides(config: &mut config::Config, args: &Args) {
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if !args.models.is_empty() {
        config.llm.models = args.models.clone();
    }
    if !args.topics.is_empty() {
        config.search.topics = args.topics.clone();
    }
    if args.no_pdf {
        config.output.pdf = false;
    }
    if args.no_csv {
        config.output.csv = false;
    }
}

fn build_pipeline(config: &config::Config) -> Result<PipelineDriver, MedpulseError> {
    let registry = BackendRegistry::huggingface(&config.huggingface_settings());
    if std::env::var(&config.llm.api_key_env).map_or(true, |k| k.trim().is_empty()) {
        warn!(
            "{} is not set; every summary will be an error placeholder",
            config.llm.api_key_env
        );
    }

    let aggregator = Aggregator::from_settings(&config.source_settings())?;
    info!("Sources ready: {}", aggregator.source_count());
    let topics = TopicDriver::new(aggregator, config.search_settings());

    let mut driver = PipelineDriver::load(topics, &registry, &config.llm.models)?
        .with_pool_parallelism(config.llm.parallel)
        .with_output_dir(&config.output.dir);
    if config.output.pdf {
        driver = driver.with_report(Arc::new(PdfReport::new()));
    }
    if config.output.csv {
        driver = driver.with_exporter(Arc::new(CsvExporter::new()));
    }
    Ok(driver)
}

fn print_catalog() {
    let defaults = BackendRegistry::default_keys();
    for (key, model) in HOSTED_MODELS {
        let pool_key = format!("{HF_KEY_PREFIX}{key}");
        let marker = if defaults.contains(&pool_key) { "*" } else { " " };
        println!("{marker} {pool_key:<32} {model}");
    }
    println!("\n* loaded by default");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("medpulse=info,info")),
        )
        .init();

    let args = Args::parse();
    if args.list_models {
        print_catalog();
        return Ok(());
    }

    info!("Medpulse starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = config::Config::resolve_path(args.config.as_deref());
    let mut config = config::Config::load(&path).context("loading configuration")?;
    apply_overrides(&mut config, &args);
    config.validate().context("invalid command-line overrides")?;
    info!(
        "Configuration loaded: {} topics, {} models, output to {}",
        config.search.topics.len(),
        config.llm.models.len(),
        config.output.dir.display()
    );

    let driver = match build_pipeline(&config) {
        Ok(d) => d,
        Err(MedpulseError::NoBackends) => {
            error!("No summarization models could be loaded. Check llm.models and the catalog (--list-models).");
            return Err(MedpulseError::NoBackends.into());
        }
        Err(e) => return Err(e.into()),
    };

    match driver.run().await {
        Ok(outcome) => {
            info!("Analysis complete: {} papers summarized", outcome.papers.len());
            if let Some(p) = &outcome.report_path {
                info!("Report: {}", p.display());
            }
            if let Some(p) = &outcome.csv_path {
                info!("Data: {}", p.display());
            }
            Ok(())
        }
        Err(MedpulseError::NoPapers) => {
            error!("No papers were analyzed. Check the topic list, source availability and network access.");
            Err(MedpulseError::NoPapers.into())
        }
        Err(e) => Err(e.into()),
    }
}
