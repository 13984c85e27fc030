//! audit-scraper - Degree-audit scrape runner
//!
//! Runs one full, offline batch scrape of the degree-audit system and writes
//! the normalized programs as a single JSON document. Also inspects the
//! per-catalog-year specialization cache.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use audit_common::config::{
    default_config_path, resolve_data_folder, spec_cache_file, DATA_FOLDER_ENV,
};
use audit_common::{CatalogYear, ScraperConfig, TomlConfig};
use audit_scraper::services::{
    AuditClient, CatalogClient, CourseIndex, RequirementTreeParser, ScrapeOrchestrator, SpecCache,
};
use audit_scraper::types::AuditApi;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "audit_scraper=info,audit_common=info";

/// Command-line arguments for audit-scraper
#[derive(Parser, Debug)]
#[command(name = "audit-scraper")]
#[command(about = "Degree-audit requirement scraper")]
#[command(version)]
struct Args {
    /// TOML config file (default: ~/.config/degree-audit/config.toml)
    #[arg(short, long, env = "AUDIT_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the specialization caches and default output
    #[arg(long, env = "AUDIT_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// Tracing filter directives, overridden by RUST_LOG
    #[arg(long, env = "AUDIT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full scrape and write the output document
    Run(RunArgs),

    /// Summarize the specialization cache of a catalog year
    InspectCache {
        /// Catalog year, e.g. 20242025
        catalog_year: CatalogYear,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Student id the session belongs to
    #[arg(long, env = "AUDIT_STUDENT_ID")]
    student_id: Option<String>,

    /// Authorization header value, passed through verbatim
    #[arg(long, env = "AUDIT_AUTH_HEADER", hide_env_values = true)]
    auth_header: Option<String>,

    #[arg(long, env = "AUDIT_BASE_URL")]
    audit_base_url: Option<String>,

    #[arg(long, env = "AUDIT_CATALOG_BASE_URL")]
    catalog_base_url: Option<String>,

    /// Quiet period after every upstream call, in milliseconds
    #[arg(long, env = "AUDIT_REQUEST_DELAY_MS")]
    request_delay_ms: Option<u64>,

    #[arg(long, env = "AUDIT_MAX_RETRIES")]
    max_retries: Option<u32>,

    /// Output document path (default: <data folder>/programs.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON array of known course ids, for wildcard and range expansion
    #[arg(long, env = "AUDIT_COURSE_INDEX")]
    course_index: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let file_config = match &config_path {
        Some(path) => TomlConfig::load(path).context("Failed to load config file")?,
        None => TomlConfig::default(),
    };

    // Initialize tracing
    let filter = args
        .log_level
        .clone()
        .or_else(|| file_config.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting audit-scraper {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    match args.command {
        Command::Run(run_args) => {
            let overrides = TomlConfig {
                audit_base_url: run_args.audit_base_url,
                catalog_base_url: run_args.catalog_base_url,
                student_id: run_args.student_id,
                auth_header: run_args.auth_header,
                request_delay_ms: run_args.request_delay_ms,
                max_retries: run_args.max_retries,
                data_folder: args.data_folder,
                output_path: run_args.output,
                course_index_path: run_args.course_index,
                log_level: args.log_level,
                ..Default::default()
            };
            let config =
                ScraperConfig::resolve(overrides, file_config).context("Invalid configuration")?;
            run(config).await
        }
        Command::InspectCache { catalog_year } => {
            let data_folder = args
                .data_folder
                .or(file_config.data_folder)
                .unwrap_or_else(|| resolve_data_folder(None, DATA_FOLDER_ENV));
            inspect_cache(data_folder, catalog_year)
        }
    }
}

async fn run(config: ScraperConfig) -> Result<()> {
    info!("Data folder: {}", config.data_folder.display());
    std::fs::create_dir_all(&config.data_folder)
        .with_context(|| format!("Failed to create {}", config.data_folder.display()))?;

    let audit = AuditClient::bootstrap(&config)
        .await
        .context("Failed to bootstrap audit client")?;
    let catalog_year = audit.catalog_year();
    let catalog = CatalogClient::new(&config).context("Failed to build catalog client")?;

    let courses = match &config.course_index_path {
        Some(path) => CourseIndex::load(path).context("Failed to load course index")?,
        None => {
            info!("No course index configured; wildcard and range references will be dropped");
            CourseIndex::default()
        }
    };

    let cache = SpecCache::load(&config.spec_cache_path(catalog_year))
        .context("Failed to load specialization cache")?;

    let mut orchestrator = ScrapeOrchestrator::new(
        Arc::new(audit),
        Arc::new(catalog),
        RequirementTreeParser::new(courses),
        cache,
    );
    orchestrator.run().await.context("Scrape run failed")?;
    let output = orchestrator.get()?;

    audit_common::fs::write_json_atomic(&config.output_path, output)
        .with_context(|| format!("Failed to write {}", config.output_path.display()))?;
    info!(
        run_id = %output.run_id,
        path = %config.output_path.display(),
        "Output written"
    );
    Ok(())
}

fn inspect_cache(data_folder: PathBuf, catalog_year: CatalogYear) -> Result<()> {
    let path = spec_cache_file(&data_folder, catalog_year);
    let cache = SpecCache::load(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let (resolved, unresolved) = cache.summary();

    println!("cache:      {}", path.display());
    println!("entries:    {}", cache.len());
    println!("resolved:   {}", resolved);
    println!("unresolved: {}", unresolved);
    Ok(())
}
