//! Command line reports from Korean disclosure data.
//!
//! ```bash
//! # List selectable companies
//! finstate-cli companies --filter 삼성
//!
//! # Yearly report with derived ROE and BPS
//! finstate-cli yearly --company "삼성전자 : 005930" --start 2018 --end 2021
//!
//! # Quarterly statement with a custom account taxonomy
//! finstate-cli quarterly --company 005930 --start 2020 --end 2021 --config accounts.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use finstate::{
    CorpDirectory, DirectoryCache, InMemoryCache, OpenDartProvider, ReportConfig, ReportPipeline,
    ReportSources, SqliteCache, YahooProvider,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

use render::render_table;

#[derive(Parser)]
#[command(name = "finstate-cli")]
#[command(about = "Yearly and quarterly company reports from OpenDART filings", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite file caching the corporate directory between runs
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Yearly report: statement, prices, share counts, dividends, ROE and BPS
    Yearly(ReportArgs),

    /// Quarterly statement with links to each report
    Quarterly(ReportArgs),

    /// List companies in "Name : Ticker" form
    Companies {
        /// Only names containing this text
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Company as "Name : Ticker", a ticker, or an exact name
    #[arg(short, long)]
    company: String,

    /// First year
    #[arg(short, long)]
    start: i32,

    /// Last year
    #[arg(short, long)]
    end: i32,

    /// JSON report configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn open_cache(path: Option<&Path>) -> anyhow::Result<Box<dyn DirectoryCache>> {
    Ok(match path {
        Some(path) => Box::new(
            SqliteCache::new(path)
                .with_context(|| format!("opening directory cache {}", path.display()))?,
        ),
        None => Box::new(InMemoryCache::new()),
    })
}

fn pipeline(config: Option<&Path>) -> anyhow::Result<ReportPipeline> {
    let config = match config {
        Some(path) => ReportConfig::from_path(path)
            .with_context(|| format!("loading report configuration {}", path.display()))?,
        None => ReportConfig::default(),
    };
    Ok(ReportPipeline::new(config)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let dart = Arc::new(OpenDartProvider::from_env().context("OpenDART is not configured")?);
    let cache = open_cache(cli.cache.as_deref())?;
    let directory = CorpDirectory::load(dart.as_ref(), cache.as_ref()).await?;
    info!(companies = directory.len(), "Corporate directory loaded");

    let (args, quarterly) = match cli.command {
        Commands::Companies { filter } => {
            for name in directory.selection_names() {
                if filter.as_deref().is_none_or(|f| name.contains(f)) {
                    println!("{name}");
                }
            }
            return Ok(());
        }
        Commands::Yearly(args) => (args, false),
        Commands::Quarterly(args) => (args, true),
    };

    let pipeline = pipeline(args.config.as_deref())?;
    let company = directory.resolve(&args.company)?;
    let sources = ReportSources::new(dart.clone(), Arc::new(YahooProvider::new()), dart);

    let report = if quarterly {
        pipeline
            .quarterly(&company, args.start, args.end, &sources)
            .await?
    } else {
        pipeline
            .yearly(&company, args.start, args.end, &sources)
            .await?
    };

    println!("{company}");
    print!("{}", render_table(&report));
    Ok(())
}
