mod output;
mod run;

use std::path::{Path, PathBuf};

use anyhow::Context;
use bottledb_core::{AppConfig, BasicBottleRecord, BottleLimit, RunConfig};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::Delimiter;

#[derive(Debug, Parser)]
#[command(name = "bottledb")]
#[command(about = "Scrape spirits listings and bottle detail pages into JSON/CSV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the listing page and every selected bottle's detail page.
    Scrape(ScrapeArgs),
    /// Extract one detail record from a saved detail page.
    Extract(ExtractArgs),
    /// Extract the basic records from a saved listing page.
    Listing {
        page: PathBuf,
        /// Base URL relative links are resolved against; defaults to the
        /// configured base URL.
        #[arg(long)]
        base_url: Option<String>,
    },
}

/// Command-line overrides for the run options loaded from the environment.
#[derive(Debug, Default, Args)]
struct ScrapeArgs {
    /// Read `bottles.html`/`bottle.html` from the data directory.
    #[arg(long)]
    local: bool,
    /// Ignore cached pages.
    #[arg(long)]
    no_cache: bool,
    /// Save every fetched page into the cache directory.
    #[arg(long)]
    store_html: bool,
    /// Only scrape the first N bottles of the listing.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
    /// Also write the listing records to `basic.json`.
    #[arg(long)]
    intermediate_json: bool,
    /// JSON output path; defaults to `output.json` in the output directory.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Also write the records as CSV to this path.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
    /// Also write the records as TSV to this path.
    #[arg(long, value_name = "PATH")]
    tsv: Option<PathBuf>,
}

impl ScrapeArgs {
    fn apply_to(&self, run: &mut RunConfig) {
        if self.local {
            run.local_mode = true;
        }
        if self.no_cache {
            run.use_cache = false;
        }
        if self.store_html {
            run.store_html = true;
        }
        if let Some(limit) = self.limit {
            run.num_bottles = BottleLimit::AtMost(limit);
        }
        if self.intermediate_json {
            run.write_intermediate_json = true;
        }
    }

    fn delimited_outputs(&self) -> Vec<(&Path, Delimiter)> {
        [
            (self.csv.as_deref(), Delimiter::Csv),
            (self.tsv.as_deref(), Delimiter::Tsv),
        ]
        .into_iter()
        .filter_map(|(path, delimiter)| path.map(|p| (p, delimiter)))
        .collect()
    }

    fn json_path(&self, config: &AppConfig) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| config.output_dir.join("output.json"))
    }
}

#[derive(Debug, Args)]
struct ExtractArgs {
    page: PathBuf,
    #[arg(long, default_value = "")]
    href: String,
    #[arg(long, default_value = "")]
    brand: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    category: String,
    /// Listing price; absent means unknown (NaN).
    #[arg(long)]
    price: Option<f64>,
    #[arg(long, default_value_t = 0.0)]
    rating: f64,
}

impl ExtractArgs {
    fn basic_record(&self) -> BasicBottleRecord {
        BasicBottleRecord {
            href: self.href.clone(),
            brand: self.brand.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            rating: self.rating,
            price: self.price.unwrap_or(f64::NAN),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = bottledb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scrape(args) => {
            args.apply_to(&mut config.run);
            scrape(&config, &args).await
        }
        Commands::Extract(args) => extract(&args),
        Commands::Listing { page, base_url } => {
            listing(&page, base_url.as_deref().unwrap_or(&config.base_url))
        }
    }
}

async fn scrape(config: &AppConfig, args: &ScrapeArgs) -> anyhow::Result<()> {
    tracing::debug!(?config, "starting scrape run");
    let source = run::build_source(config)?;
    let outcome = run::run_scrape(config, &source).await?;
    tracing::info!(
        extracted = outcome.records.len(),
        skipped = outcome.skipped,
        aborted = outcome.aborted.is_some(),
        "scrape run complete"
    );

    outcome.persist(&args.json_path(config), &args.delimited_outputs())
}

fn read_page(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn extract(args: &ExtractArgs) -> anyhow::Result<()> {
    let markup = read_page(&args.page)?;
    let extraction = run::extract_from_markup(&markup, args.basic_record())?;
    for diagnostic in &extraction.diagnostics {
        tracing::info!(%diagnostic, "extraction diagnostic");
    }
    println!("{}", serde_json::to_string_pretty(&extraction.record)?);
    Ok(())
}

fn listing(page: &Path, base_url: &str) -> anyhow::Result<()> {
    let markup = read_page(page)?;
    let records = run::parse_listing(&markup, base_url)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
