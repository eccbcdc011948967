use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ycs_adapters::is_listing_url;
use ycs_index::{read_company_rows, BulkLoadOptions, VectorStore};
use ycs_pipeline::{
    report_from_artifact, report_summary, PipelineConfig, Services, DEFAULT_COMPANY_LIMIT,
    INSIGHTS_PER_COMPANY,
};
use ycs_storage::ArtifactStore;

#[derive(Debug, Parser)]
#[command(name = "ycs-cli")]
#[command(about = "Find similar YC companies for an idea and turn what they did into a strategy report")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Similarity search, scraping, insights and report in one go.
    Run {
        idea: String,
        #[arg(long, default_value_t = DEFAULT_COMPANY_LIMIT)]
        limit: usize,
    },
    /// Load companies from a CSV file into the vector index.
    Index {
        csv: PathBuf,
        /// Drop and recreate the collection first.
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        recreate: bool,
        #[arg(long, default_value_t = 8)]
        workers: usize,
        #[arg(long, default_value_t = 256)]
        batch_size: usize,
    },
    /// Collection status and point count.
    IndexStatus,
    /// Similarity search only.
    Search {
        idea: String,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Scrape one YC company listing page.
    ScrapeListing { url: String },
    /// Scrape one company landing page.
    ScrapeLanding { url: String },
    /// Search-engine insights for one company.
    Insights {
        company: String,
        #[arg(long, default_value_t = INSIGHTS_PER_COMPANY)]
        count: usize,
    },
    /// Generate a report from a saved collected-data file.
    Report {
        #[arg(long)]
        data: PathBuf,
        /// Replace the idea stored in the data file.
        #[arg(long)]
        idea: Option<String>,
        /// Output directory; defaults to YCS_OUTPUT_DIR.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serializing output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let services = Services::new(PipelineConfig::from_env())?;

    match cli.command {
        Commands::Run { idea, limit } => {
            let pipeline = services.pipeline()?;
            let summary = pipeline.run(&idea, limit).await?;
            println!(
                "run complete: companies={} failed_listings={} landing_pages={} insights={}",
                summary.companies, summary.failed_listings, summary.landing_pages, summary.insights
            );
            println!("collected data: {}", summary.corpus_path.display());
            println!("report: {}", summary.report.report_path.display());
            println!("markdown: {}", summary.report.markdown_path.display());
            println!("{}", report_summary(&summary.report.report));
            print_json(&summary.report.report)?;
        }
        Commands::Index {
            csv,
            recreate,
            workers,
            batch_size,
        } => {
            let loader = services.bulk_loader(BulkLoadOptions {
                recreate,
                workers,
                batch_size,
                ..Default::default()
            })?;
            let rows = read_company_rows(&csv)?;
            info!(rows = rows.len(), path = %csv.display(), "loaded company rows");
            let report = loader.load(rows).await?;
            print_json(&report)?;
        }
        Commands::IndexStatus => {
            let collection = &services.config().collection_name;
            let store = services.vector_store();
            if !store.collection_exists(collection).await? {
                bail!("collection `{collection}` does not exist; run the index command first");
            }
            let info = store.collection_info(collection).await?;
            println!(
                "collection={} status={} points={} vector={}",
                collection,
                info.status,
                info.points(),
                services.config().vector_name
            );
        }
        Commands::Search { idea, limit } => {
            let lookup = services.similarity_lookup()?;
            let candidates = lookup.find_similar(&idea, limit).await?;
            for (rank, candidate) in candidates.iter().enumerate() {
                println!(
                    "{}. {} ({:.3}) {}",
                    rank + 1,
                    candidate.name,
                    candidate.similarity_score,
                    candidate.url
                );
            }
            print_json(&candidates)?;
        }
        Commands::ScrapeListing { url } => {
            if !is_listing_url(&url) {
                bail!("{url} is not a YC company listing URL (expected ycombinator.com/companies/...)");
            }
            let page = services.page_scraper().scrape_listing(&url, None).await;
            print_json(&page)?;
        }
        Commands::ScrapeLanding { url } => {
            let page = services.page_scraper().scrape_landing(&url).await;
            print_json(&page)?;
        }
        Commands::Insights { company, count } => {
            let collector = services.insight_collector()?;
            let insights = collector.collect(&company, count).await;
            println!("{} insights for {company}", insights.len());
            print_json(&insights)?;
        }
        Commands::Report { data, idea, output } => {
            let synthesizer = services.report_synthesizer()?;
            let store = output
                .map(ArtifactStore::new)
                .unwrap_or_else(|| services.artifact_store());
            let artifacts =
                report_from_artifact(&synthesizer, &store, &data, idea.as_deref()).await?;
            println!("report: {}", artifacts.report_path.display());
            println!("markdown: {}", artifacts.markdown_path.display());
            println!("{}", report_summary(&artifacts.report));
            print_json(&artifacts.report)?;
        }
    }

    Ok(())
}
