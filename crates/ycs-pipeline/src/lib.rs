//! Pipeline orchestration: similarity lookup, per-company collection, report synthesis and
//! artifact persistence.

pub mod aggregate;
pub mod config;
pub mod services;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use ycs_core::{Candidate, CollectedCorpus, ReportEnvelope, StrategyReport};
use ycs_index::SimilarityLookup;
use ycs_report::{render_markdown, ReportSynthesizer};
use ycs_storage::ArtifactStore;

pub use aggregate::{CompanyCollector, INSIGHTS_PER_COMPANY};
pub use config::{ConfigError, PipelineConfig};
pub use services::Services;

pub const CRATE_NAME: &str = "ycs-pipeline";

pub const DEFAULT_COMPANY_LIMIT: usize = 3;
pub const DEFAULT_COMPANY_DELAY: Duration = Duration::from_secs(2);

const CORPUS_PREFIX: &str = "collected_data";
const REPORT_PREFIX: &str = "strategy_report";
const SUMMARY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifacts {
    pub generated_at: DateTime<Utc>,
    pub report_path: PathBuf,
    pub markdown_path: PathBuf,
    pub report: StrategyReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub idea: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub companies: usize,
    pub failed_listings: usize,
    pub landing_pages: usize,
    pub insights: usize,
    pub corpus_path: PathBuf,
    pub report: ReportArtifacts,
}

/// Full run: lookup, then one company at a time, then synthesis. Per-company failures are
/// carried in the corpus; only lookup, synthesis and persistence errors end the run.
pub struct Pipeline {
    lookup: SimilarityLookup,
    collector: CompanyCollector,
    synthesizer: ReportSynthesizer,
    store: ArtifactStore,
    company_delay: Duration,
}

impl Pipeline {
    pub fn new(
        lookup: SimilarityLookup,
        collector: CompanyCollector,
        synthesizer: ReportSynthesizer,
        store: ArtifactStore,
    ) -> Self {
        Self {
            lookup,
            collector,
            synthesizer,
            store,
            company_delay: DEFAULT_COMPANY_DELAY,
        }
    }

    pub fn with_company_delay(mut self, delay: Duration) -> Self {
        self.company_delay = delay;
        self
    }

    pub async fn run(&self, idea: &str, limit: usize) -> Result<RunSummary> {
        let started_at = Utc::now();
        info!(idea, limit, "starting pipeline run");

        let candidates = self
            .lookup
            .find_similar(idea, limit)
            .await
            .context("similarity lookup failed")?;
        if candidates.is_empty() {
            bail!("similarity lookup returned no companies for this idea");
        }
        for candidate in &candidates {
            info!(
                name = %candidate.name,
                score = candidate.similarity_score,
                "candidate"
            );
        }

        let corpus = self.collect(idea, candidates).await;
        let corpus_path = persist_corpus(&self.store, &corpus).await?;
        let report = generate_report(&self.synthesizer, &self.store, &corpus).await?;

        let summary = RunSummary {
            idea: idea.to_string(),
            started_at,
            finished_at: Utc::now(),
            companies: corpus.companies.len(),
            failed_listings: corpus
                .companies
                .iter()
                .filter(|record| record.listing.is_error())
                .count(),
            landing_pages: corpus
                .companies
                .iter()
                .filter(|record| record.landing_page.is_some())
                .count(),
            insights: corpus.companies.iter().map(|r| r.insights.len()).sum(),
            corpus_path,
            report,
        };
        info!(
            companies = summary.companies,
            failed_listings = summary.failed_listings,
            "pipeline run complete"
        );
        Ok(summary)
    }

    /// Candidates are processed strictly in order with a courtesy pause between them.
    pub async fn collect(&self, idea: &str, candidates: Vec<Candidate>) -> CollectedCorpus {
        let total = candidates.len();
        let mut companies = Vec::with_capacity(total);
        for (index, candidate) in candidates.into_iter().enumerate() {
            if index > 0 && !self.company_delay.is_zero() {
                tokio::time::sleep(self.company_delay).await;
            }
            info!(company = index + 1, of = total, name = %candidate.name, "collecting");
            let record = self.collector.collect(candidate).await;
            if let Some(err) = &record.listing.error {
                warn!(name = %record.name(), error = %err, "listing unavailable");
            }
            companies.push(record);
        }
        CollectedCorpus {
            user_idea: idea.to_string(),
            collected_at: Utc::now(),
            companies,
        }
    }
}

pub async fn persist_corpus(store: &ArtifactStore, corpus: &CollectedCorpus) -> Result<PathBuf> {
    let name = ArtifactStore::timestamped_name(CORPUS_PREFIX, corpus.collected_at, "json");
    let path = store
        .write_json(&name, corpus)
        .await
        .context("writing collected data")?;
    info!(path = %path.display(), companies = corpus.companies.len(), "collected data saved");
    Ok(path)
}

/// Synthesize, normalize and write the report as JSON (wrapped with its timestamp) and as
/// Markdown.
pub async fn generate_report(
    synthesizer: &ReportSynthesizer,
    store: &ArtifactStore,
    corpus: &CollectedCorpus,
) -> Result<ReportArtifacts> {
    let report = synthesizer
        .synthesize(corpus)
        .await
        .context("strategy report synthesis failed")?;
    let generated_at = Utc::now();

    let envelope = ReportEnvelope {
        generated_at,
        report,
    };
    let report_path = store
        .write_json(
            &ArtifactStore::timestamped_name(REPORT_PREFIX, generated_at, "json"),
            &envelope,
        )
        .await
        .context("writing strategy report")?;

    let markdown = render_markdown(&envelope.report, &corpus.user_idea, generated_at);
    let markdown_path = store
        .write_text(
            &ArtifactStore::timestamped_name(REPORT_PREFIX, generated_at, "md"),
            &markdown,
        )
        .await
        .context("writing strategy report markdown")?;

    info!(path = %report_path.display(), "strategy report saved");
    Ok(ReportArtifacts {
        generated_at,
        report_path,
        markdown_path,
        report: envelope.report,
    })
}

/// Re-run synthesis on a previously saved corpus, optionally under a different idea.
pub async fn report_from_artifact(
    synthesizer: &ReportSynthesizer,
    store: &ArtifactStore,
    corpus_path: &Path,
    idea: Option<&str>,
) -> Result<ReportArtifacts> {
    let mut corpus: CollectedCorpus = ArtifactStore::read_json(corpus_path).await?;
    if let Some(idea) = idea {
        corpus.user_idea = idea.to_string();
    }
    info!(
        path = %corpus_path.display(),
        companies = corpus.companies.len(),
        "loaded collected data"
    );
    generate_report(synthesizer, store, &corpus).await
}

fn preview(text: &str) -> String {
    if text.chars().count() <= SUMMARY_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SUMMARY_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

/// Short human-readable digest printed after report generation.
pub fn report_summary(report: &StrategyReport) -> String {
    format!(
        "Problem: {}\nSolution: {}\nSimilar companies analyzed: {}",
        preview(&report.vision.problem),
        preview(&report.vision.solution),
        report.similar_companies.len()
    )
}
