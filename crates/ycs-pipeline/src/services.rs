//! Live clients built from [`PipelineConfig`]. Each constructor checks the credentials it
//! needs so a stage fails before it touches the network.

use std::sync::Arc;

use anyhow::Context;
use ycs_adapters::{
    GoogleCustomSearch, HttpRenderer, InsightCollector, PageRenderer, PageScraper,
};
use ycs_index::{
    BulkLoadOptions, BulkLoader, Embedder, HttpEmbedder, QdrantStore, SimilarityLookup,
    VectorStore,
};
use ycs_report::{MistralChat, ReportSynthesizer};
use ycs_storage::{ArtifactStore, HttpClient};

use crate::{CompanyCollector, ConfigError, Pipeline, PipelineConfig};

#[derive(Clone)]
pub struct Services {
    config: PipelineConfig,
    http: HttpClient,
}

impl Services {
    pub fn new(config: PipelineConfig) -> anyhow::Result<Self> {
        let http = HttpClient::new(config.http_config()).context("building HTTP client")?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(self.config.output_dir.clone())
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        Arc::new(QdrantStore::new(
            self.http.clone(),
            self.config.qdrant_url.clone(),
            self.config.qdrant_api_key.clone(),
        ))
    }

    pub fn embedder(&self) -> Result<Arc<dyn Embedder>, ConfigError> {
        let key = self.config.require_embedding()?;
        Ok(Arc::new(HttpEmbedder::new(
            self.http.clone(),
            self.config.embedding_url.clone(),
            self.config.embedding_model.clone(),
            key,
        )))
    }

    pub fn similarity_lookup(&self) -> Result<SimilarityLookup, ConfigError> {
        Ok(SimilarityLookup::new(
            self.embedder()?,
            self.vector_store(),
            self.config.index_settings(),
        ))
    }

    pub fn bulk_loader(&self, options: BulkLoadOptions) -> Result<BulkLoader, ConfigError> {
        Ok(BulkLoader::new(
            self.embedder()?,
            self.vector_store(),
            self.config.index_settings(),
            options,
        ))
    }

    fn renderer(&self) -> Arc<dyn PageRenderer> {
        #[cfg(feature = "webdriver")]
        if let Some(url) = &self.config.webdriver_url {
            return Arc::new(ycs_adapters::WebDriverRenderer::new(url.clone()));
        }
        #[cfg(not(feature = "webdriver"))]
        if let Some(url) = &self.config.webdriver_url {
            tracing::warn!(url = %url, "YCS_WEBDRIVER_URL is set but the webdriver feature is off; using plain HTTP");
        }
        Arc::new(HttpRenderer::new(self.http.clone()))
    }

    pub fn page_scraper(&self) -> PageScraper {
        let scraper = PageScraper::new(self.renderer());
        match &self.config.snapshot_dir {
            Some(dir) => scraper.with_snapshots(ArtifactStore::new(dir.clone())),
            None => scraper,
        }
    }

    pub fn insight_collector(&self) -> Result<InsightCollector, ConfigError> {
        let (key, cx) = self.config.require_google()?;
        let api = GoogleCustomSearch::new(self.http.clone(), key, cx);
        Ok(InsightCollector::new(Arc::new(api)).with_pacing(self.config.search_pacing))
    }

    pub fn company_collector(&self) -> Result<CompanyCollector, ConfigError> {
        Ok(CompanyCollector::new(
            self.page_scraper(),
            self.insight_collector()?,
        ))
    }

    pub fn report_synthesizer(&self) -> Result<ReportSynthesizer, ConfigError> {
        let key = self.config.require_mistral()?;
        let chat = MistralChat::new(
            self.http.clone(),
            self.config.mistral_url.clone(),
            self.config.mistral_model.clone(),
            key,
        );
        Ok(ReportSynthesizer::new(
            Arc::new(chat),
            self.config.report_temperature,
        ))
    }

    /// Full pipeline. Every credential is checked here, before the first request.
    pub fn pipeline(&self) -> Result<Pipeline, ConfigError> {
        Ok(Pipeline::new(
            self.similarity_lookup()?,
            self.company_collector()?,
            self.report_synthesizer()?,
            self.artifact_store(),
        )
        .with_company_delay(self.config.company_delay))
    }
}
