//! Vector index access: embeddings, the vector store, similarity lookup and bulk loading.

pub mod bulk;
pub mod embed;
pub mod qdrant;
pub mod similarity;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ycs_core::Candidate;
use ycs_storage::FetchError;

pub use bulk::{
    company_rows_from_reader, point_id, read_company_rows, BulkLoadOptions, BulkLoadReport,
    BulkLoader,
};
pub use embed::{vector_name_for_model, Embedder, HttpEmbedder};
pub use qdrant::{CollectionInfo, IndexPoint, QdrantStore, ScoredPoint, VectorStore};
pub use similarity::SimilarityLookup;

pub const CRATE_NAME: &str = "ycs-index";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("collection `{0}` does not exist; run the index command first")]
    CollectionNotFound(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("embedding service returned {got} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, got: usize },
    #[error("unexpected vector store response: {0}")]
    Store(String),
    #[error("reading company rows from {path}: {source}")]
    Rows {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("embedding worker failed: {0}")]
    Worker(String),
}

/// Where and how companies are indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    pub collection: String,
    /// Named vector inside each point; must match between load and query.
    pub vector_name: String,
    pub vector_size: usize,
    pub distance: String,
}

/// One company row of the bulk source, also stored as the point payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub main_industry: String,
    #[serde(default)]
    pub sub_industry: String,
    #[serde(default)]
    pub batch: String,
    #[serde(default)]
    pub url: String,
}

impl CompanyRow {
    pub fn into_candidate(self, similarity_score: f32) -> Candidate {
        Candidate {
            name: self.name,
            description: self.description,
            main_industry: self.main_industry,
            sub_industry: self.sub_industry,
            batch: self.batch,
            url: self.url,
            similarity_score,
        }
    }
}
