//! Vector store seam and its Qdrant REST implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info};
use ycs_storage::HttpClient;

use crate::{CompanyRow, IndexError, IndexSettings};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: CompanyRow,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoredPoint {
    pub score: f32,
    #[serde(default)]
    pub payload: CompanyRow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub status: String,
    /// Qdrant reports `null` while the count is not yet known.
    #[serde(default)]
    pub points_count: Option<u64>,
}

impl CollectionInfo {
    pub fn is_ready(&self) -> bool {
        self.status.eq_ignore_ascii_case("green")
    }

    pub fn points(&self) -> u64 {
        self.points_count.unwrap_or(0)
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> Result<bool, IndexError>;
    async fn create_collection(&self, settings: &IndexSettings) -> Result<(), IndexError>;
    async fn delete_collection(&self, collection: &str) -> Result<(), IndexError>;
    async fn upsert(
        &self,
        collection: &str,
        vector_name: &str,
        points: Vec<IndexPoint>,
    ) -> Result<(), IndexError>;
    /// Nearest points to `vector`, best first.
    async fn query(
        &self,
        collection: &str,
        vector_name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError>;
    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, IndexError>;
}

#[derive(Debug, Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Clone)]
pub struct QdrantStore {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantStore {
    pub fn new(http: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/collections/{}", self.base_url, collection)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn collection_exists(&self, collection: &str) -> Result<bool, IndexError> {
        let url = format!("{}/exists", self.collection_url(collection));
        let envelope: QdrantEnvelope<ExistsResult> = self
            .http
            .execute_json("qdrant-exists", |client| self.authorize(client.get(&url)))
            .await?;
        Ok(envelope.result.exists)
    }

    async fn create_collection(&self, settings: &IndexSettings) -> Result<(), IndexError> {
        let url = self.collection_url(&settings.collection);
        let mut vectors = BTreeMap::new();
        vectors.insert(
            settings.vector_name.clone(),
            json!({ "size": settings.vector_size, "distance": settings.distance }),
        );
        let body = json!({ "vectors": vectors });
        self.http
            .execute("qdrant-create", |client| self.authorize(client.put(&url)).json(&body))
            .await?;
        info!(
            collection = %settings.collection,
            vector = %settings.vector_name,
            size = settings.vector_size,
            "created collection"
        );
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), IndexError> {
        let url = self.collection_url(collection);
        self.http
            .execute("qdrant-delete", |client| self.authorize(client.delete(&url)))
            .await?;
        info!(collection, "deleted collection");
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        vector_name: &str,
        points: Vec<IndexPoint>,
    ) -> Result<(), IndexError> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/points", self.collection_url(collection));
        let count = points.len();
        let points = points
            .into_iter()
            .map(|point| {
                let mut vector = serde_json::Map::new();
                vector.insert(vector_name.to_string(), json!(point.vector));
                json!({
                    "id": point.id,
                    "vector": vector,
                    "payload": point.payload,
                })
            })
            .collect::<Vec<JsonValue>>();
        let body = json!({ "points": points });
        self.http
            .execute("qdrant-upsert", |client| {
                self.authorize(client.put(&url))
                    .query(&[("wait", "true")])
                    .json(&body)
            })
            .await?;
        debug!(collection, points = count, "upserted points");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector_name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        let url = format!("{}/points/query", self.collection_url(collection));
        let body = json!({
            "query": vector,
            "using": vector_name,
            "limit": limit,
            "with_payload": true,
        });
        let envelope: QdrantEnvelope<QueryResult> = self
            .http
            .execute_json("qdrant-query", |client| self.authorize(client.post(&url)).json(&body))
            .await?;
        Ok(envelope.result.points)
    }

    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo, IndexError> {
        let url = self.collection_url(collection);
        let envelope: QdrantEnvelope<JsonValue> = self
            .http
            .execute_json("qdrant-info", |client| self.authorize(client.get(&url)))
            .await?;
        serde_json::from_value(envelope.result)
            .map_err(|err| IndexError::Store(format!("collection info: {err}")))
    }
}
