use std::sync::Arc;

use tracing::info;
use ycs_core::Candidate;

use crate::{Embedder, IndexError, IndexSettings, VectorStore};

/// Ranks indexed companies against a free-text idea.
#[derive(Clone)]
pub struct SimilarityLookup {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: IndexSettings,
}

impl SimilarityLookup {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, settings: IndexSettings) -> Self {
        Self {
            embedder,
            store,
            settings,
        }
    }

    /// Up to `limit` candidates, most similar first.
    pub async fn find_similar(&self, idea: &str, limit: usize) -> Result<Vec<Candidate>, IndexError> {
        if !self.store.collection_exists(&self.settings.collection).await? {
            return Err(IndexError::CollectionNotFound(self.settings.collection.clone()));
        }

        let query = vec![idea.to_string()];
        let vector = self
            .embedder
            .embed(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(IndexError::EmbeddingCount { expected: 1, got: 0 })?;

        let mut points = self
            .store
            .query(&self.settings.collection, &self.settings.vector_name, vector, limit)
            .await?;
        points.sort_by(|a, b| b.score.total_cmp(&a.score));
        points.truncate(limit);

        let candidates = points
            .into_iter()
            .map(|point| point.payload.into_candidate(point.score))
            .collect::<Vec<_>>();
        info!(
            collection = %self.settings.collection,
            found = candidates.len(),
            "similarity lookup done"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{CollectionInfo, CompanyRow, IndexPoint, ScoredPoint};

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[derive(Default)]
    struct CannedStore {
        exists: bool,
        queries: Mutex<Vec<(String, usize)>>,
    }

    fn scored(name: &str, score: f32) -> ScoredPoint {
        ScoredPoint {
            score,
            payload: CompanyRow {
                name: name.into(),
                description: format!("{name} description"),
                ..Default::default()
            },
        }
    }

    #[async_trait]
    impl VectorStore for CannedStore {
        async fn collection_exists(&self, _collection: &str) -> Result<bool, IndexError> {
            Ok(self.exists)
        }
        async fn create_collection(&self, _settings: &IndexSettings) -> Result<(), IndexError> {
            Ok(())
        }
        async fn delete_collection(&self, _collection: &str) -> Result<(), IndexError> {
            Ok(())
        }
        async fn upsert(&self, _: &str, _: &str, _: Vec<IndexPoint>) -> Result<(), IndexError> {
            Ok(())
        }
        async fn query(
            &self,
            _collection: &str,
            vector_name: &str,
            _vector: Vec<f32>,
            limit: usize,
        ) -> Result<Vec<ScoredPoint>, IndexError> {
            self.queries.lock().unwrap().push((vector_name.to_string(), limit));
            Ok(vec![scored("Low", 0.2), scored("High", 0.9), scored("Mid", 0.5)])
        }
        async fn collection_info(&self, _collection: &str) -> Result<CollectionInfo, IndexError> {
            Ok(CollectionInfo {
                status: "green".into(),
                points_count: Some(3),
            })
        }
    }

    fn settings() -> IndexSettings {
        IndexSettings {
            collection: "yc_companies".into(),
            vector_name: "fast-mistral-embed".into(),
            vector_size: 2,
            distance: "Cosine".into(),
        }
    }

    #[tokio::test]
    async fn candidates_are_ranked_and_limited() {
        let store = Arc::new(CannedStore {
            exists: true,
            ..Default::default()
        });
        let lookup = SimilarityLookup::new(Arc::new(ConstantEmbedder), store.clone(), settings());
        let found = lookup.find_similar("laundry robots", 2).await.unwrap();

        let names = found.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["High", "Mid"]);
        assert!((found[0].similarity_score - 0.9).abs() < f32::EPSILON);
        assert_eq!(
            store.queries.lock().unwrap().as_slice(),
            [("fast-mistral-embed".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn missing_collection_is_reported() {
        let lookup = SimilarityLookup::new(
            Arc::new(ConstantEmbedder),
            Arc::new(CannedStore::default()),
            settings(),
        );
        let err = lookup.find_similar("idea", 3).await.unwrap_err();
        assert!(matches!(err, IndexError::CollectionNotFound(name) if name == "yc_companies"));
    }
}
