//! Bulk loading of the company index from a delimited source file.
//!
//! Rows are split into chunks that a bounded pool of workers embeds concurrently. Each
//! worker returns its own batch of points; batches are concatenated once every worker is
//! done, then uploaded in fixed-size upsert batches.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{CompanyRow, Embedder, IndexError, IndexPoint, IndexSettings, VectorStore};

#[derive(Debug, Clone)]
pub struct BulkLoadOptions {
    /// Points per upsert request.
    pub batch_size: usize,
    /// Concurrent embedding workers. Independent of `batch_size`.
    pub workers: usize,
    /// Rows handed to one worker at a time.
    pub chunk_size: usize,
    /// Drop and recreate an existing collection instead of reusing it.
    pub recreate: bool,
    pub ready_poll_interval: Duration,
    pub ready_max_polls: usize,
}

impl Default for BulkLoadOptions {
    fn default() -> Self {
        Self {
            batch_size: 256,
            workers: 8,
            chunk_size: 200,
            recreate: true,
            ready_poll_interval: Duration::from_secs(1),
            ready_max_polls: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkLoadReport {
    pub collection: String,
    pub rows: usize,
    pub points_uploaded: usize,
    /// Point count read back from the store after upload.
    pub points_count: u64,
    pub elapsed_ms: u128,
}

/// Deterministic point id: the same company name always maps to the same id, so re-running
/// a load overwrites instead of duplicating.
pub fn point_id(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.trim().as_bytes()).to_string()
}

/// Read company rows, dropping rows whose description is blank.
pub fn read_company_rows(path: &Path) -> Result<Vec<CompanyRow>, IndexError> {
    let source = path.display().to_string();
    let reader = csv::Reader::from_path(path).map_err(|source_err| IndexError::Rows {
        path: source.clone(),
        source: source_err,
    })?;
    collect_rows(reader, &source)
}

pub fn company_rows_from_reader<R: Read>(reader: R, source: &str) -> Result<Vec<CompanyRow>, IndexError> {
    collect_rows(csv::Reader::from_reader(reader), source)
}

fn collect_rows<R: Read>(mut reader: csv::Reader<R>, source: &str) -> Result<Vec<CompanyRow>, IndexError> {
    let mut rows = Vec::new();
    for record in reader.deserialize::<CompanyRow>() {
        let row = record.map_err(|err| IndexError::Rows {
            path: source.to_string(),
            source: err,
        })?;
        if !row.description.trim().is_empty() && !row.name.trim().is_empty() {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[derive(Clone)]
pub struct BulkLoader {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: IndexSettings,
    options: BulkLoadOptions,
}

impl BulkLoader {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: IndexSettings,
        options: BulkLoadOptions,
    ) -> Self {
        Self {
            embedder,
            store,
            settings,
            options,
        }
    }

    pub async fn load(&self, rows: Vec<CompanyRow>) -> Result<BulkLoadReport, IndexError> {
        let started = Instant::now();
        let row_count = rows.len();
        self.prepare_collection().await?;

        info!(rows = row_count, workers = self.options.workers, "embedding company rows");
        let points = self.embed_rows(rows).await?;
        let points_uploaded = points.len();

        info!(
            points = points_uploaded,
            vector = %self.settings.vector_name,
            "uploading points"
        );
        for batch in points.chunks(self.options.batch_size.max(1)) {
            self.store
                .upsert(&self.settings.collection, &self.settings.vector_name, batch.to_vec())
                .await?;
        }

        let points_count = self.wait_until_ready().await?;
        if points_count == 0 {
            warn!(
                expected = points_uploaded,
                vector = %self.settings.vector_name,
                "collection reports 0 points after upload; check the vector name"
            );
        } else {
            info!(points = points_count, "bulk load verified");
        }

        Ok(BulkLoadReport {
            collection: self.settings.collection.clone(),
            rows: row_count,
            points_uploaded,
            points_count,
            elapsed_ms: started.elapsed().as_millis(),
        })
    }

    async fn prepare_collection(&self) -> Result<(), IndexError> {
        let collection = &self.settings.collection;
        if self.store.collection_exists(collection).await? {
            if !self.options.recreate {
                info!(collection = %collection, "reusing existing collection");
                return Ok(());
            }
            self.store.delete_collection(collection).await?;
        }
        self.store.create_collection(&self.settings).await
    }

    async fn embed_rows(&self, rows: Vec<CompanyRow>) -> Result<Vec<IndexPoint>, IndexError> {
        let limit = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut tasks = JoinSet::new();
        let chunks = rows
            .chunks(self.options.chunk_size.max(1))
            .map(<[CompanyRow]>::to_vec)
            .collect::<Vec<_>>();
        let chunk_total = chunks.len();

        for chunk in chunks {
            let embedder = Arc::clone(&self.embedder);
            let limit = Arc::clone(&limit);
            tasks.spawn(async move {
                let _permit = limit
                    .acquire_owned()
                    .await
                    .map_err(|_| IndexError::Worker("worker pool closed".into()))?;
                points_for_chunk(embedder.as_ref(), chunk).await
            });
        }

        let mut points = Vec::new();
        let mut done = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let chunk_points = joined.map_err(|err| IndexError::Worker(err.to_string()))??;
            done += 1;
            points.extend(chunk_points);
            debug!(chunk = done, of = chunk_total, points = points.len(), "chunk embedded");
        }
        Ok(points)
    }

    async fn wait_until_ready(&self) -> Result<u64, IndexError> {
        let mut info = self.store.collection_info(&self.settings.collection).await?;
        for _ in 0..self.options.ready_max_polls {
            if info.is_ready() {
                break;
            }
            tokio::time::sleep(self.options.ready_poll_interval).await;
            info = self.store.collection_info(&self.settings.collection).await?;
        }
        if !info.is_ready() {
            warn!(status = %info.status, "collection not ready after upload");
        }
        Ok(info.points())
    }
}

async fn points_for_chunk(
    embedder: &dyn Embedder,
    rows: Vec<CompanyRow>,
) -> Result<Vec<IndexPoint>, IndexError> {
    let texts = rows
        .iter()
        .map(|row| row.description.trim().to_string())
        .collect::<Vec<_>>();
    let vectors = embedder.embed(&texts).await?;
    if vectors.len() != rows.len() {
        return Err(IndexError::EmbeddingCount {
            expected: rows.len(),
            got: vectors.len(),
        });
    }
    Ok(rows
        .into_iter()
        .zip(vectors)
        .map(|(row, vector)| IndexPoint {
            id: point_id(&row.name),
            vector,
            payload: row,
        })
        .collect())
}
