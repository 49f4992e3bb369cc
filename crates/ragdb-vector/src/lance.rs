//! Persistent chunk store backed by LanceDB.
//!
//! LanceDB is async; this type exposes the blocking `VectorStore` surface by
//! driving an owned tokio runtime. Every backend call is bounded by the
//! configured timeout. Do not call it from inside another tokio runtime.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, ensure};
use arrow_array::{Array, ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType};
use tokio::runtime::Runtime;

use ragdb_core::config::StoreSettings;
use ragdb_core::error::{Error, Result};
use ragdb_core::traits::{Embedder, VectorStore};
use ragdb_core::types::{Chunk, ChunkId, ChunkMetadata, QueryHit};

use crate::schema::{build_chunk_schema, projected_columns};
use crate::table::{self, id_predicate};

pub struct LanceVectorStore {
    runtime: Runtime,
    conn: Connection,
    table_name: String,
    embedder: Box<dyn Embedder>,
    timeout: Duration,
}

impl LanceVectorStore {
    /// Opens (creating if needed) the chunk table under `db_path`.
    ///
    /// The embedding width is pinned in the meta table on first open; reopening
    /// with an embedder of a different width fails.
    pub fn open(db_path: &Path, settings: &StoreSettings, embedder: Box<dyn Embedder>) -> anyhow::Result<Self> {
        settings.validate()?;
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        let uri = db_path.to_string_lossy().to_string();
        let dim = embedder.dim();
        let conn = runtime.block_on(async {
            let conn = table::open_db(&uri).await?;
            table::ensure_table(&conn, &settings.table, build_chunk_schema(dim)).await?;
            let key = format!("{}.embedding_dim", settings.table);
            match table::get_meta(&conn, &settings.meta_table, &key).await? {
                Some(stored) => ensure!(
                    stored == dim.to_string(),
                    "table '{}' holds {stored}-d embeddings but the embedder produces {dim}-d",
                    settings.table
                ),
                None => table::set_meta(&conn, &settings.meta_table, &key, &dim.to_string()).await?,
            }
            anyhow::Ok(conn)
        })?;
        tracing::info!("opened lancedb store {} (table {}, dim {dim})", uri, settings.table);
        Ok(Self { runtime, conn, table_name: settings.table.clone(), embedder, timeout: settings.timeout() })
    }

    pub fn close(self) {
        let Self { runtime, conn, table_name, .. } = self;
        drop(conn);
        runtime.shutdown_timeout(Duration::from_secs(1));
        tracing::info!("closed lancedb store (table {table_name})");
    }

    fn run<T, F>(&self, op: &str, fut: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let timeout = self.timeout;
        match self.runtime.block_on(async { tokio::time::timeout(timeout, fut).await }) {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(Error::Backend(format!("{op}: {e:#}"))),
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed_batch(texts).map_err(|e| Error::Embedding(format!("{e:#}")))?;
        let dim = self.embedder.dim();
        if vectors.len() != texts.len() || vectors.iter().any(|v| v.len() != dim) {
            return Err(Error::Embedding(format!("embedder returned malformed output for {} texts", texts.len())));
        }
        Ok(vectors)
    }

    fn record_batch(&self, chunks: &[Chunk]) -> Result<RecordBatch> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embed(&texts)?;
        let dim = self.embedder.dim();
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
            Arc::new(StringArray::from(texts)),
        ];
        for name in ChunkMetadata::FIELD_NAMES {
            columns.push(Arc::new(chunks.iter().map(|c| c.metadata.get(name)).collect::<StringArray>()));
        }
        let vectors: Vec<Option<Vec<Option<f32>>>> =
            vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect())).collect();
        columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
            vectors.into_iter(),
            dim as i32,
        )));
        RecordBatch::try_new(build_chunk_schema(dim), columns).map_err(|e| Error::Operation(e.to_string()))
    }

    async fn merge(&self, batch: RecordBatch, insert_new: bool, update_existing: bool) -> anyhow::Result<()> {
        let t = self.conn.open_table(&self.table_name).execute().await?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let mut mi = t.merge_insert(&["id"]);
        if update_existing {
            mi.when_matched_update_all(None);
        }
        if insert_new {
            mi.when_not_matched_insert_all();
        }
        let _ = mi.execute(reader).await?;
        Ok(())
    }
}

/// Keeps the first chunk for every id.
fn unique_by_id(chunks: &[Chunk]) -> Vec<Chunk> {
    let mut seen = HashSet::new();
    chunks.iter().filter(|c| seen.insert(c.id.as_str())).cloned().collect()
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not utf8"))
}

fn chunks_from_batch(batch: &RecordBatch) -> anyhow::Result<Vec<Chunk>> {
    let ids = string_column(batch, "id")?;
    let texts = string_column(batch, "text")?;
    let meta: Vec<(&str, Option<&StringArray>)> = ChunkMetadata::FIELD_NAMES
        .iter()
        .map(|name| (*name, string_column(batch, name).ok()))
        .collect();
    Ok((0..batch.num_rows())
        .map(|i| {
            let mut metadata = ChunkMetadata::default();
            for (name, col) in &meta {
                if let Some(col) = col.filter(|c| c.is_valid(i)) {
                    metadata.set(name, Some(col.value(i).to_string()));
                }
            }
            Chunk { id: ids.value(i).to_string(), text: texts.value(i).to_string(), metadata }
        })
        .collect())
}

impl VectorStore for LanceVectorStore {
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let q = self
            .embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding("embedder returned no vector".to_string()))?;
        self.run("query", async move {
            let t = self.conn.open_table(&self.table_name).execute().await?;
            if t.count_rows(None).await? == 0 {
                return anyhow::Ok(Vec::new());
            }
            let mut stream = t.vector_search(q)?.distance_type(DistanceType::Cosine).limit(top_k).execute().await?;
            let mut hits = Vec::new();
            while let Some(batch) = stream.try_next().await? {
                let distances = batch
                    .column_by_name("_distance")
                    .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                    .ok_or_else(|| anyhow!("vector search returned no _distance column"))?;
                for (i, chunk) in chunks_from_batch(&batch)?.into_iter().enumerate() {
                    hits.push(QueryHit { chunk, distance: distances.value(i).max(0.0) });
                }
            }
            hits.truncate(top_k);
            anyhow::Ok(hits)
        })
    }

    fn get(&self, ids: Option<&[ChunkId]>, limit: Option<usize>) -> Result<Vec<Chunk>> {
        if ids.is_some_and(<[ChunkId]>::is_empty) || limit == Some(0) {
            return Ok(Vec::new());
        }
        self.run("get", async move {
            let t = self.conn.open_table(&self.table_name).execute().await?;
            let mut q = t.query().select(Select::columns(&projected_columns()));
            if let Some(ids) = ids {
                q = q.only_if(id_predicate(ids));
            }
            if let Some(limit) = limit {
                q = q.limit(limit);
            }
            let mut stream = q.execute().await?;
            let mut out = Vec::new();
            while let Some(batch) = stream.try_next().await? {
                out.extend(chunks_from_batch(&batch)?);
            }
            anyhow::Ok(out)
        })
    }

    fn add(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let batch = self.record_batch(&unique_by_id(chunks))?;
        self.run("add", self.merge(batch, true, false))
    }

    fn update(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let batch = self.record_batch(&unique_by_id(chunks))?;
        self.run("update", self.merge(batch, false, true))
    }

    fn delete(&self, ids: &[ChunkId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.run("delete", async move {
            let t = self.conn.open_table(&self.table_name).execute().await?;
            t.delete(&id_predicate(ids)).await?;
            anyhow::Ok(())
        })
    }

    fn count(&self) -> Result<usize> {
        self.run("count", async move {
            let t = self.conn.open_table(&self.table_name).execute().await?;
            anyhow::Ok(t.count_rows(None).await?)
        })
    }
}
