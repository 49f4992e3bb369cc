//! Brute-force cosine store kept entirely in memory.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use ragdb_core::error::{Error, Result};
use ragdb_core::traits::{Embedder, VectorStore};
use ragdb_core::types::{Chunk, ChunkId, QueryHit};

struct Row {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Linear-scan store for tests and small corpora. Rows keep insertion order.
pub struct MemoryVectorStore {
    embedder: Box<dyn Embedder>,
    rows: RwLock<Vec<Row>>,
}

impl MemoryVectorStore {
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        Self { embedder, rows: RwLock::new(Vec::new()) }
    }

    pub fn with_chunks(embedder: Box<dyn Embedder>, chunks: &[Chunk]) -> Result<Self> {
        let store = Self::new(embedder);
        store.add(chunks)?;
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Row>>> {
        self.rows.read().map_err(|_| Error::Operation("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Row>>> {
        self.rows.write().map_err(|_| Error::Operation("memory store lock poisoned".to_string()))
    }

    fn embed(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        self.embedder.embed_batch(&texts).map_err(|e| Error::Embedding(format!("{e:#}")))
    }
}

/// `1 - cos(a, b)`, with zero vectors treated as unrelated.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (na * nb)).max(0.0)
}

impl VectorStore for MemoryVectorStore {
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>> {
        let q = self
            .embedder
            .embed_batch(&[text.to_string()])
            .map_err(|e| Error::Embedding(format!("{e:#}")))?
            .pop()
            .ok_or_else(|| Error::Embedding("embedder returned no vector".to_string()))?;
        let rows = self.read()?;
        let mut scored: Vec<(f32, &Row)> = rows.iter().map(|r| (cosine_distance(&q, &r.vector), r)).collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(distance, r)| QueryHit { chunk: r.chunk.clone(), distance })
            .collect())
    }

    fn get(&self, ids: Option<&[ChunkId]>, limit: Option<usize>) -> Result<Vec<Chunk>> {
        let rows = self.read()?;
        let wanted: Option<HashSet<&str>> = ids.map(|ids| ids.iter().map(String::as_str).collect());
        Ok(rows
            .iter()
            .filter(|r| wanted.as_ref().map_or(true, |w| w.contains(r.chunk.id.as_str())))
            .take(limit.unwrap_or(usize::MAX))
            .map(|r| r.chunk.clone())
            .collect())
    }

    fn add(&self, chunks: &[Chunk]) -> Result<()> {
        let vectors = self.embed(chunks)?;
        let mut rows = self.write()?;
        let mut seen: HashSet<ChunkId> = rows.iter().map(|r| r.chunk.id.clone()).collect();
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if !seen.insert(chunk.id.clone()) {
                tracing::debug!("ignoring duplicate chunk id {}", chunk.id);
                continue;
            }
            rows.push(Row { chunk: chunk.clone(), vector });
        }
        Ok(())
    }

    fn update(&self, chunks: &[Chunk]) -> Result<()> {
        let vectors = self.embed(chunks)?;
        let mut rows = self.write()?;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            if let Some(row) = rows.iter_mut().find(|r| r.chunk.id == chunk.id) {
                row.chunk = chunk.clone();
                row.vector = vector;
            }
        }
        Ok(())
    }

    fn delete(&self, ids: &[ChunkId]) -> Result<()> {
        let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.write()?.retain(|r| !doomed.contains(r.chunk.id.as_str()));
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdb_embed::HashEmbedder;

    fn store() -> MemoryVectorStore {
        let chunks = vec![
            Chunk::new("a", "termination for convenience"),
            Chunk::new("b", "payment terms and invoicing"),
            Chunk::new("c", "termination for cause"),
        ];
        MemoryVectorStore::with_chunks(Box::new(HashEmbedder::new(1 << 16)), &chunks).unwrap()
    }

    #[test]
    fn query_orders_by_distance() {
        let hits = store().query("termination for convenience", 3).unwrap();
        assert_eq!(hits[0].chunk.id, "a");
        assert!(hits[0].distance < 1e-5);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(hits.iter().all(|h| h.distance >= 0.0));
    }

    #[test]
    fn duplicate_ids_are_ignored_on_add() {
        let s = store();
        s.add(&[Chunk::new("a", "replacement text")]).unwrap();
        assert_eq!(s.count().unwrap(), 3);
        assert_eq!(s.get(Some(&["a".to_string()]), None).unwrap()[0].text, "termination for convenience");
    }

    #[test]
    fn update_and_delete_by_id() {
        let s = store();
        s.update(&[Chunk::new("b", "payment schedule"), Chunk::new("zz", "unknown")]).unwrap();
        assert_eq!(s.count().unwrap(), 3);
        assert_eq!(s.get(Some(&["b".to_string()]), None).unwrap()[0].text, "payment schedule");
        s.delete(&["a".to_string(), "c".to_string()]).unwrap();
        let left = s.get(None, None).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "b");
    }

    #[test]
    fn get_respects_limit_and_order() {
        let ids: Vec<String> = store().get(None, Some(2)).unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn empty_store_returns_nothing() {
        let s = MemoryVectorStore::new(Box::new(HashEmbedder::new(8)));
        assert!(s.query("anything", 5).unwrap().is_empty());
        assert!(s.get(None, None).unwrap().is_empty());
    }
}
