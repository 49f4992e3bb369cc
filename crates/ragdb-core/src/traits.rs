use crate::error::Result;
use crate::types::{Chunk, ChunkId, QueryHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Collection-like view over persisted chunks.
///
/// Implementations own their embedding model; callers pass plain text.
/// Duplicate ids passed to `add` and unknown ids passed to `update` or
/// `delete` are ignored rather than reported.
pub trait VectorStore: Send + Sync {
    /// Nearest neighbours of `text`, best first, at most `top_k` rows.
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryHit>>;

    /// Chunks by id (all chunks when `ids` is `None`), in storage order.
    fn get(&self, ids: Option<&[ChunkId]>, limit: Option<usize>) -> Result<Vec<Chunk>>;

    fn add(&self, chunks: &[Chunk]) -> Result<()>;

    /// Replaces text and metadata of existing chunks, matched by id.
    fn update(&self, chunks: &[Chunk]) -> Result<()>;

    fn delete(&self, ids: &[ChunkId]) -> Result<()>;

    fn count(&self) -> Result<usize>;
}
