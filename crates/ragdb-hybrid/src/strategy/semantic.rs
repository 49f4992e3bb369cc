use crate::result::{assign_ranks, relevance_from_distance, ResultKind, SearchResult};

use super::Strategies;

impl Strategies<'_> {
    /// Nearest neighbours of `query` whose distance is within `threshold`,
    /// in store order.
    pub fn semantic(&mut self, query: &str, count: usize, threshold: f32) -> Vec<SearchResult> {
        if count == 0 {
            return Vec::new();
        }
        let hits = match self.store.query(query, count) {
            Ok(hits) => hits,
            Err(e) => {
                self.record("semantic", &e);
                return Vec::new();
            }
        };
        let fetched = hits.len();
        let mut results: Vec<SearchResult> = hits
            .into_iter()
            .filter(|h| h.distance <= threshold)
            .map(|h| {
                let distance = h.distance.max(0.0);
                SearchResult {
                    id: h.chunk.id,
                    text: h.chunk.text,
                    metadata: Some(h.chunk.metadata),
                    relevance: relevance_from_distance(distance),
                    rank: None,
                    kind: ResultKind::Semantic { distance },
                }
            })
            .collect();
        results.truncate(count);
        assign_ranks(&mut results);
        tracing::debug!(threshold, fetched, kept = results.len(), "semantic search");
        results
    }
}

#[cfg(test)]
mod tests {
    use ragdb_core::types::Chunk;
    use ragdb_embed::HashEmbedder;
    use ragdb_vector::MemoryVectorStore;

    use super::*;
    use crate::result::StrategyTag;

    #[test]
    fn threshold_discards_distant_chunks() {
        let store = MemoryVectorStore::with_chunks(
            Box::new(HashEmbedder::new(1 << 16)),
            &[Chunk::new("near", "late delivery penalties"), Chunk::new("far", "governing law")],
        )
        .unwrap();
        let mut s = Strategies::new(&store);
        let results = s.semantic("late delivery penalties", 5, 0.8);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "near");
        assert_eq!(results[0].tag(), StrategyTag::Semantic);
        assert_eq!(results[0].rank, Some(1));
        assert!(results[0].relevance > 0.99);
        assert!(s.errors().is_empty());
    }
}
