//! Weighted score fusion of the semantic and exact signals.

use std::collections::HashMap;

use crate::result::{assign_ranks, rank_and_truncate, SearchResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub semantic: f32,
    pub exact: f32,
}

impl FusionWeights {
    pub fn new(semantic: f32, exact: f32) -> Self {
        Self { semantic, exact }
    }
}

/// Combines both lists into `w_sem * rel_sem + w_exact * rel_exact` per chunk.
///
/// A chunk found by both signals gets both contributions; one found by a
/// single signal gets only that one. The payload of the first list that saw
/// the chunk is kept. Scores are clamped to 1.0.
pub fn fuse_weighted(
    semantic: Vec<SearchResult>,
    exact: Vec<SearchResult>,
    weights: FusionWeights,
    count: usize,
) -> Vec<SearchResult> {
    let mut fused: Vec<SearchResult> = Vec::with_capacity(semantic.len() + exact.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let weighted = semantic
        .into_iter()
        .map(|r| (weights.semantic, r))
        .chain(exact.into_iter().map(|r| (weights.exact, r)));
    for (weight, result) in weighted {
        let contribution = weight * result.relevance;
        match index.get(&result.id) {
            Some(&i) => fused[i].relevance += contribution,
            None => {
                index.insert(result.id.clone(), fused.len());
                fused.push(SearchResult { relevance: contribution, ..result });
            }
        }
    }
    for r in &mut fused {
        r.relevance = r.relevance.clamp(0.0, 1.0);
    }
    let mut results = rank_and_truncate(fused, count);
    assign_ranks(&mut results);
    results
}
