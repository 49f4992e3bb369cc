use std::sync::LazyLock;

use regex::Regex;

use ragdb_core::types::Chunk;

use crate::result::{assign_ranks, rank_and_truncate, ResultKind, ResultPool, SearchResult};

use super::Strategies;

/// Objectives clause patterns, strongest first. A chunk's relevance drops by
/// 0.1 for each pattern ahead of the first one it matches.
const OBJECTIVES_PATTERNS: [&str; 4] = [
    r"(?i)\bobjectives?\s*[:\-]",
    r"(?i)\bthe\s+objectives?\s+of\b",
    r"(?i)\bcontract\s+objectives?\b",
    r"(?i)\baims?\s+and\s+objectives?\b",
];

/// Generic objectives queries tried when no chunk matches a pattern.
pub const OBJECTIVES_BATTERY: [&str; 5] = [
    "contract objectives",
    "objectives of the agreement",
    "purpose and objectives",
    "goals of the contract",
    "scope and objectives",
];

static OBJECTIVES_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    OBJECTIVES_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("objectives regex is valid"))
        .collect()
});

/// Chunks containing an objectives clause, best pattern first.
pub fn match_objectives(chunks: Vec<Chunk>, count: usize) -> Vec<SearchResult> {
    let matched: Vec<SearchResult> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let idx = OBJECTIVES_RES.iter().position(|re| re.is_match(&chunk.text))?;
            Some(SearchResult {
                id: chunk.id,
                text: chunk.text,
                metadata: Some(chunk.metadata),
                relevance: 1.0 - 0.1 * idx as f32,
                rank: None,
                kind: ResultKind::ObjectivesContent { pattern: OBJECTIVES_PATTERNS[idx].to_string() },
            })
        })
        .collect();
    let mut results = rank_and_truncate(matched, count);
    assign_ranks(&mut results);
    results
}

impl Strategies<'_> {
    pub fn objectives_scan(&mut self, count: usize) -> Vec<SearchResult> {
        if count == 0 {
            return Vec::new();
        }
        let chunks = self.scan("objectives");
        let results = match_objectives(chunks, count);
        tracing::debug!(kept = results.len(), "objectives scan");
        results
    }

    /// The fixed objectives query battery through semantic search, pooled.
    pub fn objectives_battery(&mut self, count: usize, threshold: f32) -> Vec<SearchResult> {
        let mut pool = ResultPool::new();
        for query in OBJECTIVES_BATTERY {
            pool.extend(self.semantic(query, count, threshold));
        }
        pool.into_ranked(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stronger_patterns_rank_first() {
        let chunks = vec![
            Chunk::new("weak", "The aims and objectives are set by the board"),
            Chunk::new("none", "Payment terms"),
            Chunk::new("strong", "Objectives: deliver the platform on time"),
        ];
        let results = match_objectives(chunks, 10);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["strong", "weak"]);
        assert_eq!(results[0].relevance, 1.0);
        assert!((results[1].relevance - 0.7).abs() < 1e-6);
    }
}
