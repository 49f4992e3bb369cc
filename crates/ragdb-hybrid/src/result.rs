//! Search results, strategy tags and first-seen-wins pooling.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use ragdb_core::types::{ChunkId, ChunkMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    Semantic,
    Exact,
    SectionContent,
    ObjectivesContent,
    ReconstructedSection,
}

impl StrategyTag {
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyTag::Semantic => "semantic",
            StrategyTag::Exact => "exact",
            StrategyTag::SectionContent => "section_content",
            StrategyTag::ObjectivesContent => "objectives_content",
            StrategyTag::ReconstructedSection => "reconstructed_section",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy-specific payload of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResultKind {
    Semantic {
        distance: f32,
    },
    Exact {
        matched_terms: Vec<String>,
    },
    SectionContent {
        section: String,
        /// Per-section identifier `"{chunk_id}#section-{n}"`.
        synthetic_id: String,
        numbered_items: Vec<String>,
    },
    ObjectivesContent {
        pattern: String,
    },
    ReconstructedSection {
        section: Option<String>,
        expansion: String,
    },
}

impl ResultKind {
    pub fn tag(&self) -> StrategyTag {
        match self {
            ResultKind::Semantic { .. } => StrategyTag::Semantic,
            ResultKind::Exact { .. } => StrategyTag::Exact,
            ResultKind::SectionContent { .. } => StrategyTag::SectionContent,
            ResultKind::ObjectivesContent { .. } => StrategyTag::ObjectivesContent,
            ResultKind::ReconstructedSection { .. } => StrategyTag::ReconstructedSection,
        }
    }
}

/// One retrieved chunk. `relevance` is in [0, 1], higher is better.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: ChunkId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChunkMetadata>,
    pub relevance: f32,
    /// 1-based position within the producing strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(flatten)]
    pub kind: ResultKind,
}

impl SearchResult {
    pub fn tag(&self) -> StrategyTag {
        self.kind.tag()
    }

    /// Pseudo-distance `1 - relevance`, comparable with store distances.
    pub fn distance(&self) -> f32 {
        1.0 - self.relevance
    }
}

/// Store distance to relevance. Applied once, at the strategy boundary.
pub fn relevance_from_distance(distance: f32) -> f32 {
    (1.0 - distance.max(0.0)).clamp(0.0, 1.0)
}

/// Sorts best first (stable, so ties keep production order) and truncates.
pub fn rank_and_truncate(mut results: Vec<SearchResult>, count: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    results.truncate(count);
    results
}

/// Numbers results `1..` in their current order.
pub(crate) fn assign_ranks(results: &mut [SearchResult]) {
    for (i, r) in results.iter_mut().enumerate() {
        r.rank = Some(i + 1);
    }
}

/// Accumulates results across strategies; the first result seen for a chunk
/// id wins and later duplicates are dropped whatever their score.
#[derive(Debug, Default)]
pub struct ResultPool {
    seen: HashSet<ChunkId>,
    results: Vec<SearchResult>,
}

impl ResultPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the id was already pooled.
    pub fn push(&mut self, result: SearchResult) -> bool {
        if !self.seen.insert(result.id.clone()) {
            return false;
        }
        self.results.push(result);
        true
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_ranked(self, count: usize) -> Vec<SearchResult> {
        rank_and_truncate(self.results, count)
    }
}

impl Extend<SearchResult> for ResultPool {
    fn extend<I: IntoIterator<Item = SearchResult>>(&mut self, iter: I) {
        for r in iter {
            self.push(r);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn semantic(id: &str, relevance: f32) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            text: format!("text of {id}"),
            metadata: None,
            relevance,
            rank: None,
            kind: ResultKind::Semantic { distance: 1.0 - relevance },
        }
    }

    pub(crate) fn exact(id: &str, relevance: f32) -> SearchResult {
        SearchResult { kind: ResultKind::Exact { matched_terms: vec!["term".to_string()] }, ..semantic(id, relevance) }
    }

    #[test]
    fn pool_keeps_first_seen_even_if_later_scores_higher() {
        let mut pool = ResultPool::new();
        assert!(pool.push(semantic("a", 0.2)));
        assert!(!pool.push(exact("a", 0.9)));
        pool.extend([semantic("b", 0.5), semantic("b", 0.6)]);
        let ranked = pool.into_ranked(10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "b");
        assert_eq!(ranked[0].relevance, 0.5);
        assert_eq!(ranked[1].tag(), StrategyTag::Semantic);
    }

    #[test]
    fn ranking_is_stable_for_ties_and_truncates() {
        let ranked = rank_and_truncate(vec![semantic("x", 0.4), semantic("y", 0.9), semantic("z", 0.4)], 2);
        let ids: Vec<&str> = ranked.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["y", "x"]);
    }

    #[test]
    fn distance_conversion_is_clamped() {
        assert_eq!(relevance_from_distance(0.25), 0.75);
        assert_eq!(relevance_from_distance(-0.1), 1.0);
        assert_eq!(relevance_from_distance(1.7), 0.0);
    }

    #[test]
    fn serialized_result_carries_strategy_tag() {
        let json = serde_json::to_value(exact("a", 0.5)).unwrap();
        assert_eq!(json["strategy"], "exact");
        assert_eq!(json["id"], "a");
        assert!(json.get("metadata").is_none());
    }
}
