//! Branch selection and fallback sequencing over the retrieval strategies.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use ragdb_core::config::SearchSettings;
use ragdb_core::error::Result;
use ragdb_core::traits::VectorStore;

use crate::classify::{classify, QueryClassification};
use crate::fusion::{fuse_weighted, FusionWeights};
use crate::result::SearchResult;
use crate::strategy::{general_expansions, StrategyError, Strategies};

/// Number of general expansions a plain list query runs.
const LIST_EXPANSIONS: usize = 3;

/// Strategy family chosen for a query, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    ListWithSections,
    ObjectivesWithoutSections,
    Sections,
    List,
    Default,
}

impl Branch {
    pub fn select(c: &QueryClassification) -> Self {
        match (c.is_list, c.is_objectives, c.has_sections()) {
            (true, _, true) => Branch::ListWithSections,
            (_, true, false) => Branch::ObjectivesWithoutSections,
            (_, _, true) => Branch::Sections,
            (true, _, false) => Branch::List,
            _ => Branch::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Branch::ListWithSections => "list_with_sections",
            Branch::ObjectivesWithoutSections => "objectives_without_sections",
            Branch::Sections => "sections",
            Branch::List => "list",
            Branch::Default => "default",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened while answering one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub classification: QueryClassification,
    pub branch: Branch,
    pub fallback_used: bool,
    pub errors: Vec<StrategyError>,
}

pub struct HybridSearchEngine {
    store: Arc<dyn VectorStore>,
    settings: SearchSettings,
}

impl HybridSearchEngine {
    pub fn new(store: Arc<dyn VectorStore>, settings: SearchSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { store, settings })
    }

    pub fn with_defaults(store: Arc<dyn VectorStore>) -> Self {
        Self { store, settings: SearchSettings::default() }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Best `count` chunks for `query`. Never fails: store errors degrade to
    /// fewer (or no) results.
    pub fn search(&self, query: &str, count: usize) -> Vec<SearchResult> {
        self.search_with_report(query, count).0
    }

    pub fn search_with_report(&self, query: &str, count: usize) -> (Vec<SearchResult>, SearchReport) {
        let classification = classify(query);
        let branch = Branch::select(&classification);
        tracing::debug!(%branch, ?classification, count, "hybrid search");

        let mut strategies = Strategies::new(self.store.as_ref());
        let (results, fallback_used) = if count == 0 {
            (Vec::new(), false)
        } else {
            self.run_branch(&mut strategies, branch, query, &classification, count)
        };
        if fallback_used {
            tracing::debug!(%branch, kept = results.len(), "fallback strategy used");
        }

        let report = SearchReport {
            query: query.to_string(),
            classification,
            branch,
            fallback_used,
            errors: strategies.into_errors(),
        };
        (results, report)
    }

    /// Weighted fusion of semantic and exact search using the configured
    /// `semantic_weight`/`exact_weight`.
    pub fn hybrid_search(&self, query: &str, count: usize) -> Vec<SearchResult> {
        self.hybrid_search_with_weights(query, count, self.settings.semantic_weight, self.settings.exact_weight)
    }

    pub fn hybrid_search_with_weights(
        &self,
        query: &str,
        count: usize,
        semantic_weight: f32,
        exact_weight: f32,
    ) -> Vec<SearchResult> {
        let sections = classify(query).section_numbers;
        let mut strategies = Strategies::new(self.store.as_ref());
        self.fused(&mut strategies, query, &sections, count, FusionWeights::new(semantic_weight, exact_weight))
    }

    fn run_branch(
        &self,
        s: &mut Strategies<'_>,
        branch: Branch,
        query: &str,
        c: &QueryClassification,
        count: usize,
    ) -> (Vec<SearchResult>, bool) {
        let strict = self.settings.distance_threshold;
        let relaxed = self.settings.relaxed_threshold;
        let section_weights = FusionWeights::new(self.settings.section_semantic_weight, self.settings.section_exact_weight);

        let primary = match branch {
            Branch::ListWithSections => s.list_enhanced(&c.section_numbers, count, relaxed),
            Branch::ObjectivesWithoutSections => s.objectives_scan(count),
            Branch::Sections => s.exact(query, &c.section_numbers, count),
            Branch::List => s.expanded_semantic(&general_expansions(LIST_EXPANSIONS), count, relaxed),
            Branch::Default => s.semantic(query, count, strict),
        };
        if !primary.is_empty() {
            return (primary, false);
        }

        let fallback = match branch {
            Branch::ListWithSections | Branch::Sections => {
                self.fused(s, query, &c.section_numbers, count, section_weights)
            }
            Branch::ObjectivesWithoutSections => s.objectives_battery(count, relaxed),
            Branch::Default => s.semantic(query, count, relaxed),
            Branch::List => return (primary, false),
        };
        (fallback, true)
    }

    fn fused(
        &self,
        s: &mut Strategies<'_>,
        query: &str,
        sections: &BTreeSet<String>,
        count: usize,
        weights: FusionWeights,
    ) -> Vec<SearchResult> {
        if count == 0 {
            return Vec::new();
        }
        let fetch = count.saturating_mul(self.settings.overfetch);
        let semantic = s.semantic(query, fetch, self.settings.distance_threshold);
        let exact = s.exact(query, sections, fetch);
        fuse_weighted(semantic, exact, weights, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    #[test]
    fn branch_priority() {
        assert_eq!(Branch::select(&classify("List the objectives in section 3.2")), Branch::ListWithSections);
        assert_eq!(Branch::select(&classify("what are the contract objectives")), Branch::ObjectivesWithoutSections);
        assert_eq!(Branch::select(&classify("objectives of 4.1")), Branch::Sections);
        assert_eq!(Branch::select(&classify("Section 11.4")), Branch::Sections);
        assert_eq!(Branch::select(&classify("enumerate the deliverables")), Branch::List);
        assert_eq!(Branch::select(&classify("banana")), Branch::Default);
        assert_eq!(Branch::select(&classify("")), Branch::Default);
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HybridSearchEngine>();
    }
}
