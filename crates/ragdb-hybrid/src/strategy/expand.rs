use std::collections::BTreeSet;

use crate::result::{ResultKind, ResultPool, SearchResult};

use super::Strategies;

const SECTION_TEMPLATES: [&str; 6] = [
    "Section {n} objectives",
    "Section {n} list",
    "Section {n} numbered",
    "Section {n} items",
    "Clause {n} objectives",
    "Clause {n} list",
];

const GENERAL_EXPANSIONS: [&str; 5] = ["numbered list", "objectives list", "complete list", "all items", "enumerate"];

/// A secondary query derived from the user's query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub query: String,
    pub section: Option<String>,
}

/// Per-section templates for every section, then the general enumeration
/// queries. Deterministic for a given input.
pub fn expand_queries(sections: &BTreeSet<String>) -> Vec<Expansion> {
    let mut out = Vec::new();
    for n in sections {
        out.extend(SECTION_TEMPLATES.iter().map(|t| Expansion { query: t.replace("{n}", n), section: Some(n.clone()) }));
    }
    out.extend(general_expansions(GENERAL_EXPANSIONS.len()));
    out
}

/// The first `n` general enumeration queries.
pub fn general_expansions(n: usize) -> Vec<Expansion> {
    GENERAL_EXPANSIONS.iter().take(n).map(|q| Expansion { query: (*q).to_string(), section: None }).collect()
}

impl Strategies<'_> {
    /// Runs each expansion through semantic search and pools the results,
    /// first expansion first.
    pub fn expanded_semantic(&mut self, expansions: &[Expansion], count: usize, threshold: f32) -> Vec<SearchResult> {
        let mut pool = ResultPool::new();
        for expansion in expansions {
            let hits = self.semantic(&expansion.query, count, threshold);
            pool.extend(hits.into_iter().map(|r| SearchResult {
                kind: ResultKind::ReconstructedSection {
                    section: expansion.section.clone(),
                    expansion: expansion.query.clone(),
                },
                ..r
            }));
        }
        tracing::debug!(expansions = expansions.len(), pooled = pool.len(), "expanded semantic search");
        pool.into_ranked(count)
    }

    /// Section-targeted matches followed by the full expansion pool.
    pub fn list_enhanced(&mut self, sections: &BTreeSet<String>, count: usize, threshold: f32) -> Vec<SearchResult> {
        let mut pool = ResultPool::new();
        pool.extend(self.section(sections, count));
        let expansions = expand_queries(sections);
        pool.extend(self.expanded_semantic(&expansions, count, threshold));
        pool.into_ranked(count)
    }
}
