use std::collections::BTreeSet;

use ragdb_core::types::Chunk;

use crate::result::{assign_ranks, rank_and_truncate, ResultKind, SearchResult};

use super::Strategies;

/// Search terms: explicit section numbers, then every query word longer than
/// two characters. Lowercased, punctuation-trimmed, deduplicated in order.
pub fn exact_terms(query: &str, sections: &BTreeSet<String>) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let words = query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.chars().count() > 2);
    for term in sections.iter().map(|s| s.to_lowercase()).chain(words) {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Scores every chunk by the fraction of `terms` it contains literally.
/// Chunks matching no term are dropped.
pub fn score_exact(chunks: Vec<Chunk>, terms: &[String], count: usize) -> Vec<SearchResult> {
    if terms.is_empty() {
        return Vec::new();
    }
    let total = terms.len() as f32;
    let scored: Vec<SearchResult> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let lowered = chunk.text.to_lowercase();
            let matched: Vec<String> = terms.iter().filter(|t| lowered.contains(t.as_str())).cloned().collect();
            if matched.is_empty() {
                return None;
            }
            Some(SearchResult {
                id: chunk.id,
                text: chunk.text,
                metadata: Some(chunk.metadata),
                relevance: matched.len() as f32 / total,
                rank: None,
                kind: ResultKind::Exact { matched_terms: matched },
            })
        })
        .collect();
    let mut results = rank_and_truncate(scored, count);
    assign_ranks(&mut results);
    results
}

impl Strategies<'_> {
    /// Literal term matching over a full collection scan.
    pub fn exact(&mut self, query: &str, sections: &BTreeSet<String>, count: usize) -> Vec<SearchResult> {
        let terms = exact_terms(query, sections);
        if terms.is_empty() || count == 0 {
            return Vec::new();
        }
        let chunks = self.scan("exact");
        let scanned = chunks.len();
        let results = score_exact(chunks, &terms, count);
        tracing::debug!(terms = terms.len(), scanned, kept = results.len(), "exact search");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_include_sections_and_long_words() {
        let sections = BTreeSet::from(["3.2".to_string()]);
        let terms = exact_terms("What is in Section 3.2? An SLA", &sections);
        assert_eq!(terms, ["3.2", "what", "section", "sla"]);
    }

    #[test]
    fn score_is_fraction_of_matched_terms() {
        let chunks = vec![
            Chunk::new("both", "Late payment interest applies"),
            Chunk::new("one", "Payment by wire transfer"),
            Chunk::new("none", "Confidentiality"),
        ];
        let terms = vec!["late".to_string(), "payment".to_string()];
        let results = score_exact(chunks, &terms, 10);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "both");
        assert_eq!(results[0].relevance, 1.0);
        assert_eq!(results[0].distance(), 0.0);
        assert_eq!(results[1].relevance, 0.5);
        assert_eq!(results[1].rank, Some(2));
    }

    #[test]
    fn no_terms_no_results() {
        assert!(score_exact(vec![Chunk::new("a", "anything")], &[], 5).is_empty());
        assert!(exact_terms("a an of", &BTreeSet::new()).is_empty());
    }
}
