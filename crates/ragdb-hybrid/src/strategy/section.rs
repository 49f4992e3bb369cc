use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use ragdb_core::types::Chunk;

use crate::result::{assign_ranks, ResultKind, ResultPool, SearchResult};

use super::Strategies;

static NUMBERED_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\d+\.|\((?:\d+|[a-zA-Z]|[ivxlcIVXLC]+)\)|(?:\d+|[a-zA-Z])\))[ \t]+\S.*$")
        .expect("numbered item regex is valid")
});

/// Pattern locating `section` in chunk text: the number not embedded in a
/// longer number. It also covers "Section 3.2", "clause 3.2" and
/// "paragraph 3.2", since the word is separated from the number.
fn section_pattern(section: &str) -> Option<Regex> {
    let src = format!(r"(?:^|[^\d.]){}(?:$|\D)", regex::escape(section));
    match Regex::new(&src) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!("skipping section pattern {src}: {e}");
            None
        }
    }
}

/// Lines that look like list entries: `1. ...`, `(a) ...`, `(iv) ...`, `2) ...`.
pub fn numbered_items(text: &str) -> Vec<String> {
    NUMBERED_ITEM_RE.find_iter(text).map(|m| m.as_str().trim().to_string()).collect()
}

/// Chunks mentioning any of `sections`, at full relevance.
///
/// A chunk appears once: the first section number (in sorted order) that
/// matches claims it, and its per-section id is kept in the payload.
pub fn section_matches(chunks: &[Chunk], sections: &BTreeSet<String>, count: usize) -> Vec<SearchResult> {
    let mut pool = ResultPool::new();
    'sections: for section in sections {
        let Some(pattern) = section_pattern(section) else {
            continue;
        };
        for chunk in chunks {
            if pool.len() >= count {
                break 'sections;
            }
            if !pattern.is_match(&chunk.text) {
                continue;
            }
            pool.push(SearchResult {
                id: chunk.id.clone(),
                text: chunk.text.clone(),
                metadata: Some(chunk.metadata.clone()),
                relevance: 1.0,
                rank: None,
                kind: ResultKind::SectionContent {
                    section: section.clone(),
                    synthetic_id: format!("{}#section-{section}", chunk.id),
                    numbered_items: numbered_items(&chunk.text),
                },
            });
        }
    }
    let mut results = pool.into_ranked(count);
    assign_ranks(&mut results);
    results
}

impl Strategies<'_> {
    pub fn section(&mut self, sections: &BTreeSet<String>, count: usize) -> Vec<SearchResult> {
        if sections.is_empty() || count == 0 {
            return Vec::new();
        }
        let chunks = self.scan("section");
        let results = section_matches(&chunks, sections, count);
        tracing::debug!(sections = sections.len(), scanned = chunks.len(), kept = results.len(), "section search");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::StrategyTag;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_number_does_not_match_longer_numbers() {
        let chunks = vec![
            Chunk::new("a", "See 13.2 for fees"),
            Chunk::new("b", "Refer to 3.21 instead"),
            Chunk::new("c", "Clause 3.2 governs delivery."),
            Chunk::new("d", "as set out in 3.2.1 below"),
        ];
        let ids: Vec<String> = section_matches(&chunks, &set(&["3.2"]), 10).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["c", "d"]);
    }

    #[test]
    fn matches_have_zero_pseudo_distance_and_items() {
        let text = "Section 11.4 Deliverables\n1. Source code\n2. Documentation\n(a) user guide\nb) admin guide";
        let results = section_matches(&[Chunk::new("x", text)], &set(&["11.4"]), 5);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.tag(), StrategyTag::SectionContent);
        assert_eq!(r.distance(), 0.0);
        match &r.kind {
            ResultKind::SectionContent { section, synthetic_id, numbered_items } => {
                assert_eq!(section, "11.4");
                assert_eq!(synthetic_id, "x#section-11.4");
                assert_eq!(numbered_items, &["1. Source code", "2. Documentation", "(a) user guide", "b) admin guide"]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn chunk_matching_two_sections_appears_once() {
        let chunks = vec![Chunk::new("x", "Sections 2.1 and 2.2 apply")];
        let results = section_matches(&chunks, &set(&["2.1", "2.2"]), 10);
        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0].kind, ResultKind::SectionContent { section, .. } if section == "2.1"));
    }

    #[test]
    fn prefixed_references_match_in_any_casing() {
        let chunks = vec![
            Chunk::new("p", "as required by Paragraph 4.1"),
            Chunk::new("s", "SECTION 4.1: Warranties"),
            Chunk::new("n", "see section 14.1"),
        ];
        let ids: Vec<String> = section_matches(&chunks, &set(&["4.1"]), 10).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["p", "s"]);
    }

    #[test]
    fn heading_numbers_are_not_list_items() {
        assert!(numbered_items("3.2 Objectives\nThe supplier shall").is_empty());
    }
}
