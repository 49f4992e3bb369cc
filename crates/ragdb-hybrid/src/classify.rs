//! Query classification: list requests, objectives requests, section references.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const LIST_KEYWORDS: &[&str] = &[
    "list",
    "enumerate",
    "show all",
    "every",
    "what are the",
    "give me all",
    "all the",
    "itemize",
    "numbered",
];

pub const OBJECTIVES_KEYWORDS: &[&str] = &["objectives", "objective", "contract objectives", "goals"];

static SECTION_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+").expect("section number regex is valid"));
static SECTION_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)section\s+(\d+\.\d+)").expect("section prefix regex is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryClassification {
    pub is_list: bool,
    pub is_objectives: bool,
    pub section_numbers: BTreeSet<String>,
}

impl QueryClassification {
    pub fn has_sections(&self) -> bool {
        !self.section_numbers.is_empty()
    }
}

fn contains_any(query: &str, keywords: &[&str]) -> bool {
    let lowered = query.to_lowercase();
    keywords.iter().any(|k| lowered.contains(k))
}

pub fn is_list_query(query: &str) -> bool {
    contains_any(query, LIST_KEYWORDS)
}

pub fn is_objectives_query(query: &str) -> bool {
    contains_any(query, OBJECTIVES_KEYWORDS)
}

/// Dotted section numbers mentioned in `query`. Syntactic only: nothing checks
/// that the section exists in any document.
pub fn extract_section_numbers(query: &str) -> BTreeSet<String> {
    let bare = SECTION_NUMBER_RE.find_iter(query).map(|m| m.as_str().to_string());
    let prefixed = SECTION_PREFIX_RE
        .captures_iter(query)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    bare.chain(prefixed).collect()
}

pub fn classify(query: &str) -> QueryClassification {
    QueryClassification {
        is_list: is_list_query(query),
        is_objectives: is_objectives_query(query),
        section_numbers: extract_section_numbers(query),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn list_objectives_and_section_together() {
        let c = classify("List the objectives in section 3.2");
        assert!(c.is_list);
        assert!(c.is_objectives);
        assert_eq!(c.section_numbers, BTreeSet::from(["3.2".to_string()]));
    }

    #[test]
    fn no_digits_means_no_sections() {
        assert!(extract_section_numbers("termination rights of the buyer").is_empty());
        assert!(extract_section_numbers("clause 7").is_empty());
    }

    #[test]
    fn repeated_and_prefixed_numbers_are_deduplicated() {
        let got = extract_section_numbers("Section 11.4 and 11.4, also SECTION 2.10");
        assert_eq!(got, BTreeSet::from(["11.4".to_string(), "2.10".to_string()]));
    }

    #[test]
    fn several_keywords_still_just_true() {
        assert!(is_list_query("list every item, enumerate them"));
        assert!(!is_list_query("payment schedule"));
        assert!(!is_objectives_query("payment schedule"));
    }

    #[test]
    fn empty_query_is_default_classification() {
        assert_eq!(classify(""), QueryClassification::default());
    }

    proptest! {
        #[test]
        fn dotted_number_is_always_extracted(
            prefix in "[a-zA-Z ]{0,20}",
            major in 0u32..1000,
            minor in 0u32..1000,
            suffix in "[a-zA-Z ?]{0,20}",
        ) {
            let number = format!("{major}.{minor}");
            let query = format!("{prefix}{number}{suffix}");
            prop_assert!(extract_section_numbers(&query).contains(&number));
        }

        #[test]
        fn list_keyword_detected_in_any_casing(
            idx in 0..LIST_KEYWORDS.len(),
            mask in proptest::collection::vec(any::<bool>(), 16),
            prefix in "[a-z ]{0,10}",
        ) {
            let keyword: String = LIST_KEYWORDS[idx]
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, upper)| if *upper { c.to_ascii_uppercase() } else { c })
                .collect();
            let query = format!("{prefix}{keyword} please");
            prop_assert!(is_list_query(&query));
        }

        #[test]
        fn queries_without_keywords_are_not_lists(query in "[xyz0-9 .]{0,40}") {
            prop_assert!(!is_list_query(&query));
        }
    }
}
