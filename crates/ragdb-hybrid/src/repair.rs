//! Backfills missing section metadata from a chunk's leading heading.
//!
//! Chunkers do not always record `section_number`/`section_title`; a heading
//! like `3.2 Objectives` or `Section 11.4 - Deliverables` on the first line is
//! enough to recover both.

use std::sync::LazyLock;

use regex::Regex;

use ragdb_core::types::Chunk;

const MAX_TITLE_CHARS: usize = 120;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:section|clause|article)\s+)?(\d+(?:\.\d+)+)\.?(?:(?:\s*[-:\u{2013}]\s*|\s+)(\S.*))?$")
        .expect("heading regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub number: String,
    pub title: Option<String>,
}

/// Section number and title from the first non-empty line of `text`.
pub fn infer_heading(text: &str) -> Option<Heading> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let caps = HEADING_RE.captures(line)?;
    let number = caps.get(1)?.as_str().to_string();
    let title = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty() && t.chars().count() <= MAX_TITLE_CHARS)
        .map(str::to_string);
    Some(Heading { number, title })
}

/// Fills the missing section fields of `chunk`. Existing values are never
/// overwritten. Returns `true` when something changed.
pub fn repair_chunk(chunk: &mut Chunk) -> bool {
    let Some(heading) = infer_heading(&chunk.text) else {
        return false;
    };
    let meta = &mut chunk.metadata;
    let mut changed = false;
    if meta.section_number.is_none() {
        meta.section_number = Some(heading.number);
        changed = true;
    }
    if meta.section_title.is_none() && heading.title.is_some() {
        meta.section_title = heading.title;
        changed = true;
    }
    changed
}

/// Repaired copies of the chunks that need an update.
pub fn plan_repairs(chunks: &[Chunk]) -> Vec<Chunk> {
    chunks
        .iter()
        .filter_map(|c| {
            let mut repaired = c.clone();
            repair_chunk(&mut repaired).then_some(repaired)
        })
        .collect()
}
