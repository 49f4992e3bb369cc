//! Retrieval strategies.
//!
//! Each strategy reads from the injected store and returns a ranked,
//! truncated result list. Store failures never escape: they are logged,
//! recorded on the runner and turned into an empty list.

mod exact;
mod expand;
mod objectives;
mod section;
mod semantic;

pub use exact::{exact_terms, score_exact};
pub use expand::{expand_queries, general_expansions, Expansion};
pub use objectives::{match_objectives, OBJECTIVES_BATTERY};
pub use section::{numbered_items, section_matches};

use serde::Serialize;

use ragdb_core::error::Error;
use ragdb_core::traits::VectorStore;
use ragdb_core::types::Chunk;

/// A swallowed store failure, kept for the operator-facing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyError {
    pub strategy: &'static str,
    pub message: String,
}

/// Request-scoped view over the store that records strategy failures.
pub struct Strategies<'a> {
    store: &'a dyn VectorStore,
    errors: Vec<StrategyError>,
}

impl<'a> Strategies<'a> {
    pub fn new(store: &'a dyn VectorStore) -> Self {
        Self { store, errors: Vec::new() }
    }

    pub fn errors(&self) -> &[StrategyError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<StrategyError> {
        self.errors
    }

    fn record(&mut self, strategy: &'static str, err: &Error) {
        tracing::warn!(strategy, "vector store call failed, treating as no results: {err}");
        self.errors.push(StrategyError { strategy, message: err.to_string() });
    }

    /// Every chunk in the collection, or nothing if the store fails.
    fn scan(&mut self, strategy: &'static str) -> Vec<Chunk> {
        match self.store.get(None, None) {
            Ok(chunks) => chunks,
            Err(e) => {
                self.record(strategy, &e);
                Vec::new()
            }
        }
    }
}
