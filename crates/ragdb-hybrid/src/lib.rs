//! Hybrid retrieval over contract and legal document chunks.
//!
//! Queries are classified (list request, objectives request, referenced
//! section numbers) and routed to a fixed priority of strategies: semantic
//! search, exact term matching, section-targeted regex matching, expanded
//! list queries and an objectives clause scan. Each branch has a single
//! fallback, and the engine always returns a list.

pub mod classify;
pub mod engine;
pub mod fusion;
pub mod repair;
pub mod result;
pub mod strategy;

pub use classify::{classify, QueryClassification};
pub use engine::{Branch, HybridSearchEngine, SearchReport};
pub use fusion::{fuse_weighted, FusionWeights};
pub use result::{ResultKind, SearchResult, StrategyTag};
pub use strategy::{StrategyError, Strategies};
