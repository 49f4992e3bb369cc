//! ragdb-core
//!
//! Domain types, store/embedder traits, errors and configuration shared by the
//! vector, embedding and hybrid search crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
