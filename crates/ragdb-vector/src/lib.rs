//! ragdb-vector
//!
//! `VectorStore` implementations: a persistent LanceDB-backed store and an
//! in-memory linear-scan store.

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceVectorStore;
pub use memory::MemoryVectorStore;
