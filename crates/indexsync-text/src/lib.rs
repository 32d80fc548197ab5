//! indexsync-text
//!
//! Tantivy-backed index store, per-kind entity indexers and the registry that
//! routes domain mutations to them.
pub mod tantivy_utils;
pub mod store;
pub mod indexer;
pub mod registry;
pub mod search;

pub use indexer::EntityIndexer;
pub use registry::IndexerRegistry;
pub use search::TextSearcher;
pub use store::{IndexStore, KindIndex, WriterSession};
