//! Walks a local documentation tree and fills the store.
pub mod core;

pub use core::{IndexSummary, Indexer};
