// src/blocks/mod.rs

//! Block structure: the course-content DAG the transformers run over.
//!
//! - [`graph`] holds the DAG, topological traversal and cascading removal.
//! - [`block_data`] holds per-block content and transformer fields.

pub mod block_data;
pub mod graph;

pub use block_data::BlockData;
pub use graph::BlockGraph;

use crate::types::{BlockKey, FieldValue};

/// Where content fields are loaded from when a graph is collected.
pub trait FieldSource {
    /// Value of `name` on block `key`, or `None` if the block does not set it.
    fn field(&self, key: &BlockKey, name: &str) -> Option<FieldValue>;
}
