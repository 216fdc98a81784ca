// src/engine/mod.rs

//! Transformer orchestration.
//!
//! [`pipeline::TransformerPipeline`] owns the registered transformers and
//! runs the collect and transform phases over a [`crate::blocks::BlockGraph`].

pub mod pipeline;

pub use pipeline::TransformerPipeline;
