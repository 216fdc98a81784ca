// src/engine/pipeline.rs

//! Synchronous, single-threaded transformer pipeline.
//!
//! The pipeline performs no IO of its own: the caller hands it a graph and a
//! field source, and gets the same graph back annotated or filtered. This
//! keeps it easy to test with hand-built graphs.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::blocks::{BlockGraph, FieldSource};
use crate::errors::Result;
use crate::transformers::{BlockTransformer, TransformContext, UsageInfo};

/// Ordered list of transformers plus an optional fixed clock.
#[derive(Default)]
pub struct TransformerPipeline {
    transformers: Vec<Box<dyn BlockTransformer>>,
    fixed_now: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TransformerPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerPipeline")
            .field("transformers", &self.names())
            .field("fixed_now", &self.fixed_now)
            .finish()
    }
}

impl TransformerPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformer. Transformers run in registration order.
    pub fn with_transformer(mut self, transformer: impl BlockTransformer + 'static) -> Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// Judge every transform pass against `now` instead of the wall clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Collect phase: declare fields, load them, then let every transformer
    /// annotate the graph.
    pub fn collect(&self, graph: &mut BlockGraph, source: &dyn FieldSource) -> Result<()> {
        for t in self.transformers.iter() {
            t.request_fields(graph);
        }
        graph.load_requested_fields(source);

        for t in self.transformers.iter() {
            debug!(transformer = t.name(), "collecting");
            t.collect(graph)?;
        }

        info!(
            blocks = graph.len(),
            transformers = self.transformers.len(),
            "collect phase complete"
        );
        Ok(())
    }

    /// Transform phase for one viewer.
    ///
    /// `now` is captured once here and shared by every transformer.
    pub fn transform(&self, graph: &mut BlockGraph, usage: &UsageInfo) -> Result<()> {
        let now = self.fixed_now.unwrap_or_else(Utc::now);
        let ctx = TransformContext { usage, now };

        for t in self.transformers.iter() {
            debug!(transformer = t.name(), user = %usage.user, %now, "transforming");
            t.transform(&ctx, graph)?;
        }
        Ok(())
    }
}
