// src/transformers/start_date.rs

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::access::AccessPolicy;
use crate::blocks::{BlockData, BlockGraph};
use crate::config::model::DEFAULT_START_DATE;
use crate::errors::Result;
use crate::transformers::merged_date::{DateMerge, MergedDateField, collect_merged_date_field};
use crate::transformers::{BlockFilter, BlockTransformer, TransformContext, apply_filters};
use crate::types::{BlockKey, FieldValue, TransformerId};

pub const START: &str = "start";
pub const DAYS_EARLY_FOR_BETA: &str = "days_early_for_beta";
pub const MERGED_START_DATE: &str = "merged_start_date";

fn merged_start_field(owner: TransformerId, default_date: DateTime<Utc>) -> MergedDateField {
    MergedDateField {
        owner,
        field_name: START,
        merged_field_name: MERGED_START_DATE,
        default_date,
        // One released placement is enough to make shared content visible,
        // but a block never opens before its own start date.
        merge_parents: DateMerge::Min,
        merge_ancestors: DateMerge::Max,
    }
}

/// Removes blocks whose merged start date has not passed for the viewer.
///
/// A block's `start` is percolated down to its descendants: the effective
/// start of a block is the later of its own start and the earliest merged
/// start among its parents. Roots without a start use the default start.
///
/// Staff and viewers allowed to see future dates bypass the check.
pub struct StartDateTransformer {
    policy: Box<dyn AccessPolicy>,
    default_start: DateTime<Utc>,
}

impl StartDateTransformer {
    pub const NAME: TransformerId = "start_date";

    pub fn new(policy: Box<dyn AccessPolicy>) -> Self {
        Self {
            policy,
            default_start: DEFAULT_START_DATE,
        }
    }

    /// Start date assumed for blocks without one.
    pub fn with_default_start(mut self, default_start: DateTime<Utc>) -> Self {
        self.default_start = default_start;
        self
    }

    /// Merged start date collected for `key`, if any.
    pub fn merged_start_date(graph: &BlockGraph, key: &BlockKey) -> Option<DateTime<Utc>> {
        graph
            .get_transformer_field(key, Self::NAME, MERGED_START_DATE)
            .and_then(FieldValue::as_date)
    }

    /// Filters for one viewer.
    pub fn block_filters<'a>(&'a self, ctx: &'a TransformContext<'a>) -> Vec<BlockFilter<'a>> {
        let usage = ctx.usage;
        if usage.has_staff_access || usage.allow_start_dates_in_future {
            debug!(user = %usage.user, "start date check bypassed");
            return vec![BlockFilter::Universal];
        }

        let now = ctx.now;
        let condition = move |key: &BlockKey, data: &BlockData| -> Result<bool> {
            let Some(start) = data
                .transformer_field(Self::NAME, MERGED_START_DATE)
                .and_then(FieldValue::as_date)
            else {
                // Nothing collected: no date to enforce.
                return Ok(false);
            };
            let days_early = data.field(DAYS_EARLY_FOR_BETA).and_then(FieldValue::as_int);
            let visible = self.policy.check_start_date(
                &usage.user,
                days_early,
                start,
                &usage.course_key,
                now,
            )?;
            if !visible {
                debug!(block = %key, %start, "block not yet started; removing");
            }
            Ok(!visible)
        };
        vec![BlockFilter::Removal(Box::new(condition))]
    }
}

impl BlockTransformer for StartDateTransformer {
    fn name(&self) -> TransformerId {
        Self::NAME
    }

    fn request_fields(&self, graph: &mut BlockGraph) {
        graph.request_field(START);
        graph.request_field(DAYS_EARLY_FOR_BETA);
    }

    fn collect(&self, graph: &mut BlockGraph) -> Result<()> {
        collect_merged_date_field(graph, &merged_start_field(Self::NAME, self.default_start))
    }

    fn transform(&self, ctx: &TransformContext<'_>, graph: &mut BlockGraph) -> Result<()> {
        let filters = self.block_filters(ctx);
        let removed = apply_filters(&filters, graph)?;
        info!(
            user = %ctx.usage.user,
            removed = removed.len(),
            remaining = graph.len(),
            "start date filter applied"
        );
        Ok(())
    }
}

/// Publishes each block's merged start date as its `start` field, for
/// consumers that display the date rather than filter on it.
#[derive(Debug, Clone)]
pub struct StartDateFieldTransformer {
    default_start: DateTime<Utc>,
}

impl Default for StartDateFieldTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl StartDateFieldTransformer {
    pub const NAME: TransformerId = "start_date_field";

    pub fn new() -> Self {
        Self {
            default_start: DEFAULT_START_DATE,
        }
    }

    pub fn with_default_start(mut self, default_start: DateTime<Utc>) -> Self {
        self.default_start = default_start;
        self
    }

    /// Published start date of `key`; set by `transform`.
    pub fn start(graph: &BlockGraph, key: &BlockKey) -> Option<DateTime<Utc>> {
        graph
            .get_transformer_field(key, Self::NAME, START)
            .and_then(FieldValue::as_date)
    }
}

impl BlockTransformer for StartDateFieldTransformer {
    fn name(&self) -> TransformerId {
        Self::NAME
    }

    fn request_fields(&self, graph: &mut BlockGraph) {
        graph.request_field(START);
    }

    fn collect(&self, graph: &mut BlockGraph) -> Result<()> {
        collect_merged_date_field(graph, &merged_start_field(Self::NAME, self.default_start))
    }

    fn transform(&self, _ctx: &TransformContext<'_>, graph: &mut BlockGraph) -> Result<()> {
        for key in graph.topological_order()? {
            let merged = graph
                .get_transformer_field(&key, Self::NAME, MERGED_START_DATE)
                .cloned();
            if let Some(value) = merged {
                graph.set_transformer_field(&key, Self::NAME, START, value)?;
            }
        }
        Ok(())
    }
}
