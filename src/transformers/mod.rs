// src/transformers/mod.rs

//! Block transformers.
//!
//! A transformer runs in two phases:
//! - `collect`: once per outline, annotating blocks with derived data;
//! - `transform`: once per viewer, reading that data to filter or decorate
//!   the graph.
//!
//! - [`merged_date`] percolates a date field down the DAG.
//! - [`start_date`] enforces and publishes merged start dates.

pub mod merged_date;
pub mod start_date;

use chrono::{DateTime, Utc};

use crate::blocks::{BlockData, BlockGraph};
use crate::errors::Result;
use crate::types::{BlockKey, CourseKey, TransformerId, UserId};

pub use merged_date::{DateMerge, MergedDateField, collect_merged_date_field};
pub use start_date::{StartDateFieldTransformer, StartDateTransformer};

/// Who the graph is being transformed for.
#[derive(Debug, Clone)]
pub struct UsageInfo {
    pub user: UserId,
    pub course_key: CourseKey,
    /// Staff see everything regardless of dates.
    pub has_staff_access: bool,
    /// Explicit override letting the viewer see unreleased content.
    pub allow_start_dates_in_future: bool,
}

impl UsageInfo {
    pub fn new(user: UserId, course_key: CourseKey) -> Self {
        Self {
            user,
            course_key,
            has_staff_access: false,
            allow_start_dates_in_future: false,
        }
    }
}

/// State shared by every transformer during one transform pass.
#[derive(Debug, Clone)]
pub struct TransformContext<'a> {
    pub usage: &'a UsageInfo,
    /// Captured once per pass so every block is judged against the same
    /// instant.
    pub now: DateTime<Utc>,
}

/// Predicate selecting blocks to remove.
pub type RemovalCondition<'a> = Box<dyn Fn(&BlockKey, &BlockData) -> Result<bool> + 'a>;

/// Filter produced by a filtering transformer.
pub enum BlockFilter<'a> {
    /// Keeps every block.
    Universal,
    /// Removes blocks for which the condition holds.
    Removal(RemovalCondition<'a>),
}

impl std::fmt::Debug for BlockFilter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockFilter::Universal => f.write_str("Universal"),
            BlockFilter::Removal(_) => f.write_str("Removal(..)"),
        }
    }
}

pub trait BlockTransformer {
    /// Unique name; also the namespace of the fields this transformer stores.
    fn name(&self) -> TransformerId;

    /// Declare the content fields `collect` needs loaded.
    fn request_fields(&self, _graph: &mut BlockGraph) {}

    /// Annotate the graph. Runs after requested fields are loaded.
    fn collect(&self, graph: &mut BlockGraph) -> Result<()>;

    /// Apply this transformer for one viewer.
    fn transform(&self, ctx: &TransformContext<'_>, graph: &mut BlockGraph) -> Result<()>;
}

/// Apply filters to the graph. A block is removed if any removal filter
/// selects it.
///
/// Returns the removed keys.
pub fn apply_filters(filters: &[BlockFilter<'_>], graph: &mut BlockGraph) -> Result<Vec<BlockKey>> {
    let conditions: Vec<&RemovalCondition<'_>> = filters
        .iter()
        .filter_map(|f| match f {
            BlockFilter::Universal => None,
            BlockFilter::Removal(cond) => Some(cond),
        })
        .collect();

    if conditions.is_empty() {
        return Ok(Vec::new());
    }

    graph.remove_blocks_matching(|key, data| {
        for cond in conditions.iter() {
            if cond(key, data)? {
                return Ok(true);
            }
        }
        Ok(false)
    })
}
