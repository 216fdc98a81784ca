// src/transformers/merged_date.rs

//! Percolating a date field down the block graph.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::blocks::BlockGraph;
use crate::errors::Result;
use crate::types::{FieldValue, TransformerId};

/// Binary reduction used when combining dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateMerge {
    Min,
    Max,
}

impl DateMerge {
    pub fn apply(self, a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateMerge::Min => a.min(b),
            DateMerge::Max => a.max(b),
        }
    }
}

/// Describes one merged date field computed by [`collect_merged_date_field`].
#[derive(Debug, Clone, Copy)]
pub struct MergedDateField {
    /// Transformer that owns the merged value.
    pub owner: TransformerId,
    /// Content field holding each block's own date.
    pub field_name: &'static str,
    /// Transformer field the merged date is stored under.
    pub merged_field_name: &'static str,
    /// Used for root blocks that do not set `field_name`.
    pub default_date: DateTime<Utc>,
    /// Reduces the merged dates of a block's parents.
    pub merge_parents: DateMerge,
    /// Combines the block's own date with the reduced parent date.
    pub merge_ancestors: DateMerge,
}

/// Compute the merged date of every block in one topological pass:
///
/// - a root takes its own date, or `default_date` if it has none;
/// - a block without its own date takes `merge_parents` over its parents'
///   merged dates;
/// - a block with both takes `merge_ancestors(own, merge_parents(..))`.
///
/// Parents are always finalized before their children, and both reductions
/// are commutative, so the result depends only on the graph.
pub fn collect_merged_date_field(graph: &mut BlockGraph, field: &MergedDateField) -> Result<()> {
    for key in graph.topological_order()? {
        let own = graph
            .get_field(&key, field.field_name)
            .and_then(FieldValue::as_date);

        let inherited = graph
            .parents_of(&key)
            .iter()
            .filter_map(|parent| {
                graph
                    .get_transformer_field(parent, field.owner, field.merged_field_name)
                    .and_then(FieldValue::as_date)
            })
            .reduce(|a, b| field.merge_parents.apply(a, b));

        let merged = match (own, inherited) {
            (Some(own), Some(inherited)) => field.merge_ancestors.apply(own, inherited),
            (Some(own), None) => own,
            (None, Some(inherited)) => inherited,
            (None, None) => field.default_date,
        };
        debug!(
            block = %key,
            owner = field.owner,
            own = ?own,
            inherited = ?inherited,
            %merged,
            "merged date field"
        );
        graph.set_transformer_field(&key, field.owner, field.merged_field_name, merged.into())?;
    }
    Ok(())
}
