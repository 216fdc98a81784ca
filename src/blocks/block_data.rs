// src/blocks/block_data.rs

//! Per-block field storage.

use std::collections::{BTreeMap, HashMap};

use crate::types::{FieldValue, TransformerId};

/// Fields carried by a single block.
///
/// Two stores are kept apart:
/// - content fields loaded from the field source (`start`,
///   `days_early_for_beta`, ...), shared by every transformer;
/// - transformer fields, keyed by `(owner, name)` so two transformers
///   writing the same field name never see each other's values.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    kind: String,
    fields: BTreeMap<String, FieldValue>,
    transformer_fields: HashMap<(TransformerId, String), FieldValue>,
}

impl BlockData {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn transformer_field(&self, owner: TransformerId, name: &str) -> Option<&FieldValue> {
        self.transformer_fields.get(&(owner, name.to_string()))
    }

    pub fn set_transformer_field(
        &mut self,
        owner: TransformerId,
        name: impl Into<String>,
        value: FieldValue,
    ) {
        self.transformer_fields.insert((owner, name.into()), value);
    }

    /// Names of the loaded content fields, in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }
}
