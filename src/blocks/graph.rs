// src/blocks/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use tracing::{debug, warn};

use crate::blocks::FieldSource;
use crate::blocks::block_data::BlockData;
use crate::config::model::CourseFile;
use crate::errors::{BlockdatesError, Result};
use crate::types::{BlockKey, FieldValue, TransformerId};

/// In-memory snapshot of a course outline.
///
/// Edges point from parent to child. A block may have several parents
/// (shared content). The graph is kept acyclic by construction: both
/// [`BlockGraph::from_course`] (validated input) and
/// [`BlockGraph::add_child`] refuse edges that would close a cycle.
#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    graph: StableDiGraph<BlockKey, ()>,
    index: HashMap<BlockKey, NodeIndex>,
    blocks: HashMap<BlockKey, BlockData>,
    requested_fields: BTreeSet<String>,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a validated [`CourseFile`].
    ///
    /// Only the block kinds and parent links are copied; content fields are
    /// loaded later through [`BlockGraph::load_requested_fields`].
    pub fn from_course(cfg: &CourseFile) -> Result<Self> {
        let mut graph = Self::new();

        for (key, block) in cfg.block.iter() {
            graph.add_block(BlockKey::new(key.clone()), block.kind.clone());
        }

        for (key, block) in cfg.block.iter() {
            let child = BlockKey::new(key.clone());
            for parent in block.parents.iter() {
                graph.add_child(&BlockKey::new(parent.clone()), &child)?;
            }
        }

        debug!(blocks = graph.len(), "built block graph from course outline");
        Ok(graph)
    }

    /// Add a block with no edges. Re-adding an existing key is a no-op.
    pub fn add_block(&mut self, key: BlockKey, kind: impl Into<String>) {
        if self.index.contains_key(&key) {
            return;
        }
        let ix = self.graph.add_node(key.clone());
        self.index.insert(key.clone(), ix);
        self.blocks.insert(key, BlockData::new(kind));
    }

    /// Place `child` under `parent`.
    pub fn add_child(&mut self, parent: &BlockKey, child: &BlockKey) -> Result<()> {
        let p = self.node(parent)?;
        let c = self.node(child)?;

        if p == c || has_path_connecting(&self.graph, c, p, None) {
            return Err(BlockdatesError::DagCycle(format!(
                "placing '{}' under '{}' would create a cycle",
                child, parent
            )));
        }

        if self.graph.find_edge(p, c).is_none() {
            self.graph.add_edge(p, c, ());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &BlockKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn block(&self, key: &BlockKey) -> Option<&BlockData> {
        self.blocks.get(key)
    }

    /// Immediate parents of a block, in key order.
    pub fn parents_of(&self, key: &BlockKey) -> Vec<BlockKey> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Immediate children of a block, in key order.
    pub fn children_of(&self, key: &BlockKey) -> Vec<BlockKey> {
        self.neighbors(key, Direction::Outgoing)
    }

    /// Blocks without parents, in key order.
    pub fn root_keys(&self) -> Vec<BlockKey> {
        let mut roots: Vec<BlockKey> = self
            .graph
            .node_indices()
            .filter(|ix| {
                self.graph
                    .neighbors_directed(*ix, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|ix| self.graph[ix].clone())
            .collect();
        roots.sort();
        roots
    }

    /// Blocks ordered so that every parent precedes all of its children.
    pub fn topological_order(&self) -> Result<Vec<BlockKey>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            BlockdatesError::DagCycle(format!(
                "cycle detected in block graph involving '{}'",
                self.graph[cycle.node_id()]
            ))
        })?;
        Ok(order.into_iter().map(|ix| self.graph[ix].clone()).collect())
    }

    /// Declare a content field that must be loaded before collection.
    pub fn request_field(&mut self, name: &str) {
        if self.requested_fields.insert(name.to_string()) {
            debug!(field = name, "requested block field");
        }
    }

    pub fn requested_fields(&self) -> impl Iterator<Item = &str> {
        self.requested_fields.iter().map(|s| s.as_str())
    }

    /// Copy every requested field from `source` onto the blocks.
    ///
    /// Fields the source does not have for a block stay unset; readers fall
    /// back to their own defaults.
    pub fn load_requested_fields(&mut self, source: &dyn FieldSource) {
        let mut loaded = 0usize;
        for (key, data) in self.blocks.iter_mut() {
            for name in self.requested_fields.iter() {
                if let Some(value) = source.field(key, name) {
                    data.set_field(name.clone(), value);
                    loaded += 1;
                }
            }
        }
        debug!(
            fields = self.requested_fields.len(),
            values = loaded,
            "loaded requested block fields"
        );
    }

    pub fn get_field(&self, key: &BlockKey, name: &str) -> Option<&FieldValue> {
        self.blocks.get(key)?.field(name)
    }

    pub fn get_field_or(&self, key: &BlockKey, name: &str, default: FieldValue) -> FieldValue {
        self.get_field(key, name).cloned().unwrap_or(default)
    }

    pub fn set_field(&mut self, key: &BlockKey, name: &str, value: FieldValue) -> Result<()> {
        self.block_mut(key)?.set_field(name, value);
        Ok(())
    }

    pub fn get_transformer_field(
        &self,
        key: &BlockKey,
        owner: TransformerId,
        name: &str,
    ) -> Option<&FieldValue> {
        self.blocks.get(key)?.transformer_field(owner, name)
    }

    pub fn set_transformer_field(
        &mut self,
        key: &BlockKey,
        owner: TransformerId,
        name: &str,
        value: FieldValue,
    ) -> Result<()> {
        self.block_mut(key)?.set_transformer_field(owner, name, value);
        Ok(())
    }

    /// Remove every block the predicate selects, plus everything that is
    /// only reachable through removed blocks.
    ///
    /// The predicate sees the graph as it was before this call and is asked
    /// at most once per block, in topological order. A block survives when
    /// the predicate returns false and it is either a root or has at least
    /// one surviving parent. If the predicate fails, the error is returned
    /// and nothing is removed.
    ///
    /// Returns the removed keys in topological order.
    pub fn remove_blocks_matching<F>(&mut self, mut predicate: F) -> Result<Vec<BlockKey>>
    where
        F: FnMut(&BlockKey, &BlockData) -> Result<bool>,
    {
        let order = self.topological_order()?;
        let mut kept: HashSet<BlockKey> = HashSet::with_capacity(order.len());
        let mut removed = Vec::new();

        for key in order {
            let parents = self.parents_of(&key);
            let reachable = parents.is_empty() || parents.iter().any(|p| kept.contains(p));

            let remove = if reachable {
                let data = self
                    .blocks
                    .get(&key)
                    .ok_or_else(|| BlockdatesError::UnknownBlock(key.to_string()))?;
                predicate(&key, data)?
            } else {
                true
            };

            if remove {
                removed.push(key);
            } else {
                kept.insert(key);
            }
        }

        for key in removed.iter() {
            self.remove_block(key);
        }

        debug!(
            removed = removed.len(),
            remaining = self.len(),
            "removed blocks from graph"
        );
        Ok(removed)
    }

    fn remove_block(&mut self, key: &BlockKey) {
        if let Some(ix) = self.index.remove(key) {
            self.graph.remove_node(ix);
            self.blocks.remove(key);
        }
    }

    fn neighbors(&self, key: &BlockKey, dir: Direction) -> Vec<BlockKey> {
        let Some(ix) = self.index.get(key) else {
            warn!(block = %key, "lookup for unknown block");
            return Vec::new();
        };
        let mut keys: Vec<BlockKey> = self
            .graph
            .neighbors_directed(*ix, dir)
            .map(|n| self.graph[n].clone())
            .collect();
        keys.sort();
        keys
    }

    fn node(&self, key: &BlockKey) -> Result<NodeIndex> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| BlockdatesError::UnknownBlock(key.to_string()))
    }

    fn block_mut(&mut self, key: &BlockKey) -> Result<&mut BlockData> {
        self.blocks
            .get_mut(key)
            .ok_or_else(|| BlockdatesError::UnknownBlock(key.to_string()))
    }
}
