//! The node arena.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::trace;

use crate::action::Action;
use crate::builder::ConstructionData;
use crate::error::DagError;
use crate::node::{Node, NodeId};

/// An arena of nodes connected by parent/child edges.
///
/// Nodes are only ever appended, so a [`NodeId`] stays valid for the life of
/// the arena and arena order is creation order.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    nodes: Vec<Node>,
}

impl Dag {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Returns the node with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::UnknownNode`] if `id` is not part of this arena.
    pub fn node(&self, id: NodeId) -> Result<&Node, DagError> {
        self.get(id).ok_or(DagError::UnknownNode(id))
    }

    /// Returns true if `id` belongs to this arena.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Iterates over all nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns the first node with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    /// Inserts a node and registers it as a child of each declared parent.
    ///
    /// All back-links are checked before any is applied, so a failed insert
    /// leaves the arena unchanged.
    pub(crate) fn insert(
        &mut self,
        data: ConstructionData,
        action: Arc<dyn Action>,
    ) -> Result<NodeId, DagError> {
        let name = data.name.ok_or(DagError::MissingName { what: "node" })?;

        for parent in &data.parents_without_conditions {
            self.node(*parent)?.check_child(None)?;
        }
        for parent in &data.parents_with_conditions {
            self.node(parent.node)?
                .check_child(Some(&parent.condition))?;
        }

        let id = NodeId(self.nodes.len());
        trace!(node = %id, name = %name, kind = action.kind(), "inserting node");

        for parent in &data.parents_without_conditions {
            self.nodes[parent.0].add_child(id)?;
        }
        for parent in &data.parents_with_conditions {
            self.nodes[parent.node.0].add_child_with_condition(id, parent.condition.clone())?;
        }

        self.nodes.push(Node::new(
            id,
            name,
            data.parents_without_conditions,
            data.parents_with_conditions,
            data.error_handler,
            action,
        ));

        Ok(id)
    }

    /// Copies the given nodes into a new arena, re-indexing them in the order
    /// given. Edges to nodes outside `ids` are dropped.
    pub(crate) fn subset(&self, ids: &[NodeId]) -> Self {
        let positions: HashMap<NodeId, NodeId> = ids
            .iter()
            .enumerate()
            .map(|(position, id)| (*id, NodeId(position)))
            .collect();

        let nodes = ids
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|node| {
                let id = positions[&node.id()];
                node.remap(id, |old| positions.get(&old).copied())
            })
            .collect();

        Self { nodes }
    }
}
