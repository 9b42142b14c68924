//! Node types for job DAGs.
//!
//! A [`Node`] is one unit of work together with its edges. Nodes live in a
//! [`Dag`](crate::Dag) arena and refer to each other by [`NodeId`].

use core::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::error::DagError;
use crate::handler::ErrorHandler;

/// Identifier of a node inside its [`Dag`](crate::Dag).
///
/// Ids are arena indices, so comparing ids is an identity comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Creates a node id from a raw index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// The condition attached to a conditional edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// A labeled branch; the label is stored verbatim.
    Actual(String),
    /// The fallback branch taken when no labeled branch matches.
    Default,
}

impl Condition {
    /// Creates a labeled condition.
    #[must_use]
    pub fn actual(label: impl Into<String>) -> Self {
        Self::Actual(label.into())
    }

    /// Returns true for the default condition.
    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    /// Returns the label of an actual condition.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Actual(label) => Some(label),
            Self::Default => None,
        }
    }
}

/// One end of a conditional edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeWithCondition {
    /// The node on the other end of the edge.
    pub node: NodeId,
    /// The edge's condition.
    pub condition: Condition,
}

impl NodeWithCondition {
    /// Creates a new conditional edge end.
    #[must_use]
    pub fn new(node: NodeId, condition: Condition) -> Self {
        Self { node, condition }
    }
}

/// A vertex of the user-facing job DAG.
///
/// Parent lists are fixed when the node is inserted. Child lists grow as
/// later nodes declare this one as their parent; a node never holds children
/// with and without conditions at the same time.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    parents_without_conditions: Vec<NodeId>,
    parents_with_conditions: Vec<NodeWithCondition>,
    children_without_conditions: Vec<NodeId>,
    children_with_conditions: Vec<NodeWithCondition>,
    error_handler: Option<ErrorHandler>,
    action: Arc<dyn Action>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        name: String,
        parents_without_conditions: Vec<NodeId>,
        parents_with_conditions: Vec<NodeWithCondition>,
        error_handler: Option<ErrorHandler>,
        action: Arc<dyn Action>,
    ) -> Self {
        Self {
            id,
            name,
            parents_without_conditions,
            parents_with_conditions,
            children_without_conditions: Vec::new(),
            children_with_conditions: Vec::new(),
            error_handler,
            action,
        }
    }

    /// Returns the node's id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all parents: unconditional ones first, then conditional ones.
    #[must_use]
    pub fn parents(&self) -> Vec<NodeId> {
        self.parents_without_conditions
            .iter()
            .copied()
            .chain(self.parents_with_conditions.iter().map(|parent| parent.node))
            .collect()
    }

    /// Returns the parents declared without a condition.
    #[must_use]
    pub fn parents_without_conditions(&self) -> &[NodeId] {
        &self.parents_without_conditions
    }

    /// Returns the parents declared with a condition.
    #[must_use]
    pub fn parents_with_conditions(&self) -> &[NodeWithCondition] {
        &self.parents_with_conditions
    }

    /// Returns all children: unconditional ones first, then conditional ones.
    #[must_use]
    pub fn all_children(&self) -> Vec<NodeId> {
        self.children_without_conditions
            .iter()
            .copied()
            .chain(self.children_with_conditions.iter().map(|child| child.node))
            .collect()
    }

    /// Returns the children without a condition.
    #[must_use]
    pub fn children_without_conditions(&self) -> &[NodeId] {
        &self.children_without_conditions
    }

    /// Returns the children with a condition.
    #[must_use]
    pub fn children_with_conditions(&self) -> &[NodeWithCondition] {
        &self.children_with_conditions
    }

    /// Returns the default conditional child, if any.
    #[must_use]
    pub fn default_child(&self) -> Option<NodeId> {
        self.children_with_conditions
            .iter()
            .find(|child| child.condition.is_default())
            .map(|child| child.node)
    }

    /// Returns the attached error handler.
    #[must_use]
    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    /// Returns the realized action configuration.
    #[must_use]
    pub fn action(&self) -> &dyn Action {
        self.action.as_ref()
    }

    /// Returns a shared handle to the action configuration.
    #[must_use]
    pub fn action_arc(&self) -> Arc<dyn Action> {
        Arc::clone(&self.action)
    }

    /// Returns the action downcast to a concrete type.
    #[must_use]
    pub fn action_as<A: Action>(&self) -> Option<&A> {
        self.action().downcast_ref::<A>()
    }

    /// Checks that a child of the given kind may be added, without adding it.
    pub(crate) fn check_child(&self, condition: Option<&Condition>) -> Result<(), DagError> {
        match condition {
            None if !self.children_with_conditions.is_empty() => Err(DagError::MixedChildren {
                parent: self.name.clone(),
                attempted: "without",
                existing: "with",
            }),
            Some(_) if !self.children_without_conditions.is_empty() => {
                Err(DagError::MixedChildren {
                    parent: self.name.clone(),
                    attempted: "with",
                    existing: "without",
                })
            }
            Some(Condition::Default) if self.default_child().is_some() => {
                Err(DagError::DuplicateDefault {
                    parent: self.name.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Appends an unconditional child.
    pub(crate) fn add_child(&mut self, child: NodeId) -> Result<(), DagError> {
        self.check_child(None)?;
        self.children_without_conditions.push(child);
        Ok(())
    }

    /// Appends a conditional child.
    pub(crate) fn add_child_with_condition(
        &mut self,
        child: NodeId,
        condition: Condition,
    ) -> Result<(), DagError> {
        self.check_child(Some(&condition))?;
        self.children_with_conditions
            .push(NodeWithCondition::new(child, condition));
        Ok(())
    }

    /// Rewrites every id held by this node. Edges whose target `map` drops
    /// are removed. Used when a workflow copies part of a DAG into its own
    /// arena.
    pub(crate) fn remap(&self, id: NodeId, map: impl Fn(NodeId) -> Option<NodeId>) -> Self {
        let remap_plain =
            |edges: &[NodeId]| edges.iter().filter_map(|edge| map(*edge)).collect::<Vec<_>>();
        let remap_conditional = |edges: &[NodeWithCondition]| {
            edges
                .iter()
                .filter_map(|edge| {
                    map(edge.node).map(|node| NodeWithCondition::new(node, edge.condition.clone()))
                })
                .collect::<Vec<_>>()
        };

        Self {
            id,
            name: self.name.clone(),
            parents_without_conditions: remap_plain(&self.parents_without_conditions),
            parents_with_conditions: remap_conditional(&self.parents_with_conditions),
            children_without_conditions: remap_plain(&self.children_without_conditions),
            children_with_conditions: remap_conditional(&self.children_with_conditions),
            error_handler: self.error_handler.clone(),
            action: Arc::clone(&self.action),
        }
    }
}
