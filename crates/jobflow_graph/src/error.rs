//! Error types for structural graphs and lowering.

use thiserror::Error;

use crate::graph::GraphNodeId;

/// Errors raised while building or lowering a structural graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An unconditional child was added next to conditional ones, or the
    /// reverse.
    #[error("node '{node}' cannot mix children with and without conditions")]
    MixedChildren {
        /// Name of the parent node.
        node: String,
    },

    /// A node that takes at most one parent was given a second one.
    #[error("node '{node}' cannot have more than one parent")]
    MultipleParents {
        /// Name of the child node.
        node: String,
    },

    /// A node that takes at most one child was given a second one.
    #[error("node '{node}' cannot have more than one child")]
    MultipleChildren {
        /// Name of the parent node.
        node: String,
    },

    /// A decision was given a second default branch.
    #[error("decision '{node}' already has a default branch")]
    MultipleDefaults {
        /// Name of the decision.
        node: String,
    },

    /// The node kind never has children.
    #[error("{kind} node '{node}' cannot have children")]
    ChildNotAllowed {
        /// Name of the node.
        node: String,
        /// Kind of the node.
        kind: &'static str,
    },

    /// The node kind never has parents.
    #[error("{kind} node '{node}' cannot have parents")]
    ParentNotAllowed {
        /// Name of the node.
        node: String,
        /// Kind of the node.
        kind: &'static str,
    },

    /// A node branching on conditions has no default branch.
    #[error("node '{node}' has conditional children but no default branch")]
    MissingDefault {
        /// Name of the node whose children are conditional.
        node: String,
    },

    /// The user DAG contains a cycle.
    ///
    /// Nodes only take parents that already exist, so this guards the
    /// acyclic invariant of [`jobflow_dag::Workflow`] rather than a state
    /// reachable through the builders.
    #[error("cycle detected through node '{node}'")]
    Cycle {
        /// A node on the cycle.
        node: String,
    },

    /// A branch joins another branch without passing through their common
    /// merge point, so the DAG cannot be expressed with nested fork/join and
    /// decision blocks.
    #[error("node '{node}' is reached from more than one unmerged branch")]
    UnstructuredBranch {
        /// The node reached twice.
        node: String,
    },

    /// A user node or error handler uses a name reserved for structural nodes.
    #[error("node name '{name}' is reserved")]
    ReservedName {
        /// The offending name.
        name: String,
    },

    /// The graph lacks its start, end or kill node.
    #[error("graph has no '{name}' node")]
    MissingStructuralNode {
        /// Name of the missing node.
        name: &'static str,
    },

    /// A node id does not belong to the graph.
    #[error("node {0} does not belong to this graph")]
    UnknownNode(GraphNodeId),
}
