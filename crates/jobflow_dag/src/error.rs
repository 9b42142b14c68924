//! Error types for DAG construction.

use thiserror::Error;

use crate::node::NodeId;

/// Errors raised while building nodes, actions and workflows.
///
/// Every variant is raised at the offending call; nothing is deferred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DagError {
    /// A write-once field was modified a second time.
    #[error("{field} has already been set")]
    AlreadySet {
        /// The field that was set twice.
        field: String,
    },

    /// The node is already registered as a parent (of either kind).
    #[error("trying to add a parent that is already a parent of this node: {parent}")]
    DuplicateParent {
        /// The duplicated parent.
        parent: NodeId,
    },

    /// The node was asked to remove a parent it does not have.
    #[error("trying to remove a nonexistent parent: {parent}")]
    UnknownParent {
        /// The parent that was not found.
        parent: NodeId,
    },

    /// A node id does not belong to the DAG it was used with.
    #[error("node {0} does not belong to this dag")]
    UnknownNode(NodeId),

    /// A node or workflow was built without a name.
    #[error("cannot build {what} without a name")]
    MissingName {
        /// What was being built ("node", "workflow").
        what: &'static str,
    },

    /// Children with and without conditions were mixed on one node.
    #[error(
        "node '{parent}' cannot take a child {attempted} a condition: it already has children {existing} a condition"
    )]
    MixedChildren {
        /// Name of the parent node.
        parent: String,
        /// "with" or "without", describing the rejected child.
        attempted: &'static str,
        /// "with" or "without", describing the existing children.
        existing: &'static str,
    },

    /// A second default conditional child was registered on one node.
    #[error("node '{parent}' already has a default conditional child")]
    DuplicateDefault {
        /// Name of the parent node.
        parent: String,
    },

    /// A from-existing builder was given a node of another action kind.
    #[error("node '{node}' holds a {found} action, expected a {expected} action")]
    ActionKindMismatch {
        /// Name of the node.
        node: String,
        /// The kind the builder produces.
        expected: &'static str,
        /// The kind the node holds.
        found: &'static str,
    },

    /// An error handler was built from a builder that declares parents.
    #[error("error handler '{name}' cannot have parents")]
    ErrorHandlerWithParents {
        /// Name of the handler.
        name: String,
    },

    /// Two nodes of one workflow share a name.
    #[error("Duplicate name '{name}' found in workflow '{workflow}'")]
    DuplicateName {
        /// The duplicated node name.
        name: String,
        /// The workflow being built.
        workflow: String,
    },
}

impl DagError {
    /// Creates an [`AlreadySet`](Self::AlreadySet) error.
    pub fn already_set(field: impl Into<String>) -> Self {
        Self::AlreadySet {
            field: field.into(),
        }
    }
}
