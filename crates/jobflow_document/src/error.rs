//! Error types for document translation.

use jobflow_graph::GraphError;
use thiserror::Error;

/// Errors raised while translating a graph into a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No mapping is registered for the action's type.
    #[error("node '{node}' holds a {kind} action, which has no registered mapping")]
    UnrecognizedActionKind {
        /// Name of the node.
        node: String,
        /// Kind reported by the action.
        kind: &'static str,
    },

    /// A registered mapping returned no payload.
    #[error("mapping for the {kind} action of node '{node}' produced no payload")]
    EmptyMapping {
        /// Name of the node.
        node: String,
        /// Kind reported by the action.
        kind: &'static str,
    },

    /// Copying an action's fields into its document form failed.
    #[error("cannot copy fields of {kind} action: {source}")]
    FieldMapping {
        /// Kind reported by the action.
        kind: &'static str,
        /// The underlying serde failure.
        #[source]
        source: serde_json::Error,
    },

    /// Two elements of the document share a name.
    #[error("element name '{name}' is used more than once")]
    DuplicateElementName {
        /// The repeated name.
        name: String,
    },

    /// A structural node lacks the outgoing edge its element needs.
    #[error("node '{node}' has no target to transition to")]
    DanglingNode {
        /// Name of the node.
        node: String,
    },

    /// The workflow could not be lowered, or the graph is incomplete.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocumentError {
    /// Creates a [`FieldMapping`](Self::FieldMapping) error.
    pub fn field_mapping(kind: &'static str, source: serde_json::Error) -> Self {
        Self::FieldMapping { kind, source }
    }
}
