//! Structural job graphs for jobflow (Layer 2).
//!
//! `jobflow_graph` turns a user [`Workflow`](jobflow_dag::Workflow) into a
//! [`Graph`] whose control flow is explicit: one start, one end, one kill
//! node, and properly nested fork/join and decision blocks.
//!
//! # Core Concepts
//!
//! - [`Graph`] - Arena of structural nodes with checked edge mutations
//! - [`GraphNode`] - Shared node record (id, name, parents)
//! - [`NodeKind`] - Kind-specific data and outgoing edges
//! - [`Graph::from_workflow`] - Lowering from a user workflow
//!
//! # Example
//!
//! ```ignore
//! use jobflow_graph::Graph;
//!
//! let graph = Graph::from_workflow(&workflow)?;
//! for node in graph.nodes() {
//!     println!("{} ({})", node.name(), node.kind().label());
//! }
//! ```

/// Error types.
pub mod error;

/// Graph structure and node kinds.
pub mod graph;

/// Lowering from user workflows.
pub mod lowering;

pub use error::GraphError;
pub use graph::{
    DecisionBranch, END_NAME, ExplicitNode, Graph, GraphNode, GraphNodeId, KILL_NAME, NodeKind,
    START_NAME,
};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::GraphError;
    pub use crate::graph::{DecisionBranch, ExplicitNode, Graph, GraphNode, GraphNodeId, NodeKind};
}
