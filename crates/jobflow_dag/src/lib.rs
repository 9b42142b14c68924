//! User-facing job DAGs for jobflow (Layer 1).
//!
//! `jobflow_dag` is where users describe their jobs: which actions run, in
//! which order, and under which conditions.
//!
//! # Core Concepts
//!
//! - [`Dag`] - Arena holding every node created by a set of builders
//! - [`Node`] - One action plus its parent/child edges
//! - [`NodeBuilder`] - Chained operations shared by all action builders
//! - [`ErrorHandler`] - Detached node run when an action fails
//! - [`Workflow`] - A named, self-contained set of nodes
//!
//! # Example
//!
//! ```ignore
//! use jobflow_dag::prelude::*;
//!
//! let mut dag = Dag::new();
//!
//! let extract = ShellActionBuilder::new()
//!     .with_name("extract")?
//!     .with_executable("extract.sh")?
//!     .build(&mut dag)?;
//!
//! let load = MapReduceActionBuilder::new()
//!     .with_name("load")?
//!     .with_parent(extract)?
//!     .build(&mut dag)?;
//!
//! let workflow = WorkflowBuilder::new()
//!     .with_name("etl")?
//!     .with_dag_containing_node(load)
//!     .build(&dag)?;
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`jobflow_dag`): user-facing DAG and builders (this crate)
//! - **Layer 2** (`jobflow_graph`): lowering into a structural graph
//! - **Layer 3** (`jobflow_document`): translation into a workflow document

/// Action kinds and their builders.
pub mod action;

/// Shared builder state and operations.
pub mod builder;

/// The node arena.
pub mod dag;

/// Error types.
pub mod error;

/// Error handler nodes.
pub mod handler;

/// Write-once builder fields.
pub mod modify_once;

/// Nodes, ids and conditions.
pub mod node;

/// Workflows and the workflow builder.
pub mod workflow;

pub use action::{Action, Configuration};
pub use builder::{ConstructionData, NodeBuilder, NodeBuilderBase};
pub use dag::Dag;
pub use error::DagError;
pub use handler::ErrorHandler;
pub use modify_once::ModifyOnce;
pub use node::{Condition, Node, NodeId, NodeWithCondition};
pub use workflow::{Credential, Global, Parameter, Workflow, WorkflowBuilder};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::action::{
        Action, ConfigurableBuilder, Configuration, ConfigurationBuilder, EmailAction,
        EmailActionBuilder, FsAction, FsActionBuilder, FsOperation, MapReduceAction,
        MapReduceActionBuilder, Prepare, ShellAction, ShellActionBuilder, SubWorkflowAction,
        SubWorkflowActionBuilder,
    };
    pub use crate::builder::{ConstructionData, NodeBuilder, NodeBuilderBase};
    pub use crate::dag::Dag;
    pub use crate::error::DagError;
    pub use crate::handler::ErrorHandler;
    pub use crate::modify_once::ModifyOnce;
    pub use crate::node::{Condition, Node, NodeId, NodeWithCondition};
    pub use crate::workflow::{Credential, Global, Parameter, Workflow, WorkflowBuilder};
}
