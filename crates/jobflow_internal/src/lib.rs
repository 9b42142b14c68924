//! # jobflow Internal Library
//!
//! Re-exports the core jobflow crates for convenience.

/// Layer 1: User-facing job DAGs, builders and workflows.
pub use jobflow_dag;

/// Layer 2: Structural graphs and lowering.
pub use jobflow_graph;

/// Layer 3: Workflow documents and translation.
pub use jobflow_document;

/// Logging setup.
#[cfg(feature = "tracing")]
pub use jobflow_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use jobflow_dag::prelude::*;
    pub use jobflow_document::prelude::*;
    pub use jobflow_graph::prelude::*;

    #[cfg(feature = "tracing")]
    pub use jobflow_core::{TracingFormat, TracingSetup};
}
