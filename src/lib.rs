//! A fluent builder for job DAGs that lowers them into workflow-engine
//! documents.
//!

pub use jobflow_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use jobflow_internal::prelude::*;
}
