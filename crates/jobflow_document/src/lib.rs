//! Workflow documents for jobflow (Layer 3).
//!
//! `jobflow_document` translates a structural
//! [`Graph`](jobflow_graph::Graph) into a [`WorkflowApp`]: a flat, named list
//! of decision, fork, join, kill and action elements that an external
//! workflow engine runs.
//!
//! # Core Concepts
//!
//! - [`Translator`] - Lowers workflows and emits documents
//! - [`WorkflowApp`] - The document, serializable to JSON
//! - [`ActionMappings`] - Registry turning realized actions into payloads
//! - [`TranslatorConfig`] - Document-wide settings such as the kill message
//!
//! # Example
//!
//! ```ignore
//! use jobflow_document::Translator;
//!
//! let document = Translator::new().translate(&workflow)?;
//! assert_eq!(document.kills().count(), 1);
//! println!("{}", document.to_json_pretty()?);
//! ```
//!
//! # Transitions
//!
//! Every action element carries an `ok` and an `error` transition. `ok`
//! follows the node's child in the graph. `error` goes to the node's error
//! handler when it has one, and to the single kill element otherwise. A
//! handler element itself always transitions to kill.

/// Translator settings.
pub mod config;

/// Error types.
pub mod error;

/// Action-to-payload mappings.
pub mod mapping;

/// The document model.
pub mod model;

/// Graph-to-document translation.
pub mod translator;

pub use config::{DEFAULT_KILL_MESSAGE, TranslatorConfig};
pub use error::DocumentError;
pub use mapping::{ActionMappings, map_fields};
pub use model::{ActionElement, ActionPayload, Element, WorkflowApp};
pub use translator::{Translator, serialize};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::config::TranslatorConfig;
    pub use crate::error::DocumentError;
    pub use crate::mapping::ActionMappings;
    pub use crate::model::{
        ActionElement, ActionPayload, Case, DecisionElement, DefaultCase, Element, EndElement,
        ForkElement, ForkPath, JoinElement, KillElement, StartElement, Switch, WorkflowApp,
    };
    pub use crate::translator::{Translator, serialize};
}
