//! Action kinds and their builders.
//!
//! An [`Action`] is the realized, immutable configuration of one unit of
//! work. Each kind comes with a builder implementing
//! [`NodeBuilder`](crate::NodeBuilder); builders that carry key/value
//! configuration also implement [`ConfigurableBuilder`].
//!
//! | Kind | Action | Builder |
//! |------|--------|---------|
//! | `email` | [`EmailAction`] | [`EmailActionBuilder`] |
//! | `fs` | [`FsAction`] | [`FsActionBuilder`] |
//! | `map-reduce` | [`MapReduceAction`] | [`MapReduceActionBuilder`] |
//! | `shell` | [`ShellAction`] | [`ShellActionBuilder`] |
//! | `sub-workflow` | [`SubWorkflowAction`] | [`SubWorkflowActionBuilder`] |

mod email;
mod fs;
mod map_reduce;
mod shell;
mod sub_workflow;

pub use email::{EmailAction, EmailActionBuilder};
pub use fs::{FsAction, FsActionBuilder, FsOperation};
pub use map_reduce::{MapReduceAction, MapReduceActionBuilder};
pub use shell::{ShellAction, ShellActionBuilder};
pub use sub_workflow::{SubWorkflowAction, SubWorkflowActionBuilder};

use core::any::{Any, TypeId};
use core::fmt::Debug;

use indexmap::IndexMap;
use serde::Serialize;

use crate::builder::NodeBuilder;
use crate::error::DagError;
use crate::modify_once::ModifyOnce;
use crate::node::Node;

/// Key/value configuration properties, in insertion order.
pub type Configuration = IndexMap<String, String>;

/// The realized configuration of a unit of work.
///
/// Implementations are plain immutable data. Other crates recognize the
/// concrete type through [`downcast_ref`](trait.Action.html#method.downcast_ref)
/// or [`action_type_id`](trait.Action.html#method.action_type_id).
pub trait Action: Any + Send + Sync + Debug {
    /// Returns a short, stable name for this kind of action.
    fn kind(&self) -> &'static str;

    /// Returns the action's configuration properties, if the kind has any.
    fn configuration(&self) -> Option<&Configuration> {
        None
    }
}

impl dyn Action {
    /// Returns the action as a concrete type.
    #[must_use]
    pub fn downcast_ref<A: Action>(&self) -> Option<&A> {
        (self as &dyn Any).downcast_ref::<A>()
    }

    /// Returns true if the action is of type `A`.
    #[must_use]
    pub fn is<A: Action>(&self) -> bool {
        (self as &dyn Any).is::<A>()
    }

    /// Returns the [`TypeId`] of the concrete action type.
    #[must_use]
    pub fn action_type_id(&self) -> TypeId {
        (self as &dyn Any).type_id()
    }
}

/// Looks up the action of `node` as `A`, failing with a kind mismatch.
pub(crate) fn existing_action<'a, A: Action>(
    node: &'a Node,
    expected: &'static str,
) -> Result<&'a A, DagError> {
    node.action_as::<A>()
        .ok_or_else(|| DagError::ActionKindMismatch {
            node: node.name().to_string(),
            expected,
            found: node.action().kind(),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration properties
// ─────────────────────────────────────────────────────────────────────────────

/// Write-once configuration properties, one [`ModifyOnce`] per key.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    properties: IndexMap<String, ModifyOnce<String>>,
}

impl ConfigurationBuilder {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration whose properties default to `existing`.
    #[must_use]
    pub fn from_configuration(existing: &Configuration) -> Self {
        let properties = existing
            .iter()
            .map(|(key, value)| (key.clone(), ModifyOnce::with_default(value.clone())))
            .collect();
        Self { properties }
    }

    /// Sets a property.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the key was already modified.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), DagError> {
        let key = key.into();
        let field = format!("configuration property '{key}'");
        self.properties
            .entry(key)
            .or_default()
            .set(value.into(), &field)
    }

    /// Deletes a property. Deleting counts as the key's one modification.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the key was already modified.
    pub fn remove(&mut self, key: impl Into<String>) -> Result<(), DagError> {
        let key = key.into();
        let field = format!("configuration property '{key}'");
        self.properties.entry(key).or_default().clear(&field)
    }

    /// Returns the properties that currently hold a value.
    #[must_use]
    pub fn build(&self) -> Configuration {
        self.properties
            .iter()
            .filter_map(|(key, value)| value.get().map(|value| (key.clone(), value.clone())))
            .collect()
    }
}

/// Builders whose action carries configuration properties.
pub trait ConfigurableBuilder: NodeBuilder {
    /// Returns the configuration being built.
    fn configuration_mut(&mut self) -> &mut ConfigurationBuilder;

    /// Sets a configuration property.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the key was already modified.
    fn with_config_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self, DagError> {
        self.configuration_mut().set(key, value)?;
        Ok(self)
    }

    /// Deletes a configuration property.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the key was already modified.
    fn without_config_property(&mut self, key: impl Into<String>) -> Result<&mut Self, DagError> {
        self.configuration_mut().remove(key)?;
        Ok(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared pieces
// ─────────────────────────────────────────────────────────────────────────────

/// Paths to clean up or create before a job starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Prepare {
    deletes: Vec<String>,
    mkdirs: Vec<String>,
}

impl Prepare {
    /// Creates an empty prepare block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path to delete.
    #[must_use]
    pub fn with_delete(mut self, path: impl Into<String>) -> Self {
        self.deletes.push(path.into());
        self
    }

    /// Adds a directory to create.
    #[must_use]
    pub fn with_mkdir(mut self, path: impl Into<String>) -> Self {
        self.mkdirs.push(path.into());
        self
    }

    /// Returns the paths to delete.
    #[must_use]
    pub fn deletes(&self) -> &[String] {
        &self.deletes
    }

    /// Returns the directories to create.
    #[must_use]
    pub fn mkdirs(&self) -> &[String] {
        &self.mkdirs
    }
}

/// Removes the first entry equal to `value`.
pub(crate) fn remove_first<T: PartialEq>(list: &mut Vec<T>, value: &T) {
    if let Some(index) = list.iter().position(|entry| entry == value) {
        list.remove(index);
    }
}
