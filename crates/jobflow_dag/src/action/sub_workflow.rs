//! Child workflows.

use std::sync::Arc;

use serde::Serialize;

use super::{Action, ConfigurableBuilder, Configuration, ConfigurationBuilder, existing_action};
use crate::builder::{NodeBuilder, NodeBuilderBase};
use crate::error::DagError;
use crate::modify_once::ModifyOnce;
use crate::node::Node;

/// Runs another workflow application as a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubWorkflowAction {
    app_path: Option<String>,
    propagate_configuration: bool,
    configuration: Configuration,
}

impl SubWorkflowAction {
    /// Returns the path of the child application.
    #[must_use]
    pub fn app_path(&self) -> Option<&str> {
        self.app_path.as_deref()
    }

    /// Returns true if the parent's configuration is passed down.
    #[must_use]
    pub fn propagates_configuration(&self) -> bool {
        self.propagate_configuration
    }
}

impl Action for SubWorkflowAction {
    fn kind(&self) -> &'static str {
        "sub-workflow"
    }

    fn configuration(&self) -> Option<&Configuration> {
        Some(&self.configuration)
    }
}

/// Builds nodes running a [`SubWorkflowAction`].
#[derive(Debug, Clone, Default)]
pub struct SubWorkflowActionBuilder {
    base: NodeBuilderBase,
    app_path: ModifyOnce<String>,
    propagate_configuration: ModifyOnce<bool>,
    configuration: ConfigurationBuilder,
}

impl SubWorkflowActionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose action fields default to `action`.
    #[must_use]
    pub fn from_action(action: &SubWorkflowAction) -> Self {
        Self {
            base: NodeBuilderBase::new(),
            app_path: ModifyOnce::from_option(action.app_path.clone()),
            propagate_configuration: ModifyOnce::with_default(action.propagate_configuration),
            configuration: ConfigurationBuilder::from_configuration(&action.configuration),
        }
    }

    /// Creates a builder reproducing every field of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::ActionKindMismatch`] if the node is not a
    /// sub-workflow action.
    pub fn from_existing(node: &Node) -> Result<Self, DagError> {
        let action = existing_action::<SubWorkflowAction>(node, "sub-workflow")?;
        Ok(Self {
            base: NodeBuilderBase::from_node(node),
            ..Self::from_action(action)
        })
    }

    /// Sets the path of the child application.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the path was already modified.
    pub fn with_app_path(&mut self, path: impl Into<String>) -> Result<&mut Self, DagError> {
        self.app_path.set(path.into(), "app path")?;
        Ok(self)
    }

    /// Passes the parent's configuration down to the child.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the flag was already modified.
    pub fn with_propagating_configuration(&mut self) -> Result<&mut Self, DagError> {
        self.propagate_configuration
            .set(true, "propagate configuration")?;
        Ok(self)
    }

    /// Stops passing the parent's configuration down to the child.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the flag was already modified.
    pub fn without_propagating_configuration(&mut self) -> Result<&mut Self, DagError> {
        self.propagate_configuration
            .set(false, "propagate configuration")?;
        Ok(self)
    }

    /// Realizes the action without building a node.
    #[must_use]
    pub fn build_action(&self) -> SubWorkflowAction {
        SubWorkflowAction {
            app_path: self.app_path.cloned(),
            propagate_configuration: self.propagate_configuration.get().copied().unwrap_or(false),
            configuration: self.configuration.build(),
        }
    }
}

impl NodeBuilder for SubWorkflowActionBuilder {
    fn base(&self) -> &NodeBuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBuilderBase {
        &mut self.base
    }

    fn action(&self) -> Arc<dyn Action> {
        Arc::new(self.build_action())
    }
}

impl ConfigurableBuilder for SubWorkflowActionBuilder {
    fn configuration_mut(&mut self) -> &mut ConfigurationBuilder {
        &mut self.configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagation_flag_is_write_once() {
        let mut builder = SubWorkflowActionBuilder::new();
        builder.with_propagating_configuration().unwrap();
        assert!(builder.without_propagating_configuration().is_err());
        assert!(builder.build_action().propagates_configuration());
    }

    #[test]
    fn defaults_to_not_propagating() {
        let mut builder = SubWorkflowActionBuilder::new();
        builder.with_app_path("/apps/child").unwrap();

        let action = builder.build_action();
        assert_eq!(action.app_path(), Some("/apps/child"));
        assert!(!action.propagates_configuration());
        assert!(action.configuration().unwrap().is_empty());
    }
}
