//! Shared node builder state and the chained builder operations.
//!
//! Every concrete action builder embeds a [`NodeBuilderBase`] and implements
//! [`NodeBuilder`], which supplies the operations common to all nodes: naming,
//! parents, error handlers and the final [`build`](NodeBuilder::build).
//!
//! # Example
//!
//! ```ignore
//! let mut dag = Dag::new();
//!
//! let first = ShellActionBuilder::new()
//!     .with_name("prepare")?
//!     .with_executable("prepare.sh")?
//!     .build(&mut dag)?;
//!
//! let second = ShellActionBuilder::new()
//!     .with_name("run")?
//!     .with_parent(first)?
//!     .build(&mut dag)?;
//! ```

use std::sync::Arc;

use crate::action::Action;
use crate::dag::Dag;
use crate::error::DagError;
use crate::handler::ErrorHandler;
use crate::modify_once::ModifyOnce;
use crate::node::{Condition, Node, NodeId, NodeWithCondition};

/// A snapshot of the node-level fields of a builder.
///
/// Produced by [`NodeBuilder::construction_data`]; the snapshot does not
/// borrow the builder, so the builder can keep changing afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionData {
    /// The node's name, if one was set.
    pub name: Option<String>,
    /// Unconditional parents in declaration order.
    pub parents_without_conditions: Vec<NodeId>,
    /// Conditional parents in declaration order.
    pub parents_with_conditions: Vec<NodeWithCondition>,
    /// The attached error handler.
    pub error_handler: Option<ErrorHandler>,
}

/// Fields shared by every node builder.
#[derive(Debug, Clone, Default)]
pub struct NodeBuilderBase {
    name: ModifyOnce<String>,
    parents: Vec<NodeId>,
    parents_with_conditions: Vec<NodeWithCondition>,
    error_handler: ModifyOnce<ErrorHandler>,
}

impl NodeBuilderBase {
    /// Creates an empty base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a base pre-filled from an existing node.
    ///
    /// The name and error handler become defaults that may still be changed
    /// once; the parent lists are copied as-is.
    #[must_use]
    pub fn from_node(node: &Node) -> Self {
        Self {
            name: ModifyOnce::with_default(node.name().to_string()),
            parents: node.parents_without_conditions().to_vec(),
            parents_with_conditions: node.parents_with_conditions().to_vec(),
            error_handler: ModifyOnce::from_option(node.error_handler().cloned()),
        }
    }

    /// Returns the current name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Returns true if `parent` is a parent of either kind.
    #[must_use]
    pub fn has_parent(&self, parent: NodeId) -> bool {
        self.parents.contains(&parent) || self.conditional_index(parent).is_some()
    }

    fn conditional_index(&self, parent: NodeId) -> Option<usize> {
        self.parents_with_conditions
            .iter()
            .position(|entry| entry.node == parent)
    }

    fn check_no_duplicate_parent(&self, parent: NodeId) -> Result<(), DagError> {
        if self.has_parent(parent) {
            return Err(DagError::DuplicateParent { parent });
        }
        Ok(())
    }

    /// Returns a snapshot of the current fields.
    #[must_use]
    pub fn construction_data(&self) -> ConstructionData {
        ConstructionData {
            name: self.name.cloned(),
            parents_without_conditions: self.parents.clone(),
            parents_with_conditions: self.parents_with_conditions.clone(),
            error_handler: self.error_handler.cloned(),
        }
    }
}

/// Operations shared by all node builders.
///
/// Implementors provide access to their [`NodeBuilderBase`] and realize their
/// action; everything else is provided. Every operation takes effect
/// immediately and fails at the offending call.
pub trait NodeBuilder {
    /// Returns the shared node fields.
    fn base(&self) -> &NodeBuilderBase;

    /// Returns the shared node fields mutably.
    fn base_mut(&mut self) -> &mut NodeBuilderBase;

    /// Realizes the action configuration from the builder's current state.
    fn action(&self) -> Arc<dyn Action>;

    /// Sets the node's name.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the name was already modified.
    fn with_name(&mut self, name: impl Into<String>) -> Result<&mut Self, DagError> {
        self.base_mut().name.set(name.into(), "name")?;
        Ok(self)
    }

    /// Attaches an error handler.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the handler was already modified.
    fn with_error_handler(&mut self, handler: ErrorHandler) -> Result<&mut Self, DagError> {
        self.base_mut().error_handler.set(handler, "error handler")?;
        Ok(self)
    }

    /// Removes the error handler.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the handler was already modified.
    fn without_error_handler(&mut self) -> Result<&mut Self, DagError> {
        self.base_mut().error_handler.clear("error handler")?;
        Ok(self)
    }

    /// Adds an unconditional parent.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::DuplicateParent`] if `parent` is already a parent.
    fn with_parent(&mut self, parent: NodeId) -> Result<&mut Self, DagError> {
        let base = self.base_mut();
        base.check_no_duplicate_parent(parent)?;
        base.parents.push(parent);
        Ok(self)
    }

    /// Adds a parent reached when `condition` holds.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::DuplicateParent`] if `parent` is already a parent.
    fn with_parent_with_condition(
        &mut self,
        parent: NodeId,
        condition: impl Into<String>,
    ) -> Result<&mut Self, DagError> {
        let base = self.base_mut();
        base.check_no_duplicate_parent(parent)?;
        base.parents_with_conditions
            .push(NodeWithCondition::new(parent, Condition::actual(condition)));
        Ok(self)
    }

    /// Adds a parent reached when none of its other conditions hold.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::DuplicateParent`] if `parent` is already a parent.
    fn with_parent_default_conditional(&mut self, parent: NodeId) -> Result<&mut Self, DagError> {
        let base = self.base_mut();
        base.check_no_duplicate_parent(parent)?;
        base.parents_with_conditions
            .push(NodeWithCondition::new(parent, Condition::Default));
        Ok(self)
    }

    /// Removes `parent` from whichever parent list holds it.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::UnknownParent`] if `parent` is not a parent.
    fn without_parent(&mut self, parent: NodeId) -> Result<&mut Self, DagError> {
        let base = self.base_mut();
        if let Some(index) = base.parents.iter().position(|id| *id == parent) {
            base.parents.remove(index);
        } else if let Some(index) = base.conditional_index(parent) {
            base.parents_with_conditions.remove(index);
        } else {
            return Err(DagError::UnknownParent { parent });
        }
        Ok(self)
    }

    /// Removes every parent of both kinds.
    fn clear_parents(&mut self) -> &mut Self {
        let base = self.base_mut();
        base.parents.clear();
        base.parents_with_conditions.clear();
        self
    }

    /// Returns a snapshot of the node-level fields.
    ///
    /// Calling this repeatedly without mutating the builder yields equal
    /// values.
    fn construction_data(&self) -> ConstructionData {
        self.base().construction_data()
    }

    /// Builds the node into `dag` and links it under each parent.
    ///
    /// The builder is not consumed; building twice inserts two nodes.
    ///
    /// # Errors
    ///
    /// - [`DagError::MissingName`] if no name was set.
    /// - [`DagError::UnknownNode`] if a parent is not part of `dag`.
    /// - [`DagError::MixedChildren`] or [`DagError::DuplicateDefault`] if a
    ///   parent cannot take this node as a child. `dag` is left unchanged.
    fn build(&self, dag: &mut Dag) -> Result<NodeId, DagError> {
        dag.insert(self.construction_data(), self.action())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::EmailActionBuilder;

    fn named(dag: &mut Dag, name: &str) -> NodeId {
        let mut builder = EmailActionBuilder::new();
        builder.with_name(name).unwrap();
        builder.build(dag).unwrap()
    }

    #[test]
    fn name_is_write_once() {
        let mut builder = EmailActionBuilder::new();
        builder.with_name("a").unwrap();
        let err = builder.with_name("b").unwrap_err();
        assert_eq!(err, DagError::already_set("name"));
        assert_eq!(builder.base().name(), Some("a"));
    }

    #[test]
    fn duplicate_parent_across_lists_is_rejected() {
        let mut dag = Dag::new();
        let a = named(&mut dag, "a");

        let mut builder = EmailActionBuilder::new();
        builder.with_parent(a).unwrap();
        assert_eq!(
            builder.with_parent_with_condition(a, "x").unwrap_err(),
            DagError::DuplicateParent { parent: a }
        );
        assert_eq!(
            builder.with_parent_default_conditional(a).unwrap_err(),
            DagError::DuplicateParent { parent: a }
        );
    }

    #[test]
    fn without_parent_searches_both_lists() {
        let mut dag = Dag::new();
        let a = named(&mut dag, "a");
        let b = named(&mut dag, "b");

        let mut builder = EmailActionBuilder::new();
        builder
            .with_parent(a)
            .unwrap()
            .with_parent_with_condition(b, "x")
            .unwrap();

        builder.without_parent(b).unwrap();
        let data = builder.construction_data();
        assert_eq!(data.parents_without_conditions, vec![a]);
        assert!(data.parents_with_conditions.is_empty());

        assert_eq!(
            builder.without_parent(b).unwrap_err(),
            DagError::UnknownParent { parent: b }
        );
    }

    #[test]
    fn clear_parents_empties_both_lists() {
        let mut dag = Dag::new();
        let a = named(&mut dag, "a");
        let b = named(&mut dag, "b");

        let mut builder = EmailActionBuilder::new();
        builder
            .with_parent(a)
            .unwrap()
            .with_parent_default_conditional(b)
            .unwrap()
            .clear_parents();

        let data = builder.construction_data();
        assert!(data.parents_without_conditions.is_empty());
        assert!(data.parents_with_conditions.is_empty());
    }

    #[test]
    fn error_handler_is_write_once() {
        let mut handler = EmailActionBuilder::new();
        handler.with_name("h").unwrap();
        let handler = ErrorHandler::build_as_error_handler(&handler).unwrap();

        let mut builder = EmailActionBuilder::new();
        builder.with_error_handler(handler.clone()).unwrap();
        assert!(builder.without_error_handler().is_err());
        assert_eq!(builder.construction_data().error_handler, Some(handler));
    }

    #[test]
    fn build_without_name_fails() {
        let mut dag = Dag::new();
        let err = EmailActionBuilder::new().build(&mut dag).unwrap_err();
        assert_eq!(err, DagError::MissingName { what: "node" });
        assert!(dag.is_empty());
    }

    #[test]
    fn from_node_copies_fields_as_defaults() {
        let mut dag = Dag::new();
        let a = named(&mut dag, "a");

        let mut builder = EmailActionBuilder::new();
        builder.with_name("b").unwrap().with_parent(a).unwrap();
        let b = builder.build(&mut dag).unwrap();

        let mut base = NodeBuilderBase::from_node(dag.node(b).unwrap());
        assert_eq!(base.name(), Some("b"));
        assert!(base.has_parent(a));
        base.name.set("c".to_string(), "name").unwrap();
        assert_eq!(base.name(), Some("c"));
    }
}
