//! Error handlers: detached nodes that run when an action fails.

use core::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::builder::NodeBuilder;
use crate::error::DagError;

/// A detached node attached to actions as their failure path.
///
/// Handlers never take part in the DAG's edges. Cloning an `ErrorHandler`
/// shares the same handler; equality is identity, so two handlers built from
/// identical builders are still different handlers.
#[derive(Clone)]
pub struct ErrorHandler {
    inner: Arc<HandlerNode>,
}

#[derive(Debug)]
struct HandlerNode {
    name: String,
    action: Arc<dyn Action>,
}

impl ErrorHandler {
    /// Builds a handler from a node builder.
    ///
    /// The builder's name and action are used; the builder itself is left
    /// untouched and may still be built as a regular node.
    ///
    /// # Errors
    ///
    /// - [`DagError::MissingName`] if the builder has no name.
    /// - [`DagError::ErrorHandlerWithParents`] if the builder declares any
    ///   parent.
    pub fn build_as_error_handler<B: NodeBuilder>(builder: &B) -> Result<Self, DagError> {
        let data = builder.construction_data();
        let name = data.name.ok_or(DagError::MissingName {
            what: "error handler",
        })?;

        if !data.parents_without_conditions.is_empty() || !data.parents_with_conditions.is_empty()
        {
            return Err(DagError::ErrorHandlerWithParents { name });
        }

        Ok(Self {
            inner: Arc::new(HandlerNode {
                name,
                action: builder.action(),
            }),
        })
    }

    /// Returns the handler's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the handler's action.
    #[must_use]
    pub fn action(&self) -> &dyn Action {
        self.inner.action.as_ref()
    }

    /// Returns true if both values refer to the same handler.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ErrorHandler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ErrorHandler {}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("name", &self.inner.name)
            .field("kind", &self.inner.action.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::EmailActionBuilder;
    use crate::dag::Dag;

    #[test]
    fn handler_keeps_name_and_action() {
        let mut builder = EmailActionBuilder::new();
        builder.with_name("notify").unwrap();
        builder.with_recipient("ops@example.com");

        let handler = ErrorHandler::build_as_error_handler(&builder).unwrap();
        assert_eq!(handler.name(), "notify");
        assert_eq!(handler.action().kind(), "email");
    }

    #[test]
    fn handler_requires_name() {
        let builder = EmailActionBuilder::new();
        let err = ErrorHandler::build_as_error_handler(&builder).unwrap_err();
        assert_eq!(
            err,
            DagError::MissingName {
                what: "error handler"
            }
        );
    }

    #[test]
    fn handler_rejects_parents() {
        let mut dag = Dag::new();
        let mut parent = EmailActionBuilder::new();
        parent.with_name("parent").unwrap();
        let parent = parent.build(&mut dag).unwrap();

        let mut builder = EmailActionBuilder::new();
        builder.with_name("handler").unwrap().with_parent(parent).unwrap();

        let err = ErrorHandler::build_as_error_handler(&builder).unwrap_err();
        assert!(matches!(err, DagError::ErrorHandlerWithParents { name } if name == "handler"));
    }

    #[test]
    fn equality_is_identity() {
        let mut builder = EmailActionBuilder::new();
        builder.with_name("h").unwrap();

        let first = ErrorHandler::build_as_error_handler(&builder).unwrap();
        let second = ErrorHandler::build_as_error_handler(&builder).unwrap();

        assert_eq!(first, first.clone());
        assert_ne!(first, second);
    }
}
