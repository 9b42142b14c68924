//! Mapping realized actions to document payloads.
//!
//! [`ActionMappings`] is keyed by the concrete action type. The built-in
//! kinds copy their fields into the matching payload type with
//! [`map_fields`]; other kinds can be registered at runtime.

use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use jobflow_dag::Action;
use jobflow_dag::action::{EmailAction, FsAction, MapReduceAction, ShellAction, SubWorkflowAction};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DocumentError;
use crate::model::ActionPayload;

type Mapper =
    Arc<dyn Fn(&dyn Action) -> Result<Option<ActionPayload>, DocumentError> + Send + Sync>;

/// Copies the fields of `source` into a `T` with the same field names.
///
/// The copy goes through a [`serde_json::Value`], so renames and defaults on
/// either side apply.
///
/// # Errors
///
/// Returns the serde failure if `source` does not fit `T`.
pub fn map_fields<S: Serialize, T: DeserializeOwned>(source: &S) -> Result<T, serde_json::Error> {
    serde_json::from_value(serde_json::to_value(source)?)
}

/// Registered mappings from action types to document payloads.
///
/// # Example
///
/// ```ignore
/// let mut mappings = ActionMappings::new();
/// mappings.register_serialized::<NotifyAction>();
/// let payload = mappings.map("notify", &NotifyAction::default())?;
/// ```
#[derive(Clone)]
pub struct ActionMappings {
    mappers: HashMap<TypeId, Mapper>,
}

impl Default for ActionMappings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActionMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionMappings")
            .field("registered", &self.mappers.len())
            .finish()
    }
}

impl ActionMappings {
    /// Creates mappings for the built-in action kinds.
    #[must_use]
    pub fn new() -> Self {
        let mut mappings = Self::empty();
        mappings
            .builtin::<MapReduceAction, _>(ActionPayload::MapReduce)
            .builtin::<ShellAction, _>(ActionPayload::Shell)
            .builtin::<FsAction, _>(ActionPayload::Fs)
            .builtin::<SubWorkflowAction, _>(ActionPayload::SubWorkflow)
            .builtin::<EmailAction, _>(ActionPayload::Email);
        mappings
    }

    /// Creates mappings without any registered kind.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    fn builtin<A, P>(&mut self, wrap: fn(P) -> ActionPayload) -> &mut Self
    where
        A: Action + Serialize,
        P: DeserializeOwned + 'static,
    {
        self.register::<A>(move |action| {
            let payload = map_fields::<A, P>(action)
                .map_err(|source| DocumentError::field_mapping(action.kind(), source))?;
            Ok(Some(wrap(payload)))
        })
    }

    /// Registers `mapper` for actions of type `A`, replacing any previous
    /// mapping.
    ///
    /// Returning `Ok(None)` makes translation fail with
    /// [`DocumentError::EmptyMapping`].
    pub fn register<A: Action>(
        &mut self,
        mapper: impl Fn(&A) -> Result<Option<ActionPayload>, DocumentError> + Send + Sync + 'static,
    ) -> &mut Self {
        let mapper: Mapper = Arc::new(move |action: &dyn Action| match action.downcast_ref::<A>() {
            Some(action) => mapper(action),
            None => Ok(None),
        });
        self.mappers.insert(TypeId::of::<A>(), mapper);
        self
    }

    /// Registers `A` to be emitted as [`ActionPayload::Other`], with its
    /// serialized form as the body.
    pub fn register_serialized<A: Action + Serialize>(&mut self) -> &mut Self {
        self.register::<A>(|action| {
            let body = serde_json::to_value(action)
                .map_err(|source| DocumentError::field_mapping(action.kind(), source))?;
            Ok(Some(ActionPayload::Other {
                kind: action.kind().to_string(),
                body,
            }))
        })
    }

    /// Returns true if actions of type `A` have a mapping.
    #[must_use]
    pub fn contains<A: Action>(&self) -> bool {
        self.mappers.contains_key(&TypeId::of::<A>())
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    /// Returns true if no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Maps the action of the node named `node`.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::UnrecognizedActionKind`] if the action's type has
    ///   no mapping.
    /// - [`DocumentError::EmptyMapping`] if the mapping produced nothing.
    /// - Whatever error the mapping itself returns.
    pub fn map(&self, node: &str, action: &dyn Action) -> Result<ActionPayload, DocumentError> {
        let mapper = self
            .mappers
            .get(&action.action_type_id())
            .ok_or_else(|| DocumentError::UnrecognizedActionKind {
                node: node.to_string(),
                kind: action.kind(),
            })?;

        (**mapper)(action)?.ok_or_else(|| DocumentError::EmptyMapping {
            node: node.to_string(),
            kind: action.kind(),
        })
    }
}
