//! Write-once builder fields.

use crate::error::DagError;

/// A value that may be modified at most once.
///
/// The field starts out *unmodified*, holding either nothing or a default
/// copied from an existing node. The first [`set`](Self::set) or
/// [`clear`](Self::clear) moves it to *modified*; any further modification is
/// rejected with [`DagError::AlreadySet`].
///
/// ```
/// use jobflow_dag::ModifyOnce;
///
/// let mut name = ModifyOnce::with_default("copied".to_string());
/// name.set("renamed".to_string(), "name").unwrap();
/// assert_eq!(name.get().map(String::as_str), Some("renamed"));
/// assert!(name.set("again".to_string(), "name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyOnce<T> {
    value: Option<T>,
    modified: bool,
}

impl<T> Default for ModifyOnce<T> {
    fn default() -> Self {
        Self {
            value: None,
            modified: false,
        }
    }
}

impl<T> ModifyOnce<T> {
    /// Creates an unmodified, empty field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unmodified field holding a default value.
    #[must_use]
    pub fn with_default(value: T) -> Self {
        Self {
            value: Some(value),
            modified: false,
        }
    }

    /// Creates an unmodified field from an optional default.
    #[must_use]
    pub fn from_option(value: Option<T>) -> Self {
        Self {
            value,
            modified: false,
        }
    }

    /// Sets the value. `field` names the field in the error message.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the field was already modified.
    pub fn set(&mut self, value: T, field: &str) -> Result<(), DagError> {
        self.modify(Some(value), field)
    }

    /// Clears the value. Clearing counts as the one allowed modification.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the field was already modified.
    pub fn clear(&mut self, field: &str) -> Result<(), DagError> {
        self.modify(None, field)
    }

    fn modify(&mut self, value: Option<T>, field: &str) -> Result<(), DagError> {
        if self.modified {
            return Err(DagError::already_set(field));
        }
        self.value = value;
        self.modified = true;
        Ok(())
    }

    /// Returns the current value.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns true once the field has been modified.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

impl<T: Clone> ModifyOnce<T> {
    /// Returns a clone of the current value.
    #[must_use]
    pub fn cloned(&self) -> Option<T> {
        self.value.clone()
    }
}
