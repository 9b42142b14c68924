//! Translator settings.

use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

/// Message of the kill element unless configured otherwise.
pub const DEFAULT_KILL_MESSAGE: &str =
    "Action failed, error message[${wf:errorMessage(wf:lastErrorNode())}]";

/// Settings applied to every translated document.
///
/// Missing fields take their defaults when loaded from JSON.
///
/// ```ignore
/// let config = TranslatorConfig::from_json(r#"{ "kill-message": "failed" }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TranslatorConfig {
    /// Message of the kill element.
    pub kill_message: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            kill_message: DEFAULT_KILL_MESSAGE.to_string(),
        }
    }
}

impl TranslatorConfig {
    /// Creates the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the kill element's message.
    #[must_use]
    pub fn with_kill_message(mut self, message: impl Into<String>) -> Self {
        self.kill_message = message.into();
        self
    }

    /// Parses settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialization`] if `json` is malformed.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = TranslatorConfig::from_json("{}").unwrap();
        assert_eq!(config, TranslatorConfig::default());
        assert_eq!(config.kill_message, DEFAULT_KILL_MESSAGE);
    }

    #[test]
    fn kill_message_loads_from_json() {
        let config = TranslatorConfig::from_json(r#"{ "kill-message": "failed" }"#).unwrap();
        assert_eq!(config, TranslatorConfig::new().with_kill_message("failed"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            TranslatorConfig::from_json("{"),
            Err(DocumentError::Serialization(_))
        ));
    }
}
