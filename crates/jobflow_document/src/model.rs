//! The workflow document produced by translation.
//!
//! A [`WorkflowApp`] is a flat list of named elements linked by name. Every
//! action element names where to go on success (`ok`) and on failure
//! (`error`). Serialization goes through serde; JSON keeps field and element
//! order.

use indexmap::IndexMap;
use jobflow_dag::{Credential, Global, Parameter};
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

// ─────────────────────────────────────────────────────────────────────────────
// Document
// ─────────────────────────────────────────────────────────────────────────────

/// A complete workflow document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkflowApp {
    /// Workflow name.
    pub name: String,
    /// Declared parameters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Defaults shared by every action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<Global>,
    /// Declared credentials.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<Credential>,
    /// Entry transition.
    pub start: StartElement,
    /// Elements in emission order.
    pub elements: Vec<Element>,
    /// Successful exit.
    pub end: EndElement,
}

impl WorkflowApp {
    /// Returns the element with the given name.
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.name() == name)
    }

    /// Returns the action element with the given name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionElement> {
        self.actions().find(|action| action.name == name)
    }

    /// Iterates over the action elements.
    pub fn actions(&self) -> impl Iterator<Item = &ActionElement> {
        self.elements.iter().filter_map(|element| match element {
            Element::Action(action) => Some(action),
            _ => None,
        })
    }

    /// Iterates over the kill elements.
    pub fn kills(&self) -> impl Iterator<Item = &KillElement> {
        self.elements.iter().filter_map(|element| match element {
            Element::Kill(kill) => Some(kill),
            _ => None,
        })
    }

    /// Serializes the document to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialization`] if a custom payload fails to
    /// serialize.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the document to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialization`] if a custom payload fails to
    /// serialize.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The entry transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartElement {
    /// First element to run.
    pub to: String,
}

/// The successful exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndElement {
    /// Name of the exit, the target of final `ok` transitions.
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Elements
// ─────────────────────────────────────────────────────────────────────────────

/// One named element of a workflow document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Element {
    /// Chooses one path by condition.
    Decision(DecisionElement),
    /// Starts parallel paths.
    Fork(ForkElement),
    /// Waits for parallel paths.
    Join(JoinElement),
    /// Fails the workflow.
    Kill(KillElement),
    /// Runs a unit of work.
    Action(ActionElement),
}

impl Element {
    /// Returns the element's name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Element::Decision(decision) => &decision.name,
            Element::Fork(fork) => &fork.name,
            Element::Join(join) => &join.name,
            Element::Kill(kill) => &kill.name,
            Element::Action(action) => &action.name,
        }
    }
}

/// A decision element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionElement {
    /// Element name.
    pub name: String,
    /// Cases and default.
    pub switch: Switch,
}

/// The body of a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Switch {
    /// Labeled cases in declaration order.
    pub cases: Vec<Case>,
    /// Target when no case holds.
    pub default: DefaultCase,
}

/// A labeled decision case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Case {
    /// Target element.
    pub to: String,
    /// The condition label, typically an expression.
    pub condition: String,
}

/// The default decision case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultCase {
    /// Target element.
    pub to: String,
}

/// A fork element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForkElement {
    /// Element name.
    pub name: String,
    /// Parallel paths in declaration order.
    pub paths: Vec<ForkPath>,
}

/// One path of a fork.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForkPath {
    /// First element of the path.
    pub start: String,
}

/// A join element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinElement {
    /// Element name.
    pub name: String,
    /// Element after the join.
    pub to: String,
}

/// The kill element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KillElement {
    /// Element name.
    pub name: String,
    /// Failure message reported by the engine.
    pub message: String,
}

/// An action element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionElement {
    /// Element name.
    pub name: String,
    /// Kind-specific body.
    #[serde(flatten)]
    pub payload: ActionPayload,
    /// Target on success.
    pub ok: String,
    /// Target on failure.
    pub error: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Action payloads
// ─────────────────────────────────────────────────────────────────────────────

/// The kind-specific body of an action element.
///
/// Serialized under a key naming the kind, e.g. `"shell": { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionPayload {
    /// A map-reduce job.
    MapReduce(MapReducePayload),
    /// A shell command.
    Shell(ShellPayload),
    /// File-system operations.
    Fs(FsPayload),
    /// A child workflow.
    SubWorkflow(SubWorkflowPayload),
    /// An email notification.
    Email(EmailPayload),
    /// A kind registered outside this crate.
    Other {
        /// Kind name.
        kind: String,
        /// Free-form body.
        body: serde_json::Value,
    },
}

impl ActionPayload {
    /// Returns the kind name of the payload.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            ActionPayload::MapReduce(_) => "map-reduce",
            ActionPayload::Shell(_) => "shell",
            ActionPayload::Fs(_) => "fs",
            ActionPayload::SubWorkflow(_) => "sub-workflow",
            ActionPayload::Email(_) => "email",
            ActionPayload::Other { kind, .. } => kind,
        }
    }
}

/// Paths prepared before a job starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreparePayload {
    /// Paths to delete.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletes: Vec<String>,
    /// Directories to create.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mkdirs: Vec<String>,
}

/// Document form of a map-reduce action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MapReducePayload {
    /// Job tracker address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_tracker: Option<String>,
    /// Name node address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_node: Option<String>,
    /// Paths to prepare before the job starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare: Option<PreparePayload>,
    /// Job XML paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_xmls: Vec<String>,
    /// Configuration properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub configuration: IndexMap<String, String>,
    /// Class supplying extra configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_class: Option<String>,
    /// Files shipped with the job.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Archives shipped with the job.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archives: Vec<String>,
}

/// Document form of a shell action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ShellPayload {
    /// Job tracker address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_tracker: Option<String>,
    /// Name node address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_node: Option<String>,
    /// Paths to prepare before the job starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepare: Option<PreparePayload>,
    /// Configuration properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub configuration: IndexMap<String, String>,
    /// Executable to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<String>,
    /// Command-line arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    /// Environment variables, as `NAME=value`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<String>,
    /// Files shipped with the job.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// Archives shipped with the job.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archives: Vec<String>,
    /// Whether the engine captures standard output.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub capture_output: bool,
}

/// One step of a file-system action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum FsStep {
    /// Deletes a path.
    Delete {
        /// The path to delete.
        path: String,
        /// Deletes permanently instead of moving to trash.
        #[serde(rename = "skip-trash", default)]
        skip_trash: bool,
    },
    /// Creates a directory.
    Mkdir {
        /// The directory to create.
        path: String,
    },
    /// Moves a path.
    Move {
        /// The path to move.
        source: String,
        /// The destination.
        target: String,
    },
    /// Changes permissions.
    Chmod {
        /// The path to change.
        path: String,
        /// Permissions, symbolic or octal.
        permissions: String,
        /// Applies to the files of a directory as well.
        #[serde(rename = "dir-files", default)]
        dir_files: bool,
        /// Recurses into subdirectories.
        #[serde(default)]
        recursive: bool,
    },
    /// Creates an empty file.
    Touchz {
        /// The file to create.
        path: String,
    },
}

/// Document form of a file-system action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FsPayload {
    /// Name node address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_node: Option<String>,
    /// Job XML paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_xmls: Vec<String>,
    /// Configuration properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub configuration: IndexMap<String, String>,
    /// Operations in execution order.
    #[serde(default)]
    pub operations: Vec<FsStep>,
}

/// Document form of a sub-workflow action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SubWorkflowPayload {
    /// Path of the child application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_path: Option<String>,
    /// Whether the parent configuration is passed down.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub propagate_configuration: bool,
    /// Configuration properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub configuration: IndexMap<String, String>,
}

/// Document form of an email action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EmailPayload {
    /// Recipients.
    #[serde(default)]
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    /// Subject line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// MIME type of the body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Attachment path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shell_action(name: &str) -> Element {
        Element::Action(ActionElement {
            name: name.to_string(),
            payload: ActionPayload::Shell(ShellPayload {
                exec: Some("run.sh".to_string()),
                ..ShellPayload::default()
            }),
            ok: "end".to_string(),
            error: "kill".to_string(),
        })
    }

    #[test]
    fn action_payload_is_keyed_by_kind() {
        let value = serde_json::to_value(shell_action("a")).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "action",
                "name": "a",
                "shell": { "exec": "run.sh" },
                "ok": "end",
                "error": "kill",
            })
        );
    }

    #[test]
    fn decision_serializes_cases_and_default() {
        let element = Element::Decision(DecisionElement {
            name: "decision_1".to_string(),
            switch: Switch {
                cases: vec![Case {
                    to: "b".to_string(),
                    condition: "${x}".to_string(),
                }],
                default: DefaultCase {
                    to: "c".to_string(),
                },
            },
        });

        assert_eq!(
            serde_json::to_value(element).unwrap(),
            json!({
                "type": "decision",
                "name": "decision_1",
                "switch": {
                    "cases": [{ "to": "b", "condition": "${x}" }],
                    "default": { "to": "c" },
                },
            })
        );
    }

    #[test]
    fn json_keeps_element_order() {
        let app = WorkflowApp {
            name: "wf".to_string(),
            parameters: Vec::new(),
            global: None,
            credentials: Vec::new(),
            start: StartElement {
                to: "b".to_string(),
            },
            elements: vec![shell_action("b"), shell_action("a")],
            end: EndElement {
                name: "end".to_string(),
            },
        };

        let json = app.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["elements"][0]["name"], "b");
        assert_eq!(value["elements"][1]["name"], "a");
        assert!(value.get("parameters").is_none());
        assert!(app.to_json_pretty().unwrap().contains('\n'));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<EmailPayload, _> =
            serde_json::from_value(json!({ "to": ["a@example.com"], "priority": "high" }));
        assert!(result.is_err());
    }
}
