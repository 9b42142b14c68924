//! Shell commands.

use std::sync::Arc;

use serde::Serialize;

use super::{
    Action, ConfigurableBuilder, Configuration, ConfigurationBuilder, Prepare, existing_action,
    remove_first,
};
use crate::builder::{NodeBuilder, NodeBuilderBase};
use crate::error::DagError;
use crate::modify_once::ModifyOnce;
use crate::node::Node;

/// Runs a shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShellAction {
    job_tracker: Option<String>,
    name_node: Option<String>,
    prepare: Option<Prepare>,
    configuration: Configuration,
    exec: Option<String>,
    arguments: Vec<String>,
    environment_variables: Vec<String>,
    files: Vec<String>,
    archives: Vec<String>,
    capture_output: bool,
}

impl ShellAction {
    /// Returns the job tracker address.
    #[must_use]
    pub fn job_tracker(&self) -> Option<&str> {
        self.job_tracker.as_deref()
    }

    /// Returns the name node address.
    #[must_use]
    pub fn name_node(&self) -> Option<&str> {
        self.name_node.as_deref()
    }

    /// Returns the prepare block.
    #[must_use]
    pub fn prepare(&self) -> Option<&Prepare> {
        self.prepare.as_ref()
    }

    /// Returns the executable.
    #[must_use]
    pub fn executable(&self) -> Option<&str> {
        self.exec.as_deref()
    }

    /// Returns the command-line arguments.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Returns the environment variables, each as `NAME=value`.
    #[must_use]
    pub fn environment_variables(&self) -> &[String] {
        &self.environment_variables
    }

    /// Returns the files shipped with the command.
    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Returns the archives shipped with the command.
    #[must_use]
    pub fn archives(&self) -> &[String] {
        &self.archives
    }

    /// Returns true if standard output is captured.
    #[must_use]
    pub fn captures_output(&self) -> bool {
        self.capture_output
    }
}

impl Action for ShellAction {
    fn kind(&self) -> &'static str {
        "shell"
    }

    fn configuration(&self) -> Option<&Configuration> {
        Some(&self.configuration)
    }
}

/// Builds nodes running a [`ShellAction`].
#[derive(Debug, Clone, Default)]
pub struct ShellActionBuilder {
    base: NodeBuilderBase,
    job_tracker: ModifyOnce<String>,
    name_node: ModifyOnce<String>,
    prepare: ModifyOnce<Prepare>,
    configuration: ConfigurationBuilder,
    exec: ModifyOnce<String>,
    arguments: Vec<String>,
    environment_variables: Vec<String>,
    files: Vec<String>,
    archives: Vec<String>,
    capture_output: ModifyOnce<bool>,
}

impl ShellActionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose action fields default to `action`.
    #[must_use]
    pub fn from_action(action: &ShellAction) -> Self {
        Self {
            base: NodeBuilderBase::new(),
            job_tracker: ModifyOnce::from_option(action.job_tracker.clone()),
            name_node: ModifyOnce::from_option(action.name_node.clone()),
            prepare: ModifyOnce::from_option(action.prepare.clone()),
            configuration: ConfigurationBuilder::from_configuration(&action.configuration),
            exec: ModifyOnce::from_option(action.exec.clone()),
            arguments: action.arguments.clone(),
            environment_variables: action.environment_variables.clone(),
            files: action.files.clone(),
            archives: action.archives.clone(),
            capture_output: ModifyOnce::with_default(action.capture_output),
        }
    }

    /// Creates a builder reproducing every field of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::ActionKindMismatch`] if the node is not a shell
    /// action.
    pub fn from_existing(node: &Node) -> Result<Self, DagError> {
        let action = existing_action::<ShellAction>(node, "shell")?;
        Ok(Self {
            base: NodeBuilderBase::from_node(node),
            ..Self::from_action(action)
        })
    }

    /// Sets the job tracker address.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the job tracker was already
    /// modified.
    pub fn with_job_tracker(&mut self, job_tracker: impl Into<String>) -> Result<&mut Self, DagError> {
        self.job_tracker.set(job_tracker.into(), "job tracker")?;
        Ok(self)
    }

    /// Sets the name node address.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the name node was already modified.
    pub fn with_name_node(&mut self, name_node: impl Into<String>) -> Result<&mut Self, DagError> {
        self.name_node.set(name_node.into(), "name node")?;
        Ok(self)
    }

    /// Sets the prepare block.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the prepare block was already
    /// modified.
    pub fn with_prepare(&mut self, prepare: Prepare) -> Result<&mut Self, DagError> {
        self.prepare.set(prepare, "prepare")?;
        Ok(self)
    }

    /// Sets the executable.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the executable was already
    /// modified.
    pub fn with_executable(&mut self, exec: impl Into<String>) -> Result<&mut Self, DagError> {
        self.exec.set(exec.into(), "executable")?;
        Ok(self)
    }

    /// Sets whether standard output is captured.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the flag was already modified.
    pub fn with_capture_output(&mut self, capture: bool) -> Result<&mut Self, DagError> {
        self.capture_output.set(capture, "capture output")?;
        Ok(self)
    }

    /// Adds a command-line argument.
    pub fn with_argument(&mut self, argument: impl Into<String>) -> &mut Self {
        self.arguments.push(argument.into());
        self
    }

    /// Removes the first matching argument.
    pub fn without_argument(&mut self, argument: &str) -> &mut Self {
        remove_first(&mut self.arguments, &argument.to_string());
        self
    }

    /// Removes all arguments.
    pub fn clear_arguments(&mut self) -> &mut Self {
        self.arguments.clear();
        self
    }

    /// Adds an environment variable given as `NAME=value`.
    pub fn with_environment_variable(&mut self, variable: impl Into<String>) -> &mut Self {
        self.environment_variables.push(variable.into());
        self
    }

    /// Removes the first matching environment variable.
    pub fn without_environment_variable(&mut self, variable: &str) -> &mut Self {
        remove_first(&mut self.environment_variables, &variable.to_string());
        self
    }

    /// Removes all environment variables.
    pub fn clear_environment_variables(&mut self) -> &mut Self {
        self.environment_variables.clear();
        self
    }

    /// Adds a file.
    pub fn with_file(&mut self, file: impl Into<String>) -> &mut Self {
        self.files.push(file.into());
        self
    }

    /// Removes the first matching file.
    pub fn without_file(&mut self, file: &str) -> &mut Self {
        remove_first(&mut self.files, &file.to_string());
        self
    }

    /// Removes all files.
    pub fn clear_files(&mut self) -> &mut Self {
        self.files.clear();
        self
    }

    /// Adds an archive.
    pub fn with_archive(&mut self, archive: impl Into<String>) -> &mut Self {
        self.archives.push(archive.into());
        self
    }

    /// Removes the first matching archive.
    pub fn without_archive(&mut self, archive: &str) -> &mut Self {
        remove_first(&mut self.archives, &archive.to_string());
        self
    }

    /// Removes all archives.
    pub fn clear_archives(&mut self) -> &mut Self {
        self.archives.clear();
        self
    }

    /// Realizes the action without building a node.
    #[must_use]
    pub fn build_action(&self) -> ShellAction {
        ShellAction {
            job_tracker: self.job_tracker.cloned(),
            name_node: self.name_node.cloned(),
            prepare: self.prepare.cloned(),
            configuration: self.configuration.build(),
            exec: self.exec.cloned(),
            arguments: self.arguments.clone(),
            environment_variables: self.environment_variables.clone(),
            files: self.files.clone(),
            archives: self.archives.clone(),
            capture_output: self.capture_output.get().copied().unwrap_or(false),
        }
    }
}

impl NodeBuilder for ShellActionBuilder {
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

impl ConfigurableBuilder for ShellActionBuilder {
    fn configuration_mut(&mut self) -> &mut ConfigurationBuilder {
        &mut self.configuration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_keep_order() {
        let mut builder = ShellActionBuilder::new();
        builder
            .with_executable("echo")
            .unwrap()
            .with_argument("hello")
            .with_argument("world")
            .with_environment_variable("LANG=C");

        let action = builder.build_action();
        assert_eq!(action.executable(), Some("echo"));
        assert_eq!(action.arguments(), &["hello".to_string(), "world".to_string()]);
        assert_eq!(action.environment_variables(), &["LANG=C".to_string()]);
        assert!(!action.captures_output());
    }

    #[test]
    fn capture_output_is_write_once() {
        let mut builder = ShellActionBuilder::new();
        builder.with_capture_output(true).unwrap();
        assert!(builder.with_capture_output(false).is_err());
        assert!(builder.build_action().captures_output());
    }
}
