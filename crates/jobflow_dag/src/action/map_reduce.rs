//! Map-reduce jobs.

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

/// Runs a map-reduce job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MapReduceAction {
    job_tracker: Option<String>,
    name_node: Option<String>,
    prepare: Option<Prepare>,
    job_xmls: Vec<String>,
    configuration: Configuration,
    config_class: Option<String>,
    files: Vec<String>,
    archives: Vec<String>,
}

impl MapReduceAction {
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

    /// Returns the job XML paths.
    #[must_use]
    pub fn job_xmls(&self) -> &[String] {
        &self.job_xmls
    }

    /// Returns the configuration class.
    #[must_use]
    pub fn config_class(&self) -> Option<&str> {
        self.config_class.as_deref()
    }

    /// Returns the files shipped with the job.
    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Returns the archives shipped with the job.
    #[must_use]
    pub fn archives(&self) -> &[String] {
        &self.archives
    }
}

impl Action for MapReduceAction {
    fn kind(&self) -> &'static str {
        "map-reduce"
    }

    fn configuration(&self) -> Option<&Configuration> {
        Some(&self.configuration)
    }
}

/// Builds nodes running a [`MapReduceAction`].
#[derive(Debug, Clone, Default)]
pub struct MapReduceActionBuilder {
    base: NodeBuilderBase,
    job_tracker: ModifyOnce<String>,
    name_node: ModifyOnce<String>,
    prepare: ModifyOnce<Prepare>,
    job_xmls: Vec<String>,
    configuration: ConfigurationBuilder,
    config_class: ModifyOnce<String>,
    files: Vec<String>,
    archives: Vec<String>,
}

impl MapReduceActionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose action fields default to `action`.
    #[must_use]
    pub fn from_action(action: &MapReduceAction) -> Self {
        Self {
            base: NodeBuilderBase::new(),
            job_tracker: ModifyOnce::from_option(action.job_tracker.clone()),
            name_node: ModifyOnce::from_option(action.name_node.clone()),
            prepare: ModifyOnce::from_option(action.prepare.clone()),
            job_xmls: action.job_xmls.clone(),
            configuration: ConfigurationBuilder::from_configuration(&action.configuration),
            config_class: ModifyOnce::from_option(action.config_class.clone()),
            files: action.files.clone(),
            archives: action.archives.clone(),
        }
    }

    /// Creates a builder reproducing every field of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::ActionKindMismatch`] if the node is not a
    /// map-reduce action.
    pub fn from_existing(node: &Node) -> Result<Self, DagError> {
        let action = existing_action::<MapReduceAction>(node, "map-reduce")?;
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

    /// Sets the configuration class.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the configuration class was
    /// already modified.
    pub fn with_config_class(&mut self, class: impl Into<String>) -> Result<&mut Self, DagError> {
        self.config_class.set(class.into(), "config class")?;
        Ok(self)
    }

    /// Adds a job XML path.
    pub fn with_job_xml(&mut self, path: impl Into<String>) -> &mut Self {
        self.job_xmls.push(path.into());
        self
    }

    /// Removes the first matching job XML path.
    pub fn without_job_xml(&mut self, path: &str) -> &mut Self {
        remove_first(&mut self.job_xmls, &path.to_string());
        self
    }

    /// Removes all job XML paths.
    pub fn clear_job_xmls(&mut self) -> &mut Self {
        self.job_xmls.clear();
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
    pub fn build_action(&self) -> MapReduceAction {
        MapReduceAction {
            job_tracker: self.job_tracker.cloned(),
            name_node: self.name_node.cloned(),
            prepare: self.prepare.cloned(),
            job_xmls: self.job_xmls.clone(),
            configuration: self.configuration.build(),
            config_class: self.config_class.cloned(),
            files: self.files.clone(),
            archives: self.archives.clone(),
        }
    }
}

impl NodeBuilder for MapReduceActionBuilder {
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

impl ConfigurableBuilder for MapReduceActionBuilder {
    fn configuration_mut(&mut self) -> &mut ConfigurationBuilder {
        &mut self.configuration
    }
}
