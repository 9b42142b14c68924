//! File-system operations.

use std::sync::Arc;

use serde::Serialize;

use super::{
    Action, ConfigurableBuilder, Configuration, ConfigurationBuilder, existing_action, remove_first,
};
use crate::builder::{NodeBuilder, NodeBuilderBase};
use crate::error::DagError;
use crate::modify_once::ModifyOnce;
use crate::node::Node;

/// One step of an [`FsAction`]. Steps run in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum FsOperation {
    /// Deletes a path.
    Delete {
        /// The path to delete.
        path: String,
        /// Deletes permanently instead of moving to trash.
        #[serde(rename = "skip-trash")]
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
        #[serde(rename = "dir-files")]
        dir_files: bool,
        /// Recurses into subdirectories.
        recursive: bool,
    },
    /// Creates an empty file.
    Touchz {
        /// The file to create.
        path: String,
    },
}

/// Runs file-system operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FsAction {
    name_node: Option<String>,
    job_xmls: Vec<String>,
    configuration: Configuration,
    operations: Vec<FsOperation>,
}

impl FsAction {
    /// Returns the name node address.
    #[must_use]
    pub fn name_node(&self) -> Option<&str> {
        self.name_node.as_deref()
    }

    /// Returns the job XML paths.
    #[must_use]
    pub fn job_xmls(&self) -> &[String] {
        &self.job_xmls
    }

    /// Returns the operations in execution order.
    #[must_use]
    pub fn operations(&self) -> &[FsOperation] {
        &self.operations
    }
}

impl Action for FsAction {
    fn kind(&self) -> &'static str {
        "fs"
    }

    fn configuration(&self) -> Option<&Configuration> {
        Some(&self.configuration)
    }
}

/// Builds nodes running an [`FsAction`].
#[derive(Debug, Clone, Default)]
pub struct FsActionBuilder {
    base: NodeBuilderBase,
    name_node: ModifyOnce<String>,
    job_xmls: Vec<String>,
    configuration: ConfigurationBuilder,
    operations: Vec<FsOperation>,
}

impl FsActionBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose action fields default to `action`.
    #[must_use]
    pub fn from_action(action: &FsAction) -> Self {
        Self {
            base: NodeBuilderBase::new(),
            name_node: ModifyOnce::from_option(action.name_node.clone()),
            job_xmls: action.job_xmls.clone(),
            configuration: ConfigurationBuilder::from_configuration(&action.configuration),
            operations: action.operations.clone(),
        }
    }

    /// Creates a builder reproducing every field of an existing node.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::ActionKindMismatch`] if the node is not an fs
    /// action.
    pub fn from_existing(node: &Node) -> Result<Self, DagError> {
        let action = existing_action::<FsAction>(node, "fs")?;
        Ok(Self {
            base: NodeBuilderBase::from_node(node),
            ..Self::from_action(action)
        })
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

    /// Appends an operation.
    pub fn with_operation(&mut self, operation: FsOperation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    /// Removes the first matching operation.
    pub fn without_operation(&mut self, operation: &FsOperation) -> &mut Self {
        remove_first(&mut self.operations, operation);
        self
    }

    /// Removes all operations.
    pub fn clear_operations(&mut self) -> &mut Self {
        self.operations.clear();
        self
    }

    /// Appends a delete operation.
    pub fn with_delete(&mut self, path: impl Into<String>, skip_trash: bool) -> &mut Self {
        self.with_operation(FsOperation::Delete {
            path: path.into(),
            skip_trash,
        })
    }

    /// Appends a mkdir operation.
    pub fn with_mkdir(&mut self, path: impl Into<String>) -> &mut Self {
        self.with_operation(FsOperation::Mkdir { path: path.into() })
    }

    /// Appends a move operation.
    pub fn with_move(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.with_operation(FsOperation::Move {
            source: source.into(),
            target: target.into(),
        })
    }

    /// Appends a chmod operation.
    pub fn with_chmod(
        &mut self,
        path: impl Into<String>,
        permissions: impl Into<String>,
        dir_files: bool,
        recursive: bool,
    ) -> &mut Self {
        self.with_operation(FsOperation::Chmod {
            path: path.into(),
            permissions: permissions.into(),
            dir_files,
            recursive,
        })
    }

    /// Appends a touchz operation.
    pub fn with_touchz(&mut self, path: impl Into<String>) -> &mut Self {
        self.with_operation(FsOperation::Touchz { path: path.into() })
    }

    /// Realizes the action without building a node.
    #[must_use]
    pub fn build_action(&self) -> FsAction {
        FsAction {
            name_node: self.name_node.cloned(),
            job_xmls: self.job_xmls.clone(),
            configuration: self.configuration.build(),
            operations: self.operations.clone(),
        }
    }
}

impl NodeBuilder for FsActionBuilder {
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

impl ConfigurableBuilder for FsActionBuilder {
    fn configuration_mut(&mut self) -> &mut ConfigurationBuilder {
        &mut self.configuration
    }
}
