//! Workflows: named, self-contained sets of nodes.
//!
//! A [`WorkflowBuilder`] collects entry nodes and discovers everything
//! connected to them, in either direction. The resulting [`Workflow`] owns a
//! copy of those nodes in its own [`Dag`], so later changes to the source
//! arena do not affect it.

use std::collections::VecDeque;

use hashbrown::HashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dag::Dag;
use crate::error::DagError;
use crate::modify_once::ModifyOnce;
use crate::node::{Node, NodeId};

// ─────────────────────────────────────────────────────────────────────────────
// Workflow-level declarations
// ─────────────────────────────────────────────────────────────────────────────

/// A workflow parameter, optionally with a default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Defaults applied to every action of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Global {
    /// Default job tracker address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_tracker: Option<String>,
    /// Default name node address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_node: Option<String>,
    /// Job XML paths shared by all actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_xmls: Vec<String>,
    /// Configuration shared by all actions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub configuration: IndexMap<String, String>,
}

impl Global {
    /// Creates empty defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default job tracker.
    #[must_use]
    pub fn with_job_tracker(mut self, job_tracker: impl Into<String>) -> Self {
        self.job_tracker = Some(job_tracker.into());
        self
    }

    /// Sets the default name node.
    #[must_use]
    pub fn with_name_node(mut self, name_node: impl Into<String>) -> Self {
        self.name_node = Some(name_node.into());
        self
    }

    /// Adds a shared job XML path.
    #[must_use]
    pub fn with_job_xml(mut self, path: impl Into<String>) -> Self {
        self.job_xmls.push(path.into());
        self
    }

    /// Adds a shared configuration property.
    #[must_use]
    pub fn with_config_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }
}

/// Credentials an action may need to reach a secured service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Name actions use to refer to this credential.
    pub name: String,
    /// Credential type understood by the engine.
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Type-specific properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,
}

impl Credential {
    /// Creates a credential without properties.
    #[must_use]
    pub fn new(name: impl Into<String>, credential_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential_type: credential_type.into(),
            properties: IndexMap::new(),
        }
    }

    /// Adds a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workflow
// ─────────────────────────────────────────────────────────────────────────────

/// A named set of nodes with pairwise distinct names.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    dag: Dag,
    roots: Vec<NodeId>,
    parameters: Vec<Parameter>,
    global: Option<Global>,
    credentials: Vec<Credential>,
}

impl Workflow {
    fn new(
        name: String,
        dag: Dag,
        parameters: Vec<Parameter>,
        global: Option<Global>,
        credentials: Vec<Credential>,
    ) -> Result<Self, DagError> {
        check_unique_names(&name, &dag)?;

        let roots = dag
            .nodes()
            .filter(|node| node.parents().is_empty())
            .map(Node::id)
            .collect();

        Ok(Self {
            name,
            dag,
            roots,
            parameters,
            global,
            credentials,
        })
    }

    /// Returns the workflow's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the workflow's own node arena.
    #[must_use]
    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    /// Iterates over the nodes in arena order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.dag.nodes()
    }

    /// Returns the node with the given id, or `None` if it is not part of
    /// this workflow's arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.dag.get(id)
    }

    /// Returns the nodes without parents of either kind, in arena order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the global defaults.
    #[must_use]
    pub fn global(&self) -> Option<&Global> {
        self.global.as_ref()
    }

    /// Returns the declared credentials.
    #[must_use]
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WorkflowBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a [`Workflow`] from the components of a [`Dag`].
///
/// # Example
///
/// ```ignore
/// let workflow = WorkflowBuilder::new()
///     .with_name("nightly")?
///     .with_dag_containing_node(extract)
///     .build(&dag)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorkflowBuilder {
    name: ModifyOnce<String>,
    entries: Vec<NodeId>,
    parameters: Vec<Parameter>,
    global: ModifyOnce<Global>,
    credentials: Vec<Credential>,
}

impl WorkflowBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the workflow's name.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the name was already set.
    pub fn with_name(&mut self, name: impl Into<String>) -> Result<&mut Self, DagError> {
        self.name.set(name.into(), "workflow name")?;
        Ok(self)
    }

    /// Includes the whole connected component containing `node`.
    pub fn with_dag_containing_node(&mut self, node: NodeId) -> &mut Self {
        self.entries.push(node);
        self
    }

    /// Declares a parameter with a default value.
    pub fn with_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parameters.push(Parameter {
            name: name.into(),
            value: Some(value.into()),
            description: None,
        });
        self
    }

    /// Declares a parameter with a description and an optional default.
    pub fn with_parameter_description(
        &mut self,
        name: impl Into<String>,
        value: Option<String>,
        description: impl Into<String>,
    ) -> &mut Self {
        self.parameters.push(Parameter {
            name: name.into(),
            value,
            description: Some(description.into()),
        });
        self
    }

    /// Sets the global defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DagError::AlreadySet`] if the defaults were already set.
    pub fn with_global(&mut self, global: Global) -> Result<&mut Self, DagError> {
        self.global.set(global, "global")?;
        Ok(self)
    }

    /// Declares a credential.
    pub fn with_credential(&mut self, credential: Credential) -> &mut Self {
        self.credentials.push(credential);
        self
    }

    /// Builds the workflow from the components of `dag` holding the queued
    /// nodes.
    ///
    /// # Errors
    ///
    /// - [`DagError::MissingName`] if no name was set.
    /// - [`DagError::UnknownNode`] if a queued node is not part of `dag`.
    /// - [`DagError::DuplicateName`] if two collected nodes share a name.
    pub fn build(&self, dag: &Dag) -> Result<Workflow, DagError> {
        let name = self
            .name
            .cloned()
            .ok_or(DagError::MissingName { what: "workflow" })?;

        let mut visited = HashSet::new();
        for entry in &self.entries {
            dag.node(*entry)?;
            if !visited.contains(entry) {
                collect_component(dag, *entry, &mut visited)?;
            }
        }

        let mut ids: Vec<NodeId> = visited.into_iter().collect();
        ids.sort_unstable();

        debug!(
            workflow = %name,
            entries = self.entries.len(),
            nodes = ids.len(),
            "collected workflow nodes"
        );

        Workflow::new(
            name,
            dag.subset(&ids),
            self.parameters.clone(),
            self.global.cloned(),
            self.credentials.clone(),
        )
    }
}

/// Breadth-first search over parents and children, adding every reached node
/// to `visited`.
fn collect_component(
    dag: &Dag,
    start: NodeId,
    visited: &mut HashSet<NodeId>,
) -> Result<(), DagError> {
    let mut queue = VecDeque::from([start]);
    visited.insert(start);

    while let Some(current) = queue.pop_front() {
        let node = dag.node(current)?;
        for next in node.parents().into_iter().chain(node.all_children()) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    Ok(())
}

/// Fails on the first node whose name was already used by an earlier node.
fn check_unique_names(workflow: &str, dag: &Dag) -> Result<(), DagError> {
    let mut names = HashSet::new();
    for node in dag.nodes() {
        if !names.insert(node.name()) {
            return Err(DagError::DuplicateName {
                name: node.name().to_string(),
                workflow: workflow.to_string(),
            });
        }
    }
    Ok(())
}
