//! Translation of structural graphs into workflow documents.

use hashbrown::HashSet;
use jobflow_dag::{ErrorHandler, Workflow};
use jobflow_graph::{
    END_NAME, ExplicitNode, Graph, GraphError, GraphNode, GraphNodeId, KILL_NAME, NodeKind,
    START_NAME,
};
use tracing::{debug, info, trace};

use crate::config::TranslatorConfig;
use crate::error::DocumentError;
use crate::mapping::ActionMappings;
use crate::model::{
    ActionElement, Case, DecisionElement, DefaultCase, Element, EndElement, ForkElement, ForkPath,
    JoinElement, KillElement, StartElement, Switch, WorkflowApp,
};

/// Turns workflows and structural graphs into [`WorkflowApp`] documents.
///
/// # Example
///
/// ```ignore
/// let translator = Translator::new()
///     .with_config(TranslatorConfig::new().with_kill_message("job failed"));
/// let document = translator.translate(&workflow)?;
/// println!("{}", document.to_json_pretty()?);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Translator {
    mappings: ActionMappings,
    config: TranslatorConfig,
}

impl Translator {
    /// Creates a translator with the built-in mappings and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_config(mut self, config: TranslatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the action mappings.
    #[must_use]
    pub fn with_mappings(mut self, mappings: ActionMappings) -> Self {
        self.mappings = mappings;
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Returns the action mappings.
    #[must_use]
    pub fn mappings(&self) -> &ActionMappings {
        &self.mappings
    }

    /// Returns the action mappings for registering custom kinds.
    pub fn mappings_mut(&mut self) -> &mut ActionMappings {
        &mut self.mappings
    }

    /// Lowers `workflow` and translates the result, carrying over its
    /// parameters, global defaults and credentials.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Graph`] if the workflow cannot be lowered.
    /// - Any error of [`translate_graph`](Self::translate_graph).
    pub fn translate(&self, workflow: &Workflow) -> Result<WorkflowApp, DocumentError> {
        let graph = Graph::from_workflow(workflow)?;
        let mut document = self.translate_graph(&graph)?;
        document.parameters = workflow.parameters().to_vec();
        document.global = workflow.global().cloned();
        document.credentials = workflow.credentials().to_vec();
        Ok(document)
    }

    /// Translates a structural graph.
    ///
    /// The kill element comes first, followed by one element per fork, join,
    /// decision and explicit node in graph order. Decision joins are not
    /// emitted; transitions into them go to their child instead. Each error
    /// handler is emitted once, right before the first action using it.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Graph`] if the graph lacks a structural node or a
    ///   decision lacks its default.
    /// - [`DocumentError::DanglingNode`] if a node has no target to
    ///   transition to.
    /// - [`DocumentError::DuplicateElementName`] if two elements share a
    ///   name.
    /// - Any mapping error of [`ActionMappings::map`].
    pub fn translate_graph(&self, graph: &Graph) -> Result<WorkflowApp, DocumentError> {
        if let Err(errors) = graph.validate()
            && let Some(first) = errors.into_iter().next()
        {
            return Err(first.into());
        }

        let start = graph.node(structural(graph.start(), START_NAME)?)?;
        let end = graph.node(structural(graph.end(), END_NAME)?)?;
        let kill = graph.node(structural(graph.kill(), KILL_NAME)?)?;

        let mut emitter = Emitter {
            graph,
            mappings: &self.mappings,
            end: end.name(),
            kill: kill.name(),
            names: HashSet::new(),
            handlers: Vec::new(),
            elements: Vec::new(),
        };

        emitter.claim(end.name())?;
        emitter.claim(kill.name())?;
        emitter.elements.push(Element::Kill(KillElement {
            name: kill.name().to_string(),
            message: self.config.kill_message.clone(),
        }));

        let first = start.child().ok_or_else(|| dangling(start))?;
        let start_to = emitter.resolve(first)?;

        for node in graph.nodes() {
            emitter.emit(node)?;
        }

        info!(
            workflow = %graph.name(),
            elements = emitter.elements.len(),
            handlers = emitter.handlers.len(),
            "translated workflow"
        );

        Ok(WorkflowApp {
            name: graph.name().to_string(),
            parameters: Vec::new(),
            global: None,
            credentials: Vec::new(),
            start: StartElement { to: start_to },
            elements: emitter.elements,
            end: EndElement {
                name: end.name().to_string(),
            },
        })
    }
}

/// Translates `workflow` with the default translator and renders it as
/// indented JSON.
///
/// # Errors
///
/// Any error of [`Translator::translate`] or [`WorkflowApp::to_json_pretty`].
pub fn serialize(workflow: &Workflow) -> Result<String, DocumentError> {
    Translator::new().translate(workflow)?.to_json_pretty()
}

fn structural(id: Option<GraphNodeId>, name: &'static str) -> Result<GraphNodeId, DocumentError> {
    id.ok_or(DocumentError::Graph(GraphError::MissingStructuralNode { name }))
}

fn dangling(node: &GraphNode) -> DocumentError {
    DocumentError::DanglingNode {
        node: node.name().to_string(),
    }
}

/// Per-document state.
struct Emitter<'a> {
    graph: &'a Graph,
    mappings: &'a ActionMappings,
    end: &'a str,
    kill: &'a str,
    names: HashSet<String>,
    /// Handlers already emitted, compared by identity.
    handlers: Vec<ErrorHandler>,
    elements: Vec<Element>,
}

impl Emitter<'_> {
    fn claim(&mut self, name: &str) -> Result<(), DocumentError> {
        if self.names.insert(name.to_string()) {
            Ok(())
        } else {
            Err(DocumentError::DuplicateElementName {
                name: name.to_string(),
            })
        }
    }

    /// Returns the element name a transition into `id` targets.
    fn resolve(&self, id: GraphNodeId) -> Result<String, DocumentError> {
        let mut current = self.graph.node(id)?;

        // Bounded so that a hand-built loop of decision joins cannot hang.
        for _ in 0..=self.graph.len() {
            match current.kind() {
                NodeKind::DecisionJoin { child } => {
                    let next = child.ok_or_else(|| dangling(current))?;
                    current = self.graph.node(next)?;
                }
                _ => return Ok(current.name().to_string()),
            }
        }
        Err(dangling(current))
    }

    fn emit(&mut self, node: &GraphNode) -> Result<(), DocumentError> {
        let element = match node.kind() {
            NodeKind::Start { .. }
            | NodeKind::End
            | NodeKind::Kill
            | NodeKind::DecisionJoin { .. } => return Ok(()),
            NodeKind::Decision { branches } => {
                let mut cases = Vec::new();
                let mut default = None;
                for branch in branches {
                    let to = self.resolve(branch.target)?;
                    match branch.condition.label() {
                        Some(label) => cases.push(Case {
                            to,
                            condition: label.to_string(),
                        }),
                        None => default = Some(DefaultCase { to }),
                    }
                }
                let default = default.ok_or_else(|| GraphError::MissingDefault {
                    node: node.name().to_string(),
                })?;
                Element::Decision(DecisionElement {
                    name: node.name().to_string(),
                    switch: Switch { cases, default },
                })
            }
            NodeKind::Fork { branches } => {
                if branches.is_empty() {
                    return Err(dangling(node));
                }
                let mut paths = Vec::with_capacity(branches.len());
                for branch in branches {
                    paths.push(ForkPath {
                        start: self.resolve(*branch)?,
                    });
                }
                Element::Fork(ForkElement {
                    name: node.name().to_string(),
                    paths,
                })
            }
            NodeKind::Join { child } => {
                let next = child.ok_or_else(|| dangling(node))?;
                Element::Join(JoinElement {
                    name: node.name().to_string(),
                    to: self.resolve(next)?,
                })
            }
            NodeKind::Explicit(explicit) => Element::Action(self.action(node, explicit)?),
        };

        self.claim(element.name())?;
        trace!(element = %element.name(), "emitting element");
        self.elements.push(element);
        Ok(())
    }

    fn action(
        &mut self,
        node: &GraphNode,
        explicit: &ExplicitNode,
    ) -> Result<ActionElement, DocumentError> {
        let payload = self.mappings.map(node.name(), explicit.action.as_ref())?;

        let ok = match explicit.child {
            Some(child) => self.resolve(child)?,
            None => self.end.to_string(),
        };

        let error = match &explicit.error_handler {
            Some(handler) => {
                self.handler(handler)?;
                handler.name().to_string()
            }
            None => self.kill.to_string(),
        };

        Ok(ActionElement {
            name: node.name().to_string(),
            payload,
            ok,
            error,
        })
    }

    /// Emits `handler` unless this exact handler was emitted before.
    fn handler(&mut self, handler: &ErrorHandler) -> Result<(), DocumentError> {
        if self.handlers.iter().any(|seen| seen.ptr_eq(handler)) {
            return Ok(());
        }

        self.claim(handler.name())?;
        let payload = self.mappings.map(handler.name(), handler.action())?;
        debug!(handler = %handler.name(), "emitting error handler");

        self.elements.push(Element::Action(ActionElement {
            name: handler.name().to_string(),
            payload,
            ok: self.kill.to_string(),
            error: self.kill.to_string(),
        }));
        self.handlers.push(handler.clone());
        Ok(())
    }
}
