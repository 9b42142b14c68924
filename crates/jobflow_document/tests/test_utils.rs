//! Shared test utilities for `jobflow_document` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities — not all items used in every test binary"
)]

use std::sync::Arc;

use hashbrown::HashSet;
use jobflow_dag::prelude::*;
use jobflow_document::prelude::*;
use proptest::prelude::*;
use serde::Serialize;

// ═══════════════════════════════════════════════════════════════════════════════
// DAG HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds a shell node with unconditional parents.
pub fn shell(dag: &mut Dag, name: &str, parents: &[NodeId]) -> NodeId {
    shell_with_handler(dag, name, parents, None)
}

/// Builds a shell node with unconditional parents and an optional handler.
pub fn shell_with_handler(
    dag: &mut Dag,
    name: &str,
    parents: &[NodeId],
    handler: Option<&ErrorHandler>,
) -> NodeId {
    let mut builder = ShellActionBuilder::new();
    builder
        .with_name(name)
        .expect("fresh builder")
        .with_executable(format!("{name}.sh"))
        .expect("fresh builder");
    for parent in parents {
        builder.with_parent(*parent).expect("distinct parents");
    }
    if let Some(handler) = handler {
        builder
            .with_error_handler(handler.clone())
            .expect("fresh builder");
    }
    builder.build(dag).expect("valid node")
}

/// Builds a shell node under `parent` with a labeled condition.
pub fn when(dag: &mut Dag, name: &str, parent: NodeId, label: &str) -> NodeId {
    let mut builder = ShellActionBuilder::new();
    builder
        .with_name(name)
        .expect("fresh builder")
        .with_parent_with_condition(parent, label)
        .expect("fresh builder");
    builder.build(dag).expect("valid node")
}

/// Builds a shell node as the default branch under `parent`.
pub fn otherwise(dag: &mut Dag, name: &str, parent: NodeId) -> NodeId {
    let mut builder = ShellActionBuilder::new();
    builder
        .with_name(name)
        .expect("fresh builder")
        .with_parent_default_conditional(parent)
        .expect("fresh builder");
    builder.build(dag).expect("valid node")
}

/// Builds an email error handler.
pub fn email_handler(name: &str) -> ErrorHandler {
    let mut builder = EmailActionBuilder::new();
    builder
        .with_name(name)
        .expect("fresh builder")
        .with_recipient("ops@example.com")
        .with_subject(format!("{name} fired"))
        .expect("fresh builder");
    ErrorHandler::build_as_error_handler(&builder).expect("valid handler")
}

/// Builds a workflow holding every node of `dag`.
pub fn workflow_of(dag: &Dag) -> Workflow {
    let mut builder = WorkflowBuilder::new();
    builder.with_name("wf").expect("fresh builder");
    for node in dag.nodes() {
        builder.with_dag_containing_node(node.id());
    }
    builder.build(dag).expect("valid workflow")
}

/// Translates every node of `dag` with the default translator.
pub fn translate(dag: &Dag) -> Result<WorkflowApp, DocumentError> {
    Translator::new().translate(&workflow_of(dag))
}

// ═══════════════════════════════════════════════════════════════════════════════
// CUSTOM ACTION
// ═══════════════════════════════════════════════════════════════════════════════

/// An action kind unknown to the built-in mappings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Notify {
    pub channel: String,
}

impl Action for Notify {
    fn kind(&self) -> &'static str {
        "notify"
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotifyBuilder {
    base: NodeBuilderBase,
    pub channel: String,
}

impl NotifyBuilder {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            base: NodeBuilderBase::default(),
            channel: channel.into(),
        }
    }
}

impl NodeBuilder for NotifyBuilder {
    fn base(&self) -> &NodeBuilderBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBuilderBase {
        &mut self.base
    }

    fn action(&self) -> Arc<dyn Action> {
        Arc::new(Notify {
            channel: self.channel.clone(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT INSPECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Returns every transition target in the document.
pub fn transition_targets(document: &WorkflowApp) -> Vec<String> {
    let mut targets = vec![document.start.to.clone()];
    for element in &document.elements {
        match element {
            Element::Decision(decision) => {
                targets.extend(decision.switch.cases.iter().map(|case| case.to.clone()));
                targets.push(decision.switch.default.to.clone());
            }
            Element::Fork(fork) => {
                targets.extend(fork.paths.iter().map(|path| path.start.clone()));
            }
            Element::Join(join) => targets.push(join.to.clone()),
            Element::Kill(_) => {}
            Element::Action(action) => {
                targets.push(action.ok.clone());
                targets.push(action.error.clone());
            }
        }
    }
    targets
}

/// Returns the names a transition may target: every element and the end.
pub fn known_names(document: &WorkflowApp) -> HashSet<String> {
    let mut names: HashSet<String> = document
        .elements
        .iter()
        .map(|element| element.name().to_string())
        .collect();
    names.insert(document.end.name.clone());
    names
}

/// Returns the position of the element named `name`.
pub fn position(document: &WorkflowApp, name: &str) -> usize {
    document
        .elements
        .iter()
        .position(|element| element.name() == name)
        .unwrap_or_else(|| panic!("no element named {name}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATORS
// ═══════════════════════════════════════════════════════════════════════════════

/// A DAG made of layers, each node depending on every node of the layer
/// before. Wide layers are separated by single-node layers, so every fan-out
/// has a matching fan-in.
#[derive(Debug, Clone)]
pub struct LayeredDag {
    pub widths: Vec<usize>,
    /// Handler index per node, in creation order.
    pub handlers: Vec<Option<usize>>,
}

impl LayeredDag {
    pub fn node_count(&self) -> usize {
        self.widths.iter().sum()
    }

    pub fn build(&self, handlers: &[ErrorHandler]) -> Dag {
        let mut dag = Dag::new();
        let mut previous: Vec<NodeId> = Vec::new();
        let mut index = 0;

        for (layer, width) in self.widths.iter().enumerate() {
            let mut current = Vec::with_capacity(*width);
            for slot in 0..*width {
                let handler = self
                    .handlers
                    .get(index)
                    .copied()
                    .flatten()
                    .map(|h| &handlers[h % handlers.len()]);
                let name = format!("l{layer}_{slot}");
                current.push(shell_with_handler(&mut dag, &name, &previous, handler));
                index += 1;
            }
            previous = current;
        }
        dag
    }
}

pub fn arb_layered_dag() -> impl Strategy<Value = LayeredDag> {
    prop::collection::vec(1..=3usize, 1..=4)
        .prop_map(|wide| {
            let mut widths = Vec::with_capacity(wide.len() * 2);
            for width in wide {
                widths.push(1);
                widths.push(width);
            }
            widths
        })
        .prop_flat_map(|widths| {
            let count: usize = widths.iter().sum();
            let handlers = prop::collection::vec(prop::option::of(0..3usize), count);
            (Just(widths), handlers)
        })
        .prop_map(|(widths, handlers)| LayeredDag { widths, handlers })
}
