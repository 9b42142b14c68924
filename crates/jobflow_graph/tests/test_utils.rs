//! Shared test utilities for `jobflow_graph` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities — not all items used in every test binary"
)]

use jobflow_dag::prelude::*;
use jobflow_graph::prelude::*;
use proptest::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════════
// DAG HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds a shell node with unconditional parents.
pub fn add(dag: &mut Dag, name: &str, parents: &[NodeId]) -> NodeId {
    let mut builder = ShellActionBuilder::new();
    builder.with_name(name).expect("fresh builder");
    for parent in parents {
        builder.with_parent(*parent).expect("distinct parents");
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

/// Builds a workflow holding every node of `dag`.
pub fn workflow_of(dag: &Dag) -> Workflow {
    let mut builder = WorkflowBuilder::new();
    builder.with_name("wf").expect("fresh builder");
    for node in dag.nodes() {
        builder.with_dag_containing_node(node.id());
    }
    builder.build(dag).expect("valid workflow")
}

/// Lowers every node of `dag`.
pub fn lower(dag: &Dag) -> Result<Graph, GraphError> {
    Graph::from_workflow(&workflow_of(dag))
}

// ═══════════════════════════════════════════════════════════════════════════════
// GRAPH INSPECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Returns the node named `name`.
pub fn named<'a>(graph: &'a Graph, name: &str) -> &'a GraphNode {
    graph
        .find_by_name(name)
        .unwrap_or_else(|| panic!("no node named {name}"))
}

/// Returns the names of a node's children.
pub fn children_of(graph: &Graph, name: &str) -> Vec<String> {
    named(graph, name)
        .children()
        .into_iter()
        .map(|id| graph.node(id).expect("child exists").name().to_string())
        .collect()
}

/// Returns the names of a node's parents.
pub fn parents_of(graph: &Graph, name: &str) -> Vec<String> {
    named(graph, name)
        .parents()
        .iter()
        .map(|id| graph.node(*id).expect("parent exists").name().to_string())
        .collect()
}

/// Counts nodes by kind label.
pub fn count_kind(graph: &Graph, label: &str) -> usize {
    graph
        .nodes()
        .filter(|node| node.kind().label() == label)
        .count()
}

// ═══════════════════════════════════════════════════════════════════════════════
// FRAGMENT DSL
// ═══════════════════════════════════════════════════════════════════════════════

/// A structured DAG fragment with a single entry and a single exit.
///
/// `Par` and `Branch` arms each start with a fresh node and end in a shared
/// merge node, so every generated DAG can be nested into fork/join and
/// decision blocks.
#[derive(Debug, Clone)]
pub enum Fragment {
    Track,
    Seq(Vec<Fragment>),
    Par(Vec<Fragment>),
    Branch(Vec<Fragment>),
}

/// How a fragment's entry attaches to its predecessor.
#[derive(Debug, Clone)]
pub enum Entry {
    Root,
    After(NodeId),
    When(NodeId, String),
    Otherwise(NodeId),
}

#[derive(Debug, Default)]
pub struct FragmentBuilder {
    pub dag: Dag,
    counter: usize,
}

impl FragmentBuilder {
    fn node(&mut self, prefix: &str, entry: &Entry, extra_parents: &[NodeId]) -> NodeId {
        self.counter += 1;
        let mut builder = ShellActionBuilder::new();
        builder
            .with_name(format!("{prefix}{}", self.counter))
            .expect("fresh builder");
        match entry {
            Entry::Root => {}
            Entry::After(parent) => {
                builder.with_parent(*parent).expect("distinct parents");
            }
            Entry::When(parent, label) => {
                builder
                    .with_parent_with_condition(*parent, label.clone())
                    .expect("distinct parents");
            }
            Entry::Otherwise(parent) => {
                builder
                    .with_parent_default_conditional(*parent)
                    .expect("distinct parents");
            }
        }
        for parent in extra_parents {
            builder.with_parent(*parent).expect("distinct parents");
        }
        builder.build(&mut self.dag).expect("structured fragment")
    }

    /// Builds `fragment` after `entry` and returns its exit node.
    pub fn build(&mut self, fragment: &Fragment, entry: Entry) -> NodeId {
        match fragment {
            Fragment::Track => self.node("t", &entry, &[]),
            Fragment::Seq(parts) => {
                let mut entry = entry;
                let mut exit = None;
                for part in parts {
                    let out = self.build(part, entry);
                    exit = Some(out);
                    entry = Entry::After(out);
                }
                exit.unwrap_or_else(|| self.node("t", &entry, &[]))
            }
            Fragment::Par(arms) => {
                let exits: Vec<NodeId> = arms
                    .iter()
                    .map(|arm| {
                        let head = self.node("p", &entry, &[]);
                        self.build(arm, Entry::After(head))
                    })
                    .collect();
                self.node("j", &Entry::Root, &exits)
            }
            Fragment::Branch(arms) => {
                let owner = self.node("d", &entry, &[]);
                let last = arms.len() - 1;
                let exits: Vec<NodeId> = arms
                    .iter()
                    .enumerate()
                    .map(|(index, arm)| {
                        let arm_entry = if index == last {
                            Entry::Otherwise(owner)
                        } else {
                            Entry::When(owner, format!("${{case == {index}}}"))
                        };
                        let head = self.node("c", &arm_entry, &[]);
                        self.build(arm, Entry::After(head))
                    })
                    .collect();
                self.node("m", &Entry::Root, &exits)
            }
        }
    }
}

impl Fragment {
    /// Number of `Par` fragments, which must each lower to one fork.
    pub fn forks(&self) -> usize {
        match self {
            Fragment::Track => 0,
            Fragment::Seq(parts) => parts.iter().map(Fragment::forks).sum(),
            Fragment::Par(arms) => 1 + arms.iter().map(Fragment::forks).sum::<usize>(),
            Fragment::Branch(arms) => arms.iter().map(Fragment::forks).sum(),
        }
    }

    /// Number of `Branch` fragments, which must each lower to one decision.
    pub fn decisions(&self) -> usize {
        match self {
            Fragment::Track => 0,
            Fragment::Seq(parts) => parts.iter().map(Fragment::decisions).sum(),
            Fragment::Par(arms) => arms.iter().map(Fragment::decisions).sum(),
            Fragment::Branch(arms) => 1 + arms.iter().map(Fragment::decisions).sum::<usize>(),
        }
    }
}

/// Generates a random fragment tree of the given depth.
pub fn arb_fragment(depth: u32) -> BoxedStrategy<Fragment> {
    if depth == 0 {
        Just(Fragment::Track).boxed()
    } else {
        prop_oneof![
            Just(Fragment::Track),
            prop::collection::vec(arb_fragment(depth - 1), 1..=3usize).prop_map(Fragment::Seq),
            prop::collection::vec(arb_fragment(depth - 1), 2..=3usize).prop_map(Fragment::Par),
            prop::collection::vec(arb_fragment(depth - 1), 2..=3usize).prop_map(Fragment::Branch),
        ]
        .boxed()
    }
}
