//! Lowering a [`Workflow`] into a structural [`Graph`].
//!
//! User DAGs only say which node follows which. Lowering makes the control
//! flow explicit by nesting fork/join and decision/decision-join blocks,
//! which requires every group of branches to merge again at a single node
//! (or at the end).
//!
//! The merge point of a node's branches is its immediate post-dominator: the
//! first node every path from it must pass through. A virtual sink after all
//! leaves stands for "the end of the workflow".

use core::cmp::Reverse;
use std::collections::BinaryHeap;

use hashbrown::{HashMap, HashSet};
use jobflow_dag::{Condition, ErrorHandler, Node, NodeId, Workflow};
use tracing::{debug, trace};

use crate::error::GraphError;
use crate::graph::{END_NAME, Graph, GraphNodeId, KILL_NAME, START_NAME};

/// The pending edge into the next lowered node.
#[derive(Debug, Clone)]
struct Link {
    from: GraphNodeId,
    condition: Option<Condition>,
}

impl Link {
    fn plain(from: GraphNodeId) -> Self {
        Self {
            from,
            condition: None,
        }
    }

    fn conditional(from: GraphNodeId, condition: Condition) -> Self {
        Self {
            from,
            condition: Some(condition),
        }
    }
}

/// Deterministic names for structural nodes, skipping names already taken.
#[derive(Debug, Default)]
struct NameGenerator {
    used: HashSet<String>,
    counters: HashMap<&'static str, usize>,
}

impl NameGenerator {
    fn next(&mut self, prefix: &'static str) -> String {
        loop {
            let counter = self.counters.entry(prefix).or_insert(0);
            *counter += 1;
            let name = format!("{prefix}_{counter}");
            if self.used.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// Per-lowering state.
struct Lowering<'a> {
    workflow: &'a Workflow,
    /// The workflow's nodes, indexed by arena position.
    nodes: Vec<&'a Node>,
    graph: Graph,
    names: NameGenerator,
    /// Index standing for the virtual sink.
    sink: usize,
    /// Position of each user node in topological order; the sink sorts last.
    order: Vec<usize>,
    /// Immediate post-dominator of each user node.
    merge_point: Vec<usize>,
    /// Post-dominator sets, used to find the merge point of the roots.
    post_dominators: Vec<HashSet<usize>>,
    lowered: Vec<bool>,
}

impl Graph {
    /// Lowers a workflow into a structural graph.
    ///
    /// # Errors
    ///
    /// - [`GraphError::ReservedName`] if a node or error handler is named
    ///   `start`, `end` or `kill`.
    /// - [`GraphError::Cycle`] if the nodes form a cycle. A
    ///   [`jobflow_dag::Dag`] only links a node to parents inserted before
    ///   it, so workflows built from one never hit this.
    /// - [`GraphError::MissingDefault`] if a node has conditional children
    ///   but no default branch.
    /// - [`GraphError::UnstructuredBranch`] if branches merge in a way that
    ///   cannot be nested.
    pub fn from_workflow(workflow: &Workflow) -> Result<Self, GraphError> {
        let mut names = NameGenerator::default();
        for node in workflow.nodes() {
            let handler = node.error_handler().map(ErrorHandler::name);
            for name in core::iter::once(node.name()).chain(handler) {
                if [START_NAME, END_NAME, KILL_NAME].contains(&name) {
                    return Err(GraphError::ReservedName {
                        name: name.to_string(),
                    });
                }
                names.used.insert(name.to_string());
            }
        }

        let topological = topological_order(workflow)?;
        let lowering = Lowering::new(workflow, names, &topological);
        lowering.run()
    }
}

/// Orders the nodes so that parents precede children, breaking ties by
/// arena order.
fn topological_order(workflow: &Workflow) -> Result<Vec<usize>, GraphError> {
    let count = workflow.dag().len();
    let mut in_degree: Vec<usize> = workflow.nodes().map(|node| node.parents().len()).collect();
    let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
        .filter(|i| in_degree[*i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(count);

    while let Some(Reverse(current)) = ready.pop() {
        order.push(current);
        if let Some(node) = workflow.node(NodeId::new(current)) {
            for child in node.all_children() {
                in_degree[child.index()] -= 1;
                if in_degree[child.index()] == 0 {
                    ready.push(Reverse(child.index()));
                }
            }
        }
    }

    if order.len() < count {
        let stuck = (0..count)
            .find(|i| in_degree[*i] > 0)
            .and_then(|i| workflow.node(NodeId::new(i)))
            .map(|node| node.name().to_string())
            .unwrap_or_default();
        return Err(GraphError::Cycle { node: stuck });
    }

    Ok(order)
}

impl<'a> Lowering<'a> {
    fn new(workflow: &'a Workflow, names: NameGenerator, topological: &[usize]) -> Self {
        let count = workflow.dag().len();
        let sink = count;

        let mut order = vec![0; count + 1];
        for (position, index) in topological.iter().enumerate() {
            order[*index] = position;
        }
        order[sink] = usize::MAX;

        let mut post_dominators: Vec<HashSet<usize>> = vec![HashSet::new(); count + 1];
        post_dominators[sink].insert(sink);

        for index in topological.iter().rev() {
            let children: Vec<usize> = workflow
                .node(NodeId::new(*index))
                .map(|node| node.all_children().iter().map(NodeId::index).collect())
                .unwrap_or_default();

            let mut set = intersect(&post_dominators, &children, sink);
            set.insert(*index);
            post_dominators[*index] = set;
        }

        let merge_point = (0..count)
            .map(|index| {
                nearest(
                    post_dominators[index].iter().copied().filter(|p| *p != index),
                    &order,
                    sink,
                )
            })
            .collect();

        Self {
            workflow,
            nodes: workflow.nodes().collect(),
            graph: Graph::named(workflow.name()),
            names,
            sink,
            order,
            merge_point,
            post_dominators,
            lowered: vec![false; count],
        }
    }

    fn run(mut self) -> Result<Graph, GraphError> {
        let start = self.graph.add_start();
        let end = self.graph.add_end();

        let roots: Vec<usize> = self.workflow.roots().iter().map(NodeId::index).collect();
        let merge = nearest(
            intersect(&self.post_dominators, &roots, self.sink).into_iter(),
            &self.order,
            self.sink,
        );

        let link = self.parallel(Link::plain(start), &roots, merge)?;
        let link = self.chain(link, merge, self.sink)?;
        self.attach(link, end)?;

        self.graph.add_kill();

        if let Some(missed) = self.lowered.iter().position(|lowered| !lowered) {
            return Err(self.unstructured(missed));
        }

        debug!(
            workflow = %self.graph.name(),
            nodes = self.graph.len(),
            "lowered workflow"
        );
        Ok(self.graph)
    }

    /// Lowers the nodes from `first` up to, but excluding, `stop`.
    ///
    /// Returns the link out of the last lowered node, or `link` itself when
    /// the range is empty.
    fn chain(&mut self, mut link: Link, first: usize, stop: usize) -> Result<Link, GraphError> {
        let mut current = first;

        while current != stop {
            if current == self.sink {
                return Err(self.unstructured(first));
            }

            let id = self.explicit(current)?;
            self.attach(link, id)?;
            link = Link::plain(id);

            let next = self.merge_point[current];
            let node = self.user_node(current);
            let conditional = node.children_with_conditions().to_vec();
            let plain: Vec<usize> = node
                .children_without_conditions()
                .iter()
                .map(NodeId::index)
                .collect();

            if !conditional.is_empty() {
                let branches = conditional
                    .into_iter()
                    .map(|child| (child.node.index(), child.condition))
                    .collect::<Vec<_>>();
                link = self.decision(link, current, &branches, next)?;
            } else if !plain.is_empty() {
                link = self.parallel(link, &plain, next)?;
            }

            current = next;
        }

        Ok(link)
    }

    /// Lowers unconditional branches that merge at `merge`.
    fn parallel(&mut self, link: Link, children: &[usize], merge: usize) -> Result<Link, GraphError> {
        let branches: Vec<usize> = children.iter().copied().filter(|c| *c != merge).collect();

        match branches.as_slice() {
            [] => Ok(link),
            [only] => self.chain(link, *only, merge),
            _ => {
                let fork = self.graph.add_fork(self.names.next("fork"));
                let join = self.graph.add_join(self.names.next("join"));
                debug!(
                    fork = %self.graph_name(fork),
                    branches = branches.len(),
                    "inserting fork"
                );
                self.attach(link, fork)?;

                for branch in branches.iter().copied() {
                    let out = self.chain(Link::plain(fork), branch, merge)?;
                    self.attach(out, join)?;
                }

                Ok(Link::plain(join))
            }
        }
    }

    /// Lowers the conditional branches of `owner` that merge at `merge`.
    fn decision(
        &mut self,
        link: Link,
        owner: usize,
        branches: &[(usize, Condition)],
        merge: usize,
    ) -> Result<Link, GraphError> {
        if !branches.iter().any(|(_, condition)| condition.is_default()) {
            return Err(GraphError::MissingDefault {
                node: self.user_node(owner).name().to_string(),
            });
        }

        let decision = self.graph.add_decision(self.names.next("decision"));
        let merge_node = self.graph.add_decision_join(self.names.next("decision_join"));
        debug!(
            decision = %self.graph_name(decision),
            branches = branches.len(),
            "inserting decision"
        );
        self.attach(link, decision)?;

        for (child, condition) in branches {
            let out = self.chain(
                Link::conditional(decision, condition.clone()),
                *child,
                merge,
            )?;
            self.attach(out, merge_node)?;
        }

        Ok(Link::plain(merge_node))
    }

    fn explicit(&mut self, index: usize) -> Result<GraphNodeId, GraphError> {
        if self.lowered[index] {
            return Err(self.unstructured(index));
        }
        self.lowered[index] = true;

        let node = self.user_node(index);
        trace!(node = %node.name(), "lowering node");
        Ok(self.graph.add_explicit(
            node.name(),
            node.id(),
            node.action_arc(),
            node.error_handler().cloned(),
        ))
    }

    fn attach(&mut self, link: Link, to: GraphNodeId) -> Result<(), GraphError> {
        match link.condition {
            Some(condition) => self.graph.connect_with_condition(link.from, to, condition),
            None => self.graph.connect(link.from, to),
        }
    }

    fn user_node(&self, index: usize) -> &'a Node {
        self.nodes[index]
    }

    fn graph_name(&self, id: GraphNodeId) -> &str {
        self.graph.get(id).map_or("", |node| node.name())
    }

    fn unstructured(&self, index: usize) -> GraphError {
        GraphError::UnstructuredBranch {
            node: self
                .nodes
                .get(index)
                .map(|node| node.name().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Intersects the post-dominator sets of `nodes`. No nodes means the sink.
fn intersect(sets: &[HashSet<usize>], nodes: &[usize], sink: usize) -> HashSet<usize> {
    let mut iter = nodes.iter();
    let Some(first) = iter.next() else {
        return HashSet::from([sink]);
    };

    let mut result = sets[*first].clone();
    for node in iter {
        result.retain(|candidate| sets[*node].contains(candidate));
    }
    result
}

/// Returns the candidate that comes first in topological order.
fn nearest(candidates: impl Iterator<Item = usize>, order: &[usize], sink: usize) -> usize {
    candidates.min_by_key(|c| order[*c]).unwrap_or(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_order_is_already_topological() {
        use jobflow_dag::action::EmailActionBuilder;
        use jobflow_dag::{Dag, NodeBuilder, WorkflowBuilder};

        let mut dag = Dag::new();
        let mut ids = Vec::new();
        for (name, parents) in [("a", vec![]), ("b", vec![]), ("c", vec![1]), ("d", vec![0, 2])] {
            let mut builder = EmailActionBuilder::new();
            builder.with_name(name).unwrap();
            for parent in parents {
                builder.with_parent(ids[parent]).unwrap();
            }
            ids.push(builder.build(&mut dag).unwrap());
        }
        let mut workflow = WorkflowBuilder::new();
        workflow.with_name("wf").unwrap().with_dag_containing_node(ids[0]);
        let workflow = workflow.build(&dag).unwrap();

        assert_eq!(topological_order(&workflow).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn names_skip_taken_ones() {
        let mut names = NameGenerator::default();
        names.used.insert("fork_1".to_string());

        assert_eq!(names.next("fork"), "fork_2");
        assert_eq!(names.next("join"), "join_1");
        assert_eq!(names.next("fork"), "fork_3");
    }

    #[test]
    fn intersect_of_nothing_is_the_sink() {
        let sets = vec![HashSet::from([0, 2]), HashSet::from([1, 2]), HashSet::from([2])];
        assert_eq!(intersect(&sets, &[], 2), HashSet::from([2]));
        assert_eq!(intersect(&sets, &[0, 1], 2), HashSet::from([2]));
        assert_eq!(intersect(&sets, &[0], 2), HashSet::from([0, 2]));
    }

    #[test]
    fn nearest_prefers_earlier_topological_position() {
        let order = vec![2, 0, 1, usize::MAX];
        assert_eq!(nearest([0, 2, 3].into_iter(), &order, 3), 2);
        assert_eq!(nearest(core::iter::empty(), &order, 3), 3);
    }
}
