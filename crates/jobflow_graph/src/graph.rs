//! Structural graph nodes and the graph arena.
//!
//! A [`Graph`] makes control flow explicit: execution begins at a single
//! start node, parallel branches open with a fork and close with a join,
//! conditional branches open with a decision and close with a decision join,
//! and every successful path ends at the single end node. Edge mutations are
//! checked against each kind's cardinality when they happen.
//!
//! | Kind | Parents | Children |
//! |------|---------|----------|
//! | Start | none | at most one |
//! | End | at most one | none |
//! | Kill | none | none |
//! | Decision | at most one | conditional only, one default |
//! | Fork | at most one | any number |
//! | Join | any number | at most one |
//! | `DecisionJoin` | any number | at most one |
//! | Explicit | at most one | at most one |

use core::fmt;
use std::sync::Arc;

use jobflow_dag::{Action, Condition, ErrorHandler, NodeId};

use crate::error::GraphError;

/// Name of the start node.
pub const START_NAME: &str = "start";
/// Name of the end node.
pub const END_NAME: &str = "end";
/// Name of the kill node.
pub const KILL_NAME: &str = "kill";

/// Identifier of a node inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphNodeId(pub(crate) usize);

impl GraphNodeId {
    /// Creates a graph node id from a raw index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for GraphNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph_node_{}", self.0)
    }
}

/// A conditional edge out of a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionBranch {
    /// The branch target.
    pub target: GraphNodeId,
    /// The condition selecting this branch.
    pub condition: Condition,
}

/// A user node carried into the structural graph.
#[derive(Debug, Clone)]
pub struct ExplicitNode {
    /// The node's id in the workflow it came from.
    pub source: NodeId,
    /// The node's realized action.
    pub action: Arc<dyn Action>,
    /// The node's error handler.
    pub error_handler: Option<ErrorHandler>,
    /// The next node on success.
    pub child: Option<GraphNodeId>,
}

/// Kind-specific data of a [`GraphNode`], including its outgoing edges.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The single entry point.
    Start {
        /// The first node to run.
        child: Option<GraphNodeId>,
    },
    /// The single successful exit.
    End,
    /// The single failure exit, target of error transitions only.
    Kill,
    /// Chooses one branch by condition.
    Decision {
        /// Branches in declaration order, including the default.
        branches: Vec<DecisionBranch>,
    },
    /// Opens parallel branches.
    Fork {
        /// Branch entries in declaration order.
        branches: Vec<GraphNodeId>,
    },
    /// Closes parallel branches.
    Join {
        /// The node after the join.
        child: Option<GraphNodeId>,
    },
    /// Closes the mutually exclusive branches of a decision.
    DecisionJoin {
        /// The node after the merge.
        child: Option<GraphNodeId>,
    },
    /// Wraps one user node.
    Explicit(ExplicitNode),
}

impl NodeKind {
    /// Returns a short name for the kind.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Start { .. } => "start",
            NodeKind::End => "end",
            NodeKind::Kill => "kill",
            NodeKind::Decision { .. } => "decision",
            NodeKind::Fork { .. } => "fork",
            NodeKind::Join { .. } => "join",
            NodeKind::DecisionJoin { .. } => "decision join",
            NodeKind::Explicit(_) => "action",
        }
    }

    fn max_parents(&self) -> Option<usize> {
        match self {
            NodeKind::Start { .. } | NodeKind::Kill => Some(0),
            NodeKind::End
            | NodeKind::Decision { .. }
            | NodeKind::Fork { .. }
            | NodeKind::Explicit(_) => Some(1),
            NodeKind::Join { .. } | NodeKind::DecisionJoin { .. } => None,
        }
    }
}

/// A vertex of a structural graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    id: GraphNodeId,
    name: String,
    parents: Vec<GraphNodeId>,
    kind: NodeKind,
}

impl GraphNode {
    /// Returns the node's id.
    #[must_use]
    pub fn id(&self) -> GraphNodeId {
        self.id
    }

    /// Returns the node's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node's parents in the order they were linked.
    #[must_use]
    pub fn parents(&self) -> &[GraphNodeId] {
        &self.parents
    }

    /// Returns the kind-specific data.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns the wrapped user node for explicit nodes.
    #[must_use]
    pub fn as_explicit(&self) -> Option<&ExplicitNode> {
        match &self.kind {
            NodeKind::Explicit(explicit) => Some(explicit),
            _ => None,
        }
    }

    /// Returns all children, conditional ones included, in order.
    #[must_use]
    pub fn children(&self) -> Vec<GraphNodeId> {
        match &self.kind {
            NodeKind::Start { child }
            | NodeKind::Join { child }
            | NodeKind::DecisionJoin { child }
            | NodeKind::Explicit(ExplicitNode { child, .. }) => child.iter().copied().collect(),
            NodeKind::End | NodeKind::Kill => Vec::new(),
            NodeKind::Decision { branches } => branches.iter().map(|b| b.target).collect(),
            NodeKind::Fork { branches } => branches.clone(),
        }
    }

    /// Returns the single unconditional child of start, join, decision join
    /// and explicit nodes.
    #[must_use]
    pub fn child(&self) -> Option<GraphNodeId> {
        match &self.kind {
            NodeKind::Start { child }
            | NodeKind::Join { child }
            | NodeKind::DecisionJoin { child }
            | NodeKind::Explicit(ExplicitNode { child, .. }) => *child,
            _ => None,
        }
    }

    fn check_plain_child(&self) -> Result<(), GraphError> {
        match &self.kind {
            NodeKind::End | NodeKind::Kill => Err(GraphError::ChildNotAllowed {
                node: self.name.clone(),
                kind: self.kind.label(),
            }),
            NodeKind::Decision { .. } => Err(GraphError::MixedChildren {
                node: self.name.clone(),
            }),
            NodeKind::Fork { .. } => Ok(()),
            NodeKind::Start { child }
            | NodeKind::Join { child }
            | NodeKind::DecisionJoin { child }
            | NodeKind::Explicit(ExplicitNode { child, .. }) => match child {
                Some(_) => Err(GraphError::MultipleChildren {
                    node: self.name.clone(),
                }),
                None => Ok(()),
            },
        }
    }

    fn check_conditional_child(&self, condition: &Condition) -> Result<(), GraphError> {
        match &self.kind {
            NodeKind::Decision { branches } => {
                if condition.is_default() && branches.iter().any(|b| b.condition.is_default()) {
                    return Err(GraphError::MultipleDefaults {
                        node: self.name.clone(),
                    });
                }
                Ok(())
            }
            NodeKind::End | NodeKind::Kill => Err(GraphError::ChildNotAllowed {
                node: self.name.clone(),
                kind: self.kind.label(),
            }),
            _ => Err(GraphError::MixedChildren {
                node: self.name.clone(),
            }),
        }
    }

    fn check_parent(&self) -> Result<(), GraphError> {
        match self.kind.max_parents() {
            Some(0) => Err(GraphError::ParentNotAllowed {
                node: self.name.clone(),
                kind: self.kind.label(),
            }),
            Some(max) if self.parents.len() >= max => Err(GraphError::MultipleParents {
                node: self.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Stores the edge in the kind's own slot. An edge the kind has no slot
    /// for is rejected, leaving the node unchanged.
    fn push_child(
        &mut self,
        target: GraphNodeId,
        condition: Option<Condition>,
    ) -> Result<(), GraphError> {
        match (&mut self.kind, condition) {
            (NodeKind::Decision { branches }, Some(condition)) => {
                branches.push(DecisionBranch { target, condition });
            }
            (NodeKind::Fork { branches }, None) => branches.push(target),
            (
                NodeKind::Start { child }
                | NodeKind::Join { child }
                | NodeKind::DecisionJoin { child }
                | NodeKind::Explicit(ExplicitNode { child, .. }),
                None,
            ) => *child = Some(target),
            (NodeKind::End | NodeKind::Kill, _) => {
                return Err(GraphError::ChildNotAllowed {
                    node: self.name.clone(),
                    kind: self.kind.label(),
                });
            }
            _ => {
                return Err(GraphError::MixedChildren {
                    node: self.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// An arena of structural nodes.
///
/// # Example
///
/// ```ignore
/// let mut graph = Graph::new();
/// let start = graph.add_start();
/// let end = graph.add_end();
/// graph.connect(start, end)?;
/// graph.add_kill();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: String,
    nodes: Vec<GraphNode>,
    start: Option<GraphNodeId>,
    end: Option<GraphNodeId>,
    kill: Option<GraphNodeId>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph carrying a workflow name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the workflow name this graph was lowered from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn get(&self, id: GraphNodeId) -> Option<&GraphNode> {
        self.nodes.get(id.0)
    }

    /// Returns the node with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `id` is not part of this graph.
    pub fn node(&self, id: GraphNodeId) -> Result<&GraphNode, GraphError> {
        self.get(id).ok_or(GraphError::UnknownNode(id))
    }

    /// Iterates over all nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    /// Returns the node with the given name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Returns the start node.
    #[must_use]
    pub fn start(&self) -> Option<GraphNodeId> {
        self.start
    }

    /// Returns the end node.
    #[must_use]
    pub fn end(&self) -> Option<GraphNodeId> {
        self.end
    }

    /// Returns the kill node.
    #[must_use]
    pub fn kill(&self) -> Option<GraphNodeId> {
        self.kill
    }

    fn push(&mut self, name: String, kind: NodeKind) -> GraphNodeId {
        let id = GraphNodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            id,
            name,
            parents: Vec::new(),
            kind,
        });
        id
    }

    /// Adds the start node, or returns the existing one.
    pub fn add_start(&mut self) -> GraphNodeId {
        if let Some(start) = self.start {
            return start;
        }
        let id = self.push(START_NAME.to_string(), NodeKind::Start { child: None });
        self.start = Some(id);
        id
    }

    /// Adds the end node, or returns the existing one.
    pub fn add_end(&mut self) -> GraphNodeId {
        if let Some(end) = self.end {
            return end;
        }
        let id = self.push(END_NAME.to_string(), NodeKind::End);
        self.end = Some(id);
        id
    }

    /// Adds the kill node, or returns the existing one.
    pub fn add_kill(&mut self) -> GraphNodeId {
        if let Some(kill) = self.kill {
            return kill;
        }
        let id = self.push(KILL_NAME.to_string(), NodeKind::Kill);
        self.kill = Some(id);
        id
    }

    /// Adds a decision node.
    pub fn add_decision(&mut self, name: impl Into<String>) -> GraphNodeId {
        self.push(name.into(), NodeKind::Decision {
            branches: Vec::new(),
        })
    }

    /// Adds a fork node.
    pub fn add_fork(&mut self, name: impl Into<String>) -> GraphNodeId {
        self.push(name.into(), NodeKind::Fork {
            branches: Vec::new(),
        })
    }

    /// Adds a join node.
    pub fn add_join(&mut self, name: impl Into<String>) -> GraphNodeId {
        self.push(name.into(), NodeKind::Join { child: None })
    }

    /// Adds a decision join node.
    pub fn add_decision_join(&mut self, name: impl Into<String>) -> GraphNodeId {
        self.push(name.into(), NodeKind::DecisionJoin { child: None })
    }

    /// Adds an explicit node wrapping a user node.
    pub fn add_explicit(
        &mut self,
        name: impl Into<String>,
        source: NodeId,
        action: Arc<dyn Action>,
        error_handler: Option<ErrorHandler>,
    ) -> GraphNodeId {
        self.push(
            name.into(),
            NodeKind::Explicit(ExplicitNode {
                source,
                action,
                error_handler,
                child: None,
            }),
        )
    }

    /// Links `child` as the unconditional child of `parent`.
    ///
    /// Both ends are checked before either is changed.
    ///
    /// # Errors
    ///
    /// Returns the cardinality error of whichever end rejects the edge.
    pub fn connect(&mut self, parent: GraphNodeId, child: GraphNodeId) -> Result<(), GraphError> {
        self.node(parent)?.check_plain_child()?;
        self.node(child)?.check_parent()?;
        self.link(parent, child, None)
    }

    /// Links `child` under the decision `parent` with a condition.
    ///
    /// # Errors
    ///
    /// Returns the cardinality error of whichever end rejects the edge.
    pub fn connect_with_condition(
        &mut self,
        parent: GraphNodeId,
        child: GraphNodeId,
        condition: Condition,
    ) -> Result<(), GraphError> {
        self.node(parent)?.check_conditional_child(&condition)?;
        self.node(child)?.check_parent()?;
        self.link(parent, child, Some(condition))
    }

    fn link(
        &mut self,
        parent: GraphNodeId,
        child: GraphNodeId,
        condition: Option<Condition>,
    ) -> Result<(), GraphError> {
        self.nodes[parent.0].push_child(child, condition)?;
        self.nodes[child.0].parents.push(parent);
        Ok(())
    }

    /// Checks the whole graph, collecting every problem found.
    ///
    /// Edge mutations already enforce cardinality; this catches incomplete
    /// graphs such as a missing structural node or a decision without a
    /// default branch.
    ///
    /// # Errors
    ///
    /// Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<GraphError>> {
        let mut errors = Vec::new();

        for (present, name) in [
            (self.start.is_some(), START_NAME),
            (self.end.is_some(), END_NAME),
            (self.kill.is_some(), KILL_NAME),
        ] {
            if !present {
                errors.push(GraphError::MissingStructuralNode { name });
            }
        }

        for node in &self.nodes {
            if let NodeKind::Decision { branches } = &node.kind
                && !branches.iter().any(|b| b.condition.is_default())
            {
                errors.push(GraphError::MissingDefault {
                    node: node.name.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
