// src/env.rs
//! Graph-building actions and the state-transition environment.
//!
//! A molecule is built one action at a time: add a node, connect two nodes,
//! or set an attribute of a node or an edge. [`GraphBuildingEnv::step`] applies
//! an action to a graph and returns the successor; it never mutates its input.
//!
//! ```
//! use molbuild::env::{GraphAction, GraphBuildingEnv};
//! use molbuild::graph::AttrValue;
//!
//! let env = GraphBuildingEnv::default();
//! let g = env.new_graph();
//! let carbon = GraphAction::AddNode { source: 0, value: AttrValue::symbol("C") };
//! let oxygen = GraphAction::AddNode { source: 0, value: AttrValue::symbol("O") };
//! let g = env.step(&g, &carbon).unwrap();
//! let g = env.step(&g, &oxygen).unwrap();
//! assert_eq!(g.num_nodes(), 2);
//! assert!(g.has_edge(0, 1));
//! ```

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::chem::ChemError;
use crate::graph::{AttrValue, EdgeAttr, EdgeAttrs, Graph, NodeAttr, NodeAttrs};

/// Errors returned by the graph, the environment and the action codec.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A node index that does not exist.
    #[error("node {0} is out of range")]
    NodeOutOfRange(usize),

    /// An edge from a node to itself.
    #[error("self loop on node {0}")]
    SelfLoop(usize),

    /// An edge that already exists.
    #[error("edge ({0}, {1}) already exists")]
    DuplicateEdge(usize, usize),

    /// An edge that does not exist.
    #[error("edge ({0}, {1}) not found")]
    EdgeNotFound(usize, usize),

    /// An attribute that is already set on its node or edge.
    #[error("attribute {0} is already set")]
    AttributeAlreadySet(String),

    /// An action type the environment was configured to refuse.
    #[error("{0:?} actions are disabled")]
    ActionDisabled(GraphActionType),

    /// `Stop` ends a trajectory and has no successor graph.
    #[error("Stop is terminal and has no successor state")]
    StopIsTerminal,

    /// An action-type ordinal outside the known action types.
    #[error("unknown action type ordinal {0}")]
    UnknownActionType(usize),

    /// An action-index row outside the candidates of the graph.
    #[error("row {row} is out of range for {action_type:?} ({rows} rows)")]
    RowOutOfRange {
        /// Action type being decoded or encoded.
        action_type: GraphActionType,
        /// Offending row.
        row: usize,
        /// Number of valid rows.
        rows: usize,
    },

    /// An action-index column outside the logits of the action type.
    #[error("column {col} is out of range for {action_type:?} ({cols} columns)")]
    ColumnOutOfRange {
        /// Action type being decoded.
        action_type: GraphActionType,
        /// Offending column.
        col: usize,
        /// Number of valid columns.
        cols: usize,
    },

    /// A value that is not in the attribute's vocabulary.
    #[error("value {value} is not in the vocabulary of {attr}")]
    UnknownValue {
        /// Attribute name.
        attr: String,
        /// Offending value.
        value: String,
    },

    /// An attribute/value pair that has no logit column (the default value,
    /// or an attribute that is only set by `AddNode`).
    #[error("{attr}={value} has no logit column")]
    NotALogit {
        /// Attribute name.
        attr: String,
        /// Offending value.
        value: String,
    },

    /// A rejected context configuration.
    #[error("invalid context configuration: {0}")]
    InvalidConfig(String),

    /// Graph data with mismatching feature widths.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Configuration could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be decoded.
    #[error("failed to decode configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Conversion to a molecule failed.
    #[error(transparent)]
    Chem(#[from] ChemError),
}

/// Action types, in the order models emit their logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GraphActionType {
    /// End the trajectory.
    Stop,
    /// Add a node, connected to `source` when the graph is not empty.
    AddNode,
    /// Set an attribute of a node.
    SetNodeAttr,
    /// Connect two nodes.
    AddEdge,
    /// Set an attribute of an edge.
    SetEdgeAttr,
}

impl GraphActionType {
    /// All action types in ordinal order.
    pub const ORDER: [GraphActionType; 5] = [
        GraphActionType::Stop,
        GraphActionType::AddNode,
        GraphActionType::SetNodeAttr,
        GraphActionType::AddEdge,
        GraphActionType::SetEdgeAttr,
    ];

    /// Position in [`GraphActionType::ORDER`].
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Action type for an ordinal.
    ///
    /// # Errors
    ///
    /// `EnvError::UnknownActionType` for ordinals past the last type.
    pub fn from_ordinal(ordinal: usize) -> Result<Self, EnvError> {
        Self::ORDER
            .get(ordinal)
            .copied()
            .ok_or(EnvError::UnknownActionType(ordinal))
    }
}

/// One graph-building step.
///
/// Edge endpoints are unordered: `AddEdge { source: 0, target: 1 }` equals
/// `AddEdge { source: 1, target: 0 }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GraphAction {
    /// End the trajectory.
    Stop,
    /// Add a node with element `value`.
    AddNode {
        /// Node the new node is connected to (0 on an empty graph).
        source: usize,
        /// Element symbol of the new node.
        value: AttrValue,
    },
    /// Set `attr = value` on node `source`.
    SetNodeAttr {
        /// Node to modify.
        source: usize,
        /// Attribute to set.
        attr: NodeAttr,
        /// New value.
        value: AttrValue,
    },
    /// Connect `source` and `target`.
    AddEdge {
        /// One endpoint.
        source: usize,
        /// Other endpoint.
        target: usize,
    },
    /// Set `attr = value` on the edge between `source` and `target`.
    SetEdgeAttr {
        /// One endpoint.
        source: usize,
        /// Other endpoint.
        target: usize,
        /// Attribute to set.
        attr: EdgeAttr,
        /// New value.
        value: AttrValue,
    },
}

impl GraphAction {
    /// The action's type.
    pub fn action_type(&self) -> GraphActionType {
        match self {
            GraphAction::Stop => GraphActionType::Stop,
            GraphAction::AddNode { .. } => GraphActionType::AddNode,
            GraphAction::SetNodeAttr { .. } => GraphActionType::SetNodeAttr,
            GraphAction::AddEdge { .. } => GraphActionType::AddEdge,
            GraphAction::SetEdgeAttr { .. } => GraphActionType::SetEdgeAttr,
        }
    }
}

fn unordered(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

impl PartialEq for GraphAction {
    fn eq(&self, other: &Self) -> bool {
        use GraphAction::*;
        match (self, other) {
            (Stop, Stop) => true,
            (AddNode { source: s1, value: v1 }, AddNode { source: s2, value: v2 }) => {
                s1 == s2 && v1 == v2
            }
            (
                SetNodeAttr { source: s1, attr: a1, value: v1 },
                SetNodeAttr { source: s2, attr: a2, value: v2 },
            ) => s1 == s2 && a1 == a2 && v1 == v2,
            (AddEdge { source: s1, target: t1 }, AddEdge { source: s2, target: t2 }) => {
                unordered(*s1, *t1) == unordered(*s2, *t2)
            }
            (
                SetEdgeAttr { source: s1, target: t1, attr: a1, value: v1 },
                SetEdgeAttr { source: s2, target: t2, attr: a2, value: v2 },
            ) => unordered(*s1, *t1) == unordered(*s2, *t2) && a1 == a2 && v1 == v2,
            _ => false,
        }
    }
}

impl Eq for GraphAction {}

impl Hash for GraphAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.action_type().hash(state);
        match self {
            GraphAction::Stop => {}
            GraphAction::AddNode { source, value } => {
                source.hash(state);
                value.hash(state);
            }
            GraphAction::SetNodeAttr { source, attr, value } => {
                source.hash(state);
                attr.hash(state);
                value.hash(state);
            }
            GraphAction::AddEdge { source, target } => unordered(*source, *target).hash(state),
            GraphAction::SetEdgeAttr { source, target, attr, value } => {
                unordered(*source, *target).hash(state);
                attr.hash(state);
                value.hash(state);
            }
        }
    }
}

/// State-transition rules over [`Graph`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphBuildingEnv {
    /// Allow `AddEdge` between existing nodes.
    pub allow_add_edge: bool,
    /// Allow `SetNodeAttr`.
    pub allow_node_attr: bool,
    /// Allow `SetEdgeAttr`.
    pub allow_edge_attr: bool,
}

impl Default for GraphBuildingEnv {
    fn default() -> Self {
        Self {
            allow_add_edge: true,
            allow_node_attr: true,
            allow_edge_attr: true,
        }
    }
}

impl GraphBuildingEnv {
    /// The initial state: an empty graph.
    pub fn new_graph(&self) -> Graph {
        Graph::new()
    }

    /// Apply `action` to `g` and return the successor graph.
    ///
    /// # Errors
    ///
    /// Any action that is not legal in `g`: unknown nodes or edges, duplicate
    /// edges, attributes that are already set, disabled action types, and
    /// `Stop`, which has no successor.
    pub fn step(&self, g: &Graph, action: &GraphAction) -> Result<Graph, EnvError> {
        trace!(?action, nodes = g.num_nodes(), edges = g.num_edges(), "env step");
        let mut next = g.clone();
        match action {
            GraphAction::Stop => return Err(EnvError::StopIsTerminal),
            GraphAction::AddNode { source, value } => {
                let attrs = NodeAttrs::from([(NodeAttr::Element, value.clone())]);
                if g.is_empty() {
                    if *source != 0 {
                        return Err(EnvError::NodeOutOfRange(*source));
                    }
                    next.add_node(attrs);
                } else {
                    if !g.has_node(*source) {
                        return Err(EnvError::NodeOutOfRange(*source));
                    }
                    let added = next.add_node(attrs);
                    next.add_edge(*source, added, EdgeAttrs::new())?;
                }
            }
            GraphAction::AddEdge { source, target } => {
                if !self.allow_add_edge {
                    return Err(EnvError::ActionDisabled(GraphActionType::AddEdge));
                }
                next.add_edge(*source, *target, EdgeAttrs::new())?;
            }
            GraphAction::SetNodeAttr { source, attr, value } => {
                if !self.allow_node_attr {
                    return Err(EnvError::ActionDisabled(GraphActionType::SetNodeAttr));
                }
                let attrs = next
                    .node_attrs_mut(*source)
                    .ok_or(EnvError::NodeOutOfRange(*source))?;
                if attrs.contains_key(attr) {
                    return Err(EnvError::AttributeAlreadySet(attr.to_string()));
                }
                attrs.insert(*attr, value.clone());
            }
            GraphAction::SetEdgeAttr { source, target, attr, value } => {
                if !self.allow_edge_attr {
                    return Err(EnvError::ActionDisabled(GraphActionType::SetEdgeAttr));
                }
                let edge = g
                    .edge_between(*source, *target)
                    .ok_or(EnvError::EdgeNotFound(*source, *target))?;
                let attrs = next
                    .edge_attrs_mut(edge)
                    .ok_or(EnvError::EdgeNotFound(*source, *target))?;
                if attrs.contains_key(attr) {
                    return Err(EnvError::AttributeAlreadySet(attr.to_string()));
                }
                attrs.insert(*attr, value.clone());
            }
        }
        Ok(next)
    }

    /// Number of single actions that could have produced `g`.
    ///
    /// Counts edges whose endpoints both have degree above one and that carry
    /// no attributes, leaf nodes carrying nothing but their element, and every
    /// node attribute other than the element and every edge attribute.
    pub fn count_backward_transitions(&self, g: &Graph) -> usize {
        let removable_edges = g
            .edges()
            .filter(|(a, b, attrs)| g.degree(*a) > 1 && g.degree(*b) > 1 && attrs.is_empty())
            .count();
        let removable_nodes = g
            .nodes()
            .filter(|(idx, attrs)| {
                g.degree(*idx) <= 1 && attrs.keys().all(|k| *k == NodeAttr::Element)
            })
            .count();
        let node_attrs: usize = g
            .nodes()
            .map(|(_, attrs)| attrs.keys().filter(|k| **k != NodeAttr::Element).count())
            .sum();
        let edge_attrs: usize = g.edges().map(|(_, _, attrs)| attrs.len()).sum();
        removable_edges + removable_nodes + node_attrs + edge_attrs
    }
}
