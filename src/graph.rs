// src/graph.rs
//! Attributed, undirected molecular graph.
//!
//! Nodes are addressed by dense indices in insertion order and carry an
//! optional set of [`NodeAttr`] attributes; edges keep the orientation they
//! were inserted with and carry optional [`EdgeAttr`] attributes. A missing
//! attribute stands for that attribute's default value.
//!
//! | Attribute | Name      | Values                                   |
//! |-----------|-----------|------------------------------------------|
//! | node      | `charge`  | formal charge                            |
//! | node      | `chi`     | tetrahedral chirality tag                |
//! | node      | `expl_H`  | explicit hydrogen count                  |
//! | node      | `no_impl` | no-implicit-hydrogen flag                |
//! | node      | `v`       | element symbol                           |
//! | edge      | `type`    | bond type                                |
//!
//! The declaration order of the attribute enums is the lexicographic order of
//! their names; feature vectors and logit columns are laid out in that order.

use std::collections::BTreeMap;
use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::chem::{BondType, ChiralType};
use crate::env::EnvError;

/// Node attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeAttr {
    /// `charge`: formal charge.
    #[serde(rename = "charge")]
    Charge,
    /// `chi`: chirality tag.
    #[serde(rename = "chi")]
    Chirality,
    /// `expl_H`: explicit hydrogens.
    #[serde(rename = "expl_H")]
    ExplicitHs,
    /// `no_impl`: no implicit hydrogens.
    #[serde(rename = "no_impl")]
    NoImplicit,
    /// `v`: element symbol.
    #[serde(rename = "v")]
    Element,
}

impl NodeAttr {
    /// All node attributes in canonical order.
    pub const ALL: [NodeAttr; 5] = [
        NodeAttr::Charge,
        NodeAttr::Chirality,
        NodeAttr::ExplicitHs,
        NodeAttr::NoImplicit,
        NodeAttr::Element,
    ];

    /// Short attribute name.
    pub fn name(self) -> &'static str {
        match self {
            NodeAttr::Charge => "charge",
            NodeAttr::Chirality => "chi",
            NodeAttr::ExplicitHs => "expl_H",
            NodeAttr::NoImplicit => "no_impl",
            NodeAttr::Element => "v",
        }
    }
}

impl fmt::Display for NodeAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Edge attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeAttr {
    /// `type`: bond type.
    #[serde(rename = "type")]
    BondType,
}

impl EdgeAttr {
    /// All edge attributes in canonical order.
    pub const ALL: [EdgeAttr; 1] = [EdgeAttr::BondType];

    /// Short attribute name.
    pub fn name(self) -> &'static str {
        match self {
            EdgeAttr::BondType => "type",
        }
    }
}

impl fmt::Display for EdgeAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of a node or edge attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrValue {
    /// Element symbol.
    Symbol(String),
    /// Chirality tag.
    Chirality(ChiralType),
    /// Integer-valued attribute (charge, hydrogen count).
    Int(i32),
    /// Boolean flag.
    Flag(bool),
    /// Bond type.
    Bond(BondType),
}

impl AttrValue {
    /// Shorthand for `AttrValue::Symbol`.
    pub fn symbol(symbol: &str) -> Self {
        AttrValue::Symbol(symbol.to_string())
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Symbol(s) => f.write_str(s),
            AttrValue::Chirality(c) => f.write_str(c.name()),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Flag(b) => write!(f, "{b}"),
            AttrValue::Bond(b) => f.write_str(b.name()),
        }
    }
}

/// Attributes of one node.
pub type NodeAttrs = BTreeMap<NodeAttr, AttrValue>;

/// Attributes of one edge.
pub type EdgeAttrs = BTreeMap<EdgeAttr, AttrValue>;

/// Undirected attributed graph backed by `petgraph`.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: UnGraph<NodeAttrs, EdgeAttrs>,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.num_nodes() == 0
    }

    /// Whether `node` exists.
    pub fn has_node(&self, node: usize) -> bool {
        node < self.num_nodes()
    }

    /// Append a node and return its index.
    pub fn add_node(&mut self, attrs: NodeAttrs) -> usize {
        self.inner.add_node(attrs).index()
    }

    /// Add the edge `(a, b)` and return its index.
    ///
    /// # Errors
    ///
    /// `EnvError::NodeOutOfRange`, `EnvError::SelfLoop` or
    /// `EnvError::DuplicateEdge`.
    pub fn add_edge(&mut self, a: usize, b: usize, attrs: EdgeAttrs) -> Result<usize, EnvError> {
        for node in [a, b] {
            if !self.has_node(node) {
                return Err(EnvError::NodeOutOfRange(node));
            }
        }
        if a == b {
            return Err(EnvError::SelfLoop(a));
        }
        if self.has_edge(a, b) {
            return Err(EnvError::DuplicateEdge(a, b));
        }
        Ok(self
            .inner
            .add_edge(NodeIndex::new(a), NodeIndex::new(b), attrs)
            .index())
    }

    /// Whether `a` and `b` are adjacent.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edge_between(a, b).is_some()
    }

    /// Index of the edge joining `a` and `b`, in either orientation.
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        if !self.has_node(a) || !self.has_node(b) {
            return None;
        }
        self.inner
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .map(EdgeIndex::index)
    }

    /// Attributes of `node`.
    pub fn node_attrs(&self, node: usize) -> Option<&NodeAttrs> {
        self.inner.node_weight(NodeIndex::new(node))
    }

    /// Mutable attributes of `node`.
    pub fn node_attrs_mut(&mut self, node: usize) -> Option<&mut NodeAttrs> {
        self.inner.node_weight_mut(NodeIndex::new(node))
    }

    /// Attributes of edge `edge`.
    pub fn edge_attrs(&self, edge: usize) -> Option<&EdgeAttrs> {
        self.inner.edge_weight(EdgeIndex::new(edge))
    }

    /// Mutable attributes of edge `edge`.
    pub fn edge_attrs_mut(&mut self, edge: usize) -> Option<&mut EdgeAttrs> {
        self.inner.edge_weight_mut(EdgeIndex::new(edge))
    }

    /// Nodes with their attributes, in index order.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &NodeAttrs)> + '_ {
        self.inner
            .node_indices()
            .map(move |idx| (idx.index(), &self.inner[idx]))
    }

    /// Edges `(a, b, attrs)` in insertion order and stored orientation.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &EdgeAttrs)> + '_ {
        self.inner
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight()))
    }

    /// Number of neighbours of `node`.
    pub fn degree(&self, node: usize) -> usize {
        if !self.has_node(node) {
            return 0;
        }
        self.inner.neighbors(NodeIndex::new(node)).count()
    }

    /// Edges of the complement graph: every `(i, j)` with `i < j` that is not
    /// an edge, in lexicographic order.
    pub fn non_edges(&self) -> Vec<(usize, usize)> {
        let n = self.num_nodes();
        let pairs = n * n.saturating_sub(1) / 2;
        let mut out = Vec::with_capacity(pairs.saturating_sub(self.num_edges()));
        for i in 0..n {
            for j in i + 1..n {
                if !self.has_edge(i, j) {
                    out.push((i, j));
                }
            }
        }
        out
    }
}

impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.num_nodes() == other.num_nodes()
            && self.num_edges() == other.num_edges()
            && self.nodes().eq(other.nodes())
            && self.edges().eq(other.edges())
    }
}

impl Eq for Graph {}
