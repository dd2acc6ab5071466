// src/context.rs
//! The molecule-building context: vocabulary, sizing constants and the
//! translation between actions, action indices, graphs and molecules.
//!
//! An **action index** is a triple `(action type, row, column)`:
//!
//! | Action type   | Row                                  | Column                                |
//! |---------------|--------------------------------------|---------------------------------------|
//! | `Stop`        | 0                                    | 0                                     |
//! | `AddNode`     | source node                          | element in `atoms`                    |
//! | `SetNodeAttr` | node                                 | non-default `(attr, value)` logit     |
//! | `AddEdge`     | column of `non_edge_index`           | 0                                     |
//! | `SetEdgeAttr` | undirected edge (duplicated row / 2) | non-default `(attr, value)` logit     |
//!
//! Index 0 of every attribute's value list is its default. Input features
//! one-hot encode every value including the default; logit columns only
//! cover the non-default values.
//!
//! # Quick Start
//!
//! ```
//! use molbuild::context::{ActionIndex, MolBuildingEnvContext};
//! use molbuild::env::{GraphAction, GraphBuildingEnv};
//! use molbuild::graph::AttrValue;
//!
//! let ctx = MolBuildingEnvContext::default();
//! let env = GraphBuildingEnv::default();
//! let carbon = GraphAction::AddNode { source: 0, value: AttrValue::symbol("C") };
//! let g = env.step(&env.new_graph(), &carbon).unwrap();
//!
//! let data = ctx.graph_to_data(&g).unwrap();
//! let action = GraphAction::AddNode { source: 0, value: AttrValue::symbol("O") };
//! let idx = ctx.graph_action_to_aidx(&data, &action).unwrap();
//! assert_eq!(idx, ActionIndex::new(1, 0, 3));
//! assert_eq!(ctx.aidx_to_graph_action(&data, idx).unwrap(), action);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::path::Path;

use ndarray::{Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chem::{self, Atom, BondType, ChiralType, Element, Mol};
use crate::data::{GraphBatch, GraphData};
use crate::env::{EnvError, GraphAction, GraphActionType};
use crate::graph::{AttrValue, EdgeAttr, EdgeAttrs, Graph, NodeAttr, NodeAttrs};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Upper bound accepted for [`ContextConfig::max_explicit_hs`].
pub const MAX_EXPLICIT_HS: u8 = 8;

/// Vocabulary configuration of a [`MolBuildingEnvContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Element symbols that `AddNode` may create; the first is the default.
    pub atoms: Vec<String>,
    /// Width of the conditioning vector the model receives.
    pub num_cond_dim: usize,
    /// Allowed formal charges; must start with 0.
    pub charges: Vec<i32>,
    /// Largest explicit hydrogen count; the vocabulary is `0..=max`. At most
    /// [`MAX_EXPLICIT_HS`].
    pub max_explicit_hs: u8,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            atoms: ["H", "C", "N", "O", "F"].map(String::from).to_vec(),
            num_cond_dim: 0,
            charges: vec![0, 1, -1],
            max_explicit_hs: 3,
        }
    }
}

impl ContextConfig {
    /// Default configuration with a custom atom list.
    pub fn with_atoms<S: AsRef<str>>(atoms: &[S]) -> Self {
        Self {
            atoms: atoms.iter().map(|a| a.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// `EnvError::Json` for malformed JSON.
    pub fn from_json_str(json: &str) -> Result<Self, EnvError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    ///
    /// # Errors
    ///
    /// `EnvError::Io` when the file cannot be read, `EnvError::Json` when it
    /// cannot be decoded.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), EnvError> {
        if self.atoms.is_empty() {
            return Err(EnvError::InvalidConfig("atom list is empty".into()));
        }
        let mut seen = HashSet::new();
        for atom in &self.atoms {
            Element::from_symbol(atom)
                .map_err(|_| EnvError::InvalidConfig(format!("unknown element {atom}")))?;
            if !seen.insert(atom) {
                return Err(EnvError::InvalidConfig(format!("duplicate atom {atom}")));
            }
        }
        if self.charges.first() != Some(&0) {
            return Err(EnvError::InvalidConfig("charges must start with 0".into()));
        }
        let distinct: HashSet<_> = self.charges.iter().collect();
        if distinct.len() != self.charges.len() {
            return Err(EnvError::InvalidConfig("duplicate charge".into()));
        }
        if self.max_explicit_hs > MAX_EXPLICIT_HS {
            return Err(EnvError::InvalidConfig(format!(
                "max_explicit_hs {} exceeds {MAX_EXPLICIT_HS}",
                self.max_explicit_hs
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Action index
// ─────────────────────────────────────────────────────────────────────────────

/// Dense action index: `(action type ordinal, row, column)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionIndex {
    /// Ordinal in [`GraphActionType::ORDER`].
    pub action_type: usize,
    /// Node, edge or non-edge row.
    pub row: usize,
    /// Logit column within the action type.
    pub col: usize,
}

impl ActionIndex {
    /// Build an index from its parts.
    pub fn new(action_type: usize, row: usize, col: usize) -> Self {
        Self { action_type, row, col }
    }
}

impl From<(usize, usize, usize)> for ActionIndex {
    fn from((action_type, row, col): (usize, usize, usize)) -> Self {
        Self::new(action_type, row, col)
    }
}

impl From<ActionIndex> for (usize, usize, usize) {
    fn from(idx: ActionIndex) -> Self {
        (idx.action_type, idx.row, idx.col)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attribute tables
// ─────────────────────────────────────────────────────────────────────────────

/// Value lists of one family of attributes (node or edge) with their input
/// and logit layouts.
#[derive(Debug, Clone)]
struct AttrTable<A> {
    values: BTreeMap<A, Vec<AttrValue>>,
    slice: BTreeMap<A, usize>,
    logit_slice: BTreeMap<A, usize>,
    logit_map: Vec<(A, AttrValue)>,
    size: usize,
}

impl<A: Copy + Ord + Display> AttrTable<A> {
    /// `values` must cover every attribute; `without_logits` are attributes
    /// that are never set through a logit.
    fn new(values: BTreeMap<A, Vec<AttrValue>>, without_logits: &[A]) -> Self {
        let mut slice = BTreeMap::new();
        let mut logit_slice = BTreeMap::new();
        let mut logit_map = Vec::new();
        let (mut offset, mut logit_offset) = (0, 0);
        for (attr, vals) in &values {
            slice.insert(*attr, offset);
            logit_slice.insert(*attr, logit_offset);
            offset += vals.len();
            logit_offset += vals.len() - 1;
            if !without_logits.contains(attr) {
                logit_map.extend(vals.iter().skip(1).map(|v| (*attr, v.clone())));
            }
        }
        Self {
            values,
            slice,
            logit_slice,
            logit_map,
            size: offset,
        }
    }

    fn values_of(&self, attr: A) -> &[AttrValue] {
        self.values.get(&attr).map_or(&[], Vec::as_slice)
    }

    fn default_of(&self, attr: A) -> Option<&AttrValue> {
        self.values_of(attr).first()
    }

    fn value_index(&self, attr: A, value: &AttrValue) -> Result<usize, EnvError> {
        self.values_of(attr)
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| EnvError::UnknownValue {
                attr: attr.to_string(),
                value: value.to_string(),
            })
    }

    /// Write the one-hot encoding of `attrs` into `row`; missing attributes
    /// encode as their default.
    fn one_hot(
        &self,
        attrs: &BTreeMap<A, AttrValue>,
        mut row: ArrayViewMut1<'_, f32>,
    ) -> Result<(), EnvError> {
        for (attr, start) in &self.slice {
            let idx = match attrs.get(attr) {
                Some(value) => self.value_index(*attr, value)?,
                None => 0,
            };
            row[start + idx] = 1.0;
        }
        Ok(())
    }

    fn logit_column(&self, attr: A, value: &AttrValue) -> Result<usize, EnvError> {
        let idx = self.value_index(attr, value)?;
        let in_map = self.logit_map.iter().any(|(a, _)| *a == attr);
        if idx == 0 || !in_map {
            return Err(EnvError::NotALogit {
                attr: attr.to_string(),
                value: value.to_string(),
            });
        }
        Ok(idx - 1 + self.logit_slice[&attr])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// Specification of how molecules are built atom by atom and attribute by
/// attribute, and the codec between actions and action indices.
#[derive(Debug, Clone)]
pub struct MolBuildingEnvContext {
    config: ContextConfig,
    atom_table: AttrTable<NodeAttr>,
    bond_table: AttrTable<EdgeAttr>,
}

impl Default for MolBuildingEnvContext {
    fn default() -> Self {
        Self::build(ContextConfig::default())
    }
}

impl MolBuildingEnvContext {
    /// Build a context from a validated configuration.
    ///
    /// # Errors
    ///
    /// `EnvError::InvalidConfig` for empty or duplicate atom lists, unknown
    /// element symbols and charge lists that do not start with 0.
    pub fn new(config: ContextConfig) -> Result<Self, EnvError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ContextConfig) -> Self {
        let atom_values = BTreeMap::from([
            (
                NodeAttr::Charge,
                config.charges.iter().copied().map(AttrValue::Int).collect(),
            ),
            (
                NodeAttr::Chirality,
                vec![
                    AttrValue::Chirality(ChiralType::Unspecified),
                    AttrValue::Chirality(ChiralType::TetrahedralCw),
                    AttrValue::Chirality(ChiralType::TetrahedralCcw),
                ],
            ),
            (
                NodeAttr::ExplicitHs,
                (0..=i32::from(config.max_explicit_hs))
                    .map(AttrValue::Int)
                    .collect(),
            ),
            (NodeAttr::NoImplicit, vec![AttrValue::Flag(false), AttrValue::Flag(true)]),
            (
                NodeAttr::Element,
                config.atoms.iter().map(|a| AttrValue::symbol(a)).collect(),
            ),
        ]);
        let bond_values = BTreeMap::from([(
            EdgeAttr::BondType,
            vec![
                AttrValue::Bond(BondType::Single),
                AttrValue::Bond(BondType::Double),
                AttrValue::Bond(BondType::Triple),
                AttrValue::Bond(BondType::Aromatic),
            ],
        )]);

        Self {
            atom_table: AttrTable::new(atom_values, &[NodeAttr::Element]),
            bond_table: AttrTable::new(bond_values, &[]),
            config,
        }
    }

    /// The configuration this context was built from.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Value list of a node attribute, default first.
    pub fn atom_attr_values(&self, attr: NodeAttr) -> &[AttrValue] {
        self.atom_table.values_of(attr)
    }

    /// Value list of an edge attribute, default first.
    pub fn bond_attr_values(&self, attr: EdgeAttr) -> &[AttrValue] {
        self.bond_table.values_of(attr)
    }

    /// `(attr, value)` behind every node logit column.
    pub fn atom_attr_logit_map(&self) -> &[(NodeAttr, AttrValue)] {
        &self.atom_table.logit_map
    }

    /// `(attr, value)` behind every edge logit column.
    pub fn bond_attr_logit_map(&self) -> &[(EdgeAttr, AttrValue)] {
        &self.bond_table.logit_map
    }

    /// Order in which models emit per-type logits.
    pub fn action_type_order(&self) -> &'static [GraphActionType] {
        &GraphActionType::ORDER
    }

    /// Number of element choices for `AddNode`.
    pub fn num_new_node_values(&self) -> usize {
        self.config.atoms.len()
    }

    /// Number of `SetNodeAttr` logit columns.
    pub fn num_node_attr_logits(&self) -> usize {
        self.atom_table.logit_map.len()
    }

    /// Width of a node feature row (one-hot attributes plus the empty flag).
    pub fn num_node_dim(&self) -> usize {
        self.atom_table.size + 1
    }

    /// Number of `SetEdgeAttr` logit columns.
    pub fn num_edge_attr_logits(&self) -> usize {
        self.bond_table.logit_map.len()
    }

    /// Width of an edge feature row.
    pub fn num_edge_dim(&self) -> usize {
        self.bond_table.size
    }

    /// Width of the conditioning vector.
    pub fn num_cond_dim(&self) -> usize {
        self.config.num_cond_dim
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Action codec
    // ─────────────────────────────────────────────────────────────────────────

    /// Translate an action index (e.g. sampled from the model's logits) into
    /// an action on the graph encoded by `g`.
    ///
    /// # Errors
    ///
    /// `EnvError::UnknownActionType` for ordinals past `SetEdgeAttr`,
    /// `EnvError::RowOutOfRange` / `EnvError::ColumnOutOfRange` for indices
    /// outside the graph's candidates.
    pub fn aidx_to_graph_action(
        &self,
        g: &GraphData,
        idx: ActionIndex,
    ) -> Result<GraphAction, EnvError> {
        let action_type = GraphActionType::from_ordinal(idx.action_type)?;
        let ActionIndex { row, col, .. } = idx;
        let row_error = |rows: usize| EnvError::RowOutOfRange { action_type, row, rows };
        let col_error = |cols: usize| EnvError::ColumnOutOfRange { action_type, col, cols };

        match action_type {
            GraphActionType::Stop => Ok(GraphAction::Stop),
            GraphActionType::AddNode => {
                if row >= g.num_node_rows() {
                    return Err(row_error(g.num_node_rows()));
                }
                let atoms = self.atom_table.values_of(NodeAttr::Element);
                let value = atoms.get(col).ok_or_else(|| col_error(atoms.len()))?;
                Ok(GraphAction::AddNode {
                    source: row,
                    value: value.clone(),
                })
            }
            GraphActionType::SetNodeAttr => {
                if row >= g.num_node_rows() {
                    return Err(row_error(g.num_node_rows()));
                }
                let (attr, value) = self
                    .atom_table
                    .logit_map
                    .get(col)
                    .ok_or_else(|| col_error(self.num_node_attr_logits()))?;
                Ok(GraphAction::SetNodeAttr {
                    source: row,
                    attr: *attr,
                    value: value.clone(),
                })
            }
            GraphActionType::AddEdge => {
                let (source, target) = g.non_edge(row).ok_or_else(|| row_error(g.num_non_edges()))?;
                Ok(GraphAction::AddEdge { source, target })
            }
            GraphActionType::SetEdgeAttr => {
                let (source, target) = g.edge(row).ok_or_else(|| row_error(g.num_edges()))?;
                let (attr, value) = self
                    .bond_table
                    .logit_map
                    .get(col)
                    .ok_or_else(|| col_error(self.num_edge_attr_logits()))?;
                Ok(GraphAction::SetEdgeAttr {
                    source,
                    target,
                    attr: *attr,
                    value: value.clone(),
                })
            }
        }
    }

    /// Translate an action on the graph encoded by `g` into its index.
    ///
    /// Edge actions match either orientation of their endpoints.
    ///
    /// # Errors
    ///
    /// `EnvError::UnknownValue` for values outside the vocabulary,
    /// `EnvError::NotALogit` for default values and element changes,
    /// `EnvError::EdgeNotFound` when the pair is not a candidate of `g`,
    /// `EnvError::RowOutOfRange` for unknown nodes.
    pub fn graph_action_to_aidx(
        &self,
        g: &GraphData,
        action: &GraphAction,
    ) -> Result<ActionIndex, EnvError> {
        let action_type = action.action_type();
        let node_row = |source: usize| {
            if source < g.num_node_rows() {
                Ok(source)
            } else {
                Err(EnvError::RowOutOfRange {
                    action_type,
                    row: source,
                    rows: g.num_node_rows(),
                })
            }
        };

        let (row, col) = match action {
            GraphAction::Stop => (0, 0),
            GraphAction::AddNode { source, value } => (
                node_row(*source)?,
                self.atom_table.value_index(NodeAttr::Element, value)?,
            ),
            GraphAction::SetNodeAttr { source, attr, value } => {
                (node_row(*source)?, self.atom_table.logit_column(*attr, value)?)
            }
            GraphAction::AddEdge { source, target } => (
                g.non_edge_row(*source, *target)
                    .ok_or(EnvError::EdgeNotFound(*source, *target))?,
                0,
            ),
            GraphAction::SetEdgeAttr { source, target, attr, value } => (
                g.edge_row(*source, *target)
                    .ok_or(EnvError::EdgeNotFound(*source, *target))?,
                self.bond_table.logit_column(*attr, value)?,
            ),
        };
        Ok(ActionIndex::new(action_type.ordinal(), row, col))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Graph ↔ tensors
    // ─────────────────────────────────────────────────────────────────────────

    /// Encode `g` for the model.
    ///
    /// # Errors
    ///
    /// `EnvError::UnknownValue` when an attribute value is outside the
    /// vocabulary.
    pub fn graph_to_data(&self, g: &Graph) -> Result<GraphData, EnvError> {
        let n = g.num_nodes();
        let mut x = Array2::<f32>::zeros((n.max(1), self.num_node_dim()));
        if n == 0 {
            x[[0, self.num_node_dim() - 1]] = 1.0;
        }
        for (i, attrs) in g.nodes() {
            self.atom_table.one_hot(attrs, x.row_mut(i))?;
        }

        let mut edges = Vec::with_capacity(g.num_edges());
        let mut edge_features = Array2::<f32>::zeros((g.num_edges(), self.num_edge_dim()));
        for (row, (a, b, attrs)) in g.edges().enumerate() {
            self.bond_table.one_hot(attrs, edge_features.row_mut(row))?;
            edges.push((a, b));
        }

        Ok(GraphData::new(x, &edges, &edge_features, &g.non_edges()))
    }

    /// Batch several encodings into one disjoint graph.
    ///
    /// # Errors
    ///
    /// `EnvError::ShapeMismatch` when an encoding was produced by a context
    /// with a different vocabulary.
    pub fn collate(&self, graphs: &[GraphData]) -> Result<GraphBatch, EnvError> {
        for (i, g) in graphs.iter().enumerate() {
            if g.x().ncols() != self.num_node_dim()
                || g.edge_attr().ncols() != self.num_edge_dim()
            {
                return Err(EnvError::ShapeMismatch(format!(
                    "graph {i} has {} node and {} edge features, expected {} and {}",
                    g.x().ncols(),
                    g.edge_attr().ncols(),
                    self.num_node_dim(),
                    self.num_edge_dim()
                )));
            }
        }
        let batch = GraphBatch::collate(graphs, self.num_node_dim(), self.num_edge_dim());
        debug!(graphs = graphs.len(), nodes = batch.x.nrows(), "collated graph batch");
        Ok(batch)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Graph ↔ molecule
    // ─────────────────────────────────────────────────────────────────────────

    /// Convert a molecule to a graph, storing only attributes that differ
    /// from their defaults (the element is always stored).
    pub fn mol_to_graph(&self, mol: &Mol) -> Graph {
        let mut g = Graph::new();
        for atom in mol.atoms() {
            let candidates = [
                (NodeAttr::Chirality, AttrValue::Chirality(atom.chiral_tag)),
                (NodeAttr::Charge, AttrValue::Int(atom.formal_charge)),
                (
                    NodeAttr::ExplicitHs,
                    AttrValue::Int(i32::try_from(atom.num_explicit_hs).unwrap_or(i32::MAX)),
                ),
                (NodeAttr::NoImplicit, AttrValue::Flag(atom.no_implicit)),
            ];
            let mut attrs: NodeAttrs = candidates
                .into_iter()
                .filter(|(attr, value)| self.atom_table.default_of(*attr) != Some(value))
                .collect();
            attrs.insert(NodeAttr::Element, AttrValue::symbol(atom.symbol()));
            g.add_node(attrs);
        }
        for bond in mol.bonds() {
            let value = AttrValue::Bond(bond.bond_type);
            let mut attrs = EdgeAttrs::new();
            if self.bond_table.default_of(EdgeAttr::BondType) != Some(&value) {
                attrs.insert(EdgeAttr::BondType, value);
            }
            // Bonds of a valid molecule are never self loops or duplicates.
            if let Err(err) = g.add_edge(bond.begin, bond.end, attrs) {
                debug!(%err, "skipping bond while converting molecule");
            }
        }
        g
    }

    /// Convert a graph to a sanitized molecule. Missing attributes take
    /// their defaults.
    ///
    /// # Errors
    ///
    /// `EnvError::Chem` for unknown elements and molecules that fail
    /// sanitization, `EnvError::UnknownValue` for attribute values of the
    /// wrong kind.
    pub fn graph_to_mol(&self, g: &Graph) -> Result<Mol, EnvError> {
        let mut mol = Mol::new();
        for (_, attrs) in g.nodes() {
            let element = attrs
                .get(&NodeAttr::Element)
                .or_else(|| self.atom_table.default_of(NodeAttr::Element));
            let symbol = match element {
                Some(AttrValue::Symbol(s)) => s.as_str(),
                other => return Err(wrong_kind(NodeAttr::Element, other)),
            };
            let mut atom = Atom::from_symbol(symbol)?;
            for (attr, value) in attrs {
                match (attr, value) {
                    (NodeAttr::Element, _) => {}
                    (NodeAttr::Chirality, AttrValue::Chirality(c)) => atom.chiral_tag = *c,
                    (NodeAttr::Charge, AttrValue::Int(c)) => atom.formal_charge = *c,
                    (NodeAttr::ExplicitHs, AttrValue::Int(h)) => {
                        atom.num_explicit_hs =
                            u32::try_from(*h).map_err(|_| wrong_kind(*attr, Some(value)))?;
                    }
                    (NodeAttr::NoImplicit, AttrValue::Flag(f)) => atom.no_implicit = *f,
                    _ => return Err(wrong_kind(*attr, Some(value))),
                }
            }
            mol.add_atom(atom);
        }
        for (a, b, attrs) in g.edges() {
            let bond_type = match attrs.get(&EdgeAttr::BondType) {
                None => BondType::Single,
                Some(AttrValue::Bond(t)) => *t,
                other => return Err(wrong_kind(EdgeAttr::BondType, other)),
            };
            mol.add_bond(a, b, bond_type)?;
        }
        mol.sanitize()?;
        Ok(mol)
    }

    /// Whether `g` converts to a molecule that survives a SMILES round trip.
    pub fn is_sane(&self, g: &Graph) -> bool {
        let checked = self
            .graph_to_mol(g)
            .and_then(|mol| chem::from_smiles(&chem::to_smiles(&mol)).map_err(EnvError::from));
        match checked {
            Ok(_) => true,
            Err(err) => {
                debug!(%err, "graph is not a sane molecule");
                false
            }
        }
    }
}

fn wrong_kind(attr: impl Display, value: Option<&AttrValue>) -> EnvError {
    EnvError::UnknownValue {
        attr: attr.to_string(),
        value: value.map_or_else(|| "<missing>".to_string(), ToString::to_string),
    }
}
