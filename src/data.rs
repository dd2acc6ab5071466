// src/data.rs
//! Tensor encodings of graphs for a neural action head.
//!
//! [`GraphData`] is the per-graph encoding produced by
//! [`crate::context::MolBuildingEnvContext::graph_to_data`]:
//!
//! | Field            | Shape                     | Content                                     |
//! |------------------|---------------------------|---------------------------------------------|
//! | `x`              | `(max(1, n), node_dim)`   | one-hot node features + empty-graph flag    |
//! | `edge_index`     | `(2, 2·E)`                | each edge as `(i, j)` then `(j, i)`         |
//! | `edge_attr`      | `(2·E, edge_dim)`         | one-hot edge features, duplicated           |
//! | `non_edge_index` | `(2, K)`                  | complement-graph pairs `(i, j)`, `i < j`    |
//!
//! Alongside the arrays it keeps hash indices from an unordered node pair to
//! its undirected edge row and to its non-edge row, so that encoding edge
//! actions is a lookup instead of a scan.
//!
//! [`GraphBatch`] concatenates several encodings with node offsets applied,
//! recording which graph every node, edge and non-edge column belongs to.

use std::collections::HashMap;

use ndarray::{s, Array2};

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Encoding of one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphData {
    x: Array2<f32>,
    edge_index: Array2<usize>,
    edge_attr: Array2<f32>,
    non_edge_index: Array2<usize>,
    edge_rows: HashMap<(usize, usize), usize>,
    non_edge_rows: HashMap<(usize, usize), usize>,
}

impl GraphData {
    /// Assemble an encoding from its node features, edges in stored
    /// orientation, one edge-feature row per edge, and non-edges.
    pub(crate) fn new(
        x: Array2<f32>,
        edges: &[(usize, usize)],
        edge_features: &Array2<f32>,
        non_edges: &[(usize, usize)],
    ) -> Self {
        let num_edges = edges.len();
        let mut edge_index = Array2::<usize>::zeros((2, 2 * num_edges));
        let mut edge_attr = Array2::<f32>::zeros((2 * num_edges, edge_features.ncols()));
        let mut edge_rows = HashMap::with_capacity(num_edges);
        for (row, &(a, b)) in edges.iter().enumerate() {
            edge_index[[0, 2 * row]] = a;
            edge_index[[1, 2 * row]] = b;
            edge_index[[0, 2 * row + 1]] = b;
            edge_index[[1, 2 * row + 1]] = a;
            edge_attr.row_mut(2 * row).assign(&edge_features.row(row));
            edge_attr.row_mut(2 * row + 1).assign(&edge_features.row(row));
            edge_rows.insert(pair_key(a, b), row);
        }

        let mut non_edge_index = Array2::<usize>::zeros((2, non_edges.len()));
        let mut non_edge_rows = HashMap::with_capacity(non_edges.len());
        for (row, &(a, b)) in non_edges.iter().enumerate() {
            non_edge_index[[0, row]] = a;
            non_edge_index[[1, row]] = b;
            non_edge_rows.insert(pair_key(a, b), row);
        }

        Self {
            x,
            edge_index,
            edge_attr,
            non_edge_index,
            edge_rows,
            non_edge_rows,
        }
    }

    /// Node feature matrix.
    pub fn x(&self) -> &Array2<f32> {
        &self.x
    }

    /// Duplicated (bidirectional) edge index, shape `(2, 2·E)`.
    pub fn edge_index(&self) -> &Array2<usize> {
        &self.edge_index
    }

    /// Duplicated edge features, shape `(2·E, edge_dim)`.
    pub fn edge_attr(&self) -> &Array2<f32> {
        &self.edge_attr
    }

    /// Complement-graph pairs, shape `(2, K)`.
    pub fn non_edge_index(&self) -> &Array2<usize> {
        &self.non_edge_index
    }

    /// Number of node rows (1 for the empty graph).
    pub fn num_node_rows(&self) -> usize {
        self.x.nrows()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edge_index.ncols() / 2
    }

    /// Number of non-edges.
    pub fn num_non_edges(&self) -> usize {
        self.non_edge_index.ncols()
    }

    /// Endpoints of undirected edge `row`, in stored orientation.
    pub fn edge(&self, row: usize) -> Option<(usize, usize)> {
        (row < self.num_edges())
            .then(|| (self.edge_index[[0, 2 * row]], self.edge_index[[1, 2 * row]]))
    }

    /// Endpoints of non-edge `row`.
    pub fn non_edge(&self, row: usize) -> Option<(usize, usize)> {
        (row < self.num_non_edges())
            .then(|| (self.non_edge_index[[0, row]], self.non_edge_index[[1, row]]))
    }

    /// Undirected edge row of `{a, b}`.
    pub fn edge_row(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_rows.get(&pair_key(a, b)).copied()
    }

    /// Non-edge row of `{a, b}`.
    pub fn non_edge_row(&self, a: usize, b: usize) -> Option<usize> {
        self.non_edge_rows.get(&pair_key(a, b)).copied()
    }
}

/// Several [`GraphData`] collated into one disjoint graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphBatch {
    /// Stacked node features.
    pub x: Array2<f32>,
    /// Edge index with node offsets applied.
    pub edge_index: Array2<usize>,
    /// Stacked edge features.
    pub edge_attr: Array2<f32>,
    /// Non-edge index with node offsets applied.
    pub non_edge_index: Array2<usize>,
    /// Graph of every node row.
    pub batch: Vec<usize>,
    /// Graph of every `edge_index` column.
    pub edge_index_batch: Vec<usize>,
    /// Graph of every `non_edge_index` column.
    pub non_edge_index_batch: Vec<usize>,
    /// Node-row offsets, one per graph plus the total.
    pub ptr: Vec<usize>,
}

impl GraphBatch {
    /// Number of collated graphs.
    pub fn num_graphs(&self) -> usize {
        self.ptr.len().saturating_sub(1)
    }

    /// Stack `graphs`; every graph must use `node_dim` and `edge_dim` columns.
    pub(crate) fn collate(graphs: &[GraphData], node_dim: usize, edge_dim: usize) -> Self {
        let rows: usize = graphs.iter().map(GraphData::num_node_rows).sum();
        let edge_cols: usize = graphs.iter().map(|g| g.edge_index.ncols()).sum();
        let non_edge_cols: usize = graphs.iter().map(GraphData::num_non_edges).sum();

        let mut x = Array2::<f32>::zeros((rows, node_dim));
        let mut edge_index = Array2::<usize>::zeros((2, edge_cols));
        let mut edge_attr = Array2::<f32>::zeros((edge_cols, edge_dim));
        let mut non_edge_index = Array2::<usize>::zeros((2, non_edge_cols));
        let mut batch = Vec::with_capacity(rows);
        let mut edge_index_batch = Vec::with_capacity(edge_cols);
        let mut non_edge_index_batch = Vec::with_capacity(non_edge_cols);
        let mut ptr = Vec::with_capacity(graphs.len() + 1);

        let (mut node_off, mut edge_off, mut non_edge_off) = (0, 0, 0);
        ptr.push(0);
        for (gi, g) in graphs.iter().enumerate() {
            let n = g.num_node_rows();
            let e = g.edge_index.ncols();
            let k = g.num_non_edges();

            x.slice_mut(s![node_off..node_off + n, ..]).assign(&g.x);
            edge_attr
                .slice_mut(s![edge_off..edge_off + e, ..])
                .assign(&g.edge_attr);
            edge_index
                .slice_mut(s![.., edge_off..edge_off + e])
                .assign(&g.edge_index.mapv(|v| v + node_off));
            non_edge_index
                .slice_mut(s![.., non_edge_off..non_edge_off + k])
                .assign(&g.non_edge_index.mapv(|v| v + node_off));

            batch.extend(std::iter::repeat(gi).take(n));
            edge_index_batch.extend(std::iter::repeat(gi).take(e));
            non_edge_index_batch.extend(std::iter::repeat(gi).take(k));

            node_off += n;
            edge_off += e;
            non_edge_off += k;
            ptr.push(node_off);
        }

        Self {
            x,
            edge_index,
            edge_attr,
            non_edge_index,
            batch,
            edge_index_batch,
            non_edge_index_batch,
            ptr,
        }
    }
}
