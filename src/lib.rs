#![warn(missing_docs)]
//! molbuild: a molecule-building graph environment for generative models.
//!
//! Molecules are built one action at a time (add an atom, connect two atoms,
//! set a charge or a bond order, stop). This crate provides the pieces a
//! policy network needs around that process:
//!
//! - **graph**: attributed, undirected molecular graph (`petgraph` backed)
//! - **env**: graph-building actions and the state-transition environment
//! - **context**: vocabulary, feature layout and the action ↔ action-index codec
//! - **data**: tensor encodings of graphs (`ndarray`) and batch collation
//! - **chem**: minimal molecule model: sanitization, kekulization, canonical SMILES
//! - **data_io**: CSV loader for SMILES datasets
//!
//! # Quick examples
//!
//! ### Encode a molecule and round-trip an action
//! ```
//! use molbuild::{from_smiles, ActionIndex, MolBuildingEnvContext};
//!
//! let ctx = MolBuildingEnvContext::default();
//! let g = ctx.mol_to_graph(&from_smiles("CC=O").unwrap());
//! let data = ctx.graph_to_data(&g).unwrap();
//! assert_eq!(data.x().dim(), (3, ctx.num_node_dim()));
//!
//! // Make the C=O bond a triple bond: edge row 1, second non-default bond type.
//! let action = ctx.aidx_to_graph_action(&data, ActionIndex::new(4, 1, 1)).unwrap();
//! assert_eq!(ctx.graph_action_to_aidx(&data, &action).unwrap(), ActionIndex::new(4, 1, 1));
//! ```
//!
//! ### Build a molecule step by step
//! ```
//! use molbuild::{AttrValue, GraphAction, GraphBuildingEnv, MolBuildingEnvContext};
//!
//! let env = GraphBuildingEnv::default();
//! let ctx = MolBuildingEnvContext::default();
//! let mut g = env.new_graph();
//! for symbol in ["C", "C", "O"] {
//!     let source = g.num_nodes().saturating_sub(1);
//!     let action = GraphAction::AddNode { source, value: AttrValue::symbol(symbol) };
//!     g = env.step(&g, &action).unwrap();
//! }
//! assert!(ctx.is_sane(&g));
//! assert_eq!(molbuild::to_smiles(&ctx.graph_to_mol(&g).unwrap()), "CCO");
//! ```

pub mod chem;
pub mod context;
pub mod data;
pub mod data_io;
pub mod env;
pub mod graph;

// ─────────────────────────────────────────────────────────────────────────────
// Convenience re-exports
// ─────────────────────────────────────────────────────────────────────────────
pub use chem::{from_smiles, to_smiles, ChemError, Mol};
pub use context::{ActionIndex, ContextConfig, MolBuildingEnvContext};
pub use data::{GraphBatch, GraphData};
pub use data_io::{read_smiles_csv, read_smiles_csv_from_reader};
pub use env::{EnvError, GraphAction, GraphActionType, GraphBuildingEnv};
pub use graph::{AttrValue, EdgeAttr, Graph, NodeAttr};
