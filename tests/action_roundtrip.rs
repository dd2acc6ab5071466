use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner};

use molbuild::{
    ActionIndex, EnvError, Graph, GraphAction, GraphActionType, GraphBuildingEnv, GraphData,
    MolBuildingEnvContext, NodeAttr,
};

// Property tests run on a pinned seed so failures reproduce across machines.
// Change `SEED_BYTES` to explore other graphs locally.
const SEED_BYTES: [u8; 32] = [
    0x6d, 0x6f, 0x6c, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0,
];

fn runner() -> TestRunner {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    TestRunner::new_with_rng(PropConfig::with_cases(128), rng)
}

/// A random build trajectory: `(source seed, element)` per added atom, extra
/// ring-closing pairs and `(node seed, logit column)` attribute settings.
type Recipe = (Vec<(usize, usize)>, Vec<(usize, usize)>, Vec<(usize, usize)>);

fn recipe() -> impl Strategy<Value = Recipe> {
    (
        prop::collection::vec((any::<usize>(), 0..5usize), 0..8),
        prop::collection::vec((any::<usize>(), any::<usize>()), 0..4),
        prop::collection::vec((any::<usize>(), 0..8usize), 0..4),
    )
}

fn build(env: &GraphBuildingEnv, ctx: &MolBuildingEnvContext, recipe: &Recipe) -> Graph {
    let (atoms, extra_edges, settings) = recipe;
    let elements = ctx.atom_attr_values(NodeAttr::Element);
    let mut g = env.new_graph();
    for (seed, element) in atoms {
        let source = if g.is_empty() { 0 } else { seed % g.num_nodes() };
        let action = GraphAction::AddNode {
            source,
            value: elements[*element].clone(),
        };
        g = env.step(&g, &action).unwrap_or(g);
    }
    if g.num_nodes() > 1 {
        for (a, b) in extra_edges {
            let action = GraphAction::AddEdge {
                source: a % g.num_nodes(),
                target: b % g.num_nodes(),
            };
            // self loops and duplicates are rejected; keep the graph as is
            g = env.step(&g, &action).unwrap_or(g);
        }
    }
    for (seed, col) in settings {
        if g.is_empty() {
            break;
        }
        let (attr, value) = ctx.atom_attr_logit_map()[*col].clone();
        let action = GraphAction::SetNodeAttr {
            source: seed % g.num_nodes(),
            attr,
            value,
        };
        g = env.step(&g, &action).unwrap_or(g);
    }
    g
}

fn all_indices(ctx: &MolBuildingEnvContext, data: &GraphData) -> Vec<ActionIndex> {
    let mut out = vec![ActionIndex::new(0, 0, 0)];
    let per_type = [
        (GraphActionType::AddNode, data.num_node_rows(), ctx.num_new_node_values()),
        (GraphActionType::SetNodeAttr, data.num_node_rows(), ctx.num_node_attr_logits()),
        (GraphActionType::AddEdge, data.num_non_edges(), 1),
        (GraphActionType::SetEdgeAttr, data.num_edges(), ctx.num_edge_attr_logits()),
    ];
    for (action_type, rows, cols) in per_type {
        for row in 0..rows {
            for col in 0..cols {
                out.push(ActionIndex::new(action_type.ordinal(), row, col));
            }
        }
    }
    out
}

fn fail(err: EnvError) -> TestCaseError {
    TestCaseError::fail(err.to_string())
}

#[test]
fn proptest_every_index_survives_decode_then_encode() {
    let env = GraphBuildingEnv::default();
    let ctx = MolBuildingEnvContext::default();

    runner()
        .run(&recipe(), |recipe| {
            let g = build(&env, &ctx, &recipe);
            let data = ctx.graph_to_data(&g).map_err(fail)?;
            for idx in all_indices(&ctx, &data) {
                let action = ctx.aidx_to_graph_action(&data, idx).map_err(fail)?;
                prop_assert_eq!(ctx.graph_action_to_aidx(&data, &action).map_err(fail)?, idx);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn proptest_edge_actions_ignore_orientation() {
    let env = GraphBuildingEnv::default();
    let ctx = MolBuildingEnvContext::default();

    runner()
        .run(&recipe(), |recipe| {
            let g = build(&env, &ctx, &recipe);
            let data = ctx.graph_to_data(&g).map_err(fail)?;
            for idx in all_indices(&ctx, &data) {
                let swapped = match ctx.aidx_to_graph_action(&data, idx).map_err(fail)? {
                    GraphAction::AddEdge { source, target } => GraphAction::AddEdge {
                        source: target,
                        target: source,
                    },
                    GraphAction::SetEdgeAttr {
                        source,
                        target,
                        attr,
                        value,
                    } => GraphAction::SetEdgeAttr {
                        source: target,
                        target: source,
                        attr,
                        value,
                    },
                    _ => continue,
                };
                prop_assert_eq!(ctx.graph_action_to_aidx(&data, &swapped).map_err(fail)?, idx);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn proptest_decoded_actions_are_legal_steps() {
    let env = GraphBuildingEnv::default();
    let ctx = MolBuildingEnvContext::default();

    runner()
        .run(&recipe(), |recipe| {
            let g = build(&env, &ctx, &recipe);
            let data = ctx.graph_to_data(&g).map_err(fail)?;
            for idx in all_indices(&ctx, &data) {
                let action = ctx.aidx_to_graph_action(&data, idx).map_err(fail)?;
                match &action {
                    GraphAction::Stop => continue,
                    // attributes can only be set once, and never on the empty-graph row
                    GraphAction::SetNodeAttr { source, attr, .. } => {
                        let legal = g.node_attrs(*source).is_some_and(|a| !a.contains_key(attr));
                        prop_assert_eq!(env.step(&g, &action).is_ok(), legal);
                    }
                    GraphAction::SetEdgeAttr { .. } => {}
                    _ => {
                        let next = env.step(&g, &action).map_err(fail)?;
                        let grown = next.num_nodes() + next.num_edges();
                        prop_assert!(grown > g.num_nodes() + g.num_edges());
                    }
                }
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn proptest_collate_preserves_every_graph() {
    let env = GraphBuildingEnv::default();
    let ctx = MolBuildingEnvContext::default();
    let recipes = prop::collection::vec(recipe(), 1..4);

    runner()
        .run(&recipes, |recipes| {
            let datas = recipes
                .iter()
                .map(|r| ctx.graph_to_data(&build(&env, &ctx, r)))
                .collect::<Result<Vec<_>, _>>()
                .map_err(fail)?;
            let batch = ctx.collate(&datas).map_err(fail)?;
            prop_assert_eq!(batch.num_graphs(), datas.len());
            for (i, d) in datas.iter().enumerate() {
                let (start, end) = (batch.ptr[i], batch.ptr[i + 1]);
                prop_assert_eq!(end - start, d.num_node_rows());
                prop_assert!(batch.batch[start..end].iter().all(|b| *b == i));
            }
            let edge_cols: usize = datas.iter().map(|d| d.edge_index().ncols()).sum();
            prop_assert_eq!(batch.edge_index.ncols(), edge_cols);
            Ok(())
        })
        .unwrap();
}

#[test]
fn unknown_ordinals_are_rejected() {
    let ctx = MolBuildingEnvContext::default();
    let data = ctx.graph_to_data(&Graph::new()).unwrap();
    let err = ctx.aidx_to_graph_action(&data, ActionIndex::new(5, 0, 0)).unwrap_err();
    assert!(matches!(err, EnvError::UnknownActionType(5)));
}
