use std::error::Error;

use molbuild::{
    from_smiles, to_smiles, ActionIndex, AttrValue, ContextConfig, EdgeAttr, GraphAction,
    GraphBuildingEnv, MolBuildingEnvContext, NodeAttr,
};
use molbuild::chem::BondType;

#[test]
fn integration_molecules_round_trip_through_graphs() -> Result<(), Box<dyn Error>> {
    let ctx = MolBuildingEnvContext::new(ContextConfig::with_atoms(&["C", "N", "O", "F"]))?;
    let smiles = [
        "CC(=O)Oc1ccccc1C(=O)O", // aspirin
        "C[C@@H](N)C(=O)O",      // alanine
        "c1cc[nH]c1",            // pyrrole
        "c1ccc2ccccc2c1",        // naphthalene
        "C[NH3+]",
        "OC1CC1C#N",
        "FC(F)(F)C=O",
    ];
    for s in smiles {
        let mol = from_smiles(s)?;
        let g = ctx.mol_to_graph(&mol);
        assert_eq!(g.num_nodes(), mol.num_atoms(), "{s}");
        assert_eq!(g.num_edges(), mol.num_bonds(), "{s}");
        assert!(ctx.is_sane(&g), "{s} should be sane");
        let back = ctx.graph_to_mol(&g)?;
        assert_eq!(to_smiles(&back), to_smiles(&mol), "{s}");
    }
    Ok(())
}

#[test]
fn integration_build_ethanol_by_sampled_indices() -> Result<(), Box<dyn Error>> {
    let env = GraphBuildingEnv::default();
    let ctx = MolBuildingEnvContext::default();

    // Indices a policy might sample: C, then C off node 0, then O off node 1.
    let trajectory = [
        ActionIndex::new(1, 0, 1),
        ActionIndex::new(1, 0, 1),
        ActionIndex::new(1, 1, 3),
    ];
    let mut g = env.new_graph();
    for idx in trajectory {
        let data = ctx.graph_to_data(&g)?;
        let action = ctx.aidx_to_graph_action(&data, idx)?;
        assert_eq!(ctx.graph_action_to_aidx(&data, &action)?, idx);
        g = env.step(&g, &action)?;
    }
    assert_eq!(to_smiles(&ctx.graph_to_mol(&g)?), "CCO");

    // Close the only non-edge (0, 2) into a ring, then make C=C a double bond.
    let data = ctx.graph_to_data(&g)?;
    assert_eq!(data.num_non_edges(), 1);
    let ring = ctx.aidx_to_graph_action(&data, ActionIndex::new(3, 0, 0))?;
    assert_eq!(ring, GraphAction::AddEdge { source: 0, target: 2 });
    g = env.step(&g, &ring)?;

    let data = ctx.graph_to_data(&g)?;
    let double = GraphAction::SetEdgeAttr {
        source: 1,
        target: 0,
        attr: EdgeAttr::BondType,
        value: AttrValue::Bond(BondType::Double),
    };
    assert_eq!(ctx.graph_action_to_aidx(&data, &double)?, ActionIndex::new(4, 0, 0));
    g = env.step(&g, &double)?;
    assert!(ctx.is_sane(&g));
    let oxirene = ctx.graph_to_mol(&g)?;
    assert_eq!(oxirene.bonds().iter().filter(|b| b.bond_type == BondType::Double).count(), 1);
    assert_eq!(oxirene.atoms().iter().map(|a| a.total_hs()).sum::<u32>(), 2);
    assert_eq!(env.count_backward_transitions(&g), 3);

    assert_eq!(ctx.aidx_to_graph_action(&data, ActionIndex::new(0, 0, 0))?, GraphAction::Stop);
    Ok(())
}

#[test]
fn integration_charged_atoms_need_a_charge_action() -> Result<(), Box<dyn Error>> {
    let env = GraphBuildingEnv::default();
    let ctx = MolBuildingEnvContext::default();
    let mut g = env.new_graph();
    for (source, symbol) in [(0, "C"), (0, "N")] {
        g = env.step(&g, &GraphAction::AddNode { source, value: AttrValue::symbol(symbol) })?;
    }
    let charge = GraphAction::SetNodeAttr {
        source: 1,
        attr: NodeAttr::Charge,
        value: AttrValue::Int(1),
    };
    let data = ctx.graph_to_data(&g)?;
    assert_eq!(ctx.graph_action_to_aidx(&data, &charge)?, ActionIndex::new(2, 1, 0));
    g = env.step(&g, &charge)?;
    assert!(ctx.is_sane(&g));
    assert_eq!(to_smiles(&ctx.graph_to_mol(&g)?), "C[NH3+]");
    assert!(env.step(&g, &charge).is_err());
    Ok(())
}

#[test]
fn integration_config_file_and_batching() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join(format!("molbuild-config-{}.json", std::process::id()));
    let json = r#"{"atoms": ["C", "N", "O", "S"], "num_cond_dim": 16, "max_explicit_hs": 1}"#;
    std::fs::write(&path, json)?;
    let config = ContextConfig::from_path(&path)?;
    std::fs::remove_file(&path)?;

    let ctx = MolBuildingEnvContext::new(config)?;
    // charge 3 + chi 3 + expl_H 2 + no_impl 2 + v 4, plus the empty flag
    assert_eq!(ctx.num_node_dim(), 15);
    assert_eq!(ctx.num_node_attr_logits(), 6);
    assert_eq!(ctx.num_cond_dim(), 16);

    let datas = ["CS", "c1ccsc1", "O=C=O"]
        .iter()
        .map(|s| Ok(ctx.graph_to_data(&ctx.mol_to_graph(&from_smiles(s)?))?))
        .collect::<Result<Vec<_>, Box<dyn Error>>>()?;
    let empty = ctx.graph_to_data(&GraphBuildingEnv::default().new_graph())?;
    let mut all = datas;
    all.push(empty);

    let batch = ctx.collate(&all)?;
    assert_eq!(batch.ptr, vec![0, 2, 7, 10, 11]);
    assert_eq!(batch.edge_index.ncols(), 2 * (1 + 5 + 2));
    assert_eq!(batch.non_edge_index_batch.iter().filter(|b| **b == 1).count(), 5);
    assert_eq!(batch.x[[10, ctx.num_node_dim() - 1]], 1.0);
    Ok(())
}

#[test]
fn integration_dataset_loader_feeds_the_context() -> Result<(), Box<dyn Error>> {
    let ctx = MolBuildingEnvContext::new(ContextConfig::with_atoms(&["C", "N", "O", "F"]))?;
    let csv = "mol_id,smiles\ngdb_7,CC\ngdb_12,N#CC=O\ngdb_24,C1CC1\n";
    let mols = molbuild::read_smiles_csv_from_reader(csv.as_bytes(), "smiles")?;
    let sizes: Vec<usize> = mols.iter().map(|m| ctx.mol_to_graph(m).num_nodes()).collect();
    assert_eq!(sizes, vec![2, 4, 3]);
    Ok(())
}
