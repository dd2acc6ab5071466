// src/chem/sanitize.rs
//! Molecule sanitization.
//!
//! Sanitization runs four passes, each of which may reject the molecule:
//!
//! 1. **Aromatic rings**: every aromatic bond must lie on a ring and every
//!    atom flagged aromatic must carry at least one aromatic bond.
//! 2. **Kekulization**: aromatic atoms that still need a double bond are
//!    perfectly matched along aromatic bonds.
//! 3. **Valence**: the explicit valence (kekulé bond orders plus explicit
//!    hydrogens) may not exceed the largest allowed valence.
//! 4. **Implicit hydrogens**: atoms are topped up to the smallest allowed
//!    valence unless they carry the no-implicit flag.

use std::collections::VecDeque;

use petgraph::algo::maximum_matching;
use petgraph::graph::UnGraph;

use super::mol::{BondType, Mol};
use super::ChemError;

/// Sanitize `mol` in place.
///
/// # Errors
///
/// - `ChemError::NonRingAromatic` for aromatic atoms or bonds outside rings
/// - `ChemError::Kekulize` when an aromatic system has no kekulé form
/// - `ChemError::Valence` when an atom is over-bonded
pub fn sanitize(mol: &mut Mol) -> Result<(), ChemError> {
    check_aromatic_rings(mol)?;
    for idx in 0..mol.num_atoms() {
        let aromatic = mol
            .neighbors(idx)
            .any(|(_, bond)| mol.bond(bond).bond_type == BondType::Aromatic);
        mol.atom_mut(idx).is_aromatic = aromatic;
    }

    let orders = kekulize(mol)?;

    for idx in 0..mol.num_atoms() {
        let valence = explicit_valence(mol, idx, &orders);
        let atom = mol.atom(idx);
        let implicit = match atom.element.allowed_valences(atom.formal_charge) {
            None => 0,
            Some(allowed) => {
                let target = allowed
                    .iter()
                    .copied()
                    .find(|&v| v >= valence)
                    .ok_or(ChemError::Valence {
                        atom: idx,
                        symbol: atom.symbol(),
                        valence,
                    })?;
                if atom.no_implicit {
                    0
                } else {
                    target - valence
                }
            }
        };
        mol.atom_mut(idx).implicit_hs = implicit;
    }

    Ok(())
}

/// Bond orders after kekulization, indexed by bond.
///
/// Aromatic bonds become 2 when they were chosen for the matching and 1
/// otherwise. The needy atoms must be perfectly matched along aromatic bonds;
/// the matching runs in polynomial time.
pub fn kekulize(mol: &Mol) -> Result<Vec<u32>, ChemError> {
    let mut needy = UnGraph::<usize, usize>::new_undirected();
    let mut node_of = vec![None; mol.num_atoms()];
    for idx in 0..mol.num_atoms() {
        if needs_double_bond(mol, idx) {
            node_of[idx] = Some(needy.add_node(idx));
        }
    }
    for (idx, bond) in mol.bonds().iter().enumerate() {
        if bond.bond_type != BondType::Aromatic {
            continue;
        }
        if let (Some(a), Some(b)) = (node_of[bond.begin], node_of[bond.end]) {
            needy.add_edge(a, b, idx);
        }
    }

    let matching = maximum_matching(&needy);
    if !matching.is_perfect() {
        let culprit = needy
            .node_indices()
            .find(|&node| !matching.contains_node(node))
            .map_or(0, |node| needy[node]);
        return Err(ChemError::Kekulize(culprit));
    }

    let mut double = vec![false; mol.num_bonds()];
    for (a, b) in matching.edges() {
        if let Some(edge) = needy.find_edge(a, b) {
            double[needy[edge]] = true;
        }
    }

    Ok(mol
        .bonds()
        .iter()
        .zip(&double)
        .map(|(bond, &is_double)| match bond.bond_type {
            BondType::Single => 1,
            BondType::Double => 2,
            BondType::Triple => 3,
            BondType::Aromatic => {
                if is_double {
                    2
                } else {
                    1
                }
            }
        })
        .collect())
}

fn explicit_valence(mol: &Mol, idx: usize, orders: &[u32]) -> u32 {
    let bonded: u32 = mol.neighbors(idx).map(|(_, bond)| orders[bond]).sum();
    bonded + mol.atom(idx).num_explicit_hs
}

/// An aromatic atom needs a double bond when, with every aromatic bond counted
/// as single, it sits at least one below its smallest reachable valence.
fn needs_double_bond(mol: &Mol, idx: usize) -> bool {
    let atom = mol.atom(idx);
    if !atom.is_aromatic {
        return false;
    }
    let Some(allowed) = atom.element.allowed_valences(atom.formal_charge) else {
        return false;
    };
    let base: u32 = mol
        .neighbors(idx)
        .map(|(_, bond)| match mol.bond(bond).bond_type {
            BondType::Single | BondType::Aromatic => 1,
            BondType::Double => 2,
            BondType::Triple => 3,
        })
        .sum::<u32>()
        + atom.num_explicit_hs;
    allowed
        .iter()
        .find(|&&v| v >= base)
        .is_some_and(|&v| v > base)
}

fn check_aromatic_rings(mol: &Mol) -> Result<(), ChemError> {
    for (idx, atom) in mol.atoms().iter().enumerate() {
        let has_aromatic_bond = mol
            .neighbors(idx)
            .any(|(_, bond)| mol.bond(bond).bond_type == BondType::Aromatic);
        if atom.is_aromatic && !has_aromatic_bond {
            return Err(ChemError::NonRingAromatic(idx));
        }
    }
    for (idx, bond) in mol.bonds().iter().enumerate() {
        if bond.bond_type == BondType::Aromatic && !bond_in_ring(mol, idx) {
            return Err(ChemError::NonRingAromatic(bond.begin));
        }
    }
    Ok(())
}

/// A bond is in a ring when its atoms stay connected without it.
fn bond_in_ring(mol: &Mol, bond_idx: usize) -> bool {
    let bond = mol.bond(bond_idx);
    let mut seen = vec![false; mol.num_atoms()];
    let mut queue = VecDeque::from([bond.begin]);
    seen[bond.begin] = true;
    while let Some(current) = queue.pop_front() {
        for (nbr, via) in mol.neighbors(current) {
            if via == bond_idx || seen[nbr] {
                continue;
            }
            if nbr == bond.end {
                return true;
            }
            seen[nbr] = true;
            queue.push_back(nbr);
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::mol::Atom;

    fn ring(symbols: &[&str], bond_type: BondType) -> Mol {
        let mut mol = Mol::new();
        for s in symbols {
            mol.add_atom(Atom::from_symbol(s).unwrap());
        }
        let n = symbols.len();
        for i in 0..n {
            mol.add_bond(i, (i + 1) % n, bond_type).unwrap();
        }
        mol
    }

    #[test]
    fn benzene_gets_one_hydrogen_per_carbon() {
        let mut mol = ring(&["C"; 6], BondType::Aromatic);
        sanitize(&mut mol).unwrap();
        assert!(mol.atoms().iter().all(|a| a.is_aromatic && a.implicit_hs == 1));
        let orders = kekulize(&mol).unwrap();
        assert_eq!(orders.iter().filter(|&&o| o == 2).count(), 3);
    }

    #[test]
    fn pyridine_kekulizes_and_bare_pyrrole_does_not() {
        let mut pyridine = ring(&["N", "C", "C", "C", "C", "C"], BondType::Aromatic);
        sanitize(&mut pyridine).unwrap();
        assert_eq!(pyridine.atom(0).implicit_hs, 0);

        let mut pyrrole = ring(&["N", "C", "C", "C", "C"], BondType::Aromatic);
        assert!(matches!(sanitize(&mut pyrrole), Err(ChemError::Kekulize(_))));

        let mut pyrrole = ring(&["N", "C", "C", "C", "C"], BondType::Aromatic);
        pyrrole.atom_mut(0).num_explicit_hs = 1;
        sanitize(&mut pyrrole).unwrap();
        assert_eq!(pyrrole.atom(0).total_hs(), 1);
    }

    #[test]
    fn furan_oxygen_keeps_two_bonds() {
        let mut furan = ring(&["O", "C", "C", "C", "C"], BondType::Aromatic);
        sanitize(&mut furan).unwrap();
        assert_eq!(furan.atom(0).implicit_hs, 0);
        assert!(furan.atoms()[1..].iter().all(|a| a.implicit_hs == 1));
    }

    #[test]
    fn unkekulizable_ring_after_long_chain_fails_fast() {
        // 40 benzene rings joined by single bonds, then a bare aromatic 5-ring
        let mut mol = Mol::new();
        let mut previous: Option<usize> = None;
        for size in std::iter::repeat(6).take(40).chain([5]) {
            let first = mol.num_atoms();
            for _ in 0..size {
                mol.add_atom(Atom::from_symbol("C").unwrap());
            }
            for i in 0..size {
                mol.add_bond(first + i, first + (i + 1) % size, BondType::Aromatic)
                    .unwrap();
            }
            if let Some(p) = previous {
                mol.add_bond(p, first, BondType::Single).unwrap();
            }
            previous = Some(first + 3);
        }

        let started = std::time::Instant::now();
        assert!(matches!(sanitize(&mut mol), Err(ChemError::Kekulize(_))));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));

        let culprit = match kekulize(&mol) {
            Err(ChemError::Kekulize(atom)) => atom,
            other => panic!("unexpected {other:?}"),
        };
        assert!(culprit >= 240);
    }

    #[test]
    fn pentavalent_carbon_is_rejected() {
        let mut mol = Mol::new();
        let c = mol.add_atom(Atom::from_symbol("C").unwrap());
        for _ in 0..5 {
            let f = mol.add_atom(Atom::from_symbol("F").unwrap());
            mol.add_bond(c, f, BondType::Single).unwrap();
        }
        assert!(matches!(
            sanitize(&mut mol),
            Err(ChemError::Valence { atom: 0, valence: 5, .. })
        ));
    }

    #[test]
    fn aromatic_chain_is_rejected() {
        let mut mol = Mol::new();
        mol.add_atom(Atom::from_symbol("C").unwrap());
        mol.add_atom(Atom::from_symbol("C").unwrap());
        mol.add_bond(0, 1, BondType::Aromatic).unwrap();
        assert_eq!(sanitize(&mut mol), Err(ChemError::NonRingAromatic(0)));
    }

    #[test]
    fn implicit_hydrogens_follow_valence_and_flags() {
        let mut mol = Mol::new();
        let c = mol.add_atom(Atom::from_symbol("C").unwrap());
        let o = mol.add_atom(Atom::from_symbol("O").unwrap());
        mol.add_bond(c, o, BondType::Double).unwrap();
        let mut n = Atom::from_symbol("N").unwrap();
        n.no_implicit = true;
        let n = mol.add_atom(n);
        mol.add_bond(c, n, BondType::Single).unwrap();
        sanitize(&mut mol).unwrap();
        assert_eq!(mol.atom(c).implicit_hs, 1);
        assert_eq!(mol.atom(o).implicit_hs, 0);
        assert_eq!(mol.atom(n).implicit_hs, 0);
    }

    #[test]
    fn charged_nitrogen_takes_four_bonds() {
        let mut mol = Mol::new();
        let mut n = Atom::from_symbol("N").unwrap();
        n.formal_charge = 1;
        mol.add_atom(n);
        sanitize(&mut mol).unwrap();
        assert_eq!(mol.atom(0).implicit_hs, 4);
    }
}
