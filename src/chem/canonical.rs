// src/chem/canonical.rs
//! Deterministic atom ranking.
//!
//! Ranks start from per-atom invariants and are refined with the ranks of the
//! neighbours until the partition stops growing. Remaining ties are broken on
//! the lowest atom index and refined again, so every atom ends up with a
//! unique rank.
//!
//! The ranking does not depend on input order only when the refined classes
//! are symmetry classes. Refinement cannot separate equally regular
//! components (every CH2 of cyclopropane and cyclohexane lands in one class),
//! so the SMILES writer writes each component on its own and sorts the texts.
//! Within one component, graphs whose refined classes are coarser than their
//! symmetry classes can still depend on input order.

use super::mol::{BondType, ChiralType, Mol};

/// Unique rank per atom, `0..num_atoms`.
pub fn canonical_ranks(mol: &Mol) -> Vec<usize> {
    let n = mol.num_atoms();
    if n == 0 {
        return Vec::new();
    }

    let invariants: Vec<_> = mol
        .atoms()
        .iter()
        .enumerate()
        .map(|(idx, atom)| {
            (
                atom.element.atomic_num(),
                mol.degree(idx),
                atom.total_hs(),
                atom.formal_charge,
                atom.is_aromatic,
                atom.chiral_tag != ChiralType::Unspecified,
            )
        })
        .collect();

    let mut ranks = refine(mol, dense_ranks(&invariants));
    while count_classes(&ranks) < n {
        let tied = lowest_tied_rank(&ranks);
        let winner = ranks.iter().position(|&r| r == tied).unwrap_or(0);
        let split: Vec<usize> = ranks
            .iter()
            .enumerate()
            .map(|(idx, &r)| 2 * r + usize::from(r == tied && idx != winner))
            .collect();
        ranks = refine(mol, dense_ranks(&split));
    }
    ranks
}

fn refine(mol: &Mol, mut ranks: Vec<usize>) -> Vec<usize> {
    let mut classes = count_classes(&ranks);
    loop {
        let keys: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.num_atoms())
            .map(|idx| {
                let mut around: Vec<(usize, u8)> = mol
                    .neighbors(idx)
                    .map(|(nbr, bond)| (ranks[nbr], bond_code(mol.bond(bond).bond_type)))
                    .collect();
                around.sort_unstable();
                (ranks[idx], around)
            })
            .collect();
        ranks = dense_ranks(&keys);
        let refined = count_classes(&ranks);
        if refined == classes {
            return ranks;
        }
        classes = refined;
    }
}

fn bond_code(bond_type: BondType) -> u8 {
    match bond_type {
        BondType::Single => 1,
        BondType::Double => 2,
        BondType::Triple => 3,
        BondType::Aromatic => 4,
    }
}

/// Replace each key by its position among the sorted distinct keys.
fn dense_ranks<K: Ord + Clone>(keys: &[K]) -> Vec<usize> {
    let mut distinct = keys.to_vec();
    distinct.sort();
    distinct.dedup();
    keys.iter()
        .map(|k| distinct.binary_search(k).unwrap_or(0))
        .collect()
}

fn count_classes(ranks: &[usize]) -> usize {
    let mut distinct = ranks.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    distinct.len()
}

fn lowest_tied_rank(ranks: &[usize]) -> usize {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted
        .windows(2)
        .find(|w| w[0] == w[1])
        .map_or(0, |w| w[0])
}
