// src/chem/mol.rs
//! Atoms, bonds and the `Mol` container.
//!
//! Atoms carry exactly the properties the graph environment round-trips:
//! element, chiral tag, formal charge, explicit hydrogen count and the
//! no-implicit flag. `is_aromatic` and `implicit_hs` are derived by
//! [`Mol::sanitize`].

use serde::{Deserialize, Serialize};

use super::{ChemError, Element};

/// Tetrahedral chirality tag of an atom.
///
/// The tag is relative to the atom's neighbour order: the hydrogen (if any)
/// first, then the bonded atoms in bond order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ChiralType {
    /// No stereo information.
    #[default]
    Unspecified,
    /// Clockwise (`@@` in SMILES when neighbours are listed in order).
    TetrahedralCw,
    /// Counter-clockwise (`@` in SMILES when neighbours are listed in order).
    TetrahedralCcw,
}

impl ChiralType {
    /// The opposite handedness; `Unspecified` stays as is.
    pub fn inverted(self) -> Self {
        match self {
            ChiralType::Unspecified => ChiralType::Unspecified,
            ChiralType::TetrahedralCw => ChiralType::TetrahedralCcw,
            ChiralType::TetrahedralCcw => ChiralType::TetrahedralCw,
        }
    }

    /// Upper-case name in the usual toolkit spelling.
    pub fn name(self) -> &'static str {
        match self {
            ChiralType::Unspecified => "CHI_UNSPECIFIED",
            ChiralType::TetrahedralCw => "CHI_TETRAHEDRAL_CW",
            ChiralType::TetrahedralCcw => "CHI_TETRAHEDRAL_CCW",
        }
    }
}

/// Bond type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum BondType {
    /// Single bond.
    #[default]
    Single,
    /// Double bond.
    Double,
    /// Triple bond.
    Triple,
    /// Aromatic bond; resolved to single or double by kekulization.
    Aromatic,
}

impl BondType {
    /// Upper-case name in the usual toolkit spelling.
    pub fn name(self) -> &'static str {
        match self {
            BondType::Single => "SINGLE",
            BondType::Double => "DOUBLE",
            BondType::Triple => "TRIPLE",
            BondType::Aromatic => "AROMATIC",
        }
    }
}

/// An atom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Element.
    pub element: Element,
    /// Tetrahedral chirality tag.
    pub chiral_tag: ChiralType,
    /// Formal charge.
    pub formal_charge: i32,
    /// Hydrogens attached explicitly (e.g. from `[NH4+]`).
    pub num_explicit_hs: u32,
    /// When set, sanitization never adds implicit hydrogens.
    pub no_implicit: bool,
    /// Set by sanitization when the atom takes part in an aromatic bond.
    pub is_aromatic: bool,
    /// Set by sanitization.
    pub implicit_hs: u32,
}

impl Atom {
    /// A neutral atom with default properties.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            chiral_tag: ChiralType::Unspecified,
            formal_charge: 0,
            num_explicit_hs: 0,
            no_implicit: false,
            is_aromatic: false,
            implicit_hs: 0,
        }
    }

    /// A neutral atom from an element symbol.
    ///
    /// # Errors
    ///
    /// Returns `ChemError::UnknownElement` for unknown symbols.
    pub fn from_symbol(symbol: &str) -> Result<Self, ChemError> {
        Element::from_symbol(symbol).map(Self::new)
    }

    /// Element symbol.
    pub fn symbol(&self) -> &'static str {
        self.element.symbol()
    }

    /// Explicit plus implicit hydrogens.
    pub fn total_hs(&self) -> u32 {
        self.num_explicit_hs + self.implicit_hs
    }
}

/// A bond between two atoms, stored in the orientation it was added with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    /// Index of the first atom.
    pub begin: usize,
    /// Index of the second atom.
    pub end: usize,
    /// Bond type.
    pub bond_type: BondType,
}

impl Bond {
    /// The atom on the other side of `atom`.
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// A molecule: atoms, bonds and per-atom adjacency in bond order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mol {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Mol {
    /// An empty molecule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of atoms.
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Number of bonds.
    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    /// All atoms in index order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// All bonds in index order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Atom at `idx`. Panics when out of range, like slice indexing.
    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    /// Mutable atom at `idx`. Panics when out of range.
    pub fn atom_mut(&mut self, idx: usize) -> &mut Atom {
        &mut self.atoms[idx]
    }

    /// Bond at `idx`. Panics when out of range.
    pub fn bond(&self, idx: usize) -> &Bond {
        &self.bonds[idx]
    }

    /// Append an atom and return its index.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    /// Add a bond and return its index.
    ///
    /// # Errors
    ///
    /// Returns `ChemError::InvalidBond` for unknown atoms, self loops and
    /// duplicate bonds.
    pub fn add_bond(
        &mut self,
        begin: usize,
        end: usize,
        bond_type: BondType,
    ) -> Result<usize, ChemError> {
        let n = self.atoms.len();
        if begin >= n || end >= n || begin == end || self.bond_between(begin, end).is_some() {
            return Err(ChemError::InvalidBond { begin, end });
        }
        let idx = self.bonds.len();
        self.bonds.push(Bond { begin, end, bond_type });
        self.adjacency[begin].push((end, idx));
        self.adjacency[end].push((begin, idx));
        Ok(idx)
    }

    /// Index of the bond joining `a` and `b`, in either orientation.
    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency
            .get(a)?
            .iter()
            .find(|(nbr, _)| *nbr == b)
            .map(|(_, bond)| *bond)
    }

    /// `(neighbour, bond index)` pairs of `atom` in bond order.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency[atom].iter().copied()
    }

    /// Number of bonded neighbours.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Sanitize in place: ring checks for aromatic bonds, kekulization,
    /// valence checks and implicit hydrogens.
    ///
    /// # Errors
    ///
    /// See [`super::sanitize::sanitize`].
    pub fn sanitize(&mut self) -> Result<(), ChemError> {
        super::sanitize::sanitize(self)
    }

    /// Deterministic SMILES string, see [`super::smiles::to_smiles`].
    pub fn to_smiles(&self) -> String {
        super::smiles::to_smiles(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carbon() -> Atom {
        Atom::from_symbol("C").unwrap()
    }

    #[test]
    fn bonds_are_undirected_and_unique() {
        let mut mol = Mol::new();
        let a = mol.add_atom(carbon());
        let b = mol.add_atom(carbon());
        let bond = mol.add_bond(a, b, BondType::Double).unwrap();
        assert_eq!(mol.bond_between(b, a), Some(bond));
        assert_eq!(mol.bond(bond).other(b), a);
        assert!(mol.add_bond(b, a, BondType::Single).is_err());
        assert!(mol.add_bond(a, a, BondType::Single).is_err());
        assert!(mol.add_bond(a, 7, BondType::Single).is_err());
    }

    #[test]
    fn neighbors_follow_bond_order() {
        let mut mol = Mol::new();
        for _ in 0..4 {
            mol.add_atom(carbon());
        }
        mol.add_bond(0, 2, BondType::Single).unwrap();
        mol.add_bond(1, 0, BondType::Single).unwrap();
        mol.add_bond(3, 0, BondType::Single).unwrap();
        let nbrs: Vec<usize> = mol.neighbors(0).map(|(n, _)| n).collect();
        assert_eq!(nbrs, vec![2, 1, 3]);
        assert_eq!(mol.degree(0), 3);
    }

    #[test]
    fn chirality_inversion() {
        assert_eq!(ChiralType::TetrahedralCw.inverted(), ChiralType::TetrahedralCcw);
        assert_eq!(ChiralType::Unspecified.inverted(), ChiralType::Unspecified);
    }
}
