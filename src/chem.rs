// src/chem.rs
//! Minimal molecule model used by the molecule-building environment.
//!
//! This module provides just enough chemistry to move between abstract
//! molecular graphs and molecules:
//! - `mol`: atoms, bonds and the `Mol` container
//! - `sanitize`: aromatic ring checks, kekulization, valence checks and
//!   implicit hydrogen assignment
//! - `canonical`: deterministic atom ranking used by the SMILES writer
//! - `smiles`: SMILES writer and reader
//!
//! The valence model follows the usual cheminformatics defaults: every element
//! has an ordered list of allowed valences and charged atoms borrow the list of
//! their isoelectronic neighbour (N+ behaves like C, O- like F, ...).
use thiserror::Error;

pub mod canonical;
pub mod mol;
pub mod sanitize;
pub mod smiles;

pub use mol::{Atom, Bond, BondType, ChiralType, Mol};
pub use smiles::{from_smiles, parse_smiles, to_smiles};

/// Errors returned by molecule construction, sanitization and SMILES I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChemError {
    /// The SMILES string could not be parsed.
    #[error("invalid SMILES at position {position}: {message}")]
    Parse {
        /// Character offset of the offending token.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// An element symbol that is not in the periodic table subset.
    #[error("unknown element: {0}")]
    UnknownElement(String),

    /// The explicit valence of an atom exceeds every valence it allows.
    #[error("explicit valence {valence} for atom #{atom} {symbol} is greater than permitted")]
    Valence {
        /// Atom index.
        atom: usize,
        /// Element symbol of the atom.
        symbol: &'static str,
        /// Explicit valence that was found.
        valence: u32,
    },

    /// No alternating single/double assignment exists for an aromatic system.
    #[error("can't kekulize aromatic system containing atom #{0}")]
    Kekulize(usize),

    /// An aromatic atom or bond that is not part of a ring.
    #[error("non-ring atom #{0} marked aromatic")]
    NonRingAromatic(usize),

    /// A bond that refers to a missing atom, loops onto one atom or
    /// duplicates an existing bond.
    #[error("invalid bond between atoms #{begin} and #{end}")]
    InvalidBond {
        /// First atom.
        begin: usize,
        /// Second atom.
        end: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Periodic table subset
// ─────────────────────────────────────────────────────────────────────────────

/// symbol, atomic number, allowed valences (empty = unconstrained)
type ElementRow = (&'static str, u8, &'static [u32]);

static ELEMENTS: &[ElementRow] = &[
    ("H", 1, &[1]),
    ("He", 2, &[0]),
    ("Li", 3, &[1]),
    ("Be", 4, &[2]),
    ("B", 5, &[3]),
    ("C", 6, &[4]),
    ("N", 7, &[3]),
    ("O", 8, &[2]),
    ("F", 9, &[1]),
    ("Ne", 10, &[0]),
    ("Na", 11, &[1]),
    ("Mg", 12, &[2]),
    ("Al", 13, &[3]),
    ("Si", 14, &[4]),
    ("P", 15, &[3, 5, 7]),
    ("S", 16, &[2, 4, 6]),
    ("Cl", 17, &[1]),
    ("Ar", 18, &[0]),
    ("K", 19, &[1]),
    ("Ca", 20, &[2]),
    ("Sc", 21, &[]),
    ("Ti", 22, &[]),
    ("V", 23, &[]),
    ("Cr", 24, &[]),
    ("Mn", 25, &[]),
    ("Fe", 26, &[]),
    ("Co", 27, &[]),
    ("Ni", 28, &[]),
    ("Cu", 29, &[]),
    ("Zn", 30, &[]),
    ("Ga", 31, &[3]),
    ("Ge", 32, &[4]),
    ("As", 33, &[3, 5, 7]),
    ("Se", 34, &[2, 4, 6]),
    ("Br", 35, &[1]),
    ("Kr", 36, &[0]),
    ("I", 53, &[1, 3, 5]),
];

const BARE_PROTON: &[u32] = &[0];

/// Symbols that may appear outside brackets in SMILES.
const ORGANIC_SUBSET: [&str; 10] = ["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I"];

/// Symbols that may appear as bare lowercase aromatic atoms in SMILES.
const AROMATIC_SUBSET: [&str; 6] = ["B", "C", "N", "O", "P", "S"];

/// A chemical element, identified by its position in the built-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(usize);

impl Element {
    /// Look up an element by its symbol (case sensitive, e.g. `"Cl"`).
    ///
    /// # Errors
    ///
    /// Returns `ChemError::UnknownElement` for symbols outside the table.
    pub fn from_symbol(symbol: &str) -> Result<Self, ChemError> {
        ELEMENTS
            .iter()
            .position(|(s, _, _)| *s == symbol)
            .map(Element)
            .ok_or_else(|| ChemError::UnknownElement(symbol.to_string()))
    }

    /// Look up an element by atomic number.
    pub fn from_atomic_num(atomic_num: i32) -> Option<Self> {
        ELEMENTS
            .iter()
            .position(|(_, z, _)| i32::from(*z) == atomic_num)
            .map(Element)
    }

    /// Element symbol, e.g. `"C"`.
    pub fn symbol(self) -> &'static str {
        ELEMENTS[self.0].0
    }

    /// Atomic number.
    pub fn atomic_num(self) -> u8 {
        ELEMENTS[self.0].1
    }

    /// Allowed valences of the neutral element, `None` when unconstrained.
    pub fn valences(self) -> Option<&'static [u32]> {
        let valences = ELEMENTS[self.0].2;
        (!valences.is_empty()).then_some(valences)
    }

    /// Allowed valences for an atom of this element carrying `charge`.
    ///
    /// Charged atoms use the valence list of the isoelectronic element when
    /// that element is constrained; a bare proton has valence 0.
    pub fn allowed_valences(self, charge: i32) -> Option<&'static [u32]> {
        let own = self.valences()?;
        if charge == 0 {
            return Some(own);
        }
        let shifted = i32::from(self.atomic_num()) - charge;
        if shifted == 0 {
            return Some(BARE_PROTON);
        }
        Some(
            Element::from_atomic_num(shifted)
                .and_then(Element::valences)
                .unwrap_or(own),
        )
    }

    /// Whether the element may be written without brackets in SMILES.
    pub fn is_organic_subset(self) -> bool {
        ORGANIC_SUBSET.contains(&self.symbol())
    }

    /// Whether the element may be written as a bare aromatic atom in SMILES.
    pub fn is_aromatic_subset(self) -> bool {
        AROMATIC_SUBSET.contains(&self.symbol())
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup() {
        let cl = Element::from_symbol("Cl").unwrap();
        assert_eq!(cl.atomic_num(), 17);
        assert_eq!(cl.symbol(), "Cl");
        assert!(matches!(
            Element::from_symbol("Xx"),
            Err(ChemError::UnknownElement(_))
        ));
    }

    #[test]
    fn charged_atoms_borrow_isoelectronic_valences() {
        let n = Element::from_symbol("N").unwrap();
        let o = Element::from_symbol("O").unwrap();
        let h = Element::from_symbol("H").unwrap();
        assert_eq!(n.allowed_valences(0), Some(&[3][..]));
        assert_eq!(n.allowed_valences(1), Some(&[4][..]));
        assert_eq!(o.allowed_valences(-1), Some(&[1][..]));
        assert_eq!(h.allowed_valences(1), Some(&[0][..]));
    }

    #[test]
    fn transition_metals_are_unconstrained() {
        let fe = Element::from_symbol("Fe").unwrap();
        assert_eq!(fe.valences(), None);
        assert_eq!(fe.allowed_valences(2), None);
    }
}
