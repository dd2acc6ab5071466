// src/chem/smiles.rs
//! SMILES writer and reader.
//!
//! The writer walks each connected component depth-first from its
//! lowest-ranked atom (see [`super::canonical`]), visits neighbours in rank
//! order and emits:
//! - bare organic-subset atoms when the default valence rules reproduce the
//!   atom, bracket atoms otherwise (`[NH4+]`, `[C@H]`, `[nH]`, `[H]`)
//! - lowercase symbols for aromatic atoms
//! - ring-closure digits `1`–`9`, then `%10`–`%99`, then `%(100)` and up
//! - `.` between components, which are written separately and sorted
//!
//! The reader understands everything the writer produces plus explicit
//! aromatic bonds (`:`), directional bonds (read as single), isotopes and atom
//! maps (skipped). Tetrahedral tags are translated between SMILES neighbour
//! order and bond order through the parity of the neighbour permutation.
//!
//! # Examples
//!
//! ```
//! use molbuild::chem::{from_smiles, to_smiles};
//!
//! let benzene = from_smiles("c1ccccc1").unwrap();
//! assert_eq!(benzene.num_atoms(), 6);
//! assert_eq!(to_smiles(&benzene), "c1ccccc1");
//!
//! let ethanol = from_smiles("OCC").unwrap();
//! assert_eq!(to_smiles(&ethanol), "CCO");
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

use super::canonical::canonical_ranks;
use super::mol::{Atom, BondType, ChiralType, Mol};
use super::{ChemError, Element};

/// One entry in the neighbour order around a stereo centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Neighbor {
    Atom(usize),
    Hydrogen,
}

/// Parse and sanitize a SMILES string.
///
/// # Errors
///
/// Returns `ChemError::Parse` for malformed input and any sanitization error.
pub fn from_smiles(smiles: &str) -> Result<Mol, ChemError> {
    let mut mol = parse_smiles(smiles)?;
    mol.sanitize()?;
    Ok(mol)
}

/// Parse a SMILES string without sanitizing it.
///
/// # Errors
///
/// Returns `ChemError::Parse` for malformed input, `ChemError::UnknownElement`
/// for unknown bracket symbols and `ChemError::InvalidBond` for duplicate ring
/// closures.
pub fn parse_smiles(smiles: &str) -> Result<Mol, ChemError> {
    Parser::new(smiles).parse()
}

/// Write a deterministic SMILES string for a sanitized molecule.
pub fn to_smiles(mol: &Mol) -> String {
    Writer::new(mol).write()
}

// ─────────────────────────────────────────────────────────────────────────────
// Writer
// ─────────────────────────────────────────────────────────────────────────────

struct Writer<'a> {
    mol: &'a Mol,
    ranks: Vec<usize>,
    visited: Vec<bool>,
    parent_bond: Vec<Option<usize>>,
    children: Vec<Vec<(usize, usize)>>,
    ring_opens: Vec<Vec<usize>>,
    ring_closes: Vec<Vec<usize>>,
    ring_seen: Vec<bool>,
    open_labels: HashMap<usize, usize>,
    free_labels: BTreeSet<usize>,
    next_label: usize,
    out: String,
}

impl<'a> Writer<'a> {
    fn new(mol: &'a Mol) -> Self {
        let n = mol.num_atoms();
        Self {
            mol,
            ranks: canonical_ranks(mol),
            visited: vec![false; n],
            parent_bond: vec![None; n],
            children: vec![Vec::new(); n],
            ring_opens: vec![Vec::new(); n],
            ring_closes: vec![Vec::new(); n],
            ring_seen: vec![false; mol.num_bonds()],
            open_labels: HashMap::new(),
            free_labels: BTreeSet::new(),
            next_label: 1,
            out: String::new(),
        }
    }

    fn write(mut self) -> String {
        let mut order: Vec<usize> = (0..self.mol.num_atoms()).collect();
        order.sort_by_key(|&idx| self.ranks[idx]);

        let mut roots = Vec::new();
        for &start in &order {
            if !self.visited[start] {
                roots.push(start);
                self.discover(start);
            }
        }

        // Components are written apart and sorted so that their input order
        // does not leak into the output.
        let mut parts = Vec::with_capacity(roots.len());
        for root in roots {
            self.free_labels.clear();
            self.next_label = 1;
            self.emit(root, None);
            parts.push(std::mem::take(&mut self.out));
        }
        parts.sort();
        parts.join(".")
    }

    /// First pass: spanning tree and ring-closure bonds.
    fn discover(&mut self, atom: usize) {
        self.visited[atom] = true;
        let mut around: Vec<(usize, usize)> = self.mol.neighbors(atom).collect();
        around.sort_by_key(|&(nbr, _)| self.ranks[nbr]);
        for (nbr, bond) in around {
            if Some(bond) == self.parent_bond[atom] || self.ring_seen[bond] {
                continue;
            }
            if self.visited[nbr] {
                self.ring_seen[bond] = true;
                self.ring_opens[nbr].push(bond);
                self.ring_closes[atom].push(bond);
            } else {
                self.parent_bond[nbr] = Some(bond);
                self.children[atom].push((nbr, bond));
                self.discover(nbr);
            }
        }
    }

    /// Second pass: text.
    fn emit(&mut self, atom: usize, parent: Option<usize>) {
        let mol = self.mol;
        let data = mol.atom(atom);
        let bracket = needs_brackets(data);

        let mut smiles_order = Vec::new();
        if let Some(p) = parent {
            smiles_order.push(Neighbor::Atom(p));
        }
        if bracket && data.total_hs() > 0 {
            smiles_order.push(Neighbor::Hydrogen);
        }

        let mut ring_text = String::new();
        for bond in self.ring_closes[atom].clone() {
            let label = self.open_labels.remove(&bond).unwrap_or(0);
            self.free_labels.insert(label);
            push_label(&mut ring_text, label);
            smiles_order.push(Neighbor::Atom(mol.bond(bond).other(atom)));
        }
        for bond in self.ring_opens[atom].clone() {
            let label = self.allocate_label();
            self.open_labels.insert(bond, label);
            let other = mol.bond(bond).other(atom);
            ring_text.push_str(bond_symbol(mol, atom, other, mol.bond(bond).bond_type));
            push_label(&mut ring_text, label);
            smiles_order.push(Neighbor::Atom(other));
        }

        let children = self.children[atom].clone();
        smiles_order.extend(children.iter().map(|&(child, _)| Neighbor::Atom(child)));

        let tag = if data.chiral_tag == ChiralType::Unspecified {
            ChiralType::Unspecified
        } else {
            let internal = bond_order_neighbors(mol, atom, data.total_hs() > 0);
            match permutation_is_odd(&internal, &smiles_order) {
                Some(true) => data.chiral_tag.inverted(),
                _ => data.chiral_tag,
            }
        };

        write_atom(&mut self.out, data, tag, bracket);
        self.out.push_str(&ring_text);

        let last = children.len().saturating_sub(1);
        for (i, (child, bond)) in children.into_iter().enumerate() {
            let symbol = bond_symbol(mol, atom, child, mol.bond(bond).bond_type);
            if i < last {
                self.out.push('(');
                self.out.push_str(symbol);
                self.emit(child, Some(atom));
                self.out.push(')');
            } else {
                self.out.push_str(symbol);
                self.emit(child, Some(atom));
            }
        }
    }

    fn allocate_label(&mut self) -> usize {
        if let Some(&label) = self.free_labels.iter().next() {
            self.free_labels.remove(&label);
            return label;
        }
        let label = self.next_label;
        self.next_label += 1;
        label
    }
}

fn needs_brackets(atom: &Atom) -> bool {
    let shorthand = if atom.is_aromatic {
        atom.element.is_aromatic_subset()
    } else {
        atom.element.is_organic_subset()
    };
    !shorthand
        || atom.formal_charge != 0
        || atom.chiral_tag != ChiralType::Unspecified
        || atom.num_explicit_hs > 0
        || atom.no_implicit
}

fn write_atom(out: &mut String, atom: &Atom, tag: ChiralType, bracket: bool) {
    let symbol = if atom.is_aromatic {
        atom.symbol().to_lowercase()
    } else {
        atom.symbol().to_string()
    };
    if !bracket {
        out.push_str(&symbol);
        return;
    }
    out.push('[');
    out.push_str(&symbol);
    match tag {
        ChiralType::Unspecified => {}
        ChiralType::TetrahedralCcw => out.push('@'),
        ChiralType::TetrahedralCw => out.push_str("@@"),
    }
    match atom.total_hs() {
        0 => {}
        1 => out.push('H'),
        h => {
            let _ = write!(out, "H{h}");
        }
    }
    match atom.formal_charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        c if c > 0 => {
            let _ = write!(out, "+{c}");
        }
        c => {
            let _ = write!(out, "-{}", c.unsigned_abs());
        }
    }
    out.push(']');
}

fn bond_symbol(mol: &Mol, a: usize, b: usize, bond_type: BondType) -> &'static str {
    let both_aromatic = mol.atom(a).is_aromatic && mol.atom(b).is_aromatic;
    match bond_type {
        BondType::Single if both_aromatic => "-",
        BondType::Single => "",
        BondType::Double => "=",
        BondType::Triple => "#",
        BondType::Aromatic if both_aromatic => "",
        BondType::Aromatic => ":",
    }
}

fn push_label(out: &mut String, label: usize) {
    let _ = match label {
        0..=9 => write!(out, "{label}"),
        10..=99 => write!(out, "%{label}"),
        _ => write!(out, "%({label})"),
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Stereo bookkeeping shared by reader and writer
// ─────────────────────────────────────────────────────────────────────────────

/// Neighbour order the stored chiral tag refers to: hydrogen first, then the
/// bonded atoms in bond order.
fn bond_order_neighbors(mol: &Mol, atom: usize, has_hydrogen: bool) -> Vec<Neighbor> {
    let mut order = Vec::with_capacity(mol.degree(atom) + 1);
    if has_hydrogen {
        order.push(Neighbor::Hydrogen);
    }
    order.extend(mol.neighbors(atom).map(|(nbr, _)| Neighbor::Atom(nbr)));
    order
}

/// Parity of the permutation taking `from` to `to`, `None` when the two lists
/// are not permutations of each other.
fn permutation_is_odd(from: &[Neighbor], to: &[Neighbor]) -> Option<bool> {
    if from.len() != to.len() {
        return None;
    }
    let positions: Vec<usize> = to
        .iter()
        .map(|n| from.iter().position(|m| m == n))
        .collect::<Option<_>>()?;
    let mut inversions = 0usize;
    for i in 0..positions.len() {
        for j in i + 1..positions.len() {
            if positions[i] > positions[j] {
                inversions += 1;
            }
        }
    }
    Some(inversions % 2 == 1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Reader
// ─────────────────────────────────────────────────────────────────────────────

struct RingOpen {
    atom: usize,
    bond: Option<BondType>,
    slot: usize,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    mol: Mol,
    prev: Option<usize>,
    pending_bond: Option<BondType>,
    branches: Vec<usize>,
    rings: HashMap<usize, RingOpen>,
    smiles_order: Vec<Vec<Neighbor>>,
    smiles_tags: Vec<ChiralType>,
}

impl Parser {
    fn new(smiles: &str) -> Self {
        Self {
            chars: smiles.trim().chars().collect(),
            pos: 0,
            mol: Mol::new(),
            prev: None,
            pending_bond: None,
            branches: Vec::new(),
            rings: HashMap::new(),
            smiles_order: Vec::new(),
            smiles_tags: Vec::new(),
        }
    }

    fn error(&self, message: impl Into<String>) -> ChemError {
        ChemError::Parse {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse(mut self) -> Result<Mol, ChemError> {
        while let Some(c) = self.peek() {
            match c {
                '(' => {
                    let prev = self
                        .prev
                        .ok_or_else(|| self.error("branch without a preceding atom"))?;
                    self.branches.push(prev);
                    self.pos += 1;
                }
                ')' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond symbol before ')'"));
                    }
                    let prev = self.branches.pop().ok_or_else(|| self.error("unbalanced ')'"))?;
                    self.prev = Some(prev);
                    self.pos += 1;
                }
                '.' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '-' | '/' | '\\' => self.set_bond(BondType::Single)?,
                '=' => self.set_bond(BondType::Double)?,
                '#' => self.set_bond(BondType::Triple)?,
                ':' => self.set_bond(BondType::Aromatic)?,
                '%' | '0'..='9' => self.ring_bond()?,
                '[' => self.bracket_atom()?,
                _ if c.is_ascii_alphabetic() => self.organic_atom()?,
                _ => return Err(self.error(format!("unexpected character '{c}'"))),
            }
        }

        if self.pending_bond.is_some() {
            return Err(self.error("dangling bond symbol"));
        }
        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if let Some(label) = self.rings.keys().min() {
            return Err(self.error(format!("unclosed ring {label}")));
        }

        self.assign_stereo();
        Ok(self.mol)
    }

    fn set_bond(&mut self, bond_type: BondType) -> Result<(), ChemError> {
        if self.prev.is_none() || self.pending_bond.is_some() {
            return Err(self.error("misplaced bond symbol"));
        }
        self.pending_bond = Some(bond_type);
        self.pos += 1;
        Ok(())
    }

    fn default_bond(&self, a: usize, b: usize) -> BondType {
        if self.mol.atom(a).is_aromatic && self.mol.atom(b).is_aromatic {
            BondType::Aromatic
        } else {
            BondType::Single
        }
    }

    fn ring_bond(&mut self) -> Result<(), ChemError> {
        let atom = self.prev.ok_or_else(|| self.error("ring bond without a preceding atom"))?;
        let label = if self.peek() == Some('%') {
            self.percent_label()?
        } else {
            let digit = self.peek().and_then(|c| c.to_digit(10)).unwrap_or(0);
            self.pos += 1;
            digit as usize
        };

        let pending = self.pending_bond.take();
        match self.rings.remove(&label) {
            Some(open) => {
                let bond_type = pending
                    .or(open.bond)
                    .unwrap_or_else(|| self.default_bond(open.atom, atom));
                self.mol.add_bond(open.atom, atom, bond_type)?;
                self.smiles_order[open.atom][open.slot] = Neighbor::Atom(atom);
                self.smiles_order[atom].push(Neighbor::Atom(open.atom));
            }
            None => {
                let slot = self.smiles_order[atom].len();
                self.smiles_order[atom].push(Neighbor::Hydrogen);
                self.rings.insert(label, RingOpen { atom, bond: pending, slot });
            }
        }
        Ok(())
    }

    /// `%NN`, or `%(N...)` for labels past 99.
    fn percent_label(&mut self) -> Result<usize, ChemError> {
        if self.chars.get(self.pos + 1) == Some(&'(') {
            let digits: String = self
                .chars
                .iter()
                .skip(self.pos + 2)
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() || self.chars.get(self.pos + 2 + digits.len()) != Some(&')') {
                return Err(self.error("'%(' must be followed by digits and ')'"));
            }
            self.pos += digits.len() + 3;
            return digits.parse().map_err(|_| self.error("bad ring label"));
        }
        let digits: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
        if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(self.error("'%' must be followed by two digits"));
        }
        self.pos += 3;
        digits.parse().map_err(|_| self.error("bad ring label"))
    }

    fn organic_atom(&mut self) -> Result<(), ChemError> {
        let c = self.peek().unwrap_or(' ');
        let next = self.chars.get(self.pos + 1).copied();
        let (symbol, aromatic, width) = match (c, next) {
            ('C', Some('l')) => ("Cl".to_string(), false, 2),
            ('B', Some('r')) => ("Br".to_string(), false, 2),
            ('B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I', _) => (c.to_string(), false, 1),
            ('b' | 'c' | 'n' | 'o' | 'p' | 's', _) => (c.to_ascii_uppercase().to_string(), true, 1),
            _ => return Err(self.error(format!("'{c}' is not in the organic subset"))),
        };
        let mut atom = Atom::from_symbol(&symbol)?;
        atom.is_aromatic = aromatic;
        self.pos += width;
        self.push_atom(atom, ChiralType::Unspecified, false)
    }

    fn bracket_atom(&mut self) -> Result<(), ChemError> {
        self.pos += 1;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }

        let first = self
            .peek()
            .filter(char::is_ascii_alphabetic)
            .ok_or_else(|| self.error("expected an element symbol"))?;
        let aromatic = first.is_ascii_lowercase();
        let one = first.to_ascii_uppercase().to_string();
        let two = self
            .chars
            .get(self.pos + 1)
            .filter(|c| c.is_ascii_lowercase())
            .map(|c| format!("{one}{c}"));
        let (element, width) = match two.as_deref().map(Element::from_symbol) {
            Some(Ok(element)) => (element, 2),
            _ => (Element::from_symbol(&one)?, 1),
        };
        self.pos += width;

        let mut tag = ChiralType::Unspecified;
        if self.peek() == Some('@') {
            self.pos += 1;
            tag = ChiralType::TetrahedralCcw;
            if self.peek() == Some('@') {
                self.pos += 1;
                tag = ChiralType::TetrahedralCw;
            }
        }

        let mut hydrogens = 0;
        if self.peek() == Some('H') {
            self.pos += 1;
            hydrogens = self.read_number().unwrap_or(1);
        }

        let mut charge = 0i32;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            let unit = if sign == '+' { 1 } else { -1 };
            self.pos += 1;
            if let Some(magnitude) = self.read_number() {
                let magnitude =
                    i32::try_from(magnitude).map_err(|_| self.error("charge too large"))?;
                charge = unit * magnitude;
            } else {
                charge = unit;
                while self.peek() == Some(sign) {
                    charge += unit;
                    self.pos += 1;
                }
            }
        }

        if self.peek() == Some(':') {
            self.pos += 1;
            self.read_number();
        }
        if self.peek() != Some(']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;

        let mut atom = Atom::new(element);
        atom.is_aromatic = aromatic;
        atom.formal_charge = charge;
        atom.num_explicit_hs = hydrogens;
        atom.no_implicit = true;
        self.push_atom(atom, tag, hydrogens > 0)
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits.parse().ok()
    }

    fn push_atom(
        &mut self,
        atom: Atom,
        tag: ChiralType,
        has_hydrogen: bool,
    ) -> Result<(), ChemError> {
        let idx = self.mol.add_atom(atom);
        self.smiles_order.push(Vec::new());
        self.smiles_tags.push(tag);

        if let Some(prev) = self.prev {
            let bond_type = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_bond(prev, idx));
            self.mol.add_bond(prev, idx, bond_type)?;
            self.smiles_order[prev].push(Neighbor::Atom(idx));
            self.smiles_order[idx].push(Neighbor::Atom(prev));
        }
        if has_hydrogen {
            self.smiles_order[idx].push(Neighbor::Hydrogen);
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn assign_stereo(&mut self) {
        for idx in 0..self.mol.num_atoms() {
            let tag = self.smiles_tags[idx];
            if tag == ChiralType::Unspecified {
                continue;
            }
            let has_hydrogen = self.mol.atom(idx).num_explicit_hs > 0;
            let internal = bond_order_neighbors(&self.mol, idx, has_hydrogen);
            let parity = permutation_is_odd(&self.smiles_order[idx], &internal);
            self.mol.atom_mut(idx).chiral_tag = match parity {
                Some(true) => tag.inverted(),
                _ => tag,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(smiles: &str) -> String {
        to_smiles(&from_smiles(smiles).unwrap())
    }

    #[test]
    fn simple_chains() {
        assert_eq!(roundtrip("C"), "C");
        assert_eq!(roundtrip("CCO"), "CCO");
        assert_eq!(roundtrip("C=O"), "C=O");
        assert_eq!(roundtrip("C#N"), "C#N");
    }

    #[test]
    fn writer_is_independent_of_atom_order() {
        assert_eq!(roundtrip("OCC"), roundtrip("CCO"));
        assert_eq!(roundtrip("C(C)(C)C"), roundtrip("CC(C)C"));
        assert_eq!(roundtrip("C1CCCCC1O"), roundtrip("OC1CCCCC1"));
    }

    #[test]
    fn writer_output_parses_back_to_itself() {
        for smiles in [
            "CC(=O)Oc1ccccc1C(=O)O",
            "c1ccc2ccccc2c1",
            "c1cc[nH]c1",
            "[NH4+]",
            "C[N+](C)(C)C",
            "[O-]C=O",
            "C1CC2CCC1C2",
            "CC.O",
            "[H][H]",
            "N[C@@H](C)C(=O)O",
        ] {
            let once = roundtrip(smiles);
            assert_eq!(roundtrip(&once), once, "unstable output for {smiles}");
        }
    }

    #[test]
    fn bracket_atoms_keep_their_hydrogens() {
        let mol = from_smiles("[NH4+]").unwrap();
        let n = mol.atom(0);
        assert_eq!(n.formal_charge, 1);
        assert_eq!(n.num_explicit_hs, 4);
        assert!(n.no_implicit);
        assert_eq!(to_smiles(&mol), "[NH4+]");

        let mol = from_smiles("[O--]").unwrap();
        assert_eq!(mol.atom(0).formal_charge, -2);
        assert_eq!(to_smiles(&mol), "[O-2]");
    }

    #[test]
    fn aromatic_rings_and_ring_closures() {
        let mol = from_smiles("c1ccccc1").unwrap();
        assert_eq!(mol.num_bonds(), 6);
        assert!(mol.bonds().iter().all(|b| b.bond_type == BondType::Aromatic));
        assert_eq!(to_smiles(&mol), "c1ccccc1");

        let biphenyl = from_smiles("c1ccccc1-c1ccccc1").unwrap();
        assert_eq!(biphenyl.num_bonds(), 13);
        assert_eq!(
            biphenyl.bonds().iter().filter(|b| b.bond_type == BondType::Single).count(),
            1
        );
    }

    #[test]
    fn percent_ring_labels() {
        let mol = from_smiles("C%10CC%10").unwrap();
        assert_eq!(mol.num_bonds(), 3);
        let mol = from_smiles("C%(123)CC%(123)").unwrap();
        assert_eq!(mol.num_bonds(), 3);
        assert!(from_smiles("C%(12CC").is_err());
        assert!(from_smiles("C%()CC").is_err());
    }

    #[test]
    fn large_ring_labels_are_readable() {
        for (label, text) in [(7, "7"), (42, "%42"), (100, "%(100)"), (1234, "%(1234)")] {
            let mut out = String::new();
            push_label(&mut out, label);
            assert_eq!(out, text);
            let smiles = format!("C{text}CC{text}");
            assert_eq!(from_smiles(&smiles).unwrap().num_bonds(), 3, "{smiles}");
        }
    }

    #[test]
    fn components_are_written_in_a_fixed_order() {
        assert_eq!(roundtrip("C1CCCCC1.C1CC1"), "C1CC1.C1CCCCC1");
        assert_eq!(roundtrip("C1CC1.C1CCCCC1"), "C1CC1.C1CCCCC1");
        assert_eq!(roundtrip("O.CC"), roundtrip("CC.O"));
        assert_eq!(roundtrip("c1ccccc1.C1CCCCC1"), roundtrip("C1CCCCC1.c1ccccc1"));
    }

    #[test]
    fn chirality_is_preserved_through_reordering() {
        let l_alanine = roundtrip("N[C@@H](C)C(=O)O");
        let same = roundtrip("C[C@H](N)C(=O)O");
        let mirror = roundtrip("N[C@H](C)C(=O)O");
        assert_eq!(l_alanine, same);
        assert_ne!(l_alanine, mirror);
    }

    #[test]
    fn malformed_input_is_rejected() {
        for bad in ["C(", "C)", "C1CC", "C=", "[C", "X", "c", "C11", "(C)"] {
            assert!(from_smiles(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn empty_string_is_an_empty_molecule() {
        let mol = from_smiles("").unwrap();
        assert_eq!(mol.num_atoms(), 0);
        assert_eq!(to_smiles(&mol), "");
    }

    #[test]
    fn permutation_parity() {
        let a = [Neighbor::Atom(1), Neighbor::Atom(2), Neighbor::Atom(3)];
        let swapped = [Neighbor::Atom(2), Neighbor::Atom(1), Neighbor::Atom(3)];
        let rotated = [Neighbor::Atom(2), Neighbor::Atom(3), Neighbor::Atom(1)];
        assert_eq!(permutation_is_odd(&a, &swapped), Some(true));
        assert_eq!(permutation_is_odd(&a, &rotated), Some(false));
        assert_eq!(permutation_is_odd(&a, &a[..2]), None);
    }
}
