//! CSV helpers for loading SMILES datasets.
//!
//! Molecule datasets usually ship as CSV files with one SMILES string per
//! row (plus targets nobody here cares about). These routines pull one named
//! column out of such a file and parse every entry into a sanitized [`Mol`],
//! ready for [`crate::context::MolBuildingEnvContext::mol_to_graph`].
use std::error::Error;
use std::io::Read;
use std::path::Path;

use crate::chem::{self, Mol};

/// Read a CSV file and parse the SMILES strings of column `smiles_col`.
///
/// Errors are returned if the CSV cannot be read, the column is missing, or
/// an entry fails to parse or sanitize (the message names the record).
///
/// Example usage:
/// ```no_run
/// use molbuild::data_io::read_smiles_csv;
/// let mols = read_smiles_csv("data/qm9.csv", "smiles")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn read_smiles_csv<P: AsRef<Path>>(
    path: P,
    smiles_col: &str,
) -> Result<Vec<Mol>, Box<dyn Error>> {
    let rdr = csv::Reader::from_path(&path)?;
    read_records(rdr, smiles_col)
}

/// Convenience: load SMILES from a reader (useful for tests and in-memory data).
pub fn read_smiles_csv_from_reader(
    reader: impl Read,
    smiles_col: &str,
) -> Result<Vec<Mol>, Box<dyn Error>> {
    read_records(csv::Reader::from_reader(reader), smiles_col)
}

fn read_records<R: Read>(
    mut rdr: csv::Reader<R>,
    smiles_col: &str,
) -> Result<Vec<Mol>, Box<dyn Error>> {
    let col = rdr
        .headers()?
        .iter()
        .position(|h| h == smiles_col)
        .ok_or_else(|| format!("SMILES column '{}' not found in CSV headers", smiles_col))?;

    let mut mols = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let smiles = record
            .get(col)
            .ok_or_else(|| format!("record {} has no field at index {}", i, col))?
            .trim();
        let mol = chem::from_smiles(smiles)
            .map_err(|e| format!("failed to parse SMILES '{}' in record {}: {}", smiles, i, e))?;
        mols.push(mol);
    }
    tracing::debug!(count = mols.len(), "loaded SMILES dataset");
    Ok(mols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_smiles_from_reader_example() {
        let data = "mol_id,smiles,gap\ngdb_1,C,0.5\ngdb_2, OCC ,0.3\ngdb_3,c1ccoc1,0.2\n";
        let mols = read_smiles_csv_from_reader(data.as_bytes(), "smiles").expect("read CSV");
        assert_eq!(mols.len(), 3);
        assert_eq!(mols[1].num_atoms(), 3);
        assert_eq!(chem::to_smiles(&mols[1]), "CCO");
        assert!(mols[2].atoms().iter().all(|a| a.is_aromatic));
    }

    #[test]
    fn missing_column_and_bad_smiles_are_errors() {
        let data = "id,smiles\n1,CC\n";
        let err = read_smiles_csv_from_reader(data.as_bytes(), "SMILES").unwrap_err();
        assert!(err.to_string().contains("not found"));

        let data = "smiles\nCC\nC(C\n";
        let err = read_smiles_csv_from_reader(data.as_bytes(), "smiles").unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }
}
