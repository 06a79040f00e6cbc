//! Minimal record-level PDB model.
//!
//! A [`PdbBlock`] splits a PDB text into header lines, coordinate records,
//! `CONECT` records and trailing lines. It is enough to append a ligand to a
//! receptor with consistent serial numbers; it is not a structure parser.

pub mod reader;
pub mod writer;

pub use reader::parse;
pub use writer::{LigandResidue, ligand_block, write};

use std::collections::BTreeSet;
use std::fmt;

/// One `ATOM` or `HETATM` record.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub hetero: bool,
    pub serial: u32,
    /// The four-column name field, padding included.
    pub name: String,
    pub alt_loc: char,
    pub residue_name: String,
    pub chain: char,
    pub residue_number: i32,
    pub insertion_code: char,
    pub position: [f64; 3],
    pub occupancy: f64,
    pub temperature_factor: f64,
    pub element: String,
    pub charge: String,
}

impl fmt::Display for AtomRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6}{:>5} {:<4}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}{:<2}",
            if self.hetero { "HETATM" } else { "ATOM" },
            self.serial,
            self.name,
            self.alt_loc,
            self.residue_name,
            self.chain,
            self.residue_number,
            self.insertion_code,
            self.position[0],
            self.position[1],
            self.position[2],
            self.occupancy,
            self.temperature_factor,
            self.element,
            self.charge,
        )
    }
}

/// A line of the coordinate section.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateLine {
    Atom(AtomRecord),
    /// `TER`, `ANISOU`, `MODEL` and similar lines, kept verbatim.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conect {
    pub serial: u32,
    pub bonded: Vec<u32>,
}

impl fmt::Display for Conect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CONECT{:>5}", self.serial)?;
        for other in &self.bonded {
            write!(f, "{other:>5}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbBlock {
    pub headers: Vec<String>,
    pub coordinates: Vec<CoordinateLine>,
    pub connections: Vec<Conect>,
    pub footers: Vec<String>,
}

impl PdbBlock {
    pub fn atoms(&self) -> impl Iterator<Item = &AtomRecord> {
        self.coordinates.iter().filter_map(|line| match line {
            CoordinateLine::Atom(record) => Some(record),
            CoordinateLine::Other(_) => None,
        })
    }

    /// Highest atom serial, or 0 for a block without atoms.
    pub fn max_serial(&self) -> u32 {
        self.atoms().map(|a| a.serial).max().unwrap_or(0)
    }

    /// Every `(chain, residue number)` pair present.
    pub fn residues(&self) -> BTreeSet<(char, i32)> {
        self.atoms().map(|a| (a.chain, a.residue_number)).collect()
    }

    pub fn max_residue_number(&self, chain: char) -> Option<i32> {
        self.atoms()
            .filter(|a| a.chain == chain)
            .map(|a| a.residue_number)
            .max()
    }

    /// Appends another block's atoms and connections after this block's,
    /// shifting their serials past the highest serial already present.
    ///
    /// Headers and trailing lines of `other` are discarded.
    pub fn append(&mut self, other: PdbBlock) {
        let offset = self.max_serial();
        for line in other.coordinates {
            match line {
                CoordinateLine::Atom(mut record) => {
                    record.serial += offset;
                    self.coordinates.push(CoordinateLine::Atom(record));
                }
                CoordinateLine::Other(text) => self.coordinates.push(CoordinateLine::Other(text)),
            }
        }
        for mut conect in other.connections {
            conect.serial += offset;
            for serial in &mut conect.bonded {
                *serial += offset;
            }
            self.connections.push(conect);
        }
    }
}

impl fmt::Display for PdbBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.headers {
            writeln!(f, "{header}")?;
        }
        for line in &self.coordinates {
            match line {
                CoordinateLine::Atom(record) => writeln!(f, "{record}")?,
                CoordinateLine::Other(text) => writeln!(f, "{text}")?,
            }
        }
        for conect in &self.connections {
            writeln!(f, "{conect}")?;
        }
        for footer in &self.footers {
            writeln!(f, "{footer}")?;
        }
        Ok(())
    }
}
