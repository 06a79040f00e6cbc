//! Text formats for ligands and receptor structures.
//!
//! - [`sdf`] — MDL V2000 connection tables, the exchange format for fragments
//!   and candidate ligands.
//! - [`pdb`] — a minimal record-level PDB model used to insert a ligand into
//!   a receptor block without a full structure parser.

use std::fmt;

pub mod error;
pub mod util;

pub mod pdb;
pub mod sdf;

pub use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdb,
    Sdf,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Pdb => write!(f, "PDB"),
            Format::Sdf => write!(f, "SDF"),
        }
    }
}
