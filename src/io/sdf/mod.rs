//! MDL V2000 connection tables.
//!
//! Charges are read from both the atom block and `M  CHG` lines (the latter
//! wins when present), bond type 4 is aromatic and flags its endpoints, and
//! the `protected` data item lists 1-based indices of atoms the rectifier
//! must not delete.

pub mod reader;
pub mod writer;

pub use reader::{read, read_records};
pub use writer::{write, write_record};

use crate::model::graph::MolecularGraph;
use std::collections::BTreeMap;

/// Data item naming atoms that must survive rectification.
pub const PROTECTED_ITEM: &str = "protected";

/// One molecule of an SD file with its title and data items.
#[derive(Debug, Clone, Default)]
pub struct SdfRecord {
    pub title: String,
    pub graph: MolecularGraph,
    /// Data items other than [`PROTECTED_ITEM`], keyed by name.
    pub properties: BTreeMap<String, String>,
}

impl SdfRecord {
    pub fn new(title: impl Into<String>, graph: MolecularGraph) -> Self {
        Self {
            title: title.into(),
            graph,
            properties: BTreeMap::new(),
        }
    }
}
