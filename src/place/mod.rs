//! Insertion of a validated ligand into a receptor PDB block.
//!
//! Two backends implement [`Placer`]: [`MinimalPlacer`] rewrites serials and
//! residue numbering through the record-level [`PdbBlock`](crate::io::pdb::PdbBlock)
//! model, while [`RawPlacer`] concatenates the blocks as they are. The
//! backend is chosen by [`PlacementBackend`], usually from configuration.

mod link;
mod minimal;
mod raw;

pub use link::{CovalentLink, ResidueRef};
pub use minimal::MinimalPlacer;
pub use raw::RawPlacer;

use crate::io::error::Error;
use crate::io::pdb::LigandResidue;
use crate::model::graph::MolecularGraph;
use serde::Deserialize;
use std::fmt;

/// Inserts a ligand into a receptor structure, returning the complex as PDB
/// text.
pub trait Placer {
    fn insert(
        &self,
        structure: &str,
        ligand: &MolecularGraph,
        request: &PlacementRequest,
    ) -> Result<String, Error>;
}

/// How the ligand is filed in the complex.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    /// Ligand residue; chain defaults to `B`.
    pub ligand_residue: ResidueRef,
    pub ligand_resn: String,
    /// Present when the ligand is covalently bound to the receptor.
    pub covalent: Option<CovalentLink>,
}

impl Default for PlacementRequest {
    fn default() -> Self {
        Self {
            ligand_residue: ResidueRef::new(1, None),
            ligand_resn: "LIG".to_string(),
            covalent: None,
        }
    }
}

impl PlacementRequest {
    pub fn with_covalent(mut self, link: CovalentLink) -> Self {
        self.covalent = Some(link);
        self
    }

    pub fn is_covalent(&self) -> bool {
        self.covalent.is_some()
    }

    pub(crate) fn ligand(&self) -> LigandResidue {
        LigandResidue {
            name: self.ligand_resn.clone(),
            chain: self.ligand_residue.chain_or(link::LIGAND_CHAIN),
            number: self.ligand_residue.number,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementBackend {
    #[default]
    Minimal,
    Raw,
}

impl PlacementBackend {
    pub fn placer(&self) -> Box<dyn Placer + Send + Sync> {
        match self {
            PlacementBackend::Minimal => Box::new(MinimalPlacer),
            PlacementBackend::Raw => Box::new(RawPlacer),
        }
    }
}

impl fmt::Display for PlacementBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementBackend::Minimal => write!(f, "minimal"),
            PlacementBackend::Raw => write!(f, "raw"),
        }
    }
}

/// Inserts `ligand` into `structure` with the chosen backend.
pub fn place(
    structure: &str,
    ligand: &MolecularGraph,
    request: &PlacementRequest,
    backend: PlacementBackend,
) -> Result<String, Error> {
    backend.placer().insert(structure, ligand, request)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::AtomId;

    #[test]
    fn backend_selects_placer() {
        let request = PlacementRequest::default();
        let minimal = place(fixtures::APO, &fixtures::warhead(), &request, PlacementBackend::Minimal).unwrap();
        let raw = place(fixtures::APO, &fixtures::warhead(), &request, PlacementBackend::Raw).unwrap();
        assert_ne!(minimal, raw);
        assert_eq!(PlacementBackend::default(), PlacementBackend::Minimal);
        assert_eq!(PlacementBackend::Raw.to_string(), "raw");
    }

    #[test]
    fn request_defaults_to_chain_b() {
        let request = PlacementRequest::default()
            .with_covalent(CovalentLink::cysteine(ResidueRef::new(145, Some('A')), AtomId(0)));
        assert!(request.is_covalent());
        let ligand = request.ligand();
        assert_eq!((ligand.chain, ligand.number, ligand.name.as_str()), ('B', 1, "LIG"));
    }

    #[test]
    fn backend_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            backend: PlacementBackend,
        }
        let parsed: Wrapper = toml::from_str("backend = \"raw\"").unwrap();
        assert_eq!(parsed.backend, PlacementBackend::Raw);
    }
}
