use super::link::{link_record, ResidueRef};
use super::{PlacementRequest, Placer};
use crate::io::error::Error;
use crate::io::pdb;
use crate::model::graph::MolecularGraph;

/// Joins the `LINK` record, the receptor block and the ligand block without
/// touching serials or residue numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawPlacer;

impl Placer for RawPlacer {
    fn insert(
        &self,
        structure: &str,
        ligand: &MolecularGraph,
        request: &PlacementRequest,
    ) -> Result<String, Error> {
        let residue = request.ligand();
        let (mut ligand_block, names) = pdb::ligand_block(ligand, &residue)?;
        ligand_block.footers.push("END".to_string());

        let link = match &request.covalent {
            Some(link) => {
                let name = names.get(&link.ligand_atom).ok_or(Error::UnknownLinkAtom {
                    atom: link.ligand_atom,
                })?;
                link_record(
                    link,
                    name,
                    &residue.name,
                    ResidueRef::new(residue.number, Some(residue.chain)),
                )
            }
            None => String::new(),
        };

        let joined = [link.trim(), structure.trim(), &ligand_block.to_string()].join("\n");
        Ok(joined.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::AtomId;
    use crate::place::fixtures::{APO, warhead};
    use crate::place::CovalentLink;

    #[test]
    fn concatenates_without_corrections() {
        let out = RawPlacer
            .insert(APO, &warhead(), &PlacementRequest::default())
            .unwrap();
        assert!(out.starts_with("HEADER    TEST RECEPTOR"));
        assert!(out.contains("END\nHETATM    1  C1  LIG B   1"));
        assert!(out.ends_with("END"));
        assert!(!out.contains("LINK"));
    }

    #[test]
    fn covalent_link_leads_the_block() {
        let request = PlacementRequest::default()
            .with_covalent(CovalentLink::cysteine(ResidueRef::new(145, Some('A')), AtomId(0)));
        let out = RawPlacer.insert(APO, &warhead(), &request).unwrap();
        assert!(out.starts_with("LINK         SG  CYS A 145"));
    }
}
