use super::link::{link_record, ResidueRef};
use super::{PlacementRequest, Placer};
use crate::io::error::Error;
use crate::io::pdb;
use crate::model::graph::MolecularGraph;
use tracing::debug;

/// Appends the ligand to the parsed receptor block with serials shifted past
/// the receptor's, renumbering the ligand residue on a `(chain, number)`
/// clash and adding a `LINK` header for covalent ligands.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalPlacer;

impl Placer for MinimalPlacer {
    fn insert(
        &self,
        structure: &str,
        ligand: &MolecularGraph,
        request: &PlacementRequest,
    ) -> Result<String, Error> {
        let mut block = pdb::parse(structure)?;
        let mut residue = request.ligand();

        if block.residues().contains(&(residue.chain, residue.number)) {
            let free = block
                .max_residue_number(residue.chain)
                .map_or(1, |n| n.saturating_add(1));
            debug!(
                chain = %residue.chain,
                from = residue.number,
                to = free,
                "renumbered ligand residue to avoid a clash"
            );
            residue.number = free;
        }

        let (ligand_block, names) = pdb::ligand_block(ligand, &residue)?;

        if let Some(link) = &request.covalent {
            let name = names
                .get(&link.ligand_atom)
                .ok_or(Error::UnknownLinkAtom {
                    atom: link.ligand_atom,
                })?;
            block.headers.push(link_record(
                link,
                name,
                &residue.name,
                ResidueRef::new(residue.number, Some(residue.chain)),
            ));
        }

        block.append(ligand_block);
        Ok(block.to_string())
    }
}
