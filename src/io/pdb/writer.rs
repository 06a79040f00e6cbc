use super::{AtomRecord, Conect, CoordinateLine, PdbBlock};
use crate::io::{error::Error, util};
use crate::model::atom::AtomId;
use crate::model::graph::MolecularGraph;
use std::collections::BTreeMap;
use std::io::Write;

/// Residue the ligand's `HETATM` records are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigandResidue {
    pub name: String,
    pub chain: char,
    pub number: i32,
}

impl Default for LigandResidue {
    fn default() -> Self {
        Self {
            name: "LIG".to_string(),
            chain: 'B',
            number: 1,
        }
    }
}

/// Ligand `HETATM` and `CONECT` records, serials starting at 1.
///
/// Placeholder atoms are skipped. Atoms are named by element and a running
/// per-element count (`C1`, `C2`, `N1`); the returned map gives each written
/// atom's padded name.
pub fn ligand_block(
    graph: &MolecularGraph,
    residue: &LigandResidue,
) -> Result<(PdbBlock, BTreeMap<AtomId, String>), Error> {
    let mut block = PdbBlock::default();
    let mut serials: BTreeMap<AtomId, u32> = BTreeMap::new();
    let mut names: BTreeMap<AtomId, String> = BTreeMap::new();
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();

    for (id, atom) in graph.atoms() {
        if atom.element.is_placeholder() {
            continue;
        }
        let position = atom.position.ok_or(Error::MissingCoordinates { atom: id })?;

        let symbol = atom.element.symbol();
        let count = counts.entry(symbol).or_insert(0);
        *count += 1;
        let name = util::pad_atom_name(
            &format!("{}{}", symbol.to_ascii_uppercase(), count),
            atom.element,
        );

        let serial = serials.len() as u32 + 1;
        serials.insert(id, serial);
        names.insert(id, name.clone());

        block.coordinates.push(CoordinateLine::Atom(AtomRecord {
            hetero: true,
            serial,
            name,
            alt_loc: ' ',
            residue_name: residue.name.clone(),
            chain: residue.chain,
            residue_number: residue.number,
            insertion_code: ' ',
            position,
            occupancy: 1.0,
            temperature_factor: 0.0,
            element: symbol.to_ascii_uppercase(),
            charge: pdb_charge(atom.formal_charge),
        }));
    }

    for (id, serial) in &serials {
        let bonded: Vec<u32> = graph
            .neighbors(*id)
            .filter_map(|n| serials.get(&n).copied())
            .collect();
        for chunk in bonded.chunks(4) {
            block.connections.push(Conect {
                serial: *serial,
                bonded: chunk.to_vec(),
            });
        }
    }

    Ok((block, names))
}

/// Writes the ligand as a standalone PDB block terminated by `END`.
pub fn write<W: Write>(mut writer: W, graph: &MolecularGraph, residue: &LigandResidue) -> Result<(), Error> {
    let (mut block, _) = ligand_block(graph, residue)?;
    block.footers.push("END".to_string());
    write!(writer, "{block}")?;
    Ok(())
}

fn pdb_charge(formal_charge: i8) -> String {
    match formal_charge {
        0 => String::new(),
        q if q > 0 => format!("{q}+"),
        q => format!("{}-", q.unsigned_abs()),
    }
}
