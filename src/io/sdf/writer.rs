use super::{PROTECTED_ITEM, SdfRecord};
use crate::io::{error::Error, util};
use crate::model::atom::AtomId;
use crate::model::graph::MolecularGraph;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

pub fn write<W: Write>(writer: W, graph: &MolecularGraph) -> Result<(), Error> {
    write_block(writer, "", graph, &BTreeMap::new())
}

pub fn write_record<W: Write>(writer: W, record: &SdfRecord) -> Result<(), Error> {
    write_block(writer, &record.title, &record.graph, &record.properties)
}

fn write_block<W: Write>(
    mut writer: W,
    title: &str,
    graph: &MolecularGraph,
    properties: &BTreeMap<String, String>,
) -> Result<(), Error> {
    let index: HashMap<AtomId, usize> = graph
        .atom_ids()
        .enumerate()
        .map(|(i, id)| (id, i + 1))
        .collect();

    writeln!(writer, "{title}")?;
    writeln!(writer, "  frag-forge")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        graph.atom_count(),
        graph.bond_count()
    )?;

    let mut charged = Vec::new();
    for (id, atom) in graph.atoms() {
        let [x, y, z] = atom.position.unwrap_or([0.0; 3]);
        writeln!(
            writer,
            "{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}  0  0  0  0  0  0  0  0  0  0",
            x,
            y,
            z,
            atom.element.symbol(),
            util::charge_to_ctfile(atom.formal_charge)
        )?;
        if atom.formal_charge != 0 {
            charged.push((index[&id], atom.formal_charge));
        }
    }

    for bond in graph.bonds() {
        writeln!(
            writer,
            "{:>3}{:>3}{:>3}  0  0  0  0",
            index[&bond.a],
            index[&bond.b],
            util::bond_order_to_ctfile(bond.order)
        )?;
    }

    for chunk in charged.chunks(8) {
        write!(writer, "M  CHG{:>3}", chunk.len())?;
        for (i, charge) in chunk {
            write!(writer, " {i:>3} {charge:>3}")?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "M  END")?;

    let protected: Vec<String> = graph
        .atoms()
        .filter(|(_, atom)| atom.protected)
        .map(|(id, _)| index[&id].to_string())
        .collect();
    if !protected.is_empty() {
        writeln!(writer, "> <{PROTECTED_ITEM}>")?;
        writeln!(writer, "{}", protected.join(" "))?;
        writeln!(writer)?;
    }
    for (name, value) in properties {
        if name == PROTECTED_ITEM {
            continue;
        }
        writeln!(writer, "> <{name}>")?;
        writeln!(writer, "{value}")?;
        writeln!(writer)?;
    }

    writeln!(writer, "$$$$")?;
    Ok(())
}
