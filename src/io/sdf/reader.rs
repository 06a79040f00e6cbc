use super::{PROTECTED_ITEM, SdfRecord};
use crate::io::{Format, error::Error, util};
use crate::model::{atom::Atom, atom::AtomId, graph::MolecularGraph};
use std::io::BufRead;

type Line = (usize, String);

/// Reads the first molecule of an SD file.
///
/// Implicit hydrogens are not derived, so an aromatic `[nH]` arrives as a
/// bare nitrogen; aromaticity perception still accepts such rings.
pub fn read<R: BufRead>(reader: R) -> Result<MolecularGraph, Error> {
    read_records(reader)?
        .into_iter()
        .next()
        .map(|record| record.graph)
        .ok_or_else(|| Error::parse(Format::Sdf, 1, "no molecule record found"))
}

/// Reads every molecule of an SD file, in file order.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<SdfRecord>, Error> {
    let mut records = Vec::new();
    let mut block: Vec<Line> = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let content = line?;
        if content.trim() == "$$$$" {
            if has_content(&block) {
                records.push(parse_record(&block)?);
            }
            block.clear();
            continue;
        }
        block.push((i + 1, content));
    }
    if has_content(&block) {
        records.push(parse_record(&block)?);
    }
    Ok(records)
}

fn has_content(block: &[Line]) -> bool {
    block.iter().any(|(_, line)| !line.trim().is_empty())
}

fn parse_record(lines: &[Line]) -> Result<SdfRecord, Error> {
    let first_line = lines.first().map(|(ln, _)| *ln).unwrap_or(1);
    if lines.len() < 4 {
        return Err(Error::parse(
            Format::Sdf,
            first_line,
            "SDF block must contain at least a header and counts line",
        ));
    }

    let (counts_line_no, counts_line) = (&lines[3].0, &lines[3].1);
    if counts_line.contains("V3000") {
        return Err(Error::parse(
            Format::Sdf,
            *counts_line_no,
            "V3000 is not supported",
        ));
    }

    let (atom_count, bond_count) = parse_counts(counts_line, *counts_line_no)?;
    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let props_start = bond_start + bond_count;

    if lines.len() < props_start {
        return Err(Error::parse(
            Format::Sdf,
            lines.last().map(|(ln, _)| *ln).unwrap_or(*counts_line_no),
            "SDF block ended before atoms/bonds were fully specified",
        ));
    }

    let mut graph = MolecularGraph::new();
    let ids = parse_atoms(&lines[atom_start..bond_start], &mut graph)?;
    parse_bonds(&lines[bond_start..props_start], &ids, &mut graph)?;
    let consumed = parse_properties(&lines[props_start..], &ids, &mut graph)?;

    let mut properties = std::collections::BTreeMap::new();
    for (ln, name, value) in parse_data_items(&lines[props_start + consumed..]) {
        if name == PROTECTED_ITEM {
            mark_protected(&value, ln, &ids, &mut graph)?;
        } else {
            properties.insert(name, value);
        }
    }

    flag_aromatic_atoms(&mut graph);
    graph.refresh_ring_flags();

    Ok(SdfRecord {
        title: lines[0].1.trim().to_string(),
        graph,
        properties,
    })
}

/// Fixed-width field, or an empty string when the line is too short.
fn column(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_counts(line: &str, line_no: usize) -> Result<(usize, usize), Error> {
    let atoms = column(line, 0, 3)
        .parse::<usize>()
        .map_err(|_| Error::parse(Format::Sdf, line_no, "invalid atom count"))?;
    let bonds = column(line, 3, 6)
        .parse::<usize>()
        .map_err(|_| Error::parse(Format::Sdf, line_no, "invalid bond count"))?;
    Ok((atoms, bonds))
}

fn parse_atoms(lines: &[Line], graph: &mut MolecularGraph) -> Result<Vec<AtomId>, Error> {
    let mut ids = Vec::with_capacity(lines.len());
    for (ln, raw) in lines {
        let coord = |start: usize, axis: &str| {
            column(raw, start, start + 10).parse::<f64>().map_err(|_| {
                Error::parse(Format::Sdf, *ln, format!("invalid {axis} coordinate in atom line"))
            })
        };
        let position = [coord(0, "x")?, coord(10, "y")?, coord(20, "z")?];

        let element = util::guess_element_symbol(column(raw, 31, 34))
            .ok_or_else(|| Error::parse(Format::Sdf, *ln, "unable to infer element symbol"))?;

        let charge_field = column(raw, 36, 39);
        let formal_charge = if charge_field.is_empty() {
            0
        } else {
            charge_field
                .parse::<i32>()
                .ok()
                .and_then(util::charge_from_ctfile)
                .ok_or_else(|| Error::parse(Format::Sdf, *ln, "invalid charge code in atom line"))?
        };

        ids.push(graph.add_atom(Atom::at(element, position).with_charge(formal_charge)));
    }
    Ok(ids)
}

fn parse_bonds(lines: &[Line], ids: &[AtomId], graph: &mut MolecularGraph) -> Result<(), Error> {
    for (ln, raw) in lines {
        let index = |start: usize, which: &str| {
            column(raw, start, start + 3)
                .parse::<usize>()
                .map_err(|_| Error::parse(Format::Sdf, *ln, format!("invalid {which} atom index")))
        };
        let a1 = index(0, "first")?;
        let a2 = index(3, "second")?;
        let order_val = column(raw, 6, 9)
            .parse::<i32>()
            .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid bond order value"))?;
        let order = util::bond_order_from_ctfile(order_val)
            .ok_or_else(|| Error::parse(Format::Sdf, *ln, "unsupported bond order in bond line"))?;

        let (Some(a), Some(b)) = (lookup(ids, a1), lookup(ids, a2)) else {
            return Err(Error::parse(
                Format::Sdf,
                *ln,
                "bond references atom outside declared range",
            ));
        };
        graph
            .add_bond(a, b, order)
            .map_err(|e| Error::parse(Format::Sdf, *ln, e.to_string()))?;
    }
    Ok(())
}

fn lookup(ids: &[AtomId], one_based: usize) -> Option<AtomId> {
    one_based.checked_sub(1).and_then(|i| ids.get(i)).copied()
}

/// Applies the property block up to `M  END` and returns how many lines it
/// spanned.
fn parse_properties(lines: &[Line], ids: &[AtomId], graph: &mut MolecularGraph) -> Result<usize, Error> {
    let mut charges = Vec::new();
    let mut consumed = lines.len();
    for (i, (ln, raw)) in lines.iter().enumerate() {
        if raw.starts_with("M  END") {
            consumed = i + 1;
            break;
        }
        if !raw.starts_with("M  CHG") {
            continue;
        }
        let tokens: Vec<&str> = raw.split_whitespace().skip(3).collect();
        for pair in tokens.chunks(2) {
            let [index, value] = pair else {
                return Err(Error::parse(Format::Sdf, *ln, "unpaired entry in M  CHG line"));
            };
            let atom = index
                .parse::<usize>()
                .ok()
                .and_then(|i| lookup(ids, i))
                .ok_or_else(|| Error::parse(Format::Sdf, *ln, "M  CHG references unknown atom"))?;
            let charge = value
                .parse::<i8>()
                .map_err(|_| Error::parse(Format::Sdf, *ln, "invalid charge in M  CHG line"))?;
            charges.push((atom, charge));
        }
    }

    if !charges.is_empty() {
        for id in ids {
            if let Some(atom) = graph.atom_mut(*id) {
                atom.formal_charge = 0;
            }
        }
        for (id, charge) in charges {
            if let Some(atom) = graph.atom_mut(id) {
                atom.formal_charge = charge;
            }
        }
    }
    Ok(consumed)
}

fn parse_data_items(lines: &[Line]) -> Vec<(usize, String, String)> {
    let mut items = Vec::new();
    let mut current: Option<(usize, String, Vec<&str>)> = None;
    for (ln, raw) in lines {
        if raw.starts_with('>') {
            if let Some((at, name, value)) = current.take() {
                items.push((at, name, value.join("\n")));
            }
            let name = raw
                .split_once('<')
                .and_then(|(_, rest)| rest.split_once('>'))
                .map(|(name, _)| name.to_string())
                .unwrap_or_default();
            current = Some((*ln, name, Vec::new()));
        } else if raw.trim().is_empty() {
            if let Some((at, name, value)) = current.take() {
                items.push((at, name, value.join("\n")));
            }
        } else if let Some((_, _, value)) = current.as_mut() {
            value.push(raw.trim_end());
        }
    }
    if let Some((at, name, value)) = current {
        items.push((at, name, value.join("\n")));
    }
    items
}

fn mark_protected(value: &str, line: usize, ids: &[AtomId], graph: &mut MolecularGraph) -> Result<(), Error> {
    for token in value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        let id = token
            .parse::<usize>()
            .ok()
            .and_then(|i| lookup(ids, i))
            .ok_or_else(|| {
                Error::parse(
                    Format::Sdf,
                    line,
                    format!("protected atom index '{token}' is out of range"),
                )
            })?;
        if let Some(atom) = graph.atom_mut(id) {
            atom.protected = true;
        }
    }
    Ok(())
}

fn flag_aromatic_atoms(graph: &mut MolecularGraph) {
    let aromatic: Vec<AtomId> = graph
        .bonds()
        .filter(|bond| bond.is_aromatic())
        .flat_map(|bond| [bond.a, bond.b])
        .collect();
    for id in aromatic {
        if let Some(atom) = graph.atom_mut(id) {
            atom.is_aromatic = true;
        }
    }
}
