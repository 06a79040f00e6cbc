use super::{AtomRecord, Conect, CoordinateLine, PdbBlock};
use crate::io::{Format, error::Error};
use std::str::FromStr;

const COORDINATE_RECORDS: [&str; 5] = ["TER", "ANISOU", "MODEL", "ENDMDL", "SIGUIJ"];

/// Splits PDB text into headers, coordinate records, `CONECT` records and
/// trailing lines.
///
/// Lines before the first coordinate record are headers; anything that is
/// neither a coordinate nor a `CONECT` record after that is a trailer.
pub fn parse(text: &str) -> Result<PdbBlock, Error> {
    let mut block = PdbBlock::default();
    for (i, raw) in text.lines().enumerate() {
        let ln = i + 1;
        let line = raw.trim_end();
        if line.is_empty() {
            continue;
        }
        let record = column(line, 0, 6);
        match record {
            "ATOM" | "HETATM" => {
                block
                    .coordinates
                    .push(CoordinateLine::Atom(parse_atom(line, ln)?));
            }
            "CONECT" => block.connections.push(parse_conect(line, ln)?),
            _ if COORDINATE_RECORDS.contains(&record) => {
                block.coordinates.push(CoordinateLine::Other(line.to_string()));
            }
            _ if block.coordinates.is_empty() => block.headers.push(line.to_string()),
            _ => block.footers.push(line.to_string()),
        }
    }
    Ok(block)
}

impl FromStr for PdbBlock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn column(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn raw_column(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("")
}

fn char_at(line: &str, index: usize) -> char {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .unwrap_or(' ')
}

fn parse_atom(line: &str, ln: usize) -> Result<AtomRecord, Error> {
    let number = |start: usize, end: usize, what: &str| {
        column(line, start, end)
            .parse::<f64>()
            .map_err(|_| Error::parse(Format::Pdb, ln, format!("invalid {what} in atom record")))
    };
    let optional = |start: usize, end: usize, default: f64| {
        let field = column(line, start, end);
        if field.is_empty() {
            Ok(default)
        } else {
            field
                .parse::<f64>()
                .map_err(|_| Error::parse(Format::Pdb, ln, "invalid occupancy or B-factor"))
        }
    };

    let serial = column(line, 6, 11)
        .parse::<u32>()
        .map_err(|_| Error::parse(Format::Pdb, ln, "invalid atom serial"))?;
    let residue_number = column(line, 22, 26)
        .parse::<i32>()
        .map_err(|_| Error::parse(Format::Pdb, ln, "invalid residue number"))?;

    Ok(AtomRecord {
        hetero: column(line, 0, 6) == "HETATM",
        serial,
        name: format!("{:<4}", raw_column(line, 12, 16)),
        alt_loc: char_at(line, 16),
        residue_name: column(line, 17, 20).to_string(),
        chain: char_at(line, 21),
        residue_number,
        insertion_code: char_at(line, 26),
        position: [
            number(30, 38, "x coordinate")?,
            number(38, 46, "y coordinate")?,
            number(46, 54, "z coordinate")?,
        ],
        occupancy: optional(54, 60, 1.0)?,
        temperature_factor: optional(60, 66, 0.0)?,
        element: column(line, 76, 78).to_string(),
        charge: column(line, 78, 80).to_string(),
    })
}

fn parse_conect(line: &str, ln: usize) -> Result<Conect, Error> {
    let serial_at = |start: usize| {
        column(line, start, start + 5)
            .parse::<u32>()
            .map_err(|_| Error::parse(Format::Pdb, ln, "invalid serial in CONECT record"))
    };
    let serial = serial_at(6)?;
    let mut bonded = Vec::new();
    for start in (11..line.len()).step_by(5) {
        if column(line, start, start + 5).is_empty() {
            continue;
        }
        bonded.push(serial_at(start)?);
    }
    Ok(Conect { serial, bonded })
}
