use crate::io::error::Error;
use crate::model::atom::AtomId;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A residue written as its number followed by an optional chain letter,
/// e.g. `145A` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueRef {
    pub number: i32,
    pub chain: Option<char>,
}

impl ResidueRef {
    pub fn new(number: i32, chain: Option<char>) -> Self {
        Self { number, chain }
    }

    pub fn chain_or(&self, default: char) -> char {
        self.chain.unwrap_or(default)
    }
}

impl FromStr for ResidueRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let digits_end = text
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let number = text[..digits_end]
            .parse::<i32>()
            .map_err(|_| Error::InvalidResidue(s.to_string()))?;

        let mut rest = text[digits_end..].chars();
        let chain = match (rest.next(), rest.next()) {
            (None, _) => None,
            (Some(c), None) if !c.is_ascii_digit() => Some(c),
            _ => return Err(Error::InvalidResidue(s.to_string())),
        };
        Ok(Self { number, chain })
    }
}

impl fmt::Display for ResidueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number)?;
        if let Some(chain) = self.chain {
            write!(f, "{chain}")?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for ResidueRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A covalent bond between a receptor residue and one ligand atom.
#[derive(Debug, Clone, PartialEq)]
pub struct CovalentLink {
    /// Receptor residue; chain defaults to `A`.
    pub residue: ResidueRef,
    pub residue_name: String,
    pub protein_atom: String,
    /// Ligand atom bonded to the receptor.
    pub ligand_atom: AtomId,
    /// Bond length written into the record, in Ångströms.
    pub distance: f64,
}

impl CovalentLink {
    /// A cysteine `SG` link, the common warhead target.
    pub fn cysteine(residue: ResidueRef, ligand_atom: AtomId) -> Self {
        Self {
            residue,
            residue_name: "CYS".to_string(),
            protein_atom: "SG".to_string(),
            ligand_atom,
            distance: 1.8,
        }
    }
}

pub(crate) const PROTEIN_CHAIN: char = 'A';
pub(crate) const LIGAND_CHAIN: char = 'B';

/// Formats a `LINK` record between `link`'s receptor atom and the padded
/// ligand atom name `ligand_atom`.
pub(crate) fn link_record(
    link: &CovalentLink,
    ligand_atom: &str,
    ligand_resn: &str,
    ligand: ResidueRef,
) -> String {
    format!(
        "LINK        {:<4} {} {} {:>3}                {:<4} {} {} {:>3}     1555   1555  {:.1}",
        format!(" {:<3}", link.protein_atom),
        link.residue_name,
        link.residue.chain_or(PROTEIN_CHAIN),
        link.residue.number,
        ligand_atom,
        ligand_resn,
        ligand.chain_or(LIGAND_CHAIN),
        ligand.number,
        link.distance,
    )
}
