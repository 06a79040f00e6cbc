use super::Format;
use crate::model::atom::AtomId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("ligand atom {atom} has no coordinates and cannot be written")]
    MissingCoordinates { atom: AtomId },

    #[error("invalid residue reference '{0}': expected a number with an optional chain letter")]
    InvalidResidue(String),

    #[error("covalent link names atom {atom}, which is not a placeable ligand atom")]
    UnknownLinkAtom { atom: AtomId },

    #[error("graph could not be built from {format} data: {source}")]
    Graph {
        format: Format,
        #[source]
        source: crate::error::Error,
    },
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn graph(format: Format, source: crate::error::Error) -> Self {
        Self::Graph { format, source }
    }
}
