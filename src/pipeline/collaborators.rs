use crate::error::Error;
use crate::model::atom::AtomId;
use crate::model::graph::MolecularGraph;
use crate::score::Interaction;
use std::collections::BTreeSet;

/// A generative model that proposes linkers joining two fragments at their
/// exit atoms.
///
/// Proposals come back as whole molecules; an empty list is a valid answer.
pub trait Linker {
    fn name(&self) -> &str {
        "linker"
    }

    fn link(
        &self,
        first: &MolecularGraph,
        first_exit: AtomId,
        second: &MolecularGraph,
        second_exit: AtomId,
    ) -> Result<Vec<MolecularGraph>, Error>;
}

/// Computes receptor contacts of a ligand bound in a PDB complex.
pub trait InteractionAnalyzer {
    fn name(&self) -> &str {
        "interaction analyzer"
    }

    fn interactions(&self, bound_pdb: &str) -> Result<BTreeSet<Interaction>, Error>;
}

/// Re-labels a collaborator error as an external tool failure, keeping
/// errors that already are one.
pub(super) fn as_external(tool: &str, error: Error) -> Error {
    match error {
        Error::ExternalToolFailure { .. } => error,
        other => Error::external(tool, other.to_string()),
    }
}
