use super::aromatic;
use super::rings::RingClass;
use super::valence::{self, ValenceTable};
use crate::error::Error;
use crate::model::atom::AtomId;
use crate::model::graph::MolecularGraph;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Reported for diagnostics; not a reason to reject a graph on its own.
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationTarget {
    Atom(AtomId),
    Bond(AtomId, AtomId),
    Ring(Vec<AtomId>),
}

impl fmt::Display for ViolationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationTarget::Atom(id) => write!(f, "atom {id}"),
            ViolationTarget::Bond(a, b) => write!(f, "bond {a}-{b}"),
            ViolationTarget::Ring(atoms) => {
                f.write_str("ring [")?;
                for (i, id) in atoms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{id}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationKind {
    OverValent,
    UnderValent,
    BadAromaticRing,
    DanglingAttachment,
    /// Ring topology the rectifier could not repair.
    InvalidRing(RingClass),
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::OverValent => f.write_str("over-valent"),
            ViolationKind::UnderValent => f.write_str("under-valent"),
            ViolationKind::BadAromaticRing => f.write_str("bad aromatic ring"),
            ViolationKind::DanglingAttachment => f.write_str("dangling attachment"),
            ViolationKind::InvalidRing(class) => write!(f, "{class} ring"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Violation {
    pub target: ViolationTarget,
    pub kind: ViolationKind,
    pub severity: Severity,
}

impl Violation {
    pub fn new(target: ViolationTarget, kind: ViolationKind) -> Self {
        let severity = match kind {
            ViolationKind::UnderValent => Severity::Info,
            _ => Severity::Error,
        };
        Self {
            target,
            kind,
            severity,
        }
    }

    pub fn atom(&self) -> Option<AtomId> {
        match self.target {
            ViolationTarget::Atom(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.kind, self.target)
    }
}

/// Checks every atom and ring against the embedded valence table.
pub fn validate(graph: &MolecularGraph) -> Result<Vec<Violation>, Error> {
    validate_with(graph, valence::default_table()?)
}

/// Checks every atom against `table` and every aromatic-flagged ring for
/// feasibility. Atom findings come first in ascending id order, followed by
/// ring, stray bond and stray atom findings.
pub fn validate_with(graph: &MolecularGraph, table: &ValenceTable) -> Result<Vec<Violation>, Error> {
    let mut violations = Vec::new();
    let multi_atom = graph.atom_count() > 1;

    for (id, atom) in graph.atoms() {
        let dangling = atom.element.is_placeholder()
            || (atom.provenance.is_synthetic() && multi_atom && graph.degree(id) == 0);
        if dangling {
            violations.push(Violation::new(
                ViolationTarget::Atom(id),
                ViolationKind::DanglingAttachment,
            ));
            continue;
        }

        let allowed = table.allowed(id, atom)?;
        let current = valence::valence(graph, id);
        let (Some(min), Some(max)) = (allowed.first(), allowed.last()) else {
            continue;
        };
        if current > u16::from(*max) {
            violations.push(Violation::new(
                ViolationTarget::Atom(id),
                ViolationKind::OverValent,
            ));
        } else if current < u16::from(*min) {
            violations.push(Violation::new(
                ViolationTarget::Atom(id),
                ViolationKind::UnderValent,
            ));
        }
    }

    for ring in graph.sssr() {
        if aromatic::is_aromatic_ring(graph, ring) && !aromatic::is_aromatizable(graph, ring) {
            violations.push(Violation::new(
                ViolationTarget::Ring(ring.clone()),
                ViolationKind::BadAromaticRing,
            ));
        }
    }
    for (a, b) in aromatic::stray_aromatic_bonds(graph) {
        violations.push(Violation::new(
            ViolationTarget::Bond(a, b),
            ViolationKind::BadAromaticRing,
        ));
    }
    for id in aromatic::stray_aromatic_atoms(graph) {
        violations.push(Violation::new(
            ViolationTarget::Atom(id),
            ViolationKind::BadAromaticRing,
        ));
    }

    Ok(violations)
}

/// Whether any violation is an error.
pub fn has_errors(violations: &[Violation]) -> bool {
    violations.iter().any(|v| v.severity == Severity::Error)
}
