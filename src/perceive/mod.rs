//! Ring perception, aromaticity feasibility and valence validation.
//!
//! Everything here is a pure function of a [`MolecularGraph`](crate::MolecularGraph).
//! The rectifier calls into these passes after every repair; nothing in
//! this module mutates a graph except [`rebalance_hydrogens`].

pub mod aromatic;
pub mod rings;
pub mod valence;
pub mod validate;

pub use rings::{Ring, RingClass, RingRules, perceive_rings, perceive_rings_with};
pub use valence::{ValenceRule, ValenceTable, default_table, rebalance_hydrogens};
pub use validate::{Severity, Violation, ViolationKind, ViolationTarget, validate, validate_with};
