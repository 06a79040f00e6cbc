//! Core data structures for fragment and candidate molecules.
//!
//! - [`types`] – Element and bond order enumerations.
//! - [`atom`] – Atom records with chemistry attributes, coordinates and provenance.
//! - [`graph`] – The id-keyed [`MolecularGraph`](graph::MolecularGraph) arena
//!   with its lazily perceived ring set.
//!
//! Atoms and bonds are plain structs with named fields. Every pass that reads
//! or writes chemistry does so through these fields, and topology is only ever
//! expressed through [`AtomId`](atom::AtomId) keys.

pub mod atom;
pub mod graph;
pub mod types;
