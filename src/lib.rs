//! A pure Rust library for turning docked fragment hits into chemically valid
//! ligand candidates. It fuses fragments through atom correspondences,
//! repairs the result with a bounded rectification state machine, places the
//! survivors into a receptor PDB block and scores how well they keep the
//! receptor contacts of their parent fragments.
//!
//! # Features
//!
//! - **Fragment merging** — Fuse any number of fragments through shared
//!   attachment keys with provenance kept per atom
//! - **Ring perception** — SSSR rings classified as valid, oversized,
//!   undersized, bridged, spiro or non-aromatizable
//! - **Validation** — Valence and aromaticity checks against a data-driven
//!   valence table
//! - **Rectification** — Deterministic ring, valence and aromaticity repair
//!   with a hard step bound
//! - **Placement** — Minimal PDB rewriting or raw concatenation, with
//!   covalent `LINK` records
//! - **Scoring** — Interaction-preservation scores per candidate
//! - **Flexible I/O** — Read/write SDF, read and write PDB blocks
//!
//! # Quick Start
//!
//! Merge two fragments that share a carbon, then rectify the result:
//!
//! ```
//! use frag_forge::{Atom, BondOrder, Element, MolecularGraph};
//! use frag_forge::{CorrespondenceMap, MergeOptions, RectifierConfig, merge, rectify, validate};
//!
//! // Methanol and methylamine, both anchored on their carbon
//! let mut methanol = MolecularGraph::new();
//! let c1 = methanol.add_atom(Atom::new(Element::C).with_hydrogens(3));
//! let o = methanol.add_atom(Atom::new(Element::O).with_hydrogens(1));
//! methanol.add_bond(c1, o, BondOrder::Single)?;
//!
//! let mut amine = MolecularGraph::new();
//! let c2 = amine.add_atom(Atom::new(Element::C).with_hydrogens(3));
//! let n = amine.add_atom(Atom::new(Element::N).with_hydrogens(2));
//! amine.add_bond(c2, n, BondOrder::Single)?;
//!
//! let mut correspondences = CorrespondenceMap::new();
//! correspondences.pair((0, c1), (1, c2))?;
//!
//! // The fused carbon keeps three hydrogens and is over-valent
//! let merged = merge(&[methanol, amine], &correspondences, &MergeOptions::default())?;
//! assert_eq!(merged.atom_count(), 3);
//! assert!(!validate(&merged)?.is_empty());
//!
//! let fixed = rectify(merged, &RectifierConfig::default())?;
//! assert!(validate(&fixed)?.is_empty());
//! let carbon = fixed.atoms().find(|(_, atom)| atom.element == Element::C);
//! assert_eq!(carbon.map(|(_, atom)| atom.hydrogens), Some(2));
//! # Ok::<(), frag_forge::Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io`] — SDF and PDB reading and writing
//! - [`perceive`] — Ring perception, aromaticity and valence validation
//! - [`pipeline`] — Batch evaluation of merge and linker jobs
//! - [`merge()`] — Fragment fusion
//! - [`Rectifier`] — The repair state machine
//! - [`place()`] — Receptor placement
//!
//! # Data Types
//!
//! - [`MolecularGraph`] — Id-keyed atom arena with bonds and cached rings
//! - [`Atom`] — Element, charge, hydrogens, coordinates and provenance
//! - [`Bond`] — Bond between two atom ids with a [`BondOrder`]
//! - [`CorrespondenceMap`] — Fragment atoms grouped by [`AttachmentKey`]
//! - [`Violation`] — One validation finding
//! - [`InteractionScore`] — Preservation scores of one candidate
//!
//! ## Configuration
//!
//! - [`PipelineConfig`] — TOML-loadable settings for every stage
//! - [`RectifierConfig`] — Ring size bounds and retry cap
//! - [`ScoringConfig`] — Interaction thresholds
//! - [`PlacementBackend`] — Minimal or raw placement

mod config;
mod error;
mod merge;
mod model;
mod place;
mod rectify;
mod score;

pub mod io;
pub mod perceive;
pub mod pipeline;

pub use error::Error;

pub use model::atom::{Atom, AtomId, FragmentAtom, Provenance};
pub use model::graph::{Bond, MolecularGraph};
pub use model::types::{BondOrder, Element, ParseBondOrderError, ParseElementError};

pub use merge::{AttachmentKey, CorrespondenceMap, MergeOptions, merge};

pub use perceive::{
    Ring, RingClass, RingRules, Severity, ValenceTable, Violation, ViolationKind,
    ViolationTarget, perceive_rings, validate,
};

pub use rectify::{Rectifier, RectifierConfig, RectifierState, rectify};

pub use place::{
    CovalentLink, MinimalPlacer, PlacementBackend, PlacementRequest, Placer, RawPlacer,
    ResidueRef, place,
};

pub use score::{Interaction, InteractionScore, InteractionScorer, ScoringConfig, molecular_mass};

pub use config::{PipelineConfig, PlacementConfig};
