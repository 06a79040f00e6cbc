use super::types::Element;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable atom identifier, unique within one [`MolecularGraph`](super::graph::MolecularGraph).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AtomId(pub u32);

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An atom of a specific input fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentAtom {
    /// Index of the fragment in the merge input.
    pub fragment: usize,
    /// Atom id inside that fragment.
    pub atom: AtomId,
}

/// Where an atom came from.
///
/// A merged atom traces back to exactly one originating fragment atom;
/// atoms that were fused onto it through a correspondence are listed in
/// `fused`. Atoms proposed by a linker, or built by hand, are synthetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provenance {
    Fragment {
        origin: FragmentAtom,
        fused: Vec<FragmentAtom>,
    },
    #[default]
    Synthetic,
}

impl Provenance {
    pub fn fragment(fragment: usize, atom: AtomId) -> Self {
        Provenance::Fragment {
            origin: FragmentAtom { fragment, atom },
            fused: Vec::new(),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Provenance::Synthetic)
    }

    /// The originating fragment index, if any.
    pub fn fragment_index(&self) -> Option<usize> {
        match self {
            Provenance::Fragment { origin, .. } => Some(origin.fragment),
            Provenance::Synthetic => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: Element,
    pub formal_charge: i8,
    pub is_aromatic: bool,
    /// Explicit plus implicit hydrogen count.
    pub hydrogens: u8,
    /// Cartesian coordinates in Ångströms; `None` for purely topological atoms.
    pub position: Option<[f64; 3]>,
    pub provenance: Provenance,
    /// Must not be deleted during rectification.
    pub protected: bool,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
            is_aromatic: false,
            hydrogens: 0,
            position: None,
            provenance: Provenance::Synthetic,
            protected: false,
        }
    }

    pub fn at(element: Element, position: [f64; 3]) -> Self {
        Self {
            position: Some(position),
            ..Self::new(element)
        }
    }

    pub fn with_hydrogens(mut self, hydrogens: u8) -> Self {
        self.hydrogens = hydrogens;
        self
    }

    pub fn with_charge(mut self, formal_charge: i8) -> Self {
        self.formal_charge = formal_charge;
        self
    }

    pub fn aromatic(mut self) -> Self {
        self.is_aromatic = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
