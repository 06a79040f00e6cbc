//! Interaction-preservation scoring.
//!
//! A candidate is rewarded for reproducing the receptor contacts its parent
//! fragments made. Interactions are opaque `(kind, residue)` pairs produced
//! by an external [`InteractionAnalyzer`](crate::pipeline::InteractionAnalyzer).

use crate::model::graph::MolecularGraph;
use crate::model::types::Element;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// One receptor contact, e.g. `hbond` with `ASP187A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interaction {
    pub kind: String,
    pub residue: String,
}

impl Interaction {
    pub fn new(kind: impl Into<String>, residue: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            residue: residue.into(),
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.residue)
    }
}

impl FromStr for Interaction {
    type Err = String;

    /// Parses `kind_residue`; underscores inside the kind become dashes on
    /// output, so the last underscore separates the two.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('_') {
            Some((kind, residue)) if !kind.is_empty() && !residue.is_empty() => {
                Ok(Self::new(kind.replace('_', "-"), residue))
            }
            _ => Err(format!("interaction '{s}' is not of the form kind_residue")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Fragments with fewer interactions than this are ignored.
    pub min_fragment_interactions: usize,
    /// A fragment is matched only when more interactions than this are shared.
    pub min_shared_interactions: usize,
    /// Matched fragments must conserve more than this fraction to count
    /// towards the median.
    pub fragment_match_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_fragment_interactions: 2,
            min_shared_interactions: 2,
            fragment_match_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionScore {
    /// Median conservation over matched fragments, 0 when none matched.
    pub median_preservation: f64,
    /// `(1 + shared) / (1 + fragment interactions)` over all scored fragments.
    pub global_preservation: f64,
    /// Global preservation per 100 Da of ligand mass.
    pub global_per_100_da: f64,
    /// Fragments whose conservation cleared the threshold, in input order.
    pub matched_fragments: Vec<String>,
}

impl InteractionScore {
    fn unavailable() -> Self {
        Self {
            median_preservation: f64::NAN,
            global_preservation: f64::NAN,
            global_per_100_da: f64::NAN,
            matched_fragments: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.global_preservation.is_nan()
    }
}

/// Scores candidates against the recorded interactions of their fragments.
#[derive(Debug, Clone, Default)]
pub struct InteractionScorer {
    config: ScoringConfig,
    fragments: BTreeMap<String, BTreeSet<Interaction>>,
}

impl InteractionScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            fragments: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn add_fragment(&mut self, id: impl Into<String>, interactions: BTreeSet<Interaction>) {
        self.fragments.insert(id.into(), interactions);
    }

    pub fn fragment_ids(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    /// Scores one candidate.
    ///
    /// `candidate` is `None` when no bound structure could be produced; the
    /// scores are then NaN and a warning is logged.
    pub fn score<S: AsRef<str>>(
        &self,
        ligand: &MolecularGraph,
        candidate: Option<&BTreeSet<Interaction>>,
        fragment_ids: &[S],
    ) -> InteractionScore {
        let Some(candidate) = candidate else {
            warn!("no bound structure for candidate; interaction scores unavailable");
            return InteractionScore::unavailable();
        };

        let mut shared_union: BTreeSet<&Interaction> = BTreeSet::new();
        let mut fragment_union: BTreeSet<&Interaction> = BTreeSet::new();
        let mut matched: Vec<(String, f64)> = Vec::new();

        for id in fragment_ids {
            let id = id.as_ref();
            let Some(fragment) = self.fragments.get(id) else {
                continue;
            };
            if fragment.len() < self.config.min_fragment_interactions {
                continue;
            }
            fragment_union.extend(fragment.iter());

            let shared: Vec<&Interaction> = fragment.intersection(candidate).collect();
            if shared.len() > self.config.min_shared_interactions {
                matched.push((id.to_string(), shared.len() as f64 / fragment.len() as f64));
                shared_union.extend(shared);
            }
        }

        let selected: Vec<(String, f64)> = matched
            .into_iter()
            .filter(|(_, conservation)| *conservation > self.config.fragment_match_threshold)
            .collect();
        let median_preservation = median(selected.iter().map(|(_, c)| *c).collect()).unwrap_or(0.0);
        let global_preservation =
            (1.0 + shared_union.len() as f64) / (1.0 + fragment_union.len() as f64);
        let mass = molecular_mass(ligand);
        let global_per_100_da = if mass > 0.0 {
            100.0 * global_preservation / mass
        } else {
            f64::NAN
        };

        InteractionScore {
            median_preservation,
            global_preservation,
            global_per_100_da,
            matched_fragments: selected.into_iter().map(|(id, _)| id).collect(),
        }
    }
}

/// Average molecular mass in daltons, implicit hydrogens included.
pub fn molecular_mass(graph: &MolecularGraph) -> f64 {
    graph
        .atoms()
        .map(|(_, atom)| {
            atom.element.atomic_mass() + f64::from(atom.hydrogens) * Element::H.atomic_mass()
        })
        .sum()
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}
