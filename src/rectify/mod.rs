//! The graph rectifier: a bounded, rule-driven repair state machine.
//!
//! A [`Rectifier`] owns one candidate graph and walks it through
//!
//! ```text
//! Unchecked → RingReview → ValenceReview → AromaticityReview → Valid
//!                  ↘             ↘                 ↘
//!                                Failed
//! ```
//!
//! Each review state applies one repair per pass and re-runs perception
//! afterwards, so a repair never acts on stale ring or violation data. Every
//! state is bounded by [`RectifierConfig::retry_cap`], which caps a full run
//! at three times that many repairs. All choices between equally eligible
//! atoms or bonds are made in ascending id order, so identical inputs always
//! produce identical outputs.

mod aromatic;
mod config;
mod rings;
mod valence;

pub use config::RectifierConfig;

use crate::error::Error;
use crate::model::graph::MolecularGraph;
use crate::perceive::{self, ValenceTable, Violation, ViolationKind, perceive_rings_with, validate_with};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RectifierState {
    Unchecked,
    RingReview,
    ValenceReview,
    AromaticityReview,
    Valid,
    Failed,
}

impl fmt::Display for RectifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RectifierState::Unchecked => "unchecked",
            RectifierState::RingReview => "ring review",
            RectifierState::ValenceReview => "valence review",
            RectifierState::AromaticityReview => "aromaticity review",
            RectifierState::Valid => "valid",
            RectifierState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of a single repair attempt inside a review state.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Repair {
    Applied(String),
    Clean,
    Stuck(Vec<Violation>),
}

/// Drives one exclusively owned graph to a valid state, or to a recorded
/// failure.
///
/// # Examples
///
/// ```
/// use frag_forge::{Atom, BondOrder, Element, MolecularGraph, Rectifier, RectifierConfig, RectifierState};
///
/// // Formaldehyde with one hydrogen too many on carbon.
/// let mut graph = MolecularGraph::new();
/// let c = graph.add_atom(Atom::new(Element::C).with_hydrogens(3));
/// let o = graph.add_atom(Atom::new(Element::O));
/// graph.add_bond(c, o, BondOrder::Double)?;
///
/// let mut rectifier = Rectifier::new(graph, RectifierConfig::default());
/// let fixed = rectifier.fix()?;
/// assert_eq!(fixed.atom(c).unwrap().hydrogens, 2);
/// assert_eq!(rectifier.state(), RectifierState::Valid);
/// assert_eq!(rectifier.steps(), 1);
/// # Ok::<(), frag_forge::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Rectifier {
    graph: MolecularGraph,
    config: RectifierConfig,
    table: Option<ValenceTable>,
    state: RectifierState,
    steps: usize,
    violations: Vec<Violation>,
    failure: Option<Error>,
}

impl Rectifier {
    pub fn new(graph: MolecularGraph, config: RectifierConfig) -> Self {
        Self {
            graph,
            config,
            table: None,
            state: RectifierState::Unchecked,
            steps: 0,
            violations: Vec::new(),
            failure: None,
        }
    }

    /// Uses a custom valence table instead of the embedded one.
    pub fn with_table(mut self, table: ValenceTable) -> Self {
        self.table = Some(table);
        self
    }

    pub fn state(&self) -> RectifierState {
        self.state
    }

    /// Repairs applied so far; hydrogen rebalancing is not counted.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn graph(&self) -> &MolecularGraph {
        &self.graph
    }

    /// The last violation list seen by the state machine.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_graph(self) -> MolecularGraph {
        self.graph
    }

    /// Runs the state machine to a terminal state.
    ///
    /// Calling `fix` on a rectifier that already reached `Valid` only
    /// re-confirms validity. A failed rectifier keeps returning its failure.
    pub fn fix(&mut self) -> Result<&MolecularGraph, Error> {
        let table: Cow<'static, ValenceTable> = match &self.table {
            Some(table) => Cow::Owned(table.clone()),
            None => Cow::Borrowed(perceive::default_table()?),
        };

        loop {
            match self.state {
                RectifierState::Unchecked => {
                    self.graph.refresh_ring_flags();
                    self.transition(RectifierState::RingReview);
                }
                RectifierState::RingReview => self.review_rings()?,
                RectifierState::ValenceReview => self.review_valence(&table)?,
                RectifierState::AromaticityReview => self.review_aromaticity(&table)?,
                RectifierState::Valid => {
                    let violations = validate_with(&self.graph, &table)?;
                    if violations.is_empty() {
                        return Ok(&self.graph);
                    }
                    self.fail(RectifierState::Valid, violations);
                }
                RectifierState::Failed => {
                    return Err(self.failure.clone().unwrap_or_else(|| {
                        Error::RectificationFailed {
                            state: RectifierState::Failed,
                            violations: self.violations.clone(),
                        }
                    }));
                }
            }
        }
    }

    fn review_rings(&mut self) -> Result<(), Error> {
        let rules = self.config.ring_rules();
        for _ in 0..self.config.retry_cap {
            match rings::repair_once(&mut self.graph, &rules) {
                Ok(Repair::Applied(description)) => self.record(&description),
                Ok(Repair::Clean) => {
                    self.transition(RectifierState::ValenceReview);
                    return Ok(());
                }
                Ok(Repair::Stuck(violations)) => {
                    self.fail(RectifierState::RingReview, violations);
                    return Ok(());
                }
                Err(e) => return Err(self.abort(e)),
            }
        }

        let remaining = rings::ring_violations(&perceive_rings_with(&self.graph, &rules));
        if remaining.is_empty() {
            self.transition(RectifierState::ValenceReview);
        } else {
            self.fail(RectifierState::RingReview, remaining);
        }
        Ok(())
    }

    fn review_valence(&mut self, table: &ValenceTable) -> Result<(), Error> {
        if let Err(e) = perceive::rebalance_hydrogens(&mut self.graph, table) {
            return Err(self.abort(e));
        }

        let rules = self.config.ring_rules();
        for _ in 0..self.config.retry_cap {
            match valence::repair_once(&mut self.graph, table, &rules) {
                Ok(Repair::Applied(description)) => self.record(&description),
                Ok(Repair::Clean) => {
                    self.transition(RectifierState::AromaticityReview);
                    return Ok(());
                }
                Ok(Repair::Stuck(violations)) => {
                    self.fail(RectifierState::ValenceReview, violations);
                    return Ok(());
                }
                Err(e) => return Err(self.abort(e)),
            }
        }

        let violations = validate_with(&self.graph, table).map_err(|e| self.abort(e))?;
        let unresolved = violations.iter().any(|v| {
            matches!(
                v.kind,
                ViolationKind::DanglingAttachment | ViolationKind::OverValent
            )
        });
        if unresolved {
            self.fail(RectifierState::ValenceReview, violations);
        } else {
            self.transition(RectifierState::AromaticityReview);
        }
        Ok(())
    }

    fn review_aromaticity(&mut self, table: &ValenceTable) -> Result<(), Error> {
        let sweep = match aromatic::dearomatize(&mut self.graph, table, self.config.retry_cap) {
            Ok(sweep) => sweep,
            Err(e) => return Err(self.abort(e)),
        };
        self.steps += sweep.repairs;
        if sweep.repairs > 0 {
            debug!(repairs = sweep.repairs, "de-aromatised infeasible aromatic systems");
        }

        if let Err(e) = perceive::rebalance_hydrogens(&mut self.graph, table) {
            return Err(self.abort(e));
        }
        self.graph.refresh_ring_flags();

        let mut violations = validate_with(&self.graph, table).map_err(|e| self.abort(e))?;
        violations.extend(rings::ring_violations(&perceive_rings_with(
            &self.graph,
            &self.config.ring_rules(),
        )));

        if sweep.exhausted || !violations.is_empty() {
            self.fail(RectifierState::AromaticityReview, violations);
        } else {
            self.violations.clear();
            self.transition(RectifierState::Valid);
        }
        Ok(())
    }

    fn record(&mut self, description: &str) {
        self.steps += 1;
        self.graph.refresh_ring_flags();
        debug!(state = %self.state, step = self.steps, "{description}");
    }

    fn transition(&mut self, next: RectifierState) {
        info!(from = %self.state, to = %next, steps = self.steps, "rectifier transition");
        self.state = next;
    }

    fn fail(&mut self, during: RectifierState, violations: Vec<Violation>) {
        warn!(
            state = %during,
            steps = self.steps,
            violations = violations.len(),
            "rectification failed"
        );
        self.failure = Some(Error::RectificationFailed {
            state: during,
            violations: violations.clone(),
        });
        self.violations = violations;
        self.state = RectifierState::Failed;
    }

    /// Records a hard error (such as an unsupported element) as the failure.
    fn abort(&mut self, error: Error) -> Error {
        warn!(state = %self.state, %error, "rectification aborted");
        self.failure = Some(error.clone());
        self.state = RectifierState::Failed;
        error
    }
}

/// Rectifies `graph` with `config` and returns the repaired graph.
pub fn rectify(graph: MolecularGraph, config: &RectifierConfig) -> Result<MolecularGraph, Error> {
    let mut rectifier = Rectifier::new(graph, config.clone());
    rectifier.fix()?;
    Ok(rectifier.into_graph())
}
