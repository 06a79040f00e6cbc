//! Batch evaluation of merge and link jobs.
//!
//! Each candidate is merged or proposed, rectified, placed into the
//! receptor and scored on its own; a failure is recorded on that candidate
//! and never stops its siblings. External tools are reached through the
//! [`Linker`] and [`InteractionAnalyzer`] traits, optionally inside a
//! [`quiet`] scope.

mod collaborators;
mod quiet;

pub use collaborators::{InteractionAnalyzer, Linker};
pub use quiet::quiet;

use crate::config::PipelineConfig;
use crate::error::Error;
use crate::io;
use crate::merge::{CorrespondenceMap, merge};
use crate::model::atom::AtomId;
use crate::model::graph::MolecularGraph;
use crate::place::PlacementRequest;
use crate::rectify::Rectifier;
use crate::score::{InteractionScore, InteractionScorer};
use collaborators::as_external;
use quiet::quiet_if;
use thiserror::Error;
use tracing::{info, warn};

/// Why a candidate was rejected.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error(transparent)]
    Graph(#[from] Error),

    #[error("placement failed: {0}")]
    Placement(#[from] io::Error),
}

/// Fragments fused through atom correspondences.
#[derive(Debug, Clone)]
pub struct MergeJob {
    pub id: String,
    pub fragments: Vec<MolecularGraph>,
    /// Names of the fragments, used for scoring.
    pub fragment_ids: Vec<String>,
    pub correspondences: CorrespondenceMap,
}

/// A fragment pair to be joined by a linker at the given exit atoms.
#[derive(Debug, Clone)]
pub struct LinkJob {
    pub id: String,
    pub fragments: [MolecularGraph; 2],
    pub fragment_ids: [String; 2],
    pub exits: [AtomId; 2],
}

#[derive(Debug, Clone)]
pub struct Evaluated {
    pub graph: MolecularGraph,
    /// Repairs the rectifier applied.
    pub repairs: usize,
    /// Receptor-ligand complex, when a receptor was given.
    pub complex: Option<String>,
    /// Present when a scorer and analyzer were configured.
    pub score: Option<InteractionScore>,
}

#[derive(Debug)]
pub struct Candidate {
    pub id: String,
    pub fragment_ids: Vec<String>,
    pub outcome: Result<Evaluated, CandidateError>,
}

impl Candidate {
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_ok()
    }
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    request: PlacementRequest,
    structure: Option<String>,
    scorer: Option<InteractionScorer>,
    analyzer: Option<&'a dyn InteractionAnalyzer>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig) -> Self {
        let request = config.placement.request();
        Self {
            config,
            request,
            structure: None,
            scorer: None,
            analyzer: None,
        }
    }

    /// Receptor PDB block candidates are placed into.
    pub fn with_structure(mut self, pdb: impl Into<String>) -> Self {
        self.structure = Some(pdb.into());
        self
    }

    pub fn with_request(mut self, request: PlacementRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_scoring(mut self, scorer: InteractionScorer, analyzer: &'a dyn InteractionAnalyzer) -> Self {
        self.scorer = Some(scorer);
        self.analyzer = Some(analyzer);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Merges and evaluates one job.
    pub fn run_merge(&self, job: &MergeJob) -> Candidate {
        info!(job = %job.id, fragments = job.fragments.len(), "merging fragments");
        let outcome = merge(&job.fragments, &job.correspondences, &self.config.merge)
            .map_err(CandidateError::from)
            .and_then(|graph| self.evaluate(graph, &job.fragment_ids));
        self.finish(job.id.clone(), job.fragment_ids.clone(), outcome)
    }

    pub fn run_merges(&self, jobs: &[MergeJob]) -> Vec<Candidate> {
        jobs.iter().map(|job| self.run_merge(job)).collect()
    }

    /// Asks `linker` for proposals and evaluates each one independently.
    ///
    /// Only a failure of the linker itself is an error; rejected proposals
    /// are returned as candidates with their error.
    pub fn run_link(&self, job: &LinkJob, linker: &dyn Linker) -> Result<Vec<Candidate>, Error> {
        let [first, second] = &job.fragments;
        let proposals = quiet_if(self.config.quiet_collaborators, || {
            linker.link(first, job.exits[0], second, job.exits[1])
        })
        .map_err(|e| as_external(linker.name(), e))?;
        info!(job = %job.id, proposals = proposals.len(), "linker returned proposals");

        let fragment_ids = job.fragment_ids.to_vec();
        Ok(proposals
            .into_iter()
            .enumerate()
            .map(|(i, proposal)| {
                let outcome = self.evaluate(proposal, &fragment_ids);
                self.finish(format!("{}_{i}", job.id), fragment_ids.clone(), outcome)
            })
            .collect())
    }

    fn evaluate(&self, graph: MolecularGraph, fragment_ids: &[String]) -> Result<Evaluated, CandidateError> {
        let mut rectifier = Rectifier::new(graph, self.config.rectifier.clone());
        rectifier.fix()?;
        let repairs = rectifier.steps();
        let graph = rectifier.into_graph();

        let complex = match &self.structure {
            Some(structure) => Some(
                self.config
                    .placement
                    .backend
                    .placer()
                    .insert(structure, &graph, &self.request)?,
            ),
            None => None,
        };

        let score = match (&self.scorer, self.analyzer) {
            (Some(scorer), Some(analyzer)) => {
                let interactions = match &complex {
                    Some(pdb) => Some(
                        quiet_if(self.config.quiet_collaborators, || analyzer.interactions(pdb))
                            .map_err(|e| as_external(analyzer.name(), e))?,
                    ),
                    None => None,
                };
                Some(scorer.score(&graph, interactions.as_ref(), fragment_ids))
            }
            _ => None,
        };

        Ok(Evaluated {
            graph,
            repairs,
            complex,
            score,
        })
    }

    fn finish(
        &self,
        id: String,
        fragment_ids: Vec<String>,
        outcome: Result<Evaluated, CandidateError>,
    ) -> Candidate {
        match &outcome {
            Ok(evaluated) => info!(
                candidate = %id,
                atoms = evaluated.graph.atom_count(),
                repairs = evaluated.repairs,
                "candidate accepted"
            ),
            Err(error) => warn!(candidate = %id, %error, "candidate rejected"),
        }
        Candidate {
            id,
            fragment_ids,
            outcome,
        }
    }
}
