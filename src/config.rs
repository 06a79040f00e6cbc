//! Pipeline configuration.
//!
//! Every table is optional in TOML; missing keys take the defaults below.
//!
//! ```
//! use frag_forge::{PipelineConfig, PlacementBackend};
//!
//! let config = PipelineConfig::from_toml_str(r#"
//!     [rectifier]
//!     retry_cap = 5
//!
//!     [placement]
//!     backend = "raw"
//!     ligand_residue = "401B"
//! "#).unwrap();
//! assert_eq!(config.rectifier.retry_cap, 5);
//! assert_eq!(config.placement.backend, PlacementBackend::Raw);
//! assert_eq!(config.scoring.fragment_match_threshold, 0.5);
//! ```

use crate::error::Error;
use crate::merge::MergeOptions;
use crate::place::{PlacementBackend, PlacementRequest, ResidueRef};
use crate::rectify::RectifierConfig;
use crate::score::ScoringConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub rectifier: RectifierConfig,
    pub merge: MergeOptions,
    pub placement: PlacementConfig,
    pub scoring: ScoringConfig,
    /// Mute log output of external collaborators while they run.
    pub quiet_collaborators: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rectifier: RectifierConfig::default(),
            merge: MergeOptions::default(),
            placement: PlacementConfig::default(),
            scoring: ScoringConfig::default(),
            quiet_collaborators: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(text)?;
        config.rectifier.check()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlacementConfig {
    pub backend: PlacementBackend,
    /// Residue for the ligand, e.g. `"1B"`.
    pub ligand_residue: ResidueRef,
    pub ligand_resn: String,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        let request = PlacementRequest::default();
        Self {
            backend: PlacementBackend::default(),
            ligand_residue: request.ligand_residue,
            ligand_resn: request.ligand_resn,
        }
    }
}

impl PlacementConfig {
    /// A non-covalent request for the configured residue.
    pub fn request(&self) -> PlacementRequest {
        PlacementRequest {
            ligand_residue: self.ligand_residue,
            ligand_resn: self.ligand_resn.clone(),
            covalent: None,
        }
    }
}
