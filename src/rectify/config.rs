use crate::error::Error;
use crate::perceive::RingRules;
use serde::Deserialize;

/// Tunables for the [`Rectifier`](super::Rectifier).
///
/// All fields have defaults, so a TOML table only needs the keys it changes:
///
/// ```
/// use frag_forge::RectifierConfig;
///
/// let config = RectifierConfig::from_toml_str("retry_cap = 4").unwrap();
/// assert_eq!(config.retry_cap, 4);
/// assert_eq!(config.max_ring_size, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RectifierConfig {
    /// Maximum repairs attempted in each review state.
    pub retry_cap: usize,
    pub min_ring_size: usize,
    pub max_ring_size: usize,
    /// Two rings sharing more atoms than this are treated as bridged.
    pub bridge_atom_cutoff: usize,
}

impl Default for RectifierConfig {
    fn default() -> Self {
        let rules = RingRules::default();
        Self {
            retry_cap: 10,
            min_ring_size: rules.min_size,
            max_ring_size: rules.max_size,
            bridge_atom_cutoff: rules.bridge_atom_cutoff,
        }
    }
}

impl RectifierConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    pub fn ring_rules(&self) -> RingRules {
        RingRules {
            min_size: self.min_ring_size,
            max_size: self.max_ring_size,
            bridge_atom_cutoff: self.bridge_atom_cutoff,
        }
    }

    /// Upper bound on repairs a single `fix` can apply.
    pub fn max_total_repairs(&self) -> usize {
        self.retry_cap.saturating_mul(3)
    }

    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.min_ring_size < 3 || self.min_ring_size > self.max_ring_size {
            return Err(Error::Config(format!(
                "ring size window [{}, {}] is invalid",
                self.min_ring_size, self.max_ring_size
            )));
        }
        Ok(())
    }
}
