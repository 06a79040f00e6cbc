//! Error types for merging, validation and rectification.
//!
//! Every structural failure is typed and carries the ids needed to log or
//! re-drive the offending candidate. Text parsing and placement failures
//! live in [`crate::io::error`].

use crate::model::atom::AtomId;
use crate::model::types::Element;
use crate::perceive::Violation;
use crate::rectify::RectifierState;
use thiserror::Error;

/// Errors produced by the merge, validation and rectification engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A correspondence entry names a fragment or atom that does not exist,
    /// or maps one atom to two attachment keys.
    #[error("malformed correspondence for fragment {fragment}, atom {atom}: {detail}")]
    MalformedCorrespondence {
        /// Fragment index as given by the caller.
        fragment: usize,
        /// Atom id inside that fragment.
        atom: AtomId,
        /// Description of the problem.
        detail: String,
    },

    /// The rectifier could not reach a valid graph within its retry budget.
    ///
    /// Carries the state that gave up and the last violation list seen.
    #[error("rectification failed during {state} with {} violation(s)", violations.len())]
    RectificationFailed {
        state: RectifierState,
        violations: Vec<Violation>,
    },

    /// The valence table has no entry for this element.
    #[error("unsupported element {element} on atom {atom}: no valence rule")]
    UnsupportedElement { atom: AtomId, element: Element },

    /// An external collaborator raised or returned malformed output.
    #[error("external tool '{tool}' failed: {detail}")]
    ExternalToolFailure { tool: String, detail: String },

    /// A graph edit would break a structural invariant.
    #[error("invalid graph operation: {0}")]
    InvalidGraph(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// Creates a [`MalformedCorrespondence`](Error::MalformedCorrespondence) error.
    pub fn malformed_correspondence(
        fragment: usize,
        atom: AtomId,
        detail: impl Into<String>,
    ) -> Self {
        Self::MalformedCorrespondence {
            fragment,
            atom,
            detail: detail.into(),
        }
    }

    pub fn invalid_graph(detail: impl Into<String>) -> Self {
        Self::InvalidGraph(detail.into())
    }

    pub fn external(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ExternalToolFailure {
            tool: tool.into(),
            detail: detail.into(),
        }
    }

    /// The violations attached to a failed rectification, if any.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Error::RectificationFailed { violations, .. } => violations,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_correspondence_message_names_the_atom() {
        let err = Error::malformed_correspondence(1, AtomId(99), "atom not found");
        assert_eq!(
            err.to_string(),
            "malformed correspondence for fragment 1, atom #99: atom not found"
        );
        assert!(err.violations().is_empty());
    }

    #[test]
    fn toml_errors_become_config_errors() {
        let parsed: Result<toml::Value, _> = toml::from_str("not = [valid");
        let err: Error = parsed.unwrap_err().into();
        assert!(matches!(err, Error::Config(_)));
    }
}
