//! Legacy free-text boundary support.
//!
//! This crate is responsible for translating between the structured intake
//! facts used by `pma-core` and the two free-text fields of the generic
//! patient record (`circumstances` and `observations`), which carry encoded
//! facts under a fixed textual convention inherited from the legacy system.
//!
//! Clinical meaning lives in `pma-core`. This crate handles the text format
//! only: rendering is total and deterministic, parsing is best-effort and
//! never fails — a malformed segment decodes to an empty value and surfaces
//! as a [`DecodeWarning`].

pub mod circumstances;
pub mod observations;

pub use circumstances::CircumstancesFacts;
pub use observations::{Decision, DecisionFacts, ObservationsFacts};

use thiserror::Error;

/// Non-fatal diagnostics produced while parsing legacy free text.
///
/// Warnings never abort a parse. The affected segment decodes to an empty
/// value and the rest of the text is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeWarning {
    #[error("text does not start with 'Team:'; treated as plain narrative")]
    MissingTeamPrefix,

    #[error("missing 'Meca:' segment; mechanism tags decoded as empty")]
    MissingMechanismSegment,

    #[error("missing narrative segment")]
    MissingNarrativeSegment,

    #[error("unterminated '[{0}:' block; left in narrative")]
    UnterminatedBlock(&'static str),

    #[error("unknown decision token: '{0}'")]
    UnknownDecision(String),
}

/// Result of a best-effort parse: the decoded value plus any warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub warnings: Vec<DecodeWarning>,
}

/// Splits a rendered tag list back into individual trimmed tags.
pub(crate) fn split_tags(inner: &str) -> Vec<String> {
    inner
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}
