//! The `circumstances` field convention.
//!
//! Format: `"Team: {team} | Meca: {tags joined by ", "} | {narrative}"`.
//! Any of the three segments may be empty, but the separators are always
//! emitted so parsing can rely on splitting on `" | "` and on the key
//! prefixes.

use crate::{split_tags, DecodeWarning, Decoded};

const TEAM_PREFIX: &str = "Team:";
const MECHANISM_PREFIX: &str = "Meca:";
const SEGMENT_SEPARATOR: &str = " | ";

/// Structured facts carried by the `circumstances` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircumstancesFacts {
    /// Responding team designation, for example "Team A".
    pub team: String,

    /// Mechanism-of-injury tags, for example "Fall", "Heat exhaustion".
    pub mechanisms: Vec<String>,

    /// Free narrative describing the circumstances.
    pub narrative: String,
}

/// Renders facts into the legacy `circumstances` text. Total, never fails.
pub fn render(facts: &CircumstancesFacts) -> String {
    format!(
        "{} {}{}{} {}{}{}",
        TEAM_PREFIX,
        facts.team,
        SEGMENT_SEPARATOR,
        MECHANISM_PREFIX,
        facts.mechanisms.join(", "),
        SEGMENT_SEPARATOR,
        facts.narrative
    )
}

/// Parses legacy `circumstances` text, best-effort.
///
/// Text that does not follow the convention at all decodes as pure narrative
/// so hand-written legacy records survive a round through the parser.
pub fn parse(text: &str) -> Decoded<CircumstancesFacts> {
    let mut warnings = Vec::new();

    if text.is_empty() {
        return Decoded {
            value: CircumstancesFacts::default(),
            warnings,
        };
    }

    if !text.starts_with(TEAM_PREFIX) {
        warnings.push(DecodeWarning::MissingTeamPrefix);
        return Decoded {
            value: CircumstancesFacts {
                team: String::new(),
                mechanisms: Vec::new(),
                narrative: text.to_string(),
            },
            warnings,
        };
    }

    let mut segments = text.splitn(3, SEGMENT_SEPARATOR);

    // First segment is guaranteed by the starts_with check above.
    let team = segments
        .next()
        .and_then(|s| s.strip_prefix(TEAM_PREFIX))
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let mechanisms = match segments.next().and_then(|s| s.strip_prefix(MECHANISM_PREFIX)) {
        Some(inner) => split_tags(inner),
        None => {
            warnings.push(DecodeWarning::MissingMechanismSegment);
            Vec::new()
        }
    };

    let narrative = match segments.next() {
        Some(rest) => rest.to_string(),
        None => {
            warnings.push(DecodeWarning::MissingNarrativeSegment);
            String::new()
        }
    };

    Decoded {
        value: CircumstancesFacts {
            team,
            mechanisms,
            narrative,
        },
        warnings,
    }
}
