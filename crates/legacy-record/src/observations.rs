//! The `observations` field convention.
//!
//! Format: an optional leading `"[Soins: {care acts}]"` block, free narrative
//! text, then an optional `"[Décision: {decision}]"` block with an optional
//! `" via {destination}"` suffix. Rendering strips any previously emitted
//! blocks from the narrative before re-inserting the current ones, so
//! encoding is idempotent and never duplicates tag blocks.

use crate::{split_tags, DecodeWarning, Decoded};

const CARE_PREFIX: &str = "[Soins:";
const DECISION_PREFIX: &str = "[Décision:";
const DESTINATION_SEPARATOR: &str = " via ";

/// Disposition decision recorded in the legacy text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The patient was returned to the activity.
    ReturnedToActivity,
    /// The patient was evacuated to a care facility.
    Evacuated,
}

impl Decision {
    /// Convert to the legacy wire token.
    pub fn to_wire(self) -> &'static str {
        match self {
            Decision::ReturnedToActivity => "Retour activité",
            Decision::Evacuated => "Évacuation",
        }
    }

    /// Parse from the legacy wire token.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Retour activité" => Some(Decision::ReturnedToActivity),
            "Évacuation" => Some(Decision::Evacuated),
            _ => None,
        }
    }
}

/// A decision plus its optional destination ("via" suffix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionFacts {
    pub decision: Decision,

    /// Evacuation destination, for example a hospital name.
    pub destination: Option<String>,
}

/// Structured facts carried by the `observations` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationsFacts {
    /// Care acts performed at the post.
    pub care_acts: Vec<String>,

    /// Free narrative observations.
    pub narrative: String,

    /// Disposition decision, if one has been taken.
    pub decision: Option<DecisionFacts>,
}

/// Renders facts into the legacy `observations` text. Total, never fails.
///
/// An empty care-act list or absent decision produces no tag block. Any tag
/// blocks already present in the narrative are stripped first, so calling
/// `render` on re-encoded text yields exactly one block of each kind.
pub fn render(facts: &ObservationsFacts) -> String {
    let narrative = strip_blocks(&facts.narrative);

    let mut parts: Vec<String> = Vec::new();

    if !facts.care_acts.is_empty() {
        parts.push(format!("{} {}]", CARE_PREFIX, facts.care_acts.join(", ")));
    }

    if !narrative.is_empty() {
        parts.push(narrative);
    }

    if let Some(decision) = &facts.decision {
        let mut block = format!("{} {}", DECISION_PREFIX, decision.decision.to_wire());
        if let Some(destination) = &decision.destination {
            block.push_str(DESTINATION_SEPARATOR);
            block.push_str(destination);
        }
        block.push(']');
        parts.push(block);
    }

    parts.join(" ")
}

/// Removes any `[Soins: ...]` and `[Décision: ...]` blocks from a narrative.
///
/// Unterminated blocks are left untouched. The result is trimmed.
pub fn strip_blocks(narrative: &str) -> String {
    let mut out = narrative.to_string();
    for prefix in [CARE_PREFIX, DECISION_PREFIX] {
        while let Some(start) = out.find(prefix) {
            match out[start..].find(']') {
                Some(offset) => out.replace_range(start..start + offset + 1, ""),
                None => break,
            }
        }
    }
    out.trim().to_string()
}

/// Parses legacy `observations` text, best-effort.
pub fn parse(text: &str) -> Decoded<ObservationsFacts> {
    let mut warnings = Vec::new();
    let mut rest = text.trim();

    let mut care_acts = Vec::new();
    if let Some(after) = rest.strip_prefix(CARE_PREFIX) {
        match after.find(']') {
            Some(end) => {
                care_acts = split_tags(&after[..end]);
                rest = after[end + 1..].trim_start();
            }
            None => warnings.push(DecodeWarning::UnterminatedBlock("Soins")),
        }
    }

    let mut decision = None;
    let narrative = match rest.rfind(DECISION_PREFIX) {
        Some(start) => {
            let block = &rest[start..];
            match block.find(']') {
                Some(end) => {
                    let inner = block[DECISION_PREFIX.len()..end].trim();
                    let (token, destination) = match inner.split_once(DESTINATION_SEPARATOR) {
                        Some((token, dest)) => {
                            let dest = dest.trim();
                            (
                                token.trim(),
                                (!dest.is_empty()).then(|| dest.to_string()),
                            )
                        }
                        None => (inner, None),
                    };

                    match Decision::from_wire(token) {
                        Some(parsed) => {
                            decision = Some(DecisionFacts {
                                decision: parsed,
                                destination,
                            });
                        }
                        None => warnings.push(DecodeWarning::UnknownDecision(token.to_string())),
                    }

                    // Narrative is whatever surrounds the block.
                    let left = rest[..start].trim_end();
                    let right = block[end + 1..].trim_start();
                    if right.is_empty() {
                        left.to_string()
                    } else if left.is_empty() {
                        right.to_string()
                    } else {
                        format!("{left} {right}")
                    }
                }
                None => {
                    warnings.push(DecodeWarning::UnterminatedBlock("Décision"));
                    rest.to_string()
                }
            }
        }
        None => rest.to_string(),
    };

    Decoded {
        value: ObservationsFacts {
            care_acts,
            narrative,
            decision,
        },
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ObservationsFacts {
        ObservationsFacts {
            care_acts: vec!["Cooling".to_string(), "Oral rehydration".to_string()],
            narrative: "steady improvement over 20 min".to_string(),
            decision: Some(DecisionFacts {
                decision: Decision::Evacuated,
                destination: Some("CH Sud".to_string()),
            }),
        }
    }

    #[test]
    fn renders_blocks_around_narrative() {
        assert_eq!(
            render(&sample()),
            "[Soins: Cooling, Oral rehydration] steady improvement over 20 min \
             [Décision: Évacuation via CH Sud]"
        );
    }

    #[test]
    fn renders_no_blocks_for_empty_facts() {
        let facts = ObservationsFacts {
            care_acts: Vec::new(),
            narrative: "nothing remarkable".to_string(),
            decision: None,
        };
        assert_eq!(render(&facts), "nothing remarkable");
    }

    #[test]
    fn round_trips_delimiter_free_facts() {
        let decoded = parse(&render(&sample()));
        assert_eq!(decoded.value, sample());
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn round_trips_decision_without_destination() {
        let facts = ObservationsFacts {
            care_acts: Vec::new(),
            narrative: String::new(),
            decision: Some(DecisionFacts {
                decision: Decision::ReturnedToActivity,
                destination: None,
            }),
        };
        let decoded = parse(&render(&facts));
        assert_eq!(decoded.value, facts);
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn re_encoding_does_not_duplicate_blocks() {
        let first = render(&sample());

        // Simulate an editor that feeds the whole stored text back in as the
        // narrative, with updated care acts and decision.
        let updated = ObservationsFacts {
            care_acts: vec!["Splinting".to_string()],
            narrative: first,
            decision: Some(DecisionFacts {
                decision: Decision::ReturnedToActivity,
                destination: None,
            }),
        };
        let second = render(&updated);

        assert_eq!(second.matches("[Soins:").count(), 1);
        assert_eq!(second.matches("[Décision:").count(), 1);
        assert_eq!(
            second,
            "[Soins: Splinting] steady improvement over 20 min [Décision: Retour activité]"
        );
    }

    #[test]
    fn unknown_decision_token_decodes_as_no_decision() {
        let decoded = parse("observations [Décision: Transfert]");
        assert!(decoded.value.decision.is_none());
        assert_eq!(decoded.value.narrative, "observations");
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::UnknownDecision("Transfert".to_string())]
        );
    }

    #[test]
    fn unterminated_care_block_stays_in_narrative() {
        let decoded = parse("[Soins: Cooling");
        assert!(decoded.value.care_acts.is_empty());
        assert_eq!(decoded.value.narrative, "[Soins: Cooling");
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::UnterminatedBlock("Soins")]
        );
    }

    #[test]
    fn empty_text_decodes_silently() {
        let decoded = parse("");
        assert_eq!(decoded.value, ObservationsFacts::default());
        assert!(decoded.warnings.is_empty());
    }
}
