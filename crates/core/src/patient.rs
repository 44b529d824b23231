//! Patient record domain model.
//!
//! Structured intake facts are first-class fields here. The legacy free-text
//! `circumstances`/`observations` values are derived: [`PatientRecord`]
//! renders them on demand for backward-compatible display and parses them on
//! legacy import, but they are never the source of truth.

use crate::record_id::RecordId;
use chrono::{DateTime, Utc};
use legacy_record::{circumstances, observations};
use legacy_record::{CircumstancesFacts, Decision, DecisionFacts, DecodeWarning, ObservationsFacts};
use pma_types::{ActorName, BibNumber, GlasgowComa};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Triage severity category assigned at the post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageStatus {
    /// UA — absolute urgency, immediate care.
    Critical,
    /// UR — relative urgency, care can be delayed.
    Delayed,
    /// UIMP — impaired but minor.
    Minor,
    /// DCD — deceased.
    Deceased,
    /// Not yet assessed.
    Untriaged,
}

impl TriageStatus {
    /// Fixed severity rank used for roster ordering: lower is more urgent.
    pub fn severity_rank(self) -> u8 {
        match self {
            TriageStatus::Critical => 0,
            TriageStatus::Delayed => 1,
            TriageStatus::Minor => 2,
            TriageStatus::Deceased => 3,
            TriageStatus::Untriaged => 4,
        }
    }

    /// Short field code used on tags and printed rosters.
    pub fn code(self) -> &'static str {
        match self {
            TriageStatus::Critical => "UA",
            TriageStatus::Delayed => "UR",
            TriageStatus::Minor => "UIMP",
            TriageStatus::Deceased => "DCD",
            TriageStatus::Untriaged => "-",
        }
    }
}

impl fmt::Display for TriageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriageStatus::Critical => "Critical",
            TriageStatus::Delayed => "Delayed",
            TriageStatus::Minor => "Minor",
            TriageStatus::Deceased => "Deceased",
            TriageStatus::Untriaged => "Untriaged",
        };
        write!(f, "{name}")
    }
}

impl FromStr for TriageStatus {
    type Err = crate::PostError;

    /// Accepts the status name or the field code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" | "ua" => Ok(TriageStatus::Critical),
            "delayed" | "ur" => Ok(TriageStatus::Delayed),
            "minor" | "uimp" => Ok(TriageStatus::Minor),
            "deceased" | "dcd" => Ok(TriageStatus::Deceased),
            "untriaged" => Ok(TriageStatus::Untriaged),
            other => Err(crate::PostError::Validation(format!(
                "unknown triage status: '{other}'"
            ))),
        }
    }
}

/// Patient sex as recorded at intake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
    #[default]
    Unknown,
}

/// Identity section. Name parts may be unknown at a mass-casualty post.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Sex,
    /// Approximate age in years.
    pub age_years: Option<u8>,
    /// Sector or sub-location where the patient was picked up.
    pub sector: Option<String>,
}

/// Vital signs. All fields optional; plausibility checks belong to the
/// surrounding record editor, not this core.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub systolic_mmhg: Option<u16>,
    pub diastolic_mmhg: Option<u16>,
    pub heart_rate_bpm: Option<u16>,
    pub respiratory_rate: Option<u16>,
    pub oxygen_saturation_percent: Option<u8>,
    pub temperature_celsius: Option<f32>,
}

impl VitalSigns {
    /// Mean arterial pressure, derived for display only.
    ///
    /// Computed as `(systolic + 2 * diastolic) / 3`; `None` unless both
    /// pressures are recorded.
    pub fn mean_arterial_pressure(&self) -> Option<u16> {
        match (self.systolic_mmhg, self.diastolic_mmhg) {
            (Some(sys), Some(dia)) => Some(((u32::from(sys) + 2 * u32::from(dia)) / 3) as u16),
            _ => None,
        }
    }
}

/// Which side of the body diagram an injury marker sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodySide {
    Front,
    Back,
}

/// Category of an injury marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjuryCategory {
    Wound,
    Burn,
    Fracture,
    Pain,
    Other,
}

/// A marker placed on the body diagram during the primary survey.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InjuryMarker {
    /// Horizontal position on the diagram, in [0, 1].
    pub x: f64,
    /// Vertical position on the diagram, in [0, 1].
    pub y: f64,
    pub side: BodySide,
    pub category: InjuryCategory,
    pub description: String,
}

/// Outcome of a patient's stay at the post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispositionKind {
    ReturnedToActivity,
    Evacuated,
}

impl DispositionKind {
    pub(crate) fn to_legacy(self) -> Decision {
        match self {
            DispositionKind::ReturnedToActivity => Decision::ReturnedToActivity,
            DispositionKind::Evacuated => Decision::Evacuated,
        }
    }

    pub(crate) fn from_legacy(decision: Decision) -> Self {
        match decision {
            Decision::ReturnedToActivity => DispositionKind::ReturnedToActivity,
            Decision::Evacuated => DispositionKind::Evacuated,
        }
    }
}

impl fmt::Display for DispositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispositionKind::ReturnedToActivity => "Returned to activity",
            DispositionKind::Evacuated => "Evacuated",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DispositionKind {
    type Err = crate::PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "returned" | "returned-to-activity" | "rta" => Ok(DispositionKind::ReturnedToActivity),
            "evacuated" | "evacuation" | "evac" => Ok(DispositionKind::Evacuated),
            other => Err(crate::PostError::Validation(format!(
                "unknown disposition: '{other}'"
            ))),
        }
    }
}

/// The current disposition decision for a patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionDecision {
    pub kind: DispositionKind,
    /// Evacuation destination, for example a hospital name.
    pub destination: Option<String>,
}

/// One entry in the append-only disposition log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionEvent {
    pub at: DateTime<Utc>,
    pub actor: ActorName,
    pub kind: DispositionKind,
    pub destination: Option<String>,
}

/// A patient admitted to the post.
///
/// `admitted_at` is set once at creation and never mutated. `triage_status`
/// is a direct overwrite on re-triage. `disposition_log` entries are
/// append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: RecordId,
    pub bib_number: Option<BibNumber>,
    pub admitted_at: DateTime<Utc>,
    pub triage_status: TriageStatus,
    pub identity: Identity,
    /// Presenting complaint, searched by the roster view.
    pub motive: String,

    // Assessment section.
    pub vitals: VitalSigns,
    pub glasgow: Option<GlasgowComa>,
    pub primary_survey: Option<String>,
    pub injuries: Vec<InjuryMarker>,

    // Context section (legacy `circumstances` facts).
    pub team: Option<String>,
    pub mechanisms: Vec<String>,
    pub circumstances_note: String,

    // Care section (legacy `observations` facts).
    pub care_acts: Vec<String>,
    pub observations_note: String,

    pub disposition: Option<DispositionDecision>,
    pub disposition_log: Vec<DispositionEvent>,
}

impl PatientRecord {
    /// Operator-facing name, falling back to a placeholder when unknown.
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(first) = &self.identity.first_name {
            parts.push(first.as_str());
        }
        if let Some(last) = &self.identity.last_name {
            parts.push(last.as_str());
        }
        if parts.is_empty() {
            "Unknown".to_string()
        } else {
            parts.join(" ")
        }
    }

    /// Case-insensitive substring match against name, bib number and motive.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if self.display_name().to_lowercase().contains(&needle) {
            return true;
        }
        if let Some(bib) = &self.bib_number {
            if bib.as_str().to_lowercase().contains(&needle) {
                return true;
            }
        }
        self.motive.to_lowercase().contains(&needle)
    }

    /// Renders the legacy `circumstances` field from the structured facts.
    pub fn legacy_circumstances(&self) -> String {
        circumstances::render(&CircumstancesFacts {
            team: self.team.clone().unwrap_or_default(),
            mechanisms: self.mechanisms.clone(),
            narrative: self.circumstances_note.clone(),
        })
    }

    /// Renders the legacy `observations` field from the structured facts.
    pub fn legacy_observations(&self) -> String {
        observations::render(&ObservationsFacts {
            care_acts: self.care_acts.clone(),
            narrative: self.observations_note.clone(),
            decision: self.disposition.as_ref().map(|d| DecisionFacts {
                decision: d.kind.to_legacy(),
                destination: d.destination.clone(),
            }),
        })
    }

    /// Imports a legacy `circumstances` value, best-effort.
    ///
    /// Malformed segments decode as empty and are reported as warnings; the
    /// rest of the record is unaffected.
    pub fn apply_legacy_circumstances(&mut self, text: &str) -> Vec<DecodeWarning> {
        let decoded = circumstances::parse(text);
        let facts = decoded.value;
        self.team = (!facts.team.is_empty()).then_some(facts.team);
        self.mechanisms = facts.mechanisms;
        self.circumstances_note = facts.narrative;
        decoded.warnings
    }

    /// Imports a legacy `observations` value, best-effort.
    ///
    /// A decoded decision sets `disposition` but appends nothing to the
    /// disposition log: the legacy text carries no actor or timestamp, so it
    /// reflects state rather than an action taken in this session.
    pub fn apply_legacy_observations(&mut self, text: &str) -> Vec<DecodeWarning> {
        let decoded = observations::parse(text);
        let facts = decoded.value;
        self.care_acts = facts.care_acts;
        self.observations_note = facts.narrative;
        self.disposition = facts.decision.map(|d| DispositionDecision {
            kind: DispositionKind::from_legacy(d.decision),
            destination: d.destination,
        });
        decoded.warnings
    }
}

/// Formats the time elapsed since admission for roster display.
///
/// Whole minutes: below one hour renders as `"{m} min"`, from one hour
/// upwards as `"{h}h {m}m"`.
pub fn elapsed_label(admitted_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - admitted_at).num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes} min")
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn blank_record() -> PatientRecord {
        PatientRecord {
            id: RecordId::new(),
            bib_number: None,
            admitted_at: Utc::now(),
            triage_status: TriageStatus::Minor,
            identity: Identity::default(),
            motive: String::new(),
            vitals: VitalSigns::default(),
            glasgow: None,
            primary_survey: None,
            injuries: Vec::new(),
            team: None,
            mechanisms: Vec::new(),
            circumstances_note: String::new(),
            care_acts: Vec::new(),
            observations_note: String::new(),
            disposition: None,
            disposition_log: Vec::new(),
        }
    }

    #[test]
    fn severity_ranks_are_fixed() {
        assert_eq!(TriageStatus::Critical.severity_rank(), 0);
        assert_eq!(TriageStatus::Delayed.severity_rank(), 1);
        assert_eq!(TriageStatus::Minor.severity_rank(), 2);
        assert_eq!(TriageStatus::Deceased.severity_rank(), 3);
        assert_eq!(TriageStatus::Untriaged.severity_rank(), 4);
    }

    #[test]
    fn triage_status_parses_names_and_codes() {
        assert_eq!(
            "critical".parse::<TriageStatus>().expect("name"),
            TriageStatus::Critical
        );
        assert_eq!(
            "UIMP".parse::<TriageStatus>().expect("code"),
            TriageStatus::Minor
        );
        assert!("severe".parse::<TriageStatus>().is_err());
    }

    #[test]
    fn elapsed_label_switches_format_at_one_hour() {
        let admitted = Utc::now();
        assert_eq!(elapsed_label(admitted, admitted), "0 min");
        assert_eq!(
            elapsed_label(admitted, admitted + Duration::minutes(59)),
            "59 min"
        );
        assert_eq!(
            elapsed_label(admitted, admitted + Duration::minutes(60)),
            "1h 0m"
        );
        assert_eq!(
            elapsed_label(admitted, admitted + Duration::minutes(135)),
            "2h 15m"
        );
    }

    #[test]
    fn elapsed_label_clamps_clock_skew_to_zero() {
        let admitted = Utc::now();
        assert_eq!(
            elapsed_label(admitted, admitted - Duration::minutes(5)),
            "0 min"
        );
    }

    #[test]
    fn mean_arterial_pressure_needs_both_pressures() {
        let mut vitals = VitalSigns::default();
        assert_eq!(vitals.mean_arterial_pressure(), None);

        vitals.systolic_mmhg = Some(120);
        vitals.diastolic_mmhg = Some(80);
        assert_eq!(vitals.mean_arterial_pressure(), Some(93));
    }

    #[test]
    fn display_name_falls_back_to_placeholder() {
        let mut record = blank_record();
        assert_eq!(record.display_name(), "Unknown");

        record.identity.first_name = Some("Sarah".to_string());
        record.identity.last_name = Some("Williams".to_string());
        assert_eq!(record.display_name(), "Sarah Williams");
    }

    #[test]
    fn search_matches_name_bib_and_motive() {
        let mut record = blank_record();
        record.identity.last_name = Some("Williams".to_string());
        record.bib_number = Some(BibNumber::new("1042").expect("bib"));
        record.motive = "Heat exhaustion".to_string();

        assert!(record.matches_search("willi"));
        assert!(record.matches_search("1042"));
        assert!(record.matches_search("HEAT"));
        assert!(!record.matches_search("fracture"));
    }

    #[test]
    fn legacy_fields_render_from_structured_facts() {
        let mut record = blank_record();
        record.team = Some("Team A".to_string());
        record.mechanisms = vec!["Fall".to_string()];
        record.circumstances_note = "tripped on kerb".to_string();
        record.care_acts = vec!["Splinting".to_string()];
        record.observations_note = "stable".to_string();
        record.disposition = Some(DispositionDecision {
            kind: DispositionKind::Evacuated,
            destination: Some("CH Sud".to_string()),
        });

        assert_eq!(
            record.legacy_circumstances(),
            "Team: Team A | Meca: Fall | tripped on kerb"
        );
        assert_eq!(
            record.legacy_observations(),
            "[Soins: Splinting] stable [Décision: Évacuation via CH Sud]"
        );
    }

    #[test]
    fn legacy_import_round_trips_through_render() {
        let mut source = blank_record();
        source.team = Some("Team B".to_string());
        source.mechanisms = vec!["Crush".to_string(), "Fall".to_string()];
        source.circumstances_note = "barrier collapse".to_string();
        source.care_acts = vec!["Dressing".to_string()];
        source.observations_note = "conscious throughout".to_string();
        source.disposition = Some(DispositionDecision {
            kind: DispositionKind::ReturnedToActivity,
            destination: None,
        });

        let mut imported = blank_record();
        let warnings_c = imported.apply_legacy_circumstances(&source.legacy_circumstances());
        let warnings_o = imported.apply_legacy_observations(&source.legacy_observations());

        assert!(warnings_c.is_empty());
        assert!(warnings_o.is_empty());
        assert_eq!(imported.team, source.team);
        assert_eq!(imported.mechanisms, source.mechanisms);
        assert_eq!(imported.circumstances_note, source.circumstances_note);
        assert_eq!(imported.care_acts, source.care_acts);
        assert_eq!(imported.observations_note, source.observations_note);
        assert_eq!(imported.disposition, source.disposition);
    }
}
