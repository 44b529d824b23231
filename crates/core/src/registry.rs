//! Triage registry: the roster of patients admitted to the post.
//!
//! Every public operation computes the new roster value, persists it, and
//! only then swaps it in — a failed store write leaves the in-memory roster
//! untouched, so the registry never diverges from what the caller saw
//! persisted. Validation failures are local and recoverable; store errors
//! propagate unmodified, no retry is performed here.

use crate::constants::ROSTER_KEY;
use crate::patient::{
    DispositionDecision, DispositionEvent, DispositionKind, Identity, InjuryMarker, PatientRecord,
    TriageStatus, VitalSigns,
};
use crate::record_id::RecordId;
use crate::store::{load_versioned, save_versioned, Store};
use crate::{PostError, PostResult};
use chrono::{DateTime, Utc};
use legacy_record::DecodeWarning;
use pma_types::{ActorName, BibNumber, GlasgowComa};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Minimal facts required for a quick admission.
///
/// At minimum a bib number or a sector must be present, so the record can be
/// found again; everything else may be filled in later.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionFacts {
    pub bib_number: Option<BibNumber>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: crate::patient::Sex,
    pub age_years: Option<u8>,
    pub sector: Option<String>,
    pub motive: String,
    /// Defaults to [`TriageStatus::Minor`] when absent.
    pub triage_status: Option<TriageStatus>,
}

/// The full multi-section intake: identity, context, assessment, care and
/// disposition.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredIntake {
    pub admission: AdmissionFacts,

    // Context.
    pub team: Option<String>,
    pub mechanisms: Vec<String>,
    pub circumstances_note: String,

    // Assessment.
    pub vitals: VitalSigns,
    pub glasgow: Option<GlasgowComa>,
    pub primary_survey: Option<String>,
    pub injuries: Vec<InjuryMarker>,

    // Care.
    pub care_acts: Vec<String>,
    pub observations_note: String,

    // Disposition, when already decided at intake.
    pub decision: Option<DispositionDecision>,
}

/// The roster of patients admitted to the post.
pub struct TriageRegistry<S> {
    store: S,
    actor: ActorName,
    roster: Vec<PatientRecord>,
    version: u64,
}

impl<S: Store> TriageRegistry<S> {
    /// Opens the registry, loading the persisted roster (empty at first use).
    pub fn open(store: S, actor: ActorName) -> PostResult<Self> {
        let (roster, version) = match load_versioned(&store, ROSTER_KEY)? {
            Some(envelope) => (envelope.data, envelope.version),
            None => (Vec::new(), 0),
        };

        Ok(Self {
            store,
            actor,
            roster,
            version,
        })
    }

    /// Admits a patient with the minimal quick-intake facts.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Validation`] when neither a bib number nor a
    /// sector is present.
    pub fn admit(&mut self, facts: AdmissionFacts) -> PostResult<PatientRecord> {
        let record = new_record(facts, Utc::now())?;
        self.commit_admission(record)
    }

    /// Admits a patient through the full multi-section intake.
    ///
    /// A disposition decision taken at intake is recorded both as the current
    /// disposition and as the first entry of the disposition log.
    pub fn admit_structured(&mut self, intake: StructuredIntake) -> PostResult<PatientRecord> {
        let mut record = new_record(intake.admission, Utc::now())?;

        record.team = intake.team;
        record.mechanisms = intake.mechanisms;
        record.circumstances_note = intake.circumstances_note;
        record.vitals = intake.vitals;
        record.glasgow = intake.glasgow;
        record.primary_survey = intake.primary_survey;
        record.injuries = intake.injuries;
        record.care_acts = intake.care_acts;
        record.observations_note = intake.observations_note;

        if let Some(decision) = intake.decision {
            record.disposition_log.push(DispositionEvent {
                at: record.admitted_at,
                actor: self.actor.clone(),
                kind: decision.kind,
                destination: decision.destination.clone(),
            });
            record.disposition = Some(decision);
        }

        self.commit_admission(record)
    }

    /// Admits a patient from a legacy record whose `circumstances` and
    /// `observations` free-text fields carry encoded facts.
    ///
    /// Decoding is best-effort: malformed segments decode as empty, warnings
    /// are logged and returned, and nothing fails.
    pub fn admit_legacy(
        &mut self,
        facts: AdmissionFacts,
        circumstances: &str,
        observations: &str,
    ) -> PostResult<(PatientRecord, Vec<DecodeWarning>)> {
        let mut record = new_record(facts, Utc::now())?;

        let mut warnings = record.apply_legacy_circumstances(circumstances);
        warnings.extend(record.apply_legacy_observations(observations));
        for warning in &warnings {
            tracing::warn!(record = %record.id, "legacy decode: {warning}");
        }

        let record = self.commit_admission(record)?;
        Ok((record, warnings))
    }

    /// Overwrites a patient's triage status.
    ///
    /// Any status is reachable from any other — rapid re-assessment in the
    /// field must never be blocked by a transition rule.
    pub fn re_triage(&mut self, id: &RecordId, new_status: TriageStatus) -> PostResult<()> {
        let mut roster = self.roster.clone();
        find_record(&mut roster, id)?.triage_status = new_status;
        self.commit(roster)
    }

    /// Records a disposition for a patient: returned to activity or
    /// evacuated.
    ///
    /// Appends a timestamped, actor-stamped entry to the disposition log and
    /// sets the current disposition. The record stays on the roster and its
    /// triage status is unchanged.
    pub fn discharge(
        &mut self,
        id: &RecordId,
        kind: DispositionKind,
        destination: Option<String>,
    ) -> PostResult<()> {
        let mut roster = self.roster.clone();
        let record = find_record(&mut roster, id)?;

        record.disposition_log.push(DispositionEvent {
            at: Utc::now(),
            actor: self.actor.clone(),
            kind,
            destination: destination.clone(),
        });
        record.disposition = Some(DispositionDecision { kind, destination });

        self.commit(roster)
    }

    /// Hard-deletes a record. Irreversible.
    pub fn remove(&mut self, id: &RecordId) -> PostResult<()> {
        let mut roster = self.roster.clone();
        let before = roster.len();
        roster.retain(|r| r.id != *id);
        if roster.len() == before {
            return Err(PostError::UnknownRecord(id.to_string()));
        }
        self.commit(roster)
    }

    /// Looks up a record by id.
    pub fn get(&self, id: &RecordId) -> Option<&PatientRecord> {
        self.roster.iter().find(|r| r.id == *id)
    }

    /// The roster in urgency order, optionally filtered.
    ///
    /// `search` is a case-insensitive substring match against name, bib
    /// number and motive; `status` is an exact filter. Ordering is severity
    /// rank ascending (most urgent first), then admission time descending
    /// within a rank (most recently admitted first).
    pub fn list(
        &self,
        search: Option<&str>,
        status: Option<TriageStatus>,
    ) -> Vec<&PatientRecord> {
        let needle = search.map(str::trim).filter(|s| !s.is_empty());

        let mut matches: Vec<&PatientRecord> = self
            .roster
            .iter()
            .filter(|r| needle.map_or(true, |n| r.matches_search(n)))
            .filter(|r| status.map_or(true, |s| r.triage_status == s))
            .collect();

        matches.sort_by_key(|r| (r.triage_status.severity_rank(), Reverse(r.admitted_at)));
        matches
    }

    /// The full roster in storage order.
    pub fn roster(&self) -> &[PatientRecord] {
        &self.roster
    }

    fn commit_admission(&mut self, record: PatientRecord) -> PostResult<PatientRecord> {
        let mut roster = self.roster.clone();
        roster.push(record.clone());
        self.commit(roster)?;
        Ok(record)
    }

    /// Persists the new roster value, then swaps it in.
    fn commit(&mut self, roster: Vec<PatientRecord>) -> PostResult<()> {
        let version = save_versioned(&self.store, ROSTER_KEY, &roster, self.version)?;
        self.roster = roster;
        self.version = version;
        Ok(())
    }
}

/// Builds a new record from admission facts. Pure: timestamp is injected.
fn new_record(facts: AdmissionFacts, admitted_at: DateTime<Utc>) -> PostResult<PatientRecord> {
    let sector = facts
        .sector
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    if facts.bib_number.is_none() && sector.is_none() {
        return Err(PostError::Validation(
            "a bib number or a sector is required to admit a patient".into(),
        ));
    }

    Ok(PatientRecord {
        id: RecordId::new(),
        bib_number: facts.bib_number,
        admitted_at,
        triage_status: facts.triage_status.unwrap_or(TriageStatus::Minor),
        identity: Identity {
            first_name: facts.first_name,
            last_name: facts.last_name,
            sex: facts.sex,
            age_years: facts.age_years,
            sector,
        },
        motive: facts.motive,
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
    })
}

fn find_record<'a>(
    roster: &'a mut [PatientRecord],
    id: &RecordId,
) -> PostResult<&'a mut PatientRecord> {
    roster
        .iter_mut()
        .find(|r| r.id == *id)
        .ok_or_else(|| PostError::UnknownRecord(id.to_string()))
}
