//! Handover report builder.
//!
//! Produces a chronological snapshot of the roster for an external renderer.
//! Unlike the operational roster view, rows are ordered by admission time
//! ascending — a handover log is read as a timeline. The builder selects and
//! shapes data only; truncation, layout, pagination and file formats are the
//! renderer's responsibility.

use crate::patient::{DispositionKind, PatientRecord, TriageStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One patient row of the handover report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportRow {
    /// Admission time.
    pub time: DateTime<Utc>,
    pub bib: Option<String>,
    pub name: String,
    pub age_years: Option<u8>,
    pub motive: String,
    /// Care acts performed, joined for display.
    pub care_summary: String,
    pub triage_status: TriageStatus,
    /// Current disposition, empty when the patient is still at the post.
    pub disposition_summary: String,
}

/// Roster totals per triage status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub critical: usize,
    pub delayed: usize,
    pub minor: usize,
    pub deceased: usize,
    pub untriaged: usize,
}

impl StatusCounts {
    fn tally(&mut self, status: TriageStatus) {
        match status {
            TriageStatus::Critical => self.critical += 1,
            TriageStatus::Delayed => self.delayed += 1,
            TriageStatus::Minor => self.minor += 1,
            TriageStatus::Deceased => self.deceased += 1,
            TriageStatus::Untriaged => self.untriaged += 1,
        }
    }
}

/// Report footer totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ReportFooter {
    pub total: usize,
    pub counts_by_status: StatusCounts,
    pub evacuation_count: usize,
}

/// A complete handover report, ready for an external renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportDocument {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub footer: ReportFooter,
}

/// Builds handover reports from a roster snapshot.
pub struct HandoverReportBuilder;

impl HandoverReportBuilder {
    /// Builds the report: rows in admission order plus footer totals.
    pub fn build(roster: &[PatientRecord], generated_at: DateTime<Utc>) -> ReportDocument {
        let mut ordered: Vec<&PatientRecord> = roster.iter().collect();
        ordered.sort_by_key(|record| record.admitted_at);

        let mut counts = StatusCounts::default();
        let mut evacuation_count = 0;

        let rows = ordered
            .iter()
            .map(|record| {
                counts.tally(record.triage_status);
                if matches!(
                    record.disposition.as_ref().map(|d| d.kind),
                    Some(DispositionKind::Evacuated)
                ) {
                    evacuation_count += 1;
                }

                ReportRow {
                    time: record.admitted_at,
                    bib: record.bib_number.as_ref().map(|b| b.as_str().to_owned()),
                    name: record.display_name(),
                    age_years: record.identity.age_years,
                    motive: record.motive.clone(),
                    care_summary: record.care_acts.join(", "),
                    triage_status: record.triage_status,
                    disposition_summary: disposition_summary(record),
                }
            })
            .collect();

        ReportDocument {
            generated_at,
            rows,
            footer: ReportFooter {
                total: roster.len(),
                counts_by_status: counts,
                evacuation_count,
            },
        }
    }
}

fn disposition_summary(record: &PatientRecord) -> String {
    match &record.disposition {
        None => String::new(),
        Some(decision) => match &decision.destination {
            Some(destination) => format!("{} to {}", decision.kind, destination),
            None => decision.kind.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{DispositionDecision, Identity, VitalSigns};
    use crate::record_id::RecordId;
    use chrono::Duration;
    use pma_types::BibNumber;

    fn record(bib: &str, status: TriageStatus, admitted_at: DateTime<Utc>) -> PatientRecord {
        PatientRecord {
            id: RecordId::new(),
            bib_number: Some(BibNumber::new(bib).expect("bib")),
            admitted_at,
            triage_status: status,
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
    fn rows_are_chronological_even_when_roster_is_not() {
        let base = Utc::now();
        let roster = vec![
            record("late", TriageStatus::Critical, base + Duration::minutes(30)),
            record("early", TriageStatus::Minor, base),
            record("middle", TriageStatus::Delayed, base + Duration::minutes(10)),
        ];

        let report = HandoverReportBuilder::build(&roster, base + Duration::hours(1));
        let bibs: Vec<Option<&str>> = report.rows.iter().map(|r| r.bib.as_deref()).collect();
        assert_eq!(bibs, vec![Some("early"), Some("middle"), Some("late")]);
    }

    #[test]
    fn footer_counts_statuses_and_evacuations() {
        let base = Utc::now();
        let mut evacuated = record("1", TriageStatus::Critical, base);
        evacuated.disposition = Some(DispositionDecision {
            kind: DispositionKind::Evacuated,
            destination: Some("CH Sud".to_string()),
        });
        let mut returned = record("2", TriageStatus::Minor, base + Duration::minutes(1));
        returned.disposition = Some(DispositionDecision {
            kind: DispositionKind::ReturnedToActivity,
            destination: None,
        });
        let still_present = record("3", TriageStatus::Minor, base + Duration::minutes(2));

        let report =
            HandoverReportBuilder::build(&[evacuated, returned, still_present], Utc::now());

        assert_eq!(report.footer.total, 3);
        assert_eq!(report.footer.counts_by_status.critical, 1);
        assert_eq!(report.footer.counts_by_status.minor, 2);
        assert_eq!(report.footer.counts_by_status.deceased, 0);
        assert_eq!(report.footer.evacuation_count, 1);

        assert_eq!(report.rows[0].disposition_summary, "Evacuated to CH Sud");
        assert_eq!(report.rows[1].disposition_summary, "Returned to activity");
        assert_eq!(report.rows[2].disposition_summary, "");
    }

    #[test]
    fn rows_carry_data_unshortened() {
        let base = Utc::now();
        let mut long = record("4", TriageStatus::Minor, base);
        long.motive = "a".repeat(500);
        long.care_acts = vec!["Dressing".to_string(), "Splinting".to_string()];

        let report = HandoverReportBuilder::build(&[long], Utc::now());
        assert_eq!(report.rows[0].motive.len(), 500);
        assert_eq!(report.rows[0].care_summary, "Dressing, Splinting");
    }
}
