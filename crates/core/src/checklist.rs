//! Field-readiness checklist engine.
//!
//! Tracks which readiness items of a physical post (tents, medical supplies,
//! communications, power) have been confirmed, and keeps a bounded audit
//! trail of toggle actions so an after-action review can reconstruct who
//! confirmed what and when. Log entries are immutable and bounded rather
//! than summarised.
//!
//! State and log persist under separate store keys. Reset clears the checked
//! flags but not the log — the reset itself becomes a log entry.

use crate::catalog::ChecklistCatalog;
use crate::constants::{CHECKLIST_LOG_CAPACITY, CHECKLIST_LOG_KEY, CHECKLIST_STATE_KEY};
use crate::record_id::RecordId;
use crate::store::{load_versioned, save_versioned, Store};
use crate::{PostError, PostResult};
use chrono::{DateTime, Utc};
use pma_types::ActorName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Audited checklist action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecklistAction {
    Check,
    Uncheck,
    Reset,
}

/// One immutable entry in the checklist audit log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistLogEntry {
    pub id: RecordId,
    pub at: DateTime<Utc>,
    pub actor: ActorName,
    pub action: ChecklistAction,
    /// The toggled item label; absent for [`ChecklistAction::Reset`].
    pub item: Option<String>,
}

/// Description of what a reset would discard, for operator confirmation.
///
/// Returned by [`ReadinessChecklist::request_reset`], which is a pure query:
/// obtaining confirmation is the caller's concern, and only an explicit
/// [`ReadinessChecklist::reset`] mutates anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResetRequest {
    /// Items currently checked, in catalogue order.
    pub checked_items: Vec<String>,
    /// Global completion at the time of the request.
    pub completion_percent: u8,
}

/// The readiness checklist for one operational session/store.
pub struct ReadinessChecklist<S> {
    store: S,
    catalog: ChecklistCatalog,
    actor: ActorName,
    state: BTreeMap<String, bool>,
    state_version: u64,
    log: Vec<ChecklistLogEntry>,
    log_version: u64,
}

impl<S: Store> ReadinessChecklist<S> {
    /// Opens the checklist, loading persisted state and log (both empty at
    /// first use of a post/session).
    pub fn open(store: S, catalog: ChecklistCatalog, actor: ActorName) -> PostResult<Self> {
        let (state, state_version) = match load_versioned(&store, CHECKLIST_STATE_KEY)? {
            Some(envelope) => (envelope.data, envelope.version),
            None => (BTreeMap::new(), 0),
        };
        let (log, log_version) = match load_versioned(&store, CHECKLIST_LOG_KEY)? {
            Some(envelope) => (envelope.data, envelope.version),
            None => (Vec::new(), 0),
        };

        Ok(Self {
            store,
            catalog,
            actor,
            state,
            state_version,
            log,
            log_version,
        })
    }

    /// The catalogue this checklist records completion against.
    pub fn catalog(&self) -> &ChecklistCatalog {
        &self.catalog
    }

    /// Returns true if `item` is currently checked.
    pub fn is_checked(&self, item: &str) -> bool {
        self.state.get(item).copied().unwrap_or(false)
    }

    /// The audit log, newest first, at most 50 entries.
    pub fn log(&self) -> &[ChecklistLogEntry] {
        &self.log
    }

    /// Flips an item and appends a `Check`/`Uncheck` log entry.
    ///
    /// Returns the new checked state.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Validation`] if `item` is not in the catalogue.
    pub fn toggle(&mut self, item: &str) -> PostResult<bool> {
        if !self.catalog.contains_item(item) {
            return Err(PostError::Validation(format!(
                "unknown checklist item: '{item}'"
            )));
        }

        let now_checked = !self.is_checked(item);

        let mut state = self.state.clone();
        state.insert(item.to_string(), now_checked);
        self.persist_state(state)?;

        let action = if now_checked {
            ChecklistAction::Check
        } else {
            ChecklistAction::Uncheck
        };
        self.append_log_entry(action, Some(item.to_string()))?;

        Ok(now_checked)
    }

    /// Completion percentage, global or for one category.
    ///
    /// Defined as `round(checked / total * 100)`, and `0` when the item count
    /// is zero.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Validation`] if `category` names no catalogue
    /// category.
    pub fn completion(&self, category: Option<&str>) -> PostResult<u8> {
        let items: Vec<&str> = match category {
            Some(name) => self
                .catalog
                .category(name)
                .ok_or_else(|| {
                    PostError::Validation(format!("unknown checklist category: '{name}'"))
                })?
                .items
                .iter()
                .map(String::as_str)
                .collect(),
            None => self.catalog.items().collect(),
        };

        Ok(completion_percent(
            items.iter().filter(|item| self.is_checked(item)).count(),
            items.len(),
        ))
    }

    /// Describes what a reset would discard. Pure query, mutates nothing.
    pub fn request_reset(&self) -> ResetRequest {
        let checked_items: Vec<String> = self
            .catalog
            .items()
            .filter(|item| self.is_checked(item))
            .map(str::to_owned)
            .collect();

        ResetRequest {
            checked_items,
            // Completion over the whole catalogue cannot name an unknown
            // category.
            completion_percent: self.completion(None).unwrap_or(0),
        }
    }

    /// Clears all checked flags and appends one `Reset` log entry.
    ///
    /// The log is preserved: after-action review must still see what was
    /// confirmed before the reset.
    pub fn reset(&mut self) -> PostResult<()> {
        self.persist_state(BTreeMap::new())?;
        self.append_log_entry(ChecklistAction::Reset, None)
    }

    fn persist_state(&mut self, state: BTreeMap<String, bool>) -> PostResult<()> {
        let version =
            save_versioned(&self.store, CHECKLIST_STATE_KEY, &state, self.state_version)?;
        self.state = state;
        self.state_version = version;
        Ok(())
    }

    fn append_log_entry(&mut self, action: ChecklistAction, item: Option<String>) -> PostResult<()> {
        let entry = ChecklistLogEntry {
            id: RecordId::new(),
            at: Utc::now(),
            actor: self.actor.clone(),
            action,
            item,
        };

        let mut log = self.log.clone();
        log.insert(0, entry);
        log.truncate(CHECKLIST_LOG_CAPACITY);

        let version = save_versioned(&self.store, CHECKLIST_LOG_KEY, &log, self.log_version)?;
        self.log = log;
        self.log_version = version;
        Ok(())
    }
}

/// `round(checked / total * 100)`, `0` when `total` is zero.
fn completion_percent(checked: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((checked as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn actor() -> ActorName {
        ActorName::new("Logistics lead").expect("actor name")
    }

    fn four_item_catalog() -> ChecklistCatalog {
        ChecklistCatalog::from_yaml(
            "\
categories:
  - name: Tents
    items: [Tent, Signage]
  - name: Power
    items: [Generator, Lighting]
",
        )
        .expect("catalogue")
    }

    fn open(store: &MemoryStore) -> ReadinessChecklist<&MemoryStore> {
        ReadinessChecklist::open(store, four_item_catalog(), actor()).expect("open")
    }

    #[test]
    fn toggle_flips_and_logs_newest_first() {
        let store = MemoryStore::new();
        let mut checklist = open(&store);

        assert!(checklist.toggle("Tent").expect("first toggle"));
        assert!(!checklist.toggle("Tent").expect("second toggle"));
        assert!(!checklist.is_checked("Tent"));

        let actions: Vec<ChecklistAction> =
            checklist.log().iter().map(|e| e.action).collect();
        assert_eq!(actions, vec![ChecklistAction::Uncheck, ChecklistAction::Check]);
        assert_eq!(checklist.log()[0].item.as_deref(), Some("Tent"));
        assert_eq!(checklist.log()[0].actor.as_str(), "Logistics lead");
    }

    #[test]
    fn toggle_rejects_items_outside_the_catalogue() {
        let store = MemoryStore::new();
        let mut checklist = open(&store);
        let err = checklist.toggle("Helipad").expect_err("unknown item");
        assert!(matches!(err, PostError::Validation(_)));
        assert!(checklist.log().is_empty());
    }

    #[test]
    fn completion_rounds_and_handles_empty_catalogue() {
        let store = MemoryStore::new();
        let mut checklist = open(&store);

        assert_eq!(checklist.completion(None).expect("global"), 0);

        checklist.toggle("Tent").expect("toggle");
        checklist.toggle("Signage").expect("toggle");
        checklist.toggle("Generator").expect("toggle");
        assert_eq!(checklist.completion(None).expect("3 of 4"), 75);
        assert_eq!(checklist.completion(Some("Tents")).expect("full category"), 100);
        assert_eq!(checklist.completion(Some("Power")).expect("half category"), 50);

        assert!(checklist.completion(Some("Helipads")).is_err());

        let empty = ChecklistCatalog::from_yaml("categories: []").expect("empty");
        let store = MemoryStore::new();
        let checklist = ReadinessChecklist::open(&store, empty, actor()).expect("open");
        assert_eq!(checklist.completion(None).expect("empty catalogue"), 0);
    }

    #[test]
    fn log_is_bounded_to_fifty_entries() {
        let store = MemoryStore::new();
        let mut checklist = open(&store);

        for _ in 0..55 {
            checklist.toggle("Tent").expect("toggle");
        }

        assert_eq!(checklist.log().len(), 50);
        // 55th toggle: odd count, so the item ended up checked.
        assert_eq!(checklist.log()[0].action, ChecklistAction::Check);
        assert!(checklist.is_checked("Tent"));
    }

    #[test]
    fn reset_clears_state_but_keeps_the_log() {
        let store = MemoryStore::new();
        let mut checklist = open(&store);

        checklist.toggle("Tent").expect("toggle");
        checklist.toggle("Generator").expect("toggle");

        let request = checklist.request_reset();
        assert_eq!(request.checked_items, vec!["Tent", "Generator"]);
        assert_eq!(request.completion_percent, 50);
        // The request alone changed nothing.
        assert!(checklist.is_checked("Tent"));

        checklist.reset().expect("reset");
        assert!(!checklist.is_checked("Tent"));
        assert!(!checklist.is_checked("Generator"));
        assert_eq!(checklist.completion(None).expect("global"), 0);

        assert_eq!(checklist.log().len(), 3);
        assert_eq!(checklist.log()[0].action, ChecklistAction::Reset);
        assert_eq!(checklist.log()[0].item, None);
    }

    #[test]
    fn state_and_log_survive_reopen() {
        let store = MemoryStore::new();
        {
            let mut checklist = open(&store);
            checklist.toggle("Lighting").expect("toggle");
        }

        let reopened = open(&store);
        assert!(reopened.is_checked("Lighting"));
        assert_eq!(reopened.log().len(), 1);
    }

    #[test]
    fn completion_percent_boundaries() {
        assert_eq!(completion_percent(0, 0), 0);
        assert_eq!(completion_percent(3, 4), 75);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(4, 4), 100);
    }
}
