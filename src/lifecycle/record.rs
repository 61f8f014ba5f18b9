//! Per-language lifecycle records and the collection that holds them.
//!
//! A record's phase is never stored directly. It is read off whichever of the
//! four lifecycle timestamps is present.

use crate::locales::LocaleCatalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unix timestamp in seconds, as persisted by the host.
pub type Timestamp = i64;

/// Language codes the editor currently has checked. Not persisted.
pub type SelectedLanguages = BTreeSet<String>;

/// Lifecycle phase of a single language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Unsubmitted,
    Submitted,
    Processing,
    Completed,
    Cancelled,
}

/// One target language and its lifecycle timestamps.
///
/// Normally at most one timestamp is set. Nothing here enforces that; readers
/// resolve overlaps through [`LanguageRecord::phase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageRecord {
    pub language_code: String,
    pub language_name: String,

    #[serde(default, alias = "submittedAt")]
    pub submitted: Option<Timestamp>,

    #[serde(default, alias = "processingAt")]
    pub processing: Option<Timestamp>,

    #[serde(default, alias = "completedAt")]
    pub completed: Option<Timestamp>,

    #[serde(default, alias = "cancelledAt")]
    pub cancelled: Option<Timestamp>,
}

impl LanguageRecord {
    /// Create a record with no lifecycle timestamps.
    pub fn unsubmitted(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            language_code: code.into(),
            language_name: name.into(),
            submitted: None,
            processing: None,
            completed: None,
            cancelled: None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.is_some()
    }

    /// True when none of the four timestamps is set.
    pub fn is_unsubmitted(&self) -> bool {
        !self.is_submitted() && !self.is_processing() && !self.is_completed() && !self.is_cancelled()
    }

    /// Current phase. Completed outranks Processing, which outranks Submitted,
    /// which outranks Cancelled.
    pub fn phase(&self) -> Phase {
        if self.is_completed() {
            Phase::Completed
        } else if self.is_processing() {
            Phase::Processing
        } else if self.is_submitted() {
            Phase::Submitted
        } else if self.is_cancelled() {
            Phase::Cancelled
        } else {
            Phase::Unsubmitted
        }
    }

    /// Timestamp shown as "last updated": first of submitted, processing,
    /// completed, cancelled that is set.
    pub fn last_updated(&self) -> Option<Timestamp> {
        self.submitted
            .or(self.processing)
            .or(self.completed)
            .or(self.cancelled)
    }
}

/// Ordered records for every target locale of the edited entry.
///
/// Transitions never mutate a collection in place; they build a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCollection {
    records: Vec<LanguageRecord>,
}

impl LanguageCollection {
    pub fn new(records: Vec<LanguageRecord>) -> Self {
        Self { records }
    }

    /// Build the session's collection from the host locales and whatever was
    /// persisted earlier.
    ///
    /// Persisted records keep their position and content. Target locales that
    /// have no record yet are appended as unsubmitted, in catalog order.
    pub fn seed(catalog: &LocaleCatalog, persisted: Option<Vec<LanguageRecord>>) -> Self {
        let mut records = persisted.unwrap_or_default();

        for locale in catalog.targets() {
            if !records.iter().any(|r| r.language_code == locale.code) {
                records.push(LanguageRecord::unsubmitted(&locale.code, &locale.name));
            }
        }

        Self { records }
    }

    pub fn records(&self) -> &[LanguageRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LanguageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&LanguageRecord> {
        self.records.iter().find(|r| r.language_code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.language_code.as_str())
    }

    /// Produce a new collection by applying `f` to a copy of every record.
    pub fn map_records<F>(&self, f: F) -> Self
    where
        F: FnMut(LanguageRecord) -> LanguageRecord,
    {
        Self {
            records: self.records.iter().cloned().map(f).collect(),
        }
    }

    pub fn into_records(self) -> Vec<LanguageRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a LanguageCollection {
    type Item = &'a LanguageRecord;
    type IntoIter = std::slice::Iter<'a, LanguageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<LanguageRecord> for LanguageCollection {
    fn from_iter<I: IntoIterator<Item = LanguageRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
