//! Aggregate facts over a language collection.
//!
//! Every function is a plain existential or universal check over the records.
//! None of them relate one record to another.

use super::record::{LanguageCollection, LanguageRecord, SelectedLanguages};

/// No record is in the Unsubmitted phase. True for an empty collection.
pub fn no_unsubmitted(collection: &LanguageCollection) -> bool {
    collection.iter().all(|r| !r.is_unsubmitted())
}

pub fn any_submitted(collection: &LanguageCollection) -> bool {
    collection.iter().any(LanguageRecord::is_submitted)
}

pub fn any_processing(collection: &LanguageCollection) -> bool {
    collection.iter().any(LanguageRecord::is_processing)
}

pub fn any_completed(collection: &LanguageCollection) -> bool {
    collection.iter().any(LanguageRecord::is_completed)
}

pub fn any_cancelled(collection: &LanguageCollection) -> bool {
    collection.iter().any(LanguageRecord::is_cancelled)
}

/// Every record is completed. True for an empty collection.
pub fn all_completed(collection: &LanguageCollection) -> bool {
    collection.iter().all(LanguageRecord::is_completed)
}

/// Number of records with a submitted timestamp.
pub fn count_submitted(collection: &LanguageCollection) -> usize {
    collection.iter().filter(|r| r.is_submitted()).count()
}

/// The record is Submitted, Processing or Completed, i.e. locked for editing.
pub fn is_language_at_apc(record: &LanguageRecord) -> bool {
    record.is_submitted() || record.is_processing() || record.is_completed()
}

/// At least one record is Submitted, Processing or Completed.
pub fn is_acp_engaged(collection: &LanguageCollection) -> bool {
    any_submitted(collection) || any_processing(collection) || any_completed(collection)
}

/// Whether the record's checkbox is disabled.
///
/// Locked records are disabled. Cancelled and unsubmitted records stay
/// editable so they can be picked for a new submission.
pub fn is_disabled(record: &LanguageRecord) -> bool {
    is_language_at_apc(record)
}

pub fn is_selected(selected: &SelectedLanguages, code: &str) -> bool {
    selected.contains(code)
}
