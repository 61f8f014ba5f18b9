//! Lifecycle transitions triggered by the primary action.
//!
//! Each transition takes the current collection and returns a new one. The
//! caller persists the result and replaces its in-memory collection with it.

use super::predicates::{count_submitted, is_language_at_apc};
use super::record::{LanguageCollection, LanguageRecord, SelectedLanguages, Timestamp};
use tracing::info;

/// Whether a record may be picked up by [`submit_selected`].
///
/// Unsubmitted and cancelled records are eligible. Cancelled ones are
/// resubmitted with their cancellation cleared.
pub fn is_submittable(record: &LanguageRecord) -> bool {
    !is_language_at_apc(record)
}

/// Stamp every selected, submittable record as submitted at `now`.
///
/// Records that are not selected, or that are already submitted, processing
/// or completed, pass through unchanged. The selection itself is kept by the
/// caller; submitted languages stay checked because they are now locked.
pub fn submit_selected(
    collection: &LanguageCollection,
    selected: &SelectedLanguages,
    now: Timestamp,
) -> LanguageCollection {
    let mut count = 0usize;

    let next = collection.map_records(|mut record| {
        if selected.contains(&record.language_code) && is_submittable(&record) {
            record.submitted = Some(now);
            record.cancelled = None;
            count += 1;
        }
        record
    });

    info!("Submitted {} languages for localization", count);
    next
}

/// Undo every submission.
///
/// Clears the submitted timestamp on all records regardless of the current
/// selection. The caller clears the selection.
pub fn cancel_selected(collection: &LanguageCollection) -> LanguageCollection {
    let cancelled = count_submitted(collection);
    let next = collection.map_records(|mut record| {
        record.submitted = None;
        record
    });

    info!("Cancelled pending submissions for {} languages", cancelled);
    next
}

/// Reset every record to unsubmitted.
pub fn start_over(collection: &LanguageCollection) -> LanguageCollection {
    let next = collection.map_records(|mut record| {
        record.submitted = None;
        record.processing = None;
        record.completed = None;
        record.cancelled = None;
        record
    });

    info!("Started over: reset {} languages", next.len());
    next
}

/// [`cancel_selected`] followed by [`start_over`].
pub fn cancel_and_start_over(collection: &LanguageCollection) -> LanguageCollection {
    start_over(&cancel_selected(collection))
}

/// Selection implied by the collection: every locked language is checked.
pub fn derive_selection(collection: &LanguageCollection) -> SelectedLanguages {
    collection
        .iter()
        .filter(|r| is_language_at_apc(r))
        .map(|r| r.language_code.clone())
        .collect()
}
