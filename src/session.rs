//! One sidebar session for one entry.
//!
//! The session owns the language collection, the transient selection and the
//! change poller. The action state is never stored: it is classified from the
//! committed collection and selection whenever it is asked for.

use crate::display::{self, LanguageRow, SidebarView, STRINGS};
use crate::host::{load_collection, save_collection, DocumentStore, HostError};
use crate::lifecycle::predicates::{is_acp_engaged, is_disabled, is_language_at_apc};
use crate::lifecycle::{
    cancel_and_start_over, cancel_selected, classify, derive_selection, is_submittable, start_over,
    submit_selected, ActionState, LanguageCollection, SelectedLanguages, Timestamp,
};
use crate::locales::LocaleCatalog;
use crate::poller::{ChangePoller, StaleFlag};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A persistence write running in the background.
///
/// Failures are already logged by the task; awaiting the handle is optional.
pub type PendingWrite = JoinHandle<Result<(), HostError>>;

pub struct SidebarSession {
    store: Arc<dyn DocumentStore>,
    collection: LanguageCollection,
    selected: SelectedLanguages,
    published: watch::Sender<LanguageCollection>,
    stale: StaleFlag,
    /// Action that was fired; cleared when the derived state or the selection changes
    locked_action: Option<ActionState>,
    poller: Option<ChangePoller>,
    /// Completion signal of the most recent write; the next write waits on it
    last_write: Option<oneshot::Receiver<()>>,
}

impl SidebarSession {
    /// Load the entry's workflow data and start change detection.
    ///
    /// Must be called within a Tokio runtime.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        catalog: LocaleCatalog,
        poll_interval: Duration,
    ) -> Result<Self> {
        let collection = load_collection(store.as_ref(), &catalog)
            .await
            .context("Failed to load localization data")?;
        let selected = derive_selection(&collection);

        info!(
            "Opened sidebar session: {} languages, {} locked",
            collection.len(),
            selected.len()
        );

        let (published, in_memory) = watch::channel(collection.clone());
        let stale = StaleFlag::new();
        let poller = ChangePoller::start(
            Arc::clone(&store),
            catalog,
            in_memory,
            stale.clone(),
            poll_interval,
        );

        Ok(Self {
            store,
            collection,
            selected,
            published,
            stale,
            locked_action: None,
            poller: Some(poller),
            last_write: None,
        })
    }

    /// Stop change detection and end the session.
    pub fn close(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        info!("Closed sidebar session");
    }

    pub fn collection(&self) -> &LanguageCollection {
        &self.collection
    }

    pub fn selected(&self) -> &SelectedLanguages {
        &self.selected
    }

    /// True once the stored document has diverged from this session.
    pub fn is_stale(&self) -> bool {
        self.stale.is_raised()
    }

    /// Current primary action, derived from the committed collection and
    /// selection.
    pub fn action_state(&self) -> ActionState {
        classify(&self.collection, &self.selected)
    }

    // ==================== Selection ====================

    /// Whether the checkbox for `code` is checked. Locked languages always are.
    pub fn is_checked(&self, code: &str) -> bool {
        self.selected.contains(code)
            || self
                .collection
                .get(code)
                .map_or(false, is_language_at_apc)
    }

    /// Select-all / select-none are offered only while nothing is engaged.
    pub fn can_change_selection(&self) -> bool {
        !is_acp_engaged(&self.collection)
    }

    /// Apply a checkbox change. Returns false when the change was ignored.
    pub fn toggle_language(&mut self, code: &str, checked: bool) -> bool {
        let Some(record) = self.collection.get(code) else {
            debug!("Ignoring toggle for unknown language {}", code);
            return false;
        };

        if is_disabled(record) {
            debug!("Ignoring toggle for locked language {}", code);
            return false;
        }

        let changed = if checked {
            self.selected.insert(code.to_string())
        } else {
            self.selected.remove(code)
        };
        if changed {
            self.release_lock();
        }
        true
    }

    pub fn select_all(&mut self) -> bool {
        if !self.can_change_selection() {
            return false;
        }
        let all: SelectedLanguages = self.collection.codes().map(String::from).collect();
        if all != self.selected {
            self.selected = all;
            self.release_lock();
        }
        true
    }

    pub fn select_none(&mut self) -> bool {
        if !self.can_change_selection() {
            return false;
        }
        if !self.selected.is_empty() {
            self.selected.clear();
            self.release_lock();
        }
        true
    }

    // ==================== Primary Action ====================

    /// Whether the primary action control accepts a click.
    pub fn is_action_enabled(&self) -> bool {
        let state = self.action_state();

        if self.locked_action == Some(state) {
            return false;
        }

        match state {
            ActionState::Removed => false,
            ActionState::Submit => self.has_submittable_selection(),
            _ => true,
        }
    }

    /// Handle a click on the primary action.
    ///
    /// Returns the background write for the new collection, or `None` when the
    /// control is disabled and nothing happened.
    pub fn trigger_primary_action(&mut self, now: Timestamp) -> Option<PendingWrite> {
        if !self.is_action_enabled() {
            debug!("Primary action ignored: control is disabled");
            return None;
        }

        let state = self.action_state();
        let next = match state {
            ActionState::Submit => submit_selected(&self.collection, &self.selected, now),
            ActionState::Cancel => {
                self.selected.clear();
                cancel_selected(&self.collection)
            }
            ActionState::StartOver => {
                self.selected.clear();
                start_over(&self.collection)
            }
            ActionState::CancelAndStartOver => {
                self.selected.clear();
                cancel_and_start_over(&self.collection)
            }
            ActionState::Removed => return None,
        };

        info!("Primary action {:?} applied", state);
        let write = self.commit(next);

        self.locked_action = Some(state);
        self.release_lock_if_changed();

        Some(write)
    }

    // ==================== View ====================

    /// Build everything the rendering layer shows for this frame.
    pub fn view(&self, now: DateTime<Utc>) -> SidebarView {
        let engaged = is_acp_engaged(&self.collection);

        let rows = self
            .collection
            .iter()
            .map(|record| LanguageRow {
                code: record.language_code.clone(),
                name: record.language_name.clone(),
                checked: self.is_checked(&record.language_code),
                disabled: is_disabled(record),
                badge: display::badge(record),
                updated: display::updated_text(record, now),
            })
            .collect();

        let selection_link = if engaged {
            None
        } else if self.selected.is_empty() {
            Some(STRINGS.select_all)
        } else {
            Some(STRINGS.select_none)
        };

        SidebarView {
            heading: STRINGS.heading,
            info: display::info_messages(&self.collection),
            selection_link,
            rows,
            note: (!engaged).then_some(STRINGS.engagement_note),
            action: display::action_button(self.action_state(), self.is_action_enabled()),
            stale_notice: self.is_stale().then_some(STRINGS.stale_notice),
        }
    }

    // ==================== Internals ====================

    fn has_submittable_selection(&self) -> bool {
        self.collection
            .iter()
            .any(|r| self.selected.contains(&r.language_code) && is_submittable(r))
    }

    fn release_lock(&mut self) {
        if self.locked_action.take().is_some() {
            debug!("Primary action unlocked by selection change");
        }
    }

    fn release_lock_if_changed(&mut self) {
        if let Some(locked) = self.locked_action {
            if locked != self.action_state() {
                self.locked_action = None;
            }
        }
    }

    /// Replace the collection, publish it to the poller and persist it.
    ///
    /// Writes reach the store in commit order: each one starts only after the
    /// previous one has finished.
    fn commit(&mut self, next: LanguageCollection) -> PendingWrite {
        self.collection = next;
        self.published.send_replace(self.collection.clone());

        let store = Arc::clone(&self.store);
        let snapshot = self.collection.clone();
        let (done, finished) = oneshot::channel();
        let previous = self.last_write.replace(finished);

        tokio::spawn(async move {
            if let Some(previous) = previous {
                // Err only means the earlier task is gone
                let _ = previous.await;
            }

            let result = save_collection(store.as_ref(), &snapshot).await;
            match &result {
                Ok(()) => debug!("Saved localization data ({} languages)", snapshot.len()),
                Err(e) => warn!("Failed to save localization data: {}", e),
            }
            let _ = done.send(());
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryDocumentStore;
    use crate::lifecycle::LanguageRecord;
    use crate::host::LocalizationDocument;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose first write takes a while to land.
    struct SlowFirstWrite {
        inner: MemoryDocumentStore,
        delayed: AtomicBool,
    }

    impl DocumentStore for SlowFirstWrite {
        fn read_field(&self) -> BoxFuture<'_, Result<Option<Value>, HostError>> {
            self.inner.read_field()
        }

        fn write_field(&self, value: Value) -> BoxFuture<'_, Result<(), HostError>> {
            async move {
                if !self.delayed.swap(true, Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                self.inner.write_field(value).await
            }
            .boxed()
        }
    }

    const NOW: Timestamp = 1_700_000_000;

    fn catalog() -> LocaleCatalog {
        LocaleCatalog::new(
            vec![
                ("en-US".to_string(), "English".to_string()),
                ("fr".to_string(), "French".to_string()),
                ("de".to_string(), "German".to_string()),
                ("it".to_string(), "Italian".to_string()),
                ("cs".to_string(), "Czech".to_string()),
            ],
            "en-US",
        )
        .unwrap()
    }

    async fn open_with(store: Arc<MemoryDocumentStore>) -> SidebarSession {
        SidebarSession::open(store, catalog(), Duration::from_secs(3600))
            .await
            .unwrap()
    }

    fn stored(records: Vec<LanguageRecord>) -> serde_json::Value {
        LocalizationDocument::new(LanguageCollection::new(records))
            .to_value()
            .unwrap()
    }

    // ==================== Open Tests ====================

    #[tokio::test]
    async fn test_open_fresh_entry() {
        let session = open_with(Arc::new(MemoryDocumentStore::new())).await;

        assert_eq!(session.collection().len(), 4);
        assert!(session.selected().is_empty());
        assert_eq!(session.action_state(), ActionState::Submit);
        assert!(!session.is_action_enabled());
        assert!(session.can_change_selection());
    }

    #[tokio::test]
    async fn test_open_derives_selection_from_locked_languages() {
        let mut fr = LanguageRecord::unsubmitted("fr", "French");
        fr.submitted = Some(NOW);
        let mut de = LanguageRecord::unsubmitted("de", "German");
        de.cancelled = Some(NOW);
        let store = Arc::new(MemoryDocumentStore::with_value(stored(vec![fr, de])));

        let session = open_with(store).await;

        assert_eq!(session.selected().len(), 1);
        assert!(session.is_checked("fr"));
        assert!(!session.is_checked("de"));
        assert_eq!(session.action_state(), ActionState::Cancel);
        assert!(!session.can_change_selection());
    }

    // ==================== Selection Tests ====================

    #[tokio::test]
    async fn test_toggle_language() {
        let mut session = open_with(Arc::new(MemoryDocumentStore::new())).await;

        assert!(session.toggle_language("fr", true));
        assert!(session.is_checked("fr"));
        assert!(session.is_action_enabled());

        assert!(session.toggle_language("fr", false));
        assert!(!session.is_checked("fr"));
        assert!(!session.toggle_language("xx", true));
    }

    #[tokio::test]
    async fn test_locked_language_cannot_be_toggled() {
        let mut fr = LanguageRecord::unsubmitted("fr", "French");
        fr.processing = Some(NOW);
        let store = Arc::new(MemoryDocumentStore::with_value(stored(vec![fr])));
        let mut session = open_with(store).await;

        assert!(!session.toggle_language("fr", false));
        assert!(session.is_checked("fr"));
    }

    #[tokio::test]
    async fn test_select_all_and_none() {
        let mut session = open_with(Arc::new(MemoryDocumentStore::new())).await;

        assert!(session.select_all());
        assert_eq!(session.selected().len(), 4);
        assert!(session.select_none());
        assert!(session.selected().is_empty());
    }

    #[tokio::test]
    async fn test_select_all_unavailable_once_engaged() {
        let mut session = open_with(Arc::new(MemoryDocumentStore::new())).await;
        session.toggle_language("fr", true);
        session.trigger_primary_action(NOW).unwrap().await.unwrap().unwrap();

        assert!(!session.select_all());
        assert!(!session.select_none());
        assert_eq!(session.selected().len(), 1);
    }

    // ==================== Primary Action Tests ====================

    #[tokio::test]
    async fn test_submit_then_cancel() {
        let store = Arc::new(MemoryDocumentStore::new());
        let mut session = open_with(store.clone()).await;
        session.toggle_language("fr", true);
        session.toggle_language("de", true);

        let write = session.trigger_primary_action(NOW).expect("Submit should fire");
        write.await.unwrap().unwrap();

        assert_eq!(session.collection().get("fr").and_then(|r| r.submitted), Some(NOW));
        assert_eq!(session.selected().len(), 2);
        assert_eq!(session.action_state(), ActionState::Cancel);
        assert_eq!(store.writes(), 1);

        let write = session.trigger_primary_action(NOW + 5).expect("Cancel should fire");
        write.await.unwrap().unwrap();

        assert!(session.collection().iter().all(|r| r.is_unsubmitted()));
        assert!(session.selected().is_empty());
        assert_eq!(session.action_state(), ActionState::Submit);
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_adding_language_after_submit_brings_back_submit() {
        let mut session = open_with(Arc::new(MemoryDocumentStore::new())).await;
        session.toggle_language("fr", true);
        session.trigger_primary_action(NOW).unwrap().await.unwrap().unwrap();

        session.toggle_language("de", true);
        assert_eq!(session.action_state(), ActionState::Submit);
        assert!(session.is_action_enabled());

        session.trigger_primary_action(NOW + 1).unwrap().await.unwrap().unwrap();
        assert_eq!(session.collection().get("de").and_then(|r| r.submitted), Some(NOW + 1));
        assert_eq!(session.collection().get("fr").and_then(|r| r.submitted), Some(NOW));
        assert_eq!(session.action_state(), ActionState::Cancel);
    }

    #[tokio::test]
    async fn test_start_over_after_full_success() {
        let records = ["fr", "de", "it", "cs"]
            .iter()
            .map(|code| LanguageRecord {
                completed: Some(NOW),
                ..LanguageRecord::unsubmitted(*code, code.to_uppercase())
            })
            .collect();
        let store = Arc::new(MemoryDocumentStore::with_value(stored(records)));
        let mut session = open_with(store.clone()).await;

        assert_eq!(session.action_state(), ActionState::StartOver);
        session.trigger_primary_action(NOW).unwrap().await.unwrap().unwrap();

        assert!(session.collection().iter().all(|r| r.is_unsubmitted()));
        assert!(session.selected().is_empty());
        assert_eq!(session.action_state(), ActionState::Submit);

        let persisted = LocalizationDocument::decode(store.value().as_ref()).unwrap();
        assert_eq!(&persisted, session.collection());
    }

    #[tokio::test]
    async fn test_cancel_and_start_over() {
        let mut fr = LanguageRecord::unsubmitted("fr", "French");
        fr.completed = Some(NOW);
        let mut de = LanguageRecord::unsubmitted("de", "German");
        de.submitted = Some(NOW);
        let store = Arc::new(MemoryDocumentStore::with_value(stored(vec![fr, de])));
        let mut session = open_with(store.clone()).await;

        assert_eq!(session.action_state(), ActionState::CancelAndStartOver);
        session.trigger_primary_action(NOW).unwrap().await.unwrap().unwrap();

        assert!(session.collection().iter().all(|r| r.is_unsubmitted()));
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn test_removed_state_has_no_action() {
        let records = vec![
            LanguageRecord {
                submitted: Some(NOW),
                ..LanguageRecord::unsubmitted("fr", "French")
            },
            LanguageRecord {
                submitted: Some(NOW),
                ..LanguageRecord::unsubmitted("de", "German")
            },
            LanguageRecord {
                processing: Some(NOW),
                ..LanguageRecord::unsubmitted("it", "Italian")
            },
            LanguageRecord {
                processing: Some(NOW),
                ..LanguageRecord::unsubmitted("cs", "Czech")
            },
        ];
        let store = Arc::new(MemoryDocumentStore::with_value(stored(records)));
        let mut session = open_with(store.clone()).await;

        assert_eq!(session.action_state(), ActionState::Removed);
        assert!(!session.is_action_enabled());
        assert!(session.trigger_primary_action(NOW).is_none());
        assert!(session.view(Utc::now()).action.is_none());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_action_locked_until_state_changes() {
        // An empty target list classifies as StartOver and stays there
        let catalog = LocaleCatalog::new(vec![("en-US".to_string(), "English".to_string())], "en-US").unwrap();
        let store = Arc::new(MemoryDocumentStore::new());
        let mut session = SidebarSession::open(store.clone(), catalog, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(session.action_state(), ActionState::StartOver);
        assert!(session.trigger_primary_action(NOW).is_some());
        assert!(!session.is_action_enabled());
        assert!(session.trigger_primary_action(NOW).is_none());
    }

    #[tokio::test]
    async fn test_resubmit_while_another_language_processing() {
        let de = LanguageRecord {
            processing: Some(NOW),
            ..LanguageRecord::unsubmitted("de", "German")
        };
        let store = Arc::new(MemoryDocumentStore::with_value(stored(vec![de])));
        let mut session = open_with(store.clone()).await;

        session.toggle_language("fr", true);
        session.trigger_primary_action(NOW).unwrap().await.unwrap().unwrap();
        assert_eq!(session.action_state(), ActionState::Submit);
        assert!(!session.is_action_enabled());

        // Checking another language offers the next submission
        assert!(session.toggle_language("it", true));
        assert_eq!(session.action_state(), ActionState::Submit);
        assert!(session.is_action_enabled());

        session
            .trigger_primary_action(NOW + 1)
            .expect("second submit fires")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.collection().get("it").and_then(|r| r.submitted), Some(NOW + 1));
        assert_eq!(session.collection().get("fr").and_then(|r| r.submitted), Some(NOW));
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_unchanged_selection_keeps_action_locked() {
        let catalog = LocaleCatalog::new(vec![("en-US".to_string(), "English".to_string())], "en-US").unwrap();
        let store = Arc::new(MemoryDocumentStore::new());
        let mut session = SidebarSession::open(store, catalog, Duration::from_secs(3600))
            .await
            .unwrap();

        session.trigger_primary_action(NOW).unwrap();
        // Nothing to select, so nothing changes
        session.select_none();
        assert!(!session.is_action_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_land_in_click_order() {
        let store = Arc::new(SlowFirstWrite {
            inner: MemoryDocumentStore::new(),
            delayed: AtomicBool::new(false),
        });
        let mut session = SidebarSession::open(store.clone(), catalog(), Duration::from_secs(3600))
            .await
            .unwrap();

        session.toggle_language("fr", true);
        let submit = session.trigger_primary_action(NOW).expect("Submit should fire");
        let cancel = session.trigger_primary_action(NOW + 1).expect("Cancel should fire");
        cancel.await.unwrap().unwrap();
        submit.await.unwrap().unwrap();

        let persisted = LocalizationDocument::decode(store.inner.value().as_ref()).unwrap();
        assert!(persisted.get("fr").and_then(|r| r.submitted).is_none());
        assert_eq!(&persisted, session.collection());
        assert_eq!(store.inner.writes(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_optimistic_state() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.set_reject_writes(true);
        let mut session = open_with(store.clone()).await;
        session.toggle_language("it", true);

        let result = session.trigger_primary_action(NOW).unwrap().await.unwrap();
        assert!(result.is_err());

        assert_eq!(session.collection().get("it").and_then(|r| r.submitted), Some(NOW));
        assert_eq!(session.action_state(), ActionState::Cancel);
        assert!(store.value().is_none());
    }

    // ==================== View Tests ====================

    #[tokio::test]
    async fn test_view_before_engagement() {
        let mut session = open_with(Arc::new(MemoryDocumentStore::new())).await;
        let view = session.view(Utc::now());

        assert_eq!(view.info, vec![STRINGS.info_select]);
        assert_eq!(view.selection_link, Some(STRINGS.select_all));
        assert_eq!(view.note, Some(STRINGS.engagement_note));
        assert_eq!(view.rows.len(), 4);
        assert!(view.rows.iter().all(|r| !r.checked && !r.disabled && r.badge.is_none()));
        let action = view.action.unwrap();
        assert_eq!(action.label, "Submit");
        assert!(!action.enabled);
        assert!(view.stale_notice.is_none());

        session.toggle_language("cs", true);
        let view = session.view(Utc::now());
        assert_eq!(view.selection_link, Some(STRINGS.select_none));
        assert!(view.action.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_view_after_submit() {
        let mut session = open_with(Arc::new(MemoryDocumentStore::new())).await;
        session.toggle_language("fr", true);
        let now = Utc::now();
        session
            .trigger_primary_action(now.timestamp())
            .unwrap()
            .await
            .unwrap()
            .unwrap();

        let view = session.view(now);
        assert_eq!(view.info, vec![STRINGS.info_submitted]);
        assert!(view.selection_link.is_none());
        assert!(view.note.is_none());

        let fr = view.rows.iter().find(|r| r.code == "fr").unwrap();
        assert!(fr.checked && fr.disabled);
        assert_eq!(fr.badge.map(|b| b.text), Some("Submitted"));
        assert_eq!(fr.updated.as_deref(), Some("Updated a few seconds ago"));

        let action = view.action.unwrap();
        assert_eq!(action.label, "Cancel");
        assert_eq!(action.variant, display::ButtonVariant::Negative);
    }

    #[tokio::test]
    async fn test_close_stops_poller() {
        let session = open_with(Arc::new(MemoryDocumentStore::new())).await;
        session.close();
    }
}
