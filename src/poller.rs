//! Change detection for an open session.
//!
//! A background task periodically reloads the stored document and raises a
//! stale flag once it no longer matches what the session last committed.

use crate::host::{load_collection, DocumentStore, HostError};
use crate::lifecycle::LanguageCollection;
use crate::locales::LocaleCatalog;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Raised once the stored document no longer matches what the session holds.
///
/// Never cleared. Only reopening the session resolves the divergence.
#[derive(Debug, Clone, Default)]
pub struct StaleFlag(Arc<AtomicBool>);

impl StaleFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Returns true if it was not raised before.
    pub fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reload the stored collection and compare it with `in_memory`.
///
/// Returns `Ok(true)` when they differ.
pub async fn check_once(
    store: &dyn DocumentStore,
    catalog: &LocaleCatalog,
    in_memory: &LanguageCollection,
) -> Result<bool, HostError> {
    let reloaded = load_collection(store, catalog).await?;
    Ok(reloaded != *in_memory)
}

/// Background change detection for one session.
///
/// Every `period` the stored document is reloaded and compared with the latest
/// collection published on the watch channel. The poller only ever raises the
/// stale flag; it never touches the session's data. Dropping the poller stops
/// its task.
pub struct ChangePoller {
    handle: JoinHandle<()>,
}

impl ChangePoller {
    /// Spawn the polling task. Must be called within a Tokio runtime.
    pub fn start(
        store: Arc<dyn DocumentStore>,
        catalog: LocaleCatalog,
        in_memory: watch::Receiver<LanguageCollection>,
        stale: StaleFlag,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let current = in_memory.borrow().clone();
                match check_once(store.as_ref(), &catalog, &current).await {
                    Ok(true) => {
                        if stale.raise() {
                            info!("Stored localization data changed outside this session");
                        }
                    }
                    Ok(false) => debug!("Poll: stored data matches session"),
                    Err(e) => warn!("Poll: failed to reload localization data: {}", e),
                }
            }
        });

        info!("✓ Change poller started ({:?} interval)", period);
        Self { handle }
    }

    /// Stop polling.
    pub fn stop(self) {
        // Drop does the work
    }
}

impl Drop for ChangePoller {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("Change poller stopped");
    }
}
