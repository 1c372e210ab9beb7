//! Grant store and its loading state machine.
//!
//! `NotLoaded -> Loading -> Ready | Failed`, driven only by `load`. At most one
//! load is in flight; a second call while `Loading` is suppressed. Each accepted
//! load carries a generation number so a result that arrives after `cancel`
//! cannot overwrite newer state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use super::models::{GrantCollection, GrantRecord, GrantsResponse, PageMeta};
use super::source::GrantSource;

/// Current state of the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StoreState {
    #[default]
    NotLoaded,
    Loading,
    Ready(GrantCollection),
    Failed(String),
}

impl StoreState {
    /// The loaded collection, if the store is ready
    pub fn collection(&self) -> Option<&GrantCollection> {
        match self {
            StoreState::Ready(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, StoreState::Loading)
    }
}

/// Summary of a completed load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub accepted: usize,
    pub dropped: usize,
    pub meta: Option<PageMeta>,
}

/// What a call to `load` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Another load was already in flight
    Suppressed,
    Loaded(LoadReport),
    Failed(String),
    /// The load was cancelled before its result arrived; the result was discarded
    Superseded,
}

#[derive(Debug, Default)]
struct StoreInner {
    state: StoreState,
    generation: u64,
    dropped: usize,
}

/// Owns the grant collection for a session
#[derive(Debug, Default)]
pub struct GrantStore {
    inner: Mutex<StoreInner>,
}

impl GrantStore {
    /// Create an empty store in `NotLoaded`
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // State is replaced whole under the lock, so a poisoned guard is still consistent
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state. The lock is only ever held for a field swap.
    pub fn snapshot(&self) -> StoreState {
        self.lock().state.clone()
    }

    /// Records dropped by the last completed load
    pub fn dropped_count(&self) -> usize {
        self.lock().dropped
    }

    /// Fetch a full collection from `source` and replace the current state with it.
    pub async fn load(&self, source: &dyn GrantSource) -> LoadOutcome {
        let generation = {
            let mut inner = self.lock();
            if inner.state.is_loading() {
                info!("Load from {} suppressed: another load is in flight", source.describe());
                return LoadOutcome::Suppressed;
            }
            inner.generation += 1;
            inner.state = StoreState::Loading;
            inner.generation
        };

        info!("Loading grants from {}", source.describe());
        let fetched = source.fetch().await;

        let mut inner = self.lock();
        if inner.generation != generation {
            info!("Discarding result of cancelled load from {}", source.describe());
            return LoadOutcome::Superseded;
        }

        match fetched {
            Ok(response) => {
                let (collection, report) = ingest(response);
                info!(
                    "Loaded {} grants ({} dropped)",
                    report.accepted, report.dropped
                );
                inner.dropped = report.dropped;
                inner.state = StoreState::Ready(collection);
                LoadOutcome::Loaded(report)
            }
            Err(err) => {
                let reason = err.to_string();
                warn!("Loading grants from {} failed: {reason}", source.describe());
                inner.dropped = 0;
                inner.state = StoreState::Failed(reason.clone());
                LoadOutcome::Failed(reason)
            }
        }
    }

    /// Abandon an in-flight load. Returns false if nothing was loading.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if !inner.state.is_loading() {
            return false;
        }
        inner.generation += 1;
        inner.state = StoreState::NotLoaded;
        true
    }
}

/// Validate every wire record, keeping the good ones in their delivered order
fn ingest(response: GrantsResponse) -> (GrantCollection, LoadReport) {
    if !response.success {
        warn!("Upstream reported success=false; using the grants it returned");
    }

    let mut records: Vec<GrantRecord> = Vec::with_capacity(response.result.grants.len());
    let mut dropped = 0;

    for (idx, raw) in response.result.grants.into_iter().enumerate() {
        match GrantRecord::from_json(raw) {
            Ok(record) => {
                if record.savings.is_some_and(|s| s > record.value) {
                    // Kept as delivered until savings > value has a defined policy
                    warn!(
                        "Grant #{idx} to {} reports savings above its value",
                        record.recipient
                    );
                }
                records.push(record);
            }
            Err(rejection) => {
                warn!("Dropping grant #{idx}: {rejection}");
                dropped += 1;
            }
        }
    }

    let report = LoadReport {
        accepted: records.len(),
        dropped,
        meta: response.meta,
    };
    (GrantCollection::new(records), report)
}
