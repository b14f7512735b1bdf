//! Global shared state and the ingestion state machine.
//!
//! Every index mutation funnels through the methods here. The pending table
//! and the store are separate mutexes with a fixed acquisition order
//! (pending, then store): `commit_track` holds the pending guard across the
//! store insert, so a removal observed concurrently either cancels the
//! pending entry or removes the committed record, and a deleted file can
//! never be resurrected by an extraction that finishes late.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::Settings;
use crate::core::{Identity, PathTable};
use crate::store::TrackStore;
use crate::track::TrackRecord;

/// Lifecycle of one discovered path that has not been committed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    Discovered,
    Extracting,
    Cancelled,
}

pub struct GlobalState {
    pub settings: Settings,
    pub identity: Identity,
    pub store: Mutex<TrackStore>,
    pub pending: Mutex<HashMap<PathBuf, IngestState>>,
    pub paths: PathTable,
}

pub type SharedState = Arc<GlobalState>;

impl GlobalState {
    pub fn new(settings: Settings, identity: Identity) -> Self {
        Self {
            settings,
            identity,
            store: Mutex::new(TrackStore::new()),
            pending: Mutex::new(HashMap::new()),
            paths: PathTable::new(),
        }
    }

    /// Register a freshly discovered path. Returns false if an ingestion for
    /// it is already in flight, in which case the caller must not start
    /// another one.
    pub fn begin_ingest(&self, path: &Path) -> bool {
        let mut pending = self.lock_pending();
        if pending.contains_key(path) {
            return false;
        }
        pending.insert(path.to_path_buf(), IngestState::Discovered);
        true
    }

    /// Move a pending path into `Extracting`. Returns false when the entry
    /// was cancelled (or vanished) during the settle delay; the entry is
    /// dropped and extraction must not run.
    pub fn mark_extracting(&self, path: &Path) -> bool {
        let mut pending = self.lock_pending();
        match pending.get_mut(path) {
            Some(state @ IngestState::Discovered) => {
                *state = IngestState::Extracting;
                true
            }
            Some(IngestState::Cancelled) | None => {
                pending.remove(path);
                false
            }
            Some(IngestState::Extracting) => true,
        }
    }

    /// Commit an extracted record, unless a removal cancelled it first.
    /// Returns true when the record became visible in the store.
    pub fn commit_track(&self, path: &Path, record: TrackRecord) -> bool {
        let mut pending = self.lock_pending();
        match pending.remove(path) {
            Some(IngestState::Cancelled) | None => {
                tracing::debug!("[Ingest] Commit suppressed for removed file {}", path.display());
                false
            }
            Some(_) => {
                // Still holding the pending guard; a concurrent removal
                // cannot slip between this check and the insert.
                let mut store = self.lock_store();
                store.remove_by_source(path);
                store.insert(record);
                true
            }
        }
    }

    /// Drop a pending entry after a failed extraction.
    pub fn abort_ingest(&self, path: &Path) {
        self.lock_pending().remove(path);
    }

    /// Apply a removal event: cancel any in-flight ingestion for the path
    /// AND drop any committed record. A re-discovered path (overwrite,
    /// copy-replace) can hold both at once, so neither step may shadow the
    /// other.
    pub fn on_removed(&self, path: &Path) {
        let mut pending = self.lock_pending();
        if let Some(state) = pending.get_mut(path) {
            *state = IngestState::Cancelled;
            tracing::debug!("[Ingest] Cancelled in-flight ingestion of {}", path.display());
        }
        let removed = self.lock_store().remove_by_source(path);
        if removed > 0 {
            tracing::info!("[Ingest] Unshelved {}", path.display());
        }
    }

    pub fn lock_store(&self) -> std::sync::MutexGuard<'_, TrackStore> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, IngestState>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{StatSnapshot, TrackTags};
    use std::time::SystemTime;

    fn state() -> GlobalState {
        let identity = Identity { uid: 1000, gid: 1000, is_root: false };
        GlobalState::new(Settings::default(), identity)
    }

    fn record(path: &str) -> TrackRecord {
        let stat = StatSnapshot {
            size: 10,
            mtime: SystemTime::UNIX_EPOCH,
            atime: SystemTime::UNIX_EPOCH,
            ctime: SystemTime::UNIX_EPOCH,
            uid: 1000,
            gid: 1000,
        };
        TrackRecord::new(path.into(), TrackTags::default(), stat)
    }

    #[test]
    fn happy_path_commits() {
        let state = state();
        let path = Path::new("/real/a.mp3");
        assert!(state.begin_ingest(path));
        assert!(state.mark_extracting(path));
        assert!(state.commit_track(path, record("/real/a.mp3")));
        assert_eq!(state.lock_store().len(), 1);
        assert!(state.pending.lock().unwrap().is_empty());
    }

    #[test]
    fn removal_during_extraction_suppresses_commit() {
        let state = state();
        let path = Path::new("/real/a.mp3");
        state.begin_ingest(path);
        state.mark_extracting(path);

        // File deleted while the extractor is still chewing on it.
        state.on_removed(path);

        assert!(!state.commit_track(path, record("/real/a.mp3")));
        assert!(state.lock_store().is_empty());
        assert!(state.pending.lock().unwrap().is_empty());
    }

    #[test]
    fn removal_during_settle_delay_stops_extraction() {
        let state = state();
        let path = Path::new("/real/a.mp3");
        state.begin_ingest(path);
        state.on_removed(path);

        assert!(!state.mark_extracting(path));
        assert!(state.pending.lock().unwrap().is_empty());
    }

    #[test]
    fn removal_after_commit_unshelves() {
        let state = state();
        let path = Path::new("/real/a.mp3");
        state.begin_ingest(path);
        state.mark_extracting(path);
        state.commit_track(path, record("/real/a.mp3"));

        state.on_removed(path);
        assert!(state.lock_store().is_empty());
    }

    #[test]
    fn removal_of_unknown_path_is_noop() {
        let state = state();
        state.on_removed(Path::new("/real/never-seen.mp3"));
        assert!(state.lock_store().is_empty());
    }

    #[test]
    fn removal_during_reingest_unshelves_committed_record() {
        let state = state();
        let path = Path::new("/real/a.mp3");
        state.begin_ingest(path);
        state.mark_extracting(path);
        state.commit_track(path, record("/real/a.mp3"));

        // Overwrite: a second Create arrives without a preceding Remove,
        // then the file is deleted mid-ingestion.
        state.begin_ingest(path);
        state.on_removed(path);

        assert!(state.lock_store().is_empty());

        // The cancelled re-ingest must not resurrect it either.
        assert!(!state.commit_track(path, record("/real/a.mp3")));
        assert!(state.lock_store().is_empty());
        assert!(state.pending.lock().unwrap().is_empty());
    }

    #[test]
    fn duplicate_discovery_is_ignored() {
        let state = state();
        let path = Path::new("/real/a.mp3");
        assert!(state.begin_ingest(path));
        assert!(!state.begin_ingest(path));
    }

    #[test]
    fn recommit_keeps_one_record_per_source() {
        let state = state();
        let path = Path::new("/real/a.mp3");
        state.begin_ingest(path);
        state.mark_extracting(path);
        state.commit_track(path, record("/real/a.mp3"));

        state.begin_ingest(path);
        state.mark_extracting(path);
        state.commit_track(path, record("/real/a.mp3"));

        assert_eq!(state.lock_store().len(), 1);
    }

    #[test]
    fn failed_extraction_leaves_no_trace() {
        let state = state();
        let path = Path::new("/real/garbled.mp3");
        state.begin_ingest(path);
        state.mark_extracting(path);
        state.abort_ingest(path);

        assert!(state.pending.lock().unwrap().is_empty());
        assert!(state.lock_store().is_empty());
    }
}
