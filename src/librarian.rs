//! The Librarian: background watcher and ingestion coordinator.
//!
//! Phase 1 walks the source directory and treats every existing audio file
//! as discovered. Phase 2 subscribes to filesystem notifications and keeps
//! the shelf in sync: creations schedule a delayed extraction, removals
//! apply immediately (cancelling any in-flight extraction for the path).

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;

use crate::error::Result;
use crate::extractor;
use crate::state::SharedState;
use crate::track::{StatSnapshot, TrackRecord};

pub struct Librarian {
    state: SharedState,
    runtime: Handle,
    pub thread_handle: Option<thread::JoinHandle<()>>,
}

impl Librarian {
    pub fn new(state: SharedState, runtime: Handle) -> Self {
        Self { state, runtime, thread_handle: None }
    }

    pub fn start(&mut self) -> Result<()> {
        let state = Arc::clone(&self.state);
        let runtime = self.runtime.clone();
        self.thread_handle = Some(thread::spawn(move || {
            Self::watcher_loop(state, runtime);
        }));
        Ok(())
    }

    fn watcher_loop(state: SharedState, runtime: Handle) {
        let source_dir = state.settings.source_dir.clone();

        // ==== PHASE 1: INITIAL SCAN ====
        tracing::info!("[Librarian] Scanning {}", source_dir.display());
        let mut found = 0usize;
        for entry in walkdir::WalkDir::new(&source_dir)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && state.settings.is_audio_file(path) {
                Self::on_discovered(&state, &runtime, path.to_path_buf());
                found += 1;
            }
        }
        tracing::info!("[Librarian] Initial scan ready, {} file(s) queued", found);

        // ==== PHASE 2: STEADY-STATE MONITORING ====
        let (tx, rx) = mpsc::channel();
        let mut watcher = match RecommendedWatcher::new(tx, notify::Config::default()) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!("[Librarian] Failed to create watcher: {}", e);
                return;
            }
        };
        if let Err(e) = watcher.watch(&source_dir, RecursiveMode::Recursive) {
            tracing::error!("[Librarian] Failed to watch {}: {}", source_dir.display(), e);
            return;
        }

        for event in rx {
            match event {
                Ok(event) => Self::handle_event(&state, &runtime, event),
                Err(e) => {
                    // Degraded but alive: the shelf may go stale, the mount
                    // keeps answering.
                    tracing::warn!("[Librarian] Watch error: {}", e);
                }
            }
        }
    }

    fn handle_event(state: &SharedState, runtime: &Handle, event: Event) {
        match event.kind {
            EventKind::Create(_) => {
                for path in event.paths {
                    if path.is_file() && state.settings.is_audio_file(&path) {
                        Self::on_discovered(state, runtime, path);
                    }
                }
            }
            EventKind::Remove(_) => {
                for path in event.paths {
                    state.on_removed(&path);
                }
            }
            _ => {}
        }
    }

    /// Schedule extraction for a discovered file. The stat snapshot is
    /// frozen here; the settle delay gives the producing process time to
    /// close the file before we parse it.
    fn on_discovered(state: &SharedState, runtime: &Handle, path: PathBuf) {
        let stat = match StatSnapshot::capture(&path) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("[Librarian] Cannot stat {}: {}", path.display(), e);
                return;
            }
        };

        if !state.begin_ingest(&path) {
            tracing::debug!("[Librarian] Ingestion already in flight for {}", path.display());
            return;
        }
        tracing::info!("[Librarian] Discovered {}", path.display());

        let state = Arc::clone(state);
        let settle = Duration::from_millis(state.settings.settle_delay_ms);
        runtime.spawn(async move {
            tokio::time::sleep(settle).await;
            ingest(state, path, stat).await;
        });
    }
}

/// One ingestion attempt: extract tags off-thread, then commit unless a
/// removal cancelled the path in the meantime. Extraction failure is fatal
/// to this attempt only.
async fn ingest(state: SharedState, path: PathBuf, stat: StatSnapshot) {
    if !state.mark_extracting(&path) {
        return;
    }

    let parse_path = path.clone();
    let tags = tokio::task::spawn_blocking(move || extractor::extract_tags(&parse_path)).await;

    match tags {
        Ok(Ok(tags)) => {
            let record = TrackRecord::new(path.clone(), tags, stat);
            if state.commit_track(&path, record) {
                tracing::info!("[Librarian] Shelved {}", path.display());
            }
        }
        Ok(Err(e)) => {
            tracing::warn!("[Librarian] Extraction failed for {}: {}", path.display(), e);
            state.abort_ingest(&path);
        }
        Err(e) => {
            tracing::warn!("[Librarian] Extraction task panicked for {}: {}", path.display(), e);
            state.abort_ingest(&path);
        }
    }
}
