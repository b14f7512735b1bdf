//! jukefs: a read-only virtual view of a music folder.
//!
//! A single-process binary with three moving parts:
//! - Turntable (FUSE loop - synchronous, answers listings/attrs/reads)
//! - Librarian (background watcher - discovers and unshelves files)
//! - Shelf (in-memory track index, the only mutable state)

pub mod config;
pub mod core;
pub mod error;
pub mod extractor;
pub mod librarian;
pub mod resolver;
pub mod state;
pub mod store;
pub mod track;
pub mod turntable;

pub use config::{CategoryDirs, Settings};
pub use error::{JukeError, Result};
pub use state::{GlobalState, SharedState};
pub use store::TrackStore;
pub use track::{Category, StatSnapshot, TrackRecord, TrackTags};
