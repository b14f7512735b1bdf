//! The Shelf: insertion-ordered index of committed tracks.
//!
//! Every query is a linear scan. At the target scale (a personal library)
//! that is the accepted trade-off; there are no secondary indexes to keep
//! consistent under removal.

use std::collections::BTreeSet;
use std::path::Path;

use crate::track::{Category, TrackRecord};

#[derive(Default)]
pub struct TrackStore {
    records: Vec<TrackRecord>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. The record is visible to queries from this point on.
    pub fn insert(&mut self, record: TrackRecord) {
        self.records.push(record);
    }

    /// Remove every record whose source path matches. Returns how many were
    /// dropped; removing an unknown path is a no-op, not an error.
    pub fn remove_by_source(&mut self, path: &Path) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.source_path != path);
        before - self.records.len()
    }

    /// Distinct grouping values for a category, sorted, duplicates collapsed.
    pub fn distinct_values(&self, category: Category) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.group_value(category))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Virtual filenames under `category/value`, sorted, duplicates collapsed.
    pub fn names_for_value(&self, category: Category, value: &str) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| r.group_value(category) == value)
            .map(|r| r.virtual_name(category))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// First record (in store order) whose virtual name in `category`
    /// matches. Colliding names shadow each other; that is documented
    /// behavior, not a bug to disambiguate here.
    pub fn find_by_virtual_name(&self, category: Category, name: &str) -> Option<&TrackRecord> {
        self.records.iter().find(|r| r.virtual_name(category) == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
