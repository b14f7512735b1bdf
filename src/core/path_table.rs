//! Inode <-> virtual path bridge.
//!
//! fuser addresses everything by inode while the resolver speaks slash
//! paths. The table hands out stable hashed inodes for virtual paths and
//! remembers the reverse mapping so `getattr`/`readdir`/`read` can recover
//! the path a kernel request refers to.

use std::collections::HashMap;
use std::sync::RwLock;

pub const INODE_ROOT: u64 = 1;

pub struct PathTable {
    paths: RwLock<HashMap<u64, String>>,
}

impl PathTable {
    pub fn new() -> Self {
        let mut paths = HashMap::new();
        paths.insert(INODE_ROOT, "/".to_string());
        Self { paths: RwLock::new(paths) }
    }

    /// Stable FNV-1a hashing, so the same virtual path yields the same inode
    /// across readdir() and open() calls and across threads.
    pub fn hash_to_inode(key: &str) -> u64 {
        const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
        const FNV_PRIME: u64 = 0x100000001b3;

        let mut hash = FNV_OFFSET_BASIS;
        for byte in key.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }

        // Keep clear of the reserved low inodes.
        hash.saturating_add(100) | 1 << 62
    }

    /// Register a virtual path and return its inode.
    pub fn remember(&self, path: &str) -> u64 {
        if path == "/" {
            return INODE_ROOT;
        }
        let inode = Self::hash_to_inode(path);
        self.paths
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(inode)
            .or_insert_with(|| path.to_string());
        inode
    }

    pub fn path_of(&self, inode: u64) -> Option<String> {
        self.paths
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&inode)
            .cloned()
    }
}

impl Default for PathTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_reserved() {
        let table = PathTable::new();
        assert_eq!(table.remember("/"), INODE_ROOT);
        assert_eq!(table.path_of(INODE_ROOT).as_deref(), Some("/"));
    }

    #[test]
    fn hashing_is_stable_and_clears_reserved_range() {
        let a = PathTable::hash_to_inode("/Por_Ano/1959");
        let b = PathTable::hash_to_inode("/Por_Ano/1959");
        assert_eq!(a, b);
        assert!(a > INODE_ROOT);
    }

    #[test]
    fn remember_round_trips() {
        let table = PathTable::new();
        let ino = table.remember("/Por_Album/Kind of Blue");
        assert_eq!(table.path_of(ino).as_deref(), Some("/Por_Album/Kind of Blue"));
        assert_eq!(table.remember("/Por_Album/Kind of Blue"), ino);
    }

    #[test]
    fn unknown_inode_is_none() {
        let table = PathTable::new();
        assert_eq!(table.path_of(9999), None);
    }
}
