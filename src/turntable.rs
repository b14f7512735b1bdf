//! Turntable: the synchronous FUSE loop.
//!
//! Answers kernel callbacks against the shelf. Everything here replies
//! through the provided completion channel and never blocks on ingestion;
//! reads re-open the real file fresh each time, so there is no per-open
//! state and the fixed handle value is reusable.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEntry, ReplyOpen,
    Request,
};

use crate::core::path_table::INODE_ROOT;
use crate::resolver::{self, VirtualPath};
use crate::state::SharedState;
use crate::track::TrackRecord;

const TTL: Duration = Duration::from_secs(1);

/// Reads carry no state, so every open gets the same descriptor.
const FIXED_HANDLE: u64 = 42;

/// Nominal size reported for virtual directories.
const DIR_SIZE: u64 = 4096;

pub struct Turntable {
    pub state: SharedState,
}

impl Turntable {
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Synthesized attributes for a virtual directory: wall-clock times,
    /// nominal size, listing-only mode, the serving process as owner.
    fn dir_attr(&self, ino: u64) -> FileAttr {
        let now = SystemTime::now();
        FileAttr {
            ino,
            size: DIR_SIZE,
            blocks: 8,
            atime: now,
            mtime: now,
            ctime: now,
            crtime: now,
            kind: FileType::Directory,
            perm: 0o555,
            nlink: 2,
            uid: self.state.identity.uid,
            gid: self.state.identity.gid,
            rdev: 0,
            blksize: 4096,
            flags: 0,
        }
    }

    /// Attributes for a shelved track: the stat snapshot verbatim, behind a
    /// read-only mode.
    fn track_attr(&self, ino: u64, record: &TrackRecord) -> FileAttr {
        let stat = &record.stat;
        FileAttr {
            ino,
            size: stat.size,
            blocks: (stat.size + 511) / 512,
            atime: stat.atime,
            mtime: stat.mtime,
            ctime: stat.ctime,
            crtime: stat.ctime,
            kind: FileType::RegularFile,
            perm: 0o444,
            nlink: 1,
            uid: stat.uid,
            gid: stat.gid,
            rdev: 0,
            blksize: 4096,
            flags: 0,
        }
    }

    /// Attributes for a virtual path, or None for "no such entry".
    fn attr_for_path(&self, ino: u64, vpath: &str) -> Option<FileAttr> {
        match resolver::resolve(&self.state.settings.dirs, vpath) {
            VirtualPath::Root | VirtualPath::CategoryDir(_) => Some(self.dir_attr(ino)),
            // Any value under a known category answers as a directory, even
            // when nothing is shelved there yet.
            VirtualPath::ValueDir(_, _) => Some(self.dir_attr(ino)),
            VirtualPath::Entry(category, _, name) => {
                if !name.ends_with(".mp3") {
                    return None;
                }
                let store = self.state.lock_store();
                store
                    .find_by_virtual_name(category, name)
                    .map(|record| self.track_attr(ino, record))
            }
            VirtualPath::UnknownDir(_) | VirtualPath::Invalid => None,
        }
    }

    /// Listing for a virtual directory. Unrecognized paths are an empty
    /// listing, not an error; the mount must keep answering on stale inodes.
    fn entries_for_path(&self, vpath: &str) -> Vec<(FileType, String)> {
        let dirs = &self.state.settings.dirs;
        match resolver::resolve(dirs, vpath) {
            VirtualPath::Root => crate::track::Category::ALL
                .into_iter()
                .map(|c| (FileType::Directory, dirs.name(c).to_string()))
                .collect(),
            VirtualPath::CategoryDir(category) => self
                .state
                .lock_store()
                .distinct_values(category)
                .into_iter()
                .map(|v| (FileType::Directory, v))
                .collect(),
            VirtualPath::ValueDir(category, value) => self
                .state
                .lock_store()
                .names_for_value(category, value)
                .into_iter()
                .map(|n| (FileType::RegularFile, n))
                .collect(),
            VirtualPath::UnknownDir(_) | VirtualPath::Entry(..) | VirtualPath::Invalid => {
                Vec::new()
            }
        }
    }

    /// Resolve the real source path behind a virtual track path.
    fn source_for_path(&self, vpath: &str) -> Option<std::path::PathBuf> {
        match resolver::resolve(&self.state.settings.dirs, vpath) {
            VirtualPath::Entry(category, _, name) => {
                let store = self.state.lock_store();
                store
                    .find_by_virtual_name(category, name)
                    .map(|r| r.source_path.clone())
            }
            _ => None,
        }
    }
}

/// The enclosing directory of a virtual path; the root is its own parent.
fn parent_of(vpath: &str) -> &str {
    match vpath.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &vpath[..idx],
    }
}

/// Read `[offset, offset+len)` from a real file, clipped to its actual
/// length. An offset at or past the end yields an empty buffer.
pub fn read_range(path: &Path, offset: u64, len: u32) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buffer = vec![0u8; len as usize];
    let mut filled = 0usize;
    while filled < buffer.len() {
        let n = file.read_at(&mut buffer[filled..], offset + filled as u64)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buffer.truncate(filled);
    Ok(buffer)
}

impl Filesystem for Turntable {
    fn init(
        &mut self,
        _req: &Request,
        _config: &mut fuser::KernelConfig,
    ) -> std::result::Result<(), i32> {
        tracing::info!("[Turntable] FUSE initialized");
        Ok(())
    }

    fn lookup(&mut self, _req: &Request, parent: u64, name: &std::ffi::OsStr, reply: ReplyEntry) {
        let name_str = match name.to_str() {
            Some(s) => s,
            None => {
                reply.error(libc::EINVAL);
                return;
            }
        };

        let parent_path = match self.state.paths.path_of(parent) {
            Some(p) => p,
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };

        if name_str == "." {
            reply.entry(&TTL, &self.dir_attr(parent), 0);
            return;
        }
        if name_str == ".." {
            let grandparent = self.state.paths.remember(parent_of(&parent_path));
            reply.entry(&TTL, &self.dir_attr(grandparent), 0);
            return;
        }

        let child_path = resolver::join(&parent_path, name_str);
        match self.attr_for_path(crate::core::PathTable::hash_to_inode(&child_path), &child_path) {
            Some(mut attr) => {
                attr.ino = self.state.paths.remember(&child_path);
                reply.entry(&TTL, &attr, 0);
            }
            None => reply.error(libc::ENOENT),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        if ino == INODE_ROOT {
            reply.attr(&TTL, &self.dir_attr(INODE_ROOT));
            return;
        }

        let vpath = match self.state.paths.path_of(ino) {
            Some(p) => p,
            None => {
                reply.error(libc::ENOENT);
                return;
            }
        };

        match self.attr_for_path(ino, &vpath) {
            Some(attr) => reply.attr(&TTL, &attr),
            None => reply.error(libc::ENOENT),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let vpath = match self.state.paths.path_of(ino) {
            Some(p) => p,
            None => {
                // Stale inode: empty listing, success.
                reply.ok();
                return;
            }
        };

        let parent_ino = self.state.paths.remember(parent_of(&vpath));
        let mut items = vec![
            (ino, FileType::Directory, ".".to_string()),
            (parent_ino, FileType::Directory, "..".to_string()),
        ];

        for (kind, name) in self.entries_for_path(&vpath) {
            let child_path = resolver::join(&vpath, &name);
            let child_ino = self.state.paths.remember(&child_path);
            items.push((child_ino, kind, name));
        }

        for (i, (ino, kind, name)) in items.iter().enumerate().skip(offset as usize) {
            if reply.add(*ino, (i + 1) as i64, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request, _ino: u64, _flags: i32, reply: ReplyOpen) {
        // Open always succeeds; write flags are accepted and ignored since
        // no write path exists. Every read resolves the record again.
        reply.opened(FIXED_HANDLE, 0);
    }

    fn read(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let source = self
            .state
            .paths
            .path_of(ino)
            .and_then(|vpath| self.source_for_path(&vpath));

        let Some(source) = source else {
            // Stale handle or removed record: end-of-stream, not an error.
            reply.data(&[]);
            return;
        };

        match read_range(&source, offset.max(0) as u64, size) {
            Ok(bytes) => reply.data(&bytes),
            Err(e) => {
                tracing::warn!("[Turntable] Read of {} failed: {}", source.display(), e);
                reply.data(&[]);
            }
        }
    }
}
