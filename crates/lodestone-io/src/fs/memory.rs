//! In-memory filesystem backend.
//!
//! Backs the VFS in tests, demos, and anywhere a real disk is unwanted.
//! The tree is shared behind a mutex; open write streams buffer locally and
//! commit back on flush/close/drop, so a reader opened before a commit keeps
//! its snapshot.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::fs::{
    DirectoryEntry, FileInfo, FileSystem, FileSystemCapabilities, FileType, ListOptions,
    RemoveOptions,
};
use crate::path::Uri;
use crate::stream::{FileOpenMode, SeekWhence, Stream, StreamCaps};

struct FileNode {
    data: Vec<u8>,
    mtime_ns: i64,
}

#[derive(Default)]
struct MemoryTree {
    files: AHashMap<String, FileNode>,
    dirs: AHashSet<String>,
    /// Logical clock; bumps on every commit and doubles as mtime.
    revision: i64,
}

impl MemoryTree {
    fn is_dir(&self, key: &str) -> bool {
        if key.is_empty() {
            return true;
        }
        if self.dirs.contains(key) {
            return true;
        }
        let prefix = format!("{key}/");
        self.files.keys().any(|k| k.starts_with(&prefix))
            || self.dirs.iter().any(|d| d.starts_with(&prefix))
    }

    fn commit(&mut self, key: &str, data: Vec<u8>) {
        self.revision += 1;
        let mtime_ns = self.revision;
        self.files.insert(key.to_string(), FileNode { data, mtime_ns });
    }
}

fn tree_key(uri: &Uri) -> String {
    let path = uri.path.as_str().trim_matches('/');
    if uri.authority.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        uri.authority.clone()
    } else {
        format!("{}/{}", uri.authority, path)
    }
}

/// Shared-tree in-memory backend. Cloning shares the same tree.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    tree: Arc<Mutex<MemoryTree>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file directly, creating it or replacing its contents.
    pub fn insert(&self, path: impl AsRef<str>, bytes: impl Into<Vec<u8>>) {
        let key = path.as_ref().trim_matches('/').to_string();
        self.tree.lock().commit(&key, bytes.into());
    }

    pub fn contains(&self, path: impl AsRef<str>) -> bool {
        let key = path.as_ref().trim_matches('/');
        self.tree.lock().files.contains_key(key)
    }

    /// Snapshot a file's bytes.
    pub fn read(&self, path: impl AsRef<str>) -> Option<Vec<u8>> {
        let key = path.as_ref().trim_matches('/');
        self.tree.lock().files.get(key).map(|n| n.data.clone())
    }
}

impl FileSystem for MemoryFileSystem {
    fn name(&self) -> &'static str {
        "MemoryFS"
    }

    fn open(&self, uri: &Uri, mode: FileOpenMode) -> IoResult<Box<dyn Stream>> {
        if !mode.is_valid() {
            return Err(IoError::with_detail(
                IoErrorCode::InvalidPath,
                "MemoryFS: invalid FileOpenMode",
                uri.to_string(),
            ));
        }

        let key = tree_key(uri);
        let mut tree = self.tree.lock();

        if tree.is_dir(&key) && !key.is_empty() {
            return Err(IoError::with_detail(
                IoErrorCode::OpenFailed,
                "MemoryFS: path is a directory",
                key,
            ));
        }

        if mode.wants_write() {
            let existing = tree.files.get(&key);
            if existing.is_none() && !mode.contains(FileOpenMode::CREATE_IF_MISSING) {
                return Err(IoError::with_detail(
                    IoErrorCode::NotFound,
                    "MemoryFS: file not found",
                    key,
                ));
            }

            let buf = if mode.contains(FileOpenMode::TRUNCATE) {
                Vec::new()
            } else {
                existing.map(|n| n.data.clone()).unwrap_or_default()
            };
            let pos = if mode.is_append() { buf.len() as u64 } else { 0 };

            // Creation is observable from the moment of open.
            if !tree.files.contains_key(&key) {
                tree.commit(&key, Vec::new());
            }
            drop(tree);

            Ok(Box::new(MemoryFileStream {
                tree: Arc::clone(&self.tree),
                key,
                buf,
                pos,
                readable: mode.can_read(),
                writable: true,
                open: true,
                eof: false,
                dirty: false,
            }))
        } else {
            let Some(node) = tree.files.get(&key) else {
                return Err(IoError::with_detail(
                    IoErrorCode::NotFound,
                    "MemoryFS: file not found",
                    key,
                ));
            };
            let buf = node.data.clone();
            drop(tree);

            Ok(Box::new(MemoryFileStream {
                tree: Arc::clone(&self.tree),
                key,
                buf,
                pos: 0,
                readable: true,
                writable: false,
                open: true,
                eof: false,
                dirty: false,
            }))
        }
    }

    fn exists(&self, uri: &Uri) -> IoResult<bool> {
        let key = tree_key(uri);
        let tree = self.tree.lock();
        Ok(tree.files.contains_key(&key) || (!key.is_empty() && tree.is_dir(&key)))
    }

    fn stat(&self, uri: &Uri) -> IoResult<FileInfo> {
        let key = tree_key(uri);
        let tree = self.tree.lock();

        if let Some(node) = tree.files.get(&key) {
            return Ok(FileInfo {
                file_type: FileType::Regular,
                size_bytes: node.data.len() as u64,
                mtime_ns: node.mtime_ns,
                backend: "memory".to_string(),
                ..Default::default()
            });
        }
        if tree.is_dir(&key) {
            return Ok(FileInfo {
                file_type: FileType::Directory,
                backend: "memory".to_string(),
                ..Default::default()
            });
        }
        Err(IoError::with_detail(
            IoErrorCode::NotFound,
            "MemoryFS: no such entry",
            key,
        ))
    }

    fn create_directories(&self, uri: &Uri) -> IoResult<()> {
        let key = tree_key(uri);
        let mut tree = self.tree.lock();
        let mut cur = key.as_str();
        while !cur.is_empty() {
            tree.dirs.insert(cur.to_string());
            cur = match cur.rfind('/') {
                Some(pos) => &cur[..pos],
                None => "",
            };
        }
        Ok(())
    }

    fn remove(&self, uri: &Uri, opt: &RemoveOptions) -> IoResult<()> {
        let key = tree_key(uri);
        let mut tree = self.tree.lock();

        if tree.files.remove(&key).is_some() {
            return Ok(());
        }

        if tree.is_dir(&key) && !key.is_empty() {
            let prefix = format!("{key}/");
            let has_children = tree.files.keys().any(|k| k.starts_with(&prefix))
                || tree.dirs.iter().any(|d| d.starts_with(&prefix));
            if has_children && !opt.recursive {
                return Err(IoError::with_detail(
                    IoErrorCode::WriteFailed,
                    "MemoryFS: directory not empty",
                    key,
                ));
            }
            tree.files.retain(|k, _| !k.starts_with(&prefix));
            tree.dirs.retain(|d| !d.starts_with(&prefix) && d != &key);
            return Ok(());
        }

        Err(IoError::with_detail(
            IoErrorCode::NotFound,
            "MemoryFS: no such entry",
            key,
        ))
    }

    fn rename(&self, from: &Uri, to: &Uri) -> IoResult<()> {
        let from_key = tree_key(from);
        let to_key = tree_key(to);
        let mut tree = self.tree.lock();

        if let Some(node) = tree.files.remove(&from_key) {
            tree.revision += 1;
            let mtime_ns = tree.revision;
            tree.files.insert(
                to_key,
                FileNode {
                    data: node.data,
                    mtime_ns,
                },
            );
            return Ok(());
        }

        if tree.is_dir(&from_key) && !from_key.is_empty() {
            let prefix = format!("{from_key}/");
            let moved: Vec<(String, FileNode)> = tree
                .files
                .extract_if(|k, _| k.starts_with(&prefix))
                .collect();
            for (k, node) in moved {
                let new_key = format!("{to_key}/{}", &k[prefix.len()..]);
                tree.files.insert(new_key, node);
            }
            let moved_dirs: Vec<String> = tree
                .dirs
                .iter()
                .filter(|d| d.starts_with(&prefix) || d.as_str() == from_key)
                .cloned()
                .collect();
            for d in moved_dirs {
                tree.dirs.remove(&d);
                let tail = d.strip_prefix(from_key.as_str()).unwrap_or("");
                tree.dirs.insert(format!("{to_key}{tail}"));
            }
            return Ok(());
        }

        Err(IoError::with_detail(
            IoErrorCode::NotFound,
            "MemoryFS: no such entry",
            from_key,
        ))
    }

    fn copy(&self, from: &Uri, to: &Uri) -> IoResult<()> {
        let from_key = tree_key(from);
        let to_key = tree_key(to);
        let mut tree = self.tree.lock();

        let Some(node) = tree.files.get(&from_key) else {
            if tree.is_dir(&from_key) {
                return Err(IoError::new(
                    IoErrorCode::NotSupported,
                    "MemoryFS: directory copy not supported",
                ));
            }
            return Err(IoError::with_detail(
                IoErrorCode::NotFound,
                "MemoryFS: no such entry",
                from_key,
            ));
        };
        let data = node.data.clone();
        tree.commit(&to_key, data);
        Ok(())
    }

    fn list(&self, uri: &Uri, opt: &ListOptions) -> IoResult<Vec<DirectoryEntry>> {
        let key = tree_key(uri);
        let tree = self.tree.lock();

        if tree.files.contains_key(&key) {
            return Err(IoError::with_detail(
                IoErrorCode::InvalidPath,
                "MemoryFS: not a directory",
                key,
            ));
        }
        if !tree.is_dir(&key) {
            return Err(IoError::with_detail(
                IoErrorCode::NotFound,
                "MemoryFS: no such directory",
                key,
            ));
        }

        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };

        // name -> type; dir children may be discovered through deeper files.
        let mut children: AHashMap<String, FileType> = AHashMap::new();

        for file_key in tree.files.keys() {
            let Some(rest) = file_key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            if opt.recursive {
                children.insert(rest.to_string(), FileType::Regular);
            } else {
                match rest.find('/') {
                    Some(pos) => {
                        children
                            .entry(rest[..pos].to_string())
                            .or_insert(FileType::Directory);
                    }
                    None => {
                        children.insert(rest.to_string(), FileType::Regular);
                    }
                }
            }
        }

        for dir_key in tree.dirs.iter() {
            let Some(rest) = dir_key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            if opt.recursive {
                children.entry(rest.to_string()).or_insert(FileType::Directory);
            } else if !rest.contains('/') {
                children.entry(rest.to_string()).or_insert(FileType::Directory);
            }
        }

        let base = uri.to_string();
        let base = base.trim_end_matches('/');

        let mut out: Vec<DirectoryEntry> = Vec::with_capacity(children.len());
        for (rel, file_type) in children {
            let name = rel.rsplit('/').next().unwrap_or(&rel).to_string();
            if !opt.include_hidden && name.starts_with('.') {
                continue;
            }
            match file_type {
                FileType::Regular if !opt.include_files => continue,
                FileType::Directory if !opt.include_directories => continue,
                _ => {}
            }

            let info = if opt.include_info {
                let child_key = format!("{prefix}{rel}");
                tree.files.get(&child_key).map(|node| FileInfo {
                    file_type: FileType::Regular,
                    size_bytes: node.data.len() as u64,
                    mtime_ns: node.mtime_ns,
                    backend: "memory".to_string(),
                    ..Default::default()
                })
            } else {
                None
            };

            out.push(DirectoryEntry {
                path: format!("{base}/{rel}"),
                name,
                file_type,
                info,
            });
        }

        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn to_native_path(&self, _uri: &Uri) -> IoResult<String> {
        Err(IoError::new(
            IoErrorCode::NotSupported,
            "MemoryFS: no native path",
        ))
    }

    fn capabilities(&self) -> FileSystemCapabilities {
        FileSystemCapabilities {
            can_iterate: true,
            case_sensitive_paths: true,
            supports_mtime: true,
            ..Default::default()
        }
    }
}

struct MemoryFileStream {
    tree: Arc<Mutex<MemoryTree>>,
    key: String,
    buf: Vec<u8>,
    pos: u64,
    readable: bool,
    writable: bool,
    open: bool,
    eof: bool,
    dirty: bool,
}

impl MemoryFileStream {
    fn commit(&mut self) {
        if self.writable && self.dirty {
            self.tree.lock().commit(&self.key, self.buf.clone());
            self.dirty = false;
        }
    }
}

impl Stream for MemoryFileStream {
    fn caps(&self) -> StreamCaps {
        StreamCaps {
            readable: self.readable,
            writable: self.writable,
            seekable: true,
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_eof(&self) -> bool {
        self.eof
    }

    fn read(&mut self, dst: &mut [u8]) -> IoResult<usize> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::ReadFailed,
                "MemoryFS: read on closed stream",
            ));
        }
        if !self.readable {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryFS: stream not readable",
            ));
        }
        if dst.is_empty() {
            return Ok(0);
        }

        let size = self.buf.len() as u64;
        if self.pos >= size {
            self.eof = true;
            return Ok(0);
        }

        let remain = (size - self.pos) as usize;
        let n = remain.min(dst.len());
        let start = self.pos as usize;
        dst[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u64;
        self.eof = self.pos >= size;
        Ok(n)
    }

    fn write(&mut self, src: &[u8]) -> IoResult<usize> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::WriteFailed,
                "MemoryFS: write on closed stream",
            ));
        }
        if !self.writable {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryFS: stream not writable",
            ));
        }
        if src.is_empty() {
            return Ok(0);
        }

        let need = self.pos + src.len() as u64;
        if need > self.buf.len() as u64 {
            self.buf.resize(need as usize, 0);
        }
        let start = self.pos as usize;
        self.buf[start..start + src.len()].copy_from_slice(src);
        self.pos += src.len() as u64;
        self.eof = false;
        self.dirty = true;
        Ok(src.len())
    }

    fn tell(&self) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "MemoryFS: tell on closed stream",
            ));
        }
        Ok(self.pos)
    }

    fn seek(&mut self, offset: i64, whence: SeekWhence) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::SeekFailed,
                "MemoryFS: seek on closed stream",
            ));
        }

        let cur = self.pos as i64;
        let end = self.buf.len() as i64;
        let target = match whence {
            SeekWhence::Begin => offset,
            SeekWhence::Current => cur + offset,
            SeekWhence::End => end + offset,
        };

        if target < 0 || (!self.writable && target > end) {
            return Err(IoError::with_detail(
                IoErrorCode::SeekFailed,
                "MemoryFS: seek out of range",
                format!("target={target} end={end}"),
            ));
        }

        self.pos = target as u64;
        self.eof = false;
        Ok(self.pos)
    }

    fn size(&self) -> IoResult<u64> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryFS: size on closed stream",
            ));
        }
        Ok(self.buf.len() as u64)
    }

    fn flush(&mut self) -> IoResult<()> {
        if !self.open {
            return Err(IoError::new(
                IoErrorCode::NotSupported,
                "MemoryFS: flush on closed stream",
            ));
        }
        self.commit();
        Ok(())
    }

    fn close(&mut self) -> IoResult<()> {
        if self.open {
            self.commit();
            self.open = false;
        }
        self.eof = false;
        Ok(())
    }
}

impl Drop for MemoryFileStream {
    fn drop(&mut self) {
        if self.open {
            self.commit();
        }
    }
}
