//! Filesystem backend abstraction.
//!
//! [`FileSystem`] is the contract a backing store implements; policy (asset
//! root constraints, path normalization) lives above it in the resolver and
//! VFS. Backends declare what they can do via [`FileSystemCapabilities`]
//! instead of being downcast.

mod memory;

pub use memory::MemoryFileSystem;

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::path::Uri;
use crate::stream::{FileOpenMode, Stream};

/// File kind, with OS differences absorbed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// Does not exist.
    #[default]
    None,
    Regular,
    Directory,
    Symlink,
    Other,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::None => "None",
            FileType::Regular => "Regular",
            FileType::Directory => "Directory",
            FileType::Symlink => "Symlink",
            FileType::Other => "Other",
        }
    }
}

/// Stat result. Times are ns since the UNIX epoch, 0 when unavailable.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    pub file_type: FileType,

    /// Meaningful for regular files only.
    pub size_bytes: u64,

    pub mtime_ns: i64,
    pub ctime_ns: i64,
    pub atime_ns: i64,

    /// UNIX-style permission bits, 0 when the backend has none.
    pub permissions: u32,

    /// Which backend produced this ("memory", "file", "pak", ...).
    pub backend: String,
}

impl FileInfo {
    pub fn exists(&self) -> bool {
        self.file_type != FileType::None
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::Regular
    }

    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// One row of a directory listing. `path` is a URI string so overlay
/// listings stay addressable.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    pub path: String,
    pub name: String,
    pub file_type: FileType,

    /// Filled only when the listing was asked to stat (`include_info`).
    pub info: Option<FileInfo>,
}

impl DirectoryEntry {
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::Regular
    }

    pub fn is_directory(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub recursive: bool,
    pub include_files: bool,
    pub include_directories: bool,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    /// Stat every entry while listing. Off by default; it is not free.
    pub include_info: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            include_files: true,
            include_directories: true,
            include_hidden: false,
            follow_symlinks: false,
            include_info: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Allow removing non-empty directories.
    pub recursive: bool,
}

/// What a backend can do, declared up front.
#[derive(Debug, Clone, Copy)]
pub struct FileSystemCapabilities {
    pub can_open_read: bool,
    pub can_open_write: bool,
    pub can_list: bool,
    pub can_iterate: bool,
    pub can_stat: bool,

    pub can_create_directories: bool,
    pub can_remove: bool,
    pub can_remove_recursive: bool,
    pub can_move: bool,
    pub can_copy: bool,

    pub supports_symlink: bool,
    pub supports_permissions: bool,
    pub supports_hidden_flag: bool,
    pub case_sensitive_paths: bool,
    pub supports_to_native_path: bool,

    pub supports_mtime: bool,
    pub supports_ctime: bool,
    pub supports_atime: bool,

    pub supports_watch: bool,
    pub supports_recursive_watch: bool,

    /// 0 = unknown.
    pub max_path_bytes: u32,
    pub max_name_bytes: u32,
}

impl Default for FileSystemCapabilities {
    fn default() -> Self {
        Self {
            can_open_read: true,
            can_open_write: true,
            can_list: true,
            can_iterate: false,
            can_stat: true,
            can_create_directories: true,
            can_remove: true,
            can_remove_recursive: true,
            can_move: true,
            can_copy: true,
            supports_symlink: false,
            supports_permissions: false,
            supports_hidden_flag: false,
            case_sensitive_paths: false,
            supports_to_native_path: false,
            supports_mtime: true,
            supports_ctime: false,
            supports_atime: false,
            supports_watch: false,
            supports_recursive_watch: false,
            max_path_bytes: 0,
            max_name_bytes: 0,
        }
    }
}

/// Replayable in-memory directory sequence.
pub struct DirectoryIter {
    entries: std::vec::IntoIter<DirectoryEntry>,
}

impl DirectoryIter {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for DirectoryIter {
    type Item = DirectoryEntry;

    fn next(&mut self) -> Option<DirectoryEntry> {
        self.entries.next()
    }
}

/// Change kinds a backend watcher can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileChangeKind {
    #[default]
    Unknown,
    Created,
    Modified,
    Removed,
    Renamed,
}

#[derive(Debug, Clone, Default)]
pub struct FileChangeEvent {
    pub kind: FileChangeKind,
    pub path: Uri,
    /// Valid only for `Renamed`.
    pub old_path: Option<Uri>,
    pub backend: String,
}

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub recursive: bool,
    pub watch_files: bool,
    pub watch_directories: bool,
    /// Coalesce bursts of near-simultaneous events when the backend can.
    pub coalesce: bool,
    /// 0 = disabled.
    pub debounce_ms: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            watch_files: true,
            watch_directories: true,
            coalesce: true,
            debounce_ms: 50,
        }
    }
}

pub type WatchId = u64;

/// Optional backend-native change watching. Most backends do not provide
/// one; the asset layer's own watcher polls instead.
pub trait FileWatcher {
    fn name(&self) -> &'static str;

    fn is_open(&self) -> bool;

    fn add_watch(&mut self, uri: &Uri, opt: &WatchOptions) -> IoResult<WatchId>;

    fn remove_watch(&mut self, id: WatchId) -> IoResult<()>;

    /// Non-blocking; appends up to `max_events` events.
    fn poll(&mut self, out: &mut Vec<FileChangeEvent>, max_events: usize) -> IoResult<usize>;

    fn close(&mut self) -> IoResult<()>;
}

impl std::fmt::Debug for dyn FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn FileWatcher")
            .field("name", &self.name())
            .field("is_open", &self.is_open())
            .finish()
    }
}

/// Backend contract. All operations take the backend-native URI the VFS
/// resolved for this mount.
pub trait FileSystem: Send + Sync {
    /// Backend name, e.g. "MemoryFS".
    fn name(&self) -> &'static str;

    fn open(&self, uri: &Uri, mode: FileOpenMode) -> IoResult<Box<dyn Stream>>;

    fn exists(&self, uri: &Uri) -> IoResult<bool>;

    /// Missing entries are an `Err(NotFound)`, not a `FileType::None` info.
    fn stat(&self, uri: &Uri) -> IoResult<FileInfo>;

    /// mkdir -p.
    fn create_directories(&self, uri: &Uri) -> IoResult<()>;

    fn remove(&self, uri: &Uri, opt: &RemoveOptions) -> IoResult<()>;

    /// Move/rename within this backend.
    fn rename(&self, from: &Uri, to: &Uri) -> IoResult<()>;

    fn copy(&self, from: &Uri, to: &Uri) -> IoResult<()>;

    fn list(&self, uri: &Uri, opt: &ListOptions) -> IoResult<Vec<DirectoryEntry>>;

    fn iterate(&self, uri: &Uri, opt: &ListOptions) -> IoResult<DirectoryIter> {
        Ok(DirectoryIter::new(self.list(uri, opt)?))
    }

    /// Backend-native path string, when the backend has one.
    fn to_native_path(&self, uri: &Uri) -> IoResult<String>;

    fn capabilities(&self) -> FileSystemCapabilities;

    fn create_watcher(&self) -> IoResult<Box<dyn FileWatcher>> {
        Err(IoError::new(
            IoErrorCode::NotSupported,
            "backend does not provide a watcher",
        ))
    }
}
