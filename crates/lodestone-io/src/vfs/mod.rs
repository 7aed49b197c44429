//! Overlay virtual filesystem.
//!
//! Requests carry a logical scheme (`asset://...`); the mount table routes
//! them to backends by that scheme. Reads overlay: candidates are tried in
//! priority order and the first hit wins. Writes are funneled to the first
//! writable candidate.

use std::sync::Arc;

use ahash::AHashSet;

use crate::error::{IoError, IoErrorCode, IoResult};
use crate::fs::{DirectoryEntry, DirectoryIter, FileInfo, FileSystem, ListOptions, RemoveOptions};
use crate::path::Uri;
use crate::stream::{FileOpenMode, Stream};

/// One mount: a logical scheme bound to a backend rooted at `root_uri`.
#[derive(Clone)]
pub struct MountPoint {
    /// Identifier, e.g. "assets_main", "assets_mod".
    pub name: String,
    /// Higher wins in the overlay.
    pub priority: i32,
    pub read_only: bool,

    /// Logical scheme to route, e.g. `asset://`.
    pub mount_uri: Uri,
    /// Base URI handed to the backend, e.g. `mem://pack0`.
    pub root_uri: Uri,

    pub fs: Arc<dyn FileSystem>,

    /// Preferred target when several writable mounts tie on priority.
    pub prefer_write: bool,
}

impl MountPoint {
    pub fn new(
        name: impl Into<String>,
        mount_uri: &str,
        root_uri: &str,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            read_only: false,
            mount_uri: Uri::parse_loose(mount_uri),
            root_uri: Uri::parse_loose(root_uri),
            fs,
            prefer_write: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn prefer_write(mut self) -> Self {
        self.prefer_write = true;
        self
    }
}

/// A mount plus the backend-native URI a request resolved to.
pub struct ResolvedMount<'a> {
    pub mount: &'a MountPoint,
    pub native_uri: Uri,
}

/// Ordered mount set: priority desc, then prefer-write, then name.
#[derive(Default)]
pub struct MountTable {
    mounts: Vec<MountPoint>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&mut self, mp: MountPoint) -> IoResult<()> {
        if mp.name.is_empty() {
            return Err(IoError::new(
                IoErrorCode::InvalidPath,
                "MountTable: mount name is empty",
            ));
        }
        tracing::debug!(
            name = %mp.name,
            scheme = %mp.mount_uri.scheme_str(),
            root = %mp.root_uri,
            priority = mp.priority,
            "mounting"
        );
        self.mounts.push(mp);
        self.sort_by_priority();
        Ok(())
    }

    pub fn unmount(&mut self, name: &str) -> bool {
        let before = self.mounts.len();
        self.mounts.retain(|m| m.name != name);
        self.mounts.len() != before
    }

    pub fn clear(&mut self) {
        self.mounts.clear();
    }

    pub fn all(&self) -> &[MountPoint] {
        &self.mounts
    }

    /// Mounts whose scheme matches the request, in table order.
    pub fn candidates(&self, uri: &Uri) -> Vec<&MountPoint> {
        let scheme = uri.scheme_str();
        if scheme.is_empty() {
            return Vec::new();
        }
        self.mounts
            .iter()
            .filter(|m| m.mount_uri.scheme_str() == scheme)
            .collect()
    }

    /// Strip the request scheme, append the remainder under the mount root,
    /// and hand back the backend-native URI.
    pub fn resolve<'a>(&self, mount: &'a MountPoint, uri: &Uri) -> ResolvedMount<'a> {
        let rel = uri.path.as_str().trim_start_matches(['/', '\\']);

        let mut native = mount.root_uri.to_string();
        if !native.ends_with('/') {
            native.push('/');
        }
        native.push_str(rel);

        ResolvedMount {
            mount,
            native_uri: Uri::parse_loose(&native),
        }
    }

    fn sort_by_priority(&mut self) {
        self.mounts.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.prefer_write.cmp(&a.prefer_write))
                .then_with(|| a.name.cmp(&b.name))
        });
    }
}

/// The overlay router. Implements the same operation set as a backend, with
/// per-operation routing strategies.
#[derive(Default)]
pub struct Vfs {
    mounts: MountTable,
}

fn no_mount_error() -> IoError {
    IoError::new(IoErrorCode::NotFound, "Vfs: no mount for scheme")
}

impl Vfs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    pub fn mount(&mut self, mp: MountPoint) -> IoResult<()> {
        self.mounts.mount(mp)
    }

    pub fn unmount(&mut self, name: &str) -> bool {
        self.mounts.unmount(name)
    }

    /// Reads overlay top-down; NotFound falls through, anything else
    /// propagates. Writes go to the first writable mount; the fallback error
    /// is PermissionDenied.
    pub fn open(&self, uri: &Uri, mode: FileOpenMode) -> IoResult<Box<dyn Stream>> {
        if !mode.is_valid() {
            return Err(IoError::new(
                IoErrorCode::InvalidPath,
                "Vfs: invalid FileOpenMode",
            ));
        }

        let cands = self.mounts.candidates(uri);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        if mode.wants_write() {
            for mp in &cands {
                if mp.read_only {
                    continue;
                }
                let resolved = self.mounts.resolve(mp, uri);
                match mp.fs.open(&resolved.native_uri, mode) {
                    Ok(stream) => return Ok(stream),
                    // NotFound falls through so a lower mount can create it;
                    // PermissionDenied and friends stop the search.
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(e),
                }
            }
            Err(IoError::new(
                IoErrorCode::PermissionDenied,
                "Vfs: no writable mount found",
            ))
        } else {
            let mut last_not_found = IoError::new(IoErrorCode::NotFound, "Vfs: not found");
            for mp in &cands {
                let resolved = self.mounts.resolve(mp, uri);
                match mp.fs.open(&resolved.native_uri, mode) {
                    Ok(stream) => return Ok(stream),
                    Err(e) if e.is_not_found() => {
                        last_not_found = e;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(last_not_found)
        }
    }

    pub fn exists(&self, uri: &Uri) -> IoResult<bool> {
        let cands = self.mounts.candidates(uri);
        for mp in &cands {
            let resolved = self.mounts.resolve(mp, uri);
            match mp.fs.exists(&resolved.native_uri) {
                Ok(true) => return Ok(true),
                Ok(false) => continue,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    pub fn stat(&self, uri: &Uri) -> IoResult<FileInfo> {
        let cands = self.mounts.candidates(uri);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        let mut last_not_found = IoError::new(IoErrorCode::NotFound, "Vfs: not found");
        for mp in &cands {
            let resolved = self.mounts.resolve(mp, uri);
            match mp.fs.stat(&resolved.native_uri) {
                Ok(info) => return Ok(info),
                Err(e) if e.is_not_found() => {
                    last_not_found = e;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_not_found)
    }

    pub fn create_directories(&self, uri: &Uri) -> IoResult<()> {
        let cands = self.mounts.candidates(uri);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        for mp in &cands {
            if mp.read_only {
                continue;
            }
            let resolved = self.mounts.resolve(mp, uri);
            match mp.fs.create_directories(&resolved.native_uri) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(IoError::new(
            IoErrorCode::PermissionDenied,
            "Vfs: no writable mount found",
        ))
    }

    /// Removes from the mount where the entry is actually visible.
    pub fn remove(&self, uri: &Uri, opt: &RemoveOptions) -> IoResult<()> {
        let cands = self.mounts.candidates(uri);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        let mut last_not_found = IoError::new(IoErrorCode::NotFound, "Vfs: not found");
        for mp in &cands {
            if mp.read_only {
                continue;
            }
            let resolved = self.mounts.resolve(mp, uri);
            match mp.fs.stat(&resolved.native_uri) {
                Ok(_) => return mp.fs.remove(&resolved.native_uri, opt),
                Err(e) if e.is_not_found() => {
                    last_not_found = e;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_not_found)
    }

    /// Move within a single mount: the mount that can see `from` resolves
    /// `to` as well. Cross-mount moves come back as NotFound.
    pub fn rename(&self, from: &Uri, to: &Uri) -> IoResult<()> {
        let cands = self.mounts.candidates(from);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        for mp in &cands {
            if mp.read_only {
                continue;
            }
            let rfrom = self.mounts.resolve(mp, from);
            let rto = self.mounts.resolve(mp, to);
            match mp.fs.stat(&rfrom.native_uri) {
                Ok(_) => return mp.fs.rename(&rfrom.native_uri, &rto.native_uri),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(IoError::new(
            IoErrorCode::NotFound,
            "Vfs: source not found or no writable mount",
        ))
    }

    /// Same single-mount rule as [`Vfs::rename`].
    pub fn copy(&self, from: &Uri, to: &Uri) -> IoResult<()> {
        let cands = self.mounts.candidates(from);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        for mp in &cands {
            if mp.read_only {
                continue;
            }
            let rfrom = self.mounts.resolve(mp, from);
            let rto = self.mounts.resolve(mp, to);
            match mp.fs.stat(&rfrom.native_uri) {
                Ok(_) => return mp.fs.copy(&rfrom.native_uri, &rto.native_uri),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(IoError::new(
            IoErrorCode::NotFound,
            "Vfs: source not found or no writable mount",
        ))
    }

    /// Merge across all candidates; on a name collision the higher-priority
    /// mount wins. Any error other than NotFound aborts the merge - skipping
    /// a broken mount silently is a debugging trap.
    pub fn list(&self, uri: &Uri, opt: &ListOptions) -> IoResult<Vec<DirectoryEntry>> {
        let cands = self.mounts.candidates(uri);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        let mut out: Vec<DirectoryEntry> = Vec::with_capacity(64);
        let mut seen_names: AHashSet<String> = AHashSet::new();
        let mut any_ok = false;
        let mut last_err = IoError::new(IoErrorCode::NotFound, "Vfs: list failed");

        for mp in &cands {
            let resolved = self.mounts.resolve(mp, uri);
            match mp.fs.list(&resolved.native_uri, opt) {
                Ok(entries) => {
                    any_ok = true;
                    for e in entries {
                        if seen_names.insert(e.name.clone()) {
                            out.push(e);
                        }
                    }
                }
                Err(e) if e.is_not_found() => {
                    last_err = e;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        if !any_ok {
            return Err(last_err);
        }
        Ok(out)
    }

    /// Replayable in-memory sequence over [`Vfs::list`].
    pub fn iterate(&self, uri: &Uri, opt: &ListOptions) -> IoResult<DirectoryIter> {
        Ok(DirectoryIter::new(self.list(uri, opt)?))
    }

    /// Native path from the first candidate that can produce one.
    pub fn to_native_path(&self, uri: &Uri) -> IoResult<String> {
        let cands = self.mounts.candidates(uri);
        if cands.is_empty() {
            return Err(no_mount_error());
        }

        let mut last_not_found = IoError::new(IoErrorCode::NotFound, "Vfs: not found");
        for mp in &cands {
            let resolved = self.mounts.resolve(mp, uri);
            match mp.fs.to_native_path(&resolved.native_uri) {
                Ok(p) => return Ok(p),
                Err(e) if e.is_not_found() => {
                    last_not_found = e;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::stream::StreamReader;

    fn read_all(vfs: &Vfs, uri: &str) -> Vec<u8> {
        let mut s = vfs
            .open(&Uri::parse_loose(uri), FileOpenMode::read_binary())
            .unwrap();
        StreamReader::new(&mut *s).read_all_bytes(0).unwrap()
    }

    fn overlay() -> (Vfs, MemoryFileSystem, MemoryFileSystem) {
        let fs_a = MemoryFileSystem::new();
        fs_a.insert("pack_a/ui/x.txt", b"A".to_vec());

        let fs_b = MemoryFileSystem::new();
        fs_b.insert("pack_b/ui/x.txt", b"B".to_vec());
        fs_b.insert("pack_b/ui/y.txt", b"Y".to_vec());

        let mut vfs = Vfs::new();
        vfs.mount(
            MountPoint::new("a", "asset://", "mem://pack_a", Arc::new(fs_a.clone()))
                .with_priority(10),
        )
        .unwrap();
        vfs.mount(
            MountPoint::new("b", "asset://", "mem://pack_b", Arc::new(fs_b.clone()))
                .with_priority(1),
        )
        .unwrap();
        (vfs, fs_a, fs_b)
    }

    #[test]
    fn mount_rejects_empty_name() {
        let mut vfs = Vfs::new();
        let err = vfs
            .mount(MountPoint::new(
                "",
                "asset://",
                "mem://r",
                Arc::new(MemoryFileSystem::new()),
            ))
            .unwrap_err();
        assert_eq!(err.code, IoErrorCode::InvalidPath);
    }

    #[test]
    fn candidates_are_priority_ordered() {
        let (vfs, _, _) = overlay();
        let cands = vfs
            .mounts()
            .candidates(&Uri::parse_loose("asset://ui/x.txt"));
        let names: Vec<&str> = cands.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn same_priority_orders_prefer_write_then_name() {
        let fs = Arc::new(MemoryFileSystem::new());
        let mut table = MountTable::new();
        table
            .mount(MountPoint::new("zeta", "asset://", "mem://z", fs.clone()))
            .unwrap();
        table
            .mount(MountPoint::new("alpha", "asset://", "mem://a", fs.clone()))
            .unwrap();
        table
            .mount(MountPoint::new("writer", "asset://", "mem://w", fs).prefer_write())
            .unwrap();

        let names: Vec<&str> = table.all().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["writer", "alpha", "zeta"]);
    }

    #[test]
    fn read_overlay_first_hit_wins() {
        let (vfs, _, _) = overlay();
        assert_eq!(read_all(&vfs, "asset://ui/x.txt"), b"A");
        assert_eq!(read_all(&vfs, "asset://ui/y.txt"), b"Y");
    }

    #[test]
    fn read_missing_everywhere_is_not_found() {
        let (vfs, _, _) = overlay();
        let err = vfs
            .open(
                &Uri::parse_loose("asset://ui/z.txt"),
                FileOpenMode::read_binary(),
            )
            .unwrap_err();
        assert_eq!(err.code, IoErrorCode::NotFound);
    }

    #[test]
    fn unknown_scheme_has_no_mount() {
        let (vfs, _, _) = overlay();
        let err = vfs
            .open(
                &Uri::parse_loose("user://save.dat"),
                FileOpenMode::read_binary(),
            )
            .unwrap_err();
        assert_eq!(err.code, IoErrorCode::NotFound);
    }

    #[test]
    fn list_merges_with_priority_winner() {
        let (vfs, _, _) = overlay();
        let entries = vfs
            .list(&Uri::parse_loose("asset://ui"), &ListOptions::default())
            .unwrap();
        let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["x.txt", "y.txt"]);

        // x.txt must come from mount a (priority 10)
        let x = entries.iter().find(|e| e.name == "x.txt").unwrap();
        assert!(x.path.contains("pack_a"), "path={}", x.path);
    }

    #[test]
    fn iterate_replays_list() {
        let (vfs, _, _) = overlay();
        let names: Vec<String> = vfs
            .iterate(&Uri::parse_loose("asset://ui"), &ListOptions::default())
            .unwrap()
            .map(|e| e.name)
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn write_selects_first_writable_mount() {
        let fs_ro = MemoryFileSystem::new();
        fs_ro.insert("ro/keep.txt", b"ro".to_vec());
        let fs_rw = MemoryFileSystem::new();

        let mut vfs = Vfs::new();
        vfs.mount(
            MountPoint::new("ro", "asset://", "mem://ro", Arc::new(fs_ro))
                .with_priority(10)
                .read_only(),
        )
        .unwrap();
        vfs.mount(MountPoint::new("rw", "asset://", "mem://rw", Arc::new(fs_rw.clone()))).unwrap();

        {
            let mut s = vfs
                .open(
                    &Uri::parse_loose("asset://save/slot0.bin"),
                    FileOpenMode::write_binary_truncate(true),
                )
                .unwrap();
            s.write(b"state").unwrap();
            s.close().unwrap();
        }
        assert_eq!(fs_rw.read("rw/save/slot0.bin").unwrap(), b"state");
    }

    #[test]
    fn write_with_only_read_only_mounts_is_permission_denied() {
        let fs = MemoryFileSystem::new();
        let mut vfs = Vfs::new();
        vfs.mount(MountPoint::new("ro", "asset://", "mem://r", Arc::new(fs)).read_only())
            .unwrap();

        let err = vfs
            .open(
                &Uri::parse_loose("asset://a.bin"),
                FileOpenMode::write_binary_truncate(true),
            )
            .unwrap_err();
        assert_eq!(err.code, IoErrorCode::PermissionDenied);
    }

    #[test]
    fn exists_and_stat_overlay() {
        let (vfs, _, _) = overlay();
        assert!(vfs.exists(&Uri::parse_loose("asset://ui/x.txt")).unwrap());
        assert!(!vfs.exists(&Uri::parse_loose("asset://ui/z.txt")).unwrap());

        let info = vfs.stat(&Uri::parse_loose("asset://ui/y.txt")).unwrap();
        assert_eq!(info.size_bytes, 1);
    }

    #[test]
    fn remove_targets_visible_mount() {
        let (vfs, fs_a, fs_b) = overlay();
        vfs.remove(
            &Uri::parse_loose("asset://ui/x.txt"),
            &RemoveOptions::default(),
        )
        .unwrap();
        // Removed from the higher-priority mount; B's copy shows through now.
        assert!(!fs_a.contains("pack_a/ui/x.txt"));
        assert!(fs_b.contains("pack_b/ui/x.txt"));
        assert_eq!(read_all(&vfs, "asset://ui/x.txt"), b"B");
    }

    #[test]
    fn rename_stays_within_one_mount() {
        let (vfs, fs_b, _) = {
            let (v, _a, b) = overlay();
            (v, b, ())
        };
        vfs.rename(
            &Uri::parse_loose("asset://ui/y.txt"),
            &Uri::parse_loose("asset://ui/y2.txt"),
        )
        .unwrap();
        assert!(fs_b.contains("pack_b/ui/y2.txt"));
        assert!(!fs_b.contains("pack_b/ui/y.txt"));
    }

    #[test]
    fn copy_within_mount() {
        let (vfs, _, fs_b) = overlay();
        vfs.copy(
            &Uri::parse_loose("asset://ui/y.txt"),
            &Uri::parse_loose("asset://ui/y_copy.txt"),
        )
        .unwrap();
        assert!(fs_b.contains("pack_b/ui/y_copy.txt"));
    }

    #[test]
    fn unmount_removes_candidates() {
        let (mut vfs, _, _) = overlay();
        assert!(vfs.unmount("a"));
        assert_eq!(read_all(&vfs, "asset://ui/x.txt"), b"B");
        assert!(!vfs.unmount("a"));
    }
}
