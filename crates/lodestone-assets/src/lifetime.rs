//! Per-asset lifetime metadata, kept outside the record so the record body
//! stays stable.

use ahash::AHashMap;

use crate::id::AssetId;

#[derive(Debug, Clone, Copy, Default)]
pub struct LifetimeInfo {
    pub last_access_frame: u64,
    pub last_loaded_frame: u64,
    pub pinned: bool,
}

/// Tracks access recency and pinning; the manager touches it on every
/// acquire and load.
#[derive(Debug, Default)]
pub struct AssetLifetime {
    infos: AHashMap<AssetId, LifetimeInfo>,
}

impl AssetLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.infos.clear();
    }

    pub fn has(&self, id: &AssetId) -> bool {
        self.infos.contains_key(id)
    }

    pub fn find(&self, id: &AssetId) -> Option<&LifetimeInfo> {
        self.infos.get(id)
    }

    pub fn touch(&mut self, id: &AssetId, now_frame: u64) {
        self.infos.entry(id.clone()).or_default().last_access_frame = now_frame;
    }

    pub fn on_loaded(&mut self, id: &AssetId, now_frame: u64) {
        let info = self.infos.entry(id.clone()).or_default();
        info.last_loaded_frame = now_frame;
        info.last_access_frame = now_frame;
    }

    pub fn on_evicted(&mut self, id: &AssetId) {
        self.infos.remove(id);
    }

    pub fn pin(&mut self, id: &AssetId) {
        self.infos.entry(id.clone()).or_default().pinned = true;
    }

    pub fn unpin(&mut self, id: &AssetId) {
        if let Some(info) = self.infos.get_mut(id) {
            info.pinned = false;
        }
    }

    pub fn is_pinned(&self, id: &AssetId) -> bool {
        self.infos.get(id).is_some_and(|i| i.pinned)
    }

    /// TTL check. `keep_alive_frames == 0` means no grace period; an id with
    /// no info counts as stale so it evicts readily.
    pub fn is_expired(&self, id: &AssetId, now_frame: u64, keep_alive_frames: u64) -> bool {
        if keep_alive_frames == 0 {
            return true;
        }
        let Some(info) = self.infos.get(id) else {
            return true;
        };
        let last = info.last_access_frame;
        if now_frame >= last {
            now_frame - last >= keep_alive_frames
        } else {
            true
        }
    }

    /// refcount + pin + TTL in one place.
    pub fn can_evict(
        &self,
        id: &AssetId,
        now_frame: u64,
        ref_count: u32,
        keep_alive_frames: u64,
    ) -> bool {
        if ref_count != 0 {
            return false;
        }
        if self.is_pinned(id) {
            return false;
        }
        self.is_expired(id, now_frame, keep_alive_frames)
    }
}
