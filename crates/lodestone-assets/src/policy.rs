//! Cache policy: pure eviction rules, no storage traversal.

use crate::lifetime::AssetLifetime;
use crate::storage::{AssetRecord, AssetState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Never evict. Development default for small projects.
    KeepForever,
    /// Evictable once unreferenced (TTL still applies via lifetime).
    #[default]
    KeepWhileReferenced,
    /// Evict when the configured caps are exceeded; selection is the
    /// manager's job.
    Budgeted,
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicyOptions {
    pub mode: CacheMode,

    /// Frames an unreferenced record survives after its last access.
    /// 0 = evictable immediately.
    pub keep_alive_frames: u64,

    /// Keep Failed records so every frame does not retry a broken file.
    pub keep_failed_records: bool,

    /// Budgeted mode: record-count cap, 0 = unlimited.
    pub max_assets: u32,
    /// Budgeted mode: resident source-byte cap, 0 = unlimited.
    pub max_bytes_read: u64,
}

impl Default for CachePolicyOptions {
    fn default() -> Self {
        Self {
            mode: CacheMode::KeepWhileReferenced,
            keep_alive_frames: 0,
            keep_failed_records: true,
            max_assets: 0,
            max_bytes_read: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct AssetCachePolicy {
    opt: CachePolicyOptions,
}

impl AssetCachePolicy {
    pub fn new(opt: CachePolicyOptions) -> Self {
        Self { opt }
    }

    pub fn options(&self) -> &CachePolicyOptions {
        &self.opt
    }

    pub fn set_options(&mut self, opt: CachePolicyOptions) {
        self.opt = opt;
    }

    /// May this record be evicted right now?
    pub fn is_evictable(
        &self,
        record: &AssetRecord,
        lifetime: &AssetLifetime,
        now_frame: u64,
    ) -> bool {
        self.is_evictable_with_ttl(record, lifetime, now_frame, self.opt.keep_alive_frames)
    }

    /// Same check with a per-record TTL (request override path).
    pub fn is_evictable_with_ttl(
        &self,
        record: &AssetRecord,
        lifetime: &AssetLifetime,
        now_frame: u64,
        keep_alive_frames: u64,
    ) -> bool {
        // A record mid-load is never touched.
        if record.state == AssetState::Loading {
            return false;
        }
        if self.opt.mode == CacheMode::KeepForever {
            return false;
        }
        if record.state == AssetState::Failed && self.opt.keep_failed_records {
            return false;
        }
        lifetime.can_evict(&record.id, now_frame, record.ref_count, keep_alive_frames)
    }

    /// Budgeted mode only: is any cap currently exceeded?
    pub fn should_trim(&self, current_asset_count: u32, current_resident_bytes: u64) -> bool {
        if self.opt.mode != CacheMode::Budgeted {
            return false;
        }
        if self.opt.max_assets != 0 && current_asset_count > self.opt.max_assets {
            return true;
        }
        if self.opt.max_bytes_read != 0 && current_resident_bytes > self.opt.max_bytes_read {
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{AssetId, AssetType};

    fn record(state: AssetState, ref_count: u32) -> AssetRecord {
        AssetRecord {
            id: AssetId::from_name("a"),
            asset_type: AssetType::text(),
            state,
            ref_count,
            ..Default::default()
        }
    }

    fn lifetime_touched_at(frame: u64) -> AssetLifetime {
        let mut lt = AssetLifetime::new();
        lt.touch(&AssetId::from_name("a"), frame);
        lt
    }

    #[test]
    fn loading_records_are_untouchable() {
        let policy = AssetCachePolicy::new(CachePolicyOptions::default());
        let rec = record(AssetState::Loading, 0);
        assert!(!policy.is_evictable(&rec, &lifetime_touched_at(0), 1000));
    }

    #[test]
    fn keep_forever_never_evicts() {
        let policy = AssetCachePolicy::new(CachePolicyOptions {
            mode: CacheMode::KeepForever,
            ..Default::default()
        });
        let rec = record(AssetState::Ready, 0);
        assert!(!policy.is_evictable(&rec, &lifetime_touched_at(0), u64::MAX));
    }

    #[test]
    fn failed_records_survive_when_kept() {
        let opts = CachePolicyOptions::default();
        assert!(opts.keep_failed_records);
        let policy = AssetCachePolicy::new(opts);
        let rec = record(AssetState::Failed, 0);
        assert!(!policy.is_evictable(&rec, &lifetime_touched_at(0), 1000));

        let policy = AssetCachePolicy::new(CachePolicyOptions {
            keep_failed_records: false,
            ..Default::default()
        });
        assert!(policy.is_evictable(&rec, &lifetime_touched_at(0), 1000));
    }

    #[test]
    fn ttl_defers_to_lifetime() {
        let policy = AssetCachePolicy::new(CachePolicyOptions {
            keep_alive_frames: 10,
            ..Default::default()
        });
        let rec = record(AssetState::Ready, 0);
        let lt = lifetime_touched_at(100);
        assert!(!policy.is_evictable(&rec, &lt, 105));
        assert!(policy.is_evictable(&rec, &lt, 110));
    }

    #[test]
    fn should_trim_only_in_budgeted_mode() {
        let policy = AssetCachePolicy::new(CachePolicyOptions {
            max_assets: 10,
            ..Default::default()
        });
        assert!(!policy.should_trim(100, 0));

        let policy = AssetCachePolicy::new(CachePolicyOptions {
            mode: CacheMode::Budgeted,
            max_assets: 10,
            max_bytes_read: 1024,
            ..Default::default()
        });
        assert!(!policy.should_trim(10, 1024));
        assert!(policy.should_trim(11, 0));
        assert!(policy.should_trim(0, 2048));
    }
}
