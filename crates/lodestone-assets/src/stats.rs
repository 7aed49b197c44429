//! Event-driven counters for visibility into cache behavior. No logic of
//! its own; the manager and pipeline feed it.

use ahash::AHashMap;

use crate::id::{AssetId, AssetType};

#[derive(Debug, Clone, Copy, Default)]
pub struct StatCounters {
    pub catalog_lookups: u64,
    pub catalog_misses: u64,

    pub cache_hits: u64,
    pub cache_misses: u64,

    pub load_requests: u64,
    pub load_starts: u64,
    pub load_succeeded: u64,
    pub load_failed: u64,

    pub evictions: u64,
    pub reloads: u64,

    pub bytes_read_total: u64,
    pub bytes_decoded_total: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PerAssetStats {
    pub asset_type: AssetType,
    pub hits: u64,
    pub last_bytes_read: u64,
    pub last_decoded_bytes: u64,
    pub last_load_frame: u64,
    pub last_load_succeeded: bool,
}

#[derive(Debug, Default)]
pub struct AssetStatistics {
    counters: StatCounters,
    per_asset: AHashMap<AssetId, PerAssetStats>,
}

impl AssetStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.counters = StatCounters::default();
        self.per_asset.clear();
    }

    pub fn counters(&self) -> &StatCounters {
        &self.counters
    }

    pub fn find(&self, id: &AssetId) -> Option<&PerAssetStats> {
        self.per_asset.get(id)
    }

    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.counters.cache_hits + self.counters.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.counters.cache_hits as f64 / total as f64
    }

    // --- event hooks ---

    pub fn on_catalog_lookup(&mut self) {
        self.counters.catalog_lookups += 1;
    }

    pub fn on_catalog_miss(&mut self) {
        self.counters.catalog_misses += 1;
    }

    pub fn on_cache_hit(&mut self, id: &AssetId) {
        self.counters.cache_hits += 1;
        self.per_asset.entry(id.clone()).or_default().hits += 1;
    }

    pub fn on_cache_miss(&mut self) {
        self.counters.cache_misses += 1;
    }

    pub fn on_load_request(&mut self) {
        self.counters.load_requests += 1;
    }

    pub fn on_load_start(&mut self) {
        self.counters.load_starts += 1;
    }

    pub fn on_load_success(
        &mut self,
        id: &AssetId,
        asset_type: &AssetType,
        now_frame: u64,
        bytes_read: u64,
        decoded_bytes: u64,
    ) {
        self.counters.load_succeeded += 1;
        self.counters.bytes_read_total += bytes_read;
        self.counters.bytes_decoded_total += decoded_bytes;

        let p = self.per_asset.entry(id.clone()).or_default();
        p.asset_type = asset_type.clone();
        p.last_bytes_read = bytes_read;
        p.last_decoded_bytes = decoded_bytes;
        p.last_load_frame = now_frame;
        p.last_load_succeeded = true;
    }

    pub fn on_load_failure(&mut self, id: &AssetId, asset_type: &AssetType, now_frame: u64) {
        self.counters.load_failed += 1;

        let p = self.per_asset.entry(id.clone()).or_default();
        p.asset_type = asset_type.clone();
        p.last_load_frame = now_frame;
        p.last_load_succeeded = false;
    }

    /// Per-asset history is kept after eviction.
    pub fn on_evict(&mut self, _id: &AssetId) {
        self.counters.evictions += 1;
    }

    pub fn on_reload(&mut self, _id: &AssetId) {
        self.counters.reloads += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate() {
        let mut stats = AssetStatistics::new();
        assert_eq!(stats.cache_hit_rate(), 0.0);

        let id = AssetId::from_name("a");
        stats.on_cache_hit(&id);
        stats.on_cache_hit(&id);
        stats.on_cache_miss();
        stats.on_cache_miss();
        assert!((stats.cache_hit_rate() - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.find(&id).unwrap().hits, 2);
    }

    #[test]
    fn load_success_records_bytes() {
        let mut stats = AssetStatistics::new();
        let id = AssetId::from_name("tex");
        stats.on_load_request();
        stats.on_load_start();
        stats.on_load_success(&id, &AssetType::texture(), 7, 100, 400);

        let c = stats.counters();
        assert_eq!(c.load_requests, 1);
        assert_eq!(c.load_starts, 1);
        assert_eq!(c.load_succeeded, 1);
        assert_eq!(c.bytes_read_total, 100);
        assert_eq!(c.bytes_decoded_total, 400);

        let p = stats.find(&id).unwrap();
        assert_eq!(p.last_bytes_read, 100);
        assert_eq!(p.last_decoded_bytes, 400);
        assert_eq!(p.last_load_frame, 7);
        assert!(p.last_load_succeeded);
    }

    #[test]
    fn failure_flips_last_success() {
        let mut stats = AssetStatistics::new();
        let id = AssetId::from_name("a");
        stats.on_load_success(&id, &AssetType::text(), 1, 10, 10);
        stats.on_load_failure(&id, &AssetType::text(), 2);

        let p = stats.find(&id).unwrap();
        assert!(!p.last_load_succeeded);
        assert_eq!(p.last_load_frame, 2);
    }

    #[test]
    fn per_asset_history_survives_evict() {
        let mut stats = AssetStatistics::new();
        let id = AssetId::from_name("a");
        stats.on_load_success(&id, &AssetType::text(), 1, 10, 10);
        stats.on_evict(&id);
        assert_eq!(stats.counters().evictions, 1);
        assert!(stats.find(&id).is_some());
    }
}
