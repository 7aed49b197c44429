//! Record storage: id -> boxed, address-stable record.

use ahash::AHashMap;

use crate::any::AnyAsset;
use crate::error::AssetError;
use crate::id::{AssetId, AssetType};

/// Lifecycle state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl AssetState {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetState::Unloaded => "Unloaded",
            AssetState::Loading => "Loading",
            AssetState::Ready => "Ready",
            AssetState::Failed => "Failed",
        }
    }
}

/// The storage entry for one asset id.
///
/// Lives in a `Box` so its address survives index rehashes; a reference
/// obtained from [`AssetStorage::get_or_create`] stays valid for the single
/// operation that requested it.
#[derive(Debug, Default)]
pub struct AssetRecord {
    pub id: AssetId,
    pub asset_type: AssetType,
    pub resolved_path: String,

    pub state: AssetState,
    pub payload: AnyAsset,
    pub error: Option<AssetError>,

    pub ref_count: u32,
    /// Bumped on every successful (re)load; 0 is never a live generation.
    pub generation: u32,
}

/// Owner of all records.
#[derive(Debug, Default)]
pub struct AssetStorage {
    records: AHashMap<AssetId, Box<AssetRecord>>,
}

impl AssetStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.records.get(id).map(|r| &**r)
    }

    pub fn find_mut(&mut self, id: &AssetId) -> Option<&mut AssetRecord> {
        self.records.get_mut(id).map(|r| &mut **r)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.records.contains_key(id)
    }

    /// Create on first reference; type and path are fixed at creation and
    /// later calls return the existing record unchanged.
    pub fn get_or_create(
        &mut self,
        id: &AssetId,
        asset_type: &AssetType,
        resolved_path: &str,
    ) -> &mut AssetRecord {
        self.records
            .entry(id.clone())
            .or_insert_with(|| {
                Box::new(AssetRecord {
                    id: id.clone(),
                    asset_type: asset_type.clone(),
                    resolved_path: resolved_path.to_string(),
                    state: AssetState::Unloaded,
                    ..Default::default()
                })
            })
    }

    /// Fill in the path when the record predates its catalog entry.
    pub fn set_resolved_path_if_empty(&mut self, id: &AssetId, resolved_path: &str) {
        if let Some(rec) = self.find_mut(id)
            && rec.resolved_path.is_empty()
        {
            rec.resolved_path = resolved_path.to_string();
        }
    }

    pub fn add_ref(&mut self, id: &AssetId) {
        if let Some(rec) = self.find_mut(id) {
            rec.ref_count = rec.ref_count.saturating_add(1);
        }
    }

    /// Clamped at zero.
    pub fn release_ref(&mut self, id: &AssetId) {
        if let Some(rec) = self.find_mut(id) {
            rec.ref_count = rec.ref_count.saturating_sub(1);
        }
    }

    /// Reference count alone; pin and TTL policy live with the manager.
    pub fn can_evict(&self, id: &AssetId) -> bool {
        self.find(id).is_some_and(|rec| rec.ref_count == 0)
    }

    /// Remove when unreferenced, or unconditionally with `force`.
    pub fn erase_if(&mut self, id: &AssetId, force: bool) -> bool {
        let Some(rec) = self.records.get(id) else {
            return false;
        };
        if force || rec.ref_count == 0 {
            self.records.remove(id);
            return true;
        }
        false
    }

    pub fn ids(&self) -> Vec<AssetId> {
        self.records.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values().map(|r| &**r)
    }
}
