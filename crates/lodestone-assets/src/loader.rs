//! Loader contract and the type-keyed registry.

use ahash::AHashMap;

use crate::any::AnyAsset;
use crate::error::AssetResult;
use crate::id::{AssetId, AssetType};

/// Context handed to a loader alongside the raw bytes.
#[derive(Debug, Clone, Default)]
pub struct LoadContext {
    pub id: AssetId,
    pub asset_type: AssetType,
    /// Backing-store path, resolved by the catalog. For error messages and
    /// loaders that care about the file name.
    pub resolved_path: String,
    pub now_frame: u64,
}

/// Turns raw bytes into a typed, type-erased payload.
pub trait AssetLoader: Send + Sync {
    /// The [`AssetType`] this loader serves.
    fn asset_type(&self) -> AssetType;

    fn load(&self, bytes: &[u8], ctx: &LoadContext) -> AssetResult<AnyAsset>;

    /// Decoded in-memory size of a payload this loader produced, when it can
    /// tell. Feeds statistics only.
    fn decoded_size(&self, _asset: &AnyAsset) -> u64 {
        0
    }
}

/// Unique loader per asset type. A missing type surfaces as `NoLoader` at
/// the pipeline level.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: AHashMap<AssetType, Box<dyn AssetLoader>>,
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and keeps the existing loader) when the type is
    /// already registered.
    pub fn register(&mut self, loader: Box<dyn AssetLoader>) -> bool {
        let asset_type = loader.asset_type();
        if self.loaders.contains_key(&asset_type) {
            tracing::warn!(%asset_type, "loader already registered for type, ignoring");
            return false;
        }
        tracing::debug!(%asset_type, "registered asset loader");
        self.loaders.insert(asset_type, loader);
        true
    }

    pub fn find(&self, asset_type: &AssetType) -> Option<&dyn AssetLoader> {
        self.loaders.get(asset_type).map(|l| &**l)
    }

    pub fn contains(&self, asset_type: &AssetType) -> bool {
        self.loaders.contains_key(asset_type)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}
