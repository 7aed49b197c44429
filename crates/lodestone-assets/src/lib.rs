//! Lodestone Assets - the runtime asset subsystem.
//!
//! A declarative catalog (id -> type -> path) plus pluggable loaders become
//! a typed, cached, hot-reloadable store of in-memory resources served by
//! generation-checked handles:
//!
//! - [`id::AssetId`] / [`id::AssetType`]: stable hashed identity with the
//!   authored strings kept for diagnostics.
//! - [`catalog::AssetCatalog`]: parsed and validated registry; duplicate ids
//!   fail the load.
//! - [`resolver::AssetPathResolver`]: catalog-relative paths to
//!   backing-store paths, with traversal and escape-root protection.
//! - [`storage::AssetStorage`]: address-stable records with state, refcount,
//!   and generation.
//! - [`loader::LoaderRegistry`] + [`pipeline::AssetPipeline`]: bytes to
//!   typed payloads, dispatched by type tag.
//! - [`policy::AssetCachePolicy`] / [`lifetime::AssetLifetime`] /
//!   [`stats::AssetStatistics`]: TTL, pinning, budgets, and counters.
//! - [`watcher::AssetWatcher`]: poll-based change detection with debounce.
//! - [`manager::AssetManager`]: the composition gameplay code talks to.
//!
//! # Quick start
//!
//! ```no_run
//! use lodestone_assets::prelude::*;
//!
//! let mut manager = AssetManager::new(Box::new(DiskSource::new()));
//! manager.register_builtin_loaders();
//! manager
//!     .load_catalog_from_str(
//!         r#"{"assets":[{"id":"ui.title","type":"text","path":"ui/title.txt"}]}"#,
//!         "catalog.json",
//!     )
//!     .unwrap();
//!
//! let id = AssetId::from_name("ui.title");
//! let handle = manager.acquire(&id, &AssetRequest::default()).unwrap();
//! if let Some(text) = manager.get::<TextAsset>(&handle) {
//!     println!("{}", text.text);
//! }
//! ```

pub mod any;
pub mod catalog;
pub mod error;
pub mod handle;
pub mod hash;
pub mod id;
pub mod lifetime;
pub mod loader;
pub mod loaders;
pub mod manager;
pub mod pipeline;
pub mod policy;
pub mod request;
pub mod resolver;
pub mod stats;
pub mod storage;
pub mod watcher;

pub use any::AnyAsset;
pub use catalog::{AssetCatalog, CatalogEntry, CatalogParser, RawCatalogEntry};
pub use error::{AssetError, AssetErrorCode, AssetResult};
pub use handle::AssetHandle;
pub use id::{AssetId, AssetType};
pub use lifetime::AssetLifetime;
pub use loader::{AssetLoader, LoadContext, LoaderRegistry};
pub use loaders::{
    register_builtin_loaders, BinaryAsset, BinaryLoader, FontAsset, FontLoader, TextAsset,
    TextLoader, TextureAsset, TextureLoader,
};
pub use manager::{AssetManager, AssetManagerOptions};
pub use pipeline::{AssetPipeline, AssetSource, DiskSource, PipelineOptions, VfsSource};
pub use policy::{AssetCachePolicy, CacheMode, CachePolicyOptions};
pub use request::{AssetRequest, LoadFallback, LoadMode, LoadSync};
pub use resolver::{AssetPathResolver, ResolverOptions};
pub use stats::AssetStatistics;
pub use storage::{AssetRecord, AssetState, AssetStorage};
pub use watcher::{AssetChange, AssetChangeKind, AssetWatcher, WatcherOptions};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::any::AnyAsset;
    pub use crate::error::{AssetError, AssetErrorCode, AssetResult};
    pub use crate::handle::AssetHandle;
    pub use crate::id::{AssetId, AssetType};
    pub use crate::loader::{AssetLoader, LoadContext};
    pub use crate::loaders::{BinaryAsset, FontAsset, TextAsset, TextureAsset};
    pub use crate::manager::{AssetManager, AssetManagerOptions};
    pub use crate::pipeline::{AssetSource, DiskSource, VfsSource};
    pub use crate::policy::{CacheMode, CachePolicyOptions};
    pub use crate::request::{AssetRequest, LoadFallback, LoadMode};
    pub use crate::storage::AssetState;
    pub use crate::watcher::{AssetChange, AssetChangeKind, WatcherOptions};
}
