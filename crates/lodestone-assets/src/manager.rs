//! The orchestrator gameplay code talks to.
//!
//! `AssetManager` composes catalog, resolver, storage, pipeline, cache
//! policy, lifetime, statistics, and the hot-reload watcher. Everything runs
//! on the owning thread; requests marked async are serviced synchronously
//! until a scheduler exists.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;

use crate::catalog::{AssetCatalog, CatalogParser};
use crate::error::{AssetError, AssetErrorCode, AssetResult};
use crate::handle::AssetHandle;
use crate::id::AssetId;
use crate::lifetime::AssetLifetime;
use crate::loader::{AssetLoader, LoadContext, LoaderRegistry};
use crate::loaders::register_builtin_loaders;
use crate::pipeline::{AssetPipeline, AssetSource, PipelineOptions};
use crate::policy::{AssetCachePolicy, CacheMode, CachePolicyOptions};
use crate::request::{AssetRequest, LoadFallback};
use crate::resolver::{AssetPathResolver, ResolverOptions};
use crate::stats::AssetStatistics;
use crate::storage::{AssetState, AssetStorage};
use crate::watcher::{AssetChange, AssetWatcher, WatcherOptions};

#[derive(Debug, Clone, Default)]
pub struct AssetManagerOptions {
    pub resolver: ResolverOptions,
    pub policy: CachePolicyOptions,
    pub watcher: WatcherOptions,
    pub pipeline: PipelineOptions,
}

pub struct AssetManager {
    parser: CatalogParser,
    resolver: AssetPathResolver,
    catalog: AssetCatalog,
    storage: AssetStorage,
    registry: LoaderRegistry,
    pipeline: AssetPipeline,
    policy: AssetCachePolicy,
    lifetime: AssetLifetime,
    stats: AssetStatistics,
    watcher: AssetWatcher,

    /// Per-id TTL overrides requested at acquire time.
    ttl_overrides: AHashMap<AssetId, u64>,

    now_frame: u64,
}

impl AssetManager {
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self::with_options(source, AssetManagerOptions::default())
    }

    pub fn with_options(source: Box<dyn AssetSource>, opt: AssetManagerOptions) -> Self {
        Self {
            parser: CatalogParser::new(),
            resolver: AssetPathResolver::new(opt.resolver),
            catalog: AssetCatalog::new(),
            storage: AssetStorage::new(),
            registry: LoaderRegistry::new(),
            pipeline: AssetPipeline::with_options(source, opt.pipeline),
            policy: AssetCachePolicy::new(opt.policy),
            lifetime: AssetLifetime::new(),
            stats: AssetStatistics::new(),
            watcher: AssetWatcher::new(opt.watcher),
            ttl_overrides: AHashMap::new(),
            now_frame: 0,
        }
    }

    // --- setup ---

    pub fn register_loader(&mut self, loader: Box<dyn AssetLoader>) -> bool {
        self.registry.register(loader)
    }

    /// Texture, font, text, and binary loaders in one call.
    pub fn register_builtin_loaders(&mut self) {
        register_builtin_loaders(&mut self.registry);
    }

    pub fn load_catalog_from_str(&mut self, text: &str, source_name: &str) -> AssetResult<()> {
        self.catalog
            .load_from_str(text, source_name, &self.parser, &self.resolver)
    }

    pub fn load_catalog_from_file(&mut self, path: impl AsRef<Path>) -> AssetResult<()> {
        self.catalog
            .load_from_file(path, &self.parser, &self.resolver)
    }

    // --- accessors ---

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn statistics(&self) -> &AssetStatistics {
        &self.stats
    }

    pub fn lifetime(&self) -> &AssetLifetime {
        &self.lifetime
    }

    pub fn policy_options(&self) -> &CachePolicyOptions {
        self.policy.options()
    }

    pub fn set_policy_options(&mut self, opt: CachePolicyOptions) {
        self.policy.set_options(opt);
    }

    pub fn resident_count(&self) -> usize {
        self.storage.len()
    }

    pub fn record_state(&self, id: &AssetId) -> Option<AssetState> {
        self.storage.find(id).map(|rec| rec.state)
    }

    pub fn now_frame(&self) -> u64 {
        self.now_frame
    }

    /// Advance the frame counter; call once per game tick.
    pub fn begin_frame(&mut self) -> u64 {
        self.now_frame += 1;
        self.now_frame
    }

    // --- the gameplay surface ---

    /// Resolve `id` through the catalog, load it if needed, and hand back a
    /// generation-checked handle. Each successful acquire takes one
    /// reference; pair it with [`AssetManager::release`].
    pub fn acquire(&mut self, id: &AssetId, request: &AssetRequest) -> AssetResult<AssetHandle> {
        self.stats.on_catalog_lookup();

        let (asset_type, resolved_path) = match self.catalog.find(id) {
            Some(entry) => {
                if let Some(expected) = &request.expected_type
                    && *expected != entry.asset_type
                {
                    return Err(AssetError::with_detail(
                        AssetErrorCode::TypeMismatch,
                        "requested type does not match catalog entry",
                        format!("id={id} expected={expected} catalog={}", entry.asset_type),
                    ));
                }
                let ty = entry.asset_type.clone();
                let path = entry.resolved_path.clone();
                (ty, path)
            }
            None => {
                self.stats.on_catalog_miss();
                match (&request.override_path, &request.expected_type) {
                    (Some(path), Some(ty)) if !path.is_empty() => {
                        (ty.clone(), self.resolver.resolve(path)?)
                    }
                    _ => {
                        return Err(AssetError::with_detail(
                            AssetErrorCode::InvalidCatalogEntry,
                            "asset id is not in the catalog",
                            id.to_string(),
                        ));
                    }
                }
            }
        };

        // A request may redirect a known id to another file.
        let resolved_path = match &request.override_path {
            Some(path) if !path.is_empty() => self.resolver.resolve(path)?,
            _ => resolved_path,
        };

        self.storage.get_or_create(id, &asset_type, &resolved_path);
        self.storage.set_resolved_path_if_empty(id, &resolved_path);

        if request.keep_alive_frames_override != 0 {
            self.ttl_overrides
                .insert(id.clone(), request.keep_alive_frames_override);
        }

        let now = self.now_frame;
        let (state, generation) = {
            let rec = self.storage.find(id).expect("record was just created");
            (rec.state, rec.generation)
        };

        if state == AssetState::Ready && !request.is_reload() {
            self.stats.on_cache_hit(id);
            self.lifetime.touch(id, now);
            self.storage.add_ref(id);
            if request.pin {
                self.lifetime.pin(id);
            }
            return Ok(AssetHandle::new(id.clone(), generation));
        }

        // A cached failure is not retried until a forced reload or eviction.
        if state == AssetState::Failed && !request.is_reload() {
            self.stats.on_cache_miss();
            let err = self
                .storage
                .find(id)
                .and_then(|rec| rec.error.clone())
                .unwrap_or_else(|| {
                    AssetError::new(AssetErrorCode::IoFailed, "asset previously failed to load")
                });
            return Err(err);
        }

        self.stats.on_cache_miss();
        self.stats.on_load_request();
        let is_reload = state == AssetState::Ready;

        if let Some(rec) = self.storage.find_mut(id) {
            rec.state = AssetState::Loading;
        }

        let ctx = LoadContext {
            id: id.clone(),
            asset_type: asset_type.clone(),
            resolved_path,
            now_frame: now,
        };

        match self.pipeline.load(&self.registry, &ctx, &mut self.stats) {
            Ok(output) => {
                let generation = {
                    let rec = self.storage.find_mut(id).expect("record exists");
                    rec.state = AssetState::Ready;
                    rec.payload = output.asset;
                    rec.error = None;
                    rec.generation = rec.generation.wrapping_add(1);
                    if rec.generation == 0 {
                        rec.generation = 1;
                    }
                    rec.generation
                };

                self.lifetime.on_loaded(id, now);
                self.storage.add_ref(id);
                if request.pin {
                    self.lifetime.pin(id);
                }
                if is_reload {
                    self.stats.on_reload(id);
                    tracing::info!(%id, "asset reloaded");
                }

                Ok(AssetHandle::new(id.clone(), generation))
            }
            Err(err) => {
                let keep_old = request.fallback == LoadFallback::KeepOldIfAny;
                let rec = self.storage.find_mut(id).expect("record exists");
                rec.state = AssetState::Failed;
                rec.error = Some(err.clone());
                if !keep_old {
                    rec.payload.reset();
                }
                Err(err)
            }
        }
    }

    /// Read back the payload. Stale generation or a type mismatch yields
    /// `None` without fault; a Failed record with a retained payload still
    /// serves it.
    pub fn get<T: Any + Send + Sync>(&self, handle: &AssetHandle) -> Option<Arc<T>> {
        if !handle.is_valid() {
            return None;
        }
        let rec = self.storage.find(handle.id())?;
        if rec.generation != handle.generation() {
            return None;
        }
        rec.payload.share_as::<T>()
    }

    /// The record's load error, when it is in the Failed state.
    pub fn error_of(&self, id: &AssetId) -> Option<&AssetError> {
        self.storage.find(id)?.error.as_ref()
    }

    /// Refresh access recency without touching anything else.
    pub fn touch(&mut self, handle: &AssetHandle) {
        if !handle.is_valid() {
            return;
        }
        let now = self.now_frame;
        if let Some(rec) = self.storage.find(handle.id())
            && rec.generation == handle.generation()
        {
            self.lifetime.touch(handle.id(), now);
        }
    }

    /// Drop one reference. Never evicts synchronously; [`AssetManager::trim`]
    /// does that.
    pub fn release(&mut self, handle: &AssetHandle) {
        if handle.is_valid() {
            self.storage.release_ref(handle.id());
        }
    }

    pub fn pin(&mut self, id: &AssetId) {
        self.lifetime.pin(id);
    }

    pub fn unpin(&mut self, id: &AssetId) {
        self.lifetime.unpin(id);
    }

    /// Evict what the policy allows. In Budgeted mode, evicts
    /// least-recently-used first until the caps are met.
    pub fn trim(&mut self, now_frame: u64) -> usize {
        match self.policy.options().mode {
            CacheMode::KeepForever => 0,
            CacheMode::KeepWhileReferenced => {
                let mut evicted = 0;
                for id in self.storage.ids() {
                    let evictable = {
                        let Some(rec) = self.storage.find(&id) else {
                            continue;
                        };
                        let ttl = self.effective_ttl(&id);
                        self.policy
                            .is_evictable_with_ttl(rec, &self.lifetime, now_frame, ttl)
                    };
                    if evictable {
                        self.evict(&id);
                        evicted += 1;
                    }
                }
                evicted
            }
            CacheMode::Budgeted => {
                let mut evicted = 0;
                loop {
                    let count = self.storage.len() as u32;
                    let resident = self.resident_bytes();
                    if !self.policy.should_trim(count, resident) {
                        break;
                    }

                    // LRU among the currently evictable records.
                    let mut candidates: Vec<(u64, AssetId)> = self
                        .storage
                        .iter()
                        .filter(|rec| {
                            let ttl = self.effective_ttl(&rec.id);
                            self.policy
                                .is_evictable_with_ttl(rec, &self.lifetime, now_frame, ttl)
                        })
                        .map(|rec| {
                            let last_access = self
                                .lifetime
                                .find(&rec.id)
                                .map(|i| i.last_access_frame)
                                .unwrap_or(0);
                            (last_access, rec.id.clone())
                        })
                        .collect();

                    if candidates.is_empty() {
                        break;
                    }
                    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
                    let (_, id) = candidates.swap_remove(0);
                    self.evict(&id);
                    evicted += 1;
                }
                evicted
            }
        }
    }

    /// Estimated resident source bytes, from per-asset statistics.
    pub fn resident_bytes(&self) -> u64 {
        self.storage
            .iter()
            .map(|rec| {
                self.stats
                    .find(&rec.id)
                    .map(|p| p.last_bytes_read)
                    .unwrap_or(0)
            })
            .sum()
    }

    // --- hot reload ---

    /// Register an id with the watcher, using the record's or catalog's
    /// resolved path.
    pub fn watch(&mut self, id: &AssetId) -> AssetResult<()> {
        let path = self
            .storage
            .find(id)
            .map(|rec| rec.resolved_path.clone())
            .filter(|p| !p.is_empty())
            .or_else(|| self.catalog.find(id).map(|e| e.resolved_path.clone()));

        let Some(path) = path else {
            return Err(AssetError::with_detail(
                AssetErrorCode::InvalidCatalogEntry,
                "cannot watch an unknown asset id",
                id.to_string(),
            ));
        };
        self.watcher.watch(id.clone(), path);
        Ok(())
    }

    /// Watch every catalog entry.
    pub fn watch_all(&mut self) {
        let pairs: Vec<(AssetId, String)> = self
            .catalog
            .iter()
            .map(|e| (e.id.clone(), e.resolved_path.clone()))
            .collect();
        for (id, path) in pairs {
            self.watcher.watch(id, path);
        }
    }

    pub fn unwatch(&mut self, id: &AssetId) {
        self.watcher.unwatch(id);
    }

    pub fn watcher_options(&self) -> &WatcherOptions {
        self.watcher.options()
    }

    /// Poll the watcher for file changes.
    pub fn poll_changes(&mut self) -> Vec<AssetChange> {
        self.watcher.poll()
    }

    /// Force-reload every resolvable changed id, keeping the old payload
    /// when a reload fails. Returns how many reloads succeeded.
    pub fn apply_hot_reload(&mut self, changes: &[AssetChange]) -> usize {
        let mut reloaded = 0;
        for change in changes {
            if !self.catalog.contains(&change.id) && !self.storage.contains(&change.id) {
                continue;
            }
            let request = AssetRequest::reload();
            match self.acquire(&change.id, &request) {
                Ok(handle) => {
                    // The reload's reference is transient.
                    self.release(&handle);
                    reloaded += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        id = %change.id,
                        error = %err,
                        "hot reload failed, previous payload kept"
                    );
                }
            }
        }
        reloaded
    }

    // --- internals ---

    fn effective_ttl(&self, id: &AssetId) -> u64 {
        self.ttl_overrides
            .get(id)
            .copied()
            .unwrap_or(self.policy.options().keep_alive_frames)
    }

    fn evict(&mut self, id: &AssetId) {
        self.lifetime.on_evicted(id);
        self.stats.on_evict(id);
        self.ttl_overrides.remove(id);
        self.storage.erase_if(id, false);
        tracing::debug!(%id, "asset evicted");
    }
}
