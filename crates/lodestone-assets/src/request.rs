//! Load request DTO handed to the manager.

use crate::id::AssetType;

/// How to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Ready record wins; load otherwise.
    #[default]
    Auto,
    /// Reload even when Ready (hot reload, development).
    ForceReload,
}

/// Reserved async slot. Every request is currently serviced synchronously;
/// the variant exists so call sites can declare intent ahead of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadSync {
    #[default]
    Sync,
    Async,
}

/// What to do with the previous payload when a reload fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadFallback {
    /// Failure is failure.
    None,
    /// Keep serving the old payload; the record still turns Failed.
    #[default]
    KeepOldIfAny,
}

#[derive(Debug, Clone, Default)]
pub struct AssetRequest {
    pub mode: LoadMode,
    pub sync: LoadSync,
    pub fallback: LoadFallback,

    /// Advisory; meaningful once a queue exists.
    pub priority: i32,

    /// Expected type. Should agree with the catalog; also enables loading
    /// ids the catalog does not know (with `override_path`).
    pub expected_type: Option<AssetType>,

    /// Bypass the catalog path. Tests, tools, debug loads.
    pub override_path: Option<String>,

    /// Pin on acquire.
    pub pin: bool,
    /// Per-request TTL override; 0 = use the policy default.
    pub keep_alive_frames_override: u64,

    /// Free-form tag for tracing.
    pub tag: String,
}

impl AssetRequest {
    pub fn reload() -> Self {
        Self {
            mode: LoadMode::ForceReload,
            fallback: LoadFallback::KeepOldIfAny,
            ..Default::default()
        }
    }

    pub fn async_load(priority: i32) -> Self {
        Self {
            sync: LoadSync::Async,
            priority,
            ..Default::default()
        }
    }

    pub fn with_type_hint(asset_type: AssetType) -> Self {
        Self {
            expected_type: Some(asset_type),
            ..Default::default()
        }
    }

    pub fn with_override_path(path: impl Into<String>) -> Self {
        Self {
            override_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn is_reload(&self) -> bool {
        self.mode == LoadMode::ForceReload
    }

    pub fn is_async(&self) -> bool {
        self.sync == LoadSync::Async
    }

    pub fn has_override_path(&self) -> bool {
        self.override_path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let r = AssetRequest::default();
        assert_eq!(r.mode, LoadMode::Auto);
        assert_eq!(r.sync, LoadSync::Sync);
        assert_eq!(r.fallback, LoadFallback::KeepOldIfAny);
        assert!(!r.is_reload());
        assert!(!r.has_override_path());
    }

    #[test]
    fn factories() {
        assert!(AssetRequest::reload().is_reload());
        assert!(AssetRequest::async_load(5).is_async());
        assert_eq!(AssetRequest::async_load(5).priority, 5);
        assert!(AssetRequest::with_override_path("x/y.bin").has_override_path());
        assert_eq!(
            AssetRequest::with_type_hint(AssetType::texture()).expected_type,
            Some(AssetType::texture())
        );
    }
}
