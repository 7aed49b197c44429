//! Type-erased shared payload produced by loaders.

use std::any::{Any, TypeId};
use std::sync::Arc;

/// An owning, shareable handle to a decoded resource of erased type.
///
/// The payload is reference counted: clones of the returned `Arc<T>` keep it
/// alive after the storage record that produced it is gone. Typed read-back
/// checks the stored [`TypeId`]; a mismatch yields nothing rather than a
/// fault.
#[derive(Clone, Default)]
pub struct AnyAsset {
    ptr: Option<Arc<dyn Any + Send + Sync>>,
}

impl AnyAsset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a freshly decoded value.
    pub fn from_value<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_shared(Arc::new(value))
    }

    /// Wrap an already shared value.
    pub fn from_shared<T: Any + Send + Sync>(ptr: Arc<T>) -> Self {
        Self {
            ptr: Some(ptr as Arc<dyn Any + Send + Sync>),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// The payload's runtime type token, when non-empty.
    pub fn type_id(&self) -> Option<TypeId> {
        self.ptr.as_ref().map(|p| (**p).type_id())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.type_id() == Some(TypeId::of::<T>())
    }

    /// Share the payload as `T`; `None` when empty or the type differs.
    pub fn share_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let ptr = self.ptr.clone()?;
        ptr.downcast::<T>().ok()
    }

    pub fn reset(&mut self) {
        self.ptr = None;
    }
}

impl std::fmt::Debug for AnyAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.ptr {
            Some(_) => f.debug_struct("AnyAsset").field("type_id", &self.type_id()).finish(),
            None => f.write_str("AnyAsset(empty)"),
        }
    }
}
