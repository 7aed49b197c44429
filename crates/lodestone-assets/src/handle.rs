//! Generation-checked handle tokens.

use std::any::TypeId;
use std::hash::{Hash, Hasher};

use crate::hash::hash_combine;
use crate::id::AssetId;

/// A value token gameplay code holds instead of a reference: id, the
/// generation it was issued for, and an optional type hint.
///
/// `generation == 0` denotes invalid. A handle whose generation no longer
/// matches the record's is stale and resolves to nothing without fault. The
/// type hint strengthens debug checks but never participates in equality.
#[derive(Debug, Clone, Default)]
pub struct AssetHandle {
    id: AssetId,
    generation: u32,
    type_hint: Option<TypeId>,
}

impl AssetHandle {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn new(id: AssetId, generation: u32) -> Self {
        Self {
            id,
            generation,
            type_hint: None,
        }
    }

    /// Handle with a type hint, for call sites that know what they expect.
    pub fn new_typed<T: 'static>(id: AssetId, generation: u32) -> Self {
        Self {
            id,
            generation,
            type_hint: Some(TypeId::of::<T>()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.generation != 0
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn type_hint(&self) -> Option<TypeId> {
        self.type_hint
    }

    pub fn has_type_hint(&self) -> bool {
        self.type_hint.is_some()
    }

    pub fn type_is<T: 'static>(&self) -> bool {
        self.type_hint == Some(TypeId::of::<T>())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        // Same id but a different generation is a different token.
        self.generation == other.generation && self.id == other.id
    }
}

impl Eq for AssetHandle {}

impl Hash for AssetHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_combine(self.id.value(), self.generation as u64).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_invalid() {
        assert!(!AssetHandle::invalid().is_valid());
        assert_eq!(AssetHandle::invalid().generation(), 0);
    }

    #[test]
    fn equality_needs_id_and_generation() {
        let id = AssetId::from_name("a");
        let h1 = AssetHandle::new(id.clone(), 1);
        let h2 = AssetHandle::new(id.clone(), 1);
        let h3 = AssetHandle::new(id.clone(), 2);
        let h4 = AssetHandle::new(AssetId::from_name("b"), 1);

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_ne!(h1, h4);
    }

    #[test]
    fn type_hint_does_not_affect_equality() {
        let id = AssetId::from_name("a");
        let plain = AssetHandle::new(id.clone(), 1);
        let typed = AssetHandle::new_typed::<String>(id, 1);
        assert_eq!(plain, typed);
        assert!(typed.type_is::<String>());
        assert!(!typed.type_is::<u32>());
        assert!(!plain.has_type_hint());
    }

    #[test]
    fn reset_invalidates() {
        let mut h = AssetHandle::new(AssetId::from_name("a"), 3);
        h.reset();
        assert!(!h.is_valid());
    }
}
