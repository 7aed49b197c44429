//! Built-in loaders for the engine's standard asset types.

mod binary;
mod font;
mod text;
mod texture;

pub use binary::{BinaryAsset, BinaryLoader};
pub use font::{FontAsset, FontLoader};
pub use text::{TextAsset, TextLoader};
pub use texture::{TextureAsset, TextureLoader};

use crate::loader::LoaderRegistry;

/// Register every built-in loader.
pub fn register_builtin_loaders(registry: &mut LoaderRegistry) {
    registry.register(Box::new(TextureLoader));
    registry.register(Box::new(FontLoader));
    registry.register(Box::new(TextLoader));
    registry.register(Box::new(BinaryLoader));
}
