//! Texture decoding into straight RGBA8.

use crate::any::AnyAsset;
use crate::error::{AssetError, AssetErrorCode, AssetResult};
use crate::id::AssetType;
use crate::loader::{AssetLoader, LoadContext};

/// Minimal CPU-side texture: RGBA8, row-major, no mips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

pub struct TextureLoader;

impl AssetLoader for TextureLoader {
    fn asset_type(&self) -> AssetType {
        AssetType::texture()
    }

    fn load(&self, bytes: &[u8], ctx: &LoadContext) -> AssetResult<AnyAsset> {
        let decoded = image::load_from_memory(bytes).map_err(|e| {
            AssetError::with_detail(
                AssetErrorCode::DecodeFailed,
                "Texture: failed to decode image",
                format!("{}: {e}", ctx.resolved_path),
            )
        })?;

        let rgba = decoded.into_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        Ok(AnyAsset::from_value(TextureAsset {
            width,
            height,
            rgba: rgba.into_raw(),
        }))
    }

    fn decoded_size(&self, asset: &AnyAsset) -> u64 {
        asset
            .share_as::<TextureAsset>()
            .map(|t| t.rgba.len() as u64)
            .unwrap_or(0)
    }
}
