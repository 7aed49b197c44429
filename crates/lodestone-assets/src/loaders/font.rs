//! Font files are kept as opaque bytes for a rasterizer to consume later.

use crate::any::AnyAsset;
use crate::error::{AssetError, AssetErrorCode, AssetResult};
use crate::id::AssetType;
use crate::loader::{AssetLoader, LoadContext};

/// Raw TTF/OTF blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub bytes: Vec<u8>,
}

pub struct FontLoader;

impl AssetLoader for FontLoader {
    fn asset_type(&self) -> AssetType {
        AssetType::font()
    }

    fn load(&self, bytes: &[u8], ctx: &LoadContext) -> AssetResult<AnyAsset> {
        if bytes.is_empty() {
            return Err(AssetError::with_detail(
                AssetErrorCode::DecodeFailed,
                "Font: empty file",
                ctx.resolved_path.clone(),
            ));
        }
        Ok(AnyAsset::from_value(FontAsset {
            bytes: bytes.to_vec(),
        }))
    }

    fn decoded_size(&self, asset: &AnyAsset) -> u64 {
        asset
            .share_as::<FontAsset>()
            .map(|f| f.bytes.len() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_bytes_verbatim() {
        let any = FontLoader
            .load(&[0x00, 0x01, 0x00, 0x00], &LoadContext::default())
            .unwrap();
        let font = any.share_as::<FontAsset>().unwrap();
        assert_eq!(font.bytes, vec![0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn empty_file_is_rejected() {
        let err = FontLoader.load(&[], &LoadContext::default()).unwrap_err();
        assert_eq!(err.code, AssetErrorCode::DecodeFailed);
    }
}
