//! UTF-8 text assets.

use crate::any::AnyAsset;
use crate::error::{AssetError, AssetErrorCode, AssetResult};
use crate::id::AssetType;
use crate::loader::{AssetLoader, LoadContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAsset {
    pub text: String,
}

pub struct TextLoader;

impl AssetLoader for TextLoader {
    fn asset_type(&self) -> AssetType {
        AssetType::text()
    }

    fn load(&self, bytes: &[u8], ctx: &LoadContext) -> AssetResult<AnyAsset> {
        let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
            AssetError::with_detail(
                AssetErrorCode::DecodeFailed,
                "Text: not valid UTF-8",
                format!("{}: {e}", ctx.resolved_path),
            )
        })?;
        Ok(AnyAsset::from_value(TextAsset { text }))
    }

    fn decoded_size(&self, asset: &AnyAsset) -> u64 {
        asset
            .share_as::<TextAsset>()
            .map(|t| t.text.len() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_utf8() {
        let any = TextLoader
            .load("héllo".as_bytes(), &LoadContext::default())
            .unwrap();
        assert_eq!(any.share_as::<TextAsset>().unwrap().text, "héllo");
    }

    #[test]
    fn invalid_utf8_is_a_decode_failure() {
        let err = TextLoader
            .load(&[0xFF, 0xFE], &LoadContext::default())
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::DecodeFailed);
    }
}
