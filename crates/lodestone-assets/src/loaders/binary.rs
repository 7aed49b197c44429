//! Raw byte assets.

use crate::any::AnyAsset;
use crate::error::AssetResult;
use crate::id::AssetType;
use crate::loader::{AssetLoader, LoadContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryAsset {
    pub bytes: Vec<u8>,
}

pub struct BinaryLoader;

impl AssetLoader for BinaryLoader {
    fn asset_type(&self) -> AssetType {
        AssetType::binary()
    }

    fn load(&self, bytes: &[u8], _ctx: &LoadContext) -> AssetResult<AnyAsset> {
        Ok(AnyAsset::from_value(BinaryAsset {
            bytes: bytes.to_vec(),
        }))
    }

    fn decoded_size(&self, asset: &AnyAsset) -> u64 {
        asset
            .share_as::<BinaryAsset>()
            .map(|b| b.bytes.len() as u64)
            .unwrap_or(0)
    }
}
