//! Source -> loader pipeline: open the resolved path, read the bytes,
//! dispatch to the loader for the asset's type.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lodestone_io::stream::{FileOpenMode, MemoryStream, Stream, StreamReader};
use lodestone_io::vfs::Vfs;
use lodestone_io::{IoError, IoErrorCode, IoResult, Uri};

use crate::any::AnyAsset;
use crate::error::{AssetError, AssetErrorCode, AssetResult};
use crate::loader::{LoadContext, LoaderRegistry};
use crate::stats::AssetStatistics;

/// Where the pipeline gets its bytes: a read-only stream keyed by the
/// catalog's resolved path.
pub trait AssetSource: Send + Sync {
    fn open(&self, resolved_path: &str) -> IoResult<Box<dyn Stream>>;
}

/// Plain filesystem source; resolved paths are used as-is, with relative
/// ones joined under an optional base directory.
#[derive(Debug, Clone, Default)]
pub struct DiskSource {
    base: Option<PathBuf>,
}

impl DiskSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: impl AsRef<Path>) -> Self {
        Self {
            base: Some(base.as_ref().to_path_buf()),
        }
    }

    fn full_path(&self, resolved_path: &str) -> PathBuf {
        let p = Path::new(resolved_path);
        match (&self.base, p.is_absolute()) {
            (Some(base), false) => base.join(p),
            _ => p.to_path_buf(),
        }
    }
}

impl AssetSource for DiskSource {
    fn open(&self, resolved_path: &str) -> IoResult<Box<dyn Stream>> {
        let full = self.full_path(resolved_path);
        let bytes = std::fs::read(&full).map_err(|e| {
            let code = if e.kind() == std::io::ErrorKind::NotFound {
                IoErrorCode::NotFound
            } else {
                IoErrorCode::OpenFailed
            };
            IoError::with_detail(code, "DiskSource: failed to read file", full.display().to_string())
        })?;
        Ok(Box::new(MemoryStream::read_only(bytes)))
    }
}

/// Source that routes through the overlay VFS. Resolved paths that already
/// carry a scheme pass through; bare paths get the configured scheme.
pub struct VfsSource {
    vfs: Arc<Vfs>,
    scheme: String,
}

impl VfsSource {
    pub fn new(vfs: Arc<Vfs>, scheme: impl Into<String>) -> Self {
        Self {
            vfs,
            scheme: scheme.into(),
        }
    }
}

impl AssetSource for VfsSource {
    fn open(&self, resolved_path: &str) -> IoResult<Box<dyn Stream>> {
        let uri = if resolved_path.contains("://") {
            Uri::parse_loose(resolved_path)
        } else {
            Uri::parse_loose(&format!("{}://{}", self.scheme, resolved_path))
        };
        self.vfs.open(&uri, FileOpenMode::read_binary())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Per-asset source size cap; 0 = unlimited.
    pub max_bytes: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_bytes: 256 * 1024 * 1024,
        }
    }
}

/// The result of one pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub asset: AnyAsset,
    pub bytes_read: u64,
    pub bytes_decoded: u64,
}

/// read -> decode -> wrap. Statistics are fed from here so every load path
/// counts the same way.
pub struct AssetPipeline {
    source: Box<dyn AssetSource>,
    opt: PipelineOptions,
}

impl AssetPipeline {
    pub fn new(source: Box<dyn AssetSource>) -> Self {
        Self::with_options(source, PipelineOptions::default())
    }

    pub fn with_options(source: Box<dyn AssetSource>, opt: PipelineOptions) -> Self {
        Self { source, opt }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.opt
    }

    pub fn load(
        &self,
        registry: &LoaderRegistry,
        ctx: &LoadContext,
        stats: &mut AssetStatistics,
    ) -> AssetResult<PipelineOutput> {
        let Some(loader) = registry.find(&ctx.asset_type) else {
            let err = AssetError::with_detail(
                AssetErrorCode::NoLoader,
                "no loader registered for asset type",
                ctx.asset_type.to_string(),
            );
            stats.on_load_failure(&ctx.id, &ctx.asset_type, ctx.now_frame);
            return Err(err);
        };

        stats.on_load_start();

        let result = self.read_and_decode(loader, ctx);
        match result {
            Ok(output) => {
                stats.on_load_success(
                    &ctx.id,
                    &ctx.asset_type,
                    ctx.now_frame,
                    output.bytes_read,
                    output.bytes_decoded,
                );
                Ok(output)
            }
            Err(err) => {
                tracing::warn!(id = %ctx.id, path = %ctx.resolved_path, error = %err, "asset load failed");
                stats.on_load_failure(&ctx.id, &ctx.asset_type, ctx.now_frame);
                Err(err)
            }
        }
    }

    fn read_and_decode(
        &self,
        loader: &dyn crate::loader::AssetLoader,
        ctx: &LoadContext,
    ) -> AssetResult<PipelineOutput> {
        let mut stream = self.source.open(&ctx.resolved_path)?;

        let read_result = StreamReader::new(&mut *stream).read_all_bytes(self.opt.max_bytes);
        // The stream is scoped to this load; close on both outcomes.
        let _ = stream.close();
        let bytes = read_result?;
        let bytes_read = bytes.len() as u64;

        let asset = loader.load(&bytes, ctx)?;
        let bytes_decoded = loader.decoded_size(&asset);

        Ok(PipelineOutput {
            asset,
            bytes_read,
            bytes_decoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{AssetId, AssetType};
    use crate::loaders::{register_builtin_loaders, TextAsset};
    use lodestone_io::fs::MemoryFileSystem;
    use lodestone_io::vfs::MountPoint;

    fn vfs_with(path: &str, data: &[u8]) -> Arc<Vfs> {
        let fs = MemoryFileSystem::new();
        fs.insert(format!("root/{path}"), data.to_vec());
        let mut vfs = Vfs::new();
        vfs.mount(MountPoint::new("main", "asset://", "mem://root", Arc::new(fs)))
            .unwrap();
        Arc::new(vfs)
    }

    fn registry() -> LoaderRegistry {
        let mut r = LoaderRegistry::new();
        register_builtin_loaders(&mut r);
        r
    }

    fn ctx(ty: AssetType, path: &str) -> LoadContext {
        LoadContext {
            id: AssetId::from_name("test.asset"),
            asset_type: ty,
            resolved_path: path.to_string(),
            now_frame: 1,
        }
    }

    #[test]
    fn loads_text_through_vfs_source() {
        let vfs = vfs_with("ui/title.txt", b"Hello");
        let pipeline = AssetPipeline::new(Box::new(VfsSource::new(vfs, "asset")));
        let mut stats = AssetStatistics::new();

        let out = pipeline
            .load(&registry(), &ctx(AssetType::text(), "ui/title.txt"), &mut stats)
            .unwrap();
        assert_eq!(out.bytes_read, 5);
        assert_eq!(out.asset.share_as::<TextAsset>().unwrap().text, "Hello");
        assert_eq!(stats.counters().load_succeeded, 1);
        assert_eq!(stats.counters().bytes_read_total, 5);
    }

    #[test]
    fn missing_loader_is_no_loader() {
        let vfs = vfs_with("music/a.ogg", b"OggS");
        let pipeline = AssetPipeline::new(Box::new(VfsSource::new(vfs, "asset")));
        let mut stats = AssetStatistics::new();

        let err = pipeline
            .load(&registry(), &ctx(AssetType::sound(), "music/a.ogg"), &mut stats)
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::NoLoader);
        assert_eq!(stats.counters().load_failed, 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let vfs = vfs_with("ui/real.txt", b"x");
        let pipeline = AssetPipeline::new(Box::new(VfsSource::new(vfs, "asset")));
        let mut stats = AssetStatistics::new();

        let err = pipeline
            .load(&registry(), &ctx(AssetType::text(), "ui/missing.txt"), &mut stats)
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::NotFound);
    }

    #[test]
    fn size_limit_is_enforced() {
        let vfs = vfs_with("big.bin", &[0u8; 1024]);
        let pipeline = AssetPipeline::with_options(
            Box::new(VfsSource::new(vfs, "asset")),
            PipelineOptions { max_bytes: 64 },
        );
        let mut stats = AssetStatistics::new();

        let err = pipeline
            .load(&registry(), &ctx(AssetType::binary(), "big.bin"), &mut stats)
            .unwrap_err();
        assert_eq!(err.code, AssetErrorCode::IoFailed);
    }
}
