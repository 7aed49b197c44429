//! Basic asset loading walkthrough.
//!
//! This example shows:
//! - Setting up an `AssetManager` over a disk source
//! - Loading a catalog
//! - Registering a custom loader next to the built-ins
//! - Acquiring assets and reading them back through handles
//! - Cache statistics after a few acquires

use std::path::Path;

use lodestone_assets::prelude::*;
use lodestone_assets::{AnyAsset, ResolverOptions};

/// A simple JSON config asset, registered under the `data` type tag.
#[derive(Debug)]
struct JsonConfig {
    data: serde_json::Value,
}

struct JsonConfigLoader;

impl AssetLoader for JsonConfigLoader {
    fn asset_type(&self) -> AssetType {
        AssetType::data()
    }

    fn load(&self, bytes: &[u8], ctx: &LoadContext) -> AssetResult<AnyAsset> {
        let data: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| {
            AssetError::with_detail(
                AssetErrorCode::DecodeFailed,
                "JSON parse error",
                format!("{}: {e}", ctx.resolved_path),
            )
        })?;
        Ok(AnyAsset::from_value(JsonConfig { data }))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("lodestone_basic_loading");
    let assets_root = dir.join("assets");
    write_demo_files(&assets_root)?;

    let options = AssetManagerOptions {
        resolver: ResolverOptions {
            assets_root: assets_root.to_string_lossy().to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut manager = AssetManager::with_options(Box::new(DiskSource::new()), options);
    manager.register_builtin_loaders();
    manager.register_loader(Box::new(JsonConfigLoader));

    manager.load_catalog_from_str(
        r#"{
            "version": 1,
            "assets": [
                {"id": "ui.title",    "type": "text",   "path": "ui/title.txt"},
                {"id": "game.config", "type": "data",   "path": "config/game.json"},
                {"id": "game.blob",   "type": "binary", "path": "data/level0.bin"}
            ]
        }"#,
        "catalog.json",
    )?;
    println!("catalog: {} entries", manager.catalog().len());

    // Text through the built-in loader.
    let title_id = AssetId::from_name("ui.title");
    let title = manager.acquire(&title_id, &AssetRequest::default())?;
    println!("ui.title -> {:?}", manager.get::<TextAsset>(&title).unwrap().text);

    // Custom loader output.
    let config_id = AssetId::from_name("game.config");
    let config = manager.acquire(&config_id, &AssetRequest::default())?;
    let config_value = manager.get::<JsonConfig>(&config).unwrap();
    println!("game.config -> {}", config_value.data);

    // Binary payload.
    let blob_id = AssetId::from_name("game.blob");
    let blob = manager.acquire(&blob_id, &AssetRequest::default())?;
    println!(
        "game.blob -> {} bytes",
        manager.get::<BinaryAsset>(&blob).unwrap().bytes.len()
    );

    // A second acquire is served from cache.
    let _again = manager.acquire(&title_id, &AssetRequest::default())?;
    let stats = manager.statistics();
    println!(
        "loads={} hits={} hit_rate={:.2}",
        stats.counters().load_succeeded,
        stats.counters().cache_hits,
        stats.cache_hit_rate()
    );

    Ok(())
}

fn write_demo_files(assets_root: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(assets_root.join("ui"))?;
    std::fs::create_dir_all(assets_root.join("config"))?;
    std::fs::create_dir_all(assets_root.join("data"))?;
    std::fs::write(assets_root.join("ui/title.txt"), "Lodestone Demo")?;
    std::fs::write(
        assets_root.join("config/game.json"),
        r#"{"difficulty":"normal","volume":0.8}"#,
    )?;
    std::fs::write(assets_root.join("data/level0.bin"), [0u8, 1, 2, 3, 4, 5])?;
    Ok(())
}
