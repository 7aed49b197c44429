//! Hot-reload walkthrough.
//!
//! Watches a text asset, polls for changes, and applies reloads. Run it and
//! edit the printed file path to see handles go stale and fresh acquires
//! pick up the new content. Ctrl-C to exit.

use std::thread::sleep;
use std::time::Duration;

use lodestone_assets::prelude::*;
use lodestone_assets::ResolverOptions;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("lodestone_hot_reload");
    let assets_root = dir.join("assets");
    std::fs::create_dir_all(assets_root.join("ui"))?;
    let watched_file = assets_root.join("ui/message.txt");
    std::fs::write(&watched_file, "edit me")?;

    let options = AssetManagerOptions {
        resolver: ResolverOptions {
            assets_root: assets_root.to_string_lossy().to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut manager = AssetManager::with_options(Box::new(DiskSource::new()), options);
    manager.register_builtin_loaders();
    manager.load_catalog_from_str(
        r#"{"assets":[{"id":"ui.message","type":"text","path":"ui/message.txt"}]}"#,
        "catalog.json",
    )?;

    let id = AssetId::from_name("ui.message");
    let mut handle = manager.acquire(&id, &AssetRequest::default())?;
    manager.watch(&id)?;

    println!("watching {}", watched_file.display());
    println!("initial: {:?}", manager.get::<TextAsset>(&handle).unwrap().text);

    let mut reload_count = 0usize;
    loop {
        manager.begin_frame();

        let changes = manager.poll_changes();
        if !changes.is_empty() {
            for change in &changes {
                println!("change #{}: {} ({})", change.seq, change.id, change.kind.as_str());
            }
            reload_count += manager.apply_hot_reload(&changes);

            // The old handle is stale now; re-acquire to see the new text.
            assert!(manager.get::<TextAsset>(&handle).is_none());
            manager.release(&handle);
            handle = manager.acquire(&id, &AssetRequest::default())?;
            println!(
                "reload #{}: {:?}",
                reload_count,
                manager.get::<TextAsset>(&handle).unwrap().text
            );
        }

        sleep(Duration::from_millis(250));
    }
}
