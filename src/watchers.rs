use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use waygate_edit::EditStore;
use waygate_portals::{SharedPortals, StyleRegistry};

/// Re-read `path` and swap it in as the shared style set. On error the current
/// styles stay in place.
pub fn reload_styles(portals: &SharedPortals<EditStore>, path: &Path) -> bool {
    let mut reg = portals.lock().unwrap();
    let mut catalog = reg.catalog().clone();
    match StyleRegistry::from_path(&mut catalog, path) {
        Ok(styles) => {
            let n = styles.len();
            reg.replace_catalog(catalog, styles);
            log::info!("styles reloaded from {} ({} style(s))", path.display(), n);
            log::info!("re-rendered {} portal(s)", reg.len());
            true
        }
        Err(e) => {
            log::warn!("styles reload failed ({}): {}", path.display(), e);
            false
        }
    }
}

/// Watch the directory holding `path` and reload styles whenever that file
/// changes. The watcher lives on its own thread for the life of the process.
pub fn spawn_style_watcher(path: PathBuf, portals: SharedPortals<EditStore>) {
    thread::spawn(move || {
        use notify::{EventKind, RecursiveMode, Watcher};
        let (tx, rx) = mpsc::channel::<()>();
        let file_name = path.file_name().map(|n| n.to_os_string());
        let watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any => {
                            if event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == file_name.as_deref())
                            {
                                let _ = tx.send(());
                            }
                        }
                        _ => {}
                    }
                }
            });
        let mut watcher = match watcher {
            Ok(w) => w,
            Err(e) => {
                log::warn!("cannot watch {}: {}", path.display(), e);
                return;
            }
        };
        // Watch the parent: editors often replace the file rather than write it.
        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
            log::warn!("cannot watch {}: {}", dir.display(), e);
            return;
        }
        log::info!("watching {} for style changes", path.display());
        while rx.recv().is_ok() {
            // Coalesce the burst of events a single save produces.
            thread::sleep(Duration::from_millis(100));
            for _ in rx.try_iter() {}
            if path.exists() {
                reload_styles(&portals, &path);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use waygate_blocks::{BlockStore, MaterialCatalog};
    use waygate_geom::{BlockPos, Vec3};
    use waygate_portals::{BlockRole, Orientation, OwnerId, Portal, PortalBlock, Portals};
    use waygate_world::LazyLocation;

    const ANCHOR_STYLES: &str = r#"
[styles."waygate:default".active]
origin = "obsidian"
frame = "obsidian"
console = "respawn_anchor"
portal = "end_gateway"

[styles."waygate:default".inactive]
origin = "obsidian"
frame = "obsidian"
console = "respawn_anchor"
portal = "air"
"#;

    #[test]
    fn reload_rerenders_portals() {
        let mut reg = Portals::new(MaterialCatalog::builtin(), None, EditStore::new());
        let p = Portal::new(
            OwnerId(uuid::Uuid::nil()),
            Orientation::North,
            LazyLocation::new("overworld", Vec3::ZERO, 0.0, 0.0),
        );
        let id = p.id();
        reg.insert(p);
        let console = BlockPos::new(0, 64, 1);
        reg.add_block(id, PortalBlock::new(console, BlockRole::Console));
        let shared = reg.into_shared();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.toml");
        fs::write(&path, ANCHOR_STYLES).unwrap();
        assert!(reload_styles(&shared, &path));

        let reg = shared.lock().unwrap();
        let anchor = reg.catalog().get_id("respawn_anchor").unwrap();
        assert_eq!(reg.store().get_material(console), anchor);
    }

    #[test]
    fn failed_reload_keeps_current_styles() {
        let reg = Portals::new(MaterialCatalog::builtin(), None, EditStore::new());
        let shared = reg.into_shared();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("styles.toml");
        fs::write(&path, "styles = 12").unwrap();
        assert!(!reload_styles(&shared, &path));
        assert!(!reload_styles(&shared, &dir.path().join("missing.toml")));
        assert_eq!(shared.lock().unwrap().styles().len(), 1);
    }
}
