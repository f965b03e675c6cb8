use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use waygate_blocks::MaterialCatalog;
use waygate_portals::StyleRegistry;

/// Host settings read from `waygate.toml`. Relative paths are resolved
/// against the directory holding the config file.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub materials: PathBuf,
    pub styles: PathBuf,
    pub data: PathBuf,
    pub worlds: Vec<String>,
    pub watch_styles: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            materials: PathBuf::from("materials.toml"),
            styles: PathBuf::from("styles.toml"),
            data: PathBuf::from("portals.json"),
            worlds: vec!["overworld".into(), "nether".into(), "the_end".into()],
            watch_styles: false,
        }
    }
}

impl HostConfig {
    /// Read the config at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let base = path.parent().unwrap_or(Path::new("")).to_path_buf();
        if !path.exists() {
            log::info!("{} not found; using default host config", path.display());
            return Ok(Self::default().anchored(&base));
        }
        let s = fs::read_to_string(path)?;
        let cfg: HostConfig = toml::from_str(&s)?;
        Ok(cfg.anchored(&base))
    }

    fn anchored(mut self, base: &Path) -> Self {
        for p in [&mut self.materials, &mut self.styles, &mut self.data] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        self
    }

    pub fn load_catalog(&self) -> MaterialCatalog {
        if !self.materials.exists() {
            log::info!("{} not found; using built-in materials", self.materials.display());
            return MaterialCatalog::builtin();
        }
        match MaterialCatalog::from_path(&self.materials) {
            Ok(catalog) => {
                log::info!("{} material(s) from {}", catalog.len(), self.materials.display());
                catalog
            }
            Err(e) => {
                log::warn!("{} parse error: {}", self.materials.display(), e);
                MaterialCatalog::builtin()
            }
        }
    }

    pub fn load_styles(&self, catalog: &mut MaterialCatalog) -> StyleRegistry {
        if !self.styles.exists() {
            log::info!("{} not found; using built-in styles", self.styles.display());
            return StyleRegistry::builtin(catalog);
        }
        match StyleRegistry::from_path(catalog, &self.styles) {
            Ok(styles) => {
                log::info!("{} style(s) from {}", styles.len(), self.styles.display());
                styles
            }
            Err(e) => {
                log::warn!("{} parse error: {}", self.styles.display(), e);
                StyleRegistry::builtin(catalog)
            }
        }
    }
}
