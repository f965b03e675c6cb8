use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::types::MaterialId;

/// Materials known without any configuration file.
pub const BUILTIN_MATERIALS: &str = r#"
[materials]
air = {}
obsidian = {}
end_gateway = { light = true }
enchanting_table = {}
crying_obsidian = {}
respawn_anchor = {}
nether_portal = { light = true }
lodestone = {}
"#;

#[derive(Clone, Debug)]
pub struct Material {
    pub id: MaterialId,
    pub key: String,
    pub light: bool,
}

#[derive(Clone, Debug)]
pub struct MaterialCatalog {
    pub materials: Vec<Material>,
    pub by_key: HashMap<String, MaterialId>,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialCatalog {
    pub fn new() -> Self {
        // Slot 0 is reserved for `MaterialId::NONE`.
        Self {
            materials: vec![Material {
                id: MaterialId::NONE,
                key: String::new(),
                light: false,
            }],
            by_key: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        // The builtin table is a compile-time constant and always parses.
        Self::from_toml_str(BUILTIN_MATERIALS).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.materials.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_id(&self, key: &str) -> Option<MaterialId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        if id.is_none() {
            return None;
        }
        self.materials.get(id.0 as usize)
    }

    pub fn key(&self, id: MaterialId) -> Option<&str> {
        self.get(id).map(|m| m.key.as_str())
    }

    /// Register a material key, returning the existing id if already present.
    /// Returns `None` once every id is taken.
    pub fn try_insert(&mut self, key: &str, light: bool) -> Option<MaterialId> {
        if let Some(id) = self.get_id(key) {
            return Some(id);
        }
        let id = MaterialId(u16::try_from(self.materials.len()).ok()?);
        self.by_key.insert(key.to_string(), id);
        self.materials.push(Material {
            id,
            key: key.to_string(),
            light,
        });
        Some(id)
    }

    /// Like [`MaterialCatalog::try_insert`]; a full catalog yields `MaterialId::NONE`.
    pub fn insert(&mut self, key: &str, light: bool) -> MaterialId {
        self.try_insert(key, light).unwrap_or(MaterialId::NONE)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: MaterialsConfig = toml::from_str(toml_str)?;
        let mut catalog = MaterialCatalog::new();
        let mut entries: Vec<(String, MaterialEntry)> = cfg.materials.into_iter().collect();
        // HashMap iteration order is nondeterministic; sort keys so MaterialId assignment is stable.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, entry) in entries {
            if key.is_empty() {
                return Err("material key must not be empty".into());
            }
            if catalog.try_insert(&key, entry.light).is_none() {
                return Err(format!("too many materials (at most {})", u16::MAX).into());
            }
        }
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

// --- Config ---

#[derive(Deserialize)]
pub struct MaterialsConfig {
    pub materials: HashMap<String, MaterialEntry>,
}

#[derive(Deserialize, Default)]
pub struct MaterialEntry {
    // Emits light when placed; informational for hosts.
    #[serde(default)]
    pub light: bool,
}
