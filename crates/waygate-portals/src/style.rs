use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use waygate_blocks::{MaterialCatalog, MaterialId};

use crate::block::BlockRole;
use crate::config::{StyleDef, StylesConfig};

/// Namespaced identifier of a shared style, e.g. `waygate:default`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleKey(pub String);

impl StyleKey {
    pub const DEFAULT: &'static str = "waygate:default";

    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StyleKey {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("no material for role '{}' while {}", .role.name(), activation_name(.active))]
    MissingMaterial { active: bool, role: BlockRole },
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),
    #[error("shared styles need a key")]
    Anonymous,
}

fn activation_name(active: &bool) -> &'static str {
    if *active { "active" } else { "inactive" }
}

/// Material table indexed by activation state and block role.
///
/// A style with a key is shared through the [`StyleRegistry`]; a keyless style
/// is a per-portal override.
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    key: Option<StyleKey>,
    // [inactive, active] x role
    materials: [[MaterialId; BlockRole::COUNT]; 2],
}

impl Style {
    pub fn new(key: Option<StyleKey>) -> Self {
        Self {
            key,
            materials: [[MaterialId::NONE; BlockRole::COUNT]; 2],
        }
    }

    /// Obsidian frame, enchanting-table console, gateway when active.
    pub fn builtin_default(catalog: &mut MaterialCatalog) -> Self {
        let obsidian = catalog.insert("obsidian", false);
        let console = catalog.insert("enchanting_table", false);
        let air = catalog.insert("air", false);
        let gateway = catalog.insert("end_gateway", true);
        let mut style = Style::new(Some(StyleKey::default()));
        for active in [false, true] {
            style.set_material(active, BlockRole::Origin, obsidian);
            style.set_material(active, BlockRole::Frame, obsidian);
            style.set_material(active, BlockRole::Console, console);
        }
        style.set_material(false, BlockRole::Portal, air);
        style.set_material(true, BlockRole::Portal, gateway);
        style
    }

    pub fn key(&self) -> Option<&StyleKey> {
        self.key.as_ref()
    }

    #[inline]
    pub fn material(&self, active: bool, role: BlockRole) -> MaterialId {
        self.materials[active as usize][role.index()]
    }

    pub fn set_material(&mut self, active: bool, role: BlockRole, material: MaterialId) {
        self.materials[active as usize][role.index()] = material;
    }

    /// Every (activation, role) slot must name a material.
    pub fn check_valid(&self) -> Result<(), StyleError> {
        for active in [false, true] {
            for role in BlockRole::ALL {
                if self.material(active, role).is_none() {
                    return Err(StyleError::MissingMaterial { active, role });
                }
            }
        }
        Ok(())
    }

    /// Independent copy bound to `new_key` (`None` yields an override).
    pub fn copy(&self, new_key: Option<StyleKey>) -> Style {
        Style {
            key: new_key,
            materials: self.materials,
        }
    }

    /// Resolve material keys against the catalog. The result is not validated.
    pub fn from_def(def: &StyleDef, catalog: &MaterialCatalog) -> Result<Style, StyleError> {
        let mut style = Style::new(def.key.clone().map(StyleKey));
        for (active, table) in [(false, &def.inactive), (true, &def.active)] {
            for (role_name, material_key) in table {
                let role = BlockRole::from_name(role_name)
                    .ok_or_else(|| StyleError::UnknownRole(role_name.clone()))?;
                let material = catalog
                    .get_id(material_key)
                    .ok_or_else(|| StyleError::UnknownMaterial(material_key.clone()))?;
                style.set_material(active, role, material);
            }
        }
        Ok(style)
    }

    /// Inverse of [`Style::from_def`]; unset slots are omitted.
    pub fn to_def(&self, catalog: &MaterialCatalog) -> StyleDef {
        let table = |active: bool| -> BTreeMap<String, String> {
            BlockRole::ALL
                .into_iter()
                .filter_map(|role| {
                    let key = catalog.key(self.material(active, role))?;
                    Some((role.name().to_string(), key.to_string()))
                })
                .collect()
        };
        StyleDef {
            key: self.key.as_ref().map(|k| k.0.clone()),
            active: table(true),
            inactive: table(false),
        }
    }
}

/// Named shared styles with a guaranteed default.
#[derive(Clone, Debug)]
pub struct StyleRegistry {
    styles: HashMap<StyleKey, Style>,
    default_key: StyleKey,
}

impl StyleRegistry {
    /// `default` must be valid; a keyless default is filed under [`StyleKey::DEFAULT`].
    pub fn new(default: Style) -> Self {
        let default_key = default.key().cloned().unwrap_or_default();
        let default = default.copy(Some(default_key.clone()));
        let mut styles = HashMap::new();
        styles.insert(default_key.clone(), default);
        Self {
            styles,
            default_key,
        }
    }

    pub fn builtin(catalog: &mut MaterialCatalog) -> Self {
        Self::new(Style::builtin_default(catalog))
    }

    pub fn default_key(&self) -> &StyleKey {
        &self.default_key
    }

    pub fn default_style(&self) -> &Style {
        // The default entry is inserted on construction and never removed.
        &self.styles[&self.default_key]
    }

    pub fn get(&self, key: &StyleKey) -> Option<&Style> {
        self.styles.get(key)
    }

    /// Resolve a key, falling back to the default for unknown keys.
    pub fn style(&self, key: &StyleKey) -> &Style {
        match self.styles.get(key) {
            Some(s) => s,
            None => {
                log::debug!("style '{}' unknown; using '{}'", key, self.default_key);
                self.default_style()
            }
        }
    }

    pub fn contains(&self, key: &StyleKey) -> bool {
        self.styles.contains_key(key)
    }

    pub fn insert(&mut self, style: Style) -> Result<Option<Style>, StyleError> {
        let key = style.key().cloned().ok_or(StyleError::Anonymous)?;
        style.check_valid()?;
        Ok(self.styles.insert(key, style))
    }

    /// Remove a shared style. The default cannot be removed.
    pub fn remove(&mut self, key: &StyleKey) -> Option<Style> {
        if *key == self.default_key {
            return None;
        }
        self.styles.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &StyleKey> {
        self.styles.keys()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Parse a styles file. Invalid entries are logged and skipped; a missing
    /// or invalid default falls back to the built-in style under that key.
    pub fn from_toml_str(
        catalog: &mut MaterialCatalog,
        toml_str: &str,
    ) -> Result<Self, Box<dyn Error>> {
        let cfg: StylesConfig = toml::from_str(toml_str)?;
        let default_key = cfg.default.map(StyleKey).unwrap_or_default();
        let mut entries: Vec<(String, StyleDef)> = cfg.styles.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut parsed: Vec<Style> = Vec::with_capacity(entries.len());
        for (key, def) in entries {
            let def = StyleDef {
                key: Some(key.clone()),
                ..def
            };
            match Style::from_def(&def, catalog).and_then(|s| s.check_valid().map(|_| s)) {
                Ok(s) => parsed.push(s),
                Err(e) => log::warn!("skipping style '{}': {}", key, e),
            }
        }

        let default = match parsed.iter().position(|s| s.key() == Some(&default_key)) {
            Some(i) => parsed.swap_remove(i),
            None => {
                log::warn!("default style '{}' not configured; using built-in", default_key);
                Style::builtin_default(catalog).copy(Some(default_key))
            }
        };
        let mut reg = StyleRegistry::new(default);
        for s in parsed {
            // Already validated and keyed above.
            let _ = reg.insert(s);
        }
        Ok(reg)
    }

    pub fn from_path(
        catalog: &mut MaterialCatalog,
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(catalog, &s)
    }
}
