use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

// Top-level styles config file
#[derive(Deserialize, Debug, Default)]
pub struct StylesConfig {
    // Key of the style used when a portal references an unknown one.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub styles: HashMap<String, StyleDef>,
}

// Style table: role name -> material key, once per activation state.
// Same shape is used for per-portal overrides in portal records.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StyleDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub active: BTreeMap<String, String>,
    #[serde(default)]
    pub inactive: BTreeMap<String, String>,
}
