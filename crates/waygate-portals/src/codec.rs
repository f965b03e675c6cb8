//! Portal records: the structured form persisted by a `RecordStore`.
//!
//! Mandatory fields (`id`, `owner`, `orientation`, `spawn`) fail the record;
//! everything else falls back to its default. An override that does not parse
//! or does not validate is dropped with a warning and the portal loads with its
//! named style.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use waygate_blocks::MaterialCatalog;
use waygate_world::LazyLocation;

use crate::block::PortalBlock;
use crate::config::StyleDef;
use crate::portal::{
    DEFAULT_NAME, Icon, Orientation, OwnerId, Portal, PortalId, StyleChoice, Visibility,
};
use crate::style::{Style, StyleKey};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed portal record: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct PortalRecord {
    id: PortalId,
    owner: OwnerId,
    orientation: Orientation,
    spawn: LazyLocation,
    #[serde(default)]
    blocks: Vec<PortalBlock>,
    #[serde(default = "default_name")]
    name: String,
    #[serde(default)]
    style: Option<StyleKey>,
    // Kept untyped so a broken override cannot fail the whole record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style_override: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<Icon>,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    target_id: Option<PortalId>,
    #[serde(default)]
    target_locked: bool,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

pub fn serialize(portal: &Portal, catalog: &MaterialCatalog) -> Value {
    let (style, style_override) = match &portal.style {
        StyleChoice::Named(key) => (Some(key.clone()), None),
        StyleChoice::Override(style) => (None, Some(style.to_def(catalog))),
    };
    let record = PortalRecord {
        id: portal.id,
        owner: portal.owner,
        orientation: portal.orientation,
        spawn: portal.spawn.clone(),
        blocks: portal.blocks.clone(),
        name: portal.name.clone(),
        style,
        style_override: style_override.and_then(|def| serde_json::to_value(def).ok()),
        icon: portal.icon.clone(),
        visibility: portal.visibility,
        target_id: portal.target_id,
        target_locked: portal.target_locked,
    };
    // Every field is plain data with string map keys.
    serde_json::to_value(record).unwrap_or(Value::Null)
}

pub fn deserialize(value: Value, catalog: &MaterialCatalog) -> Result<Portal, RecordError> {
    let record: PortalRecord = serde_json::from_value(value)?;
    let id = record.id;

    let style = match record.style_override.and_then(|v| decode_override(id, v, catalog)) {
        Some(style) => StyleChoice::Override(style),
        None => StyleChoice::Named(record.style.unwrap_or_default()),
    };

    let mut portal = Portal {
        id,
        owner: record.owner,
        orientation: record.orientation,
        spawn: record.spawn,
        blocks: Vec::with_capacity(record.blocks.len()),
        name: record.name,
        style,
        icon: record.icon,
        visibility: record.visibility,
        target_id: record.target_id,
        target_locked: record.target_locked,
    };
    for block in record.blocks {
        if !portal.push_block(block) {
            log::warn!("portal {}: dropping duplicate block at {:?}", id, block.pos);
        }
    }
    Ok(portal)
}

fn decode_override(id: PortalId, value: Value, catalog: &MaterialCatalog) -> Option<Style> {
    let def: StyleDef = match serde_json::from_value(value) {
        Ok(def) => def,
        Err(e) => {
            log::warn!("portal {}: discarding unreadable style override: {}", id, e);
            return None;
        }
    };
    let decoded = Style::from_def(&def, catalog).and_then(|s| s.check_valid().map(|_| s));
    match decoded {
        // Overrides are anonymous regardless of what was stored.
        Ok(style) => Some(style.copy(None)),
        Err(e) => {
            log::warn!("portal {}: discarding invalid style override: {}", id, e);
            None
        }
    }
}
