use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use waygate_blocks::BlockStore;
use waygate_geom::BlockPos;
use waygate_world::{LazyLocation, Location, WorldLookup};

use crate::block::{BlockRole, PortalBlock};
use crate::registry::Portals;
use crate::style::{Style, StyleKey, StyleRegistry};

pub const DEFAULT_NAME: &str = "Portal";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortalId(pub Uuid);

impl PortalId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the controlling principal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub Uuid);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    North,
    South,
    East,
    West,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    Public,
    Group,
    #[default]
    Private,
}

impl Visibility {
    const ALL: [Visibility; 3] = [Visibility::Public, Visibility::Group, Visibility::Private];

    pub fn next(self) -> Visibility {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Visibility {
        Self::ALL[(self as usize + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Host-side group lookup used for [`Visibility::Group`].
pub trait GroupMembership {
    fn shares_group(&self, a: OwnerId, b: OwnerId) -> bool;
}

/// No groups: GROUP portals are visible to their owner only.
pub struct NoGroups;

impl GroupMembership for NoGroups {
    fn shares_group(&self, _a: OwnerId, _b: OwnerId) -> bool {
        false
    }
}

/// Display item snapshot shown in menus and on consoles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Where a portal's materials come from. Exactly one source is active.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleChoice {
    Named(StyleKey),
    Override(Style),
}

impl Default for StyleChoice {
    fn default() -> Self {
        StyleChoice::Named(StyleKey::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Portal {
    pub(crate) id: PortalId,
    pub(crate) owner: OwnerId,
    pub(crate) orientation: Orientation,
    pub(crate) spawn: LazyLocation,
    pub(crate) blocks: Vec<PortalBlock>,
    pub(crate) name: String,
    pub(crate) style: StyleChoice,
    pub(crate) icon: Option<Icon>,
    pub(crate) visibility: Visibility,
    pub(crate) target_id: Option<PortalId>,
    pub(crate) target_locked: bool,
}

impl Portal {
    pub fn new(owner: OwnerId, orientation: Orientation, spawn: LazyLocation) -> Self {
        Self {
            id: PortalId::new_v4(),
            owner,
            orientation,
            spawn,
            blocks: Vec::new(),
            name: DEFAULT_NAME.to_string(),
            style: StyleChoice::default(),
            icon: None,
            visibility: Visibility::default(),
            target_id: None,
            target_locked: false,
        }
    }

    pub fn id(&self) -> PortalId {
        self.id
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Unresolved spawn reference; use [`Portal::spawn`] for a concrete location.
    pub fn spawn_ref(&self) -> &LazyLocation {
        &self.spawn
    }

    pub fn spawn(&mut self, worlds: &dyn WorldLookup) -> Option<Location> {
        self.spawn.location(worlds)
    }

    pub fn blocks(&self) -> &[PortalBlock] {
        &self.blocks
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Named style reference, or `None` while an override is in effect.
    pub fn style_key(&self) -> Option<&StyleKey> {
        match &self.style {
            StyleChoice::Named(key) => Some(key),
            StyleChoice::Override(_) => None,
        }
    }

    pub fn style_override(&self) -> Option<&Style> {
        match &self.style {
            StyleChoice::Named(_) => None,
            StyleChoice::Override(style) => Some(style),
        }
    }

    pub fn style_choice(&self) -> &StyleChoice {
        &self.style
    }

    /// A keyed style selects the shared style by name; a keyless one becomes the override.
    pub fn set_style(&mut self, style: Style) {
        self.style = match style.key() {
            Some(key) => StyleChoice::Named(key.clone()),
            None => StyleChoice::Override(style),
        };
    }

    pub fn effective_style<'a>(&'a self, styles: &'a StyleRegistry) -> &'a Style {
        match &self.style {
            StyleChoice::Named(key) => styles.style(key),
            StyleChoice::Override(style) => style,
        }
    }

    /// Renamed copy of whichever style is currently in effect.
    pub fn copy_style(&self, styles: &StyleRegistry, new_key: Option<StyleKey>) -> Style {
        self.effective_style(styles).copy(new_key)
    }

    pub fn icon(&self) -> Option<Icon> {
        self.icon.clone()
    }

    pub fn set_icon(&mut self, icon: Option<Icon>) {
        self.icon = icon;
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn visible_to(&self, viewer: OwnerId, groups: &dyn GroupMembership) -> bool {
        match self.visibility {
            Visibility::Public => true,
            Visibility::Group => viewer == self.owner || groups.shares_group(self.owner, viewer),
            Visibility::Private => viewer == self.owner,
        }
    }

    pub fn target_id(&self) -> Option<PortalId> {
        self.target_id
    }

    pub fn target_locked(&self) -> bool {
        self.target_locked
    }

    /// Selected target if it is still registered.
    pub fn target<'a, S>(&self, portals: &'a Portals<S>) -> Option<&'a Portal> {
        portals.portal_for(self.target_id?)
    }

    pub fn portal_block_for(&self, pos: BlockPos) -> Option<&PortalBlock> {
        self.blocks.iter().find(|pb| pb.pos == pos)
    }

    /// Append a block unless its position is already part of this portal.
    pub(crate) fn push_block(&mut self, block: PortalBlock) -> bool {
        if self.portal_block_for(block.pos).is_some() {
            return false;
        }
        self.blocks.push(block);
        true
    }

    pub(crate) fn take_block(&mut self, pos: BlockPos) -> Option<PortalBlock> {
        let i = self.blocks.iter().position(|pb| pb.pos == pos)?;
        Some(self.blocks.remove(i))
    }

    /// Write `style.material(activated, role)` to every owned block.
    /// Returns the console positions so the caller can refresh their displays.
    pub fn update_blocks<S: BlockStore + ?Sized>(
        &self,
        style: &Style,
        activated: bool,
        store: &mut S,
    ) -> Vec<BlockPos> {
        let mut consoles = Vec::new();
        for pb in &self.blocks {
            store.set_material(pb.pos, style.material(activated, pb.role));
            if pb.role == BlockRole::Console {
                consoles.push(pb.pos);
            }
        }
        consoles
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Portal{{id = {}, name = {}}}", self.id, self.name)
    }
}
