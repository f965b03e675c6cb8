use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use hashbrown::{HashMap, HashSet};
use waygate_blocks::{BlockStore, MaterialCatalog, MaterialId};
use waygate_geom::BlockPos;
use waygate_io::{RecordStore, StoreError};
use waygate_world::{Location, WorldLookup};

use crate::block::PortalBlock;
use crate::codec;
use crate::ordering::ProximityOrdering;
use crate::portal::{GroupMembership, Icon, OwnerId, Portal, PortalId};
use crate::style::{Style, StyleKey, StyleRegistry};

/// Registry behind the single lock every command path goes through.
pub type SharedPortals<S> = Arc<Mutex<Portals<S>>>;

/// Directed link edges `source -> destination`.
///
/// A source has at most one destination; a destination may be the target of
/// several sources.
#[derive(Default, Debug, Clone)]
pub struct LinkGraph {
    outgoing: HashMap<PortalId, PortalId>,
    incoming: HashMap<PortalId, HashSet<PortalId>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `src -> dst`, returning the destination it replaced.
    pub fn link(&mut self, src: PortalId, dst: PortalId) -> Option<PortalId> {
        let previous = self.unlink(src);
        self.outgoing.insert(src, dst);
        self.incoming.entry(dst).or_default().insert(src);
        previous
    }

    /// Remove the outgoing edge of `src`, returning its destination.
    pub fn unlink(&mut self, src: PortalId) -> Option<PortalId> {
        let dst = self.outgoing.remove(&src)?;
        if let Some(sources) = self.incoming.get_mut(&dst) {
            sources.remove(&src);
            if sources.is_empty() {
                self.incoming.remove(&dst);
            }
        }
        Some(dst)
    }

    pub fn destination(&self, src: PortalId) -> Option<PortalId> {
        self.outgoing.get(&src).copied()
    }

    pub fn sources(&self, dst: PortalId) -> impl Iterator<Item = PortalId> + '_ {
        self.incoming.get(&dst).into_iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.outgoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    pub fn clear(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
    }
}

/// What a console block currently displays.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsoleDisplay {
    pub portal: PortalId,
    pub icon: Option<Icon>,
    pub activated: bool,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Owns every portal, the shared styles, and the link graph. All
/// cross-portal mutation goes through here, and every transition re-renders
/// the affected portals before returning.
pub struct Portals<S> {
    catalog: MaterialCatalog,
    styles: StyleRegistry,
    portals: BTreeMap<PortalId, Portal>,
    block_index: HashMap<BlockPos, PortalId>,
    links: LinkGraph,
    consoles: HashMap<BlockPos, ConsoleDisplay>,
    store: S,
}

impl<S> Portals<S> {
    pub fn portal_for(&self, id: PortalId) -> Option<&Portal> {
        self.portals.get(&id)
    }

    pub fn portal_for_block(&self, pos: BlockPos) -> Option<&Portal> {
        self.portals.get(self.block_index.get(&pos)?)
    }

    pub fn portal_block_for(&self, pos: BlockPos) -> Option<(&Portal, &PortalBlock)> {
        let portal = self.portal_for_block(pos)?;
        Some((portal, portal.portal_block_for(pos)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Portal> {
        self.portals.values()
    }

    pub fn ids(&self) -> Vec<PortalId> {
        self.portals.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Shared style by key; unknown keys resolve to the default style.
    pub fn style(&self, key: &StyleKey) -> &Style {
        self.styles.style(key)
    }

    pub fn links(&self) -> &LinkGraph {
        &self.links
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn console_display(&self, pos: BlockPos) -> Option<&ConsoleDisplay> {
        self.consoles.get(&pos)
    }

    /// True while the portal is an endpoint of a link whose other end exists.
    pub fn is_activated(&self, id: PortalId) -> bool {
        if !self.portals.contains_key(&id) {
            return false;
        }
        let outgoing = self
            .links
            .destination(id)
            .is_some_and(|dst| self.portals.contains_key(&dst));
        outgoing || self.links.sources(id).any(|src| self.portals.contains_key(&src))
    }

    /// Portals `viewer` may pick as a target for `source`, nearest first.
    pub fn selectable_targets(
        &self,
        source: PortalId,
        observer: &ProximityOrdering,
        viewer: OwnerId,
        groups: &dyn GroupMembership,
    ) -> Vec<&Portal> {
        let mut out: Vec<&Portal> = self
            .portals
            .values()
            .filter(|p| p.id() != source && p.visible_to(viewer, groups))
            .collect();
        observer.sort(&mut out);
        out
    }

    /// Concrete spawn location, resolving the world lazily.
    pub fn spawn(&mut self, id: PortalId, worlds: &dyn WorldLookup) -> Option<Location> {
        self.portals.get_mut(&id)?.spawn(worlds)
    }

    pub fn set_name(&mut self, id: PortalId, name: &str) -> bool {
        match self.portals.get_mut(&id) {
            Some(p) => {
                p.set_name(name);
                true
            }
            None => false,
        }
    }

    pub fn set_target_locked(&mut self, id: PortalId, locked: bool) -> bool {
        match self.portals.get_mut(&id) {
            Some(p) => {
                p.target_locked = locked;
                true
            }
            None => false,
        }
    }

    pub fn serialize_all(&self) -> Vec<serde_json::Value> {
        self.portals
            .values()
            .map(|p| codec::serialize(p, &self.catalog))
            .collect()
    }

    pub fn save_to(&self, backend: &mut dyn RecordStore) -> Result<usize, StoreError> {
        let records = self.serialize_all();
        backend.save_all(&records)?;
        log::info!("saved {} portal(s)", records.len());
        Ok(records.len())
    }

    pub fn into_shared(self) -> SharedPortals<S> {
        Arc::new(Mutex::new(self))
    }
}

impl<S: BlockStore> Portals<S> {
    pub fn new(mut catalog: MaterialCatalog, styles: Option<StyleRegistry>, store: S) -> Self {
        let styles = styles.unwrap_or_else(|| StyleRegistry::builtin(&mut catalog));
        Self {
            catalog,
            styles,
            portals: BTreeMap::new(),
            block_index: HashMap::new(),
            links: LinkGraph::new(),
            consoles: HashMap::new(),
            store,
        }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Register a portal. Fails on a duplicate id or a block owned elsewhere.
    pub fn insert(&mut self, portal: Portal) -> bool {
        let id = portal.id();
        if self.portals.contains_key(&id) {
            log::warn!("{} already registered", portal);
            return false;
        }
        if let Some(pb) = portal
            .blocks()
            .iter()
            .find(|pb| self.block_index.contains_key(&pb.pos))
        {
            log::warn!("{}: block {:?} belongs to another portal", portal, pb.pos);
            return false;
        }
        for pb in portal.blocks() {
            self.block_index.insert(pb.pos, id);
        }
        log::debug!("registered {}", portal);
        self.portals.insert(id, portal);
        self.update_blocks(id);
        true
    }

    /// Unregister a portal, breaking any link it takes part in first.
    pub fn remove(&mut self, id: PortalId) -> Option<Portal> {
        if !self.portals.contains_key(&id) {
            return None;
        }
        self.disconnect(id);
        let portal = self.portals.remove(&id)?;
        for pb in portal.blocks() {
            self.block_index.remove(&pb.pos);
            self.consoles.remove(&pb.pos);
        }
        log::info!("removed {}", portal);
        Some(portal)
    }

    pub fn add_block(&mut self, id: PortalId, block: PortalBlock) -> bool {
        if self.block_index.contains_key(&block.pos) {
            return false;
        }
        let Some(portal) = self.portals.get_mut(&id) else {
            return false;
        };
        if !portal.push_block(block) {
            return false;
        }
        self.block_index.insert(block.pos, id);
        self.update_blocks(id);
        true
    }

    /// Detach a block from its portal. The block is cleared to
    /// `MaterialId::NONE` so no portal material is left behind.
    pub fn remove_block(&mut self, id: PortalId, pos: BlockPos) -> Option<PortalBlock> {
        let block = self.portals.get_mut(&id)?.take_block(pos)?;
        self.block_index.remove(&pos);
        self.consoles.remove(&pos);
        self.store.set_material(pos, MaterialId::NONE);
        Some(block)
    }

    /// Change the selected target unless the portal's target is locked. A
    /// portal that is currently linked is re-linked to the new target.
    pub fn select_target(&mut self, id: PortalId, target: PortalId) -> bool {
        if id == target || !self.portals.contains_key(&target) {
            return false;
        }
        if self.links.destination(id).is_some() {
            return self.connect(id, target);
        }
        match self.portals.get_mut(&id) {
            Some(p) if !p.target_locked => {
                p.target_id = Some(target);
                true
            }
            _ => false,
        }
    }

    /// Link `src` to `dst`, replacing any previous link of `src`.
    ///
    /// Sets `src`'s target. Fails if either portal is unknown, `src == dst`, or
    /// `src` has a different target locked in.
    pub fn connect(&mut self, src: PortalId, dst: PortalId) -> bool {
        if src == dst || !self.portals.contains_key(&dst) {
            return false;
        }
        let Some(portal) = self.portals.get(&src) else {
            return false;
        };
        if portal.target_locked && portal.target_id != Some(dst) {
            log::debug!("{} target is locked; refusing to link to {}", portal, dst);
            return false;
        }

        let mut affected = vec![src, dst];
        affected.extend(self.links.destination(src));
        let before = self.activation_of(&affected);

        if let Some(p) = self.portals.get_mut(&src) {
            p.target_id = Some(dst);
        }
        let previous = self.links.link(src, dst);
        log::debug!("linked {} -> {} (was {:?})", src, dst, previous);

        self.on_connect(src, dst);
        self.on_connect(dst, src);
        self.refresh_changed(&before, &[src, dst]);
        true
    }

    /// Break every link `id` takes part in. Succeeds (doing nothing) when the
    /// portal is not linked; fails only for an unknown portal.
    pub fn disconnect(&mut self, id: PortalId) -> bool {
        if !self.portals.contains_key(&id) {
            return false;
        }
        let mut partners: Vec<PortalId> = self.links.sources(id).collect();
        partners.extend(self.links.destination(id));
        if partners.is_empty() {
            return true;
        }

        let mut affected = partners.clone();
        affected.push(id);
        let before = self.activation_of(&affected);

        self.links.unlink(id);
        let sources: Vec<PortalId> = self.links.sources(id).collect();
        for src in sources {
            self.links.unlink(src);
        }
        log::debug!("unlinked {} from {} partner(s)", id, partners.len());

        self.on_disconnect(id);
        self.refresh_changed(&before, &[id]);
        true
    }

    /// Link a portal to its selected target. Fails when no target is set or
    /// the target is gone.
    pub fn activate(&mut self, id: PortalId, actor: Option<OwnerId>) -> bool {
        let Some(target) = self.portals.get(&id).and_then(|p| p.target(self)) else {
            return false;
        };
        let target = target.id();
        log::debug!("activate {} -> {} by {:?}", id, target, actor);
        self.connect(id, target)
    }

    pub fn deactivate(&mut self, id: PortalId, actor: Option<OwnerId>) -> bool {
        log::debug!("deactivate {} by {:?}", id, actor);
        self.disconnect(id)
    }

    /// Apply a style to a portal and re-render it.
    pub fn assign_style(&mut self, id: PortalId, style: Style) -> bool {
        let Some(portal) = self.portals.get_mut(&id) else {
            return false;
        };
        portal.set_style(style);
        self.update_blocks(id);
        true
    }

    /// Swap the shared styles (e.g. after a config reload) and re-render everything.
    pub fn replace_styles(&mut self, styles: StyleRegistry) {
        self.styles = styles;
        self.sync_all();
    }

    pub fn replace_catalog(&mut self, catalog: MaterialCatalog, styles: StyleRegistry) {
        self.catalog = catalog;
        self.replace_styles(styles);
    }

    /// Write the effective material of every block of `id`, then refresh its consoles.
    pub fn update_blocks(&mut self, id: PortalId) -> bool {
        let activated = self.is_activated(id);
        let Some(portal) = self.portals.get(&id) else {
            return false;
        };
        let style = portal.effective_style(&self.styles);
        let consoles = portal.update_blocks(style, activated, &mut self.store);
        for pos in consoles {
            self.consoles.insert(
                pos,
                ConsoleDisplay {
                    portal: id,
                    icon: portal.icon(),
                    activated,
                },
            );
        }
        true
    }

    pub fn sync_all(&mut self) {
        for id in self.ids() {
            self.update_blocks(id);
        }
    }

    /// Replace the registry contents with the records in `backend`.
    ///
    /// Links are runtime state; every portal comes back inactive. A bad record
    /// is logged and skipped without affecting the rest.
    pub fn load_from(&mut self, backend: &dyn RecordStore) -> Result<LoadReport, StoreError> {
        let records = backend.load_all()?;
        // Render the outgoing portals inactive before they are dropped.
        if !self.links.is_empty() {
            self.links.clear();
            self.sync_all();
        }
        self.portals.clear();
        self.block_index.clear();
        self.consoles.clear();

        let mut report = LoadReport::default();
        for (i, value) in records.into_iter().enumerate() {
            match codec::deserialize(value, &self.catalog) {
                Ok(portal) => {
                    if self.insert(portal) {
                        report.loaded += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
                Err(e) => {
                    log::warn!("skipping portal record #{}: {}", i, e);
                    report.skipped += 1;
                }
            }
        }
        for p in self.portals.values() {
            if let Some(target) = p.target_id() {
                if !self.portals.contains_key(&target) {
                    log::warn!("{} targets unknown portal {}", p, target);
                }
            }
        }
        log::info!(
            "loaded {} portal(s), skipped {}",
            report.loaded,
            report.skipped
        );
        Ok(report)
    }

    fn on_connect(&mut self, id: PortalId, _other: PortalId) {
        self.update_blocks(id);
    }

    fn on_disconnect(&mut self, id: PortalId) {
        self.update_blocks(id);
    }

    fn activation_of(&self, ids: &[PortalId]) -> Vec<(PortalId, bool)> {
        ids.iter().map(|&id| (id, self.is_activated(id))).collect()
    }

    // Re-render every portal whose activation flipped, except those already
    // rendered by a hook.
    fn refresh_changed(&mut self, before: &[(PortalId, bool)], rendered: &[PortalId]) {
        for &(id, was) in before {
            if rendered.contains(&id) {
                continue;
            }
            if self.is_activated(id) != was {
                self.update_blocks(id);
            }
        }
    }
}
