use uuid::Uuid;
use waygate_blocks::{BlockStore, MaterialCatalog, MaterialId};
use waygate_edit::EditStore;
use waygate_geom::{BlockPos, Vec3};
use waygate_portals::codec;
use waygate_portals::portal::NoGroups;
use waygate_portals::{
    BlockRole, Orientation, OwnerId, Portal, PortalBlock, PortalId, Portals, ProximityOrdering,
    Style, StyleKey, StyleRegistry, Visibility,
};
use waygate_world::{LazyLocation, WorldList};

const OWNER: OwnerId = OwnerId(Uuid::from_u128(1));

fn registry() -> Portals<EditStore> {
    Portals::new(MaterialCatalog::builtin(), None, EditStore::new())
}

// Small gate at (x, 64, z): origin, console, frame pillars, two portal blocks.
fn gate(x: i32, z: i32, name: &str) -> Portal {
    let mut p = Portal::new(
        OWNER,
        Orientation::North,
        LazyLocation::new(
            "overworld",
            Vec3::new(f64::from(x) + 0.5, 65.0, f64::from(z) + 0.5),
            0.0,
            0.0,
        ),
    );
    p.set_name(name);
    p
}

fn gate_blocks(x: i32, z: i32) -> Vec<PortalBlock> {
    vec![
        PortalBlock::new(BlockPos::new(x, 64, z), BlockRole::Origin),
        PortalBlock::new(BlockPos::new(x + 2, 64, z), BlockRole::Console),
        PortalBlock::new(BlockPos::new(x - 1, 65, z), BlockRole::Frame),
        PortalBlock::new(BlockPos::new(x + 1, 65, z), BlockRole::Frame),
        PortalBlock::new(BlockPos::new(x, 65, z), BlockRole::Portal),
        PortalBlock::new(BlockPos::new(x, 66, z), BlockRole::Portal),
    ]
}

fn add(reg: &mut Portals<EditStore>, x: i32, z: i32, name: &str) -> PortalId {
    let p = gate(x, z, name);
    let id = p.id();
    assert!(reg.insert(p));
    for b in gate_blocks(x, z) {
        assert!(reg.add_block(id, b));
    }
    id
}

fn mat(reg: &Portals<EditStore>, key: &str) -> MaterialId {
    reg.catalog().get_id(key).unwrap()
}

fn portal_material(reg: &Portals<EditStore>, x: i32, z: i32) -> MaterialId {
    reg.store().get_material(BlockPos::new(x, 65, z))
}

fn assert_rendered(reg: &Portals<EditStore>, id: PortalId) {
    let portal = reg.portal_for(id).unwrap();
    let style = portal.effective_style(reg.styles());
    let active = reg.is_activated(id);
    for pb in portal.blocks() {
        assert_eq!(
            reg.store().get_material(pb.pos),
            style.material(active, pb.role),
            "{} block {:?} stale",
            portal,
            pb.pos
        );
    }
}

#[test]
fn activate_without_target_fails_and_changes_nothing() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let writes = reg.store().writes();
    assert!(!reg.activate(a, None));
    assert!(!reg.is_activated(a));
    assert_eq!(reg.store().writes(), writes);
}

#[test]
fn activate_with_dangling_target_fails() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    assert!(reg.select_target(a, b));
    reg.remove(b);
    assert!(reg.portal_for(a).unwrap().target(&reg).is_none());
    assert!(!reg.activate(a, Some(OWNER)));
    assert!(!reg.is_activated(a));
}

#[test]
fn connect_then_disconnect() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    assert_eq!(portal_material(&reg, 0, 0), mat(&reg, "air"));

    assert!(reg.connect(a, b));
    assert!(reg.is_activated(a));
    assert!(reg.is_activated(b));
    assert_eq!(reg.portal_for(a).unwrap().target_id(), Some(b));
    // Only the invoking portal's target is set
    assert_eq!(reg.portal_for(b).unwrap().target_id(), None);
    assert_eq!(portal_material(&reg, 0, 0), mat(&reg, "end_gateway"));
    assert_eq!(portal_material(&reg, 20, 0), mat(&reg, "end_gateway"));
    assert_rendered(&reg, a);
    assert_rendered(&reg, b);

    assert!(reg.disconnect(a));
    assert!(!reg.is_activated(a));
    assert!(!reg.is_activated(b));
    assert_eq!(portal_material(&reg, 0, 0), mat(&reg, "air"));
    assert_eq!(portal_material(&reg, 20, 0), mat(&reg, "air"));
    // Target selection survives so the portal can be re-activated
    assert_eq!(reg.portal_for(a).unwrap().target_id(), Some(b));
    assert!(reg.activate(a, None));
    assert!(reg.is_activated(a));
}

#[test]
fn disconnect_inactive_is_idempotent() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let writes = reg.store().writes();
    assert!(reg.disconnect(a));
    assert!(reg.deactivate(a, None));
    assert!(!reg.is_activated(a));
    assert_eq!(reg.store().writes(), writes);
    assert!(!reg.disconnect(PortalId(Uuid::from_u128(404))));
}

#[test]
fn disconnecting_a_destination_breaks_incoming_links() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    assert!(reg.connect(a, b));
    assert!(reg.disconnect(b));
    assert!(!reg.is_activated(a));
    assert!(!reg.is_activated(b));
    assert_rendered(&reg, a);
    assert_rendered(&reg, b);
}

#[test]
fn relink_refreshes_old_and_new_target() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    let c = add(&mut reg, 40, 0, "c");
    assert!(reg.connect(a, b));
    assert!(reg.connect(a, c));

    assert!(!reg.is_activated(b));
    assert!(reg.is_activated(c));
    assert!(reg.is_activated(a));
    assert_eq!(portal_material(&reg, 20, 0), mat(&reg, "air"));
    assert_eq!(portal_material(&reg, 40, 0), mat(&reg, "end_gateway"));
    for id in [a, b, c] {
        assert_rendered(&reg, id);
    }
    assert_eq!(reg.links().len(), 1);
}

#[test]
fn selecting_a_new_target_while_linked_relinks() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    let c = add(&mut reg, 40, 0, "c");
    assert!(reg.connect(a, b));
    assert!(reg.select_target(a, c));

    assert_eq!(reg.portal_for(a).unwrap().target_id(), Some(c));
    assert_eq!(reg.links().destination(a), Some(c));
    assert!(!reg.is_activated(b));
    assert!(reg.is_activated(c));
    for id in [a, b, c] {
        assert_rendered(&reg, id);
    }

    // A locked link is left alone
    assert!(reg.set_target_locked(a, true));
    assert!(!reg.select_target(a, b));
    assert_eq!(reg.links().destination(a), Some(c));
    assert_eq!(reg.portal_for(a).unwrap().target_id(), Some(c));
}

#[test]
fn relink_keeps_old_target_lit_while_other_links_remain() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    let c = add(&mut reg, 40, 0, "c");
    let d = add(&mut reg, 60, 0, "d");
    assert!(reg.connect(a, b));
    assert!(reg.connect(d, b));
    assert!(reg.connect(a, c));
    assert!(reg.is_activated(b));
    assert_eq!(portal_material(&reg, 20, 0), mat(&reg, "end_gateway"));
}

#[test]
fn connect_rejects_self_unknown_and_locked() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    let c = add(&mut reg, 40, 0, "c");
    assert!(!reg.connect(a, a));
    assert!(!reg.connect(a, PortalId(Uuid::from_u128(404))));
    assert!(!reg.connect(PortalId(Uuid::from_u128(404)), a));

    assert!(reg.select_target(a, b));
    assert!(reg.set_target_locked(a, true));
    assert!(!reg.select_target(a, c));
    assert!(!reg.connect(a, c));
    // The locked-in target still works
    assert!(reg.activate(a, None));
    assert_eq!(reg.links().destination(a), Some(b));
}

#[test]
fn update_blocks_is_idempotent() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    reg.connect(a, b);
    let writes = reg.store().writes();
    assert!(reg.update_blocks(a));
    reg.sync_all();
    assert_eq!(reg.store().writes(), writes);
    assert_rendered(&reg, a);
}

#[test]
fn override_and_named_style_rendering() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let nether = mat(&reg, "nether_portal");

    let mut custom = reg.styles().default_style().copy(None);
    custom.set_material(false, BlockRole::Portal, nether);
    assert!(reg.assign_style(a, custom));
    assert_eq!(portal_material(&reg, 0, 0), nether);
    assert!(reg.portal_for(a).unwrap().style_key().is_none());

    // Naming a style drops the override
    assert!(reg.assign_style(a, Style::new(Some(StyleKey::new("test:missing")))));
    let p = reg.portal_for(a).unwrap();
    assert!(p.style_override().is_none());
    assert_eq!(p.style_key().unwrap().as_str(), "test:missing");
    // Unknown shared style renders with the default
    assert_eq!(portal_material(&reg, 0, 0), mat(&reg, "air"));
    assert_rendered(&reg, a);
}

#[test]
fn style_reload_rerenders_every_portal() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let mut catalog = reg.catalog().clone();
    let crying = catalog.get_id("crying_obsidian").unwrap();
    let mut default = Style::builtin_default(&mut catalog);
    default.set_material(false, BlockRole::Frame, crying);
    reg.replace_styles(StyleRegistry::new(default));
    assert_eq!(reg.store().get_material(BlockPos::new(-1, 65, 0)), crying);
    assert_rendered(&reg, a);
}

#[test]
fn console_display_tracks_activation_and_icon() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    let console = BlockPos::new(2, 64, 0);
    let shown = reg.console_display(console).unwrap();
    assert_eq!(shown.portal, a);
    assert!(!shown.activated);
    assert!(shown.icon.is_none());

    reg.connect(a, b);
    assert!(reg.console_display(console).unwrap().activated);

    reg.remove(a);
    assert!(reg.console_display(console).is_none());
    assert!(!reg.console_display(BlockPos::new(22, 64, 0)).unwrap().activated);
}

#[test]
fn blocks_are_owned_by_one_portal() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    let taken = BlockPos::new(0, 64, 0);
    assert!(!reg.add_block(b, PortalBlock::new(taken, BlockRole::Frame)));
    assert!(!reg.add_block(a, PortalBlock::new(taken, BlockRole::Frame)));
    assert_eq!(reg.portal_for_block(taken).unwrap().id(), a);
    let (_, pb) = reg.portal_block_for(taken).unwrap();
    assert_eq!(pb.role, BlockRole::Origin);

    assert_eq!(reg.remove_block(a, taken).unwrap().role, BlockRole::Origin);
    assert!(reg.portal_for_block(taken).is_none());
    assert_eq!(reg.store().get_material(taken), MaterialId::NONE);
    assert_rendered(&reg, a);
    assert!(reg.add_block(b, PortalBlock::new(taken, BlockRole::Frame)));

    // A portal whose blocks overlap another cannot be registered
    let mut record = codec::serialize(reg.portal_for(a).unwrap(), reg.catalog());
    record["id"] = serde_json::json!(Uuid::from_u128(77).to_string());
    let twin = codec::deserialize(record, reg.catalog()).unwrap();
    assert!(!twin.blocks().is_empty());
    assert!(!reg.insert(twin));
    assert_eq!(reg.len(), 2);
}

#[test]
fn remove_breaks_links_and_rerenders_partner() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let b = add(&mut reg, 20, 0, "b");
    reg.connect(a, b);
    let removed = reg.remove(b).unwrap();
    assert_eq!(removed.id(), b);
    assert!(!reg.is_activated(a));
    assert!(reg.links().is_empty());
    assert_rendered(&reg, a);
    // Target id dangles but is treated as absent
    assert_eq!(reg.portal_for(a).unwrap().target_id(), Some(b));
    assert!(!reg.activate(a, None));
}

#[test]
fn selectable_targets_filter_and_sort() {
    let mut reg = registry();
    let src = add(&mut reg, 0, 0, "src");
    let near = add(&mut reg, 10, 0, "near");
    let far = add(&mut reg, 100, 0, "far");
    let stranger = OwnerId(Uuid::from_u128(2));
    // Private but owned by the viewer
    let mut own = gate(200, 0, "own");
    own.set_visibility(Visibility::Private);
    let mut public_other = Portal::new(
        stranger,
        Orientation::South,
        LazyLocation::new("nether", Vec3::ZERO, 0.0, 0.0),
    );
    public_other.set_visibility(Visibility::Public);
    public_other.set_name("Nether hub");
    let public_id = public_other.id();
    assert!(reg.insert(own));
    assert!(reg.insert(public_other));

    let observer = ProximityOrdering::new("overworld", Vec3::ZERO);
    let ids: Vec<PortalId> = reg
        .selectable_targets(src, &observer, OWNER, &NoGroups)
        .iter()
        .map(|p| p.id())
        .collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(&ids[..2], &[near, far]);
    assert_eq!(ids[3], public_id);

    let for_stranger = reg.selectable_targets(src, &observer, stranger, &NoGroups);
    assert_eq!(for_stranger.len(), 1);
    assert_eq!(for_stranger[0].id(), public_id);
}

#[test]
fn spawn_resolves_lazily() {
    let mut reg = registry();
    let a = add(&mut reg, 0, 0, "a");
    let mut worlds = WorldList::new();
    assert!(reg.spawn(a, &worlds).is_none());
    worlds.load("overworld");
    let loc = reg.spawn(a, &worlds).unwrap();
    assert_eq!(loc.world_name(), "overworld");
    assert_eq!(loc.pos, Vec3::new(0.5, 65.0, 0.5));
}
