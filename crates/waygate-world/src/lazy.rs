use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use waygate_geom::Vec3;

use crate::world::{Location, World, WorldLookup};

#[derive(Clone, Debug)]
enum WorldRef {
    Unresolved(String),
    Resolved { name: String, world: Weak<World> },
}

impl WorldRef {
    fn name(&self) -> &str {
        match self {
            WorldRef::Unresolved(name) | WorldRef::Resolved { name, .. } => name,
        }
    }
}

/// A location whose world is looked up by name on first use.
///
/// Resolution failures are never cached: an absent world leaves the reference
/// unresolved and the next access tries again. A cached world that the lookup
/// no longer serves (unloaded, or replaced by a reload) is dropped in favour of
/// a fresh lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "SerializedLocation", into = "SerializedLocation")]
pub struct LazyLocation {
    world: WorldRef,
    pos: Vec3,
    yaw: f32,
    pitch: f32,
}

impl LazyLocation {
    pub fn new(world_name: impl Into<String>, pos: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            world: WorldRef::Unresolved(world_name.into()),
            pos,
            yaw,
            pitch,
        }
    }

    pub fn from_location(loc: &Location) -> Self {
        Self {
            world: WorldRef::Resolved {
                name: loc.world.name.clone(),
                world: Arc::downgrade(&loc.world),
            },
            pos: loc.pos,
            yaw: loc.yaw,
            pitch: loc.pitch,
        }
    }

    #[inline]
    pub fn world_name(&self) -> &str {
        self.world.name()
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// True while the cached world handle is the one `worlds` currently serves.
    pub fn is_resolved(&self, worlds: &dyn WorldLookup) -> bool {
        match &self.world {
            WorldRef::Unresolved(_) => false,
            WorldRef::Resolved { name, world } => {
                match (world.upgrade(), worlds.resolve_world(name)) {
                    (Some(cached), Some(live)) => Arc::ptr_eq(&cached, &live),
                    _ => false,
                }
            }
        }
    }

    /// Resolve to a concrete location, or `None` if the world is not loaded.
    ///
    /// The lookup is consulted on every call. A cached handle is reused only
    /// while it is the same world the lookup returns; snapshots held elsewhere
    /// do not keep an unloaded world resolvable.
    pub fn location(&mut self, worlds: &dyn WorldLookup) -> Option<Location> {
        let name = self.world.name().to_string();
        let Some(live) = worlds.resolve_world(&name) else {
            if matches!(self.world, WorldRef::Resolved { .. }) {
                log::debug!("world '{}' went away; location unresolved", name);
            }
            self.world = WorldRef::Unresolved(name);
            return None;
        };
        let current = match &self.world {
            WorldRef::Resolved { world, .. } => world
                .upgrade()
                .is_some_and(|cached| Arc::ptr_eq(&cached, &live)),
            WorldRef::Unresolved(_) => false,
        };
        if !current {
            self.world = WorldRef::Resolved {
                name,
                world: Arc::downgrade(&live),
            };
        }
        Some(self.snapshot(live))
    }

    fn snapshot(&self, world: Arc<World>) -> Location {
        Location {
            world,
            pos: self.pos,
            yaw: self.yaw,
            pitch: self.pitch,
        }
    }
}

impl PartialEq for LazyLocation {
    fn eq(&self, other: &Self) -> bool {
        self.world_name() == other.world_name()
            && self.pos == other.pos
            && self.yaw == other.yaw
            && self.pitch == other.pitch
    }
}

#[derive(Serialize, Deserialize)]
struct SerializedLocation {
    world: String,
    x: f64,
    y: f64,
    z: f64,
    #[serde(default)]
    yaw: f32,
    #[serde(default)]
    pitch: f32,
}

impl From<SerializedLocation> for LazyLocation {
    fn from(s: SerializedLocation) -> Self {
        LazyLocation::new(s.world, Vec3::new(s.x, s.y, s.z), s.yaw, s.pitch)
    }
}

impl From<LazyLocation> for SerializedLocation {
    fn from(l: LazyLocation) -> Self {
        SerializedLocation {
            world: l.world_name().to_string(),
            x: l.pos.x,
            y: l.pos.y,
            z: l.pos.z,
            yaw: l.yaw,
            pitch: l.pitch,
        }
    }
}
