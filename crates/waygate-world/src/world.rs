use std::collections::HashMap;
use std::sync::Arc;

use waygate_geom::Vec3;

#[derive(Debug, PartialEq, Eq)]
pub struct World {
    pub name: String,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Host-side lookup of loaded worlds by name.
pub trait WorldLookup {
    fn resolve_world(&self, name: &str) -> Option<Arc<World>>;
}

/// Simple name-keyed set of loaded worlds.
#[derive(Default, Debug)]
pub struct WorldList {
    loaded: HashMap<String, Arc<World>>,
}

impl WorldList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load (or return the already loaded) world with this name.
    pub fn load(&mut self, name: &str) -> Arc<World> {
        self.loaded
            .entry(name.to_string())
            .or_insert_with(|| {
                log::info!("world '{}' loaded", name);
                Arc::new(World::new(name))
            })
            .clone()
    }

    /// Drop the registry's handle. Held `Location` snapshots keep their data but
    /// `LazyLocation`s stop resolving to this world.
    pub fn unload(&mut self, name: &str) -> bool {
        let removed = self.loaded.remove(name).is_some();
        if removed {
            log::info!("world '{}' unloaded", name);
        }
        removed
    }
}

impl WorldLookup for WorldList {
    fn resolve_world(&self, name: &str) -> Option<Arc<World>> {
        self.loaded.get(name).cloned()
    }
}

/// A concrete, world-bound position. Cloning yields an independent snapshot.
#[derive(Clone, Debug)]
pub struct Location {
    pub world: Arc<World>,
    pub pos: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    pub fn new(world: Arc<World>, pos: Vec3) -> Self {
        Self {
            world,
            pos,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    #[inline]
    pub fn world_name(&self) -> &str {
        &self.world.name
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.world.name == other.world.name
            && self.pos == other.pos
            && self.yaw == other.yaw
            && self.pitch == other.pitch
    }
}
