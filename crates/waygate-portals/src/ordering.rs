use std::cmp::Ordering;

use waygate_geom::Vec3;
use waygate_world::Location;

use crate::portal::Portal;

/// Target-list order relative to an observer.
///
/// Portals in the observer's world come first, nearest first by horizontal
/// distance. Portals elsewhere follow, ordered by case-insensitive name. Ties
/// fall through to the portal id so the order is total.
#[derive(Clone, Debug)]
pub struct ProximityOrdering {
    world: String,
    from: Vec3,
}

impl ProximityOrdering {
    pub fn new(world: impl Into<String>, from: Vec3) -> Self {
        Self {
            world: world.into(),
            from: from.with_y(0.0),
        }
    }

    pub fn from_location(observer: &Location) -> Self {
        Self::new(observer.world_name(), observer.pos)
    }

    fn same_world(&self, p: &Portal) -> bool {
        p.spawn_ref().world_name() == self.world
    }

    fn distance_sq(&self, p: &Portal) -> f64 {
        self.from.horizontal_distance_sq(p.spawn_ref().pos())
    }

    pub fn compare(&self, a: &Portal, b: &Portal) -> Ordering {
        let primary = match (self.same_world(a), self.same_world(b)) {
            (true, true) => self.distance_sq(a).total_cmp(&self.distance_sq(b)),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => cmp_ignore_case(a.name(), b.name()),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    }

    pub fn sort(&self, portals: &mut [&Portal]) {
        portals.sort_by(|a, b| self.compare(a, b));
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
