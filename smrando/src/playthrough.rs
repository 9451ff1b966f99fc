use serde::{Deserialize, Serialize};
use smrando_game::{Item, LocationId, RegionId, WorldId};

use crate::traverse::traverse;
use crate::world::{PlacedItem, World};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphereLocation {
    pub world: WorldId,
    pub location: LocationId,
    pub item: PlacedItem,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sphere {
    pub locations: Vec<SphereLocation>,
}

/// Spheres of a filled set of worlds, replayed from each world's starting items.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Playthrough {
    pub spheres: Vec<Sphere>,
    pub victory_sphere: Vec<Option<usize>>, // Indexed by WorldId
}

pub fn generate_playthrough(worlds: &[World]) -> Playthrough {
    let base: Vec<_> = worlds.iter().map(|w| w.starting_progression()).collect();
    let result = traverse(worlds, &base);
    let spheres = result
        .spheres
        .iter()
        .map(|sphere| Sphere {
            locations: sphere
                .iter()
                .filter_map(|&(world, location)| {
                    worlds[world].placement[location].map(|item| SphereLocation {
                        world,
                        location,
                        item,
                    })
                })
                .collect(),
        })
        .collect();
    Playthrough {
        spheres,
        victory_sphere: result.victory_sphere,
    }
}

impl Playthrough {
    pub fn is_beatable(&self) -> bool {
        !self.victory_sphere.is_empty() && self.victory_sphere.iter().all(|x| x.is_some())
    }

    pub fn locations(&self) -> impl Iterator<Item = (usize, &SphereLocation)> {
        self.spheres
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.locations.iter().map(move |x| (i, x)))
    }

    pub fn location_sphere(&self, world: WorldId, location: LocationId) -> Option<usize> {
        self.locations()
            .find(|(_, x)| x.world == world && x.location == location)
            .map(|(i, _)| i)
    }

    /// First sphere in which an item belonging to `world` is found, in any world.
    pub fn sphere_of_item(&self, world: WorldId, item: Item) -> Option<usize> {
        self.locations()
            .find(|(_, x)| x.item.world == world && x.item.item == item)
            .map(|(i, _)| i)
    }

    /// Sphere by which every location of the region has been reached. Regions without
    /// locations are never reported as explored.
    pub fn region_explored_at(
        &self,
        worlds: &[World],
        world: WorldId,
        region: RegionId,
    ) -> Option<usize> {
        let location_ids = &worlds[world].game_data.regions[region].location_ids;
        let mut last = None;
        for &loc in location_ids {
            let sphere = self.location_sphere(world, loc)?;
            last = Some(last.map_or(sphere, |x: usize| x.max(sphere)));
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere_location(world: WorldId, location: LocationId, item: Item) -> SphereLocation {
        SphereLocation {
            world,
            location,
            item: PlacedItem { item, world },
        }
    }

    #[test]
    fn test_queries() {
        let playthrough = Playthrough {
            spheres: vec![
                Sphere {
                    locations: vec![sphere_location(0, 3, Item::Morph)],
                },
                Sphere {
                    locations: vec![
                        sphere_location(0, 1, Item::Missile),
                        sphere_location(1, 1, Item::Missile),
                    ],
                },
            ],
            victory_sphere: vec![Some(2), None],
        };
        assert_eq!(playthrough.sphere_of_item(0, Item::Morph), Some(0));
        assert_eq!(playthrough.sphere_of_item(1, Item::Missile), Some(1));
        assert_eq!(playthrough.sphere_of_item(1, Item::Morph), None);
        assert_eq!(playthrough.location_sphere(0, 1), Some(1));
        assert!(!playthrough.is_beatable());
    }
}
