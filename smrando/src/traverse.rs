use smrando_game::{LocationId, RegionId, WorldId};
use smrando_logic::{requirement_met, Progression};

use crate::world::World;

/// Fixed point of the reachability closure over all participating worlds.
#[derive(Clone, Debug)]
pub struct TraverseResult {
    pub region_reachable: Vec<Vec<bool>>, // [world][region]
    pub location_reachable: Vec<Vec<bool>>, // [world][location]
    // Held items and rewards at the fixed point, one per world:
    pub progression: Vec<Progression>,
    // Locations first reached at each iteration of the closure:
    pub spheres: Vec<Vec<(WorldId, LocationId)>>,
    // Number of spheres that had to be collected before each world's win condition held:
    pub victory_sphere: Vec<Option<usize>>,
}

impl TraverseResult {
    pub fn reachable_locations(&self, world: WorldId) -> Vec<LocationId> {
        self.location_reachable[world]
            .iter()
            .enumerate()
            .filter(|(_, &r)| r)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_beatable(&self) -> bool {
        self.victory_sphere.iter().all(|x| x.is_some())
    }
}

fn update_regions(world: &World, progression: &Progression, reachable: &mut [bool]) {
    let game_data = world.game_data;
    for &r in &game_data.start_region_ids {
        reachable[r] = true;
    }
    // Regions opened in earlier rounds are expanded again, since their children may open now.
    let mut stack: Vec<RegionId> = (0..reachable.len()).filter(|&r| reachable[r]).collect();
    while let Some(r) = stack.pop() {
        for &child in &game_data.region_children[r] {
            if !reachable[child]
                && requirement_met(&game_data.regions[child].entry, progression, &world.logic)
            {
                reachable[child] = true;
                stack.push(child);
            }
        }
    }
}

/// Runs the reachability closure starting from `base` (one Progression per world). Items already
/// placed at reachable locations are credited to the world that owns them; a reward-capable
/// region grants its reward to its own world once its boss location is reached.
pub fn traverse(worlds: &[World], base: &[Progression]) -> TraverseResult {
    let mut progression: Vec<Progression> = base.to_vec();
    let mut region_reachable: Vec<Vec<bool>> = worlds
        .iter()
        .map(|w| vec![false; w.game_data.regions.len()])
        .collect();
    let mut location_reachable: Vec<Vec<bool>> = worlds
        .iter()
        .map(|w| vec![false; w.game_data.locations.len()])
        .collect();
    let mut spheres: Vec<Vec<(WorldId, LocationId)>> = vec![];
    let mut victory_sphere: Vec<Option<usize>> = vec![None; worlds.len()];

    loop {
        for (w, world) in worlds.iter().enumerate() {
            update_regions(world, &progression[w], &mut region_reachable[w]);
            let victory = &world.game_data.victory;
            if victory_sphere[w].is_none()
                && region_reachable[w][victory.region_id]
                && requirement_met(&victory.requires, &progression[w], &world.logic)
            {
                victory_sphere[w] = Some(spheres.len());
            }
        }

        let mut sphere: Vec<(WorldId, LocationId)> = vec![];
        for (w, world) in worlds.iter().enumerate() {
            for (loc, location) in world.game_data.locations.iter().enumerate() {
                if !location_reachable[w][loc]
                    && region_reachable[w][location.region_id]
                    && requirement_met(&location.access, &progression[w], &world.logic)
                {
                    sphere.push((w, loc));
                }
            }
        }
        if sphere.is_empty() {
            break;
        }

        // Items in a sphere only become usable for the next one:
        for &(w, loc) in &sphere {
            location_reachable[w][loc] = true;
            let world = &worlds[w];
            if let Some(placed) = world.placement[loc] {
                progression[placed.world].add(placed.item);
            }
            let region = &world.game_data.regions[world.game_data.locations[loc].region_id];
            if let Some((reward, boss_loc)) = region.reward() {
                if boss_loc == loc {
                    progression[w].add_reward(reward);
                }
            }
        }
        spheres.push(sphere);
    }

    TraverseResult {
        region_reachable,
        location_reachable,
        progression,
        spheres,
        victory_sphere,
    }
}

/// Locations reachable from the given progression, with every placed item collected along the way.
pub fn compute_reachable(worlds: &[World], base: &[Progression]) -> Vec<Vec<LocationId>> {
    let result = traverse(worlds, base);
    (0..worlds.len())
        .map(|w| result.reachable_locations(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PlacedItem;
    use hashbrown::{HashMap, HashSet};
    use smrando_game::{Dungeon, GameData, Item};
    use smrando_logic::{Difficulty, LogicContext};

    fn make_world(game_data: &GameData) -> World {
        let mut medallions = HashMap::new();
        medallions.insert(Dungeon::TurtleRock, Item::Bombos);
        let logic = LogicContext::new(Difficulty::Casual, false, HashSet::new(), medallions, 2);
        World::new(0, "Player 1".to_string(), game_data, logic, vec![])
    }

    #[test]
    fn test_empty_progression_reaches_start_locations() {
        let game_data = GameData::default_world().unwrap();
        let world = make_world(&game_data);
        let worlds = vec![world];
        let result = traverse(&worlds, &[Progression::default()]);
        let names: Vec<&str> = result
            .reachable_locations(0)
            .into_iter()
            .map(|loc| game_data.locations[loc].name.as_str())
            .collect();
        assert!(names.contains(&"Morphing Ball"));
        assert!(names.contains(&"Sahasrahla's Hut - Left"));
        assert!(!names.contains(&"Varia Suit"));
        assert!(!result.is_beatable());
    }

    #[test]
    fn test_placed_items_open_spheres() {
        let game_data = GameData::default_world().unwrap();
        let mut world = make_world(&game_data);
        let morph_ball = game_data.location_id("Morphing Ball").unwrap();
        let pipe = game_data.location_id("Missile (blue Brinstar middle)").unwrap();
        world.place(
            morph_ball,
            PlacedItem {
                item: Item::Morph,
                world: 0,
            },
        );
        let worlds = vec![world];
        let result = traverse(&worlds, &[Progression::default()]);
        let first: Vec<LocationId> = result.spheres[0].iter().map(|&(_, loc)| loc).collect();
        let second: Vec<LocationId> = result.spheres[1].iter().map(|&(_, loc)| loc).collect();
        assert!(first.contains(&morph_ball));
        assert!(!first.contains(&pipe));
        assert!(second.contains(&pipe));
        assert!(result.progression[0].has(Item::Morph));
    }
}
