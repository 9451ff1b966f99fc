use hashbrown::HashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smrando_game::{Dungeon, GameData, Item, LocationId, RegionTag, WorldId};
use smrando_logic::{requirement_met, LogicContext, Progression};

use crate::helpers::pick_random;

/// An item as placed in some location: `world` is the player who receives it, which may differ
/// from the world the location belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedItem {
    pub item: Item,
    pub world: WorldId,
}

/// One player's instance of the region graph together with the items assigned to its locations.
#[derive(Clone, Debug)]
pub struct World<'a> {
    pub id: WorldId,
    pub player: String,
    pub game_data: &'a GameData,
    pub logic: LogicContext,
    pub starting_items: Vec<Item>,
    pub placement: Vec<Option<PlacedItem>>, // Indexed by LocationId
}

impl<'a> World<'a> {
    pub fn new(
        id: WorldId,
        player: String,
        game_data: &'a GameData,
        logic: LogicContext,
        starting_items: Vec<Item>,
    ) -> Self {
        World {
            id,
            player,
            game_data,
            logic,
            starting_items,
            placement: vec![None; game_data.locations.len()],
        }
    }

    /// Draws a medallion for every medallion-gated dungeon, in region order.
    pub fn draw_medallions<R: Rng>(game_data: &GameData, rng: &mut R) -> HashMap<Dungeon, Item> {
        let mut medallions: HashMap<Dungeon, Item> = HashMap::new();
        for region in &game_data.regions {
            for tag in &region.tags {
                if let RegionTag::MedallionGated(dungeon) = tag {
                    if !medallions.contains_key(dungeon) {
                        if let Some(&medallion) = pick_random(&Item::MEDALLIONS, rng) {
                            medallions.insert(*dungeon, medallion);
                        }
                    }
                }
            }
        }
        medallions
    }

    pub fn starting_progression(&self) -> Progression {
        Progression::new(&self.starting_items)
    }

    pub fn is_empty(&self, loc: LocationId) -> bool {
        self.placement[loc].is_none()
    }

    pub fn empty_locations(&self) -> Vec<LocationId> {
        (0..self.placement.len())
            .filter(|&loc| self.is_empty(loc))
            .collect()
    }

    pub fn is_filled(&self) -> bool {
        self.placement.iter().all(|x| x.is_some())
    }

    pub fn place(&mut self, loc: LocationId, item: PlacedItem) {
        self.placement[loc] = Some(item);
    }

    pub fn clear(&mut self, loc: LocationId) {
        self.placement[loc] = None;
    }

    /// Dungeon items stay within their own dungeon of their own world unless keysanity is on.
    pub fn region_can_hold(&self, loc: LocationId, item: PlacedItem) -> bool {
        match item.item.dungeon() {
            Some(dungeon) if !self.logic.keysanity => {
                item.world == self.id && self.game_data.location_dungeon(loc) == Some(dungeon)
            }
            _ => true,
        }
    }

    /// Whether `item` may occupy `loc`, given whether the location is reachable and the
    /// progression this world holds at that point.
    pub fn can_fill(
        &self,
        loc: LocationId,
        item: PlacedItem,
        location_reachable: bool,
        region_reachable: bool,
        progression: &Progression,
    ) -> bool {
        if !self.region_can_hold(loc, item) {
            return false;
        }
        let location = &self.game_data.locations[loc];
        if let Some(rule) = &location.always_allow {
            if region_reachable
                && rule.items.matches(item.item)
                && requirement_met(&rule.requires, progression, &self.logic)
            {
                return true;
            }
        }
        if let Some(rule) = &location.allow {
            if !rule.items.matches(item.item)
                || !requirement_met(&rule.requires, progression, &self.logic)
            {
                return false;
            }
        }
        location_reachable
    }
}
