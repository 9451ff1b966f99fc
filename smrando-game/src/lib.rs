// The changes suggested by this lint usually make the code more cluttered and less clear:
#![allow(clippy::needless_range_loop)]

use anyhow::{bail, ensure, Context, Result};
use hashbrown::HashMap;
use log::info;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use std::borrow::ToOwned;
use std::hash::Hash;
use std::path::Path;
use strum_macros::{EnumCount, EnumIter, EnumString, VariantNames};

pub type RegionId = usize; // Index into GameData.regions
pub type LocationId = usize; // Index into GameData.locations (unique within one world)
pub type WorldId = usize; // Index into the list of participating worlds (one per player)
pub type Capacity = i16; // Data type used to represent quantities of items held

const DEFAULT_WORLD_JSON: &str = include_str!("../data/world.json");

#[derive(Default, Clone, Debug)]
pub struct IndexedVec<T: Hash + Eq> {
    pub keys: Vec<T>,
    pub index_by_key: HashMap<T, usize>,
}

impl<T: Hash + Eq> IndexedVec<T> {
    pub fn add<U: ToOwned<Owned = T> + ?Sized>(&mut self, name: &U) -> usize {
        if !self.index_by_key.contains_key(&name.to_owned()) {
            let idx = self.keys.len();
            self.index_by_key.insert(name.to_owned(), self.keys.len());
            self.keys.push(name.to_owned());
            idx
        } else {
            self.index_by_key[&name.to_owned()]
        }
    }
}

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    VariantNames,
    EnumCount,
    EnumIter,
    TryFromPrimitive,
    Serialize,
    Deserialize,
    PartialOrd,
    Ord,
)]
#[repr(usize)]
pub enum Item {
    // Super Metroid:
    ETank,        // 0
    Missile,      // 1
    Super,        // 2
    PowerBomb,    // 3
    Bombs,        // 4
    Charge,       // 5
    Ice,          // 6
    HiJump,       // 7
    SpeedBooster, // 8
    Wave,         // 9
    Spazer,       // 10
    SpringBall,   // 11
    Varia,        // 12
    Gravity,      // 13
    XRayScope,    // 14
    Plasma,       // 15
    Grapple,      // 16
    SpaceJump,    // 17
    ScrewAttack,  // 18
    Morph,        // 19
    ReserveTank,  // 20
    // A Link to the Past:
    ProgressiveSword,  // 21
    ProgressiveShield, // 22
    ProgressiveGlove,  // 23
    MoonPearl,         // 24
    Hammer,            // 25
    Somaria,           // 26
    Byrna,             // 27
    Cape,              // 28
    FireRod,           // 29
    IceRod,            // 30
    Lamp,              // 31
    Bombos,            // 32
    Ether,             // 33
    Quake,             // 34
    HeartContainer,    // 35
    FiveRupees,        // 36
    TwentyRupees,      // 37
    // Turtle Rock dungeon items:
    KeyTR,     // 38
    BigKeyTR,  // 39
    MapTR,     // 40
    CompassTR, // 41
    Nothing,   // 42
}

impl Item {
    pub const MEDALLIONS: [Item; 3] = [Item::Bombos, Item::Ether, Item::Quake];

    /// Items that belong to a specific dungeon, and which stay inside that dungeon unless
    /// keysanity is enabled.
    pub fn dungeon(self) -> Option<Dungeon> {
        match self {
            Item::KeyTR | Item::BigKeyTR | Item::MapTR | Item::CompassTR => {
                Some(Dungeon::TurtleRock)
            }
            _ => None,
        }
    }

    pub fn is_stackable(self) -> bool {
        [
            Item::ETank,
            Item::Missile,
            Item::Super,
            Item::PowerBomb,
            Item::ReserveTank,
            Item::ProgressiveSword,
            Item::ProgressiveShield,
            Item::ProgressiveGlove,
            Item::HeartContainer,
            Item::FiveRupees,
            Item::TwentyRupees,
            Item::KeyTR,
            Item::Nothing,
        ]
        .contains(&self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Dungeon {
    TurtleRock,
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, Serialize, Deserialize,
)]
#[repr(usize)]
pub enum Reward {
    BossToken,
    Crystal,
}

/// Whole-game logic helpers shared across many locations.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[repr(usize)]
pub enum Helper {
    CanUsePowerBombs,
    CanPassBombPassages,
    CanDestroyBombWalls,
    CanOpenRedDoors,
    CanIbj,
    CanFly,
    CanParlorSpeedBoost,
    CanSafelyUseScrewAttack,
    CanEnterAndLeaveGauntlet,
    CanWallJumpHard,
    CanLiftLight,
    CanLiftHeavy,
    CanPassSwordOnlyDarkRooms,
    CanBlockLasers,
}

/// Static switches derived from the logic settings. Both polarities of an option are
/// represented, so that requirements never need negation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicFlag {
    Casual,
    Tournament,
    Keysanity,
    KeysRestricted,
    LaunchPadRequiresIce,
    LaunchPadIceOptional,
    HardWallJumps,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Requirement {
    #[default]
    Free,
    Never,
    Item(Item),
    ItemCount(Item, Capacity),
    // Combined count of energy tanks and reserve tanks:
    EnergyReserves(Capacity),
    Helper(Helper),
    Logic(LogicFlag),
    // The medallion assigned to the given dungeon for this world:
    Medallion(Dungeon),
    Rewards(Capacity),
    // Rewards needed by the win condition:
    RequiredBosses,
    And(Vec<Requirement>),
    Or(Vec<Requirement>),
}

impl Requirement {
    pub fn make_and(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                return Requirement::Never;
            } else if let Requirement::Free = req {
                continue;
            } else if let Requirement::And(and_reqs) = req {
                out_reqs.extend(and_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        if out_reqs.is_empty() {
            Requirement::Free
        } else if out_reqs.len() == 1 {
            out_reqs.into_iter().next().unwrap()
        } else {
            Requirement::And(out_reqs)
        }
    }

    pub fn make_or(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                continue;
            } else if let Requirement::Free = req {
                return Requirement::Free;
            } else if let Requirement::Or(or_reqs) = req {
                out_reqs.extend(or_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        if out_reqs.is_empty() {
            Requirement::Never
        } else if out_reqs.len() == 1 {
            out_reqs.into_iter().next().unwrap()
        } else {
            Requirement::Or(out_reqs)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemRule {
    Any,
    Is(Vec<Item>),
    IsNot(Vec<Item>),
}

impl ItemRule {
    pub fn matches(&self, item: Item) -> bool {
        match self {
            ItemRule::Any => true,
            ItemRule::Is(items) => items.contains(&item),
            ItemRule::IsNot(items) => !items.contains(&item),
        }
    }
}

/// Item-specific override consulted only when deciding whether an item may be placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowRule {
    pub items: ItemRule,
    #[serde(default)]
    pub requires: Requirement,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    pub item: Item,
    pub count: usize,
}

// Definitions, as read from JSON ------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionTagDefinition {
    Dungeon(Dungeon),
    RewardCapable {
        reward: Reward,
        #[serde(rename = "bossLocation")]
        boss_location: String,
    },
    MedallionGated(Dungeon),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDefinition {
    pub name: String,
    pub vanilla_item: Item,
    #[serde(default)]
    pub access: Requirement,
    #[serde(default)]
    pub always_allow: Option<AllowRule>,
    #[serde(default)]
    pub allow: Option<AllowRule>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDefinition {
    pub name: String,
    pub area: String,
    #[serde(default)]
    pub start: bool,
    #[serde(default)]
    pub entry: Requirement,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub tags: Vec<RegionTagDefinition>,
    #[serde(default)]
    pub locations: Vec<LocationDefinition>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VictoryDefinition {
    pub region: String,
    #[serde(default)]
    pub requires: Requirement,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldDefinition {
    pub name: String,
    pub regions: Vec<RegionDefinition>,
    pub victory: VictoryDefinition,
}

// Processed game data ----------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionTag {
    Dungeon(Dungeon),
    RewardCapable {
        reward: Reward,
        boss_location_id: LocationId,
    },
    MedallionGated(Dungeon),
}

#[derive(Clone, Debug)]
pub struct Region {
    pub name: String,
    pub area: String,
    pub start: bool,
    pub entry: Requirement,
    pub parents: Vec<RegionId>,
    pub tags: Vec<RegionTag>,
    pub location_ids: Vec<LocationId>,
}

impl Region {
    pub fn dungeon(&self) -> Option<Dungeon> {
        self.tags.iter().find_map(|tag| match tag {
            RegionTag::Dungeon(d) => Some(*d),
            _ => None,
        })
    }

    pub fn reward(&self) -> Option<(Reward, LocationId)> {
        self.tags.iter().find_map(|tag| match tag {
            RegionTag::RewardCapable {
                reward,
                boss_location_id,
            } => Some((*reward, *boss_location_id)),
            _ => None,
        })
    }

    pub fn medallion_gate(&self) -> Option<Dungeon> {
        self.tags.iter().find_map(|tag| match tag {
            RegionTag::MedallionGated(d) => Some(*d),
            _ => None,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Location {
    pub name: String,
    pub region_id: RegionId,
    pub vanilla_item: Item,
    pub access: Requirement,
    pub always_allow: Option<AllowRule>,
    pub allow: Option<AllowRule>,
}

#[derive(Clone, Debug)]
pub struct Victory {
    pub region_id: RegionId,
    pub requires: Requirement,
}

#[derive(Clone, Debug)]
pub struct GameData {
    pub name: String,
    pub regions: Vec<Region>,
    pub locations: Vec<Location>,
    pub region_isv: IndexedVec<String>,
    pub location_isv: IndexedVec<String>,
    pub start_region_ids: Vec<RegionId>,
    pub region_children: Vec<Vec<RegionId>>, // Inverse of Region.parents
    pub victory: Victory,
}

impl GameData {
    pub fn load(path: &Path) -> Result<GameData> {
        let json_str = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        GameData::from_json_str(&json_str)
            .with_context(|| format!("unable to load world data from {}", path.display()))
    }

    /// The world bundled with the crate.
    pub fn default_world() -> Result<GameData> {
        GameData::from_json_str(DEFAULT_WORLD_JSON).context("unable to load bundled world data")
    }

    pub fn from_json_str(json_str: &str) -> Result<GameData> {
        let def: WorldDefinition = serde_json::from_str(json_str)?;
        GameData::from_definition(&def)
    }

    pub fn from_definition(def: &WorldDefinition) -> Result<GameData> {
        let mut region_isv: IndexedVec<String> = IndexedVec::default();
        let mut location_isv: IndexedVec<String> = IndexedVec::default();
        for region_def in &def.regions {
            ensure!(
                !region_isv.index_by_key.contains_key(&region_def.name),
                "duplicate region name: {}",
                region_def.name
            );
            region_isv.add(&region_def.name);
            for loc_def in &region_def.locations {
                ensure!(
                    !location_isv.index_by_key.contains_key(&loc_def.name),
                    "duplicate location name: {}",
                    loc_def.name
                );
                location_isv.add(&loc_def.name);
            }
        }

        let mut regions: Vec<Region> = Vec::with_capacity(def.regions.len());
        let mut locations: Vec<Location> = Vec::with_capacity(location_isv.keys.len());
        for (region_id, region_def) in def.regions.iter().enumerate() {
            let mut parents: Vec<RegionId> = vec![];
            for parent in &region_def.parents {
                let Some(&parent_id) = region_isv.index_by_key.get(parent) else {
                    bail!("region {}: unknown parent region {}", region_def.name, parent);
                };
                parents.push(parent_id);
            }
            if region_def.start && region_def.entry != Requirement::Free {
                bail!(
                    "start region {} must be enterable without items",
                    region_def.name
                );
            }

            let mut location_ids: Vec<LocationId> = vec![];
            for loc_def in &region_def.locations {
                location_ids.push(locations.len());
                locations.push(Location {
                    name: loc_def.name.clone(),
                    region_id,
                    vanilla_item: loc_def.vanilla_item,
                    access: loc_def.access.clone(),
                    always_allow: loc_def.always_allow.clone(),
                    allow: loc_def.allow.clone(),
                });
            }

            let mut tags: Vec<RegionTag> = vec![];
            for tag in &region_def.tags {
                tags.push(match tag {
                    RegionTagDefinition::Dungeon(d) => RegionTag::Dungeon(*d),
                    RegionTagDefinition::MedallionGated(d) => RegionTag::MedallionGated(*d),
                    RegionTagDefinition::RewardCapable {
                        reward,
                        boss_location,
                    } => {
                        let boss_location_id = *location_isv
                            .index_by_key
                            .get(boss_location)
                            .with_context(|| {
                                format!(
                                    "region {}: unknown boss location {}",
                                    region_def.name, boss_location
                                )
                            })?;
                        ensure!(
                            location_ids.contains(&boss_location_id),
                            "region {}: boss location {} belongs to another region",
                            region_def.name,
                            boss_location
                        );
                        RegionTag::RewardCapable {
                            reward: *reward,
                            boss_location_id,
                        }
                    }
                });
            }

            regions.push(Region {
                name: region_def.name.clone(),
                area: region_def.area.clone(),
                start: region_def.start,
                entry: region_def.entry.clone(),
                parents,
                tags,
                location_ids,
            });
        }

        let start_region_ids: Vec<RegionId> = regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.start)
            .map(|(i, _)| i)
            .collect();
        if start_region_ids.is_empty() {
            bail!("world {} has no start region", def.name);
        }

        let mut region_children: Vec<Vec<RegionId>> = vec![vec![]; regions.len()];
        for (region_id, region) in regions.iter().enumerate() {
            for &parent_id in &region.parents {
                region_children[parent_id].push(region_id);
            }
        }

        let victory_region_id = *region_isv
            .index_by_key
            .get(&def.victory.region)
            .with_context(|| format!("unknown victory region {}", def.victory.region))?;

        info!(
            "Loaded world {}: {} regions, {} locations",
            def.name,
            regions.len(),
            locations.len()
        );
        Ok(GameData {
            name: def.name.clone(),
            regions,
            locations,
            region_isv,
            location_isv,
            start_region_ids,
            region_children,
            victory: Victory {
                region_id: victory_region_id,
                requires: def.victory.requires.clone(),
            },
        })
    }

    pub fn location_id(&self, name: &str) -> Option<LocationId> {
        self.location_isv.index_by_key.get(name).copied()
    }

    pub fn region_id(&self, name: &str) -> Option<RegionId> {
        self.region_isv.index_by_key.get(name).copied()
    }

    pub fn location_dungeon(&self, location_id: LocationId) -> Option<Dungeon> {
        self.regions[self.locations[location_id].region_id].dungeon()
    }

    /// The vanilla item of every location, in location order.
    pub fn default_item_pool(&self) -> Vec<Item> {
        self.locations.iter().map(|loc| loc.vanilla_item).collect()
    }

    /// Locations within the given dungeon, over all regions tagged with it.
    pub fn dungeon_location_ids(&self, dungeon: Dungeon) -> Vec<LocationId> {
        (0..self.locations.len())
            .filter(|&loc| self.location_dungeon(loc) == Some(dungeon))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{EnumCount, VariantNames};

    #[test]
    fn test_default_world_loads() {
        let game_data = GameData::default_world().unwrap();
        let pool = game_data.default_item_pool();
        assert_eq!(pool.iter().filter(|&&x| x == Item::KeyTR).count(), 4);
        assert_eq!(game_data.dungeon_location_ids(Dungeon::TurtleRock).len(), 12);
        let tr = game_data.region_id("Turtle Rock").unwrap();
        assert_eq!(game_data.regions[tr].dungeon(), Some(Dungeon::TurtleRock));
        assert_eq!(
            game_data.regions[tr].medallion_gate(),
            Some(Dungeon::TurtleRock)
        );
        let (reward, boss) = game_data.regions[tr].reward().unwrap();
        assert_eq!(reward, Reward::Crystal);
        assert_eq!(game_data.locations[boss].name, "Trinexx");
        assert!(game_data
            .start_region_ids
            .iter()
            .all(|&r| game_data.regions[r].entry == Requirement::Free));
    }

    #[test]
    fn test_item_names() {
        assert_eq!(Item::VARIANTS.len(), Item::COUNT);
        assert_eq!(Item::try_from("Morph").unwrap(), Item::Morph);
        assert!(Item::try_from("Hookshot").is_err());
        assert_eq!(Item::try_from_primitive(19).unwrap(), Item::Morph);
    }

    #[test]
    fn test_make_and_or() {
        let morph = Requirement::Item(Item::Morph);
        assert_eq!(
            Requirement::make_and(vec![Requirement::Free, morph.clone()]),
            morph
        );
        assert_eq!(
            Requirement::make_and(vec![morph.clone(), Requirement::Never]),
            Requirement::Never
        );
        assert_eq!(
            Requirement::make_or(vec![morph.clone(), Requirement::Free]),
            Requirement::Free
        );
        assert_eq!(Requirement::make_or(vec![]), Requirement::Never);
    }

    #[test]
    fn test_requirement_json() {
        let req: Requirement = serde_json::from_str(
            r#"{"and": [{"item": "Morph"}, {"itemCount": ["Missile", 2]}, {"helper": "canIbj"}, "requiredBosses"]}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            Requirement::And(vec![
                Requirement::Item(Item::Morph),
                Requirement::ItemCount(Item::Missile, 2),
                Requirement::Helper(Helper::CanIbj),
                Requirement::RequiredBosses,
            ])
        );
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let json = r#"{
            "name": "broken",
            "regions": [
                {"name": "A", "area": "X", "start": true},
                {"name": "B", "area": "X", "parents": ["Nowhere"]}
            ],
            "victory": {"region": "A"}
        }"#;
        let err = GameData::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("unknown parent region Nowhere"));
    }
}
