use serde::{Deserialize, Serialize};
use smrando_game::{Capacity, GameData, Item};
use smrando_logic::Difficulty;

use crate::{
    playthrough::SphereLocation,
    randomize::Randomization,
    settings::{Accessibility, RandomizerSettings},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerSettingsSummary {
    pub difficulty: Difficulty,
    pub logic_options: Vec<String>,
    pub keysanity: bool,
    pub accessibility: Accessibility,
    pub required_bosses: Capacity,
    pub race: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerItemLoc {
    pub player: String,
    pub area: String,
    pub region: String,
    pub location: String,
    pub item: Item,
    pub owner: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerWorld {
    pub player: String,
    pub medallions: Vec<String>,
    pub placements: Vec<SpoilerItemLoc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerSphere {
    pub sphere: usize,
    pub locations: Vec<SpoilerItemLoc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpoilerLog {
    pub seed: String,
    pub seed_name: String,
    pub display_seed: u64,
    pub settings: SpoilerSettingsSummary,
    pub worlds: Vec<SpoilerWorld>,
    pub spheres: Vec<SpoilerSphere>,
}

fn get_spoiler_item_loc(
    game_data: &GameData,
    randomization: &Randomization,
    x: &SphereLocation,
) -> SpoilerItemLoc {
    let location = &game_data.locations[x.location];
    let region = &game_data.regions[location.region_id];
    SpoilerItemLoc {
        player: randomization.worlds[x.world].player.clone(),
        area: region.area.clone(),
        region: region.name.clone(),
        location: location.name.clone(),
        item: x.item.item,
        owner: randomization.worlds[x.item.world].player.clone(),
    }
}

/// Human-readable record of a generated seed. In race mode only the seed and settings are kept.
pub fn get_spoiler_log(
    game_data: &GameData,
    settings: &RandomizerSettings,
    randomization: &Randomization,
    seed_text: &str,
) -> SpoilerLog {
    let race = settings.other_settings.race;
    let item_progression = &settings.item_progression_settings;
    let summary = SpoilerSettingsSummary {
        difficulty: settings.logic_settings.difficulty,
        logic_options: settings.logic_settings.logic_options.clone(),
        keysanity: item_progression.keysanity,
        accessibility: item_progression.accessibility,
        required_bosses: settings.objective_settings.required_bosses,
        race,
    };
    let mut worlds: Vec<SpoilerWorld> = vec![];
    let mut spheres: Vec<SpoilerSphere> = vec![];
    if !race {
        for (w, world) in randomization.worlds.iter().enumerate() {
            let placements = world
                .item_placement
                .iter()
                .enumerate()
                .map(|(location, &item)| {
                    get_spoiler_item_loc(
                        game_data,
                        randomization,
                        &SphereLocation {
                            world: w,
                            location,
                            item,
                        },
                    )
                })
                .collect();
            worlds.push(SpoilerWorld {
                player: world.player.clone(),
                medallions: world
                    .medallions
                    .iter()
                    .map(|(d, m)| format!("{d:?}: {m:?}"))
                    .collect(),
                placements,
            });
        }
        for (i, sphere) in randomization.playthrough.spheres.iter().enumerate() {
            spheres.push(SpoilerSphere {
                sphere: i,
                locations: sphere
                    .locations
                    .iter()
                    .map(|x| get_spoiler_item_loc(game_data, randomization, x))
                    .collect(),
            });
        }
    }
    SpoilerLog {
        // Race seeds are not revealed:
        seed: if race {
            randomization.display_seed.to_string()
        } else {
            seed_text.to_string()
        },
        seed_name: randomization.seed_name.clone(),
        display_seed: randomization.display_seed,
        settings: summary,
        worlds,
        spheres,
    }
}
