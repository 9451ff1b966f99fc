use anyhow::{bail, Result};
use hashbrown::{HashMap, HashSet};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_derive::{Deserialize, Serialize};
use smrando_game::{Capacity, Dungeon, GameData, Item, LocationId, Requirement, WorldId};
use smrando_logic::helpers::item_demand;
use smrando_logic::{LogicContext, LogicOption, Progression};

use crate::generate::{CancellationToken, Cancelled};
use crate::helpers::{pick_random, pick_random_matching};
use crate::playthrough::{generate_playthrough, Playthrough};
use crate::settings::{
    expand_item_counts, Accessibility, ConfigError, ItemPlacement, RandomizerSettings,
};
use crate::traverse::traverse;
use crate::world::{PlacedItem, World};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillState {
    Initialized,
    PlacingProgressionItems,
    PlacingRestrictedItems,
    PlacingFiller,
    Verifying,
    Succeeded,
    Failed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ItemTier {
    // Items some requirement depends on:
    Progression,
    // Dungeon items that must stay inside their own dungeon:
    Restricted,
    Filler,
}

pub struct Randomizer<'a> {
    pub game_data: &'a GameData,
    pub settings: &'a RandomizerSettings,
    pub players: Vec<String>,
    pub logic_options: HashSet<LogicOption>,
    pub starting_items: Vec<Item>,
    pub item_pool: Vec<Item>, // Pool of each world, with starting items replaced by `Nothing`
    pub location_overrides: Vec<(LocationId, Item)>, // Applies to the first world only
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorldPlacement {
    pub player: String,
    pub medallions: Vec<(Dungeon, Item)>,
    pub item_placement: Vec<PlacedItem>, // Indexed by LocationId
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Randomization {
    pub worlds: Vec<WorldPlacement>,
    pub playthrough: Playthrough,
    pub seed: u64,
    pub display_seed: u64,
    pub seed_name: String,
}

// State that changes over the course of one fill attempt
struct RandomizationState<'a> {
    fill_state: FillState,
    worlds: Vec<World<'a>>,
    // Unplaced items of each tier. Queued progression and restricted items count as held when
    // testing reachability; filler never does.
    progression_items: Vec<PlacedItem>,
    restricted_items: Vec<PlacedItem>,
    filler_items: Vec<PlacedItem>,
    backtracks: usize,
}

impl<'a> RandomizationState<'a> {
    fn queue_mut(&mut self, tier: ItemTier) -> &mut Vec<PlacedItem> {
        match tier {
            ItemTier::Progression => &mut self.progression_items,
            ItemTier::Restricted => &mut self.restricted_items,
            ItemTier::Filler => &mut self.filler_items,
        }
    }

    fn assumed_items(&self) -> impl Iterator<Item = &PlacedItem> {
        self.progression_items
            .iter()
            .chain(self.restricted_items.iter())
    }

    // Removes one copy of `item` from whichever tier holds it.
    fn take_item(&mut self, item: PlacedItem) -> Option<ItemTier> {
        for tier in [ItemTier::Progression, ItemTier::Restricted, ItemTier::Filler] {
            let queue = self.queue_mut(tier);
            if let Some(i) = queue.iter().position(|&x| x == item) {
                queue.remove(i);
                return Some(tier);
            }
        }
        None
    }

    fn transition(&mut self, attempt_num: usize, fill_state: FillState) {
        debug!(
            "[attempt {attempt_num}] {:?} -> {:?}",
            self.fill_state, fill_state
        );
        self.fill_state = fill_state;
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(())
}

impl<'a> Randomizer<'a> {
    pub fn new(
        game_data: &'a GameData,
        settings: &'a RandomizerSettings,
        players: &[String],
    ) -> Result<Self, ConfigError> {
        if players.is_empty() {
            return Err(ConfigError::NoWorlds);
        }
        if settings.other_settings.max_attempts == 0 {
            return Err(ConfigError::InvalidSettings(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if settings.objective_settings.required_bosses < 0 {
            return Err(ConfigError::InvalidSettings(
                "required_bosses must not be negative".to_string(),
            ));
        }
        let logic_options = settings.get_logic_options()?;
        let item_progression = &settings.item_progression_settings;
        for x in item_progression
            .item_pool
            .iter()
            .chain(item_progression.starting_items.iter())
        {
            if x.count > Capacity::MAX as usize {
                return Err(ConfigError::InvalidSettings(format!(
                    "count {} of {:?} is out of range",
                    x.count, x.item
                )));
            }
        }
        if players.len() > 1 && !item_progression.location_overrides.is_empty() {
            return Err(ConfigError::UnsupportedMultiworld(
                "location overrides".to_string(),
            ));
        }

        let mut item_pool = if item_progression.item_pool.is_empty() {
            game_data.default_item_pool()
        } else {
            expand_item_counts(&item_progression.item_pool)
        };
        if item_pool.len() != game_data.locations.len() {
            return Err(ConfigError::PoolSizeMismatch {
                items: item_pool.len() * players.len(),
                locations: game_data.locations.len() * players.len(),
            });
        }

        let starting_items = settings.get_starting_items();
        for (i, &item) in starting_items.iter().enumerate() {
            if !item.is_stackable() && starting_items[..i].contains(&item) {
                return Err(ConfigError::InvalidSettings(format!(
                    "starting item {item:?} can only be held once"
                )));
            }
            match item_pool.iter().position(|&x| x == item) {
                Some(i) => item_pool[i] = Item::Nothing,
                None => {
                    return Err(ConfigError::InvalidSettings(format!(
                        "starting item {item:?} is not in the item pool"
                    )))
                }
            }
        }

        let mut location_overrides: Vec<(LocationId, Item)> = vec![];
        for x in &item_progression.location_overrides {
            let Some(loc) = game_data.location_id(&x.location) else {
                return Err(ConfigError::UnknownLocation(x.location.clone()));
            };
            if location_overrides.iter().any(|&(l, _)| l == loc) {
                return Err(ConfigError::InvalidSettings(format!(
                    "location {} is overridden more than once",
                    x.location
                )));
            }
            location_overrides.push((loc, x.item));
        }

        Ok(Randomizer {
            game_data,
            settings,
            players: players.to_vec(),
            logic_options,
            starting_items,
            item_pool,
            location_overrides,
        })
    }

    fn get_item_demand(&self, logic: &LogicContext) -> HashMap<Item, Capacity> {
        let game_data = self.game_data;
        let mut reqs: Vec<&Requirement> = vec![&game_data.victory.requires];
        reqs.extend(game_data.regions.iter().map(|r| &r.entry));
        for loc in &game_data.locations {
            reqs.push(&loc.access);
            reqs.extend(loc.always_allow.iter().map(|x| &x.requires));
            reqs.extend(loc.allow.iter().map(|x| &x.requires));
        }
        item_demand(reqs, logic)
    }

    fn get_initial_state<R: Rng>(&self, attempt_num: usize, rng: &mut R) -> RandomizationState<'a> {
        let settings = self.settings;
        let keysanity = settings.item_progression_settings.keysanity;
        let mut worlds: Vec<World<'a>> = vec![];
        for (id, player) in self.players.iter().enumerate() {
            let medallions = World::draw_medallions(self.game_data, rng);
            let logic = LogicContext::new(
                settings.logic_settings.difficulty,
                keysanity,
                self.logic_options.clone(),
                medallions,
                settings.objective_settings.required_bosses,
            );
            worlds.push(World::new(
                id,
                player.clone(),
                self.game_data,
                logic,
                self.starting_items.clone(),
            ));
        }

        let mut state = RandomizationState {
            fill_state: FillState::Initialized,
            worlds,
            progression_items: vec![],
            restricted_items: vec![],
            filler_items: vec![],
            backtracks: 0,
        };
        for w in 0..state.worlds.len() {
            let demand = self.get_item_demand(&state.worlds[w].logic);
            let start = state.worlds[w].starting_progression();
            let mut seen: HashMap<Item, Capacity> = HashMap::new();
            for &item in &self.item_pool {
                let copy = seen.entry(item).or_insert(0);
                let held = start.count(item) + *copy;
                *copy += 1;
                let placed = PlacedItem { item, world: w };
                if item.dungeon().is_some() && !keysanity {
                    state.restricted_items.push(placed);
                } else if held < demand.get(&item).copied().unwrap_or(0) {
                    state.progression_items.push(placed);
                } else {
                    state.filler_items.push(placed);
                }
            }
        }
        info!(
            "[attempt {attempt_num}] {} progression items, {} restricted items, {} filler items",
            state.progression_items.len(),
            state.restricted_items.len(),
            state.filler_items.len()
        );
        state
    }

    // Starting items plus every unplaced progression or restricted item, for each world.
    fn get_assumed_progression(&self, state: &RandomizationState) -> Vec<Progression> {
        let mut out: Vec<Progression> = state
            .worlds
            .iter()
            .map(|w| w.starting_progression())
            .collect();
        for x in state.assumed_items() {
            out[x.world].add(x.item);
        }
        out
    }

    // Empty dungeon locations that are all still needed for the dungeon's own unplaced items.
    fn get_reserved_locations(&self, state: &RandomizationState) -> HashSet<(WorldId, LocationId)> {
        let mut reserved: HashSet<(WorldId, LocationId)> = HashSet::new();
        for world in &state.worlds {
            if world.logic.keysanity {
                continue;
            }
            let mut needed: HashMap<Dungeon, usize> = HashMap::new();
            for x in state.restricted_items.iter().filter(|x| x.world == world.id) {
                if let Some(d) = x.item.dungeon() {
                    *needed.entry(d).or_insert(0) += 1;
                }
            }
            for (&dungeon, &count) in &needed {
                let free: Vec<LocationId> = world
                    .empty_locations()
                    .into_iter()
                    .filter(|&loc| self.game_data.location_dungeon(loc) == Some(dungeon))
                    .collect();
                if free.len() <= count {
                    reserved.extend(free.into_iter().map(|loc| (world.id, loc)));
                }
            }
        }
        reserved
    }

    fn get_eligible_locations(
        &self,
        state: &RandomizationState,
        item: PlacedItem,
        reserved: &HashSet<(WorldId, LocationId)>,
    ) -> Vec<(WorldId, LocationId)> {
        let assumed = self.get_assumed_progression(state);
        let result = traverse(&state.worlds, &assumed);
        let restricted =
            item.item.dungeon().is_some() && !self.settings.item_progression_settings.keysanity;
        let mut out: Vec<(WorldId, LocationId)> = vec![];
        for (w, world) in state.worlds.iter().enumerate() {
            for loc in world.empty_locations() {
                if !restricted && reserved.contains(&(w, loc)) {
                    continue;
                }
                let region_id = self.game_data.locations[loc].region_id;
                if world.can_fill(
                    loc,
                    item,
                    result.location_reachable[w][loc],
                    result.region_reachable[w][region_id],
                    &result.progression[w],
                ) {
                    out.push((w, loc));
                }
            }
        }
        out
    }

    // Places one copy of `item` in a location accepted by `accept`, if the fill rules allow it.
    fn place_preferred<R: Rng>(
        &self,
        attempt_num: usize,
        state: &mut RandomizationState,
        item: PlacedItem,
        accept: impl Fn(&(WorldId, LocationId)) -> bool,
        rng: &mut R,
    ) -> bool {
        let Some(tier) = state.take_item(item) else {
            warn!(
                "[attempt {attempt_num}] No unplaced {:?} for player {}; preference skipped",
                item.item, self.players[item.world]
            );
            return false;
        };
        let reserved = self.get_reserved_locations(state);
        let eligible = self.get_eligible_locations(state, item, &reserved);
        match pick_random_matching(&eligible, accept, rng) {
            Some(&(w, loc)) => {
                state.worlds[w].place(loc, item);
                true
            }
            None => {
                warn!(
                    "[attempt {attempt_num}] Unable to honor placement preference for {:?}",
                    item.item
                );
                state.queue_mut(tier).push(item);
                false
            }
        }
    }

    fn place_preferences<R: Rng>(
        &self,
        attempt_num: usize,
        state: &mut RandomizationState,
        rng: &mut R,
    ) {
        for &(loc, item) in &self.location_overrides {
            let placed = PlacedItem { item, world: 0 };
            self.place_preferred(attempt_num, state, placed, |&x| x == (0, loc), rng);
        }
        for setting in &self.settings.item_progression_settings.item_placements {
            for w in 0..state.worlds.len() {
                let placed = PlacedItem {
                    item: setting.item,
                    world: w,
                };
                match setting.placement {
                    ItemPlacement::Any => {}
                    ItemPlacement::Early => {
                        let starting: Vec<Progression> = state
                            .worlds
                            .iter()
                            .map(|x| x.starting_progression())
                            .collect();
                        let first_sphere: HashSet<(WorldId, LocationId)> = traverse(
                            &state.worlds,
                            &starting,
                        )
                        .spheres
                        .first()
                        .map(|s| s.iter().copied().collect())
                        .unwrap_or_default();
                        self.place_preferred(
                            attempt_num,
                            state,
                            placed,
                            |x| x.0 == w && first_sphere.contains(x),
                            rng,
                        );
                    }
                    ItemPlacement::Original => {
                        for loc in self.vanilla_locations(setting.item) {
                            self.place_preferred(attempt_num, state, placed, |&x| x == (w, loc), rng);
                        }
                    }
                }
            }
        }
    }

    fn vanilla_locations(&self, item: Item) -> Vec<LocationId> {
        (0..self.game_data.locations.len())
            .filter(|&loc| self.game_data.locations[loc].vanilla_item == item)
            .collect()
    }

    fn place_tier<R: Rng>(
        &self,
        attempt_num: usize,
        tier: ItemTier,
        state: &mut RandomizationState,
        rng: &mut R,
    ) -> Result<()> {
        let item_progression = &self.settings.item_progression_settings;
        let mut history: Vec<(PlacedItem, WorldId, LocationId)> = vec![];
        state.queue_mut(tier).shuffle(rng);
        while let Some(item) = state.queue_mut(tier).pop() {
            let reserved = if tier == ItemTier::Progression {
                self.get_reserved_locations(state)
            } else {
                HashSet::new()
            };
            let candidates = self.get_eligible_locations(state, item, &reserved);
            if let Some(&(w, loc)) = pick_random(&candidates, rng) {
                state.worlds[w].place(loc, item);
                history.push((item, w, loc));
                continue;
            }

            if state.backtracks >= item_progression.max_backtracks {
                bail!(
                    "[attempt {attempt_num}] Attempt failed: no location available for {:?} (player {}) after {} backtracks",
                    item.item,
                    self.players[item.world],
                    state.backtracks
                );
            }
            state.backtracks += 1;
            let depth = item_progression.backtrack_depth.min(history.len());
            debug!(
                "[attempt {attempt_num}] Dead end placing {:?}; undoing {depth} placements",
                item.item
            );
            let queue = state.queue_mut(tier);
            queue.push(item);
            let undone: Vec<(PlacedItem, WorldId, LocationId)> =
                history.drain(history.len() - depth..).collect();
            for &(x, _, _) in &undone {
                queue.push(x);
            }
            queue.shuffle(rng);
            for (_, w, loc) in undone {
                state.worlds[w].clear(loc);
            }
        }
        info!(
            "[attempt {attempt_num}] {:?}: placed {} items, backtracks={}",
            tier,
            history.len(),
            state.backtracks
        );
        Ok(())
    }

    // Filler cannot affect what is reachable, so it goes into any remaining location it may occupy.
    // Allow rules are checked against what each world holds once everything else is placed.
    fn place_filler<R: Rng>(
        &self,
        attempt_num: usize,
        state: &mut RandomizationState,
        rng: &mut R,
    ) -> Result<()> {
        let mut items = std::mem::take(&mut state.filler_items);
        items.shuffle(rng);
        let starting: Vec<Progression> = state
            .worlds
            .iter()
            .map(|w| w.starting_progression())
            .collect();
        let held = traverse(&state.worlds, &starting).progression;
        for item in items {
            let empty: Vec<(WorldId, LocationId)> = state
                .worlds
                .iter()
                .flat_map(|w| w.empty_locations().into_iter().map(move |loc| (w.id, loc)))
                .collect();
            let Some(&(w, loc)) = pick_random_matching(
                &empty,
                |&(w, loc)| state.worlds[w].can_fill(loc, item, true, true, &held[w]),
                rng,
            ) else {
                bail!(
                    "[attempt {attempt_num}] Attempt failed: no location left for filler {:?}",
                    item.item
                );
            };
            state.worlds[w].place(loc, item);
        }
        Ok(())
    }

    fn verify(
        &self,
        attempt_num: usize,
        state: &RandomizationState,
        playthrough: &Playthrough,
    ) -> Result<()> {
        for world in &state.worlds {
            if !world.is_filled() {
                bail!(
                    "[attempt {attempt_num}] Attempt failed: unfilled locations for player {}",
                    world.player
                );
            }
        }
        if !playthrough.is_beatable() {
            bail!("[attempt {attempt_num}] Attempt failed: Game not beatable");
        }
        if self.settings.item_progression_settings.accessibility == Accessibility::Full {
            let reached: HashSet<(WorldId, LocationId)> = playthrough
                .locations()
                .map(|(_, x)| (x.world, x.location))
                .collect();
            for world in &state.worlds {
                for loc in 0..world.placement.len() {
                    if !reached.contains(&(world.id, loc)) {
                        bail!(
                            "[attempt {attempt_num}] Attempt failed: {} not reachable for player {}",
                            self.game_data.locations[loc].name,
                            world.player
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn get_seed_name(&self, seed: u64) -> String {
        let mut rng_seed = [0u8; 32];
        rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
        rng_seed[8] = 1;
        let mut rng = rand::rngs::StdRng::from_seed(rng_seed);
        // Leave out vowels and characters that could read like vowels, to minimize the chance
        // of forming words.
        let alphabet = "256789BCDFGHJKLMNPQRSTVWXYZbcdfghjkmnpqrstvwxyz";
        let mut out: String = String::new();
        let num_chars = 9;
        for _ in 0..num_chars {
            let i = rng.gen_range(0..alphabet.len());
            let c = alphabet.as_bytes()[i] as char;
            out.push(c);
        }
        out
    }

    fn get_randomization(
        &self,
        state: &RandomizationState,
        playthrough: Playthrough,
        seed: u64,
        display_seed: u64,
    ) -> Randomization {
        let worlds = state
            .worlds
            .iter()
            .map(|w| {
                let mut medallions: Vec<(Dungeon, Item)> =
                    w.logic.medallions.iter().map(|(&d, &m)| (d, m)).collect();
                medallions.sort();
                WorldPlacement {
                    player: w.player.clone(),
                    medallions,
                    item_placement: w.placement.iter().flatten().copied().collect(),
                }
            })
            .collect();
        Randomization {
            worlds,
            playthrough,
            seed,
            display_seed,
            seed_name: self.get_seed_name(seed),
        }
    }

    fn run_attempt<R: Rng>(
        &self,
        attempt_num: usize,
        state: &mut RandomizationState,
        cancel: &CancellationToken,
        rng: &mut R,
    ) -> Result<Playthrough> {
        self.place_preferences(attempt_num, state, rng);
        for (fill_state, tier) in [
            (FillState::PlacingProgressionItems, ItemTier::Progression),
            (FillState::PlacingRestrictedItems, ItemTier::Restricted),
        ] {
            check_cancelled(cancel)?;
            state.transition(attempt_num, fill_state);
            self.place_tier(attempt_num, tier, state, rng)?;
        }
        check_cancelled(cancel)?;
        state.transition(attempt_num, FillState::PlacingFiller);
        self.place_filler(attempt_num, state, rng)?;

        state.transition(attempt_num, FillState::Verifying);
        let playthrough = generate_playthrough(&state.worlds);
        self.verify(attempt_num, state, &playthrough)?;
        Ok(playthrough)
    }

    pub fn randomize(
        &self,
        attempt_num: usize,
        seed: u64,
        display_seed: u64,
        cancel: &CancellationToken,
    ) -> Result<Randomization> {
        let mut rng_seed = [0u8; 32];
        rng_seed[..8].copy_from_slice(&seed.to_le_bytes());
        let mut rng = rand::rngs::StdRng::from_seed(rng_seed);
        let mut state = self.get_initial_state(attempt_num, &mut rng);
        for world in &state.worlds {
            info!(
                "[attempt {attempt_num}] {}: medallions {:?}",
                world.player, world.logic.medallions
            );
        }
        match self.run_attempt(attempt_num, &mut state, cancel, &mut rng) {
            Ok(playthrough) => {
                state.transition(attempt_num, FillState::Succeeded);
                Ok(self.get_randomization(&state, playthrough, seed, display_seed))
            }
            Err(e) => {
                state.transition(attempt_num, FillState::Failed);
                Err(e)
            }
        }
    }

    /// Requested preferences that the randomization does not honor, as readable messages.
    pub fn get_unmet_preferences(&self, randomization: &Randomization) -> Vec<String> {
        let mut out: Vec<String> = vec![];
        for &(loc, item) in &self.location_overrides {
            let expected = PlacedItem { item, world: 0 };
            if randomization.worlds[0].item_placement.get(loc) != Some(&expected) {
                out.push(format!(
                    "{} does not hold {:?}",
                    self.game_data.locations[loc].name, item
                ));
            }
        }
        for setting in &self.settings.item_progression_settings.item_placements {
            for (w, world) in randomization.worlds.iter().enumerate() {
                match setting.placement {
                    ItemPlacement::Any => {}
                    ItemPlacement::Early => {
                        if randomization.playthrough.sphere_of_item(w, setting.item) != Some(0) {
                            out.push(format!(
                                "{:?} for player {} is not in the first sphere",
                                setting.item, world.player
                            ));
                        }
                    }
                    ItemPlacement::Original => {
                        let expected = PlacedItem {
                            item: setting.item,
                            world: w,
                        };
                        for loc in self.vanilla_locations(setting.item) {
                            if world.item_placement.get(loc) != Some(&expected) {
                                out.push(format!(
                                    "{:?} for player {} is not at {}",
                                    setting.item, world.player, self.game_data.locations[loc].name
                                ));
                            }
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate, GenerationOutcome};
    use crate::settings::{ItemPlacementSetting, LocationOverride};
    use smrando_game::ItemCount;

    fn players(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Player {i}")).collect()
    }

    #[test]
    fn test_pool_size_mismatch() {
        let game_data = GameData::default_world().unwrap();
        let mut settings = RandomizerSettings::default();
        settings.item_progression_settings.item_pool = vec![ItemCount {
            item: Item::Missile,
            count: 3,
        }];
        let err = Randomizer::new(&game_data, &settings, &players(1)).err();
        assert!(matches!(err, Some(ConfigError::PoolSizeMismatch { items: 3, .. })));
    }

    #[test]
    fn test_starting_items_become_nothing() {
        let game_data = GameData::default_world().unwrap();
        let mut settings = RandomizerSettings::default();
        settings.item_progression_settings.starting_items = vec![ItemCount {
            item: Item::Morph,
            count: 1,
        }];
        let randomizer = Randomizer::new(&game_data, &settings, &players(1)).unwrap();
        assert!(!randomizer.item_pool.contains(&Item::Morph));
        assert!(randomizer.item_pool.contains(&Item::Nothing));
        assert_eq!(randomizer.item_pool.len(), game_data.locations.len());
    }

    #[test]
    fn test_duplicate_unique_starting_item() {
        let game_data = GameData::default_world().unwrap();
        let mut settings = RandomizerSettings::default();
        settings.item_progression_settings.starting_items = vec![ItemCount {
            item: Item::Varia,
            count: 2,
        }];
        assert!(matches!(
            Randomizer::new(&game_data, &settings, &players(1)).err(),
            Some(ConfigError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_multiworld_overrides_unsupported() {
        let game_data = GameData::default_world().unwrap();
        let mut settings = RandomizerSettings::default();
        settings.item_progression_settings.location_overrides = vec![LocationOverride {
            location: "Bombs".to_string(),
            item: Item::Bombs,
        }];
        assert!(Randomizer::new(&game_data, &settings, &players(1)).is_ok());
        assert!(matches!(
            Randomizer::new(&game_data, &settings, &players(2)).err(),
            Some(ConfigError::UnsupportedMultiworld(_))
        ));
    }

    #[test]
    fn test_unknown_override_location() {
        let game_data = GameData::default_world().unwrap();
        let mut settings = RandomizerSettings::default();
        settings.item_progression_settings.location_overrides = vec![LocationOverride {
            location: "Nowhere".to_string(),
            item: Item::Bombs,
        }];
        assert_eq!(
            Randomizer::new(&game_data, &settings, &players(1)).err(),
            Some(ConfigError::UnknownLocation("Nowhere".to_string()))
        );
    }

    #[test]
    fn test_tiers() {
        let game_data = GameData::default_world().unwrap();
        let settings = RandomizerSettings::default();
        let randomizer = Randomizer::new(&game_data, &settings, &players(1)).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let state = randomizer.get_initial_state(1, &mut rng);
        let restricted: Vec<Item> = state.restricted_items.iter().map(|x| x.item).collect();
        assert_eq!(restricted.len(), 7);
        assert!(restricted.iter().all(|x| x.dungeon() == Some(Dungeon::TurtleRock)));
        assert!(state
            .progression_items
            .iter()
            .any(|x| x.item == Item::Morph));
        assert!(state
            .filler_items
            .iter()
            .any(|x| x.item == Item::TwentyRupees));
        let missiles = state
            .progression_items
            .iter()
            .filter(|x| x.item == Item::Missile)
            .count();
        assert_eq!(missiles, 3);
    }

    #[test]
    fn test_assumed_progression_excludes_filler() {
        let game_data = GameData::default_world().unwrap();
        let settings = RandomizerSettings::default();
        let randomizer = Randomizer::new(&game_data, &settings, &players(1)).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let state = randomizer.get_initial_state(1, &mut rng);
        let assumed = randomizer.get_assumed_progression(&state);
        // Only the copies some requirement needs are assumed; surplus copies are filler.
        assert_eq!(assumed[0].count(Item::Missile), 3);
        assert_eq!(assumed[0].count(Item::TwentyRupees), 0);
        assert_eq!(assumed[0].count(Item::KeyTR), 4);
    }

    #[test]
    fn test_item_count_out_of_range() {
        let game_data = GameData::default_world().unwrap();
        let mut settings = RandomizerSettings::default();
        settings.item_progression_settings.starting_items = vec![ItemCount {
            item: Item::Missile,
            count: 40000,
        }];
        assert!(matches!(
            Randomizer::new(&game_data, &settings, &players(1)).err(),
            Some(ConfigError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_default_world_fills() {
        let game_data = GameData::default_world().unwrap();
        let mut settings = RandomizerSettings::default();
        settings.other_settings.random_seed = Some("1".to_string());
        settings.item_progression_settings.item_placements = vec![ItemPlacementSetting {
            item: Item::Morph,
            placement: ItemPlacement::Early,
        }];
        let outcome = generate(&game_data, &settings, &players(1), &CancellationToken::new()).unwrap();
        let generated = match outcome {
            GenerationOutcome::Generated(generated) => generated,
            other => panic!("default world did not fill: {other:?}"),
        };
        let randomization = &generated.randomization;
        assert!(randomization.playthrough.is_beatable());
        assert_eq!(
            randomization.worlds[0].item_placement.len(),
            game_data.locations.len()
        );
        assert_eq!(randomization.seed_name.len(), 9);
        assert_eq!(
            randomization.playthrough.sphere_of_item(0, Item::Morph),
            Some(0)
        );

        let tr = game_data.dungeon_location_ids(Dungeon::TurtleRock);
        for (loc, x) in randomization.worlds[0].item_placement.iter().enumerate() {
            if x.item.dungeon().is_some() {
                assert!(tr.contains(&loc));
            }
        }
    }
}
