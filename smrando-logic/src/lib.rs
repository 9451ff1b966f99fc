pub mod helpers;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use smrando_game::{Capacity, Dungeon, Helper, Item, LogicFlag, Requirement, Reward};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumString, VariantNames};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Casual,
    Tournament,
}

/// Optional logic switches that can be enabled by name in the settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumString, VariantNames, Serialize)]
#[strum(serialize_all = "camelCase")]
pub enum LogicOption {
    HardWallJumps,
    LaunchPadRequiresIce,
}

/// Items held by a hypothetical player at some point of a fill or play-through.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Progression {
    pub counts: Vec<Capacity>,  // Indexed by `Item as usize`
    pub rewards: Vec<Capacity>, // Indexed by `Reward as usize`
}

impl Default for Progression {
    fn default() -> Self {
        Progression {
            counts: vec![0; Item::COUNT],
            rewards: vec![0; Reward::COUNT],
        }
    }
}

impl Progression {
    pub fn new(items: &[Item]) -> Self {
        let mut progression = Progression::default();
        for &item in items {
            progression.add(item);
        }
        progression
    }

    pub fn has(&self, item: Item) -> bool {
        self.counts[item as usize] > 0
    }

    pub fn count(&self, item: Item) -> Capacity {
        self.counts[item as usize]
    }

    pub fn has_count(&self, item: Item, count: Capacity) -> bool {
        self.counts[item as usize] >= count
    }

    pub fn has_any(&self, items: &[Item]) -> bool {
        items.iter().any(|&item| self.has(item))
    }

    pub fn add(&mut self, item: Item) {
        self.counts[item as usize] += 1;
    }

    pub fn add_reward(&mut self, reward: Reward) {
        self.rewards[reward as usize] += 1;
    }

    pub fn reward_total(&self) -> Capacity {
        self.rewards.iter().sum()
    }

    pub fn energy_reserves(&self) -> Capacity {
        self.count(Item::ETank) + self.count(Item::ReserveTank)
    }

    /// Every item count and reward count is at least the one in `other`.
    pub fn is_superset_of(&self, other: &Progression) -> bool {
        self.counts.iter().zip(&other.counts).all(|(a, b)| a >= b)
            && self.rewards.iter().zip(&other.rewards).all(|(a, b)| a >= b)
    }

    pub fn items(&self) -> Vec<(Item, Capacity)> {
        Item::iter()
            .filter(|&item| self.has(item))
            .map(|item| (item, self.count(item)))
            .collect()
    }
}

/// Read-only logic state for one world, built once per generation run.
#[derive(Clone, Debug)]
pub struct LogicContext {
    pub difficulty: Difficulty,
    pub keysanity: bool,
    pub options: HashSet<LogicOption>,
    pub medallions: HashMap<Dungeon, Item>,
    pub required_bosses: Capacity,
    helpers: Vec<Requirement>, // Indexed by `Helper as usize`
}

impl LogicContext {
    pub fn new(
        difficulty: Difficulty,
        keysanity: bool,
        options: HashSet<LogicOption>,
        medallions: HashMap<Dungeon, Item>,
        required_bosses: Capacity,
    ) -> Self {
        LogicContext {
            difficulty,
            keysanity,
            options,
            medallions,
            required_bosses,
            helpers: Helper::iter().map(helpers::helper_requirement).collect(),
        }
    }

    pub fn flag(&self, flag: LogicFlag) -> bool {
        match flag {
            LogicFlag::Casual => self.difficulty == Difficulty::Casual,
            LogicFlag::Tournament => self.difficulty == Difficulty::Tournament,
            LogicFlag::Keysanity => self.keysanity,
            LogicFlag::KeysRestricted => !self.keysanity,
            LogicFlag::LaunchPadRequiresIce => {
                self.options.contains(&LogicOption::LaunchPadRequiresIce)
            }
            LogicFlag::LaunchPadIceOptional => {
                !self.options.contains(&LogicOption::LaunchPadRequiresIce)
            }
            LogicFlag::HardWallJumps => self.options.contains(&LogicOption::HardWallJumps),
        }
    }

    pub fn helper(&self, helper: Helper) -> &Requirement {
        &self.helpers[helper as usize]
    }
}

pub fn requirement_met(req: &Requirement, progression: &Progression, ctx: &LogicContext) -> bool {
    match req {
        Requirement::Free => true,
        Requirement::Never => false,
        Requirement::Item(item) => progression.has(*item),
        Requirement::ItemCount(item, count) => progression.has_count(*item, *count),
        Requirement::EnergyReserves(count) => progression.energy_reserves() >= *count,
        Requirement::Helper(helper) => requirement_met(ctx.helper(*helper), progression, ctx),
        Requirement::Logic(flag) => ctx.flag(*flag),
        Requirement::Medallion(dungeon) => match ctx.medallions.get(dungeon) {
            Some(&medallion) => progression.has(medallion),
            None => false,
        },
        Requirement::Rewards(count) => progression.reward_total() >= *count,
        Requirement::RequiredBosses => progression.reward_total() >= ctx.required_bosses,
        Requirement::And(reqs) => reqs.iter().all(|r| requirement_met(r, progression, ctx)),
        Requirement::Or(reqs) => reqs.iter().any(|r| requirement_met(r, progression, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smrando_game::GameData;

    fn context(difficulty: Difficulty) -> LogicContext {
        let mut medallions = HashMap::new();
        medallions.insert(Dungeon::TurtleRock, Item::Quake);
        LogicContext::new(difficulty, false, HashSet::new(), medallions, 2)
    }

    #[test]
    fn test_progression_queries() {
        let mut progression = Progression::new(&[Item::Missile, Item::Missile, Item::Morph]);
        assert!(progression.has(Item::Morph));
        assert!(!progression.has(Item::Bombs));
        assert_eq!(progression.count(Item::Missile), 2);
        assert!(progression.has_count(Item::Missile, 2));
        assert!(!progression.has_count(Item::Missile, 3));
        assert!(progression.has_any(&[Item::Bombs, Item::Morph]));

        let smaller = Progression::new(&[Item::Missile]);
        assert!(progression.is_superset_of(&smaller));
        assert!(!smaller.is_superset_of(&progression));

        progression.add_reward(Reward::Crystal);
        assert!(!smaller.is_superset_of(&progression));
        assert_eq!(progression.reward_total(), 1);
    }

    #[test]
    fn test_helpers() {
        let ctx = context(Difficulty::Casual);
        let ibj = Requirement::Helper(Helper::CanIbj);
        assert!(!requirement_met(&ibj, &Progression::new(&[Item::Morph]), &ctx));
        assert!(requirement_met(
            &ibj,
            &Progression::new(&[Item::Morph, Item::Bombs]),
            &ctx
        ));

        let heavy = Requirement::Helper(Helper::CanLiftHeavy);
        let one_glove = Progression::new(&[Item::ProgressiveGlove]);
        assert!(!requirement_met(&heavy, &one_glove, &ctx));
        assert!(requirement_met(
            &Requirement::Helper(Helper::CanLiftLight),
            &one_glove,
            &ctx
        ));
    }

    #[test]
    fn test_medallion_and_bosses() {
        let ctx = context(Difficulty::Tournament);
        let medallion = Requirement::Medallion(Dungeon::TurtleRock);
        assert!(!requirement_met(&medallion, &Progression::new(&[Item::Ether]), &ctx));
        assert!(requirement_met(&medallion, &Progression::new(&[Item::Quake]), &ctx));

        let mut progression = Progression::default();
        progression.add_reward(Reward::BossToken);
        assert!(!requirement_met(&Requirement::RequiredBosses, &progression, &ctx));
        progression.add_reward(Reward::Crystal);
        assert!(requirement_met(&Requirement::RequiredBosses, &progression, &ctx));
    }

    #[test]
    fn test_logic_flags() {
        let casual = context(Difficulty::Casual);
        let tournament = context(Difficulty::Tournament);
        let req = Requirement::Logic(LogicFlag::Tournament);
        assert!(!requirement_met(&req, &Progression::default(), &casual));
        assert!(requirement_met(&req, &Progression::default(), &tournament));
        assert!(casual.flag(LogicFlag::KeysRestricted));
        assert!(casual.flag(LogicFlag::LaunchPadIceOptional));
    }

    fn arb_counts() -> impl Strategy<Value = Vec<Capacity>> {
        prop::collection::vec(0..3 as Capacity, Item::COUNT)
    }

    proptest! {
        #[test]
        fn test_requirements_are_monotone(base in arb_counts(), extra in arb_counts(), rewards in 0..3 as Capacity) {
            let game_data = GameData::default_world().unwrap();
            let ctx = context(Difficulty::Casual);
            let mut small = Progression::default();
            small.counts = base.clone();
            small.rewards[Reward::BossToken as usize] = rewards;
            let mut large = small.clone();
            for (a, b) in large.counts.iter_mut().zip(&extra) {
                *a += b;
            }
            large.add_reward(Reward::Crystal);
            prop_assert!(large.is_superset_of(&small));

            let mut reqs: Vec<&Requirement> = vec![&game_data.victory.requires];
            reqs.extend(game_data.regions.iter().map(|r| &r.entry));
            reqs.extend(game_data.locations.iter().map(|l| &l.access));
            for req in reqs {
                if requirement_met(req, &small, &ctx) {
                    prop_assert!(requirement_met(req, &large, &ctx));
                }
            }
        }
    }
}
