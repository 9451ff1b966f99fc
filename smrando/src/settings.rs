use std::str::FromStr;

use anyhow::Result;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use smrando_game::{Capacity, Item, ItemCount};
use smrando_logic::{Difficulty, LogicOption};
use thiserror::Error;

/// Problems with the requested configuration. These are never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("item pool has {items} items but the worlds have {locations} locations")]
    PoolSizeMismatch { items: usize, locations: usize },
    #[error("unknown logic option: {0}")]
    UnknownLogicOption(String),
    #[error("unknown location: {0}")]
    UnknownLocation(String),
    #[error("multiworld is not supported together with {0}")]
    UnsupportedMultiworld(String),
    #[error("no players given")]
    NoWorlds,
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct RandomizerSettings {
    pub name: Option<String>,
    pub logic_settings: LogicSettings,
    pub item_progression_settings: ItemProgressionSettings,
    pub objective_settings: ObjectiveSettings,
    pub other_settings: OtherSettings,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
pub struct LogicSettings {
    pub difficulty: Difficulty,
    #[serde(default)]
    pub logic_options: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ItemPlacement {
    #[default]
    Any,
    // Somewhere in the first sphere:
    Early,
    // At the item's vanilla location(s):
    Original,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ItemPlacementSetting {
    pub item: Item,
    pub placement: ItemPlacement,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct LocationOverride {
    pub location: String,
    pub item: Item,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Accessibility {
    // Every location must be obtainable:
    #[default]
    Full,
    // Only the win condition must be reachable:
    Beatable,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ItemProgressionSettings {
    // Replaces the vanilla pool when non-empty:
    #[serde(default)]
    pub item_pool: Vec<ItemCount>,
    #[serde(default)]
    pub starting_items: Vec<ItemCount>,
    #[serde(default)]
    pub keysanity: bool,
    #[serde(default)]
    pub item_placements: Vec<ItemPlacementSetting>,
    #[serde(default)]
    pub location_overrides: Vec<LocationOverride>,
    #[serde(default)]
    pub accessibility: Accessibility,
    pub max_backtracks: usize,
    pub backtrack_depth: usize,
}

impl Default for ItemProgressionSettings {
    fn default() -> Self {
        ItemProgressionSettings {
            item_pool: vec![],
            starting_items: vec![],
            keysanity: false,
            item_placements: vec![],
            location_overrides: vec![],
            accessibility: Accessibility::Full,
            max_backtracks: 20,
            backtrack_depth: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ObjectiveSettings {
    pub required_bosses: Capacity,
}

impl Default for ObjectiveSettings {
    fn default() -> Self {
        ObjectiveSettings { required_bosses: 2 }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct OtherSettings {
    #[serde(default)]
    pub race: bool,
    #[serde(default)]
    pub random_seed: Option<String>,
    pub max_attempts: usize,
}

impl Default for OtherSettings {
    fn default() -> Self {
        OtherSettings {
            race: false,
            random_seed: None,
            max_attempts: 100,
        }
    }
}

impl RandomizerSettings {
    pub fn get_logic_options(&self) -> Result<HashSet<LogicOption>, ConfigError> {
        let mut out: HashSet<LogicOption> = HashSet::new();
        for name in &self.logic_settings.logic_options {
            let option = LogicOption::from_str(name)
                .map_err(|_| ConfigError::UnknownLogicOption(name.clone()))?;
            out.insert(option);
        }
        Ok(out)
    }

    pub fn get_starting_items(&self) -> Vec<Item> {
        expand_item_counts(&self.item_progression_settings.starting_items)
    }
}

pub fn expand_item_counts(counts: &[ItemCount]) -> Vec<Item> {
    let mut out: Vec<Item> = vec![];
    for x in counts {
        for _ in 0..x.count {
            out.push(x.item);
        }
    }
    out
}

pub fn parse_randomizer_settings(settings_json: &str) -> Result<RandomizerSettings> {
    let mut des = serde_json::Deserializer::from_str(settings_json);
    let settings = serde_path_to_error::deserialize(&mut des)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() -> Result<()> {
        let settings = parse_randomizer_settings(
            r#"{
                "name": "test",
                "logic_settings": {"difficulty": "Tournament", "logic_options": ["hardWallJumps"]},
                "item_progression_settings": {
                    "starting_items": [{"item": "Morph", "count": 1}],
                    "item_placements": [{"item": "Bombs", "placement": "Early"}],
                    "max_backtracks": 5,
                    "backtrack_depth": 2
                },
                "objective_settings": {"required_bosses": 1},
                "other_settings": {"race": true, "max_attempts": 3}
            }"#,
        )?;
        assert_eq!(settings.logic_settings.difficulty, Difficulty::Tournament);
        assert_eq!(settings.get_starting_items(), vec![Item::Morph]);
        assert_eq!(
            settings.item_progression_settings.accessibility,
            Accessibility::Full
        );
        assert!(settings
            .get_logic_options()?
            .contains(&LogicOption::HardWallJumps));
        assert!(settings.other_settings.race);
        Ok(())
    }

    #[test]
    fn test_unknown_logic_option() {
        let mut settings = RandomizerSettings::default();
        settings.logic_settings.logic_options = vec!["fireproofSamus".to_string()];
        assert_eq!(
            settings.get_logic_options().unwrap_err(),
            ConfigError::UnknownLogicOption("fireproofSamus".to_string())
        );
    }

    #[test]
    fn test_bad_settings_report_path() {
        let err = parse_randomizer_settings(
            r#"{"logic_settings": {"difficulty": "Expert"}, "item_progression_settings": {}, "objective_settings": {}, "other_settings": {}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("logic_settings.difficulty"));
    }
}
