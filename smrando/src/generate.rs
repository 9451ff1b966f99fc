use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use smrando_game::GameData;
use thiserror::Error;

use crate::playthrough::Playthrough;
use crate::randomize::{Randomization, Randomizer};
use crate::settings::{ConfigError, RandomizerSettings};
use crate::spoiler_log::{get_spoiler_log, SpoilerLog};

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSeed {
    pub value: u64,
    // Decimal rendering of `value`; parsing it again yields the same value.
    pub text: String,
}

fn fnv1a_64(s: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for b in s.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn parse_hex(s: &str) -> Option<u64> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).ok()
}

/// Turns user input into a numeric seed: decimal first, then hex, otherwise a stable hash of the
/// text. Missing or blank input draws a fresh seed.
pub fn parse_seed(input: Option<&str>) -> ParsedSeed {
    let s = input.map(str::trim).unwrap_or("");
    let value = if s.is_empty() {
        rand::rngs::StdRng::from_entropy().next_u64() & 0xFFFFFFFF
    } else if let Ok(v) = s.parse::<u64>() {
        v
    } else if let Some(v) = parse_hex(s) {
        v
    } else {
        fnv1a_64(s)
    };
    ParsedSeed {
        value,
        text: value.to_string(),
    }
}

/// Cooperative cancellation flag, checked between attempts and between fill tiers.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
#[error("generation cancelled")]
pub struct Cancelled;

#[derive(Debug)]
pub struct GeneratedSeed {
    pub seed: ParsedSeed,
    pub randomization: Randomization,
    pub spoiler_log: SpoilerLog,
    pub attempts: usize,
}

#[derive(Debug)]
pub enum GenerationOutcome {
    Generated(Box<GeneratedSeed>),
    // Completable, but some requested preferences were not honored:
    SettingsUnmet {
        seed: Box<GeneratedSeed>,
        unmet: Vec<String>,
    },
    Exhausted {
        attempts: usize,
        message: String,
    },
    Cancelled,
}

fn get_generated_seed(
    game_data: &GameData,
    settings: &RandomizerSettings,
    seed: &ParsedSeed,
    mut randomization: Randomization,
    attempts: usize,
) -> GeneratedSeed {
    let spoiler_log = get_spoiler_log(game_data, settings, &randomization, &seed.text);
    if settings.other_settings.race {
        randomization.playthrough = Playthrough::default();
    }
    GeneratedSeed {
        seed: seed.clone(),
        randomization,
        spoiler_log,
        attempts,
    }
}

/// Runs fill attempts from one seeded random stream until one succeeds with every preference
/// honored, the attempt budget runs out, or `cancel` is triggered. Only configuration problems
/// are returned as errors, and those are detected before any attempt runs.
pub fn generate(
    game_data: &GameData,
    settings: &RandomizerSettings,
    players: &[String],
    cancel: &CancellationToken,
) -> Result<GenerationOutcome, ConfigError> {
    let randomizer = Randomizer::new(game_data, settings, players)?;
    let seed = parse_seed(settings.other_settings.random_seed.as_deref());
    let race = settings.other_settings.race;
    let mut rng_seed = [0u8; 32];
    rng_seed[..8].copy_from_slice(&seed.value.to_le_bytes());
    rng_seed[9] = race as u8;
    let mut rng = rand::rngs::StdRng::from_seed(rng_seed);
    let display_seed = if race {
        rng.next_u64() & 0xFFFFFFFF
    } else {
        seed.value
    };
    let max_attempts = settings.other_settings.max_attempts;
    info!(
        "Generating seed {} for {} player(s), race={race}",
        seed.text,
        players.len()
    );

    let mut last_unmet: Option<(Randomization, Vec<String>, usize)> = None;
    let mut last_error = String::new();
    for attempt_num in 1..=max_attempts {
        if cancel.is_cancelled() {
            info!("Generation cancelled before attempt {attempt_num}");
            return Ok(GenerationOutcome::Cancelled);
        }
        let attempt_seed = rng.next_u64() & 0xFFFFFFFF;
        info!("Attempt {attempt_num}/{max_attempts}: item placement seed={attempt_seed}");
        match randomizer.randomize(attempt_num, attempt_seed, display_seed, cancel) {
            Ok(randomization) => {
                let unmet = randomizer.get_unmet_preferences(&randomization);
                if unmet.is_empty() {
                    let generated =
                        get_generated_seed(game_data, settings, &seed, randomization, attempt_num);
                    return Ok(GenerationOutcome::Generated(Box::new(generated)));
                }
                info!(
                    "[attempt {attempt_num}] Completable, but preferences unmet: {}",
                    unmet.join("; ")
                );
                last_unmet = Some((randomization, unmet, attempt_num));
            }
            Err(e) if e.is::<Cancelled>() => {
                info!("[attempt {attempt_num}] Generation cancelled");
                return Ok(GenerationOutcome::Cancelled);
            }
            Err(e) => {
                info!("Attempt {attempt_num}/{max_attempts}: Randomization failed: {e}");
                last_error = e.to_string();
            }
        }
    }

    match last_unmet {
        Some((randomization, unmet, attempts)) => {
            warn!(
                "Exhausted randomization attempts; keeping attempt {attempts} with unmet preferences"
            );
            let generated = get_generated_seed(game_data, settings, &seed, randomization, attempts);
            Ok(GenerationOutcome::SettingsUnmet {
                seed: Box::new(generated),
                unmet,
            })
        }
        None => Ok(GenerationOutcome::Exhausted {
            attempts: max_attempts,
            message: format!("Exhausted randomization attempts: {last_error}"),
        }),
    }
}
