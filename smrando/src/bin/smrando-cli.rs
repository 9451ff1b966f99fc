use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use smrando::generate::{generate, CancellationToken, GeneratedSeed, GenerationOutcome};
use smrando::settings::{parse_randomizer_settings, RandomizerSettings};
use smrando_game::GameData;
use smrando_logic::LogicOption;
use std::path::{Path, PathBuf};
use strum::VariantNames;

#[derive(Parser)]
struct Args {
    #[arg(long)]
    settings: Option<PathBuf>,

    // World definition; the bundled world is used if omitted.
    #[arg(long)]
    world: Option<PathBuf>,

    #[arg(long)]
    seed: Option<String>,

    #[arg(long, default_value_t = 1)]
    players: usize,

    #[arg(long)]
    max_attempts: Option<usize>,

    #[arg(long)]
    race: bool,

    #[arg(long)]
    output_randomization: Option<PathBuf>,

    #[arg(long)]
    output_spoiler_log: Option<PathBuf>,

    // Print the accepted logic option names and exit.
    #[arg(long)]
    list_logic_options: bool,
}

fn load_settings(args: &Args) -> Result<RandomizerSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let settings_str = std::fs::read_to_string(path)
                .with_context(|| format!("Unable to read settings at {}", path.display()))?;
            parse_randomizer_settings(&settings_str)
                .with_context(|| format!("Unable to parse settings at {}", path.display()))?
        }
        None => RandomizerSettings::default(),
    };
    if args.seed.is_some() {
        settings.other_settings.random_seed = args.seed.clone();
    }
    if let Some(max_attempts) = args.max_attempts {
        settings.other_settings.max_attempts = max_attempts;
    }
    if args.race {
        settings.other_settings.race = true;
    }
    Ok(settings)
}

fn save_outputs(args: &Args, generated: &GeneratedSeed) -> Result<()> {
    if let Some(path) = &args.output_randomization {
        let json = serde_json::to_string_pretty(&generated.randomization)?;
        write_file(path, &json)?;
    }
    if let Some(path) = &args.output_spoiler_log {
        let json = serde_json::to_string_pretty(&generated.spoiler_log)?;
        write_file(path, &json)?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("Unable to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    if args.list_logic_options {
        for name in LogicOption::VARIANTS {
            println!("{name}");
        }
        return Ok(());
    }
    let game_data = match &args.world {
        Some(path) => GameData::load(path)?,
        None => GameData::default_world()?,
    };
    let settings = load_settings(&args)?;
    let players: Vec<String> = (1..=args.players).map(|i| format!("Player {i}")).collect();

    let cancel = CancellationToken::new();
    match generate(&game_data, &settings, &players, &cancel)? {
        GenerationOutcome::Generated(generated) => {
            info!(
                "Generated seed {} ({}) after {} attempt(s)",
                generated.seed.text, generated.randomization.seed_name, generated.attempts
            );
            save_outputs(&args, &generated)?;
        }
        GenerationOutcome::SettingsUnmet { seed, unmet } => {
            for msg in &unmet {
                warn!("Preference not honored: {msg}");
            }
            save_outputs(&args, &seed)?;
        }
        GenerationOutcome::Exhausted { attempts, message } => {
            bail!("{message} ({attempts} attempts)");
        }
        GenerationOutcome::Cancelled => {
            bail!("Generation cancelled");
        }
    }
    Ok(())
}
