//! Watches Overwatch through a few screen pixels and drives Spotify playback as the game
//! moves between menus, queues and character select.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ow_config::AppSettings;
use ow_dispatcher::{ActionConfig, ActionDispatcher, DEFAULT_CONFIG_FILE};
use ow_integrations::{LogDestination, Log, verbosity_to_level};
use ow_screen::{Resolution, RuleSet, ScreenSampler, StateClassifier};

mod poll;
mod setup;

const LOG_FILE: &str = "overwatch_spotify.log";

#[derive(Parser, Debug)]
#[command(name = "overwatch-spotify", author, version)]
#[command(about = "Automatically control Spotify while playing Overwatch")]
struct Args {
    /// 1: Debug, 2: Info, 3 (default): Warning, 4: Error, 5: Critical, 6: None
    #[arg(
        short = 'd',
        long = "debug-level",
        default_value_t = 3,
        num_args = 0..=1,
        default_missing_value = "3",
        value_parser = clap::value_parser!(u8).range(0..=6)
    )]
    debug_level: u8,

    /// Send log output to stderr instead of the log file
    #[arg(long)]
    debug_stderr: bool,

    /// Action configuration file (JSON)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Optional endpoint and polling settings (TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Screen preset to detect against: 1440p or 1080p
    #[arg(long)]
    resolution: Option<Resolution>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let destination = match args.debug_stderr {
        true => LogDestination::Stderr,
        false => LogDestination::File(PathBuf::from(LOG_FILE)),
    };

    ow_integrations::logger::init(verbosity_to_level(args.debug_level), destination)?;
    install_interrupt_handler().context("Unable to install the Ctrl+C handler")?;

    let mut settings = AppSettings::load(args.settings.as_deref())?;
    if let Some(resolution) = args.resolution {
        settings.resolution = resolution;
    }

    let config = ActionConfig::load(&args.config);

    let sampler = ScreenSampler::new().context("Unable to access the screen")?;
    let classifier = StateClassifier::new(sampler, RuleSet::for_resolution(settings.resolution));

    let player = setup::connect(&settings, &std::env::current_dir()?)?;
    let mut dispatcher = ActionDispatcher::new(player, config);

    tracing::info!(target: Log::App, resolution = ?settings.resolution, "Starting poll loop");
    println!("Running. Press Ctrl+C to quit.");

    poll::run(&classifier, &mut dispatcher, settings.poll_interval)
}

/// Logs the interrupt and exits cleanly. The poll loop has nothing to flush or roll back.
fn install_interrupt_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        tracing::info!(target: Log::App, "Received SIGINT");
        std::process::exit(0);
    })
}
