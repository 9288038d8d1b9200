pub mod config;
pub mod game;
pub mod joystick;
pub mod led;

use crate::config::{AppConfig, ConfigSource};
use crate::game::Game;
use crate::joystick::{Joystick, SpiBus};
use crate::led::Leds;
use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    setup()?;

    let (config, report) =
        AppConfig::load().map_err(|e| eyre!("Failed to load configuration: {}", e))?;
    setup_logging(config.log_level());
    match &report.source {
        ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
        ConfigSource::Defaults { missing } => {
            warn!("No config at {}, using defaults", missing.display())
        }
    }
    for warning in &report.warnings {
        warn!("Config: {}", warning);
    }
    debug!("Configuration: {:?}", config);

    // Hardware
    let leds = Leds::open(&config.leds);
    let mut joystick: Joystick<SpiBus> = Joystick::new(config.joystick.clone())
        .map_err(|e| eyre!("Invalid joystick settings: {}", e))?;
    joystick.init();
    if !joystick.is_initialized() {
        warn!("Running without a joystick, no direction will ever be detected");
    }

    println!("Hello embedded world!");
    println!("When the LEDs light up, press the joystick in that direction!");
    println!("(Press left or right to exit)\n");

    let mut game = Game::new(joystick, leds, rand::thread_rng(), config.game.clone());
    game.run();

    let (mut joystick, mut leds) = game.into_parts();
    leds.cleanup();
    joystick.cleanup();
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}

fn setup_logging(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
