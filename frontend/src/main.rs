use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use gantry_core::log::{Log, TracingLogger};
use gantry_core::platform::InitError;
use gantry_core::scheduler::{Context, Session, SessionError};
use gantry_core::state::StateStore;
use gantry_machines::registry;
use gantry_machines::rom_loader::RomLoadError;
use thiserror::Error;

use crate::cli::Args;
use crate::config::{ConfigError, ConfigFile, Settings};

mod audio;
mod cli;
mod clock;
mod config;
mod input;
mod logging;
mod render;
mod rom_path;
mod video;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Logging(String),

    #[error("no game specified (see --print-games)")]
    NoGame,

    #[error("unknown game '{name}'. Available: {available}")]
    UnknownGame { name: String, available: String },

    #[error("unable to load ROMs: {0}")]
    Rom(#[from] RomLoadError),

    #[error("unable to initialize SDL: {0}")]
    Sdl(String),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logging is not up yet, so these failures go straight to stderr.
    let settings = match load_settings(&args).and_then(|s| init_logging(&args, s)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&args, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(args: &Args) -> Result<Settings, AppError> {
    let file = match args.config.clone().or_else(config::default_path) {
        Some(path) => ConfigFile::load(&path)?,
        None => ConfigFile::default(),
    };
    Ok(Settings::resolve(&file, args.game.as_deref(), args))
}

fn init_logging(args: &Args, settings: Settings) -> Result<Settings, AppError> {
    logging::init(&settings.log_level, args.log_file.as_deref()).map_err(AppError::Logging)?;
    Ok(settings)
}

fn run(args: &Args, settings: &Settings) -> Result<(), AppError> {
    if args.print_games {
        print_games();
        return Ok(());
    }
    if args.dump_config {
        print!("{}", settings.dump()?);
        return Ok(());
    }
    if args.print_gl_info {
        let sdl = sdl2::init().map_err(AppError::Sdl)?;
        video::print_gl_info(&sdl)?;
        return Ok(());
    }
    if args.print_inputs && args.game.is_none() {
        input::print_bindings(None);
        return Ok(());
    }

    let name = args.game.as_deref().ok_or(AppError::NoGame)?;
    let entry = registry::find(name).ok_or_else(|| AppError::UnknownGame {
        name: name.to_string(),
        available: registry::all()
            .iter()
            .map(|e| e.name)
            .collect::<Vec<_>>()
            .join(", "),
    })?;

    let rom_set = rom_path::load_rom_set(entry.rom_name, args.rom_path.as_deref())?;
    let mut machine = (entry.create)(&rom_set, &settings.machine_options())?;

    if args.print_inputs {
        input::print_bindings(Some(machine.input_map()));
        return Ok(());
    }

    tracing::info!("Running {} ({})", machine.game_info().title, entry.name);
    if settings.multi_threaded {
        tracing::info!("Multi-threaded emulation requested");
    }

    let sdl = sdl2::init().map_err(AppError::Sdl)?;
    let mut platform = video::SdlPlatform::new(&sdl, settings.volume)?;
    let mut inputs = input::SdlInputs::new(&sdl).map_err(AppError::Sdl)?;
    let mut clock = clock::SdlClock::new(&sdl).map_err(AppError::Sdl)?;

    let log = Log::new(Arc::new(TracingLogger));
    let store = StateStore::new(&settings.data_dir);
    let mut session = Session::new(settings.session_options(), store, log);
    let mut cx = Context {
        machine: machine.as_mut(),
        inputs: &mut inputs,
        platform: &mut platform,
        clock: &mut clock,
    };
    session.run(&mut cx)?;
    Ok(())
}

fn print_games() {
    println!("Supported games:");
    println!();
    println!("    ROM Set         Title");
    println!("    -------         -----");
    for entry in registry::all() {
        println!("    {:<15} {}", entry.name, entry.title);
    }
}
