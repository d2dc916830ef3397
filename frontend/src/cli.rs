use std::path::PathBuf;

use clap::Parser;

/// Run an arcade machine in a window.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "gantry", version, about)]
pub struct Args {
    /// Machine to run (see --print-games).
    pub game: Option<String>,

    /// ZIP archive, directory holding `<rom_name>.zip`, or directory of loose ROM files.
    pub rom_path: Option<PathBuf>,

    /// Display resolution as WIDTH,HEIGHT.
    #[arg(long, value_name = "W,H", value_parser = parse_resolution)]
    pub res: Option<(u32, u32)>,

    /// Run in full screen mode.
    #[arg(long)]
    pub fullscreen: bool,

    /// Disable 60 Hz frame limiting.
    #[arg(long)]
    pub no_throttle: bool,

    /// Show the frame rate in the window caption.
    #[arg(long)]
    pub show_fps: bool,

    /// Let the machine spread emulation across threads.
    #[arg(long)]
    pub multi_threaded: bool,

    /// Audio volume in percent.
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=200))]
    pub volume: Option<u32>,

    /// Configuration file (default: <config dir>/gantry/config.toml).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the log to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// List the supported machines and exit.
    #[arg(long)]
    pub print_games: bool,

    /// Print the input bindings and exit.
    #[arg(long)]
    pub print_inputs: bool,

    /// Print OpenGL driver information and exit.
    #[arg(long)]
    pub print_gl_info: bool,

    /// Print the effective settings and exit.
    #[arg(long)]
    pub dump_config: bool,
}

fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(',')
        .ok_or_else(|| format!("expected WIDTH,HEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| format!("invalid dimension '{v}'"))
    };
    Ok((parse(w)?, parse(h)?))
}
