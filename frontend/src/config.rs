//! Layered settings: built-in defaults, then the `[global]` table of the
//! config file, then the `[games.<id>]` table, then the command line.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use gantry_core::display::{REFERENCE_HEIGHT, REFERENCE_WIDTH};
use gantry_core::machine::MachineOptions;
use gantry_core::scheduler::SessionOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Args;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unable to format settings: {0}")]
    Format(#[from] toml::ser::Error),
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub x_resolution: u32,
    pub y_resolution: u32,
    pub fullscreen: bool,
    pub throttle: bool,
    pub show_fps: bool,
    pub multi_threaded: bool,
    /// Percent; 100 is unity gain.
    pub volume: u32,
    pub log_level: String,
    /// Base directory of `Saves/` and `NVRAM/`.
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            x_resolution: REFERENCE_WIDTH,
            y_resolution: REFERENCE_HEIGHT,
            fullscreen: false,
            throttle: true,
            show_fps: false,
            multi_threaded: false,
            volume: 100,
            log_level: "info".to_string(),
            data_dir: PathBuf::from("."),
        }
    }
}

/// One table of the config file. Absent keys leave the setting alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    pub x_resolution: Option<u32>,
    pub y_resolution: Option<u32>,
    pub fullscreen: Option<bool>,
    pub throttle: Option<bool>,
    pub show_fps: Option<bool>,
    pub multi_threaded: Option<bool>,
    pub volume: Option<u32>,
    pub log_level: Option<String>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub global: Overrides,
    pub games: HashMap<String, Overrides>,
}

/// `<config dir>/gantry/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gantry").join("config.toml"))
}

impl ConfigFile {
    /// Read `path`. A missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Settings {
    /// Merge every layer for `game`.
    pub fn resolve(file: &ConfigFile, game: Option<&str>, args: &Args) -> Self {
        let mut settings = Self::default();
        settings.apply(&file.global);
        if let Some(section) = game.and_then(|id| file.games.get(id)) {
            settings.apply(section);
        }
        settings.apply_args(args);
        settings
    }

    fn apply(&mut self, o: &Overrides) {
        if let Some(v) = o.x_resolution {
            self.x_resolution = v;
        }
        if let Some(v) = o.y_resolution {
            self.y_resolution = v;
        }
        if let Some(v) = o.fullscreen {
            self.fullscreen = v;
        }
        if let Some(v) = o.throttle {
            self.throttle = v;
        }
        if let Some(v) = o.show_fps {
            self.show_fps = v;
        }
        if let Some(v) = o.multi_threaded {
            self.multi_threaded = v;
        }
        if let Some(v) = o.volume {
            self.volume = v.min(200);
        }
        if let Some(v) = &o.log_level {
            self.log_level = v.clone();
        }
        if let Some(v) = &o.data_dir {
            self.data_dir = v.clone();
        }
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some((w, h)) = args.res {
            self.x_resolution = w;
            self.y_resolution = h;
        }
        // Flags can only switch things on (or throttling off).
        self.fullscreen |= args.fullscreen;
        self.throttle &= !args.no_throttle;
        self.show_fps |= args.show_fps;
        self.multi_threaded |= args.multi_threaded;
        if let Some(v) = args.volume {
            self.volume = v;
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            width: self.x_resolution,
            height: self.y_resolution,
            fullscreen: self.fullscreen,
            throttle: self.throttle,
            show_fps: self.show_fps,
        }
    }

    pub fn machine_options(&self) -> MachineOptions {
        MachineOptions {
            multi_threaded: self.multi_threaded,
        }
    }

    /// The settings as a `[global]` table.
    pub fn dump(&self) -> Result<String, ConfigError> {
        #[derive(Serialize)]
        struct Dump<'a> {
            global: &'a Settings,
        }
        Ok(toml::to_string(&Dump { global: self })?)
    }
}
