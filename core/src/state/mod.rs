//! Save states and NVRAM.
//!
//! Both use the same envelope: a block file whose first block identifies the
//! kind, followed by a 4-byte format version and the ROM set identity as a
//! NUL-terminated string. Machines append their own named blocks after it.
//! When anything changes that breaks compatibility with older files, bump
//! the matching version constant.

mod block;
mod error;
mod store;

use std::fmt;
use std::path::Path;

pub use block::{BlockFile, BlockReader, BlockWriter};
pub use error::{Result, StateError};
pub use store::StateStore;

/// Save state file format version.
pub const STATE_FILE_VERSION: i32 = 1;
/// NVRAM file format version.
pub const NVRAM_FILE_VERSION: i32 = 0;

/// Which of the two container kinds a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    SaveState,
    Nvram,
}

impl StateKind {
    /// Name of the top-level block.
    pub const fn block_name(self) -> &'static str {
        match self {
            Self::SaveState => "Save State",
            Self::Nvram => "NVRAM State",
        }
    }

    /// Format version this build reads and writes.
    pub const fn format_version(self) -> i32 {
        match self {
            Self::SaveState => STATE_FILE_VERSION,
            Self::Nvram => NVRAM_FILE_VERSION,
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SaveState => f.write_str("save state"),
            Self::Nvram => f.write_str("NVRAM"),
        }
    }
}

/// Free-text description stored in the header block.
pub fn description() -> String {
    format!("Gantry Version {}", env!("CARGO_PKG_VERSION"))
}

/// Start a container of `kind` for the ROM set `identity`.
///
/// The returned writer is positioned after the header; whatever the machine
/// writes next goes into blocks it starts itself.
pub fn create_container(kind: StateKind, identity: &str) -> BlockWriter {
    let mut w = BlockWriter::new(kind.block_name(), &description());
    w.write_i32(kind.format_version());
    w.write_cstr(identity);
    w
}

/// Header block contents of a container that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub kind: StateKind,
    pub version: i32,
    pub identity: String,
    pub description: String,
}

/// Validate the envelope of a loaded file.
///
/// Fails with [`StateError::FormatMismatch`] if the top-level block is
/// missing and [`StateError::VersionIncompatibility`] if the version differs
/// from this build's. Nothing outside `file` is touched either way.
pub fn open_container(file: &BlockFile, kind: StateKind) -> Result<ContainerHeader> {
    let mismatch = || StateError::FormatMismatch {
        path: file.path().to_path_buf(),
        block: kind.block_name(),
    };

    let mut header = file.find_block(kind.block_name()).ok_or_else(mismatch)?;
    let version = header.read_i32().map_err(|_| mismatch())?;
    if version != kind.format_version() {
        return Err(StateError::VersionIncompatibility {
            path: file.path().to_path_buf(),
            found: version,
            expected: kind.format_version(),
        });
    }
    let identity = header.read_cstr().map_err(|_| mismatch())?;

    Ok(ContainerHeader {
        kind,
        version,
        identity,
        description: header.description().to_string(),
    })
}

/// Read the whole file at `path` and validate its envelope.
///
/// The envelope is judged before block damage is: a file whose blocks stop
/// parsing before `kind`'s top-level block appears is a
/// [`StateError::FormatMismatch`], and a wrong version is reported as such
/// even if later blocks are damaged. Damage after a valid header is
/// [`StateError::Corrupt`].
pub fn load_container(path: &Path, kind: StateKind) -> Result<(BlockFile, ContainerHeader)> {
    let bytes = std::fs::read(path).map_err(|e| StateError::io(path, e))?;
    let (file, damage) = BlockFile::parse_partial(path, bytes);
    let header = open_container(&file, kind)?;
    match damage {
        Some(e) => Err(e),
        None => Ok((file, header)),
    }
}

/// One of the ten save state slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Slot(u8);

impl Slot {
    pub const COUNT: u8 = 10;

    pub fn new(index: u8) -> Option<Self> {
        (index < Self::COUNT).then_some(Self(index))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// The following slot, wrapping from 9 back to 0.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % Self::COUNT)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
