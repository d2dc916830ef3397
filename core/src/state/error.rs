use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

/// Failures of the save state / NVRAM container.
///
/// None of these are fatal to a running session: the operation is abandoned
/// and the machine keeps whatever state it had.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} does not appear to be a valid {block} file", path.display())]
    FormatMismatch { path: PathBuf, block: &'static str },

    #[error("{} is incompatible with this version (format {found}, expected {expected})", path.display())]
    VersionIncompatibility {
        path: PathBuf,
        found: i32,
        expected: i32,
    },

    #[error("block '{0}' not found")]
    BlockNotFound(String),

    #[error("block '{block}' truncated: wanted {wanted} bytes, {available} left")]
    Truncated {
        block: String,
        wanted: usize,
        available: usize,
    },

    #[error("corrupt state data: {0}")]
    Corrupt(String),
}

impl StateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
