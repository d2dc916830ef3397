//! ROM sets and the images machines pull out of them.
//!
//! The front-end turns a ZIP archive or a directory into a [`RomSet`] keyed by
//! file name; a machine then asks for each image it knows about through a
//! [`RomImage`] descriptor, which checks presence and size.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing ROM file: {0}")]
    MissingFile(String),

    #[error("ROM {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid ROM archive {path}: {reason}")]
    InvalidArchive { path: String, reason: String },
}

/// ROM files by name, as handed over by the front-end.
#[derive(Debug, Default)]
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// A set with no files, for machines that run without ROMs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every regular file directly inside `path`, keyed by file name.
    /// Subdirectories are skipped.
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if let Some(name) = file_path.file_name() {
                files.insert(name.to_string_lossy().into_owned(), std::fs::read(&file_path)?);
            }
        }
        Ok(Self { files })
    }

    /// Build from owned (name, data) pairs, e.g. extracted archive entries.
    /// A later duplicate name replaces an earlier one.
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            files: entries.into_iter().collect(),
        }
    }

    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        Self {
            files: entries
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A ROM image a machine knows by name and exact size.
pub struct RomImage {
    pub name: &'static str,
    pub size: usize,
}

impl RomImage {
    /// The image's bytes. Absent or wrongly sized files are errors.
    pub fn load<'a>(&self, rom_set: &'a RomSet) -> Result<&'a [u8], RomLoadError> {
        self.load_optional(rom_set)?
            .ok_or_else(|| RomLoadError::MissingFile(self.name.to_string()))
    }

    /// Like [`load`](Self::load), but an absent file is `Ok(None)`.
    /// A file that is present must still have the right size.
    pub fn load_optional<'a>(&self, rom_set: &'a RomSet) -> Result<Option<&'a [u8]>, RomLoadError> {
        let Some(data) = rom_set.get(self.name) else {
            return Ok(None);
        };
        if data.len() != self.size {
            return Err(RomLoadError::SizeMismatch {
                file: self.name.to_string(),
                expected: self.size,
                actual: data.len(),
            });
        }
        Ok(Some(data))
    }
}
