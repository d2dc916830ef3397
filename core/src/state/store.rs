use std::path::{Path, PathBuf};

use super::error::Result;
use super::{Slot, StateKind, create_container, load_container};
use crate::machine::Machine;

/// Save state and NVRAM files for one data directory.
///
/// Layout under the root: `Saves/{id}.st{slot}` and `NVRAM/{id}.nv`. Every
/// operation opens, fully reads or writes, and drops its file before
/// returning.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_state_path(&self, identity: &str, slot: Slot) -> PathBuf {
        self.root
            .join("Saves")
            .join(format!("{identity}.st{}", slot.index()))
    }

    pub fn nvram_path(&self, identity: &str) -> PathBuf {
        self.root.join("NVRAM").join(format!("{identity}.nv"))
    }

    /// Write the machine's state to `slot`. Returns the file written.
    pub fn save_state(&self, machine: &dyn Machine, slot: Slot) -> Result<PathBuf> {
        let path = self.save_state_path(machine.game_info().id, slot);
        write(StateKind::SaveState, machine, &path)?;
        Ok(path)
    }

    /// Restore the machine from `slot`. Returns the file read.
    pub fn load_state(&self, machine: &mut dyn Machine, slot: Slot) -> Result<PathBuf> {
        let path = self.save_state_path(machine.game_info().id, slot);
        read(StateKind::SaveState, machine, &path)?;
        Ok(path)
    }

    pub fn save_nvram(&self, machine: &dyn Machine) -> Result<PathBuf> {
        let path = self.nvram_path(machine.game_info().id);
        write(StateKind::Nvram, machine, &path)?;
        Ok(path)
    }

    /// Restore NVRAM. A missing file is not an error and yields `Ok(None)`:
    /// the game simply starts from blank NVRAM.
    pub fn load_nvram(&self, machine: &mut dyn Machine) -> Result<Option<PathBuf>> {
        let path = self.nvram_path(machine.game_info().id);
        match read(StateKind::Nvram, machine, &path) {
            Ok(()) => Ok(Some(path)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn write(kind: StateKind, machine: &dyn Machine, path: &Path) -> Result<()> {
    let mut w = create_container(kind, machine.game_info().id);
    match kind {
        StateKind::SaveState => machine.save_state(&mut w)?,
        StateKind::Nvram => machine.save_nvram(&mut w)?,
    }
    w.create(path)
}

fn read(kind: StateKind, machine: &mut dyn Machine, path: &Path) -> Result<()> {
    let (file, _) = load_container(path, kind)?;
    match kind {
        StateKind::SaveState => machine.load_state(&file),
        StateKind::Nvram => machine.load_nvram(&file),
    }
}
