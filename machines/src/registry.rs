//! Machine registry for automatic front-end discovery.
//!
//! Each machine self-registers via [`inventory::submit!`] with a
//! [`MachineEntry`] containing its CLI name, ROM set name, title and a
//! factory function. The front-end discovers available machines at runtime
//! without any central list.

use gantry_core::machine::{Machine, MachineOptions};

use crate::rom_loader::{RomLoadError, RomSet};

/// Factory: construct a Machine from a loaded ROM set.
pub type CreateFn = fn(&RomSet, &MachineOptions) -> Result<Box<dyn Machine>, RomLoadError>;

/// Describes a front-end-capable arcade machine.
pub struct MachineEntry {
    /// CLI name used to select this machine (e.g., "colorbars").
    pub name: &'static str,
    /// ROM set name for ZIP lookup.
    pub rom_name: &'static str,
    /// Full title, as printed by `--print-games`.
    pub title: &'static str,
    pub create: CreateFn,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        rom_name: &'static str,
        title: &'static str,
        create: CreateFn,
    ) -> Self {
        Self {
            name,
            rom_name,
            title,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Return all registered machines, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a machine by its CLI name.
pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
