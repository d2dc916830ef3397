use crate::render::Renderers;
use crate::state::{BlockFile, BlockWriter, StateError};

/// Describes a single input button that a machine accepts.
pub struct InputButton {
    /// Machine-defined button identifier, passed to `set_input()`.
    pub id: u8,
    /// Human-readable name for display/configuration (e.g., "P1 Left", "Coin").
    pub name: &'static str,
}

/// Identity of the loaded ROM set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameInfo {
    /// Short ROM set identifier (e.g., "scud"). Names save state and NVRAM files.
    pub id: &'static str,
    /// Full title shown in the window caption.
    pub title: &'static str,
    /// Size of the fixed program ROM in bytes.
    pub crom_size: usize,
}

/// Options handed to a machine when it is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MachineOptions {
    /// Opaque to the session driver; the machine may spread work across threads.
    pub multi_threaded: bool,
}

/// Machine-agnostic interface for emulated systems.
///
/// The session driver only ever steps, resets and serializes a machine. What
/// happens inside `run_frame()` (CPU, video, sound) is the machine's business;
/// it draws through the renderers attached with `attach_renderers()`.
pub trait Machine {
    /// The ROM set this machine was built from.
    fn game_info(&self) -> &GameInfo;

    /// Run one frame of emulation (advance the clock by one frame's worth of cycles).
    fn run_frame(&mut self);

    /// Reset the machine to its initial power-on state.
    fn reset(&mut self);

    /// Handle an input event. `button` is a machine-defined ID from `input_map()`.
    /// `pressed` is true for key-down, false for key-up.
    ///
    /// Each call latches the button state so that `run_frame()` sees the
    /// accumulated input.
    fn set_input(&mut self, button: u8, pressed: bool);

    /// Get the list of input buttons this machine accepts.
    fn input_map(&self) -> &[InputButton];

    /// Hand the machine its output renderers. Called once, after they were
    /// initialized against the display geometry.
    fn attach_renderers(&mut self, renderers: Renderers);

    /// Take the renderers back so they can be released before the display.
    fn detach_renderers(&mut self) -> Option<Renderers>;

    /// Audio output rate in Hz. Zero means the machine makes no sound.
    fn audio_sample_rate(&self) -> u32 {
        0
    }

    /// Move the samples produced since the last call into `out`.
    fn drain_audio(&mut self, _out: &mut Vec<i16>) {}

    /// Append the machine's save state blocks.
    fn save_state(&self, out: &mut BlockWriter) -> Result<(), StateError>;

    /// Restore from a validated save state file.
    ///
    /// Implementations must decode everything they need before changing any
    /// live state, so that an error leaves the machine as it was.
    fn load_state(&mut self, file: &BlockFile) -> Result<(), StateError>;

    /// Append the battery-backed memory blocks.
    fn save_nvram(&self, out: &mut BlockWriter) -> Result<(), StateError>;

    /// Restore battery-backed memory, with the same all-or-nothing rule as
    /// `load_state()`.
    fn load_nvram(&mut self, file: &BlockFile) -> Result<(), StateError>;

    /// Erase battery-backed memory in place.
    fn clear_nvram(&mut self);
}
