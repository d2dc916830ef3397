//! Session state machine and the UI command table.

use std::fmt;

/// Run state of the emulation loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Running,
    Paused,
    /// Terminal: once entered the loop ends.
    Quit,
}

impl SessionState {
    /// Running and Paused swap; Quit stays Quit.
    pub fn toggle_pause(self) -> Self {
        match self {
            Self::Running => Self::Paused,
            Self::Paused => Self::Running,
            Self::Quit => Self::Quit,
        }
    }

    pub fn is_paused(self) -> bool {
        self == Self::Paused
    }
}

/// One-shot UI controls, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiCommand {
    Exit,
    Reset,
    TogglePause,
    SaveState,
    ChangeSlot,
    LoadState,
    DumpInputState,
    ToggleCursor,
    ClearNvram,
    ToggleThrottle,
}

impl UiCommand {
    /// Every command, highest priority first. At most one is applied per
    /// loop iteration: the first one asserted (and allowed) wins.
    pub const PRIORITY: [UiCommand; 10] = [
        UiCommand::Exit,
        UiCommand::Reset,
        UiCommand::TogglePause,
        UiCommand::SaveState,
        UiCommand::ChangeSlot,
        UiCommand::LoadState,
        UiCommand::DumpInputState,
        UiCommand::ToggleCursor,
        UiCommand::ClearNvram,
        UiCommand::ToggleThrottle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Exit => "Exit",
            Self::Reset => "Reset",
            Self::TogglePause => "Pause",
            Self::SaveState => "Save State",
            Self::ChangeSlot => "Change Save Slot",
            Self::LoadState => "Load State",
            Self::DumpInputState => "Dump Input State",
            Self::ToggleCursor => "Toggle Cursor",
            Self::ClearNvram => "Clear NVRAM",
            Self::ToggleThrottle => "Toggle Frame Limiting",
        }
    }
}

impl fmt::Display for UiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// First command in priority order for which `asserted` holds.
pub fn select_command(mut asserted: impl FnMut(UiCommand) -> bool) -> Option<UiCommand> {
    UiCommand::PRIORITY.into_iter().find(|&cmd| asserted(cmd))
}
