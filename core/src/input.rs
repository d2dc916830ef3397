//! Input collaborator.

use crate::display::DisplayGeometry;
use crate::machine::{GameInfo, InputButton};
use crate::session::UiCommand;

/// Source of game inputs and UI command edges.
///
/// UI commands are one-shot: [`pressed`](Self::pressed) reports whether the
/// control went down during the most recent [`poll`](Self::poll), and keeps
/// reporting that until the next poll.
pub trait InputSource {
    /// Bind the machine's buttons. Called once before the loop.
    fn attach(&mut self, buttons: &[InputButton]);

    /// Gather pending device events. Returns `false` when the input devices
    /// are gone, which ends the session.
    fn poll(&mut self, game: &GameInfo, geometry: &DisplayGeometry) -> bool;

    /// Game button transitions gathered by the last poll, as `(id, pressed)`.
    fn take_button_events(&mut self) -> Vec<(u8, bool)>;

    /// Whether `command` was triggered during the last poll.
    fn pressed(&self, command: UiCommand) -> bool;

    fn set_mouse_visibility(&mut self, visible: bool);

    /// Print the current state of every bound control.
    fn dump_state(&self, game: &GameInfo);
}
