use std::collections::HashMap;

use gantry_core::display::DisplayGeometry;
use gantry_core::input::InputSource;
use gantry_core::machine::{GameInfo, InputButton};
use gantry_core::session::UiCommand;
use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::{Mod, Scancode};
use sdl2::mouse::MouseUtil;

/// Maps SDL scancodes to machine button IDs.
pub struct KeyMap {
    map: HashMap<Scancode, u8>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a scancode to a machine button ID.
    pub fn bind(&mut self, scancode: Scancode, button_id: u8) {
        self.map.insert(scancode, button_id);
    }

    /// Look up the machine button ID for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<u8> {
        self.map.get(&scancode).copied()
    }

    /// Scancode bound to `button_id`, if any.
    pub fn key_for(&self, button_id: u8) -> Option<Scancode> {
        self.map
            .iter()
            .find(|&(_, &id)| id == button_id)
            .map(|(&sc, _)| sc)
    }
}

/// Default key for a button, by name, so machines get consistent bindings
/// without game-specific knowledge.
fn default_key(name: &str) -> Option<Scancode> {
    Some(match name {
        // Player 1
        "P1 Left" => Scancode::Left,
        "P1 Right" => Scancode::Right,
        "P1 Up" => Scancode::Up,
        "P1 Down" => Scancode::Down,
        "P1 Button 1" => Scancode::A,
        "P1 Button 2" => Scancode::S,
        "P1 Start" => Scancode::Num1,

        // Player 2
        "P2 Left" => Scancode::J,
        "P2 Right" => Scancode::L,
        "P2 Up" => Scancode::I,
        "P2 Down" => Scancode::K,
        "P2 Start" => Scancode::Num2,

        // System
        "Coin" => Scancode::Num3,
        "Service" => Scancode::Num5,
        "Test" => Scancode::Num6,

        _ => return None,
    })
}

/// Build a default key map for a machine's input buttons.
pub fn default_key_map(buttons: &[InputButton]) -> KeyMap {
    let mut km = KeyMap::new();
    for button in buttons {
        if let Some(sc) = default_key(button.name) {
            km.bind(sc, button.id);
        }
    }
    km
}

/// A UI command's key: a scancode, optionally with Alt held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiBinding {
    pub command: UiCommand,
    pub scancode: Scancode,
    pub alt: bool,
}

const fn bind(command: UiCommand, scancode: Scancode, alt: bool) -> UiBinding {
    UiBinding {
        command,
        scancode,
        alt,
    }
}

pub const UI_BINDINGS: [UiBinding; 10] = [
    bind(UiCommand::Exit, Scancode::Escape, false),
    bind(UiCommand::Reset, Scancode::R, true),
    bind(UiCommand::TogglePause, Scancode::P, true),
    bind(UiCommand::SaveState, Scancode::F5, false),
    bind(UiCommand::ChangeSlot, Scancode::F6, false),
    bind(UiCommand::LoadState, Scancode::F7, false),
    bind(UiCommand::DumpInputState, Scancode::D, true),
    bind(UiCommand::ToggleCursor, Scancode::I, true),
    bind(UiCommand::ClearNvram, Scancode::N, true),
    bind(UiCommand::ToggleThrottle, Scancode::T, true),
];

/// UI command triggered by a key press, if any.
pub fn ui_command(scancode: Scancode, keymod: Mod) -> Option<UiCommand> {
    let alt = keymod.intersects(Mod::LALTMOD | Mod::RALTMOD);
    UI_BINDINGS
        .iter()
        .find(|b| b.scancode == scancode && b.alt == alt)
        .map(|b| b.command)
}

fn describe(scancode: Scancode, alt: bool) -> String {
    if alt {
        format!("Alt+{}", scancode.name())
    } else {
        scancode.name().to_string()
    }
}

/// Print UI bindings and, when given, a machine's game bindings.
pub fn print_bindings(buttons: Option<&[InputButton]>) {
    println!("UI controls:");
    for b in &UI_BINDINGS {
        println!("  {:<16} {}", b.command.name(), describe(b.scancode, b.alt));
    }
    if let Some(buttons) = buttons {
        let keys = default_key_map(buttons);
        println!("Game controls:");
        for button in buttons {
            let key = keys
                .key_for(button.id)
                .map_or_else(|| "(unbound)".to_string(), |sc| sc.name().to_string());
            println!("  {:<16} {key}", button.name);
        }
    }
}

/// Keyboard input from SDL events.
pub struct SdlInputs {
    events: EventPump,
    mouse: MouseUtil,
    keys: KeyMap,
    buttons: Vec<(u8, &'static str)>,
    held: Vec<u8>,
    triggered: Vec<UiCommand>,
    button_events: Vec<(u8, bool)>,
}

impl SdlInputs {
    pub fn new(sdl: &sdl2::Sdl) -> Result<Self, String> {
        Ok(Self {
            events: sdl.event_pump()?,
            mouse: sdl.mouse(),
            keys: KeyMap::new(),
            buttons: Vec::new(),
            held: Vec::new(),
            triggered: Vec::new(),
            button_events: Vec::new(),
        })
    }

    fn key_down(&mut self, scancode: Scancode, keymod: Mod) {
        if let Some(command) = ui_command(scancode, keymod) {
            self.triggered.push(command);
            return;
        }
        if let Some(id) = self.keys.get(scancode)
            && !self.held.contains(&id)
        {
            self.held.push(id);
            self.button_events.push((id, true));
        }
    }

    fn key_up(&mut self, scancode: Scancode) {
        if let Some(id) = self.keys.get(scancode)
            && let Some(i) = self.held.iter().position(|&h| h == id)
        {
            self.held.swap_remove(i);
            self.button_events.push((id, false));
        }
    }
}

impl InputSource for SdlInputs {
    fn attach(&mut self, buttons: &[InputButton]) {
        self.keys = default_key_map(buttons);
        self.buttons = buttons.iter().map(|b| (b.id, b.name)).collect();
    }

    fn poll(&mut self, _game: &GameInfo, _geometry: &DisplayGeometry) -> bool {
        self.triggered.clear();
        let pending: Vec<Event> = self.events.poll_iter().collect();
        for event in pending {
            match event {
                Event::Quit { .. } => return false,
                Event::KeyDown {
                    scancode: Some(sc),
                    keymod,
                    repeat: false,
                    ..
                } => self.key_down(sc, keymod),
                Event::KeyUp {
                    scancode: Some(sc), ..
                } => self.key_up(sc),
                _ => {}
            }
        }
        true
    }

    fn take_button_events(&mut self) -> Vec<(u8, bool)> {
        std::mem::take(&mut self.button_events)
    }

    fn pressed(&self, command: UiCommand) -> bool {
        self.triggered.contains(&command)
    }

    fn set_mouse_visibility(&mut self, visible: bool) {
        self.mouse.show_cursor(visible);
    }

    fn dump_state(&self, game: &GameInfo) {
        println!("Input states for {}:", game.title);
        for &(id, name) in &self.buttons {
            let state = if self.held.contains(&id) { 1 } else { 0 };
            println!("  {name:<16} = {state}");
        }
    }
}
