//! The main loop.
//!
//! A [`Session`] takes a machine from "ROMs loaded" to "window closed": it
//! restores NVRAM, brings up the display, audio and renderers, runs the
//! frame loop until the session quits, and tears everything down again. The
//! teardown runs on every path out, including setup failures, and persists
//! NVRAM exactly once.

use thiserror::Error;

use crate::display::{DisplayGeometry, DisplayRequest};
use crate::input::InputSource;
use crate::log::Log;
use crate::machine::{GameInfo, Machine};
use crate::observer::SessionObserver;
use crate::pacer::{FrameClock, Pace};
use crate::platform::{Clock, InitError, Platform};
use crate::session::{SessionState, UiCommand, select_command};
use crate::state::{Slot, StateStore};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Init(#[from] InitError),
}

/// User settings the loop honors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub throttle: bool,
    pub show_fps: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            width: crate::display::REFERENCE_WIDTH,
            height: crate::display::REFERENCE_HEIGHT,
            fullscreen: false,
            throttle: true,
            show_fps: false,
        }
    }
}

/// Everything the loop drives, borrowed for the length of the session.
pub struct Context<'a> {
    pub machine: &'a mut dyn Machine,
    pub inputs: &'a mut dyn InputSource,
    pub platform: &'a mut dyn Platform,
    pub clock: &'a mut dyn Clock,
}

pub struct Session {
    options: SessionOptions,
    store: StateStore,
    log: Log,
    observer: Option<Box<dyn SessionObserver>>,

    state: SessionState,
    slot: Slot,
    throttle: bool,
    show_cursor: bool,
    caption: String,
    frame_clock: FrameClock,
    audio: Vec<i16>,
}

impl Session {
    pub fn new(options: SessionOptions, store: StateStore, log: Log) -> Self {
        Self {
            throttle: options.throttle,
            options,
            store,
            log,
            observer: None,
            state: SessionState::Running,
            slot: Slot::default(),
            show_cursor: false,
            caption: String::new(),
            frame_clock: FrameClock::new(0),
            audio: Vec::new(),
        }
    }

    /// Attach an observer (debugger) consulted once per iteration.
    pub fn with_observer(mut self, observer: Box<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn throttle(&self) -> bool {
        self.throttle
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Run the whole session. Only setup failures are returned; everything
    /// that goes wrong once the loop is running is logged and survived.
    pub fn run(&mut self, cx: &mut Context<'_>) -> Result<(), SessionError> {
        self.log.info(format_args!(
            "Resolution requested: {}x{} ({})",
            self.options.width,
            self.options.height,
            if self.options.fullscreen {
                "full screen"
            } else {
                "windowed"
            }
        ));
        self.log.info(format_args!(
            "Frame rate limiting: {}",
            if self.throttle { "Enabled" } else { "Disabled" }
        ));

        self.load_nvram(cx.machine);
        let result = self.start_and_loop(cx);
        self.shutdown(cx);
        result
    }

    fn start_and_loop(&mut self, cx: &mut Context<'_>) -> Result<(), SessionError> {
        self.caption = format!("Gantry - {}", cx.machine.game_info().title);
        let request = DisplayRequest {
            caption: self.caption.clone(),
            width: self.options.width,
            height: self.options.height,
            fullscreen: self.options.fullscreen,
            keep_aspect: true,
        };
        let geometry = cx.platform.create_display(&request)?;
        self.log.debug(format_args!(
            "Display: {}x{} at ({}, {})",
            geometry.width, geometry.height, geometry.x_offset, geometry.y_offset
        ));

        cx.platform.open_audio(cx.machine.audio_sample_rate())?;

        // Hide the mouse in full screen
        cx.inputs.set_mouse_visibility(!self.options.fullscreen);
        cx.inputs.attach(cx.machine.input_map());

        let mut renderers = cx.platform.create_renderers()?;
        renderers.init(&geometry)?;
        cx.machine.attach_renderers(renderers);

        cx.machine.reset();

        if let Some(observer) = self.observer.as_mut() {
            observer.attach();
        }

        self.frame_clock = FrameClock::new(cx.clock.ticks());
        while self.state != SessionState::Quit {
            self.step(cx, &geometry);
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.detach();
        }
        Ok(())
    }

    fn shutdown(&mut self, cx: &mut Context<'_>) {
        // Renderers hold GL objects; release them while the context still exists.
        drop(cx.machine.detach_renderers());
        self.save_nvram(cx.machine);
        cx.platform.close_audio();
        cx.platform.close_display();
    }

    /// One loop iteration: emulate, present, poll, apply at most one UI
    /// command, update the FPS caption, then pace.
    pub fn step(&mut self, cx: &mut Context<'_>, geometry: &DisplayGeometry) {
        if !self.state.is_paused() {
            cx.machine.run_frame();

            self.audio.clear();
            cx.machine.drain_audio(&mut self.audio);
            if !self.audio.is_empty() {
                cx.platform.queue_audio(&self.audio);
            }

            cx.platform.swap_buffers();
        }

        let game = *cx.machine.game_info();
        if !cx.inputs.poll(&game, geometry) {
            self.log.info("Input devices lost, quitting.");
            self.state = SessionState::Quit;
            return;
        }
        for (button, pressed) in cx.inputs.take_button_events() {
            cx.machine.set_input(button, pressed);
        }

        self.dispatch(cx, &game, geometry);
        if self.state == SessionState::Quit {
            return;
        }

        let now = cx.clock.ticks();
        if self.options.show_fps
            && let Some(fps) = self.frame_clock.sample_fps(now)
        {
            let caption = format!("{} - {fps:.1} FPS", self.caption);
            cx.platform.set_caption(&caption);
        }

        if self.state.is_paused() || self.throttle {
            match self.frame_clock.pace(now) {
                Pace::Wait(0) => {}
                Pace::Wait(ms) => cx.clock.delay(ms),
                Pace::Resync => {}
            }
        }
    }

    fn dispatch(&mut self, cx: &mut Context<'_>, game: &GameInfo, geometry: &DisplayGeometry) {
        if let Some(observer) = self.observer.as_mut() {
            observer.poll();
            if observer.check_exit() {
                self.state = SessionState::Quit;
                return;
            }
            if observer.check_pause() {
                self.state = SessionState::Paused;
                return;
            }
        }

        let inputs = &*cx.inputs;
        let fullscreen = geometry.fullscreen;
        let command = select_command(|cmd| {
            inputs.pressed(cmd) && (cmd != UiCommand::ToggleCursor || fullscreen)
        });
        if let Some(command) = command {
            self.apply(command, cx, game);
        }
    }

    fn apply(&mut self, command: UiCommand, cx: &mut Context<'_>, game: &GameInfo) {
        match command {
            UiCommand::Exit => self.state = SessionState::Quit,
            UiCommand::Reset => {
                cx.machine.reset();
                self.reset_observer();
                self.log.info("Machine reset.");
            }
            UiCommand::TogglePause => {
                self.state = self.state.toggle_pause();
                self.log.info(if self.state.is_paused() {
                    "Paused."
                } else {
                    "Resumed."
                });
            }
            UiCommand::SaveState => match self.store.save_state(cx.machine, self.slot) {
                Ok(path) => self
                    .log
                    .info(format_args!("Saved state to {}.", path.display())),
                Err(e) => self.log.error(format_args!("Unable to save state: {e}")),
            },
            UiCommand::ChangeSlot => {
                self.slot = self.slot.next();
                self.log.info(format_args!("Save slot: {}", self.slot));
            }
            UiCommand::LoadState => match self.store.load_state(cx.machine, self.slot) {
                Ok(path) => {
                    self.reset_observer();
                    self.log
                        .info(format_args!("Loaded state from {}.", path.display()));
                }
                Err(e) => self.log.error(format_args!("Unable to load state: {e}")),
            },
            UiCommand::DumpInputState => cx.inputs.dump_state(game),
            UiCommand::ToggleCursor => {
                self.show_cursor = !self.show_cursor;
                cx.inputs.set_mouse_visibility(self.show_cursor);
            }
            UiCommand::ClearNvram => {
                cx.machine.clear_nvram();
                self.log.info("NVRAM cleared.");
            }
            UiCommand::ToggleThrottle => {
                self.throttle = !self.throttle;
                self.log.info(format_args!(
                    "Frame limiting: {}",
                    if self.throttle { "On" } else { "Off" }
                ));
            }
        }
    }

    fn reset_observer(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.reset();
        }
    }

    fn load_nvram(&self, machine: &mut dyn Machine) {
        match self.store.load_nvram(machine) {
            Ok(Some(path)) => self
                .log
                .debug(format_args!("Loaded NVRAM from {}.", path.display())),
            Ok(None) => {}
            Err(e) => self.log.error(format_args!("Unable to load NVRAM: {e}")),
        }
    }

    fn save_nvram(&self, machine: &dyn Machine) {
        match self.store.save_nvram(machine) {
            Ok(path) => self
                .log
                .debug(format_args!("Saved NVRAM to {}.", path.display())),
            Err(e) => self.log.error(format_args!("Unable to save NVRAM: {e}")),
        }
    }
}
