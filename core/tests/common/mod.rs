#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use gantry_core::display::{DisplayGeometry, DisplayRequest};
use gantry_core::input::InputSource;
use gantry_core::log::{Log, Logger};
use gantry_core::machine::{GameInfo, InputButton, Machine};
use gantry_core::observer::SessionObserver;
use gantry_core::platform::{Clock, InitError, Platform};
use gantry_core::render::{Render2D, Render3D, Renderer, Renderers};
use gantry_core::session::UiCommand;
use gantry_core::state::{BlockFile, BlockWriter, StateError};

/// Shared, ordered record of what happened across all fakes.
pub type Events = Rc<RefCell<Vec<String>>>;

pub fn events() -> Events {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(events: &Events, name: &str) -> usize {
    events.borrow().iter().filter(|e| *e == name).count()
}

pub fn position(events: &Events, name: &str) -> usize {
    events
        .borrow()
        .iter()
        .position(|e| e == name)
        .unwrap_or_else(|| panic!("event {name} never happened"))
}

// =================================================================
// Machine
// =================================================================

pub const MOCK_GAME: GameInfo = GameInfo {
    id: "mock",
    title: "Mock Machine",
    crom_size: 0x80_0000,
};

static MOCK_BUTTONS: [InputButton; 2] = [
    InputButton {
        id: 0,
        name: "Coin",
    },
    InputButton {
        id: 1,
        name: "P1 Start",
    },
];

pub struct MockMachine {
    pub events: Events,
    pub frames: u32,
    pub resets: u32,
    pub ram: Vec<u8>,
    pub nvram: Vec<u8>,
    pub inputs: Vec<(u8, bool)>,
    pub renderers: Option<Renderers>,
    pub sample_rate: u32,
    pub nvram_saves: Cell<u32>,
}

impl MockMachine {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            frames: 0,
            resets: 0,
            ram: vec![0x11, 0x22, 0x33, 0x44],
            nvram: vec![0xA5; 16],
            inputs: Vec::new(),
            renderers: None,
            sample_rate: 0,
            nvram_saves: Cell::new(0),
        }
    }
}

impl Machine for MockMachine {
    fn game_info(&self) -> &GameInfo {
        &MOCK_GAME
    }

    fn run_frame(&mut self) {
        self.frames += 1;
        if let Some(r) = self.renderers.as_mut() {
            r.r2d.begin_frame();
            r.r2d.end_frame();
        }
    }

    fn reset(&mut self) {
        self.resets += 1;
        self.events.borrow_mut().push("reset".into());
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        self.inputs.push((button, pressed));
    }

    fn input_map(&self) -> &[InputButton] {
        &MOCK_BUTTONS
    }

    fn attach_renderers(&mut self, renderers: Renderers) {
        self.events.borrow_mut().push("attach_renderers".into());
        self.renderers = Some(renderers);
    }

    fn detach_renderers(&mut self) -> Option<Renderers> {
        self.renderers.take()
    }

    fn audio_sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain_audio(&mut self, out: &mut Vec<i16>) {
        if self.sample_rate > 0 {
            out.extend(std::iter::repeat_n(0, (self.sample_rate / 60) as usize));
        }
    }

    fn save_state(&self, out: &mut BlockWriter) -> Result<(), StateError> {
        out.new_block("Mock Machine", "");
        out.write_u32(self.frames);
        out.write_u32(self.ram.len() as u32);
        out.write(&self.ram);
        Ok(())
    }

    fn load_state(&mut self, file: &BlockFile) -> Result<(), StateError> {
        let mut block = file.require_block("Mock Machine")?;
        let frames = block.read_u32()?;
        let len = block.read_u32()? as usize;
        let ram = block.read(len)?.to_vec();

        self.frames = frames;
        self.ram = ram;
        Ok(())
    }

    fn save_nvram(&self, out: &mut BlockWriter) -> Result<(), StateError> {
        self.nvram_saves.set(self.nvram_saves.get() + 1);
        self.events.borrow_mut().push("save_nvram".into());
        out.new_block("Mock NVRAM", "");
        out.write_u32(self.nvram.len() as u32);
        out.write(&self.nvram);
        Ok(())
    }

    fn load_nvram(&mut self, file: &BlockFile) -> Result<(), StateError> {
        let mut block = file.require_block("Mock NVRAM")?;
        let len = block.read_u32()? as usize;
        self.nvram = block.read(len)?.to_vec();
        Ok(())
    }

    fn clear_nvram(&mut self) {
        self.nvram.fill(0);
    }
}

// =================================================================
// Renderers
// =================================================================

pub struct FakeRenderer {
    pub name: &'static str,
    pub events: Events,
    pub fail_init: bool,
}

impl Renderer for FakeRenderer {
    fn init(&mut self, _geometry: &DisplayGeometry) -> Result<(), InitError> {
        if self.fail_init {
            return Err(InitError::Renderer(format!("{} refused", self.name)));
        }
        self.events.borrow_mut().push(format!("init_{}", self.name));
        Ok(())
    }

    fn begin_frame(&mut self) {}

    fn end_frame(&mut self) {}
}

impl Render2D for FakeRenderer {
    fn draw_layer(&mut self, _rgb: &[u8], _width: u32, _height: u32) {}
}

impl Render3D for FakeRenderer {
    fn projection(&self) -> [f32; 16] {
        [0.0; 16]
    }
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        self.events.borrow_mut().push(format!("drop_{}", self.name));
    }
}

// =================================================================
// Platform
// =================================================================

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    #[default]
    Nowhere,
    Display,
    Audio,
    Renderers,
    RendererInit,
}

pub struct FakePlatform {
    pub events: Events,
    pub fail_at: FailAt,
    /// Size of the surface the "hardware" really gives back.
    pub actual: Option<(u32, u32)>,
    pub swaps: u32,
    pub captions: Vec<String>,
    pub audio_frames: u32,
    pub request: Option<DisplayRequest>,
}

impl FakePlatform {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            fail_at: FailAt::Nowhere,
            actual: None,
            swaps: 0,
            captions: Vec::new(),
            audio_frames: 0,
            request: None,
        }
    }
}

impl Platform for FakePlatform {
    fn create_display(&mut self, request: &DisplayRequest) -> Result<DisplayGeometry, InitError> {
        if self.fail_at == FailAt::Display {
            return Err(InitError::Video("no display".into()));
        }
        self.events.borrow_mut().push("create_display".into());
        self.request = Some(request.clone());
        let actual = self.actual.unwrap_or((request.width, request.height));
        Ok(DisplayGeometry::resolve(request, actual))
    }

    fn create_renderers(&mut self) -> Result<Renderers, InitError> {
        if self.fail_at == FailAt::Renderers {
            return Err(InitError::Renderer("no renderers".into()));
        }
        let fail_init = self.fail_at == FailAt::RendererInit;
        Ok(Renderers::new(
            Box::new(FakeRenderer {
                name: "r2d",
                events: self.events.clone(),
                fail_init: false,
            }),
            Box::new(FakeRenderer {
                name: "r3d",
                events: self.events.clone(),
                fail_init,
            }),
        ))
    }

    fn open_audio(&mut self, _sample_rate: u32) -> Result<(), InitError> {
        if self.fail_at == FailAt::Audio {
            return Err(InitError::Audio("no audio".into()));
        }
        self.events.borrow_mut().push("open_audio".into());
        Ok(())
    }

    fn queue_audio(&mut self, samples: &[i16]) {
        assert!(!samples.is_empty());
        self.audio_frames += 1;
    }

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }

    fn set_caption(&mut self, caption: &str) {
        self.captions.push(caption.to_string());
    }

    fn close_audio(&mut self) {
        self.events.borrow_mut().push("close_audio".into());
    }

    fn close_display(&mut self) {
        self.events.borrow_mut().push("close_display".into());
    }
}

// =================================================================
// Inputs
// =================================================================

/// What one poll reports.
#[derive(Clone)]
pub enum Poll {
    Idle,
    Press(Vec<UiCommand>),
    Buttons(Vec<(u8, bool)>),
    Lost,
    /// Device lost while these commands read as pressed.
    LostWhile(Vec<UiCommand>),
}

pub fn press(commands: &[UiCommand]) -> Poll {
    Poll::Press(commands.to_vec())
}

/// Plays back one [`Poll`] per iteration. Once the script runs out it
/// presses Exit, so every session terminates.
pub struct ScriptedInputs {
    script: VecDeque<Poll>,
    current: Vec<UiCommand>,
    buttons: Vec<(u8, bool)>,
    pub polls: u32,
    pub attached: Vec<&'static str>,
    pub mouse_visible: Vec<bool>,
    pub dumps: Cell<u32>,
}

impl ScriptedInputs {
    pub fn new(script: Vec<Poll>) -> Self {
        Self {
            script: script.into(),
            current: Vec::new(),
            buttons: Vec::new(),
            polls: 0,
            attached: Vec::new(),
            mouse_visible: Vec::new(),
            dumps: Cell::new(0),
        }
    }

    /// `n` idle polls, then exit.
    pub fn idle(n: usize) -> Self {
        Self::new(vec![Poll::Idle; n])
    }
}

impl InputSource for ScriptedInputs {
    fn attach(&mut self, buttons: &[InputButton]) {
        self.attached = buttons.iter().map(|b| b.name).collect();
    }

    fn poll(&mut self, _game: &GameInfo, _geometry: &DisplayGeometry) -> bool {
        self.polls += 1;
        self.current.clear();
        match self
            .script
            .pop_front()
            .unwrap_or_else(|| press(&[UiCommand::Exit]))
        {
            Poll::Idle => true,
            Poll::Press(commands) => {
                self.current = commands;
                true
            }
            Poll::Buttons(events) => {
                self.buttons.extend(events);
                true
            }
            Poll::Lost => false,
            Poll::LostWhile(commands) => {
                self.current = commands;
                false
            }
        }
    }

    fn take_button_events(&mut self) -> Vec<(u8, bool)> {
        std::mem::take(&mut self.buttons)
    }

    fn pressed(&self, command: UiCommand) -> bool {
        self.current.contains(&command)
    }

    fn set_mouse_visibility(&mut self, visible: bool) {
        self.mouse_visible.push(visible);
    }

    fn dump_state(&self, _game: &GameInfo) {
        self.dumps.set(self.dumps.get() + 1);
    }
}

// =================================================================
// Clock
// =================================================================

/// Manual clock. Each `ticks()` after the first advances time by the next
/// queued cost (the time the loop body "took"), or by `default_cost`.
pub struct FakeClock {
    now: Cell<u32>,
    started: Cell<bool>,
    costs: RefCell<VecDeque<u32>>,
    pub default_cost: u32,
    pub delays: Vec<u32>,
}

impl FakeClock {
    pub fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
            started: Cell::new(false),
            costs: RefCell::new(VecDeque::new()),
            default_cost: 0,
            delays: Vec::new(),
        }
    }

    pub fn with_costs(mut self, costs: &[u32]) -> Self {
        self.costs = RefCell::new(costs.iter().copied().collect());
        self
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }
}

impl Clock for FakeClock {
    fn ticks(&self) -> u32 {
        if self.started.replace(true) {
            let cost = self
                .costs
                .borrow_mut()
                .pop_front()
                .unwrap_or(self.default_cost);
            self.now.set(self.now.get().wrapping_add(cost));
        }
        self.now.get()
    }

    fn delay(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

// =================================================================
// Observer
// =================================================================

#[derive(Default)]
pub struct ObserverLog {
    pub attached: u32,
    pub detached: u32,
    pub polls: u32,
    pub resets: u32,
}

/// Observer that asks to exit or pause on a given poll count.
pub struct ScriptedObserver {
    pub log: Rc<RefCell<ObserverLog>>,
    pub exit_on_poll: Option<u32>,
    pub pause_on_poll: Option<u32>,
}

impl ScriptedObserver {
    pub fn new() -> (Self, Rc<RefCell<ObserverLog>>) {
        let log = Rc::new(RefCell::new(ObserverLog::default()));
        (
            Self {
                log: log.clone(),
                exit_on_poll: None,
                pause_on_poll: None,
            },
            log,
        )
    }
}

impl SessionObserver for ScriptedObserver {
    fn attach(&mut self) {
        self.log.borrow_mut().attached += 1;
    }

    fn detach(&mut self) {
        self.log.borrow_mut().detached += 1;
    }

    fn poll(&mut self) {
        self.log.borrow_mut().polls += 1;
    }

    fn check_exit(&self) -> bool {
        self.exit_on_poll == Some(self.log.borrow().polls)
    }

    fn check_pause(&self) -> bool {
        self.pause_on_poll == Some(self.log.borrow().polls)
    }

    fn reset(&mut self) {
        self.log.borrow_mut().resets += 1;
    }
}

// =================================================================
// Logging
// =================================================================

#[derive(Default)]
pub struct CaptureLogger {
    lines: Mutex<Vec<(&'static str, String)>>,
}

impl CaptureLogger {
    pub fn at(&self, level: &str) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Logger for CaptureLogger {
    fn debug_log(&self, message: &str) {
        self.lines.lock().unwrap().push(("debug", message.into()));
    }
    fn info_log(&self, message: &str) {
        self.lines.lock().unwrap().push(("info", message.into()));
    }
    fn error_log(&self, message: &str) {
        self.lines.lock().unwrap().push(("error", message.into()));
    }
}

pub fn capture() -> (Log, Arc<CaptureLogger>) {
    let logger = Arc::new(CaptureLogger::default());
    (Log::new(logger.clone()), logger)
}
