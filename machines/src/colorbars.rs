//! Color bar test card.
//!
//! A board with no CPU: it paints vertical color bars above a band with a
//! movable marker, beeps when a coin drops, and keeps coin and play audit
//! counters in battery-backed CMOS. Enough hardware to drive every part of
//! a session (video, sound, inputs, save states and NVRAM) without needing
//! ROM dumps.

use gantry_core::machine::{GameInfo, InputButton, Machine, MachineOptions};
use gantry_core::render::Renderers;
use gantry_core::state::{BlockFile, BlockWriter, StateError};

use crate::cmos_ram::CmosRam;
use crate::registry::MachineEntry;
use crate::rom_loader::{RomImage, RomLoadError, RomSet};

pub const SCREEN_WIDTH: u32 = 496;
pub const SCREEN_HEIGHT: u32 = 384;

/// Scanlines covered by the bars; the marker band fills the rest.
const BAR_HEIGHT: u32 = 288;

pub const MARKER_WIDTH: u16 = 8;
pub const MARKER_MAX: u16 = SCREEN_WIDTH as u16 - MARKER_WIDTH;
/// Pixels per frame while Left/Right is held.
pub const MARKER_SPEED: u16 = 4;

pub const MAX_CREDITS: u8 = 9;

pub const SAMPLE_RATE: u32 = 44_100;
const SAMPLES_PER_FRAME: usize = (SAMPLE_RATE / 60) as usize;
/// Coin beep: 1 kHz square wave for this many frames.
const BEEP_FRAMES: u8 = 6;
const BEEP_HALF_PERIOD: u32 = SAMPLE_RATE / 2000;
const BEEP_AMPLITUDE: i16 = 4000;

// CMOS layout
const CMOS_SIZE: usize = 256;
pub const CMOS_COINS: u16 = 0x00;
pub const CMOS_PLAYS: u16 = 0x02;

pub const STATE_BLOCK: &str = "Color Bars";
pub const NVRAM_BLOCK: &str = "Color Bars CMOS";

pub const INPUT_COIN: u8 = 0;
pub const INPUT_P1_START: u8 = 1;
pub const INPUT_P1_LEFT: u8 = 2;
pub const INPUT_P1_RIGHT: u8 = 3;

const COLORBARS_INPUT_MAP: &[InputButton] = &[
    InputButton {
        id: INPUT_COIN,
        name: "Coin",
    },
    InputButton {
        id: INPUT_P1_START,
        name: "P1 Start",
    },
    InputButton {
        id: INPUT_P1_LEFT,
        name: "P1 Left",
    },
    InputButton {
        id: INPUT_P1_RIGHT,
        name: "P1 Right",
    },
];

pub const COLORBARS_INFO: GameInfo = GameInfo {
    id: "colorbars",
    title: "Color Bars Test Card",
    crom_size: 0,
};

/// Optional palette override: seven RGB triples, one per bar.
pub const COLORBARS_PALETTE_ROM: RomImage = RomImage {
    name: "colorbars.pal",
    size: 21,
};

/// 75% bars: white, yellow, cyan, green, magenta, red, blue.
const DEFAULT_PALETTE: [[u8; 3]; 7] = [
    [191, 191, 191],
    [191, 191, 0],
    [0, 191, 191],
    [0, 191, 0],
    [191, 0, 191],
    [191, 0, 0],
    [0, 0, 191],
];

const BAND_COLOR: [u8; 3] = [16, 16, 16];
const MARKER_COLOR: [u8; 3] = [255, 255, 255];

pub struct ColorBars {
    palette: [[u8; 3]; 7],
    frame: u32,
    marker: u16,
    credits: u8,
    /// Live button bits, indexed by input id.
    inputs: u8,
    /// Button bits seen by the previous frame, for edge detection.
    latched: u8,
    beep_frames: u8,
    beep_phase: u32,
    cmos: CmosRam,
    framebuffer: Vec<u8>,
    audio: Vec<i16>,
    renderers: Option<Renderers>,
}

impl ColorBars {
    pub fn new() -> Self {
        Self::with_palette(DEFAULT_PALETTE)
    }

    pub fn with_palette(palette: [[u8; 3]; 7]) -> Self {
        Self {
            palette,
            frame: 0,
            marker: MARKER_MAX / 2,
            credits: 0,
            inputs: 0,
            latched: 0,
            beep_frames: 0,
            beep_phase: 0,
            cmos: CmosRam::new(CMOS_SIZE),
            framebuffer: vec![0; (SCREEN_WIDTH * SCREEN_HEIGHT * 3) as usize],
            audio: Vec::with_capacity(SAMPLES_PER_FRAME * 2),
            renderers: None,
        }
    }

    /// Build from a ROM set. Without `colorbars.pal` the standard bars are used.
    pub fn from_rom_set(rom_set: &RomSet) -> Result<Self, RomLoadError> {
        let Some(rom) = COLORBARS_PALETTE_ROM.load_optional(rom_set)? else {
            return Ok(Self::new());
        };
        let mut palette = [[0u8; 3]; 7];
        for (color, rgb) in palette.iter_mut().zip(rom.chunks_exact(3)) {
            color.copy_from_slice(rgb);
        }
        Ok(Self::with_palette(palette))
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn marker(&self) -> u16 {
        self.marker
    }

    pub fn credits(&self) -> u8 {
        self.credits
    }

    /// Lifetime coin count from CMOS.
    pub fn coins(&self) -> u16 {
        self.cmos.read_u16(CMOS_COINS)
    }

    /// Lifetime games started, from CMOS.
    pub fn plays(&self) -> u16 {
        self.cmos.read_u16(CMOS_PLAYS)
    }

    /// The last frame rendered, RGB24.
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    fn held(&self, input: u8) -> bool {
        self.inputs & (1 << input) != 0
    }

    fn update_game(&mut self) {
        let rising = self.inputs & !self.latched;
        self.latched = self.inputs;

        if rising & (1 << INPUT_COIN) != 0 {
            self.cmos.increment_u16(CMOS_COINS);
            self.credits = (self.credits + 1).min(MAX_CREDITS);
            self.beep_frames = BEEP_FRAMES;
        }
        if rising & (1 << INPUT_P1_START) != 0 && self.credits > 0 {
            self.credits -= 1;
            self.cmos.increment_u16(CMOS_PLAYS);
        }

        if self.held(INPUT_P1_LEFT) {
            self.marker = self.marker.saturating_sub(MARKER_SPEED);
        }
        if self.held(INPUT_P1_RIGHT) {
            self.marker = (self.marker + MARKER_SPEED).min(MARKER_MAX);
        }
    }

    fn render(&mut self) {
        let width = SCREEN_WIDTH as usize;
        let marker = self.marker as usize..(self.marker + MARKER_WIDTH) as usize;
        for (y, row) in self.framebuffer.chunks_exact_mut(width * 3).enumerate() {
            for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
                let color = if (y as u32) < BAR_HEIGHT {
                    self.palette[x * 7 / width]
                } else if marker.contains(&x) {
                    MARKER_COLOR
                } else {
                    BAND_COLOR
                };
                pixel.copy_from_slice(&color);
            }
        }

        if let Some(r) = self.renderers.as_mut() {
            // No polygons on this board, but the 3D frame still brackets the 2D one.
            r.r3d.begin_frame();
            r.r3d.end_frame();
            r.r2d.begin_frame();
            r.r2d
                .draw_layer(&self.framebuffer, SCREEN_WIDTH, SCREEN_HEIGHT);
            r.r2d.end_frame();
        }
    }

    fn generate_audio(&mut self) {
        if self.beep_frames == 0 {
            self.audio
                .extend(std::iter::repeat_n(0, SAMPLES_PER_FRAME));
            return;
        }
        self.beep_frames -= 1;
        for _ in 0..SAMPLES_PER_FRAME {
            let high = (self.beep_phase / BEEP_HALF_PERIOD) % 2 == 0;
            self.audio
                .push(if high { BEEP_AMPLITUDE } else { -BEEP_AMPLITUDE });
            self.beep_phase = self.beep_phase.wrapping_add(1);
        }
    }
}

impl Default for ColorBars {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine for ColorBars {
    fn game_info(&self) -> &GameInfo {
        &COLORBARS_INFO
    }

    fn run_frame(&mut self) {
        self.update_game();
        self.render();
        self.generate_audio();
        self.frame = self.frame.wrapping_add(1);
    }

    fn reset(&mut self) {
        self.frame = 0;
        self.marker = MARKER_MAX / 2;
        self.credits = 0;
        // Buttons held across a reset must not register as new presses.
        self.latched = self.inputs;
        self.beep_frames = 0;
        self.beep_phase = 0;
        self.audio.clear();
    }

    fn set_input(&mut self, button: u8, pressed: bool) {
        if button > INPUT_P1_RIGHT {
            return;
        }
        if pressed {
            self.inputs |= 1 << button;
        } else {
            self.inputs &= !(1 << button);
        }
    }

    fn input_map(&self) -> &[InputButton] {
        COLORBARS_INPUT_MAP
    }

    fn attach_renderers(&mut self, renderers: Renderers) {
        self.renderers = Some(renderers);
    }

    fn detach_renderers(&mut self) -> Option<Renderers> {
        self.renderers.take()
    }

    fn audio_sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn drain_audio(&mut self, out: &mut Vec<i16>) {
        out.append(&mut self.audio);
    }

    fn save_state(&self, out: &mut BlockWriter) -> Result<(), StateError> {
        out.new_block(STATE_BLOCK, "");
        out.write_u32(self.frame);
        out.write_u16(self.marker);
        out.write_u8(self.credits);
        out.write_u8(self.beep_frames);
        out.write_u32(self.beep_phase);
        Ok(())
    }

    fn load_state(&mut self, file: &BlockFile) -> Result<(), StateError> {
        let mut block = file.require_block(STATE_BLOCK)?;
        let frame = block.read_u32()?;
        let marker = block.read_u16()?;
        let credits = block.read_u8()?;
        let beep_frames = block.read_u8()?;
        let beep_phase = block.read_u32()?;

        if marker > MARKER_MAX || credits > MAX_CREDITS || beep_frames > BEEP_FRAMES {
            return Err(StateError::Corrupt(format!(
                "{STATE_BLOCK}: marker {marker}, credits {credits}, beep {beep_frames} out of range"
            )));
        }

        self.frame = frame;
        self.marker = marker;
        self.credits = credits;
        // Held buttons are live input, not machine state.
        self.latched = self.inputs;
        self.beep_frames = beep_frames;
        self.beep_phase = beep_phase;
        self.audio.clear();
        Ok(())
    }

    fn save_nvram(&self, out: &mut BlockWriter) -> Result<(), StateError> {
        out.new_block(NVRAM_BLOCK, "");
        out.write_u32(self.cmos.len() as u32);
        out.write(self.cmos.snapshot());
        Ok(())
    }

    fn load_nvram(&mut self, file: &BlockFile) -> Result<(), StateError> {
        let mut block = file.require_block(NVRAM_BLOCK)?;
        let len = block.read_u32()? as usize;
        if len != self.cmos.len() {
            return Err(StateError::Corrupt(format!(
                "{NVRAM_BLOCK}: {len} bytes, expected {}",
                self.cmos.len()
            )));
        }
        let data = block.read(len)?;
        self.cmos.load_from(data);
        Ok(())
    }

    fn clear_nvram(&mut self) {
        self.cmos.clear();
    }
}

// ---------------------------------------------------------------------------
// Machine registry
// ---------------------------------------------------------------------------

fn create_machine(
    rom_set: &RomSet,
    _options: &MachineOptions,
) -> Result<Box<dyn Machine>, RomLoadError> {
    Ok(Box::new(ColorBars::from_rom_set(rom_set)?))
}

inventory::submit! {
    MachineEntry::new("colorbars", "colorbars", COLORBARS_INFO.title, create_machine)
}
