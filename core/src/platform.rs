//! Platform services the session needs: a display surface, audio output and
//! a millisecond clock.

use thiserror::Error;

use crate::display::{DisplayGeometry, DisplayRequest};
use crate::render::Renderers;

/// Setup failures before the loop starts. These end the process.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("unable to initialize video: {0}")]
    Video(String),

    #[error("unable to initialize audio: {0}")]
    Audio(String),

    #[error("unable to initialize renderer: {0}")]
    Renderer(String),

    #[error("OpenGL initialization failed: {0}")]
    GlLoader(String),
}

/// Window, GL context and audio device provider.
pub trait Platform {
    /// Create the output surface and resolve where the picture goes in it.
    fn create_display(&mut self, request: &DisplayRequest) -> Result<DisplayGeometry, InitError>;

    /// Build the renderers for an existing display. They are not yet
    /// initialized.
    fn create_renderers(&mut self) -> Result<Renderers, InitError>;

    /// Open audio output. A `sample_rate` of 0 means there is nothing to play.
    fn open_audio(&mut self, sample_rate: u32) -> Result<(), InitError>;

    /// Queue one frame's worth of samples.
    fn queue_audio(&mut self, samples: &[i16]);

    /// Present the frame just drawn.
    fn swap_buffers(&mut self);

    fn set_caption(&mut self, caption: &str);

    /// Release the audio device. Safe to call when audio never opened.
    fn close_audio(&mut self);

    /// Release the display surface. Safe to call when it never opened.
    fn close_display(&mut self);
}

/// Millisecond tick source used for pacing and FPS measurement.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point. May wrap.
    fn ticks(&self) -> u32;

    /// Block the calling thread for `ms` milliseconds.
    fn delay(&mut self, ms: u32);
}
