//! Renderer collaborators.
//!
//! The platform creates them, the session initializes them against the
//! resolved display geometry, and the machine draws through them.

use crate::display::DisplayGeometry;
use crate::platform::InitError;

/// Common lifecycle of both renderers.
pub trait Renderer {
    /// Prepare for drawing into `geometry`. Called once before the loop.
    fn init(&mut self, geometry: &DisplayGeometry) -> Result<(), InitError>;

    fn begin_frame(&mut self);

    fn end_frame(&mut self);
}

/// Tilemap / layer output.
pub trait Render2D: Renderer {
    /// Draw an RGB24 layer of `width` x `height` pixels, scaled to the picture
    /// rectangle.
    fn draw_layer(&mut self, rgb: &[u8], width: u32, height: u32);
}

/// Polygon output.
pub trait Render3D: Renderer {
    /// Projection matrix set up for the picture's aspect ratio.
    fn projection(&self) -> [f32; 16];
}

/// The pair of renderers a machine draws through.
pub struct Renderers {
    pub r2d: Box<dyn Render2D>,
    pub r3d: Box<dyn Render3D>,
}

impl Renderers {
    pub fn new(r2d: Box<dyn Render2D>, r3d: Box<dyn Render3D>) -> Self {
        Self { r2d, r3d }
    }

    /// Initialize both, 2D first.
    pub fn init(&mut self, geometry: &DisplayGeometry) -> Result<(), InitError> {
        self.r2d.init(geometry)?;
        self.r3d.init(geometry)
    }
}
