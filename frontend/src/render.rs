//! OpenGL renderers.
//!
//! Both draw into the picture rectangle resolved for the display. The 3D
//! renderer owns the per-frame clear; the 2D renderer uploads the machine's
//! layer into a texture and blits it over the rectangle.

use gantry_core::display::DisplayGeometry;
use gantry_core::platform::InitError;
use gantry_core::render::{Render2D, Render3D, Renderer};

/// Picture rectangle in GL window coordinates.
#[derive(Debug, Clone, Copy, Default)]
struct Rect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl From<&DisplayGeometry> for Rect {
    fn from(g: &DisplayGeometry) -> Self {
        Self {
            x: g.x_offset as i32,
            y: g.y_offset as i32,
            width: g.width as i32,
            height: g.height as i32,
        }
    }
}

#[derive(Default)]
pub struct GlRender2D {
    rect: Rect,
    texture: u32,
    framebuffer: u32,
    texture_size: (u32, u32),
}

impl GlRender2D {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for GlRender2D {
    fn init(&mut self, geometry: &DisplayGeometry) -> Result<(), InitError> {
        if !gl::GenFramebuffers::is_loaded() || !gl::BlitFramebuffer::is_loaded() {
            return Err(InitError::Renderer(
                "framebuffer objects are not supported".into(),
            ));
        }
        self.rect = Rect::from(geometry);
        unsafe {
            gl::GenTextures(1, &mut self.texture);
            gl::BindTexture(gl::TEXTURE_2D, self.texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
            gl::GenFramebuffers(1, &mut self.framebuffer);
        }
        Ok(())
    }

    fn begin_frame(&mut self) {}

    fn end_frame(&mut self) {
        unsafe {
            gl::BindFramebuffer(gl::READ_FRAMEBUFFER, 0);
        }
    }
}

impl Render2D for GlRender2D {
    fn draw_layer(&mut self, rgb: &[u8], width: u32, height: u32) {
        if rgb.len() < (width * height * 3) as usize {
            return;
        }
        let r = self.rect;
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.texture);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            if self.texture_size != (width, height) {
                gl::TexImage2D(
                    gl::TEXTURE_2D,
                    0,
                    gl::RGB8 as i32,
                    width as i32,
                    height as i32,
                    0,
                    gl::RGB,
                    gl::UNSIGNED_BYTE,
                    rgb.as_ptr().cast(),
                );
                gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.framebuffer);
                gl::FramebufferTexture2D(
                    gl::READ_FRAMEBUFFER,
                    gl::COLOR_ATTACHMENT0,
                    gl::TEXTURE_2D,
                    self.texture,
                    0,
                );
                self.texture_size = (width, height);
            } else {
                gl::TexSubImage2D(
                    gl::TEXTURE_2D,
                    0,
                    0,
                    0,
                    width as i32,
                    height as i32,
                    gl::RGB,
                    gl::UNSIGNED_BYTE,
                    rgb.as_ptr().cast(),
                );
                gl::BindFramebuffer(gl::READ_FRAMEBUFFER, self.framebuffer);
            }

            // Row 0 of the layer is the top line: flip while blitting.
            gl::BindFramebuffer(gl::DRAW_FRAMEBUFFER, 0);
            gl::BlitFramebuffer(
                0,
                height as i32,
                width as i32,
                0,
                r.x,
                r.y,
                r.x + r.width,
                r.y + r.height,
                gl::COLOR_BUFFER_BIT,
                gl::LINEAR,
            );
        }
    }
}

impl Drop for GlRender2D {
    fn drop(&mut self) {
        unsafe {
            if self.framebuffer != 0 {
                gl::DeleteFramebuffers(1, &self.framebuffer);
            }
            if self.texture != 0 {
                gl::DeleteTextures(1, &self.texture);
            }
        }
    }
}

#[derive(Default)]
pub struct GlRender3D {
    rect: Rect,
    projection: [f32; 16],
}

impl GlRender3D {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for GlRender3D {
    fn init(&mut self, geometry: &DisplayGeometry) -> Result<(), InitError> {
        if !gl::Scissor::is_loaded() {
            return Err(InitError::Renderer("GL entry points not loaded".into()));
        }
        self.rect = Rect::from(geometry);
        self.projection = *geometry.projection().as_array();
        Ok(())
    }

    fn begin_frame(&mut self) {
        let r = self.rect;
        unsafe {
            gl::Viewport(r.x, r.y, r.width, r.height);
            gl::Enable(gl::SCISSOR_TEST);
            gl::Scissor(r.x, r.y, r.width, r.height);
            gl::ClearColor(0.0, 0.0, 0.0, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }
    }

    fn end_frame(&mut self) {
        unsafe {
            gl::Disable(gl::SCISSOR_TEST);
        }
    }
}

impl Render3D for GlRender3D {
    fn projection(&self) -> [f32; 16] {
        self.projection
    }
}
