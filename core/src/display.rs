//! Output geometry: letterboxing the emulated picture inside the window.
//!
//! The emulated hardware has a fixed 496x384 picture. When aspect
//! preservation is on, the largest rectangle of that ratio that fits inside
//! the requested canvas is used and centered; the remainder is black border.

/// Native width of the reference picture.
pub const REFERENCE_WIDTH: u32 = 496;
/// Native height of the reference picture.
pub const REFERENCE_HEIGHT: u32 = 384;

/// Vertical field of view of the 3D projection, in degrees.
pub const FIELD_OF_VIEW_Y: f32 = 90.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1e5;

/// What the session asks the display for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRequest {
    pub caption: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub keep_aspect: bool,
}

/// Where the emulated picture ends up inside the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub requested_width: u32,
    pub requested_height: u32,
    pub width: u32,
    pub height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub fullscreen: bool,
    pub keep_aspect: bool,
}

impl DisplayGeometry {
    /// Resolve the picture rectangle for a request.
    ///
    /// `actual` is the size of the surface the platform really produced. If it
    /// is larger than the requested canvas, the canvas itself is centered on
    /// it and that shift compounds onto the letterbox offset.
    pub fn resolve(request: &DisplayRequest, actual: (u32, u32)) -> Self {
        let (req_w, req_h) = (request.width, request.height);
        let (mut w, mut h) = (u64::from(req_w), u64::from(req_h));

        if request.keep_aspect {
            let (rw, rh) = (u64::from(REFERENCE_WIDTH), u64::from(REFERENCE_HEIGHT));
            if h * rw < w * rh {
                // Too wide: pillarbox
                w = h * rw / rh;
            } else if w * rh < h * rw {
                // Too tall: letterbox
                h = w * rh / rw;
            }
        }

        let (width, height) = (w as u32, h as u32);
        let mut x_offset = (req_w - width) / 2;
        let mut y_offset = (req_h - height) / 2;

        let (actual_w, actual_h) = actual;
        if req_w < actual_w {
            x_offset += (actual_w - req_w) / 2;
        }
        if req_h < actual_h {
            y_offset += (actual_h - req_h) / 2;
        }

        Self {
            requested_width: req_w,
            requested_height: req_h,
            width,
            height,
            x_offset,
            y_offset,
            fullscreen: request.fullscreen,
            keep_aspect: request.keep_aspect,
        }
    }

    /// Width over height of the resolved picture.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    /// Perspective projection matching the resolved aspect ratio.
    pub fn projection(&self) -> Projection {
        Projection::perspective(FIELD_OF_VIEW_Y, self.aspect_ratio(), Z_NEAR, Z_FAR)
    }
}

/// A column-major 4x4 projection matrix, ready for `glUniformMatrix4fv`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection(pub [f32; 16]);

impl Projection {
    /// Same matrix `gluPerspective` builds.
    pub fn perspective(fovy_degrees: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let f = 1.0 / (fovy_degrees.to_radians() / 2.0).tan();
        let depth = z_near - z_far;

        let mut m = [0.0f32; 16];
        m[0] = f / aspect;
        m[5] = f;
        m[10] = (z_far + z_near) / depth;
        m[11] = -1.0;
        m[14] = 2.0 * z_far * z_near / depth;
        Self(m)
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }
}
