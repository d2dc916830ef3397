//! SDL window + OpenGL context, and the [`Platform`] built on them.

use std::ffi::CStr;

use gantry_core::display::{DisplayGeometry, DisplayRequest, REFERENCE_HEIGHT, REFERENCE_WIDTH};
use gantry_core::platform::{InitError, Platform};
use gantry_core::render::Renderers;
use sdl2::video::{GLContext, GLProfile, Window};
use sdl2::{AudioSubsystem, Sdl, VideoSubsystem};

use crate::audio::AudioOutput;
use crate::render::{GlRender2D, GlRender3D};

pub struct SdlPlatform {
    video: VideoSubsystem,
    audio: AudioSubsystem,
    volume: u32,
    window: Option<Window>,
    gl_context: Option<GLContext>,
    output: Option<AudioOutput>,
}

impl SdlPlatform {
    pub fn new(sdl: &Sdl, volume: u32) -> Result<Self, InitError> {
        Ok(Self {
            video: sdl.video().map_err(InitError::Video)?,
            audio: sdl.audio().map_err(InitError::Audio)?,
            volume,
            window: None,
            gl_context: None,
            output: None,
        })
    }
}

fn configure_gl(video: &VideoSubsystem) {
    let attr = video.gl_attr();
    attr.set_context_profile(GLProfile::Core);
    attr.set_context_version(3, 3);
    attr.set_red_size(5);
    attr.set_green_size(5);
    attr.set_blue_size(5);
    attr.set_depth_size(16);
    attr.set_double_buffer(true);
}

/// Open a window with a current GL context and load the GL entry points.
fn open_window(
    video: &VideoSubsystem,
    title: &str,
    width: u32,
    height: u32,
    fullscreen: bool,
) -> Result<(Window, GLContext), InitError> {
    configure_gl(video);

    let mut builder = video.window(title, width, height);
    builder.opengl();
    if fullscreen {
        builder.fullscreen();
    } else {
        builder.position_centered();
    }
    let window = builder
        .build()
        .map_err(|e| InitError::Video(e.to_string()))?;
    let context = window.gl_create_context().map_err(InitError::Video)?;

    gl::load_with(|name| video.gl_get_proc_address(name) as *const _);
    if !gl::Viewport::is_loaded() || !gl::GetString::is_loaded() {
        return Err(InitError::GlLoader("unable to load OpenGL functions".into()));
    }
    Ok((window, context))
}

impl Platform for SdlPlatform {
    fn create_display(&mut self, request: &DisplayRequest) -> Result<DisplayGeometry, InitError> {
        let (window, context) = open_window(
            &self.video,
            &request.caption,
            request.width,
            request.height,
            request.fullscreen,
        )?;

        let geometry = DisplayGeometry::resolve(request, window.drawable_size());
        unsafe {
            gl::Viewport(0, 0, request.width as i32, request.height as i32);
            gl::ClearColor(0.0, 0.0, 0.0, 0.0);
            gl::ClearDepth(1.0);
            gl::DepthFunc(gl::LESS);
            gl::Enable(gl::DEPTH_TEST);
            gl::Disable(gl::CULL_FACE);
            gl::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT);
        }

        self.window = Some(window);
        self.gl_context = Some(context);
        Ok(geometry)
    }

    fn create_renderers(&mut self) -> Result<Renderers, InitError> {
        if self.gl_context.is_none() {
            return Err(InitError::Renderer("no GL context".into()));
        }
        Ok(Renderers::new(
            Box::new(GlRender2D::new()),
            Box::new(GlRender3D::new()),
        ))
    }

    fn open_audio(&mut self, sample_rate: u32) -> Result<(), InitError> {
        if sample_rate == 0 {
            return Ok(());
        }
        let output =
            AudioOutput::open(&self.audio, sample_rate, self.volume).map_err(InitError::Audio)?;
        self.output = Some(output);
        Ok(())
    }

    fn queue_audio(&mut self, samples: &[i16]) {
        if let Some(output) = self.output.as_mut() {
            output.queue(samples);
        }
    }

    fn swap_buffers(&mut self) {
        if let Some(window) = &self.window {
            window.gl_swap_window();
        }
    }

    fn set_caption(&mut self, caption: &str) {
        if let Some(window) = self.window.as_mut()
            && let Err(e) = window.set_title(caption)
        {
            tracing::warn!("unable to set window caption: {e}");
        }
    }

    fn close_audio(&mut self) {
        if let Some(output) = self.output.take() {
            output.close();
        }
    }

    fn close_display(&mut self) {
        self.gl_context = None;
        self.window = None;
    }
}

/// Print the GL driver details. Opens (and closes) its own window.
pub fn print_gl_info(sdl: &Sdl) -> Result<(), InitError> {
    let video = sdl.video().map_err(InitError::Video)?;
    let (_window, _context) = open_window(
        &video,
        "Gantry",
        REFERENCE_WIDTH,
        REFERENCE_HEIGHT,
        false,
    )?;

    let string = |name| unsafe {
        let ptr = gl::GetString(name);
        if ptr.is_null() {
            "(unknown)".to_string()
        } else {
            CStr::from_ptr(ptr.cast()).to_string_lossy().into_owned()
        }
    };
    let integer = |name| {
        let mut value = 0;
        unsafe { gl::GetIntegerv(name, &mut value) };
        value
    };

    println!("OpenGL information:");
    println!("  Vendor                   : {}", string(gl::VENDOR));
    println!("  Renderer                 : {}", string(gl::RENDERER));
    println!("  Version                  : {}", string(gl::VERSION));
    println!(
        "  Shading Language Version : {}",
        string(gl::SHADING_LANGUAGE_VERSION)
    );
    println!(
        "  Maximum Texture Size     : {}",
        integer(gl::MAX_TEXTURE_SIZE)
    );
    println!(
        "  Maximum Vertex Attributes: {}",
        integer(gl::MAX_VERTEX_ATTRIBS)
    );
    Ok(())
}
