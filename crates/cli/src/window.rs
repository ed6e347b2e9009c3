//! Window plus OpenGL 3.3 core context, built with glutin on top of winit.

#![allow(unsafe_code)]

use std::num::NonZeroU32;

use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow as _};
use raw_window_handle::HasWindowHandle;
use shader_harness_core::HarnessConfig;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::error::CliError;

/// A window with a current GL context and the `glow` function table.
///
/// Field order is drop order: the loader goes first, then the surface and
/// context, and the window last.
pub struct GlWindow {
    pub gl: glow::Context,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    pub window: Window,
}

impl GlWindow {
    /// Opens the window described by `config` and makes a 3.3 core
    /// context with a depth buffer current on it.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Window` if any display, config, context or
    /// surface step fails.
    pub fn create(event_loop: &ActiveEventLoop, config: &HarnessConfig) -> Result<Self, CliError> {
        let attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height));

        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes.clone()))
            .build(event_loop, template, pick_config)
            .map_err(|e| CliError::Window(format!("no suitable GL config: {e}")))?;

        let raw_handle = window
            .as_ref()
            .and_then(|w| w.window_handle().ok())
            .map(|h| h.as_raw());
        let display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(raw_handle);

        // SAFETY: `raw_handle` belongs to `window`, which outlives the context
        // (see the field order of `GlWindow`).
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes) }
            .map_err(|e| CliError::Window(format!("cannot create OpenGL 3.3 context: {e}")))?;

        let window = match window {
            Some(window) => window,
            None => glutin_winit::finalize_window(event_loop, attributes, &gl_config)
                .map_err(|e| CliError::Window(format!("cannot create window: {e}")))?,
        };

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(|e| CliError::Window(format!("no window handle: {e}")))?;
        // SAFETY: the surface is created for `window` and dropped before it.
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|e| CliError::Window(format!("cannot create window surface: {e}")))?;

        let context = not_current
            .make_current(&surface)
            .map_err(|e| CliError::Window(format!("cannot make context current: {e}")))?;

        if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
            log::debug!("vsync unavailable: {e}");
        }

        // SAFETY: the context is current on this thread and the loader
        // resolves symbols from the display that created it.
        let gl = unsafe { glow::Context::from_loader_function_cstr(|s| display.get_proc_address(s)) };

        log::info!(
            "OpenGL context ready ({}x{}, {} depth bits)",
            config.width,
            config.height,
            gl_config.depth_size()
        );

        Ok(Self {
            gl,
            surface,
            context,
            window,
        })
    }

    /// Resizes the drawable. Zero sizes (minimized windows) are skipped.
    pub fn resize(&self, size: PhysicalSize<u32>) {
        if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            self.surface.resize(&self.context, w, h);
        }
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&self) {
        if let Err(e) = self.surface.swap_buffers(&self.context) {
            log::error!("swap_buffers failed: {e}");
        }
    }
}

/// Prefers the config with the most samples.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    // glutin-winit only calls the picker after `find_configs` returned a
    // non-empty match; an empty template match is reported as a build error.
    configs
        .max_by_key(|c| c.num_samples())
        .expect("display offered no GL configs matching the template")
}
