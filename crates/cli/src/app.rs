//! winit application driving the render state.
//!
//! Callback mapping:
//! - `resumed`: create the window and context, `initialize`, first `resize`
//! - `Resized`: resize the surface and the viewport
//! - `RedrawRequested`: `render` with the latest pacer time, then swap
//! - `about_to_wait`: poll the frame pacer and sleep until its deadline
//! - reload key released: `reload`; `Escape` or close request: `teardown`

use std::time::Instant;

use shader_harness_core::render::RenderSettings;
use shader_harness_core::{FramePacer, HarnessConfig, RenderState};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowId;

use crate::error::CliError;
use crate::window::GlWindow;

/// Render state and the window whose context it lives in. The state is
/// declared first so it is dropped while the context still exists.
struct Graphics {
    state: RenderState<glow::Context>,
    window: GlWindow,
}

/// What a key release asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Reload,
    Quit,
    None,
}

/// Maps a released key to its action. The reload key must match exactly,
/// so `R` does not reload when the key is `r`.
pub fn key_action(key: &Key, reload_key: char) -> KeyAction {
    match key {
        Key::Named(NamedKey::Escape) => KeyAction::Quit,
        Key::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c == reload_key => KeyAction::Reload,
                _ => KeyAction::None,
            }
        }
        _ => KeyAction::None,
    }
}

pub struct HarnessApp {
    config: HarnessConfig,
    start: Instant,
    pacer: FramePacer,
    frame_time_ms: f32,
    graphics: Option<Graphics>,
    failure: Option<CliError>,
}

impl HarnessApp {
    /// # Errors
    ///
    /// Returns `CliError::Input` if the configured frame rate is zero.
    pub fn new(config: HarnessConfig) -> Result<Self, CliError> {
        let pacer = FramePacer::from_rate(config.frame_rate)?;
        Ok(Self {
            config,
            start: Instant::now(),
            pacer,
            frame_time_ms: 0.0,
            graphics: None,
            failure: None,
        })
    }

    /// Consumes the app after the event loop returns, yielding the startup
    /// failure that stopped it, if any.
    pub fn into_result(self) -> Result<(), CliError> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start_graphics(&self, event_loop: &ActiveEventLoop) -> Result<Graphics, CliError> {
        let window = GlWindow::create(event_loop, &self.config)?;
        let mut state = RenderState::new(RenderSettings::from(&self.config));

        if let Err(e) = state.initialize(&window.gl) {
            state.teardown(&window.gl);
            return Err(CliError::FatalStartup(e));
        }
        let size = window.window.inner_size();
        state.resize(&window.gl, size.width, size.height)?;

        Ok(Graphics { state, window })
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut g) = self.graphics.take() {
            g.state.teardown(&g.window.gl);
        }
        event_loop.exit();
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Released {
            return;
        }
        match key_action(&event.logical_key, self.config.reload_key) {
            KeyAction::Quit => self.shutdown(event_loop),
            KeyAction::Reload => {
                let Some(g) = self.graphics.as_mut() else {
                    return;
                };
                match g.state.reload(&g.window.gl) {
                    Ok(()) => g.window.window.request_redraw(),
                    Err(e) => log::error!("shader reload failed, keeping previous program: {e}"),
                }
            }
            KeyAction::None => {}
        }
    }
}

impl ApplicationHandler for HarnessApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() || self.failure.is_some() {
            return;
        }
        match self.start_graphics(event_loop) {
            Ok(g) => {
                g.window.window.request_redraw();
                self.graphics = Some(g);
            }
            Err(e) => {
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::Resized(size) => {
                if let Some(g) = self.graphics.as_mut() {
                    g.window.resize(size);
                    if let Err(e) = g.state.resize(&g.window.gl, size.width, size.height) {
                        log::warn!("resize ignored: {e}");
                    }
                    g.window.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(g) = self.graphics.as_mut() {
                    if let Err(e) = g.state.render(&g.window.gl, self.frame_time_ms) {
                        log::error!("render failed: {e}");
                    }
                    g.window.swap_buffers();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(g) = &self.graphics else {
            return;
        };
        if let Some(tick) = self.pacer.poll(self.start.elapsed()) {
            if tick.skipped > 0 {
                log::trace!("frame pacer skipped {} periods", tick.skipped);
            }
            self.frame_time_ms = tick.time_ms();
            g.window.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            self.start + self.pacer.next_deadline(),
        ));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut g) = self.graphics.take() {
            g.state.teardown(&g.window.gl);
        }
    }
}
