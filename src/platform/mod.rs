use std::sync::Arc;

use crate::config::VideoOptions;
use crate::error::Result;
use crate::input::NativeInput;
use crate::renderer::Renderer;
use crate::window::WindowState;

pub mod headless;
pub mod platform_winit;

/// Where a platform reports what its event pump sees.
#[derive(Debug, Clone)]
pub struct PlatformSink {
    pub input: Arc<NativeInput>,
    pub window: Arc<WindowState>,
}

/// Defines the contract for a platform layer: the native window and its
/// event pump.
///
/// The engine calls everything here from the thread that called
/// `Engine::run`, which also runs the Update pass.
pub trait Platform {
    /// Opens the output surface described by `options`. Events arriving
    /// from now on are written to `sink`.
    fn create_surface(&mut self, options: &VideoOptions, sink: PlatformSink) -> Result<()>;

    /// Creates a backend that draws into the surface.
    fn create_renderer(&mut self) -> Result<Box<dyn Renderer>>;

    /// Handles every pending native event without blocking.
    fn poll_events(&mut self) -> anyhow::Result<()>;

    /// Whether the user asked to close the window.
    fn should_close(&self) -> bool;

    fn destroy_surface(&mut self);
}
