use std::sync::Arc;

use crate::application::RunFlag;
use crate::component::ComponentRegistry;
use crate::input::{DeviceRegistry, NativeInput};
use crate::renderer::{Batch, Color, RenderContext, RenderTarget, TextEngine};
use crate::window::WindowState;

/// What hooks get to see of the engine.
///
/// Both passes hold one; it only hands out shared references, and every
/// piece behind it synchronizes itself.
#[derive(Clone, Copy)]
pub struct GameContext<'a> {
    pub(crate) components: &'a ComponentRegistry,
    pub(crate) devices: &'a DeviceRegistry,
    pub(crate) input: &'a Arc<NativeInput>,
    pub(crate) window: &'a WindowState,
    pub(crate) running: &'a RunFlag,
    pub(crate) render: &'a RenderContext,
    pub(crate) text: &'a dyn TextEngine,
}

impl<'a> GameContext<'a> {
    pub fn components(&self) -> &'a ComponentRegistry {
        self.components
    }

    pub fn devices(&self) -> &'a DeviceRegistry {
        self.devices
    }

    pub fn input(&self) -> &'a Arc<NativeInput> {
        self.input
    }

    pub fn window(&self) -> &'a WindowState {
        self.window
    }

    pub fn render(&self) -> &'a RenderContext {
        self.render
    }

    pub fn text(&self) -> &'a dyn TextEngine {
        self.text
    }

    /// Makes `target` the active render target (`None` for the window) and
    /// clears it to `clear_color` right away.
    ///
    /// # Panics
    ///
    /// Panics if `target` was not created by this engine's renderer.
    pub fn set_render_target(&self, target: Option<&RenderTarget>, clear_color: Color) {
        self.render.set_render_target(target, clear_color);
    }

    pub fn create_render_target(&self, width: u32, height: u32) -> anyhow::Result<RenderTarget> {
        self.render.create_render_target(width, height)
    }

    /// Starts a batch against the currently active target.
    pub fn begin_batch(&self) -> Batch<'a> {
        self.render.begin_batch()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_running()
    }

    /// Asks both passes to stop after the tick they are on.
    pub fn stop(&self) {
        self.running.stop();
    }
}
