//! Rendering collaborators: the backend contract, render-target handles and
//! the context that tracks which target is active.

use anyhow::Result;
use glam::Vec2;

pub mod color;
pub mod context;
pub mod headless;
pub mod renderer_vulkan;
pub mod text;

pub use color::Color;
pub use context::{Batch, RenderContext};
pub use text::{BlockTextEngine, TextEngine};

/// Backend-assigned identifier of an off-screen render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// Handle to an off-screen surface. The window itself has no handle;
/// `None` wherever an `Option<&RenderTarget>` is taken means the window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderTarget {
    id: TargetId,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(id: TargetId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn get_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Something a batch can submit. Positions and sizes are in pixels with
/// the origin in the top-left corner of the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Rect {
        position: Vec2,
        size: Vec2,
        color: Color,
    },
}

/// Contract for a drawing backend.
///
/// All calls arrive serialized through [`RenderContext`]; a backend never
/// sees two calls at once. Work is recorded as it arrives and becomes
/// visible on the next `present`.
pub trait Renderer: Send {
    /// Allocates an off-screen target.
    fn create_target(&mut self, width: u32, height: u32) -> Result<RenderTarget>;

    /// Clears `target` (or the window, for `None`) to `color`.
    ///
    /// # Panics
    ///
    /// Backends panic on a target they did not create.
    fn clear(&mut self, target: Option<&RenderTarget>, color: Color) -> Result<()>;

    /// Draws a batch of primitives into `target`.
    fn submit(&mut self, target: Option<&RenderTarget>, primitives: &[Primitive]) -> Result<()>;

    /// Flushes everything recorded since the last present and shows the window.
    fn present(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}
