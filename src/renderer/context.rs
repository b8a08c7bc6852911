use anyhow::{Context, Result};
use glam::Vec2;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::renderer::{Color, Primitive, RenderTarget, Renderer, TextEngine};

struct RenderState {
    renderer: Box<dyn Renderer>,
    active: Option<RenderTarget>,
    clear_color: Color,
}

/// The active render target plus the backend that draws into it.
///
/// Exactly one target is active at any time. Setting a new one replaces the
/// old one outright; nothing is stacked. Every operation takes the lock for
/// its own duration only, so a component drawing on one thread and a target
/// switch on the other interleave between operations, never inside one.
pub struct RenderContext {
    state: Mutex<RenderState>,
}

impl RenderContext {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            state: Mutex::new(RenderState {
                renderer,
                active: None,
                clear_color: Color::default(),
            }),
        }
    }

    /// Makes `target` active (the window for `None`) and clears it to
    /// `clear_color` in the same step.
    ///
    /// A backend failure here is logged; the switch itself always happens.
    pub fn set_render_target(&self, target: Option<&RenderTarget>, clear_color: Color) {
        let mut state = self.state.lock();
        state.active = target.cloned();
        state.clear_color = clear_color;
        if let Err(err) = state.renderer.clear(target, clear_color) {
            warn!("Failed to clear render target {:?}: {err:#}", target.map(RenderTarget::id));
        }
    }

    pub fn active_target(&self) -> Option<RenderTarget> {
        self.state.lock().active.clone()
    }

    pub fn clear_color(&self) -> Color {
        self.state.lock().clear_color
    }

    pub fn create_render_target(&self, width: u32, height: u32) -> Result<RenderTarget> {
        let mut state = self.state.lock();
        let target = state
            .renderer
            .create_target(width, height)
            .with_context(|| format!("Create {width}x{height} render target"))?;
        debug!("Created render target {:?} ({width}x{height})", target.id());
        Ok(target)
    }

    /// Starts a batch against whatever target is active right now.
    pub fn begin_batch(&self) -> Batch<'_> {
        Batch {
            context: self,
            target: self.active_target(),
            primitives: Vec::new(),
        }
    }

    pub fn present(&self) -> Result<()> {
        self.state.lock().renderer.present()
    }

    pub fn renderer_name(&self) -> String {
        self.state.lock().renderer.name().to_owned()
    }

    fn submit(&self, target: Option<&RenderTarget>, primitives: &[Primitive]) -> Result<()> {
        self.state.lock().renderer.submit(target, primitives)
    }
}

/// Collects primitives for one target and hands them to the backend in a
/// single submission. A batch that is dropped without `end` still flushes.
pub struct Batch<'a> {
    context: &'a RenderContext,
    target: Option<RenderTarget>,
    primitives: Vec<Primitive>,
}

impl Batch<'_> {
    pub fn target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    pub fn submit(&mut self, primitive: Primitive) -> &mut Self {
        self.primitives.push(primitive);
        self
    }

    pub fn rect(&mut self, position: Vec2, size: Vec2, color: Color) -> &mut Self {
        self.submit(Primitive::Rect {
            position,
            size,
            color,
        })
    }

    pub fn draw_text(
        &mut self,
        engine: &dyn TextEngine,
        text: &str,
        origin: Vec2,
        size: f32,
        color: Color,
    ) -> &mut Self {
        self.primitives
            .extend(engine.layout(text, origin, size, color));
        self
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn end(mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if self.primitives.is_empty() {
            return Ok(());
        }
        let primitives = std::mem::take(&mut self.primitives);
        self.context.submit(self.target.as_ref(), &primitives)
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!("Failed to flush batch: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{DrawOp, FrameLog, HeadlessRenderer};

    fn context() -> (RenderContext, FrameLog) {
        let log = FrameLog::default();
        let context = RenderContext::new(Box::new(HeadlessRenderer::new(log.clone())));
        (context, log)
    }

    #[test]
    fn window_is_active_by_default() {
        let (context, _) = context();
        assert_eq!(context.active_target(), None);
        assert_eq!(context.clear_color(), Color::CORNFLOWER_BLUE);
    }

    #[test]
    fn setting_a_target_clears_it_immediately() {
        let (context, log) = context();
        let target = context.create_render_target(64, 32).unwrap();
        context.set_render_target(Some(&target), Color::RED);

        assert_eq!(
            log.pending().ops,
            vec![DrawOp::Clear {
                target: Some(target.id()),
                color: Color::RED
            }]
        );
    }

    #[test]
    fn last_write_wins() {
        let (context, log) = context();
        let a = context.create_render_target(16, 16).unwrap();
        let b = context.create_render_target(16, 16).unwrap();

        context.set_render_target(Some(&a), Color::RED);
        context.set_render_target(Some(&b), Color::GREEN);
        assert_eq!(context.active_target(), Some(b.clone()));
        assert_eq!(context.clear_color(), Color::GREEN);
        context.present().unwrap();

        let mut batch = context.begin_batch();
        batch.rect(Vec2::ZERO, Vec2::splat(4.0), Color::WHITE);
        batch.end().unwrap();
        context.present().unwrap();

        let frames = log.frames();
        assert_eq!(frames.len(), 2);
        let second = &frames[1];
        assert!(second.ops.iter().all(|op| op.target() == Some(b.id())));
        assert!(!second.ops.iter().any(|op| op.color() == Some(Color::RED)));
    }

    #[test]
    fn default_sentinel_restores_the_window() {
        let (context, _) = context();
        let target = context.create_render_target(8, 8).unwrap();
        context.set_render_target(Some(&target), Color::BLACK);
        context.set_render_target(None, Color::default());
        assert_eq!(context.active_target(), None);
    }

    #[test]
    fn batch_keeps_the_target_active_when_it_began() {
        let (context, log) = context();
        let target = context.create_render_target(8, 8).unwrap();

        let mut batch = context.begin_batch();
        context.set_render_target(Some(&target), Color::BLACK);
        batch.rect(Vec2::ONE, Vec2::ONE, Color::WHITE);
        assert_eq!(batch.target(), None);
        drop(batch);

        let ops = log.pending().ops;
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].target(), None);
    }

    #[test]
    fn empty_batches_submit_nothing() {
        let (context, log) = context();
        context.begin_batch().end().unwrap();
        assert!(log.pending().ops.is_empty());
    }

    #[test]
    #[should_panic(expected = "unknown render target")]
    fn foreign_target_is_a_contract_violation() {
        let (context, _) = context();
        let stray = RenderTarget::new(crate::renderer::TargetId(99), 4, 4);
        context.set_render_target(Some(&stray), Color::BLACK);
    }
}
