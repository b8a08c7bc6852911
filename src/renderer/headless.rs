//! A renderer that records what it was asked to draw instead of drawing it.
//!
//! Used by the headless platform for tests and display-less runs.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;

use crate::renderer::{Color, Primitive, RenderTarget, Renderer, TargetId};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear {
        target: Option<TargetId>,
        color: Color,
    },
    Submit {
        target: Option<TargetId>,
        primitives: Vec<Primitive>,
    },
}

impl DrawOp {
    pub fn target(&self) -> Option<TargetId> {
        match self {
            DrawOp::Clear { target, .. } | DrawOp::Submit { target, .. } => *target,
        }
    }

    /// The clear color, for clears only.
    pub fn color(&self) -> Option<Color> {
        match self {
            DrawOp::Clear { color, .. } => Some(*color),
            DrawOp::Submit { .. } => None,
        }
    }
}

/// Everything recorded between two presents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Default)]
struct FrameLogInner {
    presented: Vec<Frame>,
    pending: Frame,
}

/// Shared view of a [`HeadlessRenderer`]'s output. Clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    inner: Arc<Mutex<FrameLogInner>>,
}

impl FrameLog {
    pub fn frames(&self) -> Vec<Frame> {
        self.inner.lock().presented.clone()
    }

    pub fn presented_count(&self) -> usize {
        self.inner.lock().presented.len()
    }

    /// Work recorded since the last present.
    pub fn pending(&self) -> Frame {
        self.inner.lock().pending.clone()
    }

    fn record(&self, op: DrawOp) {
        self.inner.lock().pending.ops.push(op);
    }

    fn present(&self) {
        let mut inner = self.inner.lock();
        let frame = std::mem::take(&mut inner.pending);
        inner.presented.push(frame);
    }
}

pub struct HeadlessRenderer {
    log: FrameLog,
    targets: HashSet<TargetId>,
    next_id: u32,
}

impl HeadlessRenderer {
    pub fn new(log: FrameLog) -> Self {
        Self {
            log,
            targets: HashSet::new(),
            next_id: 1,
        }
    }

    fn resolve(&self, target: Option<&RenderTarget>) -> Option<TargetId> {
        target.map(|target| {
            assert!(
                self.targets.contains(&target.id()),
                "unknown render target {:?}",
                target.id()
            );
            target.id()
        })
    }
}

impl Renderer for HeadlessRenderer {
    fn create_target(&mut self, width: u32, height: u32) -> Result<RenderTarget> {
        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.targets.insert(id);
        Ok(RenderTarget::new(id, width, height))
    }

    fn clear(&mut self, target: Option<&RenderTarget>, color: Color) -> Result<()> {
        let target = self.resolve(target);
        self.log.record(DrawOp::Clear { target, color });
        Ok(())
    }

    fn submit(&mut self, target: Option<&RenderTarget>, primitives: &[Primitive]) -> Result<()> {
        let target = self.resolve(target);
        self.log.record(DrawOp::Submit {
            target,
            primitives: primitives.to_vec(),
        });
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.log.present();
        Ok(())
    }

    fn name(&self) -> &str {
        "headless"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn present_closes_the_pending_frame() {
        let log = FrameLog::default();
        let mut renderer = HeadlessRenderer::new(log.clone());
        renderer.clear(None, Color::BLACK).unwrap();
        renderer
            .submit(
                None,
                &[Primitive::Rect {
                    position: Vec2::ZERO,
                    size: Vec2::ONE,
                    color: Color::WHITE,
                }],
            )
            .unwrap();
        renderer.present().unwrap();

        assert!(log.pending().ops.is_empty());
        assert_eq!(log.presented_count(), 1);
        assert_eq!(log.frames()[0].ops.len(), 2);
    }

    #[test]
    fn targets_get_distinct_ids() {
        let mut renderer = HeadlessRenderer::new(FrameLog::default());
        let a = renderer.create_target(4, 4).unwrap();
        let b = renderer.create_target(8, 2).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.get_size(), (8, 2));
    }
}
