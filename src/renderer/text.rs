use anyhow::{Result, bail};
use glam::Vec2;
use tracing::debug;

use crate::renderer::{Color, Primitive};

/// Turns strings into primitives.
///
/// Created and `init`ed by the engine during initialization and released at
/// teardown. Shared by both passes, hence `Sync`.
pub trait TextEngine: Send + Sync {
    fn init(&mut self) -> Result<()>;

    /// Lays out `text` with its top-left corner at `origin`, `size` pixels tall.
    fn layout(&self, text: &str, origin: Vec2, size: f32, color: Color) -> Vec<Primitive>;

    /// Width and height `text` would occupy at `size`.
    fn measure(&self, text: &str, size: f32) -> Vec2;

    fn release(&mut self);

    fn name(&self) -> &str;
}

/// Monospace text made of solid cells, one per visible character.
///
/// Needs no font files, which makes it a reasonable default for debug
/// overlays and headless runs.
#[derive(Debug)]
pub struct BlockTextEngine {
    /// Cell width as a fraction of the line height
    advance: f32,
    ready: bool,
}

impl Default for BlockTextEngine {
    fn default() -> Self {
        Self {
            advance: 0.6,
            ready: false,
        }
    }
}

impl BlockTextEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_advance(advance: f32) -> Self {
        Self {
            advance,
            ..Self::default()
        }
    }
}

impl TextEngine for BlockTextEngine {
    fn init(&mut self) -> Result<()> {
        if !(self.advance.is_finite() && self.advance > 0.0) {
            bail!("glyph advance must be a positive number, got {}", self.advance);
        }
        self.ready = true;
        debug!("Block text engine ready");
        Ok(())
    }

    fn layout(&self, text: &str, origin: Vec2, size: f32, color: Color) -> Vec<Primitive> {
        assert!(self.ready, "text engine used before init or after release");
        let cell = Vec2::new(size * self.advance, size);
        let glyph = cell * 0.8;
        let inset = (cell - glyph) * 0.5;

        let mut primitives = Vec::new();
        for (row, line) in text.lines().enumerate() {
            for (column, ch) in line.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let corner = origin + Vec2::new(column as f32 * cell.x, row as f32 * cell.y);
                primitives.push(Primitive::Rect {
                    position: corner + inset,
                    size: glyph,
                    color,
                });
            }
        }
        primitives
    }

    fn measure(&self, text: &str, size: f32) -> Vec2 {
        let columns = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
        let rows = text.lines().count();
        Vec2::new(columns as f32 * size * self.advance, rows as f32 * size)
    }

    fn release(&mut self) {
        self.ready = false;
        debug!("Block text engine released");
    }

    fn name(&self) -> &str {
        "block"
    }
}
