use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use glam::Vec2;
use parking_lot::Mutex;
use tandem::input::MouseButton;
use tandem::platform::platform_winit::WinitPlatform;
use tandem::{
    Color, Component, Engine, EngineConfig, Game, GameContext, GameTime, Key, Keyboard, Logger,
    Mouse, RenderTarget,
};
use tracing::info;

const SQUARE: f32 = 48.0;
const SPEED: f32 = 320.0;

/// Counts Update ticks and shows the count in the window title.
struct TickCounter {
    ticks: Arc<AtomicU64>,
}

impl Component for TickCounter {
    fn name(&self) -> &str {
        "tick-counter"
    }

    fn update(&mut self, _time: &GameTime, ctx: &GameContext<'_>) -> Result<()> {
        let ticks = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if ticks.is_multiple_of(120) {
            ctx.window().set_title(&format!("tandem playground | {ticks} ticks"));
        }
        Ok(())
    }

    fn draw(&mut self, _time: &GameTime, ctx: &GameContext<'_>) -> Result<()> {
        let ticks = self.ticks.load(Ordering::Relaxed);
        let mut batch = ctx.begin_batch();
        batch.draw_text(ctx.text(), &ticks.to_string(), Vec2::new(8.0, 8.0), 16.0, Color::WHITE);
        batch.end()
    }
}

#[derive(Default)]
struct Playground {
    keyboard: Option<Arc<Keyboard>>,
    mouse: Option<Arc<Mouse>>,
    position: Mutex<Vec2>,
    panel: Option<RenderTarget>,
    ticks: Arc<AtomicU64>,
}

impl Game for Playground {
    fn name(&self) -> &str {
        "playground"
    }

    fn initialize(&mut self, ctx: &GameContext<'_>) -> Result<()> {
        self.keyboard = Some(Keyboard::new(ctx));
        self.mouse = Some(Mouse::new(ctx));
        let (width, height) = ctx.window().get_size();
        *self.position.lock() = Vec2::new(width as f32, height as f32) * 0.5;
        Ok(())
    }

    fn load_content(&mut self, ctx: &GameContext<'_>) -> Result<()> {
        self.panel = Some(ctx.create_render_target(256, 64)?);
        ctx.components().add(TickCounter {
            ticks: self.ticks.clone(),
        });
        Ok(())
    }

    fn update(&self, time: &GameTime, ctx: &GameContext<'_>) -> Result<()> {
        let (Some(keyboard), Some(mouse)) = (&self.keyboard, &self.mouse) else {
            return Ok(());
        };
        if keyboard.get_key(Key::Escape).just_pressed() {
            info!("Escape pressed; stopping");
            ctx.stop();
            return Ok(());
        }

        let held = |keys: [Key; 2]| keys.iter().any(|key| keyboard.get_key(*key).is_pressed());
        let mut direction = Vec2::ZERO;
        if held([Key::Left, Key::A]) {
            direction.x -= 1.0;
        }
        if held([Key::Right, Key::D]) {
            direction.x += 1.0;
        }
        if held([Key::Up, Key::W]) {
            direction.y -= 1.0;
        }
        if held([Key::Down, Key::S]) {
            direction.y += 1.0;
        }

        let (width, height) = ctx.window().get_size();
        let bounds = (Vec2::new(width as f32, height as f32) - SQUARE).max(Vec2::ZERO);
        let mut position = self.position.lock();
        if mouse.get_button(MouseButton::Left).is_pressed() {
            *position = mouse.position() - SQUARE * 0.5;
        }
        let moved = *position + direction.normalize_or_zero() * SPEED * time.elapsed_seconds();
        *position = moved.clamp(Vec2::ZERO, bounds);
        Ok(())
    }

    fn draw(&self, time: &GameTime, ctx: &GameContext<'_>) -> Result<()> {
        if let Some(panel) = &self.panel {
            ctx.set_render_target(Some(panel), Color::from_rgb8(24, 24, 32));
            let mut batch = ctx.begin_batch();
            batch.draw_text(ctx.text(), "tandem", Vec2::new(8.0, 8.0), 32.0, Color::WHITE);
            batch.end()?;
        }

        ctx.set_render_target(None, Color::CORNFLOWER_BLUE);
        let pulse = (time.total_seconds().sin() * 0.5 + 0.5) as f32;
        let position = *self.position.lock();
        let mut batch = ctx.begin_batch();
        batch.rect(position, Vec2::splat(SQUARE), Color::new(1.0, pulse, 0.2, 1.0));
        batch.end()
    }
}

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path).with_context(|| format!("Load config {path}"))?,
        None => EngineConfig::default(),
    };
    let _logger = Logger::new(&config.log);

    let platform = WinitPlatform::new()?;
    let mut engine = Engine::with_config(Playground::default(), platform, config);
    engine.run()?;

    info!(
        "Finished after {} update ticks",
        engine.game().ticks.load(Ordering::Relaxed)
    );
    Ok(())
}
