//! The engine: lifecycle, the two passes and the shutdown protocol.
//!
//! `Engine::run` starts the Draw pass on its own `draw` thread and runs the
//! Update pass, together with the platform's event pump, on the calling
//! thread. The passes keep their own clocks and cadences and never wait for
//! each other. Shutdown is one shared flag checked at the top of every tick,
//! so a tick that has started always finishes.

use std::any::Any;
use std::fmt;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::Result as HookResult;
use tracing::{Level, debug, info, span, warn};

use crate::component::{Activation, ComponentRegistry};
use crate::config::{EngineConfig, TimingConfig, VideoOptions};
use crate::error::{EngineError, Result};
use crate::input::{DeviceRegistry, NativeInput};
use crate::platform::{Platform, PlatformSink};
use crate::renderer::{BlockTextEngine, RenderContext, TextEngine};
use crate::time::{Clock, GameTime, Pacer};
use crate::window::WindowState;

mod context;

pub use context::GameContext;

/// The game's own hooks. Every hook has a no-op default.
///
/// `update` and `draw` take `&self` because they run at the same time on
/// different threads; state they share needs its own synchronization.
pub trait Game: Send + Sync {
    fn name(&self) -> &str {
        "game"
    }

    fn initialize(&mut self, _ctx: &GameContext<'_>) -> HookResult<()> {
        Ok(())
    }

    fn load_content(&mut self, _ctx: &GameContext<'_>) -> HookResult<()> {
        Ok(())
    }

    fn update(&self, _time: &GameTime, _ctx: &GameContext<'_>) -> HookResult<()> {
        Ok(())
    }

    fn draw(&self, _time: &GameTime, _ctx: &GameContext<'_>) -> HookResult<()> {
        Ok(())
    }

    fn unload_content(&mut self, _ctx: &GameContext<'_>) -> HookResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Created,
    Initialized,
    ContentLoaded,
    Running,
    Stopping,
    ContentUnloaded,
    Terminated,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The shared shutdown flag.
#[derive(Debug)]
pub struct RunFlag(AtomicBool);

impl RunFlag {
    pub(crate) fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Both passes finish the tick they are on and do not start another.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Stops the other pass when this one leaves its loop, including by panic.
struct StopOnDrop<'a>(&'a RunFlag);

impl Drop for StopOnDrop<'_> {
    fn drop(&mut self) {
        self.0.stop();
    }
}

/// State that exists once the surface does.
struct Live {
    window: Arc<WindowState>,
    render: RenderContext,
}

/// Everything hooks reach through a [`GameContext`].
struct Shared {
    running: Arc<RunFlag>,
    components: ComponentRegistry,
    devices: DeviceRegistry,
    input: Arc<NativeInput>,
    text: Box<dyn TextEngine>,
    text_ready: bool,
    live: Option<Live>,
}

impl Shared {
    fn context(&self) -> GameContext<'_> {
        let Some(live) = &self.live else {
            unreachable!("context requested before the surface exists");
        };
        GameContext {
            components: &self.components,
            devices: &self.devices,
            input: &self.input,
            window: &live.window,
            running: &self.running,
            render: &live.render,
            text: &*self.text,
        }
    }
}

pub struct Engine<G: Game, P: Platform> {
    game: G,
    platform: P,
    config: EngineConfig,
    lifecycle: Lifecycle,
    shared: Shared,
}

impl<G: Game, P: Platform> Engine<G, P> {
    pub fn new(game: G, platform: P) -> Self {
        Self::with_config(game, platform, EngineConfig::default())
    }

    pub fn with_config(game: G, platform: P, config: EngineConfig) -> Self {
        Engine {
            game,
            platform,
            config,
            lifecycle: Lifecycle::Created,
            shared: Shared {
                running: Arc::new(RunFlag::new()),
                components: ComponentRegistry::new(),
                devices: DeviceRegistry::new(),
                input: Arc::new(NativeInput::new()),
                text: Box::new(BlockTextEngine::new()),
                text_ready: false,
                live: None,
            },
        }
    }

    /// Replaces the text engine. Only allowed before `initialize`.
    pub fn with_text_engine(mut self, text: Box<dyn TextEngine>) -> Self {
        self.expect_state(Lifecycle::Created, "with_text_engine");
        self.shared.text = text;
        self
    }

    /// Window settings for the surface `initialize` creates.
    ///
    /// # Panics
    ///
    /// Panics once `initialize` has run; the surface already exists by then.
    pub fn set_video_options(
        &mut self,
        width: u32,
        height: u32,
        fullscreen: bool,
        title: Option<&str>,
    ) {
        self.expect_state(Lifecycle::Created, "set_video_options");
        let mut options = VideoOptions::new(width, height, fullscreen);
        if let Some(title) = title {
            options = options.with_title(title);
        }
        self.config.video = options;
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.shared.components
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The window, while the surface exists.
    pub fn window(&self) -> Option<&WindowState> {
        self.shared.live.as_ref().map(|live| &*live.window)
    }

    /// The shutdown flag, for stopping the engine from another thread.
    pub fn stop_handle(&self) -> Arc<RunFlag> {
        self.shared.running.clone()
    }

    /// Creates the surface, the renderer and the text engine, then runs the
    /// `initialize` hooks.
    ///
    /// On failure everything created so far is torn down again and the
    /// engine ends up `Terminated`.
    ///
    /// # Panics
    ///
    /// Panics unless the engine is freshly created.
    pub fn initialize(&mut self) -> Result<()> {
        self.expect_state(Lifecycle::Created, "initialize");
        let result = self.try_initialize();
        if result.is_err() {
            self.teardown();
        }
        result
    }

    fn try_initialize(&mut self) -> Result<()> {
        let video = self.config.video.clone();
        video.validate()?;

        let window = Arc::new(WindowState::new(&video));
        let sink = PlatformSink {
            input: self.shared.input.clone(),
            window: window.clone(),
        };
        self.platform.create_surface(&video, sink)?;
        info!(
            "Surface ready: {}x{} \"{}\"{}",
            video.width,
            video.height,
            video.title,
            if video.fullscreen { " (fullscreen)" } else { "" }
        );

        let renderer = self.platform.create_renderer()?;
        let text = &mut self.shared.text;
        text.init()
            .map_err(|err| EngineError::TextEngine(format!("{}: {err:#}", text.name())))?;
        self.shared.text_ready = true;

        let render = RenderContext::new(renderer);
        debug!(
            "Renderer {} and text engine {} ready",
            render.renderer_name(),
            self.shared.text.name()
        );
        self.shared.live = Some(Live { window, render });

        let ctx = self.shared.context();
        ctx.components.apply_pending(&ctx, Activation::Deferred);
        self.game
            .initialize(&ctx)
            .map_err(|err| EngineError::hook(self.game.name(), "initialize", &err))?;
        ctx.components.apply_pending(&ctx, Activation::Deferred);
        ctx.components.initialize_all(&ctx)?;

        self.transition(Lifecycle::Initialized);
        Ok(())
    }

    /// Runs the `load_content` hooks.
    ///
    /// When one fails, whatever loaded before it is unloaded again and the
    /// engine tears down to `Terminated`.
    ///
    /// # Panics
    ///
    /// Panics unless `initialize` has succeeded and content is not loaded yet.
    pub fn load_content(&mut self) -> Result<()> {
        self.expect_state(Lifecycle::Initialized, "load_content");
        let ctx = self.shared.context();
        if let Err(err) = self.game.load_content(&ctx) {
            let err = EngineError::hook(self.game.name(), "load_content", &err);
            self.teardown();
            return Err(err);
        }

        ctx.components.apply_pending(&ctx, Activation::Initialize);
        if let Err(err) = ctx.components.load_content_all(&ctx) {
            if let Err(unload_err) = self.game.unload_content(&ctx) {
                warn!("{} unload_content failed: {unload_err:#}", self.game.name());
            }
            self.teardown();
            return Err(err);
        }
        self.transition(Lifecycle::ContentLoaded);
        Ok(())
    }

    /// Runs both passes until shutdown, then unloads content and tears the
    /// surface down. Initializes and loads content first if that has not
    /// happened yet.
    ///
    /// A panic in either pass stops the other one and is re-raised here.
    ///
    /// # Panics
    ///
    /// Panics when called a second time.
    pub fn run(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Created => {
                self.initialize()?;
                self.load_content()?;
            }
            Lifecycle::Initialized => self.load_content()?,
            Lifecycle::ContentLoaded => {}
            state => panic!("run() called in state {state}; an engine runs only once"),
        }

        self.transition(Lifecycle::Running);
        let outcome = self.run_passes();
        self.transition(Lifecycle::Stopping);

        // The draw thread is joined by now, so nothing draws with what
        // unloading frees.
        self.unload();
        self.teardown();

        match outcome {
            Ok(Some(draw_panic)) => panic::resume_unwind(draw_panic),
            Ok(None) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Returns the Draw thread's panic payload, if it panicked.
    fn run_passes(&mut self) -> Result<Option<Box<dyn Any + Send>>> {
        let ctx = self.shared.context();
        let game = &self.game;
        let platform = &mut self.platform;
        let timing = &self.config.timing;

        thread::scope(|scope| {
            let draw = thread::Builder::new()
                .name("draw".to_owned())
                .spawn_scoped(scope, move || draw_pass(game, ctx, timing))
                .map_err(|err| {
                    ctx.running.stop();
                    EngineError::DrawThread(err.to_string())
                })?;

            update_pass(game, platform, ctx, timing);

            Ok(draw.join().err())
        })
    }

    fn unload(&mut self) {
        if self.shared.live.is_some() {
            let ctx = self.shared.context();
            ctx.components.unload_all(&ctx);
            if let Err(err) = self.game.unload_content(&ctx) {
                warn!("{} unload_content failed: {err:#}", self.game.name());
            }
        }
        self.transition(Lifecycle::ContentUnloaded);
    }

    /// Releases what `initialize` acquired, newest first.
    fn teardown(&mut self) {
        if self.shared.text_ready {
            self.shared.text.release();
            self.shared.text_ready = false;
        }
        self.shared.live = None;
        self.platform.destroy_surface();
        self.transition(Lifecycle::Terminated);
    }

    fn expect_state(&self, expected: Lifecycle, call: &str) {
        assert!(
            self.lifecycle == expected,
            "{call}() called in state {}, expected {expected}",
            self.lifecycle
        );
    }

    fn transition(&mut self, to: Lifecycle) {
        info!("Engine {} -> {}", self.lifecycle, to);
        self.lifecycle = to;
    }
}

fn update_pass<G: Game, P: Platform>(
    game: &G,
    platform: &mut P,
    ctx: GameContext<'_>,
    timing: &TimingConfig,
) {
    let _stop = StopOnDrop(ctx.running);
    let mut clock = Clock::new(timing.max_delta());
    let mut pacer = Pacer::new(timing.update_hz);

    while ctx.running.is_running() {
        if let Err(err) = platform.poll_events() {
            warn!("Event poll failed: {err:#}");
        }
        if platform.should_close() {
            info!("Platform requested close");
            ctx.running.stop();
            break;
        }

        {
            let _span = span!(Level::DEBUG, "update").entered();
            ctx.components.apply_pending(&ctx, Activation::Full);
            let time = clock.tick();
            ctx.devices.update_all(&time);
            if let Err(err) = game.update(&time, &ctx) {
                warn!("{} update failed: {err:#}", game.name());
            }
            ctx.components.update_all(&time, &ctx);
        }

        pacer.wait();
    }
    debug!("Update pass stopped");
}

fn draw_pass<G: Game>(game: &G, ctx: GameContext<'_>, timing: &TimingConfig) {
    let _stop = StopOnDrop(ctx.running);
    let mut clock = Clock::new(timing.max_delta());
    let mut pacer = Pacer::new(timing.draw_hz);

    while ctx.running.is_running() {
        {
            let _span = span!(Level::DEBUG, "draw").entered();
            let time = clock.tick();
            if let Err(err) = game.draw(&time, &ctx) {
                warn!("{} draw failed: {err:#}", game.name());
            }
            ctx.components.draw_all(&time, &ctx);
            if let Err(err) = ctx.render.present() {
                warn!("Present failed: {err:#}");
            }
        }

        pacer.wait();
    }
    debug!("Draw pass stopped");
}
