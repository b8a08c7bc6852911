//! Shared fixtures for unit tests.

use std::sync::Arc;

use anyhow::{Result, bail};
use parking_lot::Mutex;

use crate::application::{GameContext, RunFlag};
use crate::component::{Component, ComponentRegistry};
use crate::config::VideoOptions;
use crate::input::{DeviceRegistry, NativeInput};
use crate::renderer::headless::{FrameLog, HeadlessRenderer};
use crate::renderer::{BlockTextEngine, RenderContext, TextEngine};
use crate::time::GameTime;
use crate::window::WindowState;

/// Everything a [`GameContext`] borrows, without an engine around it.
pub(crate) struct Harness {
    pub components: ComponentRegistry,
    pub devices: DeviceRegistry,
    pub input: Arc<NativeInput>,
    pub window: WindowState,
    pub running: RunFlag,
    pub render: RenderContext,
    pub text: BlockTextEngine,
}

impl Harness {
    pub fn new() -> Self {
        let mut text = BlockTextEngine::new();
        text.init().unwrap();
        Self {
            components: ComponentRegistry::new(),
            devices: DeviceRegistry::new(),
            input: Arc::new(NativeInput::new()),
            window: WindowState::new(&VideoOptions::default()),
            running: RunFlag::new(),
            render: RenderContext::new(Box::new(HeadlessRenderer::new(FrameLog::default()))),
            text,
        }
    }

    pub fn ctx(&self) -> GameContext<'_> {
        GameContext {
            components: &self.components,
            devices: &self.devices,
            input: &self.input,
            window: &self.window,
            running: &self.running,
            render: &self.render,
            text: &self.text,
        }
    }
}

pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

/// Component that writes `name.hook` to a journal for every hook call.
pub(crate) struct Spy {
    name: String,
    events: Journal,
    fail_on: Option<&'static str>,
}

impl Spy {
    pub fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub fn new(name: &str) -> (Self, Journal) {
        let events = Self::journal();
        (Self::with_journal(name, &events), events)
    }

    pub fn with_journal(name: &str, events: &Journal) -> Self {
        Self {
            name: name.to_owned(),
            events: events.clone(),
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, stage: &'static str) -> Self {
        self.fail_on = Some(stage);
        self
    }

    fn record(&self, stage: &'static str) -> Result<()> {
        self.events.lock().push(format!("{}.{stage}", self.name));
        if self.fail_on == Some(stage) {
            bail!("{stage} exploded");
        }
        Ok(())
    }
}

impl Component for Spy {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&mut self, _ctx: &GameContext<'_>) -> Result<()> {
        self.record("initialize")
    }

    fn load_content(&mut self, _ctx: &GameContext<'_>) -> Result<()> {
        self.record("load_content")
    }

    fn update(&mut self, _time: &GameTime, _ctx: &GameContext<'_>) -> Result<()> {
        self.record("update")
    }

    fn draw(&mut self, _time: &GameTime, _ctx: &GameContext<'_>) -> Result<()> {
        self.record("draw")
    }

    fn unload_content(&mut self, _ctx: &GameContext<'_>) -> Result<()> {
        self.record("unload_content")
    }
}
