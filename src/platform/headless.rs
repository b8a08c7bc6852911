//! A platform with no window, driven by a script.
//!
//! Each `poll_events` call counts as one poll. Scripted key changes are
//! written to the native input table on the poll they are scheduled for,
//! and a close request can be scheduled the same way.

use tracing::debug;

use crate::config::VideoOptions;
use crate::error::{EngineError, Result};
use crate::input::Key;
use crate::platform::{Platform, PlatformSink};
use crate::renderer::Renderer;
use crate::renderer::headless::{FrameLog, HeadlessRenderer};

#[derive(Debug, Clone, Copy)]
struct KeyChange {
    poll: usize,
    key: Key,
    pressed: bool,
}

#[derive(Default)]
pub struct HeadlessPlatform {
    log: FrameLog,
    sink: Option<PlatformSink>,
    polls: usize,
    close_after: Option<usize>,
    script: Vec<KeyChange>,
    fail_surface: bool,
    fail_renderer: bool,
    surface_alive: bool,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a close request from poll `polls` on.
    pub fn close_after_polls(mut self, polls: usize) -> Self {
        self.close_after = Some(polls);
        self
    }

    pub fn press_at(mut self, poll: usize, key: Key) -> Self {
        self.script.push(KeyChange {
            poll,
            key,
            pressed: true,
        });
        self
    }

    pub fn release_at(mut self, poll: usize, key: Key) -> Self {
        self.script.push(KeyChange {
            poll,
            key,
            pressed: false,
        });
        self
    }

    pub fn failing_surface(mut self) -> Self {
        self.fail_surface = true;
        self
    }

    pub fn failing_renderer(mut self) -> Self {
        self.fail_renderer = true;
        self
    }

    /// The log the renderer created by this platform records into.
    pub fn frame_log(&self) -> FrameLog {
        self.log.clone()
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn surface_alive(&self) -> bool {
        self.surface_alive
    }
}

impl Platform for HeadlessPlatform {
    fn create_surface(&mut self, options: &VideoOptions, sink: PlatformSink) -> Result<()> {
        if self.fail_surface {
            return Err(EngineError::Surface("headless surface refused".to_owned()));
        }
        debug!(
            "Headless surface {}x{} \"{}\"",
            options.width, options.height, options.title
        );
        self.sink = Some(sink);
        self.surface_alive = true;
        Ok(())
    }

    fn create_renderer(&mut self) -> Result<Box<dyn Renderer>> {
        if self.fail_renderer {
            return Err(EngineError::Renderer("headless renderer refused".to_owned()));
        }
        Ok(Box::new(HeadlessRenderer::new(self.log.clone())))
    }

    fn poll_events(&mut self) -> anyhow::Result<()> {
        self.polls += 1;
        if let Some(sink) = &self.sink {
            for change in self.script.iter().filter(|change| change.poll == self.polls) {
                sink.input.set_key(change.key.code(), change.pressed);
            }
        }
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.close_after.is_some_and(|polls| self.polls >= polls)
    }

    fn destroy_surface(&mut self) {
        self.sink = None;
        self.surface_alive = false;
    }
}
