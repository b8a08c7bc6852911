use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use glam::Vec2;
use tracing::{debug, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window as WinitWindow, WindowAttributes, WindowId};

use crate::config::VideoOptions;
use crate::error::{EngineError, Result};
use crate::input::{Key, MouseButton};
use crate::platform::{Platform, PlatformSink};
use crate::renderer::Renderer;
use crate::renderer::renderer_vulkan::VulkanRenderer;

/// Pixels per scroll "line" for devices that report pixel deltas.
const SCROLL_LINE_PX: f32 = 20.0;
const SURFACE_PUMP_ATTEMPTS: usize = 200;

#[derive(Default)]
struct Handler {
    attributes: Option<WindowAttributes>,
    window: Option<Arc<WinitWindow>>,
    sink: Option<PlatformSink>,
    title: String,
    close_requested: bool,
    creation_error: Option<String>,
}

impl Handler {
    fn sync_title(&mut self) {
        let (Some(window), Some(sink)) = (&self.window, &self.sink) else {
            return;
        };
        let title = sink.window.get_title();
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for Handler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(attributes) = self.attributes.take() else {
            return;
        };
        match event_loop.create_window(attributes) {
            Ok(window) => {
                info!("Created window with ID: {:?}", window.id());
                self.window = Some(Arc::new(window));
            }
            Err(err) => self.creation_error = Some(err.to_string()),
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                info!("The close button was pressed; stopping");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => sink.window.set_size(size.width, size.height),
            WindowEvent::Focused(is_focused) => {
                sink.window.set_focused(is_focused);
                if !is_focused {
                    // Releases that happen while unfocused are never reported.
                    sink.input.release_all();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    match Key::from_winit(code) {
                        Some(key) => sink.input.set_key(key.code(), event.state.is_pressed()),
                        None => debug!("Unmapped key {code:?}"),
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = MouseButton::from_winit(button);
                sink.input.set_mouse_button(button.code(), state.is_pressed());
            }
            WindowEvent::CursorMoved { position, .. } => {
                sink.input
                    .set_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / SCROLL_LINE_PX,
                };
                sink.input.add_scroll(lines);
            }
            _ => (),
        }
    }
}

/// A winit window with its event loop pumped from the Update thread.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    handler: Handler,
}

impl WinitPlatform {
    pub fn new() -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().with_context(|| "Create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        Ok(Self {
            event_loop,
            handler: Handler::default(),
        })
    }

    fn pump(&mut self, timeout: Duration) {
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(timeout), &mut self.handler)
        {
            info!("Event loop exited with code {code}");
            self.handler.close_requested = true;
        }
    }
}

impl Platform for WinitPlatform {
    fn create_surface(&mut self, options: &VideoOptions, sink: PlatformSink) -> Result<()> {
        let fullscreen = options.fullscreen.then_some(Fullscreen::Borderless(None));
        self.handler.attributes = Some(
            WinitWindow::default_attributes()
                .with_title(options.title.clone())
                .with_inner_size(PhysicalSize::new(options.width, options.height))
                .with_fullscreen(fullscreen),
        );
        self.handler.title = options.title.clone();
        self.handler.sink = Some(sink);

        // The window appears once the loop delivers `resumed`.
        for _ in 0..SURFACE_PUMP_ATTEMPTS {
            self.pump(Duration::from_millis(5));
            if let Some(err) = self.handler.creation_error.take() {
                return Err(EngineError::Surface(err));
            }
            if self.handler.window.is_some() {
                return Ok(());
            }
            if self.handler.close_requested {
                break;
            }
        }
        Err(EngineError::Surface(
            "event loop never produced a window".to_owned(),
        ))
    }

    fn create_renderer(&mut self) -> Result<Box<dyn Renderer>> {
        let window = self
            .handler
            .window
            .clone()
            .ok_or_else(|| EngineError::Renderer("no window to render into".to_owned()))?;
        let renderer =
            VulkanRenderer::new(window).map_err(|err| EngineError::Renderer(format!("{err:#}")))?;
        Ok(Box::new(renderer))
    }

    fn poll_events(&mut self) -> anyhow::Result<()> {
        self.pump(Duration::ZERO);
        self.handler.sync_title();
        if let Some(err) = self.handler.creation_error.take() {
            warn!("Window error: {err}");
        }
        Ok(())
    }

    fn should_close(&self) -> bool {
        self.handler.close_requested
    }

    fn destroy_surface(&mut self) {
        if let Some(window) = self.handler.window.take() {
            info!("Destroying window {:?}", window.id());
        }
        self.handler.sink = None;
    }
}
