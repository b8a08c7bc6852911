//! A game loop that runs Update and Draw concurrently on two threads, with
//! pollable input devices and a swappable render-target context.
//!
//! ```no_run
//! use tandem::platform::platform_winit::WinitPlatform;
//! use tandem::{Engine, Game};
//!
//! struct Pong;
//! impl Game for Pong {}
//!
//! let mut engine = Engine::new(Pong, WinitPlatform::new()?);
//! engine.set_video_options(1280, 720, false, Some("Pong"));
//! engine.run()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod application;
pub mod component;
pub mod config;
pub mod error;
pub mod input;
pub mod logger;
pub mod platform;
pub mod renderer;
pub mod time;
pub mod window;

#[cfg(test)]
mod testing;

pub use application::{Engine, Game, GameContext, Lifecycle, RunFlag};
pub use component::{Component, ComponentId, ComponentRegistry};
pub use config::{EngineConfig, LogConfig, TimingConfig, VideoOptions};
pub use error::{EngineError, Result};
pub use input::{Button, Hid, Key, Keyboard, Mouse, MouseButton};
pub use logger::Logger;
pub use renderer::{Color, RenderTarget};
pub use time::GameTime;
pub use window::WindowState;
