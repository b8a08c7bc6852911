use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::config::VideoOptions;

/// What the game may know about its window.
///
/// The platform's event pump keeps this current; everyone else reads it.
#[derive(Debug)]
pub struct WindowState {
    width: AtomicU32,
    height: AtomicU32,
    fullscreen: bool,
    is_focused: AtomicBool,
    is_minimized: AtomicBool,
    title: RwLock<String>,
}

impl WindowState {
    pub fn new(options: &VideoOptions) -> Self {
        WindowState {
            width: AtomicU32::new(options.width),
            height: AtomicU32::new(options.height),
            fullscreen: options.fullscreen,
            is_focused: AtomicBool::new(false),
            is_minimized: AtomicBool::new(false),
            title: RwLock::new(options.title.clone()),
        }
    }

    pub fn set_focused(&self, focused: bool) {
        self.is_focused.store(focused, Ordering::Relaxed);
    }

    pub fn is_focused(&self) -> bool {
        self.is_focused.load(Ordering::Relaxed)
    }

    pub fn set_minimized(&self, minimized: bool) {
        self.is_minimized.store(minimized, Ordering::Relaxed);
    }

    pub fn is_minimized(&self) -> bool {
        self.is_minimized.load(Ordering::Relaxed)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::Relaxed);
        self.height.store(height, Ordering::Relaxed);
        self.set_minimized(width == 0 || height == 0);
    }

    pub fn get_width(&self) -> u32 {
        self.width.load(Ordering::Relaxed)
    }

    pub fn get_height(&self) -> u32 {
        self.height.load(Ordering::Relaxed)
    }

    pub fn get_size(&self) -> (u32, u32) {
        (self.get_width(), self.get_height())
    }

    pub fn get_title(&self) -> String {
        self.title.read().clone()
    }

    pub fn set_title(&self, title: &str) {
        *self.title.write() = title.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_from_the_video_options() {
        let window = WindowState::new(&VideoOptions::new(320, 240, true).with_title("Tetris"));
        assert_eq!(window.get_size(), (320, 240));
        assert!(window.is_fullscreen());
        assert_eq!(window.get_title(), "Tetris");
        assert!(!window.is_focused());
    }

    #[test]
    fn zero_size_means_minimized() {
        let window = WindowState::new(&VideoOptions::default());
        window.set_size(0, 0);
        assert!(window.is_minimized());
        window.set_size(1024, 768);
        assert!(!window.is_minimized());
        assert_eq!(window.get_width(), 1024);
    }
}
