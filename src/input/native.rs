use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec2;
use parking_lot::Mutex;

use crate::input::keyboard::KEY_COUNT;
use crate::input::mouse::BUTTON_COUNT;

#[derive(Debug, Default, Clone, Copy)]
struct Pointer {
    cursor: Vec2,
    scroll: f32,
}

/// Raw input state as the platform last reported it.
///
/// The event pump writes here as events arrive; devices read it when they
/// refresh. Nothing here knows about previous values.
#[derive(Debug)]
pub struct NativeInput {
    keys: Box<[AtomicBool]>,
    mouse_buttons: Box<[AtomicBool]>,
    pointer: Mutex<Pointer>,
}

impl Default for NativeInput {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeInput {
    pub fn new() -> Self {
        Self {
            keys: (0..KEY_COUNT).map(|_| AtomicBool::new(false)).collect(),
            mouse_buttons: (0..BUTTON_COUNT).map(|_| AtomicBool::new(false)).collect(),
            pointer: Mutex::new(Pointer::default()),
        }
    }

    /// Codes outside the table are ignored.
    pub fn set_key(&self, code: usize, pressed: bool) {
        if let Some(key) = self.keys.get(code) {
            key.store(pressed, Ordering::Release);
        }
    }

    pub fn key(&self, code: usize) -> bool {
        self.keys
            .get(code)
            .is_some_and(|key| key.load(Ordering::Acquire))
    }

    pub fn set_mouse_button(&self, code: usize, pressed: bool) {
        if let Some(button) = self.mouse_buttons.get(code) {
            button.store(pressed, Ordering::Release);
        }
    }

    pub fn mouse_button(&self, code: usize) -> bool {
        self.mouse_buttons
            .get(code)
            .is_some_and(|button| button.load(Ordering::Acquire))
    }

    pub fn set_cursor(&self, position: Vec2) {
        self.pointer.lock().cursor = position;
    }

    pub fn cursor(&self) -> Vec2 {
        self.pointer.lock().cursor
    }

    /// Accumulates wheel movement. The scroll axis is a running total.
    pub fn add_scroll(&self, amount: f32) {
        self.pointer.lock().scroll += amount;
    }

    pub fn scroll(&self) -> f32 {
        self.pointer.lock().scroll
    }

    /// Releases every key and button, e.g. when the window loses focus and
    /// release events may never arrive.
    pub fn release_all(&self) {
        for key in self.keys.iter().chain(self.mouse_buttons.iter()) {
            key.store(false, Ordering::Release);
        }
    }
}
