use std::sync::Arc;

use glam::Vec2;
use parking_lot::RwLock;

use crate::application::GameContext;
use crate::input::{Axis, Button, ControlTable, Hid, NativeInput};
use crate::time::GameTime;

pub const BUTTON_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    /// Extra buttons past the named five. `Other(0)` has code 5.
    Other(u8),
}

impl MouseButton {
    pub fn code(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(n) => 5 + usize::from(n),
        }
    }

    pub fn from_winit(button: winit::event::MouseButton) -> MouseButton {
        use winit::event::MouseButton as W;
        match button {
            W::Left => MouseButton::Left,
            W::Right => MouseButton::Right,
            W::Middle => MouseButton::Middle,
            W::Back => MouseButton::Back,
            W::Forward => MouseButton::Forward,
            W::Other(n) => MouseButton::Other(u8::try_from(n).unwrap_or(u8::MAX)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAxis {
    X = 0,
    Y = 1,
    Scroll = 2,
}

const AXIS_COUNT: usize = 3;

struct MouseState {
    buttons: ControlTable<bool>,
    axes: ControlTable<f32>,
}

/// Mouse buttons plus cursor and wheel axes, all refreshed together under
/// one lock so readers never see buttons and axes from different ticks.
pub struct Mouse {
    state: RwLock<MouseState>,
    source: Arc<NativeInput>,
}

impl Mouse {
    /// Creates a mouse and registers it with the engine.
    pub fn new(ctx: &GameContext<'_>) -> Arc<Self> {
        let mouse = Arc::new(Self::with_source(ctx.input().clone()));
        ctx.devices().register(mouse.clone());
        mouse
    }

    pub fn with_source(source: Arc<NativeInput>) -> Self {
        Self {
            state: RwLock::new(MouseState {
                buttons: ControlTable::new(BUTTON_COUNT, 0),
                axes: ControlTable::new(AXIS_COUNT, 0),
            }),
            source,
        }
    }

    /// # Panics
    ///
    /// Panics for `Other` buttons past [`BUTTON_COUNT`].
    pub fn get_button(&self, button: MouseButton) -> Button {
        self.state.read().buttons.get(button.code())
    }

    pub fn get_axis(&self, axis: MouseAxis) -> Axis {
        self.state.read().axes.get(axis as usize)
    }

    /// Cursor position in window pixels as of the last refresh.
    pub fn position(&self) -> Vec2 {
        let state = self.state.read();
        Vec2::new(state.axes.get(0).current, state.axes.get(1).current)
    }

    /// Cursor movement between the last two refreshes.
    pub fn delta(&self) -> Vec2 {
        let state = self.state.read();
        Vec2::new(state.axes.get(0).delta(), state.axes.get(1).delta())
    }

    pub fn scroll_delta(&self) -> f32 {
        self.get_axis(MouseAxis::Scroll).delta()
    }
}

impl Hid for Mouse {
    fn update(&self, _time: &GameTime) {
        let source = &self.source;
        let cursor = source.cursor();
        let scroll = source.scroll();

        let mut state = self.state.write();
        state.buttons.refresh(|code| source.mouse_button(code));
        state.axes.refresh(|code| match code {
            0 => cursor.x,
            1 => cursor.y,
            _ => scroll,
        });
    }

    fn control_count(&self) -> usize {
        BUTTON_COUNT + AXIS_COUNT
    }

    fn name(&self) -> &str {
        "mouse"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_movement_shows_up_as_delta() {
        let source = Arc::new(NativeInput::new());
        let mouse = Mouse::with_source(source.clone());
        let time = GameTime::default();

        source.set_cursor(Vec2::new(10.0, 20.0));
        mouse.update(&time);
        source.set_cursor(Vec2::new(15.0, 18.0));
        mouse.update(&time);

        assert_eq!(mouse.position(), Vec2::new(15.0, 18.0));
        assert_eq!(mouse.delta(), Vec2::new(5.0, -2.0));
    }

    #[test]
    fn scroll_delta_is_per_tick() {
        let source = Arc::new(NativeInput::new());
        let mouse = Mouse::with_source(source.clone());
        let time = GameTime::default();

        source.add_scroll(2.0);
        mouse.update(&time);
        assert_eq!(mouse.scroll_delta(), 2.0);
        mouse.update(&time);
        assert_eq!(mouse.scroll_delta(), 0.0);
    }

    #[test]
    fn buttons_track_edges() {
        let source = Arc::new(NativeInput::new());
        let mouse = Mouse::with_source(source.clone());
        source.set_mouse_button(MouseButton::Right.code(), true);
        mouse.update(&GameTime::default());
        assert!(mouse.get_button(MouseButton::Right).just_pressed());
        assert!(!mouse.get_button(MouseButton::Left).is_pressed());
    }

    #[test]
    fn extra_buttons_follow_the_named_five() {
        assert_eq!(MouseButton::Other(0).code(), 5);
        let source = Arc::new(NativeInput::new());
        let mouse = Mouse::with_source(source.clone());
        source.set_mouse_button(MouseButton::Other(1).code(), true);
        mouse.update(&GameTime::default());
        assert!(mouse.get_button(MouseButton::Other(1)).is_pressed());
        assert!(!mouse.get_button(MouseButton::Right).is_pressed());
    }

    #[test]
    fn one_refresh_moves_buttons_and_axes_together() {
        let source = Arc::new(NativeInput::new());
        let mouse = Mouse::with_source(source.clone());
        source.set_mouse_button(MouseButton::Left.code(), true);
        source.set_cursor(Vec2::new(3.0, 4.0));

        let state = mouse.state.read();
        assert!(!state.buttons.get(MouseButton::Left.code()).is_pressed());
        assert_eq!(state.axes.get(MouseAxis::X as usize).current, 0.0);
        drop(state);

        mouse.update(&GameTime::default());
        let state = mouse.state.read();
        assert!(state.buttons.get(MouseButton::Left.code()).just_pressed());
        assert_eq!(state.axes.get(MouseAxis::X as usize).current, 3.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn unknown_extra_button_panics() {
        let mouse = Mouse::with_source(Arc::new(NativeInput::new()));
        mouse.get_button(MouseButton::Other(40));
    }
}
