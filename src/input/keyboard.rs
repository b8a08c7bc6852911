use std::sync::Arc;

use parking_lot::RwLock;
use winit::keyboard::KeyCode;

use crate::application::GameContext;
use crate::input::{Button, ControlTable, Hid, NativeInput};
use crate::time::GameTime;

/// Number of key slots a keyboard tracks. Covers every [`Key`] code.
pub const KEY_COUNT: usize = 512;

/// Physical keys, numbered with the classic GLFW key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Key {
    Space = 32,
    Apostrophe = 39,
    Comma = 44,
    Minus = 45,
    Period = 46,
    Slash = 47,
    Num0 = 48,
    Num1 = 49,
    Num2 = 50,
    Num3 = 51,
    Num4 = 52,
    Num5 = 53,
    Num6 = 54,
    Num7 = 55,
    Num8 = 56,
    Num9 = 57,
    Semicolon = 59,
    Equal = 61,
    A = 65,
    B = 66,
    C = 67,
    D = 68,
    E = 69,
    F = 70,
    G = 71,
    H = 72,
    I = 73,
    J = 74,
    K = 75,
    L = 76,
    M = 77,
    N = 78,
    O = 79,
    P = 80,
    Q = 81,
    R = 82,
    S = 83,
    T = 84,
    U = 85,
    V = 86,
    W = 87,
    X = 88,
    Y = 89,
    Z = 90,
    LeftBracket = 91,
    Backslash = 92,
    RightBracket = 93,
    GraveAccent = 96,
    /// Non-US #1
    World1 = 161,
    /// Non-US #2
    World2 = 162,
    Escape = 256,
    Enter = 257,
    Tab = 258,
    Backspace = 259,
    Insert = 260,
    Delete = 261,
    Right = 262,
    Left = 263,
    Down = 264,
    Up = 265,
    PageUp = 266,
    PageDown = 267,
    Home = 268,
    End = 269,
    CapsLock = 280,
    ScrollLock = 281,
    NumLock = 282,
    PrintScreen = 283,
    Pause = 284,
    F1 = 290,
    F2 = 291,
    F3 = 292,
    F4 = 293,
    F5 = 294,
    F6 = 295,
    F7 = 296,
    F8 = 297,
    F9 = 298,
    F10 = 299,
    F11 = 300,
    F12 = 301,
    F13 = 302,
    F14 = 303,
    F15 = 304,
    F16 = 305,
    F17 = 306,
    F18 = 307,
    F19 = 308,
    F20 = 309,
    F21 = 310,
    F22 = 311,
    F23 = 312,
    F24 = 313,
    F25 = 314,
    Kp0 = 320,
    Kp1 = 321,
    Kp2 = 322,
    Kp3 = 323,
    Kp4 = 324,
    Kp5 = 325,
    Kp6 = 326,
    Kp7 = 327,
    Kp8 = 328,
    Kp9 = 329,
    KpDecimal = 330,
    KpDivide = 331,
    KpMultiply = 332,
    KpSubtract = 333,
    KpAdd = 334,
    KpEnter = 335,
    KpEqual = 336,
    LeftShift = 340,
    LeftControl = 341,
    LeftAlt = 342,
    LeftSuper = 343,
    RightShift = 344,
    RightControl = 345,
    RightAlt = 346,
    RightSuper = 347,
    Menu = 348,
}

impl Key {
    pub fn code(self) -> usize {
        self as usize
    }

    /// Maps a winit physical key. Keys without a code here return `None`.
    pub fn from_winit(code: KeyCode) -> Option<Key> {
        use KeyCode as W;
        let key = match code {
            W::Space => Key::Space,
            W::Quote => Key::Apostrophe,
            W::Comma => Key::Comma,
            W::Minus => Key::Minus,
            W::Period => Key::Period,
            W::Slash => Key::Slash,
            W::Digit0 => Key::Num0,
            W::Digit1 => Key::Num1,
            W::Digit2 => Key::Num2,
            W::Digit3 => Key::Num3,
            W::Digit4 => Key::Num4,
            W::Digit5 => Key::Num5,
            W::Digit6 => Key::Num6,
            W::Digit7 => Key::Num7,
            W::Digit8 => Key::Num8,
            W::Digit9 => Key::Num9,
            W::Semicolon => Key::Semicolon,
            W::Equal => Key::Equal,
            W::KeyA => Key::A,
            W::KeyB => Key::B,
            W::KeyC => Key::C,
            W::KeyD => Key::D,
            W::KeyE => Key::E,
            W::KeyF => Key::F,
            W::KeyG => Key::G,
            W::KeyH => Key::H,
            W::KeyI => Key::I,
            W::KeyJ => Key::J,
            W::KeyK => Key::K,
            W::KeyL => Key::L,
            W::KeyM => Key::M,
            W::KeyN => Key::N,
            W::KeyO => Key::O,
            W::KeyP => Key::P,
            W::KeyQ => Key::Q,
            W::KeyR => Key::R,
            W::KeyS => Key::S,
            W::KeyT => Key::T,
            W::KeyU => Key::U,
            W::KeyV => Key::V,
            W::KeyW => Key::W,
            W::KeyX => Key::X,
            W::KeyY => Key::Y,
            W::KeyZ => Key::Z,
            W::BracketLeft => Key::LeftBracket,
            W::Backslash => Key::Backslash,
            W::BracketRight => Key::RightBracket,
            W::Backquote => Key::GraveAccent,
            W::IntlBackslash => Key::World1,
            W::IntlRo => Key::World2,
            W::Escape => Key::Escape,
            W::Enter => Key::Enter,
            W::Tab => Key::Tab,
            W::Backspace => Key::Backspace,
            W::Insert => Key::Insert,
            W::Delete => Key::Delete,
            W::ArrowRight => Key::Right,
            W::ArrowLeft => Key::Left,
            W::ArrowDown => Key::Down,
            W::ArrowUp => Key::Up,
            W::PageUp => Key::PageUp,
            W::PageDown => Key::PageDown,
            W::Home => Key::Home,
            W::End => Key::End,
            W::CapsLock => Key::CapsLock,
            W::ScrollLock => Key::ScrollLock,
            W::NumLock => Key::NumLock,
            W::PrintScreen => Key::PrintScreen,
            W::Pause => Key::Pause,
            W::F1 => Key::F1,
            W::F2 => Key::F2,
            W::F3 => Key::F3,
            W::F4 => Key::F4,
            W::F5 => Key::F5,
            W::F6 => Key::F6,
            W::F7 => Key::F7,
            W::F8 => Key::F8,
            W::F9 => Key::F9,
            W::F10 => Key::F10,
            W::F11 => Key::F11,
            W::F12 => Key::F12,
            W::F13 => Key::F13,
            W::F14 => Key::F14,
            W::F15 => Key::F15,
            W::F16 => Key::F16,
            W::F17 => Key::F17,
            W::F18 => Key::F18,
            W::F19 => Key::F19,
            W::F20 => Key::F20,
            W::F21 => Key::F21,
            W::F22 => Key::F22,
            W::F23 => Key::F23,
            W::F24 => Key::F24,
            W::F25 => Key::F25,
            W::Numpad0 => Key::Kp0,
            W::Numpad1 => Key::Kp1,
            W::Numpad2 => Key::Kp2,
            W::Numpad3 => Key::Kp3,
            W::Numpad4 => Key::Kp4,
            W::Numpad5 => Key::Kp5,
            W::Numpad6 => Key::Kp6,
            W::Numpad7 => Key::Kp7,
            W::Numpad8 => Key::Kp8,
            W::Numpad9 => Key::Kp9,
            W::NumpadDecimal => Key::KpDecimal,
            W::NumpadDivide => Key::KpDivide,
            W::NumpadMultiply => Key::KpMultiply,
            W::NumpadSubtract => Key::KpSubtract,
            W::NumpadAdd => Key::KpAdd,
            W::NumpadEnter => Key::KpEnter,
            W::NumpadEqual => Key::KpEqual,
            W::ShiftLeft => Key::LeftShift,
            W::ControlLeft => Key::LeftControl,
            W::AltLeft => Key::LeftAlt,
            W::SuperLeft => Key::LeftSuper,
            W::ShiftRight => Key::RightShift,
            W::ControlRight => Key::RightControl,
            W::AltRight => Key::RightAlt,
            W::SuperRight => Key::RightSuper,
            W::ContextMenu => Key::Menu,
            _ => return None,
        };
        Some(key)
    }
}

/// The system keyboard: [`KEY_COUNT`] buttons starting at code 0.
pub struct Keyboard {
    keys: RwLock<ControlTable<bool>>,
    source: Arc<NativeInput>,
}

impl Keyboard {
    /// Creates a keyboard and registers it with the engine, which refreshes
    /// it once per Update tick from then on.
    pub fn new(ctx: &GameContext<'_>) -> Arc<Self> {
        let keyboard = Arc::new(Self::with_source(ctx.input().clone()));
        ctx.devices().register(keyboard.clone());
        keyboard
    }

    /// A keyboard reading `source` that no engine refreshes. Call
    /// [`Hid::update`] yourself.
    pub fn with_source(source: Arc<NativeInput>) -> Self {
        Self {
            keys: RwLock::new(ControlTable::new(KEY_COUNT, 0)),
            source,
        }
    }

    pub fn get_key(&self, key: Key) -> Button {
        self.get_key_code(key.code())
    }

    /// # Panics
    ///
    /// Panics if `code` is not below [`KEY_COUNT`].
    pub fn get_key_code(&self, code: usize) -> Button {
        self.keys.read().get(code)
    }
}

impl Hid for Keyboard {
    fn update(&self, _time: &GameTime) {
        let source = &self.source;
        self.keys.write().refresh(|code| source.key(code));
    }

    fn control_count(&self) -> usize {
        KEY_COUNT
    }

    fn name(&self) -> &str {
        "keyboard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_fit_the_table() {
        assert!(Key::Menu.code() < KEY_COUNT);
        assert_eq!(Key::Escape.code(), 256);
        assert_eq!(Key::A.code(), 65);
    }

    #[test]
    fn winit_codes_map_to_keys() {
        assert_eq!(Key::from_winit(KeyCode::KeyW), Some(Key::W));
        assert_eq!(Key::from_winit(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(Key::from_winit(KeyCode::NumpadEnter), Some(Key::KpEnter));
        assert_eq!(Key::from_winit(KeyCode::F30), None);
    }

    #[test]
    fn press_and_release_edges() {
        let source = Arc::new(NativeInput::new());
        let keyboard = Keyboard::with_source(source.clone());
        let time = GameTime::default();

        source.set_key(Key::Space.code(), true);
        keyboard.update(&time);
        assert!(keyboard.get_key(Key::Space).just_pressed());

        keyboard.update(&time);
        assert!(keyboard.get_key(Key::Space).is_held());

        source.set_key(Key::Space.code(), false);
        keyboard.update(&time);
        assert!(keyboard.get_key(Key::Space).just_released());
        assert!(!keyboard.get_key(Key::Enter).is_pressed());
    }

    #[test]
    fn state_changes_only_on_update() {
        let source = Arc::new(NativeInput::new());
        let keyboard = Keyboard::with_source(source.clone());
        source.set_key(Key::Q.code(), true);
        assert!(!keyboard.get_key(Key::Q).is_pressed());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn code_past_the_table_panics() {
        let keyboard = Keyboard::with_source(Arc::new(NativeInput::new()));
        keyboard.get_key_code(KEY_COUNT);
    }
}
