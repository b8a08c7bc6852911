//! Pollable input devices.
//!
//! Every device owns a fixed-size table of controls. Once per Update tick
//! the engine calls [`Hid::update`] on each registered device, which moves
//! each control's current value into its previous slot and samples the
//! native state again. Edge queries (just pressed, just released) compare
//! those two values, so a device refreshed more or less than once per tick
//! reports wrong edges.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::time::GameTime;

pub mod keyboard;
pub mod mouse;
pub mod native;

pub use keyboard::{Key, Keyboard};
pub use mouse::{Mouse, MouseAxis, MouseButton};
pub use native::NativeInput;

/// Current and previous value of one control.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlState<T> {
    pub current: T,
    pub previous: T,
}

/// A digital control: key, mouse button.
pub type Button = ControlState<bool>;

/// An analog control: cursor coordinate, scroll wheel.
pub type Axis = ControlState<f32>;

impl ControlState<bool> {
    pub fn is_pressed(&self) -> bool {
        self.current
    }

    pub fn is_released(&self) -> bool {
        !self.current
    }

    pub fn just_pressed(&self) -> bool {
        self.current && !self.previous
    }

    pub fn just_released(&self) -> bool {
        !self.current && self.previous
    }

    pub fn is_held(&self) -> bool {
        self.current && self.previous
    }
}

impl ControlState<f32> {
    pub fn delta(&self) -> f32 {
        self.current - self.previous
    }
}

/// Fixed-capacity control table.
///
/// Index `i` of the table maps to native code `base + i`.
#[derive(Debug, Clone)]
pub struct ControlTable<T> {
    base: usize,
    controls: Box<[ControlState<T>]>,
}

impl<T: Copy + Default> ControlTable<T> {
    pub fn new(count: usize, base: usize) -> Self {
        Self {
            base,
            controls: vec![ControlState::default(); count].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// Shifts every control's current value into previous, then asks
    /// `sample` for the new current value of each native code.
    pub fn refresh(&mut self, mut sample: impl FnMut(usize) -> T) {
        let base = self.base;
        for (index, control) in self.controls.iter_mut().enumerate() {
            control.previous = control.current;
            control.current = sample(base + index);
        }
    }

    /// # Panics
    ///
    /// Panics if `index` is outside `0..len()`.
    pub fn get(&self, index: usize) -> ControlState<T> {
        assert!(
            index < self.controls.len(),
            "control index {index} out of range for a device with {} controls",
            self.controls.len()
        );
        self.controls[index]
    }
}

/// A human-interface device the Update pass refreshes every tick.
pub trait Hid: Send + Sync {
    /// Samples the native state. Called by the engine exactly once per Update tick.
    fn update(&self, time: &GameTime);

    fn control_count(&self) -> usize;

    fn name(&self) -> &str;
}

/// Devices refreshed by the Update pass, in registration order.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<Vec<Arc<dyn Hid>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, device: Arc<dyn Hid>) {
        debug!(
            "Registered input device {} ({} controls)",
            device.name(),
            device.control_count()
        );
        self.devices.write().push(device);
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    pub(crate) fn update_all(&self, time: &GameTime) {
        // Snapshot so a device registered mid-tick does not deadlock the refresh.
        let devices: Vec<Arc<dyn Hid>> = self.devices.read().clone();
        for device in devices {
            device.update(time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn states(table: &ControlTable<bool>) -> (bool, bool) {
        let button = table.get(0);
        (button.previous, button.current)
    }

    #[test]
    fn edges_follow_the_sampled_sequence() {
        let mut table = ControlTable::<bool>::new(1, 0);
        let samples = [false, true, true, false];
        let mut seen = Vec::new();
        for sample in samples {
            table.refresh(|_| sample);
            seen.push(states(&table));
        }
        assert_eq!(
            seen,
            vec![
                (false, false), // released -> released
                (false, true),  // released -> pressed
                (true, true),   // pressed -> pressed
                (true, false),  // pressed -> released
            ]
        );
    }

    #[test]
    fn button_predicates() {
        let pressed = Button {
            current: true,
            previous: false,
        };
        let held = Button {
            current: true,
            previous: true,
        };
        let released = Button {
            current: false,
            previous: true,
        };
        assert!(pressed.just_pressed() && !pressed.is_held());
        assert!(held.is_held() && !held.just_pressed() && !held.just_released());
        assert!(released.just_released() && released.is_released());
    }

    #[test]
    fn refresh_samples_base_offset_codes() {
        let mut table = ControlTable::<bool>::new(3, 10);
        let mut asked = Vec::new();
        table.refresh(|code| {
            asked.push(code);
            code == 11
        });
        assert_eq!(asked, vec![10, 11, 12]);
        assert!(table.get(1).current);
        assert_eq!(table.base(), 10);
    }

    #[test]
    fn axis_delta() {
        let mut table = ControlTable::<f32>::new(1, 0);
        table.refresh(|_| 2.0);
        table.refresh(|_| 5.5);
        assert_eq!(table.get(0).delta(), 3.5);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn index_past_the_end_is_rejected() {
        let table = ControlTable::<bool>::new(4, 0);
        table.get(4);
    }

    struct Counting {
        updates: AtomicUsize,
    }

    impl Hid for Counting {
        fn update(&self, _time: &GameTime) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }

        fn control_count(&self) -> usize {
            0
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn registry_refreshes_every_device_once_per_call() {
        let registry = DeviceRegistry::new();
        let first = Arc::new(Counting {
            updates: AtomicUsize::new(0),
        });
        let second = Arc::new(Counting {
            updates: AtomicUsize::new(0),
        });
        registry.register(first.clone());
        registry.register(second.clone());

        registry.update_all(&GameTime::default());
        registry.update_all(&GameTime::default());

        assert_eq!(registry.len(), 2);
        assert_eq!(first.updates.load(Ordering::SeqCst), 2);
        assert_eq!(second.updates.load(Ordering::SeqCst), 2);
    }
}
