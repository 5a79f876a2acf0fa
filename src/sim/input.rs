//! Per-tick input state
//!
//! Keyboard keys and mouse buttons each get an [`EdgeDetector`]; the cursor
//! is carried forward when the source does not report it.

use glam::Vec2;

use super::edge::{EdgeDetector, KeyState};
use crate::platform::InputSource;
use crate::settings::Settings;

/// Input as seen by game logic during one tick
#[derive(Debug, Clone)]
pub struct InputState {
    keys: EdgeDetector<usize>,
    buttons: EdgeDetector<usize>,
    cursor: Vec2,
}

impl InputState {
    pub fn new(key_count: usize, button_count: usize) -> Self {
        Self {
            keys: EdgeDetector::dense(key_count),
            buttons: EdgeDetector::dense(button_count),
            cursor: Vec2::ZERO,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.key_count, settings.button_count)
    }

    /// Sample `source` and advance all edges by one tick
    ///
    /// The whole sample is taken in one [`InputSource::sample`] call, so a
    /// shared source is locked once per tick. Keys the source has never seen
    /// count as released.
    pub fn poll<S: InputSource + ?Sized>(&mut self, source: &S) {
        let Self {
            keys,
            buttons,
            cursor,
        } = self;
        source.sample(&mut |snapshot: &dyn InputSource| {
            keys.update(|code| snapshot.key(code).unwrap_or(false));
            buttons.update(|button| snapshot.button(button).unwrap_or(false));
            if let Some(pos) = snapshot.cursor() {
                *cursor = pos;
            }
        });
    }

    /// Pressed this tick (not held from before)
    #[inline]
    pub fn is_key_just_pressed(&self, code: usize) -> bool {
        self.keys.is_just_active(code)
    }

    #[inline]
    pub fn is_key_down(&self, code: usize) -> bool {
        self.keys.is_active(code)
    }

    pub fn key_state(&self, code: usize) -> KeyState {
        self.keys.state(code)
    }

    #[inline]
    pub fn is_button_just_pressed(&self, button: usize) -> bool {
        self.buttons.is_just_active(button)
    }

    #[inline]
    pub fn is_button_down(&self, button: usize) -> bool {
        self.buttons.is_active(button)
    }

    /// Last known cursor position
    #[inline]
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Consume a key press so it must be released and pressed again
    pub fn reset_key(&mut self, code: usize) {
        self.keys.reset(code);
    }

    pub fn reset_button(&mut self, button: usize) {
        self.buttons.reset(button);
    }

    /// Drop all held keys and buttons (e.g. on focus loss)
    pub fn reset_all(&mut self) {
        self.keys.reset_all();
        self.buttons.reset_all();
    }

    pub fn keys(&self) -> &EdgeDetector<usize> {
        &self.keys
    }

    pub fn buttons(&self) -> &EdgeDetector<usize> {
        &self.buttons
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::InputSnapshot;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Shared source that counts how often it is locked
    struct CountingSource {
        inner: Mutex<InputSnapshot>,
        locks: AtomicUsize,
    }

    impl CountingSource {
        fn lock(&self) -> parking_lot::MutexGuard<'_, InputSnapshot> {
            self.locks.fetch_add(1, Ordering::SeqCst);
            self.inner.lock()
        }
    }

    impl InputSource for CountingSource {
        fn key(&self, code: usize) -> Option<bool> {
            self.lock().key(code)
        }

        fn button(&self, button: usize) -> Option<bool> {
            self.lock().button(button)
        }

        fn cursor(&self) -> Option<Vec2> {
            self.lock().cursor()
        }

        fn sample(&self, f: &mut dyn FnMut(&dyn InputSource)) {
            let guard = self.lock();
            f(&*guard);
        }
    }

    const SPACE: usize = 32;

    #[test]
    fn test_key_edges_from_source() {
        let mut source = InputSnapshot::new();
        let mut input = InputState::default();

        input.poll(&source);
        assert!(!input.is_key_down(SPACE));

        source.press_key(SPACE);
        input.poll(&source);
        assert!(input.is_key_just_pressed(SPACE));

        input.poll(&source);
        assert!(input.is_key_down(SPACE));
        assert!(!input.is_key_just_pressed(SPACE));

        source.release_key(SPACE);
        input.poll(&source);
        assert_eq!(input.key_state(SPACE), KeyState::Idle);
    }

    #[test]
    fn test_buttons_and_cursor() {
        let mut source = InputSnapshot::new();
        let mut input = InputState::new(8, 3);

        source.press_button(1);
        source.move_cursor(Vec2::new(10.0, 20.0));
        input.poll(&source);
        assert!(input.is_button_just_pressed(1));
        assert_eq!(input.cursor(), Vec2::new(10.0, 20.0));

        // Cursor absent: last position sticks
        source.clear();
        input.poll(&source);
        assert!(!input.is_button_down(1));
        assert_eq!(input.cursor(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_reset_consumes_press() {
        let mut source = InputSnapshot::new();
        let mut input = InputState::new(64, 1);
        source.press_key(SPACE);

        input.poll(&source);
        input.reset_key(SPACE);
        assert!(!input.is_key_down(SPACE));

        // Still physically held: shows up as a fresh press
        input.poll(&source);
        assert!(input.is_key_just_pressed(SPACE));

        input.reset_all();
        assert_eq!(input.keys().active().count(), 0);
        assert_eq!(input.buttons().len(), 1);
    }

    #[test]
    fn test_poll_locks_shared_source_once() {
        let mut snapshot = InputSnapshot::new();
        snapshot.press_key(SPACE);
        snapshot.press_button(0);
        snapshot.move_cursor(Vec2::new(1.0, 2.0));
        let source = CountingSource {
            inner: Mutex::new(snapshot),
            locks: AtomicUsize::new(0),
        };
        let mut input = InputState::default();

        input.poll(&source);
        assert_eq!(source.locks.load(Ordering::SeqCst), 1);
        assert!(input.is_key_just_pressed(SPACE));
        assert!(input.is_button_just_pressed(0));
        assert_eq!(input.cursor(), Vec2::new(1.0, 2.0));
    }
}
