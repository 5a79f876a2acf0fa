//! Raw input sources
//!
//! A windowing layer records raw key/button state into an [`InputSource`];
//! the drive thread samples it once per tick. Sampling is level-based: the
//! source reports what is held *now*, edge detection happens in `sim::input`.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;

/// Level-triggered raw input, sampled once per tick
pub trait InputSource {
    /// Is key `code` held? `None` when the source has never seen the key
    fn key(&self, code: usize) -> Option<bool>;

    /// Is mouse button `button` held? `None` when never seen
    fn button(&self, button: usize) -> Option<bool>;

    /// Current cursor position, if known
    fn cursor(&self) -> Option<Vec2>;

    /// Hand `f` a consistent view of the whole source
    ///
    /// Plain sources pass themselves; shared sources hold their lock for the
    /// duration of `f`, so one tick never sees half of a writer's update.
    fn sample(&self, f: &mut dyn FnMut(&dyn InputSource));
}

/// Plain recorded input state
///
/// Also the usual backing store for a shared source:
/// `Arc<Mutex<InputSnapshot>>` written by an event thread, polled by the
/// drive thread.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    keys: HashMap<usize, bool>,
    buttons: HashMap<usize, bool>,
    cursor: Option<Vec2>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_key(&mut self, code: usize) {
        self.keys.insert(code, true);
    }

    pub fn release_key(&mut self, code: usize) {
        self.keys.insert(code, false);
    }

    pub fn press_button(&mut self, button: usize) {
        self.buttons.insert(button, true);
    }

    pub fn release_button(&mut self, button: usize) {
        self.buttons.insert(button, false);
    }

    pub fn move_cursor(&mut self, pos: Vec2) {
        self.cursor = Some(pos);
    }

    /// Forget everything (e.g. on focus loss)
    pub fn clear(&mut self) {
        self.keys.clear();
        self.buttons.clear();
        self.cursor = None;
    }
}

impl InputSource for InputSnapshot {
    fn key(&self, code: usize) -> Option<bool> {
        self.keys.get(&code).copied()
    }

    fn button(&self, button: usize) -> Option<bool> {
        self.buttons.get(&button).copied()
    }

    fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    fn sample(&self, f: &mut dyn FnMut(&dyn InputSource)) {
        f(self);
    }
}

impl<S: InputSource + ?Sized> InputSource for Mutex<S> {
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
        self.lock().sample(f);
    }
}

impl<S: InputSource + ?Sized> InputSource for Arc<S> {
    fn key(&self, code: usize) -> Option<bool> {
        (**self).key(code)
    }

    fn button(&self, button: usize) -> Option<bool> {
        (**self).button(button)
    }

    fn cursor(&self) -> Option<Vec2> {
        (**self).cursor()
    }

    fn sample(&self, f: &mut dyn FnMut(&dyn InputSource)) {
        (**self).sample(f);
    }
}
