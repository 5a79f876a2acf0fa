//! Per-key edge detection
//!
//! Turns a level-triggered "is this key active now?" sample into
//! pressed-once / held / released transitions with one tick of history.

use std::marker::PhantomData;

use crate::error::{Error, Result};

/// Per-key state after the most recent update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyState {
    /// Not active
    #[default]
    Idle,
    /// Became active this tick
    JustActive,
    /// Active this tick and the previous one
    HeldActive,
}

impl KeyState {
    /// Transition given whether the key is active this tick
    #[inline]
    pub fn next(self, active: bool) -> Self {
        match (self, active) {
            (_, false) => KeyState::Idle,
            (KeyState::Idle, true) => KeyState::JustActive,
            (KeyState::JustActive | KeyState::HeldActive, true) => KeyState::HeldActive,
        }
    }

    #[inline]
    pub fn is_active(self) -> bool {
        !matches!(self, KeyState::Idle)
    }
}

/// Dense key identifier space `0..count`
pub trait KeyIndex: Copy {
    /// Largest index the type can represent
    const MAX: usize;

    fn to_index(self) -> usize;
    fn from_index(index: usize) -> Self;
}

macro_rules! impl_key_index {
    ($($ty:ty),*) => {
        $(
            impl KeyIndex for $ty {
                const MAX: usize = <$ty>::MAX as usize;

                #[inline(always)]
                fn to_index(self) -> usize {
                    self as usize
                }

                #[inline(always)]
                fn from_index(index: usize) -> Self {
                    debug_assert!(index <= <$ty>::MAX as usize);
                    index as $ty
                }
            }
        )*
    };
}

impl_key_index!(u8, u16, u32, usize);

/// Edge detector over a fixed range of keys
///
/// Call [`update`](Self::update) exactly once per tick. Calling it twice in
/// one tick turns every `JustActive` key into `HeldActive`; that is not
/// guarded against.
///
/// Not thread-safe; meant to be owned by whatever runs the update action.
#[derive(Debug, Clone)]
pub struct EdgeDetector<K = usize> {
    states: Vec<KeyState>,
    _key: PhantomData<fn(K) -> K>,
}

impl<K: KeyIndex> EdgeDetector<K> {
    /// Track keys `0..count`
    ///
    /// Fails with `InvalidArgument` when `K` cannot name every key in range.
    pub fn new(count: usize) -> Result<Self> {
        if count > 0 && count - 1 > K::MAX {
            return Err(Error::InvalidArgument(format!(
                "{} keys exceed the key type's range 0..={}",
                count,
                K::MAX
            )));
        }
        Ok(Self::with_len(count))
    }

    fn with_len(count: usize) -> Self {
        Self {
            states: vec![KeyState::Idle; count],
            _key: PhantomData,
        }
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Advance every tracked key by one tick
    pub fn update(&mut self, mut is_active_now: impl FnMut(K) -> bool) {
        for (idx, state) in self.states.iter_mut().enumerate() {
            *state = state.next(is_active_now(K::from_index(idx)));
        }
    }

    /// State of `key`; untracked keys are always `Idle`
    #[inline]
    pub fn state(&self, key: K) -> KeyState {
        self.states
            .get(key.to_index())
            .copied()
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_just_active(&self, key: K) -> bool {
        self.state(key) == KeyState::JustActive
    }

    /// Just became active or held
    #[inline]
    pub fn is_active(&self, key: K) -> bool {
        self.state(key).is_active()
    }

    /// Force `key` back to `Idle`; a key still held re-triggers as
    /// `JustActive` on the next update
    pub fn reset(&mut self, key: K) {
        if let Some(state) = self.states.get_mut(key.to_index()) {
            *state = KeyState::Idle;
        }
    }

    pub fn reset_all(&mut self) {
        self.states.fill(KeyState::Idle);
    }

    /// Keys that became active this tick, in index order
    pub fn just_active(&self) -> impl Iterator<Item = K> + '_ {
        self.keys_where(|state| state == KeyState::JustActive)
    }

    /// Keys active this tick, in index order
    pub fn active(&self) -> impl Iterator<Item = K> + '_ {
        self.keys_where(KeyState::is_active)
    }

    fn keys_where<'a>(
        &'a self,
        pred: impl Fn(KeyState) -> bool + 'a,
    ) -> impl Iterator<Item = K> + 'a {
        self.states
            .iter()
            .enumerate()
            .filter(move |(_, state)| pred(**state))
            .map(|(idx, _)| K::from_index(idx))
    }
}

impl EdgeDetector<usize> {
    /// Track keys `0..count`; `usize` keys cover any count
    pub fn dense(count: usize) -> Self {
        Self::with_len(count)
    }
}
