//! Collision edge detection for registered entity pairs
//!
//! The application registers interest in specific pairs, separately for
//! collision start and collision end. Each tick the detector tests every
//! registered pair's current bounds for a non-empty overlap and reports only
//! the transitions:
//! - start: overlapping now, not overlapping last tick
//! - end: overlapped last tick, not overlapping now
//!
//! A pair cannot start and end in the same tick, since a single evaluation
//! yields one overlap answer per pair.

use std::collections::{BTreeMap, BTreeSet};

use super::rect::{CollidableLookup, Rect};

/// Unordered pair of entity keys
///
/// Stored in canonical (sorted) order, so `PairKey::new(a, b)` and
/// `PairKey::new(b, a)` compare and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey<K> {
    low: K,
    high: K,
}

impl<K: Ord> PairKey<K> {
    pub fn new(a: K, b: K) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> &K {
        &self.low
    }

    pub fn high(&self) -> &K {
        &self.high
    }

    pub fn contains(&self, key: &K) -> bool {
        self.low == *key || self.high == *key
    }

    /// The partner of `key` in this pair
    pub fn other(&self, key: &K) -> Option<&K> {
        if self.low == *key {
            Some(&self.high)
        } else if self.high == *key {
            Some(&self.low)
        } else {
            None
        }
    }
}

/// Which edge a collision event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    Start,
    End,
}

/// One collision edge produced by [`CollisionEdgeDetector::update`]
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent<K, P> {
    /// Entities in the order they were registered
    pub first: K,
    pub second: K,
    /// Current overlap for a start; last known overlap for an end
    pub overlap: Rect,
    /// Registration payload, returned verbatim
    pub payload: P,
    pub kind: CollisionKind,
}

impl<K: PartialEq, P> CollisionEvent<K, P> {
    #[inline]
    pub fn is_start(&self) -> bool {
        self.kind == CollisionKind::Start
    }

    pub fn involves(&self, key: &K) -> bool {
        self.first == *key || self.second == *key
    }
}

#[derive(Debug, Clone)]
struct Registration<K, P> {
    first: K,
    second: K,
    payload: P,
}

/// Per-tick collision start/end detector over registered pairs
///
/// Holds only entity keys, never the entities: bounds come from the
/// [`CollidableLookup`] passed to [`update`](Self::update). Not thread-safe;
/// drive it from the update action.
#[derive(Debug, Clone)]
pub struct CollisionEdgeDetector<K, P> {
    starts: BTreeMap<PairKey<K>, Registration<K, P>>,
    ends: BTreeMap<PairKey<K>, Registration<K, P>>,
    /// Pairs overlapping as of the last update, with their overlap
    active: BTreeMap<PairKey<K>, Rect>,
    events: Vec<CollisionEvent<K, P>>,
}

impl<K, P> Default for CollisionEdgeDetector<K, P> {
    fn default() -> Self {
        Self {
            starts: BTreeMap::new(),
            ends: BTreeMap::new(),
            active: BTreeMap::new(),
            events: Vec::new(),
        }
    }
}

impl<K: Ord + Clone, P: Clone> CollisionEdgeDetector<K, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `payload` when `a` and `b` start overlapping
    ///
    /// Returns the payload this replaces, if the pair was already registered
    /// for start.
    pub fn register_start(&mut self, a: K, b: K, payload: P) -> Option<P> {
        Self::register(&mut self.starts, a, b, payload)
    }

    /// Emit `payload` when `a` and `b` stop overlapping
    pub fn register_end(&mut self, a: K, b: K, payload: P) -> Option<P> {
        Self::register(&mut self.ends, a, b, payload)
    }

    /// Returns the removed payload; unknown pairs are a no-op
    pub fn unregister_start(&mut self, a: K, b: K) -> Option<P> {
        let key = PairKey::new(a, b);
        let removed = self.starts.remove(&key)?;
        self.forget_if_unregistered(&key);
        Some(removed.payload)
    }

    pub fn unregister_end(&mut self, a: K, b: K) -> Option<P> {
        let key = PairKey::new(a, b);
        let removed = self.ends.remove(&key)?;
        self.forget_if_unregistered(&key);
        Some(removed.payload)
    }

    fn register(
        table: &mut BTreeMap<PairKey<K>, Registration<K, P>>,
        a: K,
        b: K,
        payload: P,
    ) -> Option<P> {
        let key = PairKey::new(a.clone(), b.clone());
        let registration = Registration {
            first: a,
            second: b,
            payload,
        };
        table.insert(key, registration).map(|old| old.payload)
    }

    fn forget_if_unregistered(&mut self, key: &PairKey<K>) {
        if !self.starts.contains_key(key) && !self.ends.contains_key(key) {
            self.active.remove(key);
        }
    }

    /// Re-evaluate every registered pair and replace the event list
    ///
    /// Call once per tick, after game logic has moved the entities. Pairs
    /// whose entities the lookup no longer knows count as not overlapping.
    pub fn update<L>(&mut self, world: &L)
    where
        L: CollidableLookup<K> + ?Sized,
    {
        let pairs: BTreeSet<&PairKey<K>> = self.starts.keys().chain(self.ends.keys()).collect();
        let mut active = BTreeMap::new();
        let mut events = Vec::new();

        for pair in pairs {
            let overlap = match (world.bounds_of(pair.low()), world.bounds_of(pair.high())) {
                (Some(a), Some(b)) => a.intersection(&b),
                _ => None,
            };
            let previous = self.active.get(pair);

            match (overlap, previous) {
                (Some(now), None) => {
                    if let Some(reg) = self.starts.get(pair) {
                        events.push(Self::event(reg, now, CollisionKind::Start));
                    }
                }
                (None, Some(last)) => {
                    if let Some(reg) = self.ends.get(pair) {
                        events.push(Self::event(reg, *last, CollisionKind::End));
                    }
                }
                _ => {}
            }

            if let Some(now) = overlap {
                active.insert(pair.clone(), now);
            }
        }

        for event in &events {
            log::trace!("Collision {:?} between registered pair", event.kind);
        }

        self.active = active;
        self.events = events;
    }

    fn event(reg: &Registration<K, P>, overlap: Rect, kind: CollisionKind) -> CollisionEvent<K, P> {
        CollisionEvent {
            first: reg.first.clone(),
            second: reg.second.clone(),
            overlap,
            payload: reg.payload.clone(),
            kind,
        }
    }

    /// Events from the most recent `update` only
    pub fn events(&self) -> &[CollisionEvent<K, P>] {
        &self.events
    }

    /// Did `a` and `b` overlap at the last update? Only tracked for
    /// registered pairs.
    pub fn is_colliding(&self, a: K, b: K) -> bool {
        self.active.contains_key(&PairKey::new(a, b))
    }

    /// Overlap of `a` and `b` at the last update
    pub fn overlap(&self, a: K, b: K) -> Option<Rect> {
        self.active.get(&PairKey::new(a, b)).copied()
    }

    pub fn is_registered(&self, a: K, b: K) -> bool {
        let key = PairKey::new(a, b);
        self.starts.contains_key(&key) || self.ends.contains_key(&key)
    }

    /// Distinct pairs registered for start, end, or both
    pub fn registered_pairs(&self) -> usize {
        self.starts.len() + self.ends.keys().filter(|key| !self.starts.contains_key(*key)).count()
    }

    /// Drop every registration, all overlap history and pending events
    pub fn clear(&mut self) {
        self.starts.clear();
        self.ends.clear();
        self.active.clear();
        self.events.clear();
    }
}
