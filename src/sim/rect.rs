//! Axis-aligned rectangles and the collidable capability
//!
//! A rectangle spans `min..max` on both axes. Overlap is strict: rectangles
//! that only share an edge or a corner have a zero-area intersection and do
//! not collide.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle spanning two corners, in any order
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Rectangle from its top-left position and size
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos, pos + size)
    }

    pub fn from_center_half_extents(center: Vec2, half: Vec2) -> Self {
        Self::new(center - half, center + half)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn area(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.width() * self.height()
        }
    }

    /// True for zero or negative extent on either axis (and for NaN)
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Overlap region, or `None` if it has no area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let overlap = Rect {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        };
        (!overlap.is_empty()).then_some(overlap)
    }

    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Half-open containment: `min` inclusive, `max` exclusive
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

/// Anything with a current bounding rectangle
pub trait Collidable {
    fn bounds(&self) -> Rect;
}

impl Collidable for Rect {
    #[inline]
    fn bounds(&self) -> Rect {
        *self
    }
}

impl<T: Collidable + ?Sized> Collidable for &T {
    #[inline]
    fn bounds(&self) -> Rect {
        (**self).bounds()
    }
}

/// Resolves entity keys to their current bounds
///
/// The collision detector only holds keys; whoever owns the entities answers
/// here. `None` means the entity is gone and cannot collide.
pub trait CollidableLookup<K> {
    fn bounds_of(&self, key: &K) -> Option<Rect>;
}

impl<K, V, S> CollidableLookup<K> for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Collidable,
    S: BuildHasher,
{
    fn bounds_of(&self, key: &K) -> Option<Rect> {
        self.get(key).map(Collidable::bounds)
    }
}

impl<K: Ord, V: Collidable> CollidableLookup<K> for BTreeMap<K, V> {
    fn bounds_of(&self, key: &K) -> Option<Rect> {
        self.get(key).map(Collidable::bounds)
    }
}

impl<V: Collidable> CollidableLookup<usize> for [V] {
    fn bounds_of(&self, key: &usize) -> Option<Rect> {
        self.get(*key).map(Collidable::bounds)
    }
}

impl<V: Collidable> CollidableLookup<usize> for Vec<V> {
    fn bounds_of(&self, key: &usize) -> Option<Rect> {
        self.as_slice().bounds_of(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_pos_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_overlap_region() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, 6.0, 10.0, 10.0);

        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap, rect(5.0, 6.0, 5.0, 4.0));
        assert_eq!(overlap.area(), 20.0);
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let right = rect(10.0, 0.0, 10.0, 10.0);
        let corner = rect(10.0, 10.0, 5.0, 5.0);

        assert!(!a.intersects(&right));
        assert!(!a.intersects(&corner));
    }

    #[test]
    fn test_degenerate_rect_never_collides() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let line = rect(2.0, 2.0, 0.0, 5.0);
        assert!(line.is_empty());
        assert!(!a.intersects(&line));
        assert_eq!(line.area(), 0.0);
    }

    #[test]
    fn test_new_orders_corners() {
        let r = Rect::new(Vec2::new(5.0, 1.0), Vec2::new(1.0, 5.0));
        assert_eq!(r.min, Vec2::new(1.0, 1.0));
        assert_eq!(r.max, Vec2::new(5.0, 5.0));
        assert_eq!(r.center(), Vec2::new(3.0, 3.0));
        assert!(r.contains_point(Vec2::new(1.0, 1.0)));
        assert!(!r.contains_point(Vec2::new(5.0, 3.0)));
    }

    #[test]
    fn test_lookups() {
        let mut map = HashMap::new();
        map.insert("a", rect(0.0, 0.0, 1.0, 1.0));
        assert_eq!(map.bounds_of(&"a"), Some(rect(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(map.bounds_of(&"b"), None);

        let list = vec![rect(0.0, 0.0, 2.0, 2.0)];
        assert!(list.bounds_of(&0).is_some());
        assert!(list.bounds_of(&1).is_none());
    }

    proptest! {
        #[test]
        fn prop_intersection_symmetric(
            ax in -50.0f32..50.0, ay in -50.0f32..50.0, aw in 0.0f32..30.0, ah in 0.0f32..30.0,
            bx in -50.0f32..50.0, by in -50.0f32..50.0, bw in 0.0f32..30.0, bh in 0.0f32..30.0,
        ) {
            let a = rect(ax, ay, aw, ah);
            let b = rect(bx, by, bw, bh);
            prop_assert_eq!(a.intersection(&b), b.intersection(&a));
            if let Some(overlap) = a.intersection(&b) {
                prop_assert!(overlap.area() > 0.0);
                prop_assert!(overlap.area() <= a.area() + 1e-3);
            }
        }
    }
}
