//! Per-tick simulation support
//!
//! Everything here runs on the drive thread inside the update action:
//! - Edge detection over discrete keys (pressed once / held / released)
//! - Collision start/end detection over registered entity pairs
//! - The tick driver tying input, game logic and collisions together
//!
//! None of these types are thread-safe; they are owned by the update action.

pub mod collision;
pub mod edge;
pub mod input;
pub mod rect;
pub mod tick;

pub use collision::{CollisionEdgeDetector, CollisionEvent, CollisionKind, PairKey};
pub use edge::{EdgeDetector, KeyIndex, KeyState};
pub use input::InputState;
pub use rect::{Collidable, CollidableLookup, Rect};
pub use tick::{Application, Controller};
