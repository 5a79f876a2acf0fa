//! Per-tick driver
//!
//! An [`Application`] runs the fixed sequence for one tick:
//! poll raw input -> key edges -> game logic -> collision edges -> collision
//! callbacks. Rendering is a separate call so the clock can skip it during
//! catch-up.

use std::sync::Arc;

use parking_lot::Mutex;

use super::collision::{CollisionEdgeDetector, CollisionEvent};
use super::input::InputState;
use super::rect::{CollidableLookup, Rect};
use crate::clock::Clock;
use crate::error::Result;
use crate::platform::InputSource;
use crate::settings::Settings;

/// Application logic driven once per tick
pub trait Controller {
    /// Key identifying a collidable entity
    type Entity: Ord + Clone;
    /// Opaque data attached to collision registrations
    type Payload: Clone;

    /// Current bounds of `entity`, or `None` if it no longer exists
    fn bounds(&self, entity: &Self::Entity) -> Option<Rect>;

    /// Game logic for tick number `tick` (0-based)
    ///
    /// May register or unregister collision pairs; they take effect in this
    /// tick's collision pass.
    fn update(
        &mut self,
        tick: u64,
        input: &InputState,
        collisions: &mut CollisionEdgeDetector<Self::Entity, Self::Payload>,
    );

    /// Collision edges produced by this tick's collision pass
    fn on_collisions(&mut self, _events: &[CollisionEvent<Self::Entity, Self::Payload>]) {}

    /// Present the current state
    fn render(&mut self) {}
}

/// Adapts a controller's `bounds` to the detector's lookup
struct ControllerWorld<'a, C>(&'a C);

impl<C: Controller> CollidableLookup<C::Entity> for ControllerWorld<'_, C> {
    fn bounds_of(&self, key: &C::Entity) -> Option<Rect> {
        self.0.bounds(key)
    }
}

/// A controller together with its input and collision detectors
pub struct Application<C: Controller, S> {
    controller: C,
    source: S,
    input: InputState,
    collisions: CollisionEdgeDetector<C::Entity, C::Payload>,
    ticks: u64,
}

impl<C: Controller, S: InputSource> Application<C, S> {
    pub fn new(controller: C, source: S, settings: &Settings) -> Self {
        Self {
            controller,
            source,
            input: InputState::from_settings(settings),
            collisions: CollisionEdgeDetector::new(),
            ticks: 0,
        }
    }

    /// Advance the simulation by one tick
    pub fn tick(&mut self) {
        self.input.poll(&self.source);
        self.controller
            .update(self.ticks, &self.input, &mut self.collisions);
        self.collisions.update(&ControllerWorld(&self.controller));
        self.controller.on_collisions(self.collisions.events());
        self.ticks += 1;
    }

    pub fn render(&mut self) {
        self.controller.render();
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn collisions(&self) -> &CollisionEdgeDetector<C::Entity, C::Payload> {
        &self.collisions
    }

    /// Scene reset: drop every collision registration and clear held input
    pub fn reset_scene(&mut self) {
        self.collisions.clear();
        self.input.reset_all();
    }
}

impl<C, S> Application<C, S>
where
    C: Controller + Send + 'static,
    C::Entity: Send,
    C::Payload: Send,
    S: InputSource + Send + 'static,
{
    /// Configure `clock` to tick and render this application
    ///
    /// Uses the clock's current target frequency. The returned handle is the
    /// same one the drive thread locks each tick; hold the lock briefly.
    pub fn attach(self, clock: &Clock) -> Result<Arc<Mutex<Self>>> {
        let app = Arc::new(Mutex::new(self));
        let update = Arc::clone(&app);
        let render = Arc::clone(&app);
        clock.configure(
            move || update.lock().tick(),
            move || render.lock().render(),
            clock.target_frequency(),
        )?;
        Ok(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::InputSnapshot;
    use crate::sim::collision::CollisionKind;
    use glam::Vec2;
    use std::time::{Duration, Instant};

    const SPACE: usize = 32;

    /// Box 0 slides right one unit per tick across a static box 1
    #[derive(Default)]
    struct Slider {
        x: f32,
        paused: bool,
        registered: bool,
        log: Vec<(u64, CollisionKind)>,
        last_tick: u64,
        frames: u32,
    }

    impl Controller for Slider {
        type Entity = u32;
        type Payload = ();

        fn bounds(&self, entity: &u32) -> Option<Rect> {
            match *entity {
                0 => Some(Rect::from_pos_size(Vec2::new(self.x, 0.0), Vec2::splat(2.0))),
                1 => Some(Rect::from_pos_size(Vec2::new(5.0, 0.0), Vec2::splat(2.0))),
                _ => None,
            }
        }

        fn update(
            &mut self,
            tick: u64,
            input: &InputState,
            collisions: &mut CollisionEdgeDetector<u32, ()>,
        ) {
            if !self.registered {
                collisions.register_start(0, 1, ());
                collisions.register_end(1, 0, ());
                self.registered = true;
            }
            if input.is_key_just_pressed(SPACE) {
                self.paused = !self.paused;
            }
            if !self.paused {
                self.x += 1.0;
            }
            self.last_tick = tick;
        }

        fn on_collisions(&mut self, events: &[CollisionEvent<u32, ()>]) {
            for event in events {
                self.log.push((self.last_tick, event.kind));
            }
        }

        fn render(&mut self) {
            self.frames += 1;
        }
    }

    #[test]
    fn test_tick_sequence() {
        let mut app = Application::new(Slider::default(), InputSnapshot::new(), &Settings::default());

        for _ in 0..10 {
            app.tick();
        }
        // x after tick n is n + 1; box 1 spans [5, 7), so overlap needs
        // 3 < x < 7, i.e. ticks 3..=5
        assert_eq!(
            app.controller().log,
            vec![(3, CollisionKind::Start), (6, CollisionKind::End)]
        );
        assert_eq!(app.ticks(), 10);
    }

    #[test]
    fn test_key_edge_reaches_controller() {
        let source = Arc::new(Mutex::new(InputSnapshot::new()));
        let mut app = Application::new(Slider::default(), source.clone(), &Settings::default());

        app.tick();
        source.lock().press_key(SPACE);
        app.tick();
        assert!(app.controller().paused);

        // Held: no second toggle
        app.tick();
        app.tick();
        assert!(app.controller().paused);
        assert_eq!(app.controller().x, 1.0);
        assert!(app.input().is_key_down(SPACE));
    }

    #[test]
    fn test_reset_scene_clears_registrations() {
        let mut app = Application::new(Slider::default(), InputSnapshot::new(), &Settings::default());
        app.tick();
        assert_eq!(app.collisions().registered_pairs(), 1);

        app.reset_scene();
        assert_eq!(app.collisions().registered_pairs(), 0);
        app.controller_mut().registered = true;
        for _ in 0..10 {
            app.tick();
        }
        assert!(app.controller().log.is_empty());
    }

    #[test]
    fn test_attach_to_clock() {
        let clock = Clock::with_settings(
            Settings::default().with_frequency(1000),
            Arc::new(crate::platform::SystemTime::new()),
        )
        .unwrap();
        let app = Application::new(Slider::default(), InputSnapshot::new(), &Settings::default())
            .attach(&clock)
            .unwrap();

        clock.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.lock().ticks() < 10 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        clock.stop().unwrap();

        let app = app.lock();
        assert_eq!(app.ticks(), clock.current_ticks());
        assert!(app.controller().frames >= 1);
        assert_eq!(app.controller().log[0], (3, CollisionKind::Start));
    }
}
