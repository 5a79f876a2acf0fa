//! Headless demo: boxes drifting around an arena at a fixed tick rate
//!
//! Usage: `tickwise-demo [settings.json]`. Set `RUST_LOG=info` (or `trace`)
//! to watch the clock and the collision edges.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use glam::Vec2;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use tickwise::Clock;
use tickwise::Settings;
use tickwise::platform::{InputSnapshot, SystemTime};
use tickwise::sim::{
    Application, CollisionEdgeDetector, CollisionEvent, Controller, InputState, Rect,
};

const ARENA: Vec2 = Vec2::new(400.0, 300.0);
const BOX_SIZE: Vec2 = Vec2::new(40.0, 40.0);
const BOX_COUNT: usize = 6;
const SEED: u64 = 12345;

/// Space pauses, R reverses every box
const KEY_SPACE: usize = 32;
const KEY_R: usize = 82;

struct Body {
    pos: Vec2,
    vel: Vec2,
}

/// Demo scene: bodies bounce off the arena walls; every pair is watched
struct Scene {
    bodies: Vec<Body>,
    dt: f32,
    paused: bool,
    registered: bool,
    starts: u32,
    ends: u32,
    tick: u64,
}

impl Scene {
    fn new(seed: u64, hz: u32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let bodies = (0..BOX_COUNT)
            .map(|_| Body {
                pos: Vec2::new(
                    rng.random_range(0.0..ARENA.x - BOX_SIZE.x),
                    rng.random_range(0.0..ARENA.y - BOX_SIZE.y),
                ),
                vel: Vec2::new(
                    rng.random_range(-120.0..120.0),
                    rng.random_range(-120.0..120.0),
                ),
            })
            .collect();
        Self {
            bodies,
            dt: 1.0 / hz as f32,
            paused: false,
            registered: false,
            starts: 0,
            ends: 0,
            tick: 0,
        }
    }
}

impl Controller for Scene {
    type Entity = usize;
    type Payload = String;

    fn bounds(&self, entity: &usize) -> Option<Rect> {
        self.bodies
            .get(*entity)
            .map(|body| Rect::from_pos_size(body.pos, BOX_SIZE))
    }

    fn update(
        &mut self,
        tick: u64,
        input: &InputState,
        collisions: &mut CollisionEdgeDetector<usize, String>,
    ) {
        self.tick = tick;

        if !self.registered {
            for a in 0..self.bodies.len() {
                for b in a + 1..self.bodies.len() {
                    collisions.register_start(a, b, format!("box {a} hits box {b}"));
                    collisions.register_end(a, b, format!("box {a} leaves box {b}"));
                }
            }
            self.registered = true;
        }

        if input.is_key_just_pressed(KEY_SPACE) {
            self.paused = !self.paused;
            log::info!("[tick {}] paused: {}", tick, self.paused);
        }
        if input.is_key_just_pressed(KEY_R) {
            for body in &mut self.bodies {
                body.vel = -body.vel;
            }
            log::info!("[tick {}] reversed", tick);
        }
        if self.paused {
            return;
        }

        let max = ARENA - BOX_SIZE;
        for body in &mut self.bodies {
            body.pos += body.vel * self.dt;
            if body.pos.x < 0.0 || body.pos.x > max.x {
                body.vel.x = -body.vel.x;
            }
            if body.pos.y < 0.0 || body.pos.y > max.y {
                body.vel.y = -body.vel.y;
            }
            body.pos = body.pos.clamp(Vec2::ZERO, max);
        }
    }

    fn on_collisions(&mut self, events: &[CollisionEvent<usize, String>]) {
        for event in events {
            if event.is_start() {
                self.starts += 1;
            } else {
                self.ends += 1;
            }
            log::info!(
                "[tick {}] {} (overlap {:.0}x{:.0})",
                self.tick,
                event.payload,
                event.overlap.width(),
                event.overlap.height()
            );
        }
    }
}

/// Twice `hz`, clamped for very high configured rates
fn boosted_frequency(hz: u32) -> u32 {
    hz.saturating_mul(2)
}

fn run() -> tickwise::Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).map_err(|err| {
                tickwise::Error::InvalidArgument(format!("cannot read {path}: {err}"))
            })?;
            Settings::from_json(&json)?
        }
        None => Settings::default(),
    };

    let clock = Clock::with_settings(settings.clone(), Arc::new(SystemTime::new()))?;
    clock.on_frequency_change(|old, new| log::info!("Frequency changed: {old} -> {new} Hz"));

    let source = Arc::new(Mutex::new(InputSnapshot::new()));
    let scene = Scene::new(SEED, settings.target_frequency_hz);
    let app = Application::new(scene, Arc::clone(&source), &settings).attach(&clock)?;

    clock.start()?;

    // Scripted input from the "window" thread: (wait ms, key, held)
    let script = [
        (500, KEY_SPACE, true),
        (100, KEY_SPACE, false),
        (300, KEY_SPACE, true),
        (100, KEY_SPACE, false),
        (200, KEY_R, true),
        (100, KEY_R, false),
    ];
    for (wait_ms, key, held) in script {
        thread::sleep(Duration::from_millis(wait_ms));
        let mut input = source.lock();
        if held {
            input.press_key(key);
        } else {
            input.release_key(key);
        }
    }

    // Bodies move a fixed step per tick, so this also doubles sim speed
    clock.set_frequency(boosted_frequency(settings.target_frequency_hz))?;
    thread::sleep(Duration::from_millis(1200));

    let update_rate = clock.measured_update_rate();
    let render_rate = clock.measured_render_rate();
    clock.stop()?;

    let app = app.lock();
    let scene = app.controller();
    log::info!(
        "Ran {} ticks: {} updates/s, {} renders/s, {} collision starts, {} ends",
        clock.current_ticks(),
        update_rate,
        render_rate,
        scene.starts,
        scene.ends
    );
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Tickwise demo starting...");

    if let Err(err) = run() {
        log::error!("Demo failed: {}", err);
        std::process::exit(1);
    }
}
