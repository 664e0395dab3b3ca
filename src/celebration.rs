use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

/// Burst time, after which sparks stop being spawned and fade out.
pub const BURST: Duration = Duration::from_millis(2000);
/// Fade time after the burst; the explosion is gone once it has passed.
pub const FADE: Duration = Duration::from_millis(1000);

const SYMBOLS: [char; 6] = ['*', '+', '✦', '✧', '·', '$'];

/// A single spark thrown out of the chest
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl Spark {
    fn new<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        let angle = rng.gen_range(std::f64::consts::PI..std::f64::consts::TAU);
        let speed = rng.gen_range(4.0..12.0);
        Self {
            x,
            y,
            // cells are roughly twice as tall as wide
            vel_x: angle.cos() * speed * 2.0,
            vel_y: angle.sin() * speed,
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(1.0..2.5),
        }
    }

    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += 9.0 * dt;
        self.vel_x *= 0.97;
        self.age += dt;
        self.age < self.max_age
    }

    /// 1.0 when fresh, 0.0 when about to disappear.
    pub fn life(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// Explosion over the opened chest
#[derive(Debug)]
pub struct Explosion {
    pub sparks: Vec<Spark>,
    pub started_at: Option<Instant>,
    origin: (f64, f64),
    bounds: (f64, f64),
}

impl Explosion {
    pub fn new() -> Self {
        Self {
            sparks: Vec::new(),
            started_at: None,
            origin: (0.0, 0.0),
            bounds: (80.0, 24.0),
        }
    }

    /// Starts a burst at `origin` inside a `width` x `height` area.
    pub fn start(&mut self, origin: (u16, u16), width: u16, height: u16, now: Instant) {
        self.sparks.clear();
        self.started_at = Some(now);
        self.origin = (origin.0 as f64, origin.1 as f64);
        self.bounds = (width as f64, height as f64);
        self.spawn(40);
    }

    pub fn stop(&mut self) {
        self.sparks.clear();
        self.started_at = None;
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// In the fade-out part of its life: no new sparks.
    pub fn is_fading(&self, now: Instant) -> bool {
        self.started_at
            .map(|start| now.duration_since(start) >= BURST)
            .unwrap_or(false)
    }

    fn spawn(&mut self, count: usize) {
        let mut rng = rand::thread_rng();
        let (x, y) = self.origin;
        for _ in 0..count {
            self.sparks.push(Spark::new(x, y, &mut rng));
        }
    }

    /// Advances one animation step.
    pub fn update(&mut self, now: Instant, dt: f64) {
        let Some(start) = self.started_at else {
            return;
        };
        let elapsed = now.duration_since(start);
        if elapsed >= BURST + FADE {
            self.stop();
            return;
        }
        if elapsed < BURST {
            self.spawn(6);
        }

        let (width, height) = self.bounds;
        let buffer = 3.0;
        self.sparks.retain_mut(|spark| {
            let alive = spark.update(dt);
            let off_screen = spark.y > height + buffer
                || spark.y < -buffer
                || spark.x < -buffer
                || spark.x > width + buffer;
            alive && !off_screen
        });
    }
}

impl Default for Explosion {
    fn default() -> Self {
        Self::new()
    }
}
