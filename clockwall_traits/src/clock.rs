use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Clock abstraction for timing and wall-clock reads across the stack.
///
/// - now(): returns a monotonic Instant (used for round-trip measurement and timers)
/// - wall_ms(): milliseconds since the Unix epoch according to the local clock
/// - sleep(): sleeps for the provided duration (implementations may simulate)
pub trait Clock {
    fn now(&self) -> Instant;
    fn wall_ms(&self) -> f64;
    fn sleep(&self, d: Duration);
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }

    #[inline]
    fn wall_ms(&self) -> f64 {
        (**self).wall_ms()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        (**self).sleep(d)
    }
}

/// Real-time clock backed by `std::time::Instant` and `SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_ms(&self) -> f64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs_f64() * 1000.0,
            // Local clock set before 1970
            Err(e) => -(e.duration().as_secs_f64() * 1000.0),
        }
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clock whose time can be advanced manually.
///
/// now() = origin + elapsed, wall_ms() = wall_origin_ms + elapsed.
/// sleep(d) advances both timelines by d without actually sleeping. Clones
/// share the same timeline, so a fake time source can advance the clock the
/// engine under test is reading.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    wall_origin_ms: f64,
    elapsed: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at_wall_ms(0.0)
    }

    /// Start the wall timeline at the given Unix epoch milliseconds.
    pub fn at_wall_ms(wall_origin_ms: f64) -> Self {
        Self {
            origin: Instant::now(),
            wall_origin_ms,
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.elapsed.lock() {
            *off = off.saturating_add(d);
        }
    }

    fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn wall_ms(&self) -> f64 {
        self.wall_origin_ms + self.elapsed().as_secs_f64() * 1000.0
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
