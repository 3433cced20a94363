pub use std::time::{Duration, Instant};

use once_cell::sync::{Lazy, OnceCell};
use util::ClockScale;

pub static BOOT: Lazy<Instant> = Lazy::new(|| Instant::now());

static SCALE: OnceCell<ClockScale> = OnceCell::new();

/// Makes the simulated clock run `speed` times faster than real time. Only the first call has an
/// effect.
pub(crate) fn set_speed(speed: u32) {
    let _ = SCALE.set(ClockScale::new(speed.max(1) as i64, 1));
}

/// Milliseconds of simulated time since boot.
pub fn sim_millis() -> u64 {
    let scale = SCALE.get().copied().unwrap_or(ClockScale::one());
    scale.apply(BOOT.elapsed().as_millis() as i64) as u64
}

pub use smol::Timer;

pub struct Ticker {
    duration: Duration,
    next: Instant,
}

impl Ticker {
    pub fn every(d: Duration) -> Ticker {
        Self {
            duration: d,
            next: Instant::now() + d,
        }
    }

    pub async fn next(&mut self) {
        Timer::at(self.next).await;
        self.next += self.duration;
    }
}
