pub use embassy_time::*;

/// Milliseconds since boot.
pub fn now_millis() -> u64 {
    Instant::now().as_millis()
}
