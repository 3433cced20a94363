#![cfg_attr(not(test), no_std)]

/// Closed interval between two values. `start` may be greater than `end`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Range {
    pub start: f32,
    pub end: f32,
}

impl Range {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn min(&self) -> f32 {
        self.start.min(self.end)
    }

    pub fn max(&self) -> f32 {
        self.start.max(self.end)
    }

    pub fn span(&self) -> f32 {
        self.end - self.start
    }

    pub fn clamp(&self, val: f32) -> f32 {
        val.max(self.min()).min(self.max())
    }

    /// Whether `val` lies strictly between the bounds.
    pub fn contains_open(&self, val: f32) -> bool {
        self.min() < val && val < self.max()
    }
}

/// Maps values of one range linearly onto another, e.g. a voltage band onto a percentage band.
#[derive(Copy, Clone, Debug)]
pub struct LinearMap {
    input: Range,
    output: Range,
}

impl LinearMap {
    pub const fn new(input: Range, output: Range) -> Self {
        Self { input, output }
    }

    pub fn map(&self, val: f32) -> f32 {
        let span = self.input.span();
        if span == 0.0 {
            return self.output.start;
        }
        self.output.start + (val - self.input.start) * self.output.span() / span
    }

    /// Like `map`, but the input is clamped to the input range first, so the result never leaves
    /// the output range.
    pub fn map_bounded(&self, val: f32) -> f32 {
        self.map(self.input.clamp(val))
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ClockScale {
    pub numerator: i64,
    pub denominator: i64,
}

impl ClockScale {
    pub const fn one() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
    pub const fn new(real_time: i64, clock_time: i64) -> Self {
        Self {
            numerator: real_time,
            denominator: clock_time,
        }
    }

    pub fn apply(&self, time: i64) -> i64 {
        let dt = self.numerator - self.denominator;
        time + time * dt / self.denominator
    }
}

pub struct RingBuffer<const N: usize, T> {
    ring_buffer: [T; N],
    next: usize,
    num_total: usize,
}

impl<const N: usize, T: Default> Default for RingBuffer<N, T> {
    fn default() -> Self {
        Self {
            ring_buffer: core::array::from_fn(|_| Default::default()),
            next: 0,
            num_total: 0,
        }
    }
}
impl<const N: usize, T> RingBuffer<N, T> {
    pub fn add(&mut self, mut v: T) -> T {
        self.num_total += 1;

        core::mem::swap(&mut self.ring_buffer[self.next], &mut v);
        self.next = (self.next + 1) % N;

        v
    }

    pub fn num_valid(&self) -> usize {
        self.num_total.min(N)
    }
    pub fn valid_values(&self) -> &[T] {
        &self.ring_buffer[..self.num_valid()]
    }
}

impl<const N: usize> RingBuffer<N, u16> {
    /// Rounded mean of all valid samples, `None` while empty.
    pub fn mean(&self) -> Option<u16> {
        let vals = self.valid_values();
        if vals.is_empty() {
            return None;
        }
        let sum: u32 = vals.iter().map(|v| *v as u32).sum();
        let n = vals.len() as u32;
        Some(((sum + n / 2) / n) as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn test_linear_map() {
        let m = LinearMap::new(Range::new(12.2, 12.6), Range::new(0.0, 10.0));
        assert_close(m.map(12.2), 0.0);
        assert_close(m.map(12.4), 5.0);
        assert_close(m.map(12.6), 10.0);
        // Unbounded extrapolates
        assert_close(m.map(13.0), 20.0);
    }

    #[test]
    fn test_linear_map_bounded() {
        // Falling output: the higher the current, the lower the result
        let m = LinearMap::new(Range::new(2.0, 6.0), Range::new(10.0, 0.0));
        assert_close(m.map_bounded(2.0), 10.0);
        assert_close(m.map_bounded(4.0), 5.0);
        assert_close(m.map_bounded(0.5), 10.0);
        assert_close(m.map_bounded(25.0), 0.0);

        // Falling input
        let m = LinearMap::new(Range::new(6.0, 2.0), Range::new(0.0, 10.0));
        assert_close(m.map_bounded(1.0), 10.0);
        assert_close(m.map_bounded(7.0), 0.0);
    }

    #[test]
    fn test_linear_map_degenerate() {
        let m = LinearMap::new(Range::new(1.0, 1.0), Range::new(3.0, 7.0));
        assert_close(m.map_bounded(1.0), 3.0);
        assert_close(m.map(5.0), 3.0);
    }

    #[test]
    fn test_range() {
        let r = Range::new(9.5, 12.2);
        assert!(r.contains_open(10.0));
        assert!(!r.contains_open(9.5));
        assert!(!r.contains_open(12.2));
        assert_close(r.clamp(20.0), 12.2);
        assert_close(Range::new(5.0, 1.0).clamp(0.0), 1.0);
    }

    #[test]
    fn test_clock_scale() {
        let s = ClockScale::new(10, 1);
        assert_eq!(s.apply(100), 1000);
        assert_eq!(ClockScale::new(1, 10).apply(1000), 100);
        assert_eq!(ClockScale::one().apply(1234), 1234);
    }

    #[test]
    fn test_ring_buffer_mean() {
        let mut b = RingBuffer::<4, u16>::default();
        assert_eq!(b.mean(), None);
        b.add(10);
        b.add(11);
        assert_eq!(b.mean(), Some(11));
        b.add(12);
        b.add(13);
        assert_eq!(b.num_valid(), 4);
        assert_eq!(b.add(100), 10);
        assert_eq!(b.num_valid(), 4);
        assert_eq!(b.mean(), Some(34));
    }
}
