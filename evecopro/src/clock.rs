//! Time source for the few operations that need to measure elapsed time.

/// A monotonic millisecond clock.
///
/// The core library has no timer of its own, so the application supplies
/// one. Any `FnMut() -> u64` closure is a clock, which makes it easy to
/// adapt whatever timer the platform provides:
///
/// ```
/// # use evecopro::clock::Clock;
/// let mut ticks = 0;
/// let mut clock = move || { ticks += 5; ticks };
/// assert_eq!(clock.now_ms(), 5);
/// ```
pub trait Clock {
    fn now_ms(&mut self) -> u64;
}

impl<F: FnMut() -> u64> Clock for F {
    fn now_ms(&mut self) -> u64 {
        self()
    }
}
