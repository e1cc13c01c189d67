//! Monotonic time source

/// Monotonic millisecond clock
///
/// Used to timestamp decoded records on receipt. Must never go backwards;
/// the epoch is arbitrary (typically boot).
pub trait Clock {
    /// Milliseconds since the clock's epoch
    fn now_ms(&self) -> u64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
