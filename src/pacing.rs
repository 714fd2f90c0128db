use std::thread;
use std::time::Duration;

/// NCBI allows three E-utilities requests per second without an API key.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(340);

/// Pause policy applied between consecutive remote requests.
pub trait Pacer {
    fn pause(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_DELAY)
    }
}

impl Pacer for FixedInterval {
    fn pause(&self) {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn pause(&self) {}
}

impl<P: Pacer + ?Sized> Pacer for &P {
    fn pause(&self) {
        (**self).pause()
    }
}
