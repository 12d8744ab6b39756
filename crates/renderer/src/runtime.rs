use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Abstraction over where the `time` uniform comes from.
pub trait TimeSource {
    /// Seconds elapsed since the engine mounted.
    fn seconds(&self) -> f32;
}

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Starts counting from `Instant::now()`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn seconds(&self) -> f32 {
        self.origin.elapsed().as_secs_f32()
    }
}

/// Cancellation flag for the frame chain.
///
/// Cloned handles observe the same flag; cancelling is synchronous and final.
#[derive(Debug, Clone, Default)]
pub struct LoopToken {
    cancelled: Arc<AtomicBool>,
}

impl LoopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Trailing-edge debounce: fires once after `delay` without new triggers.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restarts the quiet period from `now`.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once when the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}

/// Rolling frame counter, logged at debug level every few seconds.
#[derive(Debug)]
pub(crate) struct FrameStats {
    window_start: Instant,
    frames: u32,
    interval: Duration,
}

impl FrameStats {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            interval: Duration::from_secs(5),
        }
    }

    /// Counts a frame; returns the average fps when an interval closes.
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }
}
