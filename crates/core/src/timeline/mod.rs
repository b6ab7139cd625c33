use std::time::{Duration, Instant};

/// Longest step a single tick may cover, in seconds.
pub const MAX_TICK_SECONDS: f32 = 1.0;

/// Brings an arbitrary frame delta into `[0, MAX_TICK_SECONDS]`. NaN counts
/// as no time passing.
pub fn clamp_delta(delta: f32) -> f32 {
    if delta.is_nan() {
        0.0
    } else {
        delta.clamp(0.0, MAX_TICK_SECONDS)
    }
}

/// Fixed-duration countdown advanced by frame deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeTimer {
    duration_seconds: f32,
    elapsed_seconds: f32,
}

impl FadeTimer {
    pub fn new(duration_seconds: f32) -> Self {
        Self {
            duration_seconds: duration_seconds.max(0.0),
            elapsed_seconds: 0.0,
        }
    }

    /// Advances the timer and reports whether it has run out.
    pub fn advance(&mut self, delta: f32) -> bool {
        self.elapsed_seconds = (self.elapsed_seconds + delta.max(0.0)).min(self.duration_seconds);
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_seconds >= self.duration_seconds
    }

    /// Completion in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration_seconds <= f32::EPSILON {
            1.0
        } else {
            self.elapsed_seconds / self.duration_seconds
        }
    }
}

/// Measures wall-clock time between frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    time_seconds: f32,
}

impl FrameClock {
    pub fn start() -> Self {
        Self {
            last: Instant::now(),
            time_seconds: 0.0,
        }
    }

    /// Seconds since the previous call, clamped so a stalled frame does not
    /// skip a whole fade.
    pub fn delta(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).min(Duration::from_millis(250));
        self.last = now;
        self.time_seconds += delta.as_secs_f32();
        delta.as_secs_f32()
    }

    pub fn time_seconds(&self) -> f32 {
        self.time_seconds
    }
}
