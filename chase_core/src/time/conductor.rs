use std::cell::Cell;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use atomic_float::AtomicF64;

/// Source of the current playback position in milliseconds.
///
/// Implementations must never go backwards.
pub trait PlaybackClock {
    fn position_ms(&self) -> f64;
}

/// Audio-driven clock: the audio thread publishes its position, the frame
/// loop extrapolates between publications with the system clock.
pub struct Conductor {
    audio_position_ms: Arc<AtomicF64>,
    last_audio_ms: f64,
    last_update_ms: f64,
    system_ms: f64,
    last_reported_ms: Cell<f64>,
}

impl Conductor {
    pub fn new(audio_position_ms: Arc<AtomicF64>) -> Self {
        Self {
            audio_position_ms,
            last_audio_ms: 0.0,
            last_update_ms: 0.0,
            system_ms: 0.0,
            last_reported_ms: Cell::new(f64::NEG_INFINITY),
        }
    }

    /// Re-anchor on the audio position. Call once per frame.
    pub fn update(&mut self, system_ms: f64) {
        self.last_audio_ms = self.audio_position_ms.load(Ordering::Acquire);
        self.last_update_ms = system_ms;
        self.system_ms = system_ms;
    }

    /// Advance the system time used for extrapolation without re-reading audio.
    pub fn tick(&mut self, system_ms: f64) {
        self.system_ms = system_ms;
    }

    /// Extrapolated position; may step back when the audio thread lags.
    pub fn raw_position_at(&self, system_ms: f64) -> f64 {
        self.last_audio_ms + (system_ms - self.last_update_ms)
    }
}

impl PlaybackClock for Conductor {
    fn position_ms(&self) -> f64 {
        let pos = self
            .raw_position_at(self.system_ms)
            .max(self.last_reported_ms.get());
        self.last_reported_ms.set(pos);
        pos
    }
}

/// Externally driven clock for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    position_ms: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            position_ms: Cell::new(start_ms),
        }
    }

    /// Moves to `ms`; earlier positions are ignored.
    pub fn advance_to(&self, ms: f64) {
        if ms > self.position_ms.get() {
            self.position_ms.set(ms);
        }
    }
}

impl PlaybackClock for ManualClock {
    fn position_ms(&self) -> f64 {
        self.position_ms.get()
    }
}
