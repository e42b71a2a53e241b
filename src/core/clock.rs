use std::time::Instant;

/// Monotonic playback position source, driven by the audio transport.
/// The engine only reads the position and issues transport commands; it
/// never advances the position itself.
pub trait PlaybackClock {
    fn position_ms(&self) -> f32;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_ms(&mut self, ms: f32);
}

/// Wall-time implementation backed by `Instant`. Stands in for a music
/// stream's playing offset when no audio backend is attached; a real-time
/// frame loop drives sessions with this clock, while headless runs and
/// tests use `ManualClock`. Seeking to a negative offset yields a pre-roll:
/// the position climbs through negative values until the track "really"
/// starts.
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
    base_ms: f32,
    playing: bool,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            base_ms: 0.0,
            playing: false,
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for WallClock {
    fn position_ms(&self) -> f32 {
        if self.playing {
            self.base_ms + self.origin.elapsed().as_secs_f32() * 1000.0
        } else {
            self.base_ms
        }
    }

    fn play(&mut self) {
        if !self.playing {
            self.origin = Instant::now();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if self.playing {
            self.base_ms += self.origin.elapsed().as_secs_f32() * 1000.0;
            self.playing = false;
        }
    }

    fn seek_ms(&mut self, ms: f32) {
        self.base_ms = ms;
        self.origin = Instant::now();
    }
}

/// Hand-stepped clock for headless sessions and tests. Advances only while
/// playing, so a paused transport holds its position exactly.
#[derive(Debug, Default)]
pub struct ManualClock {
    position_ms: f32,
    playing: bool,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&mut self, delta_ms: f32) {
        if self.playing {
            self.position_ms += delta_ms;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl PlaybackClock for ManualClock {
    fn position_ms(&self) -> f32 {
        self.position_ms
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek_ms(&mut self, ms: f32) {
        self.position_ms = ms;
    }
}

/// Named, resettable elapsed-time marker. Runs off whatever `Instant`s the
/// caller passes in, so the mistake grace timer keeps counting while the
/// playback clock is paused, and tests can fabricate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn started_at(now: Instant) -> Self {
        Self { started: now }
    }

    pub fn elapsed_ms(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.started).as_secs_f32() * 1000.0
    }
}
