use std::time::{Duration, Instant};

/// A discrete key-down event tagged with the lane it targets. Key-up and
/// key-repeat events never reach the engine; the windowing layer filters
/// them before queueing.
#[derive(Debug, Clone, Copy)]
pub struct InputEdge {
    pub lane: usize,
    pub timestamp: Instant,
}

/// Per-lane press cooldown. Each lane keeps its own last-accepted timestamp;
/// a press within `cooldown` of the previous accepted press on the same lane
/// is dropped so key-repeat bursts and double-taps judge as one press.
#[derive(Debug)]
pub struct LaneDebounce {
    cooldown: Duration,
    last_accept: Vec<Option<Instant>>,
}

impl LaneDebounce {
    pub fn new(lane_count: usize, cooldown_ms: u64) -> Self {
        Self {
            cooldown: Duration::from_millis(cooldown_ms),
            last_accept: vec![None; lane_count],
        }
    }

    /// Returns true when the press is accepted; acceptance resets the lane's
    /// cooldown timer.
    pub fn accept(&mut self, lane: usize, at: Instant) -> bool {
        let slot = &mut self.last_accept[lane];
        if let Some(last) = *slot {
            if at.saturating_duration_since(last) <= self.cooldown {
                return false;
            }
        }
        *slot = Some(at);
        true
    }
}
