/// Lifecycle of a judgeable tile. Transitions are strictly forward:
/// Pending -> Active -> Hit | Missed. A terminal tile is inert for judgment
/// and survives only for render feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Pending,
    Active,
    Hit,
    Missed,
}

impl TileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TileState::Hit | TileState::Missed)
    }
}

/// A runtime judgment unit derived from one chart note (1:1 for short
/// notes, 1:many for notes split into fixed-length segments). Vertical
/// position is always recomputed from elapsed time, never stored.
#[derive(Debug, Clone)]
pub struct Tile {
    pub lane: usize,
    pub scheduled_ms: f32,
    pub duration_ms: f32,
    pub state: TileState,
}

impl Tile {
    pub fn new(lane: usize, scheduled_ms: f32, duration_ms: f32) -> Self {
        Self {
            lane,
            scheduled_ms,
            duration_ms,
            state: TileState::Pending,
        }
    }

    pub fn activate(&mut self) {
        if self.state == TileState::Pending {
            self.state = TileState::Active;
        }
    }

    pub fn hit(&mut self) {
        if self.state == TileState::Active {
            self.state = TileState::Hit;
        }
    }

    pub fn miss(&mut self) {
        if self.state == TileState::Active {
            self.state = TileState::Missed;
        }
    }
}
