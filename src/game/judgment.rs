/// Result of resolving one lane press (or a boundary sweep) against the
/// active tile set. Mistake is the only fault; MissTimeout and Ignored are
/// ordinary gameplay data, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Hit,
    MissTimeout,
    Mistake,
    Ignored,
}

impl Outcome {
    pub fn is_fault(self) -> bool {
        self == Outcome::Mistake
    }
}

/// Leniency policy for presses that land outside every tile's window.
/// Strict is the canonical rule: any press that credits no tile is a
/// Mistake. Lenient reproduces the forgiving variant: early or unmatched
/// presses are no-ops and a late press silently misses its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgePolicy {
    Strict,
    Lenient,
}

impl JudgePolicy {
    pub fn from_strict_flag(strict_mode: bool) -> Self {
        if strict_mode {
            JudgePolicy::Strict
        } else {
            JudgePolicy::Lenient
        }
    }
}

/// The tolerance-window rule for the nearest candidate tile.
/// `diff_ms = press_time - scheduled_time`; the window is symmetric and
/// boundary-inclusive, so `|diff| == tolerance` is still a Hit.
pub fn window_rule(diff_ms: f32, tolerance_ms: f32, policy: JudgePolicy) -> Outcome {
    if diff_ms.abs() <= tolerance_ms {
        Outcome::Hit
    } else if diff_ms > tolerance_ms {
        // Candidate already slipped past its window.
        match policy {
            JudgePolicy::Strict => Outcome::Mistake,
            JudgePolicy::Lenient => Outcome::MissTimeout,
        }
    } else {
        // Pressed before the window opened.
        match policy {
            JudgePolicy::Strict => Outcome::Mistake,
            JudgePolicy::Lenient => Outcome::Ignored,
        }
    }
}

/// Outcome for a press with no candidate tile at all in that lane.
pub fn no_candidate_outcome(policy: JudgePolicy) -> Outcome {
    match policy {
        JudgePolicy::Strict => Outcome::Mistake,
        JudgePolicy::Lenient => Outcome::Ignored,
    }
}
