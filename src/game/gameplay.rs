use crate::config::Config;
use crate::core::clock::{PlaybackClock, Stopwatch};
use crate::core::input::{InputEdge, LaneDebounce};
use crate::game::chart::{self, ChartError, NoteRecord};
use crate::game::judgment::{self, JudgePolicy, Outcome};
use crate::game::scroll::{self, ScrollPlan};
use crate::game::tile::{Tile, TileState};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::time::Instant;

/// Session phase. Linear: a fault freezes the session, and the freeze can
/// only end in GameOver. No path leads back to Playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    MistakeFreeze(Stopwatch),
    GameOver,
}

/// One gameplay session: the expanded tile sequence, the scheduler cursor,
/// the per-lane active working set, and the mistake state machine. The
/// playback clock is commanded (seek at start, pause on freeze) but its
/// position is only ever read.
pub struct State<C: PlaybackClock> {
    pub clock: C,
    pub config: Config,
    pub tiles: Vec<Tile>,
    pub plan: ScrollPlan,
    pub tolerance_ms: f32,
    pub policy: JudgePolicy,
    pub score: u32,
    pub phase: Phase,
    pub complete: bool,

    pub spawn_cursor: usize,
    /// Per-lane indices into `tiles`, in scheduled order. Terminal tiles
    /// linger here for render feedback until they scroll off the bottom.
    pub active: Vec<Vec<usize>>,
    pub pending_edges: VecDeque<InputEdge>,
    debounce: LaneDebounce,
}

/// Read-only per-tick view for the rendering layer.
#[derive(Debug, Clone)]
pub struct TileView {
    pub lane: usize,
    pub y: f32,
    pub duration_ms: f32,
    pub state: TileState,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tiles: Vec<TileView>,
    pub score: u32,
    pub phase: Phase,
    pub mistake_elapsed_ms: Option<f32>,
}

/// Builds a session from validated notes, calibrates scroll, and starts the
/// playback clock at the derived offset. Any chart problem aborts here; a
/// partially initialized session never exists.
pub fn init<C: PlaybackClock>(
    notes: &[NoteRecord],
    config: Config,
    mut clock: C,
) -> Result<State<C>, ChartError> {
    info!("Initializing gameplay session with {} notes...", notes.len());

    let tiles = chart::expand_notes(notes, config.max_segment_ms);
    let plan = scroll::calibrate(&tiles, config.target_y, config.travel_time_ms)?;
    let tolerance_ms = config
        .tolerance_ms
        .unwrap_or_else(|| scroll::tolerance_ms(config.screen_height, plan.pixels_per_second));
    let policy = JudgePolicy::from_strict_flag(config.strict_mode);

    info!(
        "Session ready: {} tiles, tolerance {:.1}ms, policy {:?}",
        tiles.len(),
        tolerance_ms,
        policy
    );

    clock.seek_ms(plan.start_offset_ms);
    clock.play();

    let lane_count = config.lane_count;
    let debounce = LaneDebounce::new(lane_count, config.cooldown_ms);
    Ok(State {
        clock,
        config,
        tiles,
        plan,
        tolerance_ms,
        policy,
        score: 0,
        phase: Phase::Playing,
        complete: false,
        spawn_cursor: 0,
        active: vec![Vec::new(); lane_count],
        pending_edges: VecDeque::new(),
        debounce,
    })
}

/// Queues a lane press for the next tick. Lanes outside the configured
/// range are dropped here; a stray keybinding must not reach judgment.
pub fn queue_press<C: PlaybackClock>(state: &mut State<C>, lane: usize, timestamp: Instant) {
    if lane >= state.config.lane_count {
        warn!(
            "Ignoring press for lane {} ({} lanes configured)",
            lane, state.config.lane_count
        );
        return;
    }
    state.pending_edges.push_back(InputEdge { lane, timestamp });
}

/// Vertical position of a tile, purely a function of elapsed chart time.
#[inline(always)]
pub fn tile_y(tile: &Tile, music_ms: f32, plan: &ScrollPlan, target_y: f32) -> f32 {
    (music_ms - tile.scheduled_ms) / 1000.0 * plan.pixels_per_second + target_y
}

/// One engine tick. Queued presses are drained and judged in arrival order
/// against the tile set as it stood when the tick began; only then does the
/// scheduler activate new tiles and the boundary sweep run.
pub fn update<C: PlaybackClock>(state: &mut State<C>, now: Instant) {
    match state.phase {
        Phase::GameOver => {
            state.pending_edges.clear();
            return;
        }
        Phase::MistakeFreeze(grace) => {
            state.pending_edges.clear();
            if grace.elapsed_ms(now) >= state.config.grace_ms as f32 {
                info!("Grace period over. Game over. Final score: {}", state.score);
                state.phase = Phase::GameOver;
            }
            return;
        }
        Phase::Playing => {}
    }

    let music_ms = state.clock.position_ms();

    process_pending_edges(state, music_ms, now);
    if !matches!(state.phase, Phase::Playing) {
        return;
    }

    advance_spawn_cursor(state, music_ms);
    sweep_boundary_misses(state, music_ms, now);
    if !matches!(state.phase, Phase::Playing) {
        return;
    }

    cull_offscreen_tiles(state, music_ms);
    check_completion(state);
}

/// Resolves one press against the first judgeable tile in its lane. At most
/// one tile is credited per press.
pub fn judge<C: PlaybackClock>(state: &mut State<C>, lane: usize, at_ms: f32) -> Outcome {
    let candidate = state.active[lane]
        .iter()
        .copied()
        .find(|&idx| state.tiles[idx].state == TileState::Active);

    let Some(idx) = candidate else {
        let outcome = judgment::no_candidate_outcome(state.policy);
        if outcome.is_fault() {
            info!("MISTAKE: Lane {}, no judgeable tile at {:.0}ms", lane, at_ms);
        } else {
            debug!("Press on lane {} matched no tile; ignored", lane);
        }
        return outcome;
    };

    let diff = at_ms - state.tiles[idx].scheduled_ms;
    let outcome = judgment::window_rule(diff, state.tolerance_ms, state.policy);
    match outcome {
        Outcome::Hit => {
            state.tiles[idx].hit();
            state.score += 1;
            info!(
                "HIT: Lane {}, Error: {:+.2}ms, Score: {}",
                lane, diff, state.score
            );
        }
        Outcome::MissTimeout => {
            // The late candidate is consumed without ending the session.
            state.tiles[idx].miss();
            info!("MISS (late press): Lane {}, Error: {:+.2}ms", lane, diff);
        }
        Outcome::Mistake => {
            if diff > state.tolerance_ms {
                state.tiles[idx].miss();
            }
            info!("MISTAKE: Lane {}, Error: {:+.2}ms", lane, diff);
        }
        Outcome::Ignored => {
            debug!("Early press ignored: Lane {}, Error: {:+.2}ms", lane, diff);
        }
    }
    outcome
}

fn process_pending_edges<C: PlaybackClock>(state: &mut State<C>, music_ms: f32, now: Instant) {
    while let Some(edge) = state.pending_edges.pop_front() {
        if !matches!(state.phase, Phase::Playing) {
            state.pending_edges.clear();
            break;
        }
        if !state.debounce.accept(edge.lane, edge.timestamp) {
            debug!("Debounced press on lane {}", edge.lane);
            continue;
        }

        // Judge at the press's own music position, compensating for the
        // latency between the event and this tick.
        let latency_ms = now.saturating_duration_since(edge.timestamp).as_secs_f32() * 1000.0;
        let event_ms = music_ms - latency_ms;
        let outcome = judge(state, edge.lane, event_ms);
        if outcome.is_fault() {
            enter_mistake_freeze(state, now);
        }
    }
}

fn advance_spawn_cursor<C: PlaybackClock>(state: &mut State<C>, music_ms: f32) {
    while state.spawn_cursor < state.tiles.len()
        && state.tiles[state.spawn_cursor].scheduled_ms <= music_ms + state.config.lookahead_ms
    {
        let idx = state.spawn_cursor;
        state.tiles[idx].activate();
        let lane = state.tiles[idx].lane;
        state.active[lane].push(idx);
        state.spawn_cursor += 1;
    }
}

/// Transitions tiles that crossed the bottom edge untriggered to Missed and
/// routes the fault to the state machine. A tile already terminal is
/// skipped, so re-running the sweep at the same position is a no-op.
fn sweep_boundary_misses<C: PlaybackClock>(state: &mut State<C>, music_ms: f32, now: Instant) {
    let mut faulted = false;
    for lane in 0..state.active.len() {
        for k in 0..state.active[lane].len() {
            let idx = state.active[lane][k];
            if state.tiles[idx].state != TileState::Active {
                continue;
            }
            let y = tile_y(&state.tiles[idx], music_ms, &state.plan, state.config.target_y);
            if y > state.config.screen_height {
                state.tiles[idx].miss();
                info!(
                    "MISSED (boundary): Lane {}, scheduled {:.0}ms",
                    lane, state.tiles[idx].scheduled_ms
                );
                faulted = true;
            }
        }
    }
    if faulted {
        enter_mistake_freeze(state, now);
    }
}

fn enter_mistake_freeze<C: PlaybackClock>(state: &mut State<C>, now: Instant) {
    if !matches!(state.phase, Phase::Playing) {
        return;
    }
    state.clock.pause();
    state.phase = Phase::MistakeFreeze(Stopwatch::started_at(now));
    info!(
        "Playback frozen; game over in {}ms.",
        state.config.grace_ms
    );
}

fn cull_offscreen_tiles<C: PlaybackClock>(state: &mut State<C>, music_ms: f32) {
    let tiles = &state.tiles;
    let plan = &state.plan;
    let target_y = state.config.target_y;
    let bottom = state.config.screen_height;
    for lane_list in &mut state.active {
        lane_list.retain(|&idx| {
            let tile = &tiles[idx];
            !(tile.state.is_terminal() && tile_y(tile, music_ms, plan, target_y) > bottom)
        });
    }
}

fn check_completion<C: PlaybackClock>(state: &mut State<C>) {
    if state.complete || state.spawn_cursor < state.tiles.len() {
        return;
    }
    if state.tiles.iter().all(|t| t.state.is_terminal()) {
        state.complete = true;
        info!("Chart complete. Final score: {}", state.score);
    }
}

/// Render-facing view of the session. The rendering layer never mutates
/// engine state; it only consumes this.
pub fn snapshot<C: PlaybackClock>(state: &State<C>, now: Instant) -> Snapshot {
    let music_ms = state.clock.position_ms();
    let mut tiles = Vec::new();
    for lane_list in &state.active {
        for &idx in lane_list {
            let tile = &state.tiles[idx];
            tiles.push(TileView {
                lane: tile.lane,
                y: tile_y(tile, music_ms, &state.plan, state.config.target_y),
                duration_ms: tile.duration_ms,
                state: tile.state,
            });
        }
    }

    let mistake_elapsed_ms = match state.phase {
        Phase::MistakeFreeze(grace) => Some(grace.elapsed_ms(now)),
        _ => None,
    };

    Snapshot {
        tiles,
        score: state.score,
        phase: state.phase,
        mistake_elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::{Phase, State, init, judge, queue_press, snapshot, update};
    use crate::config::Config;
    use crate::core::clock::{ManualClock, PlaybackClock};
    use crate::game::chart::NoteRecord;
    use crate::game::judgment::Outcome;
    use crate::game::tile::TileState;
    use std::time::{Duration, Instant};

    fn note(time: f32, lane: usize, duration: f32) -> NoteRecord {
        NoteRecord {
            time,
            lane,
            duration,
        }
    }

    fn test_config() -> Config {
        Config {
            tolerance_ms: Some(150.0),
            ..Config::default()
        }
    }

    fn start_session(notes: &[NoteRecord], config: Config) -> State<ManualClock> {
        init(notes, config, ManualClock::new()).expect("session should initialize")
    }

    /// Advances the playback clock to `music_ms` and runs one tick.
    fn run_to(state: &mut State<ManualClock>, now: Instant, music_ms: f32) {
        let delta = music_ms - state.clock.position_ms();
        state.clock.advance_ms(delta);
        update(state, now);
    }

    #[test]
    fn press_inside_window_hits_and_scores() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        run_to(&mut state, base, 1000.0);
        assert_eq!(state.tiles[0].state, TileState::Active, "tile spawned by lookahead");

        queue_press(&mut state, 0, base);
        update(&mut state, base);

        assert_eq!(state.score, 1);
        assert_eq!(state.tiles[0].state, TileState::Hit);
        assert!(matches!(state.phase, Phase::Playing));
    }

    #[test]
    fn press_exactly_on_tolerance_boundary_hits() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        run_to(&mut state, base, 1150.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);

        assert_eq!(state.score, 1, "diff == tolerance must still be a Hit");
    }

    #[test]
    fn late_press_is_a_mistake_that_freezes_playback() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        run_to(&mut state, base, 1200.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);

        assert_eq!(state.score, 0);
        assert_eq!(state.tiles[0].state, TileState::Missed);
        assert!(matches!(state.phase, Phase::MistakeFreeze(_)));
        assert!(!state.clock.is_playing(), "freeze must pause the clock");
    }

    #[test]
    fn freeze_times_out_into_game_over_and_stops_accepting_input() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        run_to(&mut state, base, 1200.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);
        assert!(matches!(state.phase, Phase::MistakeFreeze(_)));

        // Grace not yet elapsed.
        update(&mut state, base + Duration::from_millis(1999));
        assert!(matches!(state.phase, Phase::MistakeFreeze(_)));

        update(&mut state, base + Duration::from_millis(2001));
        assert!(matches!(state.phase, Phase::GameOver));

        let later = base + Duration::from_millis(3000);
        queue_press(&mut state, 0, later);
        update(&mut state, later);
        assert_eq!(state.score, 0, "GameOver is terminal; input is dead");
    }

    #[test]
    fn untriggered_tile_past_bottom_auto_misses_exactly_once() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        // Default plan: ~300 px/s, target 550, screen 700. The tile crosses
        // the bottom edge once it is ~500ms past its scheduled time.
        run_to(&mut state, base, 1600.0);
        assert_eq!(state.tiles[0].state, TileState::Missed);
        assert!(matches!(state.phase, Phase::MistakeFreeze(_)));

        // Re-running with no time advance must not double-transition
        // anything or disturb the freeze.
        update(&mut state, base + Duration::from_millis(1));
        assert_eq!(state.tiles[0].state, TileState::Missed);
        assert!(matches!(state.phase, Phase::MistakeFreeze(_)));
    }

    #[test]
    fn double_tap_inside_cooldown_judges_once() {
        let base = Instant::now();
        let mut state = start_session(
            &[note(1000.0, 0, 100.0), note(1120.0, 0, 100.0)],
            test_config(),
        );

        run_to(&mut state, base, 1000.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);
        assert_eq!(state.score, 1);

        // 50ms later: inside the 150ms cooldown, so the press is dropped
        // before it can reach the second tile.
        let tap = base + Duration::from_millis(50);
        queue_press(&mut state, 0, tap);
        update(&mut state, tap);

        assert_eq!(state.score, 1, "debounced press must not be judged");
        assert_eq!(state.tiles[1].state, TileState::Active);
        assert!(matches!(state.phase, Phase::Playing));
    }

    #[test]
    fn one_press_credits_at_most_one_tile() {
        let base = Instant::now();
        let mut state = start_session(
            &[note(1000.0, 0, 100.0), note(1100.0, 0, 100.0)],
            test_config(),
        );

        run_to(&mut state, base, 1050.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);

        assert_eq!(state.score, 1);
        assert_eq!(state.tiles[0].state, TileState::Hit, "earliest tile wins");
        assert_eq!(state.tiles[1].state, TileState::Active);
    }

    #[test]
    fn hit_tile_never_reverts() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        run_to(&mut state, base, 1000.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);
        assert_eq!(state.tiles[0].state, TileState::Hit);

        // A direct re-judgment finds no Active candidate and leaves the
        // terminal state alone.
        let outcome = judge(&mut state, 0, 1000.0);
        assert_eq!(outcome, Outcome::Mistake);
        assert_eq!(state.tiles[0].state, TileState::Hit);
    }

    #[test]
    fn start_offset_and_lookahead_gate_activation() {
        let base = Instant::now();
        let mut state = start_session(&[note(5000.0, 0, 200.0)], test_config());

        // First tile at 5000ms, travel 1833ms: playback starts mid-track.
        assert_eq!(state.plan.start_offset_ms, 5000.0 - 1833.0);
        assert_eq!(state.clock.position_ms(), 5000.0 - 1833.0);

        update(&mut state, base);
        assert_eq!(
            state.tiles[0].state,
            TileState::Pending,
            "5000ms is beyond the 1500ms lookahead from {:.0}ms",
            state.clock.position_ms()
        );

        run_to(&mut state, base, 3600.0);
        assert_eq!(state.tiles[0].state, TileState::Active);
    }

    #[test]
    fn out_of_range_lane_press_is_dropped_without_fault() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        queue_press(&mut state, 9, base);
        assert!(state.pending_edges.is_empty());

        run_to(&mut state, base, 1000.0);
        assert!(matches!(state.phase, Phase::Playing));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn lenient_policy_forgives_unmatched_and_early_presses() {
        let base = Instant::now();
        let config = Config {
            strict_mode: false,
            ..test_config()
        };
        let mut state = start_session(
            &[note(1000.0, 0, 200.0), note(3000.0, 1, 200.0)],
            config,
        );

        run_to(&mut state, base, 1000.0);

        // Lane 1's tile is not spawned yet: no candidate, no fault.
        queue_press(&mut state, 1, base);
        update(&mut state, base);
        assert!(matches!(state.phase, Phase::Playing));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn lenient_late_press_misses_silently() {
        let base = Instant::now();
        let config = Config {
            strict_mode: false,
            ..test_config()
        };
        let mut state = start_session(&[note(1000.0, 0, 200.0)], config);

        run_to(&mut state, base, 1200.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);

        assert_eq!(state.tiles[0].state, TileState::Missed);
        assert!(
            matches!(state.phase, Phase::Playing),
            "lenient late press must not end the session"
        );
    }

    #[test]
    fn session_completes_when_every_tile_is_terminal() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 100.0)], test_config());

        run_to(&mut state, base, 1000.0);
        queue_press(&mut state, 0, base);
        update(&mut state, base);

        assert!(state.complete);
        assert_eq!(state.score, 1);
        assert!(matches!(state.phase, Phase::Playing));
    }

    #[test]
    fn snapshot_exposes_positions_score_and_freeze_elapsed() {
        let base = Instant::now();
        let mut state = start_session(&[note(1000.0, 0, 200.0)], test_config());

        run_to(&mut state, base, 1000.0);
        let view = snapshot(&state, base);
        assert_eq!(view.tiles.len(), 1);
        assert!(
            (view.tiles[0].y - state.config.target_y).abs() < 0.01,
            "a tile at its scheduled time sits on the target line"
        );
        assert_eq!(view.mistake_elapsed_ms, None);

        run_to(&mut state, base, 1600.0);
        let frozen = snapshot(&state, base + Duration::from_millis(500));
        assert!(matches!(frozen.phase, Phase::MistakeFreeze(_)));
        let elapsed = frozen.mistake_elapsed_ms.expect("freeze elapsed present");
        assert!((elapsed - 500.0).abs() < 0.5);
    }
}
