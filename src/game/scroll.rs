use crate::config;
use crate::game::chart::ChartError;
use crate::game::tile::Tile;
use log::{info, warn};

/// Derived scroll parameters for one session: how fast tiles fall, and how
/// far into the track playback starts so the first tile reaches the target
/// line exactly when its scheduled time comes due.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPlan {
    pub pixels_per_second: f32,
    pub start_offset_ms: f32,
}

/// Calibrates scroll speed and audio start offset from chart content and
/// target geometry. A tile travels from the top of its fall to `target_y`
/// in `travel_time_ms`; if the first tile is scheduled further out than one
/// full travel duration, playback begins mid-track instead of at zero.
pub fn calibrate(
    tiles: &[Tile],
    target_y: f32,
    travel_time_ms: f32,
) -> Result<ScrollPlan, ChartError> {
    let first = tiles.first().ok_or(ChartError::Empty)?;

    let mut pixels_per_second = target_y / (travel_time_ms / 1000.0);
    if !pixels_per_second.is_finite() || pixels_per_second <= 0.0 {
        warn!(
            "Calibration produced non-positive scroll speed ({} px over {}ms); \
             falling back to {} px/s.",
            target_y,
            travel_time_ms,
            config::FALLBACK_SPEED_PPS
        );
        pixels_per_second = config::FALLBACK_SPEED_PPS;
    }

    let start_offset_ms = (first.scheduled_ms - travel_time_ms).max(0.0);
    info!(
        "Scroll calibrated: {:.2} px/s, start offset {:.0}ms (first tile at {:.0}ms)",
        pixels_per_second, start_offset_ms, first.scheduled_ms
    );

    Ok(ScrollPlan {
        pixels_per_second,
        start_offset_ms,
    })
}

/// Timing tolerance implied by the playfield: the number of milliseconds the
/// hit window spans when mapped onto `screen_height` pixels of scroll.
pub fn tolerance_ms(screen_height: f32, pixels_per_second: f32) -> f32 {
    screen_height / pixels_per_second * 1000.0
}
