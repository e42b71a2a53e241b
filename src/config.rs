use crate::settings::Settings;

// Playfield geometry. The reference layout is a 400x700 window with four
// 100px lanes and the judgment line 150px above the bottom edge.
pub const SCREEN_WIDTH: f32 = 400.0;
pub const SCREEN_HEIGHT: f32 = 700.0;
pub const LANE_COUNT: usize = 4;
pub const LANE_WIDTH: f32 = 100.0;
pub const TARGET_Y: f32 = SCREEN_HEIGHT - 150.0;

// Gameplay Constants
pub const MAX_SEGMENT_MS: f32 = 300.0;
pub const SPAWN_LOOKAHEAD_MS: f32 = 1500.0;
pub const TRAVEL_TIME_MS: f32 = 1833.0;
pub const FALLBACK_SPEED_PPS: f32 = 300.0;
pub const MISTAKE_GRACE_MS: u64 = 2000;
pub const DEBOUNCE_COOLDOWN_MS: u64 = 150;

/// Per-session engine configuration. Defaults reproduce the reference
/// playfield; `tolerance_ms: None` derives the hit window from geometry and
/// scroll speed at calibration time.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub lane_count: usize,
    pub screen_height: f32,
    pub target_y: f32,
    pub max_segment_ms: f32,
    pub lookahead_ms: f32,
    pub travel_time_ms: f32,
    pub tolerance_ms: Option<f32>,
    pub strict_mode: bool,
    pub cooldown_ms: u64,
    pub grace_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lane_count: LANE_COUNT,
            screen_height: SCREEN_HEIGHT,
            target_y: TARGET_Y,
            max_segment_ms: MAX_SEGMENT_MS,
            lookahead_ms: SPAWN_LOOKAHEAD_MS,
            travel_time_ms: TRAVEL_TIME_MS,
            tolerance_ms: None,
            strict_mode: true,
            cooldown_ms: DEBOUNCE_COOLDOWN_MS,
            grace_ms: MISTAKE_GRACE_MS,
        }
    }
}

impl Config {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lane_count: settings.lane_count,
            screen_height: settings.screen_height,
            target_y: settings.target_y,
            max_segment_ms: settings.max_segment_ms,
            lookahead_ms: settings.lookahead_ms,
            travel_time_ms: settings.travel_time_ms,
            tolerance_ms: settings.tolerance_ms,
            strict_mode: settings.strict_mode,
            cooldown_ms: settings.cooldown_ms,
            grace_ms: settings.grace_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::settings::Settings;

    #[test]
    fn from_settings_carries_playfield_overrides() {
        let settings = Settings {
            lane_count: 6,
            screen_height: 900.0,
            target_y: 750.0,
            ..Settings::default()
        };
        let config = Config::from_settings(&settings);
        assert_eq!(config.lane_count, 6);
        assert_eq!(config.screen_height, 900.0);
        assert_eq!(config.target_y, 750.0);
    }

    #[test]
    fn from_settings_of_defaults_matches_default_config() {
        assert_eq!(
            Config::from_settings(&Settings::default()),
            Config::default(),
            "every tunable must flow through settings"
        );
    }
}
