use crate::config;
use configparser::ini::Ini;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

const SETTINGS_DIR: &str = "save";
const SETTINGS_INI_PATH: &str = "save/settings.ini";

/// User-tunable engine settings, loaded once from `save/settings.ini`.
/// Anything missing or unparseable falls back to the built-in defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub lane_count: usize,
    pub screen_height: f32,
    pub target_y: f32,
    pub strict_mode: bool,
    pub cooldown_ms: u64,
    pub grace_ms: u64,
    /// `None` derives the hit window from geometry at calibration time.
    pub tolerance_ms: Option<f32>,
    pub travel_time_ms: f32,
    pub lookahead_ms: f32,
    pub max_segment_ms: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lane_count: config::LANE_COUNT,
            screen_height: config::SCREEN_HEIGHT,
            target_y: config::TARGET_Y,
            strict_mode: true,
            cooldown_ms: config::DEBOUNCE_COOLDOWN_MS,
            grace_ms: config::MISTAKE_GRACE_MS,
            tolerance_ms: None,
            travel_time_ms: config::TRAVEL_TIME_MS,
            lookahead_ms: config::SPAWN_LOOKAHEAD_MS,
            max_segment_ms: config::MAX_SEGMENT_MS,
        }
    }
}

static SETTINGS: Lazy<Mutex<Settings>> = Lazy::new(|| Mutex::new(Settings::default()));

fn create_default_file() -> Result<(), std::io::Error> {
    info!(
        "Settings file not found, creating defaults in '{}'.",
        SETTINGS_DIR
    );
    std::fs::create_dir_all(SETTINGS_DIR)?;

    let mut conf = Ini::new();
    conf.set(
        "playfield",
        "LaneCount",
        Some(config::LANE_COUNT.to_string()),
    );
    conf.set(
        "playfield",
        "ScreenHeight",
        Some(config::SCREEN_HEIGHT.to_string()),
    );
    conf.set("playfield", "TargetY", Some(config::TARGET_Y.to_string()));
    conf.set("gameplay", "StrictMode", Some("1".to_string()));
    conf.set(
        "gameplay",
        "CooldownMs",
        Some(config::DEBOUNCE_COOLDOWN_MS.to_string()),
    );
    conf.set(
        "gameplay",
        "GraceMs",
        Some(config::MISTAKE_GRACE_MS.to_string()),
    );
    conf.set("gameplay", "ToleranceMs", Some("auto".to_string()));
    conf.set(
        "scroll",
        "TravelTimeMs",
        Some(config::TRAVEL_TIME_MS.to_string()),
    );
    conf.set(
        "scroll",
        "LookaheadMs",
        Some(config::SPAWN_LOOKAHEAD_MS.to_string()),
    );
    conf.set(
        "chart",
        "MaxSegmentMs",
        Some(config::MAX_SEGMENT_MS.to_string()),
    );
    conf.write(SETTINGS_INI_PATH)?;
    Ok(())
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool_or(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => {
            let v = v.trim();
            v == "1" || v.eq_ignore_ascii_case("true")
        }
        None => default,
    }
}

pub fn load() {
    if !Path::new(SETTINGS_INI_PATH).exists() {
        if let Err(e) = create_default_file() {
            warn!("Failed to create default settings file: {}", e);
            return;
        }
    }

    let mut conf = Ini::new();
    if conf.load(SETTINGS_INI_PATH).is_err() {
        warn!(
            "Failed to load '{}', using default settings.",
            SETTINGS_INI_PATH
        );
        return;
    }

    let defaults = Settings::default();
    let mut settings = SETTINGS.lock().unwrap();
    settings.lane_count = parse_or(conf.get("playfield", "LaneCount"), defaults.lane_count);
    if settings.lane_count == 0 {
        warn!("LaneCount 0 is unplayable; using {}.", defaults.lane_count);
        settings.lane_count = defaults.lane_count;
    }
    settings.screen_height = parse_or(
        conf.get("playfield", "ScreenHeight"),
        defaults.screen_height,
    );
    settings.target_y = parse_or(conf.get("playfield", "TargetY"), defaults.target_y);
    settings.strict_mode =
        parse_bool_or(conf.get("gameplay", "StrictMode"), defaults.strict_mode);
    settings.cooldown_ms = parse_or(conf.get("gameplay", "CooldownMs"), defaults.cooldown_ms);
    settings.grace_ms = parse_or(conf.get("gameplay", "GraceMs"), defaults.grace_ms);
    settings.tolerance_ms = conf
        .get("gameplay", "ToleranceMs")
        .and_then(|v| v.trim().parse::<f32>().ok());
    settings.travel_time_ms =
        parse_or(conf.get("scroll", "TravelTimeMs"), defaults.travel_time_ms);
    settings.lookahead_ms = parse_or(conf.get("scroll", "LookaheadMs"), defaults.lookahead_ms);
    settings.max_segment_ms =
        parse_or(conf.get("chart", "MaxSegmentMs"), defaults.max_segment_ms);

    info!("Settings loaded: {:?}", *settings);
}

pub fn get() -> Settings {
    SETTINGS.lock().unwrap().clone()
}
