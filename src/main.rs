use log::{LevelFilter, error, info};
use std::error::Error;
use std::path::Path;
use std::time::{Duration, Instant};

use tilefall::config::Config;
use tilefall::core::clock::{ManualClock, PlaybackClock};
use tilefall::game::chart;
use tilefall::game::gameplay::{self, Phase};
use tilefall::settings;

/// Headless session runner: loads a JSON chart, plays it back with an
/// autoplay input script at a simulated 60Hz, and reports the terminal
/// score. Stands in for the window/render loop this engine plugs into.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let chart_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "charts/canon.json".to_string());
    info!("Loading chart '{}'", chart_path);

    settings::load();
    let config = Config::from_settings(&settings::get());

    let notes = match chart::load_chart_file(Path::new(&chart_path), config.lane_count) {
        Ok(notes) => notes,
        Err(e) => {
            error!("Failed to load chart: {}", e);
            return Err(Box::new(e));
        }
    };

    // Autoplay script: one press per tile, on its scheduled time.
    let script: Vec<(f32, usize)> = chart::expand_notes(&notes, config.max_segment_ms)
        .iter()
        .map(|t| (t.scheduled_ms, t.lane))
        .collect();

    let mut state = gameplay::init(&notes, config, ManualClock::new())?;

    let frame = Duration::from_micros(16_667);
    let frame_ms = 16.667_f32;
    let mut now = Instant::now();
    let mut next_press = 0usize;

    loop {
        now += frame;
        state.clock.advance_ms(frame_ms);

        let position = state.clock.position_ms();
        while next_press < script.len() && script[next_press].0 <= position {
            gameplay::queue_press(&mut state, script[next_press].1, now);
            next_press += 1;
        }

        gameplay::update(&mut state, now);

        if state.complete || matches!(state.phase, Phase::GameOver) {
            break;
        }
    }

    info!(
        "Session finished: score {}, phase {:?}",
        state.score, state.phase
    );
    Ok(())
}
