use crate::game::tile::Tile;
use log::{info, warn};
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::Path;
use std::{fmt, fs, io};

/// One source-level note as it appears in a chart file: a lane, a start
/// time, and a duration, all in milliseconds. Records are immutable once
/// parsed and are discarded after expansion into tiles.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NoteRecord {
    pub time: f32,
    pub lane: usize,
    pub duration: f32,
}

#[derive(Debug)]
pub enum ChartError {
    Io(io::Error),
    Format(serde_json::Error),
    LaneOutOfRange {
        index: usize,
        lane: usize,
        lane_count: usize,
    },
    NegativeTime {
        index: usize,
        time: f32,
    },
    NegativeDuration {
        index: usize,
        duration: f32,
    },
    Empty,
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::Io(e) => write!(f, "failed to read chart file: {}", e),
            ChartError::Format(e) => write!(f, "malformed chart data: {}", e),
            ChartError::LaneOutOfRange {
                index,
                lane,
                lane_count,
            } => write!(
                f,
                "note {} targets lane {} but only {} lanes are configured",
                index, lane, lane_count
            ),
            ChartError::NegativeTime { index, time } => {
                write!(f, "note {} has negative start time {}", index, time)
            }
            ChartError::NegativeDuration { index, duration } => {
                write!(f, "note {} has negative duration {}", index, duration)
            }
            ChartError::Empty => write!(f, "chart contains no notes"),
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Io(e) => Some(e),
            ChartError::Format(e) => Some(e),
            _ => None,
        }
    }
}

/// Parses a JSON chart (an array of `{time, lane, duration}` objects) and
/// validates every record. Validation is atomic: one bad record rejects the
/// whole chart.
pub fn parse_chart(raw: &str, lane_count: usize) -> Result<Vec<NoteRecord>, ChartError> {
    let notes: Vec<NoteRecord> = serde_json::from_str(raw).map_err(ChartError::Format)?;

    for (index, note) in notes.iter().enumerate() {
        if note.lane >= lane_count {
            return Err(ChartError::LaneOutOfRange {
                index,
                lane: note.lane,
                lane_count,
            });
        }
        if note.time < 0.0 {
            return Err(ChartError::NegativeTime {
                index,
                time: note.time,
            });
        }
        if note.duration < 0.0 {
            return Err(ChartError::NegativeDuration {
                index,
                duration: note.duration,
            });
        }
    }

    info!("Parsed {} notes from chart data.", notes.len());
    Ok(notes)
}

pub fn load_chart_file(path: &Path, lane_count: usize) -> Result<Vec<NoteRecord>, ChartError> {
    let raw = fs::read_to_string(path).map_err(ChartError::Io)?;
    parse_chart(&raw, lane_count)
}

/// Expands notes into runtime tiles. A note no longer than one segment
/// becomes a single tile of its own duration; a longer note becomes
/// `ceil(duration / max_segment_ms)` tiles, every piece a full segment long
/// (the last piece deliberately overruns the note's nominal end), scheduled
/// at `start + i * max_segment_ms`.
pub fn expand_notes(notes: &[NoteRecord], max_segment_ms: f32) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(notes.len());
    for note in notes {
        if note.duration <= max_segment_ms {
            tiles.push(Tile::new(note.lane, note.time, note.duration));
        } else {
            let pieces = (note.duration / max_segment_ms).ceil() as usize;
            for i in 0..pieces {
                let offset = i as f32 * max_segment_ms;
                tiles.push(Tile::new(note.lane, note.time + offset, max_segment_ms));
            }
        }
    }

    // Charts are assumed sorted, but the scheduler cursor and judgment scan
    // both require it, so sort defensively. Stable sort keeps the expansion
    // order of equal-time tiles.
    if !tiles.is_sorted_by(|a, b| a.scheduled_ms <= b.scheduled_ms) {
        warn!("Chart notes were not sorted by time; sorting defensively.");
        tiles.sort_by(|a, b| {
            a.scheduled_ms
                .partial_cmp(&b.scheduled_ms)
                .unwrap_or(Ordering::Equal)
        });
    }

    tiles
}
