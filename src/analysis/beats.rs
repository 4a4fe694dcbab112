//! Beat and downbeat timestamps as produced by an external beat tracker

use serde::{Deserialize, Serialize};

/// A tracked beat with its position in the bar (1 = downbeat).
///
/// Serialised as a `[time, bar_position]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, u32)", into = "(f64, u32)")]
pub struct Downbeat {
    pub time_secs: f64,
    pub bar_position: u32,
}

impl Downbeat {
    pub fn new(time_secs: f64, bar_position: u32) -> Self {
        Self {
            time_secs,
            bar_position,
        }
    }

    pub fn is_downbeat(&self) -> bool {
        self.bar_position == 1
    }
}

impl From<(f64, u32)> for Downbeat {
    fn from((time_secs, bar_position): (f64, u32)) -> Self {
        Self::new(time_secs, bar_position)
    }
}

impl From<Downbeat> for (f64, u32) {
    fn from(beat: Downbeat) -> Self {
        (beat.time_secs, beat.bar_position)
    }
}

/// The time column of a `(time, bar_position)` sequence
pub fn downbeat_times(beats: &[Downbeat]) -> Vec<f64> {
    beats.iter().map(|b| b.time_secs).collect()
}

/// Keep only the first beat of every bar
pub fn bar_starts(beats: &[Downbeat]) -> Vec<Downbeat> {
    beats.iter().copied().filter(Downbeat::is_downbeat).collect()
}
