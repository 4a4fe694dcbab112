//! Track analysis
//!
//! Consumes beat timelines from an external tracker and derives cue points
//! and tempo from them.

pub mod beats;
pub mod cue;
pub mod rms;
pub mod tempo;

pub use beats::{bar_starts, downbeat_times, Downbeat};
pub use cue::{beat_series_counts, CueExtraction, CueOptions, CuePointExtractor};
pub use rms::{framed_rms, percentile};
pub use tempo::{beats_to_seconds, estimate_tempo_from_downbeats, tempo_ratio, TempoEstimate};
