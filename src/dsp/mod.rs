//! EQ processing
//!
//! Shelving filters, the two-band EQ built on them, and the keyframe
//! scheduler that automates the EQ over a track.

pub mod eq;
pub mod schedule;
pub mod shelf;

pub use eq::{gain_to_db, EqEngine, GainPair, GAIN_FLOOR, HIGH_SHELF_HZ, LOW_SHELF_HZ, SHELF_Q};
pub use schedule::{sigmoid, InterpolationMode, Keyframe, TransitionScheduler, DEFAULT_CHUNK_SIZE};
pub use shelf::{ShelfFilter, ShelfKind};
