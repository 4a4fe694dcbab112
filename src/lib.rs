//! Segue - Beatmatched Two-Track Mixing
//!
//! Segue mixes an outgoing (master) track into an incoming (slave) track the
//! way a DJ would on a two-band mixer:
//! 1. Cue points are found where the short-term energy of the music changes
//! 2. The basses are swapped over a few beats (linear EQ automation)
//! 3. The treble is handed over on a slower S-curve (sigmoid EQ automation)
//! 4. The two tracks are spliced at their cue points and the result is
//!    normalised to a target loudness
//!
//! # Architecture
//!
//! - [`dsp`]: shelving filters, the two-band EQ and the keyframe scheduler
//! - [`analysis`]: cue points and tempo from an external beat tracker's output
//! - [`mix`]: crossfade, splice and loudness normalisation
//! - [`session`]: the track registry and the end-to-end mix orchestration
//!
//! Beat tracking, decoding and time-stretching sit behind the traits in
//! [`providers`].

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod error;
pub mod mix;
pub mod providers;
pub mod session;
pub mod track;

pub use audio::AudioBuffer;
pub use config::MixConfig;
pub use error::{MixError, Result};
pub use session::{MixContext, MixOrchestrator, MixPlan};
pub use track::Track;
