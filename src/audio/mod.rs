//! Audio buffer and I/O utilities
//!
//! Every stage of the mix consumes and produces mono [`AudioBuffer`]s.

mod buffer;
mod io;
pub mod levels;

pub use buffer::{seconds_to_samples, AudioBuffer};
pub use io::{load_wav, save_wav, save_wav_with_depth};
