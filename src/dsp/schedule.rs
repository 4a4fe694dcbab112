//! EQ automation over time
//!
//! A transition is a list of keyframes, each pinning a [`GainPair`] to a time.
//! Between consecutive keyframes the buffer is cut into chunks; every chunk is
//! filtered with the gain interpolated at its start. After the last keyframe
//! the remainder of the buffer is filtered once with the final gain pair.
//!
//! Chunk jobs are planned up front and filtered in parallel; they write
//! disjoint regions of the output, so the result does not depend on the
//! order in which jobs finish.

use super::eq::{EqEngine, GainPair};
use crate::audio::seconds_to_samples;
use crate::audio::AudioBuffer;
use crate::error::{MixError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default chunk length: one second at 44.1 kHz
pub const DEFAULT_CHUNK_SIZE: usize = 44100;

/// A scheduled gain target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time_secs: f64,
    pub gains: GainPair,
}

impl Keyframe {
    pub fn new(time_secs: f64, low: f64, high: f64) -> Self {
        Self {
            time_secs,
            gains: GainPair { low, high },
        }
    }
}

/// How gains move between two keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Constant-rate ramp
    #[default]
    Linear,
    /// S-curve: flat near both keyframes, steep in the middle
    Sigmoid,
}

impl InterpolationMode {
    /// Interpolated (unfloored) gains `offset` samples into a transition of
    /// `length` samples from `from` to `to`.
    pub fn gain_at(self, from: GainPair, to: GainPair, offset: usize, length: usize) -> GainPair {
        if length == 0 {
            return to;
        }
        let progress = offset as f64 / length as f64;
        match self {
            InterpolationMode::Linear => from.lerp(to, progress),
            InterpolationMode::Sigmoid => from.lerp(to, sigmoid(4.0 * progress - 2.0)),
        }
    }
}

impl std::str::FromStr for InterpolationMode {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "rapid" => Ok(InterpolationMode::Linear),
            "sigmoid" | "smooth" => Ok(InterpolationMode::Sigmoid),
            other => Err(MixError::invalid("mode", other, "linear or sigmoid")),
        }
    }
}

/// Logistic function `1 / (1 + e^-x)`
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// One block of the output and the gains it is filtered with
#[derive(Debug, Clone, PartialEq)]
struct ChunkJob {
    range: Range<usize>,
    gains: GainPair,
}

/// Drives an [`EqEngine`] chunk by chunk along a keyframe schedule
#[derive(Debug, Clone, Default)]
pub struct TransitionScheduler {
    engine: EqEngine,
}

impl TransitionScheduler {
    pub fn new(engine: EqEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EqEngine {
        &self.engine
    }

    /// Render the EQ automation described by `keyframes` over `buffer`.
    ///
    /// A single keyframe holds its gains over the whole buffer. Samples before
    /// the first keyframe are held at the first keyframe's gains.
    pub fn schedule(
        &self,
        buffer: &AudioBuffer,
        keyframes: &[Keyframe],
        chunk_size: usize,
        mode: InterpolationMode,
    ) -> Result<AudioBuffer> {
        buffer.ensure_processable()?;
        validate_keyframes(keyframes)?;
        if chunk_size == 0 {
            return Err(MixError::invalid("chunk_size", chunk_size, "> 0 samples"));
        }

        let jobs = plan_chunks(buffer, keyframes, chunk_size, mode);
        log::debug!(
            "Scheduling {} chunk(s) over {} samples ({:?}, {} keyframes)",
            jobs.len(),
            buffer.len(),
            mode,
            keyframes.len()
        );

        let sample_rate = buffer.sample_rate();
        let samples = buffer.samples();
        let rendered = jobs
            .par_iter()
            .map(|job| {
                self.engine
                    .process_block(&samples[job.range.clone()], sample_rate, job.gains)
            })
            .collect::<Result<Vec<Vec<f32>>>>()?;

        let mut output = vec![0.0_f32; buffer.len()];
        for (job, block) in jobs.iter().zip(rendered) {
            output[job.range.clone()].copy_from_slice(&block);
        }

        Ok(AudioBuffer::from_stage(output, sample_rate))
    }
}

fn validate_keyframes(keyframes: &[Keyframe]) -> Result<()> {
    if keyframes.is_empty() {
        return Err(MixError::invalid("keyframes", 0, "at least one keyframe"));
    }
    for keyframe in keyframes {
        if !keyframe.time_secs.is_finite() || keyframe.time_secs < 0.0 {
            return Err(MixError::invalid(
                "keyframe.time_secs",
                keyframe.time_secs,
                "finite and >= 0",
            ));
        }
        keyframe.gains.validate()?;
    }
    for pair in keyframes.windows(2) {
        if pair[1].time_secs <= pair[0].time_secs {
            return Err(MixError::invalid(
                "keyframes",
                format!("{} after {}", pair[1].time_secs, pair[0].time_secs),
                "strictly increasing times",
            ));
        }
    }
    Ok(())
}

/// Split the buffer into disjoint chunk jobs covering every sample once
fn plan_chunks(
    buffer: &AudioBuffer,
    keyframes: &[Keyframe],
    chunk_size: usize,
    mode: InterpolationMode,
) -> Vec<ChunkJob> {
    let len = buffer.len();
    let sample_rate = buffer.sample_rate();
    let mut jobs = Vec::new();

    if let [only] = keyframes {
        jobs.push(ChunkJob {
            range: 0..len,
            gains: only.gains,
        });
        return jobs;
    }

    let marks: Vec<usize> = keyframes
        .iter()
        .map(|k| seconds_to_samples(k.time_secs, sample_rate))
        .collect();

    let first = marks[0].min(len);
    if first > 0 {
        jobs.push(ChunkJob {
            range: 0..first,
            gains: keyframes[0].gains,
        });
    }

    for (i, pair) in keyframes.windows(2).enumerate() {
        let (start, end) = (marks[i], marks[i + 1]);
        let length = end - start;
        if length == 0 {
            // Two keyframes inside the same sample: nothing to interpolate
            continue;
        }

        let mut chunk_start = start;
        while chunk_start < end.min(len) {
            let chunk_end = (chunk_start + chunk_size).min(end).min(len);
            let gains = mode
                .gain_at(pair[0].gains, pair[1].gains, chunk_start - start, length)
                .floored();
            jobs.push(ChunkJob {
                range: chunk_start..chunk_end,
                gains,
            });
            chunk_start = chunk_end;
        }
    }

    let last = marks[marks.len() - 1];
    if last < len {
        jobs.push(ChunkJob {
            range: last..len,
            gains: keyframes[keyframes.len() - 1].gains,
        });
    }

    jobs
}
