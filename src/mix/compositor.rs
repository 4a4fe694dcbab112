//! Two-track compositing and loudness normalisation
//!
//! Both merge policies cut the first track at its cue point and the second
//! track at its own, then join the pieces:
//!
//! - crossfade: the last `duration` of the first track's head is faded out
//!   over the first `duration` of the second track's tail, which fades in.
//! - splice: everything after the first track's cut is averaged with the
//!   second track's tail over their common length; only the second track
//!   continues past that overlap, and the rest of the first is dropped.

use crate::audio::levels::{mean_square, mean_square_db};
use crate::audio::AudioBuffer;
use crate::error::{MixError, Result};

/// Default loudness target for [`normalize`], in dB of mean-square energy
pub const DEFAULT_TARGET_DB: f64 = -10.0;

fn validate_cut(name: &str, cut_secs: f64) -> Result<()> {
    if !cut_secs.is_finite() || cut_secs < 0.0 {
        return Err(MixError::invalid(name, cut_secs, "finite and >= 0 seconds"));
    }
    Ok(())
}

/// `n` evenly spaced values from 0 to 1 inclusive
fn fade_ramp(n: usize) -> impl Iterator<Item = f32> {
    let step = if n > 1 { 1.0 / (n - 1) as f64 } else { 0.0 };
    (0..n).map(move |k| (k as f64 * step) as f32)
}

/// Linear crossfade from `a` (cut at `cut_a_secs`) into `b` (from `cut_b_secs`).
///
/// The fade window is clamped to whichever side is shorter.
pub fn crossfade(
    a: &AudioBuffer,
    b: &AudioBuffer,
    cut_a_secs: f64,
    cut_b_secs: f64,
    duration_secs: f64,
) -> Result<AudioBuffer> {
    a.ensure_processable()?;
    b.ensure_processable()?;
    a.ensure_same_rate(b)?;
    validate_cut("cut_a_secs", cut_a_secs)?;
    validate_cut("cut_b_secs", cut_b_secs)?;
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(MixError::invalid(
            "crossfade_secs",
            duration_secs,
            "finite and >= 0 seconds",
        ));
    }

    let head = &a.samples()[..a.index_at(cut_a_secs)];
    let tail = &b.samples()[b.index_at(cut_b_secs)..];

    let requested = (duration_secs * a.sample_rate() as f64) as usize;
    let window = requested.min(head.len()).min(tail.len());
    if window < requested {
        log::warn!(
            "Crossfade window clamped from {} to {} samples (head {}, tail {})",
            requested,
            window,
            head.len(),
            tail.len()
        );
    }

    let keep = head.len() - window;
    let mut out = Vec::with_capacity(keep + tail.len());
    out.extend_from_slice(&head[..keep]);
    out.extend(
        head[keep..]
            .iter()
            .zip(&tail[..window])
            .zip(fade_ramp(window))
            .map(|((&x, &y), r)| x * (1.0 - r) + y * r),
    );
    out.extend_from_slice(&tail[window..]);

    Ok(AudioBuffer::from_stage(out, a.sample_rate()))
}

/// Splice `b` (from `cut_b_secs`) onto `a` (cut at `cut_a_secs`), averaging
/// the region where both continue.
pub fn splice(a: &AudioBuffer, b: &AudioBuffer, cut_a_secs: f64, cut_b_secs: f64) -> Result<AudioBuffer> {
    a.ensure_processable()?;
    b.ensure_processable()?;
    a.ensure_same_rate(b)?;
    validate_cut("cut_a_secs", cut_a_secs)?;
    validate_cut("cut_b_secs", cut_b_secs)?;

    let (head, a_rest) = a.samples().split_at(a.index_at(cut_a_secs));
    let b_rest = &b.samples()[b.index_at(cut_b_secs)..];
    let overlap = a_rest.len().min(b_rest.len());

    if a_rest.len() > overlap {
        log::debug!(
            "Splice drops {} trailing samples of the outgoing track",
            a_rest.len() - overlap
        );
    }

    let mut out = Vec::with_capacity(head.len() + b_rest.len());
    out.extend_from_slice(head);
    out.extend(
        a_rest[..overlap]
            .iter()
            .zip(&b_rest[..overlap])
            .map(|(&x, &y)| (x + y) / 2.0),
    );
    out.extend_from_slice(&b_rest[overlap..]);

    Ok(AudioBuffer::from_stage(out, a.sample_rate()))
}

/// Scale `buffer` so its mean-square energy sits at `target_db`.
///
/// Silent buffers are returned unchanged. No clipping guard is applied:
/// a loud target may push samples outside [-1, 1].
pub fn normalize(buffer: &AudioBuffer, target_db: f64) -> Result<AudioBuffer> {
    buffer.ensure_processable()?;
    if !target_db.is_finite() {
        return Err(MixError::invalid("target_db", target_db, "a finite level in dB"));
    }

    if mean_square(buffer.samples()) == 0.0 {
        log::debug!("Skipping normalisation of a silent buffer");
        return Ok(buffer.clone());
    }

    let current_db = mean_square_db(buffer.samples());
    let factor = 10.0_f64.powf((target_db - current_db) / 20.0) as f32;
    let samples = buffer.samples().iter().map(|&s| s * factor).collect();

    Ok(AudioBuffer::from_stage(samples, buffer.sample_rate()))
}
