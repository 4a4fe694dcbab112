//! Audio file I/O operations
//!
//! Handles loading and saving WAV files using the hound crate.
//! Multichannel files are downmixed to mono on load.

use crate::audio::AudioBuffer;
use crate::error::{MixError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

fn read_error(path: &Path) -> impl Fn(hound::Error) -> MixError + '_ {
    move |e| MixError::AudioReadError {
        path: path.display().to_string(),
        source: e,
    }
}

fn write_error(path: &Path) -> impl Fn(hound::Error) -> MixError + '_ {
    move |e| MixError::AudioWriteError {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load a WAV file into a mono AudioBuffer
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(read_error(path))?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map_err(read_error(path)))
            .collect::<Result<Vec<f32>>>()?,
        SampleFormat::Int => {
            let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val).map_err(read_error(path)))
                .collect::<Result<Vec<f32>>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    log::debug!(
        "Loaded {} ({} ch @ {} Hz, {} samples)",
        path.display(),
        channels,
        spec.sample_rate,
        samples.len()
    );

    AudioBuffer::new(samples, spec.sample_rate)
}

/// Save an AudioBuffer to a mono WAV file (32-bit float)
pub fn save_wav<P: AsRef<Path>>(buffer: &AudioBuffer, path: P) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_error(path))?;
    for &sample in buffer.samples() {
        writer.write_sample(sample).map_err(write_error(path))?;
    }
    writer.finalize().map_err(write_error(path))?;

    Ok(())
}

/// Save an AudioBuffer to a WAV file with specific bit depth.
///
/// Integer depths clamp samples to [-1, 1] before quantising.
pub fn save_wav_with_depth<P: AsRef<Path>>(buffer: &AudioBuffer, path: P, bits: u16) -> Result<()> {
    let path = path.as_ref();

    match bits {
        32 => return save_wav(buffer, path),
        16 | 24 => {}
        other => return Err(MixError::invalid("bits", other, "16, 24 or 32")),
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: bits,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_error(path))?;
    let max_val = ((1u32 << (bits - 1)) - 1) as f32;

    for &sample in buffer.samples() {
        let int_sample = (sample.clamp(-1.0, 1.0) * max_val) as i32;
        writer.write_sample(int_sample).map_err(write_error(path))?;
    }
    writer.finalize().map_err(write_error(path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_wav_round_trip_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let original = AudioBuffer::sine_wave(440.0, 0.8, 0.5, 44100);
        save_wav(&original, &path).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(original.sample_rate(), loaded.sample_rate());
        assert!(original.is_approx_equal(&loaded, 1e-6));
    }

    #[test]
    fn test_wav_16bit_precision() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test_16bit.wav");

        let original = AudioBuffer::sine_wave(440.0, 0.8, 0.5, 44100);
        save_wav_with_depth(&original, &path, 16).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert!(original.is_approx_equal(&loaded, 1e-4));
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(0.5f32).unwrap();
            writer.write_sample(-0.1f32).unwrap();
        }
        writer.finalize().unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.len(), 100);
        assert!(loaded.samples().iter().all(|&s| (s - 0.2).abs() < 1e-6));
    }

    #[test]
    fn test_unsupported_depth() {
        let dir = tempdir().unwrap();
        let buffer = AudioBuffer::silence(0.1, 8000);
        let result = save_wav_with_depth(&buffer, dir.path().join("x.wav"), 12);
        assert!(matches!(result, Err(MixError::InvalidParameter { .. })));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_wav("nonexistent_file.wav");
        assert!(matches!(result, Err(MixError::AudioReadError { .. })));
    }
}
