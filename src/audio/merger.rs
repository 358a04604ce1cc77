use anyhow::{ensure, Context, Result};
use tracing::debug;

use super::{decoder, resample};
use crate::types::{AudioData, TimedUnit};

/// Concatenate every unit's artifact, in slice order, into one track.
///
/// The slice must be the accumulator's output: its order is the timeline
/// order. Units are never crossfaded, since any overlap would shorten the
/// track and pull later captions out of sync. Artifacts at a different
/// sample rate are resampled to the first unit's rate.
pub fn merge_units(units: &[TimedUnit]) -> Result<AudioData> {
    ensure!(!units.is_empty(), "No synthesized units to merge");

    let mut sample_rate = None;
    let mut parts = Vec::with_capacity(units.len());
    // Source seconds and target samples merged so far
    let mut elapsed = 0.0_f64;
    let mut merged_len = 0usize;

    for unit in units {
        let audio = decoder::decode_audio(&unit.audio_path).with_context(|| {
            format!(
                "Failed to decode unit {} audio {}",
                unit.index(),
                unit.audio_path.display()
            )
        })?;
        let target_rate = *sample_rate.get_or_insert(audio.sample_rate);
        elapsed += audio.duration_seconds();
        if audio.sample_rate == target_rate {
            merged_len += audio.samples.len();
            parts.push(audio);
            continue;
        }
        // Size from the running total so rounding stays under one sample overall
        let end = (elapsed * target_rate as f64).round() as usize;
        let len = end.saturating_sub(merged_len);
        debug!(
            unit = unit.index(),
            from = audio.sample_rate,
            to = target_rate,
            samples = len,
            "resampling unit audio before merge"
        );
        let samples = resample::resample_to_len(&audio.samples, audio.sample_rate, target_rate, len)?;
        merged_len += samples.len();
        parts.push(AudioData {
            samples,
            sample_rate: target_rate,
        });
    }

    concat_audio(&parts).context("Unit audio could not be brought to a common sample rate")
}

/// Concatenate decoded buffers that already share one sample rate
pub fn concat_audio(parts: &[AudioData]) -> Option<AudioData> {
    let first = parts.first()?;
    let sample_rate = first.sample_rate;
    if !parts.iter().all(|p| p.sample_rate == sample_rate) {
        return None;
    }

    let total_samples: usize = parts.iter().map(|p| p.samples.len()).sum();
    let mut samples = Vec::with_capacity(total_samples);
    for part in parts {
        samples.extend_from_slice(&part.samples);
    }

    Some(AudioData {
        samples,
        sample_rate,
    })
}
