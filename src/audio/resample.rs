use anyhow::{ensure, Result};

/// Linearly resample `samples` from `source_rate` into exactly `output_len`
/// samples at `target_rate`.
///
/// Callers joining many parts pick each length from a running total so the
/// per-part rounding does not pile up.
pub fn resample_to_len(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
    output_len: usize,
) -> Result<Vec<f32>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() {
        return Ok(vec![0.0; output_len]);
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let last_index = samples.len() - 1;
    let output = (0..output_len)
        .map(|i| {
            let position = i as f64 / ratio;
            let left = (position.floor() as usize).min(last_index);
            let right = (left + 1).min(last_index);
            let t = (position - left as f64).min(1.0) as f32;
            samples[left] * (1.0 - t) + samples[right] * t
        })
        .collect();
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::resample_to_len;

    #[test]
    fn preserves_constant_signal_after_resample() {
        let input = vec![0.5; 441];
        let resampled = resample_to_len(&input, 22_050, 16_000, 320).unwrap();
        assert_eq!(resampled.len(), 320);
        assert!(resampled.iter().all(|&sample| (sample - 0.5).abs() < 1e-6));
    }

    #[test]
    fn same_rate_is_passthrough() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_to_len(&input, 8_000, 8_000, 3).unwrap(), input);
    }

    #[test]
    fn rejects_zero_rates() {
        assert!(resample_to_len(&[0.0], 0, 8_000, 1).is_err());
        assert!(resample_to_len(&[0.0], 8_000, 0, 1).is_err());
    }

    #[test]
    fn explicit_length_is_honoured() {
        let input = vec![0.25; 1_000];
        let resampled = resample_to_len(&input, 44_100, 1_000, 22).unwrap();
        assert_eq!(resampled.len(), 22);
        assert!(resampled.iter().all(|&sample| (sample - 0.25).abs() < 1e-6));
        assert!(resample_to_len(&[], 44_100, 1_000, 0).unwrap().is_empty());
    }
}
