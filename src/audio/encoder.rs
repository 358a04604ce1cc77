use crate::types::AudioData;
use anyhow::{Context, Result};
use std::io::{Seek, Write};
use std::path::Path;

fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Encode AudioData to a 16-bit mono WAV file
pub fn encode_audio<P: AsRef<Path>>(audio: &AudioData, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    encode_to_writer(audio, std::io::BufWriter::new(file))
        .with_context(|| format!("Failed to write WAV file: {}", path.display()))
}

/// Encode AudioData into any seekable sink (e.g. a staged temp file)
pub fn encode_to_writer<W: Write + Seek>(audio: &AudioData, sink: W) -> Result<()> {
    let mut writer =
        hound::WavWriter::new(sink, wav_spec(audio.sample_rate)).context("Failed to start WAV stream")?;

    for &sample in &audio.samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * 32767.0) as i16)
            .context("Failed to write audio sample")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_every_sample_at_source_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let audio = AudioData {
            samples: vec![0.25; 2205],
            sample_rate: 22_050,
        };

        encode_audio(&audio, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.duration(), 2205);
    }

    #[test]
    fn clamps_out_of_range_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let audio = AudioData {
            samples: vec![2.0, -3.0],
            sample_rate: 8_000,
        };

        encode_audio(&audio, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![32767, -32767]);
    }
}
