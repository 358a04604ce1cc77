//! Voice-free engine for laying out captions before a real voice is set up.

use std::path::Path;

use super::{VoiceEngine, VoiceProfile};
use crate::audio::encoder::encode_audio;
use crate::error::{PipelineError, Result};
use crate::types::AudioData;

pub const DEFAULT_WORDS_PER_MINUTE: f64 = 160.0;
const PREVIEW_SAMPLE_RATE: u32 = 22_050;
const SENTENCE_PAUSE_SECONDS: f64 = 0.3;

/// Writes silent WAV files paced at a fixed speaking rate.
///
/// The durations still reach the timeline by decoding the written files,
/// exactly like real engine output.
#[derive(Debug, Clone)]
pub struct PreviewEngine {
    words_per_minute: f64,
}

impl PreviewEngine {
    pub fn new(words_per_minute: f64) -> Self {
        Self { words_per_minute }
    }

    /// Length of silence written for `text`
    pub fn paced_duration(&self, text: &str) -> f64 {
        let words = text.split_whitespace().count() as f64;
        let pauses = text
            .chars()
            .filter(|c| matches!(c, '.' | '!' | '?'))
            .count() as f64;
        words * 60.0 / self.words_per_minute + pauses * SENTENCE_PAUSE_SECONDS
    }
}

impl Default for PreviewEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS_PER_MINUTE)
    }
}

impl VoiceEngine for PreviewEngine {
    fn name(&self) -> &str {
        "preview"
    }

    fn prepare(&mut self, profile: &VoiceProfile) -> Result<()> {
        if profile.reference.trim().is_empty() {
            return Err(PipelineError::configuration("voice profile reference is empty"));
        }
        if !(self.words_per_minute.is_finite() && self.words_per_minute > 0.0) {
            return Err(PipelineError::configuration(format!(
                "preview words_per_minute must be positive, got {}",
                self.words_per_minute
            )));
        }
        Ok(())
    }

    fn render(&self, text: &str, _profile: &VoiceProfile, output: &Path) -> anyhow::Result<()> {
        let samples = (self.paced_duration(text) * PREVIEW_SAMPLE_RATE as f64).round() as usize;
        encode_audio(
            &AudioData {
                samples: vec![0.0; samples],
                sample_rate: PREVIEW_SAMPLE_RATE,
            },
            output,
        )
    }
}
