//! Core types for the voicecue synthesis and caption pipeline

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Raw audio data representation (mono, f32 samples)
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 22050)
    pub sample_rate: u32,
}

impl AudioData {
    /// Duration in seconds derived from the sample count
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// One speakable piece of the script, synthesized with a single engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechUnit {
    pub text: String,
    /// Position in the script, assigned by the segmenter
    pub index: usize,
}

/// A unit whose audio has been rendered and measured
#[derive(Debug, Clone)]
pub struct SynthesizedUnit {
    pub unit: SpeechUnit,
    pub audio_path: PathBuf,
    /// Measured from the decoded artifact, never estimated from text
    pub duration_seconds: f64,
}

impl SynthesizedUnit {
    pub fn file_name(&self) -> String {
        file_name_of(&self.audio_path)
    }
}

/// A synthesized unit placed on the timeline
#[derive(Debug, Clone)]
pub struct TimedUnit {
    pub unit: SpeechUnit,
    pub audio_path: PathBuf,
    pub duration_seconds: f64,
    pub start: f64, // seconds
    pub end: f64,   // seconds
}

impl TimedUnit {
    pub fn text(&self) -> &str {
        &self.unit.text
    }

    pub fn index(&self) -> usize {
        self.unit.index
    }

    pub fn file_name(&self) -> String {
        file_name_of(&self.audio_path)
    }
}

/// Display-sized slice of a unit's text with its own window
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionChunk {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// How the segmenter bounds each unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPolicy {
    /// One grammatical sentence per unit
    Sentence,
    /// Pack whole sentences until the character budget would be exceeded
    CharBudget(usize),
}

impl UnitPolicy {
    /// A zero budget means "no packing", i.e. one sentence per unit
    pub fn from_budget(budget: usize) -> Self {
        if budget == 0 {
            UnitPolicy::Sentence
        } else {
            UnitPolicy::CharBudget(budget)
        }
    }
}

/// How a unit's duration is spread across its caption chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Every chunk gets `duration / n`
    #[default]
    Equal,
    /// Proportional to the number of words in each chunk
    #[serde(alias = "word", alias = "word_count")]
    Words,
    /// Proportional to the number of characters in each chunk
    #[serde(alias = "chars", alias = "char_count")]
    Characters,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
