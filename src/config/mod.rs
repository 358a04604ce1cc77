//! Run configuration loaded from JSON and overridden by CLI flags.

use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::pipeline::PipelineOptions;
use crate::synth::command::default_piper_args;
use crate::synth::preview::DEFAULT_WORDS_PER_MINUTE;
use crate::synth::{CommandEngine, PreviewEngine, VoiceEngine, VoiceProfile};
use crate::types::{SplitPolicy, UnitPolicy};

pub const DEFAULT_MAX_UNIT_CHARS: usize = 200;
pub const DEFAULT_MAX_WORDS_PER_CAPTION_CHUNK: usize = 7;
pub const DEFAULT_MERGE_TOLERANCE_SECONDS: f64 = 0.01;
const DEFAULT_PROGRAM: &str = "piper";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuntimeConfig {
    #[serde(
        default = "default_max_unit_chars",
        alias = "maxUnitChars",
        alias = "maxUnitCharBudget"
    )]
    pub max_unit_chars: usize,
    #[serde(default, alias = "sentenceUnits")]
    pub sentence_units: bool,
    #[serde(
        default = "default_max_words",
        alias = "maxWordsPerCaptionChunk",
        alias = "max_words"
    )]
    pub max_words_per_caption_chunk: usize,
    #[serde(default, alias = "voiceProfileReference", alias = "voice")]
    pub voice_profile: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default, alias = "captionSplit")]
    pub caption_split: SplitPolicy,
    #[serde(default = "default_tolerance", alias = "mergeToleranceSeconds")]
    pub merge_tolerance_seconds: f64,
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default, alias = "keepUnitAudio")]
    pub keep_unit_audio: bool,
    #[serde(default, alias = "writeSrt", alias = "srt")]
    pub write_srt: bool,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Engine selection; an empty object means Piper with its default arguments
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default, alias = "stdinText")]
    pub stdin_text: Option<bool>,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub preview: bool,
    #[serde(default, alias = "wordsPerMinute", alias = "wpm")]
    pub words_per_minute: Option<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_unit_chars: DEFAULT_MAX_UNIT_CHARS,
            sentence_units: false,
            max_words_per_caption_chunk: DEFAULT_MAX_WORDS_PER_CAPTION_CHUNK,
            voice_profile: None,
            language: default_language(),
            caption_split: SplitPolicy::default(),
            merge_tolerance_seconds: DEFAULT_MERGE_TOLERANCE_SECONDS,
            jobs: 1,
            keep_unit_audio: false,
            write_srt: false,
            engine: EngineConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.voice_profile
                .as_deref()
                .is_some_and(|voice| !voice.trim().is_empty()),
            "A voice profile is required (voice_profile or --voice)"
        );
        ensure!(
            self.max_words_per_caption_chunk > 0,
            "max_words_per_caption_chunk must be greater than zero"
        );
        ensure!(
            !self.language.trim().is_empty(),
            "language must not be empty"
        );
        ensure!(
            self.merge_tolerance_seconds.is_finite() && self.merge_tolerance_seconds >= 0.0,
            "merge_tolerance_seconds must be a non-negative number, got {}",
            self.merge_tolerance_seconds
        );
        ensure!(self.jobs > 0, "jobs must be at least 1");
        self.engine.validate()
    }

    pub fn unit_policy(&self) -> UnitPolicy {
        if self.sentence_units {
            UnitPolicy::Sentence
        } else {
            UnitPolicy::from_budget(self.max_unit_chars)
        }
    }

    pub fn to_options(&self) -> Result<PipelineOptions> {
        self.validate()?;
        let voice = self.voice_profile.clone().unwrap_or_default();
        Ok(PipelineOptions {
            unit_policy: self.unit_policy(),
            voice: VoiceProfile::new(voice, self.language.clone()),
            max_words_per_chunk: self.max_words_per_caption_chunk,
            split_policy: self.caption_split,
            merge_tolerance_seconds: self.merge_tolerance_seconds,
            jobs: self.jobs,
            keep_unit_audio: self.keep_unit_audio,
            write_srt: self.write_srt,
        })
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !(self.preview && (self.program.is_some() || self.args.is_some())),
            "engine.preview cannot be combined with engine.program or engine.args"
        );
        if let Some(wpm) = self.words_per_minute {
            ensure!(
                wpm.is_finite() && wpm > 0.0,
                "engine.words_per_minute must be positive, got {}",
                wpm
            );
        }
        if let Some(program) = &self.program {
            ensure!(!program.trim().is_empty(), "engine.program must not be empty");
        }
        if let Some(extension) = &self.extension {
            ensure!(
                !extension.is_empty() && !extension.contains(['/', '\\', '.']),
                "engine.extension must be a bare extension such as \"wav\", got {:?}",
                extension
            );
        }
        Ok(())
    }

    pub fn build(&self) -> Box<dyn VoiceEngine> {
        if self.preview {
            return Box::new(PreviewEngine::new(
                self.words_per_minute.unwrap_or(DEFAULT_WORDS_PER_MINUTE),
            ));
        }
        let program = self.program.as_deref().unwrap_or(DEFAULT_PROGRAM);
        let args = self.args.clone().unwrap_or_else(default_piper_args);
        // Text goes on stdin unless the arguments already carry it
        let stdin_text = self
            .stdin_text
            .unwrap_or_else(|| !args.iter().any(|arg| arg.contains("{text}")));
        let mut engine = CommandEngine::new(program, args).with_stdin_text(stdin_text);
        if let Some(extension) = &self.extension {
            engine = engine.with_extension(extension.clone());
        }
        Box::new(engine)
    }
}

/// Load configuration from a file or inline JSON; defaults when neither is given
pub fn load_config(path: Option<&Path>, json: Option<&str>) -> Result<RuntimeConfig> {
    if let Some(p) = path {
        let data =
            fs::read_to_string(p).with_context(|| format!("Failed to read config file {:?}", p))?;
        return parse_config(&data);
    }

    if let Some(raw) = json {
        return parse_config(raw);
    }

    Ok(RuntimeConfig::default())
}

pub fn parse_config(raw: &str) -> Result<RuntimeConfig> {
    serde_json::from_str(raw).context("Failed to parse config JSON")
}

fn default_max_unit_chars() -> usize {
    DEFAULT_MAX_UNIT_CHARS
}

fn default_max_words() -> usize {
    DEFAULT_MAX_WORDS_PER_CAPTION_CHUNK
}

fn default_language() -> String {
    "en".to_string()
}

fn default_tolerance() -> f64 {
    DEFAULT_MERGE_TOLERANCE_SECONDS
}

fn default_jobs() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.unit_policy(), UnitPolicy::CharBudget(200));
    }

    #[test]
    fn accepts_camel_case_aliases() {
        let config = parse_config(
            r#"{
                "maxUnitCharBudget": 120,
                "maxWordsPerCaptionChunk": 4,
                "voiceProfileReference": "voices/narrator.onnx",
                "captionSplit": "words",
                "writeSrt": true,
                "engine": {"preview": true, "wordsPerMinute": 180}
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_unit_chars, 120);
        assert_eq!(config.max_words_per_caption_chunk, 4);
        assert_eq!(config.voice_profile.as_deref(), Some("voices/narrator.onnx"));
        assert_eq!(config.caption_split, SplitPolicy::Words);
        assert!(config.write_srt);
        assert!(config.engine.preview);
        assert_eq!(config.engine.words_per_minute, Some(180.0));
    }

    #[test]
    fn zero_budget_or_flag_selects_sentence_units() {
        let zero = parse_config(r#"{"max_unit_chars": 0}"#).unwrap();
        assert_eq!(zero.unit_policy(), UnitPolicy::Sentence);
        let flagged = parse_config(r#"{"sentence_units": true}"#).unwrap();
        assert_eq!(flagged.unit_policy(), UnitPolicy::Sentence);
    }

    #[test]
    fn missing_voice_fails_validation() {
        let err = RuntimeConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("voice profile"));
    }

    #[test]
    fn rejects_bad_numbers() {
        for raw in [
            r#"{"voice": "v", "max_words_per_caption_chunk": 0}"#,
            r#"{"voice": "v", "jobs": 0}"#,
            r#"{"voice": "v", "merge_tolerance_seconds": -1.0}"#,
            r#"{"voice": "v", "engine": {"preview": true, "words_per_minute": 0}}"#,
            r#"{"voice": "v", "engine": {"preview": true, "program": "piper"}}"#,
            r#"{"voice": "v", "engine": {"extension": "../wav"}}"#,
        ] {
            let config = parse_config(raw).unwrap();
            assert!(config.validate().is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn builds_configured_engines() {
        let preview = parse_config(r#"{"engine": {"preview": true}}"#).unwrap();
        assert_eq!(preview.engine.build().name(), "preview");

        let piper = EngineConfig::default().build();
        assert_eq!(piper.name(), "piper");
        assert_eq!(piper.extension(), "wav");

        let coqui = parse_config(
            r#"{"engine": {"program": "tts", "args": ["--text", "{text}", "--out_path", "{output}"], "extension": "mp3"}}"#,
        )
        .unwrap();
        let engine = coqui.engine.build();
        assert_eq!(engine.name(), "tts");
        assert_eq!(engine.extension(), "mp3");
    }

    #[test]
    fn options_carry_voice_and_language() {
        let config = parse_config(r#"{"voice": "narrator.onnx", "language": "de", "jobs": 3}"#)
            .unwrap();
        let options = config.to_options().unwrap();
        assert_eq!(options.voice, VoiceProfile::new("narrator.onnx", "de"));
        assert_eq!(options.jobs, 3);
        assert_eq!(options.max_words_per_chunk, 7);
    }

    #[test]
    fn load_config_without_sources_is_default() {
        assert_eq!(load_config(None, None).unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicecue.json");
        std::fs::write(&path, r#"{"voice": "a.onnx", "keep_unit_audio": true}"#).unwrap();
        let config = load_config(Some(&path), None).unwrap();
        assert!(config.keep_unit_audio);
    }
}
