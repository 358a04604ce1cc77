use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use voicecue::config::{self, RuntimeConfig};
use voicecue::pipeline;
use voicecue::types::SplitPolicy;

/// voicecue - Timed speech synthesis and caption alignment
///
/// Splits a script into speakable units, renders each one with a TTS engine,
/// merges the audio into one voice-over and writes caption timing metadata.
#[derive(Parser, Debug)]
#[command(name = "voicecue")]
#[command(version = "0.1.0")]
#[command(about = "Timed speech synthesis and caption alignment", long_about = None)]
struct Args {
    /// UTF-8 script file
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Output directory for the voice-over and metadata files
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Voice profile: model file or reference audio for the engine
    #[arg(long, value_name = "PATH")]
    voice: Option<String>,

    /// Script language (selects abbreviation rules and is passed to the engine)
    #[arg(long, value_name = "CODE")]
    language: Option<String>,

    /// Character budget per synthesized unit (0 = one sentence per unit)
    #[arg(long, value_name = "CHARS")]
    max_unit_chars: Option<usize>,

    /// Synthesize one sentence per unit
    #[arg(long)]
    sentence_units: bool,

    /// Maximum words per caption chunk
    #[arg(long, value_name = "WORDS")]
    max_caption_words: Option<usize>,

    /// How a unit's duration is spread over its caption chunks
    #[arg(long, value_enum)]
    caption_split: Option<CaptionSplit>,

    /// JSON configuration (inline JSON string)
    #[arg(long, value_name = "JSON", conflicts_with = "config_file")]
    config_json: Option<String>,

    /// Path to JSON configuration
    #[arg(long, value_name = "PATH", conflicts_with = "config_json")]
    config_file: Option<PathBuf>,

    /// External TTS program (defaults to piper)
    #[arg(long, value_name = "PROGRAM")]
    engine_program: Option<String>,

    /// Argument template for the TTS program; repeat for each argument
    #[arg(long = "engine-arg", value_name = "ARG", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Write silent audio paced by word count instead of running a TTS engine
    #[arg(long, conflicts_with = "engine_program")]
    preview: bool,

    /// Speaking rate for --preview
    #[arg(long, value_name = "WPM", requires = "preview")]
    words_per_minute: Option<f64>,

    /// Units synthesized concurrently
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,

    /// Keep per-unit audio under OUTPUT_DIR/units
    #[arg(long)]
    keep_unit_audio: bool,

    /// Also write captions.srt
    #[arg(long)]
    srt: bool,

    /// Allowed difference between merged audio and timeline, in seconds
    #[arg(long, value_name = "SECONDS")]
    tolerance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CaptionSplit {
    Equal,
    Words,
    Characters,
}

impl From<CaptionSplit> for SplitPolicy {
    fn from(value: CaptionSplit) -> Self {
        match value {
            CaptionSplit::Equal => SplitPolicy::Equal,
            CaptionSplit::Words => SplitPolicy::Words,
            CaptionSplit::Characters => SplitPolicy::Characters,
        }
    }
}

impl Args {
    /// Validate CLI arguments
    fn validate(&self) -> Result<()> {
        if !self.script.exists() {
            bail!("Script file does not exist: {:?}", self.script);
        }

        if !self.script.is_file() {
            bail!("Script path is not a file: {:?}", self.script);
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            bail!("Output path must be a directory: {:?}", self.output_dir);
        }

        Ok(())
    }

    /// Load the configuration sources, then let flags override them
    fn runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config =
            config::load_config(self.config_file.as_deref(), self.config_json.as_deref())?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut RuntimeConfig) {
        if let Some(voice) = &self.voice {
            config.voice_profile = Some(voice.clone());
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(chars) = self.max_unit_chars {
            config.max_unit_chars = chars;
        }
        if self.sentence_units {
            config.sentence_units = true;
        }
        if let Some(words) = self.max_caption_words {
            config.max_words_per_caption_chunk = words;
        }
        if let Some(split) = self.caption_split {
            config.caption_split = split.into();
        }
        if let Some(program) = &self.engine_program {
            config.engine.program = Some(program.clone());
            config.engine.preview = false;
        }
        if !self.engine_args.is_empty() {
            config.engine.args = Some(self.engine_args.clone());
        }
        if self.preview {
            config.engine.preview = true;
            config.engine.program = None;
            config.engine.args = None;
        }
        if let Some(wpm) = self.words_per_minute {
            config.engine.words_per_minute = Some(wpm);
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if self.keep_unit_audio {
            config.keep_unit_audio = true;
        }
        if self.srt {
            config.write_srt = true;
        }
        if let Some(tolerance) = self.tolerance {
            config.merge_tolerance_seconds = tolerance;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    args.validate()
        .context("Failed to validate command-line arguments")?;

    let runtime_config = args
        .runtime_config()
        .context("Failed to load configuration")?;
    let options = runtime_config
        .to_options()
        .context("Configuration validation failed")?;
    let mut engine = runtime_config.engine.build();

    println!("voicecue v0.1.0 - Timed speech synthesis");
    println!("Script: {:?}", args.script);
    println!("Output dir: {:?}", args.output_dir);
    println!("Engine: {}", engine.name());

    let report = pipeline::run_file(&args.script, engine.as_mut(), &options, &args.output_dir)?;

    println!(
        "Synthesized {} units ({} skipped), {:.3}s of audio",
        report.units.len(),
        report.skipped.len(),
        report.merged_duration
    );
    for skipped in &report.skipped {
        println!("   Skipped unit {}: {}", skipped.index, skipped.reason);
    }
    println!("Caption chunks: {}", report.captions.len());
    for path in &report.written {
        println!("   Wrote {:?}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["voicecue", "script.txt", "out"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn flags_override_config_json() {
        let args = parse(&[
            "--config-json",
            r#"{"voice": "a.onnx", "max_unit_chars": 80, "jobs": 2}"#,
            "--max-unit-chars",
            "120",
            "--caption-split",
            "words",
            "--srt",
        ]);
        let config = args.runtime_config().unwrap();
        assert_eq!(config.voice_profile.as_deref(), Some("a.onnx"));
        assert_eq!(config.max_unit_chars, 120);
        assert_eq!(config.jobs, 2);
        assert_eq!(config.caption_split, SplitPolicy::Words);
        assert!(config.write_srt);
    }

    #[test]
    fn engine_args_accept_hyphen_values() {
        let args = parse(&[
            "--voice",
            "v.onnx",
            "--engine-program",
            "tts",
            "--engine-arg",
            "--text",
            "--engine-arg",
            "{text}",
            "--engine-arg",
            "--out_path",
            "--engine-arg",
            "{output}",
        ]);
        assert_eq!(
            args.engine_args,
            vec!["--text", "{text}", "--out_path", "{output}"]
        );
        let config = args.runtime_config().unwrap();
        assert_eq!(config.engine.program.as_deref(), Some("tts"));
    }

    #[test]
    fn preview_replaces_configured_program() {
        let args = parse(&[
            "--config-json",
            r#"{"voice": "v", "engine": {"program": "piper"}}"#,
            "--preview",
            "--words-per-minute",
            "200",
        ]);
        let config = args.runtime_config().unwrap();
        assert!(config.engine.preview);
        assert!(config.engine.program.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_sources_conflict() {
        let result = Args::try_parse_from([
            "voicecue",
            "script.txt",
            "out",
            "--config-json",
            "{}",
            "--config-file",
            "c.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn preview_conflicts_with_engine_program() {
        let result = Args::try_parse_from([
            "voicecue",
            "script.txt",
            "out",
            "--preview",
            "--engine-program",
            "piper",
        ]);
        assert!(result.is_err());
    }
}
