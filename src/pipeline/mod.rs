//! End-to-end run: script text in, merged voice-over and timeline metadata out.
//!
//! Outputs are staged next to their destinations and only persisted once the
//! merged track has passed the integrity check, so a failed run leaves none of
//! them behind.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{info, warn};

use crate::audio::{decoder, encoder, merger};
use crate::captions::subdivide_all;
use crate::config::{
    DEFAULT_MAX_UNIT_CHARS, DEFAULT_MAX_WORDS_PER_CAPTION_CHUNK, DEFAULT_MERGE_TOLERANCE_SECONDS,
};
use crate::error::{PipelineError, Result};
use crate::metadata::{self, StagedFile};
use crate::segment::{clean_script, read_script, segment};
use crate::synth::{EngineSession, Synthesizer, VoiceEngine, VoiceProfile};
use crate::timeline::{accumulate, total_duration, zero_width_units};
use crate::types::{CaptionChunk, SplitPolicy, SynthesizedUnit, TimedUnit, UnitPolicy};

pub const AUDIO_FILE: &str = "voiceover.wav";
pub const UNIT_METADATA_FILE: &str = "units_metadata.json";
pub const CAPTION_METADATA_FILE: &str = "chunks_metadata.json";
pub const SRT_FILE: &str = "captions.srt";
pub const UNITS_DIR: &str = "units";

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub unit_policy: UnitPolicy,
    /// Voice and language; the language also picks the abbreviation table
    pub voice: VoiceProfile,
    pub max_words_per_chunk: usize,
    pub split_policy: SplitPolicy,
    pub merge_tolerance_seconds: f64,
    pub jobs: usize,
    pub keep_unit_audio: bool,
    pub write_srt: bool,
}

impl PipelineOptions {
    pub fn new(voice: VoiceProfile) -> Self {
        Self {
            unit_policy: UnitPolicy::CharBudget(DEFAULT_MAX_UNIT_CHARS),
            voice,
            max_words_per_chunk: DEFAULT_MAX_WORDS_PER_CAPTION_CHUNK,
            split_policy: SplitPolicy::Equal,
            merge_tolerance_seconds: DEFAULT_MERGE_TOLERANCE_SECONDS,
            jobs: 1,
            keep_unit_audio: false,
            write_srt: false,
        }
    }

    fn check(&self) -> Result<()> {
        if !(self.merge_tolerance_seconds.is_finite() && self.merge_tolerance_seconds >= 0.0) {
            return Err(PipelineError::configuration(format!(
                "merge tolerance must be a non-negative number, got {}",
                self.merge_tolerance_seconds
            )));
        }
        if self.jobs == 0 {
            return Err(PipelineError::configuration("jobs must be at least 1"));
        }
        Ok(())
    }
}

/// Where a run writes its artifacts
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub dir: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn audio(&self) -> PathBuf {
        self.dir.join(AUDIO_FILE)
    }

    pub fn unit_metadata(&self) -> PathBuf {
        self.dir.join(UNIT_METADATA_FILE)
    }

    pub fn caption_metadata(&self) -> PathBuf {
        self.dir.join(CAPTION_METADATA_FILE)
    }

    pub fn srt(&self) -> PathBuf {
        self.dir.join(SRT_FILE)
    }

    pub fn units_dir(&self) -> PathBuf {
        self.dir.join(UNITS_DIR)
    }
}

/// A unit left out of the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUnit {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub units: Vec<TimedUnit>,
    pub captions: Vec<CaptionChunk>,
    pub skipped: Vec<SkippedUnit>,
    pub merged_duration: f64,
    /// Persisted files, audio first
    pub written: Vec<PathBuf>,
}

/// Read a script file and run it through the pipeline
pub fn run_file<E: VoiceEngine + ?Sized>(
    script_path: &Path,
    engine: &mut E,
    options: &PipelineOptions,
    output_dir: &Path,
) -> Result<RunReport> {
    let script = read_script(script_path)?;
    run_script(&script, engine, options, output_dir)
}

pub fn run_script<E: VoiceEngine + ?Sized>(
    script: &str,
    engine: &mut E,
    options: &PipelineOptions,
    output_dir: &Path,
) -> Result<RunReport> {
    options.check()?;

    let cleaned = clean_script(script)?;
    if cleaned.is_empty() {
        return Err(PipelineError::input("script is empty"));
    }
    let units = segment(&cleaned, options.unit_policy, &options.voice.language);
    if units.is_empty() {
        return Err(PipelineError::input("script contains no speakable text"));
    }
    info!(
        units = units.len(),
        policy = ?options.unit_policy,
        language = %options.voice.language,
        "script segmented"
    );

    let paths = OutputPaths::new(output_dir);
    let session = EngineSession::open(engine, options.voice.clone())?;
    let work_dir = create_work_dir(&paths, options.keep_unit_audio)?;

    let synthesizer = Synthesizer::new(&session, work_dir.path());
    let results = synthesizer.synthesize_all(&units, options.jobs);
    drop(session);

    let (synthesized, skipped) = partition_results(results)?;
    if synthesized.is_empty() {
        return Err(PipelineError::output(format!(
            "all {} units failed to synthesize; nothing to write",
            units.len()
        )));
    }

    let timed = accumulate(synthesized);
    for index in zero_width_units(&timed) {
        warn!(unit = index, "unit produced zero-length audio");
    }
    let expected = total_duration(&timed);
    info!(
        units = timed.len(),
        skipped = skipped.len(),
        duration = expected,
        "timeline accumulated"
    );

    let merged = merger::merge_units(&timed)
        .map_err(|err| PipelineError::output(format!("cannot merge unit audio: {err:#}")))?;
    let audio_stage = StagedFile::write_with(&paths.audio(), |file| {
        encoder::encode_to_writer(&merged, BufWriter::new(file))
    })?;
    let actual = decoder::measure_duration(audio_stage.staged_path())
        .map_err(|err| PipelineError::output(format!("cannot re-read merged audio: {err:#}")))?;
    if (actual - expected).abs() > options.merge_tolerance_seconds {
        return Err(PipelineError::Integrity {
            expected,
            actual,
            tolerance: options.merge_tolerance_seconds,
        });
    }

    let captions = subdivide_all(&timed, options.max_words_per_chunk, options.split_policy);
    let mut stages = vec![
        audio_stage,
        metadata::stage_unit_metadata(&paths.unit_metadata(), &timed)?,
        metadata::stage_caption_metadata(&paths.caption_metadata(), &captions)?,
    ];
    if options.write_srt {
        stages.push(metadata::stage_srt(&paths.srt(), &captions)?);
    }

    let mut written = persist_all(stages)?;
    let units = if options.keep_unit_audio {
        match keep_unit_audio(work_dir, &paths) {
            Ok(units_dir) => {
                written.push(units_dir.clone());
                relocate(timed, &units_dir)
            }
            Err(err) => {
                roll_back(&written);
                return Err(err);
            }
        }
    } else {
        timed
    };

    info!(
        captions = captions.len(),
        duration = actual,
        output = %paths.dir.display(),
        "run complete"
    );
    Ok(RunReport {
        units,
        captions,
        skipped,
        merged_duration: actual,
        written,
    })
}

fn partition_results(
    results: Vec<Result<SynthesizedUnit>>,
) -> Result<(Vec<SynthesizedUnit>, Vec<SkippedUnit>)> {
    let mut synthesized = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(unit) => synthesized.push(unit),
            Err(PipelineError::Synthesis { index, reason }) => {
                warn!(unit = index, %reason, "skipping unit that failed to synthesize");
                skipped.push(SkippedUnit { index, reason });
            }
            Err(other) => return Err(other),
        }
    }
    Ok((synthesized, skipped))
}

fn create_work_dir(paths: &OutputPaths, keep_unit_audio: bool) -> Result<TempDir> {
    let builder = {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".voicecue-units-");
        builder
    };
    let work_dir = if keep_unit_audio {
        // Same filesystem as the output so the final move is a rename
        fs::create_dir_all(&paths.dir).map_err(|err| {
            PipelineError::output(format!("cannot create {}: {err}", paths.dir.display()))
        })?;
        builder.tempdir_in(&paths.dir)
    } else {
        builder.tempdir()
    };
    work_dir.map_err(|err| PipelineError::output(format!("cannot create work directory: {err}")))
}

fn persist_all(stages: Vec<StagedFile>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(stages.len());
    for stage in stages {
        match stage.persist() {
            Ok(path) => written.push(path),
            Err(err) => {
                roll_back(&written);
                return Err(err);
            }
        }
    }
    Ok(written)
}

fn roll_back(written: &[PathBuf]) {
    for path in written {
        let removed = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        if let Err(err) = removed {
            warn!(path = %path.display(), error = %err, "failed to roll back output");
        }
    }
}

fn keep_unit_audio(work_dir: TempDir, paths: &OutputPaths) -> Result<PathBuf> {
    let units_dir = paths.units_dir();
    if units_dir.exists() {
        fs::remove_dir_all(&units_dir).map_err(|err| {
            PipelineError::output(format!("cannot replace {}: {err}", units_dir.display()))
        })?;
    }
    fs::rename(work_dir.path(), &units_dir).map_err(|err| {
        PipelineError::output(format!(
            "cannot move unit audio to {}: {err}",
            units_dir.display()
        ))
    })?;
    Ok(units_dir)
}

fn relocate(units: Vec<TimedUnit>, units_dir: &Path) -> Vec<TimedUnit> {
    units
        .into_iter()
        .map(|unit| {
            let audio_path = units_dir.join(unit.file_name());
            TimedUnit { audio_path, ..unit }
        })
        .collect()
}
