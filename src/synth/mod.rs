//! Speech synthesis adapters.
//!
//! A [`VoiceEngine`] renders one text unit to one audio file. The pipeline
//! opens it once per run through an [`EngineSession`], renders every unit
//! through a [`Synthesizer`], and the session releases the engine when it
//! goes out of scope, including on early returns.

pub mod command;
pub mod preview;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::audio::decoder;
use crate::error::{PipelineError, Result};
use crate::types::{SpeechUnit, SynthesizedUnit};

pub use command::CommandEngine;
pub use preview::PreviewEngine;

/// Voice selection for a run: a model/reference-audio path or identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub reference: String,
    pub language: String,
}

impl VoiceProfile {
    pub fn new(reference: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            language: language.into(),
        }
    }

    /// Require the reference to be an existing, non-empty file
    pub fn require_file(&self) -> Result<&Path> {
        let path = Path::new(&self.reference);
        if self.reference.trim().is_empty() {
            return Err(PipelineError::configuration("voice profile reference is empty"));
        }
        let metadata = std::fs::metadata(path).map_err(|err| {
            PipelineError::configuration(format!(
                "voice profile {} is not accessible: {err}",
                path.display()
            ))
        })?;
        if !metadata.is_file() || metadata.len() == 0 {
            return Err(PipelineError::configuration(format!(
                "voice profile {} is not a non-empty file",
                path.display()
            )));
        }
        Ok(path)
    }
}

/// External text-to-speech backend.
///
/// `render` takes `&self` so units can be rendered concurrently; anything
/// heavyweight (model handles, server processes) belongs in `prepare`.
pub trait VoiceEngine: Sync {
    fn name(&self) -> &str;

    /// File extension of the artifacts `render` writes
    fn extension(&self) -> &str {
        "wav"
    }

    /// Validate the profile and acquire run-scoped resources.
    ///
    /// Must fail with [`PipelineError::Configuration`] when the profile can
    /// never work, so the run aborts before any unit is rendered.
    fn prepare(&mut self, profile: &VoiceProfile) -> Result<()>;

    /// Write speech for `text` to `output`
    fn render(&self, text: &str, profile: &VoiceProfile, output: &Path) -> anyhow::Result<()>;

    fn release(&mut self) {}
}

/// An engine prepared for one run; released on drop
pub struct EngineSession<'e, E: VoiceEngine + ?Sized> {
    engine: &'e mut E,
    profile: VoiceProfile,
}

impl<'e, E: VoiceEngine + ?Sized> EngineSession<'e, E> {
    pub fn open(engine: &'e mut E, profile: VoiceProfile) -> Result<Self> {
        if let Err(err) = engine.prepare(&profile) {
            engine.release();
            return Err(err);
        }
        info!(engine = engine.name(), voice = %profile.reference, "voice engine prepared");
        Ok(Self { engine, profile })
    }

    pub fn engine(&self) -> &E {
        &*self.engine
    }

    pub fn profile(&self) -> &VoiceProfile {
        &self.profile
    }
}

impl<E: VoiceEngine + ?Sized> Drop for EngineSession<'_, E> {
    fn drop(&mut self) {
        debug!(engine = self.engine.name(), "releasing voice engine");
        self.engine.release();
    }
}

/// Renders units into `work_dir` and measures what was written
pub struct Synthesizer<'s, 'e, E: VoiceEngine + ?Sized> {
    session: &'s EngineSession<'e, E>,
    work_dir: PathBuf,
}

impl<'s, 'e, E: VoiceEngine + ?Sized> Synthesizer<'s, 'e, E> {
    pub fn new(session: &'s EngineSession<'e, E>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            work_dir: work_dir.into(),
        }
    }

    /// Artifact path for a unit, named by its segmentation index
    pub fn artifact_path(&self, index: usize) -> PathBuf {
        let extension = self.session.engine().extension();
        self.work_dir.join(format!("unit_{index:04}.{extension}"))
    }

    /// Render one unit and measure its decoded duration.
    ///
    /// Engine failures, missing or empty files and undecodable audio all
    /// surface as [`PipelineError::Synthesis`] for this unit.
    pub fn synthesize(&self, unit: &SpeechUnit) -> Result<SynthesizedUnit> {
        let path = self.artifact_path(unit.index);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|err| PipelineError::synthesis(unit.index, &err.into()))?;
        }

        self.session
            .engine()
            .render(&unit.text, self.session.profile(), &path)
            .map_err(|err| PipelineError::synthesis(unit.index, &err))?;

        let duration_seconds = decoder::measure_duration(&path)
            .map_err(|err| PipelineError::synthesis(unit.index, &err))?;
        debug!(
            unit = unit.index,
            duration = duration_seconds,
            file = %path.display(),
            "unit synthesized"
        );

        Ok(SynthesizedUnit {
            unit: unit.clone(),
            audio_path: path,
            duration_seconds,
        })
    }

    /// Render every unit, returning results in unit order.
    ///
    /// With `jobs > 1` units are dispatched on a thread pool; results are
    /// still collected in input order, so the timeline fold is unaffected.
    pub fn synthesize_all(&self, units: &[SpeechUnit], jobs: usize) -> Vec<Result<SynthesizedUnit>> {
        if jobs <= 1 || units.len() <= 1 {
            return units.iter().map(|unit| self.synthesize(unit)).collect();
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("voicecue-synth-{i}"))
            .build()
        {
            Ok(pool) => {
                info!(jobs, units = units.len(), "synthesizing units in parallel");
                pool.install(|| units.par_iter().map(|unit| self.synthesize(unit)).collect())
            }
            Err(err) => {
                warn!(error = %err, "failed to build synthesis thread pool; rendering sequentially");
                units.iter().map(|unit| self.synthesize(unit)).collect()
            }
        }
    }
}
