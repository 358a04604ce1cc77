//! Timeline metadata serialization.
//!
//! Records are written in input order with no sorting or deduplication, and
//! an empty record list is refused: the caption renderer downstream would
//! have nothing to show.

mod srt;
mod staged;

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::{CaptionChunk, TimedUnit};

pub use srt::format_timestamp;
pub use staged::StagedFile;

/// Unit-level record: `{"text","file","start","end","duration"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub text: String,
    pub file: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

impl From<&TimedUnit> for UnitRecord {
    fn from(unit: &TimedUnit) -> Self {
        Self {
            text: unit.text().to_string(),
            file: unit.file_name(),
            start: unit.start,
            end: unit.end,
            duration: unit.duration_seconds,
        }
    }
}

/// Caption-level record: `{"text","start","end"}` plus optional duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub text: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl From<&CaptionChunk> for CaptionRecord {
    fn from(chunk: &CaptionChunk) -> Self {
        Self {
            text: chunk.text.clone(),
            start: chunk.start,
            end: chunk.end,
            duration: Some(chunk.duration),
        }
    }
}

pub fn stage_unit_metadata(path: &Path, units: &[TimedUnit]) -> Result<StagedFile> {
    let records: Vec<UnitRecord> = units.iter().map(UnitRecord::from).collect();
    stage_records(path, &records, "unit")
}

pub fn stage_caption_metadata(path: &Path, chunks: &[CaptionChunk]) -> Result<StagedFile> {
    let records: Vec<CaptionRecord> = chunks.iter().map(CaptionRecord::from).collect();
    stage_records(path, &records, "caption")
}

pub fn stage_srt(path: &Path, chunks: &[CaptionChunk]) -> Result<StagedFile> {
    ensure_records(chunks.len(), "caption", path)?;
    StagedFile::write_with(path, |file| {
        let mut writer = BufWriter::new(file);
        srt::write_cues(&mut writer, chunks)?;
        writer.flush().context("Failed to flush SRT cues")?;
        Ok(())
    })
}

/// Write unit-level metadata as a JSON array
pub fn write_unit_metadata(path: &Path, units: &[TimedUnit]) -> Result<PathBuf> {
    stage_unit_metadata(path, units)?.persist()
}

/// Write caption-level metadata as a JSON array
pub fn write_caption_metadata(path: &Path, chunks: &[CaptionChunk]) -> Result<PathBuf> {
    stage_caption_metadata(path, chunks)?.persist()
}

/// Write caption chunks as a SubRip file
pub fn write_srt(path: &Path, chunks: &[CaptionChunk]) -> Result<PathBuf> {
    stage_srt(path, chunks)?.persist()
}

/// Load caption records back, e.g. for a renderer or a test
pub fn read_caption_metadata(path: &Path) -> anyhow::Result<Vec<CaptionRecord>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read caption metadata {}", path.display()))?;
    serde_json::from_str(&data).context("Failed to parse caption metadata JSON")
}

/// Load unit records back
pub fn read_unit_metadata(path: &Path) -> anyhow::Result<Vec<UnitRecord>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read unit metadata {}", path.display()))?;
    serde_json::from_str(&data).context("Failed to parse unit metadata JSON")
}

fn stage_records<T: Serialize>(path: &Path, records: &[T], kind: &str) -> Result<StagedFile> {
    ensure_records(records.len(), kind, path)?;
    StagedFile::write_with(path, |file| {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)
            .with_context(|| format!("Failed to serialize {kind} records"))?;
        writer.flush().context("Failed to flush metadata")?;
        Ok(())
    })
}

fn ensure_records(count: usize, kind: &str, path: &Path) -> Result<()> {
    if count == 0 {
        return Err(PipelineError::output(format!(
            "refusing to write empty {kind} metadata to {}",
            path.display()
        )));
    }
    Ok(())
}
