use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{PipelineError, Result};

/// An output written to a temp file next to its destination.
///
/// Nothing is visible at `destination` until [`StagedFile::persist`]; a
/// dropped stage deletes its temp file.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    pub fn create(destination: &Path) -> Result<Self> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|err| {
            PipelineError::output(format!("cannot create {}: {err}", parent.display()))
        })?;
        // Keep the extension so format probing works on the staged copy
        let suffix = destination
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix(".voicecue-")
            .suffix(&suffix)
            .tempfile_in(parent)
            .map_err(|err| {
                PipelineError::output(format!(
                    "cannot stage {} in {}: {err}",
                    destination.display(),
                    parent.display()
                ))
            })?;
        Ok(Self {
            temp,
            destination: destination.to_path_buf(),
        })
    }

    /// Stage `write` output, flushing it before returning
    pub fn write_with<F>(destination: &Path, write: F) -> Result<Self>
    where
        F: FnOnce(&mut std::fs::File) -> anyhow::Result<()>,
    {
        let mut staged = Self::create(destination)?;
        let label = destination.display().to_string();
        write(staged.temp.as_file_mut())
            .and_then(|()| Ok(staged.temp.as_file_mut().flush()?))
            .map_err(|err| PipelineError::output(format!("cannot write {label}: {err:#}")))?;
        Ok(staged)
    }

    /// Path of the staged (not yet persisted) data
    pub fn staged_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Move the staged data to its destination
    pub fn persist(self) -> Result<PathBuf> {
        let destination = self.destination;
        self.temp.persist(&destination).map_err(|err| {
            PipelineError::output(format!("cannot persist {}: {}", destination.display(), err.error))
        })?;
        Ok(destination)
    }
}
