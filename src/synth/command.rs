//! Text-to-speech through an external program such as Piper.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context};
use tracing::debug;

use super::{VoiceEngine, VoiceProfile};
use crate::error::{PipelineError, Result};

const STDERR_TAIL_CHARS: usize = 400;

/// Runs one process per unit.
///
/// Argument templates may contain `{text}`, `{output}`, `{voice}` and
/// `{language}`. With `stdin_text` the unit text is also piped to the
/// process, which is how Piper reads its input.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
    stdin_text: bool,
    extension: String,
    resolved: Option<PathBuf>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            stdin_text: false,
            extension: "wav".to_string(),
            resolved: None,
        }
    }

    /// `piper --model {voice} --output_file {output}` with text on stdin
    pub fn piper() -> Self {
        Self::new("piper", default_piper_args()).with_stdin_text(true)
    }

    pub fn with_stdin_text(mut self, stdin_text: bool) -> Self {
        self.stdin_text = stdin_text;
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn expand_args(&self, text: &str, profile: &VoiceProfile, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{output}", &output)
                    .replace("{voice}", &profile.reference)
                    .replace("{language}", &profile.language)
                    .replace("{text}", text)
            })
            .collect()
    }
}

pub fn default_piper_args() -> Vec<String> {
    ["--model", "{voice}", "--output_file", "{output}"]
        .iter()
        .map(|arg| arg.to_string())
        .collect()
}

impl VoiceEngine for CommandEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn prepare(&mut self, profile: &VoiceProfile) -> Result<()> {
        if !self.args.iter().any(|arg| arg.contains("{output}")) {
            return Err(PipelineError::configuration(format!(
                "arguments for {} never mention {{output}}",
                self.program
            )));
        }
        if !self.stdin_text && !self.args.iter().any(|arg| arg.contains("{text}")) {
            return Err(PipelineError::configuration(format!(
                "{} receives no text: enable stdin_text or use {{text}} in its arguments",
                self.program
            )));
        }
        profile.require_file()?;
        let resolved = which::which(&self.program).map_err(|err| {
            PipelineError::configuration(format!(
                "TTS program {} not found: {err}",
                self.program
            ))
        })?;
        debug!(program = %resolved.display(), "resolved TTS program");
        self.resolved = Some(resolved);
        Ok(())
    }

    fn render(&self, text: &str, profile: &VoiceProfile, output: &Path) -> anyhow::Result<()> {
        let program = self
            .resolved
            .as_deref()
            .context("command engine used before prepare")?;
        let mut child = Command::new(program)
            .args(self.expand_args(text, profile, output))
            .stdin(if self.stdin_text {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", program.display()))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A process that exits without reading is judged by its status below
            if let Err(err) = stdin.write_all(text.as_bytes()) {
                if err.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(err).context("Failed to send text to TTS process");
                }
            }
        }

        let result = child
            .wait_with_output()
            .context("Failed to wait for TTS process")?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let tail: String = {
                let trimmed = stderr.trim();
                let skip = trimmed.chars().count().saturating_sub(STDERR_TAIL_CHARS);
                trimmed.chars().skip(skip).collect()
            };
            bail!("{} exited with {}: {}", self.program, result.status, tail);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.resolved = None;
    }
}
