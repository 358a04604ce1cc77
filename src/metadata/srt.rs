use std::io::Write;

use anyhow::Result;

use crate::types::CaptionChunk;

/// Render caption chunks as SubRip cues numbered from 1
pub fn write_cues<W: Write>(out: &mut W, chunks: &[CaptionChunk]) -> Result<()> {
    for (i, chunk) in chunks.iter().enumerate() {
        writeln!(out, "{}", i + 1)?;
        writeln!(
            out,
            "{} --> {}",
            format_timestamp(chunk.start),
            format_timestamp(chunk.end)
        )?;
        writeln!(out, "{}", chunk.text)?;
        writeln!(out)?;
    }
    Ok(())
}

/// `HH:MM:SS,mmm`, rounded to the nearest millisecond
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let m = (total_sec / 60) % 60;
    let h = total_sec / 3600;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
