//! Script normalization ahead of segmentation.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{PipelineError, Result};

// Tags open with a name and never span lines, so stray `<` and `>` in prose survive
static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?[A-Za-z][^<>\n]*>").expect("tag regex is valid"));
static HORIZONTAL_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\u{A0}]+").expect("space regex is valid"));

/// Read a script file, refusing anything that is not clean UTF-8.
pub fn read_script(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|err| {
        PipelineError::input(format!("cannot read script {}: {err}", path.display()))
    })?;
    String::from_utf8(bytes).map_err(|err| {
        PipelineError::input(format!(
            "script {} is not valid UTF-8 (first bad byte at offset {})",
            path.display(),
            err.utf8_error().valid_up_to()
        ))
    })
}

/// Normalize raw script text.
///
/// Markup tags and `&nbsp;` entities are dropped, typographic quotes are
/// folded to ASCII and horizontal whitespace is collapsed. Blank lines are
/// kept because the segmenter treats them as sentence boundaries.
pub fn clean_script(raw: &str) -> Result<String> {
    if let Some((offset, c)) = raw
        .char_indices()
        .find(|&(_, c)| c == '\u{FFFD}' || (c.is_control() && !c.is_whitespace()))
    {
        return Err(PipelineError::input(format!(
            "script contains an encoding artifact U+{:04X} at byte {offset}",
            c as u32
        )));
    }

    let text = MARKUP_TAG.replace_all(raw, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace("\r\n", "\n");

    let lines: Vec<String> = text
        .lines()
        .map(|line| HORIZONTAL_SPACE.replace_all(line.trim(), " ").into_owned())
        .collect();
    Ok(lines.join("\n").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_and_entities() {
        let cleaned = clean_script("<p>Breaking&nbsp;news:</p>  <b>AI</b>   wins.").unwrap();
        assert_eq!(cleaned, "Breaking news: AI wins.");
    }

    #[test]
    fn comparison_signs_are_not_markup() {
        assert_eq!(clean_script("a < b.\n\nc > d.").unwrap(), "a < b.\n\nc > d.");
        assert_eq!(
            clean_script("Temperatures < 0 today.\n\nMarkets > expectations.").unwrap(),
            "Temperatures < 0 today.\n\nMarkets > expectations."
        );
    }

    #[test]
    fn strips_closing_and_self_closing_tags() {
        let cleaned = clean_script("Line one.<br/> <em>Line</em> two.").unwrap();
        assert_eq!(cleaned, "Line one. Line two.");
    }

    #[test]
    fn folds_typographic_quotes() {
        let cleaned = clean_script("\u{201C}It\u{2019}s here,\u{201D} she said.").unwrap();
        assert_eq!(cleaned, "\"It's here,\" she said.");
    }

    #[test]
    fn keeps_paragraph_breaks() {
        let cleaned = clean_script("  Hook line  \r\n\r\n  Body   text. \n").unwrap();
        assert_eq!(cleaned, "Hook line\n\nBody text.");
    }

    #[test]
    fn rejects_replacement_characters() {
        let err = clean_script("Caf\u{FFFD} opens today.").unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
    }

    #[test]
    fn rejects_control_characters() {
        assert!(clean_script("Hello\u{0}world").is_err());
    }

    #[test]
    fn read_script_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.txt");
        std::fs::write(&path, [b'H', b'i', 0xFF, b'!']).unwrap();

        let err = read_script(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
        assert!(err.to_string().contains("offset 2"));
    }

    #[test]
    fn read_script_reports_missing_file() {
        let err = read_script(Path::new("/nonexistent/script.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::Input(_)));
    }
}
