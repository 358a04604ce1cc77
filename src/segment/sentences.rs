use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("paragraph regex is valid"));

const ENGLISH_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd", "jr", "sr",
    "co", "corp", "no", "approx", "u.s", "u.k",
];
const GERMAN_ABBREVIATIONS: &[&str] = &[
    "z.b", "bzw", "usw", "dr", "nr", "ca", "vgl", "d.h", "u.a", "prof", "str",
];
const FRENCH_ABBREVIATIONS: &[&str] = &["m", "mme", "mlle", "dr", "etc", "p.ex", "av", "bd"];
const SPANISH_ABBREVIATIONS: &[&str] = &["sr", "sra", "srta", "dr", "dra", "etc", "ud", "uds", "p.ej"];

const CLOSERS: &[char] = &['"', '\'', '\u{201D}', '\u{2019}', ')', ']', '}', '\u{BB}'];

fn abbreviations_for(language: &str) -> &'static [&'static str] {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "de" => GERMAN_ABBREVIATIONS,
        "fr" => FRENCH_ABBREVIATIONS,
        "es" => SPANISH_ABBREVIATIONS,
        _ => ENGLISH_ABBREVIATIONS,
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\u{2026}' | '\u{3002}' | '\u{FF01}' | '\u{FF1F}')
}

fn is_cjk_terminal(c: char) -> bool {
    matches!(c, '\u{3002}' | '\u{FF01}' | '\u{FF1F}')
}

/// Split text into grammatical sentences.
///
/// Blank lines always end a sentence. Inside a paragraph a sentence ends
/// after a run of terminal punctuation (plus closing quotes or brackets)
/// that is followed by whitespace, unless the period closes a known
/// abbreviation for `language`, a single-letter initial, or is followed by
/// a lowercase word.
pub fn split_sentences(text: &str, language: &str) -> Vec<String> {
    let abbreviations = abbreviations_for(language);
    PARAGRAPH_BREAK
        .split(text)
        .flat_map(|paragraph| split_paragraph(paragraph, abbreviations))
        .collect()
}

fn split_paragraph(paragraph: &str, abbreviations: &[&str]) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        current.push(c);
        i += 1;
        if !is_terminal(c) {
            continue;
        }

        let mut only_period = c == '.';
        let mut cjk = is_cjk_terminal(c);
        while i < chars.len() && (is_terminal(chars[i]) || CLOSERS.contains(&chars[i])) {
            only_period &= chars[i] == '.' || CLOSERS.contains(&chars[i]);
            cjk |= is_cjk_terminal(chars[i]);
            current.push(chars[i]);
            i += 1;
        }

        let at_end = i >= chars.len();
        if !at_end && !cjk && !chars[i].is_whitespace() {
            continue;
        }
        if only_period && !at_end && !ends_sentence(&current, &chars[i..], abbreviations) {
            continue;
        }
        push_sentence(&mut sentences, &current);
        current.clear();
    }
    push_sentence(&mut sentences, &current);
    sentences
}

/// Decide whether a trailing period really closes the sentence
fn ends_sentence(current: &str, rest: &[char], abbreviations: &[&str]) -> bool {
    let body = current.trim_end_matches(|c: char| c == '.' || CLOSERS.contains(&c));
    let mut tokens = body.split_whitespace().rev();
    let word = strip_leading_punctuation(tokens.next().unwrap_or_default());

    if is_name_initial(word, tokens.next()) {
        return false;
    }
    if abbreviations.contains(&word.to_lowercase().as_str()) {
        return false;
    }

    let next_word_start = rest.iter().find(|c| !c.is_whitespace());
    !matches!(next_word_start, Some(c) if c.is_lowercase())
}

/// A lone capital is an initial only when it follows another name part
/// ("John F.", "J. R.") or opens the sentence; "plan B." and "I." end one.
fn is_name_initial(word: &str, previous: Option<&str>) -> bool {
    let mut letters = word.chars();
    let single_capital =
        matches!((letters.next(), letters.next()), (Some(c), None) if c.is_uppercase());
    if !single_capital || word == "I" {
        return false;
    }
    previous.map_or(true, |token| {
        strip_leading_punctuation(token)
            .chars()
            .next()
            .is_some_and(char::is_uppercase)
    })
}

fn strip_leading_punctuation(token: &str) -> &str {
    token.trim_start_matches(|c: char| !c.is_alphanumeric())
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        sentences.push(normalized);
    }
}

#[cfg(test)]
mod tests {
    use super::split_sentences;

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("Hello world. This is a test! Is it? Yes.", "en");
        assert_eq!(
            sentences,
            vec!["Hello world.", "This is a test!", "Is it?", "Yes."]
        );
    }

    #[test]
    fn keeps_english_abbreviations_and_initials() {
        let sentences = split_sentences(
            "Dr. Smith met John F. Doe at 5 p.m. today. They talked, e.g. about AI.",
            "en-US",
        );
        assert_eq!(
            sentences,
            vec![
                "Dr. Smith met John F. Doe at 5 p.m. today.",
                "They talked, e.g. about AI."
            ]
        );
    }

    #[test]
    fn chained_initials_stay_together() {
        let sentences = split_sentences("J. R. R. Tolkien wrote it. Fans agree.", "en");
        assert_eq!(sentences, vec!["J. R. R. Tolkien wrote it.", "Fans agree."]);
    }

    #[test]
    fn lone_capitals_after_lowercase_words_end_sentences() {
        assert_eq!(
            split_sentences("We chose plan B. Then we left.", "en"),
            vec!["We chose plan B.", "Then we left."]
        );
        assert_eq!(
            split_sentences("So did I. Everyone cheered.", "en"),
            vec!["So did I.", "Everyone cheered."]
        );
    }

    #[test]
    fn uses_language_specific_abbreviations() {
        let text = "Das ist z.B. ein Test. Noch einer.";
        assert_eq!(
            split_sentences(text, "de"),
            vec!["Das ist z.B. ein Test.", "Noch einer."]
        );
    }

    #[test]
    fn blank_lines_end_sentences() {
        let text = "\u{1F6A8} Big AI news\n\nA lab shipped a model today.\n\nFollow for more";
        assert_eq!(
            split_sentences(text, "en"),
            vec![
                "\u{1F6A8} Big AI news",
                "A lab shipped a model today.",
                "Follow for more"
            ]
        );
    }

    #[test]
    fn keeps_closing_quotes_with_sentence() {
        let sentences = split_sentences("He said \"stop.\" Then he left...", "en");
        assert_eq!(sentences, vec!["He said \"stop.\"", "Then he left..."]);
    }

    #[test]
    fn decimals_do_not_split() {
        let sentences = split_sentences("Version 3.5 shipped. It is fast.", "en");
        assert_eq!(sentences, vec!["Version 3.5 shipped.", "It is fast."]);
    }

    #[test]
    fn cjk_full_stops_split_without_spaces() {
        let sentences = split_sentences("今天很好。明天见！", "zh");
        assert_eq!(sentences, vec!["今天很好。", "明天见！"]);
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(split_sentences("  \n\n \t ", "en").is_empty());
    }
}
