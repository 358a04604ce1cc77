pub mod cleaner;
mod sentences;


pub use cleaner::{clean_script, read_script};
pub use sentences::split_sentences;

use crate::types::{SpeechUnit, UnitPolicy};

/// Pure function splitting script text into ordered speech units.
///
/// Under [`UnitPolicy::CharBudget`] consecutive sentences are packed while
/// `len(current) + len(next) <= budget` (character counts). A sentence is
/// never split: one longer than the budget becomes its own unit. Empty or
/// whitespace-only input yields no units.
pub fn segment(script: &str, policy: UnitPolicy, language: &str) -> Vec<SpeechUnit> {
    let sentences = split_sentences(script, language);
    let texts = match policy {
        UnitPolicy::Sentence => sentences,
        UnitPolicy::CharBudget(budget) => pack_sentences(sentences, budget),
    };

    texts
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .enumerate()
        .map(|(index, text)| SpeechUnit { text, index })
        .collect()
}

fn pack_sentences(sentences: Vec<String>, budget: usize) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences {
        let sentence_len = sentence.chars().count();
        if current.is_empty() {
            current = sentence;
            current_len = sentence_len;
            continue;
        }
        if current_len + sentence_len <= budget {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + sentence_len;
        } else {
            units.push(std::mem::replace(&mut current, sentence));
            current_len = sentence_len;
        }
    }
    if !current.is_empty() {
        units.push(current);
    }
    units
}
