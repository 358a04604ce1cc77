//! Caption sub-division of timed units.
//!
//! Each unit's text is cut into contiguous word groups and the unit's window
//! is partitioned across them. The engine gives no word-level timing, so the
//! split assumes a uniform speaking rate inside a unit; [`SplitPolicy`]
//! controls how the duration is weighted.

use crate::types::{CaptionChunk, SplitPolicy, TimedUnit};

/// Split one unit into caption chunks of at most `max_words` words.
///
/// The chunks cover `[unit.start, unit.end]` with no gaps, and the last
/// chunk ends at `unit.end` exactly rather than at an accumulated sum.
pub fn subdivide(unit: &TimedUnit, max_words: usize, policy: SplitPolicy) -> Vec<CaptionChunk> {
    let words: Vec<&str> = unit.text().split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let groups: Vec<&[&str]> = words.chunks(max_words.max(1)).collect();
    let n = groups.len();
    let weights = group_weights(&groups, policy);
    let total_weight: f64 = weights.iter().sum();
    let duration = unit.end - unit.start;

    let step = duration / n as f64;

    let mut chunks = Vec::with_capacity(n);
    let mut cursor = unit.start;
    let mut elapsed_weight = 0.0;
    for (i, group) in groups.iter().enumerate() {
        elapsed_weight += weights[i];
        let start = match policy {
            SplitPolicy::Equal => unit.start + i as f64 * step,
            SplitPolicy::Words | SplitPolicy::Characters => cursor,
        };
        let end = if i + 1 == n {
            unit.end
        } else {
            match policy {
                SplitPolicy::Equal => start + step,
                SplitPolicy::Words | SplitPolicy::Characters => {
                    unit.start + duration * (elapsed_weight / total_weight)
                }
            }
        };
        cursor = end;
        chunks.push(CaptionChunk {
            text: group.join(" "),
            start,
            end,
            duration: end - start,
        });
    }
    chunks
}

/// Sub-divide every unit, keeping unit order
pub fn subdivide_all(
    units: &[TimedUnit],
    max_words: usize,
    policy: SplitPolicy,
) -> Vec<CaptionChunk> {
    units
        .iter()
        .flat_map(|unit| subdivide(unit, max_words, policy))
        .collect()
}

fn group_weights(groups: &[&[&str]], policy: SplitPolicy) -> Vec<f64> {
    let weights: Vec<f64> = groups
        .iter()
        .map(|group| match policy {
            SplitPolicy::Equal => 1.0,
            SplitPolicy::Words => group.len() as f64,
            SplitPolicy::Characters => group.iter().map(|w| w.chars().count()).sum::<usize>() as f64,
        })
        .collect();
    // Fall back to an equal split if every weight is zero
    if weights.iter().sum::<f64>() <= 0.0 {
        return vec![1.0; groups.len()];
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpeechUnit;
    use approx::assert_abs_diff_eq;

    fn timed(text: &str, start: f64, end: f64) -> TimedUnit {
        TimedUnit {
            unit: SpeechUnit {
                text: text.to_string(),
                index: 0,
            },
            audio_path: "unit_0000.wav".into(),
            duration_seconds: end - start,
            start,
            end,
        }
    }

    fn assert_partition(unit: &TimedUnit, chunks: &[CaptionChunk]) {
        assert_eq!(chunks.first().unwrap().start, unit.start);
        assert_eq!(chunks.last().unwrap().end, unit.end);
        for pair in chunks.windows(2) {
            assert_abs_diff_eq!(pair[1].start, pair[0].end, epsilon = 1e-9);
        }
        for chunk in chunks {
            assert!(chunk.start >= unit.start && chunk.end <= unit.end);
        }
        let total: f64 = chunks.iter().map(|c| c.duration).sum();
        assert_abs_diff_eq!(total, unit.duration_seconds, epsilon = 0.01);
    }

    #[test]
    fn equal_split_of_seven_words_in_threes() {
        let unit = timed("one two three four five six seven", 10.0, 17.0);
        let chunks = subdivide(&unit, 3, SplitPolicy::Equal);

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one two three", "four five six", "seven"]);
        for chunk in &chunks {
            assert_abs_diff_eq!(chunk.duration, 7.0 / 3.0, epsilon = 1e-9);
        }
        assert_eq!(chunks[2].end, 17.0);
        assert_partition(&unit, &chunks);
    }

    #[test]
    fn word_weighted_split() {
        let unit = timed("one two three four five six seven", 0.0, 7.0);
        let chunks = subdivide(&unit, 3, SplitPolicy::Words);

        assert_abs_diff_eq!(chunks[0].duration, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(chunks[1].duration, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(chunks[2].duration, 1.0, epsilon = 1e-9);
        assert_partition(&unit, &chunks);
    }

    #[test]
    fn character_weighted_split() {
        let unit = timed("a bb cccc dddddddd", 1.0, 4.0);
        let chunks = subdivide(&unit, 2, SplitPolicy::Characters);

        // 3 characters vs 12 characters
        assert_abs_diff_eq!(chunks[0].duration, 0.6, epsilon = 1e-9);
        assert_abs_diff_eq!(chunks[1].duration, 2.4, epsilon = 1e-9);
        assert_partition(&unit, &chunks);
    }

    #[test]
    fn short_unit_is_a_single_chunk() {
        let unit = timed("Hello there.", 2.5, 3.25);
        let chunks = subdivide(&unit, 7, SplitPolicy::Equal);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello there.");
        assert_eq!((chunks[0].start, chunks[0].end), (2.5, 3.25));
    }

    #[test]
    fn last_chunk_end_is_exact_for_awkward_durations() {
        let unit = timed(
            "the quick brown fox jumps over the lazy dog again and again",
            0.1,
            0.1 + 3.3,
        );
        for policy in [SplitPolicy::Equal, SplitPolicy::Words, SplitPolicy::Characters] {
            let chunks = subdivide(&unit, 2, policy);
            assert_eq!(chunks.len(), 6);
            assert_partition(&unit, &chunks);
        }
    }

    #[test]
    fn zero_duration_unit_yields_zero_width_chunks() {
        let unit = timed("nothing was said here", 4.0, 4.0);
        let chunks = subdivide(&unit, 2, SplitPolicy::Equal);

        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.start == 4.0 && c.end == 4.0));
    }

    #[test]
    fn zero_max_words_is_treated_as_one() {
        let unit = timed("a b c", 0.0, 3.0);
        assert_eq!(subdivide(&unit, 0, SplitPolicy::Equal).len(), 3);
    }

    #[test]
    fn subdivide_all_keeps_unit_order() {
        let units = vec![timed("first unit words", 0.0, 1.0), timed("second", 1.0, 2.0)];
        let chunks = subdivide_all(&units, 2, SplitPolicy::Equal);

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first unit", "words", "second"]);
        assert_eq!(chunks[1].end, 1.0);
        assert_eq!(chunks[2].start, 1.0);
    }
}
