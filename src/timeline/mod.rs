use crate::types::{SynthesizedUnit, TimedUnit};

/// Pure left fold placing each unit directly after the previous one.
///
/// `start_0 = 0` and `start_i = end_{i-1}`; the input order is the timeline
/// order. A zero-length unit occupies a zero-width window without shifting
/// its neighbours.
pub fn accumulate(units: Vec<SynthesizedUnit>) -> Vec<TimedUnit> {
    units
        .into_iter()
        .scan(0.0_f64, |cursor, synthesized| {
            let start = *cursor;
            let end = start + synthesized.duration_seconds;
            *cursor = end;
            Some(TimedUnit {
                unit: synthesized.unit,
                audio_path: synthesized.audio_path,
                duration_seconds: synthesized.duration_seconds,
                start,
                end,
            })
        })
        .collect()
}

/// End of the last window, or zero for an empty timeline
pub fn total_duration(units: &[TimedUnit]) -> f64 {
    units.last().map_or(0.0, |unit| unit.end)
}

/// Indices of units whose window has no width
pub fn zero_width_units(units: &[TimedUnit]) -> Vec<usize> {
    units
        .iter()
        .filter(|unit| unit.duration_seconds <= f64::EPSILON)
        .map(TimedUnit::index)
        .collect()
}
