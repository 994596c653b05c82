//! Homeostasis keeps every column in the game.
//!
//! What are duty cycles?
//! - They are rolling metrics that measure how often each column is meeting certain criteria over time.
//! - The SP tracks: overlap duty cycles (ODC) and active duty cycles (ADC).
//! - ODC tracks how frequently a column has an overlap that clears the stimulus threshold.
//! - ADC tracks how frequently a column is chosen as a winner after inhibition.
//! - Periodically each column derives minimum acceptable duty cycles from the maxima in its neighborhood.
//! - A column below its minimum ADC gets its overlap boosted; below its minimum ODC it gets its permanences bumped.

use super::inhibition::Neighborhoods;

/// Rolling average update: `new = (old * (period - 1) + sample) / period`.
///
/// Passing `min(learning iterations, duty cycle period)` as `period` gives the exact mean
/// until the window has filled.
pub fn update_duty_cycles(duty_cycles: &mut [f32], samples: &[bool], period: u32) {
    let period = period.max(1) as f32;
    duty_cycles
        .iter_mut()
        .zip(samples)
        .for_each(|(duty, &sample)| {
            *duty = (*duty * (period - 1.0) + if sample { 1.0 } else { 0.0 }) / period;
        });
}

/// Boost for a column's active duty cycle: `1.0` once it reaches `min_active`, `max_boost` at zero,
/// linear in between.
#[inline]
pub fn boost_factor(active: f32, min_active: f32, max_boost: f32) -> f32 {
    if active >= min_active {
        1.0
    } else {
        ((1.0 - max_boost) / min_active) * active + max_boost
    }
}

/// Sets every column's minimum to `percentage` of the largest duty cycle overall.
pub fn min_duty_cycles_global(duty_cycles: &[f32], percentage: f32, into: &mut [f32]) {
    let max = duty_cycles.iter().fold(0.0, |acc: f32, &x| acc.max(x));
    into.fill(percentage * max);
}

/// Sets each column's minimum to `percentage` of the largest duty cycle in its neighborhood.
pub fn min_duty_cycles_local(
    duty_cycles: &[f32],
    percentage: f32,
    neighborhoods: &Neighborhoods,
    into: &mut [f32],
) {
    into.iter_mut().enumerate().for_each(|(col, min)| {
        let max = neighborhoods
            .of(col)
            .iter()
            .fold(0.0, |acc: f32, &n| acc.max(duty_cycles[n]));
        *min = percentage * max;
    });
}
