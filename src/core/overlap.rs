//! Overlap scoring.
//!
//! A column's raw overlap is the number of active inputs among its connected synapses. The raw
//! overlap is multiplied by the column's boost factor before inhibition, so columns that have been
//! idle get a better chance to win. Boost factors only move on learning cycles, so inference on the
//! same input always scores the same. Scoring never touches permanences or duty cycles.

use super::synapses::Synapses;

/// Raw and boosted overlap scores of the most recent compute cycle.
#[derive(Debug, Clone)]
pub struct Overlaps {
    raw: Vec<u32>,
    boosted: Vec<f32>,
}

impl Overlaps {
    pub fn new(num_columns: usize) -> Self {
        Self {
            raw: vec![0; num_columns],
            boosted: vec![0.0; num_columns],
        }
    }

    /// Recomputes every column's raw overlap against `active_inputs`.
    pub fn calculate(&mut self, synapses: &Synapses, active_inputs: &[bool]) {
        self.raw.iter_mut().enumerate().for_each(|(col, overlap)| {
            *overlap = synapses.overlap(col, active_inputs) as u32;
        });
    }

    /// Derives the scores used for inhibition: raw overlap times boost factor.
    pub fn boost(&mut self, boost_factors: &[f32]) {
        for ((boosted, &raw), &boost) in self.boosted.iter_mut().zip(&self.raw).zip(boost_factors) {
            *boosted = raw as f32 * boost;
        }
    }

    /// Whether a column's raw overlap clears the stimulus threshold. A zero overlap never does,
    /// so a column needs at least one active connected input.
    #[inline]
    pub fn is_stimulated(&self, column: usize, stimulus_threshold: f32) -> bool {
        let raw = self.raw[column];
        raw > 0 && raw as f32 >= stimulus_threshold
    }

    #[inline]
    pub fn raw(&self) -> &[u32] {
        &self.raw
    }

    #[inline]
    pub fn boosted(&self) -> &[f32] {
        &self.boosted
    }
}
