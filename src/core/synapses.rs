//! A `Synapse` models a single connection between a column and an input bit.
//! Each synapse links exactly one input index to one column.
//!
//! If the permanence is at or above the connected threshold, the synapse is considered "connected".
//! During learning, permanence increases or decreases depending on whether the corresponding
//! input bit was active. A connected synapse counts toward the column's overlap score.
//!
//! The centralized `Synapses` struct is a pool that stores all synapses for all columns
//! in a single contiguous vec. Each column's synapses occupy a contiguous subrange
//! within this array, and the column's potential pool sits in a parallel block of the same stride.
//!
//! A column's potential pool never changes. Its stored synapses are a subset of the pool:
//! whenever a permanence falls to or below the trim threshold, the synapse is dropped from the
//! column's block and never comes back. Dropped synapses read as permanence 0.
//!
//! Within a block, connected synapses are kept at the front so overlap scoring only touches them.

use rand::Rng;
use std::ops::Range;

/// A synapse connecting an input index with an associated permanence value.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Synapse {
    /// Points to which input bit this synapse connects to.
    pub index: usize,

    /// Represents the strength of the connection between the synapse and the input bit.
    pub permanence: f32,
}

/// Options governing how synapse permanence is adjusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapsePermanenceOptions {
    pub inactive_decrement: f32,
    pub active_increment: f32,
    pub connected: f32,
    pub below_stimulus_increment: f32,
    pub min: f32,
    pub max: f32,
    pub trim_threshold: f32,
}

impl SynapsePermanenceOptions {
    /// Draws one initial permanence. With probability `connected_percentage` the value lands in
    /// `[connected, connected + active_increment)`, otherwise in `[connected - active_increment, connected)`.
    /// Values at or below the trim threshold come back as 0.
    pub fn initial_permanence<R: Rng>(&self, connected_percentage: f32, rng: &mut R) -> f32 {
        let spread = self.active_increment;
        let permanence = if rng.random::<f32>() <= connected_percentage {
            rng.random_range(self.connected..self.connected + spread)
        } else {
            rng.random_range(self.connected - spread..self.connected)
        }
        .clamp(self.min, self.max);

        if permanence > self.trim_threshold {
            permanence
        } else {
            0.0
        }
    }
}

/// A flat pool of potential synapses for all columns.
/// Each column is allotted a contiguous region in the internal synapse and potential vectors.
#[derive(Debug, Clone)]
pub struct Synapses {
    /// All stored synapses for each column.
    synapses: Vec<Synapse>,

    /// The fixed potential pool of each column, sorted ascending.
    potential: Vec<usize>,

    /// The size of each column's potential pool.
    potential_count_per_column: Vec<usize>,

    /// The number of synapses stored for each column.
    synapse_count_per_column: Vec<usize>,

    /// The number of connected synapses for each column after pivot sorting.
    connected_synapse_count_per_column: Vec<usize>,

    /// The maximum number of synapses allowed per column.
    max_synapses_per_column: usize,
}

impl Synapses {
    /// Creates a new synapse pool for `num_columns` columns with capacity `max_potential` per column.
    pub fn new(num_columns: usize, max_potential: usize) -> Self {
        Self {
            synapses: vec![Synapse::default(); num_columns * max_potential],
            potential: vec![0; num_columns * max_potential],
            potential_count_per_column: vec![0; num_columns],
            synapse_count_per_column: vec![0; num_columns],
            connected_synapse_count_per_column: vec![0; num_columns],
            max_synapses_per_column: max_potential,
        }
    }

    /// Initializes a column from its potential pool.
    /// Every potential synapse draws an initial permanence; the ones that come out trimmed are not stored.
    pub fn init_column<R: Rng>(
        &mut self,
        column: usize,
        potential: &[usize],
        init_connected_percentage: f32,
        options: &SynapsePermanenceOptions,
        rng: &mut R,
    ) {
        assert!(
            potential.len() <= self.max_synapses_per_column,
            "Attempting to insert more synapses than allowed for column {}",
            column
        );

        let column_start = column * self.max_synapses_per_column;
        let pool = &mut self.potential[column_start..column_start + potential.len()];
        pool.copy_from_slice(potential);
        pool.sort_unstable();
        self.potential_count_per_column[column] = potential.len();

        let permanences =
            initial_permanences(potential.len(), init_connected_percentage, options, rng);
        let mut count = 0;
        for (offset, &permanence) in permanences.iter().enumerate() {
            if permanence > 0.0 {
                self.synapses[column_start + count] = Synapse {
                    index: self.potential[column_start + offset],
                    permanence,
                };
                count += 1;
            }
        }
        self.synapse_count_per_column[column] = count;
        self.sort_column(column, options.connected);
    }

    /// Reorders the synapses in a column so that those with permanence ≥ `connected_threshold` come first.
    pub fn sort_column(&mut self, column: usize, connected_threshold: f32) {
        let range = self.col_range(column);
        let slice = &mut self.synapses[range];

        let mut pivot = 0;

        for i in 0..slice.len() {
            if slice[i].permanence >= connected_threshold {
                slice.swap(i, pivot);
                pivot += 1;
            }
        }

        self.connected_synapse_count_per_column[column] = pivot;
    }

    /// Clamps every permanence of a column to `[options.min, options.max]`,
    /// drops the synapses at or below the trim threshold and re-sorts the column.
    pub fn update_column_permanences(&mut self, column: usize, options: &SynapsePermanenceOptions) {
        let range = self.col_range(column);
        let slice = &mut self.synapses[range];

        let mut kept = 0;
        for i in 0..slice.len() {
            let permanence = slice[i].permanence.clamp(options.min, options.max);
            if permanence > options.trim_threshold {
                slice[kept] = Synapse {
                    index: slice[i].index,
                    permanence,
                };
                kept += 1;
            }
        }
        self.synapse_count_per_column[column] = kept;

        self.sort_column(column, options.connected);
    }

    /// Raises synapse permanence in a column until at least `stimulus_threshold` synapses are connected,
    /// or until every stored synapse is.
    pub fn raise_column_permanences(
        &mut self,
        column: usize,
        stimulus_threshold: usize,
        options: &SynapsePermanenceOptions,
    ) {
        let target = stimulus_threshold.min(self.synapse_count_per_column[column]);

        while self.connected_synapse_count_per_column[column] < target {
            for syn in self.column_mut(column) {
                syn.permanence =
                    (syn.permanence + options.below_stimulus_increment).clamp(options.min, options.max);
            }
            self.sort_column(column, options.connected);
        }
    }

    /// Hebbian update of one column: synapses onto active inputs are strengthened,
    /// all others weakened. Trimmed synapses are dropped afterwards.
    pub fn adapt_column(
        &mut self,
        column: usize,
        active_inputs: &[bool],
        options: &SynapsePermanenceOptions,
    ) {
        for syn in self.column_mut(column) {
            if active_inputs[syn.index] {
                syn.permanence += options.active_increment;
            } else {
                syn.permanence -= options.inactive_decrement;
            }
        }
        self.update_column_permanences(column, options);
    }

    /// Bumps every stored synapse of a column by the below-stimulus increment.
    pub fn bump_column(&mut self, column: usize, options: &SynapsePermanenceOptions) {
        for syn in self.column_mut(column) {
            syn.permanence += options.below_stimulus_increment;
        }
        self.update_column_permanences(column, options);
    }

    /// Counts the active inputs among the connected synapses of a column.
    #[inline]
    pub fn overlap(&self, column: usize, active_inputs: &[bool]) -> usize {
        self.connected(column)
            .iter()
            .filter(|syn| active_inputs[syn.index])
            .count()
    }

    /// Returns the index range corresponding to the synapses stored for the given column.
    fn col_range(&self, column: usize) -> Range<usize> {
        self.col_range_sized(column, self.synapse_count_per_column[column])
    }

    /// Returns the index range corresponding to the first `size` slots of the given column.
    fn col_range_sized(&self, column: usize, size: usize) -> Range<usize> {
        let start = column * self.max_synapses_per_column;
        let end = start + size;
        start..end
    }

    /// Returns an immutable slice for all synapses stored in the given column.
    pub fn column(&self, column: usize) -> &[Synapse] {
        &self.synapses[self.col_range(column)]
    }

    /// Returns a mutable slice for all synapses stored in the given column.
    fn column_mut(&mut self, column: usize) -> &mut [Synapse] {
        let r = self.col_range(column);
        &mut self.synapses[r]
    }

    /// Returns an immutable slice for the connected synapses in the given column.
    pub fn connected(&self, column: usize) -> &[Synapse] {
        &self.synapses
            [self.col_range_sized(column, self.connected_synapse_count_per_column[column])]
    }

    #[inline]
    pub fn connected_count(&self, column: usize) -> usize {
        self.connected_synapse_count_per_column[column]
    }

    /// The potential pool of the given column, sorted ascending.
    pub fn potential(&self, column: usize) -> &[usize] {
        &self.potential[self.col_range_sized(column, self.potential_count_per_column[column])]
    }

    /// One permanence per potential pool entry, in pool order. Dropped synapses read as 0.
    pub fn permanences(&self, column: usize) -> Vec<f32> {
        let pool = self.potential(column);
        let mut permanences = vec![0.0; pool.len()];
        for syn in self.column(column) {
            if let Ok(offset) = pool.binary_search(&syn.index) {
                permanences[offset] = syn.permanence;
            }
        }
        permanences
    }
}

/// Draws initial permanences for a potential pool of `count` synapses, in pool order.
pub fn initial_permanences<R: Rng>(
    count: usize,
    connected_percentage: f32,
    options: &SynapsePermanenceOptions,
    rng: &mut R,
) -> Vec<f32> {
    (0..count)
        .map(|_| options.initial_permanence(connected_percentage, rng))
        .collect()
}
