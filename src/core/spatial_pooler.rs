//! The `SpatialPooler` is a core component of HTM that:
//! - Maps each column onto the input space and draws its potential pool once, at construction.
//! - Learns to increase/decrease synapse permanence (strength) values if the connected input bit was active/inactive.
//! - Computes an "overlap" score for each column based on how many connected synapses match the current input.
//! - Enforces sparse activity via inhibition, allowing only a subset of top columns to become "winner columns."
//!
//! Each column selectively "tunes" its connections to represent frequently encountered input patterns, leading to SDRs.
//!
//! A compute cycle runs strictly in phases: overlap, boost, inhibition, then (only when learning)
//! permanence adaptation, duty cycles, weak-column bumps and boost factors. Every `update_period`
//! iterations the inhibition radius and the minimum duty cycles are recomputed.
//!
//! All randomness comes from the pooler's own stream, so two poolers built from the same
//! configuration and seed produce identical runs.

use super::{
    config::{Density, SpatialPoolerConfig, Tuning},
    error::{check_index, PoolerError, Result},
    homeostasis,
    inhibition::Inhibition,
    mapping::TopologyMapper,
    overlap::Overlaps,
    synapses::{initial_permanences, SynapsePermanenceOptions, Synapses},
    topology::{product, reshape, NdArray},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, trace};

/// Fraction of each column's potential synapses that start out at or above the connected threshold.
const INIT_CONNECTED_PERCENTAGE: f32 = 0.5;

/// A value of an input vector. Anything nonzero is an active bit.
pub trait ActiveBit: Copy {
    fn is_active(self) -> bool;
}

impl ActiveBit for bool {
    #[inline]
    fn is_active(self) -> bool {
        self
    }
}

macro_rules! impl_active_bit {
    ($($t:ty),*) => {
        $(
            impl ActiveBit for $t {
                #[inline]
                fn is_active(self) -> bool {
                    self != 0 as $t
                }
            }
        )*
    };
}

impl_active_bit!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

/// The SpatialPooler manages a set of columns that compete to represent the input space.
/// It computes overlaps, applies inhibition, boosts weak columns, and adapts synapses during learning.
/// Synapse management is performed via the embedded `Synapses` pool.
#[derive(Debug, Clone)]
pub struct SpatialPooler<R = StdRng> {
    /// The pooler's random stream, used for potential pools and initial permanences.
    rng: R,

    /// The total number of compute iterations performed so far (whether learning or not).
    iteration_num: u64,

    /// The number of compute iterations performed so far with learning enabled.
    iteration_learn_num: u64,

    /// The shape (dimensions) of the input space.
    input_dimensions: Vec<usize>,

    /// The shape (dimensions) of the Spatial Pooler's column grid.
    column_dimensions: Vec<usize>,

    /// The total number of bits/inputs available.
    num_inputs: usize,

    /// The total number of columns in the Spatial Pooler.
    num_columns: usize,

    /// Defines the radius (in input-space) around a column's center from which potential synapses are drawn.
    potential_radius: usize,

    /// Controls how many input bits within the `potential_radius` become potential synapses for each column.
    potential_pct: f64,

    /// If true, neighborhoods "wrap around" the edges in topology calculations. The space behaves like a torus.
    wrap_around: bool,

    /// Parameters that may change between compute cycles.
    tuning: Tuning,

    /// Settings for how synapse permanence is incremented/decremented and thresholds for trimming or connecting.
    synapse_permanence_options: SynapsePermanenceOptions,

    /// Projects columns into the input space.
    mapper: TopologyMapper,

    /// A pool managing all synapse data. Stores a contiguous block of synapses for every column in one big array.
    synapses: Synapses,

    /// Raw and boosted overlaps of the last compute cycle.
    overlaps: Overlaps,

    /// Inhibition mode, density, radius and the neighbor lists for that radius.
    inhibition: Inhibition,

    /// Rolling average of how often each column has an overlap above the stimulus threshold.
    overlap_duty_cycles: Vec<f32>,

    /// Rolling average of how often each column is chosen as a winner.
    active_duty_cycles: Vec<f32>,

    /// The threshold for each column's overlap duty cycle, columns below it get their permanences bumped.
    min_overlap_duty_cycles: Vec<f32>,

    /// The threshold for each column's active duty cycle, columns below it get their overlap boosted.
    min_active_duty_cycles: Vec<f32>,

    /// A multiplier applied to a column's overlap if it is underactive.
    boost_factors: Vec<f32>,

    /// The current input, one flag per input bit.
    active_inputs: Vec<bool>,

    /// Whether each column cleared the stimulus threshold this cycle.
    eligible: Vec<bool>,

    /// The indices of columns that won the inhibition process this iteration, ascending.
    winner_columns: Vec<usize>,
}

impl SpatialPooler<StdRng> {
    /// Creates a new `SpatialPooler` whose random stream is seeded from `config.seed`.
    pub fn new(config: &SpatialPoolerConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(config.seed))
    }
}

impl<R: Rng> SpatialPooler<R> {
    /// Creates a new `SpatialPooler` drawing all of its randomness from `rng`:
    /// - Validates the configuration. No pooler is returned for an invalid one.
    /// - Samples each column's potential pool around its center in the input space.
    /// - Initializes permanences, raising columns that start with too few connected synapses.
    /// - Derives the initial inhibition radius from the connected spans.
    pub fn with_rng(config: &SpatialPoolerConfig, mut rng: R) -> Result<Self> {
        let density = config.validate()?;

        let input_dimensions = config.input_dimensions.to_vec();
        let column_dimensions = config.column_dimensions.to_vec();
        let num_inputs = product(&input_dimensions);
        let num_columns = product(&column_dimensions);
        let potential_radius = config.potential_radius.min(num_inputs);
        let tuning = config.tuning();
        let options = config.permanence_options();

        let mapper = TopologyMapper::new(&input_dimensions, &column_dimensions);
        let pools = (0..num_columns)
            .map(|column| {
                mapper.map_potential(
                    column,
                    potential_radius,
                    config.potential_pct,
                    config.wrap_around,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let max_potential = pools.iter().map(Vec::len).max().unwrap_or(0);
        let mut synapses = Synapses::new(num_columns, max_potential);
        let raise_target = tuning.stimulus_threshold.ceil() as usize;
        for (column, pool) in pools.iter().enumerate() {
            synapses.init_column(column, pool, INIT_CONNECTED_PERCENTAGE, &options, &mut rng);
            synapses.raise_column_permanences(column, raise_target, &options);
        }

        let inhibition = Inhibition::new(
            mapper.column_topology().clone(),
            config.global_inhibition,
            config.wrap_around,
            density,
        );

        let mut pooler = Self {
            rng,
            iteration_num: 0,
            iteration_learn_num: 0,
            input_dimensions,
            column_dimensions,
            num_inputs,
            num_columns,
            potential_radius,
            potential_pct: config.potential_pct,
            wrap_around: config.wrap_around,
            tuning,
            synapse_permanence_options: options,
            mapper,
            synapses,
            overlaps: Overlaps::new(num_columns),
            inhibition,
            overlap_duty_cycles: vec![0.0; num_columns],
            active_duty_cycles: vec![0.0; num_columns],
            min_overlap_duty_cycles: vec![0.0; num_columns],
            min_active_duty_cycles: vec![0.0; num_columns],
            boost_factors: vec![1.0; num_columns],
            active_inputs: vec![false; num_inputs],
            eligible: vec![false; num_columns],
            winner_columns: Vec::with_capacity(num_columns),
        };

        let radius = pooler.compute_inhibition_radius();
        pooler.inhibition.set_radius(radius);

        if pooler.tuning.verbosity >= 1 {
            info!(
                num_inputs,
                num_columns,
                max_potential,
                inhibition_radius = radius,
                global_inhibition = config.global_inhibition,
                "spatial pooler initialized"
            );
        }

        Ok(pooler)
    }

    /// Processes the current `input`:
    /// - Rejects an input of the wrong length before touching any state.
    /// - Updates iteration counters.
    /// - Calculates overlaps between columns and input subsets.
    /// - Multiplies overlaps by the current boost factors.
    /// - Performs inhibition to pick winner columns.
    ///
    /// If learning is enabled:
    /// - Updates synapse permanence values of the winners.
    /// - Updates duty cycles, bumps weak columns and recomputes boost factors.
    /// - Resets the inhibition radius and minimum duty cycles periodically.
    ///
    /// Returns the winner columns in ascending order.
    pub fn compute<T: ActiveBit>(&mut self, input: &[T], learn: bool) -> Result<&[usize]> {
        self.check_input(input)?;
        self.active_inputs
            .iter_mut()
            .zip(input)
            .for_each(|(active, &bit)| *active = bit.is_active());

        self.update_iteration_number(learn);
        self.calculate_overlaps();
        self.boost();
        self.inhibit_columns();

        if learn {
            self.adapt_synapses();
            self.update_duty_cycles();
            self.bump_up_weak_columns();
            self.update_boost_factors();
            if self.is_update_round() {
                self.update_inhibition_radius();
                self.update_min_duty_cycles();
            }
        }

        if self.tuning.verbosity >= 2 {
            debug!(
                iteration = self.iteration_num,
                learn,
                winners = self.winner_columns.len(),
                "compute cycle finished"
            );
        }

        Ok(self.winner_columns.as_slice())
    }

    /// Increments the global iteration counters, including a separate counter if `learn` is true.
    #[inline]
    fn update_iteration_number(&mut self, learn: bool) {
        self.iteration_num = self.iteration_num.wrapping_add(1);
        if learn {
            self.iteration_learn_num = self.iteration_learn_num.wrapping_add(1);
        }
    }

    #[inline]
    fn is_update_round(&self) -> bool {
        self.iteration_num % u64::from(self.tuning.update_period) == 0
    }

    /// Calculates the raw overlap for each column with the current input.
    #[inline]
    fn calculate_overlaps(&mut self) {
        self.overlaps.calculate(&self.synapses, &self.active_inputs);
    }

    /// Multiplies each column's overlap by its boost factor.
    #[inline]
    fn boost(&mut self) {
        self.overlaps.boost(&self.boost_factors);
    }

    /// Marks the columns that clear the stimulus threshold and lets them compete.
    /// Globally the others score zero; locally they sit the cycle out.
    fn inhibit_columns(&mut self) {
        let threshold = self.tuning.stimulus_threshold;
        for (col, eligible) in self.eligible.iter_mut().enumerate() {
            *eligible = self.overlaps.is_stimulated(col, threshold);
        }
        self.winner_columns = self
            .inhibition
            .select(self.overlaps.boosted(), &self.eligible);
    }

    /// Adjusts synapses for each winner column after an input is processed:
    /// - Increments permanence of synapses whose input bit was active.
    /// - Decrements permanence of synapses whose input bit was inactive.
    /// - Drops synapses that fall to the trim threshold.
    fn adapt_synapses(&mut self) {
        for &col in &self.winner_columns {
            self.synapses
                .adapt_column(col, &self.active_inputs, &self.synapse_permanence_options);
        }
    }

    /// Updates the rolling duty cycles for overlap and active states.
    /// The window grows with the number of learning iterations until it reaches `duty_cycle_period`.
    fn update_duty_cycles(&mut self) {
        let period = self
            .iteration_learn_num
            .min(u64::from(self.tuning.duty_cycle_period)) as u32;
        let threshold = self.tuning.stimulus_threshold;

        let overlapping: Vec<bool> = (0..self.num_columns)
            .map(|col| self.overlaps.is_stimulated(col, threshold))
            .collect();
        let mut active = vec![false; self.num_columns];
        self.winner_columns
            .iter()
            .for_each(|&col| active[col] = true);

        homeostasis::update_duty_cycles(&mut self.overlap_duty_cycles, &overlapping, period);
        homeostasis::update_duty_cycles(&mut self.active_duty_cycles, &active, period);
    }

    /// Increases permanence on "weak" columns whose overlap duty cycle is below their minimum.
    ///
    /// Prevents columns from perpetually remaining low-overlap, giving them a chance to learn and stay relevant.
    fn bump_up_weak_columns(&mut self) {
        for col in 0..self.num_columns {
            if self.overlap_duty_cycles[col] < self.min_overlap_duty_cycles[col] {
                self.synapses
                    .bump_column(col, &self.synapse_permanence_options);
                if self.tuning.verbosity >= 3 {
                    trace!(
                        column = col,
                        overlap_duty_cycle = self.overlap_duty_cycles[col],
                        min_overlap_duty_cycle = self.min_overlap_duty_cycles[col],
                        "bumped weak column"
                    );
                }
            }
        }
    }

    /// Recalculates each column's boost factor based on its active duty cycle:
    /// - If a column's activity is below its minimum, its boost factor rises towards `max_boost`.
    /// - If its activity meets or exceeds the minimum, its boost factor is reset to 1.0.
    fn update_boost_factors(&mut self) {
        let max_boost = self.tuning.max_boost;
        self.boost_factors
            .iter_mut()
            .zip(&self.active_duty_cycles)
            .zip(&self.min_active_duty_cycles)
            .for_each(|((boost, &active), &min)| {
                *boost = homeostasis::boost_factor(active, min, max_boost);
            });
    }

    /// Updates the minimum duty cycles for overlap and activity:
    /// - Under global inhibition, from the maxima over all columns.
    /// - Under local inhibition, from the maxima within each column's inhibition neighborhood.
    fn update_min_duty_cycles(&mut self) {
        let overlap_pct = self.tuning.min_pct_overlap_duty_cycle;
        let active_pct = self.tuning.min_pct_active_duty_cycle;

        if self.inhibition.is_global() {
            homeostasis::min_duty_cycles_global(
                &self.overlap_duty_cycles,
                overlap_pct,
                &mut self.min_overlap_duty_cycles,
            );
            homeostasis::min_duty_cycles_global(
                &self.active_duty_cycles,
                active_pct,
                &mut self.min_active_duty_cycles,
            );
        } else {
            let neighborhoods = self.inhibition.neighborhoods();
            homeostasis::min_duty_cycles_local(
                &self.overlap_duty_cycles,
                overlap_pct,
                neighborhoods,
                &mut self.min_overlap_duty_cycles,
            );
            homeostasis::min_duty_cycles_local(
                &self.active_duty_cycles,
                active_pct,
                neighborhoods,
                &mut self.min_active_duty_cycles,
            );
        }
    }

    /// Recomputes the inhibition radius; the neighbor lists are rebuilt lazily if it moved.
    fn update_inhibition_radius(&mut self) {
        let radius = self.compute_inhibition_radius();
        let previous = self.inhibition.radius();
        if self.inhibition.set_radius(radius) && self.tuning.verbosity >= 1 {
            info!(
                iteration = self.iteration_num,
                previous,
                radius,
                "inhibition radius changed"
            );
        }
    }

    /// Derives the inhibition radius from the average span of the columns' connected synapses,
    /// projected into column space: `max(1, round((span * columns_per_input - 1) / 2))`.
    pub fn compute_inhibition_radius(&self) -> usize {
        let total_span: f32 = (0..self.num_columns)
            .map(|col| {
                self.mapper
                    .connected_span(self.synapses.connected(col).iter().map(|syn| syn.index))
            })
            .sum();
        let avg_span = total_span / self.num_columns as f32;
        let diameter = avg_span * self.mapper.columns_per_input();
        ((diameter - 1.0) / 2.0).round().max(1.0) as usize
    }

    /// Applies one Hebbian update to a single column, outside of a compute cycle.
    pub fn update_permanences<T: ActiveBit>(&mut self, column: usize, active_inputs: &[T]) -> Result<()> {
        check_index(column, self.num_columns)?;
        self.check_input(active_inputs)?;
        let mask: Vec<bool> = active_inputs.iter().map(|&bit| bit.is_active()).collect();
        self.synapses
            .adapt_column(column, &mask, &self.synapse_permanence_options);
        Ok(())
    }

    /// Draws initial permanences for `potential` from the pooler's stream without storing them.
    pub fn init_permanences(&mut self, column: usize, potential: &[usize]) -> Result<Vec<f32>> {
        check_index(column, self.num_columns)?;
        for &input in potential {
            check_index(input, self.num_inputs)?;
        }
        Ok(initial_permanences(
            potential.len(),
            INIT_CONNECTED_PERCENTAGE,
            &self.synapse_permanence_options,
            &mut self.rng,
        ))
    }

    /// Samples a fresh potential pool for `column` from the pooler's stream.
    /// The column's own pool is fixed and is not affected.
    pub fn map_potential(&mut self, column: usize, wrap_around: bool) -> Result<Vec<usize>> {
        self.mapper.map_potential(
            column,
            self.potential_radius,
            self.potential_pct,
            wrap_around,
            &mut self.rng,
        )
    }
}

impl<R> SpatialPooler<R> {
    fn check_input<T>(&self, input: &[T]) -> Result<()> {
        if input.len() != self.num_inputs {
            return Err(PoolerError::DimensionMismatch {
                expected: self.num_inputs,
                actual: input.len(),
            });
        }
        Ok(())
    }

    /// Maps a column index to the "center" input index in the input space.
    #[inline]
    pub fn map_column(&self, column: usize) -> Result<usize> {
        self.mapper.map_column(column)
    }

    /// Counts the active inputs of `input` among the connected synapses of `column`. Pure read.
    pub fn overlap<T: ActiveBit>(&self, column: usize, input: &[T]) -> Result<u32> {
        check_index(column, self.num_columns)?;
        self.check_input(input)?;
        Ok(self
            .synapses
            .connected(column)
            .iter()
            .filter(|syn| input[syn.index].is_active())
            .count() as u32)
    }

    /// The column's boosted overlap from the last compute cycle, the score it competed with.
    pub fn boosted_overlap(&self, column: usize) -> Result<f32> {
        check_index(column, self.num_columns)?;
        Ok(self.overlaps.boosted()[column])
    }

    /// The fixed potential pool of `column`, sorted ascending.
    pub fn potential_pool(&self, column: usize) -> Result<&[usize]> {
        check_index(column, self.num_columns)?;
        Ok(self.synapses.potential(column))
    }

    /// One permanence per potential pool entry, in pool order. Trimmed synapses read as 0.
    pub fn permanences(&self, column: usize) -> Result<Vec<f32>> {
        check_index(column, self.num_columns)?;
        Ok(self.synapses.permanences(column))
    }

    /// The input indices `column` is connected to, sorted ascending.
    pub fn connected_synapses(&self, column: usize) -> Result<Vec<usize>> {
        check_index(column, self.num_columns)?;
        let mut connected: Vec<usize> = self
            .synapses
            .connected(column)
            .iter()
            .map(|syn| syn.index)
            .collect();
        connected.sort_unstable();
        Ok(connected)
    }

    /// The permanences of `column` laid out over the input space, 0 outside its live synapses.
    pub fn receptive_field(&self, column: usize) -> Result<NdArray<f32>> {
        check_index(column, self.num_columns)?;
        let mut field = vec![0.0; self.num_inputs];
        for syn in self.synapses.column(column) {
            field[syn.index] = syn.permanence;
        }
        Ok(reshape(&field, &self.input_dimensions))
    }

    #[inline]
    pub fn boost_factors(&self) -> &[f32] {
        &self.boost_factors
    }

    #[inline]
    pub fn overlap_duty_cycles(&self) -> &[f32] {
        &self.overlap_duty_cycles
    }

    #[inline]
    pub fn active_duty_cycles(&self) -> &[f32] {
        &self.active_duty_cycles
    }

    #[inline]
    pub fn min_overlap_duty_cycles(&self) -> &[f32] {
        &self.min_overlap_duty_cycles
    }

    #[inline]
    pub fn min_active_duty_cycles(&self) -> &[f32] {
        &self.min_active_duty_cycles
    }

    #[inline]
    pub fn inhibition_radius(&self) -> usize {
        self.inhibition.radius()
    }

    #[inline]
    pub fn is_global_inhibition(&self) -> bool {
        self.inhibition.is_global()
    }

    #[inline]
    pub fn density(&self) -> Density {
        self.inhibition.density()
    }

    /// Raw overlaps of the last compute cycle.
    #[inline]
    pub fn overlaps(&self) -> &[u32] {
        self.overlaps.raw()
    }

    /// The scores inhibition ran on in the last compute cycle.
    #[inline]
    pub fn boosted_overlaps(&self) -> &[f32] {
        self.overlaps.boosted()
    }

    #[inline]
    pub fn winner_columns(&self) -> &[usize] {
        &self.winner_columns
    }

    #[inline]
    pub fn iteration_num(&self) -> u64 {
        self.iteration_num
    }

    #[inline]
    pub fn iteration_learn_num(&self) -> u64 {
        self.iteration_learn_num
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    #[inline]
    pub fn input_dimensions(&self) -> &[usize] {
        &self.input_dimensions
    }

    #[inline]
    pub fn column_dimensions(&self) -> &[usize] {
        &self.column_dimensions
    }

    #[inline]
    pub fn potential_radius(&self) -> usize {
        self.potential_radius
    }

    #[inline]
    pub fn wrap_around(&self) -> bool {
        self.wrap_around
    }

    #[inline]
    pub fn synapse_permanence_options(&self) -> &SynapsePermanenceOptions {
        &self.synapse_permanence_options
    }

    #[inline]
    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    /// Replaces the runtime-tunable parameters. An invalid `tuning` is rejected and nothing changes.
    pub fn set_tuning(&mut self, tuning: Tuning) -> Result<()> {
        tuning.validate()?;
        self.tuning = tuning;
        Ok(())
    }

    pub fn set_max_boost(&mut self, max_boost: f32) -> Result<()> {
        self.set_tuning(Tuning {
            max_boost,
            ..self.tuning
        })
    }

    pub fn set_verbosity(&mut self, verbosity: u8) -> Result<()> {
        self.set_tuning(Tuning {
            verbosity,
            ..self.tuning
        })
    }
}
