//! Maps columns onto the input space.
//!
//! Columns are spread uniformly over the input: each column gets a "center" input whose
//! coordinates are proportional to the column's own coordinates. When the column space and the
//! input space have a different number of dimensions, the longer dimension list is reduced to the
//! shorter one by folding its trailing axes together, so that both spaces share one set of axes.
//!
//! Around that center, a hyper-square neighborhood of the input space forms the candidates for
//! the column's potential pool, of which a fixed fraction is sampled once and kept for life.

use super::error::{check_index, Result};
use super::topology::{reduce_dimensions, Topology};
use rand::{seq::IteratorRandom, Rng};

/// Projects column indices into the input space.
#[derive(Debug, Clone)]
pub struct TopologyMapper {
    /// The full column space.
    column_topology: Topology,

    /// The full input space, used for neighborhoods.
    input_topology: Topology,

    /// Column space reduced to the shared number of axes.
    reduced_columns: Topology,

    /// Input space reduced to the shared number of axes.
    reduced_inputs: Topology,
}

impl TopologyMapper {
    pub fn new(input_dimensions: &[usize], column_dimensions: &[usize]) -> Self {
        let shared = input_dimensions.len().min(column_dimensions.len());

        Self {
            column_topology: Topology::new(column_dimensions),
            input_topology: Topology::new(input_dimensions),
            reduced_columns: Topology::new(&reduce_dimensions(column_dimensions, shared)),
            reduced_inputs: Topology::new(&reduce_dimensions(input_dimensions, shared)),
        }
    }

    #[inline]
    pub fn column_topology(&self) -> &Topology {
        &self.column_topology
    }

    #[inline]
    pub fn input_topology(&self) -> &Topology {
        &self.input_topology
    }

    /// Maps a column index to the "center" input index in the input space.
    ///
    /// Along every shared axis, column coordinate `p` of an axis with `c` columns maps to
    /// `floor((i - 1) * p / (c - 1))` on the input axis of length `i`, so the first and last
    /// columns sit on the first and last inputs. An axis with a single column maps to the middle.
    pub fn map_column(&self, column: usize) -> Result<usize> {
        check_index(column, self.column_topology.len())?;

        let coords: Vec<usize> = self
            .reduced_columns
            .coordinates(column)
            .into_iter()
            .zip(self.reduced_columns.dimensions())
            .zip(self.reduced_inputs.dimensions())
            .map(|((index, &col_dim), &in_dim)| {
                if col_dim > 1 {
                    (in_dim - 1) * index / (col_dim - 1)
                } else {
                    (in_dim - 1) / 2
                }
            })
            .collect();

        Ok(self.reduced_inputs.index_from_coordinates(&coords))
    }

    /// All input indices within Chebyshev distance `radius` of the column's center, in iteration order.
    pub fn neighborhood(&self, column: usize, radius: usize, wrap_around: bool) -> Result<Vec<usize>> {
        let center = self.map_column(column)?;
        Ok(self
            .input_topology
            .neighborhood(center, radius, wrap_around)
            .collect())
    }

    /// Samples which input bits fall within a column's potential radius, optionally wrapping around:
    /// - Determines the center input index for the column via `map_column()`.
    /// - Gathers all input indices within the potential radius from that center.
    /// - Randomly keeps `floor(potential_pct * neighborhood size)` of them.
    ///
    /// The result is sorted ascending.
    pub fn map_potential<R: Rng>(
        &self,
        column: usize,
        radius: usize,
        potential_pct: f64,
        wrap_around: bool,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        let center = self.map_column(column)?;
        let elements_around_center = self.input_topology.neighborhood(center, radius, wrap_around);
        let size = potential_synapses(elements_around_center.len(), potential_pct);

        let mut sample = elements_around_center.choose_multiple(rng, size);
        sample.sort_unstable();
        Ok(sample)
    }

    /// Average number of columns per input along the shared axes.
    pub fn columns_per_input(&self) -> f32 {
        let ratios: Vec<f32> = self
            .reduced_columns
            .dimensions()
            .iter()
            .zip(self.reduced_inputs.dimensions())
            .map(|(&col_dim, &in_dim)| col_dim as f32 / in_dim as f32)
            .collect();

        ratios.iter().sum::<f32>() / ratios.len().max(1) as f32
    }

    /// Average extent, over the shared axes, of the box spanned by the given input indices.
    /// An empty set spans nothing.
    pub fn connected_span(&self, inputs: impl IntoIterator<Item = usize>) -> f32 {
        let num_dims = self.reduced_inputs.dimensions().len();
        let mut bounds: Option<Vec<(usize, usize)>> = None;

        for input in inputs {
            let coords = self.reduced_inputs.coordinates(input);
            match bounds.as_mut() {
                Some(bounds) => {
                    for (bound, &c) in bounds.iter_mut().zip(&coords) {
                        bound.0 = bound.0.min(c);
                        bound.1 = bound.1.max(c);
                    }
                }
                None => bounds = Some(coords.iter().map(|&c| (c, c)).collect()),
            }
        }

        match bounds {
            Some(bounds) => {
                let total: usize = bounds.iter().map(|&(low, high)| high - low + 1).sum();
                total as f32 / num_dims as f32
            }
            None => 0.0,
        }
    }
}

/// Calculates how many potential synapses a column should have, given the neighborhood size.
#[inline]
pub fn potential_synapses(neighborhood_size: usize, potential_pct: f64) -> usize {
    ((neighborhood_size as f64 * potential_pct).floor() as usize).min(neighborhood_size)
}
