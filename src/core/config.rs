//! Configuration of the Spatial Pooler.
//!
//! `SpatialPoolerConfig` carries everything needed to build a pooler and is validated once,
//! at construction. Drivers typically deserialize it from a file; every field has a default,
//! so a partial document is enough. Dimensions may be written as a single integer (`100`)
//! or as a list (`[32, 32]`).
//!
//! Exactly one density control must be active: `local_area_density` keeps the fraction of
//! winners per inhibition area fixed, while `num_active_columns_per_inh_area` keeps their count
//! fixed. Set the unused one to `None` (`null`).
//!
//! `Tuning` is the subset of parameters that can be changed safely while the pooler runs.

use super::error::{PoolerError, Result};
use super::synapses::SynapsePermanenceOptions;
use super::topology::product;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// The shape of an input or column space, outermost dimension first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DimensionsRepr", into = "Vec<usize>")]
pub struct Dimensions(Vec<usize>);

#[derive(Deserialize)]
#[serde(untagged)]
enum DimensionsRepr {
    Flat(usize),
    Shape(Vec<usize>),
}

impl From<DimensionsRepr> for Dimensions {
    fn from(repr: DimensionsRepr) -> Self {
        match repr {
            DimensionsRepr::Flat(size) => Self(vec![size]),
            DimensionsRepr::Shape(dims) => Self(dims),
        }
    }
}

impl From<Dimensions> for Vec<usize> {
    fn from(dims: Dimensions) -> Self {
        dims.0
    }
}

impl From<usize> for Dimensions {
    fn from(size: usize) -> Self {
        Self(vec![size])
    }
}

impl From<Vec<usize>> for Dimensions {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Dimensions {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Dimensions {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl Deref for Dimensions {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

/// The active density control, resolved from the two optional config fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Density {
    /// Fraction of an inhibition area allowed to win.
    LocalArea(f32),
    /// Number of columns allowed to win per inhibition area.
    ActivePerInhArea(f32),
}

impl Density {
    /// How many winners an inhibition area of `area` columns admits.
    #[inline]
    pub fn winners_for_area(&self, area: usize) -> usize {
        let winners = match *self {
            Density::LocalArea(density) => (density * area as f32).round(),
            Density::ActivePerInhArea(count) => count.round(),
        };
        (winners.max(0.0) as usize).min(area)
    }
}

/// Parameters that may change between compute cycles without touching the pooler's structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    /// Minimum raw overlap for a column to take part in inhibition.
    pub stimulus_threshold: f32,
    /// Fraction of the neighborhood's max overlap duty cycle below which a column gets its permanences bumped.
    pub min_pct_overlap_duty_cycle: f32,
    /// Fraction of the neighborhood's max active duty cycle below which a column gets boosted.
    pub min_pct_active_duty_cycle: f32,
    /// Window of the duty cycle moving averages.
    pub duty_cycle_period: u32,
    /// Iterations between inhibition radius and minimum duty cycle recomputations.
    pub update_period: u32,
    /// Boost factor applied to a column that never wins.
    pub max_boost: f32,
    /// Diagnostic output level, 0 to 3.
    pub verbosity: u8,
}

impl Tuning {
    /// Checks every tunable against its valid interval.
    pub fn validate(&self) -> Result<()> {
        if !self.stimulus_threshold.is_finite() || self.stimulus_threshold < 0.0 {
            return Err(PoolerError::configuration(
                "stimulus_threshold",
                format!("must be finite and >= 0, got {}", self.stimulus_threshold),
            ));
        }
        unit_interval("min_pct_overlap_duty_cycle", self.min_pct_overlap_duty_cycle)?;
        unit_interval("min_pct_active_duty_cycle", self.min_pct_active_duty_cycle)?;
        if self.duty_cycle_period == 0 {
            return Err(PoolerError::configuration("duty_cycle_period", "must be > 0"));
        }
        if self.update_period == 0 {
            return Err(PoolerError::configuration("update_period", "must be > 0"));
        }
        if !(self.max_boost >= 1.0) || !self.max_boost.is_finite() {
            return Err(PoolerError::configuration(
                "max_boost",
                format!("must be finite and >= 1.0, got {}", self.max_boost),
            ));
        }
        if self.verbosity > 3 {
            return Err(PoolerError::configuration(
                "verbosity",
                format!("must be between 0 and 3, got {}", self.verbosity),
            ));
        }
        Ok(())
    }
}

/// Everything needed to build a `SpatialPooler`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialPoolerConfig {
    /// Shape of the input space.
    pub input_dimensions: Dimensions,
    /// Shape of the column space.
    pub column_dimensions: Dimensions,
    /// Chebyshev radius (in input space) of the neighborhood a column draws its potential pool from.
    /// Clamped to the number of inputs.
    pub potential_radius: usize,
    /// Fraction of the neighborhood that ends up in the potential pool, in (0, 1].
    pub potential_pct: f64,
    /// Columns compete against all other columns instead of their neighborhood.
    pub global_inhibition: bool,
    /// Fraction of an inhibition area allowed to win, in (0, 1].
    pub local_area_density: Option<f32>,
    /// Number of winners per inhibition area, > 0.
    pub num_active_columns_per_inh_area: Option<f32>,
    pub stimulus_threshold: f32,
    /// Permanence decrement of synapses onto inactive inputs, in (0, 1).
    pub syn_perm_inactive_dec: f32,
    /// Permanence increment of synapses onto active inputs, in (0, 1).
    pub syn_perm_active_inc: f32,
    /// Permanence at which a synapse becomes connected, in (0, 1).
    pub syn_perm_connected: f32,
    pub min_pct_overlap_duty_cycle: f32,
    pub min_pct_active_duty_cycle: f32,
    pub duty_cycle_period: u32,
    pub max_boost: f32,
    /// Neighborhoods wrap around the edges of the input and column spaces.
    pub wrap_around: bool,
    pub update_period: u32,
    /// Seed of the pooler's random stream.
    pub seed: u64,
    pub verbosity: u8,
}

impl Default for SpatialPoolerConfig {
    fn default() -> Self {
        Self {
            input_dimensions: Dimensions::from([32, 32]),
            column_dimensions: Dimensions::from([64, 64]),
            potential_radius: 16,
            potential_pct: 0.5,
            global_inhibition: false,
            local_area_density: None,
            num_active_columns_per_inh_area: Some(10.0),
            stimulus_threshold: 0.0,
            syn_perm_inactive_dec: 0.01,
            syn_perm_active_inc: 0.1,
            syn_perm_connected: 0.1,
            min_pct_overlap_duty_cycle: 0.001,
            min_pct_active_duty_cycle: 0.001,
            duty_cycle_period: 1000,
            max_boost: 10.0,
            wrap_around: true,
            update_period: 50,
            seed: 42,
            verbosity: 0,
        }
    }
}

impl SpatialPoolerConfig {
    /// The runtime-tunable part of this configuration.
    pub fn tuning(&self) -> Tuning {
        Tuning {
            stimulus_threshold: self.stimulus_threshold,
            min_pct_overlap_duty_cycle: self.min_pct_overlap_duty_cycle,
            min_pct_active_duty_cycle: self.min_pct_active_duty_cycle,
            duty_cycle_period: self.duty_cycle_period,
            update_period: self.update_period,
            max_boost: self.max_boost,
            verbosity: self.verbosity,
        }
    }

    /// Permanence bounds and rates, including the derived trim threshold and below-stimulus increment.
    pub fn permanence_options(&self) -> SynapsePermanenceOptions {
        SynapsePermanenceOptions {
            inactive_decrement: self.syn_perm_inactive_dec,
            active_increment: self.syn_perm_active_inc,
            connected: self.syn_perm_connected,
            below_stimulus_increment: self.syn_perm_connected / 10.0,
            min: 0.0,
            max: 1.0,
            trim_threshold: self.syn_perm_active_inc / 2.0,
        }
    }

    /// Validates the whole configuration and resolves the density control.
    pub fn validate(&self) -> Result<Density> {
        dimensions("input_dimensions", &self.input_dimensions)?;
        dimensions("column_dimensions", &self.column_dimensions)?;

        if !(self.potential_pct > 0.0 && self.potential_pct <= 1.0) {
            return Err(PoolerError::configuration(
                "potential_pct",
                format!("must be in (0, 1], got {}", self.potential_pct),
            ));
        }

        let density = match (self.local_area_density, self.num_active_columns_per_inh_area) {
            (Some(_), Some(_)) => {
                return Err(PoolerError::configuration(
                    "local_area_density",
                    "cannot be combined with num_active_columns_per_inh_area",
                ))
            }
            (None, None) => {
                return Err(PoolerError::configuration(
                    "local_area_density",
                    "either it or num_active_columns_per_inh_area must be set",
                ))
            }
            (Some(density), None) => {
                if !(density > 0.0 && density <= 1.0) {
                    return Err(PoolerError::configuration(
                        "local_area_density",
                        format!("must be in (0, 1], got {density}"),
                    ));
                }
                Density::LocalArea(density)
            }
            (None, Some(count)) => {
                if !(count > 0.0) || !count.is_finite() {
                    return Err(PoolerError::configuration(
                        "num_active_columns_per_inh_area",
                        format!("must be finite and > 0, got {count}"),
                    ));
                }
                Density::ActivePerInhArea(count)
            }
        };

        open_unit_interval("syn_perm_inactive_dec", self.syn_perm_inactive_dec)?;
        open_unit_interval("syn_perm_active_inc", self.syn_perm_active_inc)?;
        open_unit_interval("syn_perm_connected", self.syn_perm_connected)?;

        let options = self.permanence_options();
        if options.trim_threshold >= options.connected {
            return Err(PoolerError::configuration(
                "syn_perm_active_inc",
                format!(
                    "trim threshold {} must stay below syn_perm_connected {}",
                    options.trim_threshold, options.connected
                ),
            ));
        }

        self.tuning().validate()?;

        Ok(density)
    }
}

fn dimensions(name: &'static str, dims: &[usize]) -> Result<()> {
    if product(dims) == 0 {
        return Err(PoolerError::configuration(
            name,
            format!("must be non-empty with a positive product, got {dims:?}"),
        ));
    }
    Ok(())
}

fn unit_interval(name: &'static str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(PoolerError::configuration(
            name,
            format!("must be in [0, 1], got {value}"),
        ));
    }
    Ok(())
}

fn open_unit_interval(name: &'static str, value: f32) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(PoolerError::configuration(
            name,
            format!("must be in (0, 1), got {value}"),
        ));
    }
    Ok(())
}
