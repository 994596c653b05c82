//! This example demonstrates how the Spatial Pooler learns stable sparse representations.
//! A handful of random binary patterns is presented repeatedly with learning enabled. Afterwards
//! each pattern is corrupted by flipping a growing fraction of its bits, and the SDR of the noisy
//! version is compared with the SDR of the clean one.
//!
//! A trained pooler keeps most of its active columns under moderate noise.
//! Set `RUST_LOG=debug` to follow the compute cycles.

use anyhow::{Context, Result};
use fxhash::FxHashSet;
use htm_sp::core::config::{Dimensions, SpatialPoolerConfig};
use htm_sp::core::spatial_pooler::SpatialPooler;
use rand::{rngs::StdRng, seq::index::sample, Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

const NUM_PATTERNS: usize = 8;
const ACTIVE_BITS: usize = 120;
const TRAINING_EPOCHS: usize = 40;

fn random_pattern(num_inputs: usize, rng: &mut StdRng) -> Vec<bool> {
    let mut pattern = vec![false; num_inputs];
    for i in sample(rng, num_inputs, ACTIVE_BITS) {
        pattern[i] = true;
    }
    pattern
}

fn add_noise(pattern: &[bool], noise: f64, rng: &mut StdRng) -> Vec<bool> {
    pattern
        .iter()
        .map(|&bit| if rng.random_bool(noise) { !bit } else { bit })
        .collect()
}

fn sdr_overlap(a: &FxHashSet<usize>, b: &[usize]) -> usize {
    b.iter().filter(|col| a.contains(col)).count()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SpatialPoolerConfig {
        input_dimensions: Dimensions::from([32, 32]),
        column_dimensions: Dimensions::from([32, 32]),
        potential_radius: 8,
        global_inhibition: true,
        local_area_density: Some(0.02),
        num_active_columns_per_inh_area: None,
        verbosity: 2,
        ..Default::default()
    };

    println!("Initializing Spatial Pooler...");
    let mut spatial_pooler =
        SpatialPooler::new(&config).context("failed to build the spatial pooler")?;
    let num_inputs = spatial_pooler.num_inputs();

    let mut rng = StdRng::seed_from_u64(7);
    let patterns: Vec<Vec<bool>> = (0..NUM_PATTERNS)
        .map(|_| random_pattern(num_inputs, &mut rng))
        .collect();

    println!(
        "Training on {} patterns for {} epochs...",
        NUM_PATTERNS, TRAINING_EPOCHS
    );
    for _ in 0..TRAINING_EPOCHS {
        for pattern in &patterns {
            spatial_pooler.compute(pattern, true)?;
        }
    }
    println!("Training complete.");

    let clean: Vec<FxHashSet<usize>> = patterns
        .iter()
        .map(|pattern| {
            spatial_pooler
                .compute(pattern, false)
                .map(|winners| winners.iter().copied().collect())
        })
        .collect::<Result<_, _>>()?;

    for noise in [0.0, 0.02, 0.05, 0.1, 0.2] {
        let mut kept = 0;
        let mut total = 0;
        for (pattern, sdr) in patterns.iter().zip(&clean) {
            let noisy = add_noise(pattern, noise, &mut rng);
            let winners = spatial_pooler.compute(&noisy, false)?;
            kept += sdr_overlap(sdr, winners);
            total += sdr.len();
        }
        println!(
            "Noise: {:>4.0}%, SDR overlap with clean input: {:.2}%",
            100.0 * noise,
            100.0 * (kept as f32 / total.max(1) as f32)
        );
    }

    let boosted = spatial_pooler
        .boost_factors()
        .iter()
        .filter(|&&boost| boost > 1.0)
        .count();
    println!(
        "Inhibition radius: {}, boosted columns: {}, iterations: {}",
        spatial_pooler.inhibition_radius(),
        boosted,
        spatial_pooler.iteration_num()
    );

    Ok(())
}
