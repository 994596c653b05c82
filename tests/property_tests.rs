//! Property-based tests using proptest
//!
//! These tests verify geometric and learning invariants that should hold
//! for every valid configuration within a small domain.

use htm_sp::core::config::{Dimensions, SpatialPoolerConfig};
use htm_sp::core::mapping::{potential_synapses, TopologyMapper};
use htm_sp::core::spatial_pooler::SpatialPooler;
use htm_sp::core::topology::{product, Topology};
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

// Pairs of column and input dimension lists with the same number of axes.
fn paired_dimensions() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    (1usize..=3).prop_flat_map(|axes| {
        (
            prop::collection::vec(1usize..=6, axes),
            prop::collection::vec(1usize..=10, axes),
        )
    })
}

fn input_strategy(num_inputs: usize) -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.2), num_inputs)
}

fn small_config(global_inhibition: bool, seed: u64) -> SpatialPoolerConfig {
    SpatialPoolerConfig {
        input_dimensions: Dimensions::from([12, 12]),
        column_dimensions: Dimensions::from([6, 6]),
        potential_radius: 3,
        global_inhibition,
        num_active_columns_per_inh_area: Some(4.0),
        seed,
        ..Default::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Property: the counts are the products of the dimension lists
    #[test]
    fn test_counts_match_dimensions((columns, inputs) in paired_dimensions()) {
        let mapper = TopologyMapper::new(&inputs, &columns);
        prop_assert_eq!(mapper.column_topology().len(), product(&columns));
        prop_assert_eq!(mapper.input_topology().len(), product(&inputs));
    }

    // Property: moving a column forward along one axis never moves its center backwards
    #[test]
    fn test_map_column_is_monotone((columns, inputs) in paired_dimensions()) {
        let mapper = TopologyMapper::new(&inputs, &columns);
        let column_space = Topology::new(&columns);
        let input_space = Topology::new(&inputs);

        for column in 0..column_space.len() {
            let coords = column_space.coordinates(column);
            let center = input_space.coordinates(mapper.map_column(column).unwrap());
            for axis in 0..columns.len() {
                if coords[axis] + 1 < columns[axis] {
                    let mut next = coords.clone();
                    next[axis] += 1;
                    let next_center = input_space
                        .coordinates(mapper.map_column(column_space.index_from_coordinates(&next)).unwrap());
                    prop_assert!(next_center[axis] >= center[axis]);
                }
            }
        }
    }

    // Property: potential pools stay inside the input space and have the sampled size
    #[test]
    fn test_map_potential_in_range(
        (columns, inputs) in paired_dimensions(),
        radius in 0usize..5,
        pct in 0.1f64..=1.0,
        wrap_around in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let mapper = TopologyMapper::new(&inputs, &columns);
        let num_inputs = product(&inputs);
        let mut rng = StdRng::seed_from_u64(seed);

        for column in 0..mapper.column_topology().len() {
            let mut neighborhood = mapper.neighborhood(column, radius, wrap_around).unwrap();
            neighborhood.sort_unstable();
            let pool = mapper.map_potential(column, radius, pct, wrap_around, &mut rng).unwrap();
            prop_assert_eq!(pool.len(), potential_synapses(neighborhood.len(), pct));
            prop_assert!(pool
                .iter()
                .all(|&i| i < num_inputs && neighborhood.binary_search(&i).is_ok()));
        }
    }

    // Property: a full-percentage pool is exactly the neighborhood
    #[test]
    fn test_full_pct_pool_is_neighborhood(
        (columns, inputs) in paired_dimensions(),
        radius in 0usize..4,
        wrap_around in any::<bool>(),
    ) {
        let mapper = TopologyMapper::new(&inputs, &columns);
        let mut rng = StdRng::seed_from_u64(0);
        for column in 0..mapper.column_topology().len() {
            let mut neighborhood = mapper.neighborhood(column, radius, wrap_around).unwrap();
            neighborhood.sort_unstable();
            let pool = mapper.map_potential(column, radius, 1.0, wrap_around, &mut rng).unwrap();
            prop_assert_eq!(pool, neighborhood);
        }
    }

    // Property: connected synapses are always a subset of the potential pool
    #[test]
    fn test_connected_subset_of_pool(
        inputs in prop::collection::vec(input_strategy(144), 1..6),
        seed in 0u64..1000,
    ) {
        let mut pooler = SpatialPooler::new(&small_config(false, seed)).unwrap();
        for input in &inputs {
            pooler.compute(input, true).unwrap();
        }
        for column in 0..pooler.num_columns() {
            let pool = pooler.potential_pool(column).unwrap().to_vec();
            let connected = pooler.connected_synapses(column).unwrap();
            prop_assert!(connected.iter().all(|i| pool.binary_search(i).is_ok()));

            let permanences = pooler.permanences(column).unwrap();
            prop_assert_eq!(permanences.len(), pool.len());
            prop_assert!(permanences.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    // Property: global inhibition with integer k and no threshold yields exactly k winners
    #[test]
    fn test_global_winner_count(input in input_strategy(144), seed in 0u64..1000) {
        let mut pooler = SpatialPooler::new(&small_config(true, seed)).unwrap();
        let winners = pooler.compute(&input, true).unwrap();
        prop_assert_eq!(winners.len(), 4);
        prop_assert!(winners.windows(2).all(|w| w[0] < w[1]));
    }

    // Property: inference never changes the outcome
    #[test]
    fn test_inference_idempotent(input in input_strategy(144), global in any::<bool>()) {
        let mut pooler = SpatialPooler::new(&small_config(global, 42)).unwrap();
        let first = pooler.compute(&input, false).unwrap().to_vec();
        let second = pooler.compute(&input, false).unwrap().to_vec();
        prop_assert_eq!(first, second);
    }
}
