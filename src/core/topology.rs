//! Topology represents an N-dimensional space through a list of dimensions and corresponding stride values.
//! The struct provides methods to convert between linear indices and coordinates in this N-dimensional space,
//! and also offers a way to iterate over neighborhoods of that space within a radius of a given center index.
//!
//! In the Spatial Pooler both the input space and the column space are N-dimensional.
//! Potential pools are drawn from input-space neighborhoods, and local inhibition competes within
//! column-space neighborhoods. Topology keeps the relationship between flat indices and coordinates
//! for an arbitrary number of dimensions by tracking each dimension size and its stride.
//!
//! The free functions at the bottom of this module are the small array helpers the pooler needs:
//! products of dimension lists, reducing a dimension list to fewer axes, and reshaping flat data.

use std::cmp::{max, min};

/// Represents the shape of an N-dimensional space, along with precomputed stride values for
/// linear index conversions. The `dims` field stores the size of each dimension, while `strides`
/// stores the cumulative product of dimension sizes to enable fast index calculations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl Topology {
    /// Creates a new `Topology` from a slice of dimension sizes.
    #[inline]
    pub fn new(dimensions: &[usize]) -> Self {
        let dims = dimensions.to_vec();
        let strides = Self::strides(&dims);

        Self { dims, strides }
    }

    /// Computes the stride values for each dimension in a given slice of dimension sizes.
    /// Strides are used to convert coordinates in N-dimensional space into a single linear index.
    #[inline]
    fn strides(dims: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; dims.len()];

        for i in (0..dims.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * dims[i + 1];
        }

        strides
    }

    /// The size of every dimension, outermost first.
    #[inline]
    pub fn dimensions(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of points in the space.
    #[inline]
    pub fn len(&self) -> usize {
        product(&self.dims)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts a linear index into its corresponding set of coordinates in the topology's N-dimensional space.
    /// Each element of the returned `Vec<usize>` is the coordinate along one of the dimensions, in order.
    #[inline]
    pub fn coordinates(&self, index: usize) -> Vec<usize> {
        let mut remainder = index;

        self.strides
            .iter()
            .map(|&stride| {
                let coord = remainder / stride;
                remainder %= stride;
                coord
            })
            .collect()
    }

    /// Converts a set of coordinates in the topology's N-dimensional space to a single linear index.
    /// The length of `coords` must match the number of dimensions in the topology.
    #[inline]
    pub fn index_from_coordinates(&self, coords: &[usize]) -> usize {
        coords.iter().zip(&self.strides).map(|(&c, &s)| c * s).sum()
    }

    /// Returns an iterator over the hyper-square neighborhood of indices within Chebyshev distance
    /// `radius` of the specified `center` index. If `wrapping` is true, the neighborhood wraps around
    /// the edges of the topology like a torus; otherwise, it is clipped at the boundaries.
    ///
    /// Every index is yielded at most once, even when the neighborhood is wider than an axis.
    #[inline]
    pub fn neighborhood(&self, center: usize, radius: usize, wrapping: bool) -> NeighborhoodIter<'_> {
        let center_coords = self.coordinates(center);
        let radius = radius as isize;

        let bounds: Vec<(isize, isize)> = center_coords
            .iter()
            .zip(&self.dims)
            .map(|(&c, &dim)| {
                let c = c as isize;
                let dim = dim as isize;

                if wrapping {
                    let span = min(2 * radius + 1, dim);
                    (c - radius, c - radius + span)
                } else {
                    (max(c - radius, 0), min(c + radius + 1, dim))
                }
            })
            .collect();

        let remaining = bounds
            .iter()
            .map(|&(low, high)| (high - low).max(0) as usize)
            .product();
        let current = (remaining > 0).then(|| bounds.iter().map(|&(low, _)| low).collect());

        NeighborhoodIter {
            topology: self,
            bounds,
            current,
            remaining,
            wrapping,
        }
    }
}

/// An iterator that yields all valid indices within a neighborhood of a central index in the `Topology`.
/// The neighborhood is defined by a radius around the center, with optional wrapping behavior.
pub struct NeighborhoodIter<'a> {
    topology: &'a Topology,
    bounds: Vec<(isize, isize)>,
    current: Option<Vec<isize>>,
    remaining: usize,
    wrapping: bool,
}

impl Iterator for NeighborhoodIter<'_> {
    type Item = usize;

    /// Returns the next index within the neighborhood. When all indices have been visited, it returns `None`.
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.as_mut()?;

        let result = current
            .iter()
            .zip(&self.topology.dims)
            .zip(&self.topology.strides)
            .map(|((&val, &dim), &stride)| {
                let coord = if self.wrapping {
                    val.rem_euclid(dim as isize)
                } else {
                    val
                };
                coord as usize * stride
            })
            .sum();

        self.remaining -= 1;

        for i in (0..current.len()).rev() {
            if current[i] + 1 < self.bounds[i].1 {
                current[i] += 1;

                current
                    .iter_mut()
                    .enumerate()
                    .skip(i + 1)
                    .for_each(|(j, item)| *item = self.bounds[j].0);

                return Some(result);
            }
        }

        self.current = None;

        Some(result)
    }

    /// The neighborhood size is known up front, so both bounds are exact.
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for NeighborhoodIter<'_> {}

/// Product of a list of dimensions. An empty list describes an empty space.
#[inline]
pub fn product(dimensions: &[usize]) -> usize {
    if dimensions.is_empty() {
        return 0;
    }
    dimensions.iter().product()
}

/// Reduces `dimensions` to `num_dimensions` axes by folding every trailing axis into the last kept one.
/// Row-major flat indices are preserved: `[12, 2, 2]` reduced to two axes is `[12, 4]`.
///
/// Lists that are already short enough are returned unchanged.
pub fn reduce_dimensions(dimensions: &[usize], num_dimensions: usize) -> Vec<usize> {
    if num_dimensions == 0 || dimensions.len() <= num_dimensions {
        return dimensions.to_vec();
    }

    let mut reduced = dimensions[..num_dimensions].to_vec();
    reduced[num_dimensions - 1] *= dimensions[num_dimensions..].iter().product::<usize>();
    reduced
}

/// A nested N-dimensional view over flat data, outermost axis first.
#[derive(Debug, Clone, PartialEq)]
pub enum NdArray<T> {
    /// The innermost axis.
    Leaf(Vec<T>),
    /// One entry per index of an outer axis.
    Nested(Vec<NdArray<T>>),
}

impl<T> NdArray<T> {
    /// Number of entries along the outermost axis.
    pub fn len(&self) -> usize {
        match self {
            NdArray::Leaf(items) => items.len(),
            NdArray::Nested(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walks down the nested axes along `point` and returns the element found there.
    pub fn get(&self, point: &[usize]) -> Option<&T> {
        match (self, point) {
            (NdArray::Leaf(items), [index]) => items.get(*index),
            (NdArray::Nested(rows), [index, rest @ ..]) => rows.get(*index)?.get(rest),
            _ => None,
        }
    }
}

/// Splits `items` into consecutive groups of `per_group` elements; the last group may be shorter.
pub fn group<T: Clone>(items: &[T], per_group: usize) -> Vec<Vec<T>> {
    items
        .chunks(per_group.max(1))
        .map(<[T]>::to_vec)
        .collect()
}

/// Reshapes flat row-major data into a nested array with the given dimensions.
/// `items.len()` is expected to equal `product(dimensions)`.
pub fn reshape<T: Clone>(items: &[T], dimensions: &[usize]) -> NdArray<T> {
    match dimensions {
        [] | [_] => NdArray::Leaf(items.to_vec()),
        [_, inner @ ..] => NdArray::Nested(
            group(items, product(inner))
                .iter()
                .map(|chunk| reshape(chunk, inner))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(iter: impl Iterator<Item = usize>) -> Vec<usize> {
        let mut v: Vec<usize> = iter.collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_coordinates_round_trip_2d() {
        let topology = Topology::new(&[5, 10]);
        assert_eq!(topology.coordinates(0), vec![0, 0]);
        assert_eq!(topology.coordinates(13), vec![1, 3]);
        assert_eq!(topology.coordinates(49), vec![4, 9]);
        assert_eq!(topology.index_from_coordinates(&[1, 3]), 13);
        assert_eq!(topology.len(), 50);
    }

    #[test]
    fn test_neighborhood_clipped_1d() {
        let topology = Topology::new(&[10]);
        assert_eq!(sorted(topology.neighborhood(0, 2, false)), vec![0, 1, 2]);
        assert_eq!(sorted(topology.neighborhood(6, 2, false)), vec![4, 5, 6, 7, 8]);
        assert_eq!(topology.neighborhood(9, 2, false).len(), 3);
    }

    #[test]
    fn test_neighborhood_wrapping_1d() {
        let topology = Topology::new(&[10]);
        let wrapped: Vec<usize> = topology.neighborhood(0, 2, true).collect();
        assert_eq!(wrapped, vec![8, 9, 0, 1, 2]);
    }

    #[test]
    fn test_neighborhood_wider_than_axis_visits_each_index_once() {
        let topology = Topology::new(&[4]);
        assert_eq!(sorted(topology.neighborhood(1, 7, true)), vec![0, 1, 2, 3]);
        assert_eq!(sorted(topology.neighborhood(1, 7, false)), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_neighborhood_wrapping_2d() {
        let topology = Topology::new(&[5, 10]);
        assert_eq!(
            sorted(topology.neighborhood(0, 1, true)),
            vec![0, 1, 9, 10, 11, 19, 40, 41, 49]
        );
        assert_eq!(sorted(topology.neighborhood(0, 1, false)), vec![0, 1, 10, 11]);
    }

    #[test]
    fn test_neighborhood_size_hint_tracks_progress() {
        let topology = Topology::new(&[3, 3]);
        let mut iter = topology.neighborhood(4, 1, false);
        assert_eq!(iter.size_hint(), (9, Some(9)));
        iter.next();
        iter.next();
        assert_eq!(iter.len(), 7);
        assert_eq!(iter.count(), 7);
    }

    #[test]
    fn test_product() {
        assert_eq!(product(&[12, 4]), 48);
        assert_eq!(product(&[7]), 7);
        assert_eq!(product(&[]), 0);
        assert_eq!(product(&[3, 0]), 0);
    }

    #[test]
    fn test_reduce_dimensions() {
        assert_eq!(reduce_dimensions(&[12, 2, 2], 2), vec![12, 4]);
        assert_eq!(reduce_dimensions(&[20, 5, 2], 1), vec![200]);
        assert_eq!(reduce_dimensions(&[20, 10], 2), vec![20, 10]);
        assert_eq!(reduce_dimensions(&[20, 10], 3), vec![20, 10]);
    }

    #[test]
    fn test_group_and_reshape() {
        let flat: Vec<usize> = (0..12).collect();
        assert_eq!(group(&flat, 5).len(), 3);
        assert_eq!(group(&flat, 5)[2], vec![10, 11]);

        let nested = reshape(&flat, &[2, 3, 2]);
        assert_eq!(nested.len(), 2);
        assert_eq!(nested.get(&[0, 0, 0]), Some(&0));
        assert_eq!(nested.get(&[1, 2, 1]), Some(&11));
        assert_eq!(nested.get(&[1, 1, 0]), Some(&8));
        assert_eq!(nested.get(&[2, 0, 0]), None);
        assert_eq!(nested.get(&[1, 1]), None);
    }
}
