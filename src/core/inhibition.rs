//! Competitive inhibition: picks the winner columns from the boosted overlap scores.
//!
//! Global inhibition ranks every column against every other column and keeps the top `k`.
//! Local inhibition ranks a column only against the columns within `inhibition_radius` of it in
//! column space, so winners are spread over the whole column space.
//!
//! Ranking is deterministic: a higher score outranks a lower one, and between equal scores the lower
//! column index wins. In local mode every column is judged against the same overlap snapshot and
//! the winners are the union of those independent decisions. A column's neighborhood contains the
//! column itself, so its size is the inhibition area that the density applies to.
//!
//! A column is eligible when its raw overlap clears the stimulus threshold. Under global inhibition
//! an ineligible column scores zero and still competes, so exactly `k` columns win. Under local
//! inhibition an ineligible column never wins and never counts as a competitor.

use super::config::Density;
use super::topology::Topology;
use std::cmp::Ordering;

/// Neighbor lists of every column for one radius, stored back to back.
#[derive(Debug, Clone)]
pub struct Neighborhoods {
    radius: usize,
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Neighborhoods {
    /// Precomputes the neighborhood of every column of `topology`.
    pub fn build(topology: &Topology, radius: usize, wrap_around: bool) -> Self {
        let num_columns = topology.len();
        let mut offsets = Vec::with_capacity(num_columns + 1);
        let mut indices = Vec::new();

        offsets.push(0);
        for column in 0..num_columns {
            let start = indices.len();
            indices.extend(topology.neighborhood(column, radius, wrap_around));
            indices[start..].sort_unstable();
            offsets.push(indices.len());
        }

        Self {
            radius,
            offsets,
            indices,
        }
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// The columns within the radius of `column`, itself included, sorted ascending.
    #[inline]
    pub fn of(&self, column: usize) -> &[usize] {
        &self.indices[self.offsets[column]..self.offsets[column + 1]]
    }
}

/// Whether column `a` outranks column `b` given their scores.
#[inline]
fn outranks(scores: &[f32], a: usize, b: usize) -> bool {
    match scores[a].total_cmp(&scores[b]) {
        Ordering::Greater => true,
        Ordering::Equal => a < b,
        Ordering::Less => false,
    }
}

/// Implements global inhibition, columns are sorted by score, and the top `winners` are selected:
/// - Scores every column that is not eligible as zero.
/// - Sorts all columns by score descending, ties by index ascending.
/// - Keeps the first `winners`, returned in ascending index order.
pub fn inhibit_global(scores: &[f32], eligible: &[bool], winners: usize) -> Vec<usize> {
    let score = |col: usize| if eligible[col] { scores[col] } else { 0.0 };
    let mut candidates: Vec<usize> = (0..scores.len()).collect();
    candidates.sort_unstable_by(|&a, &b| score(b).total_cmp(&score(a)).then(a.cmp(&b)));
    candidates.truncate(winners);
    candidates.sort_unstable();
    candidates
}

/// Implements local inhibition: an eligible column wins when fewer eligible neighbors outrank it
/// than its neighborhood admits winners.
pub fn inhibit_local(
    scores: &[f32],
    eligible: &[bool],
    neighborhoods: &Neighborhoods,
    density: &Density,
) -> Vec<usize> {
    (0..scores.len())
        .filter(|&col| eligible[col])
        .filter(|&col| {
            let neighbors = neighborhoods.of(col);
            let winners = density.winners_for_area(neighbors.len());
            let outranked_by = neighbors
                .iter()
                .filter(|&&n| n != col && eligible[n] && outranks(scores, n, col))
                .count();
            outranked_by < winners
        })
        .collect()
}

/// Inhibition state of a pooler: mode, density, radius and the cached neighbor lists for that radius.
#[derive(Debug, Clone)]
pub struct Inhibition {
    column_topology: Topology,
    global: bool,
    wrap_around: bool,
    density: Density,
    radius: usize,
    neighborhoods: Option<Neighborhoods>,
}

impl Inhibition {
    pub fn new(column_topology: Topology, global: bool, wrap_around: bool, density: Density) -> Self {
        Self {
            column_topology,
            global,
            wrap_around,
            density,
            radius: 1,
            neighborhoods: None,
        }
    }

    #[inline]
    pub fn is_global(&self) -> bool {
        self.global
    }

    #[inline]
    pub fn density(&self) -> Density {
        self.density
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Sets the inhibition radius. Cached neighbor lists are dropped when it changes.
    /// Returns whether the radius changed.
    pub fn set_radius(&mut self, radius: usize) -> bool {
        if radius == self.radius {
            return false;
        }
        self.radius = radius;
        self.neighborhoods = None;
        true
    }

    /// The neighbor lists for the current radius, built on first use.
    pub fn neighborhoods(&mut self) -> &Neighborhoods {
        let (topology, radius, wrap_around) = (&self.column_topology, self.radius, self.wrap_around);
        self.neighborhoods
            .get_or_insert_with(|| Neighborhoods::build(topology, radius, wrap_around))
    }

    /// Selects the winner columns for this cycle, in ascending index order.
    pub fn select(&mut self, scores: &[f32], eligible: &[bool]) -> Vec<usize> {
        if self.global {
            let winners = self.density.winners_for_area(scores.len());
            inhibit_global(scores, eligible, winners)
        } else {
            let density = self.density;
            inhibit_local(scores, eligible, self.neighborhoods(), &density)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_picks_top_k_with_index_tie_break() {
        let scores = [1.0, 3.0, 3.0, 0.0, 2.0, 3.0];
        let eligible = [true; 6];
        assert_eq!(inhibit_global(&scores, &eligible, 2), vec![1, 2]);
        assert_eq!(inhibit_global(&scores, &eligible, 4), vec![1, 2, 4, 5]);
        assert_eq!(inhibit_global(&scores, &eligible, 10).len(), 6);
    }

    #[test]
    fn test_global_scores_ineligible_columns_as_zero() {
        let scores = [5.0, 4.0, 3.0, 2.0];
        let eligible = [false, true, true, false];
        assert_eq!(inhibit_global(&scores, &eligible, 2), vec![1, 2]);
        // Both ineligible columns tie at zero and the lower index fills the last slot.
        assert_eq!(inhibit_global(&scores, &eligible, 3), vec![0, 1, 2]);
        assert_eq!(inhibit_global(&scores, &[false; 4], 2), vec![0, 1]);
    }

    #[test]
    fn test_global_exact_count_with_all_ties() {
        let scores = [0.0; 10];
        let eligible = [true; 10];
        assert_eq!(inhibit_global(&scores, &eligible, 3), vec![0, 1, 2]);
    }

    #[test]
    fn test_neighborhoods_include_self() {
        let topology = Topology::new(&[6]);
        let neighborhoods = Neighborhoods::build(&topology, 1, false);
        assert_eq!(neighborhoods.of(0), &[0, 1]);
        assert_eq!(neighborhoods.of(3), &[2, 3, 4]);

        let wrapped = Neighborhoods::build(&topology, 1, true);
        assert_eq!(wrapped.of(0), &[0, 1, 5]);
        assert_eq!(wrapped.radius(), 1);
    }

    #[test]
    fn test_local_picks_winners_per_neighborhood() {
        let topology = Topology::new(&[8]);
        let neighborhoods = Neighborhoods::build(&topology, 1, false);
        let scores = [5.0, 1.0, 0.0, 0.0, 0.0, 2.0, 6.0, 1.0];
        let eligible = [true; 8];
        let density = Density::ActivePerInhArea(1.0);
        assert_eq!(inhibit_local(&scores, &eligible, &neighborhoods, &density), vec![0, 6]);

        // Without column 5 competing, column 4 only ties with column 3 and loses on index,
        // while column 5 itself cannot win.
        let mut eligible = [true; 8];
        eligible[5] = false;
        assert_eq!(inhibit_local(&scores, &eligible, &neighborhoods, &density), vec![0, 6]);
    }

    #[test]
    fn test_local_never_admits_ineligible_columns() {
        let topology = Topology::new(&[6]);
        let neighborhoods = Neighborhoods::build(&topology, 2, false);
        let density = Density::ActivePerInhArea(2.0);
        assert!(inhibit_local(&[0.0; 6], &[false; 6], &neighborhoods, &density).is_empty());

        let eligible = [false, false, true, false, false, false];
        assert_eq!(inhibit_local(&[0.0; 6], &eligible, &neighborhoods, &density), vec![2]);
    }

    #[test]
    fn test_local_ties_go_to_lower_index() {
        let topology = Topology::new(&[3]);
        let neighborhoods = Neighborhoods::build(&topology, 1, false);
        let winners = inhibit_local(
            &[3.0, 3.0, 3.0],
            &[true; 3],
            &neighborhoods,
            &Density::ActivePerInhArea(1.0),
        );
        assert_eq!(winners, vec![0]);
    }

    #[test]
    fn test_local_admits_isolated_peaks() {
        let topology = Topology::new(&[9]);
        let neighborhoods = Neighborhoods::build(&topology, 1, false);
        let scores = [4.0, 0.0, 0.0, 0.0, 4.0, 0.0, 1.0, 0.0, 3.0];
        let winners = inhibit_local(
            &scores,
            &[true; 9],
            &neighborhoods,
            &Density::ActivePerInhArea(1.0),
        );
        assert_eq!(winners, vec![0, 4, 6, 8]);
    }

    #[test]
    fn test_local_uses_density_of_neighborhood() {
        let topology = Topology::new(&[4, 4]);
        let neighborhoods = Neighborhoods::build(&topology, 3, false);
        let scores: Vec<f32> = (0..16).map(|c| c as f32).collect();
        let eligible = [true; 16];
        // Every neighborhood is the whole space: round(0.25 * 16) = 4 winners.
        let winners = inhibit_local(&scores, &eligible, &neighborhoods, &Density::LocalArea(0.25));
        assert_eq!(winners, vec![12, 13, 14, 15]);
    }

    #[test]
    fn test_select_rebuilds_neighborhoods_on_radius_change() {
        let mut inhibition =
            Inhibition::new(Topology::new(&[10]), false, false, Density::ActivePerInhArea(1.0));
        let scores: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0, 0.5];
        let eligible = [true; 10];

        assert_eq!(inhibition.select(&scores, &eligible), vec![4]);
        assert!(!inhibition.set_radius(1));
        assert!(inhibition.set_radius(0));
        assert_eq!(inhibition.neighborhoods().radius(), 0);
        assert_eq!(inhibition.select(&scores, &eligible).len(), 10);
    }

    #[test]
    fn test_select_global() {
        let mut inhibition =
            Inhibition::new(Topology::new(&[5]), true, false, Density::LocalArea(0.4));
        let scores = [1.0, 9.0, 3.0, 9.0, 0.0];
        assert_eq!(inhibition.select(&scores, &[true; 5]), vec![1, 3]);
    }
}
