//! Pareto utilities for many-objective search
//! Implements NSGA-II style fast non-dominated sorting and crowding distance
//! over goal distances (all objectives are minimised).

use rayon::prelude::*;

/// Individual with multiple objective values
#[derive(Debug, Clone)]
pub struct MultiObjectiveIndividual<T> {
    pub data: T,
    pub objectives: Vec<f64>,
    pub rank: usize,           // Pareto rank (0 = best frontier)
    pub crowding_distance: f64, // Diversity measure
}

impl<T> MultiObjectiveIndividual<T> {
    pub fn new(data: T, objectives: Vec<f64>) -> Self {
        Self {
            data,
            objectives,
            rank: 0,
            crowding_distance: 0.0,
        }
    }
}

/// Check if individual A dominates individual B
/// A dominates B if A is no worse than B on every goal and strictly closer on at least one
pub fn dominates(a_objectives: &[f64], b_objectives: &[f64]) -> bool {
    if a_objectives.len() != b_objectives.len() {
        return false;
    }

    let mut at_least_one_better = false;

    for (a_val, b_val) in a_objectives.iter().zip(b_objectives) {
        if b_val < a_val {
            // B is closer on this goal, so A does not dominate B
            return false;
        }
        if a_val < b_val {
            at_least_one_better = true;
        }
    }

    at_least_one_better
}

/// Fast non-dominated sorting (NSGA-II algorithm)
/// Returns individuals grouped by Pareto front (0 = best, 1 = second best, etc.)
pub fn fast_non_dominated_sort<T: Send + Sync>(
    individuals: &mut [MultiObjectiveIndividual<T>],
) -> Vec<Vec<usize>> {
    let n = individuals.len();
    if n == 0 {
        return Vec::new();
    }

    // For each individual, track:
    // - domination_count: how many individuals dominate it
    // - dominated_solutions: indices of individuals it dominates
    let relations: Vec<(usize, Vec<usize>)> = {
        let view: &[MultiObjectiveIndividual<T>] = individuals;
        (0..n)
            .into_par_iter()
            .map(|i| {
                let mut count = 0;
                let mut dominated = Vec::new();
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    if dominates(&view[i].objectives, &view[j].objectives) {
                        dominated.push(j);
                    } else if dominates(&view[j].objectives, &view[i].objectives) {
                        count += 1;
                    }
                }
                (count, dominated)
            })
            .collect()
    };

    let mut domination_count: Vec<usize> = relations.iter().map(|(c, _)| *c).collect();
    let dominated_solutions: Vec<Vec<usize>> = relations.into_iter().map(|(_, d)| d).collect();
    let mut fronts: Vec<Vec<usize>> = Vec::new();

    // First front (non-dominated individuals)
    let first_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    for &i in &first_front {
        individuals[i].rank = 0;
    }
    fronts.push(first_front);

    // Generate subsequent fronts
    let mut front_index = 0;
    while front_index < fronts.len() && !fronts[front_index].is_empty() {
        let mut next_front = Vec::new();

        for &i in &fronts[front_index] {
            for &j in &dominated_solutions[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    individuals[j].rank = front_index + 1;
                    next_front.push(j);
                }
            }
        }

        if !next_front.is_empty() {
            fronts.push(next_front);
        }
        front_index += 1;
    }

    fronts
}

/// Calculate crowding distance for individuals in a front
/// Crowding distance measures how close an individual is to its neighbors
/// Higher values indicate more diversity (isolated individuals)
pub fn calculate_crowding_distance<T>(
    individuals: &mut [MultiObjectiveIndividual<T>],
    front_indices: &[usize],
) {
    let front_size = front_indices.len();
    if front_size == 0 {
        return;
    }

    if front_size <= 2 {
        // Boundary solutions have infinite crowding distance
        for &idx in front_indices {
            individuals[idx].crowding_distance = f64::INFINITY;
        }
        return;
    }

    let num_objectives = individuals[front_indices[0]].objectives.len();

    for &idx in front_indices {
        individuals[idx].crowding_distance = 0.0;
    }

    for obj in 0..num_objectives {
        // Sort front by this goal's distance
        let mut sorted_indices: Vec<usize> = front_indices.to_vec();
        sorted_indices.sort_by(|&a, &b| {
            individuals[a].objectives[obj]
                .partial_cmp(&individuals[b].objectives[obj])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        // Boundary points have infinite distance
        individuals[sorted_indices[0]].crowding_distance = f64::INFINITY;
        individuals[sorted_indices[front_size - 1]].crowding_distance = f64::INFINITY;

        let min_val = individuals[sorted_indices[0]].objectives[obj];
        let max_val = individuals[sorted_indices[front_size - 1]].objectives[obj];
        let range = max_val - min_val;

        if !range.is_finite() || range.abs() < 1e-10 {
            // All values are the same for this goal
            continue;
        }

        for i in 1..(front_size - 1) {
            let idx = sorted_indices[i];
            let prev_val = individuals[sorted_indices[i - 1]].objectives[obj];
            let next_val = individuals[sorted_indices[i + 1]].objectives[obj];

            individuals[idx].crowding_distance += (next_val - prev_val) / range;
        }
    }
}

/// Compare two individuals for selection (crowded comparison operator)
/// Returns true if individual A should be preferred over individual B
pub fn crowded_comparison(a_rank: usize, a_distance: f64, b_rank: usize, b_distance: f64) -> bool {
    // Prefer lower rank (better Pareto front)
    if a_rank < b_rank {
        return true;
    }
    if a_rank > b_rank {
        return false;
    }

    // Same rank: prefer higher crowding distance (more diverse)
    a_distance > b_distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance_minimize() {
        // A is closer on both goals
        assert!(dominates(&[1.0, 2.0], &[5.0, 10.0]));

        // A is closer on one, equal on other
        assert!(dominates(&[1.0, 10.0], &[5.0, 10.0]));

        // A is closer on one, further on other - no dominance
        assert!(!dominates(&[1.0, 15.0], &[5.0, 10.0]));

        // Equal on both - no dominance
        assert!(!dominates(&[3.0, 3.0], &[3.0, 3.0]));
    }

    #[test]
    fn test_dominance_length_mismatch() {
        assert!(!dominates(&[0.0], &[1.0, 1.0]));
        assert!(!dominates(&[1.0, 1.0], &[2.0]));
    }

    #[test]
    fn test_fast_non_dominated_sort() {
        let mut individuals = vec![
            MultiObjectiveIndividual::new(0, vec![5.0, 1.0]), // Front 0
            MultiObjectiveIndividual::new(1, vec![3.0, 3.0]), // Front 0
            MultiObjectiveIndividual::new(2, vec![1.0, 5.0]), // Front 0
            MultiObjectiveIndividual::new(3, vec![4.0, 4.0]), // Front 1
            MultiObjectiveIndividual::new(4, vec![5.0, 5.0]), // Front 2
        ];

        let fronts = fast_non_dominated_sort(&mut individuals);

        assert_eq!(fronts.len(), 3);
        assert_eq!(fronts[0].len(), 3);
        assert_eq!(individuals[0].rank, 0);
        assert_eq!(individuals[1].rank, 0);
        assert_eq!(individuals[2].rank, 0);
        assert_eq!(individuals[3].rank, 1);
        assert_eq!(individuals[4].rank, 2);
    }

    #[test]
    fn test_equal_vectors_share_a_front() {
        let mut individuals = vec![
            MultiObjectiveIndividual::new(0, vec![2.0, 2.0]),
            MultiObjectiveIndividual::new(1, vec![2.0, 2.0]),
            MultiObjectiveIndividual::new(2, vec![3.0, 3.0]),
        ];
        let fronts = fast_non_dominated_sort(&mut individuals);
        assert_eq!(fronts, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_fronts_partition_and_order() {
        let vectors = [
            [0.3, 0.9, 0.1],
            [0.5, 0.5, 0.5],
            [0.9, 0.1, 0.7],
            [0.6, 0.6, 0.6],
            [0.2, 0.95, 0.3],
            [1.0, 1.0, 1.0],
            [0.5, 0.5, 0.5],
        ];
        let mut individuals: Vec<_> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| MultiObjectiveIndividual::new(i, v.to_vec()))
            .collect();
        let fronts = fast_non_dominated_sort(&mut individuals);

        // Every individual lands in exactly one front
        let mut seen: Vec<usize> = fronts.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..vectors.len()).collect::<Vec<_>>());

        for (k, front) in fronts.iter().enumerate() {
            for &a in front {
                for &b in front {
                    assert!(!dominates(&individuals[a].objectives, &individuals[b].objectives));
                }
                if k > 0 {
                    let dominated_by_previous = fronts[k - 1]
                        .iter()
                        .any(|&p| dominates(&individuals[p].objectives, &individuals[a].objectives));
                    assert!(dominated_by_previous);
                }
            }
        }
    }

    #[test]
    fn test_crowding_distance_extremes_are_infinite() {
        let mut individuals = vec![
            MultiObjectiveIndividual::new(0, vec![1.0, 5.0]),
            MultiObjectiveIndividual::new(1, vec![2.0, 4.0]),
            MultiObjectiveIndividual::new(2, vec![3.0, 3.0]),
            MultiObjectiveIndividual::new(3, vec![5.0, 1.0]),
        ];

        let fronts = fast_non_dominated_sort(&mut individuals);
        assert_eq!(fronts.len(), 1);
        calculate_crowding_distance(&mut individuals, &fronts[0]);

        assert!(individuals[0].crowding_distance.is_infinite());
        assert!(individuals[3].crowding_distance.is_infinite());
        assert!(individuals[1].crowding_distance.is_finite());
        assert!(individuals[2].crowding_distance.is_finite());
        // (3-1)/4 + (5-3)/4 for the second point
        assert!((individuals[1].crowding_distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_crowded_comparison() {
        assert!(crowded_comparison(0, 0.1, 1, f64::INFINITY));
        assert!(crowded_comparison(1, 2.0, 1, 1.0));
        assert!(!crowded_comparison(1, 1.0, 1, 1.0));
    }
}
