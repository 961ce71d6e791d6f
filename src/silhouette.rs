use crate::memory::Primitive;
use crate::KMeans;
use rayon::prelude::*;

/// Per-point silhouette scores plus their overall average.
///
/// Strictly read-only over the winning restart's assignment: for each point,
/// `a` is the mean distance to the other members of its own cluster, `b` the
/// smallest mean distance to any other non-empty cluster, and the score is
/// `(b - a) / max(a, b)`. Points alone in their cluster score 0, as do points
/// with no other non-empty cluster to compare against.
///
/// Range-partitioned like the main clustering phases: each parallel task owns
/// a disjoint chunk of the score array.
pub(crate) fn score<T: Primitive>(
    data: &KMeans<T>,
    assignments: &[usize],
    cluster_sizes: &[usize],
    partition_size: usize,
) -> (Vec<T>, T) {
    let point_cnt = data.sample_cnt;
    if point_cnt == 0 {
        return (Vec::new(), T::zero());
    }
    let k = cluster_sizes.len();

    let mut scores = vec![T::zero(); point_cnt];
    scores
        .par_chunks_mut(partition_size)
        .enumerate()
        .for_each(|(chunk_id, out)| {
            let range_start = chunk_id * partition_size;
            for (offset, slot) in out.iter_mut().enumerate() {
                let idx = range_start + offset;
                let own = assignments[idx];
                if cluster_sizes[own] <= 1 {
                    continue;
                }
                let point = data.sample(idx);

                let mut totals = vec![T::zero(); k];
                for other_idx in 0..point_cnt {
                    if other_idx == idx {
                        continue;
                    }
                    let other = data.sample(other_idx);
                    let dist = point
                        .iter()
                        .zip(other.iter())
                        .map(|(&a, &b)| (a - b) * (a - b))
                        .sum::<T>()
                        .sqrt();
                    totals[assignments[other_idx]] += dist;
                }

                let intra = totals[own] / T::from(cluster_sizes[own] - 1).unwrap();
                let mut nearest_other = T::infinity();
                for cluster_id in 0..k {
                    if cluster_id == own || cluster_sizes[cluster_id] == 0 {
                        continue;
                    }
                    let mean = totals[cluster_id] / T::from(cluster_sizes[cluster_id]).unwrap();
                    if mean < nearest_other {
                        nearest_other = mean;
                    }
                }
                if !nearest_other.is_finite() {
                    continue;
                }
                let denominator = intra.max(nearest_other);
                if denominator > T::zero() {
                    *slot = (nearest_other - intra) / denominator;
                }
            }
        });

    let total: T = scores.iter().cloned().sum();
    (scores, total / T::from(point_cnt).unwrap())
}
