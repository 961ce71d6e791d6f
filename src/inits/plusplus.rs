use crate::manager::ClusterManager;
use crate::memory::Primitive;
use crate::task::{self, Phase};
use crate::KMeans;
use rand::distributions::WeightedIndex;
use rand::prelude::*;

/// K-Means++ weighted sequential sampling.
///
/// The first centroid is chosen uniformly. Each subsequent centroid requires
/// one full-data parallel Seed pass against the just-chosen centroid, after
/// which the next source point is drawn with probability proportional to its
/// squared distance to the nearest already-chosen centroid. This makes it the
/// most expensive seeding strategy, but it yields provably better expected
/// starting quality than uniform sampling.
///
/// `assignments` and `distances` are the restart's working arrays; they come
/// out holding the tentative nearest-centroid bookkeeping among the first
/// k-1 centroids, which the first real assignment pass then overwrites.
pub(crate) fn calculate<T: Primitive, R: Rng>(
    data: &KMeans<T>,
    manager: &mut ClusterManager<T>,
    assignments: &mut [usize],
    distances: &mut [T],
    partition_size: usize,
    rnd: &mut R,
) {
    let first = rnd.gen_range(0..data.sample_cnt);
    manager.set_centroid(0, data.sample(first));

    for cluster_id in 1..manager.k() {
        let partials = task::run_phase(
            data,
            manager,
            assignments,
            distances,
            partition_size,
            Phase::Seed { latest: cluster_id - 1 },
        );
        let squared_total: T = partials.iter().map(|p| p.squared_total).sum();

        // Points coinciding with an already-chosen centroid carry zero weight.
        // When every weight is zero the draw degrades to a uniform one.
        let sampled_id = if squared_total > T::zero() {
            match WeightedIndex::new(distances.iter().cloned()) {
                Ok(weighted) => weighted.sample(rnd),
                Err(_) => rnd.gen_range(0..data.sample_cnt),
            }
        } else {
            rnd.gen_range(0..data.sample_cnt)
        };
        manager.set_centroid(cluster_id, data.sample(sampled_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::UNASSIGNED;
    use rand_chacha::ChaCha8Rng;

    fn run_plusplus(samples: Vec<f64>, k: usize, seed: u64) -> ClusterManager<f64> {
        let cnt = samples.len();
        let data = KMeans::new(samples, cnt, 1);
        let mut manager = ClusterManager::new(k, 1);
        let mut assignments = vec![UNASSIGNED; cnt];
        let mut distances = vec![f64::INFINITY; cnt];
        let mut rnd = ChaCha8Rng::seed_from_u64(seed);
        calculate(&data, &mut manager, &mut assignments, &mut distances, 2, &mut rnd);
        manager
    }

    #[test]
    fn chooses_distinct_existing_samples() {
        let samples = vec![0.0, 1.0, 2.0, 10.0, 11.0, 100.0];
        for seed in 0..20 {
            let manager = run_plusplus(samples.clone(), 3, seed);
            let centroids = manager.centroids();
            for c in centroids {
                assert!(samples.contains(c));
            }
            // Zero weight for exact matches guarantees pairwise distinct picks.
            assert_ne!(centroids[0], centroids[1]);
            assert_ne!(centroids[0], centroids[2]);
            assert_ne!(centroids[1], centroids[2]);
        }
    }

    #[test]
    fn identical_points_fall_back_to_uniform_draw() {
        // All weights are zero after the first pick; the draw must not panic.
        let manager = run_plusplus(vec![5.0; 8], 3, 1);
        assert_eq!(manager.centroids(), &[5.0, 5.0, 5.0]);
    }

    #[test]
    fn reproducible_for_fixed_seed() {
        let samples: Vec<f64> = (0..50).map(|v| (v * v) as f64).collect();
        let first = run_plusplus(samples.clone(), 5, 99);
        let second = run_plusplus(samples, 5, 99);
        assert_eq!(first.centroids(), second.centroids());
    }
}
