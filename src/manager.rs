use crate::error::{KMeansError, Result};
use crate::memory::Primitive;
use crate::task::TaskPartial;

/// Owner of the k centroids and their per-cluster aggregate statistics.
///
/// The manager is only ever touched by the orchestrator thread between
/// parallel phases: worker tasks compute their own partial sums and the
/// orchestrator folds them in sequentially via [`ClusterManager::merge_partial`].
///
/// ## Fields
/// - **centroids**: Cluster centers \[row-major\] = \[&lt;centroid0&gt;,&lt;centroid1&gt;,...\]
/// - **sums**: Running coordinate-wise sums, same layout as **centroids**
/// - **counts**: Amount of points currently assigned to each centroid
pub(crate) struct ClusterManager<T: Primitive> {
    k: usize,
    dims: usize,
    centroids: Vec<T>,
    sums: Vec<T>,
    counts: Vec<usize>,
}

impl<T: Primitive> ClusterManager<T> {
    pub fn new(k: usize, dims: usize) -> Self {
        Self {
            k,
            dims,
            centroids: vec![T::zero(); k * dims],
            sums: vec![T::zero(); k * dims],
            counts: vec![0usize; k],
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn centroids(&self) -> &[T] {
        &self.centroids
    }

    pub fn cluster_sizes(&self) -> &[usize] {
        &self.counts
    }

    pub fn centroid(&self, cluster_id: usize) -> &[T] {
        &self.centroids[cluster_id * self.dims..(cluster_id + 1) * self.dims]
    }

    /// Copy one externally chosen vector into centroid slot `cluster_id`.
    pub fn set_centroid(&mut self, cluster_id: usize, vector: &[T]) {
        debug_assert_eq!(vector.len(), self.dims);
        self.centroids[cluster_id * self.dims..(cluster_id + 1) * self.dims].copy_from_slice(vector);
    }

    /// Copy externally supplied seed vectors as the initial centroids,
    /// bypassing sampling entirely.
    pub fn assign_seeded_centroids(&mut self, seeds: &[Vec<T>]) -> Result<()> {
        if seeds.len() != self.k {
            return Err(KMeansError::InvalidConfig(format!(
                "expected {} seed centroids, got {}",
                self.k,
                seeds.len()
            )));
        }
        for (cluster_id, seed) in seeds.iter().enumerate() {
            if seed.len() != self.dims {
                return Err(KMeansError::InvalidConfig(format!(
                    "seed centroid {} has {} dimensions, expected {}",
                    cluster_id,
                    seed.len(),
                    self.dims
                )));
            }
            self.set_centroid(cluster_id, seed);
        }
        Ok(())
    }

    /// Squared Euclidean distance between a point and a named centroid.
    pub fn squared_distance(&self, point: &[T], cluster_id: usize) -> T {
        self.centroid(cluster_id)
            .iter()
            .zip(point.iter())
            .map(|(&c, &p)| (p - c) * (p - c))
            .sum()
    }

    /// True (non-squared) Euclidean distance between a point and a named centroid.
    pub fn euclidean(&self, point: &[T], cluster_id: usize) -> T {
        self.squared_distance(point, cluster_id).sqrt()
    }

    /// Arg-min over the squared distances from `point` to every centroid.
    ///
    /// Ties are broken towards the lowest cluster id: a later centroid only
    /// wins with a strictly smaller distance. This keeps assignments
    /// deterministic for a fixed seed and partitioning.
    pub fn find_closest_centroid(&self, point: &[T]) -> (usize, T) {
        let mut best_id = 0;
        let mut best_dist = self.squared_distance(point, 0);
        for cluster_id in 1..self.k {
            let dist = self.squared_distance(point, cluster_id);
            if dist < best_dist {
                best_id = cluster_id;
                best_dist = dist;
            }
        }
        (best_id, best_dist)
    }

    /// Zero all accumulator sums and counts for a fresh aggregation pass.
    /// The centroid values themselves are only overwritten by
    /// [`ClusterManager::normalize_clusters`].
    pub fn reset(&mut self) {
        self.sums.iter_mut().for_each(|v| *v = T::zero());
        self.counts.iter_mut().for_each(|v| *v = 0);
    }

    /// Merge one task's partial per-cluster sums and counts. Commutative and
    /// associative up to floating-point summation order; the fold is driven
    /// sequentially by the orchestrator in partition order.
    pub fn merge_partial(&mut self, partial: &TaskPartial<T>) {
        debug_assert_eq!(partial.sums.len(), self.sums.len());
        self.sums
            .iter_mut()
            .zip(partial.sums.iter())
            .for_each(|(sum, add)| *sum += add);
        self.counts
            .iter_mut()
            .zip(partial.counts.iter())
            .for_each(|(count, add)| *count += add);
    }

    /// Overwrite each centroid with `sum / count` for every cluster with at
    /// least one member. Empty clusters retain their previous centroid, so
    /// this never divides by zero and never produces NaN/Inf.
    pub fn normalize_clusters(&mut self) {
        for (cluster_id, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let divisor = T::from(count).unwrap();
            self.centroids[cluster_id * self.dims..(cluster_id + 1) * self.dims]
                .iter_mut()
                .zip(self.sums[cluster_id * self.dims..(cluster_id + 1) * self.dims].iter())
                .for_each(|(c, &s)| *c = s / divisor);
        }
    }
}
