use crate::manager::ClusterManager;
use crate::memory::Primitive;
use crate::KMeans;
use rayon::prelude::*;

/// Sentinel for a point that has not been assigned to any cluster yet.
/// The first assignment pass of a restart counts every point as a swap.
pub(crate) const UNASSIGNED: usize = usize::MAX;

/// The work a task performs over its partition. A task has no persistent
/// mutable phase field; the phase is passed into every invocation, so a task
/// cannot be run in the wrong phase by mistake.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Phase {
    /// Reassign every point in range to its closest centroid, counting swaps
    /// and accumulating per-cluster sums/counts.
    Assign,
    /// K-Means++ seeding round: compare every point against the most recently
    /// chosen centroid and keep the smaller of the recorded and new squared
    /// nearest distance.
    Seed { latest: usize },
    /// Compute the true Euclidean distance of every point to its already
    /// assigned centroid.
    FinalDistance,
}

/// Owned, immutable partial result returned by one task invocation.
///
/// Workers never mutate shared aggregate state during the parallel phase;
/// the orchestrator folds these partials into the [`ClusterManager`]
/// sequentially after the join barrier.
pub(crate) struct TaskPartial<T: Primitive> {
    /// Points in range whose assignment changed this pass.
    pub swaps: usize,
    /// Per-cluster coordinate-wise sums \[row-major\], for centroid updates.
    pub sums: Vec<T>,
    /// Per-cluster population tally within this partition.
    pub counts: Vec<usize>,
    /// Sum of true Euclidean distances (FinalDistance phase).
    pub distance_total: T,
    /// Sum of squared nearest-centroid distances (Seed phase).
    pub squared_total: T,
}

impl<T: Primitive> TaskPartial<T> {
    pub fn new(k: usize, dims: usize) -> Self {
        Self {
            swaps: 0,
            sums: vec![T::zero(); k * dims],
            counts: vec![0usize; k],
            distance_total: T::zero(),
            squared_total: T::zero(),
        }
    }

    pub fn add_to_cluster(&mut self, cluster_id: usize, point: &[T]) {
        let dims = point.len();
        self.sums[cluster_id * dims..(cluster_id + 1) * dims]
            .iter_mut()
            .zip(point.iter())
            .for_each(|(sum, &v)| *sum += v);
        self.counts[cluster_id] += 1;
    }
}

/// Run one task over its half-open range of point indices.
///
/// `assignments` and `distances` are the task's disjoint slices of the shared
/// arrays; `range_start` is the absolute index of the first slot.
pub(crate) fn run_task<T: Primitive>(
    data: &KMeans<T>,
    manager: &ClusterManager<T>,
    range_start: usize,
    assignments: &mut [usize],
    distances: &mut [T],
    phase: Phase,
) -> TaskPartial<T> {
    let mut partial = TaskPartial::new(manager.k(), data.sample_dims);
    for (offset, (assignment, distance)) in
        assignments.iter_mut().zip(distances.iter_mut()).enumerate()
    {
        let point = data.sample(range_start + offset);
        match phase {
            Phase::Assign => {
                let (closest, squared) = manager.find_closest_centroid(point);
                if *assignment != closest {
                    partial.swaps += 1;
                    *assignment = closest;
                }
                *distance = squared;
                partial.add_to_cluster(closest, point);
            }
            Phase::Seed { latest } => {
                let squared = manager.squared_distance(point, latest);
                if squared < *distance {
                    *distance = squared;
                    *assignment = latest;
                }
                partial.squared_total += *distance;
            }
            Phase::FinalDistance => {
                let dist = manager.euclidean(point, *assignment);
                *distance = dist;
                partial.distance_total += dist;
            }
        }
    }
    partial
}

/// Execute a batch of tasks over the whole point range: parallel fork with a
/// synchronous join barrier. Each task owns one contiguous chunk of the
/// assignment and distance arrays, so no two tasks ever write the same slot.
pub(crate) fn run_phase<T: Primitive>(
    data: &KMeans<T>,
    manager: &ClusterManager<T>,
    assignments: &mut [usize],
    distances: &mut [T],
    partition_size: usize,
    phase: Phase,
) -> Vec<TaskPartial<T>> {
    assignments
        .par_chunks_mut(partition_size)
        .zip(distances.par_chunks_mut(partition_size))
        .enumerate()
        .map(|(chunk_id, (assignment_chunk, distance_chunk))| {
            run_task(
                data,
                manager,
                chunk_id * partition_size,
                assignment_chunk,
                distance_chunk,
                phase,
            )
        })
        .collect()
}
