use crate::error::{KMeansError, Result};
use crate::memory::Primitive;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub type InitDoneCallbackFn<'a> = &'a dyn Fn(usize);
pub type IterationDoneCallbackFn<'a> = &'a dyn Fn(usize, usize, usize);
pub type RestartDoneCallbackFn<'a, T> = &'a dyn Fn(usize, T);

/// Strategy used to choose the k starting centroids of a restart.
///
/// Externally supplied seed centroids
/// ([`KMeansConfigBuilder::seed_centroids`]) bypass sampling entirely and
/// take precedence over this setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitMethod {
    /// Draw k distinct point indices uniformly at random (Forgy).
    Uniform,
    /// K-Means++ weighted sequential sampling: each further centroid is drawn
    /// with probability proportional to the squared distance to the nearest
    /// already-chosen centroid.
    KMeansPlusPlus,
}

/// Configuration for a k-means calculation: cluster count, concurrency,
/// convergence controls, seeding, reproducibility, and a couple of callbacks
/// that can be set to get status information from a running calculation.
///
/// For detailed information about all options, have a look at
/// [`KMeansConfigBuilder`].
pub struct KMeansConfig<'a, T: Primitive> {
    /// Amount of clusters to search for.
    pub(crate) k: usize,
    /// Amount of contiguous point partitions worked in parallel.
    pub(crate) concurrency: usize,
    /// Hard cap on the amount of Lloyd iterations per restart.
    pub(crate) max_iterations: usize,
    /// Amount of independent restarts; only the best solution is kept.
    pub(crate) restarts: usize,
    /// Fraction of points that must change cluster for the loop to continue.
    pub(crate) delta_threshold: f64,
    /// Whether to run the silhouette scorer over the winning restart.
    pub(crate) compute_silhouette: bool,
    /// Centroid initialization strategy.
    pub(crate) init_method: InitMethod,
    /// Externally supplied initial centroids, overriding `init_method`.
    pub(crate) seed_centroids: Option<Vec<Vec<T>>>,
    /// Seed for the random generator; `None` draws from entropy.
    pub(crate) random_seed: Option<u64>,
    /// Cooperative termination flag, checked between phases.
    pub(crate) termination: Arc<AtomicBool>,
    /// Callback invoked after the initialization phase of each restart.
    /// ## Arguments
    /// - **restart**: Index of the current restart
    pub(crate) init_done: InitDoneCallbackFn<'a>,
    /// Callback invoked after each iteration.
    /// ## Arguments
    /// - **restart**: Index of the current restart
    /// - **iteration**: Number of the finished iteration (1-based)
    /// - **swaps**: Amount of points that changed cluster this iteration
    pub(crate) iteration_done: IterationDoneCallbackFn<'a>,
    /// Callback invoked after each restart's final-distance phase.
    /// ## Arguments
    /// - **restart**: Index of the finished restart
    /// - **mean_distance**: This restart's mean point-to-centroid distance
    pub(crate) restart_done: RestartDoneCallbackFn<'a, T>,
}

impl<'a, T: Primitive> KMeansConfig<'a, T> {
    /// Use the [`KMeansConfigBuilder`] to build a [`KMeansConfig`] instance
    /// for a clustering into `k` clusters.
    pub fn build(k: usize) -> KMeansConfigBuilder<'a, T> {
        KMeansConfigBuilder {
            config: KMeansConfig {
                k,
                concurrency: rayon::current_num_threads().max(1),
                max_iterations: 10,
                restarts: 1,
                delta_threshold: 0.05,
                compute_silhouette: false,
                init_method: InitMethod::KMeansPlusPlus,
                seed_centroids: None,
                random_seed: None,
                termination: Arc::new(AtomicBool::new(false)),
                init_done: &|_| {},
                iteration_done: &|_, _, _| {},
                restart_done: &|_, _| {},
            },
        }
    }
}
impl<'a, T: Primitive> std::fmt::Debug for KMeansConfig<'a, T> {
    fn fmt(&self, _: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

pub struct KMeansConfigBuilder<'a, T: Primitive> {
    config: KMeansConfig<'a, T>,
}
impl<'a, T: Primitive> KMeansConfigBuilder<'a, T> {
    /// Set the amount of contiguous point partitions worked in parallel.
    /// ## Default
    /// The rayon thread-pool size.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency; self
    }
    /// Limit the maximum amount of Lloyd iterations per restart.
    /// ## Default
    /// `10`
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations; self
    }
    /// Set the amount of independent restarts. Each restart re-seeds its
    /// centroids; only the restart with the lowest mean distance is kept.
    /// ## Default
    /// `1`
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.config.restarts = restarts; self
    }
    /// Set the convergence threshold: the loop halts early once fewer than
    /// `delta_threshold * N` points changed cluster in a round. `0.0` means
    /// "stop only on zero swaps or the iteration cap".
    /// ## Default
    /// `0.05`
    pub fn delta_threshold(mut self, delta_threshold: f64) -> Self {
        self.config.delta_threshold = delta_threshold; self
    }
    /// Request per-point silhouette scores over the winning restart.
    /// ## Default
    /// `false`
    pub fn compute_silhouette(mut self, compute_silhouette: bool) -> Self {
        self.config.compute_silhouette = compute_silhouette; self
    }
    /// Set the centroid initialization strategy.
    /// ## Default
    /// [`InitMethod::KMeansPlusPlus`]
    pub fn init_method(mut self, init_method: InitMethod) -> Self {
        self.config.init_method = init_method; self
    }
    /// Supply the initial centroids directly, bypassing sampling. The vector
    /// count must equal `k` and every vector must have the sample
    /// dimensionality.
    pub fn seed_centroids(mut self, seed_centroids: Vec<Vec<T>>) -> Self {
        self.config.seed_centroids = Some(seed_centroids); self
    }
    /// Seed the random generator for deterministically repeatable results.
    /// Without a seed, results vary per run.
    pub fn random_seed(mut self, random_seed: u64) -> Self {
        self.config.random_seed = Some(random_seed); self
    }
    /// Set the cooperative termination flag. A calculation observes the flag
    /// between phases and aborts with [`KMeansError::Cancelled`].
    pub fn termination_flag(mut self, termination: Arc<AtomicBool>) -> Self {
        self.config.termination = termination; self
    }
    /// Set the callback that is called after the centroid initialization of
    /// each restart, before its iterations start.
    pub fn init_done(mut self, init_done: InitDoneCallbackFn<'a>) -> Self {
        self.config.init_done = init_done; self
    }
    /// Set the callback that is called after each iteration during a running
    /// calculation.
    pub fn iteration_done(mut self, iteration_done: IterationDoneCallbackFn<'a>) -> Self {
        self.config.iteration_done = iteration_done; self
    }
    /// Set the callback that is called after each finished restart, with that
    /// restart's mean point-to-centroid distance.
    pub fn restart_done(mut self, restart_done: RestartDoneCallbackFn<'a, T>) -> Self {
        self.config.restart_done = restart_done; self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> KMeansConfig<'a, T> {
        self.config
    }
}

/// The final result of a clustering run, as returned by [`KMeans::run`]:
/// the best solution across all restarts.
///
/// ## Fields
/// - **k**: The amount of clusters that were requested
/// - **assignments**: Vector mapping each point to its cluster id in `[0, k)`
/// - **centroid_distances**: Each point's Euclidean distance to its centroid
/// - **centroids**: Cluster centers \[row-major\] = \[&lt;centroid0&gt;,&lt;centroid1&gt;,...\]
/// - **centroid_frequency**: Amount of points in each cluster
/// - **mean_distance**: The winning restart's mean point-to-centroid distance
/// - **restart**: Index of the restart that produced this solution
/// - **iterations**: Amount of iterations the winning restart ran
/// - **silhouette** / **average_silhouette**: Per-point silhouette scores in
///   `[-1, 1]` and their average, if requested
#[derive(Clone, Debug)]
pub struct ClusteringResult<T: Primitive> {
    pub k: usize,
    pub assignments: Vec<usize>,
    pub centroid_distances: Vec<T>,
    pub centroids: Vec<T>,
    pub centroid_frequency: Vec<usize>,
    pub mean_distance: T,
    pub restart: usize,
    pub iterations: usize,
    pub silhouette: Option<Vec<T>>,
    pub average_silhouette: Option<T>,

    pub sample_dims: usize,
}

/// Entrypoint of this crate's API-surface.
///
/// Create an instance of this struct, giving the samples to operate on. The
/// primitive type of the passed samples is the type used internally for all
/// calculations, as well as for the returned [`ClusteringResult`]. The struct
/// itself is immutable during a calculation, so multiple runs can share it.
#[derive(Debug)]
pub struct KMeans<T: Primitive> {
    pub(crate) sample_cnt: usize,
    pub(crate) sample_dims: usize,
    pub(crate) samples: Vec<T>,
}

impl<T: Primitive> KMeans<T> {
    /// Create a new instance of the [`KMeans`] structure.
    ///
    /// ## Arguments
    /// - **samples**: Vector of samples \[row-major\] = \[&lt;sample0&gt;,&lt;sample1&gt;,...\]
    /// - **sample_cnt**: Amount of samples contained in the passed vector
    /// - **sample_dims**: Amount of dimensions each sample has
    pub fn new(samples: Vec<T>, sample_cnt: usize, sample_dims: usize) -> Self {
        assert!(samples.len() == sample_cnt * sample_dims);
        Self {
            sample_cnt,
            sample_dims,
            samples,
        }
    }

    /// Create a [`KMeans`] instance from one vector per point, validating
    /// that every point has the same dimensionality.
    pub fn from_vectors(points: Vec<Vec<T>>) -> Result<Self> {
        let sample_dims = points.first().map(Vec::len).unwrap_or(0);
        let mut samples = Vec::with_capacity(points.len() * sample_dims);
        for (idx, point) in points.iter().enumerate() {
            if point.len() != sample_dims {
                return Err(KMeansError::InvalidData(format!(
                    "sample {} has {} dimensions, expected {}",
                    idx,
                    point.len(),
                    sample_dims
                )));
            }
            samples.extend_from_slice(point);
        }
        Ok(Self {
            sample_cnt: points.len(),
            sample_dims,
            samples,
        })
    }

    pub(crate) fn sample(&self, idx: usize) -> &[T] {
        &self.samples[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }

    /// Run the clustering engine: validate the input, execute all configured
    /// restarts and return the best solution found.
    ///
    /// ## Example
    /// ```rust
    /// use kmeans_engine::*;
    ///
    /// let samples = vec![0.0f64, 1.0, 2.0, 10.0, 11.0, 12.0];
    /// let kmean = KMeans::new(samples, 6, 1);
    /// let config = KMeansConfig::build(2)
    ///     .random_seed(1)
    ///     .delta_threshold(0.0)
    ///     .build();
    /// let result = kmean.run(&config).unwrap();
    ///
    /// assert_eq!(result.assignments[0], result.assignments[1]);
    /// assert_eq!(result.centroid_frequency, vec![3, 3]);
    /// ```
    pub fn run(&self, config: &KMeansConfig<'_, T>) -> Result<ClusteringResult<T>> {
        crate::engine::calculate(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::atomic::Ordering;

    fn six_points() -> KMeans<f64> {
        KMeans::new(vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0], 6, 1)
    }

    fn sorted_centroids(result: &ClusteringResult<f64>) -> Vec<f64> {
        let mut centroids = result.centroids.clone();
        centroids.sort_by(|a, b| a.partial_cmp(b).unwrap());
        centroids
    }

    #[test]
    fn two_separated_groups_converge() {
        // Any pair of distinct starting points converges to {0,1,2}/{10,11,12}.
        for seed in 0..10 {
            let config = KMeansConfig::build(2)
                .init_method(InitMethod::Uniform)
                .delta_threshold(0.0)
                .max_iterations(10)
                .random_seed(seed)
                .build();
            let result = six_points().run(&config).unwrap();

            assert_eq!(sorted_centroids(&result), vec![1.0, 11.0]);
            assert_eq!(result.assignments[0], result.assignments[1]);
            assert_eq!(result.assignments[1], result.assignments[2]);
            assert_eq!(result.assignments[3], result.assignments[4]);
            assert_eq!(result.assignments[4], result.assignments[5]);
            assert_ne!(result.assignments[0], result.assignments[3]);
            assert_approx_eq!(result.mean_distance, 4.0 / 6.0, 1e-12);
        }
    }

    #[test]
    fn seed_centroids_override_sampling() {
        for init_method in [InitMethod::Uniform, InitMethod::KMeansPlusPlus] {
            let config = KMeansConfig::build(2)
                .init_method(init_method)
                .seed_centroids(vec![vec![0.0], vec![10.0]])
                .delta_threshold(0.0)
                .build();
            let result = six_points().run(&config).unwrap();

            assert_eq!(result.assignments, vec![0, 0, 0, 1, 1, 1]);
            assert_eq!(result.centroids, vec![1.0, 11.0]);
            assert_eq!(result.centroid_distances, vec![1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
            assert_eq!(result.centroid_frequency, vec![3, 3]);
            assert_approx_eq!(result.mean_distance, 4.0 / 6.0, 1e-12);
        }
    }

    #[test]
    fn fixed_seed_is_bit_identical() {
        let samples: Vec<f64> = (0..200).map(|v| ((v * 37) % 83) as f64).collect();
        let run = |concurrency: usize| {
            let data = KMeans::new(samples.clone(), 100, 2);
            let config = KMeansConfig::build(4)
                .random_seed(1337)
                .concurrency(concurrency)
                .delta_threshold(0.0)
                .max_iterations(50)
                .build();
            data.run(&config).unwrap()
        };

        let first = run(4);
        let second = run(4);
        assert_eq!(first.assignments, second.assignments);
        assert_eq!(first.centroid_distances, second.centroid_distances);
        assert_eq!(first.centroids, second.centroids);

        // Randomness only flows through the orchestrator thread, so the
        // requested concurrency does not change the draws either.
        let third = run(1);
        assert_eq!(first.assignments, third.assignments);
    }

    #[test]
    fn degenerate_k_assigns_singleton_clusters() {
        let data = KMeans::new(vec![5.0, 7.0, 9.0], 3, 1);
        let config = KMeansConfig::build(8).compute_silhouette(true).build();
        let result = data.run(&config).unwrap();

        assert_eq!(result.assignments, vec![0, 1, 2]);
        assert_eq!(result.centroid_distances, vec![0.0, 0.0, 0.0]);
        assert_eq!(result.mean_distance, 0.0);
        assert_eq!(&result.centroids[..3], &[5.0, 7.0, 9.0]);
        assert_eq!(result.centroid_frequency, vec![1, 1, 1, 0, 0, 0, 0, 0]);
        assert_eq!(result.silhouette.unwrap(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn cluster_coverage_and_frequency_sum() {
        let samples: Vec<f64> = (0..300).map(|v| ((v * 13) % 101) as f64).collect();
        let data = KMeans::new(samples, 300, 1);
        let config = KMeansConfig::build(7)
            .random_seed(3)
            .restarts(3)
            .build();
        let result = data.run(&config).unwrap();

        assert!(result.assignments.iter().all(|&a| a < 7));
        assert_eq!(result.centroid_frequency.iter().sum::<usize>(), 300);
        assert!(result.iterations <= 10);
    }

    #[test]
    fn best_restart_has_minimum_mean_distance() {
        let samples: Vec<f64> = (0..400).map(|v| ((v * 7) % 59) as f64).collect();
        let data = KMeans::new(samples, 200, 2);

        let means: RefCell<Vec<f64>> = RefCell::new(Vec::new());
        let restart_done = |_restart: usize, mean: f64| means.borrow_mut().push(mean);
        let config = KMeansConfig::build(5)
            .random_seed(21)
            .restarts(6)
            .init_method(InitMethod::Uniform)
            .restart_done(&restart_done)
            .build();
        let result = data.run(&config).unwrap();

        let means = means.borrow();
        assert_eq!(means.len(), 6);
        let minimum = means.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(result.mean_distance, minimum);
        // Ties keep the earlier restart.
        assert_eq!(means[result.restart], minimum);
        assert!(means[..result.restart].iter().all(|&m| m > minimum));
    }

    #[test]
    fn iteration_count_respects_cap() {
        let samples: Vec<f64> = (0..100).map(|v| (v % 13) as f64).collect();
        let data = KMeans::new(samples, 100, 1);
        let iterations: RefCell<Vec<usize>> = RefCell::new(Vec::new());
        let iteration_done =
            |_restart: usize, iteration: usize, _swaps: usize| iterations.borrow_mut().push(iteration);
        let config = KMeansConfig::build(3)
            .random_seed(5)
            .max_iterations(4)
            .delta_threshold(0.0)
            .iteration_done(&iteration_done)
            .build();
        data.run(&config).unwrap();

        assert!(!iterations.borrow().is_empty());
        assert!(iterations.borrow().iter().all(|&i| i <= 4));
    }

    #[test]
    fn silhouette_over_winning_restart() {
        let config = KMeansConfig::build(2)
            .seed_centroids(vec![vec![0.0], vec![10.0]])
            .delta_threshold(0.0)
            .compute_silhouette(true)
            .build();
        let result = six_points().run(&config).unwrap();

        let scores = result.silhouette.unwrap();
        assert_eq!(scores.len(), 6);
        assert!(scores.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(result.average_silhouette.unwrap() > 0.8);
    }

    #[test]
    fn validation_rejects_bad_input() {
        let nan_data = KMeans::new(vec![0.0, f64::NAN, 2.0], 3, 1);
        let config = KMeansConfig::build(2).build();
        match nan_data.run(&config) {
            Err(KMeansError::InvalidData(msg)) => assert!(msg.contains("sample 1")),
            other => panic!("expected InvalidData, got {:?}", other.map(|_| ())),
        }

        let data = six_points();
        assert!(matches!(
            data.run(&KMeansConfig::build(0).build()),
            Err(KMeansError::InvalidConfig(_))
        ));
        assert!(matches!(
            data.run(&KMeansConfig::build(2).delta_threshold(1.5).build()),
            Err(KMeansError::InvalidConfig(_))
        ));
        assert!(matches!(
            data.run(&KMeansConfig::build(2).max_iterations(0).build()),
            Err(KMeansError::InvalidConfig(_))
        ));
        assert!(matches!(
            data.run(&KMeansConfig::build(2).seed_centroids(vec![vec![0.0]]).build()),
            Err(KMeansError::InvalidConfig(_))
        ));
        assert!(matches!(
            data.run(
                &KMeansConfig::build(2)
                    .seed_centroids(vec![vec![0.0, 1.0], vec![2.0, 3.0]])
                    .build()
            ),
            Err(KMeansError::InvalidConfig(_))
        ));
    }

    #[test]
    fn from_vectors_rejects_ragged_input() {
        let err = KMeans::from_vectors(vec![vec![0.0, 1.0], vec![2.0]]).unwrap_err();
        match err {
            KMeansError::InvalidData(msg) => assert!(msg.contains("sample 1")),
            other => panic!("expected InvalidData, got {other:?}"),
        }

        let data = KMeans::from_vectors(vec![vec![0.0, 1.0], vec![2.0, 3.0]]).unwrap();
        assert_eq!(data.sample_cnt, 2);
        assert_eq!(data.sample_dims, 2);
    }

    #[test]
    fn termination_flag_cancels_run() {
        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::Relaxed);
        let config = KMeansConfig::build(2)
            .termination_flag(Arc::clone(&flag))
            .build();
        assert!(matches!(six_points().run(&config), Err(KMeansError::Cancelled)));
    }

    #[test]
    fn f32_backend_produces_same_clustering() {
        let data = KMeans::new(vec![0.0f32, 1.0, 2.0, 10.0, 11.0, 12.0], 6, 1);
        let config = KMeansConfig::build(2)
            .seed_centroids(vec![vec![0.0f32], vec![10.0]])
            .delta_threshold(0.0)
            .build();
        let result = data.run(&config).unwrap();
        assert_eq!(result.assignments, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(result.centroids, vec![1.0f32, 11.0]);
    }
}
