use crate::api::{ClusteringResult, InitMethod, KMeans, KMeansConfig};
use crate::error::{KMeansError, Result};
use crate::manager::ClusterManager;
use crate::memory::Primitive;
use crate::stopper::IterationStopper;
use crate::task::{self, Phase, UNASSIGNED};
use crate::{helpers, inits, silhouette};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::Ordering;
use tracing::debug;

/// One restart's full solution snapshot. The orchestrator moves the winning
/// snapshot into its best-so-far slot; losing snapshots are dropped at the
/// end of their restart.
struct RestartOutcome<T: Primitive> {
    assignments: Vec<usize>,
    distances: Vec<T>,
    centroids: Vec<T>,
    cluster_sizes: Vec<usize>,
    mean_distance: T,
    restart: usize,
    iterations: usize,
}

pub(crate) fn calculate<T: Primitive>(
    data: &KMeans<T>,
    config: &KMeansConfig<'_, T>,
) -> Result<ClusteringResult<T>> {
    validate(data, config)?;
    check_termination(config)?;

    let partition_size = helpers::partition_size(data.sample_cnt, config.concurrency);
    if config.k > data.sample_cnt {
        return Ok(singleton_result(data, config, partition_size));
    }

    let mut rnd = match config.random_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut best: Option<RestartOutcome<T>> = None;
    for restart in 0..config.restarts {
        check_termination(config)?;
        let outcome = run_restart(data, config, restart, partition_size, &mut rnd)?;
        (config.restart_done)(restart, outcome.mean_distance);

        // Strictly-lower wins; ties keep the earlier restart.
        best = match best {
            Some(current) if current.mean_distance <= outcome.mean_distance => Some(current),
            _ => {
                debug!(restart, mean_distance = %outcome.mean_distance, "restart is new best");
                Some(outcome)
            }
        };
    }
    let best = best.expect("restarts >= 1 was validated");

    let (silhouette_scores, average_silhouette) = if config.compute_silhouette {
        let (scores, average) =
            silhouette::score(data, &best.assignments, &best.cluster_sizes, partition_size);
        (Some(scores), Some(average))
    } else {
        (None, None)
    };

    Ok(ClusteringResult {
        k: config.k,
        assignments: best.assignments,
        centroid_distances: best.distances,
        centroids: best.centroids,
        centroid_frequency: best.cluster_sizes,
        mean_distance: best.mean_distance,
        restart: best.restart,
        iterations: best.iterations,
        silhouette: silhouette_scores,
        average_silhouette,
        sample_dims: data.sample_dims,
    })
}

/// One complete run of the clustering loop from fresh centroids.
fn run_restart<T: Primitive>(
    data: &KMeans<T>,
    config: &KMeansConfig<'_, T>,
    restart: usize,
    partition_size: usize,
    rnd: &mut ChaCha8Rng,
) -> Result<RestartOutcome<T>> {
    let point_cnt = data.sample_cnt;
    let mut manager = ClusterManager::new(config.k, data.sample_dims);
    let mut assignments = vec![UNASSIGNED; point_cnt];
    let mut distances = vec![T::infinity(); point_cnt];

    // Externally supplied seed vectors take precedence over sampling.
    if let Some(seeds) = &config.seed_centroids {
        manager.assign_seeded_centroids(seeds)?;
    } else {
        match config.init_method {
            InitMethod::Uniform => inits::uniform::calculate(data, &mut manager, rnd),
            InitMethod::KMeansPlusPlus => inits::plusplus::calculate(
                data,
                &mut manager,
                &mut assignments,
                &mut distances,
                partition_size,
                rnd,
            ),
        }
    }
    (config.init_done)(restart);
    debug!(restart, "centroid initialization complete");

    let stopper = IterationStopper::new(config.max_iterations, config.delta_threshold, point_cnt);
    let mut iterations = 0;
    loop {
        check_termination(config)?;
        iterations += 1;

        let partials = task::run_phase(
            data,
            &manager,
            &mut assignments,
            &mut distances,
            partition_size,
            Phase::Assign,
        );
        let swaps: usize = partials.iter().map(|p| p.swaps).sum();

        manager.reset();
        partials.iter().for_each(|p| manager.merge_partial(p));
        manager.normalize_clusters();

        (config.iteration_done)(restart, iterations, swaps);
        debug!(restart, iteration = iterations, swaps, "assignment pass complete");
        if stopper.should_stop(swaps, iterations) {
            break;
        }
    }

    check_termination(config)?;
    let partials = task::run_phase(
        data,
        &manager,
        &mut assignments,
        &mut distances,
        partition_size,
        Phase::FinalDistance,
    );
    let distance_total: T = partials.iter().map(|p| p.distance_total).sum();
    let mean_distance = distance_total / T::from(point_cnt).unwrap();
    debug!(restart, iterations, mean_distance = %mean_distance, "restart finished");

    Ok(RestartOutcome {
        assignments,
        distances,
        centroids: manager.centroids().to_vec(),
        cluster_sizes: manager.cluster_sizes().to_vec(),
        mean_distance,
        restart,
        iterations,
    })
}

/// Degenerate `k > N` policy: skip clustering and give each point its own
/// singleton cluster with id equal to its index. This is documented behavior,
/// not an error.
fn singleton_result<T: Primitive>(
    data: &KMeans<T>,
    config: &KMeansConfig<'_, T>,
    partition_size: usize,
) -> ClusteringResult<T> {
    let point_cnt = data.sample_cnt;
    let dims = data.sample_dims;

    let assignments: Vec<usize> = (0..point_cnt).collect();
    let mut centroids = vec![T::zero(); config.k * dims];
    centroids[..point_cnt * dims].copy_from_slice(&data.samples);
    let mut centroid_frequency = vec![0usize; config.k];
    centroid_frequency[..point_cnt].iter_mut().for_each(|f| *f = 1);

    let (silhouette_scores, average_silhouette) = if config.compute_silhouette {
        let (scores, average) =
            silhouette::score(data, &assignments, &centroid_frequency, partition_size);
        (Some(scores), Some(average))
    } else {
        (None, None)
    };

    ClusteringResult {
        k: config.k,
        assignments,
        centroid_distances: vec![T::zero(); point_cnt],
        centroids,
        centroid_frequency,
        mean_distance: T::zero(),
        restart: 0,
        iterations: 0,
        silhouette: silhouette_scores,
        average_silhouette,
        sample_dims: dims,
    }
}

/// Fail-fast input validation. Runs once, before any clustering work; no
/// per-point error recovery exists inside the hot loop.
fn validate<T: Primitive>(data: &KMeans<T>, config: &KMeansConfig<'_, T>) -> Result<()> {
    if config.k < 1 {
        return Err(KMeansError::InvalidConfig("k must be >= 1".into()));
    }
    if config.concurrency < 1 {
        return Err(KMeansError::InvalidConfig("concurrency must be >= 1".into()));
    }
    if config.restarts < 1 {
        return Err(KMeansError::InvalidConfig("restarts must be >= 1".into()));
    }
    if config.max_iterations < 1 {
        return Err(KMeansError::InvalidConfig("max_iterations must be >= 1".into()));
    }
    if !(0.0..=1.0).contains(&config.delta_threshold) {
        return Err(KMeansError::InvalidConfig(format!(
            "delta_threshold must lie in [0, 1], got {}",
            config.delta_threshold
        )));
    }
    for idx in 0..data.sample_cnt {
        if data.sample(idx).iter().any(|v| v.is_nan()) {
            return Err(KMeansError::InvalidData(format!(
                "sample {} contains a NaN component",
                idx
            )));
        }
    }
    if let Some(seeds) = &config.seed_centroids {
        if seeds.len() != config.k {
            return Err(KMeansError::InvalidConfig(format!(
                "expected {} seed centroids, got {}",
                config.k,
                seeds.len()
            )));
        }
        for (cluster_id, seed) in seeds.iter().enumerate() {
            if seed.len() != data.sample_dims {
                return Err(KMeansError::InvalidConfig(format!(
                    "seed centroid {} has {} dimensions, expected {}",
                    cluster_id,
                    seed.len(),
                    data.sample_dims
                )));
            }
            if seed.iter().any(|v| v.is_nan()) {
                return Err(KMeansError::InvalidConfig(format!(
                    "seed centroid {} contains a NaN component",
                    cluster_id
                )));
            }
        }
    }
    Ok(())
}

fn check_termination<T: Primitive>(config: &KMeansConfig<'_, T>) -> Result<()> {
    if config.termination.load(Ordering::Relaxed) {
        return Err(KMeansError::Cancelled);
    }
    Ok(())
}
