//! # kmeans-engine - API documentation
//!
//! A parallel k-means clustering engine: partitions N fixed-dimension points
//! into k clusters by iterative centroid refinement (Lloyd's algorithm), with
//! pluggable initial-centroid selection, multi-restart best-solution tracking
//! and optional post-hoc silhouette scoring.
//!
//! ## Design target
//! The engine is a library, not an endpoint. Samples are given as a raw
//! row-major vector instead of a high-level matrix crate, and the API surface
//! is kept rather plain. Per-point work is range-partitioned into contiguous,
//! non-overlapping index ranges that are executed in parallel with a
//! synchronous join barrier after every phase; worker tasks return owned
//! partial results, so no shared aggregate state is mutated during a parallel
//! phase.
//!
//! ## Supported centroid initializations
//! - Uniform random sampling ([`InitMethod::Uniform`])
//! - K-Means++ weighted sampling ([`InitMethod::KMeansPlusPlus`])
//! - Externally supplied seed centroids ([`KMeansConfigBuilder::seed_centroids`]),
//!   which bypass sampling entirely
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use kmeans_engine::*;
//!
//! let (sample_cnt, sample_dims, k) = (2000, 8, 4);
//!
//! // Generate some random data
//! let mut samples = vec![0.0f64; sample_cnt * sample_dims];
//! samples.iter_mut().for_each(|v| *v = rand::random());
//!
//! let kmean = KMeans::new(samples, sample_cnt, sample_dims);
//! let config = KMeansConfig::build(k)
//!     .random_seed(1)
//!     .restarts(3)
//!     .max_iterations(100)
//!     .build();
//! let result = kmean.run(&config).unwrap();
//!
//! println!("Centroids: {:?}", result.centroids);
//! println!("Cluster-Assignments: {:?}", result.assignments);
//! println!("Mean distance: {}", result.mean_distance);
//! ```
//!
//! ## Example (using the status event callbacks)
//! ```rust
//! use kmeans_engine::*;
//!
//! let samples = vec![0.0f64, 1.0, 2.0, 10.0, 11.0, 12.0];
//! let kmean = KMeans::new(samples, 6, 1);
//!
//! let config = KMeansConfig::build(2)
//!     .random_seed(1)
//!     .iteration_done(&|restart, iteration, swaps|
//!         println!("Restart {} iteration {} - {} swaps", restart, iteration, swaps))
//!     .restart_done(&|restart, mean|
//!         println!("Restart {} finished - mean distance: {}", restart, mean))
//!     .build();
//! let result = kmean.run(&config).unwrap();
//! println!("Best restart: {}", result.restart);
//! ```
//!
//! ## Short API-overview
//! Entry-point of the library is the [`KMeans`] struct, generic over the
//! underlying primitive type and taking ownership of the sample data. A
//! [`KMeansConfig`] (built through [`KMeansConfigBuilder`]) carries all knobs
//! of a calculation: cluster count, concurrency, iteration/restart limits,
//! the convergence delta-threshold, seeding strategy, reproducibility seed,
//! silhouette scoring, progress callbacks and a cooperative termination flag.
//! [`KMeans::run`] validates the input eagerly and either returns a
//! [`ClusteringResult`] or a [`KMeansError`] before any clustering work
//! starts.

#[macro_use]
mod helpers;
mod api;
mod engine;
mod error;
mod inits;
mod manager;
mod memory;
mod silhouette;
mod stopper;
mod task;

pub use api::{
    ClusteringResult, InitDoneCallbackFn, InitMethod, IterationDoneCallbackFn, KMeans,
    KMeansConfig, KMeansConfigBuilder, RestartDoneCallbackFn,
};
pub use error::{KMeansError, Result};
pub use memory::Primitive;
