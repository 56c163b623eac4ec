//! Parallel k-means clustering using Lloyd's algorithm.
//!
//! [`KMeans::partition`] splits a dataset into `k` clusters. Every round
//! assigns each observation to its nearest center on a pool of worker threads,
//! reseeds clusters that ended up empty, and moves each center to the mean of
//! its members, until fewer than a configurable fraction of observations change
//! cluster or the iteration cap is reached.
//!
//! ```
//! use kmeans::KMeans;
//!
//! let data = vec![
//!     [0.0, 0.0], [1.0, 0.0], [0.0, 1.0],
//!     [10.0, 10.0], [11.0, 10.0], [10.0, 11.0],
//! ];
//! let clusters = KMeans::new().with_seed(42).partition(&data, 2).unwrap();
//! for cluster in &clusters {
//!     assert_eq!(cluster.len(), 3);
//! }
//! ```

pub mod cluster;
pub mod error;
pub mod kmeans;
pub(crate) mod parallel;

pub use cluster::{Cluster, Clusters, Coordinates, Observation};
pub use error::{BoxError, Error, Result};
pub use kmeans::{KMeans, LogObserver, Observer, Progress};
