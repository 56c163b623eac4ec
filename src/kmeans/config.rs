use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::kmeans::observer::Observer;

/// Default fraction of observations that must change cluster for a round to
/// count as significant.
pub const DEFAULT_DELTA_THRESHOLD: f64 = 0.01;

/// Default hard cap on the number of rounds.
pub const DEFAULT_ITERATION_CAP: usize = 96;

/// Configuration options for k-means clustering.
#[derive(Clone)]
pub struct KMeans {
    /// Number of worker threads. One or fewer runs every round sequentially.
    pub workers: usize,
    observer: Option<Arc<dyn Observer>>,
    delta_threshold: f64,
    iteration_cap: usize,
    seed: Option<u64>,
}

impl KMeans {
    /// Create a config with a delta threshold of 0.01, no observer and an
    /// iteration cap of 96 (97 rounds, see [`KMeans::partition`]), using rayon's thread count for `workers`.
    pub fn new() -> Self {
        Self {
            workers: rayon::current_num_threads(),
            observer: None,
            delta_threshold: DEFAULT_DELTA_THRESHOLD,
            iteration_cap: DEFAULT_ITERATION_CAP,
            seed: None,
        }
    }

    /// Create a config with a custom delta threshold and optional observer.
    ///
    /// Partitioning stops once fewer than `delta_threshold * len(dataset)`
    /// observations changed cluster in a round.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `0.0 < delta_threshold < 1.0`.
    pub fn with_options(
        delta_threshold: f64,
        observer: Option<Arc<dyn Observer>>,
    ) -> Result<Self> {
        // Also rejects NaN.
        if !(delta_threshold > 0.0 && delta_threshold < 1.0) {
            return Err(Error::InvalidArgument(format!(
                "threshold {delta_threshold} is out of bounds (must be >0.0 and <1.0)"
            )));
        }
        Ok(Self {
            observer,
            delta_threshold,
            ..Self::new()
        })
    }

    /// Customize the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Customize the hard cap on the number of rounds.
    pub fn with_iteration_cap(mut self, iteration_cap: NonZeroUsize) -> Self {
        self.iteration_cap = iteration_cap.get();
        self
    }

    /// Fix the random seed used for initialization and empty-cluster recovery.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Install an observer that is called once per round.
    pub fn with_observer<O: Observer + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn delta_threshold(&self) -> f64 {
        self.delta_threshold
    }

    pub fn iteration_cap(&self) -> usize {
        self.iteration_cap
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub(crate) fn observer(&self) -> Option<&dyn Observer> {
        self.observer.as_deref()
    }
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KMeans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KMeans")
            .field("workers", &self.workers)
            .field("observer", &self.observer.is_some())
            .field("delta_threshold", &self.delta_threshold)
            .field("iteration_cap", &self.iteration_cap)
            .field("seed", &self.seed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmeans::observer::LogObserver;

    #[test]
    fn test_defaults() {
        let m = KMeans::new();
        assert_eq!(m.delta_threshold(), 0.01);
        assert_eq!(m.iteration_cap(), 96);
        assert!(m.observer().is_none());
        assert!(m.seed().is_none());
        assert!(m.workers >= 1);
    }

    #[test]
    fn test_threshold_out_of_bounds() {
        for threshold in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(
                matches!(
                    KMeans::with_options(threshold, None),
                    Err(Error::InvalidArgument(_))
                ),
                "threshold {threshold} should be rejected"
            );
        }
    }

    #[test]
    fn test_threshold_in_bounds() {
        for threshold in [0.5, 0.0001] {
            let m = KMeans::with_options(threshold, None).unwrap();
            assert_eq!(m.delta_threshold(), threshold);
            assert_eq!(m.iteration_cap(), 96);
        }
    }

    #[test]
    fn test_builder() {
        let m = KMeans::with_options(0.2, Some(Arc::new(LogObserver)))
            .unwrap()
            .with_workers(3)
            .with_seed(7)
            .with_iteration_cap(NonZeroUsize::new(10).unwrap());
        assert_eq!(m.workers, 3);
        assert_eq!(m.seed(), Some(7));
        assert_eq!(m.iteration_cap(), 10);
        assert!(m.observer().is_some());
        assert!(format!("{m:?}").contains("observer: true"));
    }
}
