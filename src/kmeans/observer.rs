use log::info;

use crate::cluster::Clusters;
use crate::error::BoxError;

/// What happened in the round an [`Observer`] is being told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// A regular round, numbered from 1.
    Iteration(usize),
    /// A round in which at least one empty cluster was reseeded. `changes` is
    /// the inflated change count that forces another round.
    Recovery { changes: usize },
}

impl Progress {
    /// Positive iteration number for a regular round, negated change count
    /// for a recovery round.
    pub fn signed(&self) -> i64 {
        match *self {
            Progress::Iteration(round) => i64::try_from(round).unwrap_or(i64::MAX),
            Progress::Recovery { changes } => -i64::try_from(changes).unwrap_or(i64::MAX),
        }
    }
}

/// Gets called once per round, after the centers have been recomputed.
///
/// Returning an error aborts the partition.
pub trait Observer: Send + Sync {
    fn observe(&self, clusters: &Clusters, progress: Progress) -> Result<(), BoxError>;
}

impl<F> Observer for F
where
    F: Fn(&Clusters, Progress) -> Result<(), BoxError> + Send + Sync,
{
    fn observe(&self, clusters: &Clusters, progress: Progress) -> Result<(), BoxError> {
        self(clusters, progress)
    }
}

/// Logs cluster sizes and centers at info level after every round.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn observe(&self, clusters: &Clusters, progress: Progress) -> Result<(), BoxError> {
        let sizes: Vec<usize> = clusters.iter().map(|c| c.len()).collect();
        match progress {
            Progress::Iteration(round) => info!("round {round}: cluster sizes {sizes:?}"),
            Progress::Recovery { changes } => {
                info!("recovery round ({changes} changes): cluster sizes {sizes:?}")
            }
        }
        for (i, cluster) in clusters.iter().enumerate() {
            info!("  cluster {i}: center {:?}", &cluster.center[..]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Coordinates;
    use std::sync::Mutex;

    #[test]
    fn test_signed_progress() {
        assert_eq!(Progress::Iteration(4).signed(), 4);
        assert_eq!(Progress::Recovery { changes: 120 }.signed(), -120);
    }

    #[test]
    fn test_closure_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = |_: &Clusters, progress: Progress| -> Result<(), BoxError> {
            seen.lock().unwrap().push(progress);
            Ok(())
        };
        let clusters = Clusters::from_centers(vec![Coordinates::from([0.0])]).unwrap();
        observer.observe(&clusters, Progress::Iteration(1)).unwrap();
        observer
            .observe(&clusters, Progress::Recovery { changes: 3 })
            .unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Progress::Iteration(1), Progress::Recovery { changes: 3 }]
        );
    }

    #[test]
    fn test_log_observer_succeeds() {
        let clusters =
            Clusters::from_centers(vec![Coordinates::from([0.0, 1.0]), Coordinates::from([2.0, 3.0])])
                .unwrap();
        assert!(LogObserver.observe(&clusters, Progress::Iteration(1)).is_ok());
    }
}
