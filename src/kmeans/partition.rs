//! The round loop of Lloyd's algorithm.
//!
//! Every round clears cluster membership and rebuilds it from scratch. The
//! clusters are moved into a [`LockBank`] for the parallel phases and moved
//! back out once every worker has finished, so recentering and the observer
//! always run with exclusive access.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cluster::{store, Cluster, Clusters, Coordinates, Observation};
use crate::error::{Error, Result};
use crate::kmeans::config::KMeans;
use crate::kmeans::observer::Progress;
use crate::parallel::{Dispatcher, LockBank, STRIPES};

impl KMeans {
    /// Partitions `dataset` into `k` clusters.
    ///
    /// The starting centers are `k` distinct observations picked at random.
    /// Runs until fewer than `delta_threshold * dataset.len()` observations
    /// change cluster in a round, or the iteration cap is reached; reaching the
    /// cap is not an error. Rounds are indexed from 0 and the round whose
    /// index equals the cap is the last, so the default cap of 96 allows 97
    /// rounds.
    ///
    /// With a fixed seed the resulting partition does not depend on
    /// `workers`, except that when several empty clusters are reseeded in the
    /// same round the racing recoveries may hand the same groups of
    /// observations to different cluster indices.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `k` is 0 or exceeds the dataset size, or the
    ///   dataset is empty or has inconsistent dimensions.
    /// - `ObserverFailure` if the observer fails; the run is aborted.
    /// - `WorkerPool` if the worker threads could not be started.
    ///
    /// # Example
    ///
    /// ```
    /// use kmeans::KMeans;
    ///
    /// let data = vec![
    ///     [1.0, 2.0],
    ///     [1.5, 1.8],
    ///     [5.0, 8.0],
    ///     [8.0, 8.0],
    /// ];
    ///
    /// let clusters = KMeans::new().with_seed(1).partition(&data, 2).unwrap();
    /// assert_eq!(clusters.len(), 2);
    /// ```
    pub fn partition<O>(&self, dataset: &[O], k: usize) -> Result<Clusters>
    where
        O: Observation + Sync,
    {
        if k > dataset.len() {
            return Err(Error::invalid(format!(
                "the size of the data set ({}) must at least equal k ({})",
                dataset.len(),
                k
            )));
        }
        validate_dataset(dataset)?;

        let seed = self.seed().unwrap_or_else(rand::random);
        debug!("partitioning {} observations into {k} clusters, seed {seed}", dataset.len());
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let clusters = Clusters::sample(k, dataset, &mut rng)?;

        self.run(dataset, clusters, vec![0; dataset.len()], seed)
    }

    /// Partitions `dataset` around caller-supplied starting centers, one
    /// cluster per center.
    ///
    /// Each observation starts out assigned to its nearest initial center, so
    /// a dataset that is already at a fixed point finishes after one round.
    ///
    /// # Errors
    ///
    /// As [`KMeans::partition`], plus `InvalidArgument` if the centers'
    /// dimensions differ from the dataset's.
    pub fn partition_from<O>(&self, dataset: &[O], centers: Vec<Coordinates>) -> Result<Clusters>
    where
        O: Observation + Sync,
    {
        if centers.len() > dataset.len() {
            return Err(Error::invalid(format!(
                "the size of the data set ({}) must at least equal k ({})",
                dataset.len(),
                centers.len()
            )));
        }
        let dim = validate_dataset(dataset)?;
        let clusters = Clusters::from_centers(centers)?;
        if clusters[0].center.len() != dim {
            return Err(Error::invalid(format!(
                "centers have {} dimensions, observations have {dim}",
                clusters[0].center.len()
            )));
        }

        let seed = self.seed().unwrap_or_else(rand::random);
        debug!(
            "partitioning {} observations around {} given centers, seed {seed}",
            dataset.len(),
            clusters.len()
        );
        let assignments = dataset.iter().map(|o| clusters.nearest(o)).collect();
        self.run(dataset, clusters, assignments, seed)
    }

    fn run<O>(
        &self,
        dataset: &[O],
        mut clusters: Clusters,
        assignments: Vec<usize>,
        seed: u64,
    ) -> Result<Clusters>
    where
        O: Observation + Sync,
    {
        let dispatcher = Dispatcher::new(self.workers)?;
        let assignments: Vec<AtomicUsize> = assignments.into_iter().map(AtomicUsize::new).collect();
        let changes = AtomicUsize::new(0);
        let threshold = self.delta_threshold() * dataset.len() as f64;

        // Rounds are indexed from 0; the run stops at the round whose index
        // equals the cap, so a cap of `n` allows `n + 1` rounds.
        let mut iteration = 0;
        loop {
            let round = iteration + 1;
            changes.store(0, Ordering::Relaxed);
            clusters.reset();

            let bank = LockBank::new(clusters.into_vec(), STRIPES);
            let round_state = Round {
                dataset,
                bank: &bank,
                assignments: &assignments,
                changes: &changes,
            };
            dispatcher.for_each(dataset.len(), |p| round_state.assign(p));

            let recovered = AtomicUsize::new(0);
            dispatcher.for_each(bank.len(), |ci| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(iteration as u64));
                rng.set_stream(ci as u64);
                if round_state.recover(ci, &mut rng) {
                    recovered.fetch_add(1, Ordering::Relaxed);
                }
            });

            clusters = Clusters::from(bank.into_inner());
            clusters.sort_members();
            let changed = changes.load(Ordering::Relaxed);
            let recovered = recovered.into_inner();
            debug!("round {round}: {changed} changes, {recovered} empty clusters reseeded");

            if changed > 0 {
                clusters.recenter(dataset);
            }

            if let Some(observer) = self.observer() {
                let progress = if recovered > 0 {
                    Progress::Recovery { changes: changed }
                } else {
                    Progress::Iteration(round)
                };
                observer
                    .observe(&clusters, progress)
                    .map_err(|source| Error::ObserverFailure { round, source })?;
            }

            if iteration >= self.iteration_cap() {
                debug!("stopping after {round} rounds: iteration cap reached");
                return Ok(clusters);
            }
            if (changed as f64) < threshold {
                debug!("converged after {round} rounds");
                return Ok(clusters);
            }
            iteration += 1;
        }
    }
}

/// Shared state of the parallel phases of one round.
struct Round<'a, O> {
    dataset: &'a [O],
    bank: &'a LockBank<Cluster>,
    assignments: &'a [AtomicUsize],
    changes: &'a AtomicUsize,
}

impl<O: Observation + Sync> Round<'_, O> {
    /// Assigns observation `p` to its nearest cluster.
    fn assign(&self, p: usize) {
        let observation = &self.dataset[p];
        // Every stripe is read-locked while the nearest center is computed.
        let ci = store::nearest(observation, self.bank.read_all().iter().map(|c| &c.center));
        self.bank.write(ci, |cluster| cluster.members.push(p));
        if self.assignments[p].swap(ci, Ordering::Relaxed) != ci {
            self.changes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Reseeds cluster `ci` if it ended the assignment phase empty, by moving
    /// a random observation out of a cluster that holds more than one.
    /// Returns whether the cluster was reseeded.
    fn recover<R: Rng>(&self, ci: usize, rng: &mut R) -> bool {
        if !self.bank.read(ci, Cluster::is_empty) {
            return false;
        }
        loop {
            let ri = rng.gen_range(0..self.dataset.len());
            let donor = self.assignments[ri].load(Ordering::Relaxed);
            // The size check and the removal happen under the donor's lock, so
            // two recoveries can never drain the same donor.
            let taken = self.bank.write(donor, |cluster| {
                if cluster.members.len() < 2 {
                    return false;
                }
                match cluster.members.iter().position(|&m| m == ri) {
                    Some(pos) => {
                        cluster.members.swap_remove(pos);
                        true
                    }
                    None => false,
                }
            });
            if taken {
                self.assignments[ri].store(ci, Ordering::Relaxed);
                self.bank.write(ci, |cluster| cluster.members.push(ri));
                // Force at least one more round after reseeding.
                self.changes.fetch_add(self.dataset.len(), Ordering::Relaxed);
                trace!("moved observation {ri} from cluster {donor} to empty cluster {ci}");
                return true;
            }
        }
    }
}

/// Checks that the dataset is non-empty and all observations share one
/// non-zero dimension, which is returned.
fn validate_dataset<O: Observation>(dataset: &[O]) -> Result<usize> {
    let dim = match dataset.first() {
        Some(o) => o.coordinates().len(),
        None => return Err(Error::invalid("the data set must not be empty")),
    };
    if dim == 0 {
        return Err(Error::invalid(
            "there must be at least one dimension in the data set",
        ));
    }
    if let Some(p) = dataset.iter().position(|o| o.coordinates().len() != dim) {
        return Err(Error::invalid(format!(
            "observation {p} has {} dimensions, expected {dim}",
            dataset[p].coordinates().len()
        )));
    }
    Ok(dim)
}
