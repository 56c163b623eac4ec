use std::ops::Index;

use rand::Rng;

use crate::cluster::coordinates::{Coordinates, Observation};
use crate::error::{Error, Result};

/// A cluster: its center and the dataset indices of the observations assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub center: Coordinates,
    /// Indices into the dataset the cluster was computed from.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn new(center: Coordinates) -> Self {
        Self {
            center,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Resolves the members of this cluster against the dataset they index.
    ///
    /// # Panics
    ///
    /// If `dataset` is not the dataset the clusters were computed from and is
    /// shorter than the largest member index.
    pub fn observations<'a, O>(&'a self, dataset: &'a [O]) -> impl Iterator<Item = &'a O> + 'a {
        self.members.iter().map(move |&i| &dataset[i])
    }

    /// Moves the center to the mean of the members. A cluster without
    /// members keeps its center.
    pub fn recenter<O: Observation>(&mut self, dataset: &[O]) {
        let points = self.members.iter().map(|&i| dataset[i].coordinates());
        if let Some(center) = Coordinates::mean(points) {
            self.center = center;
        }
    }
}

/// The `k` clusters of a partition, in index order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Clusters(Vec<Cluster>);

impl Clusters {
    /// Creates clusters around the given centers.
    ///
    /// Fails if no centers are given or they do not share one non-zero dimension.
    pub fn from_centers(centers: Vec<Coordinates>) -> Result<Self> {
        let dim = match centers.first() {
            Some(c) => c.len(),
            None => return Err(Error::invalid("at least one center is required")),
        };
        if dim == 0 {
            return Err(Error::invalid("centers must have at least one dimension"));
        }
        if let Some(c) = centers.iter().find(|c| c.len() != dim) {
            return Err(Error::invalid(format!(
                "center has {} dimensions, expected {}",
                c.len(),
                dim
            )));
        }
        Ok(Self(centers.into_iter().map(Cluster::new).collect()))
    }

    /// Starts `k` clusters at the coordinates of `k` distinct observations
    /// drawn uniformly at random from `dataset`.
    pub fn sample<O, R>(k: usize, dataset: &[O], rng: &mut R) -> Result<Self>
    where
        O: Observation,
        R: Rng + ?Sized,
    {
        if k == 0 {
            return Err(Error::invalid("k must be greater than 0"));
        }
        if k > dataset.len() {
            return Err(Error::invalid(format!(
                "the size of the data set ({}) must at least equal k ({})",
                dataset.len(),
                k
            )));
        }
        let centers = rand::seq::index::sample(rng, dataset.len(), k)
            .into_iter()
            .map(|i| Coordinates::new(dataset[i].coordinates().to_vec()))
            .collect();
        Self::from_centers(centers)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cluster> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.0.iter()
    }

    pub fn centers(&self) -> impl Iterator<Item = &Coordinates> {
        self.0.iter().map(|c| &c.center)
    }

    /// Index of the cluster whose center is nearest to `observation`.
    /// Among equidistant centers the lowest index wins.
    pub fn nearest<O: Observation + ?Sized>(&self, observation: &O) -> usize {
        nearest(observation, self.centers())
    }

    /// Recomputes every center from the current members.
    pub fn recenter<O: Observation>(&mut self, dataset: &[O]) {
        for cluster in &mut self.0 {
            cluster.recenter(dataset);
        }
    }

    /// Clears all members, keeping the centers.
    pub fn reset(&mut self) {
        for cluster in &mut self.0 {
            cluster.members.clear();
        }
    }

    /// Puts every cluster's members in ascending index order.
    pub(crate) fn sort_members(&mut self) {
        for cluster in &mut self.0 {
            cluster.members.sort_unstable();
        }
    }

    /// Cluster index of every observation, by observation index.
    ///
    /// Observations that belong to no cluster are reported as `None`.
    pub fn assignments(&self, observations: usize) -> Vec<Option<usize>> {
        let mut table = vec![None; observations];
        for (ci, cluster) in self.0.iter().enumerate() {
            for &p in &cluster.members {
                if let Some(slot) = table.get_mut(p) {
                    *slot = Some(ci);
                }
            }
        }
        table
    }

    pub fn into_vec(self) -> Vec<Cluster> {
        self.0
    }
}

impl From<Vec<Cluster>> for Clusters {
    fn from(clusters: Vec<Cluster>) -> Self {
        Self(clusters)
    }
}

impl Index<usize> for Clusters {
    type Output = Cluster;

    fn index(&self, index: usize) -> &Cluster {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Clusters {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Index of the center nearest to `observation`, lowest index on ties.
///
/// Returns 0 when there are no centers.
pub(crate) fn nearest<'a, O, I>(observation: &O, centers: I) -> usize
where
    O: Observation + ?Sized,
    I: IntoIterator<Item = &'a Coordinates>,
{
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, center) in centers.into_iter().enumerate() {
        let dist = observation.distance(center);
        if i == 0 || dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}
