use std::ops::Deref;

/// A point in feature space, used for cluster centers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Coordinates(Vec<f64>);

impl Coordinates {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance(&self, other: &[f64]) -> f64 {
        distance_sq(&self.0, other)
    }

    /// Mean of the given points, or `None` when there are none.
    ///
    /// All points are expected to share the dimensionality of the first one.
    pub fn mean<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut points = points.into_iter();
        let mut sum = points.next()?.to_vec();
        let mut count = 1_usize;
        for point in points {
            for (acc, &x) in sum.iter_mut().zip(point) {
                *acc += x;
            }
            count += 1;
        }
        let count = count as f64;
        sum.iter_mut().for_each(|x| *x /= count);
        Some(Self(sum))
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for Coordinates {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for Coordinates {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[f64; N]> for Coordinates {
    fn from(values: [f64; N]) -> Self {
        Self(values.to_vec())
    }
}

/// A single data point that can be clustered.
///
/// Implementors expose their coordinates; the distance to a center defaults to
/// the squared Euclidean distance, which orders neighbours the same way as the
/// Euclidean distance without the square root.
pub trait Observation {
    fn coordinates(&self) -> &[f64];

    fn distance(&self, center: &Coordinates) -> f64 {
        distance_sq(self.coordinates(), center)
    }
}

impl Observation for Coordinates {
    fn coordinates(&self) -> &[f64] {
        &self.0
    }
}

impl Observation for Vec<f64> {
    fn coordinates(&self) -> &[f64] {
        self
    }
}

impl<const N: usize> Observation for [f64; N] {
    fn coordinates(&self) -> &[f64] {
        self
    }
}

/// Compute the squared Euclidean distance between two points of the same dimension.
fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0, |acc, (&x, &y)| acc + (x - y).powi(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_is_squared_euclidean() {
        let center = Coordinates::from([1.0, 2.0]);
        let point = [4.0_f64, 6.0];
        assert_relative_eq!(center.distance(&point), 25.0);
        assert_relative_eq!(point.distance(&center), 25.0);
        assert_relative_eq!(center.distance(&center), 0.0);
    }

    #[test]
    fn test_mean() {
        let points = [vec![0.0, 0.0], vec![2.0, 4.0], vec![4.0, 2.0]];
        let mean = Coordinates::mean(points.iter().map(|p| p.as_slice())).unwrap();
        assert_relative_eq!(mean[0], 2.0);
        assert_relative_eq!(mean[1], 2.0);
    }

    #[test]
    fn test_mean_of_nothing() {
        let points: Vec<Vec<f64>> = vec![];
        assert!(Coordinates::mean(points.iter().map(|p| p.as_slice())).is_none());
    }

    #[test]
    fn test_observation_impls_agree() {
        let center = Coordinates::from([0.5, 0.5]);
        let as_vec: Vec<f64> = vec![1.0, 1.0];
        let as_array: [f64; 2] = [1.0, 1.0];
        let as_coords = Coordinates::from(vec![1.0, 1.0]);
        assert_relative_eq!(as_vec.distance(&center), as_array.distance(&center));
        assert_relative_eq!(as_coords.distance(&center), as_array.distance(&center));
    }
}
