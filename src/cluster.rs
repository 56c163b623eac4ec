pub mod coordinates;
pub mod store;

pub use coordinates::{Coordinates, Observation};
pub use store::{Cluster, Clusters};
