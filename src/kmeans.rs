pub mod config;
pub mod observer;
pub mod partition;

pub use config::{KMeans, DEFAULT_DELTA_THRESHOLD, DEFAULT_ITERATION_CAP};
pub use observer::{LogObserver, Observer, Progress};
