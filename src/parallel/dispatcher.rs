use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Runs one closure call per index, across a fixed number of workers.
///
/// A dispatcher owns its own rayon pool, so its lifetime bounds the worker
/// threads. With one worker (or zero) no pool is built and indices are visited
/// in order on the calling thread.
#[derive(Debug)]
pub struct Dispatcher {
    pool: Option<ThreadPool>,
}

impl Dispatcher {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = if workers > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("kmeans-worker-{i}"))
                    .build()?,
            )
        } else {
            None
        };
        Ok(Self { pool })
    }

    /// Calls `f(i)` exactly once for every `i` in `0..n` and returns when all
    /// calls have completed. Calls may run concurrently; `f` is responsible for
    /// synchronizing any state it shares.
    pub fn for_each<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        match &self.pool {
            Some(pool) => pool.install(|| (0..n).into_par_iter().for_each(&f)),
            None => (0..n).for_each(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn visit_counts(workers: usize, n: usize) -> Vec<usize> {
        let counts: Vec<AtomicUsize> = (0..n).map(|_| AtomicUsize::new(0)).collect();
        Dispatcher::new(workers).unwrap().for_each(n, |i| {
            counts[i].fetch_add(1, Ordering::Relaxed);
        });
        counts.into_iter().map(AtomicUsize::into_inner).collect()
    }

    #[test]
    fn test_every_index_exactly_once() {
        for workers in [0, 1, 2, 8] {
            assert_eq!(visit_counts(workers, 1_000), vec![1; 1_000]);
        }
    }

    #[test]
    fn test_sequential_visits_in_order() {
        let order = Mutex::new(Vec::new());
        Dispatcher::new(1).unwrap().for_each(5, |i| order.lock().unwrap().push(i));
        assert_eq!(order.into_inner().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_zero_items() {
        Dispatcher::new(4).unwrap().for_each(0, |_| panic!("no index expected"));
    }
}
