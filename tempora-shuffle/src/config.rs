//! Runtime configuration

/// Configuration of the local data-parallel runtime
#[derive(Debug, Clone)]
pub struct ShuffleConfig {
    /// Number of partitions a collection is split into, and the fan-out of
    /// every key grouping
    pub num_partitions: usize,

    /// Number of worker threads
    pub num_workers: usize,
}

impl Default for ShuffleConfig {
    fn default() -> Self {
        let workers = num_cpus::get();
        Self {
            num_partitions: workers * 2,
            num_workers: workers,
        }
    }
}

impl ShuffleConfig {
    /// Configuration with `num_workers` threads and twice as many partitions
    pub fn with_workers(num_workers: usize) -> Self {
        Self {
            num_partitions: num_workers * 2,
            num_workers,
        }
    }
}
