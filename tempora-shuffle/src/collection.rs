//! Partitioned collections and the worker pool that transforms them
//!
//! A [`Collection`] is an ordered list of partitions. Element-wise transforms
//! run one task per partition on the runtime's thread pool and keep the
//! partition layout, so the order of elements is stable through them.
//! [`Collection::group_by_key`] is a full shuffle: every element is routed to
//! the partition owning the hash of its key, then grouped there.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::config::ShuffleConfig;
use crate::error::{Error, Result};

/// Worker pool shared by the collections of one evaluation
#[derive(Debug)]
pub struct Runtime {
    pool: ThreadPool,
    config: ShuffleConfig,
}

impl Runtime {
    /// Start a runtime
    pub fn new(config: ShuffleConfig) -> Result<Arc<Self>> {
        if config.num_partitions == 0 || config.num_workers == 0 {
            return Err(Error::InvalidArgument(format!(
                "The runtime needs at least one partition and one worker, got {config:?}"
            )));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_workers)
            .thread_name(|i| format!("tempora-worker-{i}"))
            .build()
            .map_err(|e| Error::Runtime(e.to_string()))?;
        debug!(
            num_workers = config.num_workers,
            num_partitions = config.num_partitions,
            "started shuffle runtime"
        );
        Ok(Arc::new(Self { pool, config }))
    }

    /// Get the configuration
    pub fn config(&self) -> &ShuffleConfig {
        &self.config
    }

    /// Run `op` on the worker pool
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }

    /// Distribute `items` over contiguous partitions, keeping their order
    pub fn from_vec<T: Send>(self: &Arc<Self>, items: Vec<T>) -> Collection<T> {
        let chunk = items.len().div_ceil(self.config.num_partitions).max(1);
        let mut partitions = Vec::with_capacity(self.config.num_partitions);
        let mut items = items.into_iter();
        loop {
            let partition: Vec<T> = items.by_ref().take(chunk).collect();
            if partition.is_empty() {
                break;
            }
            partitions.push(partition);
        }
        Collection {
            partitions,
            runtime: self.clone(),
        }
    }

    /// An empty collection
    pub fn empty<T: Send>(self: &Arc<Self>) -> Collection<T> {
        Collection {
            partitions: Vec::new(),
            runtime: self.clone(),
        }
    }
}

/// Partition owning `key` among `num_partitions`
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn partition_of<K: Hash + ?Sized>(key: &K, num_partitions: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % num_partitions.max(1) as u64) as usize
}

/// Tags the elements of two co-grouped collections
enum Tagged<V, W> {
    Left(V),
    Right(W),
}

/// A partitioned collection of elements
#[derive(Clone)]
pub struct Collection<T> {
    partitions: Vec<Vec<T>>,
    runtime: Arc<Runtime>,
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("num_partitions", &self.partitions.len())
            .field("len", &self.len())
            .finish()
    }
}

impl<T> Collection<T> {
    /// Get the runtime
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    /// Check if there are no elements
    pub fn is_empty(&self) -> bool {
        self.partitions.iter().all(Vec::is_empty)
    }

    /// Number of partitions
    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// Gather every element, partition by partition
    pub fn collect(self) -> Vec<T> {
        self.partitions.into_iter().flatten().collect()
    }

    /// Append the partitions of `other`
    pub fn union(mut self, other: Collection<T>) -> Collection<T> {
        self.partitions.extend(other.partitions);
        self
    }
}

impl<T: Send> Collection<T> {
    /// Apply `f` to every element
    pub fn map<U, F>(self, f: F) -> Collection<U>
    where
        U: Send,
        F: Fn(T) -> U + Send + Sync,
    {
        let Self { partitions, runtime } = self;
        let partitions = runtime.install(|| {
            partitions
                .into_par_iter()
                .map(|partition| partition.into_iter().map(&f).collect::<Vec<U>>())
                .collect()
        });
        Collection { partitions, runtime }
    }

    /// Apply a fallible `f` to every element, failing on the first error
    pub fn try_map<U, F>(self, f: F) -> Result<Collection<U>>
    where
        U: Send,
        F: Fn(T) -> Result<U> + Send + Sync,
    {
        let Self { partitions, runtime } = self;
        let partitions = runtime.install(|| {
            partitions
                .into_par_iter()
                .map(|partition| partition.into_iter().map(&f).collect::<Result<Vec<_>>>())
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(Collection { partitions, runtime })
    }

    /// Replace every element by the elements `f` returns for it
    pub fn flat_map<U, I, F>(self, f: F) -> Collection<U>
    where
        U: Send,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Send + Sync,
    {
        let Self { partitions, runtime } = self;
        let partitions = runtime.install(|| {
            partitions
                .into_par_iter()
                .map(|partition| partition.into_iter().flat_map(&f).collect::<Vec<U>>())
                .collect()
        });
        Collection { partitions, runtime }
    }

    /// Fallible [`Collection::flat_map`]
    pub fn try_flat_map<U, I, F>(self, f: F) -> Result<Collection<U>>
    where
        U: Send,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> Result<I> + Send + Sync,
    {
        let Self { partitions, runtime } = self;
        let partitions = runtime.install(|| {
            partitions
                .into_par_iter()
                .map(|partition| {
                    let mut output: Vec<U> = Vec::new();
                    for item in partition {
                        output.extend(f(item)?);
                    }
                    Ok::<_, Error>(output)
                })
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(Collection { partitions, runtime })
    }

    /// Keep the elements matching `predicate`
    pub fn filter<F>(self, predicate: F) -> Collection<T>
    where
        F: Fn(&T) -> bool + Send + Sync,
    {
        let Self { partitions, runtime } = self;
        let partitions = runtime.install(|| {
            partitions
                .into_par_iter()
                .map(|partition| {
                    partition.into_iter().filter(|item| predicate(item)).collect::<Vec<T>>()
                })
                .collect()
        });
        Collection { partitions, runtime }
    }
}

impl<K, V> Collection<(K, V)>
where
    K: Hash + Ord + Send,
    V: Send,
{
    /// Group the values of each key.
    ///
    /// Every key ends up in exactly one output element. Values keep the
    /// order in which they were found, but callers should not rely on it:
    /// the partitioning is an implementation detail.
    pub fn group_by_key(self) -> Collection<(K, Vec<V>)> {
        let Self { partitions, runtime } = self;
        let num_partitions = runtime.config.num_partitions;

        let scattered: Vec<Vec<Vec<(K, V)>>> = runtime.install(|| {
            partitions
                .into_par_iter()
                .map(|partition| {
                    let mut buckets: Vec<Vec<(K, V)>> =
                        (0..num_partitions).map(|_| Vec::new()).collect();
                    for (key, value) in partition {
                        if let Some(bucket) = buckets.get_mut(partition_of(&key, num_partitions)) {
                            bucket.push((key, value));
                        }
                    }
                    buckets
                })
                .collect()
        });

        let mut shuffled: Vec<Vec<(K, V)>> = (0..num_partitions).map(|_| Vec::new()).collect();
        for buckets in scattered {
            for (target, bucket) in shuffled.iter_mut().zip(buckets) {
                target.extend(bucket);
            }
        }

        let partitions = runtime.install(|| {
            shuffled
                .into_par_iter()
                .map(|partition| {
                    let mut groups: BTreeMap<K, Vec<V>> = BTreeMap::new();
                    for (key, value) in partition {
                        groups.entry(key).or_default().push(value);
                    }
                    groups.into_iter().collect::<Vec<_>>()
                })
                .collect()
        });
        Collection { partitions, runtime }
    }

    /// Group the values of both collections by key.
    ///
    /// Each key present in either collection yields one element holding the
    /// values of `self` and of `other` for that key.
    pub fn co_group<W: Send>(self, other: Collection<(K, W)>) -> Collection<(K, (Vec<V>, Vec<W>))> {
        let left = self.map(|(key, value)| (key, Tagged::Left(value)));
        let right = other.map(|(key, value)| (key, Tagged::Right(value)));
        left.union(right).group_by_key().map(|(key, tagged)| {
            let mut values = (Vec::new(), Vec::new());
            for item in tagged {
                match item {
                    Tagged::Left(v) => values.0.push(v),
                    Tagged::Right(w) => values.1.push(w),
                }
            }
            (key, values)
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn runtime(num_partitions: usize) -> Arc<Runtime> {
        Runtime::new(ShuffleConfig {
            num_partitions,
            num_workers: 2,
        })
        .unwrap()
    }

    #[test_case(1)]
    #[test_case(3)]
    #[test_case(16)]
    fn test_from_vec_keeps_order(num_partitions: usize) {
        let collection = runtime(num_partitions).from_vec((0..10).collect::<Vec<_>>());
        assert!(collection.num_partitions() <= num_partitions);
        assert_eq!(collection.len(), 10);
        assert_eq!(collection.map(|x| x * 2).collect(), (0..10).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_try_map_propagates_errors() {
        let collection = runtime(4).from_vec(vec![1, 2, 3]);
        let err = collection
            .try_map(|x| {
                if x == 2 {
                    Err(Error::ContractViolation("two".to_string()))
                } else {
                    Ok(x)
                }
            })
            .unwrap_err();
        assert!(matches!(err, Error::ContractViolation(_)));
    }

    #[test_case(1)]
    #[test_case(7)]
    fn test_group_by_key(num_partitions: usize) {
        let items = vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)];
        let mut groups = runtime(num_partitions).from_vec(items).group_by_key().collect();
        groups.sort();
        assert_eq!(groups, vec![("a", vec![2, 5]), ("b", vec![1, 3]), ("c", vec![4])]);
    }

    #[test]
    fn test_co_group() {
        let runtime = runtime(3);
        let left = runtime.from_vec(vec![(1, "x"), (2, "y")]);
        let right = runtime.from_vec(vec![(2, 20.0), (3, 30.0)]);

        let mut groups = left.co_group(right).collect();
        groups.sort_by_key(|(key, _)| *key);
        assert_eq!(
            groups,
            vec![
                (1, (vec!["x"], vec![])),
                (2, (vec!["y"], vec![20.0])),
                (3, (vec![], vec![30.0])),
            ]
        );
    }

    #[test]
    fn test_filter_and_flat_map() {
        let collection = runtime(2).from_vec(vec![1, 2, 3, 4]);
        let result = collection.filter(|x| x % 2 == 0).flat_map(|x| vec![x; 2]).collect();
        assert_eq!(result, vec![2, 2, 4, 4]);
    }

    #[test]
    fn test_invalid_config() {
        assert!(Runtime::new(ShuffleConfig {
            num_partitions: 0,
            num_workers: 1
        })
        .is_err());
    }
}
