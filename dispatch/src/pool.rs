use crate::locator::{Locality, LocatorError};
use crate::requests::Endpoint;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Everything a task knows about where it runs. Created when the task starts and handed down
/// explicitly; dispatch never looks the endpoint up on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionContext {
    pub partition: usize,
    /// Index of the execution unit running the task, if it runs inside the pool
    pub unit: Option<usize>,
    pub endpoint: Endpoint,
}

/// Fixed set of execution units. Each unit works through one partition at a time.
pub struct ExecutionPool {
    pool: ThreadPool,
}

impl ExecutionPool {
    /// `None` uses the available parallelism
    pub fn new(units: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(units.unwrap_or(0))
            .thread_name(|index| format!("unit-{index}"))
            .build()?;

        Ok(Self { pool })
    }

    pub fn units(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op` once on every execution unit
    pub fn broadcast<T, F>(&self, op: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync,
    {
        self.pool.broadcast(|context| op(context.index()))
    }

    /// Runs `op` over every partition in parallel. Results come back in partition order.
    ///
    /// The endpoint is resolved inside the task, on the unit that will call it.
    pub fn map_partitions<I, T, E, F>(&self, locality: &Locality, partitions: Vec<I>, op: F) -> Result<Vec<T>, E>
    where
        I: Send,
        T: Send,
        E: From<LocatorError> + Send,
        F: Fn(&PartitionContext, I) -> Result<T, E> + Sync,
    {
        self.pool.install(|| {
            partitions.into_par_iter()
                .enumerate()
                .map(|(partition, input)| {
                    let context = PartitionContext {
                        partition,
                        unit: rayon::current_thread_index(),
                        endpoint: locality.local_endpoint()?,
                    };
                    op(&context, input)
                })
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::FixedResolver;
    use std::sync::Arc;

    #[test]
    fn test_broadcast_reaches_every_unit() {
        let pool = ExecutionPool::new(Some(3)).unwrap();
        assert_eq!(pool.units(), 3);

        let mut units = pool.broadcast(|unit| unit);
        units.sort();
        assert_eq!(units, vec![0, 1, 2]);
    }

    #[test]
    fn test_map_partitions_keeps_order() {
        let pool = ExecutionPool::new(Some(4)).unwrap();
        let locality = Locality::new(Arc::new(FixedResolver::new("10.0.0.7")), 5000);

        let out = pool
            .map_partitions(&locality, (0..32).collect(), |context, input: usize| {
                assert!(context.unit.is_some_and(|unit| unit < 4));
                assert_eq!(context.endpoint, Endpoint::new("10.0.0.7", 5000));
                Ok::<_, LocatorError>((context.partition, input * 2))
            })
            .unwrap();

        assert_eq!(out.len(), 32);
        assert!(out.iter().enumerate().all(|(i, &(partition, doubled))| partition == i && doubled == i * 2));
    }

    #[test]
    fn test_map_partitions_stops_on_error() {
        let pool = ExecutionPool::new(Some(2)).unwrap();
        let locality = Locality::new(Arc::new(FixedResolver::loopback()), 5000);

        let out = pool.map_partitions(&locality, vec![1, 2, 3], |_, input: i32| {
            if input == 2 {
                Err(LocatorError::NoAddress)
            } else {
                Ok(input)
            }
        });
        assert!(matches!(out, Err(LocatorError::NoAddress)));
    }
}
