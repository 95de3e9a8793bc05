//! Data-parallel index loops
//!
//! Kernels iterate a bounded index space `[0, n)` through a
//! [`ParallelLoop`]: either in the calling thread ([`SequentialLoop`]) or
//! statically split across a thread pool ([`ThreadPoolLoop`]). Each worker
//! owns the contiguous slice `[index0(n, w), index1(n, w))`, so bodies
//! touching only their own index are race-free by construction.

use rayon::scope;

/// Execution strategy for data-parallel kernels.
///
/// Bodies receive `(worker_id, index)`; the worker count is available
/// from the loop itself. Reduction bodies return a per-index value that
/// is folded with an associative combiner, starting from `T::default()`.
pub trait ParallelLoop: Send + Sync {
    /// Build a loop that targets `num_workers` workers.
    fn with_workers(num_workers: usize) -> Self;

    fn num_workers(&self) -> usize;

    /// First index owned by `worker` when splitting `[0, n)`.
    #[inline]
    fn index0(&self, n: u64, worker: usize) -> u64 {
        n * worker as u64 / self.num_workers() as u64
    }

    /// One past the last index owned by `worker`.
    #[inline]
    fn index1(&self, n: u64, worker: usize) -> u64 {
        n * (worker as u64 + 1) / self.num_workers() as u64
    }

    /// Run `body` for every index in `[0, n)`.
    fn run<F>(&self, n: u64, body: F)
    where
        F: Fn(usize, u64) + Sync;

    /// Fold `body` over each worker's slice, returning per-worker partials.
    ///
    /// The result has `num_workers()` entries; workers with an empty slice
    /// contribute `T::default()`.
    fn run_reduce_partials<T, F, C>(&self, n: u64, body: F, combine: C) -> Vec<T>
    where
        T: Send + Default,
        F: Fn(usize, u64) -> T + Sync,
        C: Fn(T, T) -> T + Sync;

    /// Fold `body` over `[0, n)` into a single value.
    fn run_reduce<T, F, C>(&self, n: u64, body: F, combine: C) -> T
    where
        T: Send + Default,
        F: Fn(usize, u64) -> T + Sync,
        C: Fn(T, T) -> T + Sync,
    {
        let partials = self.run_reduce_partials(n, body, &combine);
        partials.into_iter().fold(T::default(), &combine)
    }
}

/// Runs every index in the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialLoop;

impl ParallelLoop for SequentialLoop {
    fn with_workers(_num_workers: usize) -> Self {
        SequentialLoop
    }

    fn num_workers(&self) -> usize {
        1
    }

    fn run<F>(&self, n: u64, body: F)
    where
        F: Fn(usize, u64) + Sync,
    {
        for i in 0..n {
            body(0, i);
        }
    }

    fn run_reduce_partials<T, F, C>(&self, n: u64, body: F, combine: C) -> Vec<T>
    where
        T: Send + Default,
        F: Fn(usize, u64) -> T + Sync,
        C: Fn(T, T) -> T + Sync,
    {
        let mut acc = T::default();
        for i in 0..n {
            acc = combine(acc, body(0, i));
        }
        vec![acc]
    }
}

/// Static work splitting over rayon's thread pool.
///
/// Worker tasks are spawned onto the global pool; the call blocks until
/// every worker has drained its slice.
#[derive(Debug, Clone, Copy)]
pub struct ThreadPoolLoop {
    workers: usize,
}

impl ParallelLoop for ThreadPoolLoop {
    fn with_workers(num_workers: usize) -> Self {
        Self {
            workers: num_workers.max(1),
        }
    }

    fn num_workers(&self) -> usize {
        self.workers
    }

    fn run<F>(&self, n: u64, body: F)
    where
        F: Fn(usize, u64) + Sync,
    {
        if self.workers == 1 {
            for i in 0..n {
                body(0, i);
            }
            return;
        }

        let body = &body;
        scope(|s| {
            for w in 0..self.workers {
                s.spawn(move |_| {
                    for i in self.index0(n, w)..self.index1(n, w) {
                        body(w, i);
                    }
                });
            }
        });
    }

    fn run_reduce_partials<T, F, C>(&self, n: u64, body: F, combine: C) -> Vec<T>
    where
        T: Send + Default,
        F: Fn(usize, u64) -> T + Sync,
        C: Fn(T, T) -> T + Sync,
    {
        let mut partials: Vec<T> = (0..self.workers).map(|_| T::default()).collect();

        if self.workers == 1 {
            let mut acc = T::default();
            for i in 0..n {
                acc = combine(acc, body(0, i));
            }
            partials[0] = acc;
            return partials;
        }

        let body = &body;
        let combine = &combine;
        scope(|s| {
            for (w, slot) in partials.iter_mut().enumerate() {
                s.spawn(move |_| {
                    let mut acc = T::default();
                    for i in self.index0(n, w)..self.index1(n, w) {
                        acc = combine(acc, body(w, i));
                    }
                    *slot = acc;
                });
            }
        });

        partials
    }
}

/// Shareable raw pointer for kernels that write disjoint indices from
/// multiple workers.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SyncPtr<T>(pub *mut T);

unsafe impl<T> Send for SyncPtr<T> {}
unsafe impl<T> Sync for SyncPtr<T> {}

impl<T> SyncPtr<T> {
    /// Reads the pointer through a method call so closures capture the
    /// whole `SyncPtr` (which is `Sync`) rather than the bare `*mut T`
    /// field via Rust 2021 disjoint closure capture.
    #[inline]
    pub(crate) fn get(self) -> *mut T {
        self.0
    }
}
