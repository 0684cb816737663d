//! Execution-context handle for cooperative kernel calls.
//!
//! A [`Member`] identifies how one factorization call executes: as a single
//! sequential flow on the host, or as a fixed-size team of workers that
//! jointly execute the call. It is a non-owning capability token; the only
//! synchronization it provides is the implicit barrier at the end of
//! [`Member::for_each_column_block`], which kernels place between
//! factorization steps.

use std::ops::Range;

/// Capability token identifying the execution context of a kernel call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    workers: usize,
}

impl Member {
    /// The plain sequential host context.
    pub fn host_serial() -> Self {
        Self { workers: 1 }
    }

    /// A cooperative team of `workers` parallel workers (at least one).
    ///
    /// Work distributed through this member runs on the global rayon pool;
    /// `workers` bounds how many blocks a distribution is split into, not
    /// which threads execute them.
    #[cfg(feature = "parallel")]
    pub fn team(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of cooperating workers (1 for the sequential host).
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Whether this is the plain sequential host context.
    #[inline]
    pub fn is_host_serial(&self) -> bool {
        self.workers == 1
    }

    /// Run `f` once per contiguous block of `cols`, one block per worker.
    ///
    /// Returns only after every block has completed; kernels rely on this as
    /// the barrier between factorization steps. Blocks are disjoint, so `f`
    /// may mutate per-column data without further synchronization.
    pub(crate) fn for_each_column_block<F>(&self, cols: Range<usize>, f: F)
    where
        F: Fn(Range<usize>) + Sync,
    {
        if cols.is_empty() {
            return;
        }
        if self.workers <= 1 || cols.len() == 1 {
            f(cols);
            return;
        }
        #[cfg(feature = "parallel")]
        {
            let blocks = partition_columns(cols, self.workers);
            rayon::scope(|s| {
                for block in blocks {
                    let f = &f;
                    s.spawn(move |_| f(block));
                }
            });
        }
        #[cfg(not(feature = "parallel"))]
        f(cols);
    }
}

/// Split `cols` into at most `parts` contiguous, near-equal ranges.
///
/// The first `len % parts` ranges get one extra column, so sizes differ by at
/// most one and the union covers `cols` exactly.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
pub(crate) fn partition_columns(cols: Range<usize>, parts: usize) -> Vec<Range<usize>> {
    let n = cols.len();
    let parts = parts.clamp(1, n.max(1));
    let base = n / parts;
    let extra = n % parts;
    let mut out = Vec::with_capacity(parts);
    let mut start = cols.start;
    for p in 0..parts {
        let len = base + usize::from(p < extra);
        out.push(start..start + len);
        start += len;
    }
    out
}
