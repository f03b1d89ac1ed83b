//! Rank-ordered locks with per-thread hierarchy enforcement

use crate::lock::{Lockable, RawLock};
use crossbeam::atomic::AtomicCell;
use std::cell::Cell;

thread_local! {
    /// Highest rank the current thread may still acquire.
    ///
    /// Per-thread by construction: the ceiling is never shared between
    /// threads and needs no synchronization of its own.
    static THREAD_CEILING: Cell<u64> = const { Cell::new(u64::MAX) };
}

/// Errors raised by hierarchy enforcement.
///
/// Both variants indicate a latent deadlock in the program's lock
/// ordering. They are reported deterministically at the offending call,
/// the first time it happens, instead of surfacing later as an
/// intermittent hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// Attempt to acquire a lock whose rank does not strictly precede
    /// the thread's current ceiling
    #[error("cannot acquire lock with rank {rank} while the thread ceiling is {ceiling}")]
    Violation {
        /// Rank of the lock whose acquisition was refused
        rank: u64,
        /// The calling thread's ceiling at the time of the attempt
        ceiling: u64,
    },

    /// Ranked locks released in a different order than they were acquired
    #[error("lock with rank {rank} released out of order (thread ceiling is {ceiling})")]
    OutOfOrderRelease {
        /// Rank of the lock being released
        rank: u64,
        /// The calling thread's ceiling at the time of the release
        ceiling: u64,
    },
}

/// The calling thread's current hierarchy ceiling.
///
/// Starts at `u64::MAX` and tracks the rank of the most recently acquired
/// [`HierarchicalLock`]. Exposed for diagnostics and tests.
pub fn thread_ceiling() -> u64 {
    THREAD_CEILING.get()
}

/// A lock tagged with an ordering rank.
///
/// Ranks impose a program-wide total order on acquisition: a thread may
/// only acquire a `HierarchicalLock` whose rank is strictly below every
/// ranked lock it already holds. Acquiring against the order fails with
/// [`HierarchyError::Violation`] before the underlying lock is touched,
/// so an ordering bug is caught deterministically instead of manifesting
/// as an occasional deadlock.
///
/// No call site needs to know about any other call site; the rank on the
/// lock itself carries the ordering contract.
pub struct HierarchicalLock<L: Lockable = RawLock> {
    /// Position in the acquisition order; lower ranks are acquired later
    rank: u64,

    /// Ceiling the holding thread had before acquiring this lock.
    /// Written only while the inner lock is held.
    prev_ceiling: AtomicCell<u64>,

    /// The lock being ordered
    inner: L,
}

impl HierarchicalLock<RawLock> {
    /// Create a ranked lock over a fresh [`RawLock`].
    pub fn with_rank(rank: u64) -> Self {
        Self::new(rank, RawLock::new())
    }
}

impl<L: Lockable> HierarchicalLock<L> {
    /// Wrap `inner` with ordering rank `rank`.
    ///
    /// The rank is fixed for the lifetime of the lock.
    pub fn new(rank: u64, inner: L) -> Self {
        Self {
            rank,
            prev_ceiling: AtomicCell::new(u64::MAX),
            inner,
        }
    }

    /// This lock's ordering rank.
    pub fn rank(&self) -> u64 {
        self.rank
    }

    /// Access the wrapped lock.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Acquire, blocking until the inner lock is free.
    ///
    /// Fails with [`HierarchyError::Violation`] if the calling thread
    /// already holds a lock of rank less than or equal to this one; the
    /// inner lock is left untouched in that case.
    pub fn lock(&self) -> Result<(), HierarchyError> {
        self.check_order()?;
        self.inner.lock();
        self.lower_ceiling();
        Ok(())
    }

    /// Attempt to acquire without blocking.
    ///
    /// The hierarchy check fails the same way as [`lock`](Self::lock),
    /// never by blocking. `Ok(false)` means the inner lock was contended;
    /// no ceiling state changes.
    pub fn try_lock(&self) -> Result<bool, HierarchyError> {
        self.check_order()?;
        if !self.inner.try_lock() {
            return Ok(false);
        }
        self.lower_ceiling();
        Ok(true)
    }

    /// Release the lock and restore the thread's previous ceiling.
    ///
    /// # Panics
    ///
    /// Panics if this lock is not the calling thread's most recent ranked
    /// acquisition. Out-of-order release would corrupt the saved-ceiling
    /// chain, so it is treated as a fatal programming error.
    pub fn unlock(&self) {
        let ceiling = THREAD_CEILING.get();
        if ceiling != self.rank {
            panic!(
                "{}",
                HierarchyError::OutOfOrderRelease {
                    rank: self.rank,
                    ceiling,
                }
            );
        }
        THREAD_CEILING.set(self.prev_ceiling.load());
        self.inner.unlock();
    }

    fn check_order(&self) -> Result<(), HierarchyError> {
        let ceiling = THREAD_CEILING.get();
        if self.rank >= ceiling {
            return Err(HierarchyError::Violation {
                rank: self.rank,
                ceiling,
            });
        }
        Ok(())
    }

    /// Record the previous ceiling and lower the thread's ceiling to this
    /// lock's rank. Called only after the inner lock has been acquired.
    fn lower_ceiling(&self) {
        self.prev_ceiling.store(THREAD_CEILING.get());
        THREAD_CEILING.set(self.rank);
    }
}

/// Ranked locks compose with guards and [`multi_lock`] through the
/// capability trait. A blocking `lock` has no refusal channel, so a
/// violation there is a programming error and panics. A `try_lock`
/// refused by rank reads as an ordinary failed attempt: a non-blocking
/// caller must handle `false` anyway, and [`multi_lock`]'s
/// rotation relies on that to roll a round back and converge on an
/// acquisition order the hierarchy accepts. Call the inherent methods to
/// observe violations as typed errors; on the concrete type they shadow
/// the trait.
///
/// [`multi_lock`]: crate::lock::multi_lock
impl<L: Lockable> Lockable for HierarchicalLock<L> {
    fn lock(&self) {
        if let Err(violation) = HierarchicalLock::lock(self) {
            panic!("{violation}");
        }
    }

    fn try_lock(&self) -> bool {
        HierarchicalLock::try_lock(self).unwrap_or(false)
    }

    fn unlock(&self) {
        HierarchicalLock::unlock(self);
    }
}
