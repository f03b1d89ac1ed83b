//! All-or-nothing acquisition of multiple locks

use crate::lock::{Lockable, MovableGuard};
use crossbeam::utils::Backoff;

/// Errors detected before any acquisition is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MultiLockError {
    /// Fewer than two locks were passed
    #[error("multi_lock needs at least two locks, got {0}")]
    NotEnough(usize),

    /// The same lock appears more than once in the set
    #[error("the same lock was passed to multi_lock more than once")]
    Aliased,
}

/// Owns every lock acquired by one [`multi_lock`] call.
///
/// Releases the locks on drop in reverse acquisition order, the order
/// nested guards would unwind in. Order-sensitive locks such as
/// [`HierarchicalLock`](crate::lock::HierarchicalLock) demand exactly
/// that release order, so dropping the guard is always safe.
pub struct MultiGuard<'a, L: Lockable + ?Sized> {
    /// Most recently acquired last
    guards: Vec<MovableGuard<'a, L>>,
}

impl<'a, L: Lockable + ?Sized> core::fmt::Debug for MultiGuard<'a, L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MultiGuard")
            .field("len", &self.guards.len())
            .finish()
    }
}

impl<'a, L: Lockable + ?Sized> MultiGuard<'a, L> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            guards: Vec::with_capacity(capacity),
        }
    }

    /// Number of locks still owned by this guard.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Check whether every lock has been popped off already.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Detach the most recently acquired lock as its own guard.
    ///
    /// Popping hands out releases in the same order a full drop would
    /// perform them, so a caller can shorten the critical section one
    /// lock at a time.
    pub fn pop(&mut self) -> Option<MovableGuard<'a, L>> {
        self.guards.pop()
    }
}

impl<L: Lockable + ?Sized> Drop for MultiGuard<'_, L> {
    fn drop(&mut self) {
        // Reverse acquisition order, as the hierarchy requires
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}

/// Acquire every lock in `locks` as one indivisible step.
///
/// On success every lock is held and the returned [`MultiGuard`]
/// releases all of them, most recent first, when dropped; until then no
/// subset is ever held while the calling thread blocks, so two threads
/// racing over the same set never deadlock regardless of the order each
/// names the locks in.
///
/// The strategy follows the classic lock-then-try rotation: block on one
/// designated lock, attempt the rest without blocking, and on any refusal
/// release the whole round in reverse, make the lock that refused the
/// designated one, back off, and retry.
///
/// Ranked locks compose through their capability surface, where a rank
/// refusal reads as a failed attempt and rolls the round back like any
/// other contention; the rotation then converges on an acquisition order
/// the hierarchy accepts. For that convergence a set of ranked locks
/// must be named in descending rank order (or a rotation of one).
///
/// Fails only on misuse: fewer than two locks, or the same lock named
/// twice (identity is by address). Callers must deduplicate aliased
/// targets; acquiring one non-reentrant lock twice from the same thread
/// would deadlock.
pub fn multi_lock<'a, L>(locks: &[&'a L]) -> Result<MultiGuard<'a, L>, MultiLockError>
where
    L: Lockable + ?Sized,
{
    if locks.len() < 2 {
        return Err(MultiLockError::NotEnough(locks.len()));
    }
    for (i, lock) in locks.iter().enumerate() {
        for other in &locks[i + 1..] {
            if std::ptr::addr_eq(*lock as *const L, *other as *const L) {
                return Err(MultiLockError::Aliased);
            }
        }
    }

    let n = locks.len();
    let backoff = Backoff::new();
    // Index of the lock we are willing to block on this round
    let mut pivot = 0;
    loop {
        let mut round = MultiGuard::with_capacity(n);
        locks[pivot].lock();
        round.guards.push(MovableGuard::adopt(locks[pivot]));

        let mut refused = None;
        for offset in 1..n {
            let idx = (pivot + offset) % n;
            if locks[idx].try_lock() {
                round.guards.push(MovableGuard::adopt(locks[idx]));
            } else {
                refused = Some(idx);
                break;
            }
        }

        match refused {
            None => return Ok(round),
            Some(idx) => {
                // Roll the round back, most recent first, before
                // blocking again
                drop(round);
                pivot = idx;
                backoff.snooze();
            }
        }
    }
}
