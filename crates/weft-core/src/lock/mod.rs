//! Locking primitives
//!
//! This module provides the `Lockable` capability trait, RAII ownership
//! guards, rank-ordered hierarchical locks, and deadlock-free acquisition
//! of multiple locks as one indivisible step.

mod guard;
mod hierarchy;
mod multi;
mod raw;

pub use guard::{GuardError, LockGuard, MovableGuard};
pub use hierarchy::{thread_ceiling, HierarchicalLock, HierarchyError};
pub use multi::{multi_lock, MultiGuard, MultiLockError};
pub use raw::{Lockable, RawLock};
