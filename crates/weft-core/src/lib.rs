//! Weft locking toolkit
//!
//! This crate provides mutex-based building blocks for race-free,
//! deadlock-resistant shared state:
//! - Lock capability trait and a parking_lot-backed default lock
//! - Scoped and movable RAII ownership guards
//! - Rank-ordered lock hierarchies with per-thread enforcement
//! - All-or-nothing acquisition of multiple locks without deadlock
//! - A stack whose public interface has no check-then-act race
//! - A join-on-drop thread wrapper with transferable ownership

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod lock;
pub mod stack;
pub mod thread;

pub use lock::{
    multi_lock, thread_ceiling, GuardError, HierarchicalLock, HierarchyError, LockGuard,
    Lockable, MovableGuard, MultiGuard, MultiLockError, RawLock,
};
pub use stack::{StackError, ThreadSafeStack};
pub use thread::{ScopedThread, ThreadError};
