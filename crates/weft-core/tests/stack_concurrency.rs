//! Cross-thread tests for the race-free stack

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use weft_core::{ScopedThread, StackError, ThreadSafeStack};

/// No value is ever lost or popped twice, no matter how producers and
/// consumers interleave.
#[test]
fn concurrent_push_pop_is_linearizable() {
    let producers = 4;
    let per_producer = 1_000u64;
    let total = producers as usize * per_producer as usize;

    let stack = Arc::new(ThreadSafeStack::new());
    let remaining = Arc::new(AtomicUsize::new(total));

    let mut workers = Vec::new();
    for p in 0..producers {
        let stack = stack.clone();
        workers.push(ScopedThread::spawn(move || {
            for i in 0..per_producer {
                stack.push(p * per_producer + i);
                // Occasional jitter to vary the interleaving
                if rand::random::<u8>() < 8 {
                    std::thread::sleep(Duration::from_micros(50));
                }
            }
            Vec::new()
        }));
    }

    let consumers = num_cpus::get().clamp(2, 4);
    for _ in 0..consumers {
        let stack = stack.clone();
        let remaining = remaining.clone();
        workers.push(ScopedThread::spawn(move || {
            let mut popped = Vec::new();
            loop {
                if remaining.load(Ordering::Acquire) == 0 {
                    break;
                }
                match stack.pop() {
                    Ok(value) => {
                        remaining.fetch_sub(1, Ordering::AcqRel);
                        popped.push(value);
                    }
                    Err(StackError::Empty) => std::hint::spin_loop(),
                }
            }
            popped
        }));
    }

    let mut all: Vec<u64> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();
    all.sort_unstable();

    // Exactly the produced values, each exactly once
    let expected: Vec<u64> = (0..total as u64).collect();
    assert_eq!(all, expected);
    assert!(stack.is_empty());
}

/// Push three values, let two threads race over pop: two distinct values
/// come back and the complement stays behind.
#[test]
fn two_pops_race_over_three_elements() {
    let stack = Arc::new(ThreadSafeStack::new());
    stack.push(1);
    stack.push(2);
    stack.push(3);

    let barrier = Arc::new(Barrier::new(2));
    let mut poppers = Vec::new();
    for _ in 0..2 {
        let stack = stack.clone();
        let barrier = barrier.clone();
        poppers.push(ScopedThread::spawn(move || {
            barrier.wait();
            stack.pop().unwrap()
        }));
    }

    let mut popped: Vec<i32> = poppers.into_iter().map(|p| p.join().unwrap()).collect();
    popped.sort_unstable();

    assert_ne!(popped[0], popped[1]);
    assert!(popped.iter().all(|v| (1..=3).contains(v)));

    // Quiesced: exactly the complement is left
    assert_eq!(stack.len(), 1);
    let left = stack.pop().unwrap();
    assert!((1..=3).contains(&left));
    assert!(!popped.contains(&left));
}

/// Popping an empty stack reports the condition without blocking, even
/// under concurrent pressure from other poppers.
#[test]
fn pop_on_empty_never_blocks() {
    let stack: Arc<ThreadSafeStack<u8>> = Arc::new(ThreadSafeStack::new());

    let mut workers = Vec::new();
    for _ in 0..4 {
        let stack = stack.clone();
        workers.push(ScopedThread::spawn(move || {
            for _ in 0..100 {
                assert_eq!(stack.pop(), Err(StackError::Empty));
            }
        }));
    }

    for worker in workers {
        worker.join().unwrap();
    }
}

/// `pop_into` participates in the same single guarded step as `pop`.
#[test]
fn pop_into_under_concurrency() {
    let total = 1_000;
    let stack = Arc::new(ThreadSafeStack::new());
    for i in 0..total {
        stack.push(i);
    }

    let mut workers = Vec::new();
    for _ in 0..2 {
        let stack = stack.clone();
        workers.push(ScopedThread::spawn(move || {
            let mut seen = Vec::new();
            let mut slot = 0;
            while stack.pop_into(&mut slot).is_ok() {
                seen.push(slot);
            }
            seen
        }));
    }

    let mut all: Vec<i32> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();
    all.sort_unstable();

    assert_eq!(all, (0..total).collect::<Vec<_>>());
}
