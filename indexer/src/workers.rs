//! Bounded scoped worker pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Apply `work` to every item on at most `jobs` threads.
///
/// Results come back in item order regardless of which worker ran them or
/// when they finished. A panicking worker propagates its panic to the caller.
///
/// # Examples
///
/// ```
/// use wheelhouse_indexer::workers::run_bounded;
///
/// let squares = run_bounded(&[1, 2, 3, 4], 2, |n| n * n);
/// assert_eq!(squares, [1, 4, 9, 16]);
/// ```
#[must_use]
pub fn run_bounded<T, R, F>(items: &[T], jobs: usize, work: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = jobs.clamp(1, items.len().max(1));
    let next = AtomicUsize::new(0);
    let slots: Vec<Mutex<Option<R>>> = items.iter().map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let (Some(item), Some(slot)) = (items.get(index), slots.get(index)) else {
                        break;
                    };
                    let result = work(item);
                    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                }
            });
        }
    });

    slots
        .into_iter()
        .filter_map(|slot| slot.into_inner().unwrap_or_else(PoisonError::into_inner))
        .collect()
}
