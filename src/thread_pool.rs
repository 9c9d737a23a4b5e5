//! Thread pools for running sampler chains concurrently.
//!
//! Pools are sized by the number of concurrent chains and shared across
//! runs. Threads get an 8 MB stack, since sampler chains can recurse deeply
//! when building trajectories.

#[cfg(feature = "parallel")]
use std::collections::HashMap;
#[cfg(feature = "parallel")]
use std::sync::{Arc, Mutex, OnceLock};

#[cfg(feature = "parallel")]
use rayon::ThreadPool;

#[cfg(feature = "parallel")]
static THREAD_POOLS: OnceLock<Mutex<HashMap<usize, Arc<ThreadPool>>>> = OnceLock::new();

#[cfg(feature = "parallel")]
const STACK_SIZE: usize = 8 * 1024 * 1024;

/// Get or build the shared pool with `threads` worker threads.
///
/// Returns `None` if rayon cannot spawn the pool.
#[cfg(feature = "parallel")]
pub fn get_thread_pool(threads: usize) -> Option<Arc<ThreadPool>> {
    let threads = threads.max(1);
    let pools = THREAD_POOLS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut pools = pools.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(pool) = pools.get(&threads) {
        return Some(Arc::clone(pool));
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .stack_size(STACK_SIZE)
        .build()
    {
        Ok(pool) => {
            let pool = Arc::new(pool);
            pools.insert(threads, Arc::clone(&pool));
            Some(pool)
        }
        Err(err) => {
            tracing::warn!(threads, error = %err, "failed to build thread pool");
            None
        }
    }
}

/// Execute a parallel operation on a pool of `threads` threads.
///
/// Falls back to the calling thread's pool if the dedicated pool cannot be
/// built.
#[cfg(feature = "parallel")]
pub fn install<OP, R>(threads: usize, op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool(threads) {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

#[cfg(not(feature = "parallel"))]
pub fn install<OP, R>(_threads: usize, op: OP) -> R
where
    OP: FnOnce() -> R,
{
    // No parallel feature - just execute directly
    op()
}

#[cfg(all(test, feature = "parallel"))]
mod tests {
    use super::*;

    #[test]
    fn test_pool_sized_and_shared() {
        let a = get_thread_pool(2).unwrap();
        let b = get_thread_pool(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.current_num_threads(), 2);
        assert_eq!(install(2, rayon::current_num_threads), 2);
    }

    #[test]
    fn test_zero_threads_clamped() {
        assert_eq!(get_thread_pool(0).unwrap().current_num_threads(), 1);
    }
}
