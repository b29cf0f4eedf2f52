//! Parallel-for over array slots.
//!
//! Every phase is one independent unit of work per slot.  Large dispatches
//! go to the rayon pool; each call returns only after every unit finished,
//! which is the barrier between phases.  wasm32 always runs sequentially.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
const PARALLEL_THRESHOLD: usize = 1 << 10;

fn use_parallel(len: usize) -> bool {
    #[cfg(not(target_arch = "wasm32"))]
    {
        len >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1
    }
    #[cfg(target_arch = "wasm32")]
    {
        let _ = len;
        false
    }
}

/// Returns `[f(0), f(1), ..., f(len - 1)]`.
pub(crate) fn map_indexed<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(not(target_arch = "wasm32"))]
    if use_parallel(len) {
        return (0..len).into_par_iter().map(f).collect();
    }
    (0..len).map(f).collect()
}

/// Returns `f` applied to every element of `items`, in order.
pub(crate) fn map_slice<T, U, F>(items: &[T], f: F) -> Vec<U>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> U + Sync + Send,
{
    #[cfg(not(target_arch = "wasm32"))]
    if use_parallel(items.len()) {
        return items.par_iter().map(f).collect();
    }
    items.iter().map(f).collect()
}

/// Calls `f(i, &mut items[i])` for every slot.
pub(crate) fn for_each_mut<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    #[cfg(not(target_arch = "wasm32"))]
    if use_parallel(items.len()) {
        items
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, item)| f(i, item));
        return;
    }
    items
        .iter_mut()
        .enumerate()
        .for_each(|(i, item)| f(i, item));
}
