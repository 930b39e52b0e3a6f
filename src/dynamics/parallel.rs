//! Data-parallel helpers shared by every pipeline stage.
//!
//! With the `parallel` feature the helpers fan out over rayon; without it, or
//! with [`ExecutionMode::Serial`], they run as plain loops.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
use crate::config::PARALLEL_GRAIN;

/// Controls whether a stage may use additional threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Serial,
    Parallel,
}

impl ExecutionMode {
    pub fn from_flag(parallel: bool) -> Self {
        if parallel && cfg!(feature = "parallel") {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Serial
        }
    }
}

/// Runs `f` on every element of `items` together with its index.
pub fn for_each_mut<T, F>(items: &mut [T], mode: ExecutionMode, f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    match mode {
        #[cfg(feature = "parallel")]
        ExecutionMode::Parallel => items
            .par_iter_mut()
            .with_min_len(PARALLEL_GRAIN)
            .enumerate()
            .for_each(|(index, item)| f(index, item)),
        _ => items
            .iter_mut()
            .enumerate()
            .for_each(|(index, item)| f(index, item)),
    }
}

/// Maps every element of `items`, preserving order.
pub fn map_collect<I, T, F>(items: &[I], mode: ExecutionMode, f: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync + Send,
{
    match mode {
        #[cfg(feature = "parallel")]
        ExecutionMode::Parallel => items.par_iter().with_min_len(PARALLEL_GRAIN).map(f).collect(),
        _ => items.iter().map(f).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_modes_agree() {
        let items: Vec<u32> = (0..100).collect();
        let serial = map_collect(&items, ExecutionMode::Serial, |v| v * 2);
        let parallel = map_collect(&items, ExecutionMode::from_flag(true), |v| v * 2);
        assert_eq!(serial, parallel);

        let mut values = vec![0usize; 50];
        for_each_mut(&mut values, ExecutionMode::from_flag(true), |i, v| *v = i);
        assert!(values.iter().enumerate().all(|(i, v)| i == *v));
    }
}
