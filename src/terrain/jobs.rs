//! Parallel phase execution.
//!
//! Each pipeline phase is a batch of independent units run on a dedicated
//! rayon pool. `run` only returns once every unit has finished, which is the
//! barrier between phases.

use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::info;

use crate::error::Result;

use super::BuildPhase;

pub struct PhaseRunner {
    pool: ThreadPool,
}

impl PhaseRunner {
    /// Pool with `threads` workers, or one per core when `None`.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|i| format!("terrain-worker-{}", i))
            .build()?;
        info!(threads = pool.current_num_threads(), "worker pool ready");
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` over every unit in parallel and collect the results in unit order.
    pub fn run<T, R, F>(&self, phase: BuildPhase, units: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        let start = Instant::now();
        let count = units.len();

        let results: Vec<R> = self.pool.install(|| units.into_par_iter().map(f).collect());

        info!(
            phase = %phase,
            units = count,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "phase complete"
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_every_unit_in_order() {
        let runner = PhaseRunner::new(Some(3)).unwrap();
        assert_eq!(runner.threads(), 3);
        let out = runner.run(BuildPhase::PlanesGenerated, (0..100).collect(), |i: u32| i * 2);
        assert_eq!(out, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_all_units_finish_before_return() {
        let runner = PhaseRunner::new(Some(4)).unwrap();
        let done = AtomicUsize::new(0);
        runner.run(BuildPhase::VolumesCarved, vec![(); 64], |_| {
            done.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(done.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn test_mutable_borrows_as_units() {
        let runner = PhaseRunner::new(Some(2)).unwrap();
        let mut values = vec![1, 2, 3];
        runner.run(BuildPhase::MeshesFinalized, values.iter_mut().collect(), |v: &mut i32| *v *= 10);
        assert_eq!(values, vec![10, 20, 30]);
    }
}
