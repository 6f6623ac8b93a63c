//! Worker/iteration sweep used by the `bench` command.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::info;

use crate::config::EngineConfig;
use crate::engine::convolve_file;
use crate::error::Result;
use crate::io::result_file_name;
use crate::kernel::Kernel;

pub const WORKERS_STEP: usize = 2;
pub const ITERATIONS_STEP: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchCase {
    pub workers: usize,
    pub iterations: usize,
}

impl BenchCase {
    /// Output file written by this case, `result_{workers}_{iterations}.ppm`.
    pub fn output_name(&self) -> String {
        result_file_name(Some(&format!(
            "result_{}_{}",
            self.workers, self.iterations
        )))
    }
}

/// Configurations visited by a sweep, in order.
///
/// `1 x 1` first, then for workers `2, 4, ..` up to `max_workers`: one
/// iteration, followed by `2, 4, ..` up to `max_iterations`.
pub fn sweep(max_workers: usize, max_iterations: usize) -> Vec<BenchCase> {
    let mut cases = vec![BenchCase {
        workers: 1,
        iterations: 1,
    }];

    for workers in (2..=max_workers).step_by(WORKERS_STEP) {
        cases.push(BenchCase {
            workers,
            iterations: 1,
        });
        for iterations in (2..=max_iterations).step_by(ITERATIONS_STEP) {
            cases.push(BenchCase {
                workers,
                iterations,
            });
        }
    }

    cases
}

/// Runs one case from file to file and returns the wall time, load and save included.
pub fn run_case(
    input: &Path,
    output_dir: &Path,
    kernel: &Kernel,
    case: BenchCase,
) -> Result<Duration> {
    let output = output_dir.join(case.output_name());
    let started = Instant::now();
    convolve_file(
        input,
        kernel,
        EngineConfig::new(case.workers, case.iterations),
        &output,
    )?;
    let elapsed = started.elapsed();

    info!(
        workers = case.workers,
        iterations = case.iterations,
        elapsed_ms = elapsed.as_millis() as u64,
        "Bench case finished"
    );

    Ok(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(cases: &[BenchCase]) -> Vec<(usize, usize)> {
        cases.iter().map(|c| (c.workers, c.iterations)).collect()
    }

    #[test]
    fn sweep_starts_with_single_worker() {
        assert_eq!(pairs(&sweep(1, 1)), vec![(1, 1)]);
        assert_eq!(pairs(&sweep(1, 10)), vec![(1, 1)]);
    }

    #[test]
    fn sweep_steps_workers_and_iterations() {
        assert_eq!(
            pairs(&sweep(4, 4)),
            vec![(1, 1), (2, 1), (2, 2), (2, 4), (4, 1), (4, 2), (4, 4)]
        );
    }

    #[test]
    fn sweep_odd_limits() {
        assert_eq!(
            pairs(&sweep(3, 3)),
            vec![(1, 1), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn output_names() {
        let case = BenchCase {
            workers: 4,
            iterations: 8,
        };
        assert_eq!(case.output_name(), "result_4_8.ppm");
    }
}
