//! Per-band stencil worker.

use strum_macros::Display;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::halo::{HaloLink, RoundBarrier};
use crate::kernel::Kernel;
use crate::partition::{Edge, Partition, PartitionBuffer};
use crate::Image;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WorkerState {
    Init,
    Computing,
    Synchronizing,
    Done,
}

/// How a worker exchanges halo rows at the end of a round.
#[derive(Debug, Clone, Copy)]
pub enum SyncMode<'a> {
    /// Lock-guarded slot access only. A neighbor's rows may be one or more
    /// rounds stale or ahead; only rows near band boundaries are affected.
    Relaxed,
    /// Publish, meet at the barrier, read, meet again. Every worker reads
    /// its neighbors' rows from the same round, so the result matches a
    /// single worker exactly.
    Lockstep(&'a RoundBarrier),
}

/// Runs the compute/synchronize/swap loop for one band.
#[derive(Debug)]
pub struct StencilWorker<'a> {
    partition: Partition,
    buffer: PartitionBuffer,
    kernel: &'a Kernel,
    iterations: usize,
    top: Option<&'a HaloLink>,
    bottom: Option<&'a HaloLink>,
    sync: SyncMode<'a>,
    state: WorkerState,
}

impl<'a> StencilWorker<'a> {
    /// `top` and `bottom` are the links shared with the bands directly above
    /// and below; `None` on the image's true edges.
    ///
    /// The starting halo rows are copied out of the links here, so every
    /// worker sharing a link must be constructed before any of them runs.
    pub fn new(
        image: &Image,
        partition: Partition,
        kernel: &'a Kernel,
        iterations: usize,
        top: Option<&'a HaloLink>,
        bottom: Option<&'a HaloLink>,
        sync: SyncMode<'a>,
    ) -> Self {
        let buffer = PartitionBuffer::init(
            image.rows(partition.rows()),
            image.width(),
            kernel.radius(),
            top.is_none(),
            bottom.is_none(),
        );

        let mut worker = Self {
            partition,
            buffer,
            kernel,
            iterations,
            top,
            bottom,
            sync,
            state: WorkerState::Init,
        };
        worker.prime_halos();
        worker
    }

    #[inline]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs every round and returns the band's final interior rows.
    pub fn run(mut self) -> Result<Image> {
        let _abort_guard = AbortOnPanic(match self.sync {
            SyncMode::Lockstep(barrier) => Some(barrier),
            SyncMode::Relaxed => None,
        });

        debug!(
            worker = self.partition.index,
            start = self.partition.start,
            rows = self.partition.height,
            iterations = self.iterations,
            "Worker started"
        );

        for round in 0..self.iterations {
            self.transition(WorkerState::Computing, round);
            self.buffer.compute_interior_rows(self.kernel);

            self.transition(WorkerState::Synchronizing, round);
            match self.sync {
                SyncMode::Relaxed => self.sync_relaxed(),
                SyncMode::Lockstep(barrier) => self.sync_lockstep(barrier)?,
            }

            self.buffer.swap();
        }

        self.transition(WorkerState::Done, self.iterations);
        let result = self.buffer.extract_interior();
        debug!(worker = self.partition.index, "Worker finished");

        Ok(result)
    }

    /// Fills the internal-boundary halo rows of the current buffer from the
    /// slots, which still hold the true image rows.
    fn prime_halos(&mut self) {
        if let Some(link) = self.top {
            link.downward
                .read_into(self.buffer.current_halo_rows_mut(Edge::Top));
        }
        if let Some(link) = self.bottom {
            link.upward
                .read_into(self.buffer.current_halo_rows_mut(Edge::Bottom));
        }
    }

    fn sync_relaxed(&mut self) {
        if let Some(link) = self.top {
            link.downward.read_into(self.buffer.halo_rows_mut(Edge::Top));
            link.upward.publish(self.buffer.boundary_rows(Edge::Top));
        }
        if let Some(link) = self.bottom {
            link.upward.read_into(self.buffer.halo_rows_mut(Edge::Bottom));
            link.downward.publish(self.buffer.boundary_rows(Edge::Bottom));
        }
    }

    fn sync_lockstep(&mut self, barrier: &RoundBarrier) -> Result<()> {
        if let Some(link) = self.top {
            link.upward.publish(self.buffer.boundary_rows(Edge::Top));
        }
        if let Some(link) = self.bottom {
            link.downward.publish(self.buffer.boundary_rows(Edge::Bottom));
        }

        self.wait(barrier)?;

        if let Some(link) = self.top {
            link.downward.read_into(self.buffer.halo_rows_mut(Edge::Top));
        }
        if let Some(link) = self.bottom {
            link.upward.read_into(self.buffer.halo_rows_mut(Edge::Bottom));
        }

        // Nobody may publish the next round until every neighbor has read this one.
        self.wait(barrier)
    }

    fn wait(&self, barrier: &RoundBarrier) -> Result<()> {
        barrier.wait().map_err(|_| {
            debug!(worker = self.partition.index, "Round barrier aborted");
            Error::WorkerFailure {
                worker: self.partition.index,
            }
        })
    }

    fn transition(&mut self, state: WorkerState, round: usize) {
        trace!(
            worker = self.partition.index,
            round,
            from = %self.state,
            to = %state,
            "Worker state"
        );
        self.state = state;
    }
}

/// Aborts the round barrier if the owning worker unwinds, so its peers fail
/// instead of waiting forever.
struct AbortOnPanic<'a>(Option<&'a RoundBarrier>);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            if let Some(barrier) = self.0 {
                barrier.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::decompose;
    use crate::preset::KernelPreset;
    use common::Buffer2;

    fn row_image(width: usize, height: usize) -> Image {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| [(y * 7 + x * 3) as u8, y as u8, x as u8]))
            .collect();
        Buffer2::new(width, height, pixels)
    }

    #[test]
    fn lone_worker_with_zero_iterations_returns_band() {
        let image = row_image(4, 3);
        let kernel = KernelPreset::Blur1.kernel();
        let part = decompose(3, 1).unwrap()[0];
        let worker = StencilWorker::new(&image, part, &kernel, 0, None, None, SyncMode::Relaxed);
        assert_eq!(worker.state(), WorkerState::Init);
        assert_eq!(worker.run().unwrap(), image);
    }

    #[test]
    fn worker_returns_only_its_rows() {
        let image = row_image(3, 6);
        let kernel = KernelPreset::Identity.kernel();
        let parts = decompose(6, 2).unwrap();
        let link = HaloLink::new(&image, parts[1].start, 1);

        let lower = StencilWorker::new(
            &image,
            parts[1],
            &kernel,
            2,
            Some(&link),
            None,
            SyncMode::Relaxed,
        );
        let band = lower.run().unwrap();
        assert_eq!(band.height(), 3);
        assert_eq!(band.pixels(), image.rows(3..6));
    }

    #[test]
    fn primed_halo_makes_first_round_exact() {
        let image = row_image(5, 6);
        let kernel = KernelPreset::Blur3.kernel();
        let parts = decompose(6, 2).unwrap();
        let link = HaloLink::new(&image, parts[1].start, 1);

        // The upper worker runs alone; its one round only reads the primed slot.
        let upper = StencilWorker::new(
            &image,
            parts[0],
            &kernel,
            1,
            None,
            Some(&link),
            SyncMode::Relaxed,
        );
        let band = upper.run().unwrap();

        let whole = decompose(6, 1).unwrap()[0];
        let reference = StencilWorker::new(&image, whole, &kernel, 1, None, None, SyncMode::Relaxed)
            .run()
            .unwrap();
        assert_eq!(band.pixels(), reference.rows(0..3));
    }

    fn single_worker(image: &Image, kernel: &Kernel, iterations: usize) -> Image {
        let whole = decompose(image.height(), 1).unwrap()[0];
        StencilWorker::new(image, whole, kernel, iterations, None, None, SyncMode::Relaxed)
            .run()
            .unwrap()
    }

    #[test]
    fn lockstep_matches_single_worker_when_neighbor_starts_late() {
        let image = row_image(5, 6);
        let kernel = KernelPreset::Blur3.kernel();
        let parts = decompose(6, 2).unwrap();
        let link = HaloLink::new(&image, parts[1].start, 1);
        let barrier = RoundBarrier::new(2);

        let upper = StencilWorker::new(
            &image,
            parts[0],
            &kernel,
            4,
            None,
            Some(&link),
            SyncMode::Lockstep(&barrier),
        );
        let lower = StencilWorker::new(
            &image,
            parts[1],
            &kernel,
            4,
            Some(&link),
            None,
            SyncMode::Lockstep(&barrier),
        );

        let bands = std::thread::scope(|s| {
            let upper = s.spawn(move || upper.run());
            // The upper worker publishes round 0 and blocks before the lower one starts.
            std::thread::sleep(std::time::Duration::from_millis(50));
            let lower = s.spawn(move || lower.run());
            [upper.join().unwrap().unwrap(), lower.join().unwrap().unwrap()]
        });

        let combined = Buffer2::concat_rows(bands);
        assert_eq!(combined, single_worker(&image, &kernel, 4));
    }

    #[test]
    fn relaxed_first_round_ignores_finished_neighbor() {
        let image = row_image(5, 6);
        let kernel = KernelPreset::Blur1.kernel();
        let parts = decompose(6, 2).unwrap();
        let link = HaloLink::new(&image, parts[1].start, 1);

        let upper = StencilWorker::new(&image, parts[0], &kernel, 1, None, Some(&link), SyncMode::Relaxed);
        let lower = StencilWorker::new(&image, parts[1], &kernel, 1, Some(&link), None, SyncMode::Relaxed);

        // The upper band overwrites the shared slot before the lower band runs.
        let upper_band = upper.run().unwrap();
        let lower_band = lower.run().unwrap();

        let combined = Buffer2::concat_rows([upper_band, lower_band]);
        assert_eq!(combined, single_worker(&image, &kernel, 1));
    }

    #[test]
    fn aborted_barrier_fails_worker() {
        let image = row_image(3, 4);
        let kernel = KernelPreset::Blur1.kernel();
        let parts = decompose(4, 2).unwrap();
        let link = HaloLink::new(&image, parts[1].start, 1);
        let barrier = RoundBarrier::new(2);
        barrier.abort();

        let worker = StencilWorker::new(
            &image,
            parts[0],
            &kernel,
            3,
            None,
            Some(&link),
            SyncMode::Lockstep(&barrier),
        );
        assert!(matches!(
            worker.run(),
            Err(Error::WorkerFailure { worker: 0 })
        ));
    }

    #[test]
    fn panic_guard_aborts_barrier() {
        let barrier = RoundBarrier::new(2);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = AbortOnPanic(Some(&barrier));
            panic!("worker blew up");
        }));
        assert!(result.is_err());
        assert!(barrier.wait().is_err());
    }
}
