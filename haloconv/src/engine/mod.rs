//! Decomposition orchestrator: partitions the image, wires halo links,
//! runs one worker thread per band and stacks the results.


use std::path::Path;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use common::Buffer2;
use tracing::{debug, error, info};

use crate::config::{EngineConfig, HaloSync};
use crate::error::{Error, Result};
use crate::halo::{HaloLink, RoundBarrier};
use crate::io::{load_image, save_image};
use crate::kernel::Kernel;
use crate::partition::{decompose, validate_radius};
use crate::worker::{StencilWorker, SyncMode};
use crate::Image;

#[derive(Debug, Clone)]
pub struct Engine {
    kernel: Kernel,
    config: EngineConfig,
}

impl Engine {
    pub fn new(kernel: Kernel, config: EngineConfig) -> Self {
        Self { kernel, config }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Filters `image` `iterations` times across `workers` bands.
    ///
    /// Any worker failure fails the whole run; no partial image is returned.
    pub fn run(&self, image: &Image) -> Result<Image> {
        let EngineConfig {
            workers,
            iterations,
            sync,
        } = self.config;
        let radius = self.kernel.radius();

        if image.width() == 0 {
            return Err(Error::invalid("image has no columns"));
        }
        let partitions = decompose(image.height(), workers)?;
        validate_radius(&partitions, radius)?;

        info!(
            width = image.width(),
            height = image.height(),
            workers,
            iterations,
            kernel_size = self.kernel.size(),
            %sync,
            "Convolution started"
        );
        let started = Instant::now();

        let links: Vec<HaloLink> = partitions
            .windows(2)
            .map(|pair| HaloLink::new(image, pair[1].start, radius))
            .collect();
        let barrier = match sync {
            HaloSync::Lockstep => Some(RoundBarrier::new(workers)),
            HaloSync::Relaxed => None,
        };

        // Every worker copies its starting halo rows before any thread can publish.
        let stencil_workers: Vec<StencilWorker> = partitions
            .iter()
            .map(|partition| {
                let index = partition.index;
                let mode = match &barrier {
                    Some(barrier) => SyncMode::Lockstep(barrier),
                    None => SyncMode::Relaxed,
                };
                StencilWorker::new(
                    image,
                    *partition,
                    &self.kernel,
                    iterations,
                    index.checked_sub(1).map(|i| &links[i]),
                    links.get(index),
                    mode,
                )
            })
            .collect();

        let bands = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(stencil_workers.len());

            for (index, worker) in stencil_workers.into_iter().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("worker {}", index))
                    .spawn_scoped(scope, move || worker.run());

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        if let Some(barrier) = &barrier {
                            barrier.abort();
                        }
                        return Err(abandon_workers(handles, index, source));
                    }
                }
            }

            join_workers(handles)
        })?;

        let result = Buffer2::concat_rows(bands);
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Convolution finished"
        );

        Ok(result)
    }
}

/// Joins every worker in partition order.
///
/// A panicked worker is reported in preference to peers that merely failed
/// because of it.
pub(crate) fn join_workers<T>(handles: Vec<ScopedJoinHandle<'_, Result<T>>>) -> Result<Vec<T>> {
    let mut bands = Vec::with_capacity(handles.len());
    let mut panicked = None;
    let mut failed = None;

    for (index, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(Ok(band)) => bands.push(band),
            Ok(Err(err)) => {
                error!(worker = index, error = %err, "Worker failed");
                failed.get_or_insert(err);
            }
            Err(_) => {
                error!(worker = index, "Worker panicked");
                panicked.get_or_insert(index);
            }
        }
    }

    if let Some(worker) = panicked {
        return Err(Error::WorkerFailure { worker });
    }
    if let Some(err) = failed {
        return Err(err);
    }

    Ok(bands)
}

/// Joins the workers spawned before worker `index` failed to spawn, so none
/// is left running or unjoined when the scope ends.
pub(crate) fn abandon_workers<T>(
    handles: Vec<ScopedJoinHandle<'_, Result<T>>>,
    index: usize,
    source: std::io::Error,
) -> Error {
    error!(worker = index, error = %source, "Worker spawn failed");
    if let Err(err) = join_workers(handles) {
        debug!(error = %err, "Spawned workers stopped after spawn failure");
    }
    Error::Spawn {
        worker: index,
        source,
    }
}

/// Filters `image` with relaxed halo synchronization.
pub fn convolve(
    image: &Image,
    kernel: &Kernel,
    workers: usize,
    iterations: usize,
) -> Result<Image> {
    Engine::new(kernel.clone(), EngineConfig::new(workers, iterations)).run(image)
}

/// Loads `input`, filters it and writes the result to `output`.
///
/// Nothing is written when loading or filtering fails.
pub fn convolve_file<P, Q>(input: P, kernel: &Kernel, config: EngineConfig, output: Q) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let image = load_image(input)?;
    let result = Engine::new(kernel.clone(), config).run(&image)?;
    save_image(&result, output)
}
