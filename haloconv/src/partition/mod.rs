//! Row-band partitioning of an image.

mod buffer;


use std::ops::Range;

pub use buffer::{padded_rows, Edge, PartitionBuffer};

use crate::error::{Error, Result};

/// Contiguous row range `[start, start + height)` owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Partition {
    pub index: usize,
    pub start: usize,
    pub height: usize,
}

impl Partition {
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.height
    }

    #[inline]
    pub fn rows(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Splits `height` rows into `workers` bands of `ceil(height / workers)` rows.
///
/// The last band takes the remainder and may be shorter. Every band must
/// receive at least one row.
pub fn decompose(height: usize, workers: usize) -> Result<Vec<Partition>> {
    if workers == 0 {
        return Err(Error::invalid("worker count must be at least 1"));
    }
    if workers > height {
        return Err(Error::invalid(format!(
            "{} workers exceed image height of {} rows",
            workers, height
        )));
    }

    let chunk = height.div_ceil(workers);
    if (workers - 1) * chunk >= height {
        return Err(Error::invalid(format!(
            "{} rows split into bands of {} leave worker {} without rows",
            height,
            chunk,
            workers - 1
        )));
    }

    let partitions = (0..workers)
        .map(|index| {
            let start = index * chunk;
            let end = (start + chunk).min(height);
            Partition {
                index,
                start,
                height: end - start,
            }
        })
        .collect();

    Ok(partitions)
}

/// Checks that every band bordering another band can supply `radius` rows of halo.
pub fn validate_radius(partitions: &[Partition], radius: usize) -> Result<()> {
    if partitions.len() < 2 {
        return Ok(());
    }

    match partitions.iter().find(|p| p.height < radius) {
        Some(p) => Err(Error::invalid(format!(
            "worker {} owns {} rows, fewer than the kernel radius {}",
            p.index, p.height, radius
        ))),
        None => Ok(()),
    }
}
