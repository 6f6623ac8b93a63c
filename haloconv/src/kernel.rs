//! Square convolution kernels with integer weights.

use common::Buffer2;

use crate::error::{Error, Result};
use crate::{Rgb, CHANNELS};

/// A validated K x K weight matrix.
///
/// K is odd and at least 3, and the weights never sum to zero: the sum is the
/// normalization divisor of every output pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    size: usize,
    weights: Vec<i32>,
    sum: i64,
}

impl Kernel {
    /// Builds a kernel from `size * size` row-major weights.
    pub fn new(size: usize, weights: Vec<i32>) -> Result<Self> {
        if size < 3 || size % 2 == 0 {
            return Err(Error::invalid(format!(
                "kernel size must be odd and at least 3, got {}",
                size
            )));
        }
        if weights.len() != size * size {
            return Err(Error::invalid(format!(
                "kernel of size {} needs {} weights, got {}",
                size,
                size * size,
                weights.len()
            )));
        }

        let sum: i64 = weights.iter().map(|&w| w as i64).sum();
        if sum == 0 {
            return Err(Error::invalid("kernel weights sum to zero"));
        }

        Ok(Self { size, weights, sum })
    }

    /// Builds a kernel from a square matrix given row by row.
    pub fn from_rows<R: AsRef<[i32]>>(rows: &[R]) -> Result<Self> {
        let size = rows.len();
        let mut weights = Vec::with_capacity(size * size);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != size {
                return Err(Error::invalid(format!(
                    "kernel must be square: row {} has {} weights, expected {}",
                    y,
                    row.len(),
                    size
                )));
            }
            weights.extend_from_slice(row);
        }

        Self::new(size, weights)
    }

    /// All weight on the center cell.
    pub fn identity(size: usize) -> Result<Self> {
        let mut weights = vec![0; size * size];
        if let Some(center) = weights.get_mut(size * size / 2) {
            *center = 1;
        }
        Self::new(size, weights)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of neighbor rows (and columns) needed on each side of a pixel.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    #[inline]
    pub fn sum(&self) -> i64 {
        self.sum
    }

    #[inline]
    pub fn weights(&self) -> &[i32] {
        &self.weights
    }

    /// Filters the K x K neighborhood of `src` centered at `(cx, cy)`.
    ///
    /// Each channel is `Σ(pixel * weight) / sum`, truncated toward zero and
    /// clamped to `0..=255`. The neighborhood must lie inside `src`.
    #[inline]
    pub fn apply(&self, src: &Buffer2<Rgb>, cx: usize, cy: usize) -> Rgb {
        let radius = self.radius();
        debug_assert!(cx >= radius && cy >= radius);
        debug_assert!(cx + radius < src.width() && cy + radius < src.height());

        let mut acc = [0i64; CHANNELS];
        let left = cx - radius;
        let top = cy - radius;

        for (ky, weights) in self.weights.chunks_exact(self.size).enumerate() {
            let row = &src.row(top + ky)[left..left + self.size];
            for (pixel, &weight) in row.iter().zip(weights) {
                for (acc, &value) in acc.iter_mut().zip(pixel) {
                    *acc += value as i64 * weight as i64;
                }
            }
        }

        acc.map(|value| (value / self.sum).clamp(0, u8::MAX as i64) as u8)
    }
}
