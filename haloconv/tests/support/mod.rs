//! Shared helpers for integration tests.

#![allow(dead_code)]

use common::Buffer2;
use haloconv::{Image, Kernel, Rgb};
use rand::prelude::*;

pub fn noise(width: usize, height: usize, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let pixels = (0..width * height).map(|_| rng.random::<Rgb>()).collect();
    Buffer2::new(width, height, pixels)
}

pub fn solid(width: usize, height: usize, value: Rgb) -> Image {
    Buffer2::new_filled(width, height, value)
}

/// Pixel `(x, y)` encodes its own coordinates.
pub fn coordinates(width: usize, height: usize) -> Image {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| [y as u8, x as u8, (y >> 8) as u8]))
        .collect();
    Buffer2::new(width, height, pixels)
}

/// Whole-image filter with edge replication by coordinate clamping.
pub fn reference_filter(image: &Image, kernel: &Kernel, iterations: usize) -> Image {
    let width = image.width() as isize;
    let height = image.height() as isize;
    let radius = kernel.radius() as isize;
    let size = kernel.size();

    let mut current = image.clone();
    for _ in 0..iterations {
        let mut next = current.clone();
        for y in 0..height {
            for x in 0..width {
                let mut acc = [0i64; 3];
                for ky in 0..size {
                    for kx in 0..size {
                        let sy = (y + ky as isize - radius).clamp(0, height - 1) as usize;
                        let sx = (x + kx as isize - radius).clamp(0, width - 1) as usize;
                        let weight = kernel.weights()[ky * size + kx] as i64;
                        let pixel = current[(sx, sy)];
                        for (acc, &value) in acc.iter_mut().zip(&pixel) {
                            *acc += value as i64 * weight;
                        }
                    }
                }
                next[(x as usize, y as usize)] = acc.map(|v| (v / kernel.sum()).clamp(0, 255) as u8);
            }
        }
        current = next;
    }
    current
}

/// Mean over interior pixels of the red-channel variance in each 3x3 window.
pub fn local_variance(image: &Image) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for y in 1..image.height() - 1 {
        for x in 1..image.width() - 1 {
            let values: Vec<f64> = (0..9)
                .map(|i| image[(x + i % 3 - 1, y + i / 3 - 1)][0] as f64)
                .collect();
            let mean = values.iter().sum::<f64>() / 9.0;
            total += values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 9.0;
            count += 1;
        }
    }
    total / count as f64
}

/// Rows whose pixels differ between `a` and `b`.
pub fn differing_rows(a: &Image, b: &Image) -> Vec<usize> {
    (0..a.height()).filter(|&y| a.row(y) != b.row(y)).collect()
}
