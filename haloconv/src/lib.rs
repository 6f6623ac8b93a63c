//! Iterated convolution filtering with row-band domain decomposition.
//!
//! The image is split into contiguous horizontal bands, one per worker
//! thread. Each worker keeps a double-buffered, halo-padded copy of its band
//! and exchanges boundary rows with its neighbors through lock-guarded
//! [`halo::HaloSlot`]s between rounds. The finished bands are stacked back
//! together in partition order.

pub mod bench;
pub mod config;
pub mod engine;
pub mod error;
pub mod halo;
pub mod io;
pub mod kernel;
pub mod partition;
pub mod preset;
pub mod worker;

use common::Buffer2;

pub use config::{EngineConfig, HaloSync, KernelSpec, RunConfig};
pub use engine::{convolve, convolve_file, Engine};
pub use error::{Error, ErrorKind, Result};
pub use kernel::Kernel;
pub use preset::KernelPreset;

pub const CHANNELS: usize = 3;

/// One 8-bit RGB pixel.
pub type Rgb = [u8; CHANNELS];

/// H x W image of RGB pixels.
pub type Image = Buffer2<Rgb>;
