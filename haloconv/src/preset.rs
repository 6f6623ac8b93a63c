use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::kernel::Kernel;

/// Named 3x3 kernels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum KernelPreset {
    Identity,
    Blur1,
    Blur2,
    Blur3,
    Sharpen1,
    Sharpen2,
    Sharpen3,
}

impl KernelPreset {
    pub fn weights(self) -> [[i32; 3]; 3] {
        match self {
            KernelPreset::Identity => [[0, 0, 0], [0, 1, 0], [0, 0, 0]],
            KernelPreset::Blur1 => [[1, 1, 1], [1, 1, 1], [1, 1, 1]],
            KernelPreset::Blur2 => [[1, 1, 1], [1, 2, 1], [1, 1, 1]],
            KernelPreset::Blur3 => [[1, 2, 1], [2, 4, 2], [1, 2, 1]],
            KernelPreset::Sharpen1 => [[0, -1, 0], [-1, 5, -1], [0, -1, 0]],
            KernelPreset::Sharpen2 => [[-1, -1, -1], [-1, 9, -1], [-1, -1, -1]],
            KernelPreset::Sharpen3 => [[1, -2, 1], [-2, 5, -2], [1, -2, 1]],
        }
    }

    pub fn kernel(self) -> Kernel {
        Kernel::from_rows(&self.weights()).expect("preset matrices are 3x3 with nonzero sum")
    }
}
