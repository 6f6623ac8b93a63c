use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use crate::kernel::Kernel;
use crate::preset::KernelPreset;

/// Halo synchronization policy between rounds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum HaloSync {
    /// Slot locks only, no cross-worker round barrier. Boundary rows may be
    /// read one or more rounds stale.
    #[default]
    Relaxed,
    /// Workers meet at a barrier around every exchange; output is identical
    /// for every worker count.
    Lockstep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub workers: usize,
    pub iterations: usize,
    pub sync: HaloSync,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            iterations: 1,
            sync: HaloSync::Relaxed,
        }
    }
}

impl EngineConfig {
    pub fn new(workers: usize, iterations: usize) -> Self {
        Self {
            workers,
            iterations,
            ..Default::default()
        }
    }

    pub fn with_sync(mut self, sync: HaloSync) -> Self {
        self.sync = sync;
        self
    }
}

/// A kernel given either by preset name or as an explicit square matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KernelSpec {
    Preset(KernelPreset),
    Matrix(Vec<Vec<i32>>),
}

impl KernelSpec {
    pub fn build(&self) -> Result<Kernel> {
        match self {
            KernelSpec::Preset(preset) => Ok(preset.kernel()),
            KernelSpec::Matrix(rows) => Kernel::from_rows(rows),
        }
    }
}

impl From<KernelPreset> for KernelSpec {
    fn from(preset: KernelPreset) -> Self {
        KernelSpec::Preset(preset)
    }
}

/// A complete filtering job, as read from a YAML file.
///
/// ```yaml
/// input: photo.png
/// kernel: blur3
/// output: blurred.png
/// engine:
///   workers: 4
///   iterations: 10
///   sync: lockstep
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input: PathBuf,
    pub kernel: KernelSpec,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl RunConfig {
    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self> {
        serde_yml::from_str(yaml).map_err(|source| Error::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml, path)
    }
}
