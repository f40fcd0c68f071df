//! Run-wide configuration, threaded explicitly into the core entry points
//! rather than read from a global singleton (spec §9).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Vtk,
    Vtu,
    Hdf5,
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vtk => "vtk",
            Self::Vtu => "vtu",
            Self::Hdf5 => "hdf5",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SnapshotFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vtk" => Ok(Self::Vtk),
            "vtu" => Ok(Self::Vtu),
            "hdf5" => Ok(Self::Hdf5),
            other => Err(format!("choose a file format: vtk, vtu, or hdf5 (got `{other}`)")),
        }
    }
}

/// Barnes-Hut tree parameters. Named after, and playing the same role as,
/// the teacher library's own `BhConfig`.
#[derive(Debug, Clone, Copy)]
pub struct BhConfig {
    /// Opening angle. 0 means no grouping (best accuracy, an effectively
    /// naive N-body); higher values trade accuracy for performance.
    pub theta: f64,
    /// Recursion depth at which coincident-particle insertion is forced to
    /// terminate, accepting a multi-occupant leaf (spec §4.2 edge case).
    pub max_tree_depth: usize,
}

impl Default for BhConfig {
    fn default() -> Self {
        Self {
            theta: 0.5,
            max_tree_depth: 48,
        }
    }
}

/// The full configuration for one run, derived from CLI arguments.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_path: String,
    pub threads: usize,
    pub dt0: f64,
    pub dump_interval: f64,
    pub format: SnapshotFormat,
    pub bh: BhConfig,
}
