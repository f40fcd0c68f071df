//! An N-body gravitational simulator built around a Barnes-Hut octree.
//! Grouping distant mass into monopole/quadrupole moments brings the
//! per-step force evaluation from O(N^2) down to O(N log N); a
//! kick-drift-kick leapfrog integrator advances positions and velocities
//! symplectically, with a global timestep that adapts to the fastest
//! particle currently in the system.
//!
//! See [readme](https://github.com/David-OConnor/barnes_hut/blob/main/README.md)
//! for background on the tree-code approach this crate generalizes from a
//! library into a full simulator.

pub mod accel;
pub mod config;
pub mod error;
pub mod io;
pub mod octree;
pub mod particle;
pub mod rank;
pub mod run;
pub mod softening;
pub mod step;
pub mod timestep;

pub use config::{BhConfig, RunConfig, SnapshotFormat};
pub use error::{NextError, Result};
pub use particle::{BodyType, ParticleSystem};
pub use rank::RankContext;
