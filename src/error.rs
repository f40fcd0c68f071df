//! Error taxonomy for the simulator's external entry points.
//!
//! The gravity core itself never returns a `Result`: a step either completes
//! or the process aborts (see the run loop in [`crate::run`]). This type
//! covers the boundaries around the core — argument parsing, particle
//! loading, and (implicitly, via logging rather than propagation) snapshot
//! writes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NextError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("failed to load particles from {path}: {reason}")]
    Input { path: String, reason: String },

    #[error("numeric degeneracy: {0}")]
    Numeric(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "hdf5-io")]
    #[error("hdf5: {0}")]
    Hdf5(#[from] hdf5::Error),
}

pub type Result<T> = std::result::Result<T, NextError>;
