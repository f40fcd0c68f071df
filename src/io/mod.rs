//! External I/O: initial-condition loading and snapshot writing. These are
//! interfaces only (spec §1) — the gravity core never calls into them
//! during a step; they feed it a particle table and consume snapshot-ready
//! reads of it.

mod ascii;
#[cfg(feature = "hdf5-io")]
mod hdf5;
mod vtk;
mod vtu;

use crate::config::SnapshotFormat;
use crate::error::{NextError, Result};
use crate::particle::ParticleSystem;

/// Loads the particle database from a file, attempting HDF5 (Gadget-style)
/// first, falling back to the whitespace-separated ASCII format (spec
/// §6). Without the `hdf5-io` feature, only the ASCII format is readable.
pub fn load_particles(path: &str) -> Result<ParticleSystem> {
    #[cfg(feature = "hdf5-io")]
    {
        if let Some(ps) = hdf5::try_load(path)? {
            return Ok(ps);
        }
    }

    ascii::load(path).map_err(|e| NextError::Input {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Writes snapshot `k` in the configured format, returning the path
/// written on success. Failures here are logged by the caller and do not
/// abort the run (spec §4.7).
pub fn write_snapshot(particles: &ParticleSystem, k: u64, format: SnapshotFormat) -> Result<String> {
    match format {
        SnapshotFormat::Vtk => {
            let path = format!("dump_{k}.vtk");
            vtk::write(particles, &path)?;
            Ok(path)
        }
        SnapshotFormat::Vtu => {
            let path = format!("dump_{k}.vtu");
            vtu::write(particles, &path)?;
            Ok(path)
        }
        SnapshotFormat::Hdf5 => {
            #[cfg(feature = "hdf5-io")]
            {
                let path = format!("dump_{k}.hdf5");
                hdf5::write(particles, &path)?;
                Ok(path)
            }
            #[cfg(not(feature = "hdf5-io"))]
            {
                Err(NextError::Io(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "built without the `hdf5-io` feature",
                )))
            }
        }
    }
}
