//! HDF5 (Gadget-style) I/O, feature-gated behind `hdf5-io` because it links
//! a system HDF5 installation rather than being optional to the design
//! (SPEC_FULL.md §6). Writes carry a companion `.xdmf` sidecar so ParaView
//! can open the snapshot directly.

use ndarray::{Array1, Array2};

use crate::particle::{BodyType, ParticleSystem};

const GROUPS: [(&str, i32); 2] = [("PartType1", 1), ("PartType4", 0)];

/// Attempts to open `path` as HDF5 and load its `/PartType1` (dark matter)
/// and `/PartType4` (star) groups, in that order, into one particle table.
/// Returns `Ok(None)` (not an error) when the file isn't HDF5, so the
/// caller can fall back to the ASCII loader (spec §6).
pub fn try_load(path: &str) -> crate::error::Result<Option<ParticleSystem>> {
    let Ok(file) = hdf5::File::open(path) else {
        return Ok(None);
    };

    let mut particles = ParticleSystem::default();
    for (group_name, internal_type) in GROUPS {
        if !file.link_exists(group_name) {
            continue;
        }
        let group = file.group(group_name).map_err(|e| crate::error::NextError::Input {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        load_part_type(&group, internal_type, &mut particles).map_err(|e| crate::error::NextError::Input {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    }

    Ok(Some(particles))
}

fn load_part_type(group: &hdf5::Group, internal_type: i32, particles: &mut ParticleSystem) -> hdf5::Result<()> {
    let coords: Array2<f32> = group.dataset("Coordinates")?.read_2d()?;
    let vels: Array2<f32> = group.dataset("Velocities")?.read_2d()?;
    let masses: Array1<f64> = group
        .dataset("Masses")?
        .read_1d::<f32>()
        .map(|a| a.mapv(f64::from))
        .or_else(|_| group.dataset("Masses")?.read_1d::<f64>())?;

    let n = coords.nrows();
    for i in 0..n {
        particles.push(
            lin_alg::f64::Vec3::new(coords[[i, 0]] as f64, coords[[i, 1]] as f64, coords[[i, 2]] as f64),
            lin_alg::f64::Vec3::new(vels[[i, 0]] as f64, vels[[i, 1]] as f64, vels[[i, 2]] as f64),
            masses[i],
            BodyType::from_tag(internal_type),
        );
    }

    Ok(())
}

/// Writes the whole table to a single `/PartType1` group plus an `.xdmf`
/// sidecar, matching the original's `SaveHDF5` (spec §6). Coordinates and
/// velocities are stored as float32 (visualization rarely needs double);
/// masses keep full precision.
pub fn write(p: &ParticleSystem, path: &str) -> crate::error::Result<()> {
    let n = p.len();
    let file = hdf5::File::create(path)?;
    let group = file.create_group("PartType1")?;

    let mut coords = Array2::<f32>::zeros((n, 3));
    let mut vels = Array2::<f32>::zeros((n, 3));
    let mut ids = Array1::<i32>::zeros(n);
    for i in 0..n {
        coords[[i, 0]] = p.x[i] as f32;
        coords[[i, 1]] = p.y[i] as f32;
        coords[[i, 2]] = p.z[i] as f32;
        vels[[i, 0]] = p.vx[i] as f32;
        vels[[i, 1]] = p.vy[i] as f32;
        vels[[i, 2]] = p.vz[i] as f32;
        ids[i] = i as i32 + 1;
    }

    group.new_dataset::<f32>().with_data(&coords).create("Coordinates")?;
    group.new_dataset::<f32>().with_data(&vels).create("Velocities")?;
    group.new_dataset::<f64>().with_data(&Array1::from_vec(p.m.clone())).create("Masses")?;
    group.new_dataset::<i32>().with_data(&ids).create("ParticleIDs")?;

    write_xdmf_sidecar(path, n)?;
    Ok(())
}

fn write_xdmf_sidecar(h5_path: &str, n: usize) -> std::io::Result<()> {
    use std::io::Write;

    let xdmf_path = format!("{}.xdmf", h5_path.trim_end_matches(".hdf5"));
    let mut out = std::fs::File::create(xdmf_path)?;

    writeln!(out, "<?xml version=\"1.0\" ?>")?;
    writeln!(out, "<Xdmf Version=\"3.0\">")?;
    writeln!(out, "  <Domain>")?;
    writeln!(out, "    <Grid Name=\"Particles\" GridType=\"Uniform\">")?;
    writeln!(out, "      <Topology TopologyType=\"Polyvertex\" NumberOfElements=\"{n}\"/>")?;
    writeln!(out, "      <Geometry GeometryType=\"XYZ\">")?;
    writeln!(out, "        <DataItem Dimensions=\"{n} 3\" NumberType=\"Float\" Precision=\"4\" Format=\"HDF\">")?;
    writeln!(out, "          {h5_path}:/PartType1/Coordinates")?;
    writeln!(out, "        </DataItem>")?;
    writeln!(out, "      </Geometry>")?;
    writeln!(out, "      <Attribute Name=\"Mass\" AttributeType=\"Scalar\" Center=\"Node\">")?;
    writeln!(out, "        <DataItem Dimensions=\"{n}\" NumberType=\"Float\" Precision=\"8\" Format=\"HDF\">")?;
    writeln!(out, "          {h5_path}:/PartType1/Masses")?;
    writeln!(out, "        </DataItem>")?;
    writeln!(out, "      </Attribute>")?;
    writeln!(out, "    </Grid>")?;
    writeln!(out, "  </Domain>")?;
    writeln!(out, "</Xdmf>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lin_alg::f64::Vec3;

    #[test]
    fn round_trips_known_particles() {
        let mut ps = ParticleSystem::with_capacity(10);
        for i in 0..10 {
            ps.push(
                Vec3::new(i as f64, -(i as f64), 0.5 * i as f64),
                Vec3::new(0.1 * i as f64, 0.0, 0.0),
                1.0 + i as f64,
                BodyType::from_tag(i % 2),
            );
        }

        let mut path = std::env::temp_dir();
        path.push(format!("next_hdf5_roundtrip_{}.hdf5", std::process::id()));
        let path_str = path.to_str().unwrap();

        write(&ps, path_str).unwrap();
        let loaded = try_load(path_str).unwrap().unwrap();

        write(&loaded, path_str).unwrap();
        let loaded_again = try_load(path_str).unwrap().unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::remove_file(format!("{path_str}.xdmf")).ok();

        assert_eq!(loaded.x, loaded_again.x);
        assert_eq!(loaded.vx, loaded_again.vx);
        assert_eq!(loaded.m, loaded_again.m);
    }
}
