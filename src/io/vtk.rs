//! VTK legacy ASCII snapshot writer (spec §6).

use std::io::Write;

use crate::particle::ParticleSystem;

pub fn write(p: &ParticleSystem, path: &str) -> std::io::Result<()> {
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    let n = p.len();

    writeln!(out, "# vtk DataFile Version 3.0")?;
    writeln!(out, "NEXT snapshot")?;
    writeln!(out, "ASCII")?;
    writeln!(out, "DATASET POLYDATA")?;

    writeln!(out, "POINTS {n} double")?;
    for i in 0..n {
        writeln!(out, "{} {} {}", p.x[i], p.y[i], p.z[i])?;
    }

    writeln!(out, "VERTICES {n} {}", n * 2)?;
    for i in 0..n {
        writeln!(out, "1 {i}")?;
    }

    writeln!(out, "POINT_DATA {n}")?;

    writeln!(out, "SCALARS type int 1")?;
    writeln!(out, "LOOKUP_TABLE default")?;
    for i in 0..n {
        writeln!(out, "{}", p.type_[i])?;
    }

    writeln!(out, "VECTORS velocity double")?;
    for i in 0..n {
        writeln!(out, "{} {} {}", p.vx[i], p.vy[i], p.vz[i])?;
    }

    writeln!(out, "SCALARS mass double 1")?;
    writeln!(out, "LOOKUP_TABLE default")?;
    for i in 0..n {
        writeln!(out, "{}", p.m[i])?;
    }

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::BodyType;
    use lin_alg::f64::Vec3;

    #[test]
    fn single_particle_at_rest_writes_one_points_line() {
        let mut ps = ParticleSystem::with_capacity(1);
        ps.push(Vec3::new_zero(), Vec3::new_zero(), 1.0, BodyType::Star);

        let mut path = std::env::temp_dir();
        path.push(format!("next_vtk_test_{}.vtk", std::process::id()));
        write(&ps, path.to_str().unwrap()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(contents.contains("POINTS 1 double"));
        assert!(contents.contains("0 0 0"));
    }
}
