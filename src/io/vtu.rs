//! VTU (XML UnstructuredGrid) snapshot writer (spec §6).

use std::io::Write;

use crate::particle::ParticleSystem;

pub fn write(p: &ParticleSystem, path: &str) -> std::io::Result<()> {
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    let n = p.len();

    writeln!(out, "<?xml version=\"1.0\"?>")?;
    writeln!(out, "<VTKFile type=\"UnstructuredGrid\" version=\"0.1\" byte_order=\"LittleEndian\">")?;
    writeln!(out, "  <UnstructuredGrid>")?;
    writeln!(out, "    <Piece NumberOfPoints=\"{n}\" NumberOfCells=\"{n}\">")?;

    writeln!(out, "      <Points>")?;
    write!(out, "        <DataArray type=\"Float32\" NumberOfComponents=\"3\" format=\"ascii\">\n          ")?;
    for i in 0..n {
        write!(out, "{} {} {} ", p.x[i] as f32, p.y[i] as f32, p.z[i] as f32)?;
    }
    writeln!(out, "\n        </DataArray>\n      </Points>")?;

    writeln!(out, "      <Cells>")?;
    write!(out, "        <DataArray type=\"Int32\" Name=\"connectivity\" format=\"ascii\">\n          ")?;
    for i in 0..n {
        write!(out, "{i} ")?;
    }
    writeln!(out, "\n        </DataArray>")?;

    write!(out, "        <DataArray type=\"Int32\" Name=\"offsets\" format=\"ascii\">\n          ")?;
    for i in 1..=n {
        write!(out, "{i} ")?;
    }
    writeln!(out, "\n        </DataArray>")?;

    write!(out, "        <DataArray type=\"UInt8\" Name=\"types\" format=\"ascii\">\n          ")?;
    for _ in 0..n {
        write!(out, "1 ")?; // VTK_VERTEX
    }
    writeln!(out, "\n        </DataArray>\n      </Cells>")?;

    writeln!(out, "      <PointData>")?;

    write!(out, "        <DataArray type=\"Int32\" Name=\"type\" format=\"ascii\">\n          ")?;
    for i in 0..n {
        write!(out, "{} ", p.type_[i])?;
    }
    writeln!(out, "\n        </DataArray>")?;

    write!(out, "        <DataArray type=\"Float32\" Name=\"velocity\" NumberOfComponents=\"3\" format=\"ascii\">\n          ")?;
    for i in 0..n {
        write!(out, "{} {} {} ", p.vx[i] as f32, p.vy[i] as f32, p.vz[i] as f32)?;
    }
    writeln!(out, "\n        </DataArray>")?;

    write!(out, "        <DataArray type=\"Float32\" Name=\"mass\" format=\"ascii\">\n          ")?;
    for i in 0..n {
        write!(out, "{} ", p.m[i] as f32)?;
    }
    writeln!(out, "\n        </DataArray>")?;

    writeln!(out, "      </PointData>\n    </Piece>\n  </UnstructuredGrid>\n</VTKFile>")?;

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::BodyType;
    use lin_alg::f64::Vec3;

    #[test]
    fn writes_one_cell_per_point() {
        let mut ps = ParticleSystem::with_capacity(3);
        for i in 0..3 {
            ps.push(Vec3::new(i as f64, 0.0, 0.0), Vec3::new_zero(), 1.0, BodyType::Star);
        }

        let mut path = std::env::temp_dir();
        path.push(format!("next_vtu_test_{}.vtu", std::process::id()));
        write(&ps, path.to_str().unwrap()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(contents.contains("NumberOfPoints=\"3\" NumberOfCells=\"3\""));
    }
}
