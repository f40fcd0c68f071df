//! ASCII fallback loader: whitespace-separated rows `x y z vx vy vz m type`,
//! EOF terminates (spec §6).

use std::io::BufRead;

use lin_alg::f64::Vec3;

use crate::particle::{BodyType, ParticleSystem};

pub fn load(path: &str) -> std::io::Result<ParticleSystem> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut particles = ParticleSystem::default();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 8 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("expected 8 columns, got {}: `{line}`", cols.len()),
            ));
        }
        let parse = |s: &str| -> std::io::Result<f64> {
            s.parse()
                .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("not a number: `{s}`")))
        };
        let x = parse(cols[0])?;
        let y = parse(cols[1])?;
        let z = parse(cols[2])?;
        let vx = parse(cols[3])?;
        let vy = parse(cols[4])?;
        let vz = parse(cols[5])?;
        let m = parse(cols[6])?;
        let type_tag: i32 = cols[7]
            .parse()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("not a type tag: `{}`", cols[7])))?;

        particles.push(Vec3::new(x, y, z), Vec3::new(vx, vy, vz), m, BodyType::from_tag(type_tag));
    }

    Ok(particles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_whitespace_separated_rows() {
        let mut path = std::env::temp_dir();
        path.push(format!("next_ascii_test_{}.txt", std::process::id()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "0 0 0 0 0 0 1.0 0").unwrap();
            writeln!(f, "1 2 3 0.1 0.2 0.3 2.5 1").unwrap();
        }

        let ps = load(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(ps.len(), 2);
        assert_eq!(ps.posit(1), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ps.type_[1], 1);
    }
}
