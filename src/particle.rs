//! The particle table: a structure-of-arrays store of N bodies.
//!
//! The source project migrated from array-of-structs to SoA mid-history for
//! cache behavior and autovectorization in the drift and scan loops; that
//! layout is preserved here. Index into the table is a particle's identity
//! and is stable across steps.

use lin_alg::f64::Vec3;

/// Categorical particle species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Star = 0,
    DarkMatter = 1,
}

impl BodyType {
    pub fn from_tag(tag: i32) -> Self {
        if tag == 1 {
            Self::DarkMatter
        } else {
            Self::Star
        }
    }

    pub fn tag(self) -> i32 {
        self as i32
    }
}

/// Structure-of-arrays particle database. All lanes share the same length;
/// the same index into every lane describes one particle.
#[derive(Debug, Default, Clone)]
pub struct ParticleSystem {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub vz: Vec<f64>,
    pub m: Vec<f64>,
    pub type_: Vec<i32>,
}

impl ParticleSystem {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
            vx: Vec::with_capacity(n),
            vy: Vec::with_capacity(n),
            vz: Vec::with_capacity(n),
            m: Vec::with_capacity(n),
            type_: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn push(&mut self, pos: Vec3, vel: Vec3, mass: f64, body_type: BodyType) {
        self.x.push(pos.x);
        self.y.push(pos.y);
        self.z.push(pos.z);
        self.vx.push(vel.x);
        self.vy.push(vel.y);
        self.vz.push(vel.z);
        self.m.push(mass);
        self.type_.push(body_type.tag());
    }

    pub fn posit(&self, i: usize) -> Vec3 {
        Vec3::new(self.x[i], self.y[i], self.z[i])
    }

    pub fn velocity(&self, i: usize) -> Vec3 {
        Vec3::new(self.vx[i], self.vy[i], self.vz[i])
    }

    /// All lanes equal length, masses strictly positive, type tags in
    /// `{0, 1}` — the invariants spec.md §3 names for the particle table.
    pub fn check_invariants(&self) -> Result<(), String> {
        let n = self.len();
        if [
            self.y.len(),
            self.z.len(),
            self.vx.len(),
            self.vy.len(),
            self.vz.len(),
            self.m.len(),
            self.type_.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("particle lanes have mismatched lengths".to_string());
        }
        if let Some((i, &m)) = self.m.iter().enumerate().find(|(_, &m)| m.is_nan() || m <= 0.0) {
            return Err(format!("particle {i} has non-positive mass {m}"));
        }
        if let Some((i, &t)) = self.type_.iter().enumerate().find(|(_, &t)| t != 0 && t != 1) {
            return Err(format!("particle {i} has invalid type tag {t}"));
        }
        if self.x.iter().chain(&self.y).chain(&self.z).any(|v| !v.is_finite()) {
            return Err("non-finite position detected".to_string());
        }
        Ok(())
    }

    /// Axis-aligned bounding cube of the current positions, per spec §4.2:
    /// centered on the bbox center, half-width is half the largest extent,
    /// falling back to 1 for a zero-extent (e.g. single-particle) system.
    pub fn bounding_cube(&self) -> Option<(Vec3, f64)> {
        if self.is_empty() {
            return None;
        }

        let (mut x_min, mut x_max) = (f64::MAX, f64::MIN);
        let (mut y_min, mut y_max) = (f64::MAX, f64::MIN);
        let (mut z_min, mut z_max) = (f64::MAX, f64::MIN);

        for i in 0..self.len() {
            x_min = x_min.min(self.x[i]);
            x_max = x_max.max(self.x[i]);
            y_min = y_min.min(self.y[i]);
            y_max = y_max.max(self.y[i]);
            z_min = z_min.min(self.z[i]);
            z_max = z_max.max(self.z[i]);
        }

        let center = Vec3::new((x_min + x_max) * 0.5, (y_min + y_max) * 0.5, (z_min + z_max) * 0.5);
        let half = (x_max - x_min).max(y_max - y_min).max(z_max - z_min) * 0.5;

        Some((center, if half > 0.0 { half } else { 1.0 }))
    }

    /// Maximum speed across the table, for the adaptive timestep scan
    /// (spec §4.4). `None` for an empty table.
    pub fn max_speed(&self) -> Option<f64> {
        (0..self.len())
            .map(|i| self.vx[i].mul_add(self.vx[i], self.vy[i].mul_add(self.vy[i], self.vz[i] * self.vz[i])))
            .fold(None, |acc, v2| Some(acc.map_or(v2, |a: f64| a.max(v2))))
            .map(f64::sqrt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_cube_of_single_particle_is_unit_width() {
        let mut ps = ParticleSystem::with_capacity(1);
        ps.push(Vec3::new_zero(), Vec3::new_zero(), 1.0, BodyType::Star);
        let (center, half) = ps.bounding_cube().unwrap();
        assert_eq!(center, Vec3::new_zero());
        assert_eq!(half, 1.0);
    }

    #[test]
    fn invariants_reject_nonpositive_mass() {
        let mut ps = ParticleSystem::with_capacity(1);
        ps.push(Vec3::new_zero(), Vec3::new_zero(), 0.0, BodyType::Star);
        assert!(ps.check_invariants().is_err());
    }

    #[test]
    fn max_speed_of_stationary_system_is_zero() {
        let mut ps = ParticleSystem::with_capacity(2);
        ps.push(Vec3::new_zero(), Vec3::new_zero(), 1.0, BodyType::Star);
        ps.push(Vec3::new(1.0, 0.0, 0.0), Vec3::new_zero(), 1.0, BodyType::Star);
        assert_eq!(ps.max_speed(), Some(0.0));
    }
}
