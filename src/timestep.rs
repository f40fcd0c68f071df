//! Adaptive global timestep: a velocity-only heuristic, not a full Courant
//! condition. Energy conservation relies on leapfrog, not on Δt shrinking
//! with acceleration (spec §4.4).

use crate::particle::ParticleSystem;

const SPEED_CLIP: f64 = 1e4;
const STATIONARY_THRESHOLD: f64 = 1e-8;
const MIN_FRACTION: f64 = 0.01;

/// Scale `dt0` down as the fastest particle speeds up, clamped to
/// `[0.01*dt0, dt0]` so no step is smaller than 1% of the base (bounded
/// progress) or larger than the base (bounded truncation).
pub fn adaptive_dt(particles: &ParticleSystem, dt0: f64) -> f64 {
    let v_max = particles.max_speed().unwrap_or(0.0).min(SPEED_CLIP);

    if v_max < STATIONARY_THRESHOLD {
        return dt0;
    }

    (dt0 / (1.0 + v_max)).clamp(dt0 * MIN_FRACTION, dt0)
}
