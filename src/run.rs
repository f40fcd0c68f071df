//! The run loop (spec §4.6): repeat adaptive dt -> one KDK step -> advance
//! sim time -> emit a snapshot when the dump threshold is crossed, until
//! the user sends 'q'/'Q' on standard input.

use std::io::BufRead;
use std::sync::mpsc;

use crate::config::RunConfig;
use crate::error::Result;
use crate::io;
use crate::particle::ParticleSystem;
use crate::rank::RankContext;
use crate::step;
use crate::timestep::adaptive_dt;

/// Monotonic run state: simulation time, next dump threshold, step and
/// snapshot counters (spec §3).
#[derive(Debug, Default)]
pub struct RunState {
    pub t: f64,
    pub t_next: f64,
    pub k: u64,
    pub snapshot_count: u64,
}

/// Spawns a background reader so the top of the loop can poll for 'q'/'Q'
/// without blocking on stdin (spec §4.6/§5: honored only between complete
/// steps, never mid-step).
fn spawn_quit_listener() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") {
                let _ = tx.send(());
                break;
            }
        }
    });
    rx
}

/// Runs until the quit signal arrives. Fatal pre-conditions (spec §4.7:
/// misconfigured bounding box with N=0, non-finite positions) are checked
/// once before the loop starts; everything after that either completes a
/// step or logs-and-continues (snapshot I/O failures).
pub fn run(mut particles: ParticleSystem, config: &RunConfig, rank: &RankContext) -> Result<()> {
    if particles.is_empty() {
        return Err(crate::error::NextError::Numeric("no particles to simulate".into()));
    }
    if let Err(reason) = particles.check_invariants() {
        return Err(crate::error::NextError::Numeric(reason));
    }

    let mut state = RunState::default();

    let quit_rx = if rank.is_root() { Some(spawn_quit_listener()) } else { None };

    loop {
        if let Some(rx) = &quit_rx {
            if rx.try_recv().is_ok() {
                log::info!("quit requested at step {}, t={:.6}", state.k, state.t);
                break;
            }
        }

        let dt = adaptive_dt(&particles, config.dt0);
        step::step(&mut particles, dt, &config.bh, rank);

        state.t += dt;
        state.k += 1;
        log::debug!("step {} dt={:.6e} t={:.6}", state.k, dt, state.t);

        if state.t >= state.t_next {
            if rank.is_root() {
                match io::write_snapshot(&particles, state.snapshot_count, config.format) {
                    Ok(path) => log::info!("wrote snapshot {path}"),
                    Err(e) => log::warn!("snapshot write failed: {e}"),
                }
            }
            state.snapshot_count += 1;
            state.t_next += config.dump_interval;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BhConfig, SnapshotFormat};
    use crate::particle::BodyType;
    use lin_alg::f64::Vec3;

    #[test]
    fn rejects_empty_particle_table() {
        let ps = ParticleSystem::with_capacity(0);
        let config = RunConfig {
            input_path: "test".into(),
            threads: 1,
            dt0: 0.01,
            dump_interval: 1.0,
            format: SnapshotFormat::Vtk,
            bh: BhConfig::default(),
        };
        let rank = RankContext::single();
        assert!(run(ps, &config, &rank).is_err());
    }

    #[test]
    fn rejects_non_positive_mass() {
        let mut ps = ParticleSystem::with_capacity(1);
        ps.push(Vec3::new_zero(), Vec3::new_zero(), -1.0, BodyType::Star);
        let config = RunConfig {
            input_path: "test".into(),
            threads: 1,
            dt0: 0.01,
            dump_interval: 1.0,
            format: SnapshotFormat::Vtk,
            bh: BhConfig::default(),
        };
        let rank = RankContext::single();
        assert!(run(ps, &config, &rank).is_err());
    }
}
