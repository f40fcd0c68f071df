//! Optional inter-rank replicated-tree domain decomposition (spec §5).
//!
//! Every rank builds the full tree over all N particles; only the
//! per-particle force loop is partitioned, over the contiguous slice
//! `[r*N/R, (r+1)*N/R)` owned by rank `r`. After each kick and after the
//! drift, each rank's owned slice of the updated lane is all-gathered into
//! every rank's full mirror. Threaded explicitly into the step and
//! snapshot entry points rather than held as a global singleton (spec §9).

use std::ops::Range;

#[cfg(feature = "mpi")]
use mpi::{datatype::PartitionMut, topology::SimpleCommunicator, traits::*, Count};

/// Explicit rank/size context for one process. With the `mpi` feature
/// disabled (the default — see SPEC_FULL.md §5), [`RankContext::single`]
/// degenerates to rank 0 of 1 and every collective is a no-op; the step
/// and traversal code paths are identical either way.
pub struct RankContext {
    rank: usize,
    size: usize,
    #[cfg(feature = "mpi")]
    world: Option<SimpleCommunicator>,
}

impl RankContext {
    pub fn single() -> Self {
        Self {
            rank: 0,
            size: 1,
            #[cfg(feature = "mpi")]
            world: None,
        }
    }

    #[cfg(feature = "mpi")]
    pub fn from_world(world: SimpleCommunicator) -> Self {
        Self {
            rank: world.rank() as usize,
            size: world.size() as usize,
            world: Some(world),
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_root(&self) -> bool {
        self.rank == 0
    }

    /// The contiguous particle index range owned by this rank, for a
    /// table of `n` particles.
    pub fn owned_range(&self, n: usize) -> Range<usize> {
        let start = self.rank * n / self.size;
        let end = (self.rank + 1) * n / self.size;
        start..end
    }

    #[cfg_attr(not(feature = "mpi"), allow(dead_code))]
    fn rank_counts(&self, n: usize) -> Vec<usize> {
        (0..self.size)
            .map(|r| (r + 1) * n / self.size - r * n / self.size)
            .collect()
    }

    /// All-gather this rank's owned slice of one SoA lane into every
    /// rank's full mirror, in place. A no-op for a single-rank run.
    #[cfg_attr(not(feature = "mpi"), allow(unused_variables, clippy::needless_return))]
    pub fn all_gather_lane(&self, lane: &mut [f64]) {
        if self.size == 1 {
            return;
        }

        #[cfg(feature = "mpi")]
        {
            let Some(world) = &self.world else { return };
            let range = self.owned_range(lane.len());
            let send = lane[range].to_vec();

            let counts: Vec<Count> = self.rank_counts(lane.len()).iter().map(|&c| c as Count).collect();
            let displs: Vec<Count> = counts
                .iter()
                .scan(0, |acc, &c| {
                    let d = *acc;
                    *acc += c;
                    Some(d)
                })
                .collect();

            let mut partition = PartitionMut::new(lane, counts, &displs[..]);
            world.all_gather_varcount_into(&send[..], &mut partition);
        }
    }

    /// Reduce a local bounding-cube candidate into the global one shared
    /// by every rank, ahead of each tree build.
    pub fn reduce_bounding_cube(
        &self,
        local_center: lin_alg::f64::Vec3,
        local_half: f64,
    ) -> (lin_alg::f64::Vec3, f64) {
        if self.size == 1 {
            return (local_center, local_half);
        }

        #[cfg(feature = "mpi")]
        if let Some(world) = &self.world {
            let mut xs = vec![0.0f64; self.size];
            let mut ys = vec![0.0f64; self.size];
            let mut zs = vec![0.0f64; self.size];
            let mut halves = vec![0.0f64; self.size];
            world.all_gather_into(&local_center.x, &mut xs[..]);
            world.all_gather_into(&local_center.y, &mut ys[..]);
            world.all_gather_into(&local_center.z, &mut zs[..]);
            world.all_gather_into(&local_half, &mut halves[..]);

            let half = halves.iter().cloned().fold(0.0, f64::max).max(local_half);
            let center = lin_alg::f64::Vec3::new(
                xs.iter().sum::<f64>() / self.size as f64,
                ys.iter().sum::<f64>() / self.size as f64,
                zs.iter().sum::<f64>() / self.size as f64,
            );
            return (center, half);
        }

        (local_center, local_half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rank_owns_the_whole_range() {
        let ctx = RankContext::single();
        assert_eq!(ctx.owned_range(10), 0..10);
    }
}
