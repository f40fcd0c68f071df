//! Gravitational acceleration: the Barnes-Hut tree traversal (spec §4.3)
//! plus the direct O(N^2) pairwise kernel it is checked against.
//!
//! `G = 1`; the simulator runs in natural units throughout.

use lin_alg::f64::Vec3;

use crate::config::BhConfig;
use crate::octree::Tree;
use crate::particle::ParticleSystem;
use crate::softening::{node_softening, pair_softening};

/// Underflow guard applied only to the opening-test distance, never to the
/// force itself.
const OPENING_GUARD: f64 = 1e-20;

/// Acceleration on particle `i` from the whole tree, found by descending
/// from the root and accepting nodes as multipoles once `node.half / r <
/// theta` (or the node is a leaf). Self-interaction is excluded.
pub fn acceleration(tree: &Tree, particles: &ParticleSystem, i: usize, config: &BhConfig) -> Vec3 {
    let mut acc = Vec3::new_zero();
    accumulate(tree, Tree::ROOT, particles, i, config.theta, &mut acc);
    acc
}

fn accumulate(tree: &Tree, node_i: usize, particles: &ParticleSystem, i: usize, theta: f64, acc: &mut Vec3) {
    let node = &tree.nodes[node_i];
    if node.m == 0.0 {
        return;
    }
    if node.leaf && node.body_ids.len() == 1 && node.body_ids[0] == i {
        return;
    }

    let posit_i = particles.posit(i);
    let d = node.com - posit_i;
    let r2 = d.dot(d);
    let r = (r2 + OPENING_GUARD).sqrt();

    let mut eps = node_softening(node.half, node.m, r);
    if particles.type_[i] == 1 {
        // Widen softening when a heavy node dominates a lightweight dark
        // matter probe (spec §4.3 point 3; tunable, not physically derived
        // — spec §9 note c).
        let floor = 2.0 * node.half / (node.m / particles.m[i]).cbrt();
        eps = eps.max(floor);
    }

    let r2_soft = r2 + eps * eps;
    let inv_r = 1.0 / r2_soft.sqrt();

    // Leaves with more than one occupant (the depth-floor edge case) are
    // always accepted as a point mass; there is nowhere further to descend.
    if node.leaf || node.half / r < theta {
        let inv_r3 = inv_r * inv_r * inv_r;
        *acc += d * (node.m * inv_r3);

        let inv_r5 = inv_r3 * inv_r * inv_r;
        let inv_r7 = inv_r5 * inv_r * inv_r;

        let qr = Vec3::new(
            2.0 * (node.qxx * d.x + node.qxy * d.y + node.qxz * d.z),
            2.0 * (node.qxy * d.x + node.qyy * d.y + node.qyz * d.z),
            2.0 * (node.qxz * d.x + node.qyz * d.y + node.qzz * d.z),
        );
        let q = node.qxx * d.x * d.x
            + node.qyy * d.y * d.y
            + node.qzz * d.z * d.z
            + 2.0 * (node.qxy * d.x * d.y + node.qxz * d.x * d.z + node.qyz * d.y * d.z);

        *acc += (qr * inv_r5 - d * (5.0 * q * inv_r7)) * 0.5;
        return;
    }

    for child in node.children {
        if child != usize::MAX {
            accumulate(tree, child, particles, i, theta, acc);
        }
    }
}

/// Direct pairwise gravity between particles `i` and `j`, using
/// [`pair_softening`]. Applies Newton's third law exactly: the impulse on
/// `i` and `j` are equal and opposite, so total momentum is conserved to
/// roundoff. Grounded on the original `GravitySoA` direct kernel, kept
/// standalone for small-N validation and as the O(N^2) reference in the
/// opening-criterion regression test.
pub fn direct_step_pair(particles: &mut ParticleSystem, i: usize, j: usize, dt: f64) {
    let d = particles.posit(j) - particles.posit(i);
    let eps = pair_softening(particles.m[i], particles.m[j]);
    let r2 = d.dot(d) + eps * eps;
    let inv_r3 = 1.0 / (r2 * r2.sqrt());
    let f = inv_r3 * dt;

    let imp_i = d * (f * particles.m[j]);
    particles.vx[i] += imp_i.x;
    particles.vy[i] += imp_i.y;
    particles.vz[i] += imp_i.z;

    let imp_j = d * (f * particles.m[i]);
    particles.vx[j] -= imp_j.x;
    particles.vy[j] -= imp_j.y;
    particles.vz[j] -= imp_j.z;
}

/// Direct O(N^2) acceleration on particle `i` from every other particle,
/// using [`pair_softening`]. The opening-criterion regression reference
/// (spec §8 scenario 4).
pub fn direct_acceleration(particles: &ParticleSystem, i: usize) -> Vec3 {
    let posit_i = particles.posit(i);
    let mut acc = Vec3::new_zero();
    for j in 0..particles.len() {
        if j == i {
            continue;
        }
        let d = particles.posit(j) - posit_i;
        let eps = pair_softening(particles.m[i], particles.m[j]);
        let r2 = d.dot(d) + eps * eps;
        let inv_r3 = 1.0 / (r2 * r2.sqrt());
        acc += d * (particles.m[j] * inv_r3);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::BodyType;

    #[test]
    fn self_force_is_zero() {
        let mut ps = ParticleSystem::with_capacity(1);
        ps.push(Vec3::new(1.0, 2.0, 3.0), Vec3::new_zero(), 5.0, BodyType::Star);
        let config = BhConfig::default();
        let tree = Tree::build(&ps, &config);
        let a = acceleration(&tree, &ps, 0, &config);
        assert_eq!(a, Vec3::new_zero());
    }

    #[test]
    fn direct_pair_conserves_momentum() {
        let mut ps = ParticleSystem::with_capacity(2);
        ps.push(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.3, -0.1, 0.0), 2.0, BodyType::Star);
        ps.push(Vec3::new(1.0, 0.0, 0.0), Vec3::new(-0.2, 0.4, 0.0), 3.0, BodyType::Star);

        let p_before: Vec3 = ps.velocity(0) * ps.m[0] + ps.velocity(1) * ps.m[1];
        direct_step_pair(&mut ps, 0, 1, 0.01);
        let p_after: Vec3 = ps.velocity(0) * ps.m[0] + ps.velocity(1) * ps.m[1];

        assert!((p_before - p_after).magnitude() < 1e-10);
    }

    #[test]
    fn tree_force_agrees_with_direct_sum_at_small_theta() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let mut ps = ParticleSystem::with_capacity(50);
        for _ in 0..50 {
            ps.push(
                Vec3::new(rng.random::<f64>(), rng.random::<f64>(), rng.random::<f64>()),
                Vec3::new_zero(),
                1.0,
                BodyType::Star,
            );
        }

        let config = BhConfig { theta: 0.2, ..BhConfig::default() };
        let tree = Tree::build(&ps, &config);
        let tree_acc = acceleration(&tree, &ps, 0, &config);
        let direct_acc = direct_acceleration(&ps, 0);

        let err = (tree_acc - direct_acc).magnitude() / direct_acc.magnitude();
        assert!(err < 0.05, "tree={tree_acc:?} direct={direct_acc:?} rel_err={err}");
    }
}
