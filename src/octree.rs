//! The Barnes-Hut octree: an arena of node records indexed by integers,
//! built fresh every half-step over the current particle positions.
//!
//! Modeled as an arena rather than the source's pointer-owning tree
//! (`std::unique_ptr<Octree> child[8]`): nodes live in one `Vec`, children
//! are referenced by index, and the whole arena is dropped at step end.
//! This sidesteps any cyclic- or shared-ownership concern and makes the
//! tree trivially serializable for debugging.

use lin_alg::f64::Vec3;

use crate::config::BhConfig;
use crate::particle::ParticleSystem;

/// Sentinel: no child in this octant.
const NONE: usize = usize::MAX;

/// One node of the tree. Geometry is a cube; aggregates (mass, center of
/// mass, quadrupole) are filled in by [`Tree::aggregate`] after the whole
/// tree has been built.
#[derive(Debug, Clone)]
pub struct Node {
    pub center: Vec3,
    pub half: f64,
    pub leaf: bool,
    pub children: [usize; 8],
    /// Particle indices owned directly by this node. Normally at most one;
    /// may hold more than one only at the depth floor (spec §4.2 edge
    /// case), where coincident or near-coincident particles are accepted
    /// as a single point mass rather than recursed on forever.
    pub body_ids: Vec<usize>,

    pub m: f64,
    pub com: Vec3,

    pub qxx: f64,
    pub qyy: f64,
    pub qzz: f64,
    pub qxy: f64,
    pub qxz: f64,
    pub qyz: f64,
}

impl Node {
    fn new_leaf(center: Vec3, half: f64) -> Self {
        Self {
            center,
            half,
            leaf: true,
            children: [NONE; 8],
            body_ids: Vec::new(),
            m: 0.0,
            com: Vec3::new_zero(),
            qxx: 0.0,
            qyy: 0.0,
            qzz: 0.0,
            qxy: 0.0,
            qxz: 0.0,
            qyz: 0.0,
        }
    }

    /// Octant index of a position relative to this node's geometric
    /// center: `bit0 = x>cx, bit1 = y>cy, bit2 = z>cz` (spec §4.2).
    fn octant_of(&self, p: Vec3) -> usize {
        let mut idx = 0;
        if p.x > self.center.x {
            idx |= 0b001;
        }
        if p.y > self.center.y {
            idx |= 0b010;
        }
        if p.z > self.center.z {
            idx |= 0b100;
        }
        idx
    }

    fn child_center(&self, octant: usize) -> Vec3 {
        let q = self.half * 0.5;
        Vec3::new(
            self.center.x + if octant & 1 != 0 { q } else { -q },
            self.center.y + if octant & 2 != 0 { q } else { -q },
            self.center.z + if octant & 4 != 0 { q } else { -q },
        )
    }
}

/// Threading the recursion's loop-invariant state (config + depth bookkeeping)
/// as one value instead of four separate parameters.
struct InsertCtx<'a> {
    config: &'a BhConfig,
    depth_floor: f64,
    depth: usize,
}

impl InsertCtx<'_> {
    fn deeper(&self) -> Self {
        Self { config: self.config, depth_floor: self.depth_floor, depth: self.depth + 1 }
    }
}

/// An arena-owned Barnes-Hut tree for one half-step. Dropped at step exit;
/// holds no reference to the particle store that outlives the step.
#[derive(Debug)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub const ROOT: usize = 0;

    /// Build the tree over `particles`' current positions and aggregate
    /// mass/quadrupole moments, in one call (spec §4.2).
    pub fn build(particles: &ParticleSystem, config: &BhConfig) -> Self {
        let (center, half) = particles
            .bounding_cube()
            .unwrap_or((Vec3::new_zero(), 1.0));
        Self::build_with_bbox(particles, config, center, half)
    }

    /// Build over an externally supplied bounding cube — used in the
    /// distributed case, where the bbox is reduced across ranks before
    /// every rank builds its (otherwise identical) copy of the full tree
    /// (spec §5: "every rank builds the full tree over the full N").
    pub fn build_with_bbox(particles: &ParticleSystem, config: &BhConfig, center: Vec3, half: f64) -> Self {
        let mut nodes = vec![Node::new_leaf(center, half)];
        // Depth floor: half-width shrinks by half per level, so this bounds
        // recursion even for exactly coincident particles (spec §4.2).
        let ctx = InsertCtx { config, depth_floor: half * f64::EPSILON, depth: 0 };

        for i in 0..particles.len() {
            Self::insert(&mut nodes, Self::ROOT, i, particles, &ctx);
        }

        let mut tree = Self { nodes };
        tree.aggregate(particles);
        tree
    }

    fn insert(nodes: &mut Vec<Node>, node_i: usize, idx: usize, particles: &ParticleSystem, ctx: &InsertCtx) {
        if nodes[node_i].leaf {
            if nodes[node_i].body_ids.is_empty() {
                nodes[node_i].body_ids.push(idx);
                return;
            }

            // Depth floor or max-depth backstop: accept a multi-occupant
            // leaf instead of recursing without termination.
            if nodes[node_i].half <= ctx.depth_floor || ctx.depth >= ctx.config.max_tree_depth {
                nodes[node_i].body_ids.push(idx);
                return;
            }

            // Promote to internal: re-insert the existing occupant(s), then
            // fall through to insert the new one alongside them.
            nodes[node_i].leaf = false;
            let occupants = std::mem::take(&mut nodes[node_i].body_ids);
            for occ in occupants {
                let p = particles.posit(occ);
                Self::insert_into_child(nodes, node_i, p, occ, particles, ctx);
            }
        }

        let p = particles.posit(idx);
        Self::insert_into_child(nodes, node_i, p, idx, particles, ctx);
    }

    fn insert_into_child(nodes: &mut Vec<Node>, node_i: usize, p: Vec3, idx: usize, particles: &ParticleSystem, ctx: &InsertCtx) {
        let octant = nodes[node_i].octant_of(p);
        let mut child_i = nodes[node_i].children[octant];
        if child_i == NONE {
            let center = nodes[node_i].child_center(octant);
            let half = nodes[node_i].half * 0.5;
            nodes.push(Node::new_leaf(center, half));
            child_i = nodes.len() - 1;
            nodes[node_i].children[octant] = child_i;
        }
        Self::insert(nodes, child_i, idx, particles, &ctx.deeper());
    }

    /// Post-order mass/center-of-mass/quadrupole aggregation. Every child
    /// index is strictly greater than its parent's (children are always
    /// pushed after the parent), so a descending pass over node indices is
    /// a valid bottom-up traversal without explicit recursion.
    fn aggregate(&mut self, particles: &ParticleSystem) {
        for i in (0..self.nodes.len()).rev() {
            if self.nodes[i].leaf {
                let ids = &self.nodes[i].body_ids;
                let (m, com) = match ids.len() {
                    0 => (0.0, Vec3::new_zero()),
                    1 => (particles.m[ids[0]], particles.posit(ids[0])),
                    _ => {
                        let mut m = 0.0;
                        let mut com = Vec3::new_zero();
                        for &id in ids {
                            m += particles.m[id];
                            com += particles.posit(id) * particles.m[id];
                        }
                        com /= m;
                        (m, com)
                    }
                };
                self.nodes[i].m = m;
                self.nodes[i].com = com;
                continue;
            }

            let mut m = 0.0;
            let mut com = Vec3::new_zero();
            for c in self.nodes[i].children {
                if c == NONE || self.nodes[c].m == 0.0 {
                    continue;
                }
                m += self.nodes[c].m;
                com += self.nodes[c].com * self.nodes[c].m;
            }
            if m > 0.0 {
                com /= m;
            }
            self.nodes[i].m = m;
            self.nodes[i].com = com;

            let (mut qxx, mut qyy, mut qzz) = (0.0, 0.0, 0.0);
            let (mut qxy, mut qxz, mut qyz) = (0.0, 0.0, 0.0);
            for c in self.nodes[i].children {
                if c == NONE || self.nodes[c].m == 0.0 {
                    continue;
                }
                let mc = self.nodes[c].m;
                let r = self.nodes[c].com - com;
                let r2 = r.dot(r);
                qxx += mc * (3.0 * r.x * r.x - r2);
                qyy += mc * (3.0 * r.y * r.y - r2);
                qzz += mc * (3.0 * r.z * r.z - r2);
                qxy += mc * (3.0 * r.x * r.y);
                qxz += mc * (3.0 * r.x * r.z);
                qyz += mc * (3.0 * r.y * r.z);
            }
            self.nodes[i].qxx = qxx;
            self.nodes[i].qyy = qyy;
            self.nodes[i].qzz = qzz;
            self.nodes[i].qxy = qxy;
            self.nodes[i].qxz = qxz;
            self.nodes[i].qyz = qyz;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::BodyType;

    fn system_of(positions: &[(f64, f64, f64)]) -> ParticleSystem {
        let mut ps = ParticleSystem::with_capacity(positions.len());
        for &(x, y, z) in positions {
            ps.push(Vec3::new(x, y, z), Vec3::new_zero(), 1.0, BodyType::Star);
        }
        ps
    }

    #[test]
    fn mass_conservation() {
        let ps = system_of(&[(0.1, 0.2, 0.3), (-1.0, 2.0, 0.5), (3.0, -2.0, -1.0), (0.0, 0.0, 5.0)]);
        let tree = Tree::build(&ps, &BhConfig::default());
        let total: f64 = ps.m.iter().sum();
        assert!((tree.nodes[Tree::ROOT].m - total).abs() <= 1e-10 * total);
    }

    #[test]
    fn com_consistency() {
        let ps = system_of(&[(1.0, 0.0, 0.0), (-1.0, 0.0, 0.0), (0.0, 2.0, 0.0), (0.0, -2.0, -3.0)]);
        let tree = Tree::build(&ps, &BhConfig::default());

        let total_m: f64 = ps.m.iter().sum();
        let mut expected = Vec3::new_zero();
        for i in 0..ps.len() {
            expected += ps.posit(i) * ps.m[i];
        }
        expected /= total_m;

        let (_, half) = ps.bounding_cube().unwrap();
        let diff = (tree.nodes[Tree::ROOT].com - expected).magnitude();
        assert!(diff <= 1e-10 * half.max(1.0));
    }

    #[test]
    fn coincident_particles_terminate_insertion() {
        // All particles at the same point: insertion must not recurse
        // forever, and should end up in a single multi-occupant leaf.
        let ps = system_of(&[(1.0, 1.0, 1.0); 8]);
        let tree = Tree::build(&ps, &BhConfig::default());
        assert!((tree.nodes[Tree::ROOT].m - 8.0).abs() < 1e-10);
    }

    #[test]
    fn single_particle_tree_has_no_quadrupole() {
        let ps = system_of(&[(0.0, 0.0, 0.0)]);
        let tree = Tree::build(&ps, &BhConfig::default());
        let root = &tree.nodes[Tree::ROOT];
        assert_eq!(root.qxx, 0.0);
        assert_eq!(root.qxy, 0.0);
    }
}
