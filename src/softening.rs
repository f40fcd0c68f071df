//! Softening kernels: closed-form smoothing used wherever an inverse
//! distance appears, so close encounters don't produce unbounded
//! accelerations and destroy integrator stability.

const EPS_MIN: f64 = 1e-4;

/// Softening length for a particle-node interaction. Dominant term is the
/// node's own size; a smaller mass-based term adds a little more smoothing
/// for heavy nodes; both taper out as distance grows so far-field
/// interactions are effectively un-softened.
pub fn node_softening(size: f64, mass: f64, dist: f64) -> f64 {
    let eps_size = size * 0.015;
    let eps_mass = mass.cbrt() * 0.002;
    let eps_taper = 1.0 / (1.0 + dist * 10.0);
    let eps = (eps_size + eps_mass) * eps_taper;
    eps.max(EPS_MIN)
}

/// Softening length for a direct particle-particle pair, symmetric in the
/// two masses. Returns `eps`, not `eps^2`; squaring happens at the call
/// site alongside `r^2`.
pub fn pair_softening(m_i: f64, m_j: f64) -> f64 {
    let e_i = m_i.cbrt() * 0.002;
    let e_j = m_j.cbrt() * 0.002;
    let eps2 = e_i.mul_add(e_i, e_j * e_j);
    eps2.sqrt().max(EPS_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_softening_has_a_floor() {
        assert_eq!(node_softening(0.0, 0.0, 1e9), EPS_MIN);
    }

    #[test]
    fn node_softening_tapers_with_distance() {
        let near = node_softening(1.0, 1.0, 0.0);
        let far = node_softening(1.0, 1.0, 100.0);
        assert!(far < near);
    }

    #[test]
    fn pair_softening_is_symmetric() {
        assert_eq!(pair_softening(2.0, 5.0), pair_softening(5.0, 2.0));
    }

    #[test]
    fn pair_softening_has_a_floor() {
        assert_eq!(pair_softening(0.0, 0.0), EPS_MIN);
    }
}
