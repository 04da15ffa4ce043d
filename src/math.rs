//! MathKit: the small set of numeric primitives shared by every other
//! component -- elementary rotations, the near-singular guards the design
//! calls out explicitly (section 9: "every acos/asin/division that can
//! touch +-1 or zero must be gated by a tolerance and clamped; all of these
//! must be centralized rather than scattered"), and the Stumpff functions
//! used by the universal-variable Lambert solver.
use crate::linalg::{Matrix3, Vector3};
use std::f64::consts::PI;

/// Below this eccentricity an orbit is treated as "near-circular but not
/// singular": downstream code substitutes `ECC_TOL` itself for `e` rather
/// than dividing by a true zero.
pub const ECC_TOL: f64 = 1e-4;

/// Below this inclination (radians) an orbit is treated as near-equatorial.
pub const ANGLE_TOL: f64 = 1e-7;

/// Distance round-trip tolerance used by the element<->Cartesian property tests (km).
pub const DISTANCE_TOL_KM: f64 = 20.0;

/// Eccentricity round-trip tolerance used by the element<->Cartesian property tests.
pub const ECC_ROUNDTRIP_TOL: f64 = 5e-5;

/// Angle round-trip tolerance (degrees) used by the element<->Cartesian property tests.
pub const ANGLE_ROUNDTRIP_TOL_DEG: f64 = 5e-3;

/// Clamps a value that should mathematically lie in `[-1, 1]` (i.e. the
/// argument of an `acos`/`asin`) back into range when it has drifted by no
/// more than `1e-12`, which is the numeric slop floating point round-off
/// introduces in the dot-product formulas used throughout orbital element
/// extraction. Values that drift by more than that are left alone so the
/// resulting NaN can be caught by the propagator's NaN guard instead of
/// being silently hidden.
pub fn clamp_unit(x: f64) -> f64 {
    const SLOP: f64 = 1e-12;
    if x > 1.0 && x - 1.0 < SLOP {
        1.0
    } else if x < -1.0 && -1.0 - x < SLOP {
        -1.0
    } else {
        x
    }
}

/// `acos` with the unit-range guard applied first.
pub fn safe_acos(x: f64) -> f64 {
    clamp_unit(x).acos()
}

/// Reduces an angle (radians) to `[0, 2*pi)`.
pub fn wrap_2pi(angle: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut a = angle % two_pi;
    if a < 0.0 {
        a += two_pi;
    }
    a
}

/// Maps an angular error to its short-path representative: if the error
/// exceeds +-pi, it is wrapped by one full turn so controllers always
/// thrust the short way around.
pub fn short_path_error(delta: f64) -> f64 {
    let mut d = delta;
    if d.abs() > PI {
        d -= d.signum() * 2.0 * PI;
    }
    d
}

/// Elementary rotation about the X axis by `angle` radians.
pub fn r1(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Elementary rotation about the Z axis by `angle` radians.
pub fn r3(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// The perifocal-to-inertial (and, with negated angles, RSW-to-inertial)
/// 3-1-3 Euler rotation `R3(-Omega) . R1(-i) . R3(-omega)`.
pub fn euler313(angle1: f64, angle2: f64, angle3: f64) -> Matrix3<f64> {
    r3(angle1) * r1(angle2) * r3(angle3)
}

/// Stumpff function c2(psi).
pub fn stumpff_c2(psi: f64) -> f64 {
    if psi > 1e-6 {
        (1.0 - psi.sqrt().cos()) / psi
    } else if psi < -1e-6 {
        (1.0 - (-psi).sqrt().cosh()) / psi
    } else {
        0.5
    }
}

/// Stumpff function c3(psi).
pub fn stumpff_c3(psi: f64) -> f64 {
    if psi > 1e-6 {
        let sq = psi.sqrt();
        (sq - sq.sin()) / psi.powf(1.5)
    } else if psi < -1e-6 {
        let sq = (-psi).sqrt();
        (sq.sinh() - sq) / (-psi).powf(1.5)
    } else {
        1.0 / 6.0
    }
}

/// Returns the tilde (cross-product) matrix `[v]x` such that `[v]x * w == v.cross(&w)`.
pub fn tilde_matrix(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Returns whether the provided 3x3 matrix is (numerically) diagonal.
pub fn is_diagonal(m: &Matrix3<f64>) -> bool {
    for i in 0..3 {
        for j in 0..3 {
            if i != j && m[(i, j)].abs() > f64::EPSILON {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_unit_rescues_roundoff() {
        assert_eq!(clamp_unit(1.0 + 1e-13), 1.0);
        assert_eq!(clamp_unit(-1.0 - 1e-13), -1.0);
        let untouched = 1.0 + 1e-6;
        assert_eq!(clamp_unit(untouched), untouched);
    }

    #[test]
    fn wrap_2pi_is_in_range() {
        assert!((wrap_2pi(-0.1) - (2.0 * PI - 0.1)).abs() < 1e-12);
        assert!((wrap_2pi(3.0 * PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn stumpff_continuous_at_zero() {
        assert!((stumpff_c2(1e-7) - 0.5).abs() < 1e-6);
        assert!((stumpff_c3(1e-7) - 1.0 / 6.0).abs() < 1e-6);
    }
}
