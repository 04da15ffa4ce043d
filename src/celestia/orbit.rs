//! Orbit: the osculating Cartesian state plus its cached Keplerian element
//! representation.
//!
//! The design flags the source's "hash = sum of r,v components" cache-guard
//! as fragile; this implementation instead keeps a monotonically
//! incrementing version counter that is bumped on every write to `r`/`v`,
//! and the element cache simply records which version it was computed
//! from (see `src/math.rs` and the module-level design notes for the
//! broader near-singular-guard policy this module leans on).
use std::cell::RefCell;
use std::f64::consts::PI;

use crate::celestia::body::CelestialBody;
use crate::ephemeris::EphemerisHandle;
use crate::errors::{AstroError, AstroResult};
use crate::linalg::{Matrix3, Vector3, Vector6};
use crate::math::{clamp_unit, euler313, safe_acos, wrap_2pi, ANGLE_TOL, ECC_TOL};

/// The six classical orbital elements plus the longitude-style quantities
/// that substitute for RAAN/AOP/true-anomaly in near-singular geometries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Elements {
    pub sma_km: f64,
    pub ecc: f64,
    pub inc_rad: f64,
    pub raan_rad: f64,
    pub aop_rad: f64,
    pub ta_rad: f64,
    /// True longitude, valid (meaningful) for near-circular near-equatorial orbits.
    pub true_longitude_rad: f64,
    /// Longitude of periapsis, valid for near-circular inclined orbits (raan defined, e ~ 0).
    pub long_of_periapsis_rad: f64,
    /// Argument of latitude (aop + ta), valid for near-circular inclined orbits.
    pub arg_latitude_rad: f64,
}

#[derive(Clone, Copy, Debug)]
struct ElementsCache {
    version: u64,
    elements: Elements,
}

/// An osculating Cartesian state about a `CelestialBody` origin.
///
/// Constructed by a propagator or by a user; mutated only by the
/// propagator during integration or by an explicit frame switch. `r`/`v`
/// are private specifically so every mutation funnels through
/// `set_rv`, which is what keeps the element cache's version check honest.
#[derive(Clone, Debug)]
pub struct Orbit {
    r_vec: Vector3<f64>,
    v_vec: Vector3<f64>,
    pub origin: CelestialBody,
    /// Seconds past the mission's reference epoch. Kept as a bare f64 here
    /// (rather than a `hifitime::Epoch`) so `Orbit` stays `Copy`-free but
    /// cheap; the Mission layer is responsible for calendar conversions.
    pub epoch_s: f64,
    version: u64,
    cache: RefCell<Option<ElementsCache>>,
}

impl Orbit {
    /// Builds an Orbit directly from position/velocity. Always valid,
    /// including parabolic and hyperbolic geometries.
    pub fn cartesian(state: Vector6<f64>, origin: &CelestialBody) -> Orbit {
        Orbit {
            r_vec: Vector3::new(state[0], state[1], state[2]),
            v_vec: Vector3::new(state[3], state[4], state[5]),
            origin: origin.clone(),
            epoch_s: 0.0,
            version: 0,
            cache: RefCell::new(None),
        }
    }

    pub fn from_rv(r: Vector3<f64>, v: Vector3<f64>, epoch_s: f64, origin: &CelestialBody) -> Orbit {
        Orbit {
            r_vec: r,
            v_vec: v,
            origin: origin.clone(),
            epoch_s,
            version: 0,
            cache: RefCell::new(None),
        }
    }

    /// Builds an Orbit from Keplerian elements (angles in **degrees**, per
    /// the design's convention that element-from-user constructors accept
    /// degrees while everything internal is radians). Rejects parabolic
    /// and hyperbolic eccentricities -- those must be built via `from_rv`.
    pub fn from_elements(
        sma_km: f64,
        ecc: f64,
        inc_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ta_deg: f64,
        epoch_s: f64,
        origin: &CelestialBody,
    ) -> AstroResult<Orbit> {
        if ecc >= 1.0 {
            return Err(AstroError::illegal_state(
                "parabolic/hyperbolic orbits cannot be constructed from elements; use from_rv",
            ));
        }
        let (r, v) = coe_to_rv(
            sma_km,
            ecc,
            inc_deg.to_radians(),
            raan_deg.to_radians(),
            aop_deg.to_radians(),
            ta_deg.to_radians(),
            origin.mu_km3_s2,
        );
        Ok(Orbit::from_rv(r, v, epoch_s, origin))
    }

    pub fn r(&self) -> Vector3<f64> {
        self.r_vec
    }

    pub fn v(&self) -> Vector3<f64> {
        self.v_vec
    }

    pub fn rmag(&self) -> f64 {
        self.r_vec.norm()
    }

    pub fn vmag(&self) -> f64 {
        self.v_vec.norm()
    }

    /// The only way to mutate position/velocity; bumps the cache-busting
    /// version counter so the next element read recomputes.
    pub fn set_rv(&mut self, r: Vector3<f64>, v: Vector3<f64>) {
        self.r_vec = r;
        self.v_vec = v;
        self.version += 1;
    }

    fn elements(&self) -> Elements {
        let mut cache = self.cache.borrow_mut();
        if let Some(c) = *cache {
            if c.version == self.version {
                return c.elements;
            }
        }
        let elements = rv_to_coe(self.r_vec, self.v_vec, self.origin.mu_km3_s2);
        *cache = Some(ElementsCache {
            version: self.version,
            elements,
        });
        elements
    }

    pub fn sma_km(&self) -> f64 {
        self.elements().sma_km
    }
    pub fn ecc(&self) -> f64 {
        self.elements().ecc
    }
    pub fn inc_rad(&self) -> f64 {
        self.elements().inc_rad
    }
    pub fn raan_rad(&self) -> f64 {
        self.elements().raan_rad
    }
    pub fn aop_rad(&self) -> f64 {
        self.elements().aop_rad
    }
    pub fn ta_rad(&self) -> f64 {
        self.elements().ta_rad
    }
    pub fn true_longitude_rad(&self) -> f64 {
        self.elements().true_longitude_rad
    }
    pub fn long_of_periapsis_rad(&self) -> f64 {
        self.elements().long_of_periapsis_rad
    }
    pub fn arg_latitude_rad(&self) -> f64 {
        self.elements().arg_latitude_rad
    }

    pub fn energy_km2_s2(&self) -> f64 {
        self.vmag().powi(2) / 2.0 - self.origin.mu_km3_s2 / self.rmag()
    }

    pub fn hvec(&self) -> Vector3<f64> {
        self.r_vec.cross(&self.v_vec)
    }

    pub fn evec(&self) -> Vector3<f64> {
        eccentricity_vector(self.r_vec, self.v_vec, self.origin.mu_km3_s2)
    }

    /// Switches the origin to `new_body`. Rejects a same-body switch.
    /// Adds the current origin's heliocentric state when the new body is
    /// the central star (SOI == -1 by convention); otherwise subtracts the
    /// new body's heliocentric state, both via the supplied ephemeris
    /// handle (an external collaborator per the design).
    pub fn to_x_centric(
        &self,
        new_body: &CelestialBody,
        ephemeris: &EphemerisHandle,
    ) -> AstroResult<Orbit> {
        if new_body.name == self.origin.name {
            return Err(AstroError::illegal_state(format!(
                "cannot switch orbit origin from {} to itself",
                new_body.name
            )));
        }
        let (new_r, new_v) = if new_body.is_star() {
            let helio = ephemeris.heliocentric_orbit(&self.origin, self.epoch_s)?;
            (self.r_vec + helio.r(), self.v_vec + helio.v())
        } else {
            let helio = ephemeris.heliocentric_orbit(new_body, self.epoch_s)?;
            (self.r_vec - helio.r(), self.v_vec - helio.v())
        };
        Ok(Orbit::from_rv(new_r, new_v, self.epoch_s, new_body))
    }

    /// Equality up to free true anomaly: a, e, i, Omega agree within
    /// tolerance and either omega, u (for near-circular inclined) or
    /// true longitude (for near-circular equatorial) agree.
    pub fn equals(&self, other: &Orbit, tol_km: f64, tol_ecc: f64, tol_angle_rad: f64) -> bool {
        let a = self.elements();
        let b = other.elements();
        if (a.sma_km - b.sma_km).abs() > tol_km
            || (a.ecc - b.ecc).abs() > tol_ecc
            || angle_diff(a.inc_rad, b.inc_rad) > tol_angle_rad
            || angle_diff(a.raan_rad, b.raan_rad) > tol_angle_rad
        {
            return false;
        }
        let near_circular = a.ecc < ECC_TOL * 2.0;
        let near_equatorial = a.inc_rad < ANGLE_TOL * 2.0;
        if near_circular && near_equatorial {
            angle_diff(a.true_longitude_rad, b.true_longitude_rad) <= tol_angle_rad
        } else if near_circular {
            angle_diff(a.arg_latitude_rad, b.arg_latitude_rad) <= tol_angle_rad
        } else {
            angle_diff(a.aop_rad, b.aop_rad) <= tol_angle_rad
        }
    }

    /// `equals` plus agreement of true anomaly.
    pub fn strictly_equals(&self, other: &Orbit, tol_km: f64, tol_ecc: f64, tol_angle_rad: f64) -> bool {
        self.equals(other, tol_km, tol_ecc, tol_angle_rad)
            && angle_diff(self.ta_rad(), other.ta_rad()) <= tol_angle_rad
    }
}

fn angle_diff(a: f64, b: f64) -> f64 {
    let d = wrap_2pi(a) - wrap_2pi(b);
    wrap_2pi(d).min(2.0 * PI - wrap_2pi(d))
}

/// Eccentricity vector `e = ((v^2 - mu/r) r - (r.v) v) / mu`.
pub fn eccentricity_vector(r: Vector3<f64>, v: Vector3<f64>, mu: f64) -> Vector3<f64> {
    let rmag = r.norm();
    let vmag2 = v.norm_squared();
    ((vmag2 - mu / rmag) * r - (r.dot(&v)) * v) / mu
}

/// RV -> classical orbital elements, per the canonical procedure in the
/// design: h = r x v, node vector n = k^ x h, eccentricity vector e,
/// specific energy xi, a = -mu/(2 xi); inclination/RAAN/AOP/true-anomaly
/// from the usual dot-product/quadrant-disambiguation formulas. Near
/// singular cases are canonicalized rather than left to divide by zero.
pub fn rv_to_coe(r: Vector3<f64>, v: Vector3<f64>, mu: f64) -> Elements {
    let rmag = r.norm();
    let vmag = v.norm();
    let h = r.cross(&v);
    let hmag = h.norm();
    let k_hat = Vector3::new(0.0, 0.0, 1.0);
    let n = k_hat.cross(&h);
    let nmag = n.norm();
    let e_vec = eccentricity_vector(r, v, mu);
    let mut ecc = e_vec.norm();

    let xi = vmag * vmag / 2.0 - mu / rmag;
    let sma_km = if ecc.abs() > 1.0 - 1e-12 && ecc.abs() < 1.0 + 1e-12 {
        f64::INFINITY
    } else {
        -mu / (2.0 * xi)
    };

    let mut inc_rad = safe_acos(h.z / hmag);

    let singular_ecc = ecc < ECC_TOL;
    if singular_ecc {
        // Treated as near-circular but not singular: substitute the
        // tolerance itself to avoid divide-by-zero in downstream control laws.
        ecc = ECC_TOL;
    }
    let singular_inc = inc_rad < ANGLE_TOL;
    if singular_inc {
        inc_rad = ANGLE_TOL;
    }

    let raan_rad = if nmag > 0.0 {
        let mut raan = safe_acos(n.x / nmag);
        if n.y < 0.0 {
            raan = 2.0 * PI - raan;
        }
        raan
    } else {
        0.0
    };

    let aop_rad = if nmag > 0.0 && e_vec.norm() > 1e-12 {
        let mut aop = safe_acos(n.dot(&e_vec) / (nmag * e_vec.norm()));
        if e_vec.z < 0.0 {
            aop = 2.0 * PI - aop;
        }
        aop
    } else {
        0.0
    };

    let ta_rad = if e_vec.norm() > 1e-12 {
        let mut ta = safe_acos(clamp_unit(e_vec.dot(&r) / (e_vec.norm() * rmag)));
        if r.dot(&v) < 0.0 {
            ta = 2.0 * PI - ta;
        }
        ta
    } else {
        0.0
    };

    // True longitude: angle from x-axis to r, valid for near-circular
    // near-equatorial orbits.
    let true_longitude_rad = {
        let mut lambda = safe_acos(clamp_unit(r.x / rmag));
        if r.y < 0.0 {
            lambda = 2.0 * PI - lambda;
        }
        lambda
    };

    // Longitude of periapsis: raan + aop, meaningful for near-circular
    // inclined orbits (raan well defined, aop undefined because e ~ 0).
    let long_of_periapsis_rad = wrap_2pi(raan_rad + aop_rad);
    // Argument of latitude: aop + ta, meaningful for near-circular inclined orbits.
    let arg_latitude_rad = wrap_2pi(aop_rad + ta_rad);

    let (raan_rad, aop_rad, ta_rad) = if singular_ecc && singular_inc {
        (0.0, 0.0, true_longitude_rad)
    } else if singular_ecc {
        (raan_rad, 0.0, arg_latitude_rad)
    } else if singular_inc {
        (0.0, long_of_periapsis_rad, ta_rad)
    } else {
        (raan_rad, aop_rad, ta_rad)
    };

    Elements {
        sma_km,
        ecc,
        inc_rad,
        raan_rad: wrap_2pi(raan_rad),
        aop_rad: wrap_2pi(aop_rad),
        ta_rad: wrap_2pi(ta_rad),
        true_longitude_rad,
        long_of_periapsis_rad,
        arg_latitude_rad,
    }
}

/// Classical orbital elements -> RV via the perifocal-to-inertial path:
/// `p = a(1-e^2)`, perifocal position/velocity, then a 3-1-3 Euler
/// rotation with angles `(-omega, -i, -Omega)`.
pub fn coe_to_rv(
    sma_km: f64,
    ecc: f64,
    inc_rad: f64,
    raan_rad: f64,
    aop_rad: f64,
    ta_rad: f64,
    mu: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let p = sma_km * (1.0 - ecc * ecc);
    let (sin_ta, cos_ta) = ta_rad.sin_cos();
    let r_pqw = Vector3::new(p * cos_ta, p * sin_ta, 0.0) / (1.0 + ecc * cos_ta);
    let v_pqw = Vector3::new(-sin_ta, ecc + cos_ta, 0.0) * (mu / p).sqrt();

    let rot: Matrix3<f64> = euler313(-raan_rad, -inc_rad, -aop_rad);
    (rot * r_pqw, rot * v_pqw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vallado_rv_to_coe() {
        let earth = CelestialBody::earth();
        let r = Vector3::new(6524.834, 6862.875, 6448.296);
        let v = Vector3::new(4.901327, 5.533756, -1.976341);
        let el = rv_to_coe(r, v, earth.mu_km3_s2);
        assert!((el.sma_km - 36127.343).abs() < 0.5);
        assert!((el.ecc - 0.832853).abs() < 1e-5);
        assert!((el.inc_rad.to_degrees() - 87.869126).abs() < 1e-3);
        assert!((el.raan_rad.to_degrees() - 227.898260).abs() < 1e-3);
        assert!((el.aop_rad.to_degrees() - 53.384931).abs() < 1e-3);
        assert!((el.ta_rad.to_degrees() - 92.335157).abs() < 1e-3);
    }

    #[test]
    fn roundtrip_elements_to_rv_to_elements() {
        let earth = CelestialBody::earth();
        let orbit = Orbit::from_elements(8000.0, 0.1, 28.5, 50.0, 30.0, 10.0, 0.0, &earth).unwrap();
        let roundtrip = rv_to_coe(orbit.r(), orbit.v(), earth.mu_km3_s2);
        assert!((roundtrip.sma_km - 8000.0).abs() < crate::math::DISTANCE_TOL_KM);
        assert!((roundtrip.ecc - 0.1).abs() < crate::math::ECC_ROUNDTRIP_TOL);
        assert!(
            (roundtrip.inc_rad.to_degrees() - 28.5).abs() < crate::math::ANGLE_ROUNDTRIP_TOL_DEG
        );
    }

    #[test]
    fn from_elements_rejects_hyperbolic() {
        let earth = CelestialBody::earth();
        assert!(Orbit::from_elements(8000.0, 1.2, 0.0, 0.0, 0.0, 0.0, 0.0, &earth).is_err());
    }

    #[test]
    fn cache_recomputes_after_set_rv() {
        let earth = CelestialBody::earth();
        let mut orbit =
            Orbit::from_elements(8000.0, 0.1, 28.5, 50.0, 30.0, 10.0, 0.0, &earth).unwrap();
        let a1 = orbit.sma_km();
        orbit.set_rv(orbit.r() * 2.0, orbit.v());
        let a2 = orbit.sma_km();
        assert!((a1 - a2).abs() > 1.0);
    }
}
