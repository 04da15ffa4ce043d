//! B-plane targeting (C10): computes the B-plane coordinates of a
//! hyperbolic flyby trajectory, and a differential corrector that adjusts
//! an initial departure velocity to hit desired B-plane coordinates (and,
//! optionally, a time of flight) via a finite-difference Jacobian and
//! Newton/least-squares iteration -- the design's `AchieveGoals` pattern
//! applied to 2 or 3 simultaneous targets.
use crate::celestia::Orbit;
use crate::errors::{AstroError, AstroResult};
use crate::linalg::Vector3;

/// B-plane coordinates of a hyperbolic trajectory relative to its flyby
/// body, computed from the osculating state at closest approach (or any
/// point on the incoming hyperbola -- B-plane coordinates are constants
/// of the unperturbed two-body hyperbola).
#[derive(Clone, Copy, Debug)]
pub struct BPlaneTarget {
    pub b_dot_t_km: f64,
    pub b_dot_r_km: f64,
    /// Optional third target: time of flight to periapsis, seconds. When
    /// `Some`, the corrector solves a 3-target/3-unknown system; when
    /// `None`, a 2-target/3-unknown least-squares system.
    pub time_of_flight_s: Option<f64>,
}

/// B-plane coordinates computed from a hyperbolic orbit's current state,
/// using the simplified reference frame `T_hat = normalize(S_hat x k_hat)`,
/// `R_hat = S_hat x T_hat` (k_hat the central body's north pole) when no
/// explicit target-body frame is supplied.
pub fn b_plane_coordinates(orbit: &Orbit) -> AstroResult<(f64, f64)> {
    let mu = orbit.origin.mu_km3_s2;
    let r = orbit.r();
    let v = orbit.v();
    let h = r.cross(&v);
    let hmag = h.norm();
    let e_vec = crate::celestia::orbit::eccentricity_vector(r, v, mu);
    let ecc = e_vec.norm();
    if ecc <= 1.0 + 1e-9 {
        return Err(AstroError::illegal_state(
            "B-plane coordinates require a hyperbolic (e > 1) trajectory",
        ));
    }
    let a = -mu / (v.norm_squared() - 2.0 * mu / r.norm());
    let v_inf = (-mu / a).sqrt();

    let p_hat = e_vec / ecc;
    let h_hat = h / hmag;
    let q_hat = h_hat.cross(&p_hat);
    let theta_inf = (-1.0 / ecc).acos();
    let s_hat = p_hat * theta_inf.cos() + q_hat * theta_inf.sin();

    let k_hat = Vector3::new(0.0, 0.0, 1.0);
    let t_hat = {
        let t = s_hat.cross(&k_hat);
        t / t.norm()
    };
    let r_hat = s_hat.cross(&t_hat);

    let b_mag = a.abs() * (ecc * ecc - 1.0).sqrt();
    let b_hat = h_hat.cross(&s_hat);
    let b_vec = b_mag * b_hat;
    let _ = v_inf;

    Ok((b_vec.dot(&t_hat), b_vec.dot(&r_hat)))
}

/// Differentially corrects a departure velocity perturbation to hit a
/// `BPlaneTarget`. `propagate` maps a trial departure orbit to the
/// resulting flyby-body-centric hyperbolic state (normally: apply the
/// trial `delta_v` to the nominal departure state, then propagate to the
/// flyby body's sphere of influence).
pub struct BPlaneCorrector {
    pub max_iterations: u32,
    pub tol_km: f64,
}

impl Default for BPlaneCorrector {
    fn default() -> Self {
        BPlaneCorrector {
            max_iterations: 25,
            tol_km: 1.0,
        }
    }
}

impl BPlaneCorrector {
    /// Returns the converged departure-velocity correction `delta_v`
    /// (km/s) such that `propagate(nominal_v + delta_v)` lands within
    /// `tol_km` of `target`.
    pub fn achieve(
        &self,
        nominal_v: Vector3<f64>,
        target: &BPlaneTarget,
        propagate: impl Fn(Vector3<f64>) -> AstroResult<Orbit>,
    ) -> AstroResult<Vector3<f64>> {
        let mut dv = Vector3::zeros();
        let step = 1.0e-5; // km/s finite-difference perturbation

        for iter in 0..self.max_iterations {
            let flyby = propagate(nominal_v + dv)?;
            let (bt, br) = b_plane_coordinates(&flyby)?;
            let residual = self.residual(target, bt, br, flyby.epoch_s);

            if residual.iter().all(|r| r.abs() < self.tol_km) {
                return Ok(dv);
            }

            // Finite-difference Jacobian d(residual)/d(dv), one column per
            // velocity component.
            let mut jac = Vec::with_capacity(3);
            for axis in 0..3 {
                let mut perturbed = dv;
                perturbed[axis] += step;
                let flyby_p = propagate(nominal_v + perturbed)?;
                let (bt_p, br_p) = b_plane_coordinates(&flyby_p)?;
                let residual_p = self.residual(target, bt_p, br_p, flyby_p.epoch_s);
                jac.push((residual_p - residual) / step);
            }

            let correction = solve_least_squares(&jac, &(-residual));
            dv += correction;

            if iter == self.max_iterations - 1 {
                return Err(AstroError::non_convergence(
                    self.max_iterations,
                    "B-plane differential correction did not converge",
                ));
            }
        }
        Ok(dv)
    }

    fn residual(&self, target: &BPlaneTarget, bt: f64, br: f64, epoch_s: f64) -> nalgebra::DVector<f64> {
        let mut v = vec![bt - target.b_dot_t_km, br - target.b_dot_r_km];
        if let Some(tof) = target.time_of_flight_s {
            v.push(epoch_s - tof);
        }
        nalgebra::DVector::from_vec(v)
    }
}

/// Solves `J dv = b` in the least-squares sense via the normal equations
/// `J^T J dv = J^T b`. `jac` holds one 2- or 3-row column per velocity
/// component (3 columns always; 2 or 3 rows depending on whether a time-
/// of-flight target is active).
fn solve_least_squares(jac_columns: &[nalgebra::DVector<f64>], b: &nalgebra::DVector<f64>) -> Vector3<f64> {
    let rows = b.len();
    let mut j = nalgebra::DMatrix::<f64>::zeros(rows, 3);
    for (col, data) in jac_columns.iter().enumerate() {
        for row in 0..rows {
            j[(row, col)] = data[row];
        }
    }
    let jt = j.transpose();
    let jtj = &jt * &j;
    let jtb = &jt * b;
    let solved = jtj
        .lu()
        .solve(&jtb)
        .unwrap_or_else(|| nalgebra::DVector::from_element(3, 0.0));
    Vector3::new(solved[0], solved[1], solved[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestia::CelestialBody;

    #[test]
    fn b_plane_rejects_elliptical_orbit() {
        let earth = CelestialBody::earth();
        let orbit = Orbit::from_rv(Vector3::new(7000.0, 0.0, 0.0), Vector3::new(0.0, 7.5, 0.0), 0.0, &earth);
        assert!(b_plane_coordinates(&orbit).is_err());
    }

    #[test]
    fn b_plane_accepts_hyperbolic_orbit() {
        let earth = CelestialBody::earth();
        let orbit = Orbit::from_rv(
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(0.0, 15.0, 1.0),
            0.0,
            &earth,
        );
        assert!(orbit.ecc() > 1.0);
        assert!(b_plane_coordinates(&orbit).is_ok());
    }
}
