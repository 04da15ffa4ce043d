//! Two-body dynamics plus an arbitrary stack of perturbation accelerations
//! and an optional thrust control law, combined into the single right-hand
//! side the propagator's RK4 driver integrates. Also assembles the closed-
//! form STM derivative `dPhi/dt = A * Phi` the design calls for in place of
//! auto-differentiating the equations of motion.
use crate::celestia::Orbit;
use crate::dynamics::thrustctrl::ThrustControl;
use crate::dynamics::AccelModel;
use crate::errors::AstroResult;
use crate::linalg::{Matrix3, Matrix6, Stm, Vector3};

/// The combined equations of motion integrated by the propagator: two-body
/// gravity, any number of perturbation force models, and at most one
/// active thrust control law (continuous low-thrust or impulsive-by-proxy,
/// per the control law's own direction logic).
pub struct OrbitalDynamics {
    pub accel_models: Vec<Box<dyn AccelModel>>,
    pub thrust: Option<ThrustControl>,
    /// Commanded thrust acceleration magnitude, km/s^2, applied along
    /// whatever direction the active `thrust` law returns this step.
    pub thrust_accel_km_s2: f64,
    /// The active thrust law's unit direction, latched once per integrator
    /// step by `latch_thrust_direction` and reused across every RK4
    /// sub-stage. Stateful laws (e.g. `Hohmann`) carry an internal phase
    /// that advances on each `direction` call; querying them once per
    /// accepted step (rather than once per sub-stage) keeps that phase
    /// machine synchronized with the propagator's notion of "a step".
    thrust_dir_cache: Option<Vector3<f64>>,
}

impl OrbitalDynamics {
    pub fn two_body() -> Self {
        OrbitalDynamics {
            accel_models: Vec::new(),
            thrust: None,
            thrust_accel_km_s2: 0.0,
            thrust_dir_cache: None,
        }
    }

    pub fn with_perturbations(accel_models: Vec<Box<dyn AccelModel>>) -> Self {
        OrbitalDynamics {
            accel_models,
            thrust: None,
            thrust_accel_km_s2: 0.0,
            thrust_dir_cache: None,
        }
    }

    /// Queries the active thrust law's direction exactly once, against
    /// `orbit`'s state at the start of the step, and caches it for every
    /// `acceleration` call made during that step's RK4 sub-stages.
    pub fn latch_thrust_direction(&mut self, orbit: &Orbit) {
        self.thrust_dir_cache = self.thrust.as_mut().and_then(|t| t.direction(orbit));
    }

    /// Whether the latched thrust direction for the current step actually
    /// commands a burn (as opposed to a coasting law that returned `None`).
    pub fn is_thrusting(&self) -> bool {
        self.thrust_dir_cache.is_some()
    }

    /// Total inertial-frame acceleration: two-body point mass, every
    /// enabled perturbation term, and the latched thrust direction (if
    /// any), scaled by the current commanded thrust acceleration magnitude.
    pub fn acceleration(&mut self, orbit: &Orbit) -> AstroResult<Vector3<f64>> {
        let mut a = two_body_acceleration(orbit);
        for model in &self.accel_models {
            a += model.acceleration(orbit)?;
        }
        if let Some(dir) = self.thrust_dir_cache {
            a += dir * self.thrust_accel_km_s2;
        }
        Ok(a)
    }

    /// The 6x6 (or 7x7, with Cr as an augmented state) variational matrix
    /// `A` such that `dPhi/dt = A . Phi`. The thrust term is not included
    /// in `A`: closed-loop control laws are treated as non-differentiable
    /// switching logic, consistent with the design's choice to linearize
    /// only the two-body-plus-perturbations dynamics for STM propagation.
    pub fn variational_matrix(&self, orbit: &Orbit, augmented: bool) -> Matrix6<f64> {
        let mut g = two_body_jacobian(orbit);
        for model in &self.accel_models {
            g += model.jacobian(orbit);
        }
        let mut a = Matrix6::<f64>::zeros();
        for i in 0..3 {
            a[(i, i + 3)] = 1.0;
        }
        for i in 0..3 {
            for j in 0..3 {
                a[(i + 3, j)] = g[(i, j)];
            }
        }
        let _ = augmented; // 7th row/col (Cr) contributes no coupling back into r/v in this model
        a
    }

    /// `dPhi/dt` for the current `Stm` representation.
    pub fn stm_derivative(&self, orbit: &Orbit, phi: &Stm) -> Stm {
        match phi {
            Stm::Six(m) => Stm::Six(self.variational_matrix(orbit, false) * m),
            Stm::Seven(m) => {
                let a6 = self.variational_matrix(orbit, true);
                let mut a7 = crate::linalg::Stm7::zeros();
                for i in 0..6 {
                    for j in 0..6 {
                        a7[(i, j)] = a6[(i, j)];
                    }
                }
                Stm::Seven(a7 * m)
            }
        }
    }
}

fn two_body_acceleration(orbit: &Orbit) -> Vector3<f64> {
    let r = orbit.r();
    let rmag = orbit.rmag();
    -orbit.origin.mu_km3_s2 * r / rmag.powi(3)
}

/// `d(a_two_body)/dr = -mu/r^3 I + 3 mu r r^T / r^5`.
fn two_body_jacobian(orbit: &Orbit) -> Matrix3<f64> {
    let r = orbit.r();
    let rmag = orbit.rmag();
    let mu = orbit.origin.mu_km3_s2;
    let identity = Matrix3::<f64>::identity();
    (-mu / rmag.powi(3)) * identity + (3.0 * mu / rmag.powi(5)) * (r * r.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestia::CelestialBody;

    #[test]
    fn two_body_acceleration_points_inward() {
        let earth = CelestialBody::earth();
        let orbit = Orbit::from_rv(Vector3::new(7000.0, 0.0, 0.0), Vector3::new(0.0, 7.5, 0.0), 0.0, &earth);
        let a = two_body_acceleration(&orbit);
        assert!(a.x < 0.0);
        assert!((a.y).abs() < 1e-12);
    }

    #[test]
    fn variational_matrix_has_identity_velocity_block() {
        let earth = CelestialBody::earth();
        let orbit = Orbit::from_rv(Vector3::new(7000.0, 0.0, 0.0), Vector3::new(0.0, 7.5, 0.0), 0.0, &earth);
        let dynamics = OrbitalDynamics::two_body();
        let a = dynamics.variational_matrix(&orbit, false);
        assert_eq!(a[(0, 3)], 1.0);
        assert_eq!(a[(1, 4)], 1.0);
        assert_eq!(a[(2, 5)], 1.0);
    }
}
