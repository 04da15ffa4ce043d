//! Equations of motion: two-body + perturbations (`perturbations`), the
//! combined Cartesian + STM dynamics the propagator integrates
//! (`orbital`), and the closed-loop thrust control law library
//! (`thrustctrl`).
pub mod orbital;
pub mod perturbations;
pub mod thrustctrl;

pub use orbital::OrbitalDynamics;
pub use perturbations::{CrSource, Perturbations};
pub use thrustctrl::{CombinerKind, OptimalOrbitTarget, ThrustControl};

use crate::errors::AstroError;
use crate::linalg::Matrix3;
use crate::linalg::Vector3;

/// A force model contributing an acceleration (and, for STM propagation,
/// its Jacobian with respect to position) additively to `OrbitalDynamics`.
/// Mirrors the teacher's `AccelModel` trait, minus the hyperdual
/// auto-differentiation machinery: this kernel's Jacobians are the closed
/// forms the design specifies, not automatically differentiated ones.
pub trait AccelModel: Send + Sync {
    /// Acceleration contributed by this force model at the given osculating
    /// state, km/s^2.
    fn acceleration(&self, orbit: &crate::celestia::Orbit) -> Result<Vector3<f64>, AstroError>;

    /// `d(acceleration)/d(position)`, a 3x3 block assembled in closed form
    /// and summed into the propagator's STM derivative.
    fn jacobian(&self, orbit: &crate::celestia::Orbit) -> Matrix3<f64>;
}
