//! Thin re-export layer over `nalgebra` so the rest of the crate depends on
//! one place for its linear-algebra types. Mirrors the pattern used by most
//! astrodynamics crates of pinning a `dimensions`/`linalg` module rather than
//! importing `nalgebra` piecemeal everywhere.
extern crate nalgebra as na;

pub use na::{Matrix3, Matrix6, SMatrix, SVector, Vector3, Vector6};

/// 7-component acceleration/derivative vector: position derivatives (always
/// zero in the perturbation interface), velocity derivatives, and a
/// seventh slot reserved for fuel/Cr derivatives.
pub type Vector7<T> = SVector<T, 7>;

/// 6x6 state transition matrix (position/velocity only).
pub type Stm6 = Matrix6<f64>;

/// 7x7 state transition matrix, used when the SRP coefficient `Cr` is
/// carried as an augmented state dimension.
pub type Stm7 = SMatrix<f64, 7, 7>;

/// Either a 6x6 or 7x7 STM depending on whether SRP/Cr augmentation is enabled.
#[derive(Clone, Copy, Debug)]
pub enum Stm {
    Six(Stm6),
    Seven(Stm7),
}

impl Stm {
    pub fn identity(augmented: bool) -> Self {
        if augmented {
            Stm::Seven(Stm7::identity())
        } else {
            Stm::Six(Matrix6::identity())
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Stm::Six(_) => 6,
            Stm::Seven(_) => 7,
        }
    }

    /// Composition `Phi(t2, t0) = Phi(t2, t1) * Phi(t1, t0)`, per the design
    /// note that the integrator only ever carries `Phi(t, t0)` as state; any
    /// `Phi(t_k, t_{k-1})` a consumer wants is reconstructed on demand.
    pub fn compose(&self, earlier: &Stm) -> Option<Stm> {
        match (self, earlier) {
            (Stm::Six(a), Stm::Six(b)) => Some(Stm::Six(a * b)),
            (Stm::Seven(a), Stm::Seven(b)) => Some(Stm::Seven(a * b)),
            _ => None,
        }
    }

    /// `Phi(t_k, t_{k-1}) = Phi(t_k, t_0) . Phi(t_{k-1}, t_0)^{-1}`
    pub fn segment_from(&self, previous: &Stm) -> Option<Stm> {
        match (self, previous) {
            (Stm::Six(a), Stm::Six(b)) => b.try_inverse().map(|binv| Stm::Six(a * binv)),
            (Stm::Seven(a), Stm::Seven(b)) => b.try_inverse().map(|binv| Stm::Seven(a * binv)),
            _ => None,
        }
    }

    pub fn as_six(&self) -> Option<Matrix6<f64>> {
        match self {
            Stm::Six(m) => Some(*m),
            Stm::Seven(_) => None,
        }
    }

    /// `self + scale * other`, used by the RK4 driver to combine STM
    /// derivative stages without matching on the variant at every call site.
    pub fn axpy(&self, scale: f64, other: &Stm) -> Option<Stm> {
        match (self, other) {
            (Stm::Six(a), Stm::Six(b)) => Some(Stm::Six(a + scale * b)),
            (Stm::Seven(a), Stm::Seven(b)) => Some(Stm::Seven(a + scale * b)),
            _ => None,
        }
    }
}
