//! Error taxonomy for the kernel, grounded on the `thiserror` usage already
//! present in the teacher's dependency stack (and mirrored by the
//! `DepartureError`-style enums seen across the wider mission-design
//! example pack).
use crate::linalg::Vector3;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AstroError {
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("failed to converge after {iterations} iterations: {context}")]
    NonConvergence { iterations: u32, context: String },

    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("numerical failure at t={epoch_s:.3}s near r={position:?}: {context}")]
    NumericalFailure {
        epoch_s: f64,
        position: Vector3<f64>,
        context: String,
    },
}

impl AstroError {
    pub fn illegal_argument<S: Into<String>>(msg: S) -> Self {
        AstroError::IllegalArgument(msg.into())
    }

    pub fn illegal_state<S: Into<String>>(msg: S) -> Self {
        AstroError::IllegalState(msg.into())
    }

    pub fn resource_exhaustion<S: Into<String>>(msg: S) -> Self {
        AstroError::ResourceExhaustion(msg.into())
    }

    pub fn non_convergence<S: Into<String>>(iterations: u32, context: S) -> Self {
        AstroError::NonConvergence {
            iterations,
            context: context.into(),
        }
    }

    pub fn numerical_failure<S: Into<String>>(
        epoch_s: f64,
        position: Vector3<f64>,
        context: S,
    ) -> Self {
        AstroError::NumericalFailure {
            epoch_s,
            position,
            context: context.into(),
        }
    }
}

pub type AstroResult<T> = Result<T, AstroError>;
