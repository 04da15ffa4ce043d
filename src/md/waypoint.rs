//! Waypoints (C6): discrete mission milestones a `Mission` marches through
//! in order, each translating into a thrust control law plus a completion
//! test the Mission driver polls after every propagator step.
use crate::celestia::Orbit;
use crate::dynamics::thrustctrl::{HohmannTransfer, OptimalOrbitTarget, ThrustControl};

/// One mission milestone. `control_law` builds the `ThrustControl` this
/// waypoint drives with; `achieved` is the Mission driver's stopping test,
/// polled once per accepted propagator step.
pub enum Waypoint {
    /// Coast, doing nothing, until `duration_s` of mission-elapsed time
    /// has passed since the waypoint began.
    Loiter { duration_s: f64, elapsed_s: f64 },
    /// Thrust tangentially outward until the orbital radius reaches
    /// `target_radius_km`.
    ReachDistance { target_radius_km: f64, outbound: bool },
    /// Thrust tangentially outward indefinitely (an open-ended waypoint;
    /// only removed by an explicit mission abort, never "achieved").
    OutwardSpiral,
    /// Drive one or more orbital elements to target values via a
    /// Ruggiero/Naasz combiner.
    OrbitTarget(OptimalOrbitTarget),
    /// Execute a discrete two-burn Hohmann transfer.
    HohmannTransfer(HohmannTransfer),
    /// Thrust antitangentially (braking) until the orbit drops below
    /// escape, capturing a hyperbolic/parabolic arrival into a bound
    /// ellipse.
    ToElliptical,
}

impl Waypoint {
    pub fn control_law(&self) -> ThrustControl {
        match self {
            Waypoint::Loiter { .. } => ThrustControl::Coast,
            Waypoint::ReachDistance { outbound, .. } => ThrustControl::Tangential {
                reversed: !outbound,
            },
            Waypoint::OutwardSpiral => ThrustControl::Tangential { reversed: false },
            Waypoint::OrbitTarget(combiner) => ThrustControl::OptimalOrbitTarget(
                OptimalOrbitTarget::new(combiner.kind, combiner.goals.clone()),
            ),
            Waypoint::HohmannTransfer(h) => ThrustControl::Hohmann(*h),
            Waypoint::ToElliptical => ThrustControl::AntiTangential,
        }
    }

    /// Advances any time-based internal bookkeeping (`Loiter`'s elapsed
    /// counter) by `dt_s` seconds.
    pub fn advance(&mut self, dt_s: f64) {
        if let Waypoint::Loiter { elapsed_s, .. } = self {
            *elapsed_s += dt_s;
        }
    }

    /// True once this waypoint's completion condition holds.
    pub fn achieved(&self, orbit: &Orbit) -> bool {
        match self {
            Waypoint::Loiter { duration_s, elapsed_s } => elapsed_s >= duration_s,
            Waypoint::ReachDistance { target_radius_km, outbound } => {
                if *outbound {
                    orbit.rmag() >= *target_radius_km
                } else {
                    orbit.rmag() <= *target_radius_km
                }
            }
            Waypoint::OutwardSpiral => false,
            Waypoint::OrbitTarget(combiner) => combiner.achieved(orbit),
            Waypoint::HohmannTransfer(h) => {
                h.phase == crate::dynamics::thrustctrl::HohmannPhase::Done
            }
            Waypoint::ToElliptical => orbit.ecc() < 1.0,
        }
    }
}
