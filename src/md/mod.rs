//! Mission design: `Spacecraft` (C7), `Waypoint` (C6), the `Mission`
//! driver (state/time bookkeeping atop the propagator), the Lambert
//! boundary-value solver (C9), and the B-plane targeting corrector (C10).
pub mod bplane;
pub mod lambert;
pub mod mission;
pub mod porkchop;
pub mod spacecraft;
pub mod waypoint;

pub use bplane::{BPlaneCorrector, BPlaneTarget};
pub use lambert::{lambert, LambertSolution, TransferKind};
pub use mission::Mission;
pub use porkchop::{scan as porkchop_scan, PorkchopCell};
pub use spacecraft::{Cargo, DeferredAction, Spacecraft, Thruster};
pub use waypoint::Waypoint;
