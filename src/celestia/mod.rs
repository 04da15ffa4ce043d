//! Celestial reference data (`CelestialBody`) and the osculating Cartesian
//! state it anchors (`Orbit`).
pub mod body;
pub mod orbit;

pub use body::CelestialBody;
pub use orbit::{coe_to_rv, rv_to_coe, Elements, Orbit};
