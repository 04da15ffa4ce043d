use serde_derive::{Deserialize, Serialize};
use std::sync::Arc;
use typed_builder::TypedBuilder;

use crate::ephemeris::EphemerisHandle;

/// An immutable descriptor of a gravitating body. Two bodies are
/// value-equal when name, radius, mu, semi-major axis, SOI and J2 all
/// match -- per the design, a CelestialBody is a pure reference-data leaf,
/// not something that accumulates state over a run.
#[derive(Clone, Debug, Serialize, Deserialize, TypedBuilder)]
pub struct CelestialBody {
    pub name: String,
    /// Equatorial radius, km.
    pub radius_km: f64,
    /// Gravitational parameter, km^3/s^2.
    pub mu_km3_s2: f64,
    /// Heliocentric semi-major axis, km (0 for the Sun itself).
    #[builder(default = 0.0)]
    pub sma_km: f64,
    /// Axial tilt, radians.
    #[builder(default = 0.0)]
    pub axial_tilt_rad: f64,
    /// Ecliptic inclination, radians.
    #[builder(default = 0.0)]
    pub ecliptic_inclination_rad: f64,
    /// Sphere-of-influence radius, km. By convention the central star's SOI
    /// is `-1.0`, which `Orbit::to_x_centric` uses to decide whether a
    /// frame switch is an "outward" (add heliocentric state) or "inward"
    /// (subtract target's heliocentric state) transformation.
    #[builder(default = -1.0)]
    pub soi_km: f64,
    /// Zonal harmonics J2..J4, indexed from J2 at position 0. Unsupported
    /// orders return 0 via `jn`.
    #[builder(default)]
    pub zonal_harmonics: Vec<f64>,
    /// Lazily-initialized ephemeris handle; shared because many Orbits may
    /// reference the same body concurrently (read-only once populated).
    #[builder(default, setter(strip_option))]
    #[serde(skip)]
    pub ephemeris: Option<Arc<EphemerisHandle>>,
}

impl CelestialBody {
    /// Returns the n-th zonal harmonic (J2 = jn(2), J3 = jn(3), ...), or 0.0
    /// for an order this body does not carry data for.
    pub fn jn(&self, n: usize) -> f64 {
        if n < 2 {
            return 0.0;
        }
        self.zonal_harmonics.get(n - 2).copied().unwrap_or(0.0)
    }

    /// True when this body is the system's central star (by SOI convention).
    pub fn is_star(&self) -> bool {
        self.soi_km < 0.0
    }

    pub fn earth() -> Self {
        CelestialBody::builder()
            .name("Earth".to_string())
            .radius_km(6378.1363)
            .mu_km3_s2(398_600.4415)
            .sma_km(149_598_023.0)
            .soi_km(924_645.0)
            .zonal_harmonics(vec![0.00108248, -2.5327e-6])
            .build()
    }

    pub fn sun() -> Self {
        CelestialBody::builder()
            .name("Sun".to_string())
            .radius_km(695_508.0)
            .mu_km3_s2(132_712_440_018.0)
            .soi_km(-1.0)
            .build()
    }

    pub fn mars() -> Self {
        CelestialBody::builder()
            .name("Mars".to_string())
            .radius_km(3396.19)
            .mu_km3_s2(42_828.314258067)
            .sma_km(227_939_200.0)
            .soi_km(577_223.0)
            .zonal_harmonics(vec![0.00196045])
            .build()
    }
}

impl PartialEq for CelestialBody {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && (self.radius_km - other.radius_km).abs() < 1e-9
            && (self.mu_km3_s2 - other.mu_km3_s2).abs() < 1e-9
            && (self.sma_km - other.sma_km).abs() < 1e-6
            && (self.soi_km - other.soi_km).abs() < 1e-6
            && (self.jn(2) - other.jn(2)).abs() < 1e-12
    }
}
