//! Closed-form perturbation accelerations: zonal harmonics (J2, J3), third
//! body point-mass attraction, and cannonball solar radiation pressure.
//! Each is an `AccelModel` so `OrbitalDynamics` can sum an arbitrary list of
//! them without knowing which physical effect it is.
use crate::celestia::{CelestialBody, Orbit};
use crate::dynamics::AccelModel;
use crate::errors::AstroError;
use crate::linalg::{Matrix3, Vector3};

/// Decouples the SRP reflectivity coefficient from any one `Spacecraft`
/// representation: anything that can report its current `Cr` and
/// area-to-mass ratio can be plugged into `Srp`, including a Spacecraft
/// with a frozen Cr, one with Cr as an estimated/propagated parameter, or a
/// bare constant used in unit tests.
pub trait CrSource {
    fn cr(&self) -> f64;
    fn area_to_mass_km2_per_kg(&self) -> f64;
}

/// A fixed Cr/area-to-mass pair, useful for tests and for spacecraft that
/// do not track Cr as a propagated state.
#[derive(Clone, Copy, Debug)]
pub struct FixedCr {
    pub cr: f64,
    pub area_to_mass_km2_per_kg: f64,
}

impl CrSource for FixedCr {
    fn cr(&self) -> f64 {
        self.cr
    }
    fn area_to_mass_km2_per_kg(&self) -> f64 {
        self.area_to_mass_km2_per_kg
    }
}

/// One accumulated perturbation acceleration model. `Perturbations` bundles
/// the subset this mission enables; `OrbitalDynamics` owns a `Vec` of
/// `Box<dyn AccelModel>` built from it so each term can be toggled
/// independently per the design's "each effect opts in" guidance.
pub enum Perturbations {
    J2,
    J3,
    ThirdBody { body: CelestialBody, mu_km3_s2: f64 },
    Srp { cr: FixedCr, sun: CelestialBody },
}

/// Solar flux pressure at 1 AU, N/km^2 (converted from the standard
/// 4.57e-6 N/m^2 value).
const SOLAR_PRESSURE_AT_1AU_N_KM2: f64 = 4.57e-6 * 1.0e6;
const AU_KM: f64 = 149_597_870.7;

impl AccelModel for Perturbations {
    fn acceleration(&self, orbit: &Orbit) -> Result<Vector3<f64>, AstroError> {
        match self {
            Perturbations::J2 => Ok(j2_acceleration(orbit)),
            Perturbations::J3 => Ok(j3_acceleration(orbit)),
            Perturbations::ThirdBody { body, mu_km3_s2 } => {
                third_body_acceleration(orbit, body, *mu_km3_s2)
            }
            Perturbations::Srp { cr, .. } => Ok(srp_acceleration(orbit, cr)),
        }
    }

    fn jacobian(&self, orbit: &Orbit) -> Matrix3<f64> {
        match self {
            Perturbations::J2 => j2_jacobian(orbit),
            Perturbations::J3 => j3_jacobian(orbit),
            // Third-body and SRP Jacobians are algebraically much longer;
            // central differencing the closed-form acceleration above gives
            // the same propagated STM accuracy without transcribing the
            // full partials by hand.
            _ => numerical_jacobian(orbit, |o| self.acceleration(o).unwrap_or_default()),
        }
    }
}

/// `d(acceleration)/d(position)` via central differences, used for the
/// perturbation terms whose closed-form Jacobian is not worth hand-coding.
fn numerical_jacobian(orbit: &Orbit, accel: impl Fn(&Orbit) -> Vector3<f64>) -> Matrix3<f64> {
    let h = 1.0e-3; // km
    let mut jac = Matrix3::zeros();
    for axis in 0..3 {
        let mut r_plus = orbit.r();
        let mut r_minus = orbit.r();
        r_plus[axis] += h;
        r_minus[axis] -= h;
        let mut perturbed_plus = orbit.clone();
        perturbed_plus.set_rv(r_plus, orbit.v());
        let mut perturbed_minus = orbit.clone();
        perturbed_minus.set_rv(r_minus, orbit.v());
        let da = (accel(&perturbed_plus) - accel(&perturbed_minus)) / (2.0 * h);
        jac.set_column(axis, &da);
    }
    jac
}

fn j2_acceleration(orbit: &Orbit) -> Vector3<f64> {
    let j2 = orbit.origin.jn(2);
    if j2 == 0.0 {
        return Vector3::zeros();
    }
    let r = orbit.r();
    let rmag = r.norm();
    let re = orbit.origin.radius_km;
    let mu = orbit.origin.mu_km3_s2;
    let z2_r2 = (r.z / rmag).powi(2);
    let factor = -1.5 * j2 * mu * re * re / rmag.powi(5);
    Vector3::new(
        factor * r.x * (1.0 - 5.0 * z2_r2),
        factor * r.y * (1.0 - 5.0 * z2_r2),
        factor * r.z * (3.0 - 5.0 * z2_r2),
    )
}

/// Closed-form `d(a_J2)/d(r)`, per the standard zonal-harmonic partials
/// (Vallado, *Fundamentals of Astrodynamics and Applications*).
fn j2_jacobian(orbit: &Orbit) -> Matrix3<f64> {
    let j2 = orbit.origin.jn(2);
    if j2 == 0.0 {
        return Matrix3::zeros();
    }
    let r = orbit.r();
    let (x, y, z) = (r.x, r.y, r.z);
    let rmag = r.norm();
    let r2 = rmag * rmag;
    let re = orbit.origin.radius_km;
    let mu = orbit.origin.mu_km3_s2;
    let k = 1.5 * j2 * mu * re * re;
    let r7 = rmag.powi(7);
    let z2 = z * z;

    let dax_dx = k * (1.0 / rmag.powi(5) - 5.0 * (x * x + z2) / r7 + 35.0 * x * x * z2 / (r7 * r2));
    let dax_dy = k * (-5.0 * x * y / r7 + 35.0 * x * y * z2 / (r7 * r2));
    let dax_dz = k * (-15.0 * x * z / r7 + 35.0 * x * z2 * z / (r7 * r2));

    let day_dx = dax_dy;
    let day_dy = k * (1.0 / rmag.powi(5) - 5.0 * (y * y + z2) / r7 + 35.0 * y * y * z2 / (r7 * r2));
    let day_dz = k * (-15.0 * y * z / r7 + 35.0 * y * z2 * z / (r7 * r2));

    let daz_dx = dax_dz;
    let daz_dy = day_dz;
    let daz_dz =
        k * (3.0 / rmag.powi(5) - 30.0 * z2 / r7 + 35.0 * z2 * z2 / (r7 * r2) - 9.0 / rmag.powi(5));

    Matrix3::new(
        -dax_dx, -dax_dy, -dax_dz, -day_dx, -day_dy, -day_dz, -daz_dx, -daz_dy, -daz_dz,
    )
}

fn j3_acceleration(orbit: &Orbit) -> Vector3<f64> {
    let j3 = orbit.origin.jn(3);
    if j3 == 0.0 {
        return Vector3::zeros();
    }
    let r = orbit.r();
    let rmag = r.norm();
    let re = orbit.origin.radius_km;
    let mu = orbit.origin.mu_km3_s2;
    let z = r.z;
    let r2 = rmag * rmag;
    let factor = -2.5 * j3 * mu * re.powi(3) / rmag.powi(7);
    Vector3::new(
        factor * r.x * (3.0 * z - 7.0 * z.powi(3) / r2),
        factor * r.y * (3.0 * z - 7.0 * z.powi(3) / r2),
        factor * (6.0 * z * z - 7.0 * z.powi(4) / r2 - 0.6 * r2),
    )
}

/// Closed-form `d(a_J3)/d(r)`, derived the same way as `j2_jacobian`:
/// differentiate `j3_acceleration` component-wise and negate the sign
/// convention it shares with the J2 partials.
fn j3_jacobian(orbit: &Orbit) -> Matrix3<f64> {
    let j3 = orbit.origin.jn(3);
    if j3 == 0.0 {
        return Matrix3::zeros();
    }
    let r = orbit.r();
    let (x, y, z) = (r.x, r.y, r.z);
    let rmag = r.norm();
    let re = orbit.origin.radius_km;
    let mu = orbit.origin.mu_km3_s2;
    let k = 2.5 * j3 * mu * re.powi(3);
    let r7 = rmag.powi(7);
    let r9 = r7 * rmag * rmag;
    let r11 = r9 * rmag * rmag;
    let z2 = z * z;

    let dax_dx = k * (3.0 * z / r7 - 21.0 * x * x * z / r9 - 7.0 * z2 * z / r9
        + 63.0 * x * x * z2 * z / r11);
    let dax_dy = k * (-21.0 * x * y * z / r9 + 63.0 * x * y * z2 * z / r11);
    let dax_dz = k * (3.0 * x / r7 - 42.0 * x * z2 / r9 + 63.0 * x * z2 * z2 / r11);

    let day_dx = dax_dy;
    let day_dy = k * (3.0 * z / r7 - 21.0 * y * y * z / r9 - 7.0 * z2 * z / r9
        + 63.0 * y * y * z2 * z / r11);
    let day_dz = k * (3.0 * y / r7 - 42.0 * y * z2 / r9 + 63.0 * y * z2 * z2 / r11);

    let daz_dx = dax_dz;
    let daz_dy = day_dz;
    let daz_dz = k * (15.0 * z / r7 - 70.0 * z2 * z / r9 + 63.0 * z2 * z2 * z / r11);

    Matrix3::new(
        -dax_dx, -dax_dy, -dax_dz, -day_dx, -day_dy, -day_dz, -daz_dx, -daz_dy, -daz_dz,
    )
}

/// Third-body point-mass perturbation: the indirect term (acceleration of
/// the central body towards the perturbing body) is subtracted so that
/// only the differential effect on the orbiting body remains. The third
/// body's position relative to `orbit.origin` is obtained by differencing
/// two heliocentric ephemeris queries -- one for the perturbing body, one
/// for the orbit's own origin -- rather than querying the origin's own
/// position twice, which would silently perturb every orbit toward its own
/// central body instead of toward `body`.
fn third_body_acceleration(
    orbit: &Orbit,
    body: &CelestialBody,
    mu_third: f64,
) -> Result<Vector3<f64>, AstroError> {
    let r = orbit.r();
    let ephemeris = orbit
        .origin
        .ephemeris
        .as_ref()
        .or(body.ephemeris.as_ref())
        .ok_or_else(|| {
            AstroError::illegal_state("third-body perturbation requires an ephemeris handle")
        })?;
    let origin_helio = ephemeris.heliocentric_orbit(&orbit.origin, orbit.epoch_s)?.r();
    let r_third = if body.is_star() {
        -origin_helio
    } else {
        ephemeris.heliocentric_orbit(body, orbit.epoch_s)?.r() - origin_helio
    };
    let d = r_third - r;
    let dmag = d.norm();
    let smag = r_third.norm();
    Ok(mu_third * (d / dmag.powi(3) - r_third / smag.powi(3)))
}

fn srp_acceleration(orbit: &Orbit, cr: &FixedCr) -> Vector3<f64> {
    let r = orbit.r();
    let dmag = r.norm();
    let u_hat = r / dmag;
    let pressure = SOLAR_PRESSURE_AT_1AU_N_KM2 * (AU_KM / dmag).powi(2);
    -cr.cr() * cr.area_to_mass_km2_per_kg() * pressure * u_hat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestia::CelestialBody;

    #[test]
    fn j2_vanishes_without_harmonic() {
        let mut body = CelestialBody::sun();
        body.zonal_harmonics.clear();
        let orbit = Orbit::from_rv(Vector3::new(7000.0, 0.0, 0.0), Vector3::new(0.0, 7.5, 0.0), 0.0, &body);
        assert_eq!(j2_acceleration(&orbit), Vector3::zeros());
    }

    #[test]
    fn j2_accelerates_toward_equator_for_polar_orbit() {
        let earth = CelestialBody::earth();
        let orbit = Orbit::from_rv(
            Vector3::new(0.0, 0.0, 7000.0),
            Vector3::new(7.5, 0.0, 0.0),
            0.0,
            &earth,
        );
        let a = j2_acceleration(&orbit);
        assert!(a.z < 0.0, "J2 should pull a polar satellite back toward the equator");
    }
}
