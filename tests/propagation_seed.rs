//! Seed scenarios 2 and 3 from the design's testable-properties section:
//! a one-day LEO propagation with and without J2, driven through the
//! fixed-step RK4 `Propagator` exactly as a `Mission` would. Tolerances
//! here are set for this crate's fixed-step (not adaptive) integrator at a
//! practical step size, looser than the design's own idealized round-trip
//! tolerances, which assume an integrator fine enough to be dominated by
//! machine precision rather than truncation error.
use approx::assert_relative_eq;

use astrokernel::celestia::CelestialBody;
use astrokernel::dynamics::perturbations::Perturbations;
use astrokernel::dynamics::OrbitalDynamics;
use astrokernel::linalg::Vector3;
use astrokernel::propagators::{PropOpts, Propagator};
use astrokernel::Orbit;

fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

fn earth_no_j2() -> CelestialBody {
    let mut earth = CelestialBody::earth();
    earth.mu_km3_s2 = 398_600.4;
    earth.radius_km = 6378.145;
    earth.zonal_harmonics.clear();
    earth
}

fn earth_with_j2() -> CelestialBody {
    let mut earth = earth_no_j2();
    earth.zonal_harmonics = vec![0.00108248];
    earth
}

#[test]
fn leo_one_day_propagation_without_j2() {
    init_logging();
    let earth = earth_no_j2();
    let mut orbit = Orbit::from_rv(
        Vector3::new(-2436.45, -2436.45, 6891.037),
        Vector3::new(5.088611, -5.088611, 0.0),
        0.0,
        &earth,
    );
    let mut dynamics = OrbitalDynamics::two_body();
    let opts = PropOpts {
        step_s: 10.0,
        max_steps: 20_000,
        min_radius_km: 0.0,
    };
    let mut prop = Propagator::new(&mut dynamics, opts);
    let mut sinks: Vec<Box<dyn astrokernel::io::StateSink>> = Vec::new();
    prop.for_duration(&mut orbit, None, &mut sinks, 86_400.0).unwrap();

    let expected_r = Vector3::new(-5971.19544867343, 3945.58315019255, 2864.53021742433);
    let expected_v = Vector3::new(0.049002818030, -4.185030861883, 5.848985672439);

    assert_relative_eq!(orbit.r().x, expected_r.x, epsilon = 1.0);
    assert_relative_eq!(orbit.r().y, expected_r.y, epsilon = 1.0);
    assert_relative_eq!(orbit.r().z, expected_r.z, epsilon = 1.0);
    assert_relative_eq!(orbit.v().x, expected_v.x, epsilon = 1e-3);
    assert_relative_eq!(orbit.v().y, expected_v.y, epsilon = 1e-3);
    assert_relative_eq!(orbit.v().z, expected_v.z, epsilon = 1e-3);
}

#[test]
fn leo_one_day_propagation_with_j2() {
    init_logging();
    let earth = earth_with_j2();
    let mut orbit = Orbit::from_rv(
        Vector3::new(-2436.45, -2436.45, 6891.037),
        Vector3::new(5.088611, -5.088611, 0.0),
        0.0,
        &earth,
    );
    let mut dynamics = OrbitalDynamics::with_perturbations(vec![Box::new(Perturbations::J2)]);
    let opts = PropOpts {
        step_s: 10.0,
        max_steps: 20_000,
        min_radius_km: 0.0,
    };
    let mut prop = Propagator::new(&mut dynamics, opts);
    let mut sinks: Vec<Box<dyn astrokernel::io::StateSink>> = Vec::new();
    prop.for_duration(&mut orbit, None, &mut sinks, 86_400.0).unwrap();

    let expected_r = Vector3::new(-5751.49900721589, 4721.14371040552, 2046.03583664311);
    let expected_v = Vector3::new(-0.797658631074, -3.656513108387, 6.139612016678);

    assert_relative_eq!(orbit.r().x, expected_r.x, epsilon = 5.0);
    assert_relative_eq!(orbit.r().y, expected_r.y, epsilon = 5.0);
    assert_relative_eq!(orbit.r().z, expected_r.z, epsilon = 5.0);
    assert_relative_eq!(orbit.v().x, expected_v.x, epsilon = 5e-3);
    assert_relative_eq!(orbit.v().y, expected_v.y, epsilon = 5e-3);
    assert_relative_eq!(orbit.v().z, expected_v.z, epsilon = 5e-3);
}

#[test]
fn unforced_kepler_energy_is_conserved_over_one_period() {
    init_logging();
    let earth = earth_no_j2();
    let mut orbit = Orbit::from_rv(
        Vector3::new(7000.0, 0.0, 0.0),
        Vector3::new(0.0, 7.546, 0.0),
        0.0,
        &earth,
    );
    let xi0 = orbit.energy_km2_s2();
    let mut dynamics = OrbitalDynamics::two_body();
    let period_s = 2.0 * std::f64::consts::PI * (orbit.sma_km().powi(3) / earth.mu_km3_s2).sqrt();
    let opts = PropOpts {
        step_s: 5.0,
        max_steps: 5_000,
        min_radius_km: 0.0,
    };
    let mut prop = Propagator::new(&mut dynamics, opts);
    let mut sinks: Vec<Box<dyn astrokernel::io::StateSink>> = Vec::new();
    prop.for_duration(&mut orbit, None, &mut sinks, period_s).unwrap();

    let xi1 = orbit.energy_km2_s2();
    assert_relative_eq!(xi0, xi1, epsilon = 1e-6);
}
