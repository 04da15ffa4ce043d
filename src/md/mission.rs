//! The Mission driver: owns a `Spacecraft`, its `Orbit`, an ordered queue
//! of `Waypoint`s, and the `OrbitalDynamics`/`Propagator` pairing that
//! advances them together, draining the spacecraft's deferred-action
//! queue between propagator calls per the design's reentrancy guidance
//! (never mutate the active control law from inside a propagator step).
//! Calendar bookkeeping (`start_epoch`/`stop_epoch`/`current_epoch`) uses
//! `hifitime::Epoch` at this boundary, per the design's "epochs UTC" I/O
//! convention, while the propagator itself keeps advancing the `Orbit`'s
//! internal `epoch_s` in plain seconds.
use std::sync::mpsc::Receiver;

use hifitime::{Duration, Epoch};
use log::info;

use crate::celestia::{CelestialBody, Orbit};
use crate::dynamics::OrbitalDynamics;
use crate::errors::AstroResult;
use crate::io::StateSink;
use crate::md::spacecraft::Spacecraft;
use crate::md::waypoint::Waypoint;
use crate::propagators::{PropOpts, Propagator};

/// 10-year-beyond-start watchdog cap, per the design's last-resort cancel.
const WATCHDOG_YEARS: f64 = 10.0;
const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// An immutable snapshot of a Mission's state at one epoch, handed to
/// sinks and test assertions without exposing the live `Orbit`/`Spacecraft`.
#[derive(Clone, Debug)]
pub struct State {
    pub epoch_s: f64,
    pub r_km: [f64; 3],
    pub v_km_s: [f64; 3],
    pub fuel_mass_kg: f64,
}

impl From<(&Orbit, &Spacecraft)> for State {
    fn from((orbit, sc): (&Orbit, &Spacecraft)) -> Self {
        let r = orbit.r();
        let v = orbit.v();
        State {
            epoch_s: orbit.epoch_s,
            r_km: [r.x, r.y, r.z],
            v_km_s: [v.x, v.y, v.z],
            fuel_mass_kg: sc.fuel_mass_kg,
        }
    }
}

pub struct Mission {
    pub orbit: Orbit,
    pub spacecraft: Spacecraft,
    pub dynamics: OrbitalDynamics,
    pub waypoints: Vec<Waypoint>,
    pub prop_opts: PropOpts,
    pub start_epoch: Epoch,
    pub stop_epoch: Epoch,
    pub current_epoch: Epoch,
    /// Set once `self.orbit.rmag()` falls below the central body's radius;
    /// cleared once it climbs back above `1.1 * radius`. Informational --
    /// propagation continues unless the caller checks this and stops.
    pub collided: bool,
    /// External cancel signal; the next `run` iteration that observes a
    /// pending message on this channel stops and returns `Ok(())`
    /// immediately, per the design's cooperative-cancellation model.
    stop_signal: Option<Receiver<()>>,
    current_waypoint: usize,
}

impl Mission {
    pub fn new(orbit: Orbit, spacecraft: Spacecraft, dynamics: OrbitalDynamics) -> Self {
        let start_epoch = Epoch::from_tai_seconds(orbit.epoch_s);
        Mission {
            orbit,
            spacecraft,
            dynamics,
            waypoints: Vec::new(),
            prop_opts: PropOpts::default(),
            start_epoch,
            stop_epoch: start_epoch + Duration::from_seconds(WATCHDOG_YEARS * SECONDS_PER_YEAR),
            current_epoch: start_epoch,
            collided: false,
            stop_signal: None,
            current_waypoint: 0,
        }
    }

    /// Sets an explicit stop epoch (rather than the default 10-year
    /// watchdog cap), per the design's "current DT past stop DT" stop
    /// condition.
    pub fn with_stop_epoch(mut self, stop_epoch: Epoch) -> Self {
        self.stop_epoch = stop_epoch;
        self
    }

    /// Registers the receiving half of an external cancel channel. The
    /// next `run` iteration that finds a message waiting stops early.
    pub fn with_stop_signal(mut self, stop_signal: Receiver<()>) -> Self {
        self.stop_signal = Some(stop_signal);
        self
    }

    pub fn central_body(&self) -> &CelestialBody {
        &self.orbit.origin
    }

    pub fn state(&self) -> State {
        State::from((&self.orbit, &self.spacecraft))
    }

    fn stop_requested(&self) -> bool {
        self.stop_signal
            .as_ref()
            .map(|rx| rx.try_recv().is_ok())
            .unwrap_or(false)
    }

    fn update_collision_flag(&mut self) {
        let radius = self.orbit.origin.radius_km;
        let rmag = self.orbit.rmag();
        if rmag < radius {
            if !self.collided {
                log::warn!(
                    "collision with {}: r={:.3} km < radius {:.3} km",
                    self.orbit.origin.name,
                    rmag,
                    radius
                );
            }
            self.collided = true;
        } else if rmag > 1.1 * radius {
            self.collided = false;
        }
    }

    /// Runs through `self.waypoints` in order, propagating in `step_s`-
    /// sized increments between achievement checks, applying the active
    /// waypoint's control law, and draining the spacecraft's deferred
    /// action queue after each waypoint completes. Stops (returning
    /// early, successfully) once every waypoint is achieved, `max_total_s`
    /// mission-elapsed seconds have passed, `current_epoch` passes
    /// `stop_epoch`, or an external cancel signal arrives.
    pub fn run(&mut self, sinks: &mut [Box<dyn StateSink>], max_total_s: f64) -> AstroResult<()> {
        let mut elapsed = 0.0;
        while self.current_waypoint < self.waypoints.len()
            && elapsed < max_total_s
            && self.current_epoch < self.stop_epoch
            && !self.stop_requested()
        {
            self.dynamics.thrust = Some(self.waypoints[self.current_waypoint].control_law());
            self.dynamics.thrust_accel_km_s2 = self.spacecraft.thrust_accel_km_s2();

            {
                let mut prop = Propagator::new(&mut self.dynamics, self.prop_opts);
                prop.for_duration(&mut self.orbit, None, sinks, self.prop_opts.step_s)?;
            }
            if self.dynamics.is_thrusting() {
                self.spacecraft.deplete_fuel(self.prop_opts.step_s)?;
            }
            elapsed += self.prop_opts.step_s;
            self.current_epoch += Duration::from_seconds(self.prop_opts.step_s);
            self.update_collision_flag();
            self.waypoints[self.current_waypoint].advance(self.prop_opts.step_s);

            if self.waypoints[self.current_waypoint].achieved(&self.orbit) {
                info!(
                    "waypoint {} achieved at t={:.3}s",
                    self.current_waypoint, self.orbit.epoch_s
                );
                self.current_waypoint += 1;
                let mut control = self.dynamics.thrust.take();
                self.spacecraft.apply_deferred(&mut control);
                self.dynamics.thrust = control;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestia::CelestialBody;
    use crate::linalg::Vector3;

    fn leo_mission() -> Mission {
        let earth = CelestialBody::earth();
        let orbit = Orbit::from_rv(
            Vector3::new(7000.0, 0.0, 0.0),
            Vector3::new(0.0, 7.5, 0.0),
            0.0,
            &earth,
        );
        let spacecraft = Spacecraft::new(500.0, 50.0);
        Mission::new(orbit, spacecraft, OrbitalDynamics::two_body())
    }

    #[test]
    fn watchdog_stop_epoch_is_ten_years_out() {
        let mission = leo_mission();
        let delta = mission.stop_epoch - mission.start_epoch;
        assert!((delta.to_seconds() - WATCHDOG_YEARS * SECONDS_PER_YEAR).abs() < 1.0);
    }

    #[test]
    fn stop_signal_halts_run_immediately() {
        use std::sync::mpsc::channel;
        let (tx, rx) = channel();
        tx.send(()).unwrap();
        let mut mission = leo_mission().with_stop_signal(rx);
        mission.waypoints.push(Waypoint::Loiter {
            duration_s: 1_000_000.0,
            elapsed_s: 0.0,
        });
        let mut sinks: Vec<Box<dyn StateSink>> = vec![Box::new(crate::io::NullSink)];
        mission.run(&mut sinks, 10_000.0).unwrap();
        assert_eq!(mission.current_epoch, mission.start_epoch);
    }

    #[test]
    fn collision_flag_sets_below_radius_and_clears_above() {
        let mut mission = leo_mission();
        mission.orbit.set_rv(Vector3::new(1000.0, 0.0, 0.0), mission.orbit.v());
        mission.update_collision_flag();
        assert!(mission.collided);
        mission.orbit.set_rv(Vector3::new(8000.0, 0.0, 0.0), mission.orbit.v());
        mission.update_collision_flag();
        assert!(!mission.collided);
    }
}
