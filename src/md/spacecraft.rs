//! Spacecraft (C7): mass/fuel bookkeeping, a thruster catalog, and the
//! deferred-action queue the design calls for so a waypoint's "fire this
//! control law, then swap to that one" sequencing doesn't need to mutate
//! the propagator mid-step.
use crate::dynamics::thrustctrl::ThrustControl;
use crate::dynamics::perturbations::CrSource;

/// A single thruster's rated performance, used to turn a commanded
/// delta-v or continuous-thrust duration into fuel consumed.
#[derive(Clone, Debug)]
pub struct Thruster {
    pub name: String,
    pub thrust_n: f64,
    pub isp_s: f64,
}

impl Thruster {
    /// Mass flow rate, kg/s, at full throttle (Tsiolkovsky: `mdot = F / (Isp g0)`).
    pub fn mass_flow_kg_s(&self) -> f64 {
        const G0_M_S2: f64 = 9.80665;
        self.thrust_n / (self.isp_s * G0_M_S2)
    }
}

/// A pending change to apply at a future mission event (a waypoint
/// completing, a fuel threshold crossing) without mutating the active
/// control law mid-propagation step. Queued by `Spacecraft::defer` and
/// drained by the Mission driver between propagator calls.
pub enum DeferredAction {
    SwitchThrustControl(ThrustControl),
    DropCargo(String),
    SetThruster(usize),
}

/// An item of non-propellant mass the spacecraft sheds at a waypoint (a
/// deployed payload, a jettisoned stage).
#[derive(Clone, Debug)]
pub struct Cargo {
    pub name: String,
    pub mass_kg: f64,
}

pub struct Spacecraft {
    pub dry_mass_kg: f64,
    pub fuel_mass_kg: f64,
    pub thrusters: Vec<Thruster>,
    pub active_thruster: Option<usize>,
    pub cargo: Vec<Cargo>,
    pub cr: f64,
    pub drag_area_km2: f64,
    pub srp_area_km2: f64,
    /// When false, thrust control laws still report a direction but the
    /// propagator does not deplete `fuel_mass_kg` -- used for control-law
    /// unit tests that care about pointing, not mass bookkeeping.
    pub track_fuel: bool,
    deferred: Vec<DeferredAction>,
}

impl Spacecraft {
    pub fn new(dry_mass_kg: f64, fuel_mass_kg: f64) -> Self {
        Spacecraft {
            dry_mass_kg,
            fuel_mass_kg,
            thrusters: Vec::new(),
            active_thruster: None,
            cargo: Vec::new(),
            cr: 1.8,
            drag_area_km2: 0.0,
            srp_area_km2: 0.0,
            track_fuel: true,
            deferred: Vec::new(),
        }
    }

    pub fn total_mass_kg(&self) -> f64 {
        self.dry_mass_kg + self.fuel_mass_kg + self.cargo.iter().map(|c| c.mass_kg).sum::<f64>()
    }

    pub fn area_to_mass_km2_per_kg(&self) -> f64 {
        self.srp_area_km2 / self.total_mass_kg()
    }

    /// Converts the active thruster's rated thrust into an acceleration,
    /// km/s^2, at the current total mass.
    pub fn thrust_accel_km_s2(&self) -> f64 {
        match self.active_thruster.and_then(|i| self.thrusters.get(i)) {
            Some(t) => (t.thrust_n / 1000.0) / self.total_mass_kg(), // N -> kN, kg -> total mass
            None => 0.0,
        }
    }

    /// Depletes fuel for `dt` seconds of full-throttle burn on the active
    /// thruster, returning an error once fuel runs out (the design's fuel-
    /// exhaustion guard, checked by the propagator after every step).
    pub fn deplete_fuel(&mut self, dt_s: f64) -> Result<(), crate::errors::AstroError> {
        if !self.track_fuel {
            return Ok(());
        }
        let Some(t) = self.active_thruster.and_then(|i| self.thrusters.get(i)) else {
            return Ok(());
        };
        let burned = t.mass_flow_kg_s() * dt_s.abs();
        if burned > self.fuel_mass_kg {
            return Err(crate::errors::AstroError::resource_exhaustion(
                "fuel exhausted mid-burn",
            ));
        }
        self.fuel_mass_kg -= burned;
        Ok(())
    }

    pub fn defer(&mut self, action: DeferredAction) {
        self.deferred.push(action);
    }

    /// Drains and applies every queued deferred action in FIFO order.
    pub fn apply_deferred(&mut self, control: &mut Option<ThrustControl>) {
        for action in self.deferred.drain(..) {
            match action {
                DeferredAction::SwitchThrustControl(next) => *control = Some(next),
                DeferredAction::DropCargo(name) => self.cargo.retain(|c| c.name != name),
                DeferredAction::SetThruster(idx) => self.active_thruster = Some(idx),
            }
        }
    }
}

impl CrSource for Spacecraft {
    fn cr(&self) -> f64 {
        self.cr
    }
    fn area_to_mass_km2_per_kg(&self) -> f64 {
        Spacecraft::area_to_mass_km2_per_kg(self)
    }
}
