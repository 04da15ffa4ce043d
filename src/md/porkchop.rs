//! Parallel independent-Mission worker pool (section 5's "optional worker
//! pools that run independent Missions in parallel (e.g., porkchop grid,
//! spiral search) -- these share no mutable state"). A porkchop grid scans
//! a departure/arrival epoch pair and reports the two-impulse delta-v a
//! Lambert transfer between them would cost; each grid cell is an
//! independent Lambert solve, so the scan parallelizes with `rayon` exactly
//! as the design's concurrency model allows.
use rayon::prelude::*;

use crate::linalg::Vector3;
use crate::md::lambert::{lambert, TransferKind};

/// One departure/arrival epoch pair and the transfer cost between the
/// corresponding (caller-supplied) departure and arrival position vectors.
#[derive(Clone, Copy, Debug)]
pub struct PorkchopCell {
    pub departure_epoch_s: f64,
    pub arrival_epoch_s: f64,
    /// Total delta-v, km/s, summing the departure-hyperbolic-excess and
    /// arrival-hyperbolic-excess magnitudes relative to the caller's
    /// supplied circular departure/arrival velocities. `None` when the
    /// Lambert solve for this cell failed to converge.
    pub total_delta_v_km_s: Option<f64>,
}

/// Scans every `(departure, arrival)` epoch pair in the outer product of
/// `departure_epochs_s` x `arrival_epochs_s`, solving Lambert's problem for
/// each independently in parallel. `position_at` maps an epoch to a
/// departure/arrival position vector (normally a cheap ephemeris lookup);
/// `velocity_at` maps an epoch to the body's own velocity there, used to
/// convert the Lambert-solved transfer velocity into a hyperbolic-excess
/// delta-v. Every cell is computed from borrowed, read-only closures with
/// no shared mutable state between threads, per the design's worker-pool
/// concurrency model.
pub fn scan(
    departure_epochs_s: &[f64],
    arrival_epochs_s: &[f64],
    mu_km3_s2: f64,
    position_at: impl Fn(f64) -> Vector3<f64> + Sync,
    velocity_at: impl Fn(f64) -> Vector3<f64> + Sync,
) -> Vec<PorkchopCell> {
    departure_epochs_s
        .par_iter()
        .flat_map_iter(|&t_dep| {
            arrival_epochs_s.iter().map(move |&t_arr| (t_dep, t_arr))
        })
        .map(|(t_dep, t_arr)| {
            let tof = t_arr - t_dep;
            if tof <= 0.0 {
                return PorkchopCell {
                    departure_epoch_s: t_dep,
                    arrival_epoch_s: t_arr,
                    total_delta_v_km_s: None,
                };
            }
            let r1 = position_at(t_dep);
            let r2 = position_at(t_arr);
            let total_delta_v_km_s = lambert(r1, r2, tof, mu_km3_s2, TransferKind::Auto, 0)
                .ok()
                .map(|sol| {
                    let v_dep_planet = velocity_at(t_dep);
                    let v_arr_planet = velocity_at(t_arr);
                    (sol.v1_km_s - v_dep_planet).norm() + (sol.v2_km_s - v_arr_planet).norm()
                });
            PorkchopCell {
                departure_epoch_s: t_dep,
                arrival_epoch_s: t_arr,
                total_delta_v_km_s,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_produces_one_cell_per_epoch_pair() {
        let mu = 398_600.4415;
        let departures = [0.0, 3600.0];
        let arrivals = [7200.0, 10800.0, 14400.0];
        let cells = scan(
            &departures,
            &arrivals,
            mu,
            |t| Vector3::new(7000.0 + t * 0.01, 0.0, 0.0),
            |_| Vector3::new(0.0, 7.5, 0.0),
        );
        assert_eq!(cells.len(), departures.len() * arrivals.len());
    }

    #[test]
    fn scan_skips_nonpositive_time_of_flight() {
        let mu = 398_600.4415;
        let cells = scan(
            &[5000.0],
            &[1000.0],
            mu,
            |t| Vector3::new(7000.0 + t, 0.0, 0.0),
            |_| Vector3::new(0.0, 7.5, 0.0),
        );
        assert!(cells[0].total_delta_v_km_s.is_none());
    }
}
