//! Concrete `StateSink` implementations.
use std::fs::File;
use std::io::Write;

use serde_derive::Serialize;

use crate::celestia::Orbit;
use crate::errors::{AstroError, AstroResult};
use crate::io::StateSink;

/// Appends one CSV row of osculating Keplerian elements per accepted step:
/// `epoch_s,sma_km,ecc,inc_deg,raan_deg,aop_deg,ta_deg`.
pub struct CsvElementSink {
    writer: csv::Writer<File>,
}

impl CsvElementSink {
    pub fn create(path: &str) -> AstroResult<Self> {
        let mut writer = csv::WriterBuilder::new()
            .from_path(path)
            .map_err(|e| AstroError::illegal_state(format!("cannot create {}: {}", path, e)))?;
        writer
            .write_record(["epoch_s", "sma_km", "ecc", "inc_deg", "raan_deg", "aop_deg", "ta_deg"])
            .map_err(|e| AstroError::illegal_state(e.to_string()))?;
        Ok(CsvElementSink { writer })
    }
}

impl StateSink for CsvElementSink {
    fn accept(&mut self, orbit: &Orbit) -> AstroResult<()> {
        self.writer
            .write_record(&[
                orbit.epoch_s.to_string(),
                orbit.sma_km().to_string(),
                orbit.ecc().to_string(),
                orbit.inc_rad().to_degrees().to_string(),
                orbit.raan_rad().to_degrees().to_string(),
                orbit.aop_rad().to_degrees().to_string(),
                orbit.ta_rad().to_degrees().to_string(),
            ])
            .map_err(|e| AstroError::illegal_state(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| AstroError::illegal_state(e.to_string()))
    }
}

#[derive(Serialize)]
struct CatalogEntry {
    epoch_s: f64,
    r_km: [f64; 3],
    v_km_s: [f64; 3],
    origin: String,
}

/// Writes one line-delimited JSON object per accepted step -- a format
/// external dashboards and replay tools can tail without parsing a whole
/// array.
pub struct JsonCatalogSink {
    file: File,
}

impl JsonCatalogSink {
    pub fn create(path: &str) -> AstroResult<Self> {
        let file = File::create(path)
            .map_err(|e| AstroError::illegal_state(format!("cannot create {}: {}", path, e)))?;
        Ok(JsonCatalogSink { file })
    }
}

impl StateSink for JsonCatalogSink {
    fn accept(&mut self, orbit: &Orbit) -> AstroResult<()> {
        let r = orbit.r();
        let v = orbit.v();
        let entry = CatalogEntry {
            epoch_s: orbit.epoch_s,
            r_km: [r.x, r.y, r.z],
            v_km_s: [v.x, v.y, v.z],
            origin: orbit.origin.name.clone(),
        };
        let line = serde_json::to_string(&entry)
            .map_err(|e| AstroError::illegal_state(format!("json encode failed: {}", e)))?;
        writeln!(self.file, "{}", line)
            .map_err(|e| AstroError::illegal_state(format!("write failed: {}", e)))
    }
}

/// A plain text log of epoch and Cartesian state, one line per step,
/// useful for diffing propagation runs by eye.
pub struct TextStateSink {
    file: File,
}

impl TextStateSink {
    pub fn create(path: &str) -> AstroResult<Self> {
        let file = File::create(path)
            .map_err(|e| AstroError::illegal_state(format!("cannot create {}: {}", path, e)))?;
        Ok(TextStateSink { file })
    }
}

impl StateSink for TextStateSink {
    fn accept(&mut self, orbit: &Orbit) -> AstroResult<()> {
        let r = orbit.r();
        let v = orbit.v();
        writeln!(
            self.file,
            "{:.6} {:.9} {:.9} {:.9} {:.9} {:.9} {:.9}",
            orbit.epoch_s, r.x, r.y, r.z, v.x, v.y, v.z
        )
        .map_err(|e| AstroError::illegal_state(format!("write failed: {}", e)))
    }
}

/// Discards every step. Used when a Mission runs without any external
/// sink configured, and in tests.
pub struct NullSink;

impl StateSink for NullSink {
    fn accept(&mut self, _orbit: &Orbit) -> AstroResult<()> {
        Ok(())
    }
}
