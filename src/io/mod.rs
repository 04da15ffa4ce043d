//! External interfaces for state output: the `StateSink` collaborator
//! trait the propagator streams every accepted step to, and a handful of
//! concrete sinks (CSV of osculating elements, a line-delimited JSON
//! catalog, and a plain interpolated-state text log).
pub mod sinks;

pub use sinks::{CsvElementSink, JsonCatalogSink, NullSink, TextStateSink};

use crate::celestia::Orbit;
use crate::errors::AstroResult;

/// Receives every accepted propagator step. Sinks are external
/// collaborators: the kernel does not know or care whether a sink writes
/// to disk, a socket, or nowhere at all (see `sinks::NullSink`).
pub trait StateSink: Send {
    fn accept(&mut self, orbit: &Orbit) -> AstroResult<()>;
}
