//! Error taxonomy for the simulation engine
//!
//! Construction errors surface immediately to the caller; degenerate
//! vector conditions are recovered locally by skipping the pair for the
//! current tick. Faults inside the background loop are not errors in this
//! sense at all, they are reported through the fault notification (see
//! `simulation::events`).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// Zero (or near-zero) magnitude where a direction is required.
    #[error("vector magnitude below epsilon; direction undefined")]
    DegenerateVector,

    /// Body construction with a non-positive (or non-finite) mass.
    #[error("body mass must be strictly positive, got {0}")]
    InvalidMass(f64),
}
