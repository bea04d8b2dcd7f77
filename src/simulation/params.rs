//! Runtime parameters for the simulation
//!
//! `Parameters` holds the knobs read at the top of every tick:
//! - wall-clock pacing of the loop (`tick_interval_ms`),
//! - gravitational constant `g`,
//! - collision-merge switch and interaction cutoff,
//! - ignition/collapse mass thresholds (observer classification only,
//!   never used in physics)
//!
//! One tick always advances simulated time by exactly one unit;
//! `tick_interval_ms` changes how fast ticks happen on the wall clock,
//! not how far each one moves the system.

#[derive(Debug, Clone)]
pub struct Parameters {
    pub tick_interval_ms: u64, // loop pacing, not the physics timestep
    pub gravity_constant: f64,
    pub collisions: bool, // merge overlapping bodies when set
    pub max_interaction_distance: f64, // pairs farther apart than this neither attract nor merge
    pub stellar_ignition_mass: f64, // rendering threshold: body lights up as a star
    pub stellar_collapse_mass: f64, // rendering threshold: body collapses
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            gravity_constant: 1.0,
            collisions: false,
            max_interaction_distance: f64::INFINITY,
            stellar_ignition_mass: 100.0,
            stellar_collapse_mass: 1000.0,
        }
    }
}
