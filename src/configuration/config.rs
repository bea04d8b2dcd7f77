//! Configuration types for loading simulation scenarios from YAML.
//!
//! A scenario file selects a named built-in setup, lists bodies directly,
//! or both, and may override any subset of the runtime parameters:
//!
//! ```yaml
//! parameters:
//!   tick_interval_ms: 10       # wall-clock pacing of the loop
//!   gravity_constant: 0.2
//!   collisions: true           # merge overlapping bodies
//!   max_interaction_distance: 10000.0
//!   stellar_ignition_mass: 100.0
//!   stellar_collapse_mass: 1000.0
//!
//! builtin: sol_system          # optional named setup
//!
//! bodies:                      # optional extra bodies
//!   - position: [0.0, 0.0, 0.0]
//!     velocity: [0.0, 0.0, 0.0]
//!     mass: 100.0
//!     fixed: true              # anchor: exerts gravity, never moves
//! ```
//!
//! The engine maps this configuration into runtime types in
//! `simulation::scenario`.

use serde::Deserialize;

use crate::simulation::params::Parameters;

/// Named initial-condition setups ported from the classic scenario set.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinScenario {
    #[serde(rename = "sol_system")]
    SolSystem,

    #[serde(rename = "binary_with_planet")]
    BinaryWithPlanet,

    #[serde(rename = "trisolaris")]
    Trisolaris,

    #[serde(rename = "star_formation")]
    StarFormation,

    #[serde(rename = "unstable_3d")]
    Unstable3d,
}

/// Partial parameter overrides; only the keys present in the file are
/// applied, on top of defaults or whatever the built-in setup chose.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ParametersConfig {
    pub tick_interval_ms: Option<u64>,
    pub gravity_constant: Option<f64>,
    pub collisions: Option<bool>,
    pub max_interaction_distance: Option<f64>,
    pub stellar_ignition_mass: Option<f64>,
    pub stellar_collapse_mass: Option<f64>,
}

impl ParametersConfig {
    pub fn apply_to(&self, params: &mut Parameters) {
        if let Some(v) = self.tick_interval_ms {
            params.tick_interval_ms = v;
        }
        if let Some(v) = self.gravity_constant {
            params.gravity_constant = v;
        }
        if let Some(v) = self.collisions {
            params.collisions = v;
        }
        if let Some(v) = self.max_interaction_distance {
            params.max_interaction_distance = v;
        }
        if let Some(v) = self.stellar_ignition_mass {
            params.stellar_ignition_mass = v;
        }
        if let Some(v) = self.stellar_collapse_mass {
            params.stellar_collapse_mass = v;
        }
    }
}

/// Initial state for a single body.
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub mass: f64,
    #[serde(default)]
    pub fixed: bool,
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub builtin: Option<BuiltinScenario>,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
}
