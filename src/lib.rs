pub mod configuration;
pub mod error;
pub mod simulation;

pub use error::SimError;

pub use simulation::engine::Simulator;
pub use simulation::events::{FaultEvent, MergeEvent, Subscription, TickEvent};
pub use simulation::params::Parameters;
pub use simulation::scenario::{build_scenario, circular_orbit_speed, moon_of, planet_with_circular_orbit};
pub use simulation::states::{Body, BodyId, RunState, Snapshot};
pub use simulation::vector::{Vector3, EPSILON};

pub use configuration::config::{BodyConfig, BuiltinScenario, ParametersConfig, ScenarioConfig};
