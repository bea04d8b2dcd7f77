pub mod engine;
pub mod events;
pub mod forces;
pub mod params;
pub mod scenario;
pub mod states;
pub mod vector;
