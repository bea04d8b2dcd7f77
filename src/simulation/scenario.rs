//! Build fully-populated simulators from configuration
//!
//! Takes a [`ScenarioConfig`] (YAML-facing) and produces a ready-to-start
//! [`Simulator`]: parameters applied, bodies added. Also hosts the named
//! built-in setups (`sol_system`, `binary_with_planet`, ...) and the
//! circular-orbit helpers they are built from. Everything here drives the
//! simulator through its public surface only.

use crate::configuration::config::{BuiltinScenario, ScenarioConfig};
use crate::error::SimError;
use crate::simulation::engine::Simulator;
use crate::simulation::states::Body;
use crate::simulation::vector::Vector3;

/// Map a scenario configuration into a populated simulator.
///
/// Order matters: the built-in setup (if any) chooses its own parameters,
/// explicit `parameters:` keys override them, and explicit `bodies:` are
/// added after the built-in ones.
pub fn build_scenario(cfg: &ScenarioConfig) -> Result<Simulator, SimError> {
    let sim = Simulator::new();

    if let Some(builtin) = cfg.builtin {
        configure_builtin(builtin, &sim)?;
    }

    let mut params = sim.parameters();
    cfg.parameters.apply_to(&mut params);
    sim.set_parameters(params);

    for bc in &cfg.bodies {
        let position = Vector3::new(bc.position[0], bc.position[1], bc.position[2]);
        let body = if bc.fixed {
            Body::anchored(position, bc.mass)?
        } else {
            let velocity = Vector3::new(bc.velocity[0], bc.velocity[1], bc.velocity[2]);
            Body::new(position, velocity, bc.mass)?
        };
        sim.add_body(body);
    }

    Ok(sim)
}

pub fn configure_builtin(builtin: BuiltinScenario, sim: &Simulator) -> Result<(), SimError> {
    match builtin {
        BuiltinScenario::SolSystem => sol_system(sim),
        BuiltinScenario::BinaryWithPlanet => binary_with_planet(sim),
        BuiltinScenario::Trisolaris => trisolaris(sim),
        BuiltinScenario::StarFormation => star_formation(sim),
        BuiltinScenario::Unstable3d => unstable_3d(sim),
    }
}

// ----------------------------------------------------------------------
// Orbit helpers
// ----------------------------------------------------------------------

/// Tangential speed of a circular orbit: `v = sqrt(G * m_total / r)`.
pub fn circular_orbit_speed(total_mass: f64, radius: f64, gravity_constant: f64) -> f64 {
    (gravity_constant * total_mass / radius).sqrt()
}

/// A body on a circular orbit of radius `altitude` around a primary of
/// mass `primary_mass` sitting at the origin.
pub fn planet_with_circular_orbit(
    primary_mass: f64,
    altitude: f64,
    mass: f64,
    gravity_constant: f64,
) -> Result<Body, SimError> {
    let speed = circular_orbit_speed(primary_mass + mass, altitude, gravity_constant);
    Body::new(
        Vector3::new(altitude, 0.0, 0.0),
        Vector3::new(0.0, -speed, 0.0),
        mass,
    )
}

/// A moon orbiting `parent`, placed `altitude` further out along +x with
/// the parent's own orbital speed added on.
pub fn moon_of(
    parent: &Body,
    altitude: f64,
    mass: f64,
    gravity_constant: f64,
) -> Result<Body, SimError> {
    let speed = circular_orbit_speed(mass + parent.mass, altitude, gravity_constant)
        + parent.velocity.magnitude();
    Body::new(
        Vector3::new(parent.position.magnitude() + altitude, 0.0, 0.0),
        Vector3::new(0.0, -speed, 0.0),
        mass,
    )
}

// ----------------------------------------------------------------------
// Built-in setups
// ----------------------------------------------------------------------

/// A sun with inner planets, an Earth-moon pair, and a Jupiter analogue
/// with three moons.
fn sol_system(sim: &Simulator) -> Result<(), SimError> {
    sim.set_gravity_constant(0.2);
    sim.set_collisions_enabled(true);
    let g = sim.gravity_constant();

    let sun_mass = 100.0;
    sim.add_body(Body::new(Vector3::zero(), Vector3::zero(), sun_mass)?);

    let mercury = planet_with_circular_orbit(sun_mass, 50.0, 1.0, g)?;
    let venus = planet_with_circular_orbit(sun_mass, 30.0, 1.0, g)?;
    let earth = planet_with_circular_orbit(sun_mass, 70.0, 1.0, g)?;
    let moon = moon_of(&earth, 5.0, earth.mass / 6.0, g)?;

    let jupiter = planet_with_circular_orbit(sun_mass, 250.0, 20.0, g)?;
    let j_moon1 = moon_of(&jupiter, 10.0, 0.01, g)?;
    let j_moon2 = moon_of(&jupiter, 20.0, 0.01, g)?;
    let j_moon3 = moon_of(&jupiter, 30.0, 0.01, g)?;

    for body in [mercury, venus, earth, moon, jupiter, j_moon1, j_moon2, j_moon3] {
        sim.add_body(body);
    }
    Ok(())
}

/// Two heavy stars in a mutual orbit with one light outer planet.
fn binary_with_planet(sim: &Simulator) -> Result<(), SimError> {
    sim.set_gravity_constant(2.0);

    sim.add_body(Body::new(
        Vector3::new(0.0, -30.0, 0.0),
        Vector3::new(-1.3, 0.0, 0.0),
        100.0,
    )?);
    sim.add_body(Body::new(
        Vector3::new(0.0, 30.0, 0.0),
        Vector3::new(1.3, 0.0, 0.0),
        100.0,
    )?);
    sim.add_body(Body::new(
        Vector3::new(0.0, -200.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
        1.0,
    )?);
    Ok(())
}

/// Three equal stars on a figure-eight choreography, plus a distant
/// planet around their combined mass.
fn trisolaris(sim: &Simulator) -> Result<(), SimError> {
    sim.set_gravity_constant(1.0);
    sim.set_collisions_enabled(true);
    let g = sim.gravity_constant();

    let star_mass = 100.0;
    let scale = 100.0;

    let init_r = Vector3::new(-0.97000436, 0.24308753, 0.0);
    let init_v1 = Vector3::new(0.4662036850, 0.4323657300, 0.0);
    let init_v2 = Vector3::new(-0.93240737, -0.86473146, 0.0);

    sim.add_body(Body::new(init_r * scale, init_v1, star_mass)?);
    sim.add_body(Body::new(Vector3::zero(), init_v2, star_mass)?);
    sim.add_body(Body::new(-(init_r * scale), init_v1, star_mass)?);

    let barycenter = Body::new(Vector3::zero(), Vector3::zero(), 3.0 * star_mass)?;
    sim.add_body(moon_of(&barycenter, 500.0, 1.0, g)?);
    Ok(())
}

/// Three clouds of equal mass placed to fall together and merge.
fn star_formation(sim: &Simulator) -> Result<(), SimError> {
    sim.set_gravity_constant(1.0);
    sim.set_collisions_enabled(true);

    sim.add_body(Body::new(Vector3::new(0.0, -30.0, 0.0), Vector3::zero(), 30.0)?);
    sim.add_body(Body::new(Vector3::new(0.0, 30.0, 0.0), Vector3::zero(), 30.0)?);
    sim.add_body(Body::new(Vector3::new(100.0, 0.0, 0.0), Vector3::zero(), 30.0)?);
    Ok(())
}

/// Six bodies thrown together out of plane; decays quickly.
fn unstable_3d(sim: &Simulator) -> Result<(), SimError> {
    sim.set_gravity_constant(15.0);

    sim.add_body(Body::new(
        Vector3::new(0.0, -30.0, 0.0),
        Vector3::new(-3.0, 0.0, 0.0),
        100.0,
    )?);
    sim.add_body(Body::new(
        Vector3::new(0.0, 30.0, 0.0),
        Vector3::new(3.0, 0.0, 0.0),
        100.0,
    )?);
    sim.add_body(Body::new(
        Vector3::new(0.0, 0.0, -200.0),
        Vector3::new(-3.0, 0.0, 0.0),
        20.0,
    )?);
    sim.add_body(Body::new(
        Vector3::new(0.0, 0.0, 200.0),
        Vector3::new(3.0, 0.0, 0.0),
        20.0,
    )?);
    sim.add_body(Body::new(
        Vector3::new(0.0, -200.0, 0.0),
        Vector3::new(0.0, 0.0, -3.0),
        20.0,
    )?);
    sim.add_body(Body::new(
        Vector3::new(0.0, 200.0, 0.0),
        Vector3::new(0.0, 0.0, 3.0),
        20.0,
    )?);
    Ok(())
}
