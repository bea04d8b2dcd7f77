use gravsim::simulation::forces::apply_gravity;
use gravsim::{
    build_scenario, Body, Parameters, RunState, ScenarioConfig, SimError, Simulator, Vector3,
};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Simulator stepped synchronously in tests: no pacing, no cutoff.
fn test_simulator(gravity_constant: f64, collisions: bool) -> Simulator {
    Simulator::with_parameters(Parameters {
        tick_interval_ms: 0,
        gravity_constant,
        collisions,
        ..Parameters::default()
    })
}

fn body(position: [f64; 3], velocity: [f64; 3], mass: f64) -> Body {
    Body::new(
        Vector3::new(position[0], position[1], position[2]),
        Vector3::new(velocity[0], velocity[1], velocity[2]),
        mass,
    )
    .expect("valid test body")
}

fn total_momentum(bodies: &[Body]) -> Vector3 {
    bodies
        .iter()
        .fold(Vector3::zero(), |acc, b| acc + b.velocity * b.mass)
}

// ==================================================================================
// Vector tests
// ==================================================================================

#[test]
fn vector_magnitude_and_unit() {
    let v = Vector3::new(3.0, 4.0, 0.0);
    assert!((v.magnitude() - 5.0).abs() < 1e-12);

    let u = v.unit().unwrap();
    assert!((u.magnitude() - 1.0).abs() < 1e-12);
    assert!((u.x - 0.6).abs() < 1e-12);
    assert!((u.y - 0.8).abs() < 1e-12);
}

#[test]
fn vector_angle() {
    let a = Vector3::new(3.0, 4.0, 0.0);
    let b = Vector3::new(0.0, 4.0, 0.0);
    let angle = a.angle_with(&b).unwrap();
    // acos(16 / 20) ~= 36.87 degrees
    assert!((angle.to_degrees() - 36.86989764584402).abs() < 1e-9);
}

#[test]
fn degenerate_vector_has_no_direction() {
    assert_eq!(Vector3::zero().unit(), Err(SimError::DegenerateVector));
    assert_eq!(
        Vector3::new(1.0, 0.0, 0.0).angle_with(&Vector3::zero()),
        Err(SimError::DegenerateVector)
    );
}

// ==================================================================================
// Body tests
// ==================================================================================

#[test]
fn invalid_mass_rejected_at_construction() {
    for mass in [0.0, -5.0, f64::NAN] {
        let result = Body::new(Vector3::zero(), Vector3::zero(), mass);
        assert!(matches!(result, Err(SimError::InvalidMass(_))), "mass {mass}");
    }
    assert!(Body::anchored(Vector3::zero(), -1.0).is_err());
}

#[test]
fn merged_body_conserves_mass_momentum_and_centroid() {
    let a = body([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 10.0);
    let b = body([4.0, 0.0, 0.0], [-1.0, 0.0, 0.0], 10.0);

    let merged = Body::merged(&a, &b);
    assert_eq!(merged.mass, 20.0);
    assert!(merged.velocity.magnitude() < 1e-12);
    assert!((merged.position.x - 2.0).abs() < 1e-12);
    assert_ne!(merged.id(), a.id());
    assert_ne!(merged.id(), b.id());
}

// ==================================================================================
// Gravity tests
// ==================================================================================

#[test]
fn pair_impulses_are_equal_and_opposite() {
    let mut bodies = vec![
        body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 2.0),
        body([10.0, 0.0, 0.0], [0.0, 0.0, 0.0], 3.0),
    ];
    apply_gravity(&mut bodies, 1.0, f64::INFINITY);

    let impulse_a = bodies[0].velocity * bodies[0].mass;
    let impulse_b = bodies[1].velocity * bodies[1].mass;
    assert!((impulse_a + impulse_b).magnitude() < 1e-12);
    // Attraction: a is pulled toward +x, b toward -x.
    assert!(bodies[0].velocity.x > 0.0);
    assert!(bodies[1].velocity.x < 0.0);
}

#[test]
fn gravity_follows_inverse_square_law() {
    let mut near = vec![
        body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0),
        body([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0),
    ];
    let mut far = vec![
        body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0),
        body([2.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0),
    ];
    apply_gravity(&mut near, 0.1, f64::INFINITY);
    apply_gravity(&mut far, 0.1, f64::INFINITY);

    let ratio = near[0].velocity.magnitude() / far[0].velocity.magnitude();
    assert!((ratio - 4.0).abs() < 1e-9, "expected ~4x, got {ratio}");
}

#[test]
fn coincident_pair_is_skipped_without_corrupting_state() {
    let mut bodies = vec![
        body([1.0, 2.0, 3.0], [0.5, 0.0, 0.0], 10.0),
        body([1.0, 2.0, 3.0], [-0.5, 0.0, 0.0], 10.0),
    ];
    apply_gravity(&mut bodies, 1.0, f64::INFINITY);

    for b in &bodies {
        assert!(b.velocity.is_finite());
        assert!(b.position.is_finite());
    }
    // No defined direction means no impulse at all.
    assert_eq!(bodies[0].velocity.x, 0.5);
    assert_eq!(bodies[1].velocity.x, -0.5);
}

// ==================================================================================
// Tick algorithm tests
// ==================================================================================

#[test]
fn cutoff_excludes_distant_pairs_from_force_and_merge() {
    let sim = test_simulator(1.0, true);
    sim.set_max_interaction_distance(50.0);

    // Massive enough that the pair would merge instantly if eligible:
    // sqrt(2e6) ~= 1414 > 100.
    sim.add_body(body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1e6));
    sim.add_body(body([100.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1e6));

    sim.step();

    let bodies = sim.bodies();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].velocity.magnitude() < 1e-15);
    assert!(bodies[1].velocity.magnitude() < 1e-15);
}

#[test]
fn fixed_body_never_moves_under_strong_gravity() {
    let sim = test_simulator(10.0, false);
    let anchor = Body::anchored(Vector3::new(5.0, 5.0, 5.0), 50.0).unwrap();
    let anchor_id = anchor.id();
    sim.add_body(anchor);
    sim.add_body(body([6.0, 5.0, 5.0], [0.0, 0.0, 0.0], 1000.0));

    for _ in 0..25 {
        sim.step();
    }

    let bodies = sim.bodies();
    let anchor = bodies.iter().find(|b| b.id() == anchor_id).unwrap();
    assert_eq!(anchor.position, Vector3::new(5.0, 5.0, 5.0));
    assert_eq!(anchor.velocity, Vector3::zero());
}

#[test]
fn same_position_merge_through_tick() {
    let sim = test_simulator(0.0, true);
    sim.add_body(body([1.0, 2.0, 3.0], [1.0, 0.0, 0.0], 10.0));
    sim.add_body(body([1.0, 2.0, 3.0], [-1.0, 0.0, 0.0], 10.0));

    sim.step();

    let bodies = sim.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].mass, 20.0);
    assert!(bodies[0].velocity.magnitude() < 1e-12);
    // Zero net velocity, so integration leaves the centroid alone.
    assert_eq!(bodies[0].position, Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn merge_cascade_totals_are_order_independent() {
    // All three pairwise thresholds exceeded: separations of 1-2 against
    // sqrt(m_i + m_j) >= sqrt(30).
    let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
    let velocities = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    let masses = [10.0, 20.0, 30.0];

    let expected_momentum = Vector3::new(10.0, 20.0, 30.0);

    for order in [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
        let sim = test_simulator(0.0, true);
        for &k in &order {
            sim.add_body(body(positions[k], velocities[k], masses[k]));
        }

        sim.step();

        let bodies = sim.bodies();
        assert_eq!(bodies.len(), 1, "order {order:?}");
        assert_eq!(bodies[0].mass, 60.0, "order {order:?}");
        let momentum = total_momentum(&bodies);
        assert!(
            (momentum - expected_momentum).magnitude() < 1e-9,
            "order {order:?}: momentum {momentum:?}"
        );
    }
}

#[test]
fn merge_with_anchor_stays_anchored() {
    let sim = test_simulator(0.0, true);
    let anchor = Body::anchored(Vector3::zero(), 30.0).unwrap();
    sim.add_body(anchor);
    sim.add_body(body([2.0, 0.0, 0.0], [5.0, 0.0, 0.0], 10.0));

    sim.step();

    let bodies = sim.bodies();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].fixed);
    assert_eq!(bodies[0].mass, 40.0);
    assert_eq!(bodies[0].velocity, Vector3::zero());
    // Mass-weighted centroid of (0,0,0)*30 and (2,0,0)*10.
    assert!((bodies[0].position.x - 0.5).abs() < 1e-12);
}

#[test]
fn merge_event_carries_source_identities() {
    let sim = test_simulator(0.0, true);
    let a = body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 10.0);
    let b = body([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], 10.0);
    let (a_id, b_id) = (a.id(), b.id());
    sim.add_body(a);
    sim.add_body(b);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_cb = Arc::clone(&seen);
    sim.on_merge(move |e| {
        seen_by_cb.lock().unwrap().push((e.a.id(), e.b.id(), e.merged.id()));
    });

    sim.step();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (ea, eb, merged) = seen[0];
    assert_eq!(ea, a_id);
    assert_eq!(eb, b_id);
    assert_eq!(merged, sim.bodies()[0].id());
}

#[test]
fn circular_orbit_stays_near_its_radius() {
    let g = 0.2;
    let (m1, m2) = (100.0, 1.0);
    let r = 50.0;
    let v = gravsim::circular_orbit_speed(m1 + m2, r, g);

    let sim = test_simulator(g, false);
    sim.add_body(body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], m1));
    sim.add_body(body([r, 0.0, 0.0], [0.0, -v, 0.0], m2));

    for _ in 0..1000 {
        sim.step();
        let bodies = sim.bodies();
        let separation = (bodies[1].position - bodies[0].position).magnitude();
        assert!(
            (separation - r).abs() < 0.1 * r,
            "orbit drifted to separation {separation} at tick {}",
            sim.tick_count()
        );
    }
}

// ==================================================================================
// Lifecycle and observation tests
// ==================================================================================

#[test]
fn start_is_idempotent_and_ticks_form_a_single_stream() {
    let sim = test_simulator(1.0, false);
    sim.set_tick_interval_ms(1);
    sim.add_body(body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0));

    let ticks = Arc::new(Mutex::new(Vec::new()));
    let ticks_by_cb = Arc::clone(&ticks);
    sim.on_tick(move |e| ticks_by_cb.lock().unwrap().push(e.tick));

    sim.start();
    sim.start(); // no second loop
    assert_eq!(sim.state(), RunState::Running);

    thread::sleep(Duration::from_millis(100));
    sim.stop();
    sim.stop(); // safe twice
    assert_eq!(sim.state(), RunState::Stopped);

    let ticks = ticks.lock().unwrap();
    assert!(!ticks.is_empty(), "loop never ticked");
    for pair in ticks.windows(2) {
        assert_eq!(pair[1], pair[0] + 1, "tick stream not sequential: {ticks:?}");
    }
}

#[test]
fn stop_before_start_is_a_no_op() {
    let sim = test_simulator(1.0, false);
    sim.stop();
    assert_eq!(sim.state(), RunState::Idle);

    // The premature stop must not poison the instance.
    sim.set_tick_interval_ms(1);
    sim.start();
    assert_eq!(sim.state(), RunState::Running);
    thread::sleep(Duration::from_millis(20));
    sim.stop();
    assert_eq!(sim.state(), RunState::Stopped);
}

#[test]
fn stopped_simulator_cannot_restart() {
    let sim = test_simulator(1.0, false);
    sim.set_tick_interval_ms(1);
    sim.start();
    sim.stop();

    let counted = Arc::new(AtomicUsize::new(0));
    let counted_by_cb = Arc::clone(&counted);
    sim.on_tick(move |_| {
        counted_by_cb.fetch_add(1, Ordering::SeqCst);
    });

    sim.start();
    assert_eq!(sim.state(), RunState::Stopped);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(counted.load(Ordering::SeqCst), 0);
}

#[test]
fn unsubscribed_callback_no_longer_fires() {
    let sim = test_simulator(0.0, false);
    sim.add_body(body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0));

    let counted = Arc::new(AtomicUsize::new(0));
    let counted_by_cb = Arc::clone(&counted);
    let subscription = sim.on_tick(move |_| {
        counted_by_cb.fetch_add(1, Ordering::SeqCst);
    });

    sim.step();
    assert_eq!(counted.load(Ordering::SeqCst), 1);

    sim.unsubscribe(subscription);
    sim.step();
    assert_eq!(counted.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_observer_surfaces_as_fault_and_stops_the_loop() {
    let sim = test_simulator(1.0, false);
    sim.set_tick_interval_ms(1);
    sim.add_body(body([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1.0));

    let faulted = Arc::new(AtomicBool::new(false));
    let faulted_by_cb = Arc::clone(&faulted);
    sim.on_fault(move |e| {
        assert!(e.message.contains("observer exploded"));
        faulted_by_cb.store(true, Ordering::SeqCst);
    });
    sim.on_tick(|_| panic!("observer exploded"));

    sim.start();
    thread::sleep(Duration::from_millis(100));

    assert!(faulted.load(Ordering::SeqCst), "fault notification never fired");
    assert_eq!(sim.state(), RunState::Stopped);
}

// ==================================================================================
// Scenario and configuration tests
// ==================================================================================

#[test]
fn yaml_scenario_builds_a_populated_simulator() {
    let yaml = r#"
parameters:
  gravity_constant: 0.2
  collisions: true
  max_interaction_distance: 10000.0
bodies:
  - position: [0.0, 0.0, 0.0]
    velocity: [0.0, 0.0, 0.0]
    mass: 100.0
    fixed: true
  - position: [50.0, 0.0, 0.0]
    velocity: [0.0, -0.6356, 0.0]
    mass: 1.0
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    let sim = build_scenario(&cfg).unwrap();

    assert_eq!(sim.gravity_constant(), 0.2);
    assert!(sim.collisions_enabled());
    assert_eq!(sim.max_interaction_distance(), 10000.0);

    let bodies = sim.bodies();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].fixed);
    assert_eq!(bodies[0].velocity, Vector3::zero());
    assert!(!bodies[1].fixed);
}

#[test]
fn builtin_scenario_with_overrides() {
    let yaml = r#"
builtin: star_formation
parameters:
  gravity_constant: 2.5
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    let sim = build_scenario(&cfg).unwrap();

    assert_eq!(sim.bodies().len(), 3);
    assert!(sim.collisions_enabled()); // chosen by the builtin
    assert_eq!(sim.gravity_constant(), 2.5); // overridden by the file
}

#[test]
fn invalid_body_in_config_is_rejected() {
    let yaml = r#"
bodies:
  - position: [0.0, 0.0, 0.0]
    velocity: [0.0, 0.0, 0.0]
    mass: -3.0
"#;
    let cfg: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
    match build_scenario(&cfg) {
        Err(e) => assert_eq!(e, SimError::InvalidMass(-3.0)),
        Ok(_) => panic!("negative mass accepted"),
    }
}

#[test]
fn star_formation_collapses_to_fewer_heavier_bodies() {
    let cfg = ScenarioConfig {
        builtin: Some(gravsim::BuiltinScenario::StarFormation),
        ..ScenarioConfig::default()
    };
    let sim = build_scenario(&cfg).unwrap();
    let initial_mass: f64 = sim.bodies().iter().map(|b| b.mass).sum();

    for _ in 0..2000 {
        sim.step();
    }

    let bodies = sim.bodies();
    assert!(bodies.len() < 3, "nothing merged after 2000 ticks");
    let final_mass: f64 = bodies.iter().map(|b| b.mass).sum();
    assert!((final_mass - initial_mass).abs() < 1e-9);
}
