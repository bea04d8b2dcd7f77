//! The simulation engine
//!
//! [`Simulator`] owns the body collection and a background worker thread.
//! Each tick accumulates pairwise gravity, resolves collision merges to a
//! fixed point, integrates positions, and publishes an immutable snapshot
//! together with a tick notification.
//!
//! Lifecycle is `Idle -> Running -> Stopped`; `Stopped` is terminal for an
//! instance. Cancellation is cooperative: `stop()` raises a flag checked
//! between ticks and waits a bounded time for the worker, abandoning it if
//! the deadline passes.
//!
//! Observer callbacks run on the simulation thread. They may read the
//! published snapshot and reconfigure parameters, but must not call the
//! body-mutating API (`add_body`) from inside a callback: the live
//! collection is locked for the duration of the tick.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::simulation::events::{Dispatcher, FaultEvent, MergeEvent, Subscription, TickEvent};
use crate::simulation::forces;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, RunState, Snapshot};

/// How long `stop()` waits for the worker before abandoning it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// State shared between the public handle and the worker thread.
struct Inner {
    bodies: Mutex<Vec<Body>>,
    params: RwLock<Parameters>,
    snapshot: RwLock<Snapshot>,
    state: Mutex<RunState>,
    stop_flag: AtomicBool,
    tick: AtomicU64,
    tick_subs: Dispatcher<TickEvent>,
    merge_subs: Dispatcher<MergeEvent>,
    fault_subs: Dispatcher<FaultEvent>,
}

pub struct Simulator {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_parameters(Parameters::default())
    }

    pub fn with_parameters(params: Parameters) -> Self {
        Self {
            inner: Arc::new(Inner {
                bodies: Mutex::new(Vec::new()),
                params: RwLock::new(params),
                snapshot: RwLock::new(Arc::new(Vec::new())),
                state: Mutex::new(RunState::Idle),
                stop_flag: AtomicBool::new(false),
                tick: AtomicU64::new(0),
                tick_subs: Dispatcher::new(),
                merge_subs: Dispatcher::new(),
                fault_subs: Dispatcher::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // Body collection
    // ------------------------------------------------------------------

    pub fn add_body(&self, body: Body) {
        let mut bodies = self.inner.bodies.lock();
        bodies.push(body);
        // Republish so readers see setup done before start().
        *self.inner.snapshot.write() = Arc::new(bodies.clone());
    }

    /// The latest published snapshot. Reflects either a fully-pre-tick or
    /// fully-post-tick state, never a mid-tick one; no lock is required to
    /// consume it.
    pub fn bodies(&self) -> Snapshot {
        self.inner.snapshot.read().clone()
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.inner.tick.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> RunState {
        *self.inner.state.lock()
    }

    // ------------------------------------------------------------------
    // Configuration surface; changes take effect on the next tick
    // ------------------------------------------------------------------

    pub fn parameters(&self) -> Parameters {
        self.inner.params.read().clone()
    }

    pub fn set_parameters(&self, params: Parameters) {
        *self.inner.params.write() = params;
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.inner.params.read().tick_interval_ms
    }

    pub fn set_tick_interval_ms(&self, ms: u64) {
        self.inner.params.write().tick_interval_ms = ms;
    }

    pub fn gravity_constant(&self) -> f64 {
        self.inner.params.read().gravity_constant
    }

    pub fn set_gravity_constant(&self, g: f64) {
        self.inner.params.write().gravity_constant = g;
    }

    pub fn collisions_enabled(&self) -> bool {
        self.inner.params.read().collisions
    }

    pub fn set_collisions_enabled(&self, enabled: bool) {
        self.inner.params.write().collisions = enabled;
    }

    pub fn max_interaction_distance(&self) -> f64 {
        self.inner.params.read().max_interaction_distance
    }

    pub fn set_max_interaction_distance(&self, distance: f64) {
        self.inner.params.write().max_interaction_distance = distance;
    }

    pub fn stellar_ignition_mass(&self) -> f64 {
        self.inner.params.read().stellar_ignition_mass
    }

    pub fn set_stellar_ignition_mass(&self, mass: f64) {
        self.inner.params.write().stellar_ignition_mass = mass;
    }

    pub fn stellar_collapse_mass(&self) -> f64 {
        self.inner.params.read().stellar_collapse_mass
    }

    pub fn set_stellar_collapse_mass(&self, mass: f64) {
        self.inner.params.write().stellar_collapse_mass = mass;
    }

    // ------------------------------------------------------------------
    // Observation surface
    // ------------------------------------------------------------------

    pub fn on_tick<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&TickEvent) + Send + Sync + 'static,
    {
        self.inner.tick_subs.subscribe(callback)
    }

    pub fn on_merge<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MergeEvent) + Send + Sync + 'static,
    {
        self.inner.merge_subs.subscribe(callback)
    }

    pub fn on_fault<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&FaultEvent) + Send + Sync + 'static,
    {
        self.inner.fault_subs.subscribe(callback)
    }

    /// Remove a previously registered callback, whichever event it was
    /// registered for.
    pub fn unsubscribe(&self, subscription: Subscription) {
        let _ = self.inner.tick_subs.unsubscribe(subscription)
            || self.inner.merge_subs.unsubscribe(subscription)
            || self.inner.fault_subs.unsubscribe(subscription);
    }

    // ------------------------------------------------------------------
    // Control surface
    // ------------------------------------------------------------------

    /// Launch the background tick loop. No-op if already running; a
    /// stopped simulator cannot be restarted.
    pub fn start(&self) {
        let mut state = self.inner.state.lock();
        match *state {
            RunState::Running => return,
            RunState::Stopped => {
                warn!("start() on a stopped simulator; construct a fresh one to re-run");
                return;
            }
            RunState::Idle => {}
        }

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name("gravsim-tick".into())
            .spawn(move || worker_loop(inner));
        match spawned {
            Ok(handle) => {
                *state = RunState::Running;
                *self.worker.lock() = Some(handle);
                info!("simulation loop started");
            }
            Err(e) => error!("failed to spawn simulation worker: {e}"),
        }
    }

    /// Signal the loop to exit and wait up to a bounded timeout for the
    /// worker to finish; past the deadline the worker is abandoned, not
    /// killed. Safe to call when not running, and safe to call twice.
    pub fn stop(&self) {
        let handle = {
            let mut state = self.inner.state.lock();
            let handle = self.worker.lock().take();
            if *state == RunState::Idle && handle.is_none() {
                return; // stop() before start()
            }
            *state = RunState::Stopped;
            self.inner.stop_flag.store(true, Ordering::SeqCst);
            handle
        };
        let Some(handle) = handle else {
            return; // second stop(), or the worker already died of a fault
        };

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        if handle.is_finished() {
            // A panicking tick is already reported through the fault
            // notification, nothing further to surface here.
            let _ = handle.join();
            info!("simulation loop stopped");
        } else {
            warn!(
                "worker did not exit within {:?}; abandoning it",
                SHUTDOWN_TIMEOUT
            );
        }
    }

    /// Advance the simulation by exactly one tick, synchronously. This is
    /// the same code path the background loop executes; headless drivers
    /// and tests use it for deterministic stepping.
    pub fn step(&self) {
        run_tick(&self.inner);
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}

// ----------------------------------------------------------------------
// Worker loop and tick algorithm
// ----------------------------------------------------------------------

fn worker_loop(inner: Arc<Inner>) {
    loop {
        let interval = inner.params.read().tick_interval_ms;
        thread::sleep(Duration::from_millis(interval));
        if inner.stop_flag.load(Ordering::SeqCst) {
            break;
        }

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| run_tick(&inner))) {
            let message = panic_message(payload);
            error!("fatal fault in simulation tick: {message}");
            inner.fault_subs.emit(&FaultEvent {
                tick: inner.tick.load(Ordering::Relaxed),
                message,
            });
            *inner.state.lock() = RunState::Stopped;
            break;
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unidentified panic payload".to_string()
    }
}

/// One tick: force accumulation, collision resolution, integration,
/// notification. One tick advances simulated time by exactly one unit;
/// the configured interval only paces the loop.
fn run_tick(inner: &Inner) {
    let params = inner.params.read().clone();
    let tick = inner.tick.fetch_add(1, Ordering::Relaxed) + 1;

    let snapshot: Snapshot = {
        let mut bodies = inner.bodies.lock();

        forces::apply_gravity(
            bodies.as_mut_slice(),
            params.gravity_constant,
            params.max_interaction_distance,
        );

        if params.collisions {
            resolve_merges(inner, &mut bodies, params.max_interaction_distance);
        }

        for body in bodies.iter_mut() {
            if !body.fixed {
                body.position += body.velocity;
            }
        }

        let snapshot: Snapshot = Arc::new(bodies.clone());
        *inner.snapshot.write() = snapshot.clone();
        snapshot
    };

    inner.tick_subs.emit(&TickEvent {
        tick,
        bodies: snapshot,
    });
}

/// Merge every colliding pair, cascading within the tick: after a merge
/// the inner scan restarts at the current outer index against the
/// shortened collection, so a merge result that overlaps a later body is
/// merged again before the outer index advances.
///
/// Two bodies collide when `sqrt(m_i + m_j) > distance` (effective radius
/// grows with the square root of mass), provided they are inside the
/// interaction cutoff. The comparison is division-free, so coincident
/// bodies merge cleanly.
fn resolve_merges(inner: &Inner, bodies: &mut Vec<Body>, cutoff: f64) {
    let mut i = 0;
    while i < bodies.len() {
        let mut j = i + 1;
        while j < bodies.len() {
            let a = bodies[i];
            let b = bodies[j];
            let distance = (b.position - a.position).magnitude();
            if distance <= cutoff && (a.mass + b.mass).sqrt() > distance {
                let merged = Body::merged(&a, &b);
                debug!(
                    "merged {:?} (m={}) and {:?} (m={}) into {:?} (m={})",
                    a.id(),
                    a.mass,
                    b.id(),
                    b.mass,
                    merged.id(),
                    merged.mass
                );
                bodies[i] = merged;
                bodies.remove(j);
                inner.merge_subs.emit(&MergeEvent { a, b, merged });
                // Rescan: the merge result may now overlap an earlier
                // survivor of this inner loop.
                j = i + 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }
}
