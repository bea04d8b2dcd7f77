//! Core state types for the simulation
//!
//! Defines the point-mass [`Body`], its stable [`BodyId`], the published
//! [`Snapshot`] consumed by external readers, and the simulator's
//! [`RunState`] lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::SimError;
use crate::simulation::vector::Vector3;

static NEXT_BODY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a body, preserved across ticks and carried in merge
/// notifications so observers can migrate per-body state to the merge
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u64);

impl BodyId {
    fn next() -> Self {
        Self(NEXT_BODY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A point mass. `fixed` bodies exert gravity but never receive velocity
/// updates or position integration; they act as permanent anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    id: BodyId,
    pub position: Vector3,
    pub velocity: Vector3,
    pub mass: f64,
    pub fixed: bool,
}

impl Body {
    /// A mobile body. Fails with [`SimError::InvalidMass`] unless
    /// `mass > 0` (gravity and merge formulas divide by mass sums).
    pub fn new(position: Vector3, velocity: Vector3, mass: f64) -> Result<Self, SimError> {
        if !(mass > 0.0) {
            return Err(SimError::InvalidMass(mass));
        }
        Ok(Self {
            id: BodyId::next(),
            position,
            velocity,
            mass,
            fixed: false,
        })
    }

    /// An anchored body: never moves, still exerts gravity.
    pub fn anchored(position: Vector3, mass: f64) -> Result<Self, SimError> {
        let mut body = Self::new(position, Vector3::zero(), mass)?;
        body.fixed = true;
        Ok(body)
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Combine two bodies into one, conserving mass, momentum (velocity is
    /// the momentum-weighted average) and center of mass (position is the
    /// mass-weighted centroid). The result is fixed if either parent is;
    /// anchors stay anchors through merges.
    pub fn merged(a: &Body, b: &Body) -> Body {
        let mass = a.mass + b.mass;
        let position = (a.position * a.mass + b.position * b.mass) * (1.0 / mass);
        let fixed = a.fixed || b.fixed;
        let velocity = if fixed {
            Vector3::zero()
        } else {
            (a.velocity * a.mass + b.velocity * b.mass) * (1.0 / mass)
        };
        Body {
            id: BodyId::next(),
            position,
            velocity,
            mass,
            fixed,
        }
    }
}

/// Immutable per-tick view of the body collection. Published once per
/// completed tick; readers consume it without taking any lock.
pub type Snapshot = Arc<Vec<Body>>;

/// Simulator lifecycle. `Stopped` is terminal for an instance; a fresh
/// simulator must be constructed to run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopped,
}
