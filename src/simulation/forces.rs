//! Pairwise Newtonian gravity
//!
//! Direct O(n²) accumulation over unordered pairs. Each in-range pair gets
//! equal-and-opposite velocity impulses (`force / mass`); fixed bodies
//! still exert force but never receive one. Pairs separated by more than
//! the interaction cutoff are skipped entirely, as are degenerate pairs at
//! (near-)zero separation, so NaN never reaches persistent body state.

use log::trace;

use crate::simulation::states::Body;

/// Apply one tick's worth of mutual gravity to `bodies`.
///
/// `cutoff` is the maximum separation at which two bodies interact.
pub fn apply_gravity(bodies: &mut [Body], gravity_constant: f64, cutoff: f64) {
    let n = bodies.len();

    // Loop over each unordered pair (i, j) with i < j
    for i in 0..n {
        for j in (i + 1)..n {
            let displacement = bodies[j].position - bodies[i].position;
            let distance = displacement.magnitude();
            if distance > cutoff {
                continue;
            }

            // Near-coincident pair: no defined direction. Skip its
            // contribution for this tick; the merge pass handles overlap.
            let direction = match displacement.unit() {
                Ok(u) => u,
                Err(_) => {
                    trace!(
                        "skipping degenerate pair {:?}/{:?} at separation {distance}",
                        bodies[i].id(),
                        bodies[j].id()
                    );
                    continue;
                }
            };

            // F = G m_i m_j / d^2, along the unit displacement i -> j.
            let force =
                gravity_constant * bodies[i].mass * bodies[j].mass / (distance * distance);

            if !bodies[i].fixed {
                let dv = direction * (force / bodies[i].mass);
                bodies[i].velocity += dv;
            }
            if !bodies[j].fixed {
                let dv = -direction * (force / bodies[j].mass);
                bodies[j].velocity += dv;
            }
        }
    }
}
