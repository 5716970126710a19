//! Physics backends for the tray
//!
//! - `step_clock`: clamps wall-clock deltas and slices them into fixed sub-steps
//! - `rapier_world`: the rapier implementation of `PhysicsWorld`

mod rapier_world;
mod step_clock;

pub use rapier_world::RapierWorld;
pub use step_clock::StepClock;
