//! Systems module for the dice tray
//!
//! Engine-independent logic:
//! - `settle`: settle detection with hysteresis
//! - `face_value`: reading the upward face of each die
//! - `spawn`: randomized launch conditions
//! - `sync_loop`: the per-frame driver and roll lifecycle
//! - `scheduler`: virtual-clock frame loop and cancellation
//!
//! Bevy systems:
//! - `setup`: mounting the tray and spawning the scene
//! - `frame`: resize forwarding, frame driving, visual sync, unmount
//! - `rendering`: face symbol geometry

pub mod face_value;
pub mod frame;
pub mod rendering;
pub mod scheduler;
pub mod settle;
pub mod setup;
pub mod spawn;
pub mod sync_loop;

pub use face_value::*;
pub use frame::*;
pub use rendering::*;
pub use scheduler::*;
pub use settle::*;
pub use setup::*;
pub use spawn::*;
pub use sync_loop::*;
