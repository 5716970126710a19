//! Types module for the dice tray
//!
//! - `die`: face table, symbols and die identity
//! - `bounds`: viewport-derived containment bounds and wall geometry
//! - `session`: the roll session state machine
//! - `inputs`: caller-facing signals (tokens, color scheme) and emitted events
//! - `settings`: tunable constants, loadable from JSON

pub mod bounds;
pub mod die;
pub mod inputs;
pub mod session;
pub mod settings;

pub use bounds::*;
pub use die::*;
pub use inputs::*;
pub use session::*;
pub use settings::*;
