pub mod physics;
pub mod plugin;
pub mod ports;
pub mod render;
pub mod systems;
pub mod types;

pub use physics::*;
pub use plugin::*;
pub use ports::*;
pub use render::*;
pub use systems::*;
pub use types::*;
