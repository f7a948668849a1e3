// striders-core: Parameters, sides, frames, planar geometry, errors for the
// striders humanoid walk planner.

pub mod error;
pub mod frames;
pub mod geometry;
pub mod params;
pub mod side;

pub use error::ConfigError;
pub use params::{HumanoidParameters, GRAVITY};
pub use side::Side;
