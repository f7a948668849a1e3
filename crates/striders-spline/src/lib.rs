// striders-spline: Piecewise polynomial splines for the striders walk planner.
//
// Two families:
// - `CubicSpline`: 1-D keyframe spline (used for foot/trunk yaw tracks, with
//   optional angle unwrapping)
// - `CubicHermite3` / `QuinticHermite3`: 3-D curves with vector knots (used
//   for swing foot trajectories; knot-based so a rigid transform can be
//   applied exactly, without refitting)

pub mod cubic;
pub mod fit;
pub mod hermite3;

pub use cubic::CubicSpline;
pub use hermite3::{CubicHermite3, QuinticHermite3};
