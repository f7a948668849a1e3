// striders-wpg: Walk pattern generation for humanoid bipeds.
//
// The `WalkPatternGenerator` stitches the pieces of the pipeline together:
// footstep supports are turned into a time-indexed `Trajectory` combining a
// jerk-optimal CoM (striders-lipm), swing foot curves and yaw splines, with
// online replanning that stays continuous with the trajectory being
// executed.

pub mod error;
pub mod generator;
pub mod swing;
pub mod swing_quintic;
pub mod trajectory;

pub use error::WalkError;
pub use generator::WalkPatternGenerator;
pub use swing::{SwingFoot, SwingFootTrajectory};
pub use swing_quintic::{SwingFootQuintic, SwingFootQuinticTrajectory};
pub use trajectory::{Trajectory, TrajectoryPart};
