// striders-lipm: Jerk-minimizing center-of-mass planning under the Linear
// Inverted Pendulum Model.
//
// The CoM x/y axes are modeled as decoupled triple integrators driven by a
// piecewise-constant jerk over a finite horizon. `JerkPlanner` collects
// equality and support-polygon constraints on any of {position, velocity,
// acceleration, jerk, ZMP, DCM}, assembles one QP and solves it with
// Clarabel; the result is a `CoMTrajectory` answering state queries at any
// time in the horizon.

pub mod error;
pub mod planner;
pub mod solver;
pub mod trajectory;

pub use error::QpError;
pub use planner::{ConstraintKind, JerkConstraint, JerkPlanner};
pub use trajectory::CoMTrajectory;
