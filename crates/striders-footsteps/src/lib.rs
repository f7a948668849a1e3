// striders-footsteps: Discrete foot placements and support sequencing.
//
// A `FootstepsPlanner` lays footsteps on the floor toward a goal
// (`NaiveFootstepsPlanner`) or following a velocity command
// (`RepetitiveFootstepsPlanner`); `make_supports` then turns the footstep
// list into the timed single/double support phases consumed by the walk
// pattern generator.

pub mod footstep;
pub mod naive;
pub mod planner;
pub mod repetitive;

pub use footstep::{Footstep, Support};
pub use naive::NaiveFootstepsPlanner;
pub use planner::{add_first_support, make_supports, FootstepsPlanner};
pub use repetitive::RepetitiveFootstepsPlanner;
