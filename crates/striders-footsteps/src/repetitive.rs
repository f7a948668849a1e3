//! Velocity-command footsteps planner.

use nalgebra::Isometry3;

use striders_core::{HumanoidParameters, Side};

use crate::footstep::Footstep;
use crate::planner::FootstepsPlanner;

/// Plans footsteps by repeating a fixed step command `(d_x, d_y, d_theta)`.
///
/// Each step is placed relative to the previous footstep through
/// [`clipped_neutral_opposite_footstep`](FootstepsPlanner::clipped_neutral_opposite_footstep),
/// so the command is clipped into the accessibility ellipsoid at every step.
/// A final zero-command footstep closes the sequence back into a neutral
/// double support.
#[derive(Debug, Clone)]
pub struct RepetitiveFootstepsPlanner {
    parameters: HumanoidParameters,
    d_x: f64,
    d_y: f64,
    d_theta: f64,
    nb_steps: usize,
}

impl RepetitiveFootstepsPlanner {
    #[must_use]
    pub fn new(parameters: HumanoidParameters) -> Self {
        Self {
            parameters,
            d_x: 0.0,
            d_y: 0.0,
            d_theta: 0.0,
            nb_steps: 0,
        }
    }

    /// Set the step command and the number of steps to plan.
    pub fn configure(&mut self, d_x: f64, d_y: f64, d_theta: f64, nb_steps: usize) {
        self.d_x = d_x;
        self.d_y = d_y;
        self.d_theta = d_theta;
        self.nb_steps = nb_steps;
    }
}

impl FootstepsPlanner for RepetitiveFootstepsPlanner {
    fn parameters(&self) -> &HumanoidParameters {
        &self.parameters
    }

    fn plan_impl(
        &self,
        footsteps: &mut Vec<Footstep>,
        _flying_side: Side,
        _t_world_left: &Isometry3<f64>,
        _t_world_right: &Isometry3<f64>,
    ) {
        if self.nb_steps == 0 {
            return;
        }

        let mut footstep = footsteps[1].clone();

        for _ in 0..self.nb_steps - 1 {
            footstep =
                self.clipped_neutral_opposite_footstep(&footstep, self.d_x, self.d_y, self.d_theta);
            footsteps.push(footstep.clone());
        }

        // Last footstep with a zero command, closing to double support.
        footsteps.push(self.clipped_neutral_opposite_footstep(&footstep, 0.0, 0.0, 0.0));
    }
}
