//! Goal-seeking footsteps planner.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use striders_core::frames::{frame_yaw, interpolate_frames};
use striders_core::{HumanoidParameters, Side};

use crate::footstep::Footstep;
use crate::planner::FootstepsPlanner;

/// Plans footsteps toward target foot placements with a greedy, open-loop
/// policy.
///
/// At each step the error between the stepping foot's neutral pose and its
/// target is rescaled into a per-axis accessibility box; while the foot is
/// far from its target the step yaw points at the target, otherwise it
/// aligns with the target orientation. Planning stops once both feet
/// reported arrival, bounded by `max_steps`.
#[derive(Debug, Clone)]
pub struct NaiveFootstepsPlanner {
    parameters: HumanoidParameters,
    t_world_target_left: Isometry3<f64>,
    t_world_target_right: Isometry3<f64>,

    /// Maximum number of planned steps.
    pub max_steps: usize,
    /// Lateral half-extent of the accessibility box [m].
    pub accessibility_width: f64,
    /// Sagittal half-extent of the accessibility box [m].
    pub accessibility_length: f64,
    /// Maximum step yaw [rad].
    pub accessibility_yaw: f64,
    /// Distance over which the robot walks toward the target instead of
    /// aligning with it [m].
    pub place_threshold: f64,
}

impl NaiveFootstepsPlanner {
    #[must_use]
    pub fn new(parameters: HumanoidParameters) -> Self {
        Self {
            parameters,
            t_world_target_left: Isometry3::identity(),
            t_world_target_right: Isometry3::identity(),
            max_steps: 100,
            accessibility_width: 0.025,
            accessibility_length: 0.08,
            accessibility_yaw: 0.2,
            place_threshold: 0.5,
        }
    }

    /// Set the target frames for both feet.
    pub fn configure(
        &mut self,
        t_world_target_left: Isometry3<f64>,
        t_world_target_right: Isometry3<f64>,
    ) {
        self.t_world_target_left = t_world_target_left;
        self.t_world_target_right = t_world_target_right;
    }
}

impl FootstepsPlanner for NaiveFootstepsPlanner {
    fn parameters(&self) -> &HumanoidParameters {
        &self.parameters
    }

    #[allow(clippy::too_many_lines)]
    fn plan_impl(
        &self,
        footsteps: &mut Vec<Footstep>,
        flying_side: Side,
        t_world_left: &Isometry3<f64>,
        t_world_right: &Isometry3<f64>,
    ) {
        let t_world_target = interpolate_frames(
            &self.t_world_target_left,
            &self.t_world_target_right,
            0.5,
        );

        let mut t_world_current_left = *t_world_left;
        let mut t_world_current_right = *t_world_right;

        // The first planned step moves the foot opposite to `flying_side`.
        let mut support_side = flying_side;

        let mut left_arrived = false;
        let mut right_arrived = false;
        let mut steps = 0;

        while (!left_arrived || !right_arrived) && steps < self.max_steps {
            steps += 1;

            let mut arrived = true;

            let t_world_support = if support_side == Side::Left {
                t_world_current_left
            } else {
                t_world_current_right
            };

            // Target of the stepping foot, expressed in the support frame.
            let stepping_target = if support_side == Side::Left {
                &self.t_world_target_right
            } else {
                &self.t_world_target_left
            };
            let mut t_support_target = t_world_support.inv_mul(stepping_target);
            t_support_target.translation.vector.z = 0.0;

            let lateral = -support_side.lateral_sign() * self.parameters.feet_spacing;
            let idle = Vector3::new(0.0, lateral, 0.0);
            let center = Vector3::new(0.0, lateral / 2.0, 0.0);

            // Rescaling the translation error into the accessibility box.
            let mut error = t_support_target.translation.vector - idle;
            let mut rescale: f64 = 1.0;

            if error.x < -self.accessibility_length {
                rescale = rescale.min(-self.accessibility_length / error.x);
                arrived = false;
            }
            if error.x > self.accessibility_length {
                rescale = rescale.min(self.accessibility_length / error.x);
                arrived = false;
            }
            if error.y < -self.accessibility_width {
                rescale = rescale.min(-self.accessibility_width / error.y);
                arrived = false;
            }
            if error.y > self.accessibility_width {
                rescale = rescale.min(self.accessibility_width / error.y);
                arrived = false;
            }

            let dist = error.norm();
            error *= rescale;

            // Step yaw: walk toward the target while it is far, align with
            // it once close.
            let mut error_yaw = if dist > self.place_threshold {
                let target_to_center =
                    t_world_support.inv_mul(&t_world_target).translation.vector - center;
                target_to_center.y.atan2(target_to_center.x)
            } else {
                frame_yaw(&t_support_target)
            };

            if error_yaw < -self.accessibility_yaw {
                arrived = false;
                error_yaw = -self.accessibility_yaw;
            }
            if error_yaw > self.accessibility_yaw {
                arrived = false;
                error_yaw = self.accessibility_yaw;
            }

            let new_step = Isometry3::from_parts(
                Translation3::from(idle + error),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), error_yaw),
            );
            let footstep =
                self.create_footstep(support_side.other(), t_world_support * new_step);
            footsteps.push(footstep.clone());

            if support_side == Side::Left {
                right_arrived = arrived;
                t_world_current_right = footstep.frame;
                support_side = Side::Right;
            } else {
                left_arrived = arrived;
                t_world_current_left = footstep.frame;
                support_side = Side::Left;
            }
        }
    }
}
