//! Walk pattern generator: assembles supports, CoM and swing trajectories
//! into a time-indexed plan, with online replanning.

use nalgebra::Vector2;

use striders_core::frames::frame_yaw;
use striders_core::{HumanoidParameters, Side};
use striders_footsteps::{make_supports, FootstepsPlanner, Support};
use striders_lipm::{ConstraintKind, JerkPlanner};
use striders_spline::CubicSpline;

use crate::error::WalkError;
use crate::swing::SwingFoot;
use crate::trajectory::{Trajectory, TrajectoryPart};

/// Generates walk trajectories from support sequences.
///
/// A fresh [`plan`](Self::plan) starts the CoM from rest at a given planar
/// position; [`replan`](Self::replan) anchors a new trajectory at the start
/// of the support phase currently in flight, pins the already-executed CoM
/// jerks and continues the airborne swing foot, so the handover is seamless
/// for the controller tracking the trajectory.
pub struct WalkPatternGenerator {
    parameters: HumanoidParameters,
}

impl WalkPatternGenerator {
    #[must_use]
    pub fn new(parameters: HumanoidParameters) -> Self {
        Self { parameters }
    }

    /// Walk parameters this generator was configured with.
    #[must_use]
    pub const fn parameters(&self) -> &HumanoidParameters {
        &self.parameters
    }

    /// Horizon contribution of one support [timesteps].
    fn support_timesteps(&self, support: &Support) -> usize {
        if support.footsteps.len() == 1 {
            return self.parameters.single_support_timesteps;
        }

        if support.start || support.end {
            self.parameters.startend_double_support_timesteps()
        } else {
            self.parameters.double_support_timesteps()
        }
    }

    /// Timeline contribution of one support [s].
    fn support_duration(&self, support: &Support) -> f64 {
        if support.footsteps.len() == 1 {
            return self.parameters.single_support_duration;
        }

        if support.start || support.end {
            self.parameters.startend_double_support_duration()
        } else {
            self.parameters.double_support_duration()
        }
    }

    /// Plan a fresh trajectory over `supports`, starting the CoM at rest at
    /// `com_world`.
    pub fn plan(
        &self,
        supports: Vec<Support>,
        com_world: Vector2<f64>,
        t_start: f64,
    ) -> Result<Trajectory, WalkError> {
        if supports.is_empty() {
            return Err(WalkError::EmptySupports);
        }

        log::debug!("planning a walk over {} supports from t={t_start}", supports.len());

        let mut trajectory = self.plan_com(
            supports,
            t_start,
            com_world,
            Vector2::zeros(),
            Vector2::zeros(),
            None,
            t_start,
        )?;
        self.plan_feet_trajectories(&mut trajectory, None, t_start)?;

        Ok(trajectory)
    }

    /// Replan over new `supports` while `old` is being executed.
    ///
    /// The new trajectory is anchored at the start of the part containing
    /// `t_replan`; its CoM starts from the old state there, with the jerks of
    /// `[t_start, t_replan]` pinned to the old solution.
    pub fn replan(
        &self,
        supports: Vec<Support>,
        old: &Trajectory,
        t_replan: f64,
    ) -> Result<Trajectory, WalkError> {
        if supports.is_empty() {
            return Err(WalkError::EmptySupports);
        }

        let t_start = old.get_part_t_start(t_replan);

        log::debug!(
            "replanning over {} supports at t={t_replan} (anchor t={t_start})",
            supports.len()
        );

        let mut trajectory = self.plan_com(
            supports,
            t_start,
            old.com.pos(t_start),
            old.com.vel(t_start),
            old.com.acc(t_start),
            Some(old),
            t_replan,
        )?;
        self.plan_feet_trajectories(&mut trajectory, Some(old), t_replan)?;

        Ok(trajectory)
    }

    /// Plan the CoM over the horizon and build the trajectory shell.
    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    fn plan_com(
        &self,
        supports: Vec<Support>,
        t_start: f64,
        initial_position: Vector2<f64>,
        initial_velocity: Vector2<f64>,
        initial_acceleration: Vector2<f64>,
        old: Option<&Trajectory>,
        t_replan: f64,
    ) -> Result<Trajectory, WalkError> {
        let dt = self.parameters.dt();

        // Accumulating supports until the planning horizon is filled.
        let mut timesteps = 0;
        for support in &supports {
            timesteps += self.support_timesteps(support);
            if timesteps >= self.parameters.planned_timesteps {
                break;
            }
        }

        let mut planner = JerkPlanner::new(
            timesteps,
            initial_position,
            initial_velocity,
            initial_acceleration,
            dt,
            self.parameters.omega(),
        );

        // Pinning the already-executed jerks when replanning: jerk is
        // piecewise constant, sampled a quarter step into each interval to
        // stay clear of the boundaries.
        #[allow(clippy::cast_possible_truncation)]
        let kept_timesteps: Option<usize> = old.map(|old_trajectory| {
            let kept = ((t_replan - t_start) / dt).round().max(0.0) as usize;
            let kept = kept.min(timesteps);
            for k in 0..kept {
                let t = t_start + (k as f64 + 0.25) * dt;
                planner.add_equality_constraint(
                    k,
                    old_trajectory.com.jerk(t),
                    ConstraintKind::Jerk,
                );
            }
            kept
        });

        // ZMP constraints and reference per support.
        let mut constrained = 0;
        let mut last_support = &supports[0];
        for support in &supports {
            last_support = support;
            let step_timesteps = self.support_timesteps(support);

            for k in constrained..constrained + step_timesteps {
                if kept_timesteps.map_or(true, |kept| k > kept) {
                    planner.add_polygon_constraint(
                        k,
                        support.support_polygon(),
                        ConstraintKind::Zmp,
                        self.parameters.zmp_margin,
                    );
                }

                // Soft reference steering the ZMP toward the sweet spot of
                // the support: offset in the foot frame for singles, between
                // the feet for doubles.
                let y_offset = if support.is_both() {
                    0.0
                } else {
                    support.side().lateral_sign() * self.parameters.foot_zmp_target_y
                };
                let zmp_target = support.frame().transform_point(&nalgebra::Point3::new(
                    self.parameters.foot_zmp_target_x,
                    y_offset,
                    0.0,
                ));
                planner
                    .add_equality_constraint(
                        k,
                        Vector2::new(zmp_target.x, zmp_target.y),
                        ConstraintKind::Zmp,
                    )
                    .soft(10.0);
            }

            constrained += step_timesteps;
            if constrained >= timesteps {
                break;
            }
        }

        // Reaching the final support at rest.
        if last_support.end {
            let target = last_support.frame().translation;
            planner.add_equality_constraint(
                timesteps - 1,
                Vector2::new(target.x, target.y),
                ConstraintKind::Position,
            );
            planner.add_equality_constraint(
                timesteps - 1,
                Vector2::zeros(),
                ConstraintKind::Velocity,
            );
            planner.add_equality_constraint(
                timesteps - 1,
                Vector2::zeros(),
                ConstraintKind::Acceleration,
            );
        }

        let mut com = planner.plan()?;
        com.t_start = t_start;

        Ok(Trajectory {
            com,
            com_height: self.parameters.walk_com_height,
            trunk_pitch: self.parameters.walk_trunk_pitch,
            supports,
            jerk_planner_timesteps: timesteps,
            t_start,
            t_end: t_start,
            parts: Vec::new(),
            left_foot_yaw: CubicSpline::angular(),
            right_foot_yaw: CubicSpline::angular(),
            trunk_yaw: CubicSpline::angular(),
        })
    }

    /// Yaw keyframes for every footstep of a support.
    fn add_supports(trajectory: &mut Trajectory, t: f64, support: &Support) {
        for footstep in &support.footsteps {
            trajectory
                .yaw_mut(footstep.side)
                .add_point(t, frame_yaw(&footstep.frame), 0.0);
        }
    }

    /// Walk the supports, generating swing trajectories and yaw keyframes,
    /// and record the timed parts.
    #[allow(clippy::too_many_lines)]
    fn plan_feet_trajectories(
        &self,
        trajectory: &mut Trajectory,
        old: Option<&Trajectory>,
        t_replan: f64,
    ) -> Result<(), WalkError> {
        let supports = trajectory.supports.clone();
        let mut t = trajectory.t_start;

        // Initial keyframes for the feet currently on the ground.
        Self::add_supports(trajectory, t, &supports[0]);
        trajectory
            .trunk_yaw
            .add_point(t, frame_yaw(&supports[0].frame()), 0.0);

        if !supports[0].is_both() {
            // Starting in a single support: the flying foot state can only
            // come from the trajectory being replanned.
            let old = old.ok_or(WalkError::SwingWithoutHistory)?;
            let side = supports[0].side().other();
            trajectory
                .yaw_mut(side)
                .add_point(t, old.yaw(side).pos(t), 0.0);
        }

        let mut parts = Vec::with_capacity(supports.len());

        for (step, support) in supports.iter().enumerate() {
            let part_t_start = t;
            let mut swing_trajectory = None;

            if support.is_both() {
                t += self.support_duration(support);

                Self::add_supports(trajectory, t, support);
                trajectory
                    .trunk_yaw
                    .add_point(t, frame_yaw(&support.frame()), 0.0);
            } else {
                let flying_side = support.side().other();

                let t_world_flying_target = supports
                    .get(step + 1)
                    .and_then(|next| next.footstep_frame(flying_side))
                    .ok_or(WalkError::DanglingSingleSupport)?;

                t += self.parameters.single_support_duration;

                if support.start || step == 0 {
                    // Continuing an in-flight swing from the old trajectory,
                    // re-targeted on the (possibly revised) landing.
                    let old = old.ok_or(WalkError::SwingWithoutHistory)?;
                    let old_swing = old
                        .part_at(t_replan)
                        .swing_trajectory
                        .as_ref()
                        .ok_or(WalkError::SwingWithoutHistory)?;

                    swing_trajectory = Some(SwingFoot::remake_trajectory(
                        old_swing,
                        t_replan,
                        t_world_flying_target.translation.vector,
                    ));
                } else {
                    let t_world_start_target = supports[step - 1]
                        .footstep_frame(flying_side)
                        .ok_or(WalkError::DanglingSingleSupport)?;

                    swing_trajectory = Some(SwingFoot::make_trajectory(
                        t - self.parameters.single_support_duration,
                        t,
                        self.parameters.walk_foot_height,
                        t_world_start_target.translation.vector,
                        t_world_flying_target.translation.vector,
                    ));
                }

                trajectory
                    .yaw_mut(flying_side)
                    .add_point(t, frame_yaw(&t_world_flying_target), 0.0);

                // Without double support phases the trunk turns during the
                // swings, following the landing orientations.
                if self.parameters.double_support_duration() < self.parameters.dt() {
                    trajectory
                        .trunk_yaw
                        .add_point(t, frame_yaw(&t_world_flying_target), 0.0);
                }

                Self::add_supports(trajectory, t, support);
            }

            parts.push(TrajectoryPart {
                support: support.clone(),
                swing_trajectory,
                t_start: part_t_start,
                t_end: t,
            });
        }

        trajectory.parts = parts;
        trajectory.t_end = t;

        Ok(())
    }

    /// Whether the footstep placements of `trajectory` can be replanned at
    /// `t_replan`: only during a single support phase followed by another
    /// single support, and never from the final support.
    #[must_use]
    pub fn can_replan_supports(&self, trajectory: &Trajectory, t_replan: f64) -> bool {
        if trajectory.get_support(t_replan).end {
            return false;
        }

        let current = trajectory.get_support(t_replan);
        let next = trajectory.get_next_support(t_replan);

        !current.is_both() && !next.is_both()
    }

    /// Replan the footstep placements while walking: plans new footsteps
    /// from the current single support and the in-flight landing, and wraps
    /// them into supports continuing the current phase.
    pub fn replan_supports(
        &self,
        planner: &dyn FootstepsPlanner,
        trajectory: &Trajectory,
        t_replan: f64,
    ) -> Result<Vec<Support>, WalkError> {
        if !self.can_replan_supports(trajectory, t_replan) {
            return Err(WalkError::UnreplannableSupports(t_replan));
        }

        let current = trajectory.get_support(t_replan);
        let next = trajectory.get_next_support(t_replan);

        let flying_side = current.side();
        let (t_world_left, t_world_right) = if flying_side == Side::Left {
            (
                current
                    .footstep_frame(Side::Left)
                    .ok_or(WalkError::DanglingSingleSupport)?,
                next.footstep_frame(Side::Right)
                    .ok_or(WalkError::DanglingSingleSupport)?,
            )
        } else {
            (
                next.footstep_frame(Side::Left)
                    .ok_or(WalkError::DanglingSingleSupport)?,
                current
                    .footstep_frame(Side::Right)
                    .ok_or(WalkError::DanglingSingleSupport)?,
            )
        };

        let footsteps = planner.plan(flying_side, &t_world_left, &t_world_right);

        Ok(make_supports(&footsteps, false, false, true))
    }
}
