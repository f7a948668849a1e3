//! Time-indexed walk trajectory and its queries.

use nalgebra::{Isometry3, UnitQuaternion, Vector2, Vector3};

use striders_core::frames::{frame_from_xy_yaw, frame_yaw};
use striders_core::Side;
use striders_footsteps::Support;
use striders_lipm::CoMTrajectory;
use striders_spline::CubicSpline;

use crate::swing::SwingFootTrajectory;

/// One support phase of a trajectory with its time interval and, for single
/// supports, the swing foot motion flying over it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPart {
    pub support: Support,
    pub swing_trajectory: Option<SwingFootTrajectory>,
    pub t_start: f64,
    pub t_end: f64,
}

/// A planned walk: contiguous support parts covering `[t_start, t_end]`, the
/// CoM trajectory over the planning horizon, and yaw splines for both feet
/// and the trunk.
///
/// Immutable after construction apart from [`apply_transform`]
/// (Self::apply_transform); queries are safe to call concurrently from a
/// control thread holding a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// CoM trajectory (anchored at `t_start`).
    pub com: CoMTrajectory,
    /// CoM height above the floor [m].
    pub com_height: f64,
    /// Trunk pitch [rad].
    pub trunk_pitch: f64,
    /// The supports this trajectory was planned over.
    pub supports: Vec<Support>,
    /// Horizon length the CoM was planned with [timesteps].
    pub jerk_planner_timesteps: usize,
    pub t_start: f64,
    pub t_end: f64,
    pub(crate) parts: Vec<TrajectoryPart>,
    pub(crate) left_foot_yaw: CubicSpline,
    pub(crate) right_foot_yaw: CubicSpline,
    pub(crate) trunk_yaw: CubicSpline,
}

impl Trajectory {
    /// The part containing `t`; queries outside the covered interval clamp
    /// to the nearest part.
    ///
    /// Built trajectories always carry at least one part.
    pub(crate) fn part_at(&self, t: f64) -> &TrajectoryPart {
        &self.parts[self.part_index_at(t)]
    }

    fn part_index_at(&self, t: f64) -> usize {
        assert!(!self.parts.is_empty(), "trajectory must have parts");

        let mut low = 0;
        let mut high = self.parts.len() - 1;

        while low != high {
            let mid = (low + high) / 2;
            let part = &self.parts[mid];

            if t < part.t_start {
                high = mid;
            } else if t > part.t_end {
                low = mid + 1;
            } else {
                return mid;
            }
        }

        low
    }

    /// All parts, in time order.
    #[must_use]
    pub fn parts(&self) -> &[TrajectoryPart] {
        &self.parts
    }

    pub(crate) fn yaw(&self, side: Side) -> &CubicSpline {
        if side == Side::Left {
            &self.left_foot_yaw
        } else {
            &self.right_foot_yaw
        }
    }

    pub(crate) fn yaw_mut(&mut self, side: Side) -> &mut CubicSpline {
        if side == Side::Left {
            &mut self.left_foot_yaw
        } else {
            &mut self.right_foot_yaw
        }
    }

    /// Whether the given foot is in the air at `t`.
    #[must_use]
    pub fn is_flying(&self, side: Side, t: f64) -> bool {
        let support = &self.part_at(t).support;
        !support.is_both() && support.side() == side.other()
    }

    fn t_world_foot(&self, side: Side, t: f64) -> Isometry3<f64> {
        let part = self.part_at(t);
        let yaw = self.yaw(side).pos(t);

        if self.is_flying(side, t) {
            let swing = part
                .swing_trajectory
                .as_ref()
                .expect("single support part carries a swing trajectory");
            let position = swing.pos(t);
            Isometry3::from_parts(
                position.into(),
                UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw),
            )
        } else {
            let frame = part
                .support
                .footstep_frame(side)
                .expect("supporting part carries the queried side");
            frame_from_xy_yaw(frame.translation.x, frame.translation.y, yaw)
        }
    }

    /// World frame of the left foot at `t`.
    #[must_use]
    pub fn get_t_world_left(&self, t: f64) -> Isometry3<f64> {
        self.t_world_foot(Side::Left, t)
    }

    /// World frame of the right foot at `t`.
    #[must_use]
    pub fn get_t_world_right(&self, t: f64) -> Isometry3<f64> {
        self.t_world_foot(Side::Right, t)
    }

    fn v_world_foot(&self, side: Side, t: f64) -> Vector3<f64> {
        let part = self.part_at(t);
        if self.is_flying(side, t) {
            part.swing_trajectory
                .as_ref()
                .map_or_else(Vector3::zeros, |swing| swing.vel(t))
        } else {
            Vector3::zeros()
        }
    }

    /// World velocity of the left foot at `t` (zero while supporting).
    #[must_use]
    pub fn get_v_world_left(&self, t: f64) -> Vector3<f64> {
        self.v_world_foot(Side::Left, t)
    }

    /// World velocity of the right foot at `t` (zero while supporting).
    #[must_use]
    pub fn get_v_world_right(&self, t: f64) -> Vector3<f64> {
        self.v_world_foot(Side::Right, t)
    }

    /// CoM position in the world at `t` (planar CoM at `com_height`).
    #[must_use]
    pub fn get_p_world_com(&self, t: f64) -> Vector3<f64> {
        let position = self.com.pos(t);
        Vector3::new(position.x, position.y, self.com_height)
    }

    /// ZMP on the floor plane at `t`.
    #[must_use]
    pub fn get_p_world_zmp(&self, t: f64) -> Vector2<f64> {
        self.com.zmp(t)
    }

    /// DCM on the floor plane at `t`.
    #[must_use]
    pub fn get_p_world_dcm(&self, t: f64) -> Vector2<f64> {
        self.com.dcm(t)
    }

    /// Trunk orientation at `t`: yaw from the trunk spline, then the
    /// configured pitch.
    #[must_use]
    pub fn get_r_world_trunk(&self, t: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.trunk_yaw.pos(t))
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.trunk_pitch)
    }

    /// Side of the support at `t` (`Both` during double supports).
    #[must_use]
    pub fn support_side(&self, t: f64) -> Side {
        self.part_at(t).support.side()
    }

    /// Whether the support at `t` is a double support.
    #[must_use]
    pub fn support_is_both(&self, t: f64) -> bool {
        self.part_at(t).support.is_both()
    }

    /// The support at `t`.
    #[must_use]
    pub fn get_support(&self, t: f64) -> &Support {
        &self.part_at(t).support
    }

    /// The support following the one at `t` (the last one if `t` is in it).
    #[must_use]
    pub fn get_next_support(&self, t: f64) -> &Support {
        let part = self.part_at(t);
        &self.part_at(part.t_end + 1e-4).support
    }

    /// The support preceding the one at `t` (the first one if `t` is in it).
    #[must_use]
    pub fn get_prev_support(&self, t: f64) -> &Support {
        let part = self.part_at(t);
        &self.part_at(part.t_start - 1e-4).support
    }

    /// Start time of the part containing `t`.
    #[must_use]
    pub fn get_part_t_start(&self, t: f64) -> f64 {
        self.part_at(t).t_start
    }

    /// Most recent planned placement of the given foot at (or before) `t`.
    #[must_use]
    pub fn get_last_footstep_frame(&self, side: Side, t: f64) -> Option<Isometry3<f64>> {
        let index = self.part_index_at(t);
        self.parts[..=index]
            .iter()
            .rev()
            .find_map(|part| part.support.footstep_frame(side))
    }

    /// Move the whole plan by a world transform: supports, swing curves,
    /// CoM and yaw tracks.
    pub fn apply_transform(&mut self, transform: &Isometry3<f64>) {
        let yaw_offset = frame_yaw(transform);

        for support in &mut self.supports {
            *support = support.transformed(transform);
        }
        for part in &mut self.parts {
            part.support = part.support.transformed(transform);
            if let Some(swing) = &mut part.swing_trajectory {
                swing.apply_transform(transform);
            }
        }
        self.com.apply_transform(transform);
        self.left_foot_yaw.offset_values(yaw_offset);
        self.right_foot_yaw.offset_values(yaw_offset);
        self.trunk_yaw.offset_values(yaw_offset);
    }
}
