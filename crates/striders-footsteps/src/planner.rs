//! Footsteps planner scaffold shared by the concrete strategies.

use nalgebra::Isometry3;

use striders_core::{HumanoidParameters, Side};

use crate::footstep::{Footstep, Support};

/// Strategy interface for laying footsteps on the floor.
///
/// [`plan`](Self::plan) always returns a list starting with the two current
/// footsteps (the support side first, then the side that will be lifted
/// first), followed by the planned placements, strictly alternating sides.
pub trait FootstepsPlanner {
    /// Walk parameters this planner was configured with.
    fn parameters(&self) -> &HumanoidParameters;

    /// Append the planned footsteps after the two initial ones.
    fn plan_impl(
        &self,
        footsteps: &mut Vec<Footstep>,
        flying_side: Side,
        t_world_left: &Isometry3<f64>,
        t_world_right: &Isometry3<f64>,
    );

    /// Generate the footsteps.
    ///
    /// `flying_side` is the side of the foot the plan pivots on first;
    /// `t_world_left` / `t_world_right` are the current foot frames.
    fn plan(
        &self,
        flying_side: Side,
        t_world_left: &Isometry3<f64>,
        t_world_right: &Isometry3<f64>,
    ) -> Vec<Footstep> {
        let frame_for = |side: Side| {
            if side == Side::Left {
                *t_world_left
            } else {
                *t_world_right
            }
        };

        let support_side = flying_side.other();
        let mut footsteps = vec![
            self.create_footstep(support_side, frame_for(support_side)),
            self.create_footstep(flying_side, frame_for(flying_side)),
        ];

        self.plan_impl(&mut footsteps, flying_side, t_world_left, t_world_right);

        footsteps
    }

    /// A footstep with this planner's foot dimensions.
    fn create_footstep(&self, side: Side, t_world_foot: Isometry3<f64>) -> Footstep {
        let parameters = self.parameters();
        Footstep::new(
            side,
            t_world_foot,
            parameters.foot_width,
            parameters.foot_length,
        )
    }

    /// The footstep of the opposite side in its neutral position (at
    /// `feet_spacing` from `footstep`), offset by `(d_x, d_y, d_theta)` in
    /// the footstep frame.
    fn neutral_opposite_footstep(
        &self,
        footstep: &Footstep,
        d_x: f64,
        d_y: f64,
        d_theta: f64,
    ) -> Footstep {
        let frame =
            self.parameters()
                .opposite_frame(footstep.side, &footstep.frame, d_x, d_y, d_theta);
        self.create_footstep(footstep.side.other(), frame)
    }

    /// Same as [`neutral_opposite_footstep`](Self::neutral_opposite_footstep)
    /// with the step command clipped into the accessibility ellipsoid.
    fn clipped_neutral_opposite_footstep(
        &self,
        footstep: &Footstep,
        d_x: f64,
        d_y: f64,
        d_theta: f64,
    ) -> Footstep {
        let clipped = self
            .parameters()
            .ellipsoid_clip(nalgebra::Vector3::new(d_x, d_y, d_theta));
        self.neutral_opposite_footstep(footstep, clipped.x, clipped.y, clipped.z)
    }
}

/// Generate the support phases from a footstep list.
///
/// * `start` prepends a double support made of the two initial footsteps,
///   marked `start`.
/// * `middle` inserts a double support between consecutive steps.
/// * `end` appends a final double support, marked `end`.
///
/// Every footstep after the first yields a single support carrying it (the
/// placement being stood on once it has been stepped onto), so consumers can
/// read the next planned placement from the following support. The first
/// support of the returned plan is always marked `start`.
#[must_use]
pub fn make_supports(footsteps: &[Footstep], start: bool, middle: bool, end: bool) -> Vec<Support> {
    let mut supports = Vec::new();
    let n = footsteps.len();

    if n < 2 {
        return supports;
    }

    if start {
        let mut support = Support::new(vec![footsteps[0].clone(), footsteps[1].clone()]);
        support.start = true;
        supports.push(support);
    }

    for step in 1..n {
        supports.push(Support::new(vec![footsteps[step].clone()]));

        if step < n - 1 {
            if middle {
                supports.push(Support::new(vec![
                    footsteps[step].clone(),
                    footsteps[step + 1].clone(),
                ]));
            }
        } else if end {
            let mut support =
                Support::new(vec![footsteps[step - 1].clone(), footsteps[step].clone()]);
            support.end = true;
            supports.push(support);
        }
    }

    if let Some(first) = supports.first_mut() {
        first.start = true;
    }

    supports
}

/// Prepend `support` to a support plan, transferring the `start` mark.
pub fn add_first_support(supports: &mut Vec<Support>, mut support: Support) {
    if let Some(first) = supports.first_mut() {
        first.start = false;
    }
    support.start = true;
    supports.insert(0, support);
}

#[cfg(test)]
mod tests {
    use super::*;
    use striders_core::frames::frame_from_xy_yaw;

    struct StubPlanner {
        parameters: HumanoidParameters,
    }

    impl FootstepsPlanner for StubPlanner {
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
            // Two fixed steps, alternating from the last initial footstep.
            for _ in 0..2 {
                let last = footsteps.last().expect("initial footsteps present").clone();
                footsteps.push(self.neutral_opposite_footstep(&last, 0.05, 0.0, 0.0));
            }
        }
    }

    fn planner() -> StubPlanner {
        StubPlanner {
            parameters: HumanoidParameters::default(),
        }
    }

    fn initial_frames(parameters: &HumanoidParameters) -> (Isometry3<f64>, Isometry3<f64>) {
        (
            frame_from_xy_yaw(0.0, parameters.feet_spacing / 2.0, 0.0),
            frame_from_xy_yaw(0.0, -parameters.feet_spacing / 2.0, 0.0),
        )
    }

    #[test]
    fn plan_starts_with_current_feet() {
        let planner = planner();
        let (left, right) = initial_frames(planner.parameters());
        let footsteps = planner.plan(Side::Right, &left, &right);

        assert_eq!(footsteps[0].side, Side::Left);
        assert_eq!(footsteps[0].frame, left);
        assert_eq!(footsteps[1].side, Side::Right);
        assert_eq!(footsteps[1].frame, right);
        // Strict side alternation all the way through.
        for pair in footsteps.windows(2) {
            assert_eq!(pair[0].side, pair[1].side.other());
        }
    }

    #[test]
    fn neutral_opposite_is_at_feet_spacing() {
        let planner = planner();
        let spacing = planner.parameters().feet_spacing;
        let left = planner.create_footstep(Side::Left, frame_from_xy_yaw(0.0, spacing / 2.0, 0.0));
        let right = planner.neutral_opposite_footstep(&left, 0.0, 0.0, 0.0);
        assert_eq!(right.side, Side::Right);
        approx::assert_relative_eq!(right.frame.translation.y, -spacing / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn clipped_opposite_respects_bounds() {
        let planner = planner();
        let left = planner.create_footstep(Side::Left, frame_from_xy_yaw(0.0, 0.075, 0.0));
        let clipped = planner.clipped_neutral_opposite_footstep(&left, 1.0, 0.0, 0.0);
        let max = planner.parameters().walk_max_dx_forward;
        assert!(clipped.frame.translation.x <= max + 1e-9);
    }

    #[test]
    fn make_supports_full_sequence() {
        let planner = planner();
        let (left, right) = initial_frames(planner.parameters());
        let footsteps = planner.plan(Side::Right, &left, &right);
        let n = footsteps.len();

        let supports = make_supports(&footsteps, true, true, true);

        assert_eq!(supports.len(), 2 * n - 1);
        assert!(supports[0].is_both() && supports[0].start);
        assert!(supports.last().unwrap().is_both() && supports.last().unwrap().end);
        // Alternating doubles and singles.
        for (i, support) in supports.iter().enumerate() {
            assert_eq!(support.is_both(), i % 2 == 0);
        }
        // Double supports pair opposite sides.
        for support in supports.iter().filter(|s| s.is_both()) {
            assert_eq!(
                support.footsteps[0].side,
                support.footsteps[1].side.other()
            );
        }
    }

    #[test]
    fn make_supports_no_middle() {
        let planner = planner();
        let (left, right) = initial_frames(planner.parameters());
        let footsteps = planner.plan(Side::Right, &left, &right);
        let n = footsteps.len();

        let supports = make_supports(&footsteps, false, false, true);

        // One single per footstep after the first, plus the end double.
        assert_eq!(supports.len(), n);
        assert!(!supports[0].is_both());
        assert!(supports[0].start, "first support of a plan is marked start");
        assert!(supports.last().unwrap().end);
    }

    #[test]
    fn add_first_support_transfers_start() {
        let planner = planner();
        let (left, right) = initial_frames(planner.parameters());
        let footsteps = planner.plan(Side::Right, &left, &right);
        let mut supports = make_supports(&footsteps, false, false, true);

        let current = Support::new(vec![footsteps[0].clone()]);
        add_first_support(&mut supports, current);

        assert!(supports[0].start);
        assert!(!supports[1].start);
    }
}
