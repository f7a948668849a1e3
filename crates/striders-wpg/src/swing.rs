//! Cubic swing foot trajectory.

use nalgebra::{Isometry3, Vector3};

use striders_spline::CubicHermite3;

/// A planned swing foot motion: C¹ 3-D curve between two placements with a
/// mid-swing apex. Evaluation clamps outside `[t_start, t_end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwingFootTrajectory {
    pub t_start: f64,
    pub t_end: f64,
    curve: CubicHermite3,
}

impl SwingFootTrajectory {
    /// Foot position at `t`.
    #[must_use]
    pub fn pos(&self, t: f64) -> Vector3<f64> {
        self.curve.pos(t)
    }

    /// Foot velocity at `t`.
    #[must_use]
    pub fn vel(&self, t: f64) -> Vector3<f64> {
        self.curve.vel(t)
    }

    /// Move the whole swing by a world transform.
    pub fn apply_transform(&mut self, transform: &Isometry3<f64>) {
        self.curve.apply_transform(transform);
    }
}

/// Cubic swing foot fitting.
///
/// x and y follow a single cubic with zero velocity at both ends; z is split
/// into two cubics joined at mid-swing at the apex height, with position and
/// velocity continuous there.
pub struct SwingFoot;

impl SwingFoot {
    /// Fit a swing from `start` to `target`, rising `height` above the
    /// higher of the two.
    #[must_use]
    pub fn make_trajectory(
        t_start: f64,
        t_end: f64,
        height: f64,
        start: Vector3<f64>,
        target: Vector3<f64>,
    ) -> SwingFootTrajectory {
        let duration = t_end - t_start;
        let t_mid = (t_start + t_end) / 2.0;
        let apex = start.z.max(target.z) + height;

        // Mid-swing knot reproducing the single x/y cubic exactly: a cubic
        // with zero boundary velocities passes through the midpoint with
        // velocity 1.5 * delta / T.
        let mid_position = Vector3::new(
            (start.x + target.x) / 2.0,
            (start.y + target.y) / 2.0,
            apex,
        );
        let mid_velocity = Vector3::new(
            1.5 * (target.x - start.x) / duration,
            1.5 * (target.y - start.y) / duration,
            0.0,
        );

        let mut curve = CubicHermite3::new();
        curve.add_point(t_start, start, Vector3::zeros());
        curve.add_point(t_mid, mid_position, mid_velocity);
        curve.add_point(t_end, target, Vector3::zeros());

        SwingFootTrajectory {
            t_start,
            t_end,
            curve,
        }
    }

    /// Fit a swing starting with a given velocity (no apex shaping); lands
    /// on `target` with zero velocity.
    #[must_use]
    pub fn make_trajectory_from_initial_velocity(
        t_start: f64,
        t_end: f64,
        start: Vector3<f64>,
        target: Vector3<f64>,
        start_velocity: Vector3<f64>,
    ) -> SwingFootTrajectory {
        let mut curve = CubicHermite3::new();
        curve.add_point(t_start, start, start_velocity);
        curve.add_point(t_end, target, Vector3::zeros());

        SwingFootTrajectory {
            t_start,
            t_end,
            curve,
        }
    }

    /// Re-fit an in-flight swing toward a new target.
    ///
    /// The new trajectory starts at `t` from the old one's position and
    /// velocity there (C¹ continuation) and lands on `target` at the
    /// unchanged `t_end`.
    #[must_use]
    pub fn remake_trajectory(
        old: &SwingFootTrajectory,
        t: f64,
        target: Vector3<f64>,
    ) -> SwingFootTrajectory {
        Self::make_trajectory_from_initial_velocity(
            t,
            old.t_end,
            old.pos(t),
            target,
            old.vel(t),
        )
    }
}
