//! Quintic swing foot trajectory.
//!
//! Same end-placement contract as the cubic variant, with zero velocity and
//! zero acceleration at both ends and acceleration continuity at the apex —
//! for gaits where jerk at touch-down matters.

use nalgebra::{Isometry3, Vector3};

use striders_spline::QuinticHermite3;

/// A C² swing foot motion. Evaluation clamps outside `[t_start, t_end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwingFootQuinticTrajectory {
    pub t_start: f64,
    pub t_end: f64,
    curve: QuinticHermite3,
}

impl SwingFootQuinticTrajectory {
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

pub struct SwingFootQuintic;

impl SwingFootQuintic {
    /// Fit a swing from `start` to `target`, rising `height` above the
    /// higher of the two.
    #[must_use]
    pub fn make_trajectory(
        t_start: f64,
        t_end: f64,
        height: f64,
        start: Vector3<f64>,
        target: Vector3<f64>,
    ) -> SwingFootQuinticTrajectory {
        let duration = t_end - t_start;
        let t_mid = (t_start + t_end) / 2.0;
        let apex = start.z.max(target.z) + height;

        // Mid-swing knot reproducing the single x/y quintic exactly: the
        // min-jerk profile passes the midpoint with velocity
        // 1.875 * delta / T and zero acceleration.
        let delta = target - start;
        let mid_position = Vector3::new(
            start.x + delta.x / 2.0,
            start.y + delta.y / 2.0,
            apex,
        );
        let mid_velocity = Vector3::new(
            1.875 * delta.x / duration,
            1.875 * delta.y / duration,
            0.0,
        );

        let mut curve = QuinticHermite3::new();
        curve.add_point(t_start, start, Vector3::zeros(), Vector3::zeros());
        curve.add_point(t_mid, mid_position, mid_velocity, Vector3::zeros());
        curve.add_point(t_end, target, Vector3::zeros(), Vector3::zeros());

        SwingFootQuinticTrajectory {
            t_start,
            t_end,
            curve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn endpoints_velocity_and_acceleration() {
        let start = Vector3::new(0.0, 0.0, 0.0);
        let target = Vector3::new(0.1, 0.02, 0.0);
        let swing = SwingFootQuintic::make_trajectory(0.0, 1.0, 0.05, start, target);

        assert_relative_eq!(swing.pos(0.0), start, epsilon = 1e-12);
        assert_relative_eq!(swing.pos(1.0), target, epsilon = 1e-12);
        assert_relative_eq!(swing.vel(0.0).norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(swing.vel(1.0).norm(), 0.0, epsilon = 1e-12);

        // Zero boundary acceleration, by finite differences.
        let e = 1e-5;
        let acc_start = (swing.pos(2.0 * e) - 2.0 * swing.pos(e) + swing.pos(0.0)) / (e * e);
        let acc_end =
            (swing.pos(1.0) - 2.0 * swing.pos(1.0 - e) + swing.pos(1.0 - 2.0 * e)) / (e * e);
        assert_relative_eq!(acc_start.norm(), 0.0, epsilon = 1e-3);
        assert_relative_eq!(acc_end.norm(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn apex_at_midpoint() {
        let start = Vector3::zeros();
        let target = Vector3::new(0.1, 0.0, 0.0);
        let swing = SwingFootQuintic::make_trajectory(0.0, 0.6, 0.04, start, target);

        assert_relative_eq!(swing.pos(0.3).z, 0.04, epsilon = 1e-12);
        assert_relative_eq!(swing.vel(0.3).z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn xy_follows_min_jerk_profile() {
        let start = Vector3::zeros();
        let target = Vector3::new(0.1, 0.0, 0.0);
        let swing = SwingFootQuintic::make_trajectory(0.0, 1.0, 0.05, start, target);

        for u in [0.2f64, 0.5, 0.8] {
            let s = 10.0 * u.powi(3) - 15.0 * u.powi(4) + 6.0 * u.powi(5);
            assert_relative_eq!(swing.pos(u).x, 0.1 * s, epsilon = 1e-9);
        }
    }

    #[test]
    fn acceleration_continuous_at_apex() {
        let start = Vector3::zeros();
        let target = Vector3::new(0.1, 0.0, 0.0);
        let swing = SwingFootQuintic::make_trajectory(0.0, 1.0, 0.05, start, target);

        let e = 1e-5;
        let acc = |t: f64| (swing.pos(t + e) - 2.0 * swing.pos(t) + swing.pos(t - e)) / (e * e);
        assert_relative_eq!(acc(0.5 - 1e-3), acc(0.5 + 1e-3), epsilon = 1e-2);
    }
}
