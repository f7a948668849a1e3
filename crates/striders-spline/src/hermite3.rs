//! 3-D Hermite curves with vector knots.
//!
//! Swing foot trajectories are stored this way rather than as raw polynomial
//! coefficients: applying a rigid transform to the knots (positions mapped,
//! derivatives rotated) transforms the whole curve exactly.

use nalgebra::{Isometry3, Vector3};

use crate::fit;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CubicKnot {
    t: f64,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
}

/// Piecewise cubic 3-D curve, C¹ at the knots.
///
/// Evaluation outside the knot range clamps to the nearest endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CubicHermite3 {
    knots: Vec<CubicKnot>,
}

impl CubicHermite3 {
    #[must_use]
    pub const fn new() -> Self {
        Self { knots: Vec::new() }
    }

    pub fn add_point(&mut self, t: f64, position: Vector3<f64>, velocity: Vector3<f64>) {
        if let Some(last) = self.knots.last() {
            debug_assert!(t >= last.t, "knots must be time-ordered");
            if (t - last.t).abs() < 1e-9 {
                self.knots.pop();
            }
        }
        self.knots.push(CubicKnot {
            t,
            position,
            velocity,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    fn segment_at(&self, t: f64) -> Option<(&CubicKnot, &CubicKnot)> {
        let index = self.knots.partition_point(|k| k.t <= t);
        if index == 0 || index >= self.knots.len() {
            return None;
        }
        Some((&self.knots[index - 1], &self.knots[index]))
    }

    /// Position at `t`, clamped to the knot range.
    #[must_use]
    pub fn pos(&self, t: f64) -> Vector3<f64> {
        let Some(first) = self.knots.first() else {
            return Vector3::zeros();
        };
        if t <= first.t {
            return first.position;
        }
        let last = self.knots.last().expect("non-empty");
        if t >= last.t {
            return last.position;
        }
        let (a, b) = self.segment_at(t).expect("t is interior");
        let h = b.t - a.t;
        let tau = t - a.t;
        Vector3::from_fn(|i, _| {
            let coeffs = fit::cubic(a.position[i], a.velocity[i], b.position[i], b.velocity[i], h);
            fit::eval(&coeffs, tau)
        })
    }

    /// Velocity at `t`; zero outside the knot range.
    #[must_use]
    pub fn vel(&self, t: f64) -> Vector3<f64> {
        let Some((a, b)) = self.segment_at(t) else {
            return Vector3::zeros();
        };
        let h = b.t - a.t;
        let tau = t - a.t;
        Vector3::from_fn(|i, _| {
            let coeffs = fit::cubic(a.position[i], a.velocity[i], b.position[i], b.velocity[i], h);
            fit::eval_derivative(&coeffs, tau)
        })
    }

    /// Apply a rigid transform to the whole curve.
    pub fn apply_transform(&mut self, transform: &Isometry3<f64>) {
        for knot in &mut self.knots {
            knot.position = transform.transform_point(&knot.position.into()).coords;
            knot.velocity = transform.rotation * knot.velocity;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct QuinticKnot {
    t: f64,
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    acceleration: Vector3<f64>,
}

/// Piecewise quintic 3-D curve, C² at the knots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuinticHermite3 {
    knots: Vec<QuinticKnot>,
}

impl QuinticHermite3 {
    #[must_use]
    pub const fn new() -> Self {
        Self { knots: Vec::new() }
    }

    pub fn add_point(
        &mut self,
        t: f64,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Vector3<f64>,
    ) {
        if let Some(last) = self.knots.last() {
            debug_assert!(t >= last.t, "knots must be time-ordered");
            if (t - last.t).abs() < 1e-9 {
                self.knots.pop();
            }
        }
        self.knots.push(QuinticKnot {
            t,
            position,
            velocity,
            acceleration,
        });
    }

    fn segment_at(&self, t: f64) -> Option<(&QuinticKnot, &QuinticKnot)> {
        let index = self.knots.partition_point(|k| k.t <= t);
        if index == 0 || index >= self.knots.len() {
            return None;
        }
        Some((&self.knots[index - 1], &self.knots[index]))
    }

    /// Position at `t`, clamped to the knot range.
    #[must_use]
    pub fn pos(&self, t: f64) -> Vector3<f64> {
        let Some(first) = self.knots.first() else {
            return Vector3::zeros();
        };
        if t <= first.t {
            return first.position;
        }
        let last = self.knots.last().expect("non-empty");
        if t >= last.t {
            return last.position;
        }
        let (a, b) = self.segment_at(t).expect("t is interior");
        let h = b.t - a.t;
        let tau = t - a.t;
        Vector3::from_fn(|i, _| {
            let coeffs = fit::quintic(
                a.position[i],
                a.velocity[i],
                a.acceleration[i],
                b.position[i],
                b.velocity[i],
                b.acceleration[i],
                h,
            );
            fit::eval(&coeffs, tau)
        })
    }

    /// Velocity at `t`; zero outside the knot range.
    #[must_use]
    pub fn vel(&self, t: f64) -> Vector3<f64> {
        let Some((a, b)) = self.segment_at(t) else {
            return Vector3::zeros();
        };
        let h = b.t - a.t;
        let tau = t - a.t;
        Vector3::from_fn(|i, _| {
            let coeffs = fit::quintic(
                a.position[i],
                a.velocity[i],
                a.acceleration[i],
                b.position[i],
                b.velocity[i],
                b.acceleration[i],
                h,
            );
            fit::eval_derivative(&coeffs, tau)
        })
    }

    /// Apply a rigid transform to the whole curve.
    pub fn apply_transform(&mut self, transform: &Isometry3<f64>) {
        for knot in &mut self.knots {
            knot.position = transform.transform_point(&knot.position.into()).coords;
            knot.velocity = transform.rotation * knot.velocity;
            knot.acceleration = transform.rotation * knot.acceleration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn cubic_curve_through_knots() {
        let mut curve = CubicHermite3::new();
        curve.add_point(0.0, Vector3::zeros(), Vector3::zeros());
        curve.add_point(0.5, Vector3::new(0.05, 0.0, 0.04), Vector3::new(0.1, 0.0, 0.0));
        curve.add_point(1.0, Vector3::new(0.1, 0.0, 0.0), Vector3::zeros());

        assert_relative_eq!(curve.pos(0.0), Vector3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(
            curve.pos(0.5),
            Vector3::new(0.05, 0.0, 0.04),
            epsilon = 1e-12
        );
        assert_relative_eq!(curve.vel(0.5), Vector3::new(0.1, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(curve.pos(2.0), Vector3::new(0.1, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(curve.vel(2.0), Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn cubic_velocity_continuous_at_knots() {
        let mut curve = CubicHermite3::new();
        curve.add_point(0.0, Vector3::zeros(), Vector3::zeros());
        curve.add_point(1.0, Vector3::new(1.0, 0.0, 0.5), Vector3::new(0.2, 0.0, 0.0));
        curve.add_point(2.0, Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());

        let before = curve.vel(1.0 - 1e-9);
        let after = curve.vel(1.0 + 1e-9);
        assert_relative_eq!(before, after, epsilon = 1e-6);
    }

    #[test]
    fn transform_moves_curve() {
        let mut curve = CubicHermite3::new();
        curve.add_point(0.0, Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        curve.add_point(1.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());

        let quarter_turn = Isometry3::from_parts(
            Translation3::new(0.0, 1.0, 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
        );

        let mid_before = curve.pos(0.5);
        curve.apply_transform(&quarter_turn);
        let mid_after = curve.pos(0.5);

        let expected = quarter_turn * nalgebra::Point3::from(mid_before);
        assert_relative_eq!(mid_after.x, expected.x, epsilon = 1e-12);
        assert_relative_eq!(mid_after.y, expected.y, epsilon = 1e-12);

        // Initial velocity is rotated: +x becomes +y.
        assert_relative_eq!(
            curve.vel(0.0 + 1e-12),
            Vector3::new(0.0, 1.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn quintic_boundary_accelerations() {
        let mut curve = QuinticHermite3::new();
        curve.add_point(0.0, Vector3::zeros(), Vector3::zeros(), Vector3::zeros());
        curve.add_point(
            1.0,
            Vector3::new(0.1, 0.05, 0.0),
            Vector3::zeros(),
            Vector3::zeros(),
        );

        // Zero velocity at both ends and near-zero acceleration at the ends
        // (finite differences).
        assert_relative_eq!(curve.vel(0.0 + 1e-12).norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(curve.vel(1.0 - 1e-12).norm(), 0.0, epsilon = 1e-9);

        let e = 1e-5;
        let acc_start = (curve.pos(2.0 * e) - 2.0 * curve.pos(e) + curve.pos(0.0)) / (e * e);
        assert_relative_eq!(acc_start.norm(), 0.0, epsilon = 1e-3);
    }
}
