//! 1-D piecewise cubic keyframe spline.

use striders_core::frames::wrap_angle;

use crate::fit;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Keyframe {
    t: f64,
    position: f64,
    velocity: f64,
}

/// A 1-D cubic Hermite spline built from `(t, position, velocity)`
/// keyframes.
///
/// Keyframes must be appended in increasing time order. Evaluation outside
/// the keyframe range clamps to the nearest endpoint (zero velocity).
///
/// Angular splines unwrap each inserted value to stay within half a turn of
/// the previous keyframe, so yaw tracks never jump by 2π.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CubicSpline {
    angular: bool,
    keyframes: Vec<Keyframe>,
}

impl CubicSpline {
    /// A spline over plain scalar values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            angular: false,
            keyframes: Vec::new(),
        }
    }

    /// A spline over angles (values are unwrapped at insertion).
    #[must_use]
    pub const fn angular() -> Self {
        Self {
            angular: true,
            keyframes: Vec::new(),
        }
    }

    /// Number of keyframes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Append a keyframe. A keyframe (nearly) coincident in time with the
    /// last one replaces it.
    pub fn add_point(&mut self, t: f64, position: f64, velocity: f64) {
        let mut position = position;
        if let Some(last) = self.keyframes.last() {
            debug_assert!(t >= last.t, "keyframes must be time-ordered");
            if self.angular {
                position = last.position + wrap_angle(position - last.position);
            }
            if (t - last.t).abs() < 1e-9 {
                self.keyframes.pop();
            }
        }
        self.keyframes.push(Keyframe {
            t,
            position,
            velocity,
        });
    }

    /// Shift every keyframe value by `offset` (used when a whole plan is
    /// rotated in the world).
    pub fn offset_values(&mut self, offset: f64) {
        for keyframe in &mut self.keyframes {
            keyframe.position += offset;
        }
    }

    fn segment_at(&self, t: f64) -> Option<(&Keyframe, &Keyframe)> {
        let index = self.keyframes.partition_point(|k| k.t <= t);
        if index == 0 || index >= self.keyframes.len() {
            return None;
        }
        Some((&self.keyframes[index - 1], &self.keyframes[index]))
    }

    /// Position at `t`, clamped to the keyframe range.
    #[must_use]
    pub fn pos(&self, t: f64) -> f64 {
        let Some(first) = self.keyframes.first() else {
            return 0.0;
        };
        if t <= first.t {
            return first.position;
        }
        let last = self.keyframes.last().expect("non-empty");
        if t >= last.t {
            return last.position;
        }
        let (a, b) = self.segment_at(t).expect("t is interior");
        let coeffs = fit::cubic(a.position, a.velocity, b.position, b.velocity, b.t - a.t);
        fit::eval(&coeffs, t - a.t)
    }

    /// Velocity at `t`; zero outside the keyframe range.
    #[must_use]
    pub fn vel(&self, t: f64) -> f64 {
        let Some((a, b)) = self.segment_at(t) else {
            return 0.0;
        };
        let coeffs = fit::cubic(a.position, a.velocity, b.position, b.velocity, b.t - a.t);
        fit::eval_derivative(&coeffs, t - a.t)
    }
}
