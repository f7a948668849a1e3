//! Closed-form polynomial fits for boundary-constrained segments.
//!
//! Coefficients are in local time `tau in [0, h]`, lowest degree first.

/// Cubic through `(p0, v0)` at `tau = 0` and `(p1, v1)` at `tau = h`.
#[must_use]
pub fn cubic(p0: f64, v0: f64, p1: f64, v1: f64, h: f64) -> [f64; 4] {
    let a = p1 - p0 - v0 * h;
    let b = v1 - v0;
    [
        p0,
        v0,
        (3.0 * a - b * h) / (h * h),
        (b * h - 2.0 * a) / (h * h * h),
    ]
}

/// Quintic through `(p0, v0, a0)` at `tau = 0` and `(p1, v1, a1)` at
/// `tau = h`.
#[must_use]
pub fn quintic(p0: f64, v0: f64, a0: f64, p1: f64, v1: f64, a1: f64, h: f64) -> [f64; 6] {
    let c2 = a0 / 2.0;
    let a = p1 - p0 - v0 * h - c2 * h * h;
    let b = v1 - v0 - a0 * h;
    let c = a1 - a0;
    let h3 = h * h * h;
    [
        p0,
        v0,
        c2,
        (20.0 * a - 8.0 * b * h + c * h * h) / (2.0 * h3),
        (-30.0 * a + 14.0 * b * h - 2.0 * c * h * h) / (2.0 * h3 * h),
        (12.0 * a - 6.0 * b * h + c * h * h) / (2.0 * h3 * h * h),
    ]
}

/// Evaluate a polynomial (lowest degree first) at `tau`.
#[must_use]
pub fn eval(coeffs: &[f64], tau: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * tau + c)
}

/// Evaluate the derivative of a polynomial (lowest degree first) at `tau`.
#[must_use]
pub fn eval_derivative(coeffs: &[f64], tau: f64) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .fold(0.0, |acc, (k, &c)| acc * tau + (k as f64) * c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cubic_hits_boundary_conditions() {
        let c = cubic(1.0, -0.5, 2.0, 0.25, 0.8);
        assert_relative_eq!(eval(&c, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(eval_derivative(&c, 0.0), -0.5, epsilon = 1e-12);
        assert_relative_eq!(eval(&c, 0.8), 2.0, epsilon = 1e-12);
        assert_relative_eq!(eval_derivative(&c, 0.8), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn quintic_hits_boundary_conditions() {
        let c = quintic(0.0, 0.3, -1.0, 1.5, 0.0, 2.0, 1.3);
        assert_relative_eq!(eval(&c, 0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(eval_derivative(&c, 0.0), 0.3, epsilon = 1e-12);
        assert_relative_eq!(eval(&c, 1.3), 1.5, epsilon = 1e-9);
        assert_relative_eq!(eval_derivative(&c, 1.3), 0.0, epsilon = 1e-9);
        // Acceleration: second derivative via finite differences.
        let dd = |t: f64| {
            let e = 1e-6;
            (eval(&c, t + e) - 2.0 * eval(&c, t) + eval(&c, t - e)) / (e * e)
        };
        assert_relative_eq!(dd(0.0), -1.0, epsilon = 1e-3);
        assert_relative_eq!(dd(1.3), 2.0, epsilon = 1e-3);
    }

    #[test]
    fn quintic_min_jerk_shape() {
        // p0=0, p1=1, zero boundary velocity/acceleration over h=1 is the
        // classic 10t^3 - 15t^4 + 6t^5 profile.
        let c = quintic(0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(c[3], 10.0, epsilon = 1e-12);
        assert_relative_eq!(c[4], -15.0, epsilon = 1e-12);
        assert_relative_eq!(c[5], 6.0, epsilon = 1e-12);
    }
}
