//! Piecewise CoM trajectory produced by the jerk planner.

use nalgebra::{Isometry3, Rotation2, Vector2};

use striders_core::frames::frame_yaw;

/// Planar second-order state of one timestep boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StepState {
    position: Vector2<f64>,
    velocity: Vector2<f64>,
    acceleration: Vector2<f64>,
}

/// CoM trajectory over the planning horizon: a piecewise-constant jerk per
/// timestep, integrated into acceleration, velocity and position.
///
/// Queries are clamped to `[t_start, t_start + timesteps * dt]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoMTrajectory {
    /// Time the trajectory is anchored at.
    pub t_start: f64,
    dt: f64,
    omega: f64,
    /// States at each timestep boundary (`timesteps + 1` entries).
    states: Vec<StepState>,
    /// One jerk per timestep.
    jerks: Vec<Vector2<f64>>,
}

impl CoMTrajectory {
    /// Integrate a trajectory from an initial state and the per-timestep
    /// jerks.
    #[must_use]
    pub fn from_jerks(
        t_start: f64,
        dt: f64,
        omega: f64,
        initial_position: Vector2<f64>,
        initial_velocity: Vector2<f64>,
        initial_acceleration: Vector2<f64>,
        jerks: Vec<Vector2<f64>>,
    ) -> Self {
        let mut states = Vec::with_capacity(jerks.len() + 1);
        let mut state = StepState {
            position: initial_position,
            velocity: initial_velocity,
            acceleration: initial_acceleration,
        };
        states.push(state);

        for jerk in &jerks {
            state = StepState {
                position: state.position
                    + state.velocity * dt
                    + state.acceleration * dt * dt / 2.0
                    + jerk * dt * dt * dt / 6.0,
                velocity: state.velocity + state.acceleration * dt + jerk * dt * dt / 2.0,
                acceleration: state.acceleration + jerk * dt,
            };
            states.push(state);
        }

        Self {
            t_start,
            dt,
            omega,
            states,
            jerks,
        }
    }

    /// Number of timesteps.
    #[must_use]
    pub fn timesteps(&self) -> usize {
        self.jerks.len()
    }

    /// Duration covered by the trajectory [s].
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.dt * self.jerks.len() as f64
    }

    /// End time of the trajectory.
    #[must_use]
    pub fn t_end(&self) -> f64 {
        self.t_start + self.duration()
    }

    /// Pendulum natural frequency this trajectory was planned with.
    #[must_use]
    pub const fn omega(&self) -> f64 {
        self.omega
    }

    /// Locate the timestep containing `t` and the local offset into it.
    fn step_at(&self, t: f64) -> (usize, f64) {
        let elapsed = (t - self.t_start).clamp(0.0, self.duration());
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let step = ((elapsed / self.dt) as usize).min(self.jerks.len().saturating_sub(1));
        (step, elapsed - step as f64 * self.dt)
    }

    /// CoM position at `t`.
    #[must_use]
    pub fn pos(&self, t: f64) -> Vector2<f64> {
        let (step, tau) = self.step_at(t);
        let state = &self.states[step];
        state.position
            + state.velocity * tau
            + state.acceleration * tau * tau / 2.0
            + self.jerks[step] * tau * tau * tau / 6.0
    }

    /// CoM velocity at `t`.
    #[must_use]
    pub fn vel(&self, t: f64) -> Vector2<f64> {
        let (step, tau) = self.step_at(t);
        let state = &self.states[step];
        state.velocity + state.acceleration * tau + self.jerks[step] * tau * tau / 2.0
    }

    /// CoM acceleration at `t`.
    #[must_use]
    pub fn acc(&self, t: f64) -> Vector2<f64> {
        let (step, tau) = self.step_at(t);
        let state = &self.states[step];
        state.acceleration + self.jerks[step] * tau
    }

    /// CoM jerk at `t` (piecewise constant).
    #[must_use]
    pub fn jerk(&self, t: f64) -> Vector2<f64> {
        let (step, _) = self.step_at(t);
        self.jerks[step]
    }

    /// Zero-moment point at `t`: `p - a / omega^2`.
    #[must_use]
    pub fn zmp(&self, t: f64) -> Vector2<f64> {
        self.pos(t) - self.acc(t) / (self.omega * self.omega)
    }

    /// ZMP velocity at `t`: `v - j / omega^2`.
    #[must_use]
    pub fn dzmp(&self, t: f64) -> Vector2<f64> {
        self.vel(t) - self.jerk(t) / (self.omega * self.omega)
    }

    /// Divergent component of motion at `t`: `p + v / omega`.
    #[must_use]
    pub fn dcm(&self, t: f64) -> Vector2<f64> {
        self.pos(t) + self.vel(t) / self.omega
    }

    /// Move the whole trajectory by a world transform (its planar part).
    pub fn apply_transform(&mut self, transform: &Isometry3<f64>) {
        let rotation = Rotation2::new(frame_yaw(transform));
        let translation = Vector2::new(transform.translation.x, transform.translation.y);

        for state in &mut self.states {
            state.position = rotation * state.position + translation;
            state.velocity = rotation * state.velocity;
            state.acceleration = rotation * state.acceleration;
        }
        for jerk in &mut self.jerks {
            *jerk = rotation * *jerk;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use striders_core::frames::frame_from_xy_yaw;

    fn constant_jerk_trajectory() -> CoMTrajectory {
        CoMTrajectory::from_jerks(
            1.0,
            0.1,
            4.0,
            Vector2::new(0.5, -0.2),
            Vector2::new(0.1, 0.0),
            Vector2::zeros(),
            vec![Vector2::new(1.0, 0.5); 10],
        )
    }

    #[test]
    fn initial_state_is_respected() {
        let com = constant_jerk_trajectory();
        assert_relative_eq!(com.pos(1.0), Vector2::new(0.5, -0.2), epsilon = 1e-12);
        assert_relative_eq!(com.vel(1.0), Vector2::new(0.1, 0.0), epsilon = 1e-12);
        assert_relative_eq!(com.acc(1.0), Vector2::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn closed_form_constant_jerk() {
        let com = constant_jerk_trajectory();
        // With constant jerk j: p(t) = p0 + v0 t + j t^3 / 6.
        let t = 0.35;
        let expected_x = 0.5 + 0.1 * t + 1.0 * t * t * t / 6.0;
        assert_relative_eq!(com.pos(1.0 + t).x, expected_x, epsilon = 1e-9);
        assert_relative_eq!(com.vel(1.0 + t).x, 0.1 + 1.0 * t * t / 2.0, epsilon = 1e-9);
        assert_relative_eq!(com.acc(1.0 + t).x, 1.0 * t, epsilon = 1e-9);
    }

    #[test]
    fn zmp_and_dcm_identities() {
        let com = constant_jerk_trajectory();
        for t in [1.0, 1.25, 1.61, 2.0] {
            let omega = com.omega();
            assert_relative_eq!(
                com.zmp(t),
                com.pos(t) - com.acc(t) / (omega * omega),
                epsilon = 1e-12
            );
            assert_relative_eq!(
                com.dcm(t),
                com.pos(t) + com.vel(t) / omega,
                epsilon = 1e-12
            );
            assert_relative_eq!(
                com.dzmp(t),
                com.vel(t) - com.jerk(t) / (omega * omega),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn queries_clamp_to_horizon() {
        let com = constant_jerk_trajectory();
        assert_relative_eq!(com.pos(0.0), com.pos(1.0), epsilon = 1e-12);
        assert_relative_eq!(com.pos(10.0), com.pos(com.t_end()), epsilon = 1e-12);
        assert_relative_eq!(com.vel(10.0), com.vel(com.t_end()), epsilon = 1e-12);
    }

    #[test]
    fn continuity_across_steps() {
        let com = CoMTrajectory::from_jerks(
            0.0,
            0.1,
            4.0,
            Vector2::zeros(),
            Vector2::zeros(),
            Vector2::zeros(),
            vec![
                Vector2::new(1.0, -1.0),
                Vector2::new(-2.0, 0.5),
                Vector2::new(0.3, 0.3),
            ],
        );
        for boundary in [0.1, 0.2] {
            assert_relative_eq!(
                com.pos(boundary - 1e-9),
                com.pos(boundary + 1e-9),
                epsilon = 1e-7
            );
            assert_relative_eq!(
                com.vel(boundary - 1e-9),
                com.vel(boundary + 1e-9),
                epsilon = 1e-7
            );
            assert_relative_eq!(
                com.acc(boundary - 1e-9),
                com.acc(boundary + 1e-9),
                epsilon = 1e-7
            );
        }
    }

    #[test]
    fn transform_rotates_states() {
        let mut com = constant_jerk_trajectory();
        let pos_before = com.pos(1.3);
        let vel_before = com.vel(1.3);

        com.apply_transform(&frame_from_xy_yaw(1.0, 2.0, std::f64::consts::FRAC_PI_2));

        let pos_after = com.pos(1.3);
        let vel_after = com.vel(1.3);
        // 90° rotation plus translation: (x, y) -> (1 - y, 2 + x).
        assert_relative_eq!(pos_after.x, 1.0 - pos_before.y, epsilon = 1e-9);
        assert_relative_eq!(pos_after.y, 2.0 + pos_before.x, epsilon = 1e-9);
        assert_relative_eq!(vel_after.x, -vel_before.y, epsilon = 1e-9);
        assert_relative_eq!(vel_after.y, vel_before.x, epsilon = 1e-9);
    }
}
