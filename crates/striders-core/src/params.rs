use nalgebra::{Isometry3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::frames::frame_from_xy_yaw;
use crate::side::Side;

/// Standard gravity [m/s^2].
pub const GRAVITY: f64 = 9.80665;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_single_support_duration() -> f64 {
    1.0
}
const fn default_single_support_timesteps() -> usize {
    10
}
const fn default_double_support_ratio() -> f64 {
    1.0
}
const fn default_startend_double_support_ratio() -> f64 {
    1.0
}
const fn default_planned_timesteps() -> usize {
    100
}
const fn default_replan_timesteps() -> usize {
    10
}
const fn default_zmp_margin() -> f64 {
    0.025
}
const fn default_walk_foot_height() -> f64 {
    0.05
}
const fn default_walk_com_height() -> f64 {
    0.4
}
const fn default_walk_trunk_pitch() -> f64 {
    0.0
}
const fn default_walk_max_dx_forward() -> f64 {
    0.08
}
const fn default_walk_max_dx_backward() -> f64 {
    0.03
}
const fn default_walk_max_dy() -> f64 {
    0.04
}
const fn default_walk_max_dtheta() -> f64 {
    0.35
}
const fn default_pendulum_height() -> f64 {
    0.4
}
const fn default_feet_spacing() -> f64 {
    0.15
}
const fn default_foot_width() -> f64 {
    0.1
}
const fn default_foot_length() -> f64 {
    0.15
}
const fn default_foot_zmp_target_x() -> f64 {
    0.0
}
const fn default_foot_zmp_target_y() -> f64 {
    0.0
}

// ---------------------------------------------------------------------------
// HumanoidParameters
// ---------------------------------------------------------------------------

/// Timing and geometry constants parametrizing footstep planning and walk
/// pattern generation.
///
/// This is a plain data bundle shared read-only by every planner; derived
/// quantities ([`dt`](Self::dt), [`omega`](Self::omega), timestep counts) are
/// recomputed on each call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanoidParameters {
    /// Single support duration [s].
    #[serde(default = "default_single_support_duration")]
    pub single_support_duration: f64,

    /// Number of planning timesteps during one single support.
    #[serde(default = "default_single_support_timesteps")]
    pub single_support_timesteps: usize,

    /// Duration ratio between a double support and a single support.
    #[serde(default = "default_double_support_ratio")]
    pub double_support_ratio: f64,

    /// Duration ratio between the first/last double support and a single
    /// support.
    #[serde(default = "default_startend_double_support_ratio")]
    pub startend_double_support_ratio: f64,

    /// Planning horizon for the CoM trajectory [timesteps].
    #[serde(default = "default_planned_timesteps")]
    pub planned_timesteps: usize,

    /// Number of timesteps between two replans. Support phases have to last
    /// longer than `replan_timesteps * dt()` (or have zero duration).
    #[serde(default = "default_replan_timesteps")]
    pub replan_timesteps: usize,

    /// Margin keeping the ZMP inside the support polygon [m].
    #[serde(default = "default_zmp_margin")]
    pub zmp_margin: f64,

    /// Apex height of the swing foot [m].
    #[serde(default = "default_walk_foot_height")]
    pub walk_foot_height: f64,

    /// CoM height while walking [m].
    #[serde(default = "default_walk_com_height")]
    pub walk_com_height: f64,

    /// Trunk pitch while walking [rad].
    #[serde(default = "default_walk_trunk_pitch")]
    pub walk_trunk_pitch: f64,

    /// Maximum step, forward [m].
    #[serde(default = "default_walk_max_dx_forward")]
    pub walk_max_dx_forward: f64,

    /// Maximum step, backward [m].
    #[serde(default = "default_walk_max_dx_backward")]
    pub walk_max_dx_backward: f64,

    /// Maximum step, lateral [m].
    #[serde(default = "default_walk_max_dy")]
    pub walk_max_dy: f64,

    /// Maximum step, yaw [rad].
    #[serde(default = "default_walk_max_dtheta")]
    pub walk_max_dtheta: f64,

    /// CoM height used by the pendulum model to compute omega. A higher
    /// pendulum results in less lateral swinging during the walk.
    #[serde(default = "default_pendulum_height")]
    pub pendulum_height: f64,

    /// Lateral spacing between feet in the neutral stance [m].
    #[serde(default = "default_feet_spacing")]
    pub feet_spacing: f64,

    /// Foot width [m].
    #[serde(default = "default_foot_width")]
    pub foot_width: f64,

    /// Foot length [m].
    #[serde(default = "default_foot_length")]
    pub foot_length: f64,

    /// Sagittal offset of the ZMP reference in the foot frame [m].
    #[serde(default = "default_foot_zmp_target_x")]
    pub foot_zmp_target_x: f64,

    /// Lateral offset of the ZMP reference in the foot frame, positive is
    /// outward [m].
    #[serde(default = "default_foot_zmp_target_y")]
    pub foot_zmp_target_y: f64,
}

impl Default for HumanoidParameters {
    fn default() -> Self {
        Self {
            single_support_duration: default_single_support_duration(),
            single_support_timesteps: default_single_support_timesteps(),
            double_support_ratio: default_double_support_ratio(),
            startend_double_support_ratio: default_startend_double_support_ratio(),
            planned_timesteps: default_planned_timesteps(),
            replan_timesteps: default_replan_timesteps(),
            zmp_margin: default_zmp_margin(),
            walk_foot_height: default_walk_foot_height(),
            walk_com_height: default_walk_com_height(),
            walk_trunk_pitch: default_walk_trunk_pitch(),
            walk_max_dx_forward: default_walk_max_dx_forward(),
            walk_max_dx_backward: default_walk_max_dx_backward(),
            walk_max_dy: default_walk_max_dy(),
            walk_max_dtheta: default_walk_max_dtheta(),
            pendulum_height: default_pendulum_height(),
            feet_spacing: default_feet_spacing(),
            foot_width: default_foot_width(),
            foot_length: default_foot_length(),
            foot_zmp_target_x: default_foot_zmp_target_x(),
            foot_zmp_target_y: default_foot_zmp_target_y(),
        }
    }
}

impl HumanoidParameters {
    /// Load parameters from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(s)?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter values. Returns Err on values the planners cannot
    /// work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("single_support_duration", self.single_support_duration),
            ("pendulum_height", self.pendulum_height),
            ("feet_spacing", self.feet_spacing),
            ("foot_width", self.foot_width),
            ("foot_length", self.foot_length),
            ("walk_max_dx_forward", self.walk_max_dx_forward),
            ("walk_max_dx_backward", self.walk_max_dx_backward),
            ("walk_max_dy", self.walk_max_dy),
            ("walk_max_dtheta", self.walk_max_dtheta),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        if self.single_support_timesteps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "single_support_timesteps",
                message: "must be >= 1".into(),
            });
        }
        if self.planned_timesteps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "planned_timesteps",
                message: "must be >= 1".into(),
            });
        }
        if self.double_support_ratio < 0.0 || self.startend_double_support_ratio < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "double_support_ratio",
                message: "ratios must be >= 0".into(),
            });
        }
        if self.zmp_margin < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "zmp_margin",
                message: "must be >= 0".into(),
            });
        }
        Ok(())
    }

    /// Planning timestep [s].
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.single_support_duration / (self.single_support_timesteps as f64)
    }

    /// Natural frequency of the linear inverted pendulum, `sqrt(g/h)`.
    #[must_use]
    pub fn omega(&self) -> f64 {
        if self.pendulum_height > 0.0 {
            (GRAVITY / self.pendulum_height).sqrt()
        } else {
            0.0
        }
    }

    /// Duration of a double support [s].
    #[must_use]
    pub fn double_support_duration(&self) -> f64 {
        self.double_support_ratio * self.single_support_duration
    }

    /// Duration of a start/end double support [s].
    #[must_use]
    pub fn startend_double_support_duration(&self) -> f64 {
        self.startend_double_support_ratio * self.single_support_duration
    }

    /// Duration of a double support [timesteps].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn double_support_timesteps(&self) -> usize {
        (self.double_support_ratio * self.single_support_timesteps as f64).round() as usize
    }

    /// Duration of a start/end double support [timesteps].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn startend_double_support_timesteps(&self) -> usize {
        (self.startend_double_support_ratio * self.single_support_timesteps as f64).round() as usize
    }

    /// Whether the walk resulting from those parameters has double supports.
    #[must_use]
    pub fn has_double_support(&self) -> bool {
        self.double_support_timesteps() > 0
    }

    /// Clips a step command `(dx, dy, dtheta)` into the accessibility
    /// ellipsoid defined by the `walk_max_*` parameters.
    ///
    /// Each axis is normalized by its bound (forward or backward for x,
    /// depending on sign); if the normalized command exceeds unit norm it is
    /// rescaled onto the ellipsoid. Commands already inside come back
    /// unchanged, which also makes the clipping idempotent.
    #[must_use]
    pub fn ellipsoid_clip(&self, step: Vector3<f64>) -> Vector3<f64> {
        let factor = Vector3::new(
            if step.x >= 0.0 {
                self.walk_max_dx_forward
            } else {
                self.walk_max_dx_backward
            },
            self.walk_max_dy,
            self.walk_max_dtheta,
        );

        let mut scaled = step.component_div(&factor);
        let norm = scaled.norm();
        if norm > 1.0 {
            scaled /= norm;
        }

        scaled.component_mul(&factor)
    }

    /// Frame of the opposite foot in its neutral position relative to
    /// `t_world_foot` (a `side` foot), offset by the step command
    /// `(d_x, d_y, d_theta)` expressed in the foot frame.
    #[must_use]
    pub fn opposite_frame(
        &self,
        side: Side,
        t_world_foot: &Isometry3<f64>,
        d_x: f64,
        d_y: f64,
        d_theta: f64,
    ) -> Isometry3<f64> {
        let lateral = -side.lateral_sign() * self.feet_spacing;
        t_world_foot * frame_from_xy_yaw(d_x, lateral + d_y, d_theta)
    }

    /// Frame centered between the two feet when `t_world_foot` (a `side`
    /// foot) is in its neutral stance.
    #[must_use]
    pub fn neutral_frame(&self, side: Side, t_world_foot: &Isometry3<f64>) -> Isometry3<f64> {
        let lateral = -side.lateral_sign() * self.feet_spacing / 2.0;
        t_world_foot * frame_from_xy_yaw(0.0, lateral, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derived_quantities() {
        let params = HumanoidParameters::default();
        assert_relative_eq!(params.dt(), 0.1);
        assert_relative_eq!(params.omega(), (GRAVITY / 0.4).sqrt());
        assert_eq!(params.double_support_timesteps(), 10);
        assert!(params.has_double_support());

        let no_double = HumanoidParameters {
            double_support_ratio: 0.0,
            ..HumanoidParameters::default()
        };
        assert!(!no_double.has_double_support());
    }

    #[test]
    fn ellipsoid_clip_identity_inside() {
        let params = HumanoidParameters::default();
        let step = Vector3::new(0.02, 0.01, 0.05);
        assert_relative_eq!(params.ellipsoid_clip(step), step, epsilon = 1e-12);
    }

    #[test]
    fn ellipsoid_clip_scales_onto_boundary() {
        let params = HumanoidParameters::default();
        let step = Vector3::new(0.5, 0.5, 0.0);
        let clipped = params.ellipsoid_clip(step);

        let normalized = Vector3::new(
            clipped.x / params.walk_max_dx_forward,
            clipped.y / params.walk_max_dy,
            clipped.z / params.walk_max_dtheta,
        );
        assert_relative_eq!(normalized.norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn ellipsoid_clip_idempotent() {
        let params = HumanoidParameters::default();
        let step = Vector3::new(-0.3, 0.2, 0.8);
        let once = params.ellipsoid_clip(step);
        let twice = params.ellipsoid_clip(once);
        assert_relative_eq!(once, twice, epsilon = 1e-9);
    }

    #[test]
    fn ellipsoid_clip_respects_backward_bound() {
        let params = HumanoidParameters::default();
        let clipped = params.ellipsoid_clip(Vector3::new(-1.0, 0.0, 0.0));
        assert_relative_eq!(clipped.x, -params.walk_max_dx_backward, epsilon = 1e-9);
    }

    #[test]
    fn from_toml_overrides_defaults() {
        let params = HumanoidParameters::from_toml_str(
            "single_support_duration = 0.5\nsingle_support_timesteps = 5\n",
        )
        .unwrap();
        assert_relative_eq!(params.dt(), 0.1);
        assert_relative_eq!(params.feet_spacing, 0.15);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut params = HumanoidParameters::default();
        params.pendulum_height = 0.0;
        assert!(params.validate().is_err());

        let mut params = HumanoidParameters::default();
        params.double_support_ratio = -0.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn opposite_frame_neutral_spacing() {
        let params = HumanoidParameters::default();
        let left = frame_from_xy_yaw(0.0, params.feet_spacing / 2.0, 0.0);
        let right = params.opposite_frame(Side::Left, &left, 0.0, 0.0, 0.0);
        assert_relative_eq!(right.translation.y, -params.feet_spacing / 2.0, epsilon = 1e-12);
        assert_relative_eq!(right.translation.x, 0.0, epsilon = 1e-12);
    }
}
