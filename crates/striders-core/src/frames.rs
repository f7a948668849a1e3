//! Small frame helpers used throughout the planners.
//!
//! Frames are world-to-local rigid transforms ([`Isometry3<f64>`]); the walk
//! lives on the z=0 floor plane, so most of these extract or rebuild the
//! planar part of a frame.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// Yaw of a frame: the angle of its x axis projected on the floor plane.
#[must_use]
pub fn frame_yaw(frame: &Isometry3<f64>) -> f64 {
    let x_axis = frame.rotation * Vector3::x();
    x_axis.y.atan2(x_axis.x)
}

/// Wrap an angle into `[-pi, pi]`.
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle % std::f64::consts::TAU;
    if wrapped > std::f64::consts::PI {
        wrapped - std::f64::consts::TAU
    } else if wrapped < -std::f64::consts::PI {
        wrapped + std::f64::consts::TAU
    } else {
        wrapped
    }
}

/// Interpolate between two frames (linear on translation, slerp on
/// rotation). `t = 0` gives `a`, `t = 1` gives `b`.
#[must_use]
pub fn interpolate_frames(a: &Isometry3<f64>, b: &Isometry3<f64>, t: f64) -> Isometry3<f64> {
    a.lerp_slerp(b, t)
}

/// Project a frame onto the floor: translation z is zeroed and only the yaw
/// component of the rotation is kept.
#[must_use]
pub fn flatten_on_floor(frame: &Isometry3<f64>) -> Isometry3<f64> {
    frame_from_xy_yaw(frame.translation.x, frame.translation.y, frame_yaw(frame))
}

/// Build a floor frame from a planar position and a yaw angle.
#[must_use]
pub fn frame_from_xy_yaw(x: f64, y: f64, yaw: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(x, y, 0.0),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw),
    )
}
