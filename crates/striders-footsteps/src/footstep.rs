//! Footsteps and supports.

use std::sync::OnceLock;

use nalgebra::{Isometry3, Point3, Vector2};

use striders_core::frames::interpolate_frames;
use striders_core::geometry::convex_hull;
use striders_core::Side;

/// The position of a specific foot on the ground.
#[derive(Debug, Clone)]
pub struct Footstep {
    /// Which foot this is (`Left` or `Right`).
    pub side: Side,
    /// Foot frame in the world.
    pub frame: Isometry3<f64>,
    /// Foot width [m].
    pub foot_width: f64,
    /// Foot length [m].
    pub foot_length: f64,
    polygon: OnceLock<Vec<Vector2<f64>>>,
}

impl Footstep {
    #[must_use]
    pub fn new(side: Side, frame: Isometry3<f64>, foot_width: f64, foot_length: f64) -> Self {
        Self {
            side,
            frame,
            foot_width,
            foot_length,
            polygon: OnceLock::new(),
        }
    }

    /// The support polygon of this footstep: convex hull of its four corners
    /// projected on the floor plane. Computed on first use, then memoized.
    #[must_use]
    pub fn support_polygon(&self) -> &[Vector2<f64>] {
        self.polygon.get_or_init(|| convex_hull(&self.corners()))
    }

    /// The four corners of the foot, projected on the floor plane.
    #[must_use]
    pub fn corners(&self) -> Vec<Vector2<f64>> {
        let half_length = self.foot_length / 2.0;
        let half_width = self.foot_width / 2.0;
        [
            (half_length, half_width),
            (half_length, -half_width),
            (-half_length, half_width),
            (-half_length, -half_width),
        ]
        .iter()
        .map(|&(x, y)| {
            let corner = self.frame.transform_point(&Point3::new(x, y, 0.0));
            Vector2::new(corner.x, corner.y)
        })
        .collect()
    }

    /// This footstep moved by a world transform. The polygon cache is not
    /// carried over.
    #[must_use]
    pub fn transformed(&self, transform: &Isometry3<f64>) -> Self {
        Self::new(
            self.side,
            transform * self.frame,
            self.foot_width,
            self.foot_length,
        )
    }
}

impl PartialEq for Footstep {
    fn eq(&self, other: &Self) -> bool {
        self.side == other.side
            && self.frame == other.frame
            && self.foot_width == other.foot_width
            && self.foot_length == other.foot_length
    }
}

/// A set of footsteps the robot stands on: one for a single support, two
/// (of opposite sides) for a double support.
#[derive(Debug, Clone, Default)]
pub struct Support {
    pub footsteps: Vec<Footstep>,
    /// Marks the very first support of a plan.
    pub start: bool,
    /// Marks the very last support of a plan.
    pub end: bool,
    polygon: OnceLock<Vec<Vector2<f64>>>,
}

impl Support {
    #[must_use]
    pub fn new(footsteps: Vec<Footstep>) -> Self {
        Self {
            footsteps,
            start: false,
            end: false,
            polygon: OnceLock::new(),
        }
    }

    /// The support side: the footstep side for a single support, `Both` for
    /// a double support.
    #[must_use]
    pub fn side(&self) -> Side {
        if self.footsteps.len() == 1 {
            self.footsteps[0].side
        } else {
            Side::Both
        }
    }

    /// Whether this is a double support.
    #[must_use]
    pub fn is_both(&self) -> bool {
        self.footsteps.len() > 1
    }

    /// The support polygon: convex hull of all footstep corners. Computed on
    /// first use, then memoized.
    #[must_use]
    pub fn support_polygon(&self) -> &[Vector2<f64>] {
        self.polygon.get_or_init(|| {
            let corners: Vec<Vector2<f64>> = self
                .footsteps
                .iter()
                .flat_map(Footstep::corners)
                .collect();
            convex_hull(&corners)
        })
    }

    /// The frame of this support: the footstep frame for a single support,
    /// the interpolated average of both frames for a double support.
    #[must_use]
    pub fn frame(&self) -> Isometry3<f64> {
        match self.footsteps.as_slice() {
            [single] => single.frame,
            [first, second] => interpolate_frames(&first.frame, &second.frame, 0.5),
            _ => Isometry3::identity(),
        }
    }

    /// The frame of the footstep with the given side, if present.
    #[must_use]
    pub fn footstep_frame(&self, side: Side) -> Option<Isometry3<f64>> {
        self.footsteps
            .iter()
            .find(|footstep| footstep.side == side)
            .map(|footstep| footstep.frame)
    }

    /// This support moved by a world transform.
    #[must_use]
    pub fn transformed(&self, transform: &Isometry3<f64>) -> Self {
        Self {
            footsteps: self
                .footsteps
                .iter()
                .map(|footstep| footstep.transformed(transform))
                .collect(),
            start: self.start,
            end: self.end,
            polygon: OnceLock::new(),
        }
    }
}

impl PartialEq for Support {
    fn eq(&self, other: &Self) -> bool {
        self.footsteps == other.footsteps && self.start == other.start && self.end == other.end
    }
}
