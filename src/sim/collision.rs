//! Collision tests for axis-aligned boxes
//!
//! Screen coordinates: y grows downward, so "falling" means positive `vel.y`
//! and a platform's top edge is its minimum y.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::LANDING_SLACK;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.min.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict horizontal overlap (touching edges do not count)
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.max.x > other.min.x && self.min.x < other.max.x
    }

    /// Strict overlap on both axes
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.overlaps_x(other) && self.max.y > other.min.y && self.min.y < other.max.y
    }
}

/// Landing sweep test
///
/// The mover must be falling, overlap the platform horizontally, and have its
/// bottom edge inside `[top, top + vel_y + LANDING_SLACK]` after this tick's
/// integration. Extending the band by the fall distance catches fast falls that
/// would otherwise pass straight through a thin platform.
pub fn lands_on(mover: &Aabb, vel_y: f32, platform: &Aabb) -> bool {
    vel_y > 0.0
        && mover.overlaps_x(platform)
        && mover.bottom() >= platform.top()
        && mover.bottom() <= platform.top() + vel_y + LANDING_SLACK
}

/// Circle proximity between two centers
pub fn within_reach(a: Vec2, b: Vec2, reach: f32) -> bool {
    a.distance_squared(b) < reach * reach
}
