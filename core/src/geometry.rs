//! Two-dimensional ray casting primitives used to resolve shots.
//!
//! Continuous coordinates are expressed as [`DVec2`] values in render space.
//! Tile indices live in [`crate::grid::TileCoord`] and are never mixed with
//! the types in this module.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Tolerance used when a segment endpoint lies on a ray's line.
pub const COLLISION_EPSILON: f64 = 1e-6;

/// Half-line described by an origin and a unit direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    origin: DVec2,
    direction: DVec2,
}

impl Ray {
    /// Creates a ray, normalizing the provided direction.
    ///
    /// Returns `None` when the direction has no usable length.
    #[must_use]
    pub fn new(origin: DVec2, direction: DVec2) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    /// Creates a ray pointing along the provided angle, measured in radians
    /// from the positive x axis towards the positive y axis.
    #[must_use]
    pub fn from_angle(origin: DVec2, angle: f64) -> Self {
        Self {
            origin,
            direction: DVec2::new(angle.cos(), angle.sin()),
        }
    }

    /// Point the ray starts from.
    #[must_use]
    pub const fn origin(&self) -> DVec2 {
        self.origin
    }

    /// Unit direction of travel.
    #[must_use]
    pub const fn direction(&self) -> DVec2 {
        self.direction
    }

    /// Point reached after travelling `distance` along the ray.
    #[must_use]
    pub fn point_at(&self, distance: f64) -> DVec2 {
        self.origin + self.direction * distance
    }

    /// Normal obtained by rotating the direction a quarter turn clockwise in
    /// screen space (y pointing down).
    #[must_use]
    pub fn clockwise_normal(&self) -> DVec2 {
        self.direction.perp()
    }
}

/// Line segment carrying the normal its owner considers outward.
///
/// The normal is supplied rather than derived because the same geometric
/// segment faces inwards for the grid border and outwards for an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    start: DVec2,
    end: DVec2,
    normal: DVec2,
}

impl LineSegment {
    /// Creates a segment between two endpoints with an explicit unit normal.
    #[must_use]
    pub const fn new(start: DVec2, end: DVec2, normal: DVec2) -> Self {
        Self { start, end, normal }
    }

    /// First endpoint.
    #[must_use]
    pub const fn start(&self) -> DVec2 {
        self.start
    }

    /// Second endpoint.
    #[must_use]
    pub const fn end(&self) -> DVec2 {
        self.end
    }

    /// Unit normal supplied by the owner.
    #[must_use]
    pub const fn normal(&self) -> DVec2 {
        self.normal
    }

    /// Reports whether the segment faces the same way the direction travels,
    /// which makes it invisible to a shot moving along `direction`.
    #[must_use]
    pub fn faces_away_from(&self, direction: DVec2) -> bool {
        self.normal.dot(direction) > 0.0
    }
}

/// Reflects `direction` about a unit `normal`.
#[must_use]
pub fn reflect(direction: DVec2, normal: DVec2) -> DVec2 {
    direction - 2.0 * direction.dot(normal) * normal
}

/// Angle of the vector in radians, measured from the positive x axis.
#[must_use]
pub fn rotation_angle(vector: DVec2) -> f64 {
    vector.y.atan2(vector.x)
}

/// Finds the point where the ray crosses the segment, if any.
///
/// The segment must straddle the ray's infinite line (endpoints on opposite
/// sides, or one endpoint within [`COLLISION_EPSILON`] of it) before the two
/// lines are intersected. Intersections behind the origin are rejected last.
#[must_use]
pub fn detect_ray_segment_collision(ray: &Ray, segment: &LineSegment) -> Option<DVec2> {
    let normal = ray.clockwise_normal();
    let start_side = normal.dot(segment.start - ray.origin);
    let end_side = normal.dot(segment.end - ray.origin);

    let start_on_line = start_side.abs() < COLLISION_EPSILON;
    let end_on_line = end_side.abs() < COLLISION_EPSILON;

    // Collinear segments are edge-on to the shot.
    if start_on_line && end_on_line {
        return None;
    }

    if !start_on_line && !end_on_line && start_side * end_side > 0.0 {
        return None;
    }

    let point = line_intersection(ray, segment)?;

    if ray.direction.dot(point - ray.origin) < 0.0 {
        return None;
    }

    Some(point)
}

fn line_intersection(ray: &Ray, segment: &LineSegment) -> Option<DVec2> {
    let origin = ray.origin;
    let direction = ray.direction;
    let ray_vertical = direction.x.abs() < COLLISION_EPSILON;
    let segment_vertical = (segment.end.x - segment.start.x).abs() < COLLISION_EPSILON;

    match (ray_vertical, segment_vertical) {
        (true, true) => None,
        (true, false) => {
            let (slope, intercept) = slope_intercept(segment.start, segment.end);
            Some(DVec2::new(origin.x, slope * origin.x + intercept))
        }
        (false, true) => {
            let slope = direction.y / direction.x;
            let intercept = origin.y - slope * origin.x;
            let x = segment.start.x;
            Some(DVec2::new(x, slope * x + intercept))
        }
        (false, false) => {
            let ray_slope = direction.y / direction.x;
            let ray_intercept = origin.y - ray_slope * origin.x;
            let (segment_slope, segment_intercept) = slope_intercept(segment.start, segment.end);
            if (ray_slope - segment_slope).abs() < COLLISION_EPSILON {
                return None;
            }
            let x = (segment_intercept - ray_intercept) / (ray_slope - segment_slope);
            Some(DVec2::new(x, ray_slope * x + ray_intercept))
        }
    }
}

fn slope_intercept(start: DVec2, end: DVec2) -> (f64, f64) {
    let slope = (end.y - start.y) / (end.x - start.x);
    (slope, start.y - slope * start.x)
}
