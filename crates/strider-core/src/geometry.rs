//! Planar geometry primitives: points, axis-aligned bounds and convex polygons.
//!
//! A [`Polygon`] is validated once at construction (at least three finite
//! vertices, strictly convex) and caches everything the collision code asks
//! for repeatedly: the separating axes (edge normals), the vertex centroid and
//! the axis-aligned [`Bounds`]. Static obstacles never change after level load,
//! so these values are plain fields rather than lazily memoized getters.
//!
//! The coordinate system is y-up: `bottom < top`.

use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::WorldError;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D point or vector with `f64` components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component (y-up).
    pub y: f64,
}

impl Point {
    /// The origin / zero vector.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a point from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product.
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product of two planar vectors.
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Counter-clockwise perpendicular: `(-y, x)`.
    pub fn ortho(self) -> Point {
        Point {
            x: -self.y,
            y: self.x,
        }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Point::new(x, y)
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned extents of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Leftmost x.
    pub left: f64,
    /// Rightmost x.
    pub right: f64,
    /// Lowest y.
    pub bottom: f64,
    /// Highest y.
    pub top: f64,
}

impl Bounds {
    /// Extents of a point set. Returns inverted (empty) bounds for an empty set.
    pub fn of_points(points: &[Point]) -> Self {
        let mut bounds = Bounds {
            left: f64::INFINITY,
            right: f64::NEG_INFINITY,
            bottom: f64::INFINITY,
            top: f64::NEG_INFINITY,
        };
        for p in points {
            bounds.left = bounds.left.min(p.x);
            bounds.right = bounds.right.max(p.x);
            bounds.bottom = bounds.bottom.min(p.y);
            bounds.top = bounds.top.max(p.y);
        }
        bounds
    }

    /// Inclusive overlap test: touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.left <= other.right
            && self.right >= other.left
            && self.bottom <= other.top
            && self.top >= other.bottom
    }

    /// Whether `p` lies inside or on the boundary.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }

    /// Width along the x-axis.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height along the y-axis.
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

// ---------------------------------------------------------------------------
// Polygon
// ---------------------------------------------------------------------------

/// An immutable, strictly convex polygon with cached collision data.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    outline: Vec<Point>,
    /// Edge normals (unnormalized), one per edge, used as SAT axes.
    axes: Vec<Point>,
    center: Point,
    bounds: Bounds,
}

impl Polygon {
    /// Build a polygon from its outline, in either winding order.
    ///
    /// # Errors
    ///
    /// - [`WorldError::DegenerateOutline`] for fewer than three vertices.
    /// - [`WorldError::NonFinite`] if any coordinate is NaN or infinite.
    /// - [`WorldError::NotConvex`] if the outline turns the wrong way (or not
    ///   at all) at some vertex. Collinear vertices are rejected.
    pub fn new(outline: Vec<Point>) -> Result<Self, WorldError> {
        if outline.len() < 3 {
            return Err(WorldError::DegenerateOutline {
                points: outline.len(),
            });
        }
        if let Some(vertex) = outline.iter().position(|p| !p.is_finite()) {
            return Err(WorldError::NonFinite { vertex });
        }

        let n = outline.len();
        let mut winding = 0.0_f64;
        for i in 0..n {
            let e1 = outline[(i + 1) % n] - outline[i];
            let e2 = outline[(i + 2) % n] - outline[(i + 1) % n];
            let turn = e1.cross(e2);
            if turn == 0.0 || (winding != 0.0 && turn.signum() != winding) {
                return Err(WorldError::NotConvex {
                    vertex: (i + 1) % n,
                });
            }
            winding = turn.signum();
        }

        Ok(Self::assemble(outline))
    }

    /// Axis-aligned rectangle spanning `[left, right] x [bottom, top]`.
    ///
    /// Vertices are emitted bottom-left, bottom-right, top-right, top-left.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DegenerateOutline`] if the rectangle has zero
    /// or negative width or height, [`WorldError::NonFinite`] for NaN/inf.
    pub fn rect(left: f64, bottom: f64, right: f64, top: f64) -> Result<Self, WorldError> {
        Self::new(vec![
            Point::new(left, bottom),
            Point::new(right, bottom),
            Point::new(right, top),
            Point::new(left, top),
        ])
        .map_err(|e| match e {
            WorldError::NotConvex { .. } => WorldError::DegenerateOutline { points: 4 },
            other => other,
        })
    }

    fn assemble(outline: Vec<Point>) -> Self {
        let n = outline.len();
        let axes = (0..n)
            .map(|i| (outline[(i + 1) % n] - outline[i]).ortho())
            .collect();

        let sum = outline.iter().fold(Point::ZERO, |acc, p| acc + *p);
        let center = sum / n as f64;
        let bounds = Bounds::of_points(&outline);

        Self {
            outline,
            axes,
            center,
            bounds,
        }
    }

    /// Copy of this polygon with every vertex pushed `margin` units away from
    /// the centroid on each axis where it is off-center.
    ///
    /// Only the bounding box is guaranteed to grow by `margin` on every side.
    /// Axis-aligned edges move out by `margin`, but a sloped edge can keep its
    /// line: the hypotenuse of a right triangle stays where it was. Hazard
    /// contact is tested against bounds, so this is enough for hazard
    /// margins. For rectangles the result is exactly the rectangle grown by
    /// `margin`. A non-positive margin returns an unchanged clone.
    pub fn inflated(&self, margin: f64) -> Polygon {
        if margin <= 0.0 {
            return self.clone();
        }
        let c = self.center;
        let outline = self
            .outline
            .iter()
            .map(|p| {
                let dx = if p.x > c.x {
                    margin
                } else if p.x < c.x {
                    -margin
                } else {
                    0.0
                };
                let dy = if p.y > c.y {
                    margin
                } else if p.y < c.y {
                    -margin
                } else {
                    0.0
                };
                Point::new(p.x + dx, p.y + dy)
            })
            .collect();
        Self::assemble(outline)
    }

    /// The polygon's vertices in construction order.
    pub fn outline(&self) -> &[Point] {
        &self.outline
    }

    /// One (unnormalized) normal per edge.
    pub fn axes(&self) -> &[Point] {
        &self.axes
    }

    /// Vertex centroid.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Cached axis-aligned extents.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
