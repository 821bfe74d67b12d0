//! Narrow-phase collision: separating-axis test with minimum penetration vector.
//!
//! [`minimum_penetration`] projects both shapes onto every edge normal of
//! both shapes. If any axis separates them there is no collision; otherwise the
//! axis with the smallest overlap yields the minimum penetration vector (MPV),
//! oriented from the second shape towards the first.
//!
//! The actor's hitbox is an axis-aligned square ([`ActorBox`]) built on the
//! stack every time it is needed, so the hot path of the physics step does not
//! allocate.

use crate::geometry::{Bounds, Point, Polygon};

/// Half of the actor's square hitbox side, in world units.
pub const ACTOR_HALF_EXTENT: f64 = 16.0;

/// Bias added to every projected overlap so that touching shapes still yield
/// a non-zero MPV along their shared axis.
pub const MPV_EPSILON: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Anything the SAT test can consume: a convex outline with cached axes.
pub trait Shape {
    /// Vertices in winding order.
    fn outline(&self) -> &[Point];
    /// One normal per edge.
    fn axes(&self) -> &[Point];
    /// Vertex centroid.
    fn center(&self) -> Point;
    /// Axis-aligned extents.
    fn bounds(&self) -> Bounds;
}

impl Shape for Polygon {
    fn outline(&self) -> &[Point] {
        Polygon::outline(self)
    }

    fn axes(&self) -> &[Point] {
        Polygon::axes(self)
    }

    fn center(&self) -> Point {
        Polygon::center(self)
    }

    fn bounds(&self) -> Bounds {
        Polygon::bounds(self)
    }
}

// ---------------------------------------------------------------------------
// ActorBox
// ---------------------------------------------------------------------------

/// The actor's square hitbox centred on its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorBox {
    corners: [Point; 4],
    axes: [Point; 4],
    center: Point,
    bounds: Bounds,
}

impl ActorBox {
    /// Square of half-side [`ACTOR_HALF_EXTENT`] centred on `(x, y)`.
    pub fn at(x: f64, y: f64) -> Self {
        let h = ACTOR_HALF_EXTENT;
        let corners = [
            Point::new(x - h, y - h),
            Point::new(x + h, y - h),
            Point::new(x + h, y + h),
            Point::new(x - h, y + h),
        ];
        let axes = [
            (corners[1] - corners[0]).ortho(),
            (corners[2] - corners[1]).ortho(),
            (corners[3] - corners[2]).ortho(),
            (corners[0] - corners[3]).ortho(),
        ];
        Self {
            corners,
            axes,
            center: Point::new(x, y),
            bounds: Bounds {
                left: x - h,
                right: x + h,
                bottom: y - h,
                top: y + h,
            },
        }
    }
}

impl Shape for ActorBox {
    fn outline(&self) -> &[Point] {
        &self.corners
    }

    fn axes(&self) -> &[Point] {
        &self.axes
    }

    fn center(&self) -> Point {
        self.center
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

// ---------------------------------------------------------------------------
// SAT
// ---------------------------------------------------------------------------

/// Which world axis a penetration vector lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenetrationAxis {
    /// `mpv.y == 0`: push along x.
    Horizontal,
    /// `mpv.x == 0`: push along y.
    Vertical,
    /// Sloped contact; ignored by axis-separated resolution.
    Oblique,
}

impl PenetrationAxis {
    /// Classify an MPV. A vector with a zero x component is vertical even if
    /// its y component is also zero.
    pub fn of(mpv: Point) -> Self {
        if mpv.x == 0.0 {
            PenetrationAxis::Vertical
        } else if mpv.y == 0.0 {
            PenetrationAxis::Horizontal
        } else {
            PenetrationAxis::Oblique
        }
    }
}

fn project(points: &[Point], axis: Point) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in points {
        let proj = p.dot(axis);
        min = min.min(proj);
        max = max.max(proj);
    }
    (min, max)
}

/// Overlap vector of `a` and `b` along `axis`, or `None` if the axis separates them.
fn overlap_on_axis(a: &[Point], b: &[Point], axis: Point) -> Option<Point> {
    let (min1, max1) = project(a, axis);
    let (min2, max2) = project(b, axis);

    if max1 >= min2 && max2 >= min1 {
        let d = (max2 - min1).min(max1 - min2);
        Some(axis * (d / axis.dot(axis) + MPV_EPSILON))
    } else {
        None
    }
}

/// Separating-axis test between two convex shapes.
///
/// Returns `None` when some axis separates `a` and `b`. Otherwise returns the
/// minimum penetration vector, signed so that it points from `b`'s centre
/// towards `a`'s centre (i.e. `a` pushes `b` along `-mpv`). Touching shapes
/// count as overlapping.
///
/// Axes of `a` are tested before axes of `b`; among equal overlaps the first
/// one wins, which makes the result independent of hash or thread ordering.
pub fn minimum_penetration<A, B>(a: &A, b: &B) -> Option<Point>
where
    A: Shape + ?Sized,
    B: Shape + ?Sized,
{
    let mut min_norm = f64::INFINITY;
    let mut mpv = Point::ZERO;

    for &axis in a.axes().iter().chain(b.axes().iter()) {
        let pv = overlap_on_axis(a.outline(), b.outline(), axis)?;
        let norm = pv.dot(pv);
        if norm < min_norm {
            min_norm = norm;
            mpv = pv;
        }
    }

    let displacement = b.center() - a.center();
    if displacement.dot(mpv) > 0.0 {
        mpv = -mpv;
    }
    Some(mpv)
}

/// Boolean form of [`minimum_penetration`].
pub fn collides<A, B>(a: &A, b: &B) -> bool
where
    A: Shape + ?Sized,
    B: Shape + ?Sized,
{
    minimum_penetration(a, b).is_some()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
