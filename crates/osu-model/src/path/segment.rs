// Curve segments between path boundaries.

use std::f64::consts::PI;

use super::PathType;
use super::lagrange::LagrangeCurve;
use crate::math::Vec2;

/// Tolerance of the collinearity test for three-point arcs.
const COLLINEAR_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Curve {
    Linear(Vec<Vec2>),
    Bezier(LagrangeCurve),
    Catmull(Vec<Vec2>),
    Arc(CircularArc),
}

/// One curve of a path plus the control points it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    kind: PathType,
    points: Vec<Vec2>,
    curve: Curve,
}

impl PathSegment {
    pub(crate) fn new(kind: PathType, points: Vec<Vec2>) -> Self {
        let curve = match kind {
            PathType::Linear => Curve::Linear(points.clone()),
            PathType::Catmull => Curve::Catmull(points.clone()),
            PathType::Bezier => bezier(&points),
            PathType::PerfectCurve if points.len() != 3 => bezier(&points),
            PathType::PerfectCurve => match CircularArc::through(points[0], points[1], points[2]) {
                Some(arc) => Curve::Arc(arc),
                None => Curve::Linear(points.clone()),
            },
        };
        Self {
            kind,
            points,
            curve,
        }
    }

    pub fn kind(&self) -> PathType {
        self.kind
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Whether the segment is evaluated as straight lines, including degenerate arcs.
    pub fn is_linear(&self) -> bool {
        matches!(self.curve, Curve::Linear(_))
    }

    /// Position at `u` in `[0, 1]` along this segment's own parameter.
    pub fn evaluate(&self, u: f64) -> Vec2 {
        let u = u.clamp(0.0, 1.0);
        match &self.curve {
            Curve::Linear(points) => polyline_at(points, u),
            Curve::Bezier(curve) => curve.evaluate(u),
            Curve::Catmull(points) => catmull_at(points, u),
            Curve::Arc(arc) => arc.at(u),
        }
    }

    /// Polyline approximation with `samples` steps per curve piece.
    pub(crate) fn sample(&self, samples: usize) -> Vec<Vec2> {
        let samples = samples.max(1);
        let steps = match &self.curve {
            Curve::Linear(points) => return points.clone(),
            Curve::Catmull(points) => samples * points.len().saturating_sub(1).max(1),
            Curve::Bezier(_) | Curve::Arc(_) => samples,
        };
        (0..=steps)
            .map(|i| self.evaluate(i as f64 / steps as f64))
            .collect()
    }
}

fn bezier(points: &[Vec2]) -> Curve {
    let control: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (f64::from(p.x), f64::from(p.y)))
        .collect();
    Curve::Bezier(LagrangeCurve::chebyshev_lobatto(points.len(), |t| {
        de_casteljau(&control, t)
    }))
}

/// Exact Bézier position by repeated linear interpolation.
fn de_casteljau(control: &[(f64, f64)], t: f64) -> (f64, f64) {
    let mut work = control.to_vec();
    for level in (1..work.len()).rev() {
        for i in 0..level {
            work[i] = (
                work[i].0 + (work[i + 1].0 - work[i].0) * t,
                work[i].1 + (work[i + 1].1 - work[i].1) * t,
            );
        }
    }
    work.first().copied().unwrap_or((0.0, 0.0))
}

/// Splits `u` across `pieces` equal parts, returning the piece and its local parameter.
fn locate(pieces: usize, u: f64) -> (usize, f32) {
    let scaled = u * pieces as f64;
    let index = (scaled.floor() as usize).min(pieces - 1);
    (index, (scaled - index as f64) as f32)
}

fn polyline_at(points: &[Vec2], u: f64) -> Vec2 {
    match points.len() {
        0 => Vec2::ZERO,
        1 => points[0],
        len => {
            let (i, t) = locate(len - 1, u);
            points[i].lerp(points[i + 1], t)
        }
    }
}

fn catmull_at(points: &[Vec2], u: f64) -> Vec2 {
    let len = points.len();
    if len < 2 {
        return points.first().copied().unwrap_or(Vec2::ZERO);
    }
    let (i, t) = locate(len - 1, u);
    let v2 = points[i];
    let v3 = points[i + 1];
    // mirrored virtual neighbours outside both ends
    let v1 = if i > 0 { points[i - 1] } else { v2 * 2.0 - v3 };
    let v4 = if i + 2 < len {
        points[i + 2]
    } else {
        v3 * 2.0 - v2
    };
    catmull_rom(v1, v2, v3, v4, t)
}

fn catmull_rom(v1: Vec2, v2: Vec2, v3: Vec2, v4: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    let axis = |a: f32, b: f32, c: f32, d: f32| {
        0.5 * (2.0 * b
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    Vec2::new(
        axis(v1.x, v2.x, v3.x, v4.x),
        axis(v1.y, v2.y, v3.y, v4.y),
    )
}

/// Circle arc from the first to the last of three points, passing the middle one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CircularArc {
    centre: (f64, f64),
    radius: f64,
    theta_start: f64,
    /// Signed sweep angle.
    theta_range: f64,
}

impl CircularArc {
    /// `None` when the points are collinear.
    pub(crate) fn through(a: Vec2, b: Vec2, c: Vec2) -> Option<Self> {
        let (ax, ay) = (f64::from(a.x), f64::from(a.y));
        let (bx, by) = (f64::from(b.x), f64::from(b.y));
        let (cx, cy) = (f64::from(c.x), f64::from(c.y));

        let cross = (by - ay) * (cx - ax) - (bx - ax) * (cy - ay);
        if cross.abs() <= COLLINEAR_EPSILON {
            return None;
        }

        let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
        let a_sq = ax * ax + ay * ay;
        let b_sq = bx * bx + by * by;
        let c_sq = cx * cx + cy * cy;
        let centre = (
            (a_sq * (by - cy) + b_sq * (cy - ay) + c_sq * (ay - by)) / d,
            (a_sq * (cx - bx) + b_sq * (ax - cx) + c_sq * (bx - ax)) / d,
        );

        let radius = ((ax - centre.0).powi(2) + (ay - centre.1).powi(2)).sqrt();
        let theta_start = (ay - centre.1).atan2(ax - centre.0);
        let mut theta_end = (cy - centre.1).atan2(cx - centre.0);
        while theta_end < theta_start {
            theta_end += 2.0 * PI;
        }
        let mut theta_range = theta_end - theta_start;

        // sweep the other way round when B lies on the right of A->C
        let ortho = (cy - ay, -(cx - ax));
        if ortho.0 * (bx - ax) + ortho.1 * (by - ay) < 0.0 {
            theta_range = -(2.0 * PI - theta_range);
        }

        Some(Self {
            centre,
            radius,
            theta_start,
            theta_range,
        })
    }

    pub(crate) fn at(&self, u: f64) -> Vec2 {
        let theta = self.theta_start + self.theta_range * u;
        Vec2::new(
            (self.centre.0 + self.radius * theta.cos()) as f32,
            (self.centre.1 + self.radius * theta.sin()) as f32,
        )
    }
}
