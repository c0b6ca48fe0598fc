// Slider paths: control points, curve interpolation and length fitting.

mod lagrange;
mod segment;

pub use lagrange::LagrangeCurve;
pub use segment::PathSegment;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathType {
    Linear,
    Bezier,
    Catmull,
    PerfectCurve,
}

impl PathType {
    /// Single-letter code used in hit object lines.
    pub fn letter(self) -> char {
        match self {
            Self::Linear => 'L',
            Self::Bezier => 'B',
            Self::Catmull => 'C',
            Self::PerfectCurve => 'P',
        }
    }

    pub fn from_letter(text: &str) -> Result<PathType> {
        match text {
            "L" => Ok(Self::Linear),
            "B" => Ok(Self::Bezier),
            "C" => Ok(Self::Catmull),
            "P" => Ok(Self::PerfectCurve),
            _ => Err(Error::format(format!("{text:?} is not a curve type"))),
        }
    }
}

/// A path vertex. A tagged vertex begins a new segment of that type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub position: Vec2,
    pub kind: Option<PathType>,
}

impl PathPoint {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            kind: None,
        }
    }

    pub fn typed(position: Vec2, kind: PathType) -> Self {
        Self {
            position,
            kind: Some(kind),
        }
    }
}

/// Evaluates a sequence of path points as consecutive curve segments.
///
/// Segments break at tagged points and, inside Bézier runs, at a point that
/// repeats its predecessor. The parameter of [`evaluate`](Self::evaluate) gives
/// each segment an equal share of `[0, 1]`; arc-length parameterisation is the
/// job of callers that know how finely to sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PathInterpolator {
    segments: Vec<PathSegment>,
    samples_per_segment: usize,
}

impl PathInterpolator {
    /// `samples_per_segment` sets how many steps each curved piece is sampled
    /// with when approximating lengths.
    pub fn new(points: &[PathPoint], samples_per_segment: usize) -> Self {
        Self {
            segments: split_segments(points),
            samples_per_segment: samples_per_segment.max(1),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn evaluate(&self, parameter: f64) -> Vec2 {
        let count = self.segments.len();
        if count == 0 {
            return Vec2::ZERO;
        }
        let scaled = parameter.clamp(0.0, 1.0) * count as f64;
        let index = (scaled.floor() as usize).min(count - 1);
        self.segments[index].evaluate(scaled - index as f64)
    }

    /// Polyline through every segment, shared boundary vertices included once.
    pub fn sample(&self) -> Vec<Vec2> {
        let mut out: Vec<Vec2> = Vec::new();
        for segment in &self.segments {
            let points = segment.sample(self.samples_per_segment);
            let skip = usize::from(out.last().is_some() && out.last() == points.first());
            out.extend(points.into_iter().skip(skip));
        }
        out
    }

    pub fn approximate_length(&self) -> f64 {
        polyline_length(&self.sample())
    }
}

fn split_segments(points: &[PathPoint]) -> Vec<PathSegment> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut runs: Vec<(PathType, Vec<Vec2>)> = Vec::new();
    let mut kind = first.kind.unwrap_or(PathType::Bezier);
    let mut current = vec![first.position];

    for point in &points[1..] {
        if let Some(next_kind) = point.kind {
            current.push(point.position);
            runs.push((kind, std::mem::replace(&mut current, vec![point.position])));
            kind = next_kind;
        } else if kind == PathType::Bezier && current.last() == Some(&point.position) {
            runs.push((kind, std::mem::replace(&mut current, vec![point.position])));
        } else {
            current.push(point.position);
        }
    }
    runs.push((kind, current));

    let has_curves = runs.iter().any(|(_, pts)| pts.len() > 1);
    runs.into_iter()
        .filter(|(_, pts)| !has_curves || pts.len() > 1)
        .map(|(kind, pts)| PathSegment::new(kind, pts))
        .collect()
}

fn polyline_length(points: &[Vec2]) -> f64 {
    points
        .windows(2)
        .map(|w| f64::from(w[0].distance(w[1])))
        .sum()
}

/// Control points of a slider together with the length the map declares for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SliderPath {
    pub control_points: Vec<PathPoint>,
    /// Declared pixel length. Longer paths are cut to it, shorter ones extended.
    pub expected_distance: Option<f64>,
}

impl SliderPath {
    pub const SAMPLES_PER_SEGMENT: usize = 50;

    pub fn new(control_points: Vec<PathPoint>, expected_distance: Option<f64>) -> Self {
        Self {
            control_points,
            expected_distance,
        }
    }

    pub fn interpolator(&self) -> PathInterpolator {
        PathInterpolator::new(&self.control_points, Self::SAMPLES_PER_SEGMENT)
    }

    /// Sampled path fitted to the expected distance.
    pub fn calculated_path(&self) -> Vec<Vec2> {
        let mut path = self.interpolator().sample();
        let Some(expected) = self.expected_distance else {
            return path;
        };
        if path.len() < 2 {
            return path;
        }

        let mut travelled = 0.0;
        for i in 1..path.len() {
            let step = f64::from(path[i - 1].distance(path[i]));
            if travelled + step >= expected {
                let t = if step > 0.0 {
                    ((expected - travelled) / step) as f32
                } else {
                    0.0
                };
                path[i] = path[i - 1].lerp(path[i], t);
                path.truncate(i + 1);
                return path;
            }
            travelled += step;
        }

        let last = path[path.len() - 1];
        let direction = (last - path[path.len() - 2]).normalized();
        if direction != Vec2::ZERO {
            path.push(last + direction * (expected - travelled) as f32);
        }
        path
    }

    pub fn distance(&self) -> f64 {
        polyline_length(&self.calculated_path())
    }

    /// Position at `progress` in `[0, 1]` of the fitted path's arc length.
    pub fn position_at(&self, progress: f64) -> Vec2 {
        let path = self.calculated_path();
        let Some(&first) = path.first() else {
            return Vec2::ZERO;
        };
        let target = progress.clamp(0.0, 1.0) * polyline_length(&path);
        let mut travelled = 0.0;
        for w in path.windows(2) {
            let step = f64::from(w[0].distance(w[1]));
            if travelled + step >= target && step > 0.0 {
                return w[0].lerp(w[1], ((target - travelled) / step) as f32);
            }
            travelled += step;
        }
        path.last().copied().unwrap_or(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> PathPoint {
        PathPoint::new(Vec2::new(x, y))
    }

    #[test]
    fn test_letters() {
        for kind in [
            PathType::Linear,
            PathType::Bezier,
            PathType::Catmull,
            PathType::PerfectCurve,
        ] {
            assert_eq!(
                PathType::from_letter(&kind.letter().to_string()).unwrap(),
                kind
            );
        }
        assert!(PathType::from_letter("X").is_err());
    }

    #[test]
    fn test_duplicate_point_splits_bezier() {
        let points = [
            PathPoint::typed(Vec2::ZERO, PathType::Bezier),
            pt(50.0, 50.0),
            pt(100.0, 0.0),
            pt(100.0, 0.0),
            pt(150.0, 50.0),
            pt(200.0, 0.0),
        ];
        let interp = PathInterpolator::new(&points, 10);
        assert_eq!(interp.segments().len(), 2);
        assert_eq!(interp.segments()[0].points().len(), 3);
        assert_eq!(interp.segments()[1].points()[0], Vec2::new(100.0, 0.0));
        assert_eq!(interp.evaluate(0.5), Vec2::new(100.0, 0.0));
        assert_eq!(interp.evaluate(1.0), Vec2::new(200.0, 0.0));
    }

    #[test]
    fn test_duplicate_point_does_not_split_linear() {
        let points = [
            PathPoint::typed(Vec2::ZERO, PathType::Linear),
            pt(100.0, 0.0),
            pt(100.0, 0.0),
            pt(100.0, 100.0),
        ];
        let interp = PathInterpolator::new(&points, 10);
        assert_eq!(interp.segments().len(), 1);
        assert!((interp.approximate_length() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_typed_point_starts_segment() {
        let points = [
            PathPoint::typed(Vec2::ZERO, PathType::Linear),
            pt(100.0, 0.0),
            PathPoint::typed(Vec2::new(100.0, 100.0), PathType::PerfectCurve),
            pt(150.0, 150.0),
            pt(100.0, 200.0),
        ];
        let interp = PathInterpolator::new(&points, 10);
        assert_eq!(interp.segments().len(), 2);
        assert_eq!(interp.segments()[0].kind(), PathType::Linear);
        assert_eq!(interp.segments()[1].kind(), PathType::PerfectCurve);
    }

    #[test]
    fn test_semicircle_length() {
        let points = [
            PathPoint::typed(Vec2::ZERO, PathType::PerfectCurve),
            pt(50.0, 50.0),
            pt(100.0, 0.0),
        ];
        let interp = PathInterpolator::new(&points, 200);
        let expected = 50.0 * std::f64::consts::PI;
        assert!((interp.approximate_length() - expected).abs() < 0.05);
    }

    #[test]
    fn test_empty_path() {
        let interp = PathInterpolator::new(&[], 10);
        assert_eq!(interp.evaluate(0.3), Vec2::ZERO);
        assert_eq!(interp.approximate_length(), 0.0);
    }

    #[test]
    fn test_slider_path_cut_to_expected_distance() {
        let path = SliderPath::new(
            vec![PathPoint::typed(Vec2::ZERO, PathType::Linear), pt(200.0, 0.0)],
            Some(150.0),
        );
        assert!((path.distance() - 150.0).abs() < 1e-4);
        assert_eq!(path.position_at(1.0), Vec2::new(150.0, 0.0));
        assert_eq!(path.position_at(0.5), Vec2::new(75.0, 0.0));
    }

    #[test]
    fn test_slider_path_extended_to_expected_distance() {
        let path = SliderPath::new(
            vec![PathPoint::typed(Vec2::ZERO, PathType::Linear), pt(0.0, 100.0)],
            Some(160.0),
        );
        assert!((path.distance() - 160.0).abs() < 1e-4);
        assert_eq!(path.position_at(1.0), Vec2::new(0.0, 160.0));
    }
}
