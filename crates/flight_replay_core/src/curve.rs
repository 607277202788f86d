// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flight path curve.
//!
//! A centripetal Catmull-Rom spline through the scenario's control points,
//! reparameterized by arc length so that a progress value `t` in `[0, 1]`
//! advances the aircraft at a constant ground speed along the path.

use glam::Vec3;
use thiserror::Error;

/// Number of samples per segment in the arc-length table
const SAMPLES_PER_SEGMENT: usize = 64;

/// Knot spans shorter than this fall back to unit spacing
const MIN_KNOT_SPACING: f32 = 1e-4;

/// Errors raised while building a flight path
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// Not enough control points to define a path
    #[error("A flight path needs at least 2 control points, got {0}")]
    TooFewPoints(usize),

    /// A control point has a NaN or infinite coordinate
    #[error("Control point {0} has a non-finite coordinate")]
    NonFinite(usize),

    /// Two consecutive control points are the same position
    #[error("Control points {0} and {1} coincide")]
    CoincidentPoints(usize, usize),
}

/// Clamp a progress value into `[0, 1]`, mapping NaN to the start.
pub fn clamp_progress(t: f32) -> f32 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Cubic polynomial for one span of the spline, `c0 + c1 s + c2 s^2 + c3 s^3`
#[derive(Debug, Clone, Copy)]
struct Segment {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl Segment {
    /// Build the span between `p1` and `p2` with centripetal knot spacing.
    fn centripetal(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);

        if dt1 < MIN_KNOT_SPACING {
            dt1 = 1.0;
        }
        if dt0 < MIN_KNOT_SPACING {
            dt0 = dt1;
        }
        if dt2 < MIN_KNOT_SPACING {
            dt2 = dt1;
        }

        // Hermite tangents for a non-uniform knot sequence, rescaled to [0, 1]
        let m1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let m2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        Self {
            c0: p1,
            c1: m1,
            c2: -3.0 * p1 + 3.0 * p2 - 2.0 * m1 - m2,
            c3: 2.0 * p1 - 2.0 * p2 + m1 + m2,
        }
    }

    fn point(&self, s: f32) -> Vec3 {
        self.c0 + s * (self.c1 + s * (self.c2 + s * self.c3))
    }

    fn derivative(&self, s: f32) -> Vec3 {
        self.c1 + s * (2.0 * self.c2 + 3.0 * s * self.c3)
    }
}

/// Read-only flight path built once from an ordered set of control points
#[derive(Debug, Clone)]
pub struct FlightPath {
    /// Points the path passes through, in flight order
    control_points: Vec<Vec3>,
    /// One cubic per pair of consecutive control points
    segments: Vec<Segment>,
    /// Cumulative arc length at each table sample, starting at 0
    arc_lengths: Vec<f32>,
}

impl FlightPath {
    /// Build a path through `points`.
    ///
    /// The path starts at the first point and ends at the last. Consecutive
    /// duplicates are rejected because they leave the tangent undefined.
    pub fn new(points: &[Vec3]) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints(points.len()));
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(CurveError::NonFinite(index));
        }
        for (index, pair) in points.windows(2).enumerate() {
            if pair[0].distance_squared(pair[1]) < MIN_KNOT_SPACING * MIN_KNOT_SPACING {
                return Err(CurveError::CoincidentPoints(index, index + 1));
            }
        }

        let n = points.len();
        let segments: Vec<Segment> = (0..n - 1)
            .map(|i| {
                // Open ends are extended by mirroring the neighbouring point
                let p0 = if i == 0 { 2.0 * points[0] - points[1] } else { points[i - 1] };
                let p3 = if i + 2 < n {
                    points[i + 2]
                } else {
                    2.0 * points[n - 1] - points[n - 2]
                };
                Segment::centripetal(p0, points[i], points[i + 1], p3)
            })
            .collect();

        let mut arc_lengths = Vec::with_capacity(segments.len() * SAMPLES_PER_SEGMENT + 1);
        arc_lengths.push(0.0);
        let mut total = 0.0;
        for segment in &segments {
            let mut previous = segment.point(0.0);
            for j in 1..=SAMPLES_PER_SEGMENT {
                let current = segment.point(j as f32 / SAMPLES_PER_SEGMENT as f32);
                total += previous.distance(current);
                arc_lengths.push(total);
                previous = current;
            }
        }

        tracing::debug!(
            "Built flight path: {} control points, length {:.1}",
            n,
            total
        );

        Ok(Self {
            control_points: points.to_vec(),
            segments,
            arc_lengths,
        })
    }

    /// Control points in flight order
    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    /// Approximate length of the whole path
    pub fn total_length(&self) -> f32 {
        self.arc_lengths.last().copied().unwrap_or(0.0)
    }

    /// Position at progress `t`; out-of-range values are clamped.
    pub fn position_at(&self, t: f32) -> Vec3 {
        let (segment, s) = self.locate(t);
        self.segments[segment].point(s)
    }

    /// Unit direction of travel at progress `t`; out-of-range values are clamped.
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let (segment, s) = self.locate(t);
        self.segments[segment]
            .derivative(s)
            .try_normalize()
            .unwrap_or_else(|| {
                (self.control_points[segment + 1] - self.control_points[segment]).normalize()
            })
    }

    /// Progress value at which the path passes through control point `index`.
    pub fn knot_progress(&self, index: usize) -> Option<f32> {
        if index >= self.control_points.len() {
            return None;
        }
        let total = self.total_length();
        Some(self.arc_lengths[index * SAMPLES_PER_SEGMENT] / total)
    }

    /// `count` positions evenly spaced along the path, both ends included.
    pub fn sample(&self, count: usize) -> Vec<Vec3> {
        match count {
            0 => Vec::new(),
            1 => vec![self.position_at(0.0)],
            _ => (0..count)
                .map(|i| self.position_at(i as f32 / (count - 1) as f32))
                .collect(),
        }
    }

    /// Map an arc-length fraction to a segment index and local parameter.
    fn locate(&self, t: f32) -> (usize, f32) {
        let target = clamp_progress(t) * self.total_length();
        let last = self.arc_lengths.len() - 1;

        // Last table sample not beyond the target distance
        let i = self
            .arc_lengths
            .partition_point(|&length| length <= target)
            .saturating_sub(1);
        if i >= last {
            return (self.segments.len() - 1, 1.0);
        }

        let (a, b) = (self.arc_lengths[i], self.arc_lengths[i + 1]);
        let fraction = if b > a { (target - a) / (b - a) } else { 0.0 };
        let segment = i / SAMPLES_PER_SEGMENT;
        let s = ((i % SAMPLES_PER_SEGMENT) as f32 + fraction) / SAMPLES_PER_SEGMENT as f32;
        (segment, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approach_path() -> FlightPath {
        FlightPath::new(&[
            Vec3::new(0.0, 300.0, -5000.0),
            Vec3::new(0.0, 150.0, -2500.0),
            Vec3::new(10.0, 30.0, -500.0),
            Vec3::new(15.0, 20.0, -200.0),
            Vec3::new(20.0, 5.0, 0.0),
        ])
        .unwrap()
    }

    fn assert_near(a: Vec3, b: Vec3, tolerance: f32) {
        assert!(a.distance(b) < tolerance, "{a} is not within {tolerance} of {b}");
    }

    #[test]
    fn test_endpoints() {
        let path = approach_path();
        assert_near(path.position_at(0.0), Vec3::new(0.0, 300.0, -5000.0), 1e-3);
        assert_near(path.position_at(1.0), Vec3::new(20.0, 5.0, 0.0), 1e-2);
    }

    #[test]
    fn test_passes_through_control_points() {
        let path = approach_path();
        assert_eq!(path.knot_progress(0), Some(0.0));
        assert_eq!(path.knot_progress(4), Some(1.0));
        assert_eq!(path.knot_progress(5), None);

        for (index, point) in path.control_points().iter().enumerate() {
            let t = path.knot_progress(index).unwrap();
            assert_near(path.position_at(t), *point, 0.05);
        }
    }

    #[test]
    fn test_knots_increase() {
        let path = approach_path();
        let knots: Vec<f32> = (0..5).map(|i| path.knot_progress(i).unwrap()).collect();
        assert!(knots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_tangent_is_unit_length() {
        let path = approach_path();
        for step in 0..=1000 {
            let t = step as f32 / 1000.0;
            let tangent = path.tangent_at(t);
            assert!((tangent.length() - 1.0).abs() < 1e-4, "tangent at {t} is {tangent}");
        }
    }

    #[test]
    fn test_tangent_follows_direction_of_travel() {
        let path = approach_path();
        // The approach runs towards +Z the whole way
        for step in 0..=20 {
            let t = step as f32 / 20.0;
            assert!(path.tangent_at(t).z > 0.9);
        }
    }

    #[test]
    fn test_progress_is_clamped() {
        let path = approach_path();
        assert_eq!(path.position_at(-0.5), path.position_at(0.0));
        assert_eq!(path.position_at(1.5), path.position_at(1.0));
        assert_eq!(path.position_at(f32::NAN), path.position_at(0.0));
        assert_eq!(path.tangent_at(7.0), path.tangent_at(1.0));
        assert_eq!(clamp_progress(f32::NAN), 0.0);
        assert_eq!(clamp_progress(0.25), 0.25);
    }

    #[test]
    fn test_arc_length_parameterization() {
        let path = approach_path();
        let steps = 2000;
        let mut first_half = 0.0;
        let mut second_half = 0.0;
        let mut previous = path.position_at(0.0);
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            let current = path.position_at(t);
            if t <= 0.5 {
                first_half += previous.distance(current);
            } else {
                second_half += previous.distance(current);
            }
            previous = current;
        }
        let ratio = first_half / second_half;
        assert!((ratio - 1.0).abs() < 0.01, "halves differ: {first_half} vs {second_half}");
    }

    #[test]
    fn test_two_point_path_is_straight() {
        let path = FlightPath::new(&[Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)]).unwrap();
        assert_near(path.position_at(0.5), Vec3::new(0.0, 0.0, 5.0), 1e-3);
        assert_near(path.tangent_at(0.3), Vec3::Z, 1e-4);
        assert!((path.total_length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_sample() {
        let path = approach_path();
        assert!(path.sample(0).is_empty());
        assert_eq!(path.sample(1), vec![path.position_at(0.0)]);

        let points = path.sample(51);
        assert_eq!(points.len(), 51);
        assert_eq!(points[0], path.position_at(0.0));
        assert_eq!(points[50], path.position_at(1.0));
    }

    #[test]
    fn test_rejects_degenerate_input() {
        assert_eq!(FlightPath::new(&[]).unwrap_err(), CurveError::TooFewPoints(0));
        assert_eq!(
            FlightPath::new(&[Vec3::ONE]).unwrap_err(),
            CurveError::TooFewPoints(1)
        );
        assert_eq!(
            FlightPath::new(&[Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Y]).unwrap_err(),
            CurveError::CoincidentPoints(1, 2)
        );
        assert_eq!(
            FlightPath::new(&[Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0)]).unwrap_err(),
            CurveError::NonFinite(1)
        );
    }
}
