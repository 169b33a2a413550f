//! Polyline simplification.
//!
//! Douglas-Peucker point elimination: find the vertex farthest from the
//! chord between a run's endpoints, collapse the run if that distance is
//! within tolerance, otherwise recurse on both halves. Endpoints always
//! survive.

use geo::{LineString, Simplify};
use kurbo::Point;

/// Simplify an ordered point sequence. `tolerance <= 0` returns the input.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 || tolerance <= 0.0 {
        return points.to_vec();
    }
    let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
    LineString::from(coords)
        .simplify(&tolerance)
        .into_inner()
        .into_iter()
        .map(|c| Point::new(c.x, c.y))
        .collect()
}
