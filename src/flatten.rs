//! Adaptive Bezier flattening.
//!
//! Recursive de Casteljau subdivision in the style of the Anti-Grain
//! Geometry curve divider. Each level splits the cubic at t = 0.5 and
//! decides whether the current piece can be replaced by its midpoint:
//!
//! 1. **Flatness**: control-point distance from the chord, normalized by
//!    chord length², against `(distance_epsilon / scale)²`.
//! 2. **Angle**: optional cap on the summed turning angle of the piece.
//! 3. **Cusp**: optional limit above which a control point is emitted
//!    directly as a sharp corner.
//!
//! Recursion depth is capped (`recursion_limit`, default 8).

use kurbo::{CubicBez, Point, QuadBez, Vec2};

/// Tolerances for adaptive flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlattenParams {
    /// Maximum chord deviation at `scale = 1`, before squaring.
    pub distance_epsilon: f64,
    /// Maximum summed turning angle (radians) of an accepted piece.
    /// Values below `angle_epsilon` disable the angle test.
    pub angle_tolerance: f64,
    /// Threshold under which `angle_tolerance` counts as disabled.
    pub angle_epsilon: f64,
    /// Control-point deviation angle that forces a sharp corner. 0 = off.
    pub cusp_limit: f64,
    /// Maximum subdivision depth.
    pub recursion_limit: u32,
    /// Cross-product magnitude below which a control point lies on the chord.
    pub collinearity_epsilon: f64,
}

impl Default for FlattenParams {
    fn default() -> Self {
        Self {
            distance_epsilon: 1.0,
            angle_tolerance: 0.0,
            angle_epsilon: 0.01,
            cusp_limit: 0.0,
            recursion_limit: 8,
            collinearity_epsilon: f32::EPSILON as f64,
        }
    }
}

/// Flatten a cubic into `out`, pushing the start point, the interior
/// points, and the end point. The result is an open polyline.
pub fn flatten_cubic(curve: CubicBez, scale: f64, params: &FlattenParams, out: &mut Vec<Point>) {
    let tolerance = params.distance_epsilon / scale;
    let divider = Divider {
        params,
        distance_tolerance_sq: tolerance * tolerance,
    };
    out.push(curve.p0);
    divider.subdivide(curve.p0, curve.p1, curve.p2, curve.p3, 0, out);
    out.push(curve.p3);
}

/// Flatten a quadratic by promoting it to the equivalent cubic.
pub fn flatten_quad(curve: QuadBez, scale: f64, params: &FlattenParams, out: &mut Vec<Point>) {
    flatten_cubic(curve.raise(), scale, params, out);
}

struct Divider<'a> {
    params: &'a FlattenParams,
    distance_tolerance_sq: f64,
}

impl Divider<'_> {
    fn subdivide(&self, p1: Point, p2: Point, p3: Point, p4: Point, level: u32, out: &mut Vec<Point>) {
        if level > self.params.recursion_limit {
            return;
        }

        let p12 = p1.midpoint(p2);
        let p23 = p2.midpoint(p3);
        let p34 = p3.midpoint(p4);
        let p123 = p12.midpoint(p23);
        let p234 = p23.midpoint(p34);
        let p1234 = p123.midpoint(p234);

        let chord = p4 - p1;
        let chord_sq = chord.hypot2();
        let d2 = cross(p2 - p4, chord).abs();
        let d3 = cross(p3 - p4, chord).abs();
        let eps = self.params.collinearity_epsilon;

        // Both controls on the chord and between the endpoints: the piece
        // is the chord itself and needs no interior points.
        if d2 <= eps && d3 <= eps && within_chord(p1, p2, p4) && within_chord(p1, p3, p4) {
            return;
        }

        // The first level always splits.
        if level > 0 && self.try_finish(p1, p2, p3, p4, p1234, d2, d3, chord_sq, out) {
            return;
        }

        self.subdivide(p1, p12, p123, p1234, level + 1, out);
        self.subdivide(p1234, p234, p34, p4, level + 1, out);
    }

    /// Apply the flatness, angle, and cusp tests. Returns true when the
    /// piece was resolved and recursion should stop.
    #[allow(clippy::too_many_arguments)]
    fn try_finish(
        &self,
        p1: Point,
        p2: Point,
        p3: Point,
        p4: Point,
        mid: Point,
        d2: f64,
        d3: f64,
        chord_sq: f64,
        out: &mut Vec<Point>,
    ) -> bool {
        let eps = self.params.collinearity_epsilon;
        let tol = self.distance_tolerance_sq;
        let angle_enabled = self.params.angle_tolerance >= self.params.angle_epsilon;
        let cusp = self.params.cusp_limit;

        if d2 > eps && d3 > eps {
            if (d2 + d3) * (d2 + d3) > tol * chord_sq {
                return false;
            }
            if !angle_enabled {
                out.push(mid);
                return true;
            }
            let a23 = (p3 - p2).atan2();
            let da1 = wrap_angle((a23 - (p2 - p1).atan2()).abs());
            let da2 = wrap_angle(((p4 - p3).atan2() - a23).abs());
            if da1 + da2 < self.params.angle_tolerance {
                out.push(mid);
                return true;
            }
            if cusp != 0.0 {
                if da1 > cusp {
                    out.push(p2);
                    return true;
                }
                if da2 > cusp {
                    out.push(p3);
                    return true;
                }
            }
            false
        } else if d2 > eps {
            // p1, p3, p4 collinear; p2 carries the curvature.
            if d2 * d2 > tol * chord_sq {
                return false;
            }
            if !angle_enabled {
                out.push(mid);
                return true;
            }
            let da1 = wrap_angle(((p3 - p2).atan2() - (p2 - p1).atan2()).abs());
            if da1 < self.params.angle_tolerance {
                out.push(p2);
                out.push(p3);
                return true;
            }
            if cusp != 0.0 && da1 > cusp {
                out.push(p2);
                return true;
            }
            false
        } else if d3 > eps {
            // p1, p2, p4 collinear; p3 carries the curvature.
            if d3 * d3 > tol * chord_sq {
                return false;
            }
            if !angle_enabled {
                out.push(mid);
                return true;
            }
            let da1 = wrap_angle(((p4 - p3).atan2() - (p3 - p2).atan2()).abs());
            if da1 < self.params.angle_tolerance {
                out.push(p2);
                out.push(p3);
                return true;
            }
            if cusp != 0.0 && da1 > cusp {
                out.push(p3);
                return true;
            }
            false
        } else {
            // Fully collinear (or zero-length chord): compare the curve
            // midpoint against the chord midpoint directly.
            let deviation = mid - p1.midpoint(p4);
            if deviation.hypot2() <= tol {
                out.push(mid);
                return true;
            }
            false
        }
    }
}

fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Whether `p` projects onto the segment `a`→`b`.
fn within_chord(a: Point, p: Point, b: Point) -> bool {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq <= 0.0 {
        return false;
    }
    let t = (p - a).dot(ab) / len_sq;
    (0.0..=1.0).contains(&t)
}

fn wrap_angle(a: f64) -> f64 {
    if a >= std::f64::consts::PI {
        2.0 * std::f64::consts::PI - a
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_circle(r: f64) -> CubicBez {
        let k = 0.552_284_749_8 * r;
        CubicBez::new((r, 0.0), (r, k), (k, r), (0.0, r))
    }

    #[test]
    fn collinear_cubic_yields_only_endpoints() {
        let curve = CubicBez::new((0.0, 0.0), (10.0, 5.0), (20.0, 10.0), (30.0, 15.0));
        let mut out = Vec::new();
        flatten_cubic(curve, 1.0, &FlattenParams::default(), &mut out);
        assert_eq!(out, vec![Point::new(0.0, 0.0), Point::new(30.0, 15.0)]);
    }

    #[test]
    fn curved_segment_is_subdivided_and_keeps_endpoints() {
        let curve = quarter_circle(100.0);
        let mut out = Vec::new();
        flatten_cubic(curve, 1.0, &FlattenParams::default(), &mut out);
        assert!(out.len() > 4, "expected interior points, got {}", out.len());
        assert_eq!(out.first(), Some(&curve.p0));
        assert_eq!(out.last(), Some(&curve.p3));
        // Every emitted point lies close to the circle.
        for p in &out {
            let r = p.to_vec2().hypot();
            assert!((r - 100.0).abs() < 1.0, "point {:?} off the arc (r = {})", p, r);
        }
    }

    #[test]
    fn higher_scale_produces_denser_polyline() {
        let curve = quarter_circle(100.0);
        let params = FlattenParams::default();
        let mut coarse = Vec::new();
        let mut fine = Vec::new();
        flatten_cubic(curve, 0.3, &params, &mut coarse);
        flatten_cubic(curve, 4.0, &params, &mut fine);
        assert!(fine.len() > coarse.len());
    }

    #[test]
    fn recursion_limit_caps_subdivision() {
        let curve = quarter_circle(1000.0);
        let params = FlattenParams {
            recursion_limit: 0,
            ..FlattenParams::default()
        };
        let mut out = Vec::new();
        flatten_cubic(curve, 100.0, &params, &mut out);
        assert_eq!(out.len(), 2);

        let deep = FlattenParams::default();
        let mut out = Vec::new();
        flatten_cubic(curve, 1.0e6, &deep, &mut out);
        assert!(out.len() <= 2 + (1 << (deep.recursion_limit + 1)));
    }

    #[test]
    fn cusp_limit_emits_control_point_as_corner() {
        // A tight hairpin: both controls far out on one side.
        let curve = CubicBez::new((0.0, 0.0), (50.0, 100.0), (51.0, 100.0), (1.0, 0.0));
        let left_control = Point::new(37.75, 75.0);
        let right_control = Point::new(38.25, 75.0);

        let cusp = FlattenParams {
            angle_tolerance: 0.01,
            cusp_limit: 0.2,
            ..FlattenParams::default()
        };
        let mut out = Vec::new();
        flatten_cubic(curve, 1.0, &cusp, &mut out);
        // Each half of the first split ends in a sharp turn, emitted as
        // its control point.
        assert_eq!(out, vec![curve.p0, left_control, right_control, curve.p3]);

        let no_cusp = FlattenParams {
            cusp_limit: 0.0,
            ..cusp
        };
        let mut out = Vec::new();
        flatten_cubic(curve, 1.0, &no_cusp, &mut out);
        assert!(out.len() > 4, "got {} points", out.len());
        assert!(!out.contains(&left_control));
        assert!(!out.contains(&right_control));
    }

    #[test]
    fn angle_tolerance_adds_points() {
        let curve = quarter_circle(100.0);
        let mut distance_only = Vec::new();
        flatten_cubic(curve, 1.0, &FlattenParams::default(), &mut distance_only);

        let params = FlattenParams {
            angle_tolerance: 0.02,
            ..FlattenParams::default()
        };
        let mut angle = Vec::new();
        flatten_cubic(curve, 1.0, &params, &mut angle);
        assert!(
            angle.len() > 2 * distance_only.len(),
            "{} points with the angle test, {} without",
            angle.len(),
            distance_only.len()
        );
        for p in &angle {
            let r = p.to_vec2().hypot();
            assert!((r - 100.0).abs() < 1.0, "point {:?} off the arc (r = {})", p, r);
        }
    }

    #[test]
    fn quadratic_is_promoted() {
        let quad = QuadBez::new((0.0, 0.0), (50.0, 100.0), (100.0, 0.0));
        let mut out = Vec::new();
        flatten_quad(quad, 1.0, &FlattenParams::default(), &mut out);
        assert_eq!(out.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(out.last(), Some(&Point::new(100.0, 0.0)));
        let apex = out.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert!((apex - 50.0).abs() < 2.0, "apex {}", apex);
    }
}
