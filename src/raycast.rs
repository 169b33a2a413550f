//! Point-in-polygon hit testing and horizontal ray marching.

use kurbo::Point;

/// Even-odd point-in-polygon tester for one contour.
///
/// Per edge `(i, i-1)` the x position where the edge crosses a horizontal
/// line at `y` is precomputed as `y * multiplier + constant`, so a query
/// costs one multiply-add per straddling edge.
///
/// Boundaries are half-open: an edge straddles `y` when exactly one of its
/// endpoints lies strictly below it (`vertex.y > y`), and a crossing counts
/// when it lies at or left of the query x. A square spanning `[0, 10]`
/// therefore contains `x` and `y` in `[0, 10)`; points on its right or
/// bottom edge test as outside.
#[derive(Debug, Clone)]
pub struct PolygonHitTester {
    ys: Vec<f64>,
    constant: Vec<f64>,
    multiplier: Vec<f64>,
}

impl PolygonHitTester {
    pub fn new(contour: &[Point]) -> Self {
        let n = contour.len();
        let mut constant = Vec::with_capacity(n);
        let mut multiplier = Vec::with_capacity(n);
        for i in 0..n {
            let Point { x, y } = contour[i];
            let Point { x: nx, y: ny } = contour[(i + n - 1) % n];
            if ny == y {
                constant.push(x);
                multiplier.push(0.0);
            } else {
                constant.push(x - (y * nx) / (ny - y) + (y * x) / (ny - y));
                multiplier.push((nx - x) / (ny - y));
            }
        }
        Self {
            ys: contour.iter().map(|p| p.y).collect(),
            constant,
            multiplier,
        }
    }

    /// True iff `(x, y)` is inside the contour under the even-odd rule.
    pub fn test(&self, x: f64, y: f64) -> bool {
        let Some(&last) = self.ys.last() else {
            return false;
        };
        let mut inside = false;
        let mut current = last > y;
        for (i, &vy) in self.ys.iter().enumerate() {
            let previous = current;
            current = vy > y;
            if current != previous {
                inside ^= y * self.multiplier[i] + self.constant[i] <= x;
            }
        }
        inside
    }

    pub fn len(&self) -> usize {
        self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ys.is_empty()
    }
}

/// True if the point is inside any of the testers.
pub fn hits_any(testers: &[PolygonHitTester], x: f64, y: f64) -> bool {
    testers.iter().any(|t| t.test(x, y))
}

/// March from `start_x` along `y` in increments of `step` (negative steps
/// go left) until a point hits one of the testers or `max_distance` has
/// been covered. Returns the x position reached.
///
/// A miss ends exactly on the far boundary, `start_x ± max_distance`.
pub fn raycast_x(
    testers: &[PolygonHitTester],
    start_x: f64,
    y: f64,
    step: f64,
    max_distance: f64,
) -> f64 {
    let stride = step.abs();
    let mut distance = 0.0;
    let mut x = start_x;
    while distance < max_distance {
        if hits_any(testers, x, y) {
            return x;
        }
        x += step;
        distance += stride;
    }
    start_x + max_distance.max(0.0).copysign(step)
}
