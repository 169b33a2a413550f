//! Shared geometry utilities.

use kurbo::Point;

/// Axis-aligned bounds of a glyph's contours, rounded outward to whole
/// units (floor min, ceil max) so ray start and stop positions are stable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    /// Bounds of every vertex in `contours`, rounded outward.
    /// Returns `EMPTY` when there are no vertices.
    pub fn from_contours<C: AsRef<[Point]>>(contours: &[C]) -> BoundingBox {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for contour in contours {
            for p in contour.as_ref() {
                min_x = min_x.min(p.x);
                min_y = min_y.min(p.y);
                max_x = max_x.max(p.x);
                max_y = max_y.max(p.y);
            }
        }
        if min_x > max_x {
            return BoundingBox::EMPTY;
        }
        let (min_x, min_y) = (min_x.floor(), min_y.floor());
        let (max_x, max_y) = (max_x.ceil(), max_y.ceil());
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}
