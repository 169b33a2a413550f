//! Outline command stream → closed polygon contours.

use kurbo::{CubicBez, PathEl, Point, QuadBez};

use crate::error::Error;
use crate::flatten::{flatten_cubic, flatten_quad, FlattenParams};

/// An implicitly closed polygon: the last vertex connects to the first.
pub type Contour = Vec<Point>;

/// Walk an outline command stream and produce one contour per subpath.
///
/// A move starts a new contour (emitting the previous one if non-empty),
/// lines append a vertex, and curves append their flattened polyline.
/// The last contour is emitted at stream end even without a close.
/// A drawing command before any move is a fatal contract violation.
pub fn build<I>(commands: I, scale: f64, params: &FlattenParams) -> Result<Vec<Contour>, Error>
where
    I: IntoIterator<Item = PathEl>,
{
    let mut contours = Vec::new();
    let mut current: Contour = Vec::new();
    let mut scratch: Vec<Point> = Vec::new();
    let mut pen: Option<Point> = None;
    let mut subpath_start = Point::ZERO;

    for el in commands {
        match el {
            PathEl::MoveTo(p) => {
                emit(&mut contours, &mut current);
                current.push(p);
                pen = Some(p);
                subpath_start = p;
            }
            PathEl::LineTo(p) => {
                start_segment(&mut current, pen)?;
                current.push(p);
                pen = Some(p);
            }
            PathEl::QuadTo(c, p) => {
                let start = start_segment(&mut current, pen)?;
                scratch.clear();
                flatten_quad(QuadBez::new(start, c, p), scale, params, &mut scratch);
                // The flattened run repeats the pen position first.
                current.extend_from_slice(&scratch[1..]);
                pen = Some(p);
            }
            PathEl::CurveTo(c1, c2, p) => {
                let start = start_segment(&mut current, pen)?;
                scratch.clear();
                flatten_cubic(CubicBez::new(start, c1, c2, p), scale, params, &mut scratch);
                current.extend_from_slice(&scratch[1..]);
                pen = Some(p);
            }
            PathEl::ClosePath => {
                emit(&mut contours, &mut current);
                if pen.is_some() {
                    pen = Some(subpath_start);
                }
            }
        }
    }
    emit(&mut contours, &mut current);
    Ok(contours)
}

/// Ensure the current contour starts at the pen. Drawing after a close
/// without a new move continues from the closed subpath's start.
fn start_segment(current: &mut Contour, pen: Option<Point>) -> Result<Point, Error> {
    let start = pen.ok_or(Error::PathBeforeMove)?;
    if current.is_empty() {
        current.push(start);
    }
    Ok(start)
}

fn emit(contours: &mut Vec<Contour>, current: &mut Contour) {
    // An explicit closing segment duplicates the first vertex.
    if current.len() > 1 && current.first() == current.last() {
        current.pop();
    }
    if !current.is_empty() {
        contours.push(std::mem::take(current));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::BezPath;

    fn square(path: &mut BezPath, x: f64, y: f64, size: f64) {
        path.move_to((x, y));
        path.line_to((x + size, y));
        path.line_to((x + size, y + size));
        path.line_to((x, y + size));
        path.close_path();
    }

    #[test]
    fn line_square_becomes_four_vertices() {
        let mut path = BezPath::new();
        square(&mut path, 0.0, 0.0, 10.0);
        let contours = build(path.iter(), 1.0, &FlattenParams::default()).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0],
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn each_move_starts_a_contour() {
        let mut path = BezPath::new();
        square(&mut path, 0.0, 0.0, 100.0);
        square(&mut path, 25.0, 25.0, 50.0);
        let contours = build(path.iter(), 1.0, &FlattenParams::default()).unwrap();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[1][0], Point::new(25.0, 25.0));
    }

    #[test]
    fn open_final_contour_is_emitted() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((5.0, 0.0));
        path.line_to((5.0, 5.0));
        let contours = build(path.iter(), 1.0, &FlattenParams::default()).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 3);
    }

    #[test]
    fn explicit_closing_line_is_not_duplicated() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((5.0, 0.0));
        path.line_to((5.0, 5.0));
        path.line_to((0.0, 0.0));
        path.close_path();
        let contours = build(path.iter(), 1.0, &FlattenParams::default()).unwrap();
        assert_eq!(contours[0].len(), 3);
    }

    #[test]
    fn curves_are_flattened_without_repeating_the_pen() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.curve_to((0.0, 55.0), (45.0, 100.0), (100.0, 100.0));
        path.quad_to((100.0, 0.0), (0.0, 0.0));
        path.close_path();
        let contours = build(path.iter(), 1.0, &FlattenParams::default()).unwrap();
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert!(c.len() > 4);
        assert!(c.contains(&Point::new(100.0, 100.0)));
        for pair in c.windows(2) {
            assert_ne!(pair[0], pair[1], "consecutive duplicate vertex");
        }
    }

    #[test]
    fn drawing_before_move_fails_fast() {
        let commands = vec![PathEl::LineTo(Point::new(1.0, 1.0))];
        let err = build(commands, 1.0, &FlattenParams::default()).unwrap_err();
        assert!(matches!(err, Error::PathBeforeMove));
    }
}
