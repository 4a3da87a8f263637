//! Conversion between norad contours and kurbo paths
//!
//! Source glyphs are drawn as centerlines, so open contours are common
//! and must survive the trip into a `BezPath` without being closed.
//! Stroked outlines are fills, so [`outline_to_contours`] writes every
//! subpath out as a closed UFO contour.

use kurbo::{BezPath, PathEl, Point};
use norad::{Contour, ContourPoint, PointType};

/// Convert a UFO contour into a kurbo path.
///
/// A contour whose first point is a `move` is open; any other contour
/// wraps around to its first point and is closed.
pub fn contour_to_bezpath(contour: &Contour) -> BezPath {
    let mut path = BezPath::new();
    let points = &contour.points;
    if points.is_empty() {
        return path;
    }

    let is_open = points[0].typ == PointType::Move;

    // Closed contours may start on an off-curve point; rotate so the
    // walk begins on the first on-curve point.
    let start = if is_open {
        0
    } else {
        match points.iter().position(|p| p.typ != PointType::OffCurve) {
            Some(idx) => idx,
            // All off-curve: an implied-oncurve quadratic loop, not drawable here
            None => return path,
        }
    };

    let first = &points[start];
    let first_pt = Point::new(first.x, first.y);
    path.move_to(first_pt);

    let mut pending: Vec<Point> = Vec::new();
    let count = points.len();
    let steps = if is_open { count - 1 } else { count };
    for step in 1..=steps {
        let point = &points[(start + step) % count];
        let pt = Point::new(point.x, point.y);
        match point.typ {
            PointType::OffCurve => pending.push(pt),
            PointType::Move | PointType::Line => {
                path.line_to(pt);
                pending.clear();
            }
            PointType::Curve => {
                push_curve(&mut path, &pending, pt);
                pending.clear();
            }
            PointType::QCurve => {
                push_qcurve(&mut path, &pending, pt);
                pending.clear();
            }
        }
    }

    if !is_open {
        path.close_path();
    }
    path
}

fn push_curve(path: &mut BezPath, offcurves: &[Point], end: Point) {
    match offcurves {
        [] => path.line_to(end),
        [cp] => path.quad_to(*cp, end),
        [.., cp1, cp2] => path.curve_to(*cp1, *cp2, end),
    }
}

fn push_qcurve(path: &mut BezPath, offcurves: &[Point], end: Point) {
    if offcurves.is_empty() {
        path.line_to(end);
        return;
    }
    for (i, cp) in offcurves.iter().enumerate() {
        let seg_end = match offcurves.get(i + 1) {
            Some(next) => cp.midpoint(*next),
            None => end,
        };
        path.quad_to(*cp, seg_end);
    }
}

/// Convert a kurbo path into UFO contours, one per subpath.
pub fn bezpath_to_contours(path: &BezPath) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut points: Vec<ContourPoint> = Vec::new();
    let mut start: Option<Point> = None;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                if !points.is_empty() {
                    contours.push(finish_open(std::mem::take(&mut points)));
                }
                start = Some(p);
                points.push(point(p, PointType::Move));
            }
            PathEl::LineTo(p) => points.push(point(p, PointType::Line)),
            PathEl::QuadTo(c, p) => {
                points.push(point(c, PointType::OffCurve));
                points.push(point(p, PointType::QCurve));
            }
            PathEl::CurveTo(c1, c2, p) => {
                points.push(point(c1, PointType::OffCurve));
                points.push(point(c2, PointType::OffCurve));
                points.push(point(p, PointType::Curve));
            }
            PathEl::ClosePath => {
                if let Some(start) = start.take() {
                    contours.push(finish_closed(std::mem::take(&mut points), start));
                }
            }
        }
    }
    if !points.is_empty() {
        contours.push(finish_open(points));
    }
    contours
}

/// Convert a filled outline into closed UFO contours.
///
/// Stroke expansion leaves its subpaths unclosed, so every subpath is
/// closed here before conversion.
pub fn outline_to_contours(outline: &BezPath) -> Vec<Contour> {
    bezpath_to_contours(&close_subpaths(outline))
}

fn close_subpaths(path: &BezPath) -> BezPath {
    let mut closed = BezPath::new();
    let mut open = false;
    for el in path.elements() {
        match el {
            PathEl::MoveTo(_) => {
                if open {
                    closed.close_path();
                }
                open = true;
            }
            PathEl::ClosePath => {
                if !open {
                    continue;
                }
                open = false;
            }
            _ => {}
        }
        closed.push(*el);
    }
    if open {
        closed.close_path();
    }
    closed
}

fn point(p: Point, typ: PointType) -> ContourPoint {
    ContourPoint::new(p.x, p.y, typ, false, None, None)
}

fn finish_open(points: Vec<ContourPoint>) -> Contour {
    Contour::new(points, None)
}

/// Close a contour: the segment that returns to the start point becomes
/// the type of the first point, and a duplicated end point is dropped.
fn finish_closed(mut points: Vec<ContourPoint>, start: Point) -> Contour {
    if points.len() > 1 {
        let last = &points[points.len() - 1];
        let returns_to_start = last.typ != PointType::OffCurve
            && (last.x - start.x).abs() < 1e-9
            && (last.y - start.y).abs() < 1e-9;
        if returns_to_start {
            let closing = last.typ.clone();
            points.pop();
            points[0].typ = closing;
        } else {
            points[0].typ = PointType::Line;
        }
    } else if let Some(first) = points.first_mut() {
        first.typ = PointType::Line;
    }
    Contour::new(points, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    fn pt(x: f64, y: f64, typ: PointType) -> ContourPoint {
        ContourPoint::new(x, y, typ, false, None, None)
    }

    #[test]
    fn open_contour_stays_open() {
        let contour = Contour::new(
            vec![pt(100.0, 0.0, PointType::Move), pt(100.0, 700.0, PointType::Line)],
            None,
        );
        let path = contour_to_bezpath(&contour);
        let elements = path.elements();
        assert_eq!(elements.len(), 2);
        assert!(!matches!(elements.last(), Some(PathEl::ClosePath)));
    }

    #[test]
    fn closed_contour_wraps_to_first_point() {
        let contour = Contour::new(
            vec![
                pt(0.0, 0.0, PointType::Line),
                pt(100.0, 0.0, PointType::Line),
                pt(100.0, 100.0, PointType::Line),
            ],
            None,
        );
        let path = contour_to_bezpath(&contour);
        // MoveTo, two LineTo, wrap-around LineTo, ClosePath
        assert_eq!(path.elements().len(), 5);
        assert!(matches!(path.elements().last(), Some(PathEl::ClosePath)));
    }

    #[test]
    fn cubic_curve_segment() {
        let contour = Contour::new(
            vec![
                pt(0.0, 0.0, PointType::Move),
                pt(0.0, 50.0, PointType::OffCurve),
                pt(50.0, 100.0, PointType::OffCurve),
                pt(100.0, 100.0, PointType::Curve),
            ],
            None,
        );
        let path = contour_to_bezpath(&contour);
        assert!(matches!(path.elements()[1], PathEl::CurveTo(..)));
    }

    #[test]
    fn closed_path_round_trips_through_contours() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((200.0, 0.0));
        path.curve_to((200.0, 100.0), (100.0, 200.0), (0.0, 200.0));
        path.line_to((0.0, 0.0));
        path.close_path();

        let contours = bezpath_to_contours(&path);
        assert_eq!(contours.len(), 1);
        let contour = &contours[0];
        // The closing line back to (0, 0) is folded into the first point
        assert_eq!(contour.points[0].typ, PointType::Line);
        assert_eq!(contour.points.len(), 5);

        let back = contour_to_bezpath(contour);
        let (a, b) = (path.bounding_box(), back.bounding_box());
        assert!((a.area() - b.area()).abs() < 1e-6);
    }

    #[test]
    fn multiple_subpaths_become_multiple_contours() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, 10.0));
        path.close_path();
        path.move_to((20.0, 0.0));
        path.line_to((30.0, 0.0));
        path.line_to((30.0, 10.0));
        path.close_path();

        assert_eq!(bezpath_to_contours(&path).len(), 2);
    }

    #[test]
    fn unclosed_outline_subpaths_are_written_closed() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.curve_to((10.0, 5.0), (5.0, 10.0), (0.0, 10.0));
        path.move_to((20.0, 0.0));
        path.line_to((30.0, 0.0));
        path.line_to((30.0, 10.0));
        path.line_to((20.0, 0.0));

        let open = bezpath_to_contours(&path);
        assert!(open.iter().all(|c| c.points[0].typ == PointType::Move));

        let contours = outline_to_contours(&path);
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| c.points[0].typ != PointType::Move));
        // The second subpath ends on its start point, which is folded away
        assert_eq!(contours[1].points.len(), 3);
        assert!(matches!(
            contour_to_bezpath(&contours[0]).elements().last(),
            Some(PathEl::ClosePath)
        ));
    }

    #[test]
    fn closed_outlines_are_not_closed_twice() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, 10.0));
        path.close_path();

        let closes = close_subpaths(&path)
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::ClosePath))
            .count();
        assert_eq!(closes, 1);
        assert_eq!(outline_to_contours(&path).len(), 1);
    }
}
