use std::fmt;

use serde::{Deserialize, Serialize};

use geom::{Distance, Line, Pt2D, Ring};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// The rectangle extruded from a segment to one side, where shade-casting things are looked for.
pub struct Corridor {
    pub side: Side,
    ring: Ring,
    polygon: geo::Polygon<f64>,
    center: Pt2D,
}

impl Corridor {
    fn new(side: Side, line: &Line, shifted: Line) -> Option<Corridor> {
        let ring = Ring::new(vec![
            line.pt1(),
            shifted.pt1(),
            shifted.pt2(),
            line.pt2(),
            line.pt1(),
        ])
        .ok()?;
        let polygon = ring.to_geo();
        let center = ring.center();
        Some(Corridor {
            side,
            ring,
            polygon,
            center,
        })
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub fn polygon(&self) -> &geo::Polygon<f64> {
        &self.polygon
    }

    pub fn center(&self) -> Pt2D {
        self.center
    }
}

/// A segment and the two corridors scanned alongside it.
pub struct SegmentGeometry {
    pub line: Line,
    pub left: Corridor,
    pub right: Corridor,
    /// Radius for spatial queries around either corridor's center. Covers the whole rectangle,
    /// with plenty of margin.
    pub search_radius: Distance,
}

impl SegmentGeometry {
    /// Returns None if the two points coincide, since there's no direction to extrude corridors
    /// along. Also None for a zero radius.
    pub fn new(pt1: Pt2D, pt2: Pt2D, scan_radius: Distance) -> Option<SegmentGeometry> {
        let line = Line::new(pt1, pt2)?;
        let left = Corridor::new(Side::Left, &line, line.shift_left(scan_radius))?;
        let right = Corridor::new(Side::Right, &line, line.shift_right(scan_radius))?;
        let len = line.length().inner_meters();
        let r = scan_radius.inner_meters();
        let search_radius = Distance::meters(2.0 * (len * len + r * r).sqrt());
        Some(SegmentGeometry {
            line,
            left,
            right,
            search_radius,
        })
    }

    pub fn corridor(&self, side: Side) -> &Corridor {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangles_on_each_side() {
        let geom = SegmentGeometry::new(
            Pt2D::new(0.0, 0.0),
            Pt2D::new(100.0, 0.0),
            Distance::meters(25.0),
        )
        .unwrap();

        assert_eq!(geom.left.side, Side::Left);
        assert_eq!(
            geom.left.ring().points(),
            &vec![
                Pt2D::new(0.0, 0.0),
                Pt2D::new(0.0, 25.0),
                Pt2D::new(100.0, 25.0),
                Pt2D::new(100.0, 0.0),
                Pt2D::new(0.0, 0.0),
            ]
        );
        assert_eq!(geom.left.center(), Pt2D::new(50.0, 12.5));
        assert_eq!(geom.right.center(), Pt2D::new(50.0, -12.5));
        assert_eq!(geom.left.ring().area(), 2500.0);
        assert_eq!(geom.right.ring().area(), 2500.0);

        assert!(geom.corridor(Side::Left).ring().contains_pt(Pt2D::new(50.0, 10.0)));
        assert!(!geom.corridor(Side::Left).ring().contains_pt(Pt2D::new(50.0, -10.0)));
        assert!(geom.corridor(Side::Right).ring().contains_pt(Pt2D::new(50.0, -10.0)));

        let expected = 2.0 * (100.0f64 * 100.0 + 25.0 * 25.0).sqrt();
        assert_eq!(geom.search_radius, Distance::meters(expected));
    }

    #[test]
    fn sides_follow_direction() {
        // Heading south, the left side is east
        let geom = SegmentGeometry::new(
            Pt2D::new(0.0, 100.0),
            Pt2D::new(0.0, 0.0),
            Distance::meters(10.0),
        )
        .unwrap();
        assert!(geom.left.ring().contains_pt(Pt2D::new(5.0, 50.0)));
        assert!(geom.right.ring().contains_pt(Pt2D::new(-5.0, 50.0)));
    }

    #[test]
    fn zero_length() {
        assert!(SegmentGeometry::new(
            Pt2D::new(3.0, 3.0),
            Pt2D::new(3.0, 3.0),
            Distance::meters(25.0)
        )
        .is_none());
    }
}
