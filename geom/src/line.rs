use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Distance, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Returns None if the line would be too short to have a direction.
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Option<Line> {
        if pt1.dist_to(pt2) <= EPSILON_DIST {
            return None;
        }
        Some(Line(pt1, pt2))
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.pt1().dist_to(self.pt2())
    }

    /// The unit vector perpendicular to this line, pointing to its left (counter-clockwise) side.
    pub fn unit_normal_left(&self) -> (f64, f64) {
        let len = self.length().inner_meters();
        let dx = (self.pt2().x() - self.pt1().x()) / len;
        let dy = (self.pt2().y() - self.pt1().y()) / len;
        (-dy, dx)
    }

    /// Shifts the whole line perpendicularly to the left by `width`.
    pub fn shift_left(&self, width: Distance) -> Line {
        let (nx, ny) = self.unit_normal_left();
        let w = width.inner_meters();
        Line(
            self.pt1().offset(nx * w, ny * w),
            self.pt2().offset(nx * w, ny * w),
        )
    }

    /// Shifts the whole line perpendicularly to the right by `width`.
    pub fn shift_right(&self, width: Distance) -> Line {
        let (nx, ny) = self.unit_normal_left();
        let w = width.inner_meters();
        Line(
            self.pt1().offset(-nx * w, -ny * w),
            self.pt2().offset(-nx * w, -ny * w),
        )
    }

    /// Projects `pt` perpendicularly onto the infinite line, then returns how far along this
    /// segment the projection lands, as a fraction clamped to [0, 1].
    pub fn percent_along_of_projection(&self, pt: Pt2D) -> f64 {
        let dx = self.pt2().x() - self.pt1().x();
        let dy = self.pt2().y() - self.pt1().y();
        let len_squared = dx * dx + dy * dy;
        let t = ((pt.x() - self.pt1().x()) * dx + (pt.y() - self.pt1().y()) * dy) / len_squared;
        t.max(0.0).min(1.0)
    }

    /// Like `percent_along_of_projection`, but as an absolute distance from `pt1`, clamped to
    /// [0, length].
    pub fn dist_along_of_projection(&self, pt: Pt2D) -> Distance {
        self.percent_along_of_projection(pt) * self.length()
    }

    /// Does this segment properly cross the other? Touching at endpoints doesn't count.
    pub fn crosses(&self, other: &Line) -> bool {
        // From http://bryceboe.com/2006/10/23/line-segment-intersection-algorithm/
        is_counter_clockwise(self.pt1(), other.pt1(), other.pt2())
            != is_counter_clockwise(self.pt2(), other.pt1(), other.pt2())
            && is_counter_clockwise(self.pt1(), self.pt2(), other.pt1())
                != is_counter_clockwise(self.pt1(), self.pt2(), other.pt2())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({}, {})", self.pt1(), self.pt2())
    }
}

fn is_counter_clockwise(pt1: Pt2D, pt2: Pt2D, pt3: Pt2D) -> bool {
    (pt3.y() - pt1.y()) * (pt2.x() - pt1.x()) > (pt2.y() - pt1.y()) * (pt3.x() - pt1.x())
}
