use std::collections::HashSet;
use std::fmt;

use anyhow::Result;
use geo::{Area, Contains, ConvexHull};
use serde::{Deserialize, Serialize};

use crate::{Line, Pt2D};

/// Maybe a misnomer, but like a PolyLine, but closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    // first equals last
    pts: Vec<Pt2D>,
}

impl Ring {
    /// The points must be closed and have no adjacent duplicates. Non-adjacent repeats and
    /// crossings are allowed here; check `is_simple` for those.
    pub fn new(pts: Vec<Pt2D>) -> Result<Ring> {
        if pts.len() < 4 {
            bail!("Can't make a ring with only {} points", pts.len());
        }
        if pts[0] != *pts.last().unwrap() {
            bail!("Can't make a ring with mismatching first/last points");
        }
        if let Some(pair) = pts.windows(2).find(|pair| pair[0] == pair[1]) {
            bail!("Ring has duplicate adjacent points near {}", pair[0]);
        }
        Ok(Ring { pts })
    }

    /// Closes the points if needed and squishes adjacent duplicates before validating.
    pub fn cleaned(mut pts: Vec<Pt2D>) -> Result<Ring> {
        pts.dedup();
        if pts.len() > 1 && pts[0] == *pts.last().unwrap() {
            pts.pop();
        }
        if let Some(first) = pts.first().cloned() {
            pts.push(first);
        }
        Ring::new(pts)
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    /// True if no vertex repeats and no two non-adjacent edges cross. Quadratic in the number of
    /// points.
    pub fn is_simple(&self) -> bool {
        let mut seen = HashSet::new();
        for pt in self.pts.iter().skip(1) {
            if !seen.insert(pt.to_hashable()) {
                return false;
            }
        }

        let lines: Vec<Line> = self
            .pts
            .windows(2)
            .filter_map(|pair| Line::new(pair[0], pair[1]))
            .collect();
        let n = lines.len();
        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                if lines[i].crosses(&lines[j]) {
                    return false;
                }
            }
        }
        true
    }

    /// Unsigned, in m^2
    pub fn area(&self) -> f64 {
        self.to_geo().unsigned_area()
    }

    pub fn convex_hull(&self) -> Result<Ring> {
        let hull = self.to_geo().convex_hull();
        Ring::cleaned(
            hull.exterior()
                .0
                .iter()
                .map(|c| Pt2D::new(c.x, c.y))
                .collect(),
        )
    }

    /// The average of the distinct points.
    pub fn center(&self) -> Pt2D {
        Pt2D::center(&self.pts[1..])
    }

    /// Does this ring contain the point strictly in its interior?
    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        self.to_geo().contains(&geo::Point::from(pt))
    }

    pub fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            geo::LineString::from(
                self.pts
                    .iter()
                    .map(|pt| pt.to_geo_tuple())
                    .collect::<Vec<_>>(),
            ),
            Vec::new(),
        )
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}
