use std::collections::HashSet;
use std::fmt;
use std::panic;

use anyhow::Result;
use geo::{BooleanOps, Intersects};
use serde::Serialize;

use geom::{Distance, Pt2D, Ring};

use crate::index::{Lookup, SpatialIndex};
use crate::{Building, BuildingID, Corridor, NodeID, ScanConfig, Scene, Shape, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CandidateKind {
    Buildings,
    Trees,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CandidateKind::Buildings => write!(f, "buildings"),
            CandidateKind::Trees => write!(f, "trees"),
        }
    }
}

/// Something that went wrong scanning one segment, without stopping the scan.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ScanProblem {
    /// The corridor was treated as empty for this kind of candidate.
    CandidateCapExceeded {
        side: Side,
        kind: CandidateKind,
        count: usize,
    },
    /// This building was skipped for one corridor.
    GeometryFault {
        side: Side,
        building: BuildingID,
        error: String,
    },
}

impl fmt::Display for ScanProblem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanProblem::CandidateCapExceeded { side, kind, count } => write!(
                f,
                "ignored {} on the {} side, because {} indexed points are nearby",
                kind, side, count
            ),
            ScanProblem::GeometryFault {
                side,
                building,
                error,
            } => write!(f, "skipped {} on the {} side: {}", building, side, error),
        }
    }
}

/// Collects the problems for one segment, logging each one as it happens.
pub struct Problems {
    from: NodeID,
    to: NodeID,
    list: Vec<ScanProblem>,
}

impl Problems {
    pub fn new(from: NodeID, to: NodeID) -> Problems {
        Problems {
            from,
            to,
            list: Vec::new(),
        }
    }

    pub fn report(&mut self, problem: ScanProblem) {
        warn!("Segment {} -> {}: {}", self.from, self.to, problem);
        self.list.push(problem);
    }

    pub fn into_list(self) -> Vec<ScanProblem> {
        self.list
    }
}

/// A piece of a building left over after clipping to a corridor. Only the vertices matter for
/// measuring coverage.
#[derive(Clone, Debug, PartialEq)]
pub enum ClippedShape {
    /// The exterior ring
    Polygon(Vec<Pt2D>),
    LineString(Vec<Pt2D>),
}

impl ClippedShape {
    pub fn vertices(&self) -> &Vec<Pt2D> {
        match self {
            ClippedShape::Polygon(pts) | ClippedShape::LineString(pts) => pts,
        }
    }
}

/// Finds what lies inside one corridor.
pub struct Resolver<'a> {
    scene: &'a Scene,
    index: &'a SpatialIndex,
    config: &'a ScanConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(
        scene: &'a Scene,
        index: &'a SpatialIndex,
        config: &'a ScanConfig,
    ) -> Resolver<'a> {
        Resolver {
            scene,
            index,
            config,
        }
    }

    /// Every building near the corridor, clipped to it and broken into simple pieces. Buildings
    /// that can't be clipped are reported and skipped.
    pub fn buildings(
        &self,
        corridor: &Corridor,
        search_radius: Distance,
        problems: &mut Problems,
    ) -> Vec<ClippedShape> {
        let candidates = match self.index.buildings_near(
            corridor.center(),
            search_radius,
            self.config.candidate_cap,
        ) {
            Lookup::Found(candidates) => candidates,
            Lookup::OverCap(count) => {
                problems.report(ScanProblem::CandidateCapExceeded {
                    side: corridor.side,
                    kind: CandidateKind::Buildings,
                    count,
                });
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        for idx in candidates {
            let building = &self.scene.buildings()[idx];
            results.extend(isolate_faults(building, corridor.side, problems, || {
                if !intersects(&building.shape, corridor) {
                    return Ok(Vec::new());
                }
                let repaired = self
                    .index
                    .repaired(idx)
                    .as_ref()
                    .map_err(|err| anyhow!("{}", err))?;
                clip_to_corridor(repaired, corridor, self.config.flatten_depth_limit)
            }));
        }
        results
    }

    /// The centers of trees strictly inside the corridor. Trees aren't clipped.
    pub fn trees(
        &self,
        corridor: &Corridor,
        search_radius: Distance,
        problems: &mut Problems,
    ) -> Vec<Pt2D> {
        let candidates = match self.index.trees_near(
            corridor.center(),
            search_radius,
            self.config.candidate_cap,
        ) {
            Lookup::Found(candidates) => candidates,
            Lookup::OverCap(count) => {
                problems.report(ScanProblem::CandidateCapExceeded {
                    side: corridor.side,
                    kind: CandidateKind::Trees,
                    count,
                });
                return Vec::new();
            }
        };

        candidates
            .into_iter()
            .map(|idx| self.scene.trees()[idx].pt)
            .filter(|pt| corridor.ring().contains_pt(*pt))
            .collect()
    }
}

/// Runs one building's geometry work. Errors and panics are reported against the building, and
/// the building contributes nothing.
fn isolate_faults<F: FnOnce() -> Result<Vec<ClippedShape>>>(
    building: &Building,
    side: Side,
    problems: &mut Problems,
    work: F,
) -> Vec<ClippedShape> {
    // geo's boolean ops can panic on pathological input. One bad building mustn't take down the
    // whole scan.
    let error = match panic::catch_unwind(panic::AssertUnwindSafe(work)) {
        Ok(Ok(pieces)) => {
            return pieces;
        }
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("geometry operation panicked: {}", panic_message(&*payload)),
    };
    problems.report(ScanProblem::GeometryFault {
        side,
        building: building.id,
        error,
    });
    Vec::new()
}

/// Clips an already repaired shape to the corridor. Returns nothing if they don't overlap.
pub fn clip_to_corridor(
    repaired: &geo::Geometry<f64>,
    corridor: &Corridor,
    depth_limit: usize,
) -> Result<Vec<ClippedShape>> {
    let clipped = match repaired {
        geo::Geometry::Polygon(p) => {
            geo::Geometry::MultiPolygon(p.intersection(corridor.polygon()))
        }
        geo::Geometry::LineString(ls) => geo::Geometry::MultiLineString(
            corridor
                .polygon()
                .clip(&geo::MultiLineString(vec![ls.clone()]), false),
        ),
        // A point has no extent, so it can't shade anything
        geo::Geometry::Point(_) => return Ok(Vec::new()),
        other => bail!("repair produced unexpected geometry {:?}", other),
    };

    let mut pieces = Vec::new();
    flatten(clipped, depth_limit, &mut pieces);
    Ok(pieces)
}

fn intersects(shape: &Shape, corridor: &Corridor) -> bool {
    let poly = corridor.polygon();
    match shape {
        Shape::Polygon(pts) => {
            poly.intersects(&geo::Polygon::new(to_line_string(pts), Vec::new()))
        }
        Shape::LineString(pts) => poly.intersects(&to_line_string(pts)),
        Shape::SinglePoint(pt) => poly.intersects(&geo::Point::from(*pt)),
    }
}

/// Turns possibly invalid input into something the boolean ops can handle. Polygons collapse to
/// lines or points when they have too few distinct points or no area, and self-intersecting
/// polygons are replaced by their convex hull.
pub fn repair(shape: &Shape) -> Result<geo::Geometry<f64>> {
    let mut pts = shape.points().to_vec();
    pts.dedup();
    let is_polygon = matches!(shape, Shape::Polygon(_));
    if is_polygon && pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    let distinct = pts
        .iter()
        .map(|pt| pt.to_hashable())
        .collect::<HashSet<_>>()
        .len();

    if distinct == 0 {
        bail!("shape has no points");
    }
    if distinct == 1 {
        return Ok(geo::Geometry::Point(geo::Point::from(pts[0])));
    }
    if !is_polygon || distinct == 2 {
        return Ok(geo::Geometry::LineString(to_line_string(&pts)));
    }

    let ring = match Ring::cleaned(pts.clone()) {
        // Something like A, B, A, B with no area
        Ok(ring) => ring,
        Err(_) => return Ok(geo::Geometry::LineString(to_line_string(&pts))),
    };
    if ring.area() == 0.0 {
        return Ok(geo::Geometry::LineString(to_line_string(&pts)));
    }
    if ring.is_simple() {
        return Ok(geo::Geometry::Polygon(ring.to_geo()));
    }
    // The hull covers at least as much as the real outline, so concave or self-crossing
    // footprints overestimate shade here.
    debug!("Replacing a self-intersecting ring with its convex hull");
    Ok(geo::Geometry::Polygon(ring.convex_hull()?.to_geo()))
}

/// Runs `repair`, turning a panic inside geo into an error. The spatial index calls this once per
/// building.
pub fn repair_isolated(shape: &Shape) -> std::result::Result<geo::Geometry<f64>, String> {
    match panic::catch_unwind(panic::AssertUnwindSafe(|| repair(shape))) {
        Ok(Ok(geom)) => Ok(geom),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(format!(
            "geometry operation panicked: {}",
            panic_message(&*payload)
        )),
    }
}

/// Unpacks multi-part results into simple pieces, recursing at most `depth` levels. Points carry
/// no extent and are dropped.
pub fn flatten(geom: geo::Geometry<f64>, depth: usize, out: &mut Vec<ClippedShape>) {
    if depth == 0 {
        return;
    }
    match geom {
        geo::Geometry::Point(_) | geo::Geometry::MultiPoint(_) => {}
        geo::Geometry::Line(line) => {
            out.push(ClippedShape::LineString(vec![
                Pt2D::new(line.start.x, line.start.y),
                Pt2D::new(line.end.x, line.end.y),
            ]));
        }
        geo::Geometry::LineString(ls) => {
            if ls.0.len() >= 2 {
                out.push(ClippedShape::LineString(from_line_string(&ls)));
            }
        }
        geo::Geometry::Polygon(p) => {
            if !p.exterior().0.is_empty() {
                out.push(ClippedShape::Polygon(from_line_string(p.exterior())));
            }
        }
        geo::Geometry::Rect(r) => flatten(geo::Geometry::Polygon(r.to_polygon()), depth, out),
        geo::Geometry::Triangle(t) => flatten(geo::Geometry::Polygon(t.to_polygon()), depth, out),
        geo::Geometry::MultiLineString(multi) => {
            for ls in multi.0 {
                flatten(geo::Geometry::LineString(ls), depth - 1, out);
            }
        }
        geo::Geometry::MultiPolygon(multi) => {
            for p in multi.0 {
                flatten(geo::Geometry::Polygon(p), depth - 1, out);
            }
        }
        geo::Geometry::GeometryCollection(collection) => {
            for g in collection.0 {
                flatten(g, depth - 1, out);
            }
        }
    }
}

fn to_line_string(pts: &[Pt2D]) -> geo::LineString<f64> {
    geo::LineString::from(pts.iter().map(|pt| (pt.x(), pt.y())).collect::<Vec<_>>())
}

fn from_line_string(ls: &geo::LineString<f64>) -> Vec<Pt2D> {
    ls.0.iter().map(|c| Pt2D::new(c.x, c.y)).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown cause".to_string()
    }
}
