use ordered_float::NotNan;

use geom::{Distance, Line, Pt2D};

use crate::ClippedShape;

/// A closed range of a segment, expressed as fractions of its length in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverageInterval {
    start: f64,
    end: f64,
}

impl CoverageInterval {
    /// None for empty, backwards, or non-finite ranges. Values are clamped to [0, 1].
    pub fn new(start: f64, end: f64) -> Option<CoverageInterval> {
        if !start.is_finite() || !end.is_finite() {
            return None;
        }
        let start = start.max(0.0).min(1.0);
        let end = end.max(0.0).min(1.0);
        if start >= end {
            return None;
        }
        Some(CoverageInterval { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// The part of the segment "behind" some clipped shape: the smallest range containing the
/// projections of all its vertices.
pub fn shape_interval(line: &Line, shape: &ClippedShape) -> Option<CoverageInterval> {
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for pt in shape.vertices() {
        let pct = line.percent_along_of_projection(*pt);
        min = min.min(pct);
        max = max.max(pct);
    }
    CoverageInterval::new(min, max)
}

/// Trees are disks, so they cover one diameter of the segment around their projection.
pub fn tree_interval(line: &Line, tree: Pt2D, diameter: Distance) -> Option<CoverageInterval> {
    let len = line.length();
    let dist = line.dist_along_of_projection(tree);
    let half = diameter / 2.0;
    let start = (dist - half).max(Distance::ZERO);
    let end = (dist + half).min(len);
    CoverageInterval::new(start / len, end / len)
}

/// The total length covered by at least one interval. Overlaps only count once, and the order of
/// the input doesn't matter.
pub fn union_length(intervals: &[CoverageInterval]) -> f64 {
    // (position, is_end). Starts sort before ends at the same position, so touching intervals
    // merge.
    let mut events: Vec<(NotNan<f64>, bool)> = Vec::with_capacity(2 * intervals.len());
    for i in intervals {
        // CoverageInterval guarantees finite values
        if let (Ok(start), Ok(end)) = (NotNan::new(i.start), NotNan::new(i.end)) {
            events.push((start, false));
            events.push((end, true));
        }
    }
    events.sort();

    let mut total = 0.0;
    let mut depth = 0;
    let mut opened_at = 0.0;
    for (pos, is_end) in events {
        if is_end {
            depth -= 1;
            if depth == 0 {
                total += pos.into_inner() - opened_at;
            }
        } else {
            if depth == 0 {
                opened_at = pos.into_inner();
            }
            depth += 1;
        }
    }
    total.max(0.0).min(1.0)
}

/// The fraction of the segment shaded by anything on one side.
pub fn side_coverage(
    line: &Line,
    shapes: &[ClippedShape],
    trees: &[Pt2D],
    tree_diameter: Distance,
) -> f64 {
    let mut intervals = Vec::new();
    for shape in shapes {
        intervals.extend(shape_interval(line, shape));
    }
    for tree in trees {
        intervals.extend(tree_interval(line, *tree, tree_diameter));
    }
    union_length(&intervals)
}
