use geom::{Distance, FindNearby, Pt2D};
use shadow_util::{prettyprint_usize, Timer};

use crate::resolve::repair_isolated;
use crate::Scene;

/// What a capped radius query found.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    /// Distinct indices into the scene's buildings or trees, ascending
    Found(Vec<usize>),
    /// The query matched this many indexed points, more than the cap allows. Nothing was resolved.
    OverCap(usize),
}

/// Radius queries over the points of everything that casts shade. Built once per scene, then
/// only read.
pub struct SpatialIndex {
    /// Every vertex of every building shape, pointing back to its building
    building_pts: FindNearby<usize>,
    trees: FindNearby<usize>,
    /// Each building's shape after repair, in scene order. Repair can be quadratic in the number
    /// of vertices, so it happens here once instead of per corridor.
    repaired: Vec<Result<geo::Geometry<f64>, String>>,
}

impl SpatialIndex {
    pub fn new(scene: &Scene, timer: &mut Timer) -> SpatialIndex {
        timer.start("build spatial index");
        let mut pts = Vec::new();
        for (idx, b) in scene.buildings().iter().enumerate() {
            for pt in b.shape.points() {
                pts.push((*pt, idx));
            }
        }
        let building_pts = FindNearby::new(pts);
        let trees = FindNearby::new(
            scene
                .trees()
                .iter()
                .enumerate()
                .map(|(idx, t)| (t.pt, idx))
                .collect(),
        );
        let repaired = timer.parallelize(
            "repair building shapes",
            scene.buildings().iter().collect(),
            |b| repair_isolated(&b.shape),
        );
        timer.note(format!(
            "Indexed {} building points and {} trees",
            prettyprint_usize(building_pts.len()),
            prettyprint_usize(trees.len())
        ));
        let broken = repaired.iter().filter(|r| r.is_err()).count();
        if broken > 0 {
            timer.warn(format!(
                "{} buildings couldn't be repaired and won't cast shade",
                prettyprint_usize(broken)
            ));
        }
        timer.stop("build spatial index");

        SpatialIndex {
            building_pts,
            trees,
            repaired,
        }
    }

    /// The repaired geometry of the building at this index into the scene, or why there is none.
    pub fn repaired(&self, idx: usize) -> &Result<geo::Geometry<f64>, String> {
        &self.repaired[idx]
    }

    #[cfg(test)]
    pub(crate) fn replace_repaired(
        &mut self,
        idx: usize,
        repaired: Result<geo::Geometry<f64>, String>,
    ) {
        self.repaired[idx] = repaired;
    }

    pub fn buildings_near(&self, center: Pt2D, radius: Distance, cap: usize) -> Lookup {
        capped(&self.building_pts, center, radius, cap)
    }

    pub fn trees_near(&self, center: Pt2D, radius: Distance, cap: usize) -> Lookup {
        capped(&self.trees, center, radius, cap)
    }
}

// The cap applies to the raw number of matching points, before collapsing them to distinct
// shapes, so one enormous building can trip it.
fn capped(index: &FindNearby<usize>, center: Pt2D, radius: Distance, cap: usize) -> Lookup {
    let mut hits = index.query(center, radius);
    if hits.len() > cap {
        return Lookup::OverCap(hits.len());
    }
    hits.sort_unstable();
    hits.dedup();
    Lookup::Found(hits)
}
