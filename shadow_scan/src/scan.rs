use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Distance, Pt2D};
use shadow_util::{prettyprint_usize, Timer};

use crate::coverage::side_coverage;
use crate::{
    Problems, Resolver, ScanConfig, ScanProblem, Scene, SegmentGeometry, SegmentRequest, Side,
    SpatialIndex,
};

/// The result of scanning one directed segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    /// Fraction of the segment's length shaded on the left, in [0, 1]
    pub left_shadow: f64,
    /// Fraction of the segment's length shaded on the right, in [0, 1]
    pub right_shadow: f64,
    /// Geodesic length in meters
    pub distance: f64,
    /// Initial bearing in degrees, clockwise from north
    pub direction: f64,
    pub avoid: bool,
}

/// Where finished records go. Records arrive in road order, then in order along each road.
pub trait EdgeSink {
    /// Once this returns, the record must be whole in the sink. A scan interrupted between two
    /// calls can leave fewer records, but never a partial one.
    fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()>;

    /// Called after every batch.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl EdgeSink for Vec<EdgeRecord> {
    fn write_edge(&mut self, edge: &EdgeRecord) -> Result<()> {
        self.push(edge.clone());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SegmentOutcome {
    Emitted {
        edge: EdgeRecord,
        problems: Vec<ScanProblem>,
        /// Both endpoints are at the same place, so nothing was scanned
        zero_length: bool,
    },
    /// Longer than the configured maximum
    Dropped { length: Distance },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScanSummary {
    pub roads: usize,
    pub buildings: usize,
    pub trees: usize,
    pub segments_emitted: usize,
    pub segments_dropped: usize,
    pub zero_length_segments: usize,
    pub cap_skips: usize,
    pub geometry_faults: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: &SegmentOutcome) {
        match outcome {
            SegmentOutcome::Emitted {
                problems,
                zero_length,
                ..
            } => {
                self.segments_emitted += 1;
                if *zero_length {
                    self.zero_length_segments += 1;
                }
                for problem in problems {
                    match problem {
                        ScanProblem::CandidateCapExceeded { .. } => {
                            self.cap_skips += 1;
                        }
                        ScanProblem::GeometryFault { .. } => {
                            self.geometry_faults += 1;
                        }
                    }
                }
            }
            SegmentOutcome::Dropped { .. } => {
                self.segments_dropped += 1;
            }
        }
    }
}

/// Scans every segment of a scene. The spatial index is built up front and only read afterwards,
/// so segments can be scanned in any order or in parallel.
pub struct ShadowScanner<'a> {
    scene: &'a Scene,
    index: SpatialIndex,
    config: ScanConfig,
}

impl<'a> ShadowScanner<'a> {
    pub fn new(
        scene: &'a Scene,
        config: ScanConfig,
        timer: &mut Timer,
    ) -> Result<ShadowScanner<'a>> {
        config.validate()?;
        let index = SpatialIndex::new(scene, timer);
        Ok(ShadowScanner {
            scene,
            index,
            config,
        })
    }

    pub fn scan_segment(&self, req: &SegmentRequest) -> SegmentOutcome {
        let from = self.scene.node(req.from);
        let to = self.scene.node(req.to);

        let length = from.gps.gps_dist(to.gps);
        if length > self.config.max_segment_length {
            warn!(
                "Dropping segment {} -> {} of {}, because it's {} long",
                req.from, req.to, req.road, length
            );
            return SegmentOutcome::Dropped { length };
        }

        let mut problems = Problems::new(req.from, req.to);
        let (left_shadow, right_shadow, zero_length) =
            match SegmentGeometry::new(from.pt, to.pt, self.config.scan_radius) {
                Some(geom) => (
                    self.side_shadow(&geom, Side::Left, &mut problems),
                    self.side_shadow(&geom, Side::Right, &mut problems),
                    false,
                ),
                None => (0.0, 0.0, true),
            };

        SegmentOutcome::Emitted {
            edge: EdgeRecord {
                start_lat: from.gps.y(),
                start_lon: from.gps.x(),
                end_lat: to.gps.y(),
                end_lon: to.gps.x(),
                left_shadow,
                right_shadow,
                distance: length.inner_meters(),
                direction: from.gps.bearing_to(to.gps),
                avoid: req.avoid,
            },
            problems: problems.into_list(),
            zero_length,
        }
    }

    fn side_shadow(&self, geom: &SegmentGeometry, side: Side, problems: &mut Problems) -> f64 {
        let resolver = Resolver::new(self.scene, &self.index, &self.config);
        let corridor = geom.corridor(side);
        let shapes = resolver.buildings(corridor, geom.search_radius, problems);
        let trees: Vec<Pt2D> = resolver.trees(corridor, geom.search_radius, problems);
        side_coverage(&geom.line, &shapes, &trees, self.config.tree_diameter)
    }

    /// Scans everything, writing records to the sink in road order. Segments are scanned in
    /// parallel one batch at a time, and the sink is flushed after every batch.
    pub fn run(&self, sink: &mut dyn EdgeSink, timer: &mut Timer) -> Result<ScanSummary> {
        let mut summary = ScanSummary {
            roads: self.scene.roads().len(),
            buildings: self.scene.buildings().len(),
            trees: self.scene.trees().len(),
            ..Default::default()
        };

        let segments = self.scene.segments();
        let total = segments.len();
        timer.start("scan segments");
        let mut done = 0;
        for batch in segments.chunks(self.config.batch_size) {
            done += batch.len();
            let outcomes = timer.parallelize(
                &format!(
                    "scan segments {}/{}",
                    prettyprint_usize(done),
                    prettyprint_usize(total)
                ),
                batch.iter().collect::<Vec<_>>(),
                |req| self.scan_segment(req),
            );
            for outcome in outcomes {
                summary.record(&outcome);
                if let SegmentOutcome::Emitted { edge, .. } = outcome {
                    sink.write_edge(&edge)?;
                }
            }
            sink.flush()?;
        }
        timer.stop("scan segments");

        timer.note(format!(
            "Scanned {} roads, {} buildings, {} trees",
            prettyprint_usize(summary.roads),
            prettyprint_usize(summary.buildings),
            prettyprint_usize(summary.trees)
        ));
        timer.note(format!(
            "{} segments emitted ({} with zero length), {} dropped for being too long",
            prettyprint_usize(summary.segments_emitted),
            prettyprint_usize(summary.zero_length_segments),
            prettyprint_usize(summary.segments_dropped)
        ));
        if summary.cap_skips > 0 || summary.geometry_faults > 0 {
            timer.warn(format!(
                "{} corridor queries skipped for exceeding the candidate cap, {} buildings skipped \
                 for geometry faults",
                prettyprint_usize(summary.cap_skips),
                prettyprint_usize(summary.geometry_faults)
            ));
        }

        Ok(summary)
    }
}
