//! Measures how much of each road segment is shaded by nearby buildings and trees.
//!
//! A scan builds a spatial index over a [`Scene`] once, then for every directed segment of every
//! road, extrudes a corridor to each side, clips whatever lies inside to it, and projects the
//! pieces back onto the segment. The union of those projections is the fraction of the segment
//! in shade on that side.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod corridor;
pub mod coverage;
mod index;
mod resolve;
mod scan;
mod scene;

pub use crate::config::ScanConfig;
pub use crate::corridor::{Corridor, SegmentGeometry, Side};
pub use crate::coverage::CoverageInterval;
pub use crate::index::{Lookup, SpatialIndex};
pub use crate::resolve::{
    clip_to_corridor, flatten, repair, repair_isolated, CandidateKind, ClippedShape, Problems,
    Resolver, ScanProblem,
};
pub use crate::scan::{EdgeRecord, EdgeSink, ScanSummary, SegmentOutcome, ShadowScanner};
pub use crate::scene::{
    Building, BuildingID, GeoNode, NodeID, Road, RoadID, Scene, SegmentRequest, Shape, Tree,
    TreeID,
};
