//! Planar and GPS geometry primitives used by the shadow scanner. Heavier operations (boolean
//! ops, convex hulls, containment) are delegated to the `geo` crate; the types here exist to keep
//! units and invariants explicit at the boundaries.

#[macro_use]
extern crate anyhow;

mod distance;
mod find_closest;
mod gps;
mod line;
mod pt;
mod ring;

pub use crate::distance::Distance;
pub use crate::find_closest::FindNearby;
pub use crate::gps::{GPSBounds, LonLat};
pub use crate::line::Line;
pub use crate::pt::{HashablePt2D, Pt2D};
pub use crate::ring::Ring;

/// Segments shorter than this are treated as having no length at all.
pub const EPSILON_DIST: Distance = Distance::const_meters(0.0001);
