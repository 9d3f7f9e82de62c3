use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::Distance;

/// Tunes a shadow scan. Every field has a default, so a config file only needs to mention what it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How far the corridor on each side of a segment extends from the segment.
    pub scan_radius: Distance,
    /// If a spatial query around one corridor matches more indexed points than this, the
    /// corridor is treated as empty for that kind of shape. Some single shapes have tens of
    /// thousands of points, and clipping them for every nearby segment would never finish.
    pub candidate_cap: usize,
    /// Segments longer than this (geodesic length) are dropped from the output.
    pub max_segment_length: Distance,
    /// Trees are disks of this diameter.
    pub tree_diameter: Distance,
    /// How deeply nested collections resulting from one clip may be unpacked.
    pub flatten_depth_limit: usize,
    /// How many segments are scanned in parallel before results are written out.
    pub batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> ScanConfig {
        ScanConfig {
            scan_radius: Distance::const_meters(25.0),
            candidate_cap: 50_000,
            max_segment_length: Distance::const_meters(10_000.0),
            tree_diameter: Distance::const_meters(0.5),
            flatten_depth_limit: 10,
            batch_size: 10_000,
        }
    }
}

impl ScanConfig {
    /// Reads overrides from a JSON file.
    pub fn load(path: &str) -> Result<ScanConfig> {
        let config: ScanConfig = shadow_util::read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_radius <= Distance::ZERO {
            bail!("scan_radius must be positive, not {}", self.scan_radius);
        }
        if self.max_segment_length <= Distance::ZERO {
            bail!(
                "max_segment_length must be positive, not {}",
                self.max_segment_length
            );
        }
        if self.tree_diameter <= Distance::ZERO {
            bail!("tree_diameter must be positive, not {}", self.tree_diameter);
        }
        if self.candidate_cap == 0 {
            bail!("candidate_cap of 0 would skip every corridor");
        }
        if self.flatten_depth_limit == 0 {
            bail!("flatten_depth_limit of 0 would drop every clipped shape");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        Ok(())
    }
}
