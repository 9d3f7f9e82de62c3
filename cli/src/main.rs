//! Computes how much of every walkable road segment in an OSM extract is shaded by buildings and
//! trees, writing one CSV row per directed segment.

#[macro_use]
extern crate log;

mod csv_sink;

use anyhow::{Context, Result};
use serde::Serialize;
use structopt::StructOpt;

use geom::{Distance, GPSBounds};
use osm_input::IngestStats;
use shadow_scan::{ScanConfig, ShadowScanner};
use shadow_util::Timer;

use crate::csv_sink::CsvEdgeSink;

#[derive(StructOpt)]
#[structopt(name = "shadowcli", about = "Measures shade along road segments")]
enum Command {
    /// Scans every road segment and writes the shadow on each side as CSV
    Scan {
        /// The path to an .osm XML file
        #[structopt(long)]
        input: String,
        /// The path to write the CSV results
        #[structopt(long)]
        output: String,
        /// A JSON file overriding some scan settings. Flags below take priority over it.
        #[structopt(long)]
        config: Option<String>,
        /// How far the corridor on each side of a segment extends, in meters
        #[structopt(long)]
        scan_radius: Option<f64>,
        /// Treat a corridor as empty if more indexed points than this are nearby
        #[structopt(long)]
        candidate_cap: Option<usize>,
        /// Drop segments longer than this, in meters
        #[structopt(long)]
        max_segment_length: Option<f64>,
        /// Trees are disks of this diameter, in meters
        #[structopt(long)]
        tree_diameter: Option<f64>,
    },
    /// Prints what would be scanned in an .osm file as JSON
    DumpScene {
        /// The path to an .osm XML file
        #[structopt(long)]
        input: String,
    },
}

fn main() -> Result<()> {
    shadow_util::logger::setup();

    match Command::from_args() {
        Command::Scan {
            input,
            output,
            config,
            scan_radius,
            candidate_cap,
            max_segment_length,
            tree_diameter,
        } => {
            let mut config = match config {
                Some(path) => ScanConfig::load(&path)?,
                None => ScanConfig::default(),
            };
            if let Some(x) = scan_radius {
                config.scan_radius = meters("scan-radius", x)?;
            }
            if let Some(x) = candidate_cap {
                config.candidate_cap = x;
            }
            if let Some(x) = max_segment_length {
                config.max_segment_length = meters("max-segment-length", x)?;
            }
            if let Some(x) = tree_diameter {
                config.tree_diameter = meters("tree-diameter", x)?;
            }
            scan(input, output, config)
        }
        Command::DumpScene { input } => dump_scene(input),
    }
}

fn meters(flag: &str, value: f64) -> Result<Distance> {
    Distance::checked_meters(value)
        .ok_or_else(|| anyhow::anyhow!("--{} {} isn't a number", flag, value))
}

fn scan(input: String, output: String, config: ScanConfig) -> Result<()> {
    config.validate()?;
    let mut timer = Timer::new(format!("scan {}", input));
    let osm = osm_input::read(&input, &mut timer)?;
    let scanner = ShadowScanner::new(&osm.scene, config, &mut timer)?;

    let file = fs_err::File::create(&output)?;
    let mut sink = CsvEdgeSink::new(file)
        .with_context(|| format!("writing header to {}", output))?;
    let summary = scanner.run(&mut sink, &mut timer)?;
    info!(
        "Wrote {} edges to {} ({} dropped)",
        summary.segments_emitted, output, summary.segments_dropped
    );
    Ok(())
}

#[derive(Serialize)]
struct SceneDump<'a> {
    gps_bounds: &'a GPSBounds,
    stats: &'a IngestStats,
}

fn dump_scene(input: String) -> Result<()> {
    let osm = osm_input::read(&input, &mut Timer::throwaway())?;
    let dump = SceneDump {
        gps_bounds: &osm.gps_bounds,
        stats: &osm.stats,
    };
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}
