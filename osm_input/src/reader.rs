use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{Context, Result};

use geom::{GPSBounds, LonLat};
use shadow_util::{prettyprint_usize, Timer};

use crate::Tags;

// Elements are assumed to come in the usual order: nodes, then ways. Relations aren't used.
pub struct Document {
    pub gps_bounds: GPSBounds,
    pub nodes: BTreeMap<i64, Node>,
    pub ways: BTreeMap<i64, Way>,
}

pub struct Node {
    pub gps: LonLat,
    pub tags: Tags,
}

pub struct Way {
    /// Every referenced node, even ones missing from the document
    pub nodes: Vec<i64>,
    pub tags: Tags,
}

pub fn read_document(raw: &str, timer: &mut Timer) -> Result<Document> {
    timer.start("parse XML");
    let tree = roxmltree::Document::parse(raw)?;
    timer.stop("parse XML");

    let mut doc = Document {
        gps_bounds: GPSBounds::new(),
        nodes: BTreeMap::new(),
        ways: BTreeMap::new(),
    };

    timer.start("scrape objects");
    let mut scraped_bounds = false;
    for obj in tree.descendants() {
        if !obj.is_element() {
            continue;
        }
        match obj.tag_name().name() {
            "bounds" => {
                doc.gps_bounds.update(LonLat::new(
                    attribute(obj, "minlon")?,
                    attribute(obj, "minlat")?,
                ));
                doc.gps_bounds.update(LonLat::new(
                    attribute(obj, "maxlon")?,
                    attribute(obj, "maxlat")?,
                ));
            }
            "node" => {
                if doc.gps_bounds.is_empty() && !scraped_bounds {
                    scraped_bounds = true;
                    timer.warn(
                        "The .osm is missing a <bounds> element, so figuring out the bounds \
                         manually."
                            .to_string(),
                    );
                    doc.gps_bounds = scrape_bounds(&tree)?;
                }

                let id = attribute::<i64>(obj, "id")?;
                if doc.nodes.contains_key(&id) {
                    bail!("Duplicate node #{}, your .osm is corrupt", id);
                }
                let lon = attribute::<f64>(obj, "lon")?;
                let lat = attribute::<f64>(obj, "lat")?;
                if !lon.is_finite() || !lat.is_finite() {
                    timer.warn(format!("Skipping node #{} at ({}, {})", id, lon, lat));
                    continue;
                }
                let tags = read_tags(obj)?;
                doc.nodes.insert(
                    id,
                    Node {
                        gps: LonLat::new(lon, lat),
                        tags,
                    },
                );
            }
            "way" => {
                let id = attribute::<i64>(obj, "id")?;
                if doc.ways.contains_key(&id) {
                    bail!("Duplicate way #{}, your .osm is corrupt", id);
                }
                let tags = read_tags(obj)?;
                let mut nodes = Vec::new();
                for child in obj.children() {
                    if child.tag_name().name() == "nd" {
                        nodes.push(attribute::<i64>(child, "ref")?);
                    }
                }
                doc.ways.insert(id, Way { nodes, tags });
            }
            _ => {}
        }
    }
    timer.stop("scrape objects");
    timer.note(format!(
        "Found {} nodes, {} ways",
        prettyprint_usize(doc.nodes.len()),
        prettyprint_usize(doc.ways.len()),
    ));

    Ok(doc)
}

fn attribute<T>(obj: roxmltree::Node, key: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = obj
        .attribute(key)
        .ok_or_else(|| anyhow!("<{}> is missing {}", obj.tag_name().name(), key))?;
    raw.parse::<T>()
        .with_context(|| format!("<{}> has a bad {}: {}", obj.tag_name().name(), key, raw))
}

fn read_tags(obj: roxmltree::Node) -> Result<Tags> {
    let mut tags = Tags::default();
    for child in obj.children() {
        if child.tag_name().name() == "tag" {
            let key = attribute::<String>(child, "k")?;
            // Filter out really useless data
            if key.starts_with("tiger:") || key.starts_with("old_name:") {
                continue;
            }
            tags.insert(key, attribute::<String>(child, "v")?);
        }
    }
    Ok(tags)
}

fn scrape_bounds(doc: &roxmltree::Document) -> Result<GPSBounds> {
    let mut b = GPSBounds::new();
    for obj in doc.descendants() {
        if obj.is_element() && obj.tag_name().name() == "node" {
            let lon = attribute::<f64>(obj, "lon")?;
            let lat = attribute::<f64>(obj, "lat")?;
            if lon.is_finite() && lat.is_finite() {
                b.update(LonLat::new(lon, lat));
            }
        }
    }
    Ok(b)
}
