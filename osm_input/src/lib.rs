//! Turns an OpenStreetMap XML extract into a `Scene` for shadow scanning.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde::Serialize;

use geom::GPSBounds;
use shadow_scan::{
    Building, BuildingID, GeoNode, NodeID, Road, RoadID, Scene, Shape, Tree, TreeID,
};
use shadow_util::{prettyprint_usize, Timer};

pub use self::classify::{classify_way, is_tree, WayKind};
pub use self::tags::Tags;

mod classify;
mod reader;
mod tags;

/// A scene along with what ingestion saw along the way.
pub struct OsmScene {
    pub scene: Scene,
    pub gps_bounds: GPSBounds,
    pub stats: IngestStats,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IngestStats {
    pub nodes: usize,
    pub roads: usize,
    pub buildings: usize,
    pub trees: usize,
    pub ignored_ways: usize,
    /// Highway types that weren't treated as roads
    pub unknown_highways: BTreeSet<String>,
}

pub fn read(path: &str, timer: &mut Timer) -> Result<OsmScene> {
    timer.start(format!("read {}", path));
    let raw = fs_err::read_to_string(path)?;
    timer.stop(format!("read {}", path));
    parse(&raw, timer)
}

/// Fails on corrupt input: malformed XML or attributes, duplicate IDs, or roads referring to
/// nodes that don't exist.
pub fn parse(raw: &str, timer: &mut Timer) -> Result<OsmScene> {
    let doc = reader::read_document(raw, timer)?;

    timer.start("classify ways");
    let mut stats = IngestStats::default();
    let mut owners: BTreeMap<i64, BuildingID> = BTreeMap::new();
    let mut buildings = Vec::new();
    let mut trees = Vec::new();
    // A node can be tagged as a tree and also sit in one or more tree rows. It's still one tree.
    let mut tree_nodes: BTreeSet<i64> = BTreeSet::new();
    let mut roads = Vec::new();

    for (id, way) in &doc.ways {
        match classify_way(&way.tags) {
            WayKind::Road { avoid } => {
                if way.nodes.is_empty() {
                    stats.ignored_ways += 1;
                    continue;
                }
                for n in &way.nodes {
                    if !doc.nodes.contains_key(n) {
                        bail!("way #{} references missing node #{}", id, n);
                    }
                }
                roads.push(Road {
                    id: RoadID(*id),
                    nodes: way.nodes.iter().cloned().map(NodeID).collect(),
                    avoid,
                });
            }
            WayKind::Building => {
                let present: Vec<i64> = way
                    .nodes
                    .iter()
                    .filter(|n| doc.nodes.contains_key(n))
                    .cloned()
                    .collect();
                if present.len() != way.nodes.len() {
                    timer.warn(format!(
                        "Building way #{} is missing {} of its nodes",
                        id,
                        way.nodes.len() - present.len()
                    ));
                }
                let pts = present
                    .iter()
                    .map(|n| doc.gps_bounds.convert(doc.nodes[n].gps))
                    .collect();
                let shape = match Shape::from_points(pts) {
                    Some(shape) => shape,
                    None => {
                        stats.ignored_ways += 1;
                        continue;
                    }
                };
                let building = BuildingID(*id);
                for n in present {
                    owners.entry(n).or_insert(building);
                }
                buildings.push(Building {
                    id: building,
                    shape,
                });
            }
            WayKind::TreeRow => {
                for n in &way.nodes {
                    let node = match doc.nodes.get(n) {
                        Some(node) => node,
                        None => continue,
                    };
                    if tree_nodes.insert(*n) {
                        trees.push(Tree {
                            id: TreeID(*n),
                            pt: doc.gps_bounds.convert(node.gps),
                        });
                    }
                }
            }
            WayKind::UnknownHighway(highway) => {
                if !stats.unknown_highways.contains(&highway) {
                    debug!("New highway type: {}", highway);
                    stats.unknown_highways.insert(highway);
                }
                stats.ignored_ways += 1;
            }
            WayKind::Ignored => {
                stats.ignored_ways += 1;
            }
        }
    }

    let mut nodes = Vec::new();
    for (id, node) in &doc.nodes {
        let pt = doc.gps_bounds.convert(node.gps);
        if is_tree(&node.tags) && tree_nodes.insert(*id) {
            trees.push(Tree {
                id: TreeID(*id),
                pt,
            });
        }
        nodes.push(GeoNode {
            id: NodeID(*id),
            gps: node.gps,
            pt,
            owner: owners.get(id).cloned(),
        });
    }
    timer.stop("classify ways");

    stats.nodes = nodes.len();
    stats.roads = roads.len();
    stats.buildings = buildings.len();
    stats.trees = trees.len();
    timer.note(format!(
        "Loaded {} nodes, {} roads, {} buildings, {} trees. Ignored {} ways.",
        prettyprint_usize(stats.nodes),
        prettyprint_usize(stats.roads),
        prettyprint_usize(stats.buildings),
        prettyprint_usize(stats.trees),
        prettyprint_usize(stats.ignored_ways)
    ));
    if !stats.unknown_highways.is_empty() {
        timer.note(format!(
            "Highway types not treated as roads: {}",
            stats
                .unknown_highways
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let scene = Scene::new(nodes, buildings, trees, roads)?;
    Ok(OsmScene {
        scene,
        gps_bounds: doc.gps_bounds,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <bounds minlat="55.750" minlon="37.600" maxlat="55.760" maxlon="37.610"/>
  <node id="1" lat="55.751" lon="37.601"/>
  <node id="2" lat="55.751" lon="37.602"/>
  <node id="3" lat="55.752" lon="37.602"/>
  <node id="10" lat="55.7512" lon="37.6012"/>
  <node id="11" lat="55.7512" lon="37.6015"/>
  <node id="12" lat="55.7515" lon="37.6015"/>
  <node id="13" lat="55.7515" lon="37.6012"/>
  <node id="20" lat="55.7530" lon="37.6030">
    <tag k="natural" v="tree"/>
  </node>
  <node id="21" lat="55.7531" lon="37.6031"/>
  <node id="22" lat="55.7532" lon="37.6032"/>
  <way id="100">
    <nd ref="1"/>
    <nd ref="2"/>
    <nd ref="3"/>
    <tag k="highway" v="footway"/>
  </way>
  <way id="101">
    <nd ref="3"/>
    <nd ref="1"/>
    <tag k="highway" v="residential"/>
    <tag k="tiger:county" v="nowhere"/>
  </way>
  <way id="102">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="motorway"/>
  </way>
  <way id="200">
    <nd ref="10"/>
    <nd ref="11"/>
    <nd ref="12"/>
    <nd ref="13"/>
    <nd ref="10"/>
    <tag k="building" v="yes"/>
  </way>
  <way id="201">
    <nd ref="12"/>
    <nd ref="13"/>
    <nd ref="999"/>
    <tag k="barrier" v="fence"/>
  </way>
  <way id="202">
    <nd ref="11"/>
    <nd ref="12"/>
    <nd ref="13"/>
    <tag k="building" v="yes"/>
    <tag k="layer" v="-3"/>
  </way>
  <way id="300">
    <nd ref="21"/>
    <nd ref="22"/>
    <tag k="natural" v="tree_row"/>
  </way>
</osm>"#;

    #[test]
    fn ingest() {
        let mut timer = Timer::throwaway();
        let osm = parse(MAP, &mut timer).unwrap();
        let scene = &osm.scene;

        assert_eq!(
            osm.stats,
            IngestStats {
                nodes: 10,
                roads: 2,
                buildings: 2,
                trees: 3,
                ignored_ways: 2,
                unknown_highways: vec!["motorway".to_string()].into_iter().collect(),
            }
        );

        assert_eq!(scene.roads()[0].id, RoadID(100));
        assert!(!scene.roads()[0].avoid);
        assert_eq!(scene.roads()[1].nodes, vec![NodeID(3), NodeID(1)]);
        assert!(scene.roads()[1].avoid);
        assert_eq!(scene.segments().len(), 3);

        // The outline keeps its closing point, and the fence only keeps the nodes that exist
        assert_eq!(scene.buildings()[0].shape.points().len(), 5);
        assert!(matches!(scene.buildings()[0].shape, Shape::Polygon(_)));
        assert_eq!(scene.buildings()[1].id, BuildingID(201));
        assert!(matches!(scene.buildings()[1].shape, Shape::LineString(_)));
        assert_eq!(timer.num_warnings(), 1);

        // Shared nodes belong to whichever building came first
        assert_eq!(scene.building_of(NodeID(12)).unwrap().id, BuildingID(200));
        assert_eq!(scene.building_of(NodeID(10)).unwrap().id, BuildingID(200));
        assert!(scene.building_of(NodeID(1)).is_none());

        // North and east of the southwest corner
        let pt = scene.node(NodeID(3)).pt;
        assert!(pt.x() > 0.0 && pt.y() > 0.0);
        assert!(scene.node(NodeID(3)).pt.y() > scene.node(NodeID(2)).pt.y());
        assert_eq!(scene.node(NodeID(2)).gps.y(), 55.751);
    }

    #[test]
    fn missing_road_node() {
        let raw = r#"<osm>
  <node id="1" lat="55.751" lon="37.601"/>
  <way id="100">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="path"/>
  </way>
</osm>"#;
        let err = parse(raw, &mut Timer::throwaway()).err().unwrap();
        assert_eq!(err.to_string(), "way #100 references missing node #2");
    }

    #[test]
    fn corrupt_input() {
        let duplicate = r#"<osm>
  <node id="1" lat="55.751" lon="37.601"/>
  <node id="1" lat="55.752" lon="37.601"/>
</osm>"#;
        assert!(parse(duplicate, &mut Timer::throwaway()).is_err());

        let bad_attribute = r#"<osm>
  <node id="1" lat="north" lon="37.601"/>
</osm>"#;
        let err = parse(bad_attribute, &mut Timer::throwaway()).err().unwrap();
        assert!(err.to_string().contains("bad lat"));

        assert!(parse("<osm>", &mut Timer::throwaway()).is_err());
    }

    #[test]
    fn tree_in_a_row_counts_once() {
        let raw = r#"<osm>
  <bounds minlat="55.750" minlon="37.600" maxlat="55.760" maxlon="37.610"/>
  <node id="1" lat="55.751" lon="37.601">
    <tag k="natural" v="tree"/>
  </node>
  <node id="2" lat="55.752" lon="37.602"/>
  <way id="300">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="natural" v="tree_row"/>
  </way>
  <way id="301">
    <nd ref="2"/>
    <nd ref="1"/>
    <tag k="natural" v="tree_row"/>
  </way>
</osm>"#;
        let osm = parse(raw, &mut Timer::throwaway()).unwrap();
        assert_eq!(osm.stats.trees, 2);
        let ids: Vec<TreeID> = osm.scene.trees().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![TreeID(1), TreeID(2)]);
    }

    #[test]
    fn scraped_bounds() {
        let raw = r#"<osm>
  <node id="1" lat="55.751" lon="37.601"/>
  <node id="2" lat="55.752" lon="37.603"/>
</osm>"#;
        let mut timer = Timer::throwaway();
        let osm = parse(raw, &mut timer).unwrap();
        assert_eq!(osm.gps_bounds.min_lon, 37.601);
        assert_eq!(osm.gps_bounds.max_lat, 55.752);
        assert_eq!(timer.num_warnings(), 1);
        assert_eq!(osm.scene.node(NodeID(1)).pt.x(), 0.0);
        assert_eq!(osm.scene.node(NodeID(1)).pt.y(), 0.0);
        assert!(serde_json::to_string(&osm.stats).is_ok());
    }
}
