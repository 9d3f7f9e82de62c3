use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{LonLat, Pt2D};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeID(pub i64);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingID(pub i64);

impl fmt::Display for BuildingID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "building #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeID(pub i64);

impl fmt::Display for TreeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tree #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoadID(pub i64);

impl fmt::Display for RoadID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "road #{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoNode {
    pub id: NodeID,
    pub gps: LonLat,
    pub pt: Pt2D,
    /// The building this node outlines, if any. Resolve it through `Scene::building_of`.
    pub owner: Option<BuildingID>,
}

/// The outline of something that casts shade. Nothing is guaranteed about validity: polygons may
/// be unclosed, self-intersecting, or collapse to a line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Polygon(Vec<Pt2D>),
    LineString(Vec<Pt2D>),
    SinglePoint(Pt2D),
}

impl Shape {
    /// Picks the kind of shape from how many points there are. Returns None for no points.
    pub fn from_points(mut pts: Vec<Pt2D>) -> Option<Shape> {
        match pts.len() {
            0 => None,
            1 => pts.pop().map(Shape::SinglePoint),
            2 => Some(Shape::LineString(pts)),
            _ => Some(Shape::Polygon(pts)),
        }
    }

    pub fn points(&self) -> &[Pt2D] {
        match self {
            Shape::Polygon(pts) | Shape::LineString(pts) => pts,
            Shape::SinglePoint(pt) => std::slice::from_ref(pt),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingID,
    pub shape: Shape,
}

/// Trees are disks centered here, never clipped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: TreeID,
    pub pt: Pt2D,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Road {
    pub id: RoadID,
    pub nodes: Vec<NodeID>,
    /// Routers should prefer other paths
    pub avoid: bool,
}

/// One directed piece of a road between consecutive nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentRequest {
    pub road: RoadID,
    /// Position of the segment within its road
    pub idx: usize,
    pub from: NodeID,
    pub to: NodeID,
    pub avoid: bool,
}

/// Everything the scan reads, validated once and never modified afterwards.
pub struct Scene {
    nodes: BTreeMap<NodeID, GeoNode>,
    buildings: Vec<Building>,
    building_lookup: HashMap<BuildingID, usize>,
    trees: Vec<Tree>,
    roads: Vec<Road>,
}

impl Scene {
    /// Fails if IDs are duplicated or a road refers to a node that doesn't exist. Either means the
    /// input is corrupt. Tree IDs are checked too, since a repeated tree would shade twice.
    pub fn new(
        raw_nodes: Vec<GeoNode>,
        buildings: Vec<Building>,
        trees: Vec<Tree>,
        roads: Vec<Road>,
    ) -> Result<Scene> {
        let mut nodes = BTreeMap::new();
        for node in raw_nodes {
            let id = node.id;
            if nodes.insert(id, node).is_some() {
                bail!("Duplicate {}, the input is corrupt", id);
            }
        }

        let mut building_lookup = HashMap::new();
        for (idx, b) in buildings.iter().enumerate() {
            if building_lookup.insert(b.id, idx).is_some() {
                bail!("Duplicate {}, the input is corrupt", b.id);
            }
        }

        let mut tree_ids = HashSet::new();
        for t in &trees {
            if !tree_ids.insert(t.id) {
                bail!("Duplicate {}, the input is corrupt", t.id);
            }
        }

        for road in &roads {
            if road.nodes.is_empty() {
                bail!("{} has no nodes", road.id);
            }
            for n in &road.nodes {
                if !nodes.contains_key(n) {
                    bail!("{} references missing {}", road.id, n);
                }
            }
        }

        Ok(Scene {
            nodes,
            buildings,
            building_lookup,
            trees,
            roads,
        })
    }

    pub fn node(&self, id: NodeID) -> &GeoNode {
        &self.nodes[&id]
    }

    pub fn buildings(&self) -> &Vec<Building> {
        &self.buildings
    }

    pub fn building(&self, id: BuildingID) -> Option<&Building> {
        self.building_lookup.get(&id).map(|idx| &self.buildings[*idx])
    }

    /// Follows a node's back-reference to the building it outlines.
    pub fn building_of(&self, node: NodeID) -> Option<&Building> {
        self.building(self.nodes.get(&node)?.owner?)
    }

    pub fn trees(&self) -> &Vec<Tree> {
        &self.trees
    }

    pub fn roads(&self) -> &Vec<Road> {
        &self.roads
    }

    /// Every segment of every road, in road order and then in order along each road.
    pub fn segments(&self) -> Vec<SegmentRequest> {
        let mut segments = Vec::new();
        for road in &self.roads {
            for (idx, pair) in road.nodes.windows(2).enumerate() {
                segments.push(SegmentRequest {
                    road: road.id,
                    idx,
                    from: pair[0],
                    to: pair[1],
                    avoid: road.avoid,
                });
            }
        }
        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, x: f64, y: f64, owner: Option<BuildingID>) -> GeoNode {
        GeoNode {
            id: NodeID(id),
            gps: LonLat::new(x, y),
            pt: Pt2D::new(x, y),
            owner,
        }
    }

    #[test]
    fn shape_kinds() {
        assert_eq!(Shape::from_points(Vec::new()), None);
        assert_eq!(
            Shape::from_points(vec![Pt2D::new(1.0, 2.0)]),
            Some(Shape::SinglePoint(Pt2D::new(1.0, 2.0)))
        );
        assert!(matches!(
            Shape::from_points(vec![Pt2D::new(1.0, 2.0), Pt2D::new(3.0, 4.0)]),
            Some(Shape::LineString(_))
        ));
        let poly = Shape::from_points(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(1.0, 0.0),
            Pt2D::new(1.0, 1.0),
        ])
        .unwrap();
        assert!(matches!(poly, Shape::Polygon(_)));
        assert_eq!(poly.points().len(), 3);
    }

    #[test]
    fn missing_node_is_fatal() {
        let err = Scene::new(
            vec![node(1, 0.0, 0.0, None)],
            Vec::new(),
            Vec::new(),
            vec![Road {
                id: RoadID(7),
                nodes: vec![NodeID(1), NodeID(2)],
                avoid: false,
            }],
        )
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "road #7 references missing node #2");
    }

    #[test]
    fn duplicate_nodes_are_fatal() {
        assert!(Scene::new(
            vec![node(1, 0.0, 0.0, None), node(1, 5.0, 5.0, None)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
        .is_err());
    }

    #[test]
    fn duplicate_trees_are_fatal() {
        let tree = Tree {
            id: TreeID(9),
            pt: Pt2D::new(1.0, 1.0),
        };
        let err = Scene::new(Vec::new(), Vec::new(), vec![tree.clone(), tree], Vec::new())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Duplicate tree #9, the input is corrupt");
    }

    #[test]
    fn back_references_and_segments() {
        let scene = Scene::new(
            vec![
                node(1, 0.0, 0.0, None),
                node(2, 10.0, 0.0, None),
                node(3, 20.0, 0.0, None),
                node(4, 5.0, 5.0, Some(BuildingID(100))),
            ],
            vec![Building {
                id: BuildingID(100),
                shape: Shape::SinglePoint(Pt2D::new(5.0, 5.0)),
            }],
            Vec::new(),
            vec![
                Road {
                    id: RoadID(1),
                    nodes: vec![NodeID(1), NodeID(2), NodeID(3)],
                    avoid: true,
                },
                Road {
                    id: RoadID(2),
                    nodes: vec![NodeID(3)],
                    avoid: false,
                },
            ],
        )
        .unwrap();

        assert_eq!(scene.building_of(NodeID(4)).unwrap().id, BuildingID(100));
        assert!(scene.building_of(NodeID(1)).is_none());
        assert!(scene.building_of(NodeID(99)).is_none());

        let segments = scene.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[1],
            SegmentRequest {
                road: RoadID(1),
                idx: 1,
                from: NodeID(2),
                to: NodeID(3),
                avoid: true,
            }
        );
    }
}
