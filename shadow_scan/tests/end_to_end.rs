use geom::{LonLat, Pt2D};
use shadow_scan::{
    Building, BuildingID, EdgeRecord, GeoNode, NodeID, Road, RoadID, ScanConfig, ScanProblem,
    Scene, SegmentOutcome, SegmentRequest, ShadowScanner, Shape, Side, Tree, TreeID,
};
use shadow_util::Timer;

// Roughly 1m of longitude per 0.000009 degrees at the equator
const DEGREES_PER_METER: f64 = 1.0 / 111_195.0;

fn node(id: i64, x: f64, y: f64) -> GeoNode {
    GeoNode {
        id: NodeID(id),
        gps: LonLat::new(x * DEGREES_PER_METER, y * DEGREES_PER_METER),
        pt: Pt2D::new(x, y),
        owner: None,
    }
}

fn road(id: i64, nodes: Vec<i64>, avoid: bool) -> Road {
    Road {
        id: RoadID(id),
        nodes: nodes.into_iter().map(NodeID).collect(),
        avoid,
    }
}

fn rect(id: i64, x1: f64, y1: f64, x2: f64, y2: f64) -> Building {
    Building {
        id: BuildingID(id),
        shape: Shape::Polygon(vec![
            Pt2D::new(x1, y1),
            Pt2D::new(x2, y1),
            Pt2D::new(x2, y2),
            Pt2D::new(x1, y2),
            Pt2D::new(x1, y1),
        ]),
    }
}

fn scan(scene: &Scene, config: ScanConfig) -> Vec<EdgeRecord> {
    let mut timer = Timer::throwaway();
    let scanner = ShadowScanner::new(scene, config, &mut timer).unwrap();
    let mut edges = Vec::new();
    scanner.run(&mut edges, &mut timer).unwrap();
    edges
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "got {}, expected {}",
        actual,
        expected
    );
}

#[test]
fn building_on_one_side() {
    let scene = Scene::new(
        vec![node(1, 0.0, 0.0), node(2, 100.0, 0.0)],
        vec![rect(10, 10.0, 5.0, 40.0, 20.0)],
        Vec::new(),
        vec![road(100, vec![1, 2], true)],
    )
    .unwrap();
    let edges = scan(&scene, ScanConfig::default());
    assert_eq!(edges.len(), 1);
    assert_close(edges[0].left_shadow, 0.3);
    assert_eq!(edges[0].right_shadow, 0.0);
    assert!(edges[0].avoid);
    assert!((edges[0].distance - 100.0).abs() < 0.1);
    assert!((edges[0].direction - 90.0).abs() < 1e-6);

    // Flip the road around, and the building is on the right
    let scene = Scene::new(
        vec![node(1, 0.0, 0.0), node(2, 100.0, 0.0)],
        vec![rect(10, 10.0, 5.0, 40.0, 20.0)],
        Vec::new(),
        vec![road(100, vec![2, 1], false)],
    )
    .unwrap();
    let edges = scan(&scene, ScanConfig::default());
    assert_eq!(edges[0].left_shadow, 0.0);
    assert_close(edges[0].right_shadow, 0.3);
    assert!((edges[0].direction + 90.0).abs() < 1e-6);
}

#[test]
fn single_tree() {
    let scene = Scene::new(
        vec![node(1, 0.0, 0.0), node(2, 100.0, 0.0)],
        Vec::new(),
        vec![
            Tree {
                id: TreeID(1),
                pt: Pt2D::new(50.0, -4.0),
            },
            // Beyond the corridor
            Tree {
                id: TreeID(2),
                pt: Pt2D::new(50.0, -40.0),
            },
        ],
        vec![road(100, vec![1, 2], false)],
    )
    .unwrap();
    let edges = scan(&scene, ScanConfig::default());
    assert_eq!(edges[0].left_shadow, 0.0);
    assert_close(edges[0].right_shadow, 0.005);
}

#[test]
fn zero_length_segment() {
    let scene = Scene::new(
        vec![node(1, 0.0, 0.0), node(2, 0.0, 0.0), node(3, 50.0, 0.0)],
        vec![rect(10, -5.0, -5.0, 5.0, 5.0)],
        Vec::new(),
        vec![road(100, vec![1, 2, 3], false)],
    )
    .unwrap();
    let mut timer = Timer::throwaway();
    let scanner = ShadowScanner::new(&scene, ScanConfig::default(), &mut timer).unwrap();
    let segments = scene.segments();
    match scanner.scan_segment(&segments[0]) {
        SegmentOutcome::Emitted {
            edge,
            problems,
            zero_length,
        } => {
            assert!(zero_length);
            assert!(problems.is_empty());
            assert_eq!(edge.left_shadow, 0.0);
            assert_eq!(edge.right_shadow, 0.0);
            assert_eq!(edge.distance, 0.0);
        }
        other => panic!("expected an edge, got {:?}", other),
    }

    let mut edges = Vec::new();
    let summary = scanner.run(&mut edges, &mut timer).unwrap();
    assert_eq!(edges.len(), 2);
    assert_eq!(summary.zero_length_segments, 1);
    assert_eq!(summary.segments_emitted, 2);
}

#[test]
fn long_segments_are_dropped() {
    let scene = Scene::new(
        vec![node(1, 0.0, 0.0), node(2, 100.0, 0.0), node(3, 20_100.0, 0.0)],
        Vec::new(),
        Vec::new(),
        vec![road(100, vec![1, 2, 3], false)],
    )
    .unwrap();
    let mut timer = Timer::throwaway();
    let scanner = ShadowScanner::new(&scene, ScanConfig::default(), &mut timer).unwrap();
    let mut edges = Vec::new();
    let summary = scanner.run(&mut edges, &mut timer).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].start_lon, 0.0);
    assert_eq!(summary.segments_dropped, 1);

    match scanner.scan_segment(&scene.segments()[1]) {
        SegmentOutcome::Dropped { length } => {
            assert!((length.inner_meters() - 20_000.0).abs() < 1.0);
        }
        other => panic!("expected a drop, got {:?}", other),
    }
}

#[test]
fn candidate_cap() {
    // A wall with lots of points
    let pts: Vec<Pt2D> = (0..10)
        .map(|i| Pt2D::new(5.0 + 10.0 * (i as f64), 5.0))
        .collect();
    let scene = Scene::new(
        vec![node(1, 0.0, 0.0), node(2, 100.0, 0.0)],
        vec![Building {
            id: BuildingID(10),
            shape: Shape::LineString(pts),
        }],
        Vec::new(),
        vec![road(100, vec![1, 2], false)],
    )
    .unwrap();

    let edges = scan(&scene, ScanConfig::default());
    assert_close(edges[0].left_shadow, 0.9);

    let config = ScanConfig {
        candidate_cap: 5,
        ..Default::default()
    };
    let mut timer = Timer::throwaway();
    let scanner = ShadowScanner::new(&scene, config, &mut timer).unwrap();
    match scanner.scan_segment(&SegmentRequest {
        road: RoadID(100),
        idx: 0,
        from: NodeID(1),
        to: NodeID(2),
        avoid: false,
    }) {
        SegmentOutcome::Emitted { edge, problems, .. } => {
            assert_eq!(edge.left_shadow, 0.0);
            assert_eq!(edge.right_shadow, 0.0);
            // One skip per corridor query. Trees are under the cap.
            assert_eq!(problems.len(), 2);
            for (problem, side) in problems.iter().zip(vec![Side::Left, Side::Right]) {
                match problem {
                    ScanProblem::CandidateCapExceeded {
                        side: actual_side,
                        count,
                        ..
                    } => {
                        assert_eq!(*actual_side, side);
                        assert_eq!(*count, 10);
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
        }
        other => panic!("expected an edge, got {:?}", other),
    }

    let mut edges = Vec::new();
    let summary = scanner.run(&mut edges, &mut timer).unwrap();
    assert_eq!(summary.cap_skips, 2);
}

#[test]
fn output_order_and_range() {
    // A grid of small buildings along a zigzagging road, with lots of segments
    let mut nodes = Vec::new();
    let mut node_ids = Vec::new();
    for i in 0..60 {
        let y = if i % 2 == 0 { 0.0 } else { 30.0 };
        nodes.push(node(i, 40.0 * (i as f64), y));
        node_ids.push(i);
    }
    let mut buildings = Vec::new();
    for i in 0..120 {
        let x = 20.0 * (i as f64);
        buildings.push(rect(1000 + i, x, 10.0, x + 12.0, 18.0));
    }
    let trees = (0..50)
        .map(|i| Tree {
            id: TreeID(i),
            pt: Pt2D::new(47.0 * (i as f64), 12.0),
        })
        .collect();
    let scene = Scene::new(
        nodes,
        buildings,
        trees,
        vec![
            road(1, node_ids.clone(), false),
            road(2, node_ids.into_iter().rev().collect(), true),
        ],
    )
    .unwrap();

    let config = ScanConfig {
        batch_size: 7,
        ..Default::default()
    };
    let edges = scan(&scene, config);
    let segments = scene.segments();
    assert_eq!(edges.len(), segments.len());
    for (edge, req) in edges.iter().zip(segments.iter()) {
        let from = scene.node(req.from);
        let to = scene.node(req.to);
        assert_eq!(edge.start_lon, from.gps.x());
        assert_eq!(edge.end_lon, to.gps.x());
        assert_eq!(edge.avoid, req.avoid);
        for value in [edge.left_shadow, edge.right_shadow] {
            assert!((0.0..=1.0).contains(&value), "{:?}", edge);
        }
    }
    assert!(edges.iter().any(|e| e.left_shadow > 0.0));
    assert!(edges.iter().any(|e| e.right_shadow > 0.0));

    // Batching doesn't change anything
    assert_eq!(scan(&scene, ScanConfig::default()), edges);
}
