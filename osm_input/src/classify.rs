use crate::Tags;

/// Paths meant for people walking or cycling.
const WALKABLE_HIGHWAYS: [&str; 9] = [
    "footway",
    "bridleway",
    "service",
    "pedestrian",
    "steps",
    "path",
    "cycleway",
    "living_street",
    "track",
];

/// Walkable, but shared with cars, so routers should prefer something else.
const CAR_HIGHWAYS: [&str; 10] = [
    "residential",
    "unclassified",
    "tertiary",
    "tertiary_link",
    "secondary",
    "secondary_link",
    "primary",
    "primary_link",
    "trunk",
    "trunk_link",
];

/// Barriers tall enough to cast shade
const SHADY_BARRIERS: [&str; 5] = ["wall", "retaining_wall", "city_wall", "hedge", "fence"];

#[derive(Clone, Debug, PartialEq)]
pub enum WayKind {
    Road { avoid: bool },
    /// Buildings and shade-casting barriers
    Building,
    /// Every node is a tree
    TreeRow,
    /// A highway type that isn't walkable or isn't recognized
    UnknownHighway(String),
    Ignored,
}

pub fn classify_way(tags: &Tags) -> WayKind {
    if is_underground(tags) {
        return WayKind::Ignored;
    }
    if tags.is_any("highway", &WALKABLE_HIGHWAYS) {
        return WayKind::Road { avoid: false };
    }
    if tags.is_any("highway", &CAR_HIGHWAYS) {
        return WayKind::Road { avoid: true };
    }
    if tags.keys().any(|k| k.contains("building")) {
        return WayKind::Building;
    }
    if tags.is_any("barrier", &SHADY_BARRIERS) {
        return WayKind::Building;
    }
    if tags.is("natural", "tree_row") {
        return WayKind::TreeRow;
    }
    if let Some(highway) = tags.get("highway") {
        return WayKind::UnknownHighway(highway.clone());
    }
    WayKind::Ignored
}

pub fn is_tree(tags: &Tags) -> bool {
    tags.is("natural", "tree") && !is_underground(tags)
}

// Things below ground don't shade anything. Unparseable layers are treated as ground level.
fn is_underground(tags: &Tags) -> bool {
    tags.get("layer")
        .and_then(|layer| layer.trim().parse::<f64>().ok())
        .map(|layer| layer < -1.0)
        .unwrap_or(false)
}
