use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::{Distance, Pt2D};

/// A static index over points, each tagged with a key. Many points may share one key (every
/// vertex of a building, for instance), and radius queries report one hit per point, so callers
/// can judge how much work a query would cause before resolving the keys.
pub struct FindNearby<K> {
    tree: RTree<GeomWithData<[f64; 2], K>>,
}

impl<K: Clone> FindNearby<K> {
    /// Bulk-loads the index. It can't be modified afterwards.
    pub fn new(pts: Vec<(Pt2D, K)>) -> FindNearby<K> {
        FindNearby {
            tree: RTree::bulk_load(
                pts.into_iter()
                    .map(|(pt, key)| GeomWithData::new([pt.x(), pt.y()], key))
                    .collect(),
            ),
        }
    }

    /// How many points are indexed
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Returns the key of every indexed point within `radius` of `center`, inclusive. Keys are
    /// repeated once per matching point, in no particular order.
    pub fn query(&self, center: Pt2D, radius: Distance) -> Vec<K> {
        let r = radius.inner_meters();
        self.tree
            .locate_within_distance([center.x(), center.y()], r * r)
            .map(|hit| hit.data.clone())
            .collect()
    }
}
