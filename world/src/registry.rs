//! Registry of interactive points the avatar can approach.

use std::collections::BTreeMap;

use monolake_core::{PoiKey, PointOfInterest, WorldPosition};

/// Points of interest keyed by identifier.
///
/// Entries iterate in ascending key order, which makes the proximity
/// tie-break (first entry at the minimum distance) lexicographic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoiRegistry {
    points: BTreeMap<PoiKey, WorldPosition>,
}

impl PoiRegistry {
    /// Builds a registry from the provided points.
    ///
    /// Duplicate keys collapse onto the last supplied position; the number of
    /// collapsed entries is returned alongside the registry.
    #[must_use]
    pub fn from_points(points: Vec<PointOfInterest>) -> (Self, usize) {
        let mut map = BTreeMap::new();
        let mut duplicates = 0;
        for point in points {
            let position = point.position();
            if map.insert(point.key().clone(), position).is_some() {
                duplicates += 1;
            }
        }
        (Self { points: map }, duplicates)
    }

    /// Number of points in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether the registry holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position of the point registered under `key`.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<WorldPosition> {
        self.points.get(key).copied()
    }

    /// Reports whether a point is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.points.contains_key(key)
    }

    /// Iterates over the registered points in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PoiKey, WorldPosition)> {
        self.points.iter().map(|(key, position)| (key, *position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(key: &str, x: f32, z: f32) -> PointOfInterest {
        PointOfInterest::new(PoiKey::new(key), WorldPosition::new(x, 0.5, z))
    }

    #[test]
    fn iterates_in_key_order() {
        let (registry, duplicates) = PoiRegistry::from_points(vec![
            point("shrimp", -2.0, 0.4),
            point("fly", 2.6, -2.6),
            point("osprey", 0.0, 4.0),
        ]);
        assert_eq!(duplicates, 0);
        let keys: Vec<_> = registry.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, ["fly", "osprey", "shrimp"]);
    }

    #[test]
    fn duplicate_keys_keep_last_position() {
        let (registry, duplicates) =
            PoiRegistry::from_points(vec![point("nest", 0.0, 0.0), point("nest", 1.0, 2.0)]);
        assert_eq!(duplicates, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.position("nest"),
            Some(WorldPosition::new(1.0, 0.5, 2.0))
        );
    }
}
