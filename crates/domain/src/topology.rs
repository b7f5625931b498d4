//! Topology registry — the maps and regions learned from device echoes.
//!
//! The registry is the sole owner of [`Map`]s and [`Region`]s. Entities that
//! represent a region only keep its `(MapId, RegionId)` pair and resolve it
//! here when they need the details.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{MapId, RegionId};

/// Kind of cleanable area inside a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// A room, tagged `rid` by the robot.
    #[serde(rename = "rid")]
    Room,
    /// A user-drawn zone, tagged `zid` by the robot.
    #[serde(rename = "zid")]
    Zone,
}

impl RegionKind {
    /// Parse the robot's type tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "rid" => Some(Self::Room),
            "zid" => Some(Self::Zone),
            _ => None,
        }
    }

    /// The robot's type tag.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Room => "rid",
            Self::Zone => "zid",
        }
    }
}

/// A room or zone inside a [`Map`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    #[serde(rename = "type")]
    pub kind: RegionKind,
}

/// A persistent map known to the robot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub id: MapId,
    pub name: String,
    #[serde(with = "region_list")]
    pub regions: BTreeMap<RegionId, Region>,
}

impl Map {
    fn new(id: MapId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            regions: BTreeMap::new(),
        }
    }

    /// Look up a region by id.
    #[must_use]
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }
}

/// Result of [`TopologyRegistry::upsert_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapUpsert {
    /// A new map was appended to the registry.
    Created,
    /// An existing map matched by name or id; nothing changed.
    Existing,
}

/// All maps and regions known for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopologyRegistry {
    maps: Vec<Map>,
}

impl TopologyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from previously persisted maps.
    #[must_use]
    pub fn from_maps(maps: Vec<Map>) -> Self {
        Self { maps }
    }

    /// All maps, in discovery order.
    #[must_use]
    pub fn maps(&self) -> &[Map] {
        &self.maps
    }

    /// Number of known maps.
    #[must_use]
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    /// Whether no map is known yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Look up a map by id.
    #[must_use]
    pub fn map(&self, id: &MapId) -> Option<&Map> {
        self.maps.iter().find(|m| &m.id == id)
    }

    /// Resolve a `(map, region)` pair.
    #[must_use]
    pub fn resolve(&self, map_id: &MapId, region_id: &RegionId) -> Option<(&Map, &Region)> {
        let map = self.map(map_id)?;
        map.region(region_id).map(|region| (map, region))
    }

    /// Record a map sighting.
    ///
    /// The robot may report a map by name before it reports it by id (or the
    /// other way around), so an existing map matching **either** field is
    /// reused. Names are checked first.
    pub fn upsert_map(&mut self, id: MapId, name: &str) -> MapUpsert {
        let existing = self
            .maps
            .iter()
            .any(|m| m.name == name)
            || self.maps.iter().any(|m| m.id == id);
        if existing {
            return MapUpsert::Existing;
        }
        self.maps.push(Map::new(id, name));
        MapUpsert::Created
    }

    /// Insert or overwrite regions of a known map.
    ///
    /// Returns the number of regions that were added or changed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownMap`] when `map_id` does not resolve;
    /// the registry is left untouched in that case.
    pub fn upsert_regions(
        &mut self,
        map_id: &MapId,
        regions: impl IntoIterator<Item = Region>,
    ) -> Result<usize, ValidationError> {
        let map = self
            .maps
            .iter_mut()
            .find(|m| &m.id == map_id)
            .ok_or_else(|| ValidationError::UnknownMap(map_id.clone()))?;

        let mut changed = 0;
        for region in regions {
            if map.regions.get(&region.id) != Some(&region) {
                map.regions.insert(region.id.clone(), region);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Regions that have no entity yet, according to `is_registered`.
    ///
    /// The iterator scans the current state on every call, so it can be
    /// created again after new regions are inserted.
    pub fn unregistered_regions<'a, F>(
        &'a self,
        is_registered: F,
    ) -> impl Iterator<Item = (&'a Map, &'a Region)> + 'a
    where
        F: Fn(&MapId, &RegionId) -> bool + Clone + 'a,
    {
        self.maps.iter().flat_map(move |map| {
            let is_registered = is_registered.clone();
            map.regions
                .values()
                .filter(move |region| !is_registered(&map.id, &region.id))
                .map(move |region| (map, region))
        })
    }
}

/// Regions are keyed by id in memory but persisted as a plain list.
mod region_list {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::Region;
    use crate::id::RegionId;

    pub fn serialize<S: Serializer>(
        regions: &BTreeMap<RegionId, Region>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(regions.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<RegionId, Region>, D::Error> {
        let list = Vec::<Region>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|r| (r.id.clone(), r)).collect())
    }
}
