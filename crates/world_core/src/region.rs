//! Named-area model: static region hierarchy and dynamic regions.
//!
//! Static regions are declared at world load, validated into a containment
//! tree rooted at the single world region, and distributed into sector
//! rectangle lists by [`Map::activate_regions`](crate::Map::activate_regions).
//! Dynamic regions exist only at runtime: they are placed transactionally,
//! can be relocated tile-by-tile, and may never overlap one another.
//!
//! Regions live in an arena owned by [`RegionAtlas`] and are addressed by
//! copyable [`RegionHandle`]s; sectors store handles, never references.
//! Deleting a region tombstones its slot, so handles to the survivors stay
//! stable; the freed handle itself dangles and a later insert may reuse the
//! slot. Callers must drop handles to regions they delete.

use crate::map::{Map, PlaneSpec};
use crate::terrain::TerrainSource;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use world_types::{
    EntityId, GridRect, RegionConfigError, TileCatalog, TilePoint, WorldError,
};

// ============================================================================
// Regions
// ============================================================================

/// Stable arena index of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(u32);

impl RegionHandle {
    pub(crate) fn from_index(idx: usize) -> Self {
        Self(idx as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lifecycle variant of a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionKind {
    /// Persisted region with a unique defname, part of the hierarchy.
    Static { defname: String },
    /// Runtime-only relocatable region; never in the lookup tables.
    Dynamic,
}

/// One named area: an ordered set of rectangles, a parent link, and a
/// hierarchy depth (0 for the world region, parent's depth + 1 otherwise).
#[derive(Debug, Clone)]
pub struct Region {
    kind: RegionKind,
    name: String,
    rects: Vec<GridRect>,
    parent: Option<RegionHandle>,
    depth: Option<u32>,
    spawn: TilePoint,
}

impl Region {
    pub fn kind(&self) -> &RegionKind {
        &self.kind
    }

    /// Unique persistent id; `None` for dynamic regions.
    pub fn defname(&self) -> Option<&str> {
        match &self.kind {
            RegionKind::Static { defname } => Some(defname),
            RegionKind::Dynamic => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rects(&self) -> &[GridRect] {
        &self.rects
    }

    pub fn parent(&self) -> Option<RegionHandle> {
        self.parent
    }

    /// Hierarchy depth; `None` only before hierarchy resolution has run.
    pub fn depth(&self) -> Option<u32> {
        self.depth
    }

    /// Canonical location of the region; also decides its plane.
    pub fn spawn(&self) -> TilePoint {
        self.spawn
    }

    pub fn plane(&self) -> u8 {
        self.spawn.plane
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, RegionKind::Static { .. })
    }

    pub fn contains_point(&self, x: u16, y: u16) -> bool {
        self.rects.iter().any(|r| r.contains(x, y))
    }

    /// True when any single rectangle fully encloses `rect`.
    fn contains_rect(&self, rect: &GridRect) -> bool {
        self.rects.iter().any(|r| r.contains_rect(rect))
    }
}

/// Persistence-shaped record of one static region, as produced by whatever
/// loads region definitions. Parent references are by defname; `None` marks
/// the world region.
#[derive(Debug, Clone)]
pub struct StaticRegionDef {
    pub defname: String,
    pub name: String,
    pub parent: Option<String>,
    pub spawn: TilePoint,
    pub rects: Vec<GridRect>,
}

// ============================================================================
// Region Atlas
// ============================================================================

/// Registry of all regions: the arena plus the defname and display-name
/// lookup tables and the resolved world-region handle.
#[derive(Debug, Default)]
pub struct RegionAtlas {
    regions: Vec<Option<Region>>,
    by_defname: HashMap<String, RegionHandle>,
    /// Lowercased display names; on collision the last registration wins.
    by_name: HashMap<String, RegionHandle>,
    world: Option<RegionHandle>,
}

impl RegionAtlas {
    /// Builds and fully resolves the atlas from a complete static region
    /// set. Fails on duplicate defnames, unknown parents, a missing or
    /// ambiguous world region, cross-plane parent links, or a parent graph
    /// that does not terminate at the world region.
    pub fn build(defs: Vec<StaticRegionDef>) -> Result<Self, RegionConfigError> {
        let mut atlas = Self::default();
        let mut parents: Vec<(RegionHandle, Option<String>)> = Vec::with_capacity(defs.len());

        for def in defs {
            let handle = atlas.register(def.defname, def.name, def.spawn, def.rects)?;
            parents.push((handle, def.parent));
        }
        atlas.link_parents(parents)?;
        atlas.resolve_hierarchy()?;
        info!(regions = atlas.iter().count(), "region atlas resolved");
        Ok(atlas)
    }

    fn register(
        &mut self,
        defname: String,
        name: String,
        spawn: TilePoint,
        rects: Vec<GridRect>,
    ) -> Result<RegionHandle, RegionConfigError> {
        if self.by_defname.contains_key(&defname) {
            return Err(RegionConfigError::DuplicateDefname(defname));
        }
        let handle = self.alloc(Region {
            kind: RegionKind::Static { defname: defname.clone() },
            name: name.clone(),
            rects,
            parent: None,
            depth: None,
            spawn,
        });
        self.by_defname.insert(defname, handle);
        self.by_name.insert(name.to_lowercase(), handle);
        Ok(handle)
    }

    fn alloc(&mut self, region: Region) -> RegionHandle {
        if let Some(idx) = self.regions.iter().position(Option::is_none) {
            self.regions[idx] = Some(region);
            RegionHandle::from_index(idx)
        } else {
            self.regions.push(Some(region));
            RegionHandle::from_index(self.regions.len() - 1)
        }
    }

    fn link_parents(
        &mut self,
        parents: Vec<(RegionHandle, Option<String>)>,
    ) -> Result<(), RegionConfigError> {
        for (handle, parent_defname) in parents {
            let parent = match parent_defname {
                Some(ref defname) => {
                    Some(*self.by_defname.get(defname).ok_or_else(|| {
                        RegionConfigError::UnknownParent {
                            region: self.region_label(handle),
                            parent: defname.clone(),
                        }
                    })?)
                }
                None => None,
            };
            if let Some(region) = self.get_mut(handle) {
                region.parent = parent;
            }
        }
        Ok(())
    }

    /// Assigns hierarchy depths for every static region.
    ///
    /// Works as an iterative fixpoint: each pass resolves every region whose
    /// parent is already resolved. A pass that resolves nothing while
    /// regions remain means the parent graph has a cycle or a dangling
    /// chain, which is fatal.
    pub fn resolve_hierarchy(&mut self) -> Result<(), RegionConfigError> {
        // Reset previous resolution; depths change when topology is edited.
        let mut roots: Vec<RegionHandle> = Vec::new();
        let mut remaining: Vec<RegionHandle> = Vec::new();
        for (handle, region) in self.indexed_slots() {
            if !region.is_static() {
                continue;
            }
            if region.parent.is_none() {
                roots.push(handle);
            } else {
                remaining.push(handle);
            }
        }

        let world = match roots.as_slice() {
            [] => return Err(RegionConfigError::MissingWorldRegion),
            [only] => *only,
            [first, second, ..] => {
                return Err(RegionConfigError::MultipleWorldRegions {
                    first: self.region_label(*first),
                    second: self.region_label(*second),
                })
            }
        };

        for handle in remaining.iter().chain(std::iter::once(&world)) {
            if let Some(region) = self.get_mut(*handle) {
                region.depth = None;
            }
        }
        if let Some(region) = self.get_mut(world) {
            region.depth = Some(0);
        }
        self.world = Some(world);

        while !remaining.is_empty() {
            let before = remaining.len();
            let mut unresolved = Vec::with_capacity(before);
            for handle in remaining {
                let region = self.get(handle).ok_or(RegionConfigError::InvalidRegion)?;
                let parent = region.parent.ok_or(RegionConfigError::InvalidRegion)?;
                let parent_region = self.get(parent).ok_or(RegionConfigError::InvalidRegion)?;
                match parent_region.depth {
                    Some(parent_depth) => {
                        // The world region is plane-agnostic; everything else
                        // must parent within its own plane.
                        if parent != world && parent_region.plane() != region.plane() {
                            return Err(RegionConfigError::PlaneMismatch {
                                region: self.region_label(handle),
                                plane: region.plane(),
                                parent: self.region_label(parent),
                                parent_plane: parent_region.plane(),
                            });
                        }
                        let depth = parent_depth + 1;
                        if let Some(region) = self.get_mut(handle) {
                            region.depth = Some(depth);
                        }
                    }
                    None => unresolved.push(handle),
                }
            }
            if unresolved.len() == before {
                return Err(RegionConfigError::HierarchyStall { unresolved: unresolved.len() });
            }
            remaining = unresolved;
        }
        Ok(())
    }

    fn region_label(&self, handle: RegionHandle) -> String {
        self.get(handle)
            .map(|r| r.defname().unwrap_or(r.name()).to_string())
            .unwrap_or_else(|| format!("#{}", handle.0))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn get(&self, handle: RegionHandle) -> Option<&Region> {
        self.regions.get(handle.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, handle: RegionHandle) -> Option<&mut Region> {
        self.regions.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Handle of the world region. Only `None` before hierarchy resolution.
    pub fn world(&self) -> Option<RegionHandle> {
        self.world
    }

    pub fn find_by_defname(&self, defname: &str) -> Option<RegionHandle> {
        self.by_defname.get(defname).copied()
    }

    /// Case-insensitive display-name lookup.
    pub fn find_by_name(&self, name: &str) -> Option<RegionHandle> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionHandle, &Region)> {
        self.indexed_slots()
    }

    pub fn iter_static(&self) -> impl Iterator<Item = (RegionHandle, &Region)> {
        self.indexed_slots().filter(|(_, r)| r.is_static())
    }

    fn indexed_slots(&self) -> impl Iterator<Item = (RegionHandle, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|r| (RegionHandle::from_index(idx), r)))
    }

    // ========================================================================
    // Static Topology Edits
    // ========================================================================

    /// Registers a freshly defined static region. The parent must already be
    /// resolved. Returns the new handle; the caller re-activates the plane.
    pub fn insert_static(&mut self, def: StaticRegionDef) -> Result<RegionHandle, RegionConfigError> {
        let parent_defname = def.parent.ok_or(RegionConfigError::MissingWorldRegion)?;
        let parent = self.by_defname.get(&parent_defname).copied().ok_or_else(|| {
            RegionConfigError::UnknownParent {
                region: def.defname.clone(),
                parent: parent_defname.clone(),
            }
        })?;
        let handle = self.register(def.defname, def.name, def.spawn, def.rects)?;
        if let Some(region) = self.get_mut(handle) {
            region.parent = Some(parent);
        }
        self.resolve_hierarchy()?;
        Ok(handle)
    }

    /// Deletes a static region, re-parenting its direct children to the
    /// deleted region's own parent. Forbidden for the world region. Returns
    /// the affected plane; the caller must re-activate it, because the
    /// re-parented children change depth and therefore sort position in
    /// every sector.
    pub fn delete_static(&mut self, handle: RegionHandle) -> Result<u8, RegionConfigError> {
        if self.world == Some(handle) {
            return Err(RegionConfigError::WorldRegionDelete);
        }
        let region = self.get(handle).ok_or(RegionConfigError::InvalidRegion)?;
        if !region.is_static() {
            return Err(RegionConfigError::InvalidRegion);
        }
        let plane = region.plane();
        let new_parent = region.parent;
        let defname = region.defname().map(str::to_string);
        let name_key = region.name().to_lowercase();

        let children: Vec<RegionHandle> = self
            .indexed_slots()
            .filter(|(_, r)| r.parent() == Some(handle))
            .map(|(h, _)| h)
            .collect();
        for child in children {
            if let Some(r) = self.get_mut(child) {
                r.parent = new_parent;
            }
        }

        if let Some(defname) = defname {
            self.by_defname.remove(&defname);
        }
        if self.by_name.get(&name_key) == Some(&handle) {
            self.by_name.remove(&name_key);
        }
        self.regions[handle.index()] = None;
        self.resolve_hierarchy()?;
        debug!(plane, "static region deleted and hierarchy re-resolved");
        Ok(plane)
    }

    /// Replaces a static region's rectangle list. Returns the affected
    /// plane; the caller re-activates it.
    pub fn set_rectangles(
        &mut self,
        handle: RegionHandle,
        rects: Vec<GridRect>,
    ) -> Result<u8, RegionConfigError> {
        let region = self.get_mut(handle).ok_or(RegionConfigError::InvalidRegion)?;
        if !region.is_static() {
            return Err(RegionConfigError::InvalidRegion);
        }
        region.rects = rects;
        Ok(region.plane())
    }

    // ========================================================================
    // Consistency Audit
    // ========================================================================

    /// Walks every static region and reports (never corrects) topology
    /// problems: a rectangle not contained in the parent region, and two
    /// same-depth, same-plane regions whose rectangles partially overlap
    /// without one containing the other. Returns the number of findings.
    pub fn check_all_regions(&self) -> usize {
        let mut findings = 0;

        for (handle, region) in self.iter_static() {
            let Some(parent_handle) = region.parent() else {
                continue;
            };
            // The world region spans everything by definition.
            if Some(parent_handle) == self.world {
                continue;
            }
            let Some(parent) = self.get(parent_handle) else {
                continue;
            };
            for rect in region.rects() {
                if !parent.contains_rect(rect) {
                    warn!(
                        region = self.region_label(handle),
                        %rect,
                        parent = parent.name(),
                        "region rectangle not contained in parent region"
                    );
                    findings += 1;
                }
            }
        }

        let statics: Vec<(RegionHandle, &Region)> = self.iter_static().collect();
        for (i, (ha, a)) in statics.iter().enumerate() {
            for (hb, b) in &statics[i + 1..] {
                if a.depth() != b.depth() || a.plane() != b.plane() {
                    continue;
                }
                for ra in a.rects() {
                    for rb in b.rects() {
                        if ra.intersects(rb) && !ra.contains_rect(rb) && !rb.contains_rect(ra) {
                            warn!(
                                first = self.region_label(*ha),
                                second = self.region_label(*hb),
                                "same-depth regions partially overlap"
                            );
                            findings += 1;
                        }
                    }
                }
            }
        }
        findings
    }

    // ========================================================================
    // Dynamic Regions (arena side)
    // ========================================================================

    fn alloc_dynamic(&mut self, name: String, spawn: TilePoint, rects: Vec<GridRect>) -> RegionHandle {
        self.alloc(Region {
            kind: RegionKind::Dynamic,
            name,
            rects,
            parent: None,
            depth: None,
            spawn,
        })
    }

    fn free(&mut self, handle: RegionHandle) {
        self.regions[handle.index()] = None;
    }
}

// ============================================================================
// World Index
// ============================================================================

/// The explicit world state object: the region atlas plus one [`Map`] per
/// plane. Owns the whole spatial index lifecycle; there is no process-wide
/// state anywhere in the crate.
pub struct WorldIndex {
    atlas: RegionAtlas,
    maps: Vec<Map>,
}

impl WorldIndex {
    /// Builds the world from plane specs and a complete static region set,
    /// resolves the hierarchy, and activates every plane.
    pub fn build(
        planes: &[PlaneSpec],
        catalog: Arc<dyn TileCatalog>,
        source: Arc<dyn TerrainSource>,
        defs: Vec<StaticRegionDef>,
    ) -> Result<Self, RegionConfigError> {
        let atlas = RegionAtlas::build(defs)?;
        let maps = planes
            .iter()
            .enumerate()
            .map(|(plane, spec)| {
                Map::new(plane as u8, *spec, Arc::clone(&catalog), Arc::clone(&source))
            })
            .collect();
        let mut world = Self { atlas, maps };
        world.activate_all();
        Ok(world)
    }

    pub fn atlas(&self) -> &RegionAtlas {
        &self.atlas
    }

    pub fn map(&self, plane: u8) -> Option<&Map> {
        self.maps.get(plane as usize)
    }

    pub fn map_mut(&mut self, plane: u8) -> Option<&mut Map> {
        self.maps.get_mut(plane as usize)
    }

    pub fn region(&self, handle: RegionHandle) -> Option<&Region> {
        self.atlas.get(handle)
    }

    /// Re-distributes every static region's rectangles into every plane's
    /// sectors. Idempotent: activating the same set twice yields identical
    /// resolution results.
    pub fn activate_all(&mut self) {
        for map in &mut self.maps {
            map.activate_regions(&self.atlas);
        }
    }

    /// Innermost region at a point, falling back to the world region.
    pub fn resolve_at(&self, x: u16, y: u16, plane: u8) -> Result<RegionHandle, WorldError> {
        let map = self.map(plane).ok_or(WorldError::UnknownPlane(plane))?;
        let world = self.atlas.world().ok_or(WorldError::UnknownPlane(plane))?;
        Ok(map.region_at(x, y, world))
    }

    /// Runs the static-topology consistency audit.
    pub fn audit(&self) -> usize {
        self.atlas.check_all_regions()
    }

    // ========================================================================
    // Static Topology Edits
    // ========================================================================

    pub fn insert_static(&mut self, def: StaticRegionDef) -> Result<RegionHandle, RegionConfigError> {
        let plane = def.spawn.plane;
        let handle = self.atlas.insert_static(def)?;
        self.reactivate_plane(plane);
        Ok(handle)
    }

    pub fn delete_static(&mut self, handle: RegionHandle) -> Result<(), RegionConfigError> {
        let plane = self.atlas.delete_static(handle)?;
        self.reactivate_plane(plane);
        Ok(())
    }

    pub fn set_region_rects(
        &mut self,
        handle: RegionHandle,
        rects: Vec<GridRect>,
    ) -> Result<(), RegionConfigError> {
        let plane = self.atlas.set_rectangles(handle, rects)?;
        self.reactivate_plane(plane);
        Ok(())
    }

    fn reactivate_plane(&mut self, plane: u8) {
        if let Some(map) = self.maps.get_mut(plane as usize) {
            map.activate_regions(&self.atlas);
        }
    }

    // ========================================================================
    // Dynamic Regions
    // ========================================================================

    /// Places a new dynamic region. With `enforce` set, placement fails the
    /// moment any rectangle would overlap an existing dynamic region, and
    /// every insertion already made for this call is rolled back; the world
    /// never observes a half-placed region.
    pub fn place_dynamic(
        &mut self,
        name: impl Into<String>,
        spawn: TilePoint,
        rects: Vec<GridRect>,
        enforce: bool,
    ) -> Option<RegionHandle> {
        let plane = spawn.plane;
        self.map(plane)?;
        let handle = self.atlas.alloc_dynamic(name.into(), spawn, rects.clone());
        let map = self.maps.get_mut(plane as usize)?;
        if map.place_dynamic(handle, &rects, enforce) {
            Some(handle)
        } else {
            self.atlas.free(handle);
            None
        }
    }

    /// Removes a dynamic region from its sectors and frees its slot.
    pub fn remove_dynamic(&mut self, handle: RegionHandle) -> Result<(), RegionConfigError> {
        let region = self.atlas.get(handle).ok_or(RegionConfigError::InvalidRegion)?;
        if region.is_static() {
            return Err(RegionConfigError::InvalidRegion);
        }
        let plane = region.plane();
        if let Some(map) = self.maps.get_mut(plane as usize) {
            map.remove_dynamic(handle);
        }
        self.atlas.free(handle);
        Ok(())
    }

    /// Shifts a dynamic region by whole tiles. Returns `Ok(false)` when the
    /// new footprint is blocked; in that case the old rectangles and
    /// position are fully restored before returning.
    pub fn relocate_dynamic(
        &mut self,
        handle: RegionHandle,
        dx: i32,
        dy: i32,
    ) -> Result<bool, RegionConfigError> {
        let region = self.atlas.get(handle).ok_or(RegionConfigError::InvalidRegion)?;
        if region.is_static() {
            return Err(RegionConfigError::InvalidRegion);
        }
        let plane = region.plane();
        let old_rects = region.rects().to_vec();
        let old_spawn = region.spawn();

        let mut new_rects = Vec::with_capacity(old_rects.len());
        for rect in &old_rects {
            match rect.translated(dx, dy) {
                Some(moved) => new_rects.push(moved),
                None => return Ok(false),
            }
        }
        let Some(new_spawn) = old_spawn.translated(dx, dy) else {
            return Ok(false);
        };

        let map = self
            .maps
            .get_mut(plane as usize)
            .ok_or(RegionConfigError::InvalidRegion)?;
        map.remove_dynamic(handle);
        if map.place_dynamic(handle, &new_rects, true) {
            if let Some(region) = self.atlas.get_mut(handle) {
                region.rects = new_rects;
                region.spawn = new_spawn;
            }
            Ok(true)
        } else {
            // A failed move must never leave the region un-placed; the old
            // footprint was valid, so restore it without checks.
            map.place_dynamic(handle, &old_rects, false);
            debug!(?handle, dx, dy, "dynamic region relocation blocked, footprint restored");
            Ok(false)
        }
    }

    // ========================================================================
    // Cross-Plane Entity Transfer
    // ========================================================================

    /// Moves an entity between planes as a remove on the source map followed
    /// by an add on the destination map.
    pub fn transfer_entity(
        &mut self,
        id: EntityId,
        from_plane: u8,
        to: TilePoint,
    ) -> Result<(), WorldError> {
        if self.map(to.plane).is_none() {
            return Err(WorldError::UnknownPlane(to.plane));
        }
        let source = self
            .maps
            .get_mut(from_plane as usize)
            .ok_or(WorldError::UnknownPlane(from_plane))?;
        let original = source.remove(id)?;
        let mut moved = original.clone();
        moved.pos = to;
        let dest = self
            .maps
            .get_mut(to.plane as usize)
            .ok_or(WorldError::UnknownPlane(to.plane))?;
        match dest.add(moved) {
            Ok(()) => Ok(()),
            Err(err) => {
                // Transfers are all-or-nothing; put the entity back.
                if let Some(source) = self.maps.get_mut(from_plane as usize) {
                    let _ = source.add(original);
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(defname: &str, parent: Option<&str>, plane: u8, rects: Vec<GridRect>) -> StaticRegionDef {
        let spawn = rects
            .first()
            .map(|r| TilePoint::new(r.min_x(), r.min_y(), 0, plane))
            .unwrap_or(TilePoint::new(0, 0, 0, plane));
        StaticRegionDef {
            defname: defname.to_string(),
            name: defname.trim_start_matches("a_").to_string(),
            parent: parent.map(str::to_string),
            spawn,
            rects,
        }
    }

    #[test]
    fn hierarchy_depths_resolve_regardless_of_order() {
        let atlas = RegionAtlas::build(vec![
            def("a_town", Some("a_land"), 0, vec![GridRect::new(10, 10, 20, 20)]),
            def("a_world", None, 0, vec![]),
            def("a_land", Some("a_world"), 0, vec![GridRect::new(0, 0, 100, 100)]),
        ])
        .unwrap();

        let world = atlas.world().unwrap();
        assert_eq!(atlas.get(world).unwrap().depth(), Some(0));
        let land = atlas.find_by_defname("a_land").unwrap();
        let town = atlas.find_by_defname("a_town").unwrap();
        assert_eq!(atlas.get(land).unwrap().depth(), Some(1));
        assert_eq!(atlas.get(town).unwrap().depth(), Some(2));
    }

    #[test]
    fn missing_world_region_is_fatal() {
        let err = RegionAtlas::build(vec![def(
            "a_land",
            Some("a_world"),
            0,
            vec![GridRect::new(0, 0, 10, 10)],
        )])
        .unwrap_err();
        assert!(matches!(err, RegionConfigError::UnknownParent { .. }));

        let err = RegionAtlas::build(vec![]).unwrap_err();
        assert!(matches!(err, RegionConfigError::MissingWorldRegion));
    }

    #[test]
    fn parent_cycle_stalls_resolution() {
        // Two regions parenting each other can never reach the world region.
        let err = RegionAtlas::build(vec![
            def("a_world", None, 0, vec![]),
            def("a_first", Some("a_second"), 0, vec![GridRect::new(0, 0, 5, 5)]),
            def("a_second", Some("a_first"), 0, vec![GridRect::new(6, 6, 9, 9)]),
        ])
        .unwrap_err();
        assert!(matches!(err, RegionConfigError::HierarchyStall { unresolved: 2 }));
    }

    #[test]
    fn cross_plane_parent_is_fatal() {
        let err = RegionAtlas::build(vec![
            def("a_world", None, 0, vec![]),
            def("a_land", Some("a_world"), 0, vec![GridRect::new(0, 0, 100, 100)]),
            def("a_cave", Some("a_land"), 1, vec![GridRect::new(0, 0, 10, 10)]),
        ])
        .unwrap_err();
        assert!(matches!(err, RegionConfigError::PlaneMismatch { .. }));
    }

    #[test]
    fn duplicate_defname_is_rejected() {
        let err = RegionAtlas::build(vec![
            def("a_world", None, 0, vec![]),
            def("a_land", Some("a_world"), 0, vec![GridRect::new(0, 0, 10, 10)]),
            def("a_land", Some("a_world"), 0, vec![GridRect::new(20, 20, 30, 30)]),
        ])
        .unwrap_err();
        assert!(matches!(err, RegionConfigError::DuplicateDefname(_)));
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        let atlas = RegionAtlas::build(vec![
            def("a_world", None, 0, vec![]),
            StaticRegionDef {
                defname: "a_town".to_string(),
                name: "Greenwood".to_string(),
                parent: Some("a_world".to_string()),
                spawn: TilePoint::new(5, 5, 0, 0),
                rects: vec![GridRect::new(0, 0, 10, 10)],
            },
        ])
        .unwrap();
        let town = atlas.find_by_defname("a_town").unwrap();
        assert_eq!(atlas.find_by_name("greenwood"), Some(town));
        assert_eq!(atlas.find_by_name("GREENWOOD"), Some(town));
        assert_eq!(atlas.find_by_name("nowhere"), None);
    }

    #[test]
    fn delete_static_reparents_children() {
        let mut atlas = RegionAtlas::build(vec![
            def("a_world", None, 0, vec![]),
            def("a_land", Some("a_world"), 0, vec![GridRect::new(0, 0, 100, 100)]),
            def("a_town", Some("a_land"), 0, vec![GridRect::new(10, 10, 20, 20)]),
        ])
        .unwrap();
        let land = atlas.find_by_defname("a_land").unwrap();
        let town = atlas.find_by_defname("a_town").unwrap();

        atlas.delete_static(land).unwrap();
        assert!(atlas.find_by_defname("a_land").is_none());
        let town_region = atlas.get(town).unwrap();
        assert_eq!(town_region.parent(), atlas.world());
        assert_eq!(town_region.depth(), Some(1));
    }

    #[test]
    fn deleted_slots_are_reused_and_their_handles_dangle() {
        let mut atlas = RegionAtlas::build(vec![
            def("a_world", None, 0, vec![]),
            def("a_town", Some("a_world"), 0, vec![GridRect::new(10, 10, 20, 20)]),
        ])
        .unwrap();
        let town = atlas.find_by_defname("a_town").unwrap();
        atlas.delete_static(town).unwrap();

        // The next insert takes the freed slot, so the old handle now
        // addresses the new region.
        let port = atlas
            .insert_static(def("a_port", Some("a_world"), 0, vec![GridRect::new(30, 30, 40, 40)]))
            .unwrap();
        assert_eq!(port, town);
        assert_eq!(atlas.get(town).unwrap().defname(), Some("a_port"));
        assert!(atlas.find_by_defname("a_town").is_none());
    }

    #[test]
    fn world_region_cannot_be_deleted() {
        let mut atlas = RegionAtlas::build(vec![def("a_world", None, 0, vec![])]).unwrap();
        let world = atlas.world().unwrap();
        assert!(matches!(
            atlas.delete_static(world),
            Err(RegionConfigError::WorldRegionDelete)
        ));
    }

    #[test]
    fn audit_reports_containment_and_overlap_problems() {
        let atlas = RegionAtlas::build(vec![
            def("a_world", None, 0, vec![]),
            def("a_land", Some("a_world"), 0, vec![GridRect::new(0, 0, 50, 50)]),
            // Sticks out of its parent.
            def("a_edge", Some("a_land"), 0, vec![GridRect::new(40, 40, 60, 60)]),
            // Partially overlaps its same-depth sibling.
            def("a_half", Some("a_land"), 0, vec![GridRect::new(50, 50, 70, 70)]),
        ])
        .unwrap();
        assert!(atlas.check_all_regions() >= 2);
    }
}
