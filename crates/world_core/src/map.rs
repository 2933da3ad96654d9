//! Per-plane spatial index.
//!
//! One `Map` exists per world plane: a pre-sized grid of lazily created
//! [`Sector`]s, the authoritative entity table for the plane, and the
//! per-plane terrain store. World coordinates convert to sector coordinates
//! by an arithmetic right shift; sectors are created on first access and
//! never removed.
//!
//! Mutating operations validate coordinates against the plane bounds and
//! reject out-of-bounds input outright; read-only helpers that resolve a
//! nearest sector clamp instead, for robustness.

use crate::region::{RegionAtlas, RegionHandle};
use crate::sector::{MultiComponent, RegionRect, Sector};
use crate::terrain::{StaticItem, TerrainSource, TerrainStore};
use crate::{SECTOR_AND, SECTOR_FACTOR};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use world_types::{EntityId, EntityKind, GridRect, TileCatalog, TilePoint, WorldError};

/// Tile dimensions of one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneSpec {
    pub width: u16,
    pub height: u16,
}

/// Authoritative record of one live entity on a plane. The owning sector's
/// membership lists hold the id; the data lives here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub id: EntityId,
    pub pos: TilePoint,
    pub model: u16,
    pub kind: EntityKind,
    pub is_player: bool,
    pub disconnected: bool,
}

/// Spatial index for one world plane.
pub struct Map {
    plane: u8,
    width: u16,
    height: u16,
    sectors_x: u16,
    sectors_y: u16,
    sectors: Vec<Option<Box<Sector>>>,
    entities: HashMap<EntityId, EntityRecord>,
    terrain: TerrainStore,
    catalog: Arc<dyn TileCatalog>,
}

impl Map {
    pub fn new(
        plane: u8,
        spec: PlaneSpec,
        catalog: Arc<dyn TileCatalog>,
        source: Arc<dyn TerrainSource>,
    ) -> Self {
        let sectors_x = spec.width.div_ceil(1 << SECTOR_FACTOR);
        let sectors_y = spec.height.div_ceil(1 << SECTOR_FACTOR);
        let mut sectors = Vec::new();
        sectors.resize_with(usize::from(sectors_x) * usize::from(sectors_y), || None);
        debug!(plane, width = spec.width, height = spec.height, sectors_x, sectors_y, "map created");
        Self {
            plane,
            width: spec.width,
            height: spec.height,
            sectors_x,
            sectors_y,
            sectors,
            entities: HashMap::new(),
            terrain: TerrainStore::new(plane, source),
            catalog,
        }
    }

    pub fn plane(&self) -> u8 {
        self.plane
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn is_valid_pos(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    pub(crate) fn catalog(&self) -> &dyn TileCatalog {
        &*self.catalog
    }

    fn check_pos(&self, x: u16, y: u16) -> Result<(), WorldError> {
        if self.is_valid_pos(x, y) {
            Ok(())
        } else {
            Err(WorldError::PositionOutOfBounds {
                x: u32::from(x),
                y: u32::from(y),
                plane: self.plane,
            })
        }
    }

    // ========================================================================
    // Sector Access
    // ========================================================================

    fn sector_index(&self, sx: u16, sy: u16) -> usize {
        usize::from(sy) * usize::from(self.sectors_x) + usize::from(sx)
    }

    /// Sector coordinates of a tile, clamped into the sector grid.
    fn sector_coords_clamped(&self, x: u16, y: u16) -> (u16, u16) {
        let sx = x.min(self.width - 1) >> SECTOR_FACTOR;
        let sy = y.min(self.height - 1) >> SECTOR_FACTOR;
        (sx, sy)
    }

    pub(crate) fn sector_at(&self, sx: u16, sy: u16) -> Option<&Sector> {
        self.sectors
            .get(self.sector_index(sx, sy))
            .and_then(|slot| slot.as_deref())
    }

    pub(crate) fn sector_mut(&mut self, sx: u16, sy: u16) -> &mut Sector {
        let idx = self.sector_index(sx, sy);
        let slot = &mut self.sectors[idx];
        if slot.is_none() {
            trace!(plane = self.plane, sx, sy, "sector created");
            *slot = Some(Box::new(Sector::new(sx, sy)));
        }
        slot.as_deref_mut().unwrap()
    }

    fn sectors_overlapping(&self, rect: GridRect) -> impl Iterator<Item = &Sector> + '_ {
        let (sx1, sy1) = self.sector_coords_clamped(rect.min_x(), rect.min_y());
        let (sx2, sy2) = self.sector_coords_clamped(rect.max_x(), rect.max_y());
        (sy1..=sy2).flat_map(move |sy| (sx1..=sx2).filter_map(move |sx| self.sector_at(sx, sy)))
    }

    /// Sector-grid coordinate span overlapped by a tile rectangle.
    fn sector_span(&self, rect: &GridRect) -> (u16, u16, u16, u16) {
        let (sx1, sy1) = self.sector_coords_clamped(rect.min_x(), rect.min_y());
        let (sx2, sy2) = self.sector_coords_clamped(rect.max_x(), rect.max_y());
        (sx1, sy1, sx2, sy2)
    }

    // ========================================================================
    // Entity Lifecycle
    // ========================================================================

    /// Registers an entity at its position. The position must lie inside
    /// this plane; out-of-bounds input is a contract violation, never
    /// clamped.
    pub fn add(&mut self, record: EntityRecord) -> Result<(), WorldError> {
        self.check_pos(record.pos.x, record.pos.y)?;
        if record.pos.plane != self.plane {
            return Err(WorldError::UnknownPlane(record.pos.plane));
        }
        if self.entities.contains_key(&record.id) {
            return Err(WorldError::DuplicateEntity(record.id));
        }
        let (sx, sy) = self.sector_coords_clamped(record.pos.x, record.pos.y);
        let sector = self.sector_mut(sx, sy);
        if record.disconnected {
            sector.add_disconnected(record.id);
        } else {
            sector.add_thing(record.id, record.is_player);
        }
        self.entities.insert(record.id, record);
        Ok(())
    }

    /// Removes an entity and returns its record.
    pub fn remove(&mut self, id: EntityId) -> Result<EntityRecord, WorldError> {
        let record = self.entities.remove(&id).ok_or(WorldError::UnknownEntity(id))?;
        let (sx, sy) = self.sector_coords_clamped(record.pos.x, record.pos.y);
        let sector = self.sector_mut(sx, sy);
        if record.disconnected {
            sector.remove_disconnected(id);
        } else {
            sector.remove_thing(id, record.is_player);
        }
        Ok(record)
    }

    /// Moves an entity to a new position on this plane.
    ///
    /// Sector handoff happens only when the move actually crosses a sector
    /// boundary, detected with the mask comparison instead of two shifts; at
    /// no observable point is the entity in neither or both sectors.
    pub fn relocate(&mut self, id: EntityId, new_pos: TilePoint) -> Result<(), WorldError> {
        self.check_pos(new_pos.x, new_pos.y)?;
        if new_pos.plane != self.plane {
            return Err(WorldError::UnknownPlane(new_pos.plane));
        }
        let old_pos = self
            .entities
            .get(&id)
            .ok_or(WorldError::UnknownEntity(id))?
            .pos;

        let crosses = (old_pos.x & SECTOR_AND) != (new_pos.x & SECTOR_AND)
            || (old_pos.y & SECTOR_AND) != (new_pos.y & SECTOR_AND);
        if crosses {
            let (record_disconnected, is_player) = {
                let record = &self.entities[&id];
                (record.disconnected, record.is_player)
            };
            let (old_sx, old_sy) = self.sector_coords_clamped(old_pos.x, old_pos.y);
            let (new_sx, new_sy) = self.sector_coords_clamped(new_pos.x, new_pos.y);
            let old_sector = self.sector_mut(old_sx, old_sy);
            if record_disconnected {
                old_sector.remove_disconnected(id);
            } else {
                old_sector.remove_thing(id, is_player);
            }
            let new_sector = self.sector_mut(new_sx, new_sy);
            if record_disconnected {
                new_sector.add_disconnected(id);
            } else {
                new_sector.add_thing(id, is_player);
            }
        }
        if let Some(record) = self.entities.get_mut(&id) {
            record.pos = new_pos;
        }
        Ok(())
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    /// Moves an entity from the on-ground collection to the disconnected
    /// one without changing its position. Disconnected entities are
    /// invisible to every query except the dedicated disconnected query.
    pub fn set_disconnected(&mut self, id: EntityId) -> Result<(), WorldError> {
        let record = self.entities.get(&id).ok_or(WorldError::UnknownEntity(id))?;
        if record.disconnected {
            return Ok(());
        }
        let (pos, is_player) = (record.pos, record.is_player);
        let (sx, sy) = self.sector_coords_clamped(pos.x, pos.y);
        let sector = self.sector_mut(sx, sy);
        sector.remove_thing(id, is_player);
        sector.add_disconnected(id);
        if let Some(record) = self.entities.get_mut(&id) {
            record.disconnected = true;
        }
        Ok(())
    }

    /// Returns a disconnected entity to the live collections.
    pub fn set_reconnected(&mut self, id: EntityId) -> Result<(), WorldError> {
        let record = self.entities.get(&id).ok_or(WorldError::UnknownEntity(id))?;
        if !record.disconnected {
            return Ok(());
        }
        let (pos, is_player) = (record.pos, record.is_player);
        let (sx, sy) = self.sector_coords_clamped(pos.x, pos.y);
        let sector = self.sector_mut(sx, sy);
        sector.remove_disconnected(id);
        sector.add_thing(id, is_player);
        if let Some(record) = self.entities.get_mut(&id) {
            record.disconnected = false;
        }
        Ok(())
    }

    // ========================================================================
    // Multi-Structure Components
    // ========================================================================

    /// Adds one component of a composite structure to its covering sector,
    /// independent of the owning entity's own membership.
    pub fn add_multi_component(&mut self, component: MultiComponent) -> Result<(), WorldError> {
        self.check_pos(component.x, component.y)?;
        let (sx, sy) = self.sector_coords_clamped(component.x, component.y);
        self.sector_mut(sx, sy).add_component(component);
        Ok(())
    }

    /// Removes the component matching owner and exact position.
    pub fn remove_multi_component(&mut self, owner: EntityId, x: u16, y: u16, z: i8) -> bool {
        if !self.is_valid_pos(x, y) {
            return false;
        }
        let (sx, sy) = self.sector_coords_clamped(x, y);
        self.sector_mut(sx, sy).remove_component(owner, x, y, z)
    }

    // ========================================================================
    // Range Queries
    // ========================================================================
    //
    // All range queries are live lazy views over sector collections, to be
    // consumed before the next mutation of this map.

    /// On-ground entities whose position lies inside the rectangle.
    pub fn things_in_rect(&self, rect: GridRect) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.sectors_overlapping(rect)
            .flat_map(|sector| sector.things().iter())
            .filter_map(move |id| self.entities.get(id))
            .filter(move |e| rect.contains(e.pos.x, e.pos.y))
    }

    /// Connected players inside the rectangle.
    pub fn players_in_rect(&self, rect: GridRect) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.sectors_overlapping(rect)
            .flat_map(|sector| sector.players().iter())
            .filter_map(move |id| self.entities.get(id))
            .filter(move |e| rect.contains(e.pos.x, e.pos.y))
    }

    /// Disconnected entities inside the rectangle.
    pub fn disconnected_in_rect(&self, rect: GridRect) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.sectors_overlapping(rect)
            .flat_map(|sector| sector.disconnected().iter())
            .filter_map(move |id| self.entities.get(id))
            .filter(move |e| rect.contains(e.pos.x, e.pos.y))
    }

    /// Multi-structure components inside the rectangle.
    pub fn components_in_rect(&self, rect: GridRect) -> impl Iterator<Item = &MultiComponent> + '_ {
        self.sectors_overlapping(rect)
            .flat_map(|sector| sector.components().iter())
            .filter(move |c| rect.contains(c.x, c.y))
    }

    /// Fixed static objects inside the rectangle, from the terrain cache.
    pub fn statics_in_rect(&self, rect: GridRect) -> Vec<StaticItem> {
        let (sx1, sy1, sx2, sy2) = self.sector_span(&rect);
        let mut out = Vec::new();
        for sy in sy1..=sy2 {
            for sx in sx1..=sx2 {
                let terrain = self.terrain.sector(sx, sy);
                out.extend(
                    terrain
                        .statics()
                        .iter()
                        .filter(|s| rect.contains(s.x, s.y))
                        .copied(),
                );
            }
        }
        out
    }

    /// Fixed static objects on one tile column.
    pub fn statics_at(&self, x: u16, y: u16) -> Vec<StaticItem> {
        let mut out = Vec::new();
        self.collect_statics_at(x, y, &mut out);
        out
    }

    pub(crate) fn collect_statics_at(&self, x: u16, y: u16, out: &mut Vec<StaticItem>) {
        let (sx, sy) = self.sector_coords_clamped(x, y);
        let terrain = self.terrain.sector(sx, sy);
        out.extend(terrain.statics().iter().filter(|s| s.x == x && s.y == y).copied());
    }

    // ========================================================================
    // Tile Queries
    // ========================================================================

    /// Terrain tile id at a tile. Out-of-bounds coordinates are rejected.
    pub fn tile_id(&self, x: u16, y: u16) -> Result<u16, WorldError> {
        self.check_pos(x, y)?;
        let (sx, sy) = self.sector_coords_clamped(x, y);
        Ok(self.terrain.sector(sx, sy).tile_id(x & !SECTOR_AND, y & !SECTOR_AND))
    }

    /// Terrain height at a tile. Out-of-bounds coordinates are rejected.
    pub fn tile_height(&self, x: u16, y: u16) -> Result<i8, WorldError> {
        self.check_pos(x, y)?;
        let (sx, sy) = self.sector_coords_clamped(x, y);
        Ok(self.terrain.sector(sx, sy).height(x & !SECTOR_AND, y & !SECTOR_AND))
    }

    /// Terrain height with clamping; used where a nearest value beats a
    /// failure, such as corner sampling at the map edge.
    pub(crate) fn tile_height_clamped(&self, x: i32, y: i32) -> i8 {
        let x = x.clamp(0, i32::from(self.width) - 1) as u16;
        let y = y.clamp(0, i32::from(self.height) - 1) as u16;
        let (sx, sy) = self.sector_coords_clamped(x, y);
        self.terrain.sector(sx, sy).height(x & !SECTOR_AND, y & !SECTOR_AND)
    }

    // ========================================================================
    // Region Integration
    // ========================================================================

    /// Innermost region at a tile, or the given world region when no
    /// fragment matches.
    pub fn region_at(&self, x: u16, y: u16, world: RegionHandle) -> RegionHandle {
        let (sx, sy) = self.sector_coords_clamped(x, y);
        self.sector_at(sx, sy)
            .and_then(|sector| sector.region_at(x, y))
            .unwrap_or(world)
    }

    /// Re-distributes the atlas's static region rectangles into this plane's
    /// sectors, replacing whatever was there. Rectangles are clipped to the
    /// sector grid; each receiving sector's list is sorted by (hierarchy
    /// depth ascending, overlap area ascending) and frozen.
    pub fn activate_regions(&mut self, atlas: &RegionAtlas) {
        for slot in self.sectors.iter_mut().flatten() {
            slot.clear_region_rects(false);
        }

        let world = atlas.world();
        let mut pending: HashMap<(u16, u16), Vec<(u32, RegionRect)>> = HashMap::new();
        let mut fragments = 0usize;
        for (handle, region) in atlas.iter_static() {
            if Some(handle) == world || region.plane() != self.plane {
                continue;
            }
            let depth = region.depth().unwrap_or(0);
            for rect in region.rects() {
                let (sx1, sy1, sx2, sy2) = self.sector_span(rect);
                for sy in sy1..=sy2 {
                    for sx in sx1..=sx2 {
                        pending
                            .entry((sx, sy))
                            .or_default()
                            .push((depth, RegionRect { rect: *rect, region: handle }));
                        fragments += 1;
                    }
                }
            }
        }

        for ((sx, sy), mut list) in pending {
            let sector_rect = GridRect::new(
                sx << SECTOR_FACTOR,
                sy << SECTOR_FACTOR,
                (sx << SECTOR_FACTOR) + !SECTOR_AND,
                (sy << SECTOR_FACTOR) + !SECTOR_AND,
            );
            list.sort_by_key(|(depth, rr)| {
                let area = rr
                    .rect
                    .intersection(&sector_rect)
                    .map_or(0, |i| i.tile_count());
                (*depth, area)
            });
            let rects = list.into_iter().map(|(_, rr)| rr).collect();
            self.sector_mut(sx, sy).set_static_rects(rects);
        }
        debug!(plane = self.plane, fragments, "static regions activated");
    }

    /// Drops region rectangles from every sector; with `dynamics_too`, the
    /// dynamic overlays as well.
    pub fn clear_regions(&mut self, dynamics_too: bool) {
        for slot in self.sectors.iter_mut().flatten() {
            slot.clear_region_rects(dynamics_too);
        }
    }

    /// Inserts a dynamic region's rectangles into every overlapped sector.
    ///
    /// With `enforce` set, the whole placement fails the moment any
    /// rectangle intersects an already-present dynamic rectangle, and every
    /// insertion performed so far for this call is rolled back.
    pub(crate) fn place_dynamic(
        &mut self,
        handle: RegionHandle,
        rects: &[GridRect],
        enforce: bool,
    ) -> bool {
        for rect in rects {
            let (sx1, sy1, sx2, sy2) = self.sector_span(rect);
            for sy in sy1..=sy2 {
                for sx in sx1..=sx2 {
                    let rr = RegionRect { rect: *rect, region: handle };
                    if !self.sector_mut(sx, sy).try_add_dynamic_rect(rr, enforce) {
                        debug!(plane = self.plane, %rect, "dynamic region placement blocked, rolling back");
                        self.remove_dynamic(handle);
                        return false;
                    }
                }
            }
        }
        true
    }

    /// Removes every rectangle of a dynamic region from every sector.
    pub(crate) fn remove_dynamic(&mut self, handle: RegionHandle) {
        for slot in self.sectors.iter_mut().flatten() {
            slot.remove_dynamic_rects_of(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{FlatTerrain, SectorData};
    use world_types::{ModelInfo, TileFlags};

    struct PlainCatalog;

    impl TileCatalog for PlainCatalog {
        fn land_flags(&self, _tile_id: u16) -> TileFlags {
            TileFlags::NONE
        }

        fn model(&self, _model_id: u16) -> ModelInfo {
            ModelInfo::new(TileFlags::NONE, 0)
        }
    }

    /// Flat terrain with one static object on every sector's origin tile.
    struct CornerStatics;

    impl TerrainSource for CornerStatics {
        fn load(&self, sx: u16, sy: u16, _plane: u8) -> Result<SectorData, world_types::TerrainError> {
            let mut data = FlatTerrain { tile: 1, height: 0 }.load(sx, sy, 0)?;
            data.statics.push(StaticItem {
                model: 100,
                x: sx << SECTOR_FACTOR,
                y: sy << SECTOR_FACTOR,
                z: 0,
            });
            Ok(data)
        }
    }

    fn test_map() -> Map {
        Map::new(
            0,
            PlaneSpec { width: 64, height: 64 },
            Arc::new(PlainCatalog),
            Arc::new(CornerStatics),
        )
    }

    fn record(pos: TilePoint, is_player: bool) -> EntityRecord {
        EntityRecord {
            id: EntityId::new(),
            pos,
            model: 0,
            kind: EntityKind::Character,
            is_player,
            disconnected: false,
        }
    }

    fn at(x: u16, y: u16) -> TilePoint {
        TilePoint { x, y, z: 0, plane: 0 }
    }

    #[test]
    fn add_rejects_bad_input() {
        let mut map = test_map();
        let rec = record(at(5, 5), false);
        map.add(rec.clone()).unwrap();
        assert!(matches!(map.add(rec.clone()), Err(WorldError::DuplicateEntity(_))));

        let oob = record(at(64, 0), false);
        assert!(matches!(map.add(oob), Err(WorldError::PositionOutOfBounds { .. })));

        let mut wrong_plane = record(at(1, 1), false);
        wrong_plane.pos.plane = 3;
        assert!(matches!(map.add(wrong_plane), Err(WorldError::UnknownPlane(3))));
    }

    #[test]
    fn relocate_hands_off_between_sectors() {
        let mut map = test_map();
        let rec = record(at(5, 5), true);
        let id = rec.id;
        map.add(rec).unwrap();

        // Within the same sector: membership list untouched.
        map.relocate(id, at(10, 10)).unwrap();
        assert_eq!(map.sector_at(0, 0).unwrap().things(), &[id]);

        // Across a sector boundary: exactly one sector holds the id.
        map.relocate(id, at(40, 10)).unwrap();
        assert!(map.sector_at(0, 0).unwrap().things().is_empty());
        assert_eq!(map.sector_at(2, 0).unwrap().things(), &[id]);
        assert_eq!(map.sector_at(2, 0).unwrap().players(), &[id]);
        assert_eq!(map.entity(id).unwrap().pos, at(40, 10));
    }

    #[test]
    fn range_queries_report_each_entity_once() {
        let mut map = test_map();
        let a = record(at(14, 14), true);
        let b = record(at(17, 17), false);
        let outside = record(at(40, 40), false);
        let (ida, idb) = (a.id, b.id);
        map.add(a).unwrap();
        map.add(b).unwrap();
        map.add(outside).unwrap();

        // Rect spans four sectors; each entity shows up exactly once.
        let rect = GridRect::new(10, 10, 20, 20);
        let mut hits: Vec<_> = map.things_in_rect(rect).map(|e| e.id).collect();
        hits.sort_by_key(|id| id.0);
        let mut want = vec![ida, idb];
        want.sort_by_key(|id| id.0);
        assert_eq!(hits, want);

        let players: Vec<_> = map.players_in_rect(rect).map(|e| e.id).collect();
        assert_eq!(players, vec![ida]);
    }

    #[test]
    fn disconnect_hides_from_live_queries() {
        let mut map = test_map();
        let rec = record(at(8, 8), true);
        let id = rec.id;
        map.add(rec).unwrap();
        let rect = GridRect::new(0, 0, 15, 15);

        map.set_disconnected(id).unwrap();
        map.set_disconnected(id).unwrap(); // idempotent
        assert_eq!(map.things_in_rect(rect).count(), 0);
        assert_eq!(map.players_in_rect(rect).count(), 0);
        let gone: Vec<_> = map.disconnected_in_rect(rect).map(|e| e.id).collect();
        assert_eq!(gone, vec![id]);

        map.set_reconnected(id).unwrap();
        assert_eq!(map.things_in_rect(rect).count(), 1);
        assert_eq!(map.disconnected_in_rect(rect).count(), 0);
    }

    #[test]
    fn remove_returns_the_record() {
        let mut map = test_map();
        let rec = record(at(3, 3), false);
        let id = rec.id;
        map.add(rec.clone()).unwrap();
        assert_eq!(map.remove(id).unwrap(), rec);
        assert!(matches!(map.remove(id), Err(WorldError::UnknownEntity(_))));
        assert!(map.sector_at(0, 0).unwrap().things().is_empty());
    }

    #[test]
    fn statics_queries_match_exact_tiles() {
        let map = test_map();
        // CornerStatics puts one static at each sector origin.
        assert_eq!(map.statics_at(16, 16).len(), 1);
        assert_eq!(map.statics_at(17, 16).len(), 0);

        let found = map.statics_in_rect(GridRect::new(0, 0, 31, 31));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn components_live_in_their_own_sector() {
        let mut map = test_map();
        let owner = EntityId::new();
        map.add_multi_component(MultiComponent { owner, model: 9, x: 30, y: 2, z: 0 }).unwrap();

        let hits: Vec<_> = map.components_in_rect(GridRect::new(28, 0, 31, 4)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, owner);

        assert!(!map.remove_multi_component(owner, 30, 2, 1));
        assert!(map.remove_multi_component(owner, 30, 2, 0));
        assert_eq!(map.components_in_rect(GridRect::new(0, 0, 63, 63)).count(), 0);
    }

    #[test]
    fn tile_queries_respect_bounds() {
        let map = test_map();
        assert_eq!(map.tile_id(0, 0).unwrap(), 1);
        assert_eq!(map.tile_height(63, 63).unwrap(), 0);
        assert!(map.tile_id(64, 0).is_err());
        assert_eq!(map.tile_height_clamped(-5, 200), 0);
    }
}
