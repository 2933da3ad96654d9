//! The atomic spatial bucket.
//!
//! A sector owns the live entities currently positioned inside its tile
//! range, split into on-ground things, players (a fast-iteration subset),
//! disconnected entities, and multi-structure components. It also owns the
//! region-rectangle fragments overlapping it: a frozen, sorted array of
//! static fragments replaced wholesale on region activation, and a mutable
//! list of dynamic fragments inserted and removed individually.
//!
//! All mutation is routed through the owning [`Map`](crate::Map); nothing
//! outside this crate holds a reference into a sector's collections.

use crate::region::RegionHandle;
use crate::{SECTOR_FACTOR, SECTOR_WIDTH};
use world_types::{EntityId, GridRect};

/// One tile-sized piece of a larger placed composite structure. Components
/// have their own absolute position and sector membership, independent of
/// the owning entity's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiComponent {
    pub owner: EntityId,
    pub model: u16,
    pub x: u16,
    pub y: u16,
    pub z: i8,
}

/// One region rectangle fragment distributed to a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRect {
    pub rect: GridRect,
    pub region: RegionHandle,
}

/// Spatial bucket for one `SECTOR_WIDTH` x `SECTOR_WIDTH` tile square.
#[derive(Debug)]
pub struct Sector {
    sx: u16,
    sy: u16,
    things: Vec<EntityId>,
    players: Vec<EntityId>,
    disconnected: Vec<EntityId>,
    components: Vec<MultiComponent>,
    /// Sorted by ascending hierarchy depth, then ascending overlap area;
    /// queried from the tail so the most specific region wins.
    static_rects: Box<[RegionRect]>,
    /// Most recently placed first.
    dynamic_rects: Vec<RegionRect>,
}

impl Sector {
    pub fn new(sx: u16, sy: u16) -> Self {
        Self {
            sx,
            sy,
            things: Vec::new(),
            players: Vec::new(),
            disconnected: Vec::new(),
            components: Vec::new(),
            static_rects: Box::new([]),
            dynamic_rects: Vec::new(),
        }
    }

    pub fn sx(&self) -> u16 {
        self.sx
    }

    pub fn sy(&self) -> u16 {
        self.sy
    }

    /// World-tile rectangle covered by this sector.
    pub fn tile_rect(&self) -> GridRect {
        let min_x = self.sx << SECTOR_FACTOR;
        let min_y = self.sy << SECTOR_FACTOR;
        GridRect::new(min_x, min_y, min_x + SECTOR_WIDTH - 1, min_y + SECTOR_WIDTH - 1)
    }

    // ========================================================================
    // Entity Collections
    // ========================================================================

    pub fn things(&self) -> &[EntityId] {
        &self.things
    }

    pub fn players(&self) -> &[EntityId] {
        &self.players
    }

    pub fn disconnected(&self) -> &[EntityId] {
        &self.disconnected
    }

    pub fn components(&self) -> &[MultiComponent] {
        &self.components
    }

    pub(crate) fn add_thing(&mut self, id: EntityId, is_player: bool) {
        self.things.push(id);
        if is_player {
            self.players.push(id);
        }
    }

    pub(crate) fn remove_thing(&mut self, id: EntityId, is_player: bool) -> bool {
        let removed = remove_id(&mut self.things, id);
        if is_player {
            remove_id(&mut self.players, id);
        }
        removed
    }

    pub(crate) fn add_disconnected(&mut self, id: EntityId) {
        self.disconnected.push(id);
    }

    pub(crate) fn remove_disconnected(&mut self, id: EntityId) -> bool {
        remove_id(&mut self.disconnected, id)
    }

    pub(crate) fn add_component(&mut self, component: MultiComponent) {
        self.components.push(component);
    }

    pub(crate) fn remove_component(&mut self, owner: EntityId, x: u16, y: u16, z: i8) -> bool {
        if let Some(idx) = self
            .components
            .iter()
            .position(|c| c.owner == owner && c.x == x && c.y == y && c.z == z)
        {
            self.components.swap_remove(idx);
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Region Rectangles
    // ========================================================================

    /// The innermost region containing the tile, or `None` when only the
    /// world region applies.
    ///
    /// Dynamic fragments are tested first in insertion order; static
    /// fragments are scanned from the tail of the sorted array backward so
    /// the deepest matching region wins. Callers rely on this ordering.
    pub fn region_at(&self, x: u16, y: u16) -> Option<RegionHandle> {
        for rr in &self.dynamic_rects {
            if rr.rect.contains(x, y) {
                return Some(rr.region);
            }
        }
        for rr in self.static_rects.iter().rev() {
            if rr.rect.contains(x, y) {
                return Some(rr.region);
            }
        }
        None
    }

    pub fn static_rects(&self) -> &[RegionRect] {
        &self.static_rects
    }

    pub fn dynamic_rects(&self) -> &[RegionRect] {
        &self.dynamic_rects
    }

    /// Freezes the static fragment array. The caller sorts by (hierarchy
    /// depth ascending, overlap area ascending) before handing it over.
    pub(crate) fn set_static_rects(&mut self, rects: Vec<RegionRect>) {
        self.static_rects = rects.into_boxed_slice();
    }

    pub(crate) fn clear_region_rects(&mut self, dynamics_too: bool) {
        self.static_rects = Box::new([]);
        if dynamics_too {
            self.dynamic_rects.clear();
        }
    }

    /// Inserts a dynamic fragment at the front of the list. With `enforce`
    /// set, the insert is refused when the rectangle intersects any dynamic
    /// fragment already present; dynamic regions may never overlap each
    /// other, though they freely overlap static ones.
    pub(crate) fn try_add_dynamic_rect(&mut self, rr: RegionRect, enforce: bool) -> bool {
        if enforce && self.dynamic_rects.iter().any(|existing| existing.rect.intersects(&rr.rect)) {
            return false;
        }
        self.dynamic_rects.insert(0, rr);
        true
    }

    /// Removes every dynamic fragment belonging to the given region.
    pub(crate) fn remove_dynamic_rects_of(&mut self, region: RegionHandle) {
        self.dynamic_rects.retain(|rr| rr.region != region);
    }
}

fn remove_id(list: &mut Vec<EntityId>, id: EntityId) -> bool {
    if let Some(idx) = list.iter().position(|&e| e == id) {
        list.swap_remove(idx);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(n: u32) -> RegionHandle {
        RegionHandle::from_index(n as usize)
    }

    #[test]
    fn tile_rect_covers_sector_square() {
        let s = Sector::new(2, 3);
        let r = s.tile_rect();
        assert_eq!(r, GridRect::new(32, 48, 47, 63));
    }

    #[test]
    fn player_membership_tracks_thing_membership() {
        let mut s = Sector::new(0, 0);
        let player = EntityId::new();
        let npc = EntityId::new();
        s.add_thing(player, true);
        s.add_thing(npc, false);
        assert_eq!(s.things().len(), 2);
        assert_eq!(s.players(), &[player]);

        assert!(s.remove_thing(player, true));
        assert!(s.players().is_empty());
        assert_eq!(s.things(), &[npc]);
    }

    #[test]
    fn component_removal_matches_exact_position() {
        let mut s = Sector::new(0, 0);
        let owner = EntityId::new();
        s.add_component(MultiComponent { owner, model: 10, x: 3, y: 4, z: 0 });
        assert!(!s.remove_component(owner, 3, 4, 1));
        assert!(s.remove_component(owner, 3, 4, 0));
        assert!(s.components().is_empty());
    }

    #[test]
    fn region_resolution_prefers_dynamic_then_deepest_static() {
        let mut s = Sector::new(0, 0);
        // Static fragments arrive sorted shallow-to-deep.
        s.set_static_rects(vec![
            RegionRect { rect: GridRect::new(0, 0, 15, 15), region: handle(1) },
            RegionRect { rect: GridRect::new(4, 4, 10, 10), region: handle(2) },
        ]);
        assert_eq!(s.region_at(5, 5), Some(handle(2)));
        assert_eq!(s.region_at(1, 1), Some(handle(1)));

        assert!(s.try_add_dynamic_rect(
            RegionRect { rect: GridRect::new(5, 5, 6, 6), region: handle(3) },
            true
        ));
        assert_eq!(s.region_at(5, 5), Some(handle(3)));

        s.remove_dynamic_rects_of(handle(3));
        assert_eq!(s.region_at(5, 5), Some(handle(2)));
    }

    #[test]
    fn dynamic_rects_refuse_overlap_when_enforced() {
        let mut s = Sector::new(0, 0);
        assert!(s.try_add_dynamic_rect(
            RegionRect { rect: GridRect::new(0, 0, 5, 5), region: handle(1) },
            true
        ));
        assert!(!s.try_add_dynamic_rect(
            RegionRect { rect: GridRect::new(5, 5, 8, 8), region: handle(2) },
            true
        ));
        // Without enforcement the same insert goes through.
        assert!(s.try_add_dynamic_rect(
            RegionRect { rect: GridRect::new(5, 5, 8, 8), region: handle(2) },
            false
        ));
    }
}
