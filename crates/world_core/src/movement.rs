//! Single-step movement validation and standing-room checks.
//!
//! Given a start point, a compass direction, and a capability profile, the
//! validator decides whether the step is legal and at what elevation the
//! mover lands. It consults the terrain cache for land heights and static
//! objects and the sector collections for loose items.
//!
//! The comparison directions in the candidate scan (tie-break preferring the
//! lower surface, the bridge special case, the land skip condition) are
//! load-bearing; changing a strictness or sign changes which surfaces are
//! reachable.

use crate::map::Map;
use crate::terrain::StaticItem;
use world_types::{Direction, EntityKind, ModelInfo, TileFlags, TilePoint};

/// Fixed standing height of a mover, in elevation units; the headroom
/// interval tested against every occupant.
pub const PERSON_HEIGHT: i32 = 16;

/// Capability profile of a mover.
#[derive(Debug, Clone, Copy)]
pub struct MoveProfile {
    pub can_cross_land: bool,
    pub can_swim: bool,
    pub can_cross_lava: bool,
    pub can_fly: bool,
    pub ignore_doors: bool,
    /// Maximum elevation gain permitted in a single step.
    pub step_height: i32,
}

impl MoveProfile {
    /// Ordinary walker: land only, two units of climb.
    pub fn walker() -> Self {
        Self {
            can_cross_land: true,
            can_swim: false,
            can_cross_lava: false,
            can_fly: false,
            ignore_doors: false,
            step_height: 2,
        }
    }
}

/// Outcome of one step check. On failure the destination elevation is the
/// mover's start elevation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub ok: bool,
    pub x: u16,
    pub y: u16,
    pub z: i8,
}

/// One loose item gathered for a cell: its elevation plus the catalog's
/// footprint description.
#[derive(Debug, Clone, Copy)]
struct CellItem {
    z: i32,
    info: ModelInfo,
}

/// Reusable scratch buffers for the validator. Fully cleared on every call,
/// so a retained instance and a fresh one behave identically.
#[derive(Debug, Default)]
pub struct MoveScratch {
    start: Vec<CellItem>,
    forward: Vec<CellItem>,
    left: Vec<CellItem>,
    right: Vec<CellItem>,
    statics: Vec<StaticItem>,
}

impl MoveScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        self.start.clear();
        self.forward.clear();
        self.left.clear();
        self.right.clear();
        self.statics.clear();
    }
}

impl Map {
    // ========================================================================
    // Step Check
    // ========================================================================

    /// Validates one step from `from` in direction `dir`.
    ///
    /// Diagonal steps additionally require both flanking orthogonal cells to
    /// independently pass the forward-cell test; cutting across a diagonal
    /// wall corner is not permitted. With `hack_move` set the step always
    /// succeeds, but the elevation still comes from the best candidate the
    /// scan found, or the start elevation if none existed.
    pub fn check_step(
        &self,
        from: TilePoint,
        dir: Direction,
        profile: &MoveProfile,
        hack_move: bool,
        scratch: &mut MoveScratch,
    ) -> StepResult {
        scratch.clear();

        let x_start = i32::from(from.x);
        let y_start = i32::from(from.y);
        let (dx, dy) = dir.offset();
        let x_forward = x_start + dx;
        let y_forward = y_start + dy;
        let check_diagonals = dir.is_diagonal();
        let (lx, ly) = dir.rotated_left().offset();
        let (rx, ry) = dir.rotated_right().offset();
        let x_left = x_start + lx;
        let y_left = y_start + ly;
        let x_right = x_start + rx;
        let y_right = y_start + ry;

        if x_forward < 0
            || y_forward < 0
            || x_forward >= i32::from(self.width())
            || y_forward >= i32::from(self.height())
        {
            return StepResult { ok: false, x: from.x, y: from.y, z: from.z };
        }

        // Items only matter when they carry flags the profile cares about.
        let mut req_flags = TileFlags::BLOCKING;
        if profile.can_swim {
            req_flags |= TileFlags::WET;
        }

        let mut cells: [(i32, i32, &mut Vec<CellItem>); 4] = [
            (x_start, y_start, &mut scratch.start),
            (x_forward, y_forward, &mut scratch.forward),
            (x_left, y_left, &mut scratch.left),
            (x_right, y_right, &mut scratch.right),
        ];
        let cell_count = if check_diagonals { 4 } else { 2 };
        self.gather_cell_items(&mut cells[..cell_count], req_flags);

        let (start_z, start_top) = self.start_elevation(profile, from, &scratch.start, &mut scratch.statics);

        let fx = x_forward as u16;
        let fy = y_forward as u16;
        let (forward_ok, forward_z) = self.check_cell(
            i32::from(from.z),
            profile,
            &scratch.forward,
            fx,
            fy,
            start_top,
            start_z,
            &mut scratch.statics,
        );
        let mut ok = forward_ok;
        if ok && check_diagonals {
            // Both flanking cells must pass on their own; their elevations
            // are discarded.
            let (left_ok, _) = self.check_cell(
                i32::from(from.z),
                profile,
                &scratch.left,
                x_left as u16,
                y_left as u16,
                start_top,
                start_z,
                &mut scratch.statics,
            );
            let (right_ok, _) = self.check_cell(
                i32::from(from.z),
                profile,
                &scratch.right,
                x_right as u16,
                y_right as u16,
                start_top,
                start_z,
                &mut scratch.statics,
            );
            if !left_ok || !right_ok {
                ok = false;
            }
        }

        let z = if ok {
            forward_z.unwrap_or(start_z)
        } else if hack_move {
            // Forced moves still land on the best candidate the scan found,
            // or stay at the start elevation when there was none.
            ok = true;
            forward_z.unwrap_or(start_z)
        } else {
            start_z
        };
        StepResult { ok, x: fx, y: fy, z: clamp_z(z) }
    }

    /// Convenience wrapper allocating fresh scratch buffers.
    pub fn check_step_fresh(
        &self,
        from: TilePoint,
        dir: Direction,
        profile: &MoveProfile,
        hack_move: bool,
    ) -> StepResult {
        let mut scratch = MoveScratch::new();
        self.check_step(from, dir, profile, hack_move, &mut scratch)
    }

    /// Collects flag-relevant loose items for each listed cell, scanning
    /// every distinct sector the cells touch once.
    fn gather_cell_items(&self, cells: &mut [(i32, i32, &mut Vec<CellItem>)], req_flags: TileFlags) {
        let mut seen: [(u16, u16); 4] = [(u16::MAX, u16::MAX); 4];
        let mut seen_count = 0;
        for i in 0..cells.len() {
            let (x, y, _) = cells[i];
            if x < 0 || y < 0 || x >= i32::from(self.width()) || y >= i32::from(self.height()) {
                continue;
            }
            let sx = (x as u16) >> crate::SECTOR_FACTOR;
            let sy = (y as u16) >> crate::SECTOR_FACTOR;
            if seen[..seen_count].contains(&(sx, sy)) {
                continue;
            }
            seen[seen_count] = (sx, sy);
            seen_count += 1;

            let Some(sector) = self.sector_at(sx, sy) else {
                continue;
            };
            for id in sector.things() {
                let Some(record) = self.entity(*id) else {
                    continue;
                };
                if record.kind != EntityKind::Item {
                    continue;
                }
                let info = self.catalog().model(record.model);
                if !info.flags.intersects(req_flags) {
                    continue;
                }
                let ix = i32::from(record.pos.x);
                let iy = i32::from(record.pos.y);
                for (cx, cy, list) in cells.iter_mut() {
                    if ix == *cx && iy == *cy {
                        list.push(CellItem { z: i32::from(record.pos.z), info });
                        break;
                    }
                }
            }
        }
    }

    // ========================================================================
    // Elevation Resolution
    // ========================================================================

    /// Supporting elevation at the starting cell: the highest qualifying
    /// surface at or below the mover's current elevation. Returns
    /// `(z_low, z_top)`.
    fn start_elevation(
        &self,
        profile: &MoveProfile,
        point: TilePoint,
        items: &[CellItem],
        statics_buf: &mut Vec<StaticItem>,
    ) -> (i32, i32) {
        let x = point.x;
        let y = point.y;
        let land_flags = self
            .tile_id(x, y)
            .map(|id| self.catalog().land_flags(id))
            .unwrap_or(TileFlags::NONE);

        let mut land_blocks = land_flags.contains(TileFlags::IMPASSABLE);
        if land_blocks || !profile.can_cross_land {
            land_blocks = true;
            let is_water = land_flags.contains(TileFlags::WET);
            let is_lava = land_flags.contains(TileFlags::LAVA);
            if (profile.can_swim && is_water) || (profile.can_cross_lava && is_lava) || profile.can_fly {
                land_blocks = false;
            }
        }

        let (land_z, land_center, land_top) = self.average_z(i32::from(x), i32::from(y));
        let consider_land = !land_flags.contains(TileFlags::IGNORED);

        let point_z = i32::from(point.z);
        let mut z_low = 0;
        let mut z_top = 0;
        let mut z_center = 0;
        let mut is_set = false;

        if consider_land && !land_blocks && point_z >= land_center {
            z_low = land_z;
            z_center = land_center;
            if land_top > z_top {
                z_top = land_top;
            }
            is_set = true;
        }

        statics_buf.clear();
        self.collect_statics_at(x, y, statics_buf);
        for static_item in statics_buf.iter() {
            let info = self.catalog().model(static_item.model);
            let item_z = i32::from(static_item.z);
            let calc_top = item_z + i32::from(info.walk_height);
            if self.surface_qualifies(profile, info.flags, false)
                && (!is_set || calc_top >= z_center)
                && point_z >= calc_top
            {
                z_low = item_z;
                z_center = calc_top;
                let top = item_z + i32::from(info.height);
                if !is_set || top > z_top {
                    z_top = top;
                }
                is_set = true;
            }
        }

        for item in items {
            let calc_top = item.z + i32::from(item.info.walk_height);
            if self.surface_qualifies(profile, item.info.flags, false)
                && (!is_set || calc_top >= z_center)
                && point_z >= calc_top
            {
                z_low = item.z;
                z_center = calc_top;
                let top = item.z + i32::from(item.info.height);
                if !is_set || top > z_top {
                    z_top = top;
                }
                is_set = true;
            }
        }

        if !is_set {
            z_low = point_z;
            z_top = point_z;
        } else if point_z > z_top {
            z_top = point_z;
        }
        (z_low, z_top)
    }

    /// Filter for candidate supporting surfaces: plain surfaces, or
    /// water/lava/anything for the matching capability; movers that can
    /// neither walk nor fly only care about water and lava.
    ///
    /// The start-elevation scan accepts any surface-flagged footprint; the
    /// destination candidate scan additionally requires it not be
    /// impassable. `exclude_impassable` selects between the two.
    fn surface_qualifies(&self, profile: &MoveProfile, flags: TileFlags, exclude_impassable: bool) -> bool {
        let is_water = flags.contains(TileFlags::WET);
        let is_lava = flags.contains(TileFlags::LAVA);
        let plain_surface = if exclude_impassable {
            (flags & TileFlags::BLOCKING) == TileFlags::SURFACE
        } else {
            flags.contains(TileFlags::SURFACE)
        };
        let admitted = plain_surface
            || (profile.can_swim && is_water)
            || (profile.can_cross_lava && is_lava)
            || profile.can_fly;
        if !admitted {
            return false;
        }
        if !profile.can_fly && !profile.can_cross_land && !is_water && !is_lava {
            return false;
        }
        true
    }

    // ========================================================================
    // Cell Check
    // ========================================================================

    /// Scans candidate supporting surfaces in one cell, preferring the
    /// candidate elevation closest to the mover's current Z and, on ties,
    /// the lower one. Returns success plus the chosen elevation, which is
    /// `Some` exactly when a candidate was accepted.
    #[allow(clippy::too_many_arguments)]
    fn check_cell(
        &self,
        point_z: i32,
        profile: &MoveProfile,
        items: &[CellItem],
        x: u16,
        y: u16,
        start_top: i32,
        start_z: i32,
        statics_buf: &mut Vec<StaticItem>,
    ) -> (bool, Option<i32>) {
        let mut new_z = 0;

        let land_flags = self
            .tile_id(x, y)
            .map(|id| self.catalog().land_flags(id))
            .unwrap_or(TileFlags::NONE);

        let mut land_blocks = land_flags.contains(TileFlags::IMPASSABLE);
        let consider_land = !land_flags.contains(TileFlags::IGNORED);
        if land_blocks || !profile.can_cross_land {
            land_blocks = true;
            let is_water = land_flags.contains(TileFlags::WET);
            let is_lava = land_flags.contains(TileFlags::LAVA);
            if (profile.can_swim && is_water) || (profile.can_cross_lava && is_lava) || profile.can_fly {
                land_blocks = false;
            }
        }

        let (land_z, land_center, _land_top) = self.average_z(i32::from(x), i32::from(y));

        let mut move_is_ok = false;
        let step_height = profile.step_height;
        let step_top = start_top + step_height;
        let check_top = start_z + PERSON_HEIGHT;

        statics_buf.clear();
        self.collect_statics_at(x, y, statics_buf);

        // Candidate scan over statics, then loose items; identical rules.
        for pass in 0..2 {
            let count = if pass == 0 { statics_buf.len() } else { items.len() };
            for i in 0..count {
                let (item_z, info) = if pass == 0 {
                    let s = statics_buf[i];
                    (i32::from(s.z), self.catalog().model(s.model))
                } else {
                    (items[i].z, items[i].info)
                };
                let flags = info.flags;

                if !self.surface_qualifies(profile, flags, true) {
                    continue;
                }

                let our_z = item_z + i32::from(info.walk_height);
                let mut item_top = item_z;
                let mut test_top = check_top;

                if move_is_ok {
                    let cmp = (our_z - point_z).abs() - (new_z - point_z).abs();
                    if cmp > 0 || (cmp == 0 && our_z > new_z) {
                        continue;
                    }
                }

                if our_z + PERSON_HEIGHT > test_top {
                    test_top = our_z + PERSON_HEIGHT;
                }

                if !flags.contains(TileFlags::BRIDGE) {
                    item_top += i32::from(info.height);
                }

                if step_top >= item_top {
                    let mut land_check = item_z;
                    if i32::from(info.height) >= step_height {
                        land_check += step_height;
                    } else {
                        land_check += i32::from(info.height);
                    }

                    if consider_land && land_check < land_center && land_center > our_z && test_top > land_z {
                        continue;
                    }

                    if self.span_is_clear(profile.ignore_doors, our_z, test_top, statics_buf, items) {
                        new_z = our_z;
                        move_is_ok = true;
                    }
                }
            }
        }

        // The land surface itself is the final candidate.
        if consider_land && !land_blocks && step_top >= land_z {
            let our_z = land_center;
            let mut test_top = check_top;
            if our_z + PERSON_HEIGHT > test_top {
                test_top = our_z + PERSON_HEIGHT;
            }

            let mut should_check = true;
            if move_is_ok {
                let cmp = (our_z - point_z).abs() - (new_z - point_z).abs();
                if cmp > 0 || (cmp == 0 && our_z > new_z) {
                    should_check = false;
                }
            }

            if should_check && self.span_is_clear(profile.ignore_doors, our_z, test_top, statics_buf, items) {
                new_z = our_z;
                move_is_ok = true;
            }
        }

        (move_is_ok, move_is_ok.then_some(new_z))
    }

    /// True when no blocking occupant spans the `(our_z, our_top)` interval.
    fn span_is_clear(
        &self,
        ignore_doors: bool,
        our_z: i32,
        our_top: i32,
        statics: &[StaticItem],
        items: &[CellItem],
    ) -> bool {
        for static_item in statics {
            let info = self.catalog().model(static_item.model);
            if info.flags.intersects(TileFlags::BLOCKING) {
                let check_z = i32::from(static_item.z);
                let check_top = check_z + i32::from(info.walk_height);
                if check_top > our_z && our_top > check_z {
                    return false;
                }
            }
        }
        for item in items {
            if item.info.flags.intersects(TileFlags::BLOCKING) {
                if ignore_doors && item.info.flags.contains(TileFlags::DOOR) {
                    continue;
                }
                let check_top = item.z + i32::from(item.info.walk_height);
                if check_top > our_z && our_top > item.z {
                    return false;
                }
            }
        }
        true
    }

    /// Four-corner land elevation sample: `(lowest, average, highest)`. The
    /// average follows the steeper diagonal.
    pub(crate) fn average_z(&self, x: i32, y: i32) -> (i32, i32, i32) {
        let z_top = i32::from(self.tile_height_clamped(x, y));
        let z_left = i32::from(self.tile_height_clamped(x, y + 1));
        let z_right = i32::from(self.tile_height_clamped(x + 1, y));
        let z_bottom = i32::from(self.tile_height_clamped(x + 1, y + 1));

        let low = z_top.min(z_left).min(z_right).min(z_bottom);
        let top = z_top.max(z_left).max(z_right).max(z_bottom);
        let avg = if (z_top - z_bottom).abs() > (z_left - z_right).abs() {
            floor_average(z_left, z_right)
        } else {
            floor_average(z_top, z_bottom)
        };
        (low, avg, top)
    }

    // ========================================================================
    // Standing Room
    // ========================================================================

    /// Whether an entity of the given height can occupy the cell at `z`.
    ///
    /// `check_characters` also rejects cells occupied by a character's
    /// standing span; `require_surface` demands an actual supporting surface
    /// exactly at `z` rather than mid-air placement.
    pub fn can_fit(
        &self,
        x: u16,
        y: u16,
        z: i8,
        height: i8,
        check_characters: bool,
        require_surface: bool,
    ) -> bool {
        if !self.is_valid_pos(x, y) {
            return false;
        }
        let z = i32::from(z);
        let height = i32::from(height);
        let mut has_surface = false;

        let land_flags = self
            .tile_id(x, y)
            .map(|id| self.catalog().land_flags(id))
            .unwrap_or(TileFlags::NONE);
        let (low_z, avg_z, _top_z) = self.average_z(i32::from(x), i32::from(y));

        if land_flags.contains(TileFlags::IMPASSABLE) && avg_z > z && z + height > low_z {
            return false;
        } else if !land_flags.contains(TileFlags::IMPASSABLE)
            && z == avg_z
            && !land_flags.contains(TileFlags::IGNORED)
        {
            has_surface = true;
        }

        for static_item in self.statics_at(x, y) {
            let info = self.catalog().model(static_item.model);
            let surface = info.flags.contains(TileFlags::SURFACE);
            let impassable = info.flags.contains(TileFlags::IMPASSABLE);
            let static_z = i32::from(static_item.z);
            let static_top = static_z + i32::from(info.walk_height);
            if (surface || impassable) && static_top > z && z + height > static_z {
                return false;
            } else if surface && !impassable && z == static_top {
                has_surface = true;
            }
        }

        let (sx, sy) = ((x >> crate::SECTOR_FACTOR), (y >> crate::SECTOR_FACTOR));
        if let Some(sector) = self.sector_at(sx, sy) {
            for id in sector.things() {
                let Some(record) = self.entity(*id) else {
                    continue;
                };
                if record.pos.x != x || record.pos.y != y {
                    continue;
                }
                let entity_z = i32::from(record.pos.z);
                match record.kind {
                    EntityKind::Item => {
                        let info = self.catalog().model(record.model);
                        let surface = info.flags.contains(TileFlags::SURFACE);
                        let impassable = info.flags.contains(TileFlags::IMPASSABLE);
                        let item_top = entity_z + i32::from(info.height);
                        if (surface || impassable) && item_top > z && z + height > entity_z {
                            return false;
                        } else if surface && !impassable && z == item_top {
                            has_surface = true;
                        }
                    }
                    EntityKind::Character => {
                        if check_characters && entity_z + PERSON_HEIGHT > z && z + height > entity_z {
                            return false;
                        }
                    }
                }
            }
        }

        !require_surface || has_surface
    }
}

/// Averages two corner heights, rounding toward negative infinity the way
/// the terrain format expects.
fn floor_average(a: i32, b: i32) -> i32 {
    let mut v = a + b;
    if v < 0 {
        v -= 1;
    }
    v / 2
}

fn clamp_z(z: i32) -> i8 {
    z.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_average_rounds_down_for_negatives() {
        assert_eq!(floor_average(0, 1), 0);
        assert_eq!(floor_average(2, 3), 2);
        assert_eq!(floor_average(-1, 0), -1);
        assert_eq!(floor_average(-3, -4), -4);
    }

    #[test]
    fn walker_profile_defaults() {
        let p = MoveProfile::walker();
        assert!(p.can_cross_land);
        assert!(!p.can_fly);
        assert_eq!(p.step_height, 2);
    }
}
