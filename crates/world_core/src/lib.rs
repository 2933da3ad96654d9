//! # World Core - Sector-Based Spatial Backbone
//!
//! The spatial engine of a persistent-world simulation server. It tracks
//! where every mobile or static entity sits on a large tile grid, answers
//! "what is near here" queries, enforces a hierarchy of named regions used
//! for rule scoping, and validates single-step movement against terrain,
//! static geometry, and other entities.
//!
//! ## Architecture Overview
//!
//! * **Terrain store** - immutable per-sector terrain blocks (tile ids,
//!   heights, static items), loaded on first touch from a pluggable source
//!   and cached for the life of the world.
//! * **Sector** - the atomic spatial bucket: live entity collections plus
//!   the region-rectangle fragments overlapping its tile range.
//! * **Map** - one instance per world plane; a grid of lazily created
//!   sectors with add/remove/relocate, range queries, tile queries, region
//!   activation, and dynamic region placement with transactional rollback.
//! * **Region model** - static regions in a containment hierarchy rooted at
//!   the world region, plus relocatable dynamic regions that may never
//!   overlap each other.
//! * **Movement validator** - capability-profile step checking with exact
//!   elevation resolution.
//! * **Line-of-sight path** - discretized segment walk into a sorted,
//!   searchable cell buffer.
//!
//! ## Concurrency Model
//!
//! The core is single-threaded per plane by contract: all mutation of one
//! [`Map`] happens on one logical simulation thread, and query iterators are
//! live views to be consumed before the next mutation. The only internal
//! lock is the terrain cache, which must tolerate first-touch loading from
//! whichever thread trips it.

// Re-export core types for easy access
pub use los::{LosCell, LosPath};
pub use map::{EntityRecord, Map, PlaneSpec};
pub use movement::{MoveProfile, MoveScratch, StepResult, PERSON_HEIGHT};
pub use region::{Region, RegionAtlas, RegionHandle, RegionKind, StaticRegionDef, WorldIndex};
pub use sector::{MultiComponent, RegionRect, Sector};
pub use terrain::{
    FileTerrainSource, FlatTerrain, SectorData, SectorTerrain, StaticItem, TerrainSource,
    TerrainStore,
};

// Public module declarations
pub mod los;
pub mod map;
pub mod movement;
pub mod region;
pub mod sector;
pub mod terrain;

/// Right-shift converting a world tile coordinate to a sector coordinate.
pub const SECTOR_FACTOR: u32 = 4;

/// Edge length of a sector in tiles.
pub const SECTOR_WIDTH: u16 = 1 << SECTOR_FACTOR;

/// Mask clearing the intra-sector bits of a tile coordinate; two
/// coordinates share a sector column exactly when their masked values match.
pub const SECTOR_AND: u16 = !(SECTOR_WIDTH - 1);

/// Tiles held by one sector.
pub const TILES_PER_SECTOR: usize = (SECTOR_WIDTH as usize) * (SECTOR_WIDTH as usize);

/// Hard cap on line-of-sight walk length, in dominant-axis steps.
pub const MAX_LOS_STEPS: u32 = 30;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_constants_are_consistent() {
        assert_eq!(SECTOR_WIDTH, 16);
        assert_eq!(TILES_PER_SECTOR, 256);
        // The mask check must agree with the shift for every coordinate pair.
        for (a, b) in [(0u16, 15u16), (15, 16), (16, 31), (100, 100)] {
            let same_by_shift = (a >> SECTOR_FACTOR) == (b >> SECTOR_FACTOR);
            let same_by_mask = (a & SECTOR_AND) == (b & SECTOR_AND);
            assert_eq!(same_by_shift, same_by_mask);
        }
    }
}
