//! Immutable per-sector terrain cache.
//!
//! Terrain never changes at runtime, so each sector's block of tile ids,
//! heights, and static items is loaded once from the [`TerrainSource`] on
//! first touch and cached behind an `Arc` for the life of the world. A
//! sector whose data cannot be read degrades to an explicit empty sentinel
//! instead of failing the caller; a source that is unavailable outright
//! disables loading for the whole plane so a broken data directory produces
//! one warning per plane rather than one per sector.

use crate::{SECTOR_FACTOR, SECTOR_WIDTH, TILES_PER_SECTOR};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use world_types::TerrainError;

// ============================================================================
// Terrain Data
// ============================================================================

/// One fixed (non-relocatable) static object, in absolute world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticItem {
    pub model: u16,
    pub x: u16,
    pub y: u16,
    pub z: i8,
}

/// Raw terrain data for one sector as produced by a [`TerrainSource`]:
/// row-major tile ids and heights, `TILES_PER_SECTOR` entries each.
#[derive(Debug, Clone, Default)]
pub struct SectorData {
    pub tiles: Vec<u16>,
    pub heights: Vec<i8>,
    pub statics: Vec<StaticItem>,
}

/// Immutable terrain block for one sector. Never mutated after load.
#[derive(Debug)]
pub struct SectorTerrain {
    tiles: [u16; TILES_PER_SECTOR],
    heights: [i8; TILES_PER_SECTOR],
    statics: Vec<StaticItem>,
    empty: bool,
}

impl SectorTerrain {
    fn from_data(sx: u16, sy: u16, plane: u8, data: SectorData) -> Result<Self, TerrainError> {
        if data.tiles.len() != TILES_PER_SECTOR || data.heights.len() != TILES_PER_SECTOR {
            return Err(TerrainError::Format {
                sx,
                sy,
                plane,
                detail: format!(
                    "expected {} tiles and heights, got {} and {}",
                    TILES_PER_SECTOR,
                    data.tiles.len(),
                    data.heights.len()
                ),
            });
        }
        let mut tiles = [0u16; TILES_PER_SECTOR];
        let mut heights = [0i8; TILES_PER_SECTOR];
        tiles.copy_from_slice(&data.tiles);
        heights.copy_from_slice(&data.heights);
        Ok(Self { tiles, heights, statics: data.statics, empty: false })
    }

    fn empty_sentinel() -> Self {
        Self {
            tiles: [0; TILES_PER_SECTOR],
            heights: [0; TILES_PER_SECTOR],
            statics: Vec::new(),
            empty: true,
        }
    }

    fn index(rel_x: u16, rel_y: u16) -> usize {
        debug_assert!(rel_x < SECTOR_WIDTH && rel_y < SECTOR_WIDTH);
        ((rel_y as usize) << SECTOR_FACTOR) | rel_x as usize
    }

    /// Tile id at sector-relative coordinates.
    pub fn tile_id(&self, rel_x: u16, rel_y: u16) -> u16 {
        self.tiles[Self::index(rel_x, rel_y)]
    }

    /// Terrain height at sector-relative coordinates.
    pub fn height(&self, rel_x: u16, rel_y: u16) -> i8 {
        self.heights[Self::index(rel_x, rel_y)]
    }

    pub fn statics(&self) -> &[StaticItem] {
        &self.statics
    }

    /// True for the fallback block used when source data was unavailable.
    pub fn is_empty_sentinel(&self) -> bool {
        self.empty
    }
}

// ============================================================================
// Terrain Source
// ============================================================================

/// Read-only provider of terrain data, keyed by sector coordinates and
/// plane. Implementations may block; the store only calls them on cache
/// misses, which are expected during world warm-up rather than steady-state
/// ticks.
pub trait TerrainSource: Send + Sync {
    fn load(&self, sx: u16, sy: u16, plane: u8) -> Result<SectorData, TerrainError>;
}

/// Uniform terrain: one tile id and one height everywhere, no statics.
/// Useful as a default for worlds without terrain data and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FlatTerrain {
    pub tile: u16,
    pub height: i8,
}

impl TerrainSource for FlatTerrain {
    fn load(&self, _sx: u16, _sy: u16, _plane: u8) -> Result<SectorData, TerrainError> {
        Ok(SectorData {
            tiles: vec![self.tile; TILES_PER_SECTOR],
            heights: vec![self.height; TILES_PER_SECTOR],
            statics: Vec::new(),
        })
    }
}

// ============================================================================
// Terrain Store
// ============================================================================

/// Per-plane cache of immutable terrain blocks with first-touch loading.
pub struct TerrainStore {
    plane: u8,
    source: Arc<dyn TerrainSource>,
    cache: RwLock<HashMap<(u16, u16), Arc<SectorTerrain>>>,
    empty: Arc<SectorTerrain>,
    disabled: AtomicBool,
}

impl TerrainStore {
    pub fn new(plane: u8, source: Arc<dyn TerrainSource>) -> Self {
        Self {
            plane,
            source,
            cache: RwLock::new(HashMap::new()),
            empty: Arc::new(SectorTerrain::empty_sentinel()),
            disabled: AtomicBool::new(false),
        }
    }

    /// Terrain block for the given sector, loading it on first touch.
    ///
    /// A per-sector format problem caches the empty sentinel for that sector
    /// only; an I/O or missing-plane failure disables loading for the whole
    /// plane, after which every miss resolves to the sentinel.
    pub fn sector(&self, sx: u16, sy: u16) -> Arc<SectorTerrain> {
        if let Some(cached) = self.cache.read().get(&(sx, sy)) {
            return Arc::clone(cached);
        }
        if self.disabled.load(Ordering::Relaxed) {
            return Arc::clone(&self.empty);
        }

        let block = match self.source.load(sx, sy, self.plane) {
            Ok(data) => match SectorTerrain::from_data(sx, sy, self.plane, data) {
                Ok(block) => {
                    debug!(sx, sy, plane = self.plane, "terrain sector loaded");
                    Arc::new(block)
                }
                Err(err) => {
                    warn!(sx, sy, plane = self.plane, %err, "terrain sector malformed, using empty block");
                    Arc::clone(&self.empty)
                }
            },
            Err(err @ TerrainError::Format { .. }) => {
                warn!(sx, sy, plane = self.plane, %err, "terrain sector malformed, using empty block");
                Arc::clone(&self.empty)
            }
            Err(err) => {
                warn!(plane = self.plane, %err, "terrain source unavailable, disabling terrain for this plane");
                self.disabled.store(true, Ordering::Relaxed);
                Arc::clone(&self.empty)
            }
        };

        self.cache.write().insert((sx, sy), Arc::clone(&block));
        block
    }

    /// True once loading has been disabled for this plane.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }
}

// ============================================================================
// File-Backed Source
// ============================================================================

/// Terrain source reading the on-disk world data layout.
///
/// Per plane `m`, the directory holds:
///
/// * `terrain{m}.dat` - fixed-size sector records in `sy * sectors_x + sx`
///   order; each record is 256 little-endian `u16` tile ids followed by
///   256 `i8` heights (768 bytes).
/// * `statics{m}.idx` - per sector, a `u32` byte offset into the statics
///   data file and a `u32` record count (8 bytes).
/// * `statics{m}.dat` - 6-byte static records: `u16` model, `u8` relative
///   x, `u8` relative y, `i8` z, one pad byte.
///
/// Missing statics files mean "no statics"; a missing terrain file is a
/// hard source failure for that plane.
pub struct FileTerrainSource {
    dir: PathBuf,
    /// Sector-grid width per plane, indexed by plane id.
    sectors_x: Vec<u16>,
}

const TERRAIN_RECORD_LEN: u64 = (TILES_PER_SECTOR * 3) as u64;
const STATIC_RECORD_LEN: u64 = 6;

impl FileTerrainSource {
    /// `plane_widths` holds each plane's width in tiles; it must be a
    /// multiple of the sector width.
    pub fn new(dir: impl Into<PathBuf>, plane_widths: &[u16]) -> Self {
        Self {
            dir: dir.into(),
            sectors_x: plane_widths.iter().map(|w| w >> SECTOR_FACTOR).collect(),
        }
    }

    fn sector_ordinal(&self, sx: u16, sy: u16, plane: u8) -> Result<u64, TerrainError> {
        let sectors_x = *self
            .sectors_x
            .get(plane as usize)
            .ok_or(TerrainError::MissingPlane(plane))?;
        Ok(u64::from(sy) * u64::from(sectors_x) + u64::from(sx))
    }

    fn read_statics(&self, ordinal: u64, sx: u16, sy: u16, plane: u8) -> Result<Vec<StaticItem>, TerrainError> {
        let idx_path = self.dir.join(format!("statics{plane}.idx"));
        let mut idx = match File::open(&idx_path) {
            Ok(f) => f,
            Err(_) => return Ok(Vec::new()),
        };
        idx.seek(SeekFrom::Start(ordinal * 8))?;
        let mut entry = [0u8; 8];
        if idx.read_exact(&mut entry).is_err() {
            return Ok(Vec::new());
        }
        let offset = u32::from_le_bytes([entry[0], entry[1], entry[2], entry[3]]);
        let count = u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]);
        if count == 0 {
            return Ok(Vec::new());
        }

        let dat_path = self.dir.join(format!("statics{plane}.dat"));
        let mut dat = File::open(&dat_path)?;
        dat.seek(SeekFrom::Start(u64::from(offset)))?;
        let mut buf = vec![0u8; count as usize * STATIC_RECORD_LEN as usize];
        dat.read_exact(&mut buf).map_err(|_| TerrainError::Format {
            sx,
            sy,
            plane,
            detail: format!("statics data truncated at offset {offset}"),
        })?;

        let base_x = sx << SECTOR_FACTOR;
        let base_y = sy << SECTOR_FACTOR;
        let statics = buf
            .chunks_exact(STATIC_RECORD_LEN as usize)
            .map(|rec| StaticItem {
                model: u16::from_le_bytes([rec[0], rec[1]]),
                x: base_x + u16::from(rec[2]),
                y: base_y + u16::from(rec[3]),
                z: rec[4] as i8,
            })
            .collect();
        Ok(statics)
    }
}

impl TerrainSource for FileTerrainSource {
    fn load(&self, sx: u16, sy: u16, plane: u8) -> Result<SectorData, TerrainError> {
        let ordinal = self.sector_ordinal(sx, sy, plane)?;

        let terrain_path = self.dir.join(format!("terrain{plane}.dat"));
        let mut file = File::open(&terrain_path)?;
        file.seek(SeekFrom::Start(ordinal * TERRAIN_RECORD_LEN))?;
        let mut buf = [0u8; TILES_PER_SECTOR * 3];
        file.read_exact(&mut buf).map_err(|_| TerrainError::Format {
            sx,
            sy,
            plane,
            detail: "terrain record truncated".to_string(),
        })?;

        let tiles = buf[..TILES_PER_SECTOR * 2]
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect();
        let heights = buf[TILES_PER_SECTOR * 2..].iter().map(|&b| b as i8).collect();
        let statics = self.read_statics(ordinal, sx, sy, plane)?;

        Ok(SectorData { tiles, heights, statics })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use world_types::TerrainError;

    struct FailingSource;

    impl TerrainSource for FailingSource {
        fn load(&self, _sx: u16, _sy: u16, _plane: u8) -> Result<SectorData, TerrainError> {
            Err(TerrainError::MissingPlane(0))
        }
    }

    struct ShortSource;

    impl TerrainSource for ShortSource {
        fn load(&self, _sx: u16, _sy: u16, _plane: u8) -> Result<SectorData, TerrainError> {
            Ok(SectorData { tiles: vec![3; 10], heights: vec![0; 10], statics: Vec::new() })
        }
    }

    #[test]
    fn flat_terrain_loads_and_caches() {
        let store = TerrainStore::new(0, Arc::new(FlatTerrain { tile: 3, height: 5 }));
        let a = store.sector(1, 2);
        assert_eq!(a.tile_id(0, 0), 3);
        assert_eq!(a.height(15, 15), 5);
        assert!(!a.is_empty_sentinel());

        // Second touch must hand back the cached block.
        let b = store.sector(1, 2);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn source_failure_disables_plane() {
        let store = TerrainStore::new(0, Arc::new(FailingSource));
        let block = store.sector(0, 0);
        assert!(block.is_empty_sentinel());
        assert!(store.is_disabled());
        assert!(store.sector(5, 5).is_empty_sentinel());
    }

    #[test]
    fn malformed_sector_degrades_without_disabling() {
        let store = TerrainStore::new(0, Arc::new(ShortSource));
        assert!(store.sector(0, 0).is_empty_sentinel());
        assert!(!store.is_disabled());
    }

    #[test]
    fn file_source_reads_terrain_and_statics() {
        let dir = tempfile::tempdir().unwrap();
        // One plane, 32x32 tiles = 2x2 sectors.
        let sectors_x = 2u64;
        let target = (1u64, 1u64); // sector (1,1)
        let ordinal = target.1 * sectors_x + target.0;

        let mut terrain = vec![0u8; (ordinal as usize + 1) * TILES_PER_SECTOR * 3];
        let rec_start = ordinal as usize * TILES_PER_SECTOR * 3;
        // First tile of the record: id 7, height -2.
        terrain[rec_start] = 7;
        terrain[rec_start + TILES_PER_SECTOR * 2] = (-2i8) as u8;
        std::fs::File::create(dir.path().join("terrain0.dat"))
            .unwrap()
            .write_all(&terrain)
            .unwrap();

        // Statics: sector (1,1) has one record at offset 0.
        let mut idx = vec![0u8; (ordinal as usize + 1) * 8];
        let idx_start = ordinal as usize * 8;
        idx[idx_start + 4] = 1; // count = 1
        std::fs::File::create(dir.path().join("statics0.idx"))
            .unwrap()
            .write_all(&idx)
            .unwrap();
        let rec = [0x34u8, 0x12, 3, 4, (-5i8) as u8, 0];
        std::fs::File::create(dir.path().join("statics0.dat"))
            .unwrap()
            .write_all(&rec)
            .unwrap();

        let source = FileTerrainSource::new(dir.path(), &[32]);
        let data = source.load(1, 1, 0).unwrap();
        assert_eq!(data.tiles[0], 7);
        assert_eq!(data.heights[0], -2);
        assert_eq!(
            data.statics,
            vec![StaticItem { model: 0x1234, x: 16 + 3, y: 16 + 4, z: -5 }]
        );
    }

    #[test]
    fn file_source_missing_plane_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileTerrainSource::new(dir.path(), &[32]);
        assert!(source.load(0, 0, 0).is_err());
    }
}
