//! Property provider seam between the world core and the game's data files.
//!
//! The movement validator and standing-room checks treat tile and model
//! properties as pure functions of the numeric id; where that data comes
//! from (client data files, a database, test fixtures) is the caller's
//! business.

use crate::flags::TileFlags;

/// Footprint description of one item model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Passability flag bits.
    pub flags: TileFlags,
    /// Visual height of the model in elevation units.
    pub height: i8,
    /// Height of the walkable span: equals `height` for ordinary models and
    /// half of it for bridge-flagged ones (stairs, ramps).
    pub walk_height: i8,
}

impl ModelInfo {
    /// Builds the info record, deriving the walkable height from the bridge
    /// flag the way the client data files do.
    pub fn new(flags: TileFlags, height: i8) -> Self {
        let walk_height = if flags.contains(TileFlags::BRIDGE) {
            height / 2
        } else {
            height
        };
        Self { flags, height, walk_height }
    }
}

/// Lookup from numeric tile/model ids to footprint properties.
///
/// Implementations must be cheap and side-effect free; the movement
/// validator calls these in tight per-cell loops.
pub trait TileCatalog: Send + Sync {
    /// Footprint flags of a land (terrain) tile id.
    fn land_flags(&self, tile_id: u16) -> TileFlags;

    /// Footprint description of an item model id.
    fn model(&self, model_id: u16) -> ModelInfo;
}
