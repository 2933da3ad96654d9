//! # World Types - Shared Spatial Foundation
//!
//! Core value types shared by every crate in the Meridian workspace: tile
//! coordinates, rectangles, compass directions, footprint flags, entity
//! identifiers, the item/tile property provider trait, and the common error
//! enums.
//!
//! Everything in this crate is a plain value type or a trait definition; no
//! state, no I/O. The heavier machinery (sectors, maps, regions, movement)
//! lives in `world_core` and builds on these primitives.

// ============================================================================
// Module Declarations
// ============================================================================

pub mod catalog;
pub mod error;
pub mod flags;
pub mod geometry;

// Re-export the common types for easy access
pub use catalog::{ModelInfo, TileCatalog};
pub use error::{RegionConfigError, TerrainError, WorldError};
pub use flags::TileFlags;
pub use geometry::{Direction, GridRect, TilePoint};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a live entity (character or item) tracked by the
/// spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Creates a new random entity identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse classification of a live entity.
///
/// Characters (players and NPCs) occupy cells but only block standing-room
/// checks; items contribute their footprint flags to movement validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Character,
    Item,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_are_unique() {
        let a = EntityId::new();
        let b = EntityId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn entity_id_display_roundtrip() {
        let id = EntityId::new();
        let text = id.to_string();
        assert_eq!(text.parse::<Uuid>().unwrap(), id.0);
    }
}
