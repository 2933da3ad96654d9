//! Footprint flag bits describing passability semantics of land tiles and
//! item models.

use serde::{Deserialize, Serialize};

/// Bit set of passability-relevant properties for a tile or item model.
///
/// The catalog provider reports these for land tiles and item models alike;
/// the movement validator combines them with the mover's capability profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileFlags(pub u16);

impl TileFlags {
    pub const NONE: TileFlags = TileFlags(0);
    /// Blocks movement outright (walls, cliffs).
    pub const IMPASSABLE: TileFlags = TileFlags(1 << 0);
    /// Something can stand on top of this (floors, tables).
    pub const SURFACE: TileFlags = TileFlags(1 << 1);
    /// Water; passable only for swimmers.
    pub const WET: TileFlags = TileFlags(1 << 2);
    /// Walkable span equals half the model height (stairs, ramps).
    pub const BRIDGE: TileFlags = TileFlags(1 << 3);
    /// Door; skipped by movers allowed to ignore doors.
    pub const DOOR: TileFlags = TileFlags(1 << 4);
    /// Lava; passable only with the lava-crossing capability.
    pub const LAVA: TileFlags = TileFlags(1 << 5);
    /// Land tile ignored entirely by movement (void/no-draw tiles).
    pub const IGNORED: TileFlags = TileFlags(1 << 6);

    /// Impassable or surface; the footprint bits movement always cares about.
    pub const BLOCKING: TileFlags = TileFlags(Self::IMPASSABLE.0 | Self::SURFACE.0);

    pub fn contains(self, other: TileFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any of the given bits is set.
    pub fn intersects(self, other: TileFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for TileFlags {
    type Output = TileFlags;

    fn bitor(self, rhs: TileFlags) -> TileFlags {
        TileFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TileFlags {
    fn bitor_assign(&mut self, rhs: TileFlags) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for TileFlags {
    type Output = TileFlags;

    fn bitand(self, rhs: TileFlags) -> TileFlags {
        TileFlags(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_set_operations() {
        let f = TileFlags::IMPASSABLE | TileFlags::WET;
        assert!(f.contains(TileFlags::IMPASSABLE));
        assert!(f.intersects(TileFlags::BLOCKING));
        assert!(!f.contains(TileFlags::BLOCKING));
        assert!(!f.intersects(TileFlags::DOOR));
        assert!(TileFlags::NONE.is_empty());
    }

    #[test]
    fn blocking_covers_both_bits() {
        assert!(TileFlags::BLOCKING.contains(TileFlags::IMPASSABLE));
        assert!(TileFlags::BLOCKING.contains(TileFlags::SURFACE));
    }
}
