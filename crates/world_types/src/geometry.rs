//! Tile-grid geometry primitives.
//!
//! World coordinates are unsigned tile indices bounded by the owning plane's
//! dimensions; elevation is a small signed value. All types here are plain
//! immutable values.

use serde::{Deserialize, Serialize};

// ============================================================================
// Points
// ============================================================================

/// A full world position: horizontal tile coordinates, elevation, and the
/// plane (independent world floor) it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePoint {
    pub x: u16,
    pub y: u16,
    pub z: i8,
    pub plane: u8,
}

impl TilePoint {
    pub fn new(x: u16, y: u16, z: i8, plane: u8) -> Self {
        Self { x, y, z, plane }
    }

    /// Returns this point shifted by the given tile offsets, or `None` when
    /// the result would leave the unsigned coordinate space.
    pub fn translated(&self, dx: i32, dy: i32) -> Option<Self> {
        let x = u16::try_from(i32::from(self.x) + dx).ok()?;
        let y = u16::try_from(i32::from(self.y) + dy).ok()?;
        Some(Self { x, y, z: self.z, plane: self.plane })
    }

    pub fn with_z(&self, z: i8) -> Self {
        Self { z, ..*self }
    }
}

impl std::fmt::Display for TilePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{} m{})", self.x, self.y, self.z, self.plane)
    }
}

// ============================================================================
// Rectangles
// ============================================================================

/// Axis-aligned inclusive tile rectangle. The bounds are normalized at
/// construction so `min_x <= max_x` and `min_y <= max_y` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    min_x: u16,
    min_y: u16,
    max_x: u16,
    max_y: u16,
}

impl GridRect {
    /// Builds a rectangle from two opposite corners, in any order.
    pub fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Square rectangle of the given radius around a center tile, saturating
    /// at the coordinate-space edges.
    pub fn around(x: u16, y: u16, range: u16) -> Self {
        Self {
            min_x: x.saturating_sub(range),
            min_y: y.saturating_sub(range),
            max_x: x.saturating_add(range),
            max_y: y.saturating_add(range),
        }
    }

    pub fn min_x(&self) -> u16 {
        self.min_x
    }

    pub fn min_y(&self) -> u16 {
        self.min_y
    }

    pub fn max_x(&self) -> u16 {
        self.max_x
    }

    pub fn max_y(&self) -> u16 {
        self.max_y
    }

    /// Number of tiles covered, inclusive of both bounds.
    pub fn tile_count(&self) -> u32 {
        let w = u32::from(self.max_x - self.min_x) + 1;
        let h = u32::from(self.max_y - self.min_y) + 1;
        w * h
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn contains_point(&self, p: &TilePoint) -> bool {
        self.contains(p.x, p.y)
    }

    /// True when `other` lies fully inside this rectangle.
    pub fn contains_rect(&self, other: &GridRect) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    pub fn intersects(&self, other: &GridRect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Exact intersection, or `None` when the rectangles are disjoint.
    pub fn intersection(&self, other: &GridRect) -> Option<GridRect> {
        if !self.intersects(other) {
            return None;
        }
        Some(GridRect {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Returns this rectangle shifted by the given tile offsets, or `None`
    /// when any bound would leave the unsigned coordinate space.
    pub fn translated(&self, dx: i32, dy: i32) -> Option<GridRect> {
        let min_x = u16::try_from(i32::from(self.min_x) + dx).ok()?;
        let min_y = u16::try_from(i32::from(self.min_y) + dy).ok()?;
        let max_x = u16::try_from(i32::from(self.max_x) + dx).ok()?;
        let max_y = u16::try_from(i32::from(self.max_y) + dy).ok()?;
        Some(GridRect { min_x, min_y, max_x, max_y })
    }
}

impl std::fmt::Display for GridRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})-({},{})", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

// ============================================================================
// Directions
// ============================================================================

/// Eight-way compass direction. The discriminant ordering matters: odd
/// values are the diagonals, and rotating by one step is `(d +/- 1) & 7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Tile offset for one step in this direction. North decreases Y.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        (self as u8) & 0x1 == 0x1
    }

    /// One compass step counter-clockwise.
    pub fn rotated_left(self) -> Direction {
        Self::ALL[((self as u8).wrapping_sub(1) & 0x7) as usize]
    }

    /// One compass step clockwise.
    pub fn rotated_right(self) -> Direction {
        Self::ALL[((self as u8 + 1) & 0x7) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_normalizes_corners() {
        let r = GridRect::new(10, 20, 5, 2);
        assert_eq!(r.min_x(), 5);
        assert_eq!(r.min_y(), 2);
        assert_eq!(r.max_x(), 10);
        assert_eq!(r.max_y(), 20);
    }

    #[test]
    fn rect_containment_and_intersection() {
        let outer = GridRect::new(0, 0, 100, 100);
        let inner = GridRect::new(10, 10, 20, 20);
        let apart = GridRect::new(200, 200, 210, 210);

        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));
        assert!(outer.intersects(&inner));
        assert!(!outer.intersects(&apart));
        assert_eq!(outer.intersection(&apart), None);
        assert_eq!(outer.intersection(&inner), Some(inner));
    }

    #[test]
    fn rect_partial_intersection() {
        let a = GridRect::new(0, 0, 10, 10);
        let b = GridRect::new(5, 5, 15, 15);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, GridRect::new(5, 5, 10, 10));
        assert_eq!(i.tile_count(), 36);
    }

    #[test]
    fn rect_translation_bounds() {
        let r = GridRect::new(0, 0, 10, 10);
        assert_eq!(r.translated(5, 5), Some(GridRect::new(5, 5, 15, 15)));
        assert_eq!(r.translated(-1, 0), None);
        assert_eq!(r.translated(i32::from(u16::MAX), 0), None);
    }

    #[test]
    fn diagonal_directions_are_odd() {
        for d in Direction::ALL {
            let (dx, dy) = d.offset();
            assert_eq!(d.is_diagonal(), dx != 0 && dy != 0);
        }
    }

    #[test]
    fn flanking_directions_of_diagonals() {
        assert_eq!(Direction::NorthEast.rotated_left(), Direction::North);
        assert_eq!(Direction::NorthEast.rotated_right(), Direction::East);
        assert_eq!(Direction::North.rotated_left(), Direction::NorthWest);
    }
}
