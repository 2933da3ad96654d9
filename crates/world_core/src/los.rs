//! Discretized line-of-sight path generation.
//!
//! [`LosPath`] is a reusable buffer of grid cells covering a 3D segment,
//! sorted along the segment's dominant axis so membership tests are a
//! binary search. Visibility checks trace many segments per tick, so the
//! buffer is built around a middle-anchored growable array that accepts
//! cheap appends at either end and is reset rather than reallocated between
//! queries.

use crate::MAX_LOS_STEPS;
use world_types::WorldError;

/// One cell on a traced path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LosCell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Sorted, double-ended cell buffer with exact-match containment queries.
///
/// Cells are kept ascending along the sort axis in storage regardless of
/// travel direction: a descending walk simply prepends. At most three cells
/// share one dominant-axis coordinate, which the containment fan-out relies
/// on.
#[derive(Debug)]
pub struct LosPath {
    cells: Vec<LosCell>,
    first: usize,
    /// One past the last occupied slot; `last == first` means empty.
    last: usize,
    sort_by_x: bool,
    ascending: bool,
}

const INITIAL_CAPACITY: usize = 8;

impl Default for LosPath {
    fn default() -> Self {
        Self::new()
    }
}

impl LosPath {
    pub fn new() -> Self {
        let mut path = Self {
            cells: vec![LosCell::default(); INITIAL_CAPACITY],
            first: 0,
            last: 0,
            sort_by_x: true,
            ascending: true,
        };
        path.clear();
        path
    }

    /// Empties the buffer and re-centers the anchor.
    pub fn clear(&mut self) {
        self.first = self.cells.len() / 2;
        self.last = self.first;
        self.sort_by_x = true;
        self.ascending = true;
    }

    pub fn len(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.last == self.first
    }

    pub fn iter(&self) -> impl Iterator<Item = &LosCell> {
        self.cells[self.first..self.last].iter()
    }

    fn sort_key(&self, cell: &LosCell) -> i32 {
        if self.sort_by_x {
            cell.x
        } else {
            cell.y
        }
    }

    fn key_of(&self, x: i32, y: i32) -> i32 {
        if self.sort_by_x {
            x
        } else {
            y
        }
    }

    /// Chooses the sort axis and travel direction. Only valid on an empty
    /// buffer.
    fn init_sorting(&mut self, sort_by_x: bool, ascending: bool) {
        debug_assert!(self.is_empty(), "sorting may only change while empty");
        self.sort_by_x = sort_by_x;
        self.ascending = ascending;
    }

    /// Appends a cell at the travel end. Cells repeating the previous XY are
    /// dropped; the caller must feed monotone dominant-axis coordinates.
    fn add(&mut self, x: i32, y: i32, z: i32) {
        if self.ascending {
            self.add_last(x, y, z)
        } else {
            self.add_first(x, y, z)
        }
    }

    fn add_last(&mut self, x: i32, y: i32, z: i32) {
        if self.last > self.first {
            let last = self.cells[self.last - 1];
            if last.x == x && last.y == y {
                return;
            }
            debug_assert!(
                self.sort_key(&last) <= self.key_of(x, y),
                "out-of-order append breaks the sorted path"
            );
        }
        if self.last == self.cells.len() {
            self.grow();
        }
        self.cells[self.last] = LosCell { x, y, z };
        self.last += 1;
    }

    fn add_first(&mut self, x: i32, y: i32, z: i32) {
        if self.last > self.first {
            let first = self.cells[self.first];
            if first.x == x && first.y == y {
                return;
            }
            debug_assert!(
                self.sort_key(&first) >= self.key_of(x, y),
                "out-of-order prepend breaks the sorted path"
            );
        }
        if self.first == 0 {
            self.grow();
        }
        self.first -= 1;
        self.cells[self.first] = LosCell { x, y, z };
    }

    /// Quadruples the backing array, re-centering the occupied span.
    fn grow(&mut self) {
        let len = self.last - self.first;
        let mut bigger = vec![LosCell::default(); self.cells.len() * 4];
        let new_first = bigger.len() / 2 - len / 2;
        bigger[new_first..new_first + len].copy_from_slice(&self.cells[self.first..self.last]);
        self.cells = bigger;
        self.first = new_first;
        self.last = new_first + len;
    }

    /// Exact-match membership test; returns the cell's Z when present.
    ///
    /// Binary search on the sort axis, then a short linear fan-out around
    /// the hit, since up to three cells can share one axis coordinate.
    pub fn contains(&self, x: i32, y: i32) -> Option<i32> {
        if self.is_empty() {
            return None;
        }
        let key = self.key_of(x, y);
        let slice = &self.cells[self.first..self.last];
        let Ok(hit) = slice.binary_search_by(|cell| self.sort_key(cell).cmp(&key)) else {
            return None;
        };
        let lo = hit.saturating_sub(2);
        let hi = (hit + 2).min(slice.len() - 1);
        for cell in &slice[lo..=hi] {
            if cell.x == x && cell.y == y {
                return Some(cell.z);
            }
        }
        None
    }

    // ========================================================================
    // Tracing
    // ========================================================================

    /// Rasterizes the segment from `org` to `dest` into this buffer.
    ///
    /// Walks the dominant axis one tile per step, interpolating the minor
    /// axis and elevation. `half_width` of one tile adds the two
    /// perpendicular neighbors of every base cell; with zero width, the
    /// walk still bridges diagonal steps with their corner cells so a
    /// diagonal wall cannot be seen through.
    ///
    /// Spans longer than [`MAX_LOS_STEPS`] are outside any sane visibility
    /// range and are rejected without touching the buffer.
    pub fn trace(
        &mut self,
        org: (i32, i32, i32),
        dest: (i32, i32, i32),
        half_width: i32,
    ) -> Result<(), WorldError> {
        let (x0, y0, z0) = org;
        let (x1, y1, z1) = dest;
        let dx = x1 - x0;
        let dy = y1 - y0;
        let dz = z1 - z0;

        let major_is_x = dx.abs() >= dy.abs();
        let steps = if major_is_x { dx.abs() } else { dy.abs() };
        if steps as u32 > MAX_LOS_STEPS {
            return Err(WorldError::LosSpanExceeded { span: steps as u32, max: MAX_LOS_STEPS });
        }

        self.clear();
        let (d_major, d_minor, minor0) = if major_is_x { (dx, dy, y0) } else { (dy, dx, x0) };
        self.init_sorting(major_is_x, d_major >= 0);

        if steps == 0 {
            self.add(x0, y0, z0);
            return Ok(());
        }

        let major_sign = d_major.signum();
        // Nearest-integer interpolation of the minor axis per major step.
        let minor_at = |t: i32| -> i32 {
            let num = 2 * t * d_minor + d_major.abs() * d_minor.signum();
            minor0 + num / (2 * d_major.abs())
        };
        let z_at = |t: i32| -> i32 { z0 + t * dz / steps };

        let mut prev_minor = minor0;
        for t in 0..=steps {
            let major = (if major_is_x { x0 } else { y0 }) + t * major_sign;
            let minor = if t == steps {
                if major_is_x {
                    y1
                } else {
                    x1
                }
            } else {
                minor_at(t)
            };
            let z = z_at(t);

            // Collect the distinct minor coordinates for this major column:
            // the base cell, optional width neighbors, and the bridging
            // corners of a diagonal step on either side.
            let mut minors = [minor; 4];
            let mut count = 1;
            let mut push = |minors: &mut [i32; 4], count: &mut usize, m: i32| {
                if !minors[..*count].contains(&m) && *count < 4 {
                    minors[*count] = m;
                    *count += 1;
                }
            };
            if half_width > 0 {
                push(&mut minors, &mut count, minor - 1);
                push(&mut minors, &mut count, minor + 1);
            }
            if t > 0 && prev_minor != minor {
                push(&mut minors, &mut count, prev_minor);
            }
            if t < steps {
                let next = if t + 1 == steps {
                    if major_is_x {
                        y1
                    } else {
                        x1
                    }
                } else {
                    minor_at(t + 1)
                };
                if next != minor {
                    push(&mut minors, &mut count, next);
                }
            }
            minors[..count].sort_unstable();

            for &m in &minors[..count] {
                if major_is_x {
                    self.add(major, m, z);
                } else {
                    self.add(m, major, z);
                }
            }
            prev_minor = minor;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_axis_trace_yields_one_cell_per_step() {
        let mut path = LosPath::new();
        path.trace((0, 0, 0), (5, 0, 0), 0).unwrap();
        let cells: Vec<_> = path.iter().copied().collect();
        assert_eq!(cells.len(), 6);
        for (i, cell) in cells.iter().enumerate() {
            assert_eq!((cell.x, cell.y, cell.z), (i as i32, 0, 0));
        }
        for x in 0..=5 {
            assert_eq!(path.contains(x, 0), Some(0));
        }
        assert_eq!(path.contains(2, 1), None);
        assert_eq!(path.contains(6, 0), None);
    }

    #[test]
    fn descending_trace_stays_sorted() {
        let mut path = LosPath::new();
        path.trace((5, 3, 0), (0, 3, 0), 0).unwrap();
        assert_eq!(path.len(), 6);
        let xs: Vec<_> = path.iter().map(|c| c.x).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(path.contains(3, 3), Some(0));
    }

    #[test]
    fn diagonal_trace_bridges_corners() {
        let mut path = LosPath::new();
        path.trace((0, 0, 0), (4, 4, 0), 0).unwrap();
        // Every diagonal step contributes its corner cells, so the path
        // cannot be slipped through between (n,n) and (n+1,n+1).
        for n in 0..=4 {
            assert!(path.contains(n, n).is_some());
        }
        for n in 0..4 {
            let corner_a = path.contains(n + 1, n).is_some();
            let corner_b = path.contains(n, n + 1).is_some();
            assert!(corner_a || corner_b, "no bridge at step {n}");
        }
    }

    #[test]
    fn widened_trace_adds_perpendicular_neighbors() {
        let mut path = LosPath::new();
        path.trace((0, 5, 0), (6, 5, 0), 1).unwrap();
        for x in 0..=6 {
            assert!(path.contains(x, 4).is_some());
            assert!(path.contains(x, 5).is_some());
            assert!(path.contains(x, 6).is_some());
        }
    }

    #[test]
    fn y_dominant_trace_sorts_by_y() {
        let mut path = LosPath::new();
        path.trace((2, 0, 0), (3, 7, 0), 0).unwrap();
        let ys: Vec<_> = path.iter().map(|c| c.y).collect();
        assert!(ys.windows(2).all(|w| w[0] <= w[1]));
        assert!(path.contains(2, 0).is_some());
        assert!(path.contains(3, 7).is_some());
    }

    #[test]
    fn elevation_interpolates_along_the_walk() {
        let mut path = LosPath::new();
        path.trace((0, 0, 0), (10, 0, 10), 0).unwrap();
        assert_eq!(path.contains(0, 0), Some(0));
        assert_eq!(path.contains(5, 0), Some(5));
        assert_eq!(path.contains(10, 0), Some(10));
    }

    #[test]
    fn overlong_span_is_rejected() {
        let mut path = LosPath::new();
        let err = path.trace((0, 0, 0), (31, 0, 0), 0).unwrap_err();
        assert!(matches!(err, WorldError::LosSpanExceeded { span: 31, max } if max == MAX_LOS_STEPS));
    }

    #[test]
    fn buffer_grows_and_recenters() {
        let mut path = LosPath::new();
        path.trace((0, 0, 0), (30, 0, 0), 1).unwrap();
        assert!(path.len() > INITIAL_CAPACITY);
        for x in 0..=30 {
            assert!(path.contains(x, 0).is_some());
        }
    }

    #[test]
    fn reuse_after_clear_matches_fresh_instance() {
        let mut reused = LosPath::new();
        reused.trace((0, 0, 0), (8, 3, 0), 1).unwrap();
        reused.trace((4, 9, 2), (0, 9, 2), 0).unwrap();

        let mut fresh = LosPath::new();
        fresh.trace((4, 9, 2), (0, 9, 2), 0).unwrap();

        let a: Vec<_> = reused.iter().copied().collect();
        let b: Vec<_> = fresh.iter().copied().collect();
        assert_eq!(a, b);
    }
}
