//! Uniform-grid broad phase over static object bounds.
//!
//! Each object index is stored in every cell its bounds touch, up to
//! [`MAX_CELLS_PER_OBJECT`] cells. Larger objects go into an oversize list that
//! every query includes, so the memory and insert cost of a level stay linear
//! in its object count. Queries return the candidate indices sorted and
//! deduplicated, so callers see candidates in world order no matter how many
//! cells an object spans.

use std::collections::HashMap;

use crate::geometry::Bounds;

/// Default cell side in world units (two actor widths).
pub const DEFAULT_CELL_SIZE: f64 = 64.0;

/// Objects spanning more cells than this are kept out of the cell map.
pub const MAX_CELLS_PER_OBJECT: i128 = 256;

#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
    /// Objects too large for the cell map; returned by every query.
    oversize: Vec<usize>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            oversize: Vec::new(),
        }
    }

    fn cell_range(&self, bounds: &Bounds) -> (i64, i64, i64, i64) {
        let cs = self.cell_size;
        (
            (bounds.left / cs).floor() as i64,
            (bounds.right / cs).floor() as i64,
            (bounds.bottom / cs).floor() as i64,
            (bounds.top / cs).floor() as i64,
        )
    }

    /// Register `index` in every cell covered by `bounds`, or in the oversize
    /// list if that is more than [`MAX_CELLS_PER_OBJECT`] cells.
    pub fn insert(&mut self, index: usize, bounds: &Bounds) {
        let (min_x, max_x, min_y, max_y) = self.cell_range(bounds);
        let span = (i128::from(max_x) - i128::from(min_x) + 1)
            * (i128::from(max_y) - i128::from(min_y) + 1);
        if span > MAX_CELLS_PER_OBJECT {
            self.oversize.push(index);
            return;
        }
        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Indices whose cells overlap `bounds`, ascending and unique.
    ///
    /// This is conservative: callers still run the exact bounds test.
    pub fn query(&self, bounds: &Bounds) -> Vec<usize> {
        let (min_x, max_x, min_y, max_y) = self.cell_range(bounds);
        let mut out = self.oversize.clone();
        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                if let Some(indices) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(indices);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn oversize_count(&self) -> usize {
        self.oversize.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(left: f64, bottom: f64, right: f64, top: f64) -> Bounds {
        Bounds {
            left,
            right,
            bottom,
            top,
        }
    }

    #[test]
    fn query_is_sorted_and_unique() {
        let mut grid = SpatialGrid::new(16.0);
        grid.insert(3, &b(0.0, 0.0, 40.0, 8.0));
        grid.insert(1, &b(10.0, 0.0, 20.0, 8.0));
        assert_eq!(grid.query(&b(0.0, 0.0, 40.0, 8.0)), vec![1, 3]);
    }

    #[test]
    fn touching_boundary_is_found() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(0, &b(0.0, 0.0, 64.0, 10.0));
        assert_eq!(grid.query(&b(64.0, 0.0, 96.0, 10.0)), vec![0]);
    }

    #[test]
    fn distant_query_is_empty() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(0, &b(0.0, 0.0, 10.0, 10.0));
        assert!(grid.query(&b(500.0, 500.0, 532.0, 532.0)).is_empty());
        assert_eq!(grid.cell_count(), 1);
    }

    #[test]
    fn huge_object_bypasses_cell_map() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(0, &b(-1.0e9, -64.0, 1.0e9, -16.0));
        grid.insert(1, &b(0.0, 0.0, 10.0, 10.0));
        assert_eq!(grid.oversize_count(), 1);
        assert_eq!(grid.cell_count(), 1);

        assert_eq!(grid.query(&b(0.0, 0.0, 32.0, 32.0)), vec![0, 1]);
        assert_eq!(grid.query(&b(5.0e8, 500.0, 5.0e8 + 32.0, 532.0)), vec![0]);
    }

    #[test]
    fn object_at_the_cap_still_uses_cells() {
        let mut grid = SpatialGrid::new(64.0);
        // 256 columns by one row.
        grid.insert(0, &b(0.0, 0.0, 256.0 * 64.0 - 1.0, 10.0));
        assert_eq!(grid.oversize_count(), 0);
        assert_eq!(grid.cell_count(), 256);
    }
}
