//! Uniform 2D broad-phase grid
//!
//! Items are registered in every cell their (inflated) bounds cover. A
//! query walks the same cell range and reports each item once, in the order
//! it was first met.
//!
//! Two addressing modes exist. `Sparse` keys buckets by integer cell
//! coordinates in a hash map and never aliases. `Wrapped` uses a fixed
//! `columns x rows` array and wraps coordinates modulo its size, so two
//! locations exactly `columns * cell_size` apart share a bucket. Use it only
//! when the playfield fits inside the covered extent.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::BoundingBox;
use crate::config::Config;

/// Integer cell coordinate on the XY plane
pub type CellCoord = (i32, i32);

/// How cell coordinates map onto buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridAddressing {
    /// Hash map keyed by cell coordinate, unbounded
    Sparse,
    /// Fixed array, coordinates wrapped modulo the dimensions
    Wrapped {
        /// Number of columns (X)
        columns: u32,
        /// Number of rows (Y)
        rows: u32,
    },
}

/// Grid layout configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of a square cell in world units
    pub cell_size: f32,
    /// Bucket addressing mode
    pub addressing: GridAddressing,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            addressing: GridAddressing::Sparse,
        }
    }
}

impl Config for GridConfig {}

/// Inclusive range of cells covered by some bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    min: CellCoord,
    max: CellCoord,
}

impl CellRange {
    fn iter(self) -> impl Iterator<Item = CellCoord> {
        (self.min.0..=self.max.0).flat_map(move |x| (self.min.1..=self.max.1).map(move |y| (x, y)))
    }
}

enum Buckets<T> {
    Sparse(HashMap<CellCoord, Vec<T>>),
    Wrapped {
        columns: u32,
        rows: u32,
        cells: Vec<Vec<T>>,
    },
}

/// Broad-phase grid over items of type `T` (typically a solid handle)
pub struct Grid<T> {
    cell_size: f32,
    buckets: Buckets<T>,
    entries: usize,
}

impl<T: Copy + Eq + Hash> Grid<T> {
    /// Create an empty grid
    pub fn new(config: GridConfig) -> Self {
        let cell_size = if config.cell_size > 0.0 {
            config.cell_size
        } else {
            log::warn!("Grid cell size {} is not positive, using default", config.cell_size);
            GridConfig::default().cell_size
        };

        let buckets = match config.addressing {
            GridAddressing::Sparse => Buckets::Sparse(HashMap::new()),
            GridAddressing::Wrapped { columns, rows } => {
                let columns = columns.max(1);
                let rows = rows.max(1);
                Buckets::Wrapped {
                    columns,
                    rows,
                    cells: (0..columns as usize * rows as usize).map(|_| Vec::new()).collect(),
                }
            }
        };

        Self {
            cell_size,
            buckets,
            entries: 0,
        }
    }

    /// Cell edge length
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell range covered by `bounds`, inflated by one unit
    fn cell_range(&self, bounds: &BoundingBox) -> CellRange {
        let inflated = bounds.inflate(1.0);
        let min = (
            (inflated.min.x / self.cell_size).floor() as i32,
            (inflated.min.y / self.cell_size).floor() as i32,
        );
        let mut max = (
            (inflated.max.x / self.cell_size).ceil() as i32,
            (inflated.max.y / self.cell_size).ceil() as i32,
        );

        // Wrapped buckets repeat after one full lap; walking further only revisits them
        if let Buckets::Wrapped { columns, rows, .. } = &self.buckets {
            max.0 = max.0.min(min.0.saturating_add(*columns as i32 - 1));
            max.1 = max.1.min(min.1.saturating_add(*rows as i32 - 1));
        }

        CellRange { min, max }
    }

    /// Add `item` to every cell covered by `bounds`
    pub fn insert(&mut self, item: T, bounds: &BoundingBox) {
        let range = self.cell_range(bounds);
        for cell in range.iter() {
            let bucket = self.bucket_mut(cell);
            if !bucket.contains(&item) {
                bucket.push(item);
            }
        }
        self.entries += 1;
    }

    /// Remove `item` from every cell covered by `bounds`
    ///
    /// `bounds` must be the bounds the item was inserted with.
    pub fn remove(&mut self, item: T, bounds: &BoundingBox) {
        let range = self.cell_range(bounds);
        let mut found = false;
        for cell in range.iter() {
            match &mut self.buckets {
                Buckets::Sparse(map) => {
                    let Some(bucket) = map.get_mut(&cell) else {
                        continue;
                    };
                    if let Some(index) = bucket.iter().position(|other| *other == item) {
                        bucket.remove(index);
                        found = true;
                    }
                    if bucket.is_empty() {
                        map.remove(&cell);
                    }
                }
                Buckets::Wrapped { columns, rows, cells } => {
                    let bucket = &mut cells[Self::wrapped_index(cell, *columns, *rows)];
                    if let Some(index) = bucket.iter().position(|other| *other == item) {
                        bucket.remove(index);
                        found = true;
                    }
                }
            }
        }

        if found {
            self.entries = self.entries.saturating_sub(1);
        } else {
            log::debug!("Grid remove found no entry for the given bounds");
        }
    }

    /// Collect every item whose cells overlap `bounds` into `results`
    ///
    /// `results` is cleared first. Each item appears once.
    pub fn query_into(&self, results: &mut Vec<T>, bounds: &BoundingBox) {
        results.clear();
        let mut seen = HashSet::new();
        for cell in self.cell_range(bounds).iter() {
            let Some(bucket) = self.bucket(cell) else {
                continue;
            };
            for item in bucket {
                if seen.insert(*item) {
                    results.push(*item);
                }
            }
        }
    }

    /// Collect every item whose cells overlap `bounds`
    pub fn query(&self, bounds: &BoundingBox) -> Vec<T> {
        let mut results = Vec::new();
        self.query_into(&mut results, bounds);
        results
    }

    /// Number of insertions not yet removed
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether the grid holds no items
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of non-empty buckets
    pub fn cells_occupied(&self) -> usize {
        match &self.buckets {
            Buckets::Sparse(map) => map.len(),
            Buckets::Wrapped { cells, .. } => cells.iter().filter(|bucket| !bucket.is_empty()).count(),
        }
    }

    /// Remove all items
    pub fn clear(&mut self) {
        match &mut self.buckets {
            Buckets::Sparse(map) => map.clear(),
            Buckets::Wrapped { cells, .. } => cells.iter_mut().for_each(Vec::clear),
        }
        self.entries = 0;
    }

    fn wrapped_index(cell: CellCoord, columns: u32, rows: u32) -> usize {
        let x = cell.0.rem_euclid(columns as i32) as usize;
        let y = cell.1.rem_euclid(rows as i32) as usize;
        y * columns as usize + x
    }

    fn bucket(&self, cell: CellCoord) -> Option<&Vec<T>> {
        match &self.buckets {
            Buckets::Sparse(map) => map.get(&cell),
            Buckets::Wrapped { columns, rows, cells } => {
                cells.get(Self::wrapped_index(cell, *columns, *rows))
            }
        }
    }

    fn bucket_mut(&mut self, cell: CellCoord) -> &mut Vec<T> {
        match &mut self.buckets {
            Buckets::Sparse(map) => map.entry(cell).or_default(),
            Buckets::Wrapped { columns, rows, cells } => {
                let index = Self::wrapped_index(cell, *columns, *rows);
                &mut cells[index]
            }
        }
    }
}

impl<T: Copy + Eq + Hash> Default for Grid<T> {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    fn bounds(min: (f32, f32), max: (f32, f32)) -> BoundingBox {
        BoundingBox::new(Vec3::new(min.0, min.1, 0.0), Vec3::new(max.0, max.1, 10.0))
    }

    #[test]
    fn test_insert_query_reports_once_across_cells() {
        let mut grid = Grid::new(GridConfig {
            cell_size: 8.0,
            addressing: GridAddressing::Sparse,
        });
        let b = bounds((-20.0, -20.0), (30.0, 30.0));
        grid.insert(7u32, &b);

        let results = grid.query(&b);
        assert_eq!(results, vec![7]);
        assert!(grid.cells_occupied() > 1);
    }

    #[test]
    fn test_remove_then_query_is_empty() {
        for addressing in [GridAddressing::Sparse, GridAddressing::Wrapped { columns: 4, rows: 4 }] {
            let mut grid = Grid::new(GridConfig {
                cell_size: 16.0,
                addressing,
            });
            let b = bounds((0.0, 0.0), (40.0, 10.0));
            grid.insert(1u32, &b);
            grid.insert(2u32, &bounds((5.0, 5.0), (6.0, 6.0)));
            grid.remove(1, &b);

            assert_eq!(grid.query(&b), vec![2]);
            assert_eq!(grid.len(), 1);
        }
    }

    #[test]
    fn test_query_preserves_first_seen_order() {
        let mut grid = Grid::default();
        let b = bounds((0.0, 0.0), (1.0, 1.0));
        grid.insert(3u32, &b);
        grid.insert(1u32, &b);
        grid.insert(2u32, &b);
        assert_eq!(grid.query(&b), vec![3, 1, 2]);
    }

    #[test]
    fn test_distant_query_misses_in_sparse_mode() {
        let mut grid = Grid::new(GridConfig {
            cell_size: 10.0,
            addressing: GridAddressing::Sparse,
        });
        grid.insert(1u32, &bounds((0.0, 0.0), (5.0, 5.0)));
        assert!(grid.query(&bounds((400.0, 0.0), (405.0, 5.0))).is_empty());
    }

    #[test]
    fn test_wrapped_mode_aliases_one_lap_apart() {
        let mut grid = Grid::new(GridConfig {
            cell_size: 10.0,
            addressing: GridAddressing::Wrapped { columns: 40, rows: 40 },
        });
        grid.insert(1u32, &bounds((2.0, 2.0), (5.0, 5.0)));
        // 40 columns * 10 units: shifted by exactly one lap
        let aliased = grid.query(&bounds((402.0, 2.0), (405.0, 5.0)));
        assert_eq!(aliased, vec![1]);
    }

    #[test]
    fn test_wrapped_negative_coordinates() {
        let mut grid = Grid::new(GridConfig {
            cell_size: 10.0,
            addressing: GridAddressing::Wrapped { columns: 8, rows: 8 },
        });
        let b = bounds((-35.0, -35.0), (-25.0, -25.0));
        grid.insert(9u32, &b);
        assert_eq!(grid.query(&b), vec![9]);
        grid.remove(9, &b);
        assert!(grid.query(&b).is_empty());
    }

    #[test]
    fn test_clear_resets() {
        let mut grid = Grid::default();
        grid.insert(1u32, &bounds((0.0, 0.0), (1.0, 1.0)));
        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.cells_occupied(), 0);
    }
}
