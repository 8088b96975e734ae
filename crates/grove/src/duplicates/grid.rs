//! Uniform grid for finding candidate pairs of nearby points.

use std::collections::HashMap;

/// Buckets point indices by grid cell.
///
/// With cells at least as wide as the proximity threshold, any pair closer
/// than the threshold lies in the same or an adjacent cell, so only the 3x3
/// neighbourhood of a point needs to be compared.
#[derive(Debug)]
pub(crate) struct SpatialGrid {
    cell: f64,
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Build a grid for points given as `(latitude, longitude)`.
    pub(crate) fn build(threshold: f64, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        // Slightly wider than the threshold so float rounding in the division
        // can never put a near pair two cells apart.
        let cell = threshold * (1.0 + 1e-9);
        let mut grid = Self {
            cell,
            buckets: HashMap::new(),
        };
        for (index, (lat, lon)) in points.into_iter().enumerate() {
            let key = grid.cell_of(lat, lon);
            grid.buckets.entry(key).or_default().push(index);
        }
        grid
    }

    // Float-to-int casts saturate, so extreme ratios collapse into the edge
    // cells instead of wrapping.
    fn cell_of(&self, lat: f64, lon: f64) -> (i64, i64) {
        ((lat / self.cell).floor() as i64, (lon / self.cell).floor() as i64)
    }

    /// Indices in the cell of `(lat, lon)` and the eight cells around it.
    pub(crate) fn neighbours(&self, lat: f64, lon: f64) -> impl Iterator<Item = usize> + '_ {
        let (row, col) = self.cell_of(lat, lon);
        (-1i64..=1)
            .flat_map(move |dr| {
                (-1i64..=1).filter_map(move |dc| Some((row.checked_add(dr)?, col.checked_add(dc)?)))
            })
            .filter_map(move |key| self.buckets.get(&key))
            .flatten()
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbours_include_adjacent_cells() {
        let points = vec![(0.00005, 0.00005), (0.00015, 0.00005), (0.00100, 0.00100)];
        let grid = SpatialGrid::build(0.0001, points);

        let mut near: Vec<usize> = grid.neighbours(0.00005, 0.00005).collect();
        near.sort();
        assert_eq!(near, vec![0, 1]);
    }

    #[test]
    fn test_saturated_cells_do_not_overflow() {
        let points = vec![(43.0, 76.0), (43.0, 76.0), (-43.0, -76.0)];
        let grid = SpatialGrid::build(1e-300, points);
        assert_eq!(grid.neighbours(43.0, 76.0).count(), 2);
        assert_eq!(grid.neighbours(-43.0, -76.0).count(), 1);
    }

    #[test]
    fn test_negative_coordinates_bucket_correctly() {
        let points = vec![(-0.00001, -0.00001), (0.00001, 0.00001)];
        let grid = SpatialGrid::build(0.0001, points);
        assert_eq!(grid.neighbours(0.00001, 0.00001).count(), 2);
    }
}
