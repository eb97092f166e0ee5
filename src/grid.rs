use crate::error::{EngineError, Result};
use gas_atoms_common::Vec2;

/// Upper bound on the number of grid cells (two `u32` buffers per cell).
pub const MAX_GRID_CELLS: u64 = 1 << 22;

/// Uniform grid over the arena used as a collision broad phase.
///
/// Atoms are bucketed with a counting sort: `cell_counts` holds the number of atoms
/// per cell, `cell_starts` the prefix sum, and `cell_atom_indices` the atom indices
/// ordered by cell. The cell size must be at least the largest atom diameter so
/// that any overlapping pair lands in the same or an adjacent cell.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    inv_cell_size: f32,
    dim_x: u32,
    dim_y: u32,
    atom_cells: Vec<u32>,
    cell_counts: Vec<u32>,
    cell_starts: Vec<u32>,
    cell_atom_indices: Vec<u32>,
}

impl UniformGrid {
    /// Sizes the grid for a `width` x `height` arena.
    ///
    /// Fails when the arena needs more than [`MAX_GRID_CELLS`] cells.
    pub fn new(cell_size: f32, width: f32, height: f32) -> Result<Self> {
        let too_large = || {
            EngineError::InvalidConfiguration(format!(
                "a {width}x{height} arena needs more than {MAX_GRID_CELLS} grid cells of size {cell_size}"
            ))
        };
        let inv_cell_size = 1.0 / cell_size;
        let cells_along = |extent: f32| -> Option<u32> {
            let n = (f64::from(extent) / f64::from(cell_size)).ceil().max(1.0);
            (n <= MAX_GRID_CELLS as f64).then_some(n as u32)
        };
        let dim_x = cells_along(width).ok_or_else(too_large)?;
        let dim_y = cells_along(height).ok_or_else(too_large)?;
        let num_cells = u64::from(dim_x)
            .checked_mul(u64::from(dim_y))
            .filter(|&n| n <= MAX_GRID_CELLS)
            .ok_or_else(too_large)? as usize;
        Ok(UniformGrid {
            inv_cell_size,
            dim_x,
            dim_y,
            atom_cells: Vec::new(),
            cell_counts: vec![0; num_cells],
            cell_starts: vec![0; num_cells],
            cell_atom_indices: Vec::new(),
        })
    }

    #[cfg(test)]
    fn dims(&self) -> (u32, u32) {
        (self.dim_x, self.dim_y)
    }

    // Positions outside the arena are clamped into the border cells.
    #[inline(always)]
    fn cell_coords(&self, pos: Vec2) -> (u32, u32) {
        let grid_x = (pos.x * self.inv_cell_size).floor() as u32;
        let grid_y = (pos.y * self.inv_cell_size).floor() as u32;
        (grid_x.min(self.dim_x - 1), grid_y.min(self.dim_y - 1))
    }

    #[inline(always)]
    pub fn cell_index(&self, pos: Vec2) -> u32 {
        let (x, y) = self.cell_coords(pos);
        y * self.dim_x + x
    }

    /// Rebuilds the buckets from the current atom centers.
    pub fn rebuild(&mut self, positions: impl ExactSizeIterator<Item = Vec2>) {
        self.atom_cells.clear();
        self.atom_cells.reserve(positions.len());
        self.cell_counts.iter_mut().for_each(|c| *c = 0);

        for pos in positions {
            let cell = self.cell_index(pos);
            self.cell_counts[cell as usize] += 1;
            self.atom_cells.push(cell);
        }

        let mut total = 0;
        for (start, &count) in self.cell_starts.iter_mut().zip(&self.cell_counts) {
            *start = total;
            total += count;
        }

        // Scatter pass; `offsets` tracks the next free slot per cell.
        let mut offsets = self.cell_starts.clone();
        self.cell_atom_indices.clear();
        self.cell_atom_indices.resize(self.atom_cells.len(), 0);
        for (atom_idx, &cell) in self.atom_cells.iter().enumerate() {
            let slot = &mut offsets[cell as usize];
            self.cell_atom_indices[*slot as usize] = atom_idx as u32;
            *slot += 1;
        }
    }

    /// Calls `f` for every atom index bucketed in the 3x3 block of cells around `pos`.
    pub fn for_each_nearby<F>(&self, pos: Vec2, mut f: F)
    where
        F: FnMut(usize),
    {
        let (center_x, center_y) = self.cell_coords(pos);
        let x_range = center_x.saturating_sub(1)..=(center_x + 1).min(self.dim_x - 1);
        for y in center_y.saturating_sub(1)..=(center_y + 1).min(self.dim_y - 1) {
            for x in x_range.clone() {
                let cell = (y * self.dim_x + x) as usize;
                let start = self.cell_starts[cell] as usize;
                let end = start + self.cell_counts[cell] as usize;
                for &atom_idx in &self.cell_atom_indices[start..end] {
                    f(atom_idx as usize);
                }
            }
        }
    }

    /// Unordered candidate pairs `(i, j)` with `i < j`, sorted lexicographically.
    ///
    /// The sort makes the result usable as a drop-in replacement for the
    /// exhaustive `i < j` loop: filtering it by the overlap test yields the same
    /// pairs in the same order.
    pub fn candidate_pairs(&self, positions: &[Vec2]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, &pos) in positions.iter().enumerate() {
            self.for_each_nearby(pos, |j| {
                if j > i {
                    pairs.push((i, j));
                }
            });
        }
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_cover_the_arena() {
        let grid = UniformGrid::new(20.0, 400.0, 310.0).unwrap();
        assert_eq!(grid.dims(), (20, 16));
    }

    #[test]
    fn cell_index_clamps_to_border_cells() {
        let grid = UniformGrid::new(20.0, 100.0, 100.0).unwrap();
        assert_eq!(grid.cell_index(Vec2::new(0.0, 0.0)), 0);
        assert_eq!(grid.cell_index(Vec2::new(100.0, 100.0)), 24);
        assert_eq!(grid.cell_index(Vec2::new(-5.0, 45.0)), 10);
    }

    #[test]
    fn candidate_pairs_include_neighbours_and_skip_distant_atoms() {
        let mut grid = UniformGrid::new(20.0, 200.0, 200.0).unwrap();
        let positions = vec![
            Vec2::new(15.0, 15.0),
            Vec2::new(150.0, 150.0),
            Vec2::new(25.0, 25.0),
            Vec2::new(39.0, 15.0),
        ];
        grid.rebuild(positions.iter().copied());
        let pairs = grid.candidate_pairs(&positions);
        assert_eq!(pairs, vec![(0, 2), (0, 3), (2, 3)]);
    }

    #[test]
    fn rebuild_buckets_every_atom_once() {
        let mut grid = UniformGrid::new(10.0, 50.0, 50.0).unwrap();
        let positions: Vec<Vec2> = (0..12)
            .map(|i| Vec2::new((i * 4) as f32, (i * 3) as f32))
            .collect();
        grid.rebuild(positions.iter().copied());
        let mut seen = grid.cell_atom_indices.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<u32>>());
    }

    #[test]
    fn oversized_arena_is_rejected() {
        assert!(matches!(
            UniformGrid::new(20.0, 2.0e6, 2.0e6),
            Err(EngineError::InvalidConfiguration(_))
        ));
        // One axis alone past the cap.
        assert!(UniformGrid::new(1.0, 1.0e10, 20.0).is_err());
        // Exactly at the cap is fine.
        let grid = UniformGrid::new(1.0, 2048.0, 2048.0).unwrap();
        assert_eq!(grid.dims(), (2048, 2048));
    }
}
