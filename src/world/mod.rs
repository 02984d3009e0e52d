//! Ground-truth environment grid.
//!
//! The world is a fixed-size grid of occupancy probabilities in `[0, 1]`,
//! loaded from a raster image (darker = more occupied) and resized to the
//! working resolution. Sensing reads this grid; the belief map never does.
//!
//! Storage is row-major and addressed `(row, col)` — rows index y, columns
//! index x.

use std::path::Path;

use image::imageops::{self, FilterType};

use crate::error::{Result, StellarError};

/// Ground-truth occupancy grid.
#[derive(Debug, Clone)]
pub struct WorldGrid {
    /// Occupancy probabilities, row-major: index = row * width + col.
    cells: Vec<f32>,
    width: usize,
    height: usize,
}

impl WorldGrid {
    /// Create an empty (all-free) world.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            cells: vec![0.0; width * height],
            width,
            height,
        }
    }

    /// Build a world from row-major occupancy probabilities.
    ///
    /// Fails if the cell count does not match the dimensions.
    pub fn from_cells(cells: Vec<f32>, width: usize, height: usize) -> Result<Self> {
        if cells.len() != width * height {
            return Err(StellarError::World(format!(
                "cell count {} does not match {}x{} grid",
                cells.len(),
                width,
                height
            )));
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Load a world from a raster image, resized to `size` x `size` cells.
    ///
    /// Pixel intensity maps to occupancy: darker = more occupied
    /// (`p = 1 - pixel / 255`). Nearest-neighbor resize preserves the
    /// relative occupancy ordering.
    pub fn from_image<P: AsRef<Path>>(path: P, size: usize) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| {
                StellarError::World(format!("failed to load map image {}: {}", path.display(), e))
            })?
            .into_luma8();

        let resized = imageops::resize(&img, size as u32, size as u32, FilterType::Nearest);

        let cells = resized
            .pixels()
            .map(|p| 1.0 - f32::from(p.0[0]) / 255.0)
            .collect();

        Ok(Self {
            cells,
            width: size,
            height: size,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Occupancy probability at `(row, col)`.
    ///
    /// Out-of-bounds cells read as fully occupied — the world ends in a wall.
    #[inline]
    pub fn occupancy(&self, row: i32, col: i32) -> f32 {
        if row < 0 || col < 0 {
            return 1.0;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.height || col >= self.width {
            return 1.0;
        }
        self.cells[row * self.width + col]
    }

    /// Whether the cell at `(row, col)` counts as an obstacle.
    #[inline]
    pub fn is_occupied(&self, row: i32, col: i32, threshold: f32) -> bool {
        self.occupancy(row, col) > threshold
    }

    /// Whether `(row, col)` lies inside the grid.
    #[inline]
    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    /// Mark a cell occupied (test and demo setup).
    pub fn set_occupancy(&mut self, row: usize, col: usize, p: f32) {
        if row < self.height && col < self.width {
            self.cells[row * self.width + col] = p;
        }
    }
}
