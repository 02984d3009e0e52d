//! Bresenham rasterization over grid cells.
//!
//! Integer line traversal visits every cell between two endpoints exactly
//! once with no gaps. Ray-cast sensing, landmark stamping and the path
//! smoother's line-of-sight test all walk cells through this iterator;
//! skipping cells on a coarse grid would mean missing obstacles.

/// Iterator over the cells of a discrete line from `(col0, row0)` to
/// `(col1, row1)`, endpoints inclusive.
#[derive(Debug, Clone)]
pub struct RayIter {
    col: i32,
    row: i32,
    col1: i32,
    row1: i32,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    finished: bool,
}

impl RayIter {
    pub fn new(col0: i32, row0: i32, col1: i32, row1: i32) -> Self {
        let dx = (col1 - col0).abs();
        let dy = (row1 - row0).abs();
        let sx = if col0 < col1 { 1 } else { -1 };
        let sy = if row0 < row1 { 1 } else { -1 };

        Self {
            col: col0,
            row: row0,
            col1,
            row1,
            dx,
            dy,
            sx,
            sy,
            err: dx - dy,
            finished: false,
        }
    }
}

impl Iterator for RayIter {
    /// `(col, row)` of the next cell on the line.
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = (self.col, self.row);

        if self.col == self.col1 && self.row == self.row1 {
            self.finished = true;
            return Some(result);
        }

        let e2 = 2 * self.err;

        if e2 > -self.dy {
            self.err -= self.dy;
            self.col += self.sx;
        }

        if e2 < self.dx {
            self.err += self.dx;
            self.row += self.sy;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let cells: Vec<_> = RayIter::new(0, 0, 5, 0).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (0, 0));
        assert_eq!(cells[5], (5, 0));
        assert!(cells.iter().all(|&(_, row)| row == 0));
    }

    #[test]
    fn test_vertical_line() {
        let cells: Vec<_> = RayIter::new(0, 0, 0, 5).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], (0, 0));
        assert_eq!(cells[5], (0, 5));
    }

    #[test]
    fn test_diagonal_line() {
        let cells: Vec<_> = RayIter::new(0, 0, 5, 5).collect();
        assert!(cells.len() >= 6);
        assert_eq!(cells[0], (0, 0));
        assert_eq!(*cells.last().unwrap(), (5, 5));
    }

    #[test]
    fn test_negative_direction() {
        let cells: Vec<_> = RayIter::new(5, 5, 0, 0).collect();
        assert_eq!(cells[0], (5, 5));
        assert_eq!(*cells.last().unwrap(), (0, 0));
    }

    #[test]
    fn test_no_gaps() {
        // Each step moves by at most one cell per axis
        let cells: Vec<_> = RayIter::new(0, 0, 7, 3).collect();
        for pair in cells.windows(2) {
            let (c0, r0) = pair[0];
            let (c1, r1) = pair[1];
            assert!((c1 - c0).abs() <= 1 && (r1 - r0).abs() <= 1);
        }
    }

    #[test]
    fn test_degenerate_single_cell() {
        let cells: Vec<_> = RayIter::new(3, 3, 3, 3).collect();
        assert_eq!(cells, vec![(3, 3)]);
    }
}
