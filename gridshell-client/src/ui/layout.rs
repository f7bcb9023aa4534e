//! Grid layout math
//!
//! Sessions are packed into a near-square grid: columns grow first, so
//! the grid is never taller than it is wide in cell count.

use ratatui::layout::{Constraint, Layout, Rect};

/// Grid dimensions for `n` sessions: (cols, rows)
///
/// cols = ceil(sqrt(n)), rows = ceil(n / cols). Zero sessions yield an
/// empty grid.
pub fn grid_dims(n: usize) -> (usize, usize) {
    if n == 0 {
        return (0, 0);
    }
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);
    (cols, rows)
}

/// One cell per session, assigned row-major
pub fn grid_cells(area: Rect, n: usize) -> Vec<Rect> {
    let (cols, rows) = grid_dims(n);
    if cols == 0 {
        return Vec::new();
    }

    let row_constraints = vec![Constraint::Ratio(1, rows as u32); rows];
    let col_constraints = vec![Constraint::Ratio(1, cols as u32); cols];

    let row_areas = Layout::vertical(row_constraints).split(area);

    let mut cells = Vec::with_capacity(n);
    for row_area in row_areas.iter() {
        let col_areas = Layout::horizontal(col_constraints.clone()).split(*row_area);
        for cell in col_areas.iter() {
            if cells.len() == n {
                break;
            }
            cells.push(*cell);
        }
    }
    cells
}
