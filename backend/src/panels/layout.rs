//! Grid layout for composite figures

use crate::native::GridLayout;
use serde::{Deserialize, Serialize};

/// Requested panel arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelLayout {
    /// Near-square grid
    #[default]
    Auto,
    /// Single row
    Horizontal,
    /// Single column
    Vertical,
    /// Explicit (rows, cols); trimmed when it has more cells than allowed
    Grid { rows: usize, cols: usize },
}

impl PanelLayout {
    /// Grid for `count` panels
    ///
    /// `Auto` uses `cols = ceil(sqrt(n))`, `rows = ceil(n / cols)`.
    pub fn grid_for(&self, count: usize) -> GridLayout {
        match *self {
            PanelLayout::Grid { rows, cols } => GridLayout::new(rows, cols),
            _ if count == 0 => GridLayout::new(0, 0),
            PanelLayout::Horizontal => GridLayout::new(1, count),
            PanelLayout::Vertical => GridLayout::new(count, 1),
            PanelLayout::Auto => {
                let cols = ceil_sqrt(count);
                let rows = count.div_ceil(cols);
                GridLayout::new(rows, cols)
            }
        }
    }
}

/// Fit an explicit grid to `count` panels when it exceeds `limit` cells
///
/// Zero-sized and overflowing grids are `None`. A grid within `limit` is
/// kept as given, otherwise columns shrink to `count` and rows to what
/// those columns need.
pub fn fit_explicit(rows: usize, cols: usize, count: usize, limit: usize) -> Option<GridLayout> {
    let grid = GridLayout::new(rows, cols);
    let capacity = grid.checked_capacity().filter(|&c| c > 0)?;
    if capacity <= limit.max(count) {
        return Some(grid);
    }
    let cols = cols.min(count.max(1));
    let rows = rows.min(count.max(1).div_ceil(cols));
    Some(GridLayout::new(rows, cols))
}

/// Smallest c with c * c >= n
fn ceil_sqrt(n: usize) -> usize {
    let mut c = (n as f64).sqrt() as usize;
    while c * c < n {
        c += 1;
    }
    while c > 1 && (c - 1) * (c - 1) >= n {
        c -= 1;
    }
    c.max(1)
}
