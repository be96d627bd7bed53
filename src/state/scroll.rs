//! Scroll State - viewport windowing over a virtualized grid.
//!
//! [`GridScroller`] maps a viewport (rows x columns of visible cells) and
//! scroll offsets onto the full grid, producing the visible window that
//! drives cell materialization. Only cells inside the window exist as
//! components; scrolling shifts the window and the host rematerializes.

use crate::types::{CellCoord, SectionRendered, VisibleWindow};

/// Tracks scroll offsets and computes the visible cell window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridScroller {
    row_count: usize,
    column_count: usize,
    viewport_rows: usize,
    viewport_columns: usize,
    row_offset: usize,
    column_offset: usize,
}

impl GridScroller {
    pub fn new(
        row_count: usize,
        column_count: usize,
        viewport_rows: usize,
        viewport_columns: usize,
    ) -> Self {
        Self {
            row_count,
            column_count,
            viewport_rows,
            viewport_columns,
            row_offset: 0,
            column_offset: 0,
        }
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn column_offset(&self) -> usize {
        self.column_offset
    }

    /// Largest valid row offset for the current extents.
    fn max_row_offset(&self) -> usize {
        self.row_count.saturating_sub(self.viewport_rows)
    }

    fn max_column_offset(&self) -> usize {
        self.column_count.saturating_sub(self.viewport_columns)
    }

    /// Resize the viewport, re-clamping offsets. Returns true if anything
    /// changed.
    pub fn set_viewport(&mut self, rows: usize, columns: usize) -> bool {
        if self.viewport_rows == rows && self.viewport_columns == columns {
            return false;
        }
        self.viewport_rows = rows;
        self.viewport_columns = columns;
        self.row_offset = self.row_offset.min(self.max_row_offset());
        self.column_offset = self.column_offset.min(self.max_column_offset());
        true
    }

    /// The window of currently visible cells (end-inclusive).
    ///
    /// Degenerate all-zero window when the grid or viewport is empty.
    pub fn visible_window(&self) -> VisibleWindow {
        if self.row_count == 0
            || self.column_count == 0
            || self.viewport_rows == 0
            || self.viewport_columns == 0
        {
            return VisibleWindow::default();
        }
        let row_end = (self.row_offset + self.viewport_rows - 1).min(self.row_count - 1);
        let column_end =
            (self.column_offset + self.viewport_columns - 1).min(self.column_count - 1);
        VisibleWindow {
            row_start: self.row_offset,
            row_end,
            column_start: self.column_offset,
            column_end,
        }
    }

    /// The visible window in render-notification form.
    pub fn section(&self) -> SectionRendered {
        self.visible_window().into()
    }

    /// Scroll the minimum amount needed to bring `coord` into view.
    ///
    /// Coordinates beyond the grid clamp to the last row/column. Returns
    /// true if the window moved.
    pub fn scroll_to(&mut self, coord: CellCoord) -> bool {
        if self.row_count == 0 || self.column_count == 0 {
            return false;
        }
        let row = coord.row.min(self.row_count - 1);
        let column = coord.column.min(self.column_count - 1);
        let window = self.visible_window();

        let mut moved = false;
        if row < window.row_start {
            self.row_offset = row;
            moved = true;
        } else if row > window.row_end {
            self.row_offset =
                (row + 1).saturating_sub(self.viewport_rows).min(self.max_row_offset());
            moved = true;
        }
        if column < window.column_start {
            self.column_offset = column;
            moved = true;
        } else if column > window.column_end {
            self.column_offset = (column + 1)
                .saturating_sub(self.viewport_columns)
                .min(self.max_column_offset());
            moved = true;
        }
        moved
    }

    /// Scroll by a signed delta of rows and columns, clamped at the grid
    /// edges. Returns false when already at the boundary in both axes.
    pub fn scroll_by(&mut self, rows: i64, columns: i64) -> bool {
        let new_row = clamp_offset(self.row_offset, rows, self.max_row_offset());
        let new_column = clamp_offset(self.column_offset, columns, self.max_column_offset());
        let moved = new_row != self.row_offset || new_column != self.column_offset;
        self.row_offset = new_row;
        self.column_offset = new_column;
        moved
    }
}

fn clamp_offset(current: usize, delta: i64, max: usize) -> usize {
    let target = current as i64 + delta;
    target.clamp(0, max as i64) as usize
}
