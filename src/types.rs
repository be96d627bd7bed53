//! Core types for spark-grid.
//!
//! These types define the vocabulary the whole widget speaks: the logical
//! cursor, the visible window reported by the scroller, the navigation mode,
//! and the row-major dataset view cells render from.

// =============================================================================
// Cleanup
// =============================================================================

/// Cleanup function returned by component constructors.
/// Call it to release all resources the component allocated.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// CellCoord
// =============================================================================

/// A logical (row, column) grid coordinate.
///
/// This is the unit of selection: the stepper owns exactly one of these as
/// its cursor, independent of what is currently rendered or focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellCoord {
    pub row: usize,
    pub column: usize,
}

impl CellCoord {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

// =============================================================================
// VisibleWindow
// =============================================================================

/// The inclusive row/column index ranges currently rendered by the scroller.
///
/// Owned by the stepper, written only from section-rendered notifications.
/// The default is the empty window at the origin - the stepper's state before
/// the first notification arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub column_start: usize,
    pub column_end: usize,
}

impl VisibleWindow {
    pub const fn new(
        row_start: usize,
        row_end: usize,
        column_start: usize,
        column_end: usize,
    ) -> Self {
        Self {
            row_start,
            row_end,
            column_start,
            column_end,
        }
    }

    /// Check whether a coordinate falls inside both inclusive ranges.
    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.row >= self.row_start
            && coord.row <= self.row_end
            && coord.column >= self.column_start
            && coord.column <= self.column_end
    }
}

// =============================================================================
// SectionRendered
// =============================================================================

/// The wire shape of a virtualization engine's "section rendered" notification.
///
/// Field names follow the engine contract: start/stop are inclusive indices
/// of the rendered section on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRendered {
    pub column_start_index: usize,
    pub column_stop_index: usize,
    pub row_start_index: usize,
    pub row_stop_index: usize,
}

impl From<SectionRendered> for VisibleWindow {
    fn from(section: SectionRendered) -> Self {
        Self {
            row_start: section.row_start_index,
            row_end: section.row_stop_index,
            column_start: section.column_start_index,
            column_end: section.column_stop_index,
        }
    }
}

impl From<VisibleWindow> for SectionRendered {
    fn from(window: VisibleWindow) -> Self {
        Self {
            column_start_index: window.column_start,
            column_stop_index: window.column_end,
            row_start_index: window.row_start,
            row_stop_index: window.row_end,
        }
    }
}

// =============================================================================
// NavigationMode
// =============================================================================

/// How arrow keys move the cursor.
///
/// - `Cells`: one cell per keypress, clamped to the grid.
/// - `Edges`: jump to one past the visible window's trailing edge (Down/Right)
///   or one before its leading edge (Up/Left) - screenful navigation driven by
///   whatever is currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationMode {
    #[default]
    Cells,
    Edges,
}

// =============================================================================
// CellValues
// =============================================================================

/// Read-only, row-major cell values.
///
/// Value `(row, column)` lives at `row * column_count + column`. The last row
/// may be partial; `get` returns `None` past the end of the data.
#[derive(Debug, Clone, Default)]
pub struct CellValues {
    values: Vec<String>,
    column_count: usize,
}

impl CellValues {
    pub fn new(values: Vec<String>, column_count: usize) -> Self {
        Self {
            values,
            column_count,
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Number of rows, counting a trailing partial row as a full row.
    pub fn row_count(&self) -> usize {
        if self.column_count == 0 {
            return 0;
        }
        self.values.len().div_ceil(self.column_count)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        if self.column_count == 0 || column >= self.column_count {
            return None;
        }
        self.values
            .get(row * self.column_count + column)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_contains() {
        let window = VisibleWindow::new(2, 9, 0, 5);

        assert!(window.contains(CellCoord::new(2, 0)));
        assert!(window.contains(CellCoord::new(9, 5)));
        assert!(window.contains(CellCoord::new(4, 2)));
        assert!(!window.contains(CellCoord::new(1, 0)));
        assert!(!window.contains(CellCoord::new(10, 0)));
        assert!(!window.contains(CellCoord::new(4, 6)));
    }

    #[test]
    fn test_section_window_conversion() {
        let section = SectionRendered {
            column_start_index: 1,
            column_stop_index: 4,
            row_start_index: 20,
            row_stop_index: 30,
        };

        let window = VisibleWindow::from(section);
        assert_eq!(window, VisibleWindow::new(20, 30, 1, 4));
        assert_eq!(SectionRendered::from(window), section);
    }

    #[test]
    fn test_cell_values_indexing() {
        let values = CellValues::new((0..10).map(|i| i.to_string()).collect(), 3);

        assert_eq!(values.column_count(), 3);
        // 10 values in 3 columns: 4 rows, last one partial
        assert_eq!(values.row_count(), 4);
        assert_eq!(values.get(0, 0), Some("0"));
        assert_eq!(values.get(1, 2), Some("5"));
        assert_eq!(values.get(3, 0), Some("9"));
        assert_eq!(values.get(3, 1), None);
        assert_eq!(values.get(0, 3), None);
    }

    #[test]
    fn test_cell_values_zero_columns() {
        let values = CellValues::new(vec!["a".to_string()], 0);

        assert_eq!(values.row_count(), 0);
        assert_eq!(values.get(0, 0), None);
    }
}
