//! Arrow Key Stepper - cursor navigation over a virtualized grid.
//!
//! Maintains a cursor (scroll-to row/column) and the last reported
//! visible window as signals, and steps the cursor on arrow keys. Two
//! navigation modes:
//!
//! - **Cells**: arrows move the cursor one cell at a time.
//! - **Edges**: arrows jump the cursor just past the visible window's
//!   edge on that axis, paging through the grid.
//!
//! When follow-focus is enabled, every visible-window report arms a
//! debounced reclamp that pulls an out-of-window cursor back inside the
//! window once scrolling settles. Direct cursor writes (e.g. from a cell
//! click) bypass the window and clamp only to the grid extents.
//!
//! # Example
//!
//! ```ignore
//! use spark_grid::components::stepper::{StepperProps, arrow_key_stepper};
//!
//! let (stepper, cleanup) = arrow_key_stepper(StepperProps {
//!     row_count: 150,
//!     column_count: 6,
//!     ..Default::default()
//! });
//!
//! // Arrow keys now move stepper.cursor() while focus is inside it.
//! ```

use spark_signals::{Signal, signal};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::engine::registry;
use crate::state::debounce::{DEFAULT_TIMEOUT_MS, Debouncer};
use crate::state::keyboard;
use crate::types::{CellCoord, Cleanup, NavigationMode, SectionRendered, VisibleWindow};

const ARROW_KEYS: [&str; 4] = ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"];

// =============================================================================
// Props
// =============================================================================

/// Configuration for [`arrow_key_stepper`].
pub struct StepperProps {
    /// Registry ID for the stepper container.
    pub id: Option<String>,
    pub row_count: usize,
    pub column_count: usize,
    pub mode: NavigationMode,
    /// Start with arrow handling disabled (keys are still consumed).
    pub disabled: bool,
    /// Reclamp the cursor into the visible window after scrolling settles.
    pub follow_focus: bool,
    /// Quiet period before the follow-focus reclamp, in milliseconds.
    pub follow_focus_timeout_ms: f64,
    /// Initial cursor position.
    pub scroll_to_row: usize,
    pub scroll_to_column: usize,
}

impl Default for StepperProps {
    fn default() -> Self {
        Self {
            id: None,
            row_count: 0,
            column_count: 0,
            mode: NavigationMode::Cells,
            disabled: false,
            follow_focus: false,
            follow_focus_timeout_ms: DEFAULT_TIMEOUT_MS,
            scroll_to_row: 0,
            scroll_to_column: 0,
        }
    }
}

// =============================================================================
// State
// =============================================================================

pub struct StepperState {
    index: usize,
    row_count: usize,
    column_count: usize,
    mode: NavigationMode,
    follow_focus: bool,
    disabled: Cell<bool>,
    cursor_row: Signal<usize>,
    cursor_column: Signal<usize>,
    window: Signal<VisibleWindow>,
    /// Plain mirror of `window`. Read on paths that may run inside a
    /// caller's effect, where a signal read would subscribe that effect.
    last_window: Cell<VisibleWindow>,
    debounce: RefCell<Debouncer<SectionRendered>>,
}

impl StepperState {
    /// Clamp an index into [0, count), collapsing to 0 when empty.
    fn clamp_index(index: usize, count: usize) -> usize {
        if count == 0 { 0 } else { index.min(count - 1) }
    }

    fn set_cursor_row(&self, row: usize) {
        if self.cursor_row.get() != row {
            self.cursor_row.set(row);
        }
    }

    fn set_cursor_column(&self, column: usize) {
        if self.cursor_column.get() != column {
            self.cursor_column.set(column);
        }
    }

    /// Handle an arrow key. Arrows are always consumed, even when disabled
    /// or at a boundary, so they never fall through to other handlers.
    /// Non-arrow keys are untouched, disabled or not.
    fn handle_arrow(&self, key: &str) -> bool {
        if !ARROW_KEYS.contains(&key) {
            return false;
        }
        if self.disabled.get() {
            return true;
        }

        let window = self.last_window.get();
        match key {
            "ArrowUp" => {
                let current = self.cursor_row.get();
                let target = match self.mode {
                    NavigationMode::Cells => current.saturating_sub(1),
                    NavigationMode::Edges => window.row_start.saturating_sub(1),
                };
                self.set_cursor_row(Self::clamp_index(target, self.row_count));
            }
            "ArrowDown" => {
                let target = match self.mode {
                    NavigationMode::Cells => self.cursor_row.get() + 1,
                    NavigationMode::Edges => window.row_end + 1,
                };
                self.set_cursor_row(Self::clamp_index(target, self.row_count));
            }
            "ArrowLeft" => {
                let current = self.cursor_column.get();
                let target = match self.mode {
                    NavigationMode::Cells => current.saturating_sub(1),
                    NavigationMode::Edges => window.column_start.saturating_sub(1),
                };
                self.set_cursor_column(Self::clamp_index(target, self.column_count));
            }
            "ArrowRight" => {
                let target = match self.mode {
                    NavigationMode::Cells => self.cursor_column.get() + 1,
                    NavigationMode::Edges => window.column_end + 1,
                };
                self.set_cursor_column(Self::clamp_index(target, self.column_count));
            }
            _ => return false,
        }
        true
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle to a mounted arrow-key stepper.
#[derive(Clone)]
pub struct ArrowKeyStepper {
    state: Rc<StepperState>,
}

impl ArrowKeyStepper {
    /// The stepper container's registry index. Cells created under this
    /// index (via the parent context stack) deliver their arrow keys here.
    pub fn index(&self) -> usize {
        self.state.index
    }

    /// Current cursor position.
    pub fn cursor(&self) -> CellCoord {
        CellCoord::new(self.state.cursor_row.get(), self.state.cursor_column.get())
    }

    pub fn cursor_row(&self) -> Signal<usize> {
        self.state.cursor_row.clone()
    }

    pub fn cursor_column(&self) -> Signal<usize> {
        self.state.cursor_column.clone()
    }

    /// The last reported visible window.
    pub fn visible_window(&self) -> VisibleWindow {
        self.state.window.get()
    }

    pub fn window_signal(&self) -> Signal<VisibleWindow> {
        self.state.window.clone()
    }

    /// Enable or disable arrow handling. Disabled arrows are consumed but
    /// move nothing.
    pub fn set_disabled(&self, disabled: bool) {
        self.state.disabled.set(disabled);
    }

    pub fn is_disabled(&self) -> bool {
        self.state.disabled.get()
    }

    /// Feed a key directly (bypassing the keyboard registry). Returns true
    /// if consumed.
    pub fn handle_key(&self, key: &str) -> bool {
        self.state.handle_arrow(key)
    }

    /// Report the currently rendered section.
    ///
    /// Updates the visible-window signal and, when follow-focus is on,
    /// arms the debounced reclamp.
    pub fn on_section_rendered(&self, section: SectionRendered) {
        self.on_section_rendered_at(section, Instant::now());
    }

    pub fn on_section_rendered_at(&self, section: SectionRendered, now: Instant) {
        let window: VisibleWindow = section.into();
        if self.state.last_window.get() != window {
            self.state.last_window.set(window);
            self.state.window.set(window);
        }
        if self.state.follow_focus {
            self.state.debounce.borrow_mut().arm(section, now);
        }
    }

    /// Run the follow-focus reclamp if its quiet period has elapsed.
    ///
    /// Clamps each cursor axis into the settled window:
    /// `max(start, min(stop, cursor))`, then into the grid extents.
    /// Returns true if the cursor moved.
    pub fn poll_follow_focus(&self) -> bool {
        self.poll_follow_focus_at(Instant::now())
    }

    pub fn poll_follow_focus_at(&self, now: Instant) -> bool {
        let fired = self.state.debounce.borrow_mut().fire_due(now);
        let Some(section) = fired else {
            return false;
        };

        let state = &self.state;
        let row = section
            .row_start_index
            .max(section.row_stop_index.min(state.cursor_row.get()));
        let column = section
            .column_start_index
            .max(section.column_stop_index.min(state.cursor_column.get()));

        let row = StepperState::clamp_index(row, state.row_count);
        let column = StepperState::clamp_index(column, state.column_count);

        let moved = row != state.cursor_row.get() || column != state.cursor_column.get();
        state.set_cursor_row(row);
        state.set_cursor_column(column);
        moved
    }

    /// Deadline of the pending reclamp, if any. Feed into the event loop's
    /// poll timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.debounce.borrow().deadline()
    }

    /// Move the cursor row directly, clamped to the grid only: external
    /// selection (e.g. a cell click) overrides the visible window.
    pub fn scroll_to_row(&self, row: usize) {
        self.state
            .set_cursor_row(StepperState::clamp_index(row, self.state.row_count));
    }

    /// Move the cursor column directly, clamped to the grid only.
    pub fn scroll_to_column(&self, column: usize) {
        self.state
            .set_cursor_column(StepperState::clamp_index(column, self.state.column_count));
    }

    /// External selection: move the cursor to a cell, clamped to the grid
    /// only, never against the visible window.
    pub fn on_update_focus(&self, coord: CellCoord) {
        self.scroll_to_row(coord.row);
        self.scroll_to_column(coord.column);
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Mount an arrow-key stepper.
///
/// Allocates a container index and registers a focused key handler for
/// the four arrow keys: while focus is anywhere inside the container's
/// subtree, arrows step the cursor. The returned cleanup removes the
/// handler and releases the index.
pub fn arrow_key_stepper(props: StepperProps) -> (ArrowKeyStepper, Cleanup) {
    let index = registry::allocate_index(props.id.as_deref());

    let state = Rc::new(StepperState {
        index,
        row_count: props.row_count,
        column_count: props.column_count,
        mode: props.mode,
        follow_focus: props.follow_focus,
        disabled: Cell::new(props.disabled),
        cursor_row: signal(StepperState::clamp_index(
            props.scroll_to_row,
            props.row_count,
        )),
        cursor_column: signal(StepperState::clamp_index(
            props.scroll_to_column,
            props.column_count,
        )),
        window: signal(VisibleWindow::default()),
        last_window: Cell::new(VisibleWindow::default()),
        debounce: RefCell::new(Debouncer::new(props.follow_focus_timeout_ms)),
    });

    // One handler per arrow, with the key baked in: dispatch carries the
    // key itself, independent of any last-event bookkeeping. The handlers
    // hold weak refs so cleanup order does not matter.
    let key_cleanups: Vec<Cleanup> = ARROW_KEYS
        .iter()
        .map(|&key| {
            let weak: Weak<StepperState> = Rc::downgrade(&state);
            keyboard::on_focused(index, &[key], move || match weak.upgrade() {
                Some(state) => state.handle_arrow(key),
                None => false,
            })
        })
        .collect();

    let stepper = ArrowKeyStepper { state };

    let cleanup: Cleanup = Box::new(move || {
        for key_cleanup in key_cleanups {
            key_cleanup();
        }
        registry::release_index(index);
    });

    (stepper, cleanup)
}
