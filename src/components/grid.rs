//! Grid View - the virtualized grid host.
//!
//! Wires the pieces into one widget: a focus trapper around an arrow-key
//! stepper, a scroller that windows the data, and one mounted [`cell`]
//! per visible coordinate. Cells outside the window do not exist as
//! components; scrolling rematerializes the window.
//!
//! The host owns hit-testing (terminal position to cell) and the event
//! plumbing: feed it converted [`InputEvent`]s and poll it with the
//! deadline it reports.
//!
//! # Example
//!
//! ```ignore
//! use spark_grid::components::grid::{GridProps, GridView};
//! use spark_grid::types::CellValues;
//!
//! let values = (0..900).map(|i| format!("cell {i}")).collect();
//! let grid = GridView::mount(GridProps {
//!     values: CellValues::new(values, 6),
//!     viewport_rows: 10,
//!     viewport_columns: 6,
//!     ..Default::default()
//! });
//!
//! // event loop: grid.handle_event(&event); grid.poll();
//! grid.unmount();
//! ```

use spark_signals::{effect, effect_scope, on_scope_dispose};
use std::cell::{Cell as StdCell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use crate::components::cell::{CellProps, cell};
use crate::components::stepper::{ArrowKeyStepper, StepperProps, arrow_key_stepper};
use crate::engine::registry;
use crate::state::debounce::DEFAULT_TIMEOUT_MS;
use crate::state::focus::{self, FocusTrapper, focus_trapper};
use crate::state::input::InputEvent;
use crate::state::mouse::{self, MouseAction, MouseEvent, ScrollDirection};
use crate::state::scroll::GridScroller;
use crate::types::{CellCoord, CellValues, Cleanup, NavigationMode, SectionRendered};

// =============================================================================
// Props
// =============================================================================

/// Configuration for [`GridView::mount`].
pub struct GridProps {
    /// ID prefix for the grid's components (`{id}-cell-{row}-{col}`).
    pub id: String,
    pub values: CellValues,
    /// Viewport size in cells.
    pub viewport_rows: usize,
    pub viewport_columns: usize,
    /// Cell size in terminal cells, for hit-testing.
    pub cell_width: u16,
    pub cell_height: u16,
    pub mode: NavigationMode,
    pub disabled: bool,
    pub follow_focus: bool,
    pub follow_focus_timeout_ms: f64,
    /// Key that triggers `notify` on the focused cell.
    pub acknowledge_key: String,
    /// Called with a cell's content when it is acknowledged.
    pub notify: Option<Rc<dyn Fn(&str)>>,
    /// Called with a cell's coordinate when it is clicked.
    pub on_select: Option<Rc<dyn Fn(CellCoord)>>,
}

impl Default for GridProps {
    fn default() -> Self {
        Self {
            id: "grid".to_string(),
            values: CellValues::new(Vec::new(), 0),
            viewport_rows: 10,
            viewport_columns: 6,
            cell_width: 12,
            cell_height: 1,
            mode: NavigationMode::Cells,
            disabled: false,
            follow_focus: true,
            follow_focus_timeout_ms: DEFAULT_TIMEOUT_MS,
            acknowledge_key: "Enter".to_string(),
            notify: None,
            on_select: None,
        }
    }
}

// =============================================================================
// Grid View
// =============================================================================

/// A mounted grid.
pub struct GridView {
    id: String,
    values: Rc<CellValues>,
    trapper: FocusTrapper,
    stepper: ArrowKeyStepper,
    scroller: Rc<RefCell<GridScroller>>,
    cells: Rc<RefCell<HashMap<CellCoord, Cleanup>>>,
    materialize: Rc<dyn Fn()>,
    report_section: Rc<dyn Fn()>,
    cell_width: u16,
    cell_height: u16,
    cleanups: Vec<Cleanup>,
}

impl GridView {
    /// Mount the grid: trapper, stepper, scroller, and the initial window
    /// of cells.
    pub fn mount(props: GridProps) -> Self {
        let values = Rc::new(props.values);
        let row_count = values.row_count();
        let column_count = values.column_count();

        let (trapper, trapper_cleanup) = focus_trapper(Some(&props.id));

        // The stepper nests inside the trapper so cell focus counts as
        // "inside" and cell keys bubble to the stepper.
        registry::push_parent_context(trapper.container());
        let (stepper, stepper_cleanup) = arrow_key_stepper(StepperProps {
            id: Some(format!("{}-stepper", props.id)),
            row_count,
            column_count,
            mode: props.mode,
            disabled: props.disabled,
            follow_focus: props.follow_focus,
            follow_focus_timeout_ms: props.follow_focus_timeout_ms,
            ..Default::default()
        });
        registry::pop_parent_context();

        let scroller = Rc::new(RefCell::new(GridScroller::new(
            row_count,
            column_count,
            props.viewport_rows,
            props.viewport_columns,
        )));
        let cells: Rc<RefCell<HashMap<CellCoord, Cleanup>>> =
            Rc::new(RefCell::new(HashMap::new()));

        let materialize = Self::materializer(
            props.id.clone(),
            values.clone(),
            stepper.clone(),
            trapper.focused(),
            scroller.clone(),
            cells.clone(),
            props.acknowledge_key.clone(),
            props.notify.clone(),
            props.on_select.clone(),
        );

        // Report a section to the stepper only when it actually changed.
        // Plain-memo comparison, so callers inside effects never read (and
        // subscribe to) the stepper's window signal.
        let last_section: Rc<StdCell<Option<SectionRendered>>> = Rc::new(StdCell::new(None));
        let report_section: Rc<dyn Fn()> = {
            let stepper = stepper.clone();
            let scroller = scroller.clone();
            let last_section = last_section.clone();
            Rc::new(move || {
                let section = scroller.borrow().section();
                if last_section.get() != Some(section) {
                    last_section.set(Some(section));
                    stepper.on_section_rendered(section);
                }
            })
        };

        // Cell components (and their effects) are owned by the scope, not
        // by the tracking effect inside it: the effect re-runs on every
        // cursor move, and cells must outlive those re-runs.
        let scope = effect_scope(false);
        let effect_stepper = stepper.clone();
        let effect_scroller = scroller.clone();
        let effect_materialize = materialize.clone();
        let effect_report = report_section.clone();
        let dispose_cells = cells.clone();
        scope.run(move || {
            // Follows the cursor: establishes reactive dependency on the
            // cursor signals, so arrows, clicks, and the reclamp re-run it.
            // The effect is stopped by scope.stop(), so the returned stop
            // function is unused.
            let _stop = effect(move || {
                let coord = CellCoord::new(
                    effect_stepper.cursor_row().get(),
                    effect_stepper.cursor_column().get(),
                );
                effect_scroller.borrow_mut().scroll_to(coord);
                effect_materialize();
                effect_report();
            });

            // Tear down all live cells when the scope is disposed.
            on_scope_dispose(move || {
                for (_, cleanup) in dispose_cells.borrow_mut().drain() {
                    cleanup();
                }
            });
        });

        Self {
            id: props.id,
            values,
            trapper,
            stepper,
            scroller,
            cells,
            materialize,
            report_section,
            cell_width: props.cell_width,
            cell_height: props.cell_height,
            cleanups: vec![
                Box::new(move || scope.stop()),
                stepper_cleanup,
                trapper_cleanup,
            ],
        }
    }

    /// Build the closure that syncs mounted cells to the visible window.
    #[allow(clippy::too_many_arguments)]
    fn materializer(
        id: String,
        values: Rc<CellValues>,
        stepper: ArrowKeyStepper,
        trap_focused: spark_signals::Signal<bool>,
        scroller: Rc<RefCell<GridScroller>>,
        cells: Rc<RefCell<HashMap<CellCoord, Cleanup>>>,
        acknowledge_key: String,
        notify: Option<Rc<dyn Fn(&str)>>,
        on_select: Option<Rc<dyn Fn(CellCoord)>>,
    ) -> Rc<dyn Fn()> {
        Rc::new(move || {
            let window = scroller.borrow().visible_window();

            // Tear down cells that scrolled out. Blur first if one of them
            // holds focus, so focus never points at a released index.
            let stale: Vec<CellCoord> = cells
                .borrow()
                .keys()
                .filter(|coord| !window.contains(**coord))
                .copied()
                .collect();
            for coord in stale {
                let cell_id = cell_id(&id, coord);
                if let Some(index) = registry::get_index(&cell_id) {
                    if focus::is_focused(index) {
                        focus::blur();
                    }
                }
                if let Some(cleanup) = cells.borrow_mut().remove(&coord) {
                    cleanup();
                }
            }

            // Mount cells that scrolled in, parented under the stepper.
            for row in window.row_start..=window.row_end {
                for column in window.column_start..=window.column_end {
                    let coord = CellCoord::new(row, column);
                    if cells.borrow().contains_key(&coord) {
                        continue;
                    }
                    let Some(content) = values.get(row, column) else {
                        continue;
                    };

                    let cursor_row = stepper.cursor_row();
                    let cursor_column = stepper.cursor_column();
                    let selected = Rc::new(move || {
                        cursor_row.get() == coord.row && cursor_column.get() == coord.column
                    });

                    let select_stepper = stepper.clone();
                    let outer_on_select = on_select.clone();
                    let cell_on_select: Rc<dyn Fn(CellCoord)> = Rc::new(move |coord| {
                        // Clicks override the window: clamp to the grid only.
                        select_stepper.on_update_focus(coord);
                        if let Some(on_select) = &outer_on_select {
                            on_select(coord);
                        }
                    });

                    registry::push_parent_context(stepper.index());
                    let cleanup = cell(CellProps {
                        id: Some(cell_id(&id, coord)),
                        coord,
                        content: content.to_string(),
                        selected,
                        trap_focused: trap_focused.clone(),
                        on_select: Some(cell_on_select),
                        notify: notify.clone(),
                        acknowledge_key: acknowledge_key.clone(),
                    });
                    registry::pop_parent_context();

                    cells.borrow_mut().insert(coord, cleanup);
                }
            }
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The grid's backing values.
    pub fn values(&self) -> &CellValues {
        &self.values
    }

    /// The stepper handle (cursor, window, disabled state).
    pub fn stepper(&self) -> &ArrowKeyStepper {
        &self.stepper
    }

    /// The focus trapper (subtree-focus signal).
    pub fn trapper(&self) -> &FocusTrapper {
        &self.trapper
    }

    /// Number of currently mounted cells.
    pub fn mounted_cells(&self) -> usize {
        self.cells.borrow().len()
    }

    /// Scroll the window without moving the cursor. The follow-focus
    /// reclamp pulls the cursor in once scrolling settles.
    pub fn scroll_by(&self, rows: i64, columns: i64) -> bool {
        let moved = self.scroller.borrow_mut().scroll_by(rows, columns);
        if moved {
            (self.materialize)();
            (self.report_section)();
        }
        moved
    }

    /// Resize the viewport (in cells), re-clamping the window.
    pub fn set_viewport(&self, rows: usize, columns: usize) -> bool {
        let changed = self.scroller.borrow_mut().set_viewport(rows, columns);
        if changed {
            (self.materialize)();
            (self.report_section)();
        }
        changed
    }

    /// Hit-test a terminal position and dispatch a click to the cell
    /// under it. Returns true if a cell was hit.
    pub fn click_at(&self, x: u16, y: u16) -> bool {
        if self.cell_width == 0 || self.cell_height == 0 {
            return false;
        }
        let (row, column) = {
            let scroller = self.scroller.borrow();
            (
                scroller.row_offset() + (y / self.cell_height) as usize,
                scroller.column_offset() + (x / self.cell_width) as usize,
            )
        };
        let coord = CellCoord::new(row, column);
        if !self.scroller.borrow().visible_window().contains(coord) {
            return false;
        }
        let Some(index) = registry::get_index(&cell_id(&self.id, coord)) else {
            return false;
        };
        mouse::dispatch_to(index, &MouseEvent::click(x, y))
    }

    /// Route a converted terminal event through the grid. Returns true if
    /// consumed.
    pub fn handle_event(&self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Key(key) => crate::state::input::route_key(key),
            InputEvent::Mouse(mouse_event) => {
                mouse::update_last_event(*mouse_event);
                match mouse_event.action {
                    MouseAction::Press => self.click_at(mouse_event.x, mouse_event.y),
                    MouseAction::Scroll => match mouse_event.scroll {
                        Some(scroll) => {
                            let (rows, columns) = match scroll.direction {
                                ScrollDirection::Up => (-(scroll.amount as i64), 0),
                                ScrollDirection::Down => (scroll.amount as i64, 0),
                                ScrollDirection::Left => (0, -(scroll.amount as i64)),
                                ScrollDirection::Right => (0, scroll.amount as i64),
                            };
                            self.scroll_by(rows, columns)
                        }
                        None => false,
                    },
                    _ => false,
                }
            }
            InputEvent::Resize(cols, rows) => {
                if self.cell_width == 0 || self.cell_height == 0 {
                    return false;
                }
                self.set_viewport(
                    (*rows / self.cell_height) as usize,
                    (*cols / self.cell_width) as usize,
                )
            }
            InputEvent::None => false,
        }
    }

    /// Run any due follow-focus reclamp. Returns true if the cursor moved.
    pub fn poll(&self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&self, now: Instant) -> bool {
        self.stepper.poll_follow_focus_at(now)
    }

    /// Deadline for the event loop's poll timeout, if a reclamp is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.stepper.next_deadline()
    }

    /// Tear the grid down: the scope (effect + cells), stepper, trapper.
    pub fn unmount(mut self) {
        if self.trapper.is_focused_inside() {
            focus::blur();
        }
        for cleanup in self.cleanups.drain(..) {
            cleanup();
        }
    }
}

fn cell_id(grid_id: &str, coord: CellCoord) -> String {
    format!("{grid_id}-cell-{}-{}", coord.row, coord.column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::keyboard::{self, KeyboardEvent};
    use std::time::Duration;

    fn setup() {
        registry::reset_registry();
        keyboard::reset_keyboard_state();
        mouse::reset_mouse_state();
        focus::reset_focus_state();
    }

    fn demo_values() -> CellValues {
        CellValues::new((0..900).map(|i| format!("cell {i}")).collect(), 6)
    }

    fn demo_grid() -> GridView {
        GridView::mount(GridProps {
            values: demo_values(),
            viewport_rows: 10,
            viewport_columns: 6,
            ..Default::default()
        })
    }

    #[test]
    fn test_mount_materializes_window() {
        setup();
        let grid = demo_grid();

        // 10 x 6 visible cells.
        assert_eq!(grid.mounted_cells(), 60);
        assert!(registry::get_index("grid-cell-0-0").is_some());
        assert!(registry::get_index("grid-cell-9-5").is_some());
        assert!(registry::get_index("grid-cell-10-0").is_none());

        grid.unmount();
        assert_eq!(registry::get_allocated_count(), 0);
    }

    #[test]
    fn test_arrows_move_cursor_and_window() {
        setup();
        let grid = demo_grid();

        // Focus a cell so arrows route to the stepper.
        let first = registry::get_index("grid-cell-0-0").unwrap();
        focus::focus(first);

        for _ in 0..12 {
            crate::state::input::route_key(&KeyboardEvent::new("ArrowDown"));
        }

        assert_eq!(grid.stepper().cursor().row, 12);
        // The window followed the cursor.
        assert!(registry::get_index("grid-cell-12-0").is_some());
        assert!(registry::get_index("grid-cell-0-0").is_none());
        assert_eq!(grid.mounted_cells(), 60);

        // Auto-focus keeps tracking selection through rematerializations.
        let current = registry::get_index("grid-cell-12-0").unwrap();
        assert!(focus::is_focused(current));

        grid.unmount();
    }

    #[test]
    fn test_selected_cell_autofocuses_when_trapped() {
        setup();
        let grid = demo_grid();

        // Click cell (3, 2): cell_width 12, cell_height 1.
        assert!(grid.click_at(2 * 12, 3));
        let clicked = registry::get_index("grid-cell-3-2").unwrap();
        assert!(focus::is_focused(clicked));
        assert_eq!(grid.stepper().cursor(), CellCoord::new(3, 2));
        assert!(grid.trapper().is_focused_inside());

        // Moving the cursor auto-focuses the newly selected cell.
        grid.stepper().handle_key("ArrowRight");
        let next = registry::get_index("grid-cell-3-3").unwrap();
        assert!(focus::is_focused(next));

        grid.unmount();
    }

    #[test]
    fn test_acknowledge_notifies_with_content() {
        setup();

        let notified = Rc::new(RefCell::new(None));
        let notified_clone = notified.clone();
        let grid = GridView::mount(GridProps {
            values: demo_values(),
            notify: Some(Rc::new(move |content| {
                *notified_clone.borrow_mut() = Some(content.to_string());
            })),
            ..Default::default()
        });

        grid.click_at(0, 0);
        assert!(grid.handle_event(&InputEvent::Key(KeyboardEvent::new("Enter"))));
        assert_eq!(*notified.borrow(), Some("cell 0".to_string()));

        grid.unmount();
    }

    #[test]
    fn test_scroll_by_then_reclamp() {
        setup();
        let grid = demo_grid();
        let start = Instant::now();

        grid.click_at(0, 0);
        assert_eq!(grid.stepper().cursor(), CellCoord::new(0, 0));

        // Scrolling moves the window but not the cursor, and the window
        // stays where the user put it until the debounce settles.
        assert!(grid.scroll_by(20, 0));
        assert_eq!(grid.stepper().visible_window().row_start, 20);
        assert!(registry::get_index("grid-cell-20-0").is_some());
        assert!(registry::get_index("grid-cell-0-0").is_none());
        assert_eq!(grid.stepper().cursor().row, 0);

        // Once scrolling settles, the reclamp pulls the cursor in.
        assert!(grid.next_deadline().is_some());
        let deadline = grid.next_deadline().unwrap();
        assert!(grid.poll_at(deadline.max(start) + Duration::from_millis(1)));
        assert_eq!(grid.stepper().cursor().row, 20);

        grid.unmount();
    }

    #[test]
    fn test_scroll_out_blurs_focused_cell() {
        setup();
        let grid = demo_grid();

        grid.click_at(0, 0);
        let focused = registry::get_index("grid-cell-0-0").unwrap();
        assert!(focus::is_focused(focused));

        // Cursor stays at row 0 but we force the window away; the focused
        // cell is torn down, so focus must not dangle.
        grid.stepper().scroll_to_row(100);
        assert!(registry::get_index("grid-cell-0-0").is_none());
        let current = focus::get_focused_index();
        if current >= 0 {
            assert!(registry::is_allocated(current as usize));
        }

        grid.unmount();
    }

    #[test]
    fn test_mouse_scroll_event() {
        setup();
        let grid = demo_grid();

        let event = InputEvent::Mouse(MouseEvent {
            action: MouseAction::Scroll,
            button: mouse::MouseButton::None,
            x: 0,
            y: 0,
            scroll: Some(mouse::ScrollInfo {
                direction: ScrollDirection::Down,
                amount: 3,
            }),
        });
        assert!(grid.handle_event(&event));
        assert!(registry::get_index("grid-cell-3-0").is_some());

        grid.unmount();
    }

    #[test]
    fn test_resize_reclamps_window() {
        setup();
        let grid = demo_grid();

        // 72 cols x 5 rows of terminal -> 5 x 6 cells.
        assert!(grid.handle_event(&InputEvent::Resize(72, 5)));
        assert_eq!(grid.mounted_cells(), 30);

        grid.unmount();
    }

    #[test]
    fn test_click_outside_window_misses() {
        setup();
        let grid = demo_grid();

        // y=50 maps to row 50, outside the 10-row window.
        assert!(!grid.click_at(0, 50));

        grid.unmount();
    }

    #[test]
    fn test_empty_grid() {
        setup();
        let grid = GridView::mount(GridProps {
            values: CellValues::new(Vec::new(), 0),
            ..Default::default()
        });

        assert_eq!(grid.mounted_cells(), 0);
        assert!(grid.stepper().handle_key("ArrowDown"));
        assert_eq!(grid.stepper().cursor(), CellCoord::new(0, 0));

        grid.unmount();
        assert_eq!(registry::get_allocated_count(), 0);
    }

    #[test]
    fn test_ragged_last_row() {
        setup();
        // 8 values over 6 columns: row 1 has only 2 cells.
        let grid = GridView::mount(GridProps {
            values: CellValues::new((0..8).map(|i| i.to_string()).collect(), 6),
            viewport_rows: 10,
            viewport_columns: 6,
            ..Default::default()
        });

        assert_eq!(grid.mounted_cells(), 8);
        assert!(registry::get_index("grid-cell-1-1").is_some());
        assert!(registry::get_index("grid-cell-1-2").is_none());

        grid.unmount();
    }
}
