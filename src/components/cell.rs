//! Cell - a focusable grid cell.
//!
//! A cell takes focus automatically when it becomes the selected cell
//! while focus is trapped inside the grid, mirroring roving tabindex in
//! accessible grid widgets. Clicking a cell focuses it and reports its
//! coordinate; an acknowledge key (Enter by default) on a focused cell
//! notifies the host with the cell's content.

use spark_signals::{Signal, effect};
use std::cell::Cell as StdCell;
use std::rc::Rc;

use crate::engine::registry;
use crate::state::{focus, keyboard, mouse};
use crate::types::{CellCoord, Cleanup};

/// Configuration for [`cell`].
pub struct CellProps {
    /// Registry ID. Hosts use deterministic IDs to find cells later.
    pub id: Option<String>,
    pub coord: CellCoord,
    pub content: String,
    /// Whether this cell is the grid's selected cell. Read inside an
    /// effect, so it should read signals (e.g. the stepper's cursor).
    pub selected: Rc<dyn Fn() -> bool>,
    /// The grid's focus-trapper signal.
    pub trap_focused: Signal<bool>,
    /// Called with the cell's coordinate when it is clicked.
    pub on_select: Option<Rc<dyn Fn(CellCoord)>>,
    /// Called with the cell's content on the acknowledge key.
    pub notify: Option<Rc<dyn Fn(&str)>>,
    /// Key that triggers `notify` while the cell is focused.
    pub acknowledge_key: String,
}

/// Mount a cell. The returned cleanup tears down its handlers and
/// releases its registry index.
pub fn cell(props: CellProps) -> Cleanup {
    let index = registry::allocate_index(props.id.as_deref());
    registry::set_focusable(index, true);

    // Click: take focus, then report the selection.
    let coord = props.coord;
    let on_select = props.on_select.clone();
    let mouse_cleanup = mouse::on_component(
        index,
        mouse::MouseHandlers {
            on_click: Some(Rc::new(move |_event| {
                focus::focus(index);
                if let Some(on_select) = &on_select {
                    on_select(coord);
                }
            })),
            ..Default::default()
        },
    );

    // Acknowledge key: notify with content, consumed.
    let notify = props.notify.clone();
    let content = props.content.clone();
    let key_cleanup = keyboard::on_focused(index, &[props.acknowledge_key.as_str()], move || {
        match &notify {
            Some(notify) => {
                notify(&content);
                true
            }
            None => false,
        }
    });

    // Auto-focus on the false -> true transition of selected && trapped.
    // The memo keeps a user moving focus elsewhere from being yanked back
    // while the conjunction stays true.
    let selected = props.selected.clone();
    let trap_focused = props.trap_focused.clone();
    let was_active = Rc::new(StdCell::new(false));
    let stop_effect = effect(move || {
        let active = selected() && trap_focused.get();
        if active && !was_active.get() {
            focus::focus(index);
        }
        was_active.set(active);
    });

    Box::new(move || {
        stop_effect();
        key_cleanup();
        mouse_cleanup();
        keyboard::cleanup_index(index);
        mouse::cleanup_index(index);
        registry::release_index(index);
    })
}
