//! Mouse State - Pointer events and per-component handlers.
//!
//! Components register click/scroll handlers against their registry index.
//! The host resolves hit-testing (which component a pointer position maps
//! to) and dispatches to that index.

use spark_signals::{Signal, signal};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::Cleanup;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    Move,
    Drag,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollInfo {
    pub direction: ScrollDirection,
    pub amount: i16,
}

/// A mouse event in terminal cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub action: MouseAction,
    pub button: MouseButton,
    pub x: u16,
    pub y: u16,
    pub scroll: Option<ScrollInfo>,
}

impl MouseEvent {
    /// A left-button press at terminal position (x, y).
    pub fn click(x: u16, y: u16) -> Self {
        Self {
            action: MouseAction::Press,
            button: MouseButton::Left,
            x,
            y,
            scroll: None,
        }
    }
}

/// Handlers a component can attach.
#[derive(Clone, Default)]
pub struct MouseHandlers {
    pub on_click: Option<Rc<dyn Fn(&MouseEvent)>>,
    pub on_scroll: Option<Rc<dyn Fn(&MouseEvent)>>,
}

// =============================================================================
// State
// =============================================================================

thread_local! {
    /// Handlers keyed by component index.
    static HANDLERS: RefCell<HashMap<usize, MouseHandlers>> = RefCell::new(HashMap::new());

    /// Last mouse event, as a signal for reactive consumers.
    static LAST_EVENT: Signal<Option<MouseEvent>> = signal(None);
}

/// Record the latest mouse event.
pub fn update_last_event(event: MouseEvent) {
    LAST_EVENT.with(|last| last.set(Some(event)));
}

/// Get the last mouse event, if any.
pub fn last_event() -> Option<MouseEvent> {
    LAST_EVENT.with(|last| last.get())
}

// =============================================================================
// Registration and Dispatch
// =============================================================================

/// Attach mouse handlers to a component index.
pub fn on_component(index: usize, handlers: MouseHandlers) -> Cleanup {
    HANDLERS.with(|map| {
        map.borrow_mut().insert(index, handlers);
    });
    Box::new(move || {
        HANDLERS.with(|map| {
            map.borrow_mut().remove(&index);
        });
    })
}

/// Dispatch a mouse event to the component at `index`.
///
/// Returns true if a handler was invoked.
pub fn dispatch_to(index: usize, event: &MouseEvent) -> bool {
    let handlers = HANDLERS.with(|map| map.borrow().get(&index).cloned());
    let Some(handlers) = handlers else {
        return false;
    };

    match event.action {
        MouseAction::Press => {
            if let Some(on_click) = handlers.on_click {
                on_click(event);
                return true;
            }
        }
        MouseAction::Scroll => {
            if let Some(on_scroll) = handlers.on_scroll {
                on_scroll(event);
                return true;
            }
        }
        _ => {}
    }
    false
}

/// Remove all handlers for a component index.
pub fn cleanup_index(index: usize) {
    HANDLERS.with(|map| {
        map.borrow_mut().remove(&index);
    });
}

/// Reset all mouse state (for testing).
pub fn reset_mouse_state() {
    HANDLERS.with(|map| map.borrow_mut().clear());
    LAST_EVENT.with(|last| last.set(None));
}
