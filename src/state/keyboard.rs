//! Keyboard State - Key events and handler dispatch.
//!
//! Tracks the last key event in a signal and routes key presses through
//! three handler registries:
//! - Global handlers (see every key)
//! - Key-specific handlers (fire for a named key)
//! - Focused handlers (fire only while their component holds focus)
//!
//! A handler returning `true` consumes the event: no further handlers run
//! and the key does not fall through to defaults.
//!
//! # Example
//!
//! ```ignore
//! use spark_grid::state::keyboard;
//!
//! let cleanup = keyboard::on_key("Escape", || {
//!     println!("escape pressed");
//!     true // consumed
//! });
//!
//! // later
//! cleanup();
//! ```

use spark_signals::{Signal, signal};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::Cleanup;

// =============================================================================
// Types
// =============================================================================

/// Modifier key state for a keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const fn none() -> Self {
        Self {
            ctrl: false,
            alt: false,
            shift: false,
        }
    }

    pub const fn ctrl() -> Self {
        Self {
            ctrl: true,
            alt: false,
            shift: false,
        }
    }

    pub const fn alt() -> Self {
        Self {
            ctrl: false,
            alt: true,
            shift: false,
        }
    }

    pub const fn shift() -> Self {
        Self {
            ctrl: false,
            alt: false,
            shift: true,
        }
    }
}

/// Whether a key went down, repeated, or was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A keyboard event as seen by handlers.
///
/// `key` uses web-style names: `"ArrowUp"`, `"ArrowDown"`, `"ArrowLeft"`,
/// `"ArrowRight"`, `"Enter"`, `"Escape"`, `"Tab"`, `"Backspace"`, single
/// characters as themselves (`"a"`, `"1"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: String,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyboardEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::none(),
            state: KeyState::Press,
        }
    }

    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            state: KeyState::Press,
        }
    }
}

/// A handler that receives the full event. Returns true if consumed.
pub type KeyHandler = Rc<dyn Fn(&KeyboardEvent) -> bool>;

/// A handler bound to specific keys. Returns true if consumed.
pub type BoundHandler = Rc<dyn Fn() -> bool>;

// =============================================================================
// State
// =============================================================================

struct KeyboardRegistry {
    /// Global handlers, in registration order.
    global: Vec<(usize, KeyHandler)>,
    /// Handlers bound to specific key names.
    by_key: HashMap<String, Vec<(usize, BoundHandler)>>,
    /// Handlers active only while their component index is focused.
    focused: HashMap<usize, Vec<(usize, Vec<String>, BoundHandler)>>,
    next_id: usize,
}

impl KeyboardRegistry {
    fn new() -> Self {
        Self {
            global: Vec::new(),
            by_key: HashMap::new(),
            focused: HashMap::new(),
            next_id: 0,
        }
    }
}

thread_local! {
    static REGISTRY: RefCell<KeyboardRegistry> = RefCell::new(KeyboardRegistry::new());

    /// Last keyboard event, as a signal for reactive consumers.
    static LAST_EVENT: Signal<Option<KeyboardEvent>> = signal(None);
}

// =============================================================================
// Event Tracking
// =============================================================================

/// Record the latest keyboard event.
pub fn update_last_event(event: KeyboardEvent) {
    LAST_EVENT.with(|last| last.set(Some(event)));
}

/// Get the last keyboard event, if any.
pub fn last_event() -> Option<KeyboardEvent> {
    LAST_EVENT.with(|last| last.get())
}

/// Get the key name of the last event, if any.
pub fn last_key() -> Option<String> {
    last_event().map(|event| event.key)
}

// =============================================================================
// Registration
// =============================================================================

/// Register a global handler that sees every key press.
pub fn on(handler: impl Fn(&KeyboardEvent) -> bool + 'static) -> Cleanup {
    let id = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.global.push((id, Rc::new(handler)));
        id
    });

    Box::new(move || {
        REGISTRY.with(|registry| {
            registry
                .borrow_mut()
                .global
                .retain(|(handler_id, _)| *handler_id != id);
        });
    })
}

/// Register a handler for a single key name.
pub fn on_key(key: impl Into<String>, handler: impl Fn() -> bool + Clone + 'static) -> Cleanup {
    let key = key.into();
    on_keys(&[key.as_str()], handler)
}

/// Register one handler for several key names at once.
pub fn on_keys(keys: &[&str], handler: impl Fn() -> bool + Clone + 'static) -> Cleanup {
    let ids: Vec<(String, usize)> = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        keys.iter()
            .map(|key| {
                let id = registry.next_id;
                registry.next_id += 1;
                let handler: BoundHandler = Rc::new(handler.clone());
                registry
                    .by_key
                    .entry(key.to_string())
                    .or_default()
                    .push((id, handler));
                (key.to_string(), id)
            })
            .collect()
    });

    Box::new(move || {
        REGISTRY.with(|registry| {
            let mut registry = registry.borrow_mut();
            for (key, id) in &ids {
                if let Some(handlers) = registry.by_key.get_mut(key) {
                    handlers.retain(|(handler_id, _)| handler_id != id);
                }
            }
        });
    })
}

/// Register a handler that fires for `keys` only while `index` is focused.
pub fn on_focused(
    index: usize,
    keys: &[&str],
    handler: impl Fn() -> bool + 'static,
) -> Cleanup {
    let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
    let id = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .focused
            .entry(index)
            .or_default()
            .push((id, keys, Rc::new(handler)));
        id
    });

    Box::new(move || {
        REGISTRY.with(|registry| {
            let mut registry = registry.borrow_mut();
            if let Some(handlers) = registry.focused.get_mut(&index) {
                handlers.retain(|(handler_id, _, _)| *handler_id != id);
            }
        });
    })
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch an event to global and key-bound handlers.
///
/// Only `Press` events are dispatched. Returns true if any handler consumed
/// the event.
pub fn dispatch(event: &KeyboardEvent) -> bool {
    if event.state != KeyState::Press {
        return false;
    }
    dispatch_to_handlers(event)
}

/// Run global handlers, then key-bound handlers, stopping at the first
/// consumer.
pub fn dispatch_to_handlers(event: &KeyboardEvent) -> bool {
    let global: Vec<KeyHandler> = REGISTRY.with(|registry| {
        registry
            .borrow()
            .global
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect()
    });
    for handler in global {
        if handler(event) {
            return true;
        }
    }

    let bound: Vec<BoundHandler> = REGISTRY.with(|registry| {
        registry
            .borrow()
            .by_key
            .get(&event.key)
            .map(|handlers| {
                handlers
                    .iter()
                    .map(|(_, handler)| handler.clone())
                    .collect()
            })
            .unwrap_or_default()
    });
    for handler in bound {
        if handler() {
            return true;
        }
    }

    false
}

/// Dispatch an event to the focused component's handlers (and its ancestors').
///
/// Walks up the component tree from `index` so containers can handle keys
/// their children do not. Returns true if consumed.
pub fn dispatch_focused(index: usize, event: &KeyboardEvent) -> bool {
    let mut current = Some(index);
    while let Some(idx) = current {
        let handlers: Vec<BoundHandler> = REGISTRY.with(|registry| {
            registry
                .borrow()
                .focused
                .get(&idx)
                .map(|handlers| {
                    handlers
                        .iter()
                        .filter(|(_, keys, _)| keys.iter().any(|key| *key == event.key))
                        .map(|(_, _, handler)| handler.clone())
                        .collect()
                })
                .unwrap_or_default()
        });
        for handler in handlers {
            if handler() {
                return true;
            }
        }
        current = crate::engine::registry::get_parent_index(idx);
    }
    false
}

// =============================================================================
// Cleanup
// =============================================================================

/// Remove all focused handlers for a component index.
pub fn cleanup_index(index: usize) {
    REGISTRY.with(|registry| {
        registry.borrow_mut().focused.remove(&index);
    });
}

/// Reset all keyboard state (for testing).
pub fn reset_keyboard_state() {
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        registry.global.clear();
        registry.by_key.clear();
        registry.focused.clear();
        registry.next_id = 0;
    });
    LAST_EVENT.with(|last| last.set(None));
}
