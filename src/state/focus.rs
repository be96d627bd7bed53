//! Focus State - Which component holds input focus, and focus trapping.
//!
//! A single reactive signal tracks the focused component index (-1 when
//! nothing is focused). [`FocusTrapper`] derives a boolean signal that is
//! true whenever focus sits anywhere inside a container's subtree, the
//! terminal analog of DOM focusin/focusout tracking on a wrapper element.
//!
//! # Example
//!
//! ```ignore
//! use spark_grid::state::focus;
//!
//! let (trapper, cleanup) = focus::focus_trapper(Some("panel"));
//! let captured = trapper.focused();
//!
//! // captured.get() flips to true when any descendant takes focus
//! ```

use spark_signals::{Signal, effect, signal};
use std::cell::Cell;
use std::rc::Rc;

use crate::engine::registry;
use crate::types::Cleanup;

// =============================================================================
// Focus State
// =============================================================================

thread_local! {
    /// Currently focused component index (-1 = none).
    static FOCUSED_INDEX: Signal<i32> = signal(-1);
}

/// Get the currently focused component index (-1 if none).
pub fn get_focused_index() -> i32 {
    FOCUSED_INDEX.with(|focused| focused.get())
}

/// Check if any component has focus.
pub fn has_focus() -> bool {
    get_focused_index() >= 0
}

/// Check if a specific component index is focused.
pub fn is_focused(index: usize) -> bool {
    get_focused_index() == index as i32
}

/// Focus a component by index.
///
/// Fails (returns false) if the index is not allocated or not focusable.
pub fn focus(index: usize) -> bool {
    if !registry::is_allocated(index) || !registry::get_focusable(index) {
        return false;
    }
    FOCUSED_INDEX.with(|focused| {
        if focused.get() != index as i32 {
            focused.set(index as i32);
        }
    });
    true
}

/// Clear focus.
pub fn blur() {
    FOCUSED_INDEX.with(|focused| {
        if focused.get() != -1 {
            focused.set(-1);
        }
    });
}

/// Subscribe to the focused-index signal (for reactive consumers).
pub fn focused_index_signal() -> Signal<i32> {
    FOCUSED_INDEX.with(|focused| focused.clone())
}

/// Reset focus state (for testing).
pub fn reset_focus_state() {
    blur();
}

// =============================================================================
// Focus Trapper
// =============================================================================

/// Tracks whether focus is anywhere inside a container's subtree.
///
/// Children created under this container (via the parent context stack)
/// count as "inside". The `focused` signal only changes value on actual
/// inside/outside transitions, so focus moving between two descendants
/// does not re-notify subscribers.
pub struct FocusTrapper {
    container: usize,
    focused: Signal<bool>,
}

impl FocusTrapper {
    /// The container's component index.
    pub fn container(&self) -> usize {
        self.container
    }

    /// The subtree-focus signal. True while a descendant holds focus.
    pub fn focused(&self) -> Signal<bool> {
        self.focused.clone()
    }

    /// Check the current subtree-focus state directly.
    pub fn is_focused_inside(&self) -> bool {
        self.focused.get()
    }
}

/// Create a focus trapper container.
///
/// Allocates a component index (children created while this index is on
/// the parent context stack become part of the trapped subtree) and wires
/// an effect that watches the global focused index. The returned cleanup
/// stops the effect and releases the container index.
pub fn focus_trapper(id: Option<&str>) -> (FocusTrapper, Cleanup) {
    let container = registry::allocate_index(id);
    registry::set_focusable(container, true);
    let focused = signal(false);

    let focused_for_effect = focused.clone();
    let inside_memo = Rc::new(Cell::new(false));
    let stop = effect(move || {
        let current = FOCUSED_INDEX.with(|signal| signal.get());
        let inside = current >= 0 && registry::is_within(current as usize, container);
        // Only write on inside/outside transitions.
        if inside != inside_memo.get() {
            inside_memo.set(inside);
            focused_for_effect.set(inside);
        }
    });

    let trapper = FocusTrapper {
        container,
        focused,
    };

    let cleanup: Cleanup = Box::new(move || {
        stop();
        registry::release_index(container);
    });

    (trapper, cleanup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        registry::reset_registry();
        reset_focus_state();
    }

    fn focusable_component(id: Option<&str>) -> usize {
        let idx = registry::allocate_index(id);
        registry::set_focusable(idx, true);
        idx
    }

    #[test]
    fn test_focus_and_blur() {
        setup();

        let idx = focusable_component(None);
        assert!(!has_focus());

        assert!(focus(idx));
        assert!(is_focused(idx));
        assert_eq!(get_focused_index(), idx as i32);

        blur();
        assert!(!has_focus());
        assert_eq!(get_focused_index(), -1);
    }

    #[test]
    fn test_focus_requires_focusable() {
        setup();

        let idx = registry::allocate_index(None);
        assert!(!focus(idx));
        assert!(!has_focus());

        registry::set_focusable(idx, true);
        assert!(focus(idx));
    }

    #[test]
    fn test_focus_requires_allocated() {
        setup();

        assert!(!focus(99));
        assert!(!has_focus());
    }

    #[test]
    fn test_trapper_tracks_descendant_focus() {
        setup();

        let (trapper, cleanup) = focus_trapper(Some("panel"));
        registry::push_parent_context(trapper.container());
        let inside = focusable_component(None);
        registry::pop_parent_context();
        let outside = focusable_component(None);

        assert!(!trapper.is_focused_inside());

        focus(inside);
        assert!(trapper.is_focused_inside());

        focus(outside);
        assert!(!trapper.is_focused_inside());

        cleanup();
    }

    #[test]
    fn test_trapper_blur_clears() {
        setup();

        let (trapper, cleanup) = focus_trapper(None);
        registry::push_parent_context(trapper.container());
        let inside = focusable_component(None);
        registry::pop_parent_context();

        focus(inside);
        assert!(trapper.is_focused_inside());

        blur();
        assert!(!trapper.is_focused_inside());

        cleanup();
    }

    #[test]
    fn test_trapper_deep_subtree() {
        setup();

        let (trapper, cleanup) = focus_trapper(None);
        registry::push_parent_context(trapper.container());
        let middle = registry::allocate_index(None);
        registry::push_parent_context(middle);
        let leaf = focusable_component(None);
        registry::pop_parent_context();
        registry::pop_parent_context();

        focus(leaf);
        assert!(trapper.is_focused_inside());

        cleanup();
    }

    #[test]
    fn test_trapper_stable_across_inside_moves() {
        setup();

        let (trapper, cleanup) = focus_trapper(None);
        registry::push_parent_context(trapper.container());
        let first = focusable_component(None);
        let second = focusable_component(None);
        registry::pop_parent_context();

        focus(first);
        let signal = trapper.focused();
        assert!(signal.get());

        // Moving focus between two descendants keeps the trapper true.
        focus(second);
        assert!(signal.get());

        cleanup();
    }
}
