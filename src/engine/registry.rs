//! Component Registry - Index allocation and the component tree.
//!
//! Manages the lifecycle of component indices:
//! - ID <-> Index bidirectional mapping
//! - Free index pool for O(1) reuse
//! - Per-component record (parent link, focusable flag)
//! - Parent context stack for nested component creation
//! - Subtree queries (`is_within`) used by focus tracking

use std::cell::RefCell;
use std::collections::HashMap;

// =============================================================================
// Registry State
// =============================================================================

/// Per-component state.
#[derive(Debug, Clone, Default)]
struct ComponentRecord {
    id: String,
    parent: Option<usize>,
    focusable: bool,
}

thread_local! {
    /// Map component ID to index.
    static ID_TO_INDEX: RefCell<HashMap<String, usize>> = RefCell::new(HashMap::new());

    /// Records for allocated indices.
    static COMPONENTS: RefCell<HashMap<usize, ComponentRecord>> = RefCell::new(HashMap::new());

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = RefCell::new(Vec::new());

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Counter for generating unique IDs.
    static ID_COUNTER: RefCell<usize> = const { RefCell::new(0) };

    /// Stack of parent indices for nested component creation.
    static PARENT_STACK: RefCell<Vec<usize>> = RefCell::new(Vec::new());

    /// Destroy callbacks registered per index.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<Box<dyn FnOnce()>>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Parent Context Stack
// =============================================================================

/// Get current parent index (None at root).
pub fn get_current_parent_index() -> Option<usize> {
    PARENT_STACK.with(|stack| stack.borrow().last().copied())
}

/// Push a parent index onto the stack.
pub fn push_parent_context(index: usize) {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().push(index);
    })
}

/// Pop a parent index from the stack.
pub fn pop_parent_context() {
    PARENT_STACK.with(|stack| {
        stack.borrow_mut().pop();
    })
}

// =============================================================================
// Index Allocation
// =============================================================================

/// Allocate an index for a new component.
///
/// The component's parent is the current parent context. If `id` is not
/// provided, one is generated. Allocating an already-registered ID returns
/// its existing index.
pub fn allocate_index(id: Option<&str>) -> usize {
    let component_id = match id {
        Some(id) => id.to_string(),
        None => ID_COUNTER.with(|counter| {
            let mut counter = counter.borrow_mut();
            let id = format!("c{}", *counter);
            *counter += 1;
            id
        }),
    };

    // Check if already allocated
    let existing = ID_TO_INDEX.with(|map| map.borrow().get(&component_id).copied());
    if let Some(index) = existing {
        return index;
    }

    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| {
        let mut free = free.borrow_mut();
        if let Some(index) = free.pop() {
            index
        } else {
            NEXT_INDEX.with(|next| {
                let mut next = next.borrow_mut();
                let index = *next;
                *next += 1;
                index
            })
        }
    });

    let record = ComponentRecord {
        id: component_id.clone(),
        parent: get_current_parent_index(),
        focusable: false,
    };

    ID_TO_INDEX.with(|map| {
        map.borrow_mut().insert(component_id, index);
    });
    COMPONENTS.with(|map| {
        map.borrow_mut().insert(index, record);
    });

    index
}

/// Release an index back to the pool.
///
/// Also recursively releases all children. Releasing an unknown index is a
/// no-op, so teardown paths may overlap without panicking.
pub fn release_index(index: usize) {
    let known = COMPONENTS.with(|map| map.borrow().contains_key(&index));
    if !known {
        return;
    }

    // FIRST: Find and release all children (recursive!)
    // Collect first to avoid modifying while iterating.
    let children: Vec<usize> = COMPONENTS.with(|map| {
        map.borrow()
            .iter()
            .filter(|(_, record)| record.parent == Some(index))
            .map(|(child, _)| *child)
            .collect()
    });
    for child in children {
        release_index(child);
    }

    // Run destroy callbacks before cleanup
    run_destroy_callbacks(index);

    let record = COMPONENTS.with(|map| map.borrow_mut().remove(&index));
    if let Some(record) = record {
        ID_TO_INDEX.with(|map| {
            map.borrow_mut().remove(&record.id);
        });
    }

    // Return to pool for reuse
    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the component at `index` is destroyed.
pub fn on_destroy(index: usize, callback: impl FnOnce() + 'static) {
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(index)
            .or_default()
            .push(Box::new(callback));
    });
}

/// Run and clear destroy callbacks for an index.
fn run_destroy_callbacks(index: usize) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(&index));
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Component State
// =============================================================================

/// Mark a component as focusable (able to receive input focus).
pub fn set_focusable(index: usize, focusable: bool) {
    COMPONENTS.with(|map| {
        if let Some(record) = map.borrow_mut().get_mut(&index) {
            record.focusable = focusable;
        }
    });
}

pub fn get_focusable(index: usize) -> bool {
    COMPONENTS.with(|map| {
        map.borrow()
            .get(&index)
            .map(|record| record.focusable)
            .unwrap_or(false)
    })
}

pub fn get_parent_index(index: usize) -> Option<usize> {
    COMPONENTS.with(|map| map.borrow().get(&index).and_then(|record| record.parent))
}

// =============================================================================
// Subtree Queries
// =============================================================================

/// Check whether `index` is `ancestor` or one of its descendants.
///
/// This is the tree query behind focus trapping: "is the focused component
/// inside this container?". Walks parent links; unknown indices are outside
/// every subtree.
pub fn is_within(index: usize, ancestor: usize) -> bool {
    let mut current = Some(index);
    while let Some(idx) = current {
        if idx == ancestor {
            return true;
        }
        current = get_parent_index(idx);
    }
    false
}

// =============================================================================
// Lookups
// =============================================================================

/// Get index for a component ID.
pub fn get_index(id: &str) -> Option<usize> {
    ID_TO_INDEX.with(|map| map.borrow().get(id).copied())
}

/// Get ID for an index.
pub fn get_id(index: usize) -> Option<String> {
    COMPONENTS.with(|map| map.borrow().get(&index).map(|record| record.id.clone()))
}

/// Check if an index is currently allocated.
pub fn is_allocated(index: usize) -> bool {
    COMPONENTS.with(|map| map.borrow().contains_key(&index))
}

/// Get the count of currently allocated components.
pub fn get_allocated_count() -> usize {
    COMPONENTS.with(|map| map.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    ID_TO_INDEX.with(|map| map.borrow_mut().clear());
    COMPONENTS.with(|map| map.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    ID_COUNTER.with(|counter| *counter.borrow_mut() = 0);
    PARENT_STACK.with(|stack| stack.borrow_mut().clear());
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_index() {
        reset_registry();

        let idx1 = allocate_index(None);
        let idx2 = allocate_index(None);
        let idx3 = allocate_index(Some("grid"));

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(idx3, 2);

        assert!(is_allocated(0));
        assert!(is_allocated(1));
        assert!(is_allocated(2));
        assert!(!is_allocated(3));

        assert_eq!(get_allocated_count(), 3);
    }

    #[test]
    fn test_release_and_reuse() {
        reset_registry();

        let idx1 = allocate_index(None);
        let idx2 = allocate_index(None);

        release_index(idx1);
        assert!(!is_allocated(idx1));
        assert!(is_allocated(idx2));

        // Should reuse the freed index
        let idx3 = allocate_index(None);
        assert_eq!(idx3, idx1);
    }

    #[test]
    fn test_release_unknown_is_noop() {
        reset_registry();

        release_index(42);
        assert_eq!(get_allocated_count(), 0);
    }

    #[test]
    fn test_id_mapping() {
        reset_registry();

        let idx = allocate_index(Some("cell-3-2"));
        assert_eq!(get_index("cell-3-2"), Some(idx));
        assert_eq!(get_id(idx), Some("cell-3-2".to_string()));
    }

    #[test]
    fn test_parent_context() {
        reset_registry();

        assert_eq!(get_current_parent_index(), None);

        push_parent_context(5);
        assert_eq!(get_current_parent_index(), Some(5));

        push_parent_context(10);
        assert_eq!(get_current_parent_index(), Some(10));

        pop_parent_context();
        assert_eq!(get_current_parent_index(), Some(5));

        pop_parent_context();
        assert_eq!(get_current_parent_index(), None);
    }

    #[test]
    fn test_parent_assigned_from_context() {
        reset_registry();

        let root = allocate_index(None);
        push_parent_context(root);
        let child = allocate_index(None);
        pop_parent_context();

        assert_eq!(get_parent_index(child), Some(root));
        assert_eq!(get_parent_index(root), None);
    }

    #[test]
    fn test_is_within() {
        reset_registry();

        let root = allocate_index(None);
        push_parent_context(root);
        let inner = allocate_index(None);
        push_parent_context(inner);
        let leaf = allocate_index(None);
        pop_parent_context();
        pop_parent_context();
        let outside = allocate_index(None);

        assert!(is_within(root, root));
        assert!(is_within(inner, root));
        assert!(is_within(leaf, root));
        assert!(is_within(leaf, inner));
        assert!(!is_within(outside, root));
        assert!(!is_within(root, inner));
    }

    #[test]
    fn test_release_recursive() {
        reset_registry();

        let root = allocate_index(None);
        push_parent_context(root);
        let child = allocate_index(None);
        push_parent_context(child);
        let grandchild = allocate_index(None);
        pop_parent_context();
        pop_parent_context();

        release_index(root);
        assert!(!is_allocated(root));
        assert!(!is_allocated(child));
        assert!(!is_allocated(grandchild));
        assert_eq!(get_allocated_count(), 0);
    }

    #[test]
    fn test_focusable_flag() {
        reset_registry();

        let idx = allocate_index(None);
        assert!(!get_focusable(idx));

        set_focusable(idx, true);
        assert!(get_focusable(idx));

        set_focusable(idx, false);
        assert!(!get_focusable(idx));
    }

    #[test]
    fn test_destroy_callback() {
        use std::cell::Cell;
        use std::rc::Rc;

        reset_registry();

        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        let idx = allocate_index(None);
        on_destroy(idx, move || {
            called_clone.set(true);
        });

        assert!(!called.get());
        release_index(idx);
        assert!(called.get());
    }
}
